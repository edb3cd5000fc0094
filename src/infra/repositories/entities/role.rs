//! SeaORM entity for the `roles` table.
//!
//! Rows are pre-seeded reference data; the application only reads them.

use sea_orm::entity::prelude::*;

use crate::domain::{Role, RoleName};
use crate::errors::AppError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "roles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_role::Entity")]
    UserRole,
}

impl Related<super::user_role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserRole.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        super::user_role::Relation::User.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::user_role::Relation::Role.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Role {
    type Error = AppError;

    // A row whose name falls outside the catalog is a deployment defect,
    // not user input.
    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let name = RoleName::parse(&model.name).ok_or_else(|| {
            AppError::internal(format!("Unknown role name in catalog: {}", model.name))
        })?;
        Ok(Role {
            id: model.id,
            name,
        })
    }
}
