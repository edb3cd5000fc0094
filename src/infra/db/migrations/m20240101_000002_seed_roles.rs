//! Migration: Seed the role catalog.
//!
//! Role rows are fixed reference data; the application only ever looks
//! them up. Registration depends on the CUSTOMER row being present.

use sea_orm_migration::prelude::*;

use crate::config::VALID_ROLES;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut insert = Query::insert();
        insert.into_table(Roles::Table).columns([Roles::Name]);
        for role in VALID_ROLES {
            insert.values_panic([(*role).into()]);
        }
        manager.exec_stmt(insert.to_owned()).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut delete = Query::delete();
        delete.from_table(Roles::Table);
        manager.exec_stmt(delete.to_owned()).await
    }
}

#[derive(Iden)]
enum Roles {
    Table,
    Name,
}
