//! User management handlers.
//!
//! All routes here sit behind the JWT middleware. Create and update
//! payloads are passed through as plain JSON; the service layer owns
//! their validation so the rules stay identical across entry points.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::UserResponse;
use crate::errors::AppResult;
use crate::services::{CreateUserData, UpdateUserData};

/// Administrative user creation request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    #[schema(example = "bob")]
    pub username: String,
    #[schema(example = "bob@example.com")]
    pub email: String,
    #[schema(example = "SecurePass123!")]
    pub password: String,
    /// Optional role names; unknown names are ignored
    pub roles: Option<Vec<String>>,
}

/// Partial user update request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Role assignment request
#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignRoleRequest {
    pub role_id: i32,
}

/// Create user management routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route(
            "/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/:id/roles", post(assign_role))
}

/// List all users
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All users", body = [UserResponse]),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserResponse>>> {
    let users = state.user_service.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<UserResponse>> {
    let user = state.user_service.get_user(id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "User created", body = UserResponse),
        (status = 400, description = "Validation error or username/email already in use"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    tracing::info!(actor = %current_user.username, username = %payload.username, "Creating user");

    let user = state
        .user_service
        .create_user(CreateUserData {
            username: payload.username,
            email: payload.email,
            password: payload.password,
            roles: payload.roles,
        })
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// Partially update a user
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Validation error or username/email already in use"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .user_service
        .update_user(
            id,
            UpdateUserData {
                username: payload.username,
                email: payload.email,
                password: payload.password,
            },
        )
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> AppResult<()> {
    tracing::info!(actor = %current_user.username, user_id = id, "Deleting user");
    state.user_service.delete_user(id).await
}

/// Assign a role to a user
#[utoipa::path(
    post,
    path = "/api/users/{id}/roles",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = AssignRoleRequest,
    responses(
        (status = 200, description = "Role assigned", body = UserResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User or role not found")
    )
)]
pub async fn assign_role(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<AssignRoleRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state.user_service.assign_role(id, payload.role_id).await?;
    Ok(Json(UserResponse::from(user)))
}
