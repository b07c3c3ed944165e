//! User management API handlers (Admin only)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::domain::{DomainError, Permission, Role, UserFilter};
use crate::infrastructure::auth::CurrentUser;
use crate::infrastructure::AppState;
use crate::services::user_service::{self, CreateUserRequest};
use crate::services::ClientInfo;

#[derive(Debug, Deserialize)]
pub struct RoleUpdate {
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub is_active: bool,
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(
        ("role" = Option<String>, Query, description = "Admin, Editor or Vizualizator"),
        ("is_active" = Option<bool>, Query, description = "Active flag")
    ),
    responses(
        (status = 200, description = "Users"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(filter): Query<UserFilter>,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::ManageUsers)?;
    let users = user_service::list_users(&state, filter).await?;
    Ok(Json(json!({
        "total": users.len(),
        "users": users
    })))
}

#[utoipa::path(
    post,
    path = "/api/users",
    responses(
        (status = 201, description = "User created; generated_password present when none was given"),
        (status = 409, description = "Username or email taken")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    user: CurrentUser,
    client: ClientInfo,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::ManageUsers)?;
    let issued = user_service::create_user(&state, &user, payload, &client).await?;
    Ok((StatusCode::CREATED, Json(issued)))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}/role",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "Role changed"),
        (status = 400, description = "Cannot demote yourself")
    )
)]
pub async fn change_role(
    State(state): State<AppState>,
    user: CurrentUser,
    client: ClientInfo,
    Path(id): Path<i32>,
    Json(payload): Json<RoleUpdate>,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::ManageUsers)?;
    let updated = user_service::change_role(&state, &user, id, payload.role, &client).await?;
    Ok(Json(updated))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}/status",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "Status changed"),
        (status = 400, description = "Cannot deactivate yourself")
    )
)]
pub async fn set_status(
    State(state): State<AppState>,
    user: CurrentUser,
    client: ClientInfo,
    Path(id): Path<i32>,
    Json(payload): Json<StatusUpdate>,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::ManageUsers)?;
    let updated = user_service::set_status(&state, &user, id, payload.is_active, &client).await?;
    Ok(Json(updated))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/reset-password",
    params(("id" = i32, Path, description = "User id")),
    responses((status = 200, description = "New generated password, shown once"))
)]
pub async fn reset_password(
    State(state): State<AppState>,
    user: CurrentUser,
    client: ClientInfo,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::ManageUsers)?;
    let issued = user_service::reset_password(&state, &user, id, &client).await?;
    Ok(Json(issued))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Cannot delete yourself")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    user: CurrentUser,
    client: ClientInfo,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::ManageUsers)?;
    user_service::delete_user(&state, &user, id, &client).await?;
    Ok(StatusCode::NO_CONTENT)
}
