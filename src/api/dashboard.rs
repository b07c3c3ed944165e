use axum::{extract::State, response::IntoResponse, Json};
use sea_orm::DatabaseConnection;

use crate::domain::{DomainError, Permission};
use crate::infrastructure::auth::CurrentUser;
use crate::infrastructure::AppState;
use crate::services::report_service;

#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses((status = 200, description = "Statistics, top alerts, recent stock entries and products per supplier"))
)]
pub async fn dashboard(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::ViewInventory)?;
    Ok(Json(report_service::dashboard(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    responses((status = 200, description = "Entity counts, low-stock count and total stock value"))
)]
pub async fn stats(
    State(db): State<DatabaseConnection>,
    user: CurrentUser,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::ViewInventory)?;
    Ok(Json(report_service::stats(&db).await?))
}
