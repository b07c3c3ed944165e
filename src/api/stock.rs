//! Stock ledger API handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sea_orm::DatabaseConnection;
use serde_json::json;

use crate::domain::{DomainError, Permission, StockEntryFilter, StockEntryInput};
use crate::infrastructure::auth::CurrentUser;
use crate::infrastructure::AppState;
use crate::services::{inventory_service, report_service, ClientInfo};

#[utoipa::path(
    get,
    path = "/api/stock",
    params(
        ("product_id" = Option<i32>, Query, description = "Product"),
        ("supplier_id" = Option<i32>, Query, description = "Supplier"),
        ("limit" = Option<u64>, Query, description = "Maximum rows")
    ),
    responses((status = 200, description = "Stock entries, newest first"))
)]
pub async fn list_entries(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(filter): Query<StockEntryFilter>,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::ViewInventory)?;
    let entries = state.stock_repo.find_all(filter).await?;
    Ok(Json(json!({
        "total": entries.len(),
        "entries": entries
    })))
}

#[utoipa::path(
    post,
    path = "/api/stock",
    responses(
        (status = 201, description = "Entry recorded and product quantity raised"),
        (status = 400, description = "Quantity not positive or price negative"),
        (status = 404, description = "Product or supplier missing")
    )
)]
pub async fn create_entry(
    State(state): State<AppState>,
    user: CurrentUser,
    client: ClientInfo,
    Json(payload): Json<StockEntryInput>,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::EditInventory)?;
    let entry = inventory_service::record_stock_entry(&state, &user, payload, &client).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[utoipa::path(
    get,
    path = "/api/stock/reconciliation",
    responses((status = 200, description = "Products whose quantity differs from their ledger"))
)]
pub async fn reconciliation(
    State(db): State<DatabaseConnection>,
    user: CurrentUser,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::ViewInventory)?;
    let drift = report_service::reconciliation(&db).await?;
    Ok(Json(json!({
        "total": drift.len(),
        "products": drift
    })))
}
