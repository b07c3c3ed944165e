//! Supplier API handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::domain::{DomainError, Permission, ProductFilter, SupplierFilter, SupplierInput};
use crate::infrastructure::auth::CurrentUser;
use crate::infrastructure::AppState;
use crate::services::{inventory_service, ClientInfo};

#[utoipa::path(
    get,
    path = "/api/suppliers",
    params(
        ("search" = Option<String>, Query, description = "Substring of name, contact person or city"),
        ("country" = Option<String>, Query, description = "Exact country")
    ),
    responses((status = 200, description = "Suppliers ordered by name"))
)]
pub async fn list_suppliers(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(filter): Query<SupplierFilter>,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::ViewInventory)?;
    let suppliers = state.supplier_repo.find_all(filter).await?;
    Ok(Json(json!({
        "total": suppliers.len(),
        "suppliers": suppliers
    })))
}

#[utoipa::path(
    get,
    path = "/api/suppliers/{id}",
    params(("id" = i32, Path, description = "Supplier id")),
    responses(
        (status = 200, description = "Supplier"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_supplier(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::ViewInventory)?;
    let supplier = state
        .supplier_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found("Supplier"))?;
    Ok(Json(supplier))
}

#[utoipa::path(
    post,
    path = "/api/suppliers",
    responses(
        (status = 201, description = "Supplier created; country defaults to China"),
        (status = 400, description = "Name missing"),
        (status = 403, description = "Role cannot edit inventory")
    )
)]
pub async fn create_supplier(
    State(state): State<AppState>,
    user: CurrentUser,
    client: ClientInfo,
    Json(payload): Json<SupplierInput>,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::EditInventory)?;
    let supplier = inventory_service::create_supplier(&state, &user, payload, &client).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

#[utoipa::path(
    put,
    path = "/api/suppliers/{id}",
    params(("id" = i32, Path, description = "Supplier id")),
    responses(
        (status = 200, description = "Supplier updated"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_supplier(
    State(state): State<AppState>,
    user: CurrentUser,
    client: ClientInfo,
    Path(id): Path<i32>,
    Json(payload): Json<SupplierInput>,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::EditInventory)?;
    let supplier = inventory_service::update_supplier(&state, &user, id, payload, &client).await?;
    Ok(Json(supplier))
}

#[utoipa::path(
    delete,
    path = "/api/suppliers/{id}",
    params(("id" = i32, Path, description = "Supplier id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 409, description = "Still referenced by products or stock entries")
    )
)]
pub async fn delete_supplier(
    State(state): State<AppState>,
    user: CurrentUser,
    client: ClientInfo,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::DeleteRecords)?;
    inventory_service::delete_supplier(&state, &user, id, &client).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/suppliers/{id}/products",
    params(("id" = i32, Path, description = "Supplier id")),
    responses((status = 200, description = "Products of this supplier"))
)]
pub async fn list_supplier_products(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::ViewInventory)?;
    if state.supplier_repo.find_by_id(id).await?.is_none() {
        return Err(DomainError::not_found("Supplier"));
    }

    let result = state
        .product_repo
        .find_all(ProductFilter {
            supplier_id: Some(id),
            ..Default::default()
        })
        .await?;
    Ok(Json(json!({
        "products": result.products,
        "total": result.total
    })))
}
