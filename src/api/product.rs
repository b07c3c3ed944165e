//! Product API handlers

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::api::multipart_error;
use crate::domain::{DomainError, Permission, ProductFilter, ProductInput};
use crate::infrastructure::auth::CurrentUser;
use crate::infrastructure::AppState;
use crate::services::{document_service, inventory_service, ClientInfo};

#[utoipa::path(
    get,
    path = "/api/products",
    params(
        ("search" = Option<String>, Query, description = "Substring of name or SKU"),
        ("category" = Option<String>, Query, description = "Exact category"),
        ("supplier_id" = Option<i32>, Query, description = "Supplier"),
        ("low_stock_only" = Option<bool>, Query, description = "Only products at or below their threshold"),
        ("page" = Option<u64>, Query, description = "1-based page"),
        ("per_page" = Option<u64>, Query, description = "Page size; no paging when absent")
    ),
    responses((status = 200, description = "Products with supplier names"))
)]
pub async fn list_products(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(filter): Query<ProductFilter>,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::ViewInventory)?;
    let result = state.product_repo.find_all(filter).await?;
    Ok(Json(json!({
        "products": result.products,
        "total": result.total
    })))
}

#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    pub limit: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/products/alerts",
    params(("limit" = Option<u64>, Query, description = "Maximum rows")),
    responses((status = 200, description = "Low-stock products, lowest quantity first"))
)]
pub async fn stock_alerts(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<AlertsQuery>,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::ViewInventory)?;
    let alerts = state.product_repo.find_low_stock(query.limit).await?;
    Ok(Json(json!({
        "total": alerts.len(),
        "alerts": alerts
    })))
}

#[utoipa::path(
    get,
    path = "/api/products/categories",
    responses((status = 200, description = "Distinct categories"))
)]
pub async fn list_categories(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::ViewInventory)?;
    Ok(Json(state.product_repo.categories().await?))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::ViewInventory)?;
    let product = state
        .product_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found("Product"))?;
    Ok(Json(product))
}

#[utoipa::path(
    post,
    path = "/api/products",
    responses(
        (status = 201, description = "Product created"),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "SKU already exists")
    )
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: CurrentUser,
    client: ClientInfo,
    Json(payload): Json<ProductInput>,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::EditInventory)?;
    let product = inventory_service::create_product(&state, &user, payload, &client).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product updated"),
        (status = 404, description = "Not found"),
        (status = 409, description = "SKU already exists")
    )
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: CurrentUser,
    client: ClientInfo,
    Path(id): Path<i32>,
    Json(payload): Json<ProductInput>,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::EditInventory)?;
    let product = inventory_service::update_product(&state, &user, id, payload, &client).await?;
    Ok(Json(product))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 409, description = "Stock entries reference this product")
    )
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: CurrentUser,
    client: ClientInfo,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::DeleteRecords)?;
    inventory_service::delete_product(&state, &user, id, &client).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/products/{id}/image",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Image stored"),
        (status = 400, description = "Missing file or not jpg/jpeg/png")
    )
)]
pub async fn upload_image(
    State(state): State<AppState>,
    user: CurrentUser,
    client: ClientInfo,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::EditInventory)?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(multipart_error)?;
            upload = Some((file_name, bytes));
        }
    }
    let (file_name, bytes) =
        upload.ok_or_else(|| DomainError::validation("Image file is required"))?;

    let product =
        document_service::upload_product_image(&state, &user, id, &file_name, &bytes, &client)
            .await?;
    Ok(Json(product))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}/image",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 404, description = "Product or image missing")
    )
)]
pub async fn get_image(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::ViewInventory)?;
    let (path, bytes) = document_service::product_image(&state, id).await?;
    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    Ok(([(header::CONTENT_TYPE, mime.to_string())], bytes))
}
