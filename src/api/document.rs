//! Document API handlers

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::api::multipart_error;
use crate::domain::{DocumentFilter, DomainError, Permission};
use crate::infrastructure::auth::CurrentUser;
use crate::infrastructure::AppState;
use crate::models::document;
use crate::services::document_service::{self, DocumentUpload};
use crate::services::ClientInfo;

fn parse_id(field: &str, value: &str) -> Result<Option<i32>, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| DomainError::validation(format!("{} must be a number", field)))
}

#[utoipa::path(
    get,
    path = "/api/documents",
    params(
        ("search" = Option<String>, Query, description = "Substring of title or file name"),
        ("category" = Option<String>, Query, description = "Exact category"),
        ("supplier_id" = Option<i32>, Query, description = "Supplier"),
        ("product_id" = Option<i32>, Query, description = "Product"),
        ("limit" = Option<u64>, Query, description = "Maximum rows")
    ),
    responses((status = 200, description = "Documents, newest first"))
)]
pub async fn list_documents(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(filter): Query<DocumentFilter>,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::ViewInventory)?;
    let documents = state.document_repo.find_all(filter).await?;
    Ok(Json(json!({
        "total": documents.len(),
        "documents": documents,
        "categories": document::CATEGORIES
    })))
}

#[utoipa::path(
    post,
    path = "/api/documents",
    responses(
        (status = 201, description = "File stored and metadata recorded"),
        (status = 400, description = "Title or file missing, or extension not allowed"),
        (status = 403, description = "Role cannot upload")
    )
)]
pub async fn upload_document(
    State(state): State<AppState>,
    user: CurrentUser,
    client: ClientInfo,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::EditInventory)?;

    let mut upload = DocumentUpload::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                upload.file_name = field.file_name().map(String::from);
                upload.bytes = Some(field.bytes().await.map_err(multipart_error)?.to_vec());
            }
            "title" => upload.title = Some(field.text().await.map_err(multipart_error)?),
            "category" => upload.category = Some(field.text().await.map_err(multipart_error)?),
            "supplier_id" => {
                let text = field.text().await.map_err(multipart_error)?;
                upload.supplier_id = parse_id("supplier_id", &text)?;
            }
            "product_id" => {
                let text = field.text().await.map_err(multipart_error)?;
                upload.product_id = parse_id("product_id", &text)?;
            }
            other => tracing::debug!("Ignoring multipart field '{}'", other),
        }
    }

    let doc = document_service::upload(&state, &user, upload, &client).await?;
    Ok((StatusCode::CREATED, Json(doc)))
}

#[utoipa::path(
    get,
    path = "/api/documents/{id}",
    params(("id" = i32, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document metadata"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_document(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::ViewInventory)?;
    let doc = state
        .document_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found("Document"))?;
    Ok(Json(doc))
}

#[utoipa::path(
    get,
    path = "/api/documents/{id}/file",
    params(("id" = i32, Path, description = "Document id")),
    responses(
        (status = 200, description = "Raw file bytes"),
        (status = 404, description = "Document or file missing")
    )
)]
pub async fn download_document(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::ViewInventory)?;
    let (doc, bytes) = document_service::open(&state, id).await?;

    let mime = mime_guess::from_path(&doc.file_name).first_or_octet_stream();
    let disposition = format!("attachment; filename=\"{}\"", doc.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/documents/{id}",
    params(("id" = i32, Path, description = "Document id")),
    responses(
        (status = 204, description = "Row and file removed"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn delete_document(
    State(state): State<AppState>,
    user: CurrentUser,
    client: ClientInfo,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::DeleteRecords)?;
    document_service::delete(&state, &user, id, &client).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::parse_id;

    #[test]
    fn blank_ids_are_absent() {
        assert_eq!(parse_id("supplier_id", "").unwrap(), None);
        assert_eq!(parse_id("supplier_id", " 12 ").unwrap(), Some(12));
        assert!(parse_id("supplier_id", "abc").is_err());
    }
}
