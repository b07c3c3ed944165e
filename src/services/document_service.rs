//! Document Service - files on disk, metadata in the database

use crate::domain::{AuditAction, DomainError, NewDocument};
use crate::infrastructure::auth::CurrentUser;
use crate::infrastructure::storage::{
    extension, has_allowed_extension, timestamped_name, DOCUMENT_EXTENSIONS, IMAGE_EXTENSIONS,
};
use crate::infrastructure::AppState;
use crate::models::{document, product};
use crate::services::audit_service::{self, AuditEvent, ClientInfo};

/// Parsed multipart upload
#[derive(Debug, Default)]
pub struct DocumentUpload {
    pub title: Option<String>,
    pub category: Option<String>,
    pub supplier_id: Option<i32>,
    pub product_id: Option<i32>,
    pub file_name: Option<String>,
    pub bytes: Option<Vec<u8>>,
}

fn resolve_category(category: Option<String>) -> Result<String, DomainError> {
    let category = category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| document::DEFAULT_CATEGORY.to_string());

    if document::CATEGORIES.contains(&category.as_str()) {
        Ok(category)
    } else {
        Err(DomainError::validation(format!(
            "Unknown document category: {}",
            category
        )))
    }
}

async fn check_links(
    state: &AppState,
    supplier_id: Option<i32>,
    product_id: Option<i32>,
) -> Result<(), DomainError> {
    if let Some(id) = supplier_id {
        if state.supplier_repo.find_by_id(id).await?.is_none() {
            return Err(DomainError::validation(format!("Supplier {} does not exist", id)));
        }
    }
    if let Some(id) = product_id {
        if state.product_repo.find_by_id(id).await?.is_none() {
            return Err(DomainError::validation(format!("Product {} does not exist", id)));
        }
    }
    Ok(())
}

pub async fn upload(
    state: &AppState,
    actor: &CurrentUser,
    upload: DocumentUpload,
    client: &ClientInfo,
) -> Result<document::Model, DomainError> {
    let title = upload
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| DomainError::validation("Title is required"))?;
    let (original_name, bytes) = match (upload.file_name, upload.bytes) {
        (Some(name), Some(bytes)) if !name.trim().is_empty() => (name, bytes),
        _ => return Err(DomainError::validation("File is required")),
    };
    if !has_allowed_extension(&original_name, DOCUMENT_EXTENSIONS) {
        return Err(DomainError::validation(format!(
            "File type not allowed; accepted: {}",
            DOCUMENT_EXTENSIONS.join(", ")
        )));
    }
    let category = resolve_category(upload.category)?;
    check_links(state, upload.supplier_id, upload.product_id).await?;

    let stored = state
        .documents
        .save(&timestamped_name(&original_name, chrono::Utc::now()), &bytes)
        .await?;

    let created = state
        .document_repo
        .create(NewDocument {
            title,
            file_name: stored.file_name.clone(),
            file_path: stored.path.clone(),
            file_size: stored.size,
            category,
            supplier_id: upload.supplier_id,
            product_id: upload.product_id,
            uploaded_by: Some(actor.id),
        })
        .await;

    let doc = match created {
        Ok(doc) => doc,
        Err(e) => {
            if let Err(cleanup) = state.documents.remove(&stored.path).await {
                tracing::error!("Could not remove orphaned upload {}: {}", stored.path, cleanup);
            }
            return Err(e);
        }
    };

    tracing::info!(
        "📄 {} uploaded {} ({} bytes)",
        actor.username,
        doc.file_name,
        doc.file_size
    );
    audit_service::record(
        state.audit_repo.as_ref(),
        client,
        AuditEvent::new(AuditAction::Upload, "documents")
            .by(actor.id)
            .record(doc.id)
            .details(doc.file_name.clone()),
    )
    .await;

    Ok(doc)
}

/// Metadata and bytes of one document
pub async fn open(state: &AppState, id: i32) -> Result<(document::Model, Vec<u8>), DomainError> {
    let doc = state
        .document_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found("Document"))?;
    let bytes = state.documents.read(&doc.file_path).await?;
    Ok((doc, bytes))
}

pub async fn delete(
    state: &AppState,
    actor: &CurrentUser,
    id: i32,
    client: &ClientInfo,
) -> Result<(), DomainError> {
    let doc = state.document_repo.delete(id).await?;

    match state.documents.remove(&doc.file_path).await {
        Ok(true) => {}
        Ok(false) => tracing::warn!("Document {} had no file at {}", doc.id, doc.file_path),
        Err(e) => tracing::warn!(
            "Could not remove file {} of deleted document {}: {}",
            doc.file_path,
            doc.id,
            e
        ),
    }

    audit_service::record(
        state.audit_repo.as_ref(),
        client,
        AuditEvent::new(AuditAction::Delete, "documents")
            .by(actor.id)
            .record(doc.id)
            .details(doc.file_name),
    )
    .await;
    Ok(())
}

/// Stored as `product_{id}{ext}`; replaces any previous image.
pub async fn upload_product_image(
    state: &AppState,
    actor: &CurrentUser,
    product_id: i32,
    file_name: &str,
    bytes: &[u8],
    client: &ClientInfo,
) -> Result<product::Model, DomainError> {
    let existing = state
        .product_repo
        .find_by_id(product_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Product"))?;
    let ext = extension(file_name)
        .filter(|_| has_allowed_extension(file_name, IMAGE_EXTENSIONS))
        .ok_or_else(|| {
            DomainError::validation(format!(
                "Image type not allowed; accepted: {}",
                IMAGE_EXTENSIONS.join(", ")
            ))
        })?;

    let stored = state
        .images
        .save(&format!("product_{}.{}", product_id, ext), bytes)
        .await?;

    if let Some(old) = existing.product.image_path.filter(|p| *p != stored.path) {
        if let Err(e) = state.images.remove(&old).await {
            tracing::warn!("Could not remove previous image {}: {}", old, e);
        }
    }

    let product = state
        .product_repo
        .set_image_path(product_id, stored.path)
        .await?;

    audit_service::record(
        state.audit_repo.as_ref(),
        client,
        AuditEvent::new(AuditAction::Upload, "products")
            .by(actor.id)
            .record(product_id)
            .details(stored.file_name),
    )
    .await;
    Ok(product)
}

/// Path and bytes of a product's image
pub async fn product_image(state: &AppState, product_id: i32) -> Result<(String, Vec<u8>), DomainError> {
    let view = state
        .product_repo
        .find_by_id(product_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Product"))?;
    let path = view
        .product
        .image_path
        .ok_or_else(|| DomainError::not_found("Product image"))?;
    let bytes = state.images.read(&path).await?;
    Ok((path, bytes))
}
