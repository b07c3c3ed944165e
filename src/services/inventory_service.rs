//! Inventory Service - supplier, product and stock writes with their audit rows

use crate::domain::{AuditAction, DomainError, ProductInput, StockEntryInput, SupplierInput};
use crate::infrastructure::auth::CurrentUser;
use crate::infrastructure::AppState;
use crate::models::{product, stock_entry, supplier};
use crate::services::audit_service::{self, AuditEvent, ClientInfo};

pub async fn create_supplier(
    state: &AppState,
    actor: &CurrentUser,
    input: SupplierInput,
    client: &ClientInfo,
) -> Result<supplier::Model, DomainError> {
    let supplier = state.supplier_repo.create(input).await?;
    audit_service::record(
        state.audit_repo.as_ref(),
        client,
        AuditEvent::new(AuditAction::Create, "suppliers")
            .by(actor.id)
            .record(supplier.id)
            .details(supplier.name.clone()),
    )
    .await;
    Ok(supplier)
}

pub async fn update_supplier(
    state: &AppState,
    actor: &CurrentUser,
    id: i32,
    input: SupplierInput,
    client: &ClientInfo,
) -> Result<supplier::Model, DomainError> {
    let supplier = state.supplier_repo.update(id, input).await?;
    audit_service::record(
        state.audit_repo.as_ref(),
        client,
        AuditEvent::new(AuditAction::Update, "suppliers")
            .by(actor.id)
            .record(id),
    )
    .await;
    Ok(supplier)
}

pub async fn delete_supplier(
    state: &AppState,
    actor: &CurrentUser,
    id: i32,
    client: &ClientInfo,
) -> Result<(), DomainError> {
    state.supplier_repo.delete(id).await?;
    audit_service::record(
        state.audit_repo.as_ref(),
        client,
        AuditEvent::new(AuditAction::Delete, "suppliers")
            .by(actor.id)
            .record(id),
    )
    .await;
    Ok(())
}

pub async fn create_product(
    state: &AppState,
    actor: &CurrentUser,
    input: ProductInput,
    client: &ClientInfo,
) -> Result<product::Model, DomainError> {
    let product = state.product_repo.create(input).await?;
    audit_service::record(
        state.audit_repo.as_ref(),
        client,
        AuditEvent::new(AuditAction::Create, "products")
            .by(actor.id)
            .record(product.id)
            .details(product.sku.clone()),
    )
    .await;
    Ok(product)
}

pub async fn update_product(
    state: &AppState,
    actor: &CurrentUser,
    id: i32,
    input: ProductInput,
    client: &ClientInfo,
) -> Result<product::Model, DomainError> {
    let product = state.product_repo.update(id, input).await?;
    audit_service::record(
        state.audit_repo.as_ref(),
        client,
        AuditEvent::new(AuditAction::Update, "products")
            .by(actor.id)
            .record(id)
            .details(format!("stock_quantity={}", product.stock_quantity)),
    )
    .await;
    Ok(product)
}

pub async fn delete_product(
    state: &AppState,
    actor: &CurrentUser,
    id: i32,
    client: &ClientInfo,
) -> Result<(), DomainError> {
    let image = state
        .product_repo
        .find_by_id(id)
        .await?
        .and_then(|view| view.product.image_path);

    state.product_repo.delete(id).await?;

    if let Some(path) = image {
        if let Err(e) = state.images.remove(&path).await {
            tracing::warn!("Could not remove image {} of deleted product: {}", path, e);
        }
    }

    audit_service::record(
        state.audit_repo.as_ref(),
        client,
        AuditEvent::new(AuditAction::Delete, "products")
            .by(actor.id)
            .record(id),
    )
    .await;
    Ok(())
}

pub async fn record_stock_entry(
    state: &AppState,
    actor: &CurrentUser,
    input: StockEntryInput,
    client: &ClientInfo,
) -> Result<stock_entry::Model, DomainError> {
    let entry = state.stock_repo.record(input).await?;
    audit_service::record(
        state.audit_repo.as_ref(),
        client,
        AuditEvent::new(AuditAction::Create, "stock_entries")
            .by(actor.id)
            .record(entry.id)
            .details(format!(
                "product={} quantity={} unit_price={}",
                entry.product_id, entry.quantity, entry.unit_price
            )),
    )
    .await;
    Ok(entry)
}
