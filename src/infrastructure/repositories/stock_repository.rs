//! SeaORM implementation of StockRepository

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

use crate::domain::{
    DomainError, StockEntryFilter, StockEntryInput, StockEntryView, StockRepository,
};
use crate::models::stock_entry::{ActiveModel, Column, Entity as StockEntryEntity, Model};
use crate::models::{product, supplier};

pub struct SeaOrmStockRepository {
    db: DatabaseConnection,
}

impl SeaOrmStockRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Accepts RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC)
fn normalize_entry_date(raw: Option<String>) -> Result<String, DomainError> {
    let Some(raw) = raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) else {
        return Ok(chrono::Utc::now().to_rfc3339());
    };

    if DateTime::parse_from_rfc3339(&raw).is_ok() {
        return Ok(raw);
    }
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().to_rfc3339())
        .ok_or_else(|| DomainError::validation(format!("Invalid entry date: {}", raw)))
}

#[async_trait]
impl StockRepository for SeaOrmStockRepository {
    async fn find_all(&self, filter: StockEntryFilter) -> Result<Vec<StockEntryView>, DomainError> {
        let mut query = StockEntryEntity::find();
        if let Some(product_id) = filter.product_id {
            query = query.filter(Column::ProductId.eq(product_id));
        }
        if let Some(supplier_id) = filter.supplier_id {
            query = query.filter(Column::SupplierId.eq(supplier_id));
        }
        query = query
            .order_by_desc(Column::EntryDate)
            .order_by_desc(Column::Id);
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }

        let entries = query.all(&self.db).await?;
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let product_ids: Vec<i32> = entries.iter().map(|e| e.product_id).collect();
        let supplier_ids: Vec<i32> = entries.iter().map(|e| e.supplier_id).collect();

        let products: HashMap<i32, product::Model> = product::Entity::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        let suppliers: HashMap<i32, String> = supplier::Entity::find()
            .filter(supplier::Column::Id.is_in(supplier_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();

        Ok(entries
            .into_iter()
            .map(|entry| {
                let product = products.get(&entry.product_id);
                StockEntryView {
                    product_name: product.map(|p| p.name.clone()),
                    sku: product.map(|p| p.sku.clone()),
                    supplier_name: suppliers.get(&entry.supplier_id).cloned(),
                    entry,
                }
            })
            .collect())
    }

    async fn record(&self, input: StockEntryInput) -> Result<Model, DomainError> {
        if input.quantity <= 0 {
            return Err(DomainError::validation("Quantity must be positive"));
        }
        if input.unit_price < 0.0 || !input.unit_price.is_finite() {
            return Err(DomainError::validation("Unit price cannot be negative"));
        }
        let entry_date = normalize_entry_date(input.entry_date)?;

        let txn = self.db.begin().await?;

        let product = product::Entity::find_by_id(input.product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| DomainError::not_found("Product"))?;
        if supplier::Entity::find_by_id(input.supplier_id)
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(DomainError::not_found("Supplier"));
        }

        let entry = ActiveModel {
            product_id: Set(input.product_id),
            supplier_id: Set(input.supplier_id),
            quantity: Set(input.quantity),
            unit_price: Set(input.unit_price),
            entry_date: Set(entry_date.clone()),
            invoice_number: Set(input.invoice_number),
            notes: Set(input.notes),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let new_quantity = product
            .stock_quantity
            .checked_add(input.quantity)
            .ok_or_else(|| DomainError::validation("Stock quantity overflow"))?;
        let mut active: product::ActiveModel = product.into();
        active.stock_quantity = Set(new_quantity);
        active.last_purchase_date = Set(Some(entry_date));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&txn).await?;

        txn.commit().await?;

        tracing::info!(
            "Stock entry {} recorded: product {} +{} (now {})",
            entry.id,
            entry.product_id,
            entry.quantity,
            new_quantity
        );
        Ok(entry)
    }
}
