//! Report Service - dashboard aggregates and stock reconciliation

use std::collections::HashMap;

use sea_orm::sea_query::Expr;
use sea_orm::*;
use serde::Serialize;

use crate::domain::{DomainError, ProductView, StockEntryFilter, StockEntryView};
use crate::infrastructure::AppState;
use crate::models::{document, product, stock_entry, supplier, user};

/// How many alerts and recent entries the dashboard shows
pub const DASHBOARD_ROWS: u64 = 5;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardStats {
    pub total_suppliers: u64,
    pub total_products: u64,
    pub total_users: u64,
    pub total_documents: u64,
    pub low_stock_products: u64,
    /// Σ stock_quantity × purchase_price over priced products
    pub total_stock_value: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SupplierProductCount {
    pub supplier_id: i32,
    pub supplier_name: String,
    pub product_count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StockDrift {
    pub product_id: i32,
    pub sku: String,
    pub name: String,
    pub stock_quantity: i32,
    pub ledger_total: i64,
    /// stock_quantity minus ledger_total
    pub difference: i64,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub stock_alerts: Vec<ProductView>,
    pub recent_entries: Vec<StockEntryView>,
    pub products_per_supplier: Vec<SupplierProductCount>,
}

pub async fn stats(db: &DatabaseConnection) -> Result<DashboardStats, DomainError> {
    let low_stock_products = product::Entity::find()
        .filter(
            Expr::col(product::Column::StockQuantity)
                .lte(Expr::col(product::Column::StockAlertThreshold)),
        )
        .count(db)
        .await?;

    let priced: Vec<(i32, f64)> = product::Entity::find()
        .select_only()
        .column(product::Column::StockQuantity)
        .column(product::Column::PurchasePrice)
        .filter(product::Column::PurchasePrice.is_not_null())
        .into_tuple()
        .all(db)
        .await?;
    let total_stock_value = priced
        .iter()
        .map(|(qty, price)| f64::from(*qty) * price)
        .sum();

    Ok(DashboardStats {
        total_suppliers: supplier::Entity::find().count(db).await?,
        total_products: product::Entity::find().count(db).await?,
        total_users: user::Entity::find().count(db).await?,
        total_documents: document::Entity::find().count(db).await?,
        low_stock_products,
        total_stock_value,
    })
}

/// Every supplier with its product count, busiest first
pub async fn products_per_supplier(
    db: &DatabaseConnection,
) -> Result<Vec<SupplierProductCount>, DomainError> {
    let counts: HashMap<i32, i64> = product::Entity::find()
        .select_only()
        .column(product::Column::SupplierId)
        .column_as(Expr::col(product::Column::Id).count(), "product_count")
        .filter(product::Column::SupplierId.is_not_null())
        .group_by(product::Column::SupplierId)
        .into_tuple::<(i32, i64)>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    let mut rows: Vec<SupplierProductCount> = supplier::Entity::find()
        .order_by_asc(supplier::Column::Name)
        .all(db)
        .await?
        .into_iter()
        .map(|s| SupplierProductCount {
            product_count: counts.get(&s.id).copied().unwrap_or(0),
            supplier_id: s.id,
            supplier_name: s.name,
        })
        .collect();

    // stable: equal counts stay alphabetical
    rows.sort_by(|a, b| b.product_count.cmp(&a.product_count));
    Ok(rows)
}

/// Products whose running quantity disagrees with the sum of their ledger
pub async fn reconciliation(db: &DatabaseConnection) -> Result<Vec<StockDrift>, DomainError> {
    let ledger: HashMap<i32, i64> = stock_entry::Entity::find()
        .select_only()
        .column(stock_entry::Column::ProductId)
        .column_as(Expr::col(stock_entry::Column::Quantity).sum(), "ledger_total")
        .group_by(stock_entry::Column::ProductId)
        .into_tuple::<(i32, i64)>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    let products = product::Entity::find()
        .order_by_asc(product::Column::Name)
        .all(db)
        .await?;

    Ok(products
        .into_iter()
        .filter_map(|p| {
            let ledger_total = ledger.get(&p.id).copied().unwrap_or(0);
            let difference = i64::from(p.stock_quantity) - ledger_total;
            (difference != 0).then(|| StockDrift {
                product_id: p.id,
                sku: p.sku,
                name: p.name,
                stock_quantity: p.stock_quantity,
                ledger_total,
                difference,
            })
        })
        .collect())
}

pub async fn dashboard(state: &AppState) -> Result<Dashboard, DomainError> {
    let db = state.db();
    Ok(Dashboard {
        stats: stats(db).await?,
        stock_alerts: state.product_repo.find_low_stock(Some(DASHBOARD_ROWS)).await?,
        recent_entries: state
            .stock_repo
            .find_all(StockEntryFilter {
                limit: Some(DASHBOARD_ROWS),
                ..Default::default()
            })
            .await?,
        products_per_supplier: products_per_supplier(db).await?,
    })
}
