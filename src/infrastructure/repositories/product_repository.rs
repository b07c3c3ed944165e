//! SeaORM implementation of ProductRepository

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set,
};

use super::contains_text;
use crate::domain::{
    DomainError, PaginatedProducts, ProductFilter, ProductInput, ProductRepository, ProductView,
};
use crate::models::product::{
    ActiveModel, Column, DEFAULT_ALERT_THRESHOLD, Entity as ProductEntity, Model,
};
use crate::models::supplier::Entity as SupplierEntity;
use crate::models::{document, stock_entry};

pub struct SeaOrmProductRepository {
    db: DatabaseConnection,
}

impl SeaOrmProductRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn validate(&self, input: &ProductInput) -> Result<(), DomainError> {
        if input.sku.trim().is_empty() {
            return Err(DomainError::validation("SKU is required"));
        }
        if input.name.trim().is_empty() {
            return Err(DomainError::validation("Product name is required"));
        }
        if input.purchase_price.is_some_and(|p| p < 0.0) {
            return Err(DomainError::validation("Purchase price cannot be negative"));
        }
        if input.stock_quantity.is_some_and(|q| q < 0) {
            return Err(DomainError::validation("Stock quantity cannot be negative"));
        }
        if input.stock_alert_threshold.is_some_and(|t| t < 0) {
            return Err(DomainError::validation("Alert threshold cannot be negative"));
        }
        if let Some(supplier_id) = input.supplier_id {
            if SupplierEntity::find_by_id(supplier_id)
                .one(&self.db)
                .await?
                .is_none()
            {
                return Err(DomainError::validation(format!(
                    "Supplier {} does not exist",
                    supplier_id
                )));
            }
        }
        Ok(())
    }

    /// SKU must be free, or held by `except`
    async fn ensure_sku_free(&self, sku: &str, except: Option<i32>) -> Result<(), DomainError> {
        if let Some(holder) = self.find_by_sku(sku).await? {
            if Some(holder.id) != except {
                return Err(DomainError::Conflict(format!("SKU {} already exists", sku)));
            }
        }
        Ok(())
    }
}

/// `stock_quantity <= stock_alert_threshold`
fn low_stock() -> SimpleExpr {
    Expr::col((ProductEntity, Column::StockQuantity))
        .lte(Expr::col((ProductEntity, Column::StockAlertThreshold)))
}

fn filtered(filter: &ProductFilter) -> Select<ProductEntity> {
    let mut query = ProductEntity::find();

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.filter(
            Condition::any()
                .add(contains_text(Column::Name, search))
                .add(contains_text(Column::Sku, search)),
        );
    }
    if let Some(category) = filter.category.as_deref().filter(|c| !c.is_empty()) {
        query = query.filter(Column::Category.eq(category));
    }
    if let Some(supplier_id) = filter.supplier_id {
        query = query.filter(Column::SupplierId.eq(supplier_id));
    }
    if filter.low_stock_only {
        query = query.filter(low_stock());
    }

    query
}

#[async_trait]
impl ProductRepository for SeaOrmProductRepository {
    async fn find_all(&self, filter: ProductFilter) -> Result<PaginatedProducts, DomainError> {
        let window = filter.page_request().window()?;
        let query = filtered(&filter);
        let total = query.clone().count(&self.db).await?;

        let mut query = query
            .order_by_asc(Column::Name)
            .find_also_related(SupplierEntity);
        if let Some((offset, limit)) = window {
            query = query.offset(offset).limit(limit);
        }

        let products = query
            .all(&self.db)
            .await?
            .into_iter()
            .map(|(product, supplier)| ProductView::new(product, supplier))
            .collect();

        Ok(PaginatedProducts { products, total })
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<ProductView>, DomainError> {
        let result = ProductEntity::find_by_id(id)
            .find_also_related(SupplierEntity)
            .one(&self.db)
            .await?;

        Ok(result.map(|(product, supplier)| ProductView::new(product, supplier)))
    }

    async fn find_by_sku(&self, sku: &str) -> Result<Option<Model>, DomainError> {
        Ok(ProductEntity::find()
            .filter(Column::Sku.eq(sku.trim()))
            .one(&self.db)
            .await?)
    }

    async fn find_low_stock(&self, limit: Option<u64>) -> Result<Vec<ProductView>, DomainError> {
        let mut query = ProductEntity::find()
            .filter(low_stock())
            .order_by_asc(Column::StockQuantity)
            .order_by_asc(Column::Name)
            .find_also_related(SupplierEntity);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        Ok(query
            .all(&self.db)
            .await?
            .into_iter()
            .map(|(product, supplier)| ProductView::new(product, supplier))
            .collect())
    }

    async fn categories(&self) -> Result<Vec<String>, DomainError> {
        let categories = ProductEntity::find()
            .select_only()
            .column(Column::Category)
            .distinct()
            .filter(Column::Category.is_not_null())
            .filter(Column::Category.ne(""))
            .order_by_asc(Column::Category)
            .into_tuple::<String>()
            .all(&self.db)
            .await?;
        Ok(categories)
    }

    async fn create(&self, input: ProductInput) -> Result<Model, DomainError> {
        self.validate(&input).await?;
        self.ensure_sku_free(&input.sku, None).await?;
        let now = chrono::Utc::now().to_rfc3339();

        let product = ActiveModel {
            sku: Set(input.sku.trim().to_string()),
            name: Set(input.name.trim().to_string()),
            description: Set(input.description),
            category: Set(input.category.filter(|c| !c.trim().is_empty())),
            supplier_id: Set(input.supplier_id),
            purchase_price: Set(input.purchase_price),
            stock_quantity: Set(input.stock_quantity.unwrap_or(0)),
            stock_alert_threshold: Set(input
                .stock_alert_threshold
                .unwrap_or(DEFAULT_ALERT_THRESHOLD)),
            image_path: Set(None),
            dimensions: Set(input.dimensions),
            weight: Set(input.weight),
            technical_specs: Set(input.technical_specs),
            last_purchase_date: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        Ok(product.insert(&self.db).await?)
    }

    async fn update(&self, id: i32, input: ProductInput) -> Result<Model, DomainError> {
        let existing = ProductEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::not_found("Product"))?;
        self.validate(&input).await?;
        self.ensure_sku_free(&input.sku, Some(id)).await?;

        let quantity = input.stock_quantity.unwrap_or(existing.stock_quantity);
        let threshold = input
            .stock_alert_threshold
            .unwrap_or(existing.stock_alert_threshold);

        let mut active: ActiveModel = existing.into();
        active.sku = Set(input.sku.trim().to_string());
        active.name = Set(input.name.trim().to_string());
        active.description = Set(input.description);
        active.category = Set(input.category.filter(|c| !c.trim().is_empty()));
        active.supplier_id = Set(input.supplier_id);
        active.purchase_price = Set(input.purchase_price);
        active.stock_quantity = Set(quantity);
        active.stock_alert_threshold = Set(threshold);
        active.dimensions = Set(input.dimensions);
        active.weight = Set(input.weight);
        active.technical_specs = Set(input.technical_specs);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        Ok(active.update(&self.db).await?)
    }

    async fn set_image_path(&self, id: i32, path: String) -> Result<Model, DomainError> {
        let existing = ProductEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::not_found("Product"))?;

        let mut active: ActiveModel = existing.into();
        active.image_path = Set(Some(path));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        Ok(active.update(&self.db).await?)
    }

    async fn delete(&self, id: i32) -> Result<(), DomainError> {
        if ProductEntity::find_by_id(id).one(&self.db).await?.is_none() {
            return Err(DomainError::not_found("Product"));
        }

        let entries = stock_entry::Entity::find()
            .filter(stock_entry::Column::ProductId.eq(id))
            .count(&self.db)
            .await?;
        if entries > 0 {
            return Err(DomainError::Conflict(format!(
                "Product has {} stock entries",
                entries
            )));
        }

        document::Entity::update_many()
            .col_expr(document::Column::ProductId, Expr::value(Option::<i32>::None))
            .filter(document::Column::ProductId.eq(id))
            .exec(&self.db)
            .await?;

        ProductEntity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }
}
