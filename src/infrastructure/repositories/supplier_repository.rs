//! SeaORM implementation of SupplierRepository

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use super::contains_text;
use crate::domain::{DomainError, SupplierFilter, SupplierInput, SupplierRepository};
use crate::models::{document, product};
use crate::models::stock_entry;
use crate::models::supplier::{ActiveModel, Column, DEFAULT_COUNTRY, Entity as SupplierEntity, Model};

pub struct SeaOrmSupplierRepository {
    db: DatabaseConnection,
}

impl SeaOrmSupplierRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn country_or_default(country: Option<String>) -> String {
    country
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_COUNTRY.to_string())
}

fn validate(input: &SupplierInput) -> Result<(), DomainError> {
    if input.name.trim().is_empty() {
        return Err(DomainError::validation("Supplier name is required"));
    }
    Ok(())
}

#[async_trait]
impl SupplierRepository for SeaOrmSupplierRepository {
    async fn find_all(&self, filter: SupplierFilter) -> Result<Vec<Model>, DomainError> {
        let mut query = SupplierEntity::find();

        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(contains_text(Column::Name, search))
                    .add(contains_text(Column::ContactPerson, search))
                    .add(contains_text(Column::City, search)),
            );
        }
        if let Some(country) = filter.country.filter(|c| !c.is_empty()) {
            query = query.filter(Column::Country.eq(country));
        }

        Ok(query.order_by_asc(Column::Name).all(&self.db).await?)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Model>, DomainError> {
        Ok(SupplierEntity::find_by_id(id).one(&self.db).await?)
    }

    async fn create(&self, input: SupplierInput) -> Result<Model, DomainError> {
        validate(&input)?;
        let now = chrono::Utc::now().to_rfc3339();

        let supplier = ActiveModel {
            name: Set(input.name.trim().to_string()),
            contact_person: Set(input.contact_person),
            email: Set(input.email),
            phone: Set(input.phone),
            country: Set(country_or_default(input.country)),
            city: Set(input.city),
            address: Set(input.address),
            postal_code: Set(input.postal_code),
            tax_id: Set(input.tax_id),
            ce_certification: Set(input.ce_certification),
            rohs_certification: Set(input.rohs_certification),
            notes: Set(input.notes),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        Ok(supplier.insert(&self.db).await?)
    }

    async fn update(&self, id: i32, input: SupplierInput) -> Result<Model, DomainError> {
        validate(&input)?;
        let existing = SupplierEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::not_found("Supplier"))?;

        let mut active: ActiveModel = existing.into();
        active.name = Set(input.name.trim().to_string());
        active.contact_person = Set(input.contact_person);
        active.email = Set(input.email);
        active.phone = Set(input.phone);
        active.country = Set(country_or_default(input.country));
        active.city = Set(input.city);
        active.address = Set(input.address);
        active.postal_code = Set(input.postal_code);
        active.tax_id = Set(input.tax_id);
        active.ce_certification = Set(input.ce_certification);
        active.rohs_certification = Set(input.rohs_certification);
        active.notes = Set(input.notes);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        Ok(active.update(&self.db).await?)
    }

    async fn delete(&self, id: i32) -> Result<(), DomainError> {
        if SupplierEntity::find_by_id(id).one(&self.db).await?.is_none() {
            return Err(DomainError::not_found("Supplier"));
        }

        let products = product::Entity::find()
            .filter(product::Column::SupplierId.eq(id))
            .count(&self.db)
            .await?;
        let entries = stock_entry::Entity::find()
            .filter(stock_entry::Column::SupplierId.eq(id))
            .count(&self.db)
            .await?;
        if products > 0 || entries > 0 {
            return Err(DomainError::Conflict(format!(
                "Supplier is referenced by {} products and {} stock entries",
                products, entries
            )));
        }

        document::Entity::update_many()
            .col_expr(document::Column::SupplierId, Expr::value(Option::<i32>::None))
            .filter(document::Column::SupplierId.eq(id))
            .exec(&self.db)
            .await?;

        SupplierEntity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }
}
