//! SeaORM implementation of DocumentRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use super::contains_text;
use crate::domain::{DocumentFilter, DocumentRepository, DomainError, NewDocument};
use crate::models::document::{ActiveModel, Column, Entity as DocumentEntity, Model};

pub struct SeaOrmDocumentRepository {
    db: DatabaseConnection,
}

impl SeaOrmDocumentRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentRepository for SeaOrmDocumentRepository {
    async fn find_all(&self, filter: DocumentFilter) -> Result<Vec<Model>, DomainError> {
        let mut query = DocumentEntity::find();

        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(contains_text(Column::Title, search))
                    .add(contains_text(Column::FileName, search)),
            );
        }
        if let Some(category) = filter.category.filter(|c| !c.is_empty()) {
            query = query.filter(Column::Category.eq(category));
        }
        if let Some(supplier_id) = filter.supplier_id {
            query = query.filter(Column::SupplierId.eq(supplier_id));
        }
        if let Some(product_id) = filter.product_id {
            query = query.filter(Column::ProductId.eq(product_id));
        }

        query = query
            .order_by_desc(Column::UploadDate)
            .order_by_desc(Column::Id);
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }

        Ok(query.all(&self.db).await?)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Model>, DomainError> {
        Ok(DocumentEntity::find_by_id(id).one(&self.db).await?)
    }

    async fn create(&self, doc: NewDocument) -> Result<Model, DomainError> {
        let document = ActiveModel {
            title: Set(doc.title),
            file_name: Set(doc.file_name),
            file_path: Set(doc.file_path),
            file_size: Set(doc.file_size),
            category: Set(doc.category),
            supplier_id: Set(doc.supplier_id),
            product_id: Set(doc.product_id),
            upload_date: Set(chrono::Utc::now().to_rfc3339()),
            uploaded_by: Set(doc.uploaded_by),
            ..Default::default()
        };

        Ok(document.insert(&self.db).await?)
    }

    async fn delete(&self, id: i32) -> Result<Model, DomainError> {
        let existing = DocumentEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::not_found("Document"))?;

        DocumentEntity::delete_by_id(id).exec(&self.db).await?;
        Ok(existing)
    }
}
