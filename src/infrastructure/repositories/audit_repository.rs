//! SeaORM implementation of AuditRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::domain::{AuditFilter, AuditRepository, DomainError, NewAuditEntry};
use crate::models::audit_log::{ActiveModel, Column, Entity as AuditEntity, Model};

pub struct SeaOrmAuditRepository {
    db: DatabaseConnection,
}

impl SeaOrmAuditRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuditRepository for SeaOrmAuditRepository {
    async fn append(&self, entry: NewAuditEntry) -> Result<(), DomainError> {
        ActiveModel {
            user_id: Set(entry.user_id),
            action_type: Set(entry.action_type),
            table_name: Set(entry.table_name),
            record_id: Set(entry.record_id),
            action_details: Set(entry.details),
            ip_address: Set(entry.ip_address),
            user_agent: Set(entry.user_agent),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }

    async fn find_all(&self, filter: AuditFilter) -> Result<Vec<Model>, DomainError> {
        let mut query = AuditEntity::find();

        if let Some(user_id) = filter.user_id {
            query = query.filter(Column::UserId.eq(user_id));
        }
        if let Some(action) = filter.action_type.as_deref().filter(|a| !a.is_empty()) {
            query = query.filter(Column::ActionType.eq(action));
        }
        // created_at is RFC 3339 UTC, so day bounds compare lexically
        if let Some(from) = filter.from {
            query = query.filter(Column::CreatedAt.gte(from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = filter.to.and_then(|d| d.succ_opt()) {
            query = query.filter(Column::CreatedAt.lt(to.format("%Y-%m-%d").to_string()));
        }

        query = query
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id);
        if let Some((offset, limit)) = filter.page_request().window()? {
            query = query.offset(offset).limit(limit);
        }

        Ok(query.all(&self.db).await?)
    }
}
