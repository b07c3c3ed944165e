//! Audit trail writes. A failed write is logged and never fails the action.

use crate::domain::{AuditAction, AuditRepository, DomainError, NewAuditEntry};
use crate::models::audit_log;

/// Where a request came from
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// One audit row before the client details are attached
#[derive(Debug, Clone)]
pub struct AuditEvent {
    action: AuditAction,
    table: &'static str,
    user_id: Option<i32>,
    record_id: Option<i32>,
    details: Option<String>,
}

impl AuditEvent {
    pub fn new(action: AuditAction, table: &'static str) -> Self {
        Self {
            action,
            table,
            user_id: None,
            record_id: None,
            details: None,
        }
    }

    pub fn by(mut self, user_id: impl Into<Option<i32>>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn record(mut self, record_id: i32) -> Self {
        self.record_id = Some(record_id);
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

pub async fn record(repo: &dyn AuditRepository, client: &ClientInfo, event: AuditEvent) {
    let entry = NewAuditEntry {
        user_id: event.user_id,
        action_type: event.action.as_str().to_string(),
        table_name: event.table.to_string(),
        record_id: event.record_id,
        details: event.details,
        ip_address: client.ip_address.clone(),
        user_agent: client.user_agent.clone(),
    };

    if let Err(e) = repo.append(entry).await {
        tracing::error!(
            "Failed to write audit entry {} on {}: {}",
            event.action.as_str(),
            event.table,
            e
        );
    }
}

const CSV_HEADER: [&str; 9] = [
    "id",
    "created_at",
    "user_id",
    "action_type",
    "table_name",
    "record_id",
    "action_details",
    "ip_address",
    "user_agent",
];

/// Audit rows as CSV, header first
pub fn to_csv(rows: &[audit_log::Model]) -> Result<Vec<u8>, DomainError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let internal = |e: csv::Error| DomainError::Internal(e.to_string());

    writer.write_record(CSV_HEADER).map_err(internal)?;
    for row in rows {
        writer
            .write_record([
                row.id.to_string(),
                row.created_at.clone(),
                row.user_id.map(|v| v.to_string()).unwrap_or_default(),
                row.action_type.clone(),
                row.table_name.clone(),
                row.record_id.map(|v| v.to_string()).unwrap_or_default(),
                row.action_details.clone().unwrap_or_default(),
                row.ip_address.clone().unwrap_or_default(),
                row.user_agent.clone().unwrap_or_default(),
            ])
            .map_err(internal)?;
    }

    writer
        .into_inner()
        .map_err(|e| DomainError::Internal(e.to_string()))
}
