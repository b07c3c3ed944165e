//! Audit log API handlers (Admin only)

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::domain::{AuditAction, AuditFilter, DomainError, Permission};
use crate::infrastructure::auth::CurrentUser;
use crate::infrastructure::AppState;
use crate::services::audit_service::{self, AuditEvent};
use crate::services::ClientInfo;

#[utoipa::path(
    get,
    path = "/api/audit",
    params(
        ("user_id" = Option<i32>, Query, description = "Acting user"),
        ("action_type" = Option<String>, Query, description = "e.g. LOGIN, CREATE, DELETE"),
        ("from" = Option<String>, Query, description = "First day, YYYY-MM-DD"),
        ("to" = Option<String>, Query, description = "Last day, YYYY-MM-DD"),
        ("page" = Option<u64>, Query, description = "1-based page"),
        ("per_page" = Option<u64>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Audit rows, newest first"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn list_audit(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(filter): Query<AuditFilter>,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::ViewAudit)?;
    let entries = state.audit_repo.find_all(filter).await?;
    Ok(Json(json!({
        "total": entries.len(),
        "entries": entries
    })))
}

#[utoipa::path(
    get,
    path = "/api/audit/export",
    responses(
        (status = 200, description = "Filtered audit rows as CSV", content_type = "text/csv"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn export_audit(
    State(state): State<AppState>,
    user: CurrentUser,
    client: ClientInfo,
    Query(filter): Query<AuditFilter>,
) -> Result<impl IntoResponse, DomainError> {
    user.require(Permission::ViewAudit)?;
    let entries = state.audit_repo.find_all(filter).await?;
    let body = audit_service::to_csv(&entries)?;

    audit_service::record(
        state.audit_repo.as_ref(),
        &client,
        AuditEvent::new(AuditAction::Export, "audit_log")
            .by(user.id)
            .details(format!("{} rows", entries.len())),
    )
    .await;

    let file_name = format!(
        "audit_log_{}.csv",
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    ))
}
