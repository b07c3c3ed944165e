//! Services Layer
//!
//! Business logic between the HTTP handlers and the repositories: validation
//! that spans several tables, file handling and the audit trail.

pub mod audit_service;
pub mod auth_service;
pub mod document_service;
pub mod inventory_service;
pub mod report_service;
pub mod user_service;

pub use audit_service::{AuditEvent, ClientInfo};
