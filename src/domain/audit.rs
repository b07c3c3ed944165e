//! Audit action vocabulary.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Login,
    LoginFailed,
    Register,
    PasswordResetRequest,
    Create,
    Update,
    Delete,
    Upload,
    Export,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "LOGIN",
            AuditAction::LoginFailed => "LOGIN_FAILED",
            AuditAction::Register => "REGISTER",
            AuditAction::PasswordResetRequest => "PASSWORD_RESET_REQUEST",
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
            AuditAction::Upload => "UPLOAD",
            AuditAction::Export => "EXPORT",
        }
    }
}
