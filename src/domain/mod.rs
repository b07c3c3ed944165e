//! Domain layer - Business abstractions
//!
//! Trait definitions, filters and inputs, roles and the domain error type.
//! Row types are shared with `crate::models`; no Axum in here.

pub mod audit;
pub mod errors;
pub mod repositories;
pub mod roles;

pub use audit::AuditAction;
pub use errors::DomainError;
pub use repositories::*;
pub use roles::{Page, Permission, Role};
