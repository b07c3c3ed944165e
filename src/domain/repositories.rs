//! Repository trait definitions
//!
//! These traits define the contract for data access.
//! Implementations live in the infrastructure layer.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{DomainError, Role};
use crate::models::{audit_log, document, product, stock_entry, supplier, user};

/// Optional 1-based pagination. Absent means "everything".
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl PageRequest {
    pub const MAX_PER_PAGE: u64 = 500;

    /// `(offset, limit)` when pagination was requested
    pub fn window(&self) -> Result<Option<(u64, u64)>, DomainError> {
        let Some(per_page) = self.per_page else {
            return Ok(None);
        };
        let per_page = per_page.clamp(1, Self::MAX_PER_PAGE);
        let page = self.page.unwrap_or(1).max(1);
        let offset = (page - 1)
            .checked_mul(per_page)
            .filter(|o| *o <= i64::MAX as u64)
            .ok_or_else(|| DomainError::validation(format!("Page {} is out of range", page)))?;
        Ok(Some((offset, per_page)))
    }
}

// ---------------------------------------------------------------------------
// Suppliers

/// Filter criteria for supplier queries
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SupplierFilter {
    /// Case-insensitive substring of name, contact person or city
    pub search: Option<String>,
    pub country: Option<String>,
}

/// Input for creating or replacing a supplier
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SupplierInput {
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Defaults to China when absent or blank
    pub country: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub tax_id: Option<String>,
    #[serde(default)]
    pub ce_certification: bool,
    #[serde(default)]
    pub rohs_certification: bool,
    pub notes: Option<String>,
}

#[async_trait]
pub trait SupplierRepository: Send + Sync {
    /// Suppliers ordered by name
    async fn find_all(&self, filter: SupplierFilter) -> Result<Vec<supplier::Model>, DomainError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<supplier::Model>, DomainError>;

    async fn create(&self, input: SupplierInput) -> Result<supplier::Model, DomainError>;

    async fn update(&self, id: i32, input: SupplierInput) -> Result<supplier::Model, DomainError>;

    /// Fails with `Conflict` while products or stock entries still reference it
    async fn delete(&self, id: i32) -> Result<(), DomainError>;
}

// ---------------------------------------------------------------------------
// Products

/// Filter criteria for product queries
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ProductFilter {
    /// Case-insensitive substring of name or SKU
    pub search: Option<String>,
    /// Exact category match
    pub category: Option<String>,
    pub supplier_id: Option<i32>,
    #[serde(default)]
    pub low_stock_only: bool,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl ProductFilter {
    pub fn page_request(&self) -> PageRequest {
        PageRequest {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// Product row joined with its supplier name
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: product::Model,
    pub supplier_name: Option<String>,
    pub low_stock: bool,
}

impl ProductView {
    pub fn new(product: product::Model, supplier: Option<supplier::Model>) -> Self {
        let low_stock = product.is_low_stock();
        Self {
            product,
            supplier_name: supplier.map(|s| s.name),
            low_stock,
        }
    }
}

/// Paginated result with total count
#[derive(Debug)]
pub struct PaginatedProducts {
    pub products: Vec<ProductView>,
    pub total: u64,
}

/// Input for creating or replacing a product
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductInput {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub supplier_id: Option<i32>,
    pub purchase_price: Option<f64>,
    pub stock_quantity: Option<i32>,
    pub stock_alert_threshold: Option<i32>,
    pub dimensions: Option<String>,
    pub weight: Option<f64>,
    pub technical_specs: Option<String>,
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Products matching the filter, ordered by name
    async fn find_all(&self, filter: ProductFilter) -> Result<PaginatedProducts, DomainError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<ProductView>, DomainError>;

    async fn find_by_sku(&self, sku: &str) -> Result<Option<product::Model>, DomainError>;

    /// Products at or below their alert threshold, lowest quantity first
    async fn find_low_stock(&self, limit: Option<u64>) -> Result<Vec<ProductView>, DomainError>;

    /// Distinct non-empty categories, sorted
    async fn categories(&self) -> Result<Vec<String>, DomainError>;

    async fn create(&self, input: ProductInput) -> Result<product::Model, DomainError>;

    async fn update(&self, id: i32, input: ProductInput) -> Result<product::Model, DomainError>;

    async fn set_image_path(&self, id: i32, path: String) -> Result<product::Model, DomainError>;

    /// Fails with `Conflict` while stock entries reference it
    async fn delete(&self, id: i32) -> Result<(), DomainError>;
}

// ---------------------------------------------------------------------------
// Stock ledger

/// Stock entry joined with product and supplier names
#[derive(Debug, Clone, Serialize)]
pub struct StockEntryView {
    #[serde(flatten)]
    pub entry: stock_entry::Model,
    pub product_name: Option<String>,
    pub sku: Option<String>,
    pub supplier_name: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct StockEntryFilter {
    pub product_id: Option<i32>,
    pub supplier_id: Option<i32>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StockEntryInput {
    pub product_id: i32,
    pub supplier_id: i32,
    pub quantity: i32,
    pub unit_price: f64,
    pub invoice_number: Option<String>,
    pub notes: Option<String>,
    /// RFC 3339; defaults to now
    pub entry_date: Option<String>,
}

#[async_trait]
pub trait StockRepository: Send + Sync {
    /// Entries newest first
    async fn find_all(&self, filter: StockEntryFilter) -> Result<Vec<StockEntryView>, DomainError>;

    /// Append an entry and raise the product's running quantity in one transaction
    async fn record(&self, input: StockEntryInput) -> Result<stock_entry::Model, DomainError>;
}

// ---------------------------------------------------------------------------
// Documents

#[derive(Debug, Default, Clone, Deserialize)]
pub struct DocumentFilter {
    /// Case-insensitive substring of title or file name
    pub search: Option<String>,
    pub category: Option<String>,
    pub supplier_id: Option<i32>,
    pub product_id: Option<i32>,
    pub limit: Option<u64>,
}

/// Metadata for a file that is already on disk
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub title: String,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub category: String,
    pub supplier_id: Option<i32>,
    pub product_id: Option<i32>,
    pub uploaded_by: Option<i32>,
}

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Documents newest first
    async fn find_all(&self, filter: DocumentFilter) -> Result<Vec<document::Model>, DomainError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<document::Model>, DomainError>;

    async fn create(&self, doc: NewDocument) -> Result<document::Model, DomainError>;

    /// Removes the row and returns it so the caller can drop the file
    async fn delete(&self, id: i32) -> Result<document::Model, DomainError>;
}

// ---------------------------------------------------------------------------
// Users

#[derive(Debug, Default, Clone, Deserialize)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Outcome of an insert-or-update keyed on email
#[derive(Debug)]
pub struct UpsertedUser {
    pub user: user::Model,
    pub created: bool,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_all(&self, filter: UserFilter) -> Result<Vec<user::Model>, DomainError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<user::Model>, DomainError>;

    /// Exact match on username OR email
    async fn find_by_login(&self, identifier: &str) -> Result<Option<user::Model>, DomainError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, DomainError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<user::Model>, DomainError>;

    async fn create(&self, user: NewUser) -> Result<user::Model, DomainError>;

    /// Insert, or replace username and password hash of the row holding `email`.
    /// An existing row keeps its role.
    async fn upsert_by_email(&self, user: NewUser) -> Result<UpsertedUser, DomainError>;

    async fn set_role(&self, id: i32, role: Role) -> Result<user::Model, DomainError>;

    async fn set_active(&self, id: i32, active: bool) -> Result<user::Model, DomainError>;

    async fn set_password_hash(&self, id: i32, hash: String) -> Result<(), DomainError>;

    async fn touch_last_login(&self, id: i32) -> Result<(), DomainError>;

    async fn delete(&self, id: i32) -> Result<(), DomainError>;
}

// ---------------------------------------------------------------------------
// Audit log

#[derive(Debug, Clone, Default)]
pub struct NewAuditEntry {
    pub user_id: Option<i32>,
    pub action_type: String,
    pub table_name: String,
    pub record_id: Option<i32>,
    pub details: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct AuditFilter {
    pub user_id: Option<i32>,
    pub action_type: Option<String>,
    /// Inclusive start day (UTC)
    pub from: Option<NaiveDate>,
    /// Inclusive end day (UTC)
    pub to: Option<NaiveDate>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl AuditFilter {
    pub fn page_request(&self) -> PageRequest {
        PageRequest {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn append(&self, entry: NewAuditEntry) -> Result<(), DomainError>;

    /// Entries newest first
    async fn find_all(&self, filter: AuditFilter) -> Result<Vec<audit_log::Model>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::{DomainError, PageRequest};

    #[test]
    fn no_per_page_means_no_window() {
        assert_eq!(PageRequest::default().window().unwrap(), None);
        let req = PageRequest {
            page: Some(3),
            per_page: None,
        };
        assert_eq!(req.window().unwrap(), None);
    }

    #[test]
    fn window_is_one_based_and_clamped() {
        let req = PageRequest {
            page: Some(3),
            per_page: Some(10),
        };
        assert_eq!(req.window().unwrap(), Some((20, 10)));

        let req = PageRequest {
            page: Some(0),
            per_page: Some(10_000),
        };
        assert_eq!(req.window().unwrap(), Some((0, PageRequest::MAX_PER_PAGE)));
    }

    #[test]
    fn huge_page_is_rejected_not_wrapped() {
        let req = PageRequest {
            page: Some(u64::MAX),
            per_page: Some(10),
        };
        assert!(matches!(req.window(), Err(DomainError::Validation(_))));

        // Offsets must still fit SQLite's signed 64-bit integers
        let req = PageRequest {
            page: Some(u64::MAX / 500),
            per_page: Some(500),
        };
        assert!(matches!(req.window(), Err(DomainError::Validation(_))));
    }
}
