pub mod audit;
pub mod auth;
pub mod context;
pub mod dashboard;
pub mod document;
pub mod error;
pub mod health;
pub mod product;
pub mod stock;
pub mod supplier;
pub mod user;

use axum::{
    extract::multipart::MultipartError,
    routing::{get, post, put},
    Router,
};

use crate::domain::DomainError;
use crate::infrastructure::AppState;

pub(crate) fn multipart_error(e: MultipartError) -> DomainError {
    DomainError::validation(format!("Malformed upload: {}", e.body_text()))
}

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        // Auth
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/me", get(auth::me))
        // Dashboard
        .route("/dashboard", get(dashboard::dashboard))
        .route("/dashboard/stats", get(dashboard::stats))
        // Suppliers
        .route(
            "/suppliers",
            get(supplier::list_suppliers).post(supplier::create_supplier),
        )
        .route(
            "/suppliers/:id",
            get(supplier::get_supplier)
                .put(supplier::update_supplier)
                .delete(supplier::delete_supplier),
        )
        .route("/suppliers/:id/products", get(supplier::list_supplier_products))
        // Products
        .route(
            "/products",
            get(product::list_products).post(product::create_product),
        )
        .route("/products/alerts", get(product::stock_alerts))
        .route("/products/categories", get(product::list_categories))
        .route(
            "/products/:id",
            get(product::get_product)
                .put(product::update_product)
                .delete(product::delete_product),
        )
        .route(
            "/products/:id/image",
            get(product::get_image).post(product::upload_image),
        )
        // Stock ledger
        .route("/stock", get(stock::list_entries).post(stock::create_entry))
        .route("/stock/reconciliation", get(stock::reconciliation))
        // Documents
        .route(
            "/documents",
            get(document::list_documents).post(document::upload_document),
        )
        .route(
            "/documents/:id",
            get(document::get_document).delete(document::delete_document),
        )
        .route("/documents/:id/file", get(document::download_document))
        // Users
        .route("/users", get(user::list_users).post(user::create_user))
        .route("/users/:id", axum::routing::delete(user::delete_user))
        .route("/users/:id/role", put(user::change_role))
        .route("/users/:id/status", put(user::set_status))
        .route("/users/:id/reset-password", post(user::reset_password))
        // Audit
        .route("/audit", get(audit::list_audit))
        .route("/audit/export", get(audit::export_audit))
        .with_state(state)
}
