//! Application state containing repositories and shared resources

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::domain::{
    AuditRepository, DocumentRepository, ProductRepository, StockRepository, SupplierRepository,
    UserRepository,
};
use crate::infrastructure::config::Config;
use crate::infrastructure::login_guard::{HumanVerifier, LoginGuard, SimulatedHumanVerifier};
use crate::infrastructure::storage::FileStore;
use crate::infrastructure::{
    SeaOrmAuditRepository, SeaOrmDocumentRepository, SeaOrmProductRepository,
    SeaOrmStockRepository, SeaOrmSupplierRepository, SeaOrmUserRepository,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    pub config: Arc<Config>,
    pub supplier_repo: Arc<dyn SupplierRepository>,
    pub product_repo: Arc<dyn ProductRepository>,
    pub stock_repo: Arc<dyn StockRepository>,
    pub document_repo: Arc<dyn DocumentRepository>,
    pub user_repo: Arc<dyn UserRepository>,
    pub audit_repo: Arc<dyn AuditRepository>,
    /// Failed-login counters
    pub login_guard: Arc<LoginGuard>,
    pub verifier: Arc<dyn HumanVerifier>,
    pub documents: FileStore,
    pub images: FileStore,
}

impl AppState {
    /// Create a new AppState with all repositories initialized
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let documents = FileStore::new(config.documents_dir.clone(), config.max_upload_bytes);
        let images = FileStore::new(config.images_dir.clone(), config.max_upload_bytes);

        Self {
            supplier_repo: Arc::new(SeaOrmSupplierRepository::new(db.clone())),
            product_repo: Arc::new(SeaOrmProductRepository::new(db.clone())),
            stock_repo: Arc::new(SeaOrmStockRepository::new(db.clone())),
            document_repo: Arc::new(SeaOrmDocumentRepository::new(db.clone())),
            user_repo: Arc::new(SeaOrmUserRepository::new(db.clone())),
            audit_repo: Arc::new(SeaOrmAuditRepository::new(db.clone())),
            login_guard: Arc::new(LoginGuard::new()),
            verifier: Arc::new(SimulatedHumanVerifier),
            documents,
            images,
            config: Arc::new(config),
            db,
        }
    }

    /// Swap the bot check implementation
    pub fn with_verifier(mut self, verifier: Arc<dyn HumanVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

// Lets report handlers take State<DatabaseConnection> directly
impl axum::extract::FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
