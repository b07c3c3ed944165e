use std::env;
use std::path::PathBuf;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    /// Where uploaded documents are written
    pub documents_dir: PathBuf,
    /// Where product images are written
    pub images_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub seed_demo: bool,
    /// Password for the bootstrap admin; generated and logged when unset
    pub admin_password: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://ledblast.db?mode=rwc".to_string(),
            port: 8000,
            cors_allowed_origins: Vec::new(),
            documents_dir: PathBuf::from("uploaded_documents"),
            images_dir: PathBuf::from("product_images"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            seed_demo: false,
            admin_password: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .ok()
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            documents_dir: env::var("DOCUMENTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.documents_dir),
            images_dir: env::var("PRODUCT_IMAGES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.images_dir),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
            seed_demo: env::var("SEED_DEMO")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(false),
            admin_password: env::var("ADMIN_PASSWORD").ok().filter(|p| !p.is_empty()),
        }
    }
}
