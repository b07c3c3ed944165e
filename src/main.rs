use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledblast::{config, db, seed, server, AppState};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledblast=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize database
    let db = db::init_db(&config.database_url)
        .await
        .expect("Failed to initialize database");

    match seed::ensure_admin(&db, config.admin_password.as_deref()).await {
        Ok(Some(generated)) => tracing::warn!(
            "🔑 Bootstrap admin '{}' password: {} (shown once, change it)",
            seed::BOOTSTRAP_ADMIN,
            generated
        ),
        Ok(None) => {}
        Err(e) => tracing::error!("Failed to create bootstrap admin: {}", e),
    }

    if config.seed_demo {
        tracing::info!("Seeding demo data...");
        if let Err(e) = seed::seed_demo_data(&db).await {
            tracing::error!("Failed to seed data: {}", e);
        }
    }

    tracing::info!(
        "Documents in {}, product images in {}",
        config.documents_dir.display(),
        config.images_dir.display()
    );

    let state = AppState::new(db, config);
    server::serve(state).await.expect("Failed to start server");
}
