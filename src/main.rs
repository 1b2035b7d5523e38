use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use rust_storefront::api::create_api_router;
use rust_storefront::config::AppConfig;
use rust_storefront::entities::setup_schema;
use rust_storefront::seed::seed_demo_data;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    let db: DatabaseConnection = Database::connect(&config.database_url)
        .await
        .expect("Failed to connect to the database");
    setup_schema(&db).await;

    let shared_db = Arc::new(db);

    if config.seed_demo_data {
        seed_demo_data(&shared_db)
            .await
            .expect("Failed to seed demo data");
    }

    let app = create_api_router(shared_db);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind address");
    tracing::info!(addr = %config.bind_addr, "Storefront listening");
    axum::serve(listener, app).await.expect("Server stopped");
}
