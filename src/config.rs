use crate::errors::StoreError;
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    /// Populate the database with demo categories, products and accounts
    /// on startup when no users exist yet.
    pub seed_demo_data: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, StoreError> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| StoreError::Config("DATABASE_URL is not set".to_string()))?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let seed_demo_data = env::var("SEED_DEMO_DATA")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .map_err(|e| StoreError::Config(format!("Invalid SEED_DEMO_DATA value: {e}")))?;

        Ok(Self {
            database_url,
            bind_addr,
            seed_demo_data,
        })
    }
}
