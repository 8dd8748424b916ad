use crate::schemas::AppState;
use anyhow::Result;
use moka::future::Cache;
use sea_orm::Database;
use std::time::Duration;

/// Initialize application state against an explicit database URL
pub async fn initialize_app_state_with_url(
    database_url: &str,
    secret_key: &str,
) -> Result<AppState> {
    // Connect to database
    tracing::info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;

    // Initialize cache
    let cache = Cache::builder()
        .max_capacity(1000)
        .time_to_live(Duration::from_secs(300)) // 5 minutes
        .build();

    Ok(AppState {
        db,
        cache,
        secret_key: secret_key.to_string(),
    })
}

/// Get the signing key for session tokens from the environment
pub fn get_secret_key() -> String {
    std::env::var("SECRET_KEY").unwrap_or_else(|_| {
        tracing::warn!("SECRET_KEY not set; using an insecure development key");
        "registra-insecure-dev-key".to_string()
    })
}
