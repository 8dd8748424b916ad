#[cfg(test)]
pub mod test_utils {
    use crate::auth::password;
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum::Router;
    use chrono::Utc;
    use migration::{Migrator, MigratorTrait};
    use moka::future::Cache;
    use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set};
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    /// Credentials of the seeded administrator account.
    pub const ADMIN_EMAIL: &str = "admin@example.edu";
    pub const ADMIN_PASSWORD: &str = "admin-password-123";

    /// Signing key used by test sessions.
    pub const TEST_SECRET_KEY: &str = "registra-test-secret";

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        // Cascade deletes rely on foreign keys being enforced
        db.execute_unprepared("PRAGMA foreign_keys = ON;")
            .await
            .expect("Failed to enable foreign keys");

        // Run migrations
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Create AppState for testing, with one superuser account seeded
    pub async fn setup_test_app_state() -> AppState {
        let db = setup_test_db().await;

        let admin = model::entities::account::ActiveModel {
            first_name: Set("Admin".to_string()),
            last_name: Set("User".to_string()),
            email: Set(ADMIN_EMAIL.to_string()),
            password_hash: Set(password::hash_string(ADMIN_PASSWORD)
                .expect("Failed to hash admin password")),
            is_active: Set(true),
            is_superuser: Set(true),
            date_joined: Set(Utc::now()),
            ..Default::default()
        };

        admin.insert(&db).await.expect("Failed to create admin account");

        let cache = Cache::new(100);

        AppState {
            db,
            cache,
            secret_key: TEST_SECRET_KEY.to_string(),
        }
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level is determined by the RUST_LOG environment variable,
    /// defaulting to WARN if not set.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr) // Output to stderr, which is captured by tests
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Create axum app for testing
    pub async fn setup_test_app() -> Router {
        let _ = init_test_tracing();

        let state = setup_test_app_state().await;
        let router = create_router(state);
        router
    }
}
