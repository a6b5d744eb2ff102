//! Postgres connection pool and schema bootstrap.

use crate::error::PersistenceError;
use crate::schema;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

#[derive(Debug, Clone)]
pub struct PgConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for PgConfig {
    fn default() -> Self {
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/reserva".to_string());
        Self {
            url,
            max_connections: 10,
        }
    }
}

#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    pub async fn connect(config: PgConfig) -> Result<Self, PersistenceError> {
        tracing::info!(max_connections = config.max_connections, "connecting to Postgres");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    /// Creates the tables the engine needs if they don't already exist.
    /// Production deployments would use `sqlx::migrate!` against a
    /// versioned migrations directory; this mirrors the simpler
    /// idempotent bootstrap the rest of the pack uses for a single-binary
    /// deployment.
    pub async fn ensure_schema(&self) -> Result<(), PersistenceError> {
        schema::create_tables(&self.pool).await?;
        tracing::info!("schema ensured");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
