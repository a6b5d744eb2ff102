//! Postgres persistence layer.
//!
//! One module per aggregate (companies, products, resources, users, ...),
//! plus `client` for the pool and `schema` for the DDL bootstrap.

pub mod client;
pub mod companies;
pub mod conversations;
pub mod error;
pub mod payments;
pub mod products;
pub mod reservations;
pub mod resources;
pub mod schema;
pub mod stock;
pub mod user_preferences;
pub mod users;

pub use client::{PgConfig, Store};
pub use error::PersistenceError;

/// Connects to Postgres and ensures the schema exists.
pub async fn init(config: PgConfig) -> Result<Store, PersistenceError> {
    let store = Store::connect(config).await?;
    store.ensure_schema().await?;
    Ok(store)
}
