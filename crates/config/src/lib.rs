//! Process settings loading, the service-config resolver, and the
//! in-memory intent/keyword catalog.

pub mod intent_catalog;
pub mod service_resolver;
pub mod settings;

pub use intent_catalog::{CatalogError, IntentCatalog};
pub use service_resolver::{resolve, ServiceConfig, ValidatorConfig, CANONICAL_FIELD_ORDER};
pub use settings::{load_settings, RuntimeEnvironment, Settings, SettingsError};
