//! Process-level settings: datastore URL, context-store URL, LLM endpoint,
//! payment credentials, bind port, civil timezone default. Tenant-scoped
//! business configuration (hours, service variants, ...) is data, not
//! process config, and is loaded through `reserva-persistence` instead.

use serde::Deserialize;
use std::path::Path;

/// Deployment environment, read from `RESERVA_ENV` (default `development`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    Development,
    Staging,
    Production,
}

impl Default for RuntimeEnvironment {
    fn default() -> Self {
        Self::Development
    }
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Whether startup should fail hard on a missing/invalid config value
    /// rather than falling back to a default.
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Staging | Self::Production)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatastoreSettings {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContextStoreSettings {
    #[serde(default = "default_context_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_context_ttl_secs() -> u64 {
    30 * 60
}

impl Default for ContextStoreSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_context_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    pub endpoint: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_llm_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_llm_timeout_ms() -> u64 {
    4_000
}

fn default_max_retries() -> u32 {
    1
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentSettings {
    #[serde(default)]
    pub provider_endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
    pub datastore: DatastoreSettings,
    #[serde(default)]
    pub context_store: ContextStoreSettings,
    pub llm: LlmSettings,
    #[serde(default)]
    pub payment: PaymentSettings,
}

fn default_bind_port() -> u16 {
    8080
}

fn default_timezone() -> String {
    "America/Bogota".to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Layers `config/default.yaml` < `config/{env}.yaml` < `RESERVA_*`
/// environment variables, matching the precedence order teacher settings
/// loaders use.
pub fn load_settings(env: Option<&str>, config_dir: impl AsRef<Path>) -> Result<Settings, SettingsError> {
    let env = env.unwrap_or("development");
    let dir = config_dir.as_ref();

    let builder = config::Config::builder()
        .add_source(config::File::from(dir.join("default")).required(false))
        .add_source(config::File::from(dir.join(env)).required(false))
        .add_source(config::Environment::with_prefix("RESERVA").separator("__"));

    let settings = builder.build()?;
    Ok(settings.try_deserialize()?)
}
