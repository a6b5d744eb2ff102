//! HTTP surface and process wiring for the reservation engine: binds the
//! axum router to a [`state::AppState`] that owns the bot engine, the
//! conversation context store, and the configured payment provider.

mod error;
pub mod http;
pub mod metrics;
pub mod payment_provider;
pub mod state;
pub mod sweep;

pub use http::create_router;
pub use payment_provider::ConfiguredPaymentProvider;
pub use state::AppState;
