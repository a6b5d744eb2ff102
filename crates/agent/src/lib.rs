//! Conversation context store, field validator, reservation flow, and the
//! bot engine orchestrator that ties every other crate together into a
//! single inbound-message pipeline.

pub mod context_store;
mod error;
pub mod field_validator;
pub mod metrics;
pub mod orchestrator;
pub mod reservation_flow;

pub use context_store::{ContextKey, ContextStore};
pub use orchestrator::{BotEngine, InboundMessage, OutboundMessage};
pub use reservation_flow::ReservationFlow;
