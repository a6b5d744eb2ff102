//! Domain entities shared across every crate in the workspace.

pub mod company;
pub mod conversation;
pub mod intent;
pub mod payment;
pub mod product;
pub mod reservation;
pub mod resource;
pub mod stock;
pub mod user;

pub use company::{BusinessHours, Company, CompanyConfig, CompanyType, PaymentPolicy, WeeklyHours};
pub use conversation::{CollectedField, Conversation, ConversationState, DraftItem};
pub use intent::{
    IntentLabel, Intention, KeywordPattern, MatchMode, ServiceKeyword, SystemKeyword,
};
pub use payment::{Payment, PaymentStatus};
pub use product::{Product, ProductMetadata, ServiceVariantMetadata, SERVICE_CATEGORY};
pub use reservation::{Reservation, ReservationItem, ReservationStatus};
pub use resource::Resource;
pub use stock::{StockMovement, StockMovementType};
pub use user::{User, UserPreference};
