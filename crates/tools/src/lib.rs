//! Stock/inventory service, payment provider contract, reply templating,
//! and civil-date resolution — the tools the conversation engine calls out
//! to, as opposed to the pure decision logic in `reserva-agent`.

pub mod date;
pub mod inventory;
pub mod payment;
pub mod template;

pub use date::DateResolver;
pub use inventory::{InventoryError, LowStockEvent, StockCheck};
pub use payment::{
    HttpPaymentProvider, PaymentCheckout, PaymentError, PaymentProvider, PaymentRequest,
    PaymentWebhookEvent, StubPaymentProvider,
};
pub use template::{TemplateBundle, TemplateError, TemplateRenderer, Terminology};
