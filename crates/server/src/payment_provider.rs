//! Picks the payment provider implementation at startup based on settings,
//! giving the rest of the process a single concrete type to hold instead of
//! a trait object (the orchestrator's `BotEngine<C, P>` is generic over `P`).

use async_trait::async_trait;
use reserva_config::Settings;
use reserva_tools::payment::{
    HttpPaymentProvider, PaymentCheckout, PaymentError, PaymentProvider, PaymentRequest,
    StubPaymentProvider,
};

pub enum ConfiguredPaymentProvider {
    Http(HttpPaymentProvider),
    Stub(StubPaymentProvider),
}

impl ConfiguredPaymentProvider {
    /// Uses the HTTP provider when an endpoint and key are configured;
    /// otherwise falls back to the stub, matching development deployments
    /// that never leave the process.
    pub fn from_settings(settings: &Settings) -> Self {
        match (&settings.payment.provider_endpoint, &settings.payment.api_key) {
            (Some(endpoint), Some(api_key)) => {
                tracing::info!(endpoint, "using HTTP payment provider");
                Self::Http(HttpPaymentProvider::new(endpoint.clone(), api_key.clone()))
            }
            _ => {
                tracing::warn!("no payment provider configured, using stub provider");
                Self::Stub(StubPaymentProvider)
            }
        }
    }
}

#[async_trait]
impl PaymentProvider for ConfiguredPaymentProvider {
    async fn create_checkout(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentCheckout, PaymentError> {
        match self {
            Self::Http(p) => p.create_checkout(request).await,
            Self::Stub(p) => p.create_checkout(request).await,
        }
    }
}
