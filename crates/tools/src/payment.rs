//! Payment provider contract: create a checkout, receive webhook updates.

use async_trait::async_trait;
use reserva_core::domain::PaymentStatus;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("payment provider request failed: {0}")]
    Provider(String),

    #[error("payment provider returned an unexpected response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub company_id: Uuid,
    pub conversation_id: Uuid,
    /// Minor currency units.
    pub amount: i64,
    pub description: String,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCheckout {
    pub payment_id: String,
    pub payment_url: String,
    pub status: PaymentStatus,
    pub reference: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentWebhookEvent {
    pub reference: String,
    pub status: PaymentStatus,
    pub raw_event: serde_json::Value,
}

/// Contract every payment provider integration implements; the engine only
/// ever talks to this trait, never to a concrete provider.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_checkout(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentCheckout, PaymentError>;
}

/// Calls a webhook-compatible payment gateway over HTTP. The base URL and
/// credentials are resolved per-tenant from `Company::payment_provider_credentials`.
pub struct HttpPaymentProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpPaymentProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl PaymentProvider for HttpPaymentProvider {
    async fn create_checkout(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentCheckout, PaymentError> {
        let reference = format!("rsv_{}", Uuid::new_v4());

        #[derive(Serialize)]
        struct ProviderRequest<'a> {
            amount: i64,
            description: &'a str,
            customer_email: Option<&'a str>,
            customer_name: Option<&'a str>,
            reference: &'a str,
        }

        #[derive(Deserialize)]
        struct ProviderResponse {
            payment_id: String,
            payment_url: String,
        }

        let response = self
            .client
            .post(format!("{}/v1/checkouts", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&ProviderRequest {
                amount: request.amount,
                description: &request.description,
                customer_email: request.customer_email.as_deref(),
                customer_name: request.customer_name.as_deref(),
                reference: &reference,
            })
            .send()
            .await?
            .error_for_status()
            .map_err(|e| PaymentError::Provider(e.to_string()))?
            .json::<ProviderResponse>()
            .await
            .map_err(|e| PaymentError::InvalidResponse(e.to_string()))?;

        Ok(PaymentCheckout {
            payment_id: response.payment_id,
            payment_url: response.payment_url,
            status: PaymentStatus::Pending,
            reference,
        })
    }
}

/// In-process stand-in for local development and tests: always succeeds,
/// never calls out over the network.
pub struct StubPaymentProvider;

#[async_trait]
impl PaymentProvider for StubPaymentProvider {
    async fn create_checkout(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentCheckout, PaymentError> {
        let reference = format!("rsv_{}", Uuid::new_v4());
        Ok(PaymentCheckout {
            payment_id: format!("stub_{reference}"),
            payment_url: format!("https://pay.example.test/{reference}?amount={}", request.amount),
            status: PaymentStatus::Pending,
            reference,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_provider_produces_a_checkout_url() {
        let provider = StubPaymentProvider;
        let checkout = provider
            .create_checkout(PaymentRequest {
                company_id: Uuid::nil(),
                conversation_id: Uuid::nil(),
                amount: 5_000_00,
                description: "deposit".to_string(),
                customer_email: None,
                customer_name: None,
            })
            .await
            .unwrap();
        assert_eq!(checkout.status, PaymentStatus::Pending);
        assert!(checkout.payment_url.contains(&checkout.reference));
    }
}
