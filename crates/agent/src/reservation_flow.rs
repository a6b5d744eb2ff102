//! Reservation Flow (component J): drives a conversation through the
//! state machine and owns the two transactional boundaries the engine
//! promises — committing a reservation, and reversing one on cancellation.

use reserva_core::domain::{
    Conversation, ConversationState, DraftItem, Payment, PaymentStatus, Reservation,
    ReservationItem, ReservationStatus,
};
use reserva_core::{Clock, ReservaError};
use reserva_persistence::{conversations, payments, products, reservations, stock, user_preferences};
use reserva_tools::payment::{PaymentProvider, PaymentRequest};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::map_persistence;

pub struct ReservationFlow<C: Clock> {
    pool: PgPool,
    clock: Arc<C>,
}

impl<C: Clock> ReservationFlow<C> {
    pub fn new(pool: PgPool, clock: Arc<C>) -> Self {
        Self { pool, clock }
    }

    /// Entry to `confirmed`: one transaction that inserts the reservation,
    /// reserves stock for every item, and bumps the user's completed-
    /// reservation counter. Any failure rolls the whole thing back and the
    /// caller is expected to keep the conversation in `collecting` with a
    /// decremented retry budget.
    pub async fn confirm(
        &self,
        conversation: &Conversation,
        items: Vec<ReservationItem>,
        service_key: String,
        phone: String,
        customer_name: Option<String>,
        resource_id: Option<Uuid>,
        total_price: i64,
        date: chrono::NaiveDate,
        time: chrono::NaiveTime,
        guests: Option<u32>,
    ) -> Result<Reservation, ReservaError> {
        let mut tx = self.pool.begin().await.map_err(ReservaError::from)?;

        let reservation = Reservation {
            id: Uuid::new_v4(),
            company_id: conversation.company_id,
            user_id: conversation.user_id,
            conversation_id: conversation.id,
            date,
            time,
            guests,
            phone,
            customer_name,
            service_key,
            items: items.clone(),
            resource_id,
            status: ReservationStatus::Confirmed,
            total_price,
        };

        if let Err(e) = reservations::insert_with(&mut *tx, &reservation).await {
            let _ = tx.rollback().await;
            return Err(map_persistence(e));
        }

        let draft_items: Vec<DraftItem> = items
            .iter()
            .map(|i| DraftItem {
                product_id: i.product_id,
                quantity: i.quantity,
            })
            .collect();

        for item in &draft_items {
            let product = match products::find_by_id(&self.pool, item.product_id).await {
                Ok(Some(p)) => p,
                Ok(None) => {
                    let _ = tx.rollback().await;
                    return Err(ReservaError::validation(
                        "products",
                        format!("unknown product {}", item.product_id),
                    ));
                }
                Err(e) => {
                    let _ = tx.rollback().await;
                    return Err(map_persistence(e));
                }
            };
            if !product.tracks_stock {
                continue;
            }
            if let Err(e) = stock::reserve_in_tx(
                &mut tx,
                item.product_id,
                item.quantity,
                "reservation",
                Some(reservation.id),
            )
            .await
            {
                let _ = tx.rollback().await;
                return Err(map_persistence(e));
            }
        }

        if let Err(e) = user_preferences::record_completed_reservation_in_tx(
            &mut tx,
            conversation.user_id,
            conversation.company_id,
        )
        .await
        {
            let _ = tx.rollback().await;
            return Err(map_persistence(e));
        }

        tx.commit().await.map_err(ReservaError::from)?;

        Ok(reservation)
    }

    /// Entry to `awaiting_payment`: creates a pending payment row and asks
    /// the provider for a checkout URL.
    pub async fn request_payment(
        &self,
        conversation: &Conversation,
        amount: i64,
        description: String,
        customer_email: Option<String>,
        customer_name: Option<String>,
        provider: &dyn PaymentProvider,
    ) -> Result<Payment, ReservaError> {
        let checkout = provider
            .create_checkout(PaymentRequest {
                company_id: conversation.company_id,
                conversation_id: conversation.id,
                amount,
                description,
                customer_email,
                customer_name,
            })
            .await
            .map_err(|e| ReservaError::UpstreamUnavailable(e.to_string()))?;

        let payment = Payment {
            id: Uuid::new_v4(),
            conversation_id: conversation.id,
            reservation_id: None,
            amount,
            status: checkout.status,
            checkout_url: Some(checkout.payment_url),
            reference: checkout.reference,
        };

        payments::insert(&self.pool, &payment)
            .await
            .map_err(map_persistence)?;

        Ok(payment)
    }

    /// Applies a payment webhook event: moves the conversation's payment to
    /// `confirmed`/`cancelled` and, on approval, commits the reservation.
    pub async fn apply_payment_webhook(
        &self,
        conversation: &Conversation,
        reference: &str,
        status: PaymentStatus,
    ) -> Result<bool, ReservaError> {
        payments::update_status(&self.pool, reference, status)
            .await
            .map_err(map_persistence)?;

        if matches!(status, PaymentStatus::Declined | PaymentStatus::Expired) {
            if let Some(reservation_id) = conversation.draft_reservation_id {
                self.cancel_reservation(reservation_id, "payment_failed").await?;
            }
        }

        Ok(matches!(status, PaymentStatus::Approved))
    }

    /// Cancels a reservation and releases any reserved stock via a mirror
    /// `in` movement per item. Releases commute, so this does not need to
    /// be one transaction.
    pub async fn cancel_reservation(
        &self,
        reservation_id: Uuid,
        reason: &str,
    ) -> Result<(), ReservaError> {
        let reservation = reservations::find_by_id(&self.pool, reservation_id)
            .await
            .map_err(map_persistence)?
            .ok_or_else(|| ReservaError::validation("reservation", "not found"))?;

        if !reservation.status.can_transition_to(ReservationStatus::Cancelled) {
            return Err(ReservaError::validation(
                "reservation",
                format!("cannot cancel a reservation in status {:?}", reservation.status),
            ));
        }

        let transitioned = reservations::transition_status(
            &self.pool,
            reservation_id,
            reservation.status,
            ReservationStatus::Cancelled,
        )
        .await
        .map_err(map_persistence)?;
        if !transitioned {
            return Err(ReservaError::Internal(
                "reservation status changed concurrently".to_string(),
            ));
        }

        for item in &reservation.items {
            let product = products::find_by_id(&self.pool, item.product_id)
                .await
                .map_err(map_persistence)?;
            let Some(product) = product else { continue };
            if !product.tracks_stock {
                continue;
            }
            stock::release(
                &self.pool,
                item.product_id,
                item.quantity,
                reason,
                Some(reservation_id),
            )
            .await
            .map_err(map_persistence)?;
        }

        Ok(())
    }

    /// Marks conversations idle past the timeout as `abandoned`. Called
    /// from a background sweep; only conversations in a non-terminal,
    /// timeout-eligible state are affected.
    pub fn apply_timeout(&self, conversation: &mut Conversation, timeout: chrono::Duration) -> bool {
        let eligible = matches!(
            conversation.state,
            ConversationState::Collecting | ConversationState::AwaitingPayment
        );
        if !eligible {
            return false;
        }
        let idle = self.clock.now() - conversation.last_turn_at;
        if idle >= timeout {
            conversation.state = ConversationState::Abandoned;
            true
        } else {
            false
        }
    }

    pub async fn persist(&self, conversation: &Conversation) -> Result<(), ReservaError> {
        conversations::upsert(&self.pool, conversation)
            .await
            .map_err(map_persistence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reserva_core::SystemClock;

    #[test]
    fn timeout_is_not_applied_to_confirmed_conversations() {
        let flow = ReservationFlow {
            pool: unreachable_pool(),
            clock: Arc::new(SystemClock),
        };
        let mut conv = Conversation::new(Uuid::new_v4(), Uuid::new_v4());
        conv.state = ConversationState::Confirmed;
        assert!(!flow.apply_timeout(&mut conv, chrono::Duration::minutes(30)));
    }

    fn unreachable_pool() -> PgPool {
        // Lazy pools don't connect until first use; fine for tests that
        // never touch the database.
        PgPool::connect_lazy("postgres://localhost/unused").unwrap()
    }
}
