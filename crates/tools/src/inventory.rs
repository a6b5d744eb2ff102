//! Inventory/stock service: the business-logic layer over `reserva_persistence::stock`.

use reserva_core::domain::DraftItem;
use reserva_persistence::PersistenceError;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct StockCheck {
    pub product_id: Uuid,
    pub available: bool,
    pub current_stock: i32,
    pub has_stock: bool,
}

/// A product whose stock fell to or below its configured minimum after a
/// reservation committed.
#[derive(Debug, Clone)]
pub struct LowStockEvent {
    pub product_id: Uuid,
    pub current_stock: i32,
}

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Non-locking stock read, for pre-flight display to the user before they
/// commit to a reservation.
pub async fn check_stock(
    pool: &PgPool,
    product_id: Uuid,
    qty: u32,
) -> Result<StockCheck, InventoryError> {
    let current_stock = reserva_persistence::products::current_stock(pool, product_id).await?;
    Ok(StockCheck {
        product_id,
        available: current_stock > 0,
        current_stock,
        has_stock: current_stock >= qty as i32,
    })
}

/// Reserves stock for every item in a draft reservation, skipping any
/// product whose current state is `tracks_stock = false`. Each item is
/// reserved independently so a product with `tracks_stock = false` never
/// takes a row lock at all.
///
/// Returns the low-stock events that should be emitted once the caller's
/// outer transaction (the reservation insert) has committed.
pub async fn reserve_stock(
    pool: &PgPool,
    items: &[DraftItem],
    correlation_id: Uuid,
) -> Result<Vec<LowStockEvent>, InventoryError> {
    let mut low_stock = Vec::new();

    for item in items {
        let product = reserva_persistence::products::find_by_id(pool, item.product_id)
            .await?
            .ok_or_else(|| {
                InventoryError::Persistence(PersistenceError::NotFound(format!(
                    "product {}",
                    item.product_id
                )))
            })?;
        if !product.tracks_stock {
            continue;
        }

        let adjustment = reserva_persistence::stock::reserve(
            pool,
            item.product_id,
            item.quantity,
            "reservation",
            Some(correlation_id),
        )
        .await?;

        if adjustment.low_stock {
            low_stock.push(LowStockEvent {
                product_id: item.product_id,
                current_stock: adjustment.movement.new_stock,
            });
        }
    }

    Ok(low_stock)
}

/// Releases previously reserved stock, e.g. on reservation cancellation.
/// Items commute, so each is released independently rather than inside one
/// shared transaction.
pub async fn release_stock(
    pool: &PgPool,
    items: &[DraftItem],
    reason: &str,
    correlation_id: Uuid,
) -> Result<(), InventoryError> {
    for item in items {
        let product = reserva_persistence::products::find_by_id(pool, item.product_id).await?;
        let Some(product) = product else { continue };
        if !product.tracks_stock {
            continue;
        }
        reserva_persistence::stock::release(
            pool,
            item.product_id,
            item.quantity,
            reason,
            Some(correlation_id),
        )
        .await?;
    }
    Ok(())
}

/// Administrative stock correction. Refuses to let stock go negative.
pub async fn adjust_stock(
    pool: &PgPool,
    product_id: Uuid,
    delta: i32,
    reason: &str,
) -> Result<LowStockEvent, InventoryError> {
    let current = reserva_persistence::products::current_stock(pool, product_id).await?;
    let new_absolute = (current + delta).max(0);
    let adjustment =
        reserva_persistence::stock::adjust(pool, product_id, new_absolute, reason).await?;
    Ok(LowStockEvent {
        product_id,
        current_stock: adjustment.movement.new_stock,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_check_is_unavailable_at_zero() {
        let check = StockCheck {
            product_id: Uuid::nil(),
            available: false,
            current_stock: 0,
            has_stock: false,
        };
        assert!(!check.available);
        assert!(!check.has_stock);
    }
}
