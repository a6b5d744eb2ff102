//! Transactional stock adjustments.
//!
//! `reserve`/`release`/`adjust` all acquire an exclusive row lock on the
//! product before reading its current stock, so concurrent reservations for
//! the same product serialize instead of racing on a read-modify-write.

use crate::error::PersistenceError;
use chrono::Utc;
use reserva_core::domain::{StockMovement, StockMovementType};
use sqlx::PgPool;
use uuid::Uuid;

/// Outcome of a stock adjustment, including whatever is left for the caller
/// to act on (e.g. emit a low-stock event).
pub struct StockAdjustment {
    pub movement: StockMovement,
    pub low_stock: bool,
}

async fn lock_product(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    product_id: Uuid,
) -> Result<(i32, i32), PersistenceError> {
    let row: Option<(i32, i32)> = sqlx::query_as(
        "SELECT stock, min_stock FROM products WHERE id = $1 FOR UPDATE",
    )
    .bind(product_id)
    .fetch_optional(&mut **tx)
    .await?;
    row.ok_or_else(|| PersistenceError::NotFound(format!("product {product_id}")))
}

/// Postgres error code for `lock_not_available`, raised by `FOR UPDATE NOWAIT`
/// when another transaction already holds the row lock.
const LOCK_NOT_AVAILABLE: &str = "55P03";

/// Like `lock_product` but fails fast instead of blocking when the row is
/// already locked by a concurrent transaction, per the reservation path's
/// NOWAIT contention rule.
async fn lock_product_nowait(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    product_id: Uuid,
) -> Result<(i32, i32), PersistenceError> {
    let result: Result<Option<(i32, i32)>, sqlx::Error> = sqlx::query_as(
        "SELECT stock, min_stock FROM products WHERE id = $1 FOR UPDATE NOWAIT",
    )
    .bind(product_id)
    .fetch_optional(&mut **tx)
    .await;

    match result {
        Ok(row) => row.ok_or_else(|| PersistenceError::NotFound(format!("product {product_id}"))),
        Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some(LOCK_NOT_AVAILABLE) => {
            Err(PersistenceError::StockConflict {
                product_id,
                message: "product row is locked by a concurrent reservation".to_string(),
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// Decrements stock by `quantity` within an already-open transaction.
/// Fails with `StockConflict` if insufficient stock remains under the lock,
/// or if the row is already locked by a concurrent reservation. Leaves the
/// transaction open on error so the caller decides whether to roll back or
/// keep trying other items; callers that want an isolated single-item
/// reservation should use [`reserve`] instead.
pub async fn reserve_in_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    product_id: Uuid,
    quantity: u32,
    reason: &str,
    correlation_id: Option<Uuid>,
) -> Result<StockAdjustment, PersistenceError> {
    let quantity = quantity as i32;

    let (stock, min_stock) = lock_product_nowait(tx, product_id).await?;
    if stock < quantity {
        return Err(PersistenceError::StockConflict {
            product_id,
            message: format!("requested {quantity}, available {stock}"),
        });
    }
    let new_stock = stock - quantity;

    sqlx::query("UPDATE products SET stock = $1 WHERE id = $2")
        .bind(new_stock)
        .bind(product_id)
        .execute(&mut **tx)
        .await?;

    let movement = StockMovement {
        id: Uuid::new_v4(),
        product_id,
        previous_stock: stock,
        new_stock,
        movement_type: StockMovementType::Out,
        quantity: -quantity,
        reason: reason.to_string(),
        correlation_id,
        created_at: Utc::now(),
    };
    insert_movement(tx, &movement).await?;

    Ok(StockAdjustment {
        movement,
        low_stock: new_stock <= min_stock,
    })
}

/// Reserves a single item in its own transaction. Used when a caller has
/// no surrounding transactional unit of its own to join.
pub async fn reserve(
    pool: &PgPool,
    product_id: Uuid,
    quantity: u32,
    reason: &str,
    correlation_id: Option<Uuid>,
) -> Result<StockAdjustment, PersistenceError> {
    let mut tx = pool.begin().await?;
    match reserve_in_tx(&mut tx, product_id, quantity, reason, correlation_id).await {
        Ok(adjustment) => {
            tx.commit().await?;
            Ok(adjustment)
        }
        Err(e) => {
            tx.rollback().await?;
            Err(e)
        }
    }
}

/// Reverses a prior reservation (cancellation or payment timeout), under
/// the same row lock discipline as `reserve`.
pub async fn release(
    pool: &PgPool,
    product_id: Uuid,
    quantity: u32,
    reason: &str,
    correlation_id: Option<Uuid>,
) -> Result<StockAdjustment, PersistenceError> {
    let quantity = quantity as i32;
    let mut tx = pool.begin().await?;

    let (stock, min_stock) = lock_product(&mut tx, product_id).await?;
    let new_stock = stock + quantity;

    sqlx::query("UPDATE products SET stock = $1 WHERE id = $2")
        .bind(new_stock)
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

    let movement = StockMovement {
        id: Uuid::new_v4(),
        product_id,
        previous_stock: stock,
        new_stock,
        movement_type: StockMovementType::In,
        quantity,
        reason: reason.to_string(),
        correlation_id,
        created_at: Utc::now(),
    };
    insert_movement(&mut tx, &movement).await?;

    tx.commit().await?;

    Ok(StockAdjustment {
        movement,
        low_stock: new_stock <= min_stock,
    })
}

/// Sets stock to an absolute value (manual restock/correction), recorded
/// as an `in` or `out` movement depending on the sign of the delta.
pub async fn adjust(
    pool: &PgPool,
    product_id: Uuid,
    new_absolute_stock: i32,
    reason: &str,
) -> Result<StockAdjustment, PersistenceError> {
    let mut tx = pool.begin().await?;

    let (stock, min_stock) = lock_product(&mut tx, product_id).await?;
    let delta = new_absolute_stock - stock;

    sqlx::query("UPDATE products SET stock = $1 WHERE id = $2")
        .bind(new_absolute_stock)
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

    let movement = StockMovement {
        id: Uuid::new_v4(),
        product_id,
        previous_stock: stock,
        new_stock: new_absolute_stock,
        movement_type: if delta >= 0 {
            StockMovementType::In
        } else {
            StockMovementType::Out
        },
        quantity: delta,
        reason: reason.to_string(),
        correlation_id: None,
        created_at: Utc::now(),
    };
    insert_movement(&mut tx, &movement).await?;

    tx.commit().await?;

    Ok(StockAdjustment {
        movement,
        low_stock: new_absolute_stock <= min_stock,
    })
}

async fn insert_movement(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    movement: &StockMovement,
) -> Result<(), PersistenceError> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements (id, product_id, previous_stock, new_stock, movement_type,
                                      quantity, reason, correlation_id, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(movement.id)
    .bind(movement.product_id)
    .bind(movement.previous_stock)
    .bind(movement.new_stock)
    .bind(if movement.movement_type == StockMovementType::In {
        "in"
    } else {
        "out"
    })
    .bind(movement.quantity)
    .bind(&movement.reason)
    .bind(movement.correlation_id)
    .bind(movement.created_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn history(
    pool: &PgPool,
    product_id: Uuid,
    limit: i64,
) -> Result<Vec<StockMovement>, PersistenceError> {
    #[derive(sqlx::FromRow)]
    struct Row {
        id: Uuid,
        product_id: Uuid,
        previous_stock: i32,
        new_stock: i32,
        movement_type: String,
        quantity: i32,
        reason: String,
        correlation_id: Option<Uuid>,
        created_at: chrono::DateTime<Utc>,
    }

    let rows: Vec<Row> = sqlx::query_as(
        "SELECT * FROM stock_movements WHERE product_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(product_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| StockMovement {
            id: r.id,
            product_id: r.product_id,
            previous_stock: r.previous_stock,
            new_stock: r.new_stock,
            movement_type: if r.movement_type == "in" {
                StockMovementType::In
            } else {
                StockMovementType::Out
            },
            quantity: r.quantity,
            reason: r.reason,
            correlation_id: r.correlation_id,
            created_at: r.created_at,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_conflict_message_is_descriptive() {
        let err = PersistenceError::StockConflict {
            product_id: Uuid::nil(),
            message: "requested 5, available 2".to_string(),
        };
        assert!(err.to_string().contains("requested 5, available 2"));
    }
}
