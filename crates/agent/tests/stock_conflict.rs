//! Concurrent stock-conflict integration test backing the reservation
//! flow's pessimistic locking contract: two reservations racing for the
//! last unit of stock must not both succeed.

mod support;

use reserva_persistence::stock;
use uuid::Uuid;

#[tokio::test]
async fn concurrent_reservations_for_the_last_unit_only_one_wins() {
    let db = support::start().await;
    let company = support::seed_company(&db.pool).await;
    let product = support::seed_stocked_product(&db.pool, company.id, "Pizza Margherita", 1).await;

    let pool_a = db.pool.clone();
    let pool_b = db.pool.clone();
    let product_id = product.id;
    let correlation_a = Uuid::new_v4();
    let correlation_b = Uuid::new_v4();

    let task_a = tokio::spawn(async move {
        stock::reserve(&pool_a, product_id, 1, "reservation", Some(correlation_a)).await
    });
    let task_b = tokio::spawn(async move {
        stock::reserve(&pool_b, product_id, 1, "reservation", Some(correlation_b)).await
    });

    let (result_a, result_b) = tokio::join!(task_a, task_b);
    let result_a = result_a.expect("task a panicked");
    let result_b = result_b.expect("task b panicked");

    let outcomes = [result_a.is_ok(), result_b.is_ok()];
    assert_eq!(
        outcomes.iter().filter(|ok| **ok).count(),
        1,
        "exactly one of the two racing reservations should commit, got {outcomes:?}"
    );

    let remaining = reserva_persistence::products::current_stock(&db.pool, product_id)
        .await
        .expect("failed to read stock");
    assert_eq!(remaining, 0, "the winning reservation should leave no stock behind");

    let history = stock::history(&db.pool, product_id, 10)
        .await
        .expect("failed to read stock history");
    assert_eq!(
        history.len(),
        1,
        "only the winning reservation should have written a stock movement"
    );
}

#[tokio::test]
async fn sequential_reservations_exhaust_stock_then_conflict() {
    let db = support::start().await;
    let company = support::seed_company(&db.pool).await;
    let product = support::seed_stocked_product(&db.pool, company.id, "Coca Cola", 2).await;

    stock::reserve(&db.pool, product.id, 2, "reservation", Some(Uuid::new_v4()))
        .await
        .expect("first reservation should succeed, stock is sufficient");

    let err = stock::reserve(&db.pool, product.id, 1, "reservation", Some(Uuid::new_v4()))
        .await
        .expect_err("third unit should be rejected, stock is exhausted");

    assert!(
        matches!(err, reserva_persistence::PersistenceError::StockConflict { .. }),
        "expected a stock conflict, got {err:?}"
    );
}
