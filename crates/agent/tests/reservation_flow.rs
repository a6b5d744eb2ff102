//! Integration test for `ReservationFlow`'s two transactional boundaries:
//! confirming a reservation (with stock-tracked items) and cancelling one
//! (releasing the stock it held).

mod support;

use reserva_agent::ReservationFlow;
use reserva_core::domain::{Conversation, ReservationItem, ReservationStatus};
use reserva_core::SystemClock;
use reserva_persistence::{products, reservations};
use std::sync::Arc;
use uuid::Uuid;

#[tokio::test]
async fn confirming_a_reservation_reserves_stock_and_persists_the_row() {
    let db = support::start().await;
    let company = support::seed_company(&db.pool).await;
    let user = support::seed_user(&db.pool, "+573001112233").await;
    let product = support::seed_stocked_product(&db.pool, company.id, "Arepa con queso", 5).await;

    let flow = ReservationFlow::new(db.pool.clone(), Arc::new(SystemClock));
    let conversation = Conversation::new(company.id, user.id);

    let items = vec![ReservationItem {
        product_id: product.id,
        product_name: product.name.clone(),
        quantity: 2,
        unit_price: product.price,
    }];

    let reservation = flow
        .confirm(
            &conversation,
            items,
            "domicilio".to_string(),
            user.phone.clone(),
            None,
            None,
            product.price * 2,
            chrono::Utc::now().date_naive(),
            chrono::NaiveTime::from_hms_opt(19, 30, 0).unwrap(),
            None,
        )
        .await
        .expect("confirming the reservation should succeed");

    assert_eq!(reservation.status, ReservationStatus::Confirmed);

    let stored = reservations::find_by_id(&db.pool, reservation.id)
        .await
        .expect("lookup should not fail")
        .expect("reservation should have been persisted");
    assert_eq!(stored.items.len(), 1);
    assert_eq!(stored.items[0].quantity, 2);

    let remaining_stock = products::current_stock(&db.pool, product.id)
        .await
        .expect("failed to read stock");
    assert_eq!(remaining_stock, 3, "confirming should reserve the ordered quantity");
}

#[tokio::test]
async fn cancelling_a_reservation_releases_its_stock() {
    let db = support::start().await;
    let company = support::seed_company(&db.pool).await;
    let user = support::seed_user(&db.pool, "+573009998877").await;
    let product = support::seed_stocked_product(&db.pool, company.id, "Limonada", 3).await;

    let flow = ReservationFlow::new(db.pool.clone(), Arc::new(SystemClock));
    let conversation = Conversation::new(company.id, user.id);

    let items = vec![ReservationItem {
        product_id: product.id,
        product_name: product.name.clone(),
        quantity: 1,
        unit_price: product.price,
    }];

    let reservation = flow
        .confirm(
            &conversation,
            items,
            "domicilio".to_string(),
            user.phone.clone(),
            None,
            None,
            product.price,
            chrono::Utc::now().date_naive(),
            chrono::NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            None,
        )
        .await
        .expect("confirming the reservation should succeed");

    flow.cancel_reservation(reservation.id, "user_requested")
        .await
        .expect("cancelling should succeed");

    let stored = reservations::find_by_id(&db.pool, reservation.id)
        .await
        .expect("lookup should not fail")
        .expect("reservation should still exist");
    assert_eq!(stored.status, ReservationStatus::Cancelled);

    let remaining_stock = products::current_stock(&db.pool, product.id)
        .await
        .expect("failed to read stock");
    assert_eq!(remaining_stock, 3, "cancelling should release the stock it held");
}

#[tokio::test]
async fn cancelling_an_already_cancelled_reservation_is_rejected() {
    let db = support::start().await;
    let company = support::seed_company(&db.pool).await;
    let user = support::seed_user(&db.pool, "+573005554433").await;

    let flow = ReservationFlow::new(db.pool.clone(), Arc::new(SystemClock));
    let conversation = Conversation::new(company.id, user.id);

    let reservation = flow
        .confirm(
            &conversation,
            Vec::new(),
            "mesa".to_string(),
            user.phone.clone(),
            None,
            None,
            0,
            chrono::Utc::now().date_naive(),
            chrono::NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            Some(4),
        )
        .await
        .expect("confirming the reservation should succeed");

    flow.cancel_reservation(reservation.id, "user_requested")
        .await
        .expect("first cancellation should succeed");

    let err = flow
        .cancel_reservation(reservation.id, "user_requested")
        .await
        .expect_err("cancelling twice should be rejected");
    assert!(err.to_string().contains("cannot cancel"));
}
