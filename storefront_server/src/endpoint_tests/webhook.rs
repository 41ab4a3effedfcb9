use actix_web::test::{self, TestRequest};
use chrono::Utc;
use sfg_common::Money;
use serde_json::json;
use storefront_engine::{
    db_types::{OrderId, OrderStatus, PaymentStatus},
    StorefrontQuery,
};
use stripe_tools::webhook::{signature_header, SIGNATURE_HEADER};
use tempfile::TempDir;

use crate::endpoint_tests::helpers::{
    new_db,
    place_simple_order,
    seed_product,
    seed_user,
    test_service,
    StubProvider,
    TEST_WEBHOOK_SECRET,
};

fn completed_session_payload(event_id: &str, order_id: &OrderId, txn: &str, amount: i64) -> String {
    json!({
        "id": event_id,
        "type": "checkout.session.completed",
        "created": Utc::now().timestamp(),
        "data": { "object": {
            "id": "cs_test_1",
            "object": "checkout.session",
            "payment_intent": txn,
            "payment_status": "paid",
            "amount_total": amount,
            "currency": "usd",
            "metadata": { "order_id": order_id.value().to_string() }
        }}
    })
    .to_string()
}

fn signed_delivery(payload: &str) -> TestRequest {
    let header = signature_header(TEST_WEBHOOK_SECRET, Utc::now().timestamp(), payload.as_bytes());
    TestRequest::post().uri("/webhook/stripe").insert_header((SIGNATURE_HEADER, header)).set_payload(payload.to_string())
}

#[actix_web::test]
async fn unsigned_and_tampered_deliveries_are_rejected_without_side_effects() {
    let dir = TempDir::new().unwrap();
    let db = new_db(&dir).await;
    let user = seed_user(&db, "shopper@example.com").await;
    let product = seed_product(&db, "Mug", Money::from_major_units(10), 5).await;
    let order = place_simple_order(&db, user.id, product.id, 2).await;
    let app = test_service!(db.clone(), StubProvider::default());
    let payload = completed_session_payload("evt_1", &order.id, "pi_1", 2000);

    // No signature header at all.
    let req = TestRequest::post().uri("/webhook/stripe").set_payload(payload.clone()).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status().as_u16(), 400);

    // A valid header over a different body.
    let header = signature_header(TEST_WEBHOOK_SECRET, Utc::now().timestamp(), b"something else");
    let req = TestRequest::post()
        .uri("/webhook/stripe")
        .insert_header((SIGNATURE_HEADER, header))
        .set_payload(payload.clone())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status().as_u16(), 400);

    // A header signed with the wrong secret.
    let header = signature_header("whsec_wrong", Utc::now().timestamp(), payload.as_bytes());
    let req = TestRequest::post()
        .uri("/webhook/stripe")
        .insert_header((SIGNATURE_HEADER, header))
        .set_payload(payload)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status().as_u16(), 400);

    // Nothing was reconciled and nothing was audited.
    assert_eq!(db.fetch_order(&order.id).await.unwrap().unwrap().status, OrderStatus::Pending);
    assert!(db.fetch_payment_for_order(&order.id).await.unwrap().is_none());
    assert!(db.fetch_payment_events("pi_1").await.unwrap().is_empty());
}

#[actix_web::test]
async fn a_completed_session_delivery_pays_the_order() {
    let dir = TempDir::new().unwrap();
    let db = new_db(&dir).await;
    let user = seed_user(&db, "shopper@example.com").await;
    let product = seed_product(&db, "Mug", Money::from_major_units(10), 5).await;
    let order = place_simple_order(&db, user.id, product.id, 2).await;
    let app = test_service!(db.clone(), StubProvider::default());

    let payload = completed_session_payload("evt_1", &order.id, "pi_1", 2000);
    let res = test::call_service(&app, signed_delivery(&payload).to_request()).await;
    assert!(res.status().is_success());

    assert_eq!(db.fetch_order(&order.id).await.unwrap().unwrap().status, OrderStatus::Paid);
    let payment = db.fetch_payment_for_order(&order.id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(payment.amount, Money::from_cents(2000));
    assert_eq!(payment.currency, "USD");
    assert_eq!(db.fetch_payment_events("pi_1").await.unwrap().len(), 1);
}

#[actix_web::test]
async fn a_completed_session_without_amount_fields_keeps_the_registered_figures() {
    let dir = TempDir::new().unwrap();
    let db = new_db(&dir).await;
    let user = seed_user(&db, "shopper@example.com").await;
    let product = seed_product(&db, "Mug", Money::from_major_units(10), 5).await;
    let order = place_simple_order(&db, user.id, product.id, 2).await;
    let app = test_service!(db.clone(), StubProvider::default());

    // amount_total and currency are optional on the session object and the provider does
    // omit them. The payment completes with the figures checkout registered, not zeroes.
    let payload = json!({
        "id": "evt_1",
        "type": "checkout.session.completed",
        "created": Utc::now().timestamp(),
        "data": { "object": {
            "id": "cs_test_1",
            "object": "checkout.session",
            "payment_intent": "pi_1",
            "payment_status": "paid",
            "metadata": { "order_id": order.id.value().to_string() }
        }}
    })
    .to_string();
    let res = test::call_service(&app, signed_delivery(&payload).to_request()).await;
    assert!(res.status().is_success());

    assert_eq!(db.fetch_order(&order.id).await.unwrap().unwrap().status, OrderStatus::Paid);
    let payment = db.fetch_payment_for_order(&order.id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(payment.amount, Money::from_cents(2000));
    assert_eq!(payment.currency, "USD");
}

#[actix_web::test]
async fn deliveries_for_unknown_orders_are_still_audited() {
    let dir = TempDir::new().unwrap();
    let db = new_db(&dir).await;
    let app = test_service!(db.clone(), StubProvider::default());

    // No order 9999 exists, so the mapping step is a no-op. The audit append is
    // unconditional and still records the delivery.
    let payload = completed_session_payload("evt_1", &OrderId(9_999), "pi_ghost", 2000);
    let res = test::call_service(&app, signed_delivery(&payload).to_request()).await;
    assert!(res.status().is_success());

    let events = db.fetch_payment_events("pi_ghost").await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "checkout.session.completed");
}

#[actix_web::test]
async fn redeliveries_are_acknowledged_and_audited_but_change_nothing() {
    let dir = TempDir::new().unwrap();
    let db = new_db(&dir).await;
    let user = seed_user(&db, "shopper@example.com").await;
    let product = seed_product(&db, "Mug", Money::from_major_units(10), 5).await;
    let order = place_simple_order(&db, user.id, product.id, 2).await;
    let app = test_service!(db.clone(), StubProvider::default());
    let payload = completed_session_payload("evt_1", &order.id, "pi_1", 2000);

    for _ in 0..3 {
        let res = test::call_service(&app, signed_delivery(&payload).to_request()).await;
        assert!(res.status().is_success());
    }
    assert_eq!(db.fetch_order(&order.id).await.unwrap().unwrap().status, OrderStatus::Paid);
    assert_eq!(db.fetch_payment_for_order(&order.id).await.unwrap().unwrap().amount, Money::from_cents(2000));
    // Each delivery lands in the audit log even when it mutates nothing.
    assert_eq!(db.fetch_payment_events("pi_1").await.unwrap().len(), 3);
}

#[actix_web::test]
async fn an_expired_session_cancels_the_order() {
    let dir = TempDir::new().unwrap();
    let db = new_db(&dir).await;
    let user = seed_user(&db, "shopper@example.com").await;
    let product = seed_product(&db, "Mug", Money::from_major_units(10), 5).await;
    let order = place_simple_order(&db, user.id, product.id, 2).await;
    let app = test_service!(db.clone(), StubProvider::default());

    let payload = json!({
        "id": "evt_2",
        "type": "checkout.session.expired",
        "data": { "object": {
            "id": "cs_test_1",
            "object": "checkout.session",
            "payment_intent": "pi_1",
            "metadata": { "order_id": order.id.value().to_string() }
        }}
    })
    .to_string();
    let res = test::call_service(&app, signed_delivery(&payload).to_request()).await;
    assert!(res.status().is_success());

    assert_eq!(db.fetch_order(&order.id).await.unwrap().unwrap().status, OrderStatus::Cancelled);
    assert_eq!(db.fetch_payment_for_order(&order.id).await.unwrap().unwrap().status, PaymentStatus::Failed);
}

#[actix_web::test]
async fn a_refund_report_after_completion_moves_the_order_to_refunded() {
    let dir = TempDir::new().unwrap();
    let db = new_db(&dir).await;
    let user = seed_user(&db, "shopper@example.com").await;
    let product = seed_product(&db, "Mug", Money::from_major_units(10), 5).await;
    let order = place_simple_order(&db, user.id, product.id, 2).await;
    let app = test_service!(db.clone(), StubProvider::default());

    let payload = completed_session_payload("evt_1", &order.id, "pi_1", 2000);
    test::call_service(&app, signed_delivery(&payload).to_request()).await;

    let refund = json!({
        "id": "evt_2",
        "type": "charge.updated",
        "data": { "object": {
            "id": "ch_1",
            "object": "charge",
            "status": "refunded",
            "payment_intent": "pi_1",
            "metadata": { "order_id": order.id.value().to_string() }
        }}
    })
    .to_string();
    let res = test::call_service(&app, signed_delivery(&refund).to_request()).await;
    assert!(res.status().is_success());

    assert_eq!(db.fetch_order(&order.id).await.unwrap().unwrap().status, OrderStatus::Refunded);
    assert_eq!(db.fetch_payment_for_order(&order.id).await.unwrap().unwrap().status, PaymentStatus::Completed);
}

#[actix_web::test]
async fn unknown_event_types_are_acknowledged_and_logged_only() {
    let dir = TempDir::new().unwrap();
    let db = new_db(&dir).await;
    let user = seed_user(&db, "shopper@example.com").await;
    let product = seed_product(&db, "Mug", Money::from_major_units(10), 5).await;
    let order = place_simple_order(&db, user.id, product.id, 2).await;
    let app = test_service!(db.clone(), StubProvider::default());

    let payload = json!({
        "id": "evt_9",
        "type": "invoice.finalized",
        "data": { "object": { "id": "in_1" } }
    })
    .to_string();
    let res = test::call_service(&app, signed_delivery(&payload).to_request()).await;
    assert!(res.status().is_success());
    assert_eq!(db.fetch_order(&order.id).await.unwrap().unwrap().status, OrderStatus::Pending);
}

#[actix_web::test]
async fn an_intent_success_before_the_session_completes_updates_details_only() {
    let dir = TempDir::new().unwrap();
    let db = new_db(&dir).await;
    let user = seed_user(&db, "shopper@example.com").await;
    let product = seed_product(&db, "Mug", Money::from_major_units(10), 5).await;
    let order = place_simple_order(&db, user.id, product.id, 2).await;
    let app = test_service!(db.clone(), StubProvider::default());

    let payload = json!({
        "id": "evt_3",
        "type": "payment_intent.succeeded",
        "data": { "object": {
            "id": "pi_1",
            "object": "payment_intent",
            "status": "succeeded",
            "amount": 2000,
            "currency": "usd",
            "latest_charge": "ch_1",
            "metadata": { "order_id": order.id.value().to_string() }
        }}
    })
    .to_string();
    let res = test::call_service(&app, signed_delivery(&payload).to_request()).await;
    assert!(res.status().is_success());

    // The mapping is seeded and the provider details recorded, but only the session
    // completion declares the order paid.
    let payment = db.fetch_payment_for_order(&order.id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.amount, Money::from_cents(2000));
    assert_eq!(db.fetch_order(&order.id).await.unwrap().unwrap().status, OrderStatus::Pending);
}
