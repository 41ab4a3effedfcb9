use actix_web::{http::header::AUTHORIZATION, test};
use sfg_common::Money;
use storefront_engine::{
    db_types::{OrderId, OrderStatus, PaymentStatus},
    StorefrontDatabase,
    StorefrontQuery,
};
use tempfile::TempDir;

use crate::{
    data_objects::{CheckoutRequest, CheckoutResponse},
    endpoint_tests::helpers::{new_db, place_simple_order, seed_product, seed_user, test_service, user_token, StubProvider},
};

#[actix_web::test]
async fn checkout_creates_a_session_and_registers_the_payment() {
    let dir = TempDir::new().unwrap();
    let db = new_db(&dir).await;
    let user = seed_user(&db, "shopper@example.com").await;
    let product = seed_product(&db, "Mug", Money::from_major_units(10), 5).await;
    let order = place_simple_order(&db, user.id, product.id, 2).await;
    let app = test_service!(db.clone(), StubProvider::default());

    let req = test::TestRequest::post()
        .uri("/api/checkout")
        .insert_header((AUTHORIZATION, format!("Bearer {}", user_token(user.id))))
        .set_json(CheckoutRequest { order_id: order.id })
        .to_request();
    let response: CheckoutResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(response.session_id, format!("cs_test_{}", order.id.value()));
    assert!(response.url.is_some());

    let payment = db.fetch_payment_for_order(&order.id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.transaction_id.as_deref(), Some(response.session_id.as_str()));
    assert_eq!(payment.amount, Money::from_major_units(20));
}

#[actix_web::test]
async fn retrying_checkout_replaces_the_session_on_the_payment() {
    let dir = TempDir::new().unwrap();
    let db = new_db(&dir).await;
    let user = seed_user(&db, "shopper@example.com").await;
    let product = seed_product(&db, "Mug", Money::from_major_units(10), 5).await;
    let order = place_simple_order(&db, user.id, product.id, 1).await;
    let app = test_service!(db.clone(), StubProvider::default());
    let token = user_token(user.id);

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/api/checkout")
            .insert_header((AUTHORIZATION, format!("Bearer {token}")))
            .set_json(CheckoutRequest { order_id: order.id })
            .to_request();
        let res = test::call_service(&app, req).await;
        assert!(res.status().is_success());
    }
    let payment = db.fetch_payment_for_order(&order.id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
}

#[actix_web::test]
async fn only_pending_orders_can_be_checked_out() {
    let dir = TempDir::new().unwrap();
    let db = new_db(&dir).await;
    let user = seed_user(&db, "shopper@example.com").await;
    let product = seed_product(&db, "Mug", Money::from_major_units(10), 5).await;
    let order = place_simple_order(&db, user.id, product.id, 1).await;
    db.update_order_status(&order.id, OrderStatus::Cancelled).await.unwrap();
    let app = test_service!(db, StubProvider::default());

    let req = test::TestRequest::post()
        .uri("/api/checkout")
        .insert_header((AUTHORIZATION, format!("Bearer {}", user_token(user.id))))
        .set_json(CheckoutRequest { order_id: order.id })
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status().as_u16(), 400);
}

#[actix_web::test]
async fn checkout_against_an_unknown_order_is_a_404() {
    let dir = TempDir::new().unwrap();
    let db = new_db(&dir).await;
    let user = seed_user(&db, "shopper@example.com").await;
    let app = test_service!(db, StubProvider::default());

    let req = test::TestRequest::post()
        .uri("/api/checkout")
        .insert_header((AUTHORIZATION, format!("Bearer {}", user_token(user.id))))
        .set_json(CheckoutRequest { order_id: OrderId(999) })
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status().as_u16(), 404);
}

#[actix_web::test]
async fn provider_rejections_surface_as_bad_gateway_without_a_payment_record() {
    let dir = TempDir::new().unwrap();
    let db = new_db(&dir).await;
    let user = seed_user(&db, "shopper@example.com").await;
    let product = seed_product(&db, "Mug", Money::from_major_units(10), 5).await;
    let order = place_simple_order(&db, user.id, product.id, 1).await;
    let app = test_service!(db.clone(), StubProvider { fail: true });

    let req = test::TestRequest::post()
        .uri("/api/checkout")
        .insert_header((AUTHORIZATION, format!("Bearer {}", user_token(user.id))))
        .set_json(CheckoutRequest { order_id: order.id })
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status().as_u16(), 502);
    assert!(db.fetch_payment_for_order(&order.id).await.unwrap().is_none());
}
