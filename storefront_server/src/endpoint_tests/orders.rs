use actix_web::{http::header::AUTHORIZATION, test};
use sfg_common::Money;
use storefront_engine::{
    db_types::{CartLine, Order, OrderStatus},
    order_objects::OrderResult,
    StorefrontQuery,
};
use tempfile::TempDir;

use crate::{
    data_objects::{CartLineRequest, OrderStatusUpdateRequest},
    endpoint_tests::helpers::{
        admin_token,
        new_db,
        place_simple_order,
        seed_product,
        seed_user,
        test_service,
        user_token,
        StubProvider,
    },
};

#[actix_web::test]
async fn health_check_is_public() {
    let dir = TempDir::new().unwrap();
    let db = new_db(&dir).await;
    let app = test_service!(db, StubProvider::default());
    let req = test::TestRequest::get().uri("/health").to_request();
    let res = test::call_service(&app, req).await;
    assert!(res.status().is_success());
    let body = test::read_body(res).await;
    assert_eq!(body, "👍️\n".as_bytes());
}

#[actix_web::test]
async fn requests_without_a_valid_token_are_rejected() {
    let dir = TempDir::new().unwrap();
    let db = new_db(&dir).await;
    let app = test_service!(db, StubProvider::default());

    let req = test::TestRequest::get().uri("/api/orders").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status().as_u16(), 401);

    let req = test::TestRequest::get()
        .uri("/api/orders")
        .insert_header((AUTHORIZATION, "Bearer not.a.token"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status().as_u16(), 401);
}

#[actix_web::test]
async fn cart_to_order_flow_over_http() {
    let dir = TempDir::new().unwrap();
    let db = new_db(&dir).await;
    let user = seed_user(&db, "shopper@example.com").await;
    let product = seed_product(&db, "Mug", Money::from_major_units(10), 5).await;
    let token = user_token(user.id);
    let app = test_service!(db.clone(), StubProvider::default());

    let req = test::TestRequest::post()
        .uri("/api/cart")
        .insert_header((AUTHORIZATION, format!("Bearer {token}")))
        .set_json(CartLineRequest { product_id: product.id, quantity: 2 })
        .to_request();
    let line: CartLine = test::call_and_read_body_json(&app, req).await;
    assert_eq!(line.quantity, 2);

    let req = test::TestRequest::post()
        .uri("/api/orders")
        .insert_header((AUTHORIZATION, format!("Bearer {token}")))
        .to_request();
    let order: Order = test::call_and_read_body_json(&app, req).await;
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount, Money::from_major_units(20));

    // The cart is consumed and the inventory reserved.
    assert!(db.fetch_cart(user.id).await.unwrap().is_empty());
    assert_eq!(db.fetch_product(product.id).await.unwrap().unwrap().available_quantity, 3);
}

#[actix_web::test]
async fn placing_an_order_with_an_empty_cart_is_a_400() {
    let dir = TempDir::new().unwrap();
    let db = new_db(&dir).await;
    let user = seed_user(&db, "shopper@example.com").await;
    let token = user_token(user.id);
    let app = test_service!(db, StubProvider::default());

    let req = test::TestRequest::post()
        .uri("/api/orders")
        .insert_header((AUTHORIZATION, format!("Bearer {token}")))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status().as_u16(), 400);
}

#[actix_web::test]
async fn orders_are_visible_to_their_owner_and_admins_only() {
    let dir = TempDir::new().unwrap();
    let db = new_db(&dir).await;
    let owner = seed_user(&db, "owner@example.com").await;
    let stranger = seed_user(&db, "stranger@example.com").await;
    let product = seed_product(&db, "Mug", Money::from_major_units(10), 5).await;
    let order = place_simple_order(&db, owner.id, product.id, 1).await;
    let app = test_service!(db, StubProvider::default());
    let uri = format!("/api/orders/{}", order.id.value());

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header((AUTHORIZATION, format!("Bearer {}", user_token(owner.id))))
        .to_request();
    let result: OrderResult = test::call_and_read_body_json(&app, req).await;
    assert_eq!(result.order.id, order.id);
    assert_eq!(result.lines.len(), 1);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header((AUTHORIZATION, format!("Bearer {}", user_token(stranger.id))))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status().as_u16(), 403);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header((AUTHORIZATION, format!("Bearer {}", admin_token(stranger.id))))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert!(res.status().is_success());
}

#[actix_web::test]
async fn fulfilment_transitions_require_the_admin_role() {
    let dir = TempDir::new().unwrap();
    let db = new_db(&dir).await;
    let user = seed_user(&db, "shopper@example.com").await;
    let product = seed_product(&db, "Mug", Money::from_major_units(10), 5).await;
    let order = place_simple_order(&db, user.id, product.id, 1).await;
    let app = test_service!(db.clone(), StubProvider::default());
    let uri = format!("/api/orders/{}/status", order.id.value());

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header((AUTHORIZATION, format!("Bearer {}", user_token(user.id))))
        .set_json(OrderStatusUpdateRequest { status: OrderStatus::Processing })
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status().as_u16(), 403);
    assert_eq!(db.fetch_order(&order.id).await.unwrap().unwrap().status, OrderStatus::Pending);

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header((AUTHORIZATION, format!("Bearer {}", admin_token(user.id))))
        .set_json(OrderStatusUpdateRequest { status: OrderStatus::Processing })
        .to_request();
    let updated: Order = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated.status, OrderStatus::Processing);
}
