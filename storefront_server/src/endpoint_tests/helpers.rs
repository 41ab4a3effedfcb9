#![allow(dead_code)]
use sfg_common::Money;
use storefront_engine::{
    db_types::{NewProduct, NewUser, Order, Product, Role, User},
    SqliteDatabase,
    StorefrontDatabase,
};
use stripe_tools::{NewCheckoutSession, StripeApiError, StripeConfig};
use tempfile::TempDir;

use crate::{auth::TokenIssuer, config::AuthConfig, integrations::stripe::CheckoutProvider};

pub const TEST_JWT_SECRET: &str = "endpoint-test-secret";
pub const TEST_WEBHOOK_SECRET: &str = "whsec_endpoint_test";

/// Stands in for the provider's REST API during checkout tests.
#[derive(Debug, Clone, Default)]
pub struct StubProvider {
    pub fail: bool,
}

impl CheckoutProvider for StubProvider {
    async fn create_checkout_session(
        &self,
        _amount: Money,
        _currency: &str,
        order_id: &str,
        _description: &str,
    ) -> Result<NewCheckoutSession, StripeApiError> {
        if self.fail {
            Err(StripeApiError::QueryError { status: 402, message: "declined".to_string() })
        } else {
            Ok(NewCheckoutSession {
                id: format!("cs_test_{order_id}"),
                url: Some(format!("https://checkout.test/{order_id}")),
            })
        }
    }
}

pub async fn new_db(dir: &TempDir) -> SqliteDatabase {
    let _ = env_logger::try_init();
    let path = dir.path().join("storefront.db");
    let url = format!("sqlite://{}?mode=rwc", path.display());
    SqliteDatabase::new_with_url(&url, 1).await.expect("database should initialise")
}

pub fn auth_config() -> AuthConfig {
    AuthConfig::new(TEST_JWT_SECRET)
}

pub fn stripe_config() -> StripeConfig {
    StripeConfig {
        webhook_secret: sfg_common::Secret::new(TEST_WEBHOOK_SECRET.to_string()),
        ..StripeConfig::default()
    }
}

pub fn user_token(user_id: i64) -> String {
    TokenIssuer::new(&auth_config()).issue(user_id, vec![Role::User]).expect("token should sign")
}

pub fn admin_token(user_id: i64) -> String {
    TokenIssuer::new(&auth_config()).issue(user_id, vec![Role::User, Role::Admin]).expect("token should sign")
}

pub async fn seed_user(db: &SqliteDatabase, email: &str) -> User {
    db.upsert_user(NewUser { email: email.to_string(), display_name: "Test Shopper".to_string() })
        .await
        .expect("user should be created")
}

pub async fn seed_product(db: &SqliteDatabase, name: &str, price: Money, stock: i64) -> Product {
    db.insert_product(NewProduct { name: name.to_string(), price, available_quantity: stock })
        .await
        .expect("product should be created")
}

pub async fn place_simple_order(db: &SqliteDatabase, user_id: i64, product_id: i64, quantity: i64) -> Order {
    db.upsert_cart_line(user_id, product_id, quantity).await.expect("cart line should be added");
    db.place_order(user_id).await.expect("order should be placed")
}

/// Builds and initialises the full test service over the given database and stub provider.
macro_rules! test_service {
    ($db:expr, $provider:expr) => {{
        let orders_api = storefront_engine::OrderFlowApi::new($db.clone());
        let reconciliation_api = storefront_engine::ReconciliationApi::new(
            $db.clone(),
            storefront_engine::events::EventProducers::default(),
        );
        let api_scope = actix_web::web::scope("/api")
            .service(crate::routes::ProductsRoute::<storefront_engine::SqliteDatabase>::new())
            .service(crate::routes::ListProductRoute::<storefront_engine::SqliteDatabase>::new())
            .service(crate::routes::MyCartRoute::<storefront_engine::SqliteDatabase>::new())
            .service(crate::routes::AddToCartRoute::<storefront_engine::SqliteDatabase>::new())
            .service(crate::routes::RemoveFromCartRoute::<storefront_engine::SqliteDatabase>::new())
            .service(crate::routes::PlaceOrderRoute::<storefront_engine::SqliteDatabase>::new())
            .service(crate::routes::MyOrdersRoute::<storefront_engine::SqliteDatabase>::new())
            .service(crate::routes::OrderByIdRoute::<storefront_engine::SqliteDatabase>::new())
            .service(crate::routes::UpdateOrderStatusRoute::<storefront_engine::SqliteDatabase>::new())
            .service(crate::routes::CheckoutRoute::<
                storefront_engine::SqliteDatabase,
                crate::endpoint_tests::helpers::StubProvider,
            >::new());
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(orders_api))
                .app_data(actix_web::web::Data::new(reconciliation_api))
                .app_data(actix_web::web::Data::new(crate::endpoint_tests::helpers::auth_config()))
                .app_data(actix_web::web::Data::new(crate::endpoint_tests::helpers::stripe_config()))
                .app_data(actix_web::web::Data::new($provider))
                .service(crate::routes::health)
                .service(api_scope)
                .service(crate::integrations::stripe::StripeWebhookRoute::<storefront_engine::SqliteDatabase>::new()),
        )
        .await
    }};
}
pub(crate) use test_service;
