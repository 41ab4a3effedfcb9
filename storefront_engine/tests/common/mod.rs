#![allow(dead_code)]
use sfg_common::Money;
use storefront_engine::{
    db_types::{NewProduct, NewUser, Order, Product, User},
    SqliteDatabase,
    StorefrontDatabase,
};
use tempfile::TempDir;

pub async fn new_db(dir: &TempDir) -> SqliteDatabase {
    let _ = env_logger::try_init();
    let path = dir.path().join("storefront.db");
    let url = format!("sqlite://{}?mode=rwc", path.display());
    // A single connection: SQLite serializes writers anyway, and this keeps concurrent
    // test transactions from tripping over snapshot upgrades.
    SqliteDatabase::new_with_url(&url, 1).await.expect("database should initialise")
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

/// Puts a single product in the user's cart and places the order.
pub async fn place_simple_order(db: &SqliteDatabase, user_id: i64, product_id: i64, quantity: i64) -> Order {
    db.upsert_cart_line(user_id, product_id, quantity).await.expect("cart line should be added");
    db.place_order(user_id).await.expect("order should be placed")
}
