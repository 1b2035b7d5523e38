#![allow(dead_code)]

use chrono::Utc;
use rust_decimal::Decimal;
use rust_storefront::entities::{category, product, setup_schema, user};
use rust_storefront::services::account;
use rust_storefront::services::catalog::slugify;
use rust_storefront::services::checkout::ShippingInfo;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Fresh in-memory database with the full schema. One connection only,
/// sqlite would otherwise hand every pool member its own empty memory.
pub async fn test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);
    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    setup_schema(&db).await;
    db
}

pub fn dec(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

pub async fn user_fixture(db: &DatabaseConnection, username: &str) -> user::Model {
    account::register(
        db,
        username,
        &format!("{username}@example.com"),
        TEST_PASSWORD,
    )
    .await
    .expect("Failed to register test user")
}

pub async fn category_fixture(db: &DatabaseConnection, name: &str) -> category::Model {
    let now = Utc::now();
    category::ActiveModel {
        name: Set(name.to_string()),
        slug: Set(slugify(name)),
        description: Set(format!("{name} things")),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert test category")
}

pub async fn product_fixture(
    db: &DatabaseConnection,
    category_id: i32,
    name: &str,
    price: Decimal,
    stock: i32,
) -> product::Model {
    let now = Utc::now();
    product::ActiveModel {
        name: Set(name.to_string()),
        slug: Set(slugify(name)),
        description: Set(format!("A very nice {name}")),
        price: Set(price),
        stock: Set(stock),
        category_id: Set(category_id),
        is_active: Set(true),
        is_featured: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert test product")
}

pub fn shipping_info() -> ShippingInfo {
    ShippingInfo {
        first_name: "Jamie".to_string(),
        last_name: "Doe".to_string(),
        email: "jamie@example.com".to_string(),
        phone: "+1 555 0100".to_string(),
        address_line1: "1 Main St".to_string(),
        address_line2: None,
        city: "Springfield".to_string(),
        state: "IL".to_string(),
        postal_code: "62701".to_string(),
        country: "USA".to_string(),
    }
}
