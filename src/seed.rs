use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Set, TransactionTrait,
};
use tracing::info;

use crate::entities::{category, product, user};
use crate::errors::StoreError;
use crate::services::account::{create_profile_for_user, hash_password};
use crate::services::catalog::slugify;

/// Loads a small demo catalog plus two known accounts
/// (`admin`/`admin123` and `testuser`/`testpass123`). Runs only against
/// an empty database so restarts never duplicate rows.
pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), StoreError> {
    if user::Entity::find().count(db).await? > 0 {
        info!("Database already has users, skipping demo seed");
        return Ok(());
    }

    let txn = db.begin().await?;
    let now = Utc::now();

    let admin = user::ActiveModel {
        username: Set("admin".to_string()),
        email: Set("admin@example.com".to_string()),
        password: Set(hash_password("admin123")?),
        role: Set(user::Role::Admin),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    create_profile_for_user(&txn, admin.id).await?;

    let customer = user::ActiveModel {
        username: Set("testuser".to_string()),
        email: Set("testuser@example.com".to_string()),
        password: Set(hash_password("testpass123")?),
        role: Set(user::Role::User),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    create_profile_for_user(&txn, customer.id).await?;

    let categories = [
        ("Electronics", "Gadgets, audio and accessories"),
        ("Clothing", "Everyday wear for all seasons"),
        ("Books", "Fiction and technical titles"),
        ("Home & Garden", "Furnishings and outdoor living"),
        ("Sports & Outdoors", "Gear for training and trails"),
        ("Health & Beauty", "Personal care essentials"),
    ];
    let mut category_ids = Vec::with_capacity(categories.len());
    for (name, description) in categories {
        let created = category::ActiveModel {
            name: Set(name.to_string()),
            slug: Set(slugify(name)),
            description: Set(description.to_string()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        category_ids.push(created.id);
    }

    // (name, category index, price in cents, stock, featured, description)
    let products: [(&str, usize, i64, i32, bool, &str); 14] = [
        (
            "Wireless Headphones",
            0,
            9999,
            50,
            true,
            "Over-ear wireless headphones with active noise cancelling",
        ),
        (
            "Phone Case",
            0,
            2499,
            100,
            false,
            "Shock absorbing case with raised screen edges",
        ),
        (
            "Power Bank",
            0,
            3999,
            75,
            false,
            "10000 mAh portable charger with two USB ports",
        ),
        (
            "Cotton T-Shirt",
            1,
            1999,
            200,
            true,
            "Plain heavyweight cotton tee",
        ),
        (
            "Denim Jeans",
            1,
            5999,
            80,
            false,
            "Straight cut jeans in washed indigo",
        ),
        (
            "Winter Jacket",
            1,
            12999,
            30,
            false,
            "Insulated jacket rated for sub-zero days",
        ),
        (
            "Rust in Practice",
            2,
            3499,
            60,
            false,
            "Hands-on systems programming, from ownership to async",
        ),
        (
            "Space Opera Novel",
            2,
            1499,
            90,
            false,
            "A fleet, a dying star and one bad decision",
        ),
        (
            "LED Desk Lamp",
            3,
            4599,
            40,
            false,
            "Dimmable lamp with adjustable color temperature",
        ),
        (
            "Ceramic Plant Pots",
            3,
            2999,
            70,
            true,
            "Set of three glazed pots with drainage trays",
        ),
        (
            "Yoga Mat",
            4,
            3599,
            85,
            false,
            "Non-slip 6mm mat with carry strap",
        ),
        (
            "Insulated Water Bottle",
            4,
            2299,
            120,
            false,
            "Keeps drinks cold for 24 hours",
        ),
        (
            "Vitamin C Serum",
            5,
            4999,
            55,
            false,
            "Brightening serum with hyaluronic acid",
        ),
        (
            "Essential Oil Set",
            5,
            3999,
            45,
            false,
            "Six single-note oils for diffusers",
        ),
    ];
    for (name, category, cents, stock, featured, description) in products {
        product::ActiveModel {
            name: Set(name.to_string()),
            slug: Set(slugify(name)),
            description: Set(description.to_string()),
            price: Set(Decimal::new(cents, 2)),
            stock: Set(stock),
            category_id: Set(category_ids[category]),
            is_active: Set(true),
            is_featured: Set(featured),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    info!(
        categories = categories.len(),
        products = products.len(),
        "Seeded demo data"
    );
    Ok(())
}
