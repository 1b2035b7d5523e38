mod common;

use common::{category_fixture, dec, product_fixture, shipping_info, test_db, user_fixture};
use regex::Regex;
use rust_decimal::Decimal;
use rust_storefront::entities::{order, product};
use rust_storefront::errors::StoreError;
use rust_storefront::services::{cart, checkout};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

#[tokio::test]
async fn checkout_fails_on_an_empty_cart() {
    let db = test_db().await;
    let user = user_fixture(&db, "impatient").await;

    // No cart row at all.
    let err = checkout::place_order(&db, user.id, shipping_info())
        .await
        .expect_err("Checkout without a cart should fail");
    assert!(matches!(err, StoreError::EmptyCart));

    // Cart row exists but holds nothing.
    let clothing = category_fixture(&db, "Clothing").await;
    let tee = product_fixture(&db, clothing.id, "Cotton T-Shirt", dec(1999), 5).await;
    cart::add_item(&db, user.id, tee.id, 1)
        .await
        .expect("Failed to add product");
    let view = cart::get_cart(&db, user.id).await.expect("Failed to read cart");
    cart::remove_item(&db, user.id, view.items[0].id)
        .await
        .expect("Failed to clear cart");

    let err = checkout::place_order(&db, user.id, shipping_info())
        .await
        .expect_err("Checkout with an emptied cart should fail");
    assert!(matches!(err, StoreError::EmptyCart));

    let orders = order::Entity::find().all(&db).await.expect("Failed to list orders");
    assert!(orders.is_empty());
}

#[tokio::test]
async fn checkout_snapshots_the_cart_into_an_order() {
    let db = test_db().await;
    let user = user_fixture(&db, "buyer").await;
    let clothing = category_fixture(&db, "Clothing").await;
    let tee = product_fixture(&db, clothing.id, "Cotton T-Shirt", dec(1999), 10).await;
    let pots = product_fixture(&db, clothing.id, "Ceramic Plant Pots", dec(2999), 5).await;

    cart::add_item(&db, user.id, tee.id, 2)
        .await
        .expect("Failed to add product");
    cart::add_item(&db, user.id, pots.id, 1)
        .await
        .expect("Failed to add product");

    let receipt = checkout::place_order(&db, user.id, shipping_info())
        .await
        .expect("Checkout failed");

    let pattern = Regex::new(r"^ORD-[0-9A-F]{8}$").unwrap();
    assert!(pattern.is_match(&receipt.order_number));
    assert_eq!(receipt.status, order::Status::Pending);
    assert!(!receipt.is_paid);
    assert_eq!(receipt.total_amount, dec(6997));
    assert_eq!(receipt.items.len(), 2);

    // Stock went down by exactly the ordered quantities.
    let tee_after = product::Entity::find_by_id(tee.id)
        .one(&db)
        .await
        .expect("Failed to load product")
        .expect("Product vanished");
    assert_eq!(tee_after.stock, 8);
    let pots_after = product::Entity::find_by_id(pots.id)
        .one(&db)
        .await
        .expect("Failed to load product")
        .expect("Product vanished");
    assert_eq!(pots_after.stock, 4);

    // The cart is empty again.
    let view = cart::get_cart(&db, user.id).await.expect("Failed to read cart");
    assert!(view.items.is_empty());

    // Later price changes never touch the placed order.
    let mut repriced: product::ActiveModel = tee_after.into();
    repriced.price = Set(dec(2999));
    repriced.update(&db).await.expect("Failed to change price");

    let reloaded = checkout::get_order(&db, user.id, &receipt.order_number)
        .await
        .expect("Failed to reload order");
    assert_eq!(reloaded.total_amount, dec(6997));
    let tee_line = reloaded
        .items
        .iter()
        .find(|item| item.product_id == tee.id)
        .expect("Missing tee line");
    assert_eq!(tee_line.price, dec(1999));
    assert_eq!(tee_line.total_price, dec(3998));
}

#[tokio::test]
async fn checkout_aborts_when_stock_ran_out_in_the_meantime() {
    let db = test_db().await;
    let user = user_fixture(&db, "latecomer").await;
    let clothing = category_fixture(&db, "Clothing").await;
    let jacket = product_fixture(&db, clothing.id, "Winter Jacket", dec(12999), 3).await;

    cart::add_item(&db, user.id, jacket.id, 3)
        .await
        .expect("Failed to add product");

    // Stock shrinks between carting and checkout.
    let mut drained: product::ActiveModel = jacket.into();
    drained.stock = Set(1);
    drained.update(&db).await.expect("Failed to drain stock");

    let err = checkout::place_order(&db, user.id, shipping_info())
        .await
        .expect_err("Checkout beyond stock should fail");
    assert!(matches!(err, StoreError::InsufficientStock(ref name) if name == "Winter Jacket"));

    // Nothing happened: no order, stock untouched, cart intact.
    let orders = order::Entity::find().all(&db).await.expect("Failed to list orders");
    assert!(orders.is_empty());
    let view = cart::get_cart(&db, user.id).await.expect("Failed to read cart");
    assert_eq!(view.total_items, 3);
    assert_eq!(view.items[0].quantity, 3);
}

#[tokio::test]
async fn the_last_unit_goes_to_exactly_one_of_two_buyers() {
    let db = test_db().await;
    let first = user_fixture(&db, "quick").await;
    let second = user_fixture(&db, "quicker").await;
    let clothing = category_fixture(&db, "Clothing").await;
    let jacket = product_fixture(&db, clothing.id, "Winter Jacket", dec(12999), 1).await;

    cart::add_item(&db, first.id, jacket.id, 1)
        .await
        .expect("Failed to add product");
    cart::add_item(&db, second.id, jacket.id, 1)
        .await
        .expect("Failed to add product");

    let (a, b) = tokio::join!(
        checkout::place_order(&db, first.id, shipping_info()),
        checkout::place_order(&db, second.id, shipping_info()),
    );

    let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one buyer gets the last unit");
    let loser = if a.is_err() { a } else { b };
    assert!(matches!(
        loser.expect_err("One order must fail"),
        StoreError::InsufficientStock(_)
    ));

    let jacket_after = product::Entity::find_by_id(jacket.id)
        .one(&db)
        .await
        .expect("Failed to load product")
        .expect("Product vanished");
    assert_eq!(jacket_after.stock, 0);
}

#[tokio::test]
async fn claim_stock_never_goes_below_zero() {
    let db = test_db().await;
    let clothing = category_fixture(&db, "Clothing").await;
    let jacket = product_fixture(&db, clothing.id, "Winter Jacket", dec(12999), 1).await;

    let granted = checkout::claim_stock(&db, jacket.id, 1)
        .await
        .expect("Claim failed");
    assert!(granted);

    let denied = checkout::claim_stock(&db, jacket.id, 1)
        .await
        .expect("Claim failed");
    assert!(!denied);

    let jacket_after = product::Entity::find_by_id(jacket.id)
        .one(&db)
        .await
        .expect("Failed to load product")
        .expect("Product vanished");
    assert_eq!(jacket_after.stock, 0);
}

#[tokio::test]
async fn orders_are_scoped_to_their_owner() {
    let db = test_db().await;
    let buyer = user_fixture(&db, "buyer").await;
    let other = user_fixture(&db, "other").await;
    let clothing = category_fixture(&db, "Clothing").await;
    let tee = product_fixture(&db, clothing.id, "Cotton T-Shirt", dec(1999), 10).await;

    cart::add_item(&db, buyer.id, tee.id, 1)
        .await
        .expect("Failed to add product");
    let receipt = checkout::place_order(&db, buyer.id, shipping_info())
        .await
        .expect("Checkout failed");

    let err = checkout::get_order(&db, other.id, &receipt.order_number)
        .await
        .expect_err("Foreign order lookup should fail");
    assert!(matches!(err, StoreError::NotFound));

    let own = checkout::get_order(&db, buyer.id, &receipt.order_number)
        .await
        .expect("Owner lookup failed");
    assert_eq!(own.order_number, receipt.order_number);

    assert!(checkout::list_orders(&db, other.id)
        .await
        .expect("Failed to list orders")
        .is_empty());
    assert_eq!(
        checkout::list_orders(&db, buyer.id)
            .await
            .expect("Failed to list orders")
            .len(),
        1
    );
}

#[tokio::test]
async fn a_failed_checkout_keeps_totals_exact() {
    let db = test_db().await;
    let user = user_fixture(&db, "careful").await;
    let clothing = category_fixture(&db, "Clothing").await;
    let tee = product_fixture(&db, clothing.id, "Cotton T-Shirt", dec(1999), 2).await;
    let jeans = product_fixture(&db, clothing.id, "Denim Jeans", dec(5999), 1).await;

    cart::add_item(&db, user.id, tee.id, 2)
        .await
        .expect("Failed to add product");
    cart::add_item(&db, user.id, jeans.id, 1)
        .await
        .expect("Failed to add product");

    // One line of the mixed cart loses its stock. The whole checkout
    // fails and the other line must not be decremented either.
    let mut drained: product::ActiveModel = jeans.into();
    drained.stock = Set(0);
    drained.update(&db).await.expect("Failed to drain stock");

    let err = checkout::place_order(&db, user.id, shipping_info())
        .await
        .expect_err("Checkout should fail");
    assert!(matches!(err, StoreError::InsufficientStock(_)));

    let tee_after = product::Entity::find_by_id(tee.id)
        .one(&db)
        .await
        .expect("Failed to load product")
        .expect("Product vanished");
    assert_eq!(tee_after.stock, 2, "untouched line keeps its stock");

    let view = cart::get_cart(&db, user.id).await.expect("Failed to read cart");
    assert_eq!(view.total_items, 3);
    assert_eq!(view.total_price, dec(1999) * Decimal::from(2) + dec(5999));
}
