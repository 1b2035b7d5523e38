use crate::entities::{cart, cart_item, product};
use crate::errors::StoreError;
use chrono::Utc;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
    TransactionTrait,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex as TokioMutex, OwnedMutexGuard};

static CART_LOCKS: Lazy<StdMutex<HashMap<i32, Arc<TokioMutex<()>>>>> =
    Lazy::new(|| StdMutex::new(HashMap::new()));

/// Serializes cart mutations and checkout for one user. Requests for
/// different users proceed independently. The map only keeps entries
/// with a holder or a waiter, so it is bounded by concurrent users.
pub(crate) async fn lock_cart(user_id: i32) -> OwnedMutexGuard<()> {
    let lock = {
        let mut locks = CART_LOCKS.lock().unwrap_or_else(|e| e.into_inner());
        let lock = locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(TokioMutex::new(())))
            .clone();
        // An idle entry is referenced by the map alone.
        locks.retain(|_, entry| Arc::strong_count(entry) > 1);
        lock
    };
    lock.lock_owned().await
}

/// Adds `quantity` units of a product to the user's cart, merging into
/// an existing line when the product is already there. The stock check
/// always covers the combined quantity.
pub async fn add_item(
    db: &DatabaseConnection,
    user_id: i32,
    product_id: i32,
    quantity: i32,
) -> Result<CartTotals, StoreError> {
    if quantity < 1 {
        return Err(StoreError::Validation(
            "Quantity must be at least 1".to_string(),
        ));
    }

    let _guard = lock_cart(user_id).await;
    let txn = db.begin().await?;

    let product = product::Entity::find_by_id(product_id)
        .filter(product::Column::IsActive.eq(true))
        .one(&txn)
        .await?
        .ok_or(StoreError::NotFound)?;

    let cart = get_or_create_cart(&txn, user_id).await?;

    let existing = cart_item::Entity::find()
        .filter(cart_item::Column::CartId.eq(cart.id))
        .filter(cart_item::Column::ProductId.eq(product_id))
        .one(&txn)
        .await?;

    let now = Utc::now();
    match existing {
        Some(entry) => {
            let new_quantity = entry.quantity.saturating_add(quantity);
            if new_quantity > product.stock {
                return Err(StoreError::InsufficientStock(product.name));
            }
            let mut entry: cart_item::ActiveModel = entry.into();
            entry.quantity = Set(new_quantity);
            entry.updated_at = Set(now);
            entry.update(&txn).await?;
        }
        None => {
            if quantity > product.stock {
                return Err(StoreError::InsufficientStock(product.name));
            }
            cart_item::ActiveModel {
                cart_id: Set(cart.id),
                product_id: Set(product_id),
                quantity: Set(quantity),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
    }

    let totals = cart_totals(&txn, cart.id).await?;
    txn.commit().await?;
    Ok(totals)
}

/// Sets the quantity of one cart line. Zero or negative removes the
/// line. Only lines belonging to the user's own cart are reachable.
pub async fn update_item(
    db: &DatabaseConnection,
    user_id: i32,
    item_id: i32,
    quantity: i32,
) -> Result<ItemChange, StoreError> {
    let _guard = lock_cart(user_id).await;
    let txn = db.begin().await?;

    let entry = cart_item::Entity::find_by_id(item_id)
        .join(JoinType::InnerJoin, cart_item::Relation::Cart.def())
        .filter(cart::Column::UserId.eq(user_id))
        .one(&txn)
        .await?
        .ok_or(StoreError::NotFound)?;

    let cart_id = entry.cart_id;
    let item_total;
    let removed;

    if quantity <= 0 {
        let entry: cart_item::ActiveModel = entry.into();
        entry.delete(&txn).await?;
        item_total = Decimal::ZERO;
        removed = true;
    } else {
        let product = product::Entity::find_by_id(entry.product_id)
            .one(&txn)
            .await?
            .ok_or(StoreError::NotFound)?;
        if quantity > product.stock {
            return Err(StoreError::InsufficientStock(product.name));
        }
        let mut entry: cart_item::ActiveModel = entry.into();
        entry.quantity = Set(quantity);
        entry.updated_at = Set(Utc::now());
        entry.update(&txn).await?;
        item_total = product.price * Decimal::from(quantity);
        removed = false;
    }

    let totals = cart_totals(&txn, cart_id).await?;
    txn.commit().await?;
    Ok(ItemChange {
        totals,
        item_total,
        removed,
    })
}

pub async fn remove_item(
    db: &DatabaseConnection,
    user_id: i32,
    item_id: i32,
) -> Result<CartTotals, StoreError> {
    let _guard = lock_cart(user_id).await;
    let txn = db.begin().await?;

    let entry = cart_item::Entity::find_by_id(item_id)
        .join(JoinType::InnerJoin, cart_item::Relation::Cart.def())
        .filter(cart::Column::UserId.eq(user_id))
        .one(&txn)
        .await?
        .ok_or(StoreError::NotFound)?;

    let cart_id = entry.cart_id;
    let entry: cart_item::ActiveModel = entry.into();
    entry.delete(&txn).await?;

    let totals = cart_totals(&txn, cart_id).await?;
    txn.commit().await?;
    Ok(totals)
}

/// Full cart view for the current user. A user without a cart row gets
/// an empty view, the cart itself is only created on first add.
pub async fn get_cart(db: &DatabaseConnection, user_id: i32) -> Result<CartView, StoreError> {
    let txn = db.begin().await?;

    let Some(cart) = cart::Entity::find()
        .filter(cart::Column::UserId.eq(user_id))
        .one(&txn)
        .await?
    else {
        return Ok(CartView::empty());
    };

    let rows = item_rows(&txn, cart.id).await?;
    txn.commit().await?;

    let mut items = Vec::with_capacity(rows.len());
    let mut total_items: i64 = 0;
    let mut total_price = Decimal::ZERO;
    for row in rows {
        let subtotal = row.price * Decimal::from(row.quantity);
        total_items += i64::from(row.quantity);
        total_price += subtotal;
        items.push(CartItemView {
            id: row.id,
            product_id: row.product_id,
            name: row.name,
            slug: row.slug,
            price: row.price,
            quantity: row.quantity,
            subtotal,
            in_stock: row.stock > 0,
        });
    }

    Ok(CartView {
        items,
        total_items,
        total_price,
    })
}

pub(crate) async fn get_or_create_cart<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
) -> Result<cart::Model, StoreError> {
    if let Some(existing) = cart::Entity::find()
        .filter(cart::Column::UserId.eq(user_id))
        .one(conn)
        .await?
    {
        return Ok(existing);
    }

    let now = Utc::now();
    let created = cart::ActiveModel {
        user_id: Set(user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(created)
}

pub(crate) async fn item_rows<C: ConnectionTrait>(
    conn: &C,
    cart_id: i32,
) -> Result<Vec<CartItemRow>, StoreError> {
    let rows = cart_item::Entity::find()
        .filter(cart_item::Column::CartId.eq(cart_id))
        .join(JoinType::InnerJoin, cart_item::Relation::Product.def())
        .select_only()
        .column_as(cart_item::Column::Id, "id")
        .column_as(cart_item::Column::Quantity, "quantity")
        .column_as(product::Column::Id, "product_id")
        .column_as(product::Column::Name, "name")
        .column_as(product::Column::Slug, "slug")
        .column_as(product::Column::Price, "price")
        .column_as(product::Column::Stock, "stock")
        .order_by_asc(cart_item::Column::Id)
        .into_model::<CartItemRow>()
        .all(conn)
        .await?;
    Ok(rows)
}

async fn cart_totals<C: ConnectionTrait>(
    conn: &C,
    cart_id: i32,
) -> Result<CartTotals, StoreError> {
    let rows = item_rows(conn, cart_id).await?;
    let mut totals = CartTotals {
        total_items: 0,
        total_price: Decimal::ZERO,
    };
    for row in rows {
        totals.total_items += i64::from(row.quantity);
        totals.total_price += row.price * Decimal::from(row.quantity);
    }
    Ok(totals)
}

//Structs
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total_items: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
}

impl CartView {
    fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_items: 0,
            total_price: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub id: i32,
    pub product_id: i32,
    pub name: String,
    pub slug: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    pub in_stock: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct CartTotals {
    pub total_items: i64,
    pub total_price: Decimal,
}

#[derive(Debug, Clone, Copy)]
pub struct ItemChange {
    pub totals: CartTotals,
    pub item_total: Decimal,
    pub removed: bool,
}

#[derive(Debug, FromQueryResult)]
pub(crate) struct CartItemRow {
    pub(crate) id: i32,
    pub(crate) product_id: i32,
    pub(crate) name: String,
    pub(crate) slug: String,
    pub(crate) price: Decimal,
    pub(crate) stock: i32,
    pub(crate) quantity: i32,
}
