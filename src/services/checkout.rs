use crate::entities::{cart, cart_item, order, order_item, product};
use crate::errors::StoreError;
use crate::services::cart::{item_rows, lock_cart};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    FromQueryResult, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, SqlErr,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

const ORDER_NUMBER_ATTEMPTS: usize = 5;

/// Converts the user's cart into an order. The whole transition runs in
/// one transaction: validate the cart, snapshot prices into order items,
/// decrement stock and clear the cart. Any failure leaves everything
/// untouched.
pub async fn place_order(
    db: &DatabaseConnection,
    user_id: i32,
    shipping: ShippingInfo,
) -> Result<OrderReceipt, StoreError> {
    let _guard = lock_cart(user_id).await;
    let txn = db.begin().await?;

    let cart = cart::Entity::find()
        .filter(cart::Column::UserId.eq(user_id))
        .one(&txn)
        .await?
        .ok_or(StoreError::EmptyCart)?;

    let rows = item_rows(&txn, cart.id).await?;
    if rows.is_empty() {
        return Err(StoreError::EmptyCart);
    }

    for row in &rows {
        if row.quantity > row.stock {
            return Err(StoreError::InsufficientStock(row.name.clone()));
        }
    }

    let total_amount: Decimal = rows
        .iter()
        .map(|row| row.price * Decimal::from(row.quantity))
        .sum();

    let order = insert_order(&txn, user_id, &shipping, total_amount).await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        order_item::ActiveModel {
            order_id: Set(order.id),
            product_id: Set(row.product_id),
            quantity: Set(row.quantity),
            price: Set(row.price),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        // Conditional decrement. Zero rows affected means the stock
        // moved under us, so the whole order rolls back.
        if !claim_stock(&txn, row.product_id, row.quantity).await? {
            return Err(StoreError::InsufficientStock(row.name.clone()));
        }

        items.push(OrderItemView {
            product_id: row.product_id,
            name: row.name.clone(),
            quantity: row.quantity,
            price: row.price,
            total_price: row.price * Decimal::from(row.quantity),
        });
    }

    cart_item::Entity::delete_many()
        .filter(cart_item::Column::CartId.eq(cart.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    Ok(receipt(order, items))
}

/// Takes `quantity` units off a product's stock, but only when enough
/// is left. Returns false without changing the row otherwise.
pub async fn claim_stock<C: ConnectionTrait>(
    conn: &C,
    product_id: i32,
    quantity: i32,
) -> Result<bool, StoreError> {
    let result = product::Entity::update_many()
        .col_expr(
            product::Column::Stock,
            Expr::col(product::Column::Stock).sub(quantity),
        )
        .filter(product::Column::Id.eq(product_id))
        .filter(product::Column::Stock.gte(quantity))
        .exec(conn)
        .await?;
    Ok(result.rows_affected == 1)
}

pub async fn get_order(
    db: &DatabaseConnection,
    user_id: i32,
    order_number: &str,
) -> Result<OrderReceipt, StoreError> {
    let order = order::Entity::find()
        .filter(order::Column::OrderNumber.eq(order_number))
        .filter(order::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or(StoreError::NotFound)?;

    let items = order_items(db, order.id).await?;
    Ok(receipt(order, items))
}

pub async fn list_orders(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<OrderSummary>, StoreError> {
    let orders = order::Entity::find()
        .filter(order::Column::UserId.eq(user_id))
        .order_by_desc(order::Column::CreatedAt)
        .all(db)
        .await?;

    Ok(orders
        .into_iter()
        .map(|order| OrderSummary {
            order_number: order.order_number,
            status: order.status,
            is_paid: order.is_paid,
            total_amount: order.total_amount,
            created_at: order.created_at,
        })
        .collect())
}

async fn insert_order<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    shipping: &ShippingInfo,
    total_amount: Decimal,
) -> Result<order::Model, StoreError> {
    let now = Utc::now();
    for _ in 0..ORDER_NUMBER_ATTEMPTS {
        let attempt = order::ActiveModel {
            order_number: Set(generate_order_number()),
            user_id: Set(user_id),
            status: Set(order::Status::Pending),
            is_paid: Set(false),
            total_amount: Set(total_amount),
            first_name: Set(shipping.first_name.clone()),
            last_name: Set(shipping.last_name.clone()),
            email: Set(shipping.email.clone()),
            phone: Set(shipping.phone.clone()),
            address_line1: Set(shipping.address_line1.clone()),
            address_line2: Set(shipping.address_line2.clone().unwrap_or_default()),
            city: Set(shipping.city.clone()),
            state: Set(shipping.state.clone()),
            postal_code: Set(shipping.postal_code.clone()),
            country: Set(shipping.country.clone()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        match attempt.insert(conn).await {
            Ok(model) => return Ok(model),
            // Order number collision, roll a new one.
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                continue;
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(DbErr::Custom("Ran out of order number attempts".to_string()).into())
}

/// `ORD-` followed by eight uppercase hex characters.
pub fn generate_order_number() -> String {
    let hex = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("ORD-{}", &hex[..8])
}

async fn order_items<C: ConnectionTrait>(
    conn: &C,
    order_id: i32,
) -> Result<Vec<OrderItemView>, StoreError> {
    let rows = order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .join(JoinType::InnerJoin, order_item::Relation::Product.def())
        .select_only()
        .column_as(order_item::Column::ProductId, "product_id")
        .column_as(product::Column::Name, "name")
        .column_as(order_item::Column::Quantity, "quantity")
        .column_as(order_item::Column::Price, "price")
        .order_by_asc(order_item::Column::Id)
        .into_model::<OrderItemRow>()
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| OrderItemView {
            product_id: row.product_id,
            name: row.name,
            quantity: row.quantity,
            price: row.price,
            total_price: row.price * Decimal::from(row.quantity),
        })
        .collect())
}

fn receipt(order: order::Model, items: Vec<OrderItemView>) -> OrderReceipt {
    OrderReceipt {
        order_number: order.order_number,
        status: order.status,
        is_paid: order.is_paid,
        total_amount: order.total_amount,
        first_name: order.first_name,
        last_name: order.last_name,
        email: order.email,
        phone: order.phone,
        address_line1: order.address_line1,
        address_line2: order.address_line2,
        city: order.city,
        state: order.state,
        postal_code: order.postal_code,
        country: order.country,
        created_at: order.created_at,
        items,
    }
}

//Structs
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ShippingInfo {
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, max = 32, message = "Phone is required"))]
    pub phone: String,
    #[validate(length(min = 1, max = 255, message = "Address is required"))]
    pub address_line1: String,
    pub address_line2: Option<String>,
    #[validate(length(min = 1, max = 100, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, max = 100, message = "State is required"))]
    pub state: String,
    #[validate(length(min = 1, max = 20, message = "Postal code is required"))]
    pub postal_code: String,
    #[validate(length(min = 1, max = 100, message = "Country is required"))]
    pub country: String,
}

#[derive(Debug, Serialize)]
pub struct OrderReceipt {
    pub order_number: String,
    pub status: order::Status,
    pub is_paid: bool,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
}

#[derive(Debug, Serialize)]
pub struct OrderItemView {
    pub product_id: i32,
    pub name: String,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
}

#[derive(Debug, Serialize)]
pub struct OrderSummary {
    pub order_number: String,
    pub status: order::Status,
    pub is_paid: bool,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromQueryResult)]
struct OrderItemRow {
    product_id: i32,
    name: String,
    quantity: i32,
    price: Decimal,
}
