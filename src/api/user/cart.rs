use axum::{
    extract::{Extension, Path},
    routing::{get, patch},
    Json, Router,
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::api::ValidatedJson;
use crate::errors::StoreError;
use crate::middleware::auth::Claims;
use crate::services::cart::{self, CartTotals, CartView, ItemChange};

//ROUTERS
pub fn cart_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/cart", get(get_cart).post(add_item))
        .route("/cart/items/:id", patch(update_item).delete(remove_item))
        .layer(Extension(db))
}

//Routes
async fn get_cart(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<CartView>, StoreError> {
    let view = cart::get_cart(&db, claims.user_id).await?;

    Ok(Json(view))
}

async fn add_item(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    ValidatedJson(payload): ValidatedJson<AddItemPayload>,
) -> Result<Json<CartMutationResponse>, StoreError> {
    let totals = cart::add_item(&db, claims.user_id, payload.product_id, payload.quantity).await?;

    Ok(Json(CartMutationResponse::new("Added to cart", totals)))
}

async fn update_item(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    ValidatedJson(payload): ValidatedJson<UpdateItemPayload>,
) -> Result<Json<UpdateItemResponse>, StoreError> {
    let change = cart::update_item(&db, claims.user_id, id, payload.quantity).await?;

    Ok(Json(UpdateItemResponse::new(change)))
}

async fn remove_item(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<CartMutationResponse>, StoreError> {
    let totals = cart::remove_item(&db, claims.user_id, id).await?;

    Ok(Json(CartMutationResponse::new(
        "Item removed from cart",
        totals,
    )))
}

//Structs
#[derive(Debug, Deserialize, Validate)]
struct AddItemPayload {
    product_id: i32,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
struct UpdateItemPayload {
    quantity: i32,
}

#[derive(Serialize)]
struct CartMutationResponse {
    success: bool,
    message: String,
    cart_items_count: i64,
    #[serde(with = "rust_decimal::serde::float")]
    cart_total: Decimal,
}

impl CartMutationResponse {
    fn new(message: &str, totals: CartTotals) -> CartMutationResponse {
        CartMutationResponse {
            success: true,
            message: message.to_string(),
            cart_items_count: totals.total_items,
            cart_total: totals.total_price,
        }
    }
}

#[derive(Serialize)]
struct UpdateItemResponse {
    success: bool,
    message: String,
    cart_items_count: i64,
    #[serde(with = "rust_decimal::serde::float")]
    cart_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    item_total: Decimal,
}

impl UpdateItemResponse {
    fn new(change: ItemChange) -> UpdateItemResponse {
        let message = if change.removed {
            "Item removed from cart"
        } else {
            "Cart updated"
        };
        UpdateItemResponse {
            success: true,
            message: message.to_string(),
            cart_items_count: change.totals.total_items,
            cart_total: change.totals.total_price,
            item_total: change.item_total,
        }
    }
}
