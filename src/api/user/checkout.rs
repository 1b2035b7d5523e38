use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::api::ValidatedJson;
use crate::errors::StoreError;
use crate::middleware::auth::Claims;
use crate::services::checkout::{self, OrderReceipt, OrderSummary, ShippingInfo};

//ROUTERS
pub fn checkout_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/checkout", post(place_order))
        .route("/orders", get(list_orders))
        .route("/orders/:order_number", get(get_order))
        .layer(Extension(db))
}

//Routes
async fn place_order(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    ValidatedJson(payload): ValidatedJson<ShippingInfo>,
) -> Result<(StatusCode, Json<OrderReceipt>), StoreError> {
    let receipt = checkout::place_order(&db, claims.user_id, payload).await?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

async fn list_orders(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<OrderSummary>>, StoreError> {
    let orders = checkout::list_orders(&db, claims.user_id).await?;

    Ok(Json(orders))
}

async fn get_order(
    Path(order_number): Path<String>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<OrderReceipt>, StoreError> {
    let receipt = checkout::get_order(&db, claims.user_id, &order_number).await?;

    Ok(Json(receipt))
}
