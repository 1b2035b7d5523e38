use axum::{
    extract::{Extension, Path, Query},
    routing::{get, patch},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::entities::order::{self, Entity as OrderEntity, Status};
use crate::errors::StoreError;

//ROUTERS
pub fn admin_order_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/:id", patch(patch_order))
        .layer(Extension(db))
}

//Routes
async fn list_orders(
    Query(params): Query<ListOrdersQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Json<Vec<order::Model>>, StoreError> {
    let mut query = OrderEntity::find().order_by_desc(order::Column::CreatedAt);

    if let Some(status) = params.status {
        query = query.filter(order::Column::Status.eq(status));
    }

    let orders = query.all(&*db).await?;

    Ok(Json(orders))
}

async fn patch_order(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<PatchOrderPayload>,
) -> Result<Json<order::Model>, StoreError> {
    let txn = db.begin().await?;

    let found = OrderEntity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(StoreError::NotFound)?;
    let mut order: order::ActiveModel = found.into();

    if let Some(status) = payload.status {
        order.status = Set(status);
    }
    if let Some(is_paid) = payload.is_paid {
        order.is_paid = Set(is_paid);
    }
    order.updated_at = Set(Utc::now());

    let updated = order.update(&txn).await?;

    txn.commit().await?;
    Ok(Json(updated))
}

//Structs
#[derive(Deserialize)]
struct ListOrdersQuery {
    status: Option<Status>,
}

#[derive(Deserialize)]
struct PatchOrderPayload {
    status: Option<Status>,
    is_paid: Option<bool>,
}
