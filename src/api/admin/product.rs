use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryOrder, Set, SqlErr,
    TransactionTrait,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use validator::Validate;

use crate::api::ValidatedJson;
use crate::entities::{
    category,
    product::{self, Entity as ProductEntity},
};
use crate::errors::StoreError;
use crate::services::catalog::slugify;

//ROUTERS
pub fn admin_product_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/:id", patch(patch_product).delete(delete_product))
        .layer(Extension(db))
}

//Routes
async fn list_products(
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Json<Vec<product::Model>>, StoreError> {
    let products = ProductEntity::find()
        .order_by_asc(product::Column::Id)
        .all(&*db)
        .await?;

    Ok(Json(products))
}

async fn create_product(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    ValidatedJson(payload): ValidatedJson<CreateProductPayload>,
) -> Result<(StatusCode, Json<product::Model>), StoreError> {
    if payload.price < Decimal::ZERO {
        return Err(StoreError::Validation(
            "Price must not be negative".to_string(),
        ));
    }

    let txn = db.begin().await?;

    category::Entity::find_by_id(payload.category_id)
        .one(&txn)
        .await?
        .ok_or(StoreError::NotFound)?;

    let slug = payload.slug.unwrap_or_else(|| slugify(&payload.name));
    let now = Utc::now();
    let created = product::ActiveModel {
        name: Set(payload.name),
        slug: Set(slug),
        description: Set(payload.description.unwrap_or_default()),
        price: Set(payload.price),
        stock: Set(payload.stock),
        category_id: Set(payload.category_id),
        is_active: Set(payload.is_active.unwrap_or(true)),
        is_featured: Set(payload.is_featured.unwrap_or(false)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            StoreError::Conflict("A product with this slug already exists".to_string())
        }
        _ => err.into(),
    })?;

    txn.commit().await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn patch_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<PatchProductPayload>,
) -> Result<Json<product::Model>, StoreError> {
    if let Some(price) = payload.price {
        if price < Decimal::ZERO {
            return Err(StoreError::Validation(
                "Price must not be negative".to_string(),
            ));
        }
    }
    if let Some(stock) = payload.stock {
        if stock < 0 {
            return Err(StoreError::Validation(
                "Stock must not be negative".to_string(),
            ));
        }
    }

    let txn = db.begin().await?;

    let found = ProductEntity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(StoreError::NotFound)?;
    let mut product: product::ActiveModel = found.into();

    if let Some(name) = payload.name {
        product.name = Set(name);
    }
    if let Some(slug) = payload.slug {
        product.slug = Set(slug);
    }
    if let Some(description) = payload.description {
        product.description = Set(description);
    }
    if let Some(price) = payload.price {
        product.price = Set(price);
    }
    if let Some(stock) = payload.stock {
        product.stock = Set(stock);
    }
    if let Some(category_id) = payload.category_id {
        category::Entity::find_by_id(category_id)
            .one(&txn)
            .await?
            .ok_or(StoreError::NotFound)?;
        product.category_id = Set(category_id);
    }
    if let Some(is_active) = payload.is_active {
        product.is_active = Set(is_active);
    }
    if let Some(is_featured) = payload.is_featured {
        product.is_featured = Set(is_featured);
    }
    product.updated_at = Set(Utc::now());

    let updated = product.update(&txn).await.map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            StoreError::Conflict("A product with this slug already exists".to_string())
        }
        _ => err.into(),
    })?;

    txn.commit().await?;
    Ok(Json(updated))
}

async fn delete_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Json<Value>, StoreError> {
    let txn = db.begin().await?;

    let found = ProductEntity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(StoreError::NotFound)?;

    // Products referenced by order items are kept for order history.
    found.delete(&txn).await.map_err(|err| match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => StoreError::Conflict(
            "Product has been ordered and cannot be deleted".to_string(),
        ),
        _ => err.into(),
    })?;

    txn.commit().await?;
    Ok(Json(json!({
        "message": "Product deleted successfully"
    })))
}

//Structs
#[derive(Debug, Deserialize, Validate)]
struct CreateProductPayload {
    #[validate(length(min = 1, max = 255, message = "Name must be 1 to 255 characters"))]
    name: String,
    slug: Option<String>,
    description: Option<String>,
    price: Decimal,
    #[validate(range(min = 0, message = "Stock must not be negative"))]
    stock: i32,
    category_id: i32,
    is_active: Option<bool>,
    is_featured: Option<bool>,
}

#[derive(Deserialize)]
struct PatchProductPayload {
    name: Option<String>,
    slug: Option<String>,
    description: Option<String>,
    price: Option<Decimal>,
    stock: Option<i32>,
    category_id: Option<i32>,
    is_active: Option<bool>,
    is_featured: Option<bool>,
}
