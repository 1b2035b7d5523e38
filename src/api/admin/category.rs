use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryOrder, Set, SqlErr,
    TransactionTrait,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use validator::Validate;

use crate::api::ValidatedJson;
use crate::entities::category::{self, Entity as CategoryEntity};
use crate::errors::StoreError;
use crate::services::catalog::slugify;

//ROUTERS
pub fn admin_category_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/:id",
            patch(patch_category).delete(delete_category),
        )
        .layer(Extension(db))
}

//Routes
async fn list_categories(
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Json<Vec<category::Model>>, StoreError> {
    let categories = CategoryEntity::find()
        .order_by_asc(category::Column::Id)
        .all(&*db)
        .await?;

    Ok(Json(categories))
}

async fn create_category(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    ValidatedJson(payload): ValidatedJson<CreateCategoryPayload>,
) -> Result<(StatusCode, Json<category::Model>), StoreError> {
    let slug = payload.slug.unwrap_or_else(|| slugify(&payload.name));
    let now = Utc::now();
    let created = category::ActiveModel {
        name: Set(payload.name),
        slug: Set(slug),
        description: Set(payload.description.unwrap_or_default()),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&*db)
    .await
    .map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            StoreError::Conflict("A category with this name or slug already exists".to_string())
        }
        _ => err.into(),
    })?;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn patch_category(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<PatchCategoryPayload>,
) -> Result<Json<category::Model>, StoreError> {
    let txn = db.begin().await?;

    let found = CategoryEntity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(StoreError::NotFound)?;
    let mut category: category::ActiveModel = found.into();

    if let Some(name) = payload.name {
        category.name = Set(name);
    }
    if let Some(slug) = payload.slug {
        category.slug = Set(slug);
    }
    if let Some(description) = payload.description {
        category.description = Set(description);
    }
    if let Some(is_active) = payload.is_active {
        category.is_active = Set(is_active);
    }
    category.updated_at = Set(Utc::now());

    let updated = category
        .update(&txn)
        .await
        .map_err(|err| match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                StoreError::Conflict("A category with this name or slug already exists".to_string())
            }
            _ => err.into(),
        })?;

    txn.commit().await?;
    Ok(Json(updated))
}

async fn delete_category(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Json<Value>, StoreError> {
    let txn = db.begin().await?;

    let found = CategoryEntity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(StoreError::NotFound)?;

    // Cascades to the category's products; order history keeps its own rows.
    found.delete(&txn).await.map_err(|err| match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => StoreError::Conflict(
            "Category still has products that cannot be deleted".to_string(),
        ),
        _ => err.into(),
    })?;

    txn.commit().await?;
    Ok(Json(json!({
        "message": "Category deleted successfully"
    })))
}

//Structs
#[derive(Debug, Deserialize, Validate)]
struct CreateCategoryPayload {
    #[validate(length(min = 1, max = 255, message = "Name must be 1 to 255 characters"))]
    name: String,
    slug: Option<String>,
    description: Option<String>,
    is_active: Option<bool>,
}

#[derive(Deserialize)]
struct PatchCategoryPayload {
    name: Option<String>,
    slug: Option<String>,
    description: Option<String>,
    is_active: Option<bool>,
}
