use axum::{
    extract::{Extension, Path, Query},
    routing::get,
    Json, Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::entities::category;
use crate::errors::StoreError;
use crate::services::catalog::{self, ProductListQuery, ProductPage};

pub fn category_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/categories", get(get_categories))
        .route("/categories/:slug/products", get(get_category_products))
        .layer(Extension(db))
}

async fn get_categories(
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Json<Vec<category::Model>>, StoreError> {
    let categories = catalog::list_categories(&db).await?;

    Ok(Json(categories))
}

async fn get_category_products(
    Path(slug): Path<String>,
    Query(params): Query<ProductListQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Json<ProductPage>, StoreError> {
    let page = catalog::category_products(&db, &slug, &params).await?;

    Ok(Json(page))
}
