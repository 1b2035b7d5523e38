use axum::{
    extract::{Extension, Path, Query},
    routing::get,
    Json, Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::errors::StoreError;
use crate::services::catalog::{self, ProductDetail, ProductListQuery, ProductPage};

pub fn product_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/products", get(get_products))
        .route("/products/:slug", get(get_product))
        .layer(Extension(db))
}

async fn get_products(
    Query(params): Query<ProductListQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Json<ProductPage>, StoreError> {
    let page = catalog::list_products(&db, &params).await?;

    Ok(Json(page))
}

async fn get_product(
    Path(slug): Path<String>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Json<ProductDetail>, StoreError> {
    let detail = catalog::get_product(&db, &slug).await?;

    Ok(Json(detail))
}
