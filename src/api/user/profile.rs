use axum::{
    extract::Extension,
    routing::get,
    Json, Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::errors::StoreError;
use crate::middleware::auth::Claims;
use crate::services::account::{self, ProfileChanges, ProfileView};

//ROUTERS
pub fn profile_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/profile", get(get_profile).patch(update_profile))
        .layer(Extension(db))
}

//Routes
async fn get_profile(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ProfileView>, StoreError> {
    let view = account::get_profile(&db, claims.user_id).await?;

    Ok(Json(view))
}

async fn update_profile(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(changes): Json<ProfileChanges>,
) -> Result<Json<ProfileView>, StoreError> {
    let view = account::update_profile(&db, claims.user_id, changes).await?;

    Ok(Json(view))
}
