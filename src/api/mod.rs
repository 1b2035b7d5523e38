pub mod admin;
pub mod public;
pub mod user;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    middleware::from_fn,
    Json, Router,
};
use sea_orm::DatabaseConnection;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use validator::Validate;

use crate::errors::StoreError;
use crate::middleware::logging::logging_middleware;

use admin::admin_api_router;
use public::public_api_router;
use user::user_api_router;

pub fn create_api_router(shared_db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .nest("/api", public_api_router(shared_db.clone()))
        .nest("/api", user_api_router(shared_db.clone()))
        .nest("/api/admin", admin_api_router(shared_db))
        .layer(from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Json extractor that runs the payload's `validator` rules after
/// deserialization. Both failure modes reject with the shared error
/// envelope.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = StoreError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| StoreError::Validation(e.body_text()))?;

        value
            .validate()
            .map_err(|e| StoreError::Validation(format_validation_errors(&e)))?;

        Ok(ValidatedJson(value))
    }
}

fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}
