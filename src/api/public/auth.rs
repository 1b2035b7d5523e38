use axum::{extract::Extension, http::StatusCode, routing::post, Json, Router};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use validator::Validate;

use crate::api::ValidatedJson;
use crate::errors::StoreError;
use crate::middleware::auth::generate_token;
use crate::services::account;

//ROUTERS
pub fn auth_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .layer(Extension(db))
}

//Routes
async fn register(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    ValidatedJson(payload): ValidatedJson<RegisterPayload>,
) -> Result<(StatusCode, Json<Value>), StoreError> {
    let user = account::register(&db, &payload.username, &payload.email, &payload.password).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "username": user.username,
        })),
    ))
}

async fn login(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<Value>, StoreError> {
    let user = account::verify_credentials(&db, &payload.username, &payload.password).await?;
    let token = generate_token(user.id, user.role.to_string())
        .map_err(|err| StoreError::Token(err.to_string()))?;

    Ok(Json(json!({ "token": token })))
}

//Structs
#[derive(Debug, Deserialize, Validate)]
struct RegisterPayload {
    #[validate(length(min = 3, max = 32, message = "Username must be 3 to 32 characters"))]
    username: String,
    #[validate(email(message = "A valid email is required"))]
    email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    password: String,
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    username: String,
    password: String,
}
