use crate::entities::user::{self, Entity as UserEntity, Role};
use crate::errors::StoreError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::Lazy;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::{str::FromStr, sync::Arc};
use thiserror::Error;
use tracing::warn;

static JWT_SECRET: Lazy<String> = Lazy::new(|| {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| "storefront-insecure-dev-secret".to_string())
});

/// Guards a router subtree. Extracts the bearer token, checks it against
/// the required role and stores the [`Claims`] in the request extensions
/// for the handlers behind it.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StoreError> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => return Err(StoreError::NotAuthenticated),
    };

    let claims = match validate_token(state.db.clone(), token, state.role).await {
        Ok(claims) => claims,
        Err(err) => {
            warn!(error = %err, "rejected token");
            return Err(StoreError::NotAuthenticated);
        }
    };

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i32,
    pub role: String,
    pub exp: usize,
}

#[derive(Clone, Debug)]
pub struct AuthState {
    pub db: Arc<DatabaseConnection>,
    pub role: Role,
}

pub fn generate_token(user_id: i32, role: String) -> Result<String, AuthError> {
    let exp = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or(AuthError::TokenCreation)?
        .timestamp() as usize;

    let claims = Claims { user_id, role, exp };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .map_err(|_| AuthError::TokenCreation)
}

/// Decodes the token and confirms the user still exists with the role
/// the token was issued for.
pub async fn validate_token(
    db: Arc<DatabaseConnection>,
    token: &str,
    req_role: Role,
) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(JWT_SECRET.as_bytes()),
        &validation,
    )
    .map_err(|_| AuthError::InvalidToken)?;

    let claims = token_data.claims;
    let role = Role::from_str(&claims.role).map_err(|_| AuthError::InvalidToken)?;
    if role != req_role {
        return Err(AuthError::WrongRole);
    }

    UserEntity::find_by_id(claims.user_id)
        .filter(user::Column::Role.eq(role))
        .one(&*db)
        .await?
        .ok_or(AuthError::UnknownUser)?;

    Ok(claims)
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Token role does not match the route")]
    WrongRole,
    #[error("No user behind this token")]
    UnknownUser,
    #[error("Failed to create token")]
    TokenCreation,
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}
