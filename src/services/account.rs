use crate::entities::{profile, user};
use crate::errors::StoreError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};

pub fn hash_password(password: &str) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| StoreError::PasswordHash(err.to_string()))?
        .to_string();
    Ok(hash)
}

/// Creates the user and their profile in one transaction. Either both
/// rows exist afterwards or neither does.
pub async fn register(
    db: &DatabaseConnection,
    username: &str,
    email: &str,
    password: &str,
) -> Result<user::Model, StoreError> {
    let txn = db.begin().await?;

    let password_hash = hash_password(password)?;
    let created = user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        password: Set(password_hash),
        role: Set(user::Role::User),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            StoreError::Conflict("An account with this username or email already exists".to_string())
        }
        _ => err.into(),
    })?;

    create_profile_for_user(&txn, created.id).await?;
    txn.commit().await?;
    Ok(created)
}

/// Every user owns exactly one profile. Runs as part of registration
/// and again from [`get_profile`] for accounts that predate profiles.
pub async fn create_profile_for_user<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
) -> Result<profile::Model, StoreError> {
    let now = Utc::now();
    let created = profile::ActiveModel {
        user_id: Set(user_id),
        first_name: Set(String::new()),
        last_name: Set(String::new()),
        phone: Set(String::new()),
        address_line1: Set(String::new()),
        address_line2: Set(String::new()),
        city: Set(String::new()),
        state: Set(String::new()),
        postal_code: Set(String::new()),
        country: Set(String::new()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(created)
}

pub async fn verify_credentials(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<user::Model, StoreError> {
    let found = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?
        .ok_or(StoreError::InvalidCredentials)?;

    found.check_hash(password)?;
    Ok(found)
}

pub async fn get_profile(db: &DatabaseConnection, user_id: i32) -> Result<ProfileView, StoreError> {
    let txn = db.begin().await?;
    let (account, profile) = load_profile(&txn, user_id).await?;
    txn.commit().await?;
    Ok(view(account, profile))
}

/// Applies the provided fields, leaving absent ones untouched.
pub async fn update_profile(
    db: &DatabaseConnection,
    user_id: i32,
    changes: ProfileChanges,
) -> Result<ProfileView, StoreError> {
    let txn = db.begin().await?;
    let (account, profile) = load_profile(&txn, user_id).await?;

    let mut active: profile::ActiveModel = profile.into();
    if let Some(first_name) = changes.first_name {
        active.first_name = Set(first_name);
    }
    if let Some(last_name) = changes.last_name {
        active.last_name = Set(last_name);
    }
    if let Some(phone) = changes.phone {
        active.phone = Set(phone);
    }
    if let Some(address_line1) = changes.address_line1 {
        active.address_line1 = Set(address_line1);
    }
    if let Some(address_line2) = changes.address_line2 {
        active.address_line2 = Set(address_line2);
    }
    if let Some(city) = changes.city {
        active.city = Set(city);
    }
    if let Some(state) = changes.state {
        active.state = Set(state);
    }
    if let Some(postal_code) = changes.postal_code {
        active.postal_code = Set(postal_code);
    }
    if let Some(country) = changes.country {
        active.country = Set(country);
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(&txn).await?;
    txn.commit().await?;
    Ok(view(account, updated))
}

async fn load_profile<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
) -> Result<(user::Model, profile::Model), StoreError> {
    let account = user::Entity::find_by_id(user_id)
        .one(conn)
        .await?
        .ok_or(StoreError::NotFound)?;

    let profile = match profile::Entity::find()
        .filter(profile::Column::UserId.eq(user_id))
        .one(conn)
        .await?
    {
        Some(existing) => existing,
        None => create_profile_for_user(conn, user_id).await?,
    };

    Ok((account, profile))
}

fn view(account: user::Model, profile: profile::Model) -> ProfileView {
    ProfileView {
        username: account.username,
        email: account.email,
        first_name: profile.first_name,
        last_name: profile.last_name,
        phone: profile.phone,
        address_line1: profile.address_line1,
        address_line2: profile.address_line2,
        city: profile.city,
        state: profile.state,
        postal_code: profile.postal_code,
        country: profile.country,
    }
}

//Structs
#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}
