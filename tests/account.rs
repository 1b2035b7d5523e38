mod common;

use chrono::Utc;
use common::{test_db, user_fixture, TEST_PASSWORD};
use rust_storefront::entities::{profile, user};
use rust_storefront::errors::StoreError;
use rust_storefront::services::account::{self, ProfileChanges};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

#[tokio::test]
async fn registration_creates_the_user_and_their_profile() {
    let db = test_db().await;

    let created = account::register(&db, "newcomer", "newcomer@example.com", TEST_PASSWORD)
        .await
        .expect("Registration failed");

    assert_eq!(created.username, "newcomer");
    assert_eq!(created.role, user::Role::User);
    assert!(created.password.starts_with("$argon2"), "password is hashed");

    let profile = profile::Entity::find()
        .filter(profile::Column::UserId.eq(created.id))
        .one(&db)
        .await
        .expect("Failed to query profile")
        .expect("Profile row missing");
    assert_eq!(profile.first_name, "");
}

#[tokio::test]
async fn duplicate_usernames_and_emails_are_conflicts() {
    let db = test_db().await;
    user_fixture(&db, "taken").await;

    let err = account::register(&db, "taken", "other@example.com", TEST_PASSWORD)
        .await
        .expect_err("Duplicate username should fail");
    assert!(matches!(err, StoreError::Conflict(_)));

    let err = account::register(&db, "someone-else", "taken@example.com", TEST_PASSWORD)
        .await
        .expect_err("Duplicate email should fail");
    assert!(matches!(err, StoreError::Conflict(_)));

    // The failed attempts left no extra rows behind.
    let users = user::Entity::find().all(&db).await.expect("Failed to list users");
    assert_eq!(users.len(), 1);
}

#[tokio::test]
async fn login_accepts_the_right_password_only() {
    let db = test_db().await;
    let registered = user_fixture(&db, "verified").await;

    let found = account::verify_credentials(&db, "verified", TEST_PASSWORD)
        .await
        .expect("Correct credentials rejected");
    assert_eq!(found.id, registered.id);

    let err = account::verify_credentials(&db, "verified", "wrong-password")
        .await
        .expect_err("Wrong password should fail");
    assert!(matches!(err, StoreError::InvalidCredentials));

    let err = account::verify_credentials(&db, "nobody", TEST_PASSWORD)
        .await
        .expect_err("Unknown username should fail");
    assert!(matches!(err, StoreError::InvalidCredentials));
}

#[tokio::test]
async fn profiles_appear_on_first_read_for_old_accounts() {
    let db = test_db().await;

    // An account written before profiles existed: user row only.
    let old_timer = user::ActiveModel {
        username: Set("old-timer".to_string()),
        email: Set("old-timer@example.com".to_string()),
        password: Set(account::hash_password(TEST_PASSWORD).expect("Failed to hash")),
        role: Set(user::Role::User),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&db)
    .await
    .expect("Failed to insert user");

    let view = account::get_profile(&db, old_timer.id)
        .await
        .expect("Failed to read profile");
    assert_eq!(view.username, "old-timer");
    assert_eq!(view.first_name, "");

    let profile = profile::Entity::find()
        .filter(profile::Column::UserId.eq(old_timer.id))
        .one(&db)
        .await
        .expect("Failed to query profile");
    assert!(profile.is_some(), "profile row created on first read");
}

#[tokio::test]
async fn profile_updates_are_partial() {
    let db = test_db().await;
    let user = user_fixture(&db, "mover").await;

    let view = account::update_profile(
        &db,
        user.id,
        ProfileChanges {
            first_name: Some("Alex".to_string()),
            city: Some("Lisbon".to_string()),
            ..Default::default()
        },
    )
    .await
    .expect("Failed to update profile");
    assert_eq!(view.first_name, "Alex");
    assert_eq!(view.city, "Lisbon");

    // A later partial update leaves earlier fields alone.
    let view = account::update_profile(
        &db,
        user.id,
        ProfileChanges {
            phone: Some("+351 555 0100".to_string()),
            ..Default::default()
        },
    )
    .await
    .expect("Failed to update profile");
    assert_eq!(view.phone, "+351 555 0100");
    assert_eq!(view.first_name, "Alex");
    assert_eq!(view.city, "Lisbon");

    let err = account::update_profile(&db, user.id + 100, ProfileChanges::default())
        .await
        .expect_err("Unknown user should fail");
    assert!(matches!(err, StoreError::NotFound));
}
