mod common;

use ecocart_api::{
    dto::{
        auth::{LoginRequest, RegisterRequest},
        users::{CreateUserRequest, UpdateUserRequest},
    },
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    error::AppError,
    models::Role,
    services::{auth_service, user_service},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

fn registration(email: &str, password: &str) -> RegisterRequest {
    RegisterRequest {
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        email: email.into(),
        password: password.into(),
        address: Some("1 Analytical Way".into()),
    }
}

#[tokio::test]
async fn register_stores_a_hash_and_hides_it() -> anyhow::Result<()> {
    let state = common::setup_state().await?;

    let resp = auth_service::register_user(&state, registration(" Ada@Example.com ", "s3cret"))
        .await?;
    let body = resp.data.expect("auth response");
    assert_eq!(body.user.email, "ada@example.com");
    assert_eq!(body.user.role, Role::User);

    let json = serde_json::to_value(&body.user)?;
    assert!(json.get("password").is_none());
    assert!(json.get("passwordHash").is_none());

    let stored = Users::find()
        .filter(UserCol::Email.eq("ada@example.com"))
        .one(&state.orm)
        .await?
        .expect("stored user");
    assert_ne!(stored.password_hash, "s3cret");
    assert!(stored.password_hash.starts_with("$argon2"));

    let claims = state.tokens.verify(&body.token)?;
    assert_eq!(claims.sub, stored.id.to_string());
    Ok(())
}

#[tokio::test]
async fn duplicate_and_invalid_registrations_are_rejected() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    auth_service::register_user(&state, registration("ada@example.com", "s3cret")).await?;

    let err = auth_service::register_user(&state, registration("ADA@example.com", "other"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let mut missing = registration("grace@example.com", "s3cret");
    missing.last_name = String::new();
    let err = auth_service::register_user(&state, missing).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = auth_service::register_user(&state, registration("grace.example.com", "s3cret"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(msg) if msg.contains('@')));
    Ok(())
}

#[tokio::test]
async fn login_does_not_reveal_which_part_was_wrong() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    auth_service::register_user(&state, registration("ada@example.com", "s3cret")).await?;

    let login = |email: &str, password: &str| LoginRequest {
        email: email.into(),
        password: password.into(),
    };

    let wrong_password = auth_service::login_user(&state, login("ada@example.com", "nope"))
        .await
        .unwrap_err();
    let unknown_email = auth_service::login_user(&state, login("nobody@example.com", "s3cret"))
        .await
        .unwrap_err();
    assert_eq!(wrong_password.status(), unknown_email.status());
    assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    assert!(matches!(wrong_password, AppError::Unauthorized(_)));

    let err = auth_service::login_user(&state, login("", ""))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let ok = auth_service::login_user(&state, login("ADA@example.com", "s3cret"))
        .await?
        .data
        .expect("auth response");
    let claims = state.tokens.verify(&ok.token)?;
    assert_eq!(claims.email, "ada@example.com");
    assert_eq!(claims.role, Role::User);
    Ok(())
}

#[tokio::test]
async fn user_management_is_admin_or_self() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::create_user(&state, Role::Admin, "admin@example.com").await?;
    let alice = common::create_user(&state, Role::User, "alice@example.com").await?;

    let created = user_service::create_user(
        &state,
        &admin,
        CreateUserRequest {
            first_name: "Sam".into(),
            last_name: "Seller".into(),
            email: "sam@example.com".into(),
            password: "s3cret".into(),
            address: None,
            role: Role::Seller,
        },
    )
    .await?
    .data
    .expect("user");
    assert_eq!(created.role, Role::Seller);

    let err = user_service::list_users(&state, &alice).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    let users = user_service::list_users(&state, &admin)
        .await?
        .data
        .expect("users")
        .items;
    assert_eq!(users.len(), 3);

    let err = user_service::get_user(&state, &alice, created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    let me = user_service::get_user(&state, &alice, alice.user_id)
        .await?
        .data
        .expect("user");
    assert_eq!(me.email, "alice@example.com");

    let promote = UpdateUserRequest {
        role: Some(Role::Admin),
        ..Default::default()
    };
    let err = user_service::update_user(&state, &alice, alice.user_id, promote)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let steal = UpdateUserRequest {
        email: Some("sam@example.com".into()),
        ..Default::default()
    };
    let err = user_service::update_user(&state, &alice, alice.user_id, steal)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let renamed = user_service::update_user(
        &state,
        &alice,
        alice.user_id,
        UpdateUserRequest {
            first_name: Some("Alicia".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("user");
    assert_eq!(renamed.first_name, "Alicia");

    let err = user_service::delete_user(&state, &alice, created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    user_service::delete_user(&state, &admin, created.id).await?;
    let err = user_service::get_user(&state, &admin, created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}

// The email lookup and the insert are separate statements, so a concurrent
// registration can slip between them; the unique index still has to surface
// as a duplicate, not as a database failure.
#[tokio::test]
async fn unique_index_violation_is_reported_as_conflict() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    common::create_user(&state, Role::User, "race@example.com").await?;

    let err = UserActive {
        id: Set(Uuid::new_v4()),
        first_name: Set("Late".into()),
        last_name: Set("Writer".into()),
        email: Set("race@example.com".into()),
        password_hash: Set("dummy".into()),
        address: Set(None),
        role: Set(Role::User),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await
    .unwrap_err();

    let mapped = AppError::on_unique_violation(err, "User already exists");
    assert!(matches!(mapped, AppError::Conflict(ref msg) if msg == "User already exists"));
    assert_eq!(mapped.status(), axum::http::StatusCode::BAD_REQUEST);

    let other = AppError::on_unique_violation(sea_orm::DbErr::RecordNotFound("x".into()), "dup");
    assert!(matches!(other, AppError::OrmError(_)));
    Ok(())
}
