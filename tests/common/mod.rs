#![allow(dead_code)]

use chrono::Utc;
use ecocart_api::{
    db::{create_orm_conn, run_migrations},
    dto::{auth::Claims, products::ProductRequest},
    entity::users::ActiveModel as UserActive,
    middleware::auth::AuthUser,
    models::{Category, RecycleMethod, Role},
    services::{auth_service::TokenKeys, product_service},
    state::AppState,
};
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret";

pub async fn setup_state() -> anyhow::Result<AppState> {
    let orm = create_orm_conn("sqlite::memory:", 1).await?;
    run_migrations(&orm).await?;
    Ok(AppState::new(orm, TokenKeys::new(TEST_SECRET, 24)))
}

/// Insert a user directly, skipping password hashing.
pub async fn create_user(state: &AppState, role: Role, email: &str) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        first_name: Set("Test".into()),
        last_name: Set(role.as_str().into()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        address: Set(None),
        role: Set(role),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        email: user.email,
        role: user.role,
    })
}

pub fn product_request(name: &str, price: i64) -> ProductRequest {
    ProductRequest {
        name: name.to_string(),
        description: format!("{name} for testing"),
        price: Some(price),
        image_url: "/images/test.jpg".into(),
        category: Category::Storage,
        recycle_method: RecycleMethod::Glass,
        rating: Some(4),
    }
}

pub async fn create_product(
    state: &AppState,
    seller: &AuthUser,
    name: &str,
    price: i64,
) -> anyhow::Result<Uuid> {
    let resp = product_service::create_product(state, seller, product_request(name, price)).await?;
    let product = resp.data.expect("created product");
    Ok(product.id)
}

/// Bearer token for a user created with [`create_user`].
pub fn token_for(state: &AppState, user: &AuthUser) -> anyhow::Result<String> {
    let now = Utc::now().timestamp() as usize;
    let token = state.tokens.sign(&Claims {
        sub: user.user_id.to_string(),
        email: user.email.clone(),
        role: user.role,
        iat: now,
        exp: now + 3600,
    })?;
    Ok(token)
}
