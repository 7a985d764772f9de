use std::sync::LazyLock;

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use uuid::Uuid;

use crate::{
    dto::auth::{AuthResponse, Claims, LoginRequest, RegisterRequest},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    models::{Role, User},
    response::{ApiResponse, Meta},
    state::AppState,
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const DUPLICATE_EMAIL: &str = "User already exists";

/// Verified against when the email is unknown, so both login failures cost
/// one argon2 verification.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("ecocart-unknown-account").ok());

/// Signing material for bearer tokens plus their lifetime.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 30;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn issue(&self, user: &UserModel) -> AppResult<String> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp() as usize,
            exp: expiration.timestamp() as usize,
        };
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &Claims) -> AppResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    }

    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| {
                tracing::debug!(error = %err, "token rejected");
                AppError::Unauthorized("Invalid or expired token".into())
            })
    }
}

pub fn hash_password(raw: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(raw.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn password_matches(raw: &str, stored_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(raw.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> AppResult<()> {
    if email.contains('@') {
        Ok(())
    } else {
        Err(AppError::BadRequest("Email must contain '@'".into()))
    }
}

/// Profile fields shared by self-registration and admin account creation.
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub address: Option<String>,
    pub role: Role,
}

impl NewAccount {
    fn validate(&self) -> AppResult<()> {
        let required = [&self.first_name, &self.last_name, &self.email, &self.password];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err(AppError::BadRequest("Missing required fields".into()));
        }
        validate_email(&self.email)
    }
}

/// Validate, hash and insert a new user inside one transaction.
pub async fn create_account<C>(conn: &C, account: NewAccount) -> AppResult<UserModel>
where
    C: ConnectionTrait + TransactionTrait,
{
    account.validate()?;
    let email = normalize_email(&account.email);
    let password_hash = hash_password(&account.password)?;

    let txn = conn.begin().await?;
    let exists = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&txn)
        .await?;
    if exists.is_some() {
        return Err(AppError::Conflict(DUPLICATE_EMAIL.into()));
    }

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        first_name: Set(account.first_name.trim().to_string()),
        last_name: Set(account.last_name.trim().to_string()),
        email: Set(email),
        password_hash: Set(password_hash),
        address: Set(account.address.filter(|a| !a.trim().is_empty())),
        role: Set(account.role),
        created_at: Set(Utc::now().into()),
    }
    .insert(&txn)
    .await
    .map_err(|err| AppError::on_unique_violation(err, DUPLICATE_EMAIL))?;
    txn.commit().await?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "user created");
    Ok(user)
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    let RegisterRequest {
        first_name,
        last_name,
        email,
        password,
        address,
    } = payload;

    let user = create_account(
        &state.orm,
        NewAccount {
            first_name,
            last_name,
            email,
            password,
            address,
            role: Role::User,
        },
    )
    .await?;

    let token = state.tokens.issue(&user)?;
    Ok(ApiResponse::success(
        "User registered successfully",
        AuthResponse {
            token,
            user: User::from(user),
        },
        Some(Meta::empty()),
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    let LoginRequest { email, password } = payload;
    if email.trim().is_empty() || password.is_empty() {
        return Err(AppError::BadRequest("Email and password are required".into()));
    }

    let user = Users::find()
        .filter(UserCol::Email.eq(normalize_email(&email)))
        .one(&state.orm)
        .await?;

    // Unknown email and wrong password must look the same to the caller.
    let user = match user {
        Some(u) if password_matches(&password, &u.password_hash)? => u,
        found => {
            if let (None, Some(dummy)) = (&found, DUMMY_HASH.as_deref()) {
                password_matches(&password, dummy)?;
            }
            tracing::info!("login rejected");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }
    };

    let token = state.tokens.issue(&user)?;
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(ApiResponse::success(
        "Login successful",
        AuthResponse {
            token,
            user: User::from(user),
        },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(role: Role) -> UserModel {
        UserModel {
            id: Uuid::new_v4(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            password_hash: String::new(),
            address: None,
            role,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn issued_token_carries_identity() {
        let keys = TokenKeys::new("test-secret", 24);
        let user = sample_user(Role::Seller);
        let claims = keys.verify(&keys.issue(&user).unwrap()).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.role, Role::Seller);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let keys = TokenKeys::new("test-secret", 24);
        let other = TokenKeys::new("other-secret", 24);
        let token = other.issue(&sample_user(Role::User)).unwrap();
        assert!(matches!(keys.verify(&token), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = TokenKeys::new("test-secret", 24);
        let past = (Utc::now() - Duration::hours(2)).timestamp() as usize;
        let token = keys
            .sign(&Claims {
                sub: Uuid::new_v4().to_string(),
                email: "old@example.com".into(),
                role: Role::User,
                iat: past - 60,
                exp: past,
            })
            .unwrap();
        assert!(matches!(keys.verify(&token), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn malformed_token_is_rejected() {
        let keys = TokenKeys::new("test-secret", 24);
        assert!(keys.verify("not.a.token").is_err());
    }

    #[test]
    fn unknown_account_hash_is_real_and_never_matches() {
        let dummy = DUMMY_HASH.as_deref().expect("dummy hash");
        assert!(dummy.starts_with("$argon2"));
        assert!(!password_matches("ecocart-unknown-account-2", dummy).unwrap());
        assert!(!password_matches("", dummy).unwrap());
    }

    #[test]
    fn password_hash_is_salted_and_verifiable() {
        let first = hash_password("hunter2").unwrap();
        let second = hash_password("hunter2").unwrap();
        assert_ne!(first, "hunter2");
        assert_ne!(first, second);
        assert!(password_matches("hunter2", &first).unwrap());
        assert!(!password_matches("hunter3", &first).unwrap());
    }
}
