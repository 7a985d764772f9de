use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::users::{CreateUserRequest, DeletedUser, UpdateUserRequest, UserList},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    error::{AppError, AppResult},
    middleware::auth::{Action, AuthUser, authorize},
    models::User,
    response::{ApiResponse, Meta},
    services::auth_service::{NewAccount, create_account, normalize_email, validate_email},
    state::AppState,
};

const EMAIL_TAKEN: &str = "Email is already taken";

pub async fn list_users(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<UserList>> {
    authorize(user, Action::ListUsers)?;

    let items: Vec<User> = Users::find()
        .order_by_asc(UserCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Users", UserList { items }, Some(meta)))
}

pub async fn get_user(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<User>> {
    authorize(user, Action::ViewUser { user_id: id })?;

    let found = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(ApiResponse::success("User", User::from(found), None))
}

/// Admin-only account creation; unlike registration the role is chosen.
pub async fn create_user(
    state: &AppState,
    user: &AuthUser,
    payload: CreateUserRequest,
) -> AppResult<ApiResponse<User>> {
    authorize(user, Action::CreateUser)?;

    let created = create_account(
        &state.orm,
        NewAccount {
            first_name: payload.first_name,
            last_name: payload.last_name,
            email: payload.email,
            password: payload.password,
            address: payload.address,
            role: payload.role,
        },
    )
    .await?;

    tracing::info!(admin_id = %user.user_id, user_id = %created.id, "account created by admin");
    Ok(ApiResponse::success(
        "User created",
        User::from(created),
        Some(Meta::empty()),
    ))
}

pub async fn update_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    authorize(user, Action::ManageUser { user_id: id })?;
    if payload.role.is_some() {
        authorize(user, Action::ChangeRole)?;
    }

    let txn = state.orm.begin().await?;
    let existing = Users::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let mut active: UserActive = existing.clone().into();
    if let Some(first_name) = payload.first_name {
        active.first_name = Set(required(first_name, "First name")?);
    }
    if let Some(last_name) = payload.last_name {
        active.last_name = Set(required(last_name, "Last name")?);
    }
    if let Some(email) = payload.email {
        let email = normalize_email(&email);
        validate_email(&email)?;
        if email != existing.email {
            let taken = Users::find()
                .filter(UserCol::Email.eq(email.as_str()))
                .one(&txn)
                .await?;
            if taken.is_some() {
                return Err(AppError::Conflict(EMAIL_TAKEN.into()));
            }
        }
        active.email = Set(email);
    }
    if let Some(address) = payload.address {
        let address = address.trim().to_string();
        active.address = Set((!address.is_empty()).then_some(address));
    }
    if let Some(role) = payload.role {
        active.role = Set(role);
    }

    let updated = if active.is_changed() {
        active
            .update(&txn)
            .await
            .map_err(|err| AppError::on_unique_violation(err, EMAIL_TAKEN))?
    } else {
        existing
    };
    txn.commit().await?;

    tracing::info!(user_id = %updated.id, by = %user.user_id, "user updated");
    Ok(ApiResponse::success(
        "User updated",
        User::from(updated),
        Some(Meta::empty()),
    ))
}

/// Products and orders of the deleted user are kept.
pub async fn delete_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<DeletedUser>> {
    authorize(user, Action::ManageUser { user_id: id })?;

    let result = Users::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("User not found".into()));
    }

    tracing::info!(user_id = %id, by = %user.user_id, "user deleted");
    Ok(ApiResponse::success(
        "User deleted successfully",
        DeletedUser { deleted_user_id: id },
        Some(Meta::empty()),
    ))
}

fn required(value: String, field: &str) -> AppResult<String> {
    let value = value.trim().to_string();
    if value.is_empty() {
        Err(AppError::BadRequest(format!("{field} must not be empty")))
    } else {
        Ok(value)
    }
}
