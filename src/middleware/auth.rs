use axum::{extract::FromRequestParts, http::header};
use uuid::Uuid;

use crate::{error::AppError, models::{OrderStatus, Role}, state::AppState};

/// Caller identity decoded from the bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Every protected operation, with the facts its policy depends on.
#[derive(Debug, Clone, Copy)]
pub enum Action {
    CreateProduct,
    ManageProduct { seller_id: Uuid },
    ViewRequesterOrders { requester_id: Uuid },
    ViewSellerOrders { seller_id: Uuid },
    UpdateOrderStatus {
        requester_id: Uuid,
        sells_an_item: bool,
        next: OrderStatus,
    },
    ListUsers,
    CreateUser,
    ViewUser { user_id: Uuid },
    ManageUser { user_id: Uuid },
    ChangeRole,
}

/// Single policy function for all role and ownership checks.
pub fn authorize(user: &AuthUser, action: Action) -> Result<(), AppError> {
    let allowed = match action {
        Action::CreateProduct => user.role.can_sell(),
        Action::ManageProduct { seller_id } => user.is_admin() || user.user_id == seller_id,
        Action::ViewRequesterOrders { requester_id } => user.user_id == requester_id,
        Action::ViewSellerOrders { seller_id } => {
            user.is_admin() || (user.role == Role::Seller && user.user_id == seller_id)
        }
        Action::UpdateOrderStatus {
            requester_id,
            sells_an_item,
            next,
        } => {
            user.is_admin()
                || (user.role == Role::Seller && sells_an_item)
                || (user.user_id == requester_id && next == OrderStatus::Cancelled)
        }
        Action::ListUsers | Action::CreateUser | Action::ChangeRole => user.is_admin(),
        Action::ViewUser { user_id } | Action::ManageUser { user_id } => {
            user.is_admin() || user.user_id == user_id
        }
    };

    if allowed {
        Ok(())
    } else {
        tracing::debug!(user_id = %user.user_id, role = user.role.as_str(), ?action, "access denied");
        Err(AppError::Forbidden(denied_message(action).into()))
    }
}

fn denied_message(action: Action) -> &'static str {
    match action {
        Action::CreateProduct => "Seller or admin access required",
        Action::ManageProduct { .. } => "Only the owning seller or an admin may modify this product",
        Action::ViewRequesterOrders { .. } => "You can only view your own orders",
        Action::ViewSellerOrders { .. } => "You can only view orders for your own products",
        Action::UpdateOrderStatus { .. } => "You are not allowed to change this order",
        Action::ListUsers | Action::CreateUser | Action::ChangeRole => "Admin access required",
        Action::ViewUser { .. } | Action::ManageUser { .. } => "You can only access your own account",
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?;

        let claims = state.tokens.verify(token)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

        Ok(AuthUser {
            user_id,
            email: claims.email,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: Role) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            email: format!("{}@example.com", role.as_str()),
            role,
        }
    }

    #[test]
    fn only_sellers_and_admins_create_products() {
        assert!(authorize(&caller(Role::Seller), Action::CreateProduct).is_ok());
        assert!(authorize(&caller(Role::Admin), Action::CreateProduct).is_ok());
        assert!(matches!(
            authorize(&caller(Role::User), Action::CreateProduct),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn products_are_managed_by_owner_or_admin() {
        let owner = caller(Role::Seller);
        let other = caller(Role::Seller);
        let action = Action::ManageProduct {
            seller_id: owner.user_id,
        };
        assert!(authorize(&owner, action).is_ok());
        assert!(authorize(&other, action).is_err());
        assert!(authorize(&caller(Role::Admin), action).is_ok());
    }

    #[test]
    fn requester_history_is_private_even_for_admins() {
        let me = caller(Role::User);
        assert!(authorize(&me, Action::ViewRequesterOrders { requester_id: me.user_id }).is_ok());
        let someone = Uuid::new_v4();
        assert!(authorize(&me, Action::ViewRequesterOrders { requester_id: someone }).is_err());
        assert!(
            authorize(&caller(Role::Admin), Action::ViewRequesterOrders { requester_id: someone })
                .is_err()
        );
    }

    #[test]
    fn seller_view_needs_seller_role_and_own_id() {
        let seller = caller(Role::Seller);
        let buyer = caller(Role::User);
        assert!(authorize(&seller, Action::ViewSellerOrders { seller_id: seller.user_id }).is_ok());
        assert!(authorize(&seller, Action::ViewSellerOrders { seller_id: Uuid::new_v4() }).is_err());
        assert!(authorize(&buyer, Action::ViewSellerOrders { seller_id: buyer.user_id }).is_err());
        assert!(
            authorize(&caller(Role::Admin), Action::ViewSellerOrders { seller_id: seller.user_id })
                .is_ok()
        );
    }

    #[test]
    fn requester_may_only_cancel_own_order() {
        let buyer = caller(Role::User);
        let cancel = Action::UpdateOrderStatus {
            requester_id: buyer.user_id,
            sells_an_item: false,
            next: OrderStatus::Cancelled,
        };
        let complete = Action::UpdateOrderStatus {
            requester_id: buyer.user_id,
            sells_an_item: false,
            next: OrderStatus::Completed,
        };
        assert!(authorize(&buyer, cancel).is_ok());
        assert!(authorize(&buyer, complete).is_err());
    }

    #[test]
    fn seller_updates_status_only_when_selling_an_item() {
        let seller = caller(Role::Seller);
        let action = |sells_an_item| Action::UpdateOrderStatus {
            requester_id: Uuid::new_v4(),
            sells_an_item,
            next: OrderStatus::Completed,
        };
        assert!(authorize(&seller, action(true)).is_ok());
        assert!(authorize(&seller, action(false)).is_err());
    }

    #[test]
    fn user_accounts_are_self_or_admin() {
        let me = caller(Role::User);
        assert!(authorize(&me, Action::ManageUser { user_id: me.user_id }).is_ok());
        assert!(authorize(&me, Action::ViewUser { user_id: Uuid::new_v4() }).is_err());
        assert!(authorize(&me, Action::ListUsers).is_err());
        assert!(authorize(&me, Action::ChangeRole).is_err());
        assert!(authorize(&caller(Role::Admin), Action::ListUsers).is_ok());
    }
}
