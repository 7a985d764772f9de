use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::orders::{CreateOrderRequest, OrderPayload, UpdateOrderStatusRequest},
    entity::{
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    line_items::{self, LineItem},
    middleware::auth::{Action, AuthUser, authorize},
    models::{Order, OrderStatus},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Submit the caller's cart as a new pending order.
pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    let (shipping_address, items) = validate_order(payload.order)?;

    let txn = state.orm.begin().await?;
    ensure_products_exist(&txn, &items).await?;

    let now = Utc::now();
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        status: Set(OrderStatus::Pending),
        order_date: Set(now.into()),
        shipping_address: Set(shipping_address),
        items: Set(line_items::encode(&items)),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        user_id = %user.user_id,
        line_items = items.len(),
        "order created"
    );

    Ok(ApiResponse::success(
        "Order created",
        Order::from(order),
        Some(Meta::empty()),
    ))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let next = payload.status;

    let txn = state.orm.begin().await?;
    let order = Orders::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".into()))?;

    let sells_an_item = user.role.can_sell() && sells_any_item(&txn, user.user_id, &order).await?;
    authorize(
        user,
        Action::UpdateOrderStatus {
            requester_id: order.user_id,
            sells_an_item,
            next,
        },
    )?;

    let current = order.status;
    if !current.can_transition_to(next) {
        return Err(AppError::BadRequest(format!(
            "Cannot change order status from {} to {}",
            current.as_str(),
            next.as_str()
        )));
    }
    if current == next {
        return Ok(ApiResponse::success(
            "Order status unchanged",
            Order::from(order),
            Some(Meta::empty()),
        ));
    }

    let mut active: OrderActive = order.into();
    active.status = Set(next);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        user_id = %user.user_id,
        from = current.as_str(),
        to = next.as_str(),
        "order status updated"
    );

    Ok(ApiResponse::success(
        "Order status updated",
        Order::from(order),
        Some(Meta::empty()),
    ))
}

/// Orders placed by one requester, newest first.
pub async fn list_by_requester<C>(conn: &C, requester_id: Uuid) -> AppResult<Vec<OrderModel>>
where
    C: ConnectionTrait,
{
    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(requester_id))
        .order_by_desc(OrderCol::OrderDate)
        .all(conn)
        .await?;
    Ok(orders)
}

/// Every order in the ledger, newest first.
pub async fn list_all<C>(conn: &C) -> AppResult<Vec<OrderModel>>
where
    C: ConnectionTrait,
{
    let orders = Orders::find()
        .order_by_desc(OrderCol::OrderDate)
        .all(conn)
        .await?;
    Ok(orders)
}

/// The empty-cart check runs before anything else so an empty order is
/// always reported the same way.
fn validate_order(payload: OrderPayload) -> AppResult<(String, Vec<LineItem>)> {
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("Invalid order data: no items in order".into()));
    }

    let items = payload
        .items
        .iter()
        .map(|item| {
            u32::try_from(item.quantity)
                .ok()
                .filter(|q| *q > 0)
                .map(|quantity| LineItem::new(item.id, quantity))
                .ok_or_else(|| {
                    AppError::BadRequest(format!(
                        "Invalid quantity {} for product {}",
                        item.quantity, item.id
                    ))
                })
        })
        .collect::<AppResult<Vec<_>>>()?;

    let shipping_address = payload.shipping_address.trim().to_string();
    if shipping_address.is_empty() {
        return Err(AppError::BadRequest("Missing data: shipping address is missing".into()));
    }

    Ok((shipping_address, items))
}

async fn ensure_products_exist<C>(conn: &C, items: &[LineItem]) -> AppResult<()>
where
    C: ConnectionTrait,
{
    let wanted: HashSet<Uuid> = items.iter().map(|item| item.product_id).collect();
    let found: HashSet<Uuid> = Products::find()
        .filter(ProdCol::Id.is_in(wanted.iter().copied()))
        .all(conn)
        .await?
        .into_iter()
        .map(|product| product.id)
        .collect();

    match items.iter().find(|item| !found.contains(&item.product_id)) {
        Some(item) => Err(AppError::BadRequest(format!(
            "Product {} does not exist",
            item.product_id
        ))),
        None => Ok(()),
    }
}

async fn sells_any_item<C>(conn: &C, seller_id: Uuid, order: &OrderModel) -> AppResult<bool>
where
    C: ConnectionTrait,
{
    let product_ids: Vec<Uuid> = line_items::parse_pairs(&order.items)
        .filter_map(Result::ok)
        .map(|item| item.product_id)
        .collect();
    if product_ids.is_empty() {
        return Ok(false);
    }

    let owned = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .filter(ProdCol::SellerId.eq(seller_id))
        .count(conn)
        .await?;
    Ok(owned > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::orders::OrderItemRequest;

    fn payload(address: &str, items: Vec<(Uuid, i64)>) -> OrderPayload {
        OrderPayload {
            shipping_address: address.into(),
            items: items
                .into_iter()
                .map(|(id, quantity)| OrderItemRequest { id, quantity })
                .collect(),
        }
    }

    #[test]
    fn empty_cart_is_rejected_before_other_checks() {
        let err = validate_order(payload("", vec![])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("no items")));
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let id = Uuid::new_v4();
        assert!(validate_order(payload("1 Main St", vec![(id, 0)])).is_err());
        assert!(validate_order(payload("1 Main St", vec![(id, -3)])).is_err());
    }

    #[test]
    fn blank_address_is_rejected() {
        let err = validate_order(payload("  ", vec![(Uuid::new_v4(), 1)])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("shipping address")));
    }

    #[test]
    fn valid_cart_keeps_item_order() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let (address, items) =
            validate_order(payload(" 1 Main St ", vec![(a, 2), (b, 1)])).unwrap();
        assert_eq!(address, "1 Main St");
        assert_eq!(items, vec![LineItem::new(a, 2), LineItem::new(b, 1)]);
    }
}
