//! Builds priced, caller-specific views of ledger entries.
//!
//! Prices come from the live catalog, not from the time of purchase. Lines
//! whose product has been deleted, or whose stored pair cannot be read, are
//! dropped from the items and from the total. Only the unfiltered view
//! counts them in `omitted_items`; a filtered view cannot tell whose lines
//! they were.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    dto::orders::OrderViewList,
    entity::{
        orders::Model as OrderModel,
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    line_items,
    middleware::auth::{Action, AuthUser, authorize},
    models::{OrderView, OrderViewItem},
    response::{ApiResponse, Meta},
    services::order_service,
    state::AppState,
};

/// Which line items of an order the caller may see.
#[derive(Debug, Clone, Copy)]
pub enum Visibility {
    All,
    SoldBy(Uuid),
}

impl Visibility {
    fn shows(&self, product: &ProductModel) -> bool {
        match self {
            Visibility::All => true,
            Visibility::SoldBy(seller_id) => product.seller_id == *seller_id,
        }
    }
}

/// Order history of one requester, visible only to that requester.
pub async fn requester_orders(
    state: &AppState,
    user: &AuthUser,
    requester_id: Uuid,
) -> AppResult<ApiResponse<OrderViewList>> {
    authorize(user, Action::ViewRequesterOrders { requester_id })?;

    let orders = order_service::list_by_requester(&state.orm, requester_id).await?;
    if orders.is_empty() {
        return Err(AppError::NotFound("No orders found".into()));
    }

    let catalog = load_products(&state.orm, &orders).await?;
    let items: Vec<OrderView> = orders
        .iter()
        .map(|order| assemble(order, &catalog, Visibility::All))
        .collect();

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Orders", OrderViewList { items }, Some(meta)))
}

/// Orders containing the seller's products, trimmed to those products.
/// Admins see every line of every order. In both cases an order with no
/// surviving line is left out.
pub async fn seller_orders(
    state: &AppState,
    user: &AuthUser,
    seller_id: Uuid,
) -> AppResult<ApiResponse<OrderViewList>> {
    authorize(user, Action::ViewSellerOrders { seller_id })?;

    let visibility = if user.is_admin() {
        Visibility::All
    } else {
        Visibility::SoldBy(seller_id)
    };

    let orders = order_service::list_all(&state.orm).await?;
    let catalog = load_products(&state.orm, &orders).await?;
    let mut views: Vec<OrderView> = orders
        .iter()
        .map(|order| assemble(order, &catalog, visibility))
        .filter(|view| !view.items.is_empty())
        .collect();

    let requester_ids: HashSet<Uuid> = views.iter().map(|view| view.user_id).collect();
    let emails: HashMap<Uuid, String> = if requester_ids.is_empty() {
        HashMap::new()
    } else {
        Users::find()
            .filter(UserCol::Id.is_in(requester_ids))
            .all(&state.orm)
            .await?
            .into_iter()
            .map(|user| (user.id, user.email))
            .collect()
    };
    for view in &mut views {
        view.user_email = emails.get(&view.user_id).cloned();
    }

    let meta = Meta::total(views.len());
    Ok(ApiResponse::success(
        "Orders",
        OrderViewList { items: views },
        Some(meta),
    ))
}

/// Price one order against the catalog.
///
/// Under [`Visibility::SoldBy`] ownership of a missing or unreadable line
/// cannot be established, so it is treated like another seller's line:
/// hidden and not counted.
pub fn assemble(
    order: &OrderModel,
    catalog: &HashMap<Uuid, ProductModel>,
    visibility: Visibility,
) -> OrderView {
    let counts_omissions = matches!(visibility, Visibility::All);
    let mut items = Vec::new();
    let mut omitted_items: usize = 0;
    let mut total_amount: i64 = 0;

    for parsed in line_items::parse_pairs(&order.items) {
        let line = match parsed {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(order_id = %order.id, error = %err, "unreadable line item skipped");
                omitted_items += usize::from(counts_omissions);
                continue;
            }
        };

        let Some(product) = catalog.get(&line.product_id) else {
            tracing::warn!(
                order_id = %order.id,
                product_id = %line.product_id,
                "line item references a missing product"
            );
            omitted_items += usize::from(counts_omissions);
            continue;
        };

        if !visibility.shows(product) {
            continue;
        }

        let line_total = product.price.saturating_mul(i64::from(line.quantity));
        total_amount = total_amount.saturating_add(line_total);
        items.push(OrderViewItem {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            quantity: line.quantity,
            line_total,
        });
    }

    OrderView {
        id: order.id,
        user_id: order.user_id,
        user_email: None,
        status: order.status,
        order_date: order.order_date.with_timezone(&Utc),
        shipping_address: order.shipping_address.clone(),
        items,
        total_amount,
        omitted_items,
    }
}

/// One catalog query for every product referenced by `orders`.
async fn load_products<C>(conn: &C, orders: &[OrderModel]) -> AppResult<HashMap<Uuid, ProductModel>>
where
    C: ConnectionTrait,
{
    let ids: HashSet<Uuid> = orders
        .iter()
        .flat_map(|order| line_items::parse_pairs(&order.items))
        .filter_map(Result::ok)
        .map(|line| line.product_id)
        .collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let products = Products::find()
        .filter(ProdCol::Id.is_in(ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();
    Ok(products)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_items::LineItem;
    use crate::models::{Category, OrderStatus, RecycleMethod};

    fn product(price: i64, seller_id: Uuid) -> ProductModel {
        ProductModel {
            id: Uuid::new_v4(),
            name: format!("product-{price}"),
            description: "test".into(),
            price,
            image_url: "/img.png".into(),
            category: Category::Storage,
            recycle_method: RecycleMethod::Glass,
            rating: None,
            seller_id,
            created_at: Utc::now().into(),
        }
    }

    fn order(items: &str) -> OrderModel {
        OrderModel {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            status: OrderStatus::Pending,
            order_date: Utc::now().into(),
            shipping_address: "1 Main St".into(),
            items: items.into(),
            updated_at: Utc::now().into(),
        }
    }

    fn catalog(products: &[&ProductModel]) -> HashMap<Uuid, ProductModel> {
        products.iter().map(|p| (p.id, (*p).clone())).collect()
    }

    #[test]
    fn totals_quantity_times_price() {
        let seller = Uuid::new_v4();
        let (a, b) = (product(1000, seller), product(500, seller));
        let raw = line_items::encode(&[LineItem::new(a.id, 2), LineItem::new(b.id, 1)]);

        let view = assemble(&order(&raw), &catalog(&[&a, &b]), Visibility::All);
        assert_eq!(view.total_amount, 2500);
        assert_eq!(view.items.len(), 2);
        assert_eq!(view.items[0].line_total, 2000);
        assert_eq!(view.omitted_items, 0);
    }

    #[test]
    fn missing_product_is_omitted_and_counted() {
        let seller = Uuid::new_v4();
        let (a, b) = (product(1000, seller), product(500, seller));
        let raw = line_items::encode(&[LineItem::new(a.id, 2), LineItem::new(b.id, 1)]);

        let view = assemble(&order(&raw), &catalog(&[&a]), Visibility::All);
        assert_eq!(view.total_amount, 2000);
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.omitted_items, 1);
    }

    #[test]
    fn seller_sees_only_own_lines() {
        let (mine, theirs) = (Uuid::new_v4(), Uuid::new_v4());
        let (a, b) = (product(1000, mine), product(500, theirs));
        let raw = line_items::encode(&[LineItem::new(a.id, 1), LineItem::new(b.id, 3)]);

        let view = assemble(&order(&raw), &catalog(&[&a, &b]), Visibility::SoldBy(mine));
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].id, a.id);
        assert_eq!(view.total_amount, 1000);
    }

    #[test]
    fn foreign_lines_leave_an_empty_seller_view() {
        let theirs = Uuid::new_v4();
        let b = product(500, theirs);
        let raw = line_items::encode(&[LineItem::new(b.id, 1)]);

        let view = assemble(&order(&raw), &catalog(&[&b]), Visibility::SoldBy(Uuid::new_v4()));
        assert!(view.items.is_empty());
        assert_eq!(view.total_amount, 0);
    }

    #[test]
    fn seller_view_does_not_count_lines_it_cannot_attribute() {
        let mine = Uuid::new_v4();
        let a = product(1000, mine);
        let gone = Uuid::new_v4();
        let raw = format!(
            "{},garbage",
            line_items::encode(&[LineItem::new(a.id, 1), LineItem::new(gone, 4)])
        );

        let seller = assemble(&order(&raw), &catalog(&[&a]), Visibility::SoldBy(mine));
        assert_eq!(seller.items.len(), 1);
        assert_eq!(seller.omitted_items, 0);

        let requester = assemble(&order(&raw), &catalog(&[&a]), Visibility::All);
        assert_eq!(requester.omitted_items, 2);
    }

    #[test]
    fn damaged_pair_does_not_hide_the_rest() {
        let a = product(300, Uuid::new_v4());
        let raw = format!("garbage,{}:2", a.id);

        let view = assemble(&order(&raw), &catalog(&[&a]), Visibility::All);
        assert_eq!(view.total_amount, 600);
        assert_eq!(view.omitted_items, 1);
    }
}
