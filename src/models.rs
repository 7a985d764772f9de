use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{orders, products, users};
use crate::line_items::{self, LineItem};

pub use crate::entity::orders::OrderStatus;
pub use crate::entity::products::{Category, RecycleMethod};
pub use crate::entity::users::Role;

/// Outward representation of a user. The password hash never leaves the
/// entity layer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            address: model.address,
            role: model.role,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub image_url: String,
    pub category: Category,
    pub recycle_method: RecycleMethod,
    pub rating: Option<i32>,
    pub seller_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            image_url: model.image_url,
            category: model.category,
            recycle_method: model.recycle_method,
            rating: model.rating,
            seller_id: model.seller_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// A ledger entry as stored, with its line items decoded.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub shipping_address: String,
    pub items: Vec<LineItem>,
    pub updated_at: DateTime<Utc>,
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        let items = line_items::parse_pairs(&model.items)
            .filter_map(Result::ok)
            .collect();
        Self {
            id: model.id,
            user_id: model.user_id,
            status: model.status,
            order_date: model.order_date.with_timezone(&Utc),
            shipping_address: model.shipping_address,
            items,
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

/// One priced line of an assembled order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderViewItem {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub quantity: u32,
    pub line_total: i64,
}

/// An order priced against the current catalog.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Requester email; only filled in seller and admin views.
    pub user_email: Option<String>,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub shipping_address: String,
    pub items: Vec<OrderViewItem>,
    pub total_amount: i64,
    /// Lines dropped because the product no longer exists or the stored
    /// pair could not be read.
    pub omitted_items: usize,
}
