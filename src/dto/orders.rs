use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{OrderStatus, OrderView};

/// `{ "order": { "shippingAddress": ..., "items": [...] } }`
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub order: OrderPayload,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    #[serde(default)]
    pub shipping_address: String,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
}

/// Cart line as sent by the client. Quantity is signed so a bad value gets a
/// validation message instead of a decode failure.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OrderItemRequest {
    pub id: Uuid,
    pub quantity: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderViewList {
    #[schema(value_type = Vec<OrderView>)]
    pub items: Vec<OrderView>,
}
