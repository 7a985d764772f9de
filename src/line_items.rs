//! Storage codec for order line items.
//!
//! An order keeps its items in one text column: `productId:quantity` pairs
//! joined by `,`. The comma separates pairs and the colon separates the id
//! from the quantity; both sides of the storage boundary rely on that.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

const PAIR_SEPARATOR: &str = ",";
const FIELD_SEPARATOR: char = ':';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: Uuid,
    pub quantity: u32,
}

impl LineItem {
    pub fn new(product_id: Uuid, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LineItemError {
    #[error("line item `{0}` has no `:` separator")]
    MissingSeparator(String),

    #[error("line item `{0}` has an invalid product id")]
    InvalidProductId(String),

    #[error("line item `{0}` has an invalid quantity")]
    InvalidQuantity(String),
}

pub fn encode(items: &[LineItem]) -> String {
    items
        .iter()
        .map(|item| format!("{}{FIELD_SEPARATOR}{}", item.product_id, item.quantity))
        .collect::<Vec<_>>()
        .join(PAIR_SEPARATOR)
}

/// Parse pair by pair so callers can skip a damaged pair and keep the rest.
pub fn parse_pairs(raw: &str) -> impl Iterator<Item = Result<LineItem, LineItemError>> + '_ {
    raw.split(PAIR_SEPARATOR)
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(parse_pair)
}

pub fn decode(raw: &str) -> Result<Vec<LineItem>, LineItemError> {
    parse_pairs(raw).collect()
}

fn parse_pair(pair: &str) -> Result<LineItem, LineItemError> {
    let (id, quantity) = pair
        .split_once(FIELD_SEPARATOR)
        .ok_or_else(|| LineItemError::MissingSeparator(pair.to_string()))?;

    let product_id = Uuid::parse_str(id.trim())
        .map_err(|_| LineItemError::InvalidProductId(pair.to_string()))?;
    let quantity = quantity
        .trim()
        .parse::<u32>()
        .map_err(|_| LineItemError::InvalidQuantity(pair.to_string()))?;

    Ok(LineItem {
        product_id,
        quantity,
    })
}
