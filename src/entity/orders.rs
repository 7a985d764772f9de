use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Pending orders may be completed or cancelled; both outcomes are
    /// terminal. Re-applying the current status is a no-op.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        *self == next
            || matches!(
                (self, next),
                (OrderStatus::Pending, OrderStatus::Completed)
                    | (OrderStatus::Pending, OrderStatus::Cancelled)
            )
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub order_date: DateTimeWithTimeZone,
    pub shipping_address: String,
    /// `productId:quantity` pairs joined by `,`. See [`crate::line_items`].
    #[sea_orm(column_type = "Text")]
    pub items: String,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::OrderStatus::*;

    #[test]
    fn pending_can_complete_or_cancel() {
        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Cancelled));
    }

    #[test]
    fn terminal_states_do_not_reopen() {
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Completed));
    }

    #[test]
    fn same_status_is_idempotent() {
        for status in [Pending, Completed, Cancelled] {
            assert!(status.can_transition_to(status));
        }
    }
}
