use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::{Category, RecycleMethod};

/// Optional catalog filters; all of them combine with AND.
#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Case-sensitive substring of the name or description.
    pub q: Option<String>,
    pub category: Option<Category>,
    #[serde(alias = "recycle_method")]
    pub recycle_method: Option<RecycleMethod>,
    pub seller_id: Option<Uuid>,
}
