use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::products::{DeletedProduct, ProductList, ProductRequest},
    entity::products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    error::{AppError, AppResult},
    middleware::auth::{Action, AuthUser, authorize},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::ProductQuery,
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        condition = condition.add(
            Condition::any()
                .add(Column::Name.contains(search))
                .add(Column::Description.contains(search)),
        );
    }
    if let Some(category) = query.category {
        condition = condition.add(Column::Category.eq(category));
    }
    if let Some(recycle_method) = query.recycle_method {
        condition = condition.add(Column::RecycleMethod.eq(recycle_method));
    }
    if let Some(seller_id) = query.seller_id {
        condition = condition.add(Column::SellerId.eq(seller_id));
    }

    let items: Vec<Product> = Products::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = find_product(&state.orm, id).await?;
    Ok(ApiResponse::success("Product", Product::from(product), None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: ProductRequest,
) -> AppResult<ApiResponse<Product>> {
    authorize(user, Action::CreateProduct)?;
    let fields = ValidProduct::try_from(payload)?;

    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(fields.name),
        description: Set(fields.description),
        price: Set(fields.price),
        image_url: Set(fields.image_url),
        category: Set(fields.request.category),
        recycle_method: Set(fields.request.recycle_method),
        rating: Set(fields.request.rating),
        seller_id: Set(user.user_id),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(product_id = %product.id, seller_id = %product.seller_id, "product created");

    Ok(ApiResponse::success(
        "Product created",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let txn = state.orm.begin().await?;
    let existing = find_product(&txn, id).await?;
    authorize(
        user,
        Action::ManageProduct {
            seller_id: existing.seller_id,
        },
    )?;
    let fields = ValidProduct::try_from(payload)?;

    let mut active: ActiveModel = existing.into();
    active.name = Set(fields.name);
    active.description = Set(fields.description);
    active.price = Set(fields.price);
    active.image_url = Set(fields.image_url);
    active.category = Set(fields.request.category);
    active.recycle_method = Set(fields.request.recycle_method);
    active.rating = Set(fields.request.rating);
    let product = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(product_id = %product.id, user_id = %user.user_id, "product updated");

    Ok(ApiResponse::success(
        "Product updated successfully",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

/// Orders referencing the product are left untouched.
pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<DeletedProduct>> {
    let txn = state.orm.begin().await?;
    let existing = find_product(&txn, id).await?;
    authorize(
        user,
        Action::ManageProduct {
            seller_id: existing.seller_id,
        },
    )?;

    let result = Products::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Product not found".into()));
    }
    txn.commit().await?;

    tracing::info!(product_id = %id, user_id = %user.user_id, "product deleted");

    Ok(ApiResponse::success(
        "Product deleted successfully",
        DeletedProduct {
            deleted_product_id: id,
        },
        Some(Meta::empty()),
    ))
}

async fn find_product<C>(conn: &C, id: Uuid) -> AppResult<ProductModel>
where
    C: sea_orm::ConnectionTrait,
{
    Products::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".into()))
}

/// A product payload that passed validation, with its text fields trimmed.
struct ValidProduct {
    name: String,
    description: String,
    image_url: String,
    price: i64,
    request: ProductRequest,
}

impl TryFrom<ProductRequest> for ValidProduct {
    type Error = AppError;

    fn try_from(request: ProductRequest) -> AppResult<Self> {
        let name = request.name.trim().to_string();
        let description = request.description.trim().to_string();
        let image_url = request.image_url.trim().to_string();

        let price = match request.price {
            Some(price) if !name.is_empty() && !description.is_empty() && !image_url.is_empty() => {
                price
            }
            _ => return Err(AppError::BadRequest("Missing required fields".into())),
        };
        if price < 0 {
            return Err(AppError::BadRequest("Price must not be negative".into()));
        }
        if request.rating.is_some_and(|rating| !(1..=5).contains(&rating)) {
            return Err(AppError::BadRequest("Rating must be between 1 and 5".into()));
        }

        Ok(Self {
            name,
            description,
            image_url,
            price,
            request,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, RecycleMethod};

    fn request() -> ProductRequest {
        ProductRequest {
            name: " Bamboo Brush ".into(),
            description: "Compostable toothbrush".into(),
            price: Some(450),
            image_url: "/img/brush.png".into(),
            category: Category::Consumables,
            recycle_method: RecycleMethod::Compostable,
            rating: Some(4),
        }
    }

    #[test]
    fn accepts_complete_payload_and_trims() {
        let valid = ValidProduct::try_from(request()).unwrap();
        assert_eq!(valid.name, "Bamboo Brush");
        assert_eq!(valid.price, 450);
    }

    #[test]
    fn rejects_missing_fields() {
        let mut missing_price = request();
        missing_price.price = None;
        assert!(matches!(ValidProduct::try_from(missing_price), Err(AppError::BadRequest(_))));

        let mut blank_name = request();
        blank_name.name = "   ".into();
        assert!(matches!(ValidProduct::try_from(blank_name), Err(AppError::BadRequest(_))));

        let mut no_image = request();
        no_image.image_url = String::new();
        assert!(ValidProduct::try_from(no_image).is_err());
    }

    #[test]
    fn rejects_negative_price_and_out_of_range_rating() {
        let mut negative = request();
        negative.price = Some(-1);
        assert!(ValidProduct::try_from(negative).is_err());

        for rating in [0, 6] {
            let mut bad = request();
            bad.rating = Some(rating);
            assert!(ValidProduct::try_from(bad).is_err());
        }
    }

    #[test]
    fn zero_price_is_allowed() {
        let mut free = request();
        free.price = Some(0);
        assert!(ValidProduct::try_from(free).is_ok());
    }
}
