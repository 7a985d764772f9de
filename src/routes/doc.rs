use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{AuthResponse, LoginRequest, RegisterRequest},
        orders::{CreateOrderRequest, OrderItemRequest, OrderPayload, OrderViewList, UpdateOrderStatusRequest},
        products::{DeletedProduct, ProductList, ProductRequest},
        users::{CreateUserRequest, DeletedUser, UpdateUserRequest, UserList},
    },
    line_items::LineItem,
    models::{Category, Order, OrderStatus, OrderView, OrderViewItem, Product, RecycleMethod, Role, User},
    response::Meta,
    routes::{auth, health, orders, params, products, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        orders::create_order,
        orders::update_order_status,
        orders::requester_orders,
        orders::seller_orders,
        users::list_users,
        users::create_user,
        users::get_user,
        users::update_user,
        users::delete_user,
    ),
    components(
        schemas(
            User,
            Role,
            Product,
            Category,
            RecycleMethod,
            Order,
            OrderStatus,
            OrderView,
            OrderViewItem,
            LineItem,
            Meta,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            ProductRequest,
            ProductList,
            DeletedProduct,
            CreateOrderRequest,
            OrderPayload,
            OrderItemRequest,
            UpdateOrderStatusRequest,
            OrderViewList,
            CreateUserRequest,
            UpdateUserRequest,
            UserList,
            DeletedUser,
            params::ProductQuery,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration and login"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Orders", description = "Order ledger and history"),
        (name = "Users", description = "Account management"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
