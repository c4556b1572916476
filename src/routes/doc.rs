use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{ApiKey, ApiKeyValue, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, RegisterRequest, SessionStatus, UserEnvelope},
        orders::{CartLine, CreateOrderRequest, OrderCreated, OrderList, UpdateOrderStatusRequest},
        products::{CreateProductRequest, DeletedProduct, ProductList, UpdateProductRequest},
    },
    models::{Order, OrderItem, OrderStatus, Product, PublicUser},
    response::{ApiResponse, Empty, ErrorBody},
    routes::{auth, health, orders, products},
    session::SESSION_COOKIE,
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::logout,
        auth::who_am_i,
        products::list_products,
        products::create_product,
        products::get_product,
        products::update_product,
        products::delete_product,
        orders::create_order,
        orders::list_orders,
        orders::update_order_status
    ),
    components(
        schemas(
            Product,
            PublicUser,
            Order,
            OrderItem,
            OrderStatus,
            RegisterRequest,
            LoginRequest,
            UserEnvelope,
            SessionStatus,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            DeletedProduct,
            CartLine,
            CreateOrderRequest,
            OrderCreated,
            OrderList,
            UpdateOrderStatusRequest,
            ErrorBody,
            Empty,
            ApiResponse<UserEnvelope>,
            ApiResponse<OrderCreated>,
            ApiResponse<DeletedProduct>,
            ApiResponse<Empty>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and session endpoints"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Orders", description = "Checkout and order administration"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
