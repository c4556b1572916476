use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::orders::{CreateOrderRequest, OrderCreated, OrderList, UpdateOrderStatusRequest},
    error::AppResult,
    extract::{JsonBody, Path},
    middleware::auth::{AdminUser, AuthUser, require_admin, require_session},
    response::{ApiResponse, Empty, ErrorBody},
    services::order_service,
    state::AppState,
};

pub fn router(state: &AppState) -> Router<AppState> {
    let signed_in = middleware::from_fn_with_state(state.clone(), require_session);
    let admin_only = middleware::from_fn_with_state(state.clone(), require_admin);

    Router::new()
        .route(
            "/orders",
            post(create_order)
                .route_layer(signed_in)
                .merge(get(list_orders).route_layer(admin_only.clone())),
        )
        .route(
            "/orders/{id}/status",
            put(update_order_status).route_layer(admin_only),
        )
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order and all its items stored", body = ApiResponse<OrderCreated>),
        (status = 401, description = "No session", body = ErrorBody),
        (status = 422, description = "Invalid cart", body = ErrorBody),
        (status = 500, description = "Order rolled back", body = ErrorBody)
    ),
    security(("session_cookie" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(payload): JsonBody<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderCreated>>)> {
    let created = order_service::create_order(&state, &user, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Order created successfully", created)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "All orders, newest first, with items", body = OrderList),
        (status = 401, description = "No session", body = ErrorBody),
        (status = 403, description = "Not an administrator", body = ErrorBody)
    ),
    security(("session_cookie" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    admin: AdminUser,
) -> AppResult<Json<OrderList>> {
    let orders = order_service::list_orders(&state, &admin).await?;
    Ok(Json(orders))
}

#[utoipa::path(
    put,
    path = "/api/orders/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<Empty>),
        (status = 403, description = "Not an administrator", body = ErrorBody),
        (status = 404, description = "Order not found", body = ErrorBody),
        (status = 422, description = "Status rejected", body = ErrorBody)
    ),
    security(("session_cookie" = [])),
    tag = "Orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Empty>>> {
    order_service::update_order_status(&state, &admin, id, payload).await?;
    Ok(Json(ApiResponse::success(
        "Order status updated",
        Empty::default(),
    )))
}
