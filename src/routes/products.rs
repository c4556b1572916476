use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::products::{CreateProductRequest, DeletedProduct, ProductList, UpdateProductRequest},
    error::AppResult,
    extract::{JsonBody, Path},
    middleware::auth::{AdminUser, require_admin},
    models::Product,
    response::{ApiResponse, ErrorBody},
    services::product_service,
    state::AppState,
};

pub fn router(state: &AppState) -> Router<AppState> {
    let admin_only = middleware::from_fn_with_state(state.clone(), require_admin);

    Router::new()
        .route("/product/all", get(list_products))
        .route(
            "/product",
            post(create_product).route_layer(admin_only.clone()),
        )
        .route(
            "/product/{id}",
            get(get_product).merge(
                put(update_product)
                    .delete(delete_product)
                    .route_layer(admin_only),
            ),
        )
}

#[utoipa::path(
    get,
    path = "/api/product/all",
    responses(
        (status = 200, description = "Every product in the catalog", body = ProductList)
    ),
    tag = "Products"
)]
pub async fn list_products(State(state): State<AppState>) -> AppResult<Json<ProductList>> {
    let products = product_service::list_products(&state).await?;
    Ok(Json(products))
}

#[utoipa::path(
    get,
    path = "/api/product/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Get product", body = Product),
        (status = 404, description = "Product not found", body = ErrorBody),
    ),
    tag = "Products"
)]
pub async fn get_product(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> AppResult<Json<Product>> {
    let product = product_service::get_product(&state, id).await?;
    Ok(Json(product))
}

#[utoipa::path(
    post,
    path = "/api/product",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Create product", body = Product),
        (status = 401, description = "No session", body = ErrorBody),
        (status = 403, description = "Not an administrator", body = ErrorBody),
        (status = 422, description = "Invalid name or price", body = ErrorBody)
    ),
    security(("session_cookie" = [])),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    admin: AdminUser,
    JsonBody(payload): JsonBody<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let product = product_service::create_product(&state, &admin, payload).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    put,
    path = "/api/product/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated product", body = Product),
        (status = 403, description = "Not an administrator", body = ErrorBody),
        (status = 404, description = "Product not found", body = ErrorBody),
        (status = 422, description = "Invalid name or price", body = ErrorBody)
    ),
    security(("session_cookie" = [])),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateProductRequest>,
) -> AppResult<Json<Product>> {
    let product = product_service::update_product(&state, &admin, id, payload).await?;
    Ok(Json(product))
}

#[utoipa::path(
    delete,
    path = "/api/product/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Deleted product", body = ApiResponse<DeletedProduct>),
        (status = 403, description = "Not an administrator", body = ErrorBody),
        (status = 404, description = "Product not found", body = ErrorBody)
    ),
    security(("session_cookie" = [])),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<DeletedProduct>>> {
    let deleted = product_service::delete_product(&state, &admin, id).await?;
    Ok(Json(ApiResponse::success("Success", deleted)))
}
