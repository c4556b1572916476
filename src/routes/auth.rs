use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    routing::{get, post},
};

use crate::{
    dto::auth::{LoginRequest, RegisterRequest, SessionStatus, UserEnvelope},
    error::AppResult,
    extract::JsonBody,
    middleware::auth::MaybeSession,
    response::{ApiResponse, Empty, ErrorBody},
    services::auth_service::{current_user, login_user, logout_user, register_user},
    state::AppState,
};

type SetCookie = [(header::HeaderName, String); 1];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", get(logout))
        .route("/user", get(who_am_i))
}

#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created and session opened", body = ApiResponse<UserEnvelope>),
        (status = 409, description = "Email already registered", body = ErrorBody),
        (status = 422, description = "Missing name, email or password", body = ErrorBody)
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> AppResult<(StatusCode, SetCookie, Json<ApiResponse<UserEnvelope>>)> {
    let signed = register_user(&state, payload).await?;
    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, signed.set_cookie)],
        Json(ApiResponse::success(
            "Registration successful",
            UserEnvelope { user: signed.user },
        )),
    ))
}

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session opened", body = ApiResponse<UserEnvelope>),
        (status = 401, description = "Invalid email or password", body = ErrorBody)
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> AppResult<(SetCookie, Json<ApiResponse<UserEnvelope>>)> {
    let signed = login_user(&state, payload).await?;
    Ok((
        [(header::SET_COOKIE, signed.set_cookie)],
        Json(ApiResponse::success(
            "Logged in",
            UserEnvelope { user: signed.user },
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/logout",
    responses(
        (status = 200, description = "Session cleared", body = ApiResponse<Empty>)
    ),
    tag = "Auth"
)]
pub async fn logout(State(state): State<AppState>) -> (SetCookie, Json<ApiResponse<Empty>>) {
    (
        [(header::SET_COOKIE, logout_user(&state))],
        Json(ApiResponse::success("Logged out", Empty::default())),
    )
}

#[utoipa::path(
    get,
    path = "/api/user",
    responses(
        (status = 200, description = "Current session state", body = SessionStatus),
        (status = 401, description = "Session points at a deleted user", body = ErrorBody)
    ),
    tag = "Auth"
)]
pub async fn who_am_i(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
) -> AppResult<Json<SessionStatus>> {
    let status = current_user(&state, session).await?;
    Ok(Json(status))
}
