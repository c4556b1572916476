#![allow(dead_code)]

use bookstore_api::{
    config::{AppConfig, DEFAULT_BOOTSTRAP_ADMIN_EMAIL},
    db::run_migrations,
    dto::auth::RegisterRequest,
    entity::products::ActiveModel as ProductActive,
    middleware::auth::{AdminUser, AuthUser, ensure_admin},
    models::Product,
    services::auth_service::{SignedIn, register_user},
    session::Session,
    state::{AppState, OrderPolicy},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, Set};
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = DEFAULT_BOOTSTRAP_ADMIN_EMAIL;

pub fn test_config(policy: OrderPolicy) -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 0,
        session_secret: "integration-test-session-secret".into(),
        session_ttl_hours: 1,
        session_cookie_secure: false,
        bootstrap_admin_email: Some(ADMIN_EMAIL.into()),
        total_policy: policy.total,
        status_policy: policy.status,
    }
}

pub async fn setup_state() -> anyhow::Result<AppState> {
    setup_state_with(OrderPolicy::default()).await
}

// Each test gets a private in-memory database; one pinned connection keeps it alive.
pub async fn setup_state_with(policy: OrderPolicy) -> anyhow::Result<AppState> {
    let config = test_config(policy);
    let mut options = ConnectOptions::new(config.database_url.clone());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let orm = Database::connect(options).await?;
    run_migrations(&orm).await?;
    Ok(AppState::new(orm, &config))
}

pub async fn register(
    state: &AppState,
    name: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<SignedIn> {
    let signed = register_user(
        state,
        RegisterRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        },
    )
    .await?;
    Ok(signed)
}

pub fn session_of(signed: &SignedIn) -> Session {
    Session {
        user_id: signed.user_id,
        is_admin: signed.user.is_admin,
    }
}

pub fn auth_user(signed: &SignedIn) -> AuthUser {
    AuthUser::from(session_of(signed))
}

pub async fn admin(state: &AppState) -> anyhow::Result<AdminUser> {
    let signed = register(state, "Administrator", ADMIN_EMAIL, "admin123").await?;
    let admin = ensure_admin(&state.orm, Some(session_of(&signed))).await?;
    Ok(admin)
}

pub async fn seed_product(state: &AppState, name: &str, price: f64) -> anyhow::Result<Product> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(Some(format!("{name} description"))),
        price: Set(price),
        created_at: Set(Utc::now()),
    }
    .insert(&state.orm)
    .await?;
    Ok(product.into())
}
