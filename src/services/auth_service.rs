use std::sync::LazyLock;

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::Utc;
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    db::OrmConn,
    dto::auth::{LoginRequest, RegisterRequest, SessionStatus},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    error::{AppError, AppResult, is_unique_violation},
    models::PublicUser,
    session::Session,
    state::AppState,
};

/// Hash checked when the email is unknown, so both login failures cost one verification.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("not-a-real-password").ok());

/// A successful register or login: the profile plus the cookie that carries the session.
#[derive(Debug)]
pub struct SignedIn {
    pub user_id: Uuid,
    pub user: PublicUser,
    pub set_cookie: String,
}

pub async fn register_user(state: &AppState, payload: RegisterRequest) -> AppResult<SignedIn> {
    let RegisterRequest {
        name,
        email,
        password,
    } = payload;
    let name = name.trim().to_string();
    let email = email.trim().to_string();

    if name.is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    if !is_plausible_email(&email) {
        return Err(AppError::validation("A valid email is required"));
    }
    if password.is_empty() {
        return Err(AppError::validation("Password is required"));
    }

    let exist = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(email_taken());
    }

    let password_hash = hash_password(&password)?;
    let is_admin = state.bootstrap_admin_email.as_deref() == Some(email.as_str());

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        email: Set(email),
        password_hash: Set(password_hash),
        is_admin: Set(is_admin),
        created_at: Set(Utc::now()),
    }
    .insert(&state.orm)
    .await
    .map_err(|err| {
        // Lost a race with a concurrent registration for the same address.
        if is_unique_violation(&err) {
            email_taken()
        } else {
            AppError::OrmError(err)
        }
    })?;

    tracing::info!(user_id = %user.id, is_admin = user.is_admin, "user registered");
    sign_in(state, user)
}

pub async fn login_user(state: &AppState, payload: LoginRequest) -> AppResult<SignedIn> {
    let LoginRequest { email, password } = payload;
    let user = Users::find()
        .filter(UserCol::Email.eq(email.trim()))
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) if verify_password(&password, &u.password_hash) => u,
        Some(u) => {
            tracing::debug!(user_id = %u.id, "login rejected: wrong password");
            return Err(AppError::InvalidCredentials);
        }
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_password(&password, dummy);
            }
            tracing::debug!("login rejected: unknown email");
            return Err(AppError::InvalidCredentials);
        }
    };

    tracing::info!(user_id = %user.id, "user logged in");
    sign_in(state, user)
}

/// `Set-Cookie` value that ends the caller's session. Safe to call without one.
pub fn logout_user(state: &AppState) -> String {
    state.sessions.clear_cookie()
}

pub async fn current_user(state: &AppState, session: Option<Session>) -> AppResult<SessionStatus> {
    let Some(session) = session else {
        return Ok(SessionStatus::logged_out());
    };
    let user = find_account(&state.orm, session.user_id).await?;
    Ok(SessionStatus::logged_in(user.into()))
}

/// Load the user a session points at; a deleted user yields `StaleSession`.
pub async fn find_account(orm: &OrmConn, user_id: Uuid) -> AppResult<UserModel> {
    Users::find_by_id(user_id)
        .one(orm)
        .await?
        .ok_or(AppError::StaleSession)
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

/// Constant-time check of `password` against a stored PHC string.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(stored_hash) {
        Ok(h) => h,
        Err(err) => {
            tracing::warn!(error = %err, "stored password hash is unreadable");
            return false;
        }
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

fn sign_in(state: &AppState, user: UserModel) -> AppResult<SignedIn> {
    let set_cookie = state.sessions.issue_cookie(user.id, user.is_admin)?;
    Ok(SignedIn {
        user_id: user.id,
        user: user.into(),
        set_cookie,
    })
}

fn email_taken() -> AppError {
    AppError::Conflict("User with this email already exists".into())
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
        None => false,
    }
}
