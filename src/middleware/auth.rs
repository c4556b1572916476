use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{
    db::OrmConn,
    entity::Users,
    error::{AppError, AppResult},
    session::Session,
    state::AppState,
};

/// Caller admitted by a guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub is_admin: bool,
}

impl From<Session> for AuthUser {
    fn from(session: Session) -> Self {
        Self {
            user_id: session.user_id,
            is_admin: session.is_admin,
        }
    }
}

/// Proof that the caller passed the admin check against the stored user.
///
/// Only [`ensure_admin`] builds one, so a function taking `&AdminUser` cannot
/// be reached without that check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminUser {
    user_id: Uuid,
}

impl AdminUser {
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }
}

impl From<AdminUser> for AuthUser {
    fn from(admin: AdminUser) -> Self {
        Self {
            user_id: admin.user_id,
            is_admin: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorizer {
    AnySession,
    AdminOnly,
}

impl Authorizer {
    pub async fn authorize(self, orm: &OrmConn, session: Option<Session>) -> AppResult<AuthUser> {
        match self {
            Authorizer::AnySession => ensure_session(session),
            Authorizer::AdminOnly => ensure_admin(orm, session).await.map(AuthUser::from),
        }
    }
}

pub fn ensure_session(session: Option<Session>) -> AppResult<AuthUser> {
    session.map(AuthUser::from).ok_or(AppError::Unauthorized)
}

pub async fn ensure_admin(orm: &OrmConn, session: Option<Session>) -> AppResult<AdminUser> {
    let user = ensure_session(session)?;
    let stored = Users::find_by_id(user.user_id).one(orm).await?;
    match stored {
        Some(u) if u.is_admin => Ok(AdminUser { user_id: u.id }),
        Some(_) => Err(AppError::Forbidden),
        None => {
            tracing::debug!(user_id = %user.user_id, "admin check for a deleted user");
            Err(AppError::Forbidden)
        }
    }
}

pub async fn require_session(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> AppResult<Response> {
    guard(Authorizer::AnySession, &state, request, next).await
}

pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> AppResult<Response> {
    guard(Authorizer::AdminOnly, &state, request, next).await
}

async fn guard(
    authorizer: Authorizer,
    state: &AppState,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let session = state.sessions.from_headers(request.headers());
    let caller = authorizer.authorize(&state.orm, session).await?;

    if authorizer == Authorizer::AdminOnly {
        request.extensions_mut().insert(AdminUser {
            user_id: caller.user_id,
        });
    }
    request.extensions_mut().insert(caller);

    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or(AppError::Unauthorized)
    }
}

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminUser>()
            .copied()
            .ok_or(AppError::Forbidden)
    }
}

/// Session of the caller, if any, for routes that serve both states.
#[derive(Debug, Clone, Copy)]
pub struct MaybeSession(pub Option<Session>);

impl<S> FromRequestParts<S> for MaybeSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        Ok(MaybeSession(state.sessions.from_headers(&parts.headers)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_session_requires_a_session() {
        assert!(matches!(ensure_session(None), Err(AppError::Unauthorized)));

        let user_id = Uuid::new_v4();
        let caller = ensure_session(Some(Session {
            user_id,
            is_admin: false,
        }))
        .expect("session");
        assert_eq!(caller.user_id, user_id);
    }
}
