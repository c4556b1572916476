use std::sync::Arc;

use crate::{
    config::{AppConfig, StatusPolicy, TotalPolicy},
    db::OrmConn,
    session::SessionKeys,
};

/// Rules for order checkout and admin status changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderPolicy {
    pub total: TotalPolicy,
    pub status: StatusPolicy,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub sessions: SessionKeys,
    /// Registering with exactly this address grants the admin role.
    pub bootstrap_admin_email: Option<Arc<str>>,
    pub order_policy: OrderPolicy,
}

impl AppState {
    pub fn new(orm: OrmConn, config: &AppConfig) -> Self {
        Self {
            orm,
            sessions: SessionKeys::new(
                config.session_secret.as_bytes(),
                config.session_ttl_hours,
                config.session_cookie_secure,
            ),
            bootstrap_admin_email: config.bootstrap_admin_email.as_deref().map(Arc::from),
            order_policy: OrderPolicy {
                total: config.total_policy,
                status: config.status_policy,
            },
        }
    }
}
