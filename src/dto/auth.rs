use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::PublicUser;

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserEnvelope {
    pub user: PublicUser,
}

/// Answer of `GET /api/user`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionStatus {
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<PublicUser>,
}

impl SessionStatus {
    pub fn logged_out() -> Self {
        Self {
            logged_in: false,
            user: None,
        }
    }

    pub fn logged_in(user: PublicUser) -> Self {
        Self {
            logged_in: true,
            user: Some(user),
        }
    }
}
