use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::warn;

use crate::auth::repository::find_by_email;
use crate::auth::token::decode_access_token;
use crate::errors::AppError;
use crate::models::user::{Role, UserRow};
use crate::state::AppState;

/// The authenticated, active account behind a Bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserRow);

impl CurrentUser {
    pub fn role(&self) -> Role {
        self.0.role()
    }

    /// Job management is limited to admins.
    pub fn require_admin(&self, action: &str) -> Result<(), AppError> {
        match self.role() {
            Role::Admin => Ok(()),
            _ => Err(AppError::Forbidden(format!("Only admins can {action}"))),
        }
    }

    /// Candidate review is open to admins and HR.
    pub fn require_staff(&self, action: &str) -> Result<(), AppError> {
        match self.role() {
            Role::Admin | Role::Hr => Ok(()),
            Role::User => Err(AppError::Forbidden(format!("Not authorized to {action}"))),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(|| {
            warn!("Missing bearer token");
            AppError::Unauthorized
        })?;
        let claims = decode_access_token(token, &state.config.secret_key)?;

        let user = find_by_email(&state.db, &claims.sub).await?.ok_or_else(|| {
            warn!("Token validation failed: user not found - {}", claims.sub);
            AppError::Unauthorized
        })?;
        if !user.is_active {
            warn!("Token presented for inactive user: {}", user.email);
            return Err(AppError::Unauthorized);
        }
        Ok(CurrentUser(user))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
