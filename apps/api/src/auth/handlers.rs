//! Axum route handlers for registration, login and account management.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::auth::extractor::CurrentUser;
use crate::auth::password::{
    hash_password, validate_email, validate_password_strength, verify_password, BCRYPT_COST,
};
use crate::auth::repository;
use crate::auth::throttle::LoginThrottle;
use crate::auth::token::create_access_token;
use crate::errors::AppError;
use crate::extractors::{AppForm, AppJson};
use crate::models::user::{Role, UserResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

/// OAuth2 password-flow form. `username` carries the email.
#[derive(Debug, Deserialize)]
pub struct TokenForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: TokenUser,
}

fn email_taken() -> AppError {
    AppError::Validation("Email already registered".to_string())
}

fn registration_error(err: sqlx::Error) -> AppError {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => email_taken(),
        other => AppError::Database(other),
    }
}

/// POST /auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    AppJson(request): AppJson<RegisterRequest>,
) -> Result<Json<UserResponse>, AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    validate_email(&request.email)?;
    validate_password_strength(&request.password)?;

    let email = request.email.trim().to_lowercase();
    if repository::find_by_email(&state.db, &email).await?.is_some() {
        return Err(email_taken());
    }

    let password = request.password.clone();
    let hashed = tokio::task::spawn_blocking(move || hash_password(&password, BCRYPT_COST))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;

    // A concurrent registration can pass the lookup above.
    let user = repository::insert_user(
        &state.db,
        &email,
        request.name.trim(),
        &hashed,
        request.role,
    )
    .await
    .map_err(registration_error)?;

    info!("User registered successfully: {email} ({})", user.role);
    Ok(Json(UserResponse::from(&user)))
}

/// POST /auth/token
pub async fn handle_token(
    State(state): State<AppState>,
    AppForm(form): AppForm<TokenForm>,
) -> Result<Json<TokenResponse>, AppError> {
    info!("Login attempt for user: {}", form.username);
    let throttle = LoginThrottle::new(
        state.redis.clone(),
        state.config.max_login_attempts,
        state.config.login_timeout_minutes,
    );
    throttle.check(&form.username).await?;

    let user = repository::find_by_email(&state.db, form.username.trim()).await?;
    let authenticated = match user {
        Some(user) => {
            let password = form.password.clone();
            let hashed = user.hashed_password.clone();
            let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hashed))
                .await
                .map_err(|e| AppError::Internal(e.into()))?;
            valid.then_some(user)
        }
        None => None,
    };

    let Some(user) = authenticated else {
        let failures = throttle.record_failure(&form.username).await?;
        warn!("Login failed for user: {} ({failures} failures)", form.username);
        return Err(AppError::Unauthorized);
    };

    if !user.is_active {
        warn!("Login attempt for inactive user: {}", form.username);
        return Err(AppError::Forbidden("Account is deactivated".to_string()));
    }

    throttle.reset(&form.username).await?;
    let user = repository::touch_last_login(&state.db, user.id).await?;

    let access_token = create_access_token(
        &user.email,
        user.role().as_str(),
        &state.config.secret_key,
        chrono::Duration::minutes(state.config.access_token_expire_minutes),
    )?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
        user: TokenUser {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role(),
            is_active: user.is_active,
        },
    }))
}

/// GET /auth/me
pub async fn handle_me(current: CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(&current.0))
}

/// POST /auth/deactivate
pub async fn handle_deactivate(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Value>, AppError> {
    repository::deactivate(&state.db, current.0.id).await?;
    info!("Account deactivated: {}", current.0.email);
    Ok(Json(json!({ "message": "Account deactivated successfully" })))
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use super::*;
    use crate::test_support::test_state;

    fn register_body(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "New User".into(),
            email: email.into(),
            password: "TestPassword123!".into(),
            role: Role::User,
        }
    }

    fn login_form(username: &str) -> TokenForm {
        TokenForm {
            username: username.into(),
            password: "WrongPassword1".into(),
        }
    }

    #[sqlx::test]
    async fn test_duplicate_email_is_rejected(pool: PgPool) {
        let state = test_state(pool);
        let Json(first) = handle_register(
            State(state.clone()),
            AppJson(register_body("dup@example.com")),
        )
        .await
        .unwrap();
        assert_eq!(first.email, "dup@example.com");

        let second = handle_register(
            State(state),
            AppJson(register_body("DUP@example.com")),
        )
        .await;
        assert!(matches!(
            second,
            Err(AppError::Validation(msg)) if msg == "Email already registered"
        ));
    }

    #[sqlx::test]
    async fn test_racing_insert_maps_to_email_taken(pool: PgPool) {
        repository::insert_user(&pool, "race@example.com", "A", "x", Role::User)
            .await
            .unwrap();
        let err = repository::insert_user(&pool, "race@example.com", "B", "y", Role::User)
            .await
            .unwrap_err();
        assert!(matches!(
            registration_error(err),
            AppError::Validation(msg) if msg == "Email already registered"
        ));
    }

    // Needs Redis at REDIS_URL as well as the scratch database.
    #[sqlx::test]
    async fn test_repeated_failures_lock_out_login(pool: PgPool) {
        let state = test_state(pool);
        let email = format!("lockout-{}@example.com", uuid::Uuid::new_v4());
        handle_register(State(state.clone()), AppJson(register_body(&email)))
            .await
            .unwrap();

        for _ in 0..state.config.max_login_attempts {
            let attempt = handle_token(State(state.clone()), AppForm(login_form(&email))).await;
            assert!(matches!(attempt, Err(AppError::Unauthorized)));
        }

        let correct = TokenForm {
            username: email.clone(),
            password: "TestPassword123!".into(),
        };
        let locked = handle_token(State(state), AppForm(correct)).await;
        assert!(matches!(locked, Err(AppError::TooManyRequests(_))));
    }

    #[test]
    fn test_register_request_role_defaults_to_user() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"name": "New User", "email": "new@example.com", "password": "TestPassword123!"}"#,
        )
        .unwrap();
        assert_eq!(req.role, Role::User);
    }

    #[test]
    fn test_register_request_accepts_hr_manager() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"name": "HR", "email": "hr@test.com", "password": "Testpass123", "role": "hr_manager"}"#,
        )
        .unwrap();
        assert_eq!(req.role, Role::Hr);
    }

    #[test]
    fn test_token_response_shape() {
        let response = TokenResponse {
            access_token: "abc".into(),
            token_type: "bearer",
            user: TokenUser {
                id: 3,
                email: "a@b.co".into(),
                name: "A".into(),
                role: Role::Admin,
                is_active: true,
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["token_type"], "bearer");
        assert_eq!(json["user"]["role"], "admin");
    }
}
