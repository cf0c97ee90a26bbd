pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::errors::AppError;
use crate::state::AppState;
use crate::{analytics, auth, jobs, matching, resumes, screening};

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD;

    let jobs_collection = get(jobs::handlers::handle_list).post(jobs::handlers::handle_create);
    let resumes_collection = post(resumes::handlers::handle_upload)
        .layer(DefaultBodyLimit::max(upload_limit))
        .get(resumes::handlers::handle_list);

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/", get(health::root_handler))
        // Auth
        .route("/auth/register", post(auth::handlers::handle_register))
        .route("/auth/token", post(auth::handlers::handle_token))
        .route("/auth/me", get(auth::handlers::handle_me))
        .route("/auth/deactivate", post(auth::handlers::handle_deactivate))
        // Jobs
        .route("/jobs", jobs_collection.clone())
        .route("/jobs/", jobs_collection)
        .route("/jobs/search", get(jobs::handlers::handle_search))
        .route(
            "/jobs/:id",
            get(jobs::handlers::handle_get)
                .put(jobs::handlers::handle_update)
                .delete(jobs::handlers::handle_delete),
        )
        .route("/jobs/:id/close", post(jobs::handlers::handle_close))
        .route("/jobs/:id/applicants", get(jobs::handlers::handle_applicants))
        .route(
            "/jobs/:id/applicants/:applicant_id",
            put(jobs::handlers::handle_update_applicant),
        )
        .route("/jobs/:id/analytics", get(jobs::handlers::handle_job_analytics))
        // Resumes
        .route("/resumes", resumes_collection.clone())
        .route("/resumes/", resumes_collection)
        .route(
            "/resumes/:id",
            get(resumes::handlers::handle_get).delete(resumes::handlers::handle_delete),
        )
        // Matching
        .route(
            "/matching/evaluate/:job_id/:resume_id",
            post(matching::handlers::handle_evaluate),
        )
        .route(
            "/matching/match-resumes/:job_id",
            get(matching::handlers::handle_match_resumes),
        )
        // Screening
        .route("/screening", post(screening::handlers::handle_create))
        .route("/screening/", post(screening::handlers::handle_create))
        .route("/screening/evaluate", post(screening::handlers::handle_evaluate))
        .route(
            "/screening/:id",
            get(screening::handlers::handle_get)
                .put(screening::handlers::handle_update)
                .delete(screening::handlers::handle_delete),
        )
        .route(
            "/screening/resume/:resume_id",
            get(screening::handlers::handle_by_resume),
        )
        .route("/screening/job/:job_id", get(screening::handlers::handle_by_job))
        // Analytics
        .route("/analytics/dashboard", get(analytics::handlers::handle_dashboard))
        .route("/analytics/jobs/:id", get(analytics::handlers::handle_job))
        .route("/analytics/skills", get(analytics::handlers::handle_skills))
        .route(
            "/analytics/departments",
            get(analytics::handlers::handle_departments),
        )
        .route("/analytics/hiring", get(analytics::handlers::handle_hiring))
        .fallback(not_found)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::test_support::{test_config, test_state};

    // The pool connects lazily to a closed port, so only paths that never reach
    // the database succeed.
    fn offline_state() -> AppState {
        let db = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(250))
            .connect_lazy(&test_config().database_url)
            .unwrap();
        test_state(db)
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = build_router(offline_state()).oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_root_reports_running() {
        let (status, body) = send(get_request("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Welcome to Resume Web Backend API");
        assert_eq!(body["status"], "running");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_health_reports_disconnected_database() {
        let (status, body) = send(get_request("/health")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "unhealthy");
        assert_eq!(body["database"], "disconnected");
    }

    #[tokio::test]
    async fn test_protected_routes_require_bearer_token() {
        for uri in ["/auth/me", "/analytics/dashboard", "/screening/job/1", "/resumes/"] {
            let (status, body) = send(get_request(uri)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(body["error"]["code"], "UNAUTHORIZED");
        }
    }

    #[tokio::test]
    async fn test_malformed_token_is_rejected() {
        let request = Request::builder()
            .uri("/auth/me")
            .header(header::AUTHORIZATION, "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_route_uses_error_body() {
        let (status, body) = send(get_request("/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_bad_path_parameter_uses_error_body() {
        let (status, body) = send(get_request("/jobs/abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["message"].is_string());
    }

    #[tokio::test]
    async fn test_incomplete_json_body_uses_error_body() {
        let request = Request::builder()
            .method("POST")
            .uri("/auth/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"x"}"#))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "UNPROCESSABLE_ENTITY");
    }

    #[tokio::test]
    async fn test_malformed_bodies_use_error_body() {
        let request = Request::builder()
            .method("POST")
            .uri("/auth/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let request = Request::builder()
            .method("POST")
            .uri("/auth/token")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let request = Request::builder()
            .method("POST")
            .uri("/resumes/")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("not multipart"))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}
