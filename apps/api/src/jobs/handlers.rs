//! Axum route handlers for job postings and their applicants.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::analytics::service::{job_analytics, JobAnalytics};
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::extractors::{AppJson, AppPath, AppQuery};
use crate::jobs::models::{ApplicantStatusQuery, JobFilters, JobRequest};
use crate::jobs::repository;
use crate::models::evaluation::{EvaluationRow, EvaluationStatus};
use crate::models::job::JobResponse;
use crate::resumes::repository::file_keys_for_job;
use crate::resumes::storage;
use crate::screening::models::EvaluationFilters;
use crate::screening::repository::{list_for_job, update_applicant_status};
use crate::state::AppState;

fn job_not_found() -> AppError {
    AppError::NotFound("Job not found".to_string())
}

/// POST /jobs/
pub async fn handle_create(
    State(state): State<AppState>,
    current: CurrentUser,
    AppJson(request): AppJson<JobRequest>,
) -> Result<(StatusCode, Json<JobResponse>), AppError> {
    current.require_admin("create jobs")?;
    let job = request.validate()?;
    let row = repository::insert_job(&state.db, &job, current.0.id).await?;
    info!("Job {} '{}' created by {}", row.id, row.title, current.0.email);
    Ok((StatusCode::CREATED, Json(JobResponse::from(row))))
}

/// GET /jobs/
pub async fn handle_list(
    State(state): State<AppState>,
    AppQuery(filters): AppQuery<JobFilters>,
) -> Result<Json<Vec<JobResponse>>, AppError> {
    let rows = repository::list_jobs(&state.db, &filters).await?;
    Ok(Json(rows.into_iter().map(JobResponse::from).collect()))
}

/// GET /jobs/search
pub async fn handle_search(
    State(state): State<AppState>,
    AppQuery(filters): AppQuery<JobFilters>,
) -> Result<Json<Vec<JobResponse>>, AppError> {
    if let (Some(min), Some(max)) = (filters.min_experience, filters.max_experience) {
        if min > max {
            return Err(AppError::Validation(
                "min_experience cannot exceed max_experience".to_string(),
            ));
        }
    }
    if let (Some(min), Some(max)) = (filters.min_salary, filters.max_salary) {
        if min > max {
            return Err(AppError::Validation(
                "min_salary cannot exceed max_salary".to_string(),
            ));
        }
    }
    let rows = repository::list_jobs(&state.db, &filters).await?;
    Ok(Json(rows.into_iter().map(JobResponse::from).collect()))
}

/// GET /jobs/:id
pub async fn handle_get(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<JobResponse>, AppError> {
    repository::get_job(&state.db, id)
        .await?
        .map(|row| Json(JobResponse::from(row)))
        .ok_or_else(job_not_found)
}

/// PUT /jobs/:id
pub async fn handle_update(
    State(state): State<AppState>,
    current: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppJson(request): AppJson<JobRequest>,
) -> Result<Json<JobResponse>, AppError> {
    current.require_admin("update jobs")?;
    let job = request.validate()?;
    let row = repository::update_job(&state.db, id, &job)
        .await?
        .ok_or_else(job_not_found)?;
    info!("Job {id} updated by {}", current.0.email);
    Ok(Json(JobResponse::from(row)))
}

/// DELETE /jobs/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    current: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Value>, AppError> {
    current.require_admin("delete jobs")?;
    let file_keys = file_keys_for_job(&state.db, id).await?;
    if !repository::delete_job(&state.db, id).await? {
        return Err(job_not_found());
    }

    // Rows are gone via cascade; stored files are cleaned up best-effort.
    for key in &file_keys {
        if let Err(e) = storage::delete_resume(&state.s3, &state.config.s3_bucket, key).await {
            warn!("Failed to remove resume object {key} for deleted job {id}: {e}");
        }
    }

    info!(
        "Job {id} deleted by {} ({} resumes removed)",
        current.0.email,
        file_keys.len()
    );
    Ok(Json(json!({ "message": "Job deleted successfully" })))
}

/// POST /jobs/:id/close
pub async fn handle_close(
    State(state): State<AppState>,
    current: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> Result<Json<JobResponse>, AppError> {
    current.require_admin("close jobs")?;
    let row = repository::close_job(&state.db, id)
        .await?
        .ok_or_else(job_not_found)?;
    info!("Job {id} closed by {}", current.0.email);
    Ok(Json(JobResponse::from(row)))
}

/// GET /jobs/:id/applicants
pub async fn handle_applicants(
    State(state): State<AppState>,
    current: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppQuery(filters): AppQuery<EvaluationFilters>,
) -> Result<Json<Vec<EvaluationRow>>, AppError> {
    current.require_staff("view applicants")?;
    let filters = filters.validate()?;
    if !repository::job_exists(&state.db, id).await? {
        return Err(job_not_found());
    }
    Ok(Json(list_for_job(&state.db, id, &filters).await?))
}

/// PUT /jobs/:id/applicants/:applicant_id
pub async fn handle_update_applicant(
    State(state): State<AppState>,
    current: CurrentUser,
    AppPath((id, applicant_id)): AppPath<(i64, i64)>,
    AppQuery(query): AppQuery<ApplicantStatusQuery>,
) -> Result<Json<Vec<EvaluationRow>>, AppError> {
    current.require_staff("update applicant status")?;
    let status: EvaluationStatus = query.status.parse().map_err(AppError::Validation)?;
    if !repository::job_exists(&state.db, id).await? {
        return Err(job_not_found());
    }

    let updated =
        update_applicant_status(&state.db, id, applicant_id, status, query.notes.as_deref())
            .await?;
    if updated.is_empty() {
        return Err(AppError::NotFound(
            "No evaluations found for this applicant and job".to_string(),
        ));
    }

    info!(
        "Applicant {applicant_id} on job {id} set to {status} by {}",
        current.0.email
    );
    Ok(Json(updated))
}

/// GET /jobs/:id/analytics
pub async fn handle_job_analytics(
    State(state): State<AppState>,
    current: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> Result<Json<JobAnalytics>, AppError> {
    current.require_staff("view analytics")?;
    Ok(Json(job_analytics(&state.db, id).await?))
}
