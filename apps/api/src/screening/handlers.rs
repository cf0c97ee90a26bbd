//! Axum route handlers for candidate evaluations (manual and automated).

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::info;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::extractors::{AppJson, AppPath, AppQuery};
use crate::jobs::repository::{get_job, job_exists};
use crate::matching::handlers::{automated_comment, ensure_submitted_for, score_pair};
use crate::models::evaluation::EvaluationRow;
use crate::resumes::repository::get_resume;
use crate::screening::models::{
    EvaluateRequest, EvaluationCreate, EvaluationFilters, EvaluationUpdate,
};
use crate::screening::repository::{self, ScoredEvaluation};
use crate::state::AppState;

const DUPLICATE: &str = "Screening result already exists for this resume and job";

fn not_found() -> AppError {
    AppError::NotFound("Screening result not found".to_string())
}

/// Maps a unique-constraint race on (resume_id, job_id) to 409.
fn conflict_on_duplicate(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(DUPLICATE.to_string())
        }
        other => AppError::Database(other),
    }
}

/// POST /screening/
pub async fn handle_create(
    State(state): State<AppState>,
    current: CurrentUser,
    AppJson(body): AppJson<EvaluationCreate>,
) -> Result<(StatusCode, Json<EvaluationRow>), AppError> {
    let started_at = Utc::now();
    current.require_staff("create screening results")?;
    body.validate()?;

    if get_resume(&state.db, body.resume_id).await?.is_none() {
        return Err(AppError::NotFound("Resume not found".to_string()));
    }
    if !job_exists(&state.db, body.job_id).await? {
        return Err(AppError::NotFound("Job not found".to_string()));
    }
    if repository::evaluation_exists(&state.db, body.resume_id, body.job_id).await? {
        return Err(AppError::Conflict(DUPLICATE.to_string()));
    }

    let evaluation = repository::insert_manual(&state.db, &body, current.0.id, started_at)
        .await
        .map_err(conflict_on_duplicate)?;

    info!(
        "Screening {} created for resume {} / job {} by {}",
        evaluation.id, body.resume_id, body.job_id, current.0.email
    );
    Ok((StatusCode::CREATED, Json(evaluation)))
}

/// POST /screening/evaluate
pub async fn handle_evaluate(
    State(state): State<AppState>,
    current: CurrentUser,
    AppJson(request): AppJson<EvaluateRequest>,
) -> Result<(StatusCode, Json<EvaluationRow>), AppError> {
    current.require_staff("evaluate resumes")?;

    let resume = get_resume(&state.db, request.resume_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))?;
    let job = get_job(&state.db, request.job_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;
    ensure_submitted_for(&job, &resume)?;
    if repository::evaluation_exists(&state.db, resume.id, job.id).await? {
        return Err(AppError::Conflict(DUPLICATE.to_string()));
    }

    let (report, status) = score_pair(&state, &job, &resume).await?;
    let evaluation = repository::insert_scored(
        &state.db,
        &ScoredEvaluation {
            resume_id: resume.id,
            job_id: job.id,
            admin_id: current.0.id,
            report: &report,
            status,
            comments: automated_comment(report.overall_score),
        },
    )
    .await
    .map_err(conflict_on_duplicate)?;

    info!(
        "Automated screening {} for resume {} / job {}: {:.2} ({status})",
        evaluation.id, resume.id, job.id, report.overall_score
    );
    Ok((StatusCode::CREATED, Json(evaluation)))
}

/// GET /screening/:id
pub async fn handle_get(
    State(state): State<AppState>,
    current: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> Result<Json<EvaluationRow>, AppError> {
    current.require_staff("view screening results")?;
    repository::get_evaluation(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// PUT /screening/:id
pub async fn handle_update(
    State(state): State<AppState>,
    current: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppJson(update): AppJson<EvaluationUpdate>,
) -> Result<Json<EvaluationRow>, AppError> {
    current.require_staff("update screening results")?;
    update.validate()?;
    let evaluation = repository::update_evaluation(&state.db, id, &update)
        .await?
        .ok_or_else(not_found)?;
    info!("Screening {id} updated by {}", current.0.email);
    Ok(Json(evaluation))
}

/// DELETE /screening/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    current: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> Result<StatusCode, AppError> {
    current.require_staff("delete screening results")?;
    if !repository::delete_evaluation(&state.db, id).await? {
        return Err(not_found());
    }
    info!("Screening {id} deleted by {}", current.0.email);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /screening/resume/:resume_id
pub async fn handle_by_resume(
    State(state): State<AppState>,
    current: CurrentUser,
    AppPath(resume_id): AppPath<i64>,
) -> Result<Json<Vec<EvaluationRow>>, AppError> {
    current.require_staff("view screening results")?;
    if get_resume(&state.db, resume_id).await?.is_none() {
        return Err(AppError::NotFound("Resume not found".to_string()));
    }
    Ok(Json(repository::list_for_resume(&state.db, resume_id).await?))
}

/// GET /screening/job/:job_id
pub async fn handle_by_job(
    State(state): State<AppState>,
    current: CurrentUser,
    AppPath(job_id): AppPath<i64>,
    AppQuery(filters): AppQuery<EvaluationFilters>,
) -> Result<Json<Vec<EvaluationRow>>, AppError> {
    current.require_staff("view screening results")?;
    let filters = filters.validate()?;
    if !job_exists(&state.db, job_id).await? {
        return Err(AppError::NotFound("Job not found".to_string()));
    }
    Ok(Json(repository::list_for_job(&state.db, job_id, &filters).await?))
}
