//! Axum route handlers for automated resume matching.

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::extractors::AppPath;
use crate::jobs::repository::get_job;
use crate::matching::scorer::MatchReport;
use crate::models::evaluation::{EvaluationRow, EvaluationStatus};
use crate::models::job::JobRow;
use crate::models::resume::ResumeRow;
use crate::resumes::repository::{get_resume, list_resumes};
use crate::screening::repository::{upsert_scored, ScoredEvaluation};
use crate::state::AppState;

const TOP_MATCHES: usize = 10;

#[derive(Debug, Serialize)]
pub struct EvaluationResult {
    #[serde(flatten)]
    pub evaluation: EvaluationRow,
    pub keyword_match: f64,
    pub scorer_backend: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedMatch {
    pub resume_id: i64,
    pub applicant_id: i64,
    pub score: f64,
    pub status: EvaluationStatus,
}

/// Scores the pair with the configured backend and resolves the automated status.
pub async fn score_pair(
    state: &AppState,
    job: &JobRow,
    resume: &ResumeRow,
) -> Result<(MatchReport, EvaluationStatus), AppError> {
    let report = state.scorer.score(job, resume).await?;
    let status =
        EvaluationStatus::from_score(report.overall_score, state.config.shortlist_threshold);
    Ok((report, status))
}

/// Only resumes submitted for `job` may be evaluated against it.
pub fn ensure_submitted_for(job: &JobRow, resume: &ResumeRow) -> Result<(), AppError> {
    if resume.job_id != job.id {
        return Err(AppError::Validation(
            "Resume was not submitted for this job".to_string(),
        ));
    }
    Ok(())
}

pub fn automated_comment(score: f64) -> String {
    format!("Automated evaluation based on skill match ({score:.2})")
}

/// Sorts by score descending and keeps the best `limit`. Ties keep resume order.
pub fn rank_matches(mut matches: Vec<RankedMatch>, limit: usize) -> Vec<RankedMatch> {
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    matches.truncate(limit);
    matches
}

/// POST /matching/evaluate/:job_id/:resume_id
pub async fn handle_evaluate(
    State(state): State<AppState>,
    current: CurrentUser,
    AppPath((job_id, resume_id)): AppPath<(i64, i64)>,
) -> Result<Json<EvaluationResult>, AppError> {
    current.require_staff("evaluate resumes")?;

    let job = get_job(&state.db, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;
    let resume = get_resume(&state.db, resume_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))?;
    ensure_submitted_for(&job, &resume)?;

    let (report, status) = score_pair(&state, &job, &resume).await?;
    let evaluation = upsert_scored(
        &state.db,
        &ScoredEvaluation {
            resume_id,
            job_id,
            admin_id: current.0.id,
            report: &report,
            status,
            comments: automated_comment(report.overall_score),
        },
    )
    .await?;

    info!(
        "Evaluated resume {resume_id} for job {job_id}: {:.2} ({status})",
        report.overall_score
    );
    Ok(Json(EvaluationResult {
        evaluation,
        keyword_match: report.keyword_match,
        scorer_backend: report.scorer_backend,
    }))
}

/// GET /matching/match-resumes/:job_id
pub async fn handle_match_resumes(
    State(state): State<AppState>,
    current: CurrentUser,
    AppPath(job_id): AppPath<i64>,
) -> Result<Json<Vec<RankedMatch>>, AppError> {
    current.require_staff("match resumes")?;

    let job = get_job(&state.db, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;
    let resumes = list_resumes(&state.db, Some(job_id)).await?;
    if resumes.is_empty() {
        return Err(AppError::NotFound("No resumes found for this job".to_string()));
    }

    let mut ranked = Vec::with_capacity(resumes.len());
    for resume in &resumes {
        let (report, status) = score_pair(&state, &job, resume).await?;
        upsert_scored(
            &state.db,
            &ScoredEvaluation {
                resume_id: resume.id,
                job_id,
                admin_id: current.0.id,
                report: &report,
                status,
                comments: automated_comment(report.overall_score),
            },
        )
        .await?;
        ranked.push(RankedMatch {
            resume_id: resume.id,
            applicant_id: resume.applicant_id,
            score: report.overall_score,
            status,
        });
    }

    info!("Matched {} resumes for job {job_id}", resumes.len());
    Ok(Json(rank_matches(ranked, TOP_MATCHES)))
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use super::*;
    use crate::models::user::Role;
    use crate::test_support::{seed_job, seed_resume, seed_user, test_state};

    #[sqlx::test]
    async fn test_reevaluation_updates_existing_row(pool: PgPool) {
        let job = seed_job(&pool, "Python Developer", &["python", "sql"]).await;
        let resume = seed_resume(&pool, job.id, "rerun@example.com", "Python developer").await;
        let hr = seed_user(&pool, "hr@example.com", Role::Hr).await;
        let state = test_state(pool.clone());

        let Json(first) = handle_evaluate(
            State(state.clone()),
            hr.clone(),
            AppPath((job.id, resume.id)),
        )
        .await
        .unwrap();
        let Json(second) = handle_evaluate(State(state), hr, AppPath((job.id, resume.id)))
            .await
            .unwrap();

        assert_eq!(first.evaluation.id, second.evaluation.id);
        let rows: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM candidate_evaluations WHERE resume_id = $1 AND job_id = $2",
        )
        .bind(resume.id)
        .bind(job.id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(rows, 1);
    }

    #[sqlx::test]
    async fn test_resume_from_another_job_is_rejected(pool: PgPool) {
        let job = seed_job(&pool, "Python Developer", &["python"]).await;
        let other = seed_job(&pool, "Go Developer", &["go"]).await;
        let resume = seed_resume(&pool, other.id, "elsewhere@example.com", "Go developer").await;
        let hr = seed_user(&pool, "hr@example.com", Role::Hr).await;

        let outcome =
            handle_evaluate(State(test_state(pool)), hr, AppPath((job.id, resume.id))).await;
        assert!(matches!(outcome, Err(AppError::Validation(_))));
    }

    fn ranked(resume_id: i64, score: f64) -> RankedMatch {
        RankedMatch {
            resume_id,
            applicant_id: resume_id,
            score,
            status: EvaluationStatus::from_score(score, 70.0),
        }
    }

    #[test]
    fn test_rank_matches_orders_and_truncates() {
        let matches = (1..=12).map(|i| ranked(i, i as f64 * 5.0)).collect();
        let top = rank_matches(matches, TOP_MATCHES);
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].resume_id, 12);
        assert_eq!(top[9].resume_id, 3);
        assert_eq!(top[0].status, EvaluationStatus::Rejected);
    }

    #[test]
    fn test_rank_matches_is_stable_on_ties() {
        let top = rank_matches(vec![ranked(1, 80.0), ranked(2, 90.0), ranked(3, 80.0)], 10);
        let ids: Vec<i64> = top.iter().map(|m| m.resume_id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert_eq!(top[0].status, EvaluationStatus::Shortlisted);
    }

    #[test]
    fn test_automated_comment_format() {
        assert_eq!(
            automated_comment(72.5),
            "Automated evaluation based on skill match (72.50)"
        );
    }
}
