use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::matching::scorer::MatchReport;
use crate::models::evaluation::{EvaluationRow, EvaluationStatus};
use crate::screening::models::{EvaluationCreate, EvaluationUpdate, ValidatedFilters};

pub async fn get_evaluation(pool: &PgPool, id: i64) -> Result<Option<EvaluationRow>, sqlx::Error> {
    sqlx::query_as::<_, EvaluationRow>("SELECT * FROM candidate_evaluations WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn evaluation_exists(
    pool: &PgPool,
    resume_id: i64,
    job_id: i64,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM candidate_evaluations WHERE resume_id = $1 AND job_id = $2)",
    )
    .bind(resume_id)
    .bind(job_id)
    .fetch_one(pool)
    .await
}

/// Stores a reviewer-entered evaluation. The duration covers request receipt to insert.
pub async fn insert_manual(
    pool: &PgPool,
    body: &EvaluationCreate,
    admin_id: i64,
    started_at: DateTime<Utc>,
) -> Result<EvaluationRow, sqlx::Error> {
    sqlx::query_as::<_, EvaluationRow>(
        r#"
        INSERT INTO candidate_evaluations (
            resume_id, job_id, admin_id, overall_score, skill_match, experience_match,
            matching_skills, status, comments, interview_date, interview_notes,
            offer_details, rejection_reason, evaluation_started_at, evaluation_duration_secs
        )
        VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
            EXTRACT(EPOCH FROM (NOW() - $14))::DOUBLE PRECISION
        )
        RETURNING *
        "#,
    )
    .bind(body.resume_id)
    .bind(body.job_id)
    .bind(admin_id)
    .bind(body.suitability_score)
    .bind(body.skill_match)
    .bind(body.experience_match)
    .bind(&body.matching_skills)
    .bind(body.status.as_str())
    .bind(&body.comments)
    .bind(body.interview_date)
    .bind(&body.interview_notes)
    .bind(&body.offer_details)
    .bind(&body.rejection_reason)
    .bind(started_at)
    .fetch_one(pool)
    .await
}

/// Fields written by automated scoring.
#[derive(Debug, Clone)]
pub struct ScoredEvaluation<'a> {
    pub resume_id: i64,
    pub job_id: i64,
    pub admin_id: i64,
    pub report: &'a MatchReport,
    pub status: EvaluationStatus,
    pub comments: String,
}

pub async fn insert_scored(
    pool: &PgPool,
    scored: &ScoredEvaluation<'_>,
) -> Result<EvaluationRow, sqlx::Error> {
    write_scored(pool, scored, false).await
}

/// Inserts or overwrites the scored fields of the (resume, job) evaluation.
pub async fn upsert_scored(
    pool: &PgPool,
    scored: &ScoredEvaluation<'_>,
) -> Result<EvaluationRow, sqlx::Error> {
    write_scored(pool, scored, true).await
}

async fn write_scored(
    pool: &PgPool,
    scored: &ScoredEvaluation<'_>,
    overwrite: bool,
) -> Result<EvaluationRow, sqlx::Error> {
    let conflict = if overwrite {
        r#"
        ON CONFLICT (resume_id, job_id) DO UPDATE SET
            admin_id = EXCLUDED.admin_id,
            overall_score = EXCLUDED.overall_score,
            skill_match = EXCLUDED.skill_match,
            experience_match = EXCLUDED.experience_match,
            matching_skills = EXCLUDED.matching_skills,
            status = EXCLUDED.status,
            comments = EXCLUDED.comments,
            updated_at = NOW()
        "#
    } else {
        ""
    };
    let sql = format!(
        r#"
        INSERT INTO candidate_evaluations (
            resume_id, job_id, admin_id, overall_score, skill_match, experience_match,
            matching_skills, status, comments
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        {conflict}
        RETURNING *
        "#
    );

    sqlx::query_as::<_, EvaluationRow>(&sql)
        .bind(scored.resume_id)
        .bind(scored.job_id)
        .bind(scored.admin_id)
        .bind(scored.report.overall_score)
        .bind(scored.report.skill_match)
        .bind(scored.report.experience_match)
        .bind(&scored.report.matching_skills)
        .bind(scored.status.as_str())
        .bind(&scored.comments)
        .fetch_one(pool)
        .await
}

/// Applies a partial update and refreshes the evaluation duration when a start time exists.
pub async fn update_evaluation(
    pool: &PgPool,
    id: i64,
    update: &EvaluationUpdate,
) -> Result<Option<EvaluationRow>, sqlx::Error> {
    sqlx::query_as::<_, EvaluationRow>(
        r#"
        UPDATE candidate_evaluations SET
            overall_score = COALESCE($2, overall_score),
            skill_match = COALESCE($3, skill_match),
            experience_match = COALESCE($4, experience_match),
            matching_skills = COALESCE($5, matching_skills),
            comments = COALESCE($6, comments),
            status = COALESCE($7, status),
            interview_date = COALESCE($8, interview_date),
            interview_notes = COALESCE($9, interview_notes),
            offer_details = COALESCE($10, offer_details),
            rejection_reason = COALESCE($11, rejection_reason),
            evaluation_duration_secs = CASE
                WHEN evaluation_started_at IS NOT NULL
                    THEN EXTRACT(EPOCH FROM (NOW() - evaluation_started_at))::DOUBLE PRECISION
                ELSE evaluation_duration_secs
            END,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(update.suitability_score)
    .bind(update.skill_match)
    .bind(update.experience_match)
    .bind(&update.matching_skills)
    .bind(&update.comments)
    .bind(update.status.map(|s| s.as_str()))
    .bind(update.interview_date)
    .bind(&update.interview_notes)
    .bind(&update.offer_details)
    .bind(&update.rejection_reason)
    .fetch_optional(pool)
    .await
}

pub async fn delete_evaluation(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM candidate_evaluations WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_for_resume(
    pool: &PgPool,
    resume_id: i64,
) -> Result<Vec<EvaluationRow>, sqlx::Error> {
    sqlx::query_as::<_, EvaluationRow>(
        "SELECT * FROM candidate_evaluations WHERE resume_id = $1 ORDER BY created_at DESC, id DESC",
    )
    .bind(resume_id)
    .fetch_all(pool)
    .await
}

pub async fn list_for_job(
    pool: &PgPool,
    job_id: i64,
    filters: &ValidatedFilters,
) -> Result<Vec<EvaluationRow>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM candidate_evaluations WHERE job_id = ");
    qb.push_bind(job_id);
    if let Some(status) = filters.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(min) = filters.min_score {
        qb.push(" AND overall_score >= ").push_bind(min);
    }
    if let Some(max) = filters.max_score {
        qb.push(" AND overall_score <= ").push_bind(max);
    }
    qb.push(" ORDER BY overall_score DESC, id ASC");
    qb.build_query_as::<EvaluationRow>().fetch_all(pool).await
}

/// Sets status (and optionally comments) on every evaluation of the applicant's
/// resumes for the job.
pub async fn update_applicant_status(
    pool: &PgPool,
    job_id: i64,
    applicant_id: i64,
    status: EvaluationStatus,
    notes: Option<&str>,
) -> Result<Vec<EvaluationRow>, sqlx::Error> {
    sqlx::query_as::<_, EvaluationRow>(
        r#"
        UPDATE candidate_evaluations e SET
            status = $3,
            comments = COALESCE($4, e.comments),
            updated_at = NOW()
        FROM resumes r
        WHERE e.resume_id = r.id AND e.job_id = $1 AND r.applicant_id = $2
        RETURNING e.*
        "#,
    )
    .bind(job_id)
    .bind(applicant_id)
    .bind(status.as_str())
    .bind(notes)
    .fetch_all(pool)
    .await
}
