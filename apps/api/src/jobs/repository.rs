use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::jobs::models::{JobFilters, ValidatedJob};
use crate::models::job::{JobRow, JobStatus};

/// Jobs joined with their applicant counters. Callers append `WHERE`/`ORDER BY`.
const JOB_SELECT: &str = r#"
    SELECT j.*,
        (SELECT COUNT(*) FROM resumes r WHERE r.job_id = j.id) AS total_applicants,
        (SELECT COUNT(*) FROM candidate_evaluations e
            WHERE e.job_id = j.id AND e.status = 'Shortlisted') AS total_shortlisted,
        (SELECT COUNT(*) FROM candidate_evaluations e
            WHERE e.job_id = j.id AND e.status = 'Rejected') AS total_rejected
    FROM jobs j
"#;

pub async fn get_job(pool: &PgPool, id: i64) -> Result<Option<JobRow>, sqlx::Error> {
    sqlx::query_as::<_, JobRow>(&format!("{JOB_SELECT} WHERE j.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn job_exists(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM jobs WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn insert_job(
    pool: &PgPool,
    job: &ValidatedJob,
    admin_id: i64,
) -> Result<JobRow, sqlx::Error> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO jobs (
            title, description, requirements, skills_required, department, location,
            job_type, experience_required, salary_min, salary_max, status, admin_id,
            closing_date
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING id
        "#,
    )
    .bind(&job.title)
    .bind(&job.description)
    .bind(&job.requirements)
    .bind(&job.skills_required)
    .bind(&job.department)
    .bind(&job.location)
    .bind(&job.job_type)
    .bind(job.experience_required)
    .bind(job.salary_min)
    .bind(job.salary_max)
    .bind(job.status.as_str())
    .bind(admin_id)
    .bind(job.closing_date)
    .fetch_one(pool)
    .await?;

    get_job(pool, id).await?.ok_or(sqlx::Error::RowNotFound)
}

/// Replaces every editable field. Moving to `Closed` stamps `closed_at` once.
pub async fn update_job(
    pool: &PgPool,
    id: i64,
    job: &ValidatedJob,
) -> Result<Option<JobRow>, sqlx::Error> {
    let updated: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE jobs SET
            title = $2, description = $3, requirements = $4, skills_required = $5,
            department = $6, location = $7, job_type = $8, experience_required = $9,
            salary_min = $10, salary_max = $11, status = $12, closing_date = $13,
            closed_at = CASE
                WHEN $12 = 'Closed' THEN COALESCE(closed_at, NOW())
                ELSE closed_at
            END,
            updated_at = NOW()
        WHERE id = $1
        RETURNING id
        "#,
    )
    .bind(id)
    .bind(&job.title)
    .bind(&job.description)
    .bind(&job.requirements)
    .bind(&job.skills_required)
    .bind(&job.department)
    .bind(&job.location)
    .bind(&job.job_type)
    .bind(job.experience_required)
    .bind(job.salary_min)
    .bind(job.salary_max)
    .bind(job.status.as_str())
    .bind(job.closing_date)
    .fetch_optional(pool)
    .await?;

    match updated {
        Some(id) => get_job(pool, id).await,
        None => Ok(None),
    }
}

pub async fn close_job(pool: &PgPool, id: i64) -> Result<Option<JobRow>, sqlx::Error> {
    let closed: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE jobs
        SET status = $2, closed_at = COALESCE(closed_at, NOW()), updated_at = NOW()
        WHERE id = $1
        RETURNING id
        "#,
    )
    .bind(id)
    .bind(JobStatus::Closed.as_str())
    .fetch_optional(pool)
    .await?;

    match closed {
        Some(id) => get_job(pool, id).await,
        None => Ok(None),
    }
}

/// Deletes the job; resumes and evaluations go with it via `ON DELETE CASCADE`.
pub async fn delete_job(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Filtered, paged listing shared by `GET /jobs` and `GET /jobs/search`.
pub async fn list_jobs(pool: &PgPool, filters: &JobFilters) -> Result<Vec<JobRow>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new(JOB_SELECT);
    qb.push(" WHERE TRUE");

    if let Some(query) = filters.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = format!("%{query}%");
        qb.push(" AND (j.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR j.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    let skills = filters.skill_list();
    if !skills.is_empty() {
        qb.push(" AND ARRAY(SELECT lower(s) FROM unnest(j.skills_required) s) @> ")
            .push_bind(skills);
    }

    if let Some(min) = filters.min_experience {
        qb.push(" AND j.experience_required >= ").push_bind(min);
    }
    if let Some(max) = filters.max_experience {
        qb.push(" AND j.experience_required <= ").push_bind(max);
    }
    // A job qualifies when its range reaches the requested bounds.
    if let Some(min) = filters.min_salary {
        qb.push(" AND COALESCE(j.salary_max, j.salary_min) >= ").push_bind(min);
    }
    if let Some(max) = filters.max_salary {
        qb.push(" AND COALESCE(j.salary_min, j.salary_max) <= ").push_bind(max);
    }

    for (column, value) in [
        ("j.job_type", &filters.job_type),
        ("j.location", &filters.location),
        ("j.department", &filters.department),
    ] {
        if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            qb.push(format!(" AND {column} ILIKE "))
                .push_bind(format!("%{value}%"));
        }
    }

    if let Some(status) = filters.status {
        qb.push(" AND j.status = ").push_bind(status.as_str());
    }

    qb.push(" ORDER BY j.created_at DESC, j.id DESC LIMIT ")
        .push_bind(filters.page_limit())
        .push(" OFFSET ")
        .push_bind(filters.offset());

    qb.build_query_as::<JobRow>().fetch_all(pool).await
}
