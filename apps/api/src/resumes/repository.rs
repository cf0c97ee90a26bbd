use serde_json::Value;
use sqlx::{PgConnection, PgPool};

use crate::models::resume::{ApplicantRow, ResumeRow};

#[derive(Debug, Clone, Default)]
pub struct NewApplicant {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub skills: Vec<String>,
    pub total_experience: f64,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewResume {
    pub applicant_id: i64,
    pub job_id: i64,
    pub file_key: String,
    pub file_name: String,
    pub file_type: String,
    pub content_type: String,
    pub file_size: i64,
    pub parsed_status: &'static str,
    pub text_content: Option<String>,
    pub extracted_skills: Vec<String>,
    pub experience_years: f64,
    pub parsed_data: Option<Value>,
}

pub async fn get_resume(pool: &PgPool, id: i64) -> Result<Option<ResumeRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_resumes(
    pool: &PgPool,
    job_id: Option<i64>,
) -> Result<Vec<ResumeRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeRow>(
        r#"
        SELECT * FROM resumes
        WHERE ($1::BIGINT IS NULL OR job_id = $1)
        ORDER BY upload_date DESC, id DESC
        "#,
    )
    .bind(job_id)
    .fetch_all(pool)
    .await
}

pub async fn file_keys_for_job(pool: &PgPool, job_id: i64) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT file_key FROM resumes WHERE job_id = $1")
        .bind(job_id)
        .fetch_all(pool)
        .await
}

pub async fn find_applicant_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<ApplicantRow>, sqlx::Error> {
    sqlx::query_as::<_, ApplicantRow>("SELECT * FROM applicants WHERE lower(email) = lower($1)")
        .bind(email)
        .fetch_optional(pool)
        .await
}

/// Inserts or refreshes the applicant keyed by email. Absent optional fields keep
/// their stored values.
pub async fn upsert_applicant(
    conn: &mut PgConnection,
    applicant: &NewApplicant,
) -> Result<ApplicantRow, sqlx::Error> {
    sqlx::query_as::<_, ApplicantRow>(
        r#"
        INSERT INTO applicants (name, email, phone, skills, total_experience, linkedin, github, website)
        VALUES ($1, lower($2), $3, $4, $5, $6, $7, $8)
        ON CONFLICT (email) DO UPDATE SET
            name = EXCLUDED.name,
            phone = COALESCE(EXCLUDED.phone, applicants.phone),
            skills = EXCLUDED.skills,
            total_experience = EXCLUDED.total_experience,
            linkedin = COALESCE(EXCLUDED.linkedin, applicants.linkedin),
            github = COALESCE(EXCLUDED.github, applicants.github),
            website = COALESCE(EXCLUDED.website, applicants.website),
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(&applicant.name)
    .bind(&applicant.email)
    .bind(&applicant.phone)
    .bind(&applicant.skills)
    .bind(applicant.total_experience)
    .bind(&applicant.linkedin)
    .bind(&applicant.github)
    .bind(&applicant.website)
    .fetch_one(conn)
    .await
}

pub async fn resume_exists(
    pool: &PgPool,
    applicant_id: i64,
    job_id: i64,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM resumes WHERE applicant_id = $1 AND job_id = $2)",
    )
    .bind(applicant_id)
    .bind(job_id)
    .fetch_one(pool)
    .await
}

pub async fn insert_resume(
    conn: &mut PgConnection,
    resume: &NewResume,
) -> Result<ResumeRow, sqlx::Error> {
    sqlx::query_as::<_, ResumeRow>(
        r#"
        INSERT INTO resumes (
            applicant_id, job_id, file_key, file_name, file_type, content_type, file_size,
            parsed_status, text_content, extracted_skills, experience_years, parsed_data
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *
        "#,
    )
    .bind(resume.applicant_id)
    .bind(resume.job_id)
    .bind(&resume.file_key)
    .bind(&resume.file_name)
    .bind(&resume.file_type)
    .bind(&resume.content_type)
    .bind(resume.file_size)
    .bind(resume.parsed_status)
    .bind(&resume.text_content)
    .bind(&resume.extracted_skills)
    .bind(resume.experience_years)
    .bind(&resume.parsed_data)
    .fetch_one(conn)
    .await
}

/// Removes the row and returns it so the caller can clean up the stored object.
pub async fn delete_resume(pool: &PgPool, id: i64) -> Result<Option<ResumeRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeRow>("DELETE FROM resumes WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_optional(pool)
        .await
}
