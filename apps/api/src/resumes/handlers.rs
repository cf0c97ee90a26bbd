//! Axum route handlers for resume upload and retrieval.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::auth::password::validate_email;
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::extractors::{AppMultipart, AppPath, AppQuery};
use crate::jobs::repository::job_exists;
use crate::models::resume::{ApplicantRow, ResumeRow};
use crate::resumes::extract::{extract_text, validate_upload, FileKind};
use crate::resumes::parser::{parse_resume, ParsedResume};
use crate::resumes::repository::{self, NewApplicant, NewResume};
use crate::resumes::storage;
use crate::state::AppState;

#[derive(Debug, Default)]
struct UploadForm {
    job_id: Option<String>,
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    file: Option<(String, Vec<u8>)>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    #[serde(flatten)]
    pub resume: ResumeRow,
    pub applicant: ApplicantRow,
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ResumeListQuery {
    pub job_id: Option<i64>,
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(e.body_text()))?;
                form.file = Some((file_name, bytes.to_vec()));
            }
            "job_id" | "job_description_id" | "name" | "email" | "phone" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(e.body_text()))?;
                let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
                match field_name.as_str() {
                    "name" => form.name = value,
                    "email" => form.email = value,
                    "phone" => form.phone = value,
                    _ => form.job_id = form.job_id.take().or(value),
                }
            }
            other => warn!("Ignoring unexpected multipart field '{other}'"),
        }
    }
    Ok(form)
}

/// Runs text extraction and field parsing off the async executor.
/// Extraction failures are reported as `None` rather than rejecting the upload.
async fn extract_and_parse(
    kind: FileKind,
    bytes: Vec<u8>,
) -> Result<Option<(String, ParsedResume)>, AppError> {
    let outcome = tokio::task::spawn_blocking(move || {
        extract_text(kind, &bytes).map(|text| {
            let parsed = parse_resume(&text);
            (text, parsed)
        })
    })
    .await
    .map_err(|e| {
        AppError::Internal(anyhow::anyhow!("spawn_blocking failed in text extraction: {e}"))
    })?;

    match outcome {
        Ok((text, parsed)) if !text.trim().is_empty() => Ok(Some((text, parsed))),
        Ok(_) => {
            warn!("No text extracted from {} upload", kind.extension());
            Ok(None)
        }
        Err(e) => {
            warn!("Resume text extraction failed: {e:#}");
            Ok(None)
        }
    }
}

/// POST /resumes/
pub async fn handle_upload(
    State(state): State<AppState>,
    AppMultipart(multipart): AppMultipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let form = read_upload_form(multipart).await?;

    let (file_name, bytes) = form
        .file
        .ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;
    let job_id = form
        .job_id
        .as_deref()
        .ok_or_else(|| AppError::Validation("job_id is required".to_string()))?
        .parse::<i64>()
        .map_err(|_| AppError::Validation("Invalid job ID".to_string()))?;
    if !job_exists(&state.db, job_id).await? {
        return Err(AppError::Validation("Invalid job ID".to_string()));
    }

    let kind = validate_upload(&file_name, bytes.len(), state.config.max_upload_bytes)?;
    let file_size = bytes.len() as i64;
    let extracted = extract_and_parse(kind, bytes.clone()).await?;
    let parsed = extracted.as_ref().map(|(_, p)| p.clone()).unwrap_or_default();

    let email = form
        .email
        .or_else(|| parsed.contact.email.clone())
        .ok_or_else(|| {
            AppError::UnprocessableEntity(
                "Applicant email is required and could not be found in the resume".to_string(),
            )
        })?;
    validate_email(&email)?;
    let name = form
        .name
        .or_else(|| Some(parsed.name.clone()).filter(|n| !n.is_empty()))
        .unwrap_or_else(|| "Unknown".to_string());

    ensure_not_submitted(&state.db, &email, job_id).await?;

    let file_key = storage::object_key(job_id, kind, chrono::Utc::now());
    storage::put_resume(&state.s3, &state.config.s3_bucket, &file_key, kind, bytes).await?;

    let applicant = NewApplicant {
        name,
        email,
        phone: form.phone.or_else(|| parsed.contact.phone.clone()),
        skills: parsed.skills.clone(),
        total_experience: parsed.experience_years,
        linkedin: parsed.contact.linkedin.clone(),
        github: parsed.contact.github.clone(),
        website: parsed.contact.website.clone(),
    };
    let parsed_data = match &extracted {
        Some((_, parsed)) => Some(serde_json::to_value(parsed).map_err(anyhow::Error::from)?),
        None => None,
    };
    let new_resume = NewResume {
        applicant_id: 0,
        job_id,
        file_key: file_key.clone(),
        file_name,
        file_type: kind.extension().to_string(),
        content_type: kind.content_type().to_string(),
        file_size,
        parsed_status: if extracted.is_some() { "Parsed" } else { "Failed" },
        text_content: extracted.map(|(text, _)| text),
        extracted_skills: parsed.skills,
        experience_years: parsed.experience_years,
        parsed_data,
    };

    let (applicant, resume) = match save_submission(&state.db, &applicant, new_resume).await {
        Ok(saved) => saved,
        Err(e) => {
            discard_object(&state, &file_key).await;
            return Err(e);
        }
    };

    info!(
        "Resume {} uploaded for job {job_id} by applicant {} ({})",
        resume.id, applicant.id, resume.parsed_status
    );
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            resume,
            applicant,
            message: "Resume uploaded successfully",
        }),
    ))
}

fn already_submitted() -> AppError {
    AppError::Validation("Resume already submitted for this job".to_string())
}

/// Rejects a second resume from the same applicant email for the same job.
async fn ensure_not_submitted(db: &PgPool, email: &str, job_id: i64) -> Result<(), AppError> {
    if let Some(existing) = repository::find_applicant_by_email(db, email).await? {
        if repository::resume_exists(db, existing.id, job_id).await? {
            return Err(already_submitted());
        }
    }
    Ok(())
}

/// Upserts the applicant and inserts the resume in one transaction, so a failed
/// insert leaves the stored applicant untouched.
async fn save_submission(
    db: &PgPool,
    applicant: &NewApplicant,
    mut resume: NewResume,
) -> Result<(ApplicantRow, ResumeRow), AppError> {
    let mut tx = db.begin().await?;
    let applicant = repository::upsert_applicant(&mut tx, applicant).await?;
    resume.applicant_id = applicant.id;
    let resume = repository::insert_resume(&mut tx, &resume)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => already_submitted(),
            other => AppError::Database(other),
        })?;
    tx.commit().await?;
    Ok((applicant, resume))
}

async fn discard_object(state: &AppState, key: &str) {
    if let Err(e) = storage::delete_resume(&state.s3, &state.config.s3_bucket, key).await {
        warn!("Failed to remove orphaned upload {key}: {e}");
    }
}

/// GET /resumes/
pub async fn handle_list(
    State(state): State<AppState>,
    current: CurrentUser,
    AppQuery(query): AppQuery<ResumeListQuery>,
) -> Result<Json<Vec<ResumeRow>>, AppError> {
    current.require_staff("view resumes")?;
    Ok(Json(repository::list_resumes(&state.db, query.job_id).await?))
}

/// GET /resumes/:id
pub async fn handle_get(
    State(state): State<AppState>,
    current: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> Result<Json<ResumeRow>, AppError> {
    current.require_staff("view resumes")?;
    repository::get_resume(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))
}

/// DELETE /resumes/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    current: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Value>, AppError> {
    current.require_admin("delete resumes")?;
    let resume = repository::delete_resume(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))?;
    discard_object(&state, &resume.file_key).await;

    info!("Resume {id} deleted by {}", current.0.email);
    Ok(Json(json!({ "message": "Resume deleted successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{new_applicant, new_resume, seed_job, seed_resume};

    #[sqlx::test]
    async fn test_repeat_submission_for_job_is_rejected(pool: PgPool) {
        let job = seed_job(&pool, "Backend Engineer", &["python"]).await;
        seed_resume(&pool, job.id, "again@example.com", "Python developer").await;

        let outcome = ensure_not_submitted(&pool, "again@example.com", job.id).await;
        assert!(matches!(
            outcome,
            Err(AppError::Validation(msg)) if msg == "Resume already submitted for this job"
        ));

        let other_job = seed_job(&pool, "Data Engineer", &["sql"]).await;
        ensure_not_submitted(&pool, "again@example.com", other_job.id)
            .await
            .unwrap();
    }

    #[sqlx::test]
    async fn test_rejected_submission_leaves_applicant_unchanged(pool: PgPool) {
        let job = seed_job(&pool, "Backend Engineer", &["python"]).await;
        seed_resume(&pool, job.id, "keep@example.com", "Python developer").await;

        let outcome = save_submission(
            &pool,
            &new_applicant("keep@example.com", "Someone Else"),
            new_resume(job.id, "Another resume"),
        )
        .await;
        assert!(matches!(outcome, Err(AppError::Validation(_))));

        let stored = repository::find_applicant_by_email(&pool, "keep@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.name, "Candidate");
    }

    #[sqlx::test]
    async fn test_text_with_nul_is_stored(pool: PgPool) {
        let job = seed_job(&pool, "Backend Engineer", &["python"]).await;
        let bytes = b"Nul Byte\nnul@example.com\nPython\x00 developer\n".to_vec();
        let (text, _) = extract_and_parse(FileKind::Txt, bytes).await.unwrap().unwrap();

        let (applicant, resume) = save_submission(
            &pool,
            &new_applicant("nul@example.com", "Nul Byte"),
            new_resume(job.id, &text),
        )
        .await
        .unwrap();
        assert_eq!(resume.applicant_id, applicant.id);
        assert_eq!(
            resume.text_content.as_deref(),
            Some("Nul Byte\nnul@example.com\nPython developer\n")
        );
    }

    #[tokio::test]
    async fn test_extract_and_parse_txt() {
        let bytes = b"Jane Smith\njane@example.com\nPython developer, 4 years".to_vec();
        let (text, parsed) = extract_and_parse(FileKind::Txt, bytes).await.unwrap().unwrap();
        assert!(text.contains("Jane Smith"));
        assert_eq!(parsed.name, "Jane Smith");
        assert_eq!(parsed.contact.email.as_deref(), Some("jane@example.com"));
        assert_eq!(parsed.experience_years, 4.0);
    }

    #[tokio::test]
    async fn test_txt_with_nul_parses_without_nul() {
        let bytes = b"Jane Doe\njane.nul@example.com\nPython, 4 years\x00\n".to_vec();
        let (text, parsed) = extract_and_parse(FileKind::Txt, bytes).await.unwrap().unwrap();
        assert!(!text.contains('\0'));
        assert_eq!(parsed.contact.email.as_deref(), Some("jane.nul@example.com"));
    }

    #[tokio::test]
    async fn test_extraction_failure_is_not_an_error() {
        let outcome = extract_and_parse(FileKind::Docx, b"garbage".to_vec()).await.unwrap();
        assert!(outcome.is_none());
        let blank = extract_and_parse(FileKind::Txt, b"   \n".to_vec()).await.unwrap();
        assert!(blank.is_none());
    }
}
