use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ApplicantRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub skills: Vec<String>,
    pub total_experience: f64,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub website: Option<String>,
    pub date_created: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ResumeRow {
    pub id: i64,
    pub applicant_id: i64,
    pub job_id: i64,
    pub file_key: String,
    pub file_name: String,
    pub file_type: String,
    pub content_type: String,
    pub file_size: i64,
    pub parsed_status: String,
    pub text_content: Option<String>,
    pub extracted_skills: Vec<String>,
    pub experience_years: f64,
    pub parsed_data: Option<Value>,
    pub upload_date: DateTime<Utc>,
}

#[cfg(test)]
pub(crate) fn sample_resume(id: i64, job_id: i64, text: &str) -> ResumeRow {
    ResumeRow {
        id,
        applicant_id: id,
        job_id,
        file_key: format!("resumes/{job_id}/resume-{id}.txt"),
        file_name: "resume.txt".into(),
        file_type: "txt".into(),
        content_type: "text/plain".into(),
        file_size: text.len() as i64,
        parsed_status: "Parsed".into(),
        text_content: Some(text.to_string()),
        extracted_skills: vec![],
        experience_years: 0.0,
        parsed_data: None,
        upload_date: Utc::now(),
    }
}
