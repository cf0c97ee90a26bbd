use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum JobStatus {
    Open,
    Closed,
    Filled,
    #[default]
    Draft,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Draft,
        JobStatus::Open,
        JobStatus::Closed,
        JobStatus::Filled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Open => "Open",
            JobStatus::Closed => "Closed",
            JobStatus::Filled => "Filled",
            JobStatus::Draft => "Draft",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(JobStatus::Open),
            "closed" => Ok(JobStatus::Closed),
            "filled" => Ok(JobStatus::Filled),
            "draft" => Ok(JobStatus::Draft),
            other => Err(format!("Unknown job status '{other}'")),
        }
    }
}

impl TryFrom<String> for JobStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A job row joined with its applicant counters.
#[derive(Debug, Clone, FromRow)]
pub struct JobRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub skills_required: Vec<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub experience_required: f64,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub status: String,
    pub admin_id: Option<i64>,
    pub closing_date: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub total_applicants: i64,
    pub total_shortlisted: i64,
    pub total_rejected: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub skills_required: Vec<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub experience_required: f64,
    pub salary_range: Option<SalaryRange>,
    pub status: String,
    pub admin_id: Option<i64>,
    pub closing_date: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub posted_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub total_applicants: i64,
    pub total_shortlisted: i64,
    pub total_rejected: i64,
}

impl From<JobRow> for JobResponse {
    fn from(row: JobRow) -> Self {
        let salary_range = match (row.salary_min, row.salary_max) {
            (Some(min), Some(max)) => Some(SalaryRange { min, max }),
            (Some(min), None) => Some(SalaryRange { min, max: min }),
            (None, Some(max)) => Some(SalaryRange { min: 0.0, max }),
            (None, None) => None,
        };
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            requirements: row.requirements,
            skills_required: row.skills_required,
            department: row.department,
            location: row.location,
            job_type: row.job_type,
            experience_required: row.experience_required,
            salary_range,
            status: row.status,
            admin_id: row.admin_id,
            closing_date: row.closing_date,
            closed_at: row.closed_at,
            posted_date: row.created_at,
            updated_at: row.updated_at,
            total_applicants: row.total_applicants,
            total_shortlisted: row.total_shortlisted,
            total_rejected: row.total_rejected,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_job(id: i64) -> JobRow {
    JobRow {
        id,
        title: "Senior Python Developer".into(),
        description: "Looking for an experienced Python developer".into(),
        requirements: vec![],
        skills_required: vec![],
        department: Some("Engineering".into()),
        location: None,
        job_type: Some("Full-time".into()),
        experience_required: 0.0,
        salary_min: None,
        salary_max: None,
        status: "Open".into(),
        admin_id: Some(1),
        closing_date: None,
        closed_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        total_applicants: 0,
        total_shortlisted: 0,
        total_rejected: 0,
    }
}
