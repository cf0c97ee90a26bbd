use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::job::{JobStatus, SalaryRange};

pub const MAX_TITLE_CHARS: usize = 100;
pub const DEFAULT_PAGE_LIMIT: i64 = 100;

/// Create/replace body for a job posting.
#[derive(Debug, Clone, Deserialize)]
pub struct JobRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default, alias = "required_skills")]
    pub skills_required: Vec<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub experience_required: Option<f64>,
    pub salary_range: Option<SalaryRange>,
    pub salary_range_min: Option<f64>,
    pub salary_range_max: Option<f64>,
    #[serde(default)]
    pub status: JobStatus,
    pub closing_date: Option<DateTime<Utc>>,
}

/// A job body that passed validation, normalised for storage.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedJob {
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
    pub status: JobStatus,
    pub closing_date: Option<DateTime<Utc>>,
}

impl JobRequest {
    pub fn validate(self) -> Result<ValidatedJob, AppError> {
        let title = self.title.trim().to_string();
        if title.is_empty() || title.chars().count() > MAX_TITLE_CHARS {
            return Err(AppError::Validation(format!(
                "title must be between 1 and {MAX_TITLE_CHARS} characters"
            )));
        }
        let description = self.description.trim().to_string();
        if description.is_empty() {
            return Err(AppError::Validation("description cannot be empty".to_string()));
        }

        let experience_required = self.experience_required.unwrap_or(0.0);
        if !experience_required.is_finite() || experience_required < 0.0 {
            return Err(AppError::Validation(
                "experience_required must be a non-negative number".to_string(),
            ));
        }

        let (salary_min, salary_max) = match self.salary_range {
            Some(range) => (Some(range.min), Some(range.max)),
            None => (self.salary_range_min, self.salary_range_max),
        };
        for value in [salary_min, salary_max].into_iter().flatten() {
            if !value.is_finite() || value < 0.0 {
                return Err(AppError::Validation(
                    "salary values must be non-negative".to_string(),
                ));
            }
        }
        if let (Some(min), Some(max)) = (salary_min, salary_max) {
            if min > max {
                return Err(AppError::Validation(
                    "salary_range min cannot exceed max".to_string(),
                ));
            }
        }

        Ok(ValidatedJob {
            title,
            description,
            requirements: clean_list(self.requirements),
            skills_required: clean_list(self.skills_required),
            department: clean_opt(self.department),
            location: clean_opt(self.location),
            job_type: clean_opt(self.job_type),
            experience_required,
            salary_min,
            salary_max,
            status: self.status,
            closing_date: self.closing_date,
        })
    }
}

/// Query filters shared by the listing and search endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobFilters {
    pub query: Option<String>,
    pub skills: Option<String>,
    pub min_experience: Option<f64>,
    pub max_experience: Option<f64>,
    pub min_salary: Option<f64>,
    pub max_salary: Option<f64>,
    pub job_type: Option<String>,
    pub location: Option<String>,
    pub department: Option<String>,
    pub status: Option<JobStatus>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl JobFilters {
    /// Comma-separated skills, lowercased, blanks dropped.
    pub fn skill_list(&self) -> Vec<String> {
        self.skills
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn offset(&self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }

    pub fn page_limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, DEFAULT_PAGE_LIMIT)
    }
}

/// Query for `PUT /jobs/{id}/applicants/{applicant_id}`.
#[derive(Debug, Deserialize)]
pub struct ApplicantStatusQuery {
    pub status: String,
    pub notes: Option<String>,
}

fn clean_opt(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trims entries and drops blanks and case-insensitive duplicates, keeping first spelling.
fn clean_list(values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && seen.insert(v.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> JobRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_minimal_job_defaults() {
        let job = request(json!({"title": "Software Engineer", "description": "Test job"}))
            .validate()
            .unwrap();
        assert_eq!(job.status, JobStatus::Draft);
        assert_eq!(job.experience_required, 0.0);
        assert!(job.salary_min.is_none());
        assert!(job.skills_required.is_empty());
    }

    #[test]
    fn test_full_job_from_test_script_payload() {
        let job = request(json!({
            "title": "New Job Position",
            "description": "Job description",
            "requirements": ["Python", "FastAPI"],
            "department": "Engineering",
            "location": "Remote",
            "salary_range": {"min": 50000, "max": 100000},
            "job_type": "Full-time",
            "experience_required": 3.0,
            "skills_required": ["Python", "FastAPI", "python "],
            "status": "Open"
        }))
        .validate()
        .unwrap();
        assert_eq!(job.status, JobStatus::Open);
        assert_eq!(job.salary_min, Some(50_000.0));
        assert_eq!(job.salary_max, Some(100_000.0));
        assert_eq!(job.skills_required, vec!["Python", "FastAPI"]);
    }

    #[test]
    fn test_required_skills_alias_and_flat_salary() {
        let job = request(json!({
            "title": "Senior Python Developer",
            "description": "Looking for an experienced Python developer",
            "required_skills": ["python", "django"],
            "salary_range_min": 10.0,
            "salary_range_max": 20.0
        }))
        .validate()
        .unwrap();
        assert_eq!(job.skills_required, vec!["python", "django"]);
        assert_eq!((job.salary_min, job.salary_max), (Some(10.0), Some(20.0)));
    }

    #[test]
    fn test_invalid_jobs_rejected() {
        let long_title = "x".repeat(101);
        let cases = [
            json!({"title": "  ", "description": "d"}),
            json!({"title": long_title, "description": "d"}),
            json!({"title": "t", "description": ""}),
            json!({"title": "t", "description": "d", "experience_required": -1.0}),
            json!({"title": "t", "description": "d", "salary_range": {"min": 9, "max": 1}}),
            json!({"title": "t", "description": "d", "salary_range_min": -5.0}),
        ];
        for case in cases {
            assert!(request(case.clone()).validate().is_err(), "{case} should fail");
        }
    }

    #[test]
    fn test_filters_paging_and_skills() {
        let filters = JobFilters {
            skills: Some("Python, ,Docker".into()),
            skip: Some(-3),
            limit: Some(500),
            ..Default::default()
        };
        assert_eq!(filters.skill_list(), vec!["python", "docker"]);
        assert_eq!(filters.offset(), 0);
        assert_eq!(filters.page_limit(), 100);
        assert_eq!(JobFilters::default().page_limit(), 100);
    }

    #[test]
    fn test_status_filter_is_case_insensitive() {
        let uri: axum::http::Uri = "/jobs/?status=open&skip=5".parse().unwrap();
        let axum::extract::Query(filters) =
            axum::extract::Query::<JobFilters>::try_from_uri(&uri).unwrap();
        assert_eq!(filters.status, Some(JobStatus::Open));
        assert_eq!(filters.offset(), 5);

        let uri: axum::http::Uri = "/jobs/?status=archived".parse().unwrap();
        assert!(axum::extract::Query::<JobFilters>::try_from_uri(&uri).is_err());
    }
}
