use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::errors::AppError;
use crate::models::evaluation::EvaluationStatus;

/// Reviewer-entered evaluation, the body of `POST /screening/`.
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationCreate {
    pub resume_id: i64,
    pub job_id: i64,
    #[serde(alias = "overall_score")]
    pub suitability_score: f64,
    #[serde(default)]
    pub skill_match: f64,
    #[serde(default)]
    pub experience_match: f64,
    #[serde(default)]
    pub matching_skills: Vec<String>,
    pub comments: Option<String>,
    #[serde(default)]
    pub status: EvaluationStatus,
    pub interview_date: Option<DateTime<Utc>>,
    pub interview_notes: Option<String>,
    pub offer_details: Option<Value>,
    pub rejection_reason: Option<String>,
}

impl EvaluationCreate {
    pub fn validate(&self) -> Result<(), AppError> {
        check_score(self.suitability_score)?;
        check_fraction("skill_match", self.skill_match)?;
        check_fraction("experience_match", self.experience_match)
    }
}

/// Body of `PUT /screening/{id}`. Absent fields keep their stored values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvaluationUpdate {
    #[serde(alias = "overall_score")]
    pub suitability_score: Option<f64>,
    pub skill_match: Option<f64>,
    pub experience_match: Option<f64>,
    pub matching_skills: Option<Vec<String>>,
    pub comments: Option<String>,
    pub status: Option<EvaluationStatus>,
    pub interview_date: Option<DateTime<Utc>>,
    pub interview_notes: Option<String>,
    pub offer_details: Option<Value>,
    pub rejection_reason: Option<String>,
}

impl EvaluationUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(score) = self.suitability_score {
            check_score(score)?;
        }
        if let Some(value) = self.skill_match {
            check_fraction("skill_match", value)?;
        }
        if let Some(value) = self.experience_match {
            check_fraction("experience_match", value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluateRequest {
    pub resume_id: i64,
    pub job_id: i64,
}

/// Query filters for evaluation listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvaluationFilters {
    pub status: Option<String>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
}

/// Filters after validation; status is resolved to its stored spelling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedFilters {
    pub status: Option<EvaluationStatus>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
}

impl EvaluationFilters {
    pub fn validate(&self) -> Result<ValidatedFilters, AppError> {
        for (name, value) in [("min_score", self.min_score), ("max_score", self.max_score)] {
            if let Some(v) = value {
                if !(0.0..=100.0).contains(&v) {
                    return Err(AppError::Validation(format!(
                        "{name} must be between 0 and 100"
                    )));
                }
            }
        }
        let status = self
            .status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.parse::<EvaluationStatus>().map_err(AppError::Validation))
            .transpose()?;
        Ok(ValidatedFilters {
            status,
            min_score: self.min_score,
            max_score: self.max_score,
        })
    }
}

fn check_score(score: f64) -> Result<(), AppError> {
    if score.is_finite() && (0.0..=100.0).contains(&score) {
        Ok(())
    } else {
        Err(AppError::Validation(
            "suitability_score must be between 0 and 100".to_string(),
        ))
    }
}

fn check_fraction(name: &str, value: f64) -> Result<(), AppError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(AppError::Validation(format!("{name} must be between 0 and 1")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_accepts_overall_score_alias() {
        let body: EvaluationCreate = serde_json::from_value(json!({
            "resume_id": 1, "job_id": 2, "overall_score": 85.5, "comments": "Strong candidate"
        }))
        .unwrap();
        assert_eq!(body.suitability_score, 85.5);
        assert_eq!(body.status, EvaluationStatus::Pending);
        assert!(body.validate().is_ok());
    }

    #[test]
    fn test_create_rejects_out_of_range_values() {
        let mut body: EvaluationCreate = serde_json::from_value(json!({
            "resume_id": 1, "job_id": 2, "suitability_score": 101.0
        }))
        .unwrap();
        assert!(body.validate().is_err());
        body.suitability_score = 50.0;
        body.skill_match = 1.5;
        assert!(body.validate().is_err());
    }

    #[test]
    fn test_update_status_uses_display_names() {
        let update: EvaluationUpdate =
            serde_json::from_value(json!({"status": "Interview Scheduled"})).unwrap();
        assert_eq!(update.status, Some(EvaluationStatus::InterviewScheduled));
        assert!(update.validate().is_ok());
    }

    #[test]
    fn test_filters_validation() {
        let ok = EvaluationFilters {
            status: Some("shortlisted".into()),
            min_score: Some(0.0),
            max_score: Some(100.0),
        }
        .validate()
        .unwrap();
        assert_eq!(ok.status, Some(EvaluationStatus::Shortlisted));

        let bad_score = EvaluationFilters {
            min_score: Some(-1.0),
            ..Default::default()
        };
        assert!(bad_score.validate().is_err());

        let bad_status = EvaluationFilters {
            status: Some("maybe".into()),
            ..Default::default()
        };
        assert!(bad_status.validate().is_err());
        assert_eq!(
            EvaluationFilters::default().validate().unwrap(),
            ValidatedFilters::default()
        );
    }
}
