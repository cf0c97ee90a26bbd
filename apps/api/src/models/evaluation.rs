use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum EvaluationStatus {
    #[default]
    Pending,
    Shortlisted,
    Rejected,
    #[serde(rename = "Interview Scheduled")]
    InterviewScheduled,
    #[serde(rename = "Offer Extended")]
    OfferExtended,
    Hired,
}

impl EvaluationStatus {
    pub const ALL: [EvaluationStatus; 6] = [
        EvaluationStatus::Pending,
        EvaluationStatus::Shortlisted,
        EvaluationStatus::Rejected,
        EvaluationStatus::InterviewScheduled,
        EvaluationStatus::OfferExtended,
        EvaluationStatus::Hired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationStatus::Pending => "Pending",
            EvaluationStatus::Shortlisted => "Shortlisted",
            EvaluationStatus::Rejected => "Rejected",
            EvaluationStatus::InterviewScheduled => "Interview Scheduled",
            EvaluationStatus::OfferExtended => "Offer Extended",
            EvaluationStatus::Hired => "Hired",
        }
    }

    /// Status assigned by automated scoring.
    pub fn from_score(score: f64, threshold: f64) -> Self {
        if score >= threshold {
            EvaluationStatus::Shortlisted
        } else {
            EvaluationStatus::Rejected
        }
    }
}

impl fmt::Display for EvaluationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvaluationStatus {
    type Err = String;

    /// Accepts the display form as well as snake/upper case spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "pending" => Ok(EvaluationStatus::Pending),
            "shortlisted" => Ok(EvaluationStatus::Shortlisted),
            "rejected" => Ok(EvaluationStatus::Rejected),
            "interview scheduled" => Ok(EvaluationStatus::InterviewScheduled),
            "offer extended" => Ok(EvaluationStatus::OfferExtended),
            "hired" => Ok(EvaluationStatus::Hired),
            _ => Err(format!("Unknown evaluation status '{s}'")),
        }
    }
}

impl TryFrom<String> for EvaluationStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EvaluationRow {
    pub id: i64,
    pub resume_id: i64,
    pub job_id: i64,
    pub admin_id: Option<i64>,
    #[serde(rename = "suitability_score")]
    pub overall_score: f64,
    pub skill_match: f64,
    pub experience_match: f64,
    pub matching_skills: Vec<String>,
    pub status: String,
    pub comments: Option<String>,
    pub interview_date: Option<DateTime<Utc>>,
    pub interview_notes: Option<String>,
    pub offer_details: Option<Value>,
    pub rejection_reason: Option<String>,
    pub evaluation_started_at: Option<DateTime<Utc>>,
    pub evaluation_duration_secs: Option<f64>,
    #[serde(rename = "evaluation_date")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "last_updated")]
    pub updated_at: DateTime<Utc>,
}
