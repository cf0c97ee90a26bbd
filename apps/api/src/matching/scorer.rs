//! Pluggable, trait-based match scoring that measures a resume against a job.
//!
//! `AppState` holds an `Arc<dyn MatchScorer>`, chosen at startup via `MATCH_SCORER`.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::matching::keywords::{
    first_years, max_years, mentions, technical_skills_in, unique_tokens,
};
use crate::models::job::JobRow;
use crate::models::resume::ResumeRow;

// ────────────────────────────────────────────────────────────────────────────
// Output data model (shared across all scorer backends)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub overall_score: f64,    // 0 – 100, two decimals
    pub skill_match: f64,      // 0.0 – 1.0
    pub experience_match: f64, // 0.0 – 1.0
    pub keyword_match: f64,    // 0.0 – 1.0
    pub matching_skills: Vec<String>,
    pub scorer_backend: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Implement this to swap scoring backends without touching the handlers.
#[async_trait]
pub trait MatchScorer: Send + Sync {
    async fn score(&self, job: &JobRow, resume: &ResumeRow) -> Result<MatchReport, AppError>;
}

/// Resolves the `MATCH_SCORER` setting. Unknown names fall back to `requirements`.
pub fn scorer_from_config(name: &str) -> Arc<dyn MatchScorer> {
    match name.trim().to_lowercase().as_str() {
        "keyword" => Arc::new(KeywordMatchScorer),
        "requirements" => Arc::new(RequirementsScorer),
        other => {
            tracing::warn!("Unknown MATCH_SCORER '{other}', using requirements scorer");
            Arc::new(RequirementsScorer)
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// KeywordMatchScorer
// ────────────────────────────────────────────────────────────────────────────

/// Free-text comparison of the job description against the resume text.
///
/// overall = 100 × (0.4 skill + 0.3 experience + 0.3 keyword)
pub struct KeywordMatchScorer;

#[async_trait]
impl MatchScorer for KeywordMatchScorer {
    async fn score(&self, job: &JobRow, resume: &ResumeRow) -> Result<MatchReport, AppError> {
        let job_text = job_text(job);
        Ok(keyword_match(&job_text, resume_text(resume)))
    }
}

pub fn keyword_match(job_text: &str, resume_text: &str) -> MatchReport {
    let job_skills = technical_skills_in(job_text);
    let resume_skills: HashSet<&str> = technical_skills_in(resume_text).into_iter().collect();
    let matching_skills: Vec<String> = job_skills
        .iter()
        .filter(|s| resume_skills.contains(*s))
        .map(|s| s.to_string())
        .collect();
    let skill_match = ratio(matching_skills.len(), job_skills.len());

    let experience_match = match (first_years(job_text), first_years(resume_text)) {
        (Some(required), Some(candidate)) => experience_ratio(candidate, required),
        _ => 0.0,
    };

    let keyword_match = token_overlap(job_text, resume_text);
    let overall = 100.0 * (0.4 * skill_match + 0.3 * experience_match + 0.3 * keyword_match);

    MatchReport {
        overall_score: round2(overall),
        skill_match,
        experience_match,
        keyword_match,
        matching_skills,
        scorer_backend: "keyword".to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// RequirementsScorer
// ────────────────────────────────────────────────────────────────────────────

const SKILL_WEIGHT: f64 = 0.4;
const EXPERIENCE_WEIGHT: f64 = 0.3;
const LOCATION_WEIGHT: f64 = 0.2;

/// Scores against the job's structured fields. Components the job does not
/// specify are left out and the rest re-normalised.
pub struct RequirementsScorer;

#[async_trait]
impl MatchScorer for RequirementsScorer {
    async fn score(&self, job: &JobRow, resume: &ResumeRow) -> Result<MatchReport, AppError> {
        Ok(requirements_match(job, resume))
    }
}

pub fn requirements_match(job: &JobRow, resume: &ResumeRow) -> MatchReport {
    let text = resume_text(resume);
    let mut weighted = 0.0;
    let mut applicable = 0.0;

    // Skills: explicit requirements, else vocabulary terms in the description.
    let required: Vec<String> = if job.skills_required.is_empty() {
        technical_skills_in(&job.description)
            .into_iter()
            .map(str::to_string)
            .collect()
    } else {
        job.skills_required.iter().map(|s| s.to_lowercase()).collect()
    };
    let extracted: HashSet<String> = resume
        .extracted_skills
        .iter()
        .map(|s| s.to_lowercase())
        .collect();
    let matching_skills: Vec<String> = required
        .iter()
        .filter(|skill| extracted.contains(*skill) || mentions(text, skill))
        .cloned()
        .collect();
    let skill_match = ratio(matching_skills.len(), required.len());
    if !required.is_empty() {
        weighted += SKILL_WEIGHT * skill_match;
        applicable += SKILL_WEIGHT;
    }

    let experience_match = if job.experience_required > 0.0 {
        let years = if resume.experience_years > 0.0 {
            resume.experience_years
        } else {
            max_years(text).unwrap_or(0.0)
        };
        let score = experience_ratio(years, job.experience_required);
        weighted += EXPERIENCE_WEIGHT * score;
        applicable += EXPERIENCE_WEIGHT;
        score
    } else {
        0.0
    };

    if let Some(location) = job.location.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        let matched = text.to_lowercase().contains(&location.to_lowercase());
        weighted += LOCATION_WEIGHT * if matched { 1.0 } else { 0.0 };
        applicable += LOCATION_WEIGHT;
    }

    let overall = if applicable > 0.0 {
        weighted / applicable * 100.0
    } else {
        0.0
    };

    MatchReport {
        overall_score: round2(overall),
        skill_match,
        experience_match,
        keyword_match: token_overlap(&job.description, text),
        matching_skills,
        scorer_backend: "requirements".to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn job_text(job: &JobRow) -> String {
    let mut text = format!("{}\n{}", job.title, job.description);
    for line in job.requirements.iter().chain(job.skills_required.iter()) {
        text.push('\n');
        text.push_str(line);
    }
    text
}

fn resume_text(resume: &ResumeRow) -> &str {
    resume.text_content.as_deref().unwrap_or("")
}

/// Share of unique job tokens that also occur in the resume.
fn token_overlap(job_text: &str, resume_text: &str) -> f64 {
    let job_tokens = unique_tokens(job_text);
    let resume_tokens = unique_tokens(resume_text);
    let matched = job_tokens.intersection(&resume_tokens).count();
    ratio(matched, job_tokens.len())
}

fn experience_ratio(candidate: f64, required: f64) -> f64 {
    if required <= 0.0 || candidate >= required {
        1.0
    } else {
        (candidate / required).max(0.0)
    }
}

fn ratio(matched: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        matched as f64 / total as f64
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
