//! Analytics aggregation. Queries gather raw counts; the shaping into buckets,
//! rankings and daily series happens in pure functions below.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::errors::AppError;
use crate::matching::scorer::round2;
use crate::models::evaluation::EvaluationStatus;
use crate::models::job::JobStatus;

pub const TOP_SKILLS: usize = 10;
pub const SKILL_TREND_DAYS: i64 = 30;
pub const MAX_HIRING_RANGE_DAYS: i64 = 366;

const SCORE_EDGES: [f64; 6] = [0.0, 20.0, 40.0, 60.0, 80.0, 100.0];
const MATCH_EDGES: [f64; 6] = [0.0, 0.2, 0.4, 0.6, 0.8, 1.0];

// ────────────────────────────────────────────────────────────────────────────
// Response models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub range: String,
    pub count: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobAnalytics {
    pub job_id: i64,
    pub job_title: String,
    pub total_evaluations: i64,
    pub average_score: f64,
    pub score_distribution: Vec<Bucket>,
    pub skill_match_distribution: Vec<Bucket>,
    pub experience_match_distribution: Vec<Bucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillCount {
    pub skill: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillsAnalytics {
    pub top_job_skills: Vec<SkillCount>,
    pub top_resume_skills: Vec<SkillCount>,
    pub total_unique_skills: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillTrends {
    pub timeframe: String,
    pub skills: Vec<SkillCount>,
    pub skills_analytics: SkillsAnalytics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DepartmentAnalytics {
    pub department: String,
    pub total_jobs: i64,
    pub open_jobs: i64,
    pub closed_jobs: i64,
    pub filled_jobs: i64,
    pub total_applicants: i64,
    /// Mean days from posting to close, over closed jobs only.
    pub avg_time_to_fill: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardAnalytics {
    pub total_jobs: i64,
    pub job_status_distribution: BTreeMap<String, i64>,
    pub total_applicants: i64,
    pub shortlisted_applicants: i64,
    pub rejected_applicants: i64,
    pub applicant_status_distribution: BTreeMap<String, i64>,
    pub department_analytics: Vec<DepartmentAnalytics>,
    pub skills_analytics: SkillsAnalytics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTrend {
    pub date: NaiveDate,
    pub applications: i64,
    pub shortlisted: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiringTrends {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub department: Option<String>,
    pub trends: Vec<DailyTrend>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HiringQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub department: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Pure shaping
// ────────────────────────────────────────────────────────────────────────────

/// Index of the bucket holding `value`. The first bucket is closed on both ends,
/// the rest are open on the left, so every value in range lands exactly once.
fn bucket_index(value: f64, edges: &[f64]) -> Option<usize> {
    let (first, last) = (*edges.first()?, *edges.last()?);
    if !(first..=last).contains(&value) {
        return None;
    }
    (0..edges.len() - 1).find(|&i| {
        let (lo, hi) = (edges[i], edges[i + 1]);
        (if i == 0 { value >= lo } else { value > lo }) && value <= hi
    })
}

pub fn distribution(values: &[f64], edges: &[f64], label: fn(f64) -> String) -> Vec<Bucket> {
    if values.is_empty() || edges.len() < 2 {
        return Vec::new();
    }
    let mut counts = vec![0_i64; edges.len() - 1];
    for value in values {
        if let Some(i) = bucket_index(*value, edges) {
            counts[i] += 1;
        }
    }
    let total = values.len() as f64;
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| Bucket {
            range: format!("{}-{}", label(edges[i]), label(edges[i + 1])),
            count,
            percentage: round2(count as f64 / total * 100.0),
        })
        .collect()
}

fn score_label(edge: f64) -> String {
    format!("{edge:.0}")
}

fn match_label(edge: f64) -> String {
    format!("{edge:.1}")
}

/// Builds the per-job report from `(overall_score, skill_match, experience_match)` rows.
pub fn summarize_job(job_id: i64, job_title: String, rows: &[(f64, f64, f64)]) -> JobAnalytics {
    let scores: Vec<f64> = rows.iter().map(|r| r.0).collect();
    let skills: Vec<f64> = rows.iter().map(|r| r.1).collect();
    let experience: Vec<f64> = rows.iter().map(|r| r.2).collect();
    let average_score = if scores.is_empty() {
        0.0
    } else {
        round2(scores.iter().sum::<f64>() / scores.len() as f64)
    };

    JobAnalytics {
        job_id,
        job_title,
        total_evaluations: rows.len() as i64,
        average_score,
        score_distribution: distribution(&scores, &SCORE_EDGES, score_label),
        skill_match_distribution: distribution(&skills, &MATCH_EDGES, match_label),
        experience_match_distribution: distribution(&experience, &MATCH_EDGES, match_label),
    }
}

/// Case-insensitive occurrence counts, highest first, ties alphabetical.
pub fn top_counts(skills: &[String], limit: usize) -> Vec<SkillCount> {
    let mut counts: HashMap<String, i64> = HashMap::new();
    for skill in skills {
        let skill = skill.trim().to_lowercase();
        if !skill.is_empty() {
            *counts.entry(skill).or_default() += 1;
        }
    }
    let mut ranked: Vec<SkillCount> = counts
        .into_iter()
        .map(|(skill, count)| SkillCount { skill, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.skill.cmp(&b.skill)));
    ranked.truncate(limit);
    ranked
}

pub fn skills_summary(job_skills: &[String], resume_skills: &[String]) -> SkillsAnalytics {
    let unique: HashSet<String> = job_skills
        .iter()
        .chain(resume_skills)
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    SkillsAnalytics {
        top_job_skills: top_counts(job_skills, TOP_SKILLS),
        top_resume_skills: top_counts(resume_skills, TOP_SKILLS),
        total_unique_skills: unique.len(),
    }
}

/// Every known status with its count; statuses with no rows report zero.
pub fn status_distribution<'a>(
    statuses: impl IntoIterator<Item = &'a str>,
    rows: &[(String, i64)],
) -> BTreeMap<String, i64> {
    let mut dist: BTreeMap<String, i64> = statuses.into_iter().map(|s| (s.to_string(), 0)).collect();
    for (status, count) in rows {
        *dist.entry(status.clone()).or_default() += count;
    }
    dist
}

/// One entry per calendar day in `[start, end]`, zero-filled.
pub fn daily_series(
    start: NaiveDate,
    end: NaiveDate,
    applications: &[(NaiveDate, i64)],
    shortlisted: &[(NaiveDate, i64)],
) -> Vec<DailyTrend> {
    let applications: HashMap<NaiveDate, i64> = applications.iter().copied().collect();
    let shortlisted: HashMap<NaiveDate, i64> = shortlisted.iter().copied().collect();
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(|date| DailyTrend {
            date,
            applications: applications.get(&date).copied().unwrap_or(0),
            shortlisted: shortlisted.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

impl HiringQuery {
    /// Resolves defaults (last 30 days) and rejects inverted or oversized ranges.
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
        let end = self.end_date.unwrap_or(now);
        let start = self
            .start_date
            .unwrap_or_else(|| end - Duration::days(SKILL_TREND_DAYS));
        if start > end {
            return Err(AppError::Validation(
                "start_date must not be after end_date".to_string(),
            ));
        }
        if end - start > Duration::days(MAX_HIRING_RANGE_DAYS) {
            return Err(AppError::Validation(format!(
                "date range cannot exceed {MAX_HIRING_RANGE_DAYS} days"
            )));
        }
        Ok((start, end))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Queries
// ────────────────────────────────────────────────────────────────────────────

pub async fn job_analytics(pool: &PgPool, job_id: i64) -> Result<JobAnalytics, AppError> {
    let title: String = sqlx::query_scalar("SELECT title FROM jobs WHERE id = $1")
        .bind(job_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;

    let rows: Vec<(f64, f64, f64)> = sqlx::query_as(
        r#"
        SELECT overall_score, skill_match, experience_match
        FROM candidate_evaluations
        WHERE job_id = $1
        "#,
    )
    .bind(job_id)
    .fetch_all(pool)
    .await?;

    Ok(summarize_job(job_id, title, &rows))
}

async fn job_skills(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT unnest(skills_required) FROM jobs")
        .fetch_all(pool)
        .await
}

async fn resume_skills(
    pool: &PgPool,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT unnest(extracted_skills) FROM resumes
        WHERE ($1::TIMESTAMPTZ IS NULL OR upload_date >= $1)
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await
}

pub async fn skills_analytics(pool: &PgPool) -> Result<SkillsAnalytics, AppError> {
    let jobs = job_skills(pool).await?;
    let resumes = resume_skills(pool, None).await?;
    Ok(skills_summary(&jobs, &resumes))
}

pub async fn skill_trends(pool: &PgPool, now: DateTime<Utc>) -> Result<SkillTrends, AppError> {
    let recent = resume_skills(pool, Some(now - Duration::days(SKILL_TREND_DAYS))).await?;
    Ok(SkillTrends {
        timeframe: format!("Last {SKILL_TREND_DAYS} days"),
        skills: top_counts(&recent, TOP_SKILLS),
        skills_analytics: skills_analytics(pool).await?,
    })
}

pub async fn department_analytics(pool: &PgPool) -> Result<Vec<DepartmentAnalytics>, AppError> {
    let rows = sqlx::query_as::<_, DepartmentAnalytics>(
        r#"
        SELECT
            j.department AS department,
            COUNT(*) AS total_jobs,
            COUNT(*) FILTER (WHERE j.status = 'Open') AS open_jobs,
            COUNT(*) FILTER (WHERE j.status = 'Closed') AS closed_jobs,
            COUNT(*) FILTER (WHERE j.status = 'Filled') AS filled_jobs,
            COALESCE(SUM(rc.applicants), 0)::BIGINT AS total_applicants,
            COALESCE(
                AVG(EXTRACT(EPOCH FROM (j.closed_at - j.created_at)) / 86400.0)
                    FILTER (WHERE j.closed_at IS NOT NULL),
                0
            )::DOUBLE PRECISION AS avg_time_to_fill
        FROM jobs j
        LEFT JOIN (
            SELECT job_id, COUNT(*) AS applicants FROM resumes GROUP BY job_id
        ) rc ON rc.job_id = j.id
        WHERE j.department IS NOT NULL AND j.department <> ''
        GROUP BY j.department
        ORDER BY j.department
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn dashboard(pool: &PgPool) -> Result<DashboardAnalytics, AppError> {
    let job_rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) FROM jobs GROUP BY status")
            .fetch_all(pool)
            .await?;
    let evaluation_rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) FROM candidate_evaluations GROUP BY status")
            .fetch_all(pool)
            .await?;
    let total_applicants: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applicants")
        .fetch_one(pool)
        .await?;

    let job_status_distribution =
        status_distribution(JobStatus::ALL.iter().map(|s| s.as_str()), &job_rows);
    let applicant_status_distribution =
        status_distribution(EvaluationStatus::ALL.iter().map(|s| s.as_str()), &evaluation_rows);

    Ok(DashboardAnalytics {
        total_jobs: job_rows.iter().map(|(_, n)| n).sum(),
        shortlisted_applicants: applicant_status_distribution
            .get(EvaluationStatus::Shortlisted.as_str())
            .copied()
            .unwrap_or(0),
        rejected_applicants: applicant_status_distribution
            .get(EvaluationStatus::Rejected.as_str())
            .copied()
            .unwrap_or(0),
        job_status_distribution,
        total_applicants,
        applicant_status_distribution,
        department_analytics: department_analytics(pool).await?,
        skills_analytics: skills_analytics(pool).await?,
    })
}

pub async fn hiring_trends(
    pool: &PgPool,
    query: &HiringQuery,
    now: DateTime<Utc>,
) -> Result<HiringTrends, AppError> {
    let (start, end) = query.resolve(now)?;
    let department = query
        .department
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    let applications: Vec<(NaiveDate, i64)> = sqlx::query_as(
        r#"
        SELECT (r.upload_date AT TIME ZONE 'UTC')::DATE AS day, COUNT(*)
        FROM resumes r
        JOIN jobs j ON j.id = r.job_id
        WHERE r.upload_date BETWEEN $1 AND $2
          AND ($3::TEXT IS NULL OR j.department = $3)
        GROUP BY 1
        "#,
    )
    .bind(start)
    .bind(end)
    .bind(&department)
    .fetch_all(pool)
    .await?;

    let shortlisted: Vec<(NaiveDate, i64)> = sqlx::query_as(
        r#"
        SELECT (e.updated_at AT TIME ZONE 'UTC')::DATE AS day, COUNT(*)
        FROM candidate_evaluations e
        JOIN jobs j ON j.id = e.job_id
        WHERE e.status = $4
          AND e.updated_at BETWEEN $1 AND $2
          AND ($3::TEXT IS NULL OR j.department = $3)
        GROUP BY 1
        "#,
    )
    .bind(start)
    .bind(end)
    .bind(&department)
    .bind(EvaluationStatus::Shortlisted.as_str())
    .fetch_all(pool)
    .await?;

    Ok(HiringTrends {
        start_date: start,
        end_date: end,
        trends: daily_series(start.date_naive(), end.date_naive(), &applications, &shortlisted),
        department,
    })
}
