//! Axum route handlers for analytics reports.

use axum::{extract::State, Json};
use chrono::Utc;

use crate::analytics::cache::{AnalyticsCache, DASHBOARD_KEY, DEPARTMENTS_KEY, SKILLS_KEY};
use crate::analytics::service::{
    self, DashboardAnalytics, DepartmentAnalytics, HiringQuery, HiringTrends, JobAnalytics,
    SkillTrends,
};
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::extractors::{AppPath, AppQuery};
use crate::state::AppState;

fn cache(state: &AppState) -> AnalyticsCache {
    AnalyticsCache::new(state.redis.clone(), state.config.analytics_cache_ttl_secs)
}

/// GET /analytics/dashboard
pub async fn handle_dashboard(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<DashboardAnalytics>, AppError> {
    current.require_staff("view analytics")?;
    let db = state.db.clone();
    let report = cache(&state)
        .get_or_compute(DASHBOARD_KEY, || async move { service::dashboard(&db).await })
        .await?;
    Ok(Json(report))
}

/// GET /analytics/jobs/:id
pub async fn handle_job(
    State(state): State<AppState>,
    current: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> Result<Json<JobAnalytics>, AppError> {
    current.require_staff("view analytics")?;
    Ok(Json(service::job_analytics(&state.db, id).await?))
}

/// GET /analytics/skills
pub async fn handle_skills(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<SkillTrends>, AppError> {
    current.require_staff("view analytics")?;
    let db = state.db.clone();
    let report = cache(&state)
        .get_or_compute(SKILLS_KEY, || async move {
            service::skill_trends(&db, Utc::now()).await
        })
        .await?;
    Ok(Json(report))
}

/// GET /analytics/departments
pub async fn handle_departments(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<DepartmentAnalytics>>, AppError> {
    current.require_staff("view analytics")?;
    let db = state.db.clone();
    let report = cache(&state)
        .get_or_compute(DEPARTMENTS_KEY, || async move {
            service::department_analytics(&db).await
        })
        .await?;
    Ok(Json(report))
}

/// GET /analytics/hiring
pub async fn handle_hiring(
    State(state): State<AppState>,
    current: CurrentUser,
    AppQuery(query): AppQuery<HiringQuery>,
) -> Result<Json<HiringTrends>, AppError> {
    current.require_staff("view analytics")?;
    Ok(Json(service::hiring_trends(&state.db, &query, Utc::now()).await?))
}
