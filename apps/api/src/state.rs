use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use redis::Client as RedisClient;
use sqlx::PgPool;

use crate::config::Config;
use crate::matching::scorer::MatchScorer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Login throttling counters and the analytics cache.
    pub redis: RedisClient,
    pub s3: S3Client,
    pub config: Config,
    /// Pluggable resume scorer. Selected at startup via MATCH_SCORER.
    pub scorer: Arc<dyn MatchScorer>,
}
