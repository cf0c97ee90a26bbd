use anyhow::{bail, Context, Result};
use std::str::FromStr;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub secret_key: String,
    pub access_token_expire_minutes: i64,
    pub max_login_attempts: u32,
    pub login_timeout_minutes: u64,
    pub max_upload_bytes: usize,
    pub analytics_cache_ttl_secs: u64,
    pub shortlist_threshold: f64,
    pub match_scorer: String,
    pub cors_origins: Vec<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let secret_key = require_env("SECRET_KEY")?;
        if secret_key.trim().is_empty() {
            bail!("SECRET_KEY must not be empty");
        }

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            secret_key,
            access_token_expire_minutes: parse_env("ACCESS_TOKEN_EXPIRE_MINUTES", 30)?,
            max_login_attempts: parse_env("MAX_LOGIN_ATTEMPTS", 5)?,
            login_timeout_minutes: parse_env("LOGIN_TIMEOUT_MINUTES", 15)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 5 * 1024 * 1024)?,
            analytics_cache_ttl_secs: parse_env("ANALYTICS_CACHE_TTL_SECS", 300)?,
            shortlist_threshold: parse_env("SHORTLIST_THRESHOLD", 70.0)?,
            match_scorer: std::env::var("MATCH_SCORER")
                .unwrap_or_else(|_| "requirements".to_string()),
            cors_origins: split_origins(&std::env::var("CORS_ORIGINS").unwrap_or_default()),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_origins_trims_and_drops_empty() {
        let origins = split_origins(" http://localhost:3000, ,https://hr.example.com ");
        assert_eq!(
            origins,
            vec!["http://localhost:3000", "https://hr.example.com"]
        );
    }

    #[test]
    fn test_split_origins_empty_means_permissive() {
        assert!(split_origins("").is_empty());
    }

    #[test]
    fn test_parse_env_falls_back_to_default() {
        let value: u32 = parse_env("SCREENER_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }
}
