//! Failed-login throttling backed by Redis so every instance sees the same counters.

use redis::AsyncCommands;
use tracing::warn;

use crate::errors::AppError;

#[derive(Clone)]
pub struct LoginThrottle {
    client: redis::Client,
    max_attempts: u32,
    window_secs: u64,
}

impl LoginThrottle {
    pub fn new(client: redis::Client, max_attempts: u32, window_minutes: u64) -> Self {
        Self {
            client,
            max_attempts,
            window_secs: window_minutes * 60,
        }
    }

    /// Rejects with 429 while the username is locked out.
    pub async fn check(&self, username: &str) -> Result<(), AppError> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let failures: Option<u32> = con.get(failure_key(username)).await?;
        if is_locked_out(failures.unwrap_or(0), self.max_attempts) {
            warn!("Login locked out for user: {username}");
            return Err(AppError::TooManyRequests(
                "Too many failed login attempts. Please try again later.".to_string(),
            ));
        }
        Ok(())
    }

    /// Counts a failure. Each failure restarts the lockout window.
    pub async fn record_failure(&self, username: &str) -> Result<u32, AppError> {
        let key = failure_key(username);
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let (failures,): (u32,) = redis::pipe()
            .atomic()
            .incr(&key, 1)
            .cmd("EXPIRE")
            .arg(&key)
            .arg(self.window_secs)
            .ignore()
            .query_async(&mut con)
            .await?;
        Ok(failures)
    }

    pub async fn reset(&self, username: &str) -> Result<(), AppError> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        con.del::<_, ()>(failure_key(username)).await?;
        Ok(())
    }
}

fn failure_key(username: &str) -> String {
    format!("login_failures:{}", username.trim().to_lowercase())
}

fn is_locked_out(failures: u32, max_attempts: u32) -> bool {
    failures >= max_attempts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_key_normalizes_username() {
        assert_eq!(failure_key("  HR@Test.com "), "login_failures:hr@test.com");
    }

    #[test]
    fn test_lockout_starts_at_max_attempts() {
        assert!(!is_locked_out(4, 5));
        assert!(is_locked_out(5, 5));
        assert!(is_locked_out(9, 5));
    }

    #[test]
    fn test_window_is_in_seconds() {
        let client = redis::Client::open("redis://127.0.0.1:6379").unwrap();
        let throttle = LoginThrottle::new(client, 5, 15);
        assert_eq!(throttle.window_secs, 900);
    }
}
