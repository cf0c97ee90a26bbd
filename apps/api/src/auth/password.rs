use once_cell::sync::Lazy;
use regex::Regex;
use tracing::error;

use crate::errors::AppError;

pub const BCRYPT_COST: u32 = 12;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

/// Hashes a password with bcrypt. CPU-bound: call from a blocking task.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    bcrypt::hash(password, cost)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Error hashing password: {e}")))
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, hashed: &str) -> bool {
    match bcrypt::verify(password, hashed) {
        Ok(valid) => valid,
        Err(e) => {
            error!("Password verification error: {e}");
            false
        }
    }
}

/// At least 8 characters with an uppercase letter, a lowercase letter and a digit.
pub fn validate_password_strength(password: &str) -> Result<(), AppError> {
    let long_enough = password.chars().count() >= 8;
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if long_enough && has_upper && has_lower && has_digit {
        Ok(())
    } else {
        Err(AppError::Validation(
            "Password must be at least 8 characters long and contain uppercase, lowercase, and number"
                .to_string(),
        ))
    }
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    if EMAIL_RE.is_match(email.trim()) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "'{email}' is not a valid email address"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strong_password_accepted() {
        assert!(validate_password_strength("TestPassword123!").is_ok());
    }

    #[test]
    fn test_weak_passwords_rejected() {
        for weak in ["short1A", "alllowercase1", "ALLUPPERCASE1", "NoDigitsHere"] {
            assert!(
                validate_password_strength(weak).is_err(),
                "{weak} should be rejected"
            );
        }
    }

    #[test]
    fn test_hash_then_verify() {
        let hashed = hash_password("Secret123", 4).unwrap();
        assert!(hashed.starts_with("$2"));
        assert!(verify_password("Secret123", &hashed));
        assert!(!verify_password("Secret124", &hashed));
    }

    #[test]
    fn test_garbage_hash_is_mismatch() {
        assert!(!verify_password("Secret123", "not-a-bcrypt-hash"));
    }

    #[test]
    fn test_email_validation() {
        assert!(validate_email("hr@test.com").is_ok());
        assert!(validate_email("no-at-sign.example.com").is_err());
        assert!(validate_email("x@y").is_err());
    }
}
