use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account role. HR staff review candidates; admins also manage job postings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[serde(alias = "hr_manager")]
    Hr,
    #[default]
    #[serde(alias = "applicant")]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Hr => "hr",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "hr" | "hr_manager" => Ok(Role::Hr),
            "user" | "applicant" => Ok(Role::User),
            other => Err(format!("Unknown role '{other}'")),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub hashed_password: String,
    pub role: String,
    pub is_active: bool,
    pub date_created: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl UserRow {
    /// Unknown stored roles degrade to the least privileged role.
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or_default()
    }
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub is_active: bool,
    pub date_created: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<&UserRow> for UserResponse {
    fn from(row: &UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email.clone(),
            name: row.name.clone(),
            role: row.role(),
            is_active: row.is_active,
            date_created: row.date_created,
            last_login: row.last_login,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_aliases_deserialize() {
        let hr: Role = serde_json::from_str(r#""hr_manager""#).unwrap();
        assert_eq!(hr, Role::Hr);
        let user: Role = serde_json::from_str(r#""applicant""#).unwrap();
        assert_eq!(user, Role::User);
    }

    #[test]
    fn test_role_from_str_is_case_insensitive() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_unknown_stored_role_is_user() {
        let row = UserRow {
            id: 1,
            email: "a@b.co".into(),
            name: "A".into(),
            hashed_password: "x".into(),
            role: "owner".into(),
            is_active: true,
            date_created: Utc::now(),
            last_login: None,
        };
        assert_eq!(row.role(), Role::User);
        let json = serde_json::to_value(UserResponse::from(&row)).unwrap();
        assert!(json.get("hashed_password").is_none());
    }
}
