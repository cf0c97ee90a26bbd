use sqlx::PgPool;

use crate::models::user::{Role, UserRow};

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE lower(email) = lower($1)")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn insert_user(
    pool: &PgPool,
    email: &str,
    name: &str,
    hashed_password: &str,
    role: Role,
) -> Result<UserRow, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (email, name, hashed_password, role, is_active)
        VALUES ($1, $2, $3, $4, TRUE)
        RETURNING *
        "#,
    )
    .bind(email)
    .bind(name)
    .bind(hashed_password)
    .bind(role.as_str())
    .fetch_one(pool)
    .await
}

pub async fn touch_last_login(pool: &PgPool, user_id: i64) -> Result<UserRow, sqlx::Error> {
    sqlx::query_as::<_, UserRow>("UPDATE users SET last_login = NOW() WHERE id = $1 RETURNING *")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

pub async fn deactivate(pool: &PgPool, user_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
