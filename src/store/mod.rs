//! Persistence layer: PostgreSQL group roster and verification records.
//!
//! Two tables, `groups` and `verified_users`, accessed through
//! `sqlx::PgPool`. Each operation runs in its own transaction; the schema
//! is created idempotently at startup so a fresh database needs no manual
//! migration step.

pub mod groups;
pub mod verification;

use sqlx::PgPool;

use crate::error::RelayError;

/// Creates both tables (and supporting indexes) when absent.
///
/// # Errors
///
/// Returns [`RelayError::Persistence`] on database failure.
pub async fn init_schema(pool: &PgPool) -> Result<(), RelayError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS groups (
            id BIGSERIAL PRIMARY KEY,
            chat_id VARCHAR(50) UNIQUE NOT NULL,
            title VARCHAR(255),
            group_type VARCHAR(50) NOT NULL,
            username VARCHAR(255),
            description VARCHAR(500),
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            join_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            leave_date TIMESTAMPTZ,
            member_count INTEGER
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS verified_users (
            id BIGSERIAL PRIMARY KEY,
            user_id VARCHAR(50) UNIQUE NOT NULL,
            verify_group_id VARCHAR(50) NOT NULL,
            verify_code VARCHAR(50) NOT NULL,
            verified_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            is_active BOOLEAN NOT NULL DEFAULT TRUE
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_verified_users_group_code
         ON verified_users (verify_group_id, verify_code)",
    )
    .execute(pool)
    .await?;

    tracing::info!("database schema ready");
    Ok(())
}
