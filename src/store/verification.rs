//! Verification record store.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::RelayError;

/// Local verification state for a (user, group, code) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyStatus {
    /// An active record matches exactly.
    Verified,
    /// An inactive record matched and was flipped back to active.
    Reverified,
    /// A different user already holds this (group, code) actively.
    Warning,
    /// No local record; the external authority must decide.
    NotVerified,
}

/// Verification record access, as seen by the verification flow.
///
/// The production implementation is [`VerificationStore`]; tests use
/// in-memory fakes.
#[async_trait]
pub trait VerificationRecords: Send + Sync {
    /// Records a successful verification. Returns `true` for a fresh
    /// insert, `false` for an update of the user's existing row.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Persistence`] on store failure.
    async fn upsert_active(
        &self,
        user_id: &str,
        group_id: &str,
        code: &str,
    ) -> Result<bool, RelayError>;

    /// Reports the local verification state of a (user, group, code)
    /// triple. May reactivate a matching inactive row as a side effect.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Persistence`] on store failure.
    async fn status(
        &self,
        user_id: &str,
        group_id: &str,
        code: &str,
    ) -> Result<VerifyStatus, RelayError>;

    /// Deactivates a user's verification in one group. Returns whether a
    /// row was affected.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Persistence`] on store failure.
    async fn deactivate(&self, user_id: &str, group_id: &str) -> Result<bool, RelayError>;
}

/// PostgreSQL-backed verification store.
#[derive(Debug, Clone)]
pub struct VerificationStore {
    pool: PgPool,
}

impl VerificationStore {
    /// Creates a store over the shared connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerificationRecords for VerificationStore {
    async fn upsert_active(
        &self,
        user_id: &str,
        group_id: &str,
        code: &str,
    ) -> Result<bool, RelayError> {
        let mut tx = self.pool.begin().await?;
        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM verified_users WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;
        let fresh = match existing {
            Some(id) => {
                sqlx::query(
                    "UPDATE verified_users
                     SET verify_group_id = $1, verify_code = $2,
                         verified_at = NOW(), is_active = TRUE
                     WHERE id = $3",
                )
                .bind(group_id)
                .bind(code)
                .bind(id)
                .execute(&mut *tx)
                .await?;
                false
            }
            None => {
                sqlx::query(
                    "INSERT INTO verified_users (user_id, verify_group_id, verify_code)
                     VALUES ($1, $2, $3)",
                )
                .bind(user_id)
                .bind(group_id)
                .bind(code)
                .execute(&mut *tx)
                .await?;
                true
            }
        };
        tx.commit().await?;
        Ok(fresh)
    }

    // Reactivation is an intentional side effect: an inactive row that
    // matches the caller exactly is flipped back to active.
    async fn status(
        &self,
        user_id: &str,
        group_id: &str,
        code: &str,
    ) -> Result<VerifyStatus, RelayError> {
        let mut tx = self.pool.begin().await?;
        let record: Option<(String, bool)> = sqlx::query_as(
            "SELECT user_id, is_active FROM verified_users
             WHERE verify_group_id = $1 AND verify_code = $2",
        )
        .bind(group_id)
        .bind(code)
        .fetch_optional(&mut *tx)
        .await?;

        let status = match record {
            Some((owner, true)) if owner == user_id => VerifyStatus::Verified,
            Some((owner, false)) if owner == user_id => {
                sqlx::query(
                    "UPDATE verified_users SET is_active = TRUE, verified_at = NOW()
                     WHERE verify_group_id = $1 AND verify_code = $2 AND user_id = $3",
                )
                .bind(group_id)
                .bind(code)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
                VerifyStatus::Reverified
            }
            Some((_, true)) => VerifyStatus::Warning,
            Some((_, false)) | None => VerifyStatus::NotVerified,
        };
        tx.commit().await?;
        Ok(status)
    }

    async fn deactivate(&self, user_id: &str, group_id: &str) -> Result<bool, RelayError> {
        let result = sqlx::query(
            "UPDATE verified_users SET is_active = FALSE
             WHERE user_id = $1 AND verify_group_id = $2",
        )
        .bind(user_id)
        .bind(group_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
