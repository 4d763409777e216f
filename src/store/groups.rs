//! Group roster store: which chats the bot currently lives in.

use sqlx::PgPool;

use crate::error::RelayError;

/// Group metadata captured when the bot joins or a chat updates.
#[derive(Debug, Clone)]
pub struct GroupRecord {
    /// Platform chat identifier.
    pub chat_id: String,
    /// Chat title.
    pub title: Option<String>,
    /// Platform chat type (guild, group, channel...).
    pub group_type: String,
    /// Public username, if any.
    pub username: Option<String>,
    /// Chat description.
    pub description: Option<String>,
    /// Member count at capture time.
    pub member_count: Option<i32>,
}

/// PostgreSQL-backed group roster.
#[derive(Debug, Clone)]
pub struct GroupStore {
    pool: PgPool,
}

impl GroupStore {
    /// Creates a store over the shared connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a new group or refreshes an existing one. A rejoin clears
    /// `leave_date` and reactivates the row.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Persistence`] on database failure.
    pub async fn upsert(&self, group: &GroupRecord) -> Result<(), RelayError> {
        sqlx::query(
            "INSERT INTO groups (chat_id, title, group_type, username, description, member_count)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (chat_id) DO UPDATE SET
                 title = EXCLUDED.title,
                 group_type = EXCLUDED.group_type,
                 username = EXCLUDED.username,
                 description = EXCLUDED.description,
                 member_count = EXCLUDED.member_count,
                 is_active = TRUE,
                 join_date = NOW(),
                 leave_date = NULL",
        )
        .bind(&group.chat_id)
        .bind(&group.title)
        .bind(&group.group_type)
        .bind(&group.username)
        .bind(&group.description)
        .bind(group.member_count)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Marks a group left (bot removed), stamping `leave_date`. Returns
    /// whether a row was affected.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Persistence`] on database failure.
    pub async fn deactivate(&self, chat_id: &str) -> Result<bool, RelayError> {
        let result = sqlx::query(
            "UPDATE groups SET is_active = FALSE, leave_date = NOW() WHERE chat_id = $1",
        )
        .bind(chat_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Lists the chat ids of every active group.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Persistence`] on database failure.
    pub async fn active_chat_ids(&self) -> Result<Vec<String>, RelayError> {
        let ids = sqlx::query_scalar("SELECT chat_id FROM groups WHERE is_active = TRUE")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    /// Reads one group's recorded member count.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::NotFound`] for an unknown chat and
    /// [`RelayError::Persistence`] on database failure.
    pub async fn member_count(&self, chat_id: &str) -> Result<Option<i32>, RelayError> {
        let row: Option<Option<i32>> =
            sqlx::query_scalar("SELECT member_count FROM groups WHERE chat_id = $1")
                .bind(chat_id)
                .fetch_optional(&self.pool)
                .await?;
        row.ok_or_else(|| RelayError::NotFound(format!("unknown group: {chat_id}")))
    }
}
