//! Request/response DTOs shared by the REST handlers.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Immediate acknowledgement returned before fan-out starts.
///
/// The body deliberately reports only acceptance: delivery outcomes are
/// not known yet and are never reported to the event producer.
#[derive(Debug, Serialize, ToSchema)]
pub struct AckResponse {
    /// Always `"200"` on the accept path.
    pub status: String,
    /// Human-readable acceptance note.
    pub message: String,
}

impl AckResponse {
    /// The standard accept body.
    #[must_use]
    pub fn accepted() -> Self {
        Self {
            status: "200".to_string(),
            message: "accepted, processing".to_string(),
        }
    }
}

/// Verification request body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyRequest {
    /// Requesting user's platform id.
    pub user_id: String,
    /// Group the verification happens in.
    pub group_id: String,
    /// Verification code the user submitted.
    pub code: String,
    /// Mention string substituted for the authority's admin placeholder.
    #[serde(default = "default_admin_mention")]
    pub admin_mention: String,
}

fn default_admin_mention() -> String {
    "the admin team".to_string()
}

/// Verification outcome returned to the caller.
#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyResponse {
    /// Whether the user ends up verified.
    pub verified: bool,
    /// User-facing outcome message.
    pub message: String,
}

/// Group roster upsert body, posted when the bot joins a chat or the
/// chat's metadata changes.
#[derive(Debug, Deserialize, ToSchema)]
pub struct GroupUpsertRequest {
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

/// Active-group listing response.
#[derive(Debug, Serialize, ToSchema)]
pub struct GroupListResponse {
    /// Chat ids of every group the bot is currently in.
    pub chat_ids: Vec<String>,
}

/// Member-count lookup response.
#[derive(Debug, Serialize, ToSchema)]
pub struct MemberCountResponse {
    /// Queried chat id.
    pub chat_id: String,
    /// Recorded member count; null when the group never reported one.
    pub member_count: Option<i32>,
}
