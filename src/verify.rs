//! User verification flow: local store first, external authority second.
//!
//! A verification request carries a code, the requesting user and the
//! group it happens in. The local store answers repeats and conflicts
//! without touching the authority; only a genuinely unknown code goes out
//! to the external service, and only its success is recorded locally.

use std::sync::Arc;

use serde_json::Value;

use crate::error::RelayError;
use crate::store::verification::{VerificationRecords, VerifyStatus};

/// Outcome of one verification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyOutcome {
    /// Whether the user ends up verified.
    pub verified: bool,
    /// Message for the requesting user, admin mention substituted and
    /// `<a>` tags stripped.
    pub message: String,
}

/// Orchestrates the verification flow against store and authority.
#[derive(Clone)]
pub struct VerificationService {
    store: Arc<dyn VerificationRecords>,
    http: reqwest::Client,
    verify_api_url: String,
    brand: String,
    channel_type: String,
}

impl std::fmt::Debug for VerificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationService")
            .field("verify_api_url", &self.verify_api_url)
            .finish_non_exhaustive()
    }
}

impl VerificationService {
    /// Wires the service to its store and the external authority.
    #[must_use]
    pub fn new(
        store: Arc<dyn VerificationRecords>,
        http: reqwest::Client,
        verify_api_url: String,
        brand: String,
        channel_type: String,
    ) -> Self {
        Self {
            store,
            http,
            verify_api_url,
            brand,
            channel_type,
        }
    }

    /// Runs the full flow for one request.
    ///
    /// `admin_mention` replaces the authority's `@{admin}` placeholder in
    /// user-facing messages.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Persistence`] on store failure and
    /// [`RelayError::Upstream`] when the authority is unreachable.
    pub async fn verify(
        &self,
        user_id: &str,
        group_id: &str,
        code: &str,
        admin_mention: &str,
    ) -> Result<VerifyOutcome, RelayError> {
        match self.store.status(user_id, group_id, code).await? {
            VerifyStatus::Warning => Ok(VerifyOutcome {
                verified: false,
                message: "this code has already been used by another user".to_string(),
            }),
            VerifyStatus::Verified => Ok(VerifyOutcome {
                verified: true,
                message: "you are already verified".to_string(),
            }),
            VerifyStatus::Reverified => Ok(VerifyOutcome {
                verified: true,
                message: "your verification has been reactivated".to_string(),
            }),
            VerifyStatus::NotVerified => {
                self.verify_external(user_id, group_id, code, admin_mention)
                    .await
            }
        }
    }

    /// Deactivates a user's verification in one group, e.g. when the
    /// user leaves. Returns whether a record existed.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Persistence`] on store failure.
    pub async fn revoke(&self, user_id: &str, group_id: &str) -> Result<bool, RelayError> {
        let revoked = self.store.deactivate(user_id, group_id).await?;
        if revoked {
            tracing::info!(user_id, group_id, "verification revoked");
        }
        Ok(revoked)
    }

    async fn verify_external(
        &self,
        user_id: &str,
        group_id: &str,
        code: &str,
        admin_mention: &str,
    ) -> Result<VerifyOutcome, RelayError> {
        let response = self
            .http
            .post(&self.verify_api_url)
            .form(&[
                ("code", code),
                ("verifyGroup", group_id),
                ("brand", self.brand.as_str()),
                ("type", self.channel_type.as_str()),
            ])
            .send()
            .await
            .map_err(|error| RelayError::Upstream(error.to_string()))?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|error| RelayError::Upstream(error.to_string()))?;

        let raw_message = body
            .get("data")
            .and_then(Value::as_str)
            .unwrap_or("Verification failed. Please try again.");
        let message = clean_authority_message(raw_message, admin_mention);

        let verified = status.is_success() && message.contains("verification successful");
        if verified {
            let fresh = self.store.upsert_active(user_id, group_id, code).await?;
            tracing::info!(user_id, group_id, fresh, "verification recorded");
        } else {
            tracing::info!(user_id, group_id, "verification declined by authority");
        }
        Ok(VerifyOutcome { verified, message })
    }
}

/// Substitutes the admin placeholder and strips `<a>`/`</a>` tags the
/// authority embeds for web rendering.
fn clean_authority_message(message: &str, admin_mention: &str) -> String {
    message
        .replace("@{admin}", admin_mention)
        .replace("<a>", "")
        .replace("</a>", "")
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// In-memory verification records mirroring the store's state
    /// machine: (group, code) → (owner, active).
    struct MemoryRecords {
        rows: Mutex<HashMap<(String, String), (String, bool)>>,
    }

    impl MemoryRecords {
        fn with(group_id: &str, code: &str, owner: &str, active: bool) -> Self {
            let mut rows = HashMap::new();
            rows.insert(
                (group_id.to_string(), code.to_string()),
                (owner.to_string(), active),
            );
            Self {
                rows: Mutex::new(rows),
            }
        }
    }

    #[async_trait]
    impl VerificationRecords for MemoryRecords {
        async fn upsert_active(
            &self,
            user_id: &str,
            group_id: &str,
            code: &str,
        ) -> Result<bool, RelayError> {
            let Ok(mut rows) = self.rows.lock() else {
                panic!("lock poisoned");
            };
            let fresh = !rows.values().any(|(owner, _)| owner.as_str() == user_id);
            rows.insert(
                (group_id.to_string(), code.to_string()),
                (user_id.to_string(), true),
            );
            Ok(fresh)
        }

        async fn status(
            &self,
            user_id: &str,
            group_id: &str,
            code: &str,
        ) -> Result<VerifyStatus, RelayError> {
            let Ok(mut rows) = self.rows.lock() else {
                panic!("lock poisoned");
            };
            let key = (group_id.to_string(), code.to_string());
            Ok(match rows.get_mut(&key) {
                Some((owner, true)) if owner.as_str() == user_id => VerifyStatus::Verified,
                Some((owner, active @ false)) if owner.as_str() == user_id => {
                    *active = true;
                    VerifyStatus::Reverified
                }
                Some((_, true)) => VerifyStatus::Warning,
                _ => VerifyStatus::NotVerified,
            })
        }

        async fn deactivate(&self, user_id: &str, group_id: &str) -> Result<bool, RelayError> {
            let Ok(mut rows) = self.rows.lock() else {
                panic!("lock poisoned");
            };
            let mut hit = false;
            for ((group, _), (owner, active)) in rows.iter_mut() {
                if group.as_str() == group_id && owner.as_str() == user_id && *active {
                    *active = false;
                    hit = true;
                }
            }
            Ok(hit)
        }
    }

    fn service(records: Arc<MemoryRecords>) -> VerificationService {
        VerificationService::new(
            records,
            reqwest::Client::new(),
            "http://127.0.0.1:1/verify".to_string(),
            "BYD".to_string(),
            "DISCORD".to_string(),
        )
    }

    #[tokio::test]
    async fn foreign_code_owner_is_a_warning() {
        let records = Arc::new(MemoryRecords::with("g1", "code", "someone-else", true));
        let Ok(outcome) = service(records).verify("u1", "g1", "code", "@mods").await else {
            panic!("verify failed");
        };
        assert!(!outcome.verified);
        assert!(outcome.message.contains("already been used"));
    }

    #[tokio::test]
    async fn exact_active_match_is_already_verified() {
        let records = Arc::new(MemoryRecords::with("g1", "code", "u1", true));
        let Ok(outcome) = service(records).verify("u1", "g1", "code", "@mods").await else {
            panic!("verify failed");
        };
        assert!(outcome.verified);
        assert!(outcome.message.contains("already verified"));
    }

    #[tokio::test]
    async fn inactive_match_is_reactivated() {
        let records = Arc::new(MemoryRecords::with("g1", "code", "u1", false));
        let svc = service(Arc::clone(&records));
        let Ok(outcome) = svc.verify("u1", "g1", "code", "@mods").await else {
            panic!("verify failed");
        };
        assert!(outcome.verified);
        assert!(outcome.message.contains("reactivated"));
        // the side effect is observable: the next call sees an active row
        let Ok(repeat) = svc.verify("u1", "g1", "code", "@mods").await else {
            panic!("verify failed");
        };
        assert!(repeat.message.contains("already verified"));
    }

    #[tokio::test]
    async fn revoke_then_reverify() {
        let records = Arc::new(MemoryRecords::with("g1", "code", "u1", true));
        let svc = service(Arc::clone(&records));
        let Ok(revoked) = svc.revoke("u1", "g1").await else {
            panic!("revoke failed");
        };
        assert!(revoked);
        let Ok(outcome) = svc.verify("u1", "g1", "code", "@mods").await else {
            panic!("verify failed");
        };
        assert!(outcome.message.contains("reactivated"));
    }

    #[test]
    fn authority_message_is_cleaned() {
        let cleaned = clean_authority_message(
            "verification successful, contact @{admin} or see <a>the guide</a>",
            "@mods",
        );
        assert_eq!(
            cleaned,
            "verification successful, contact @mods or see the guide"
        );
    }

    #[test]
    fn placeholder_absent_is_untouched() {
        assert_eq!(clean_authority_message("all good", "@mods"), "all good");
    }
}
