//! Delivery transport: the seam between rendering and the chat platform.
//!
//! [`Transport`] is the only thing the dispatcher knows about delivery.
//! The production implementation talks to the platform's bot API over
//! HTTP; tests substitute recording fakes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::RelayError;

/// A fully rendered message ready for one destination.
#[derive(Debug, Clone)]
pub struct RenderedMessage {
    /// Platform-dialect message text.
    pub text: String,
    /// Optional image attachment, rendered once and shared across targets.
    pub attachment: Option<Attachment>,
}

/// Binary attachment with its upload filename.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Upload filename, e.g. `trader.png`.
    pub filename: String,
    /// File content.
    pub bytes: Vec<u8>,
}

/// Sends one rendered message to one channel.
///
/// A failed send must never panic and must never affect sibling sends;
/// the dispatcher isolates each call in its own task.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Delivers `message` to `channel_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::DeliveryFailed`] with the destination and the
    /// transport-level cause.
    async fn send(&self, channel_id: i64, message: &RenderedMessage) -> Result<(), RelayError>;
}

/// Channel metadata returned by the bot API lookup.
#[derive(Debug, Clone)]
struct ChannelInfo {
    name: String,
    can_send: bool,
    can_attach: bool,
}

/// Cache of channel lookups keyed by channel id.
///
/// Entries are evicted explicitly via [`ChannelCache::invalidate`] when a
/// structural change event (channel rename, permission change, bot
/// removal) arrives; there is no TTL.
#[derive(Debug, Default)]
pub struct ChannelCache {
    entries: RwLock<HashMap<i64, ChannelInfo>>,
}

impl ChannelCache {
    /// Evicts one channel's cached metadata.
    pub async fn invalidate(&self, channel_id: i64) {
        self.entries.write().await.remove(&channel_id);
    }

    async fn get(&self, channel_id: i64) -> Option<ChannelInfo> {
        self.entries.read().await.get(&channel_id).cloned()
    }

    async fn put(&self, channel_id: i64, info: ChannelInfo) {
        self.entries.write().await.insert(channel_id, info);
    }

    #[cfg(test)]
    pub(crate) async fn prime(&self, channel_id: i64, name: &str) {
        self.put(
            channel_id,
            ChannelInfo {
                name: name.to_string(),
                can_send: true,
                can_attach: true,
            },
        )
        .await;
    }

    #[cfg(test)]
    pub(crate) async fn contains(&self, channel_id: i64) -> bool {
        self.entries.read().await.contains_key(&channel_id)
    }
}

/// HTTP transport against the chat platform's bot API.
#[derive(Debug, Clone)]
pub struct BotApiTransport {
    http: reqwest::Client,
    base_url: String,
    cache: Arc<ChannelCache>,
}

impl BotApiTransport {
    /// Creates a transport rooted at the bot API base URL.
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: String, cache: Arc<ChannelCache>) -> Self {
        Self {
            http,
            base_url,
            cache,
        }
    }

    async fn channel_info(&self, channel_id: i64) -> Result<ChannelInfo, RelayError> {
        if let Some(info) = self.cache.get(channel_id).await {
            return Ok(info);
        }
        let url = format!("{}/channels/{channel_id}", self.base_url);
        let response = self.http.get(&url).send().await.map_err(|error| {
            RelayError::DeliveryFailed {
                channel_id,
                reason: format!("channel lookup failed: {error}"),
            }
        })?;
        if !response.status().is_success() {
            return Err(RelayError::DeliveryFailed {
                channel_id,
                reason: format!("channel not found: {}", response.status()),
            });
        }
        let body: Value = response
            .json()
            .await
            .map_err(|error| RelayError::DeliveryFailed {
                channel_id,
                reason: format!("bad channel lookup body: {error}"),
            })?;
        let info = ChannelInfo {
            name: body
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            can_send: body
                .pointer("/permissions/send_messages")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            can_attach: body
                .pointer("/permissions/attach_files")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        };
        self.cache.put(channel_id, info.clone()).await;
        Ok(info)
    }

    async fn post_message(
        &self,
        channel_id: i64,
        text: &str,
        attachment: Option<&Attachment>,
    ) -> Result<(), RelayError> {
        let url = format!("{}/channels/{channel_id}/messages", self.base_url);
        let request = match attachment {
            Some(file) => {
                let part = reqwest::multipart::Part::bytes(file.bytes.clone())
                    .file_name(file.filename.clone());
                let form = reqwest::multipart::Form::new()
                    .text("content", text.to_string())
                    .part("file", part);
                self.http.post(&url).multipart(form)
            }
            None => self
                .http
                .post(&url)
                .json(&serde_json::json!({ "content": text })),
        };
        let response = request
            .send()
            .await
            .map_err(|error| RelayError::DeliveryFailed {
                channel_id,
                reason: format!("send failed: {error}"),
            })?;
        if !response.status().is_success() {
            return Err(RelayError::DeliveryFailed {
                channel_id,
                reason: format!("send rejected: {}", response.status()),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for BotApiTransport {
    async fn send(&self, channel_id: i64, message: &RenderedMessage) -> Result<(), RelayError> {
        let info = self.channel_info(channel_id).await?;
        if !info.can_send {
            return Err(RelayError::DeliveryFailed {
                channel_id,
                reason: "missing send permission".to_string(),
            });
        }

        // Attach permission missing is not a failure: fall back to text.
        let attachment = message.attachment.as_ref().filter(|_| info.can_attach);
        if message.attachment.is_some() && attachment.is_none() {
            tracing::warn!(channel_id, channel = %info.name, "no attach permission, sending text only");
        }

        if let Err(error) = self
            .post_message(channel_id, &message.text, attachment)
            .await
        {
            // a rejected send usually means stale channel metadata
            self.cache.invalidate(channel_id).await;
            return Err(error);
        }
        tracing::info!(channel_id, channel = %info.name, "message delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cache_invalidation_drops_entry() {
        let cache = ChannelCache::default();
        cache
            .put(
                7,
                ChannelInfo {
                    name: "signals".to_string(),
                    can_send: true,
                    can_attach: false,
                },
            )
            .await;
        assert!(cache.get(7).await.is_some());
        cache.invalidate(7).await;
        assert!(cache.get(7).await.is_none());
        // evicting an unknown channel is a no-op
        cache.invalidate(8).await;
    }
}
