//! Destination resolution against the social-graph service.
//!
//! The social graph owns which channels subscribe to which lead trader
//! and which channels map to which CMS topic. This module queries it per
//! event; nothing is cached, so admin-side changes take effect on the
//! next dispatch.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::locale::Locale;

/// One resolved delivery destination for a trader-keyed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushTarget {
    /// Destination channel identifier.
    pub channel_id: i64,
    /// Sub-topic / thread identifier, empty when the channel has none.
    pub topic_id: String,
    /// Whether the rendered message carries the "more actions" link.
    pub include_link: bool,
    /// Destination display locale.
    pub locale: Locale,
}

/// One topic-mapped destination for CMS content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicDestination {
    /// Destination channel identifier.
    pub channel_id: i64,
    /// Destination display locale, inherited from the parent group.
    pub locale: Locale,
}

/// Source of delivery destinations.
///
/// The production implementation queries the social-graph service; tests
/// substitute fixed target lists.
#[async_trait]
pub trait TargetSource: Send + Sync {
    /// Resolves the channels subscribed to `trader_uid`'s copy signals.
    ///
    /// Resolution failure yields an empty list, which callers treat as
    /// "no subscribers" rather than an error.
    async fn resolve_targets(&self, trader_uid: &str) -> Vec<PushTarget>;

    /// Builds the topic name → destinations map for CMS content.
    async fn topic_destinations(&self) -> HashMap<String, Vec<TopicDestination>>;
}

/// HTTP client for the social-graph query endpoint.
#[derive(Debug, Clone)]
pub struct SocialGraphClient {
    http: reqwest::Client,
    url: String,
    brand: String,
    channel_type: String,
}

impl SocialGraphClient {
    /// Creates a client bound to one brand and channel type.
    #[must_use]
    pub fn new(http: reqwest::Client, url: String, brand: String, channel_type: String) -> Self {
        Self {
            http,
            url,
            brand,
            channel_type,
        }
    }

    async fn fetch_groups(&self) -> Result<Vec<Value>, reqwest::Error> {
        let response = self
            .http
            .post(&self.url)
            .form(&[("brand", self.brand.as_str()), ("type", self.channel_type.as_str())])
            .send()
            .await?
            .error_for_status()?;
        let body: Value = response.json().await?;
        Ok(body
            .get("data")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl TargetSource for SocialGraphClient {
    async fn resolve_targets(&self, trader_uid: &str) -> Vec<PushTarget> {
        let groups = match self.fetch_groups().await {
            Ok(groups) => groups,
            Err(error) => {
                tracing::error!(%error, trader_uid, "social graph query failed");
                return Vec::new();
            }
        };
        let targets = collect_targets(&groups, trader_uid);
        tracing::info!(trader_uid, targets = targets.len(), "resolved push targets");
        targets
    }

    async fn topic_destinations(&self) -> HashMap<String, Vec<TopicDestination>> {
        let groups = match self.fetch_groups().await {
            Ok(groups) => groups,
            Err(error) => {
                tracing::error!(%error, "social graph query failed");
                return HashMap::new();
            }
        };
        collect_topic_destinations(&groups)
    }
}

/// Keeps a chat iff it is a copy-type subscription for this trader:
/// `type == "copy"`, `enable`, matching `traderUid`, and a positive
/// integer `chatId`. A `jump` of null/empty/`"null"` means no link.
fn collect_targets(groups: &[Value], trader_uid: &str) -> Vec<PushTarget> {
    let mut targets = Vec::new();
    for group in groups {
        let group_lang = group.get("lang").and_then(Value::as_str);
        for chat in chats_of(group) {
            if chat.get("type").and_then(Value::as_str) != Some("copy")
                || chat.get("enable").and_then(Value::as_bool) != Some(true)
                || field_as_string(chat, "traderUid").as_deref() != Some(trader_uid)
            {
                continue;
            }
            let Some(channel_id) = channel_id_of(chat) else {
                tracing::warn!(trader_uid, ?chat, "skipping chat with malformed chatId");
                continue;
            };
            let jump = match field_as_string(chat, "jump") {
                None => "0".to_string(),
                Some(ref j) if j.is_empty() || j == "null" => "0".to_string(),
                Some(j) => j,
            };
            let lang = chat.get("lang").and_then(Value::as_str).or(group_lang);
            targets.push(PushTarget {
                channel_id,
                topic_id: field_as_string(chat, "topicId").unwrap_or_default(),
                include_link: jump == "1",
                locale: Locale::normalize(lang),
            });
        }
    }
    targets
}

/// Groups enabled chats by their trimmed name; locale comes from the
/// parent group.
fn collect_topic_destinations(groups: &[Value]) -> HashMap<String, Vec<TopicDestination>> {
    let mut map: HashMap<String, Vec<TopicDestination>> = HashMap::new();
    for group in groups {
        let locale = Locale::normalize(group.get("lang").and_then(Value::as_str));
        for chat in chats_of(group) {
            if chat.get("enable").and_then(Value::as_bool) != Some(true) {
                continue;
            }
            let Some(channel_id) = channel_id_of(chat) else {
                continue;
            };
            let Some(name) = chat.get("name").and_then(Value::as_str) else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            map.entry(name.to_string())
                .or_default()
                .push(TopicDestination { channel_id, locale });
        }
    }
    map
}

fn chats_of(group: &Value) -> impl Iterator<Item = &Value> {
    group
        .get("chats")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
}

fn channel_id_of(chat: &Value) -> Option<i64> {
    let id = match chat.get("chatId") {
        Some(Value::Number(n)) => n.as_i64()?,
        Some(Value::String(s)) => s.trim().parse().ok()?,
        _ => return None,
    };
    (id > 0).then_some(id)
}

fn field_as_string(chat: &Value, name: &str) -> Option<String> {
    match chat.get(name) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    fn groups() -> Vec<Value> {
        let body = json!([
            {
                "name": "Signals EN",
                "lang": "en",
                "chats": [
                    {
                        "type": "copy", "enable": true, "traderUid": "123",
                        "chatId": 111, "topicId": "t1", "jump": "1", "name": "news"
                    },
                    {
                        "type": "copy", "enable": false, "traderUid": "123",
                        "chatId": 222, "jump": "1", "name": "disabled"
                    },
                    {
                        "type": "chat", "enable": true, "traderUid": "123",
                        "chatId": 333, "name": "general"
                    }
                ]
            },
            {
                "name": "信号中文",
                "lang": "zh_CN",
                "chats": [
                    {
                        "type": "copy", "enable": true, "traderUid": 123,
                        "chatId": "444", "jump": null, "name": " news "
                    },
                    {
                        "type": "copy", "enable": true, "traderUid": "999",
                        "chatId": 555, "jump": "1", "name": "other"
                    },
                    {
                        "type": "copy", "enable": true, "traderUid": "123",
                        "chatId": "not-a-number", "jump": "1", "name": "broken"
                    }
                ]
            }
        ]);
        let Some(groups) = body.as_array() else {
            panic!("fixture must be an array");
        };
        groups.clone()
    }

    #[test]
    fn disabled_and_foreign_chats_excluded() {
        let targets = collect_targets(&groups(), "123");
        assert_eq!(targets.len(), 2);
        let ids: Vec<i64> = targets.iter().map(|t| t.channel_id).collect();
        assert_eq!(ids, vec![111, 444]);
    }

    #[test]
    fn null_jump_means_no_link() {
        let targets = collect_targets(&groups(), "123");
        let Some(linked) = targets.iter().find(|t| t.channel_id == 111) else {
            panic!("target 111 expected");
        };
        assert!(linked.include_link);
        let Some(unlinked) = targets.iter().find(|t| t.channel_id == 444) else {
            panic!("target 444 expected");
        };
        assert!(!unlinked.include_link);
        assert_eq!(unlinked.locale, Locale::ZhCn);
    }

    #[test]
    fn topic_map_groups_by_trimmed_name() {
        let map = collect_topic_destinations(&groups());
        let Some(news) = map.get("news") else {
            panic!("news topic expected");
        };
        assert_eq!(news.len(), 2);
        assert_eq!(news.iter().map(|d| d.channel_id).collect::<Vec<_>>(), vec![111, 444]);
        assert!(map.contains_key("general"));
        assert!(!map.contains_key("disabled"));
        assert!(!map.contains_key("broken"));
    }
}
