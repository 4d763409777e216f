//! Scheduled CMS ingestion: poll the content queue, fan out, mark published.
//!
//! The loop is deliberately stateless between ticks. The topic map is
//! rebuilt fresh every tick, destinations are delivered one after another
//! in order, and the published flag follows the final destination's
//! outcome: a trailing failure keeps the whole item queued and the next
//! tick re-sends it to every destination, including the ones that already
//! accepted it (whole-item at-least-once).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::dispatch::fetch_image;
use crate::error::RelayError;
use crate::locale::Locale;
use crate::social::TargetSource;
use crate::transport::{RenderedMessage, Transport};

/// One unpublished CMS item.
#[derive(Debug, Clone)]
pub struct ContentItem {
    /// Queue-side identifier, used to mark the item published.
    pub id: i64,
    /// Topic routing key, matched against chat names after trimming.
    pub topic_name: String,
    /// Default-locale body.
    pub content: String,
    /// Pre-translated bodies keyed by locale tag.
    pub translations: Option<HashMap<String, String>>,
    /// Optional image URL.
    pub image: Option<String>,
}

/// The CMS content queue.
#[async_trait]
pub trait ContentQueue: Send + Sync {
    /// Lists items awaiting publication. Errors degrade to an empty list.
    async fn unpublished(&self) -> Vec<ContentItem>;

    /// Marks one item as published.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Upstream`] when the queue rejects the update;
    /// the item will be retried on the next tick.
    async fn mark_published(&self, id: i64) -> Result<(), RelayError>;
}

/// HTTP implementation of [`ContentQueue`].
#[derive(Debug, Clone)]
pub struct HttpContentQueue {
    http: reqwest::Client,
    base_url: String,
}

impl HttpContentQueue {
    /// Creates a queue client rooted at the content API base URL.
    #[must_use]
    pub const fn new(http: reqwest::Client, base_url: String) -> Self {
        Self { http, base_url }
    }
}

#[async_trait]
impl ContentQueue for HttpContentQueue {
    async fn unpublished(&self) -> Vec<ContentItem> {
        let body: Value = match self.http.get(&self.base_url).send().await {
            Ok(response) => match response.error_for_status() {
                Ok(response) => match response.json().await {
                    Ok(body) => body,
                    Err(error) => {
                        tracing::error!(%error, "content queue returned a bad body");
                        return Vec::new();
                    }
                },
                Err(error) => {
                    tracing::error!(%error, "content queue rejected the listing");
                    return Vec::new();
                }
            },
            Err(error) => {
                tracing::error!(%error, "content queue unreachable");
                return Vec::new();
            }
        };
        body.pointer("/data/items")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(parse_item).collect())
            .unwrap_or_default()
    }

    async fn mark_published(&self, id: i64) -> Result<(), RelayError> {
        let url = format!("{}/status", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "id": id, "status": 1 }))
            .send()
            .await
            .map_err(|error| RelayError::Upstream(error.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(RelayError::Upstream(format!(
                "mark-published rejected: {}",
                response.status()
            )))
        }
    }
}

fn parse_item(value: &Value) -> Option<ContentItem> {
    let id = value.get("id").and_then(Value::as_i64)?;
    let topic_name = value.get("topic_name").and_then(Value::as_str)?.to_string();
    let content = value
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or("No Content")
        .to_string();
    let translations = value.get("translations").and_then(Value::as_object).map(|m| {
        m.iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect()
    });
    let image = value
        .get("image")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    Some(ContentItem {
        id,
        topic_name,
        content,
        translations,
        image,
    })
}

/// Periodic publisher driving [`ContentQueue`] items to topic channels.
pub struct IngestLoop {
    queue: Arc<dyn ContentQueue>,
    targets: Arc<dyn TargetSource>,
    transport: Arc<dyn Transport>,
    http: reqwest::Client,
}

impl std::fmt::Debug for IngestLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestLoop").finish_non_exhaustive()
    }
}

impl IngestLoop {
    /// Wires the loop to its collaborators.
    #[must_use]
    pub fn new(
        queue: Arc<dyn ContentQueue>,
        targets: Arc<dyn TargetSource>,
        transport: Arc<dyn Transport>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            queue,
            targets,
            transport,
            http,
        }
    }

    /// Spawns the ticker task. The first tick fires after one full
    /// interval, not immediately.
    pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.tick().await;
            }
        })
    }

    /// Runs one ingestion pass.
    pub async fn tick(&self) {
        let items = self.queue.unpublished().await;
        if items.is_empty() {
            return;
        }
        tracing::info!(items = items.len(), "processing unpublished content");

        // Fresh every tick so admin-side topic changes apply immediately.
        let topic_map = self.targets.topic_destinations().await;

        for item in items {
            self.publish_item(&item, &topic_map).await;
        }
    }

    async fn publish_item(
        &self,
        item: &ContentItem,
        topic_map: &HashMap<String, Vec<crate::social::TopicDestination>>,
    ) {
        let Some(destinations) = topic_map.get(item.topic_name.trim()) else {
            tracing::warn!(item = item.id, topic = %item.topic_name, "no matching channel for topic");
            return;
        };

        // One download shared across destinations; failure means text-only.
        let attachment = match &item.image {
            Some(url) => fetch_image(&self.http, url).await,
            None => None,
        };

        // Sequential on purpose: the published flag mirrors the outcome of
        // the last delivery attempt, which needs a defined order.
        let mut delivered = 0_usize;
        let mut last_succeeded = false;
        for destination in destinations {
            let message = RenderedMessage {
                text: localized_content(
                    &item.content,
                    item.translations.as_ref(),
                    destination.locale,
                ),
                attachment: attachment.clone(),
            };
            match self.transport.send(destination.channel_id, &message).await {
                Ok(()) => {
                    delivered += 1;
                    last_succeeded = true;
                }
                Err(error) => {
                    last_succeeded = false;
                    tracing::error!(item = item.id, channel_id = destination.channel_id, %error, "content delivery failed");
                }
            }
        }

        if !last_succeeded {
            tracing::warn!(
                item = item.id,
                delivered,
                "final delivery attempt failed, leaving unpublished"
            );
            return;
        }
        match self.queue.mark_published(item.id).await {
            Ok(()) => {
                tracing::info!(item = item.id, delivered, total = destinations.len(), "content published");
            }
            Err(error) => {
                tracing::error!(item = item.id, %error, "mark-published failed, item will repeat");
            }
        }
    }
}

/// Picks the destination-locale body, converts its inline markup and
/// appends the machine-translation disclaimer for non-default locales.
///
/// Translation keys are matched after locale normalization, so wire forms
/// like `zh_CN` and `zh-cn` both hit `ZhCn`. Fallback order: destination
/// locale, default locale, raw content.
#[must_use]
pub fn localized_content(
    content: &str,
    translations: Option<&HashMap<String, String>>,
    locale: Locale,
) -> String {
    let picked = translations
        .and_then(|map| translation_for(map, locale).or_else(|| translation_for(map, Locale::En)))
        .unwrap_or(content);
    let mut text = convert_markup(picked);
    if !locale.is_default() {
        text.push('\n');
        text.push_str(disclaimer(locale));
    }
    text
}

fn translation_for(map: &HashMap<String, String>, locale: Locale) -> Option<&str> {
    map.iter()
        .find(|(key, body)| Locale::normalize(Some(key.as_str())) == locale && !body.is_empty())
        .map(|(_, body)| body.as_str())
}

const fn disclaimer(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "~~~Automatically translated by AI. For reference only.~~~",
        Locale::ZhCn | Locale::ZhTw => "~~~由 AI 自動翻譯，僅供參考~~~",
    }
}

/// Converts inline `<b>`, `<i>` and `<a href="…">` markup to the platform
/// dialect and backslash-escapes formatting characters in the plain text.
#[must_use]
pub fn convert_markup(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(open) = rest.find('<') {
        let (plain, tagged) = rest.split_at(open);
        escape_plain(&mut out, plain);
        match consume_tag(tagged) {
            Some((replacement, remainder)) => {
                out.push_str(&replacement);
                rest = remainder;
            }
            None => {
                // not a tag we know; keep the bracket literally
                out.push('<');
                rest = tagged.get(1..).unwrap_or("");
            }
        }
    }
    escape_plain(&mut out, rest);
    out
}

fn escape_plain(out: &mut String, text: &str) {
    for c in text.chars() {
        if matches!(c, '*' | '_' | '`' | '[' | ']') {
            out.push('\\');
        }
        out.push(c);
    }
}

/// Parses one supported tag at the start of `input` (which begins with
/// `<`) and returns the converted text plus the remaining input.
fn consume_tag(input: &str) -> Option<(String, &str)> {
    for (open, close, wrap) in [("<b>", "</b>", "**"), ("<i>", "</i>", "*")] {
        if let Some(after_open) = input.strip_prefix(open) {
            let end = after_open.find(close)?;
            let inner = after_open.get(..end)?;
            let rest = after_open.get(end + close.len()..)?;
            let mut body = String::new();
            escape_plain(&mut body, inner);
            return Some((format!("{wrap}{body}{wrap}"), rest));
        }
    }
    if let Some(after_open) = input.strip_prefix("<a href=\"") {
        let href_end = after_open.find('"')?;
        let url = after_open.get(..href_end)?;
        let after_href = after_open.get(href_end..)?.strip_prefix("\">")?;
        let text_end = after_href.find("</a>")?;
        let text = after_href.get(..text_end)?;
        let rest = after_href.get(text_end + 4..)?;
        return Some((format!("[{text}]({url})"), rest));
    }
    None
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::dispatch::tests::RecordingTransport;
    use crate::social::{PushTarget, TopicDestination};

    struct FixedQueue {
        items: Vec<ContentItem>,
        published: Mutex<Vec<i64>>,
        reject_marks: bool,
    }

    impl FixedQueue {
        fn new(items: Vec<ContentItem>) -> Self {
            Self {
                items,
                published: Mutex::new(Vec::new()),
                reject_marks: false,
            }
        }
    }

    #[async_trait]
    impl ContentQueue for FixedQueue {
        async fn unpublished(&self) -> Vec<ContentItem> {
            self.items.clone()
        }

        async fn mark_published(&self, id: i64) -> Result<(), RelayError> {
            if self.reject_marks {
                return Err(RelayError::Upstream("rejected".to_string()));
            }
            if let Ok(mut published) = self.published.lock() {
                published.push(id);
            }
            Ok(())
        }
    }

    struct TopicTargets {
        map: HashMap<String, Vec<TopicDestination>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TargetSource for TopicTargets {
        async fn resolve_targets(&self, _trader_uid: &str) -> Vec<PushTarget> {
            Vec::new()
        }

        async fn topic_destinations(&self) -> HashMap<String, Vec<TopicDestination>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.map.clone()
        }
    }

    fn item(id: i64, topic: &str) -> ContentItem {
        ContentItem {
            id,
            topic_name: topic.to_string(),
            content: "hello".to_string(),
            translations: None,
            image: None,
        }
    }

    fn destinations(channels: &[i64]) -> HashMap<String, Vec<TopicDestination>> {
        let mut map = HashMap::new();
        map.insert(
            "news".to_string(),
            channels
                .iter()
                .map(|&channel_id| TopicDestination {
                    channel_id,
                    locale: Locale::En,
                })
                .collect(),
        );
        map
    }

    fn ingest(
        queue: Arc<FixedQueue>,
        map: HashMap<String, Vec<TopicDestination>>,
        transport: Arc<RecordingTransport>,
    ) -> IngestLoop {
        IngestLoop::new(
            queue,
            Arc::new(TopicTargets {
                map,
                calls: AtomicUsize::new(0),
            }),
            transport,
            reqwest::Client::new(),
        )
    }

    fn published(queue: &FixedQueue) -> Vec<i64> {
        let Ok(published) = queue.published.lock() else {
            panic!("lock poisoned");
        };
        published.clone()
    }

    #[tokio::test]
    async fn leading_failure_still_publishes_when_last_send_lands() {
        let queue = Arc::new(FixedQueue::new(vec![item(1, "news")]));
        let transport = Arc::new(RecordingTransport::new(vec![10]));
        let loop_ = ingest(Arc::clone(&queue), destinations(&[10, 20]), transport);

        loop_.tick().await;
        assert_eq!(published(&queue), vec![1]);
    }

    #[tokio::test]
    async fn trailing_failure_keeps_item_queued() {
        let queue = Arc::new(FixedQueue::new(vec![item(1, "news")]));
        let transport = Arc::new(RecordingTransport::new(vec![20]));
        let loop_ = ingest(
            Arc::clone(&queue),
            destinations(&[10, 20]),
            Arc::clone(&transport),
        );

        loop_.tick().await;
        // channel 10 already got the item, but the flag follows the last
        // destination, so the whole item repeats next tick
        {
            let Ok(sent) = transport.sent.lock() else {
                panic!("lock poisoned");
            };
            assert_eq!(sent.len(), 1);
        }
        assert!(published(&queue).is_empty());
    }

    #[tokio::test]
    async fn total_failure_leaves_item_unpublished() {
        let queue = Arc::new(FixedQueue::new(vec![item(1, "news")]));
        let transport = Arc::new(RecordingTransport::new(vec![10, 20]));
        let loop_ = ingest(Arc::clone(&queue), destinations(&[10, 20]), transport);

        loop_.tick().await;
        assert!(published(&queue).is_empty());
    }

    #[tokio::test]
    async fn unmatched_topic_is_skipped_not_published() {
        let queue = Arc::new(FixedQueue::new(vec![item(1, "unknown-topic"), item(2, " news ")]));
        let transport = Arc::new(RecordingTransport::new(Vec::new()));
        let loop_ = ingest(Arc::clone(&queue), destinations(&[10]), Arc::clone(&transport));

        loop_.tick().await;
        // item 2's trimmed name matched; item 1 stays queued
        assert_eq!(published(&queue), vec![2]);
    }

    #[tokio::test]
    async fn translation_fallback_chain() {
        let mut translations = HashMap::new();
        translations.insert("zh_CN".to_string(), "你好".to_string());
        translations.insert("en_US".to_string(), "hello there".to_string());

        let zh = localized_content("raw", Some(&translations), Locale::ZhCn);
        assert!(zh.starts_with("你好"));
        assert!(zh.contains("由 AI 自動翻譯"));

        // zh-TW missing: falls to en_US, still flagged as translated
        let tw = localized_content("raw", Some(&translations), Locale::ZhTw);
        assert!(tw.starts_with("hello there"));

        // default locale gets no disclaimer
        let en = localized_content("raw", Some(&translations), Locale::En);
        assert_eq!(en, "hello there");

        let none = localized_content("raw", None, Locale::En);
        assert_eq!(none, "raw");
    }

    #[test]
    fn markup_conversion() {
        assert_eq!(convert_markup("<b>Big</b> news"), "**Big** news");
        assert_eq!(
            convert_markup("read <a href=\"https://x.io\">this</a>"),
            "read [this](https://x.io)"
        );
        assert_eq!(convert_markup("a*b_c"), "a\\*b\\_c");
        assert_eq!(convert_markup("1 < 2"), "1 < 2");
        assert_eq!(convert_markup("<i>soft</i>"), "*soft*");
    }
}
