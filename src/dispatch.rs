//! Fan-out dispatch: resolve, render, deliver, aggregate.
//!
//! The dispatcher owns the per-event pipeline. Each event resolves its
//! destinations fresh, renders a destination-specific message (locale and
//! link flag differ per target) and delivers all targets concurrently. A
//! failed target is logged and counted; it never cancels or delays its
//! siblings, and nothing is retried.

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::error::RelayError;
use crate::events::{Announcement, CopySignal, HoldingReport, ScalpUpdate, TradeSummary, WeeklyReport};
use crate::format;
use crate::i18n::MessageCatalog;
use crate::render::CardRenderer;
use crate::social::{PushTarget, TargetSource};
use crate::transport::{Attachment, RenderedMessage, Transport};

/// Outcome of one fan-out: how many targets were delivered and how many
/// failed. `delivered + failed` equals the resolved target count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutReport {
    /// Targets that received the message.
    pub delivered: usize,
    /// Targets whose delivery failed.
    pub failed: usize,
}

/// Orchestrates the validate-resolve-render-deliver pipeline.
///
/// Holds no per-event state; one instance serves every dispatch.
pub struct Dispatcher {
    targets: Arc<dyn TargetSource>,
    transport: Arc<dyn Transport>,
    cards: Arc<dyn CardRenderer>,
    catalog: Arc<MessageCatalog>,
    http: reqwest::Client,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Wires the dispatcher to its collaborators.
    #[must_use]
    pub fn new(
        targets: Arc<dyn TargetSource>,
        transport: Arc<dyn Transport>,
        cards: Arc<dyn CardRenderer>,
        catalog: Arc<MessageCatalog>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            targets,
            transport,
            cards,
            catalog,
            http,
        }
    }

    /// Fans out a copy-trade signal to the trader's subscriber channels.
    pub async fn dispatch_copy_signal(&self, signal: CopySignal) -> FanoutReport {
        let targets = self.resolve(&signal.trader_uid).await;
        if targets.is_empty() {
            return FanoutReport::default();
        }
        let card = self.cards.copy_signal_card(&signal).await;
        self.fan_out(targets, card, move |target| {
            format::copy_signal::render(&signal, target.include_link)
        })
        .await
    }

    /// Fans out a closed-position summary.
    pub async fn dispatch_trade_summary(&self, summary: TradeSummary) -> FanoutReport {
        let targets = self.resolve(&summary.trader_uid).await;
        if targets.is_empty() {
            return FanoutReport::default();
        }
        let card = self.cards.trade_summary_card(&summary).await;
        self.fan_out(targets, card, move |target| {
            format::trade_summary::render(&summary, target.include_link)
        })
        .await
    }

    /// Fans out a TP/SL set or update.
    pub async fn dispatch_scalp_update(&self, update: ScalpUpdate) -> FanoutReport {
        let targets = self.resolve(&update.trader_uid).await;
        if targets.is_empty() {
            return FanoutReport::default();
        }
        let catalog = Arc::clone(&self.catalog);
        self.fan_out(targets, None, move |target| {
            format::scalp_update::render(&update, target.include_link, target.locale, &catalog)
        })
        .await
    }

    /// Fans out holding reports: one message per trader. A trader with a
    /// single open position gets the compact layout, otherwise the merged
    /// numbered list.
    pub async fn dispatch_holding_report(&self, report: HoldingReport) -> FanoutReport {
        let mut total = FanoutReport::default();
        for trader in report.traders {
            let targets = self.resolve(&trader.trader_uid).await;
            if targets.is_empty() {
                continue;
            }
            let outcome = self
                .fan_out(targets, None, move |target| {
                    if let [position] = trader.positions.as_slice() {
                        format::holding_report::render_single(&trader, position, target.include_link)
                    } else {
                        format::holding_report::render_merged(&trader, target.include_link)
                    }
                })
                .await;
            total.delivered += outcome.delivered;
            total.failed += outcome.failed;
        }
        total
    }

    /// Fans out a weekly performance report.
    pub async fn dispatch_weekly_report(&self, report: WeeklyReport) -> FanoutReport {
        let targets = self.resolve(&report.trader_uid).await;
        if targets.is_empty() {
            return FanoutReport::default();
        }
        let card = self.cards.weekly_report_card(&report).await;
        self.fan_out(targets, card, move |target| {
            format::weekly_report::render(&report, target.include_link)
        })
        .await
    }

    /// Broadcasts a CMS announcement to topic-mapped destinations, or to
    /// every enabled destination when no topic is named.
    pub async fn dispatch_announcement(&self, announcement: Announcement) -> FanoutReport {
        let topic_map = self.targets.topic_destinations().await;
        let destinations: Vec<_> = match &announcement.topic_name {
            Some(topic) => topic_map.get(topic.trim()).cloned().unwrap_or_default(),
            None => topic_map.into_values().flatten().collect(),
        };
        if destinations.is_empty() {
            tracing::info!(topic = ?announcement.topic_name, "no destinations for announcement");
            return FanoutReport::default();
        }

        let attachment = match &announcement.image {
            Some(url) => fetch_image(&self.http, url).await,
            None => None,
        };

        let mut set = JoinSet::new();
        let total = destinations.len();
        for destination in destinations {
            let transport = Arc::clone(&self.transport);
            let text = crate::ingest::localized_content(
                &announcement.content,
                announcement.translations.as_ref(),
                destination.locale,
            );
            let message = RenderedMessage {
                text,
                attachment: attachment.clone(),
            };
            set.spawn(async move {
                let result = transport.send(destination.channel_id, &message).await;
                (destination.channel_id, result)
            });
        }
        let report = collect(&mut set, total).await;
        tracing::info!(
            delivered = report.delivered,
            total,
            "announcement fan-out complete"
        );
        report
    }

    async fn resolve(&self, trader_uid: &str) -> Vec<PushTarget> {
        let targets = self.targets.resolve_targets(trader_uid).await;
        if targets.is_empty() {
            tracing::info!(trader_uid, "no subscriber channels");
        }
        targets
    }

    /// Renders per target and delivers concurrently. The attachment is
    /// rendered once and shared by every target.
    async fn fan_out<F>(
        &self,
        targets: Vec<PushTarget>,
        attachment: Option<Attachment>,
        render: F,
    ) -> FanoutReport
    where
        F: Fn(&PushTarget) -> String,
    {
        let total = targets.len();
        let mut set = JoinSet::new();
        for target in targets {
            let message = RenderedMessage {
                text: render(&target),
                attachment: attachment.clone(),
            };
            let transport = Arc::clone(&self.transport);
            set.spawn(async move {
                let result = transport.send(target.channel_id, &message).await;
                (target.channel_id, result)
            });
        }
        let report = collect(&mut set, total).await;
        tracing::info!(delivered = report.delivered, total, "fan-out complete");
        report
    }
}

async fn collect(
    set: &mut JoinSet<(i64, Result<(), RelayError>)>,
    total: usize,
) -> FanoutReport {
    let mut delivered = 0;
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((_, Ok(()))) => delivered += 1,
            Ok((channel_id, Err(error))) => {
                tracing::error!(channel_id, %error, "delivery failed");
            }
            Err(error) => {
                tracing::error!(%error, "delivery task panicked");
            }
        }
    }
    FanoutReport {
        delivered,
        failed: total - delivered,
    }
}

/// Downloads an announcement image. Failure degrades to text-only.
pub(crate) async fn fetch_image(http: &reqwest::Client, url: &str) -> Option<Attachment> {
    let response = match http.get(url).send().await {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            tracing::warn!(url, status = %response.status(), "image fetch rejected");
            return None;
        }
        Err(error) => {
            tracing::warn!(url, %error, "image fetch failed");
            return None;
        }
    };
    let filename = url
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("image.png")
        .to_string();
    match response.bytes().await {
        Ok(bytes) => Some(Attachment {
            filename,
            bytes: bytes.to_vec(),
        }),
        Err(error) => {
            tracing::warn!(url, %error, "image body read failed");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::events::CopySignal;
    use crate::locale::Locale;
    use crate::render::NoCardRenderer;
    use crate::social::TopicDestination;

    /// Fixed target list standing in for the social graph.
    pub(crate) struct StaticTargets(pub Vec<PushTarget>);

    #[async_trait]
    impl TargetSource for StaticTargets {
        async fn resolve_targets(&self, _trader_uid: &str) -> Vec<PushTarget> {
            self.0.clone()
        }

        async fn topic_destinations(&self) -> HashMap<String, Vec<TopicDestination>> {
            HashMap::new()
        }
    }

    /// Transport that records every send and fails listed channels.
    pub(crate) struct RecordingTransport {
        pub sent: Mutex<Vec<(i64, String)>>,
        pub failing: Vec<i64>,
    }

    impl RecordingTransport {
        pub(crate) fn new(failing: Vec<i64>) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                failing,
            }
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(
            &self,
            channel_id: i64,
            message: &RenderedMessage,
        ) -> Result<(), RelayError> {
            if self.failing.contains(&channel_id) {
                return Err(RelayError::DeliveryFailed {
                    channel_id,
                    reason: "boom".to_string(),
                });
            }
            if let Ok(mut sent) = self.sent.lock() {
                sent.push((channel_id, message.text.clone()));
            }
            Ok(())
        }
    }

    fn target(channel_id: i64, include_link: bool) -> PushTarget {
        PushTarget {
            channel_id,
            topic_id: String::new(),
            include_link,
            locale: Locale::En,
        }
    }

    fn dispatcher(
        targets: Vec<PushTarget>,
        transport: Arc<RecordingTransport>,
    ) -> Dispatcher {
        Dispatcher::new(
            Arc::new(StaticTargets(targets)),
            transport,
            Arc::new(NoCardRenderer),
            Arc::new(MessageCatalog::empty()),
            reqwest::Client::new(),
        )
    }

    fn signal() -> CopySignal {
        let Ok(signal) = CopySignal::parse(&crate::events::copy_signal::tests::payload()) else {
            panic!("fixture should parse");
        };
        signal
    }

    #[tokio::test]
    async fn failed_target_does_not_block_siblings() {
        let transport = Arc::new(RecordingTransport::new(vec![2]));
        let dispatcher = dispatcher(
            vec![target(1, true), target(2, true), target(3, false)],
            Arc::clone(&transport),
        );

        let report = dispatcher.dispatch_copy_signal(signal()).await;
        assert_eq!(report, FanoutReport { delivered: 2, failed: 1 });

        let Ok(sent) = transport.sent.lock() else {
            panic!("lock poisoned");
        };
        let mut channels: Vec<i64> = sent.iter().map(|(id, _)| *id).collect();
        channels.sort_unstable();
        assert_eq!(channels, vec![1, 3]);
    }

    #[tokio::test]
    async fn link_flag_is_per_target() {
        let transport = Arc::new(RecordingTransport::new(Vec::new()));
        let dispatcher = dispatcher(
            vec![target(1, true), target(2, false)],
            Arc::clone(&transport),
        );

        dispatcher.dispatch_copy_signal(signal()).await;

        let Ok(sent) = transport.sent.lock() else {
            panic!("lock poisoned");
        };
        for (channel_id, text) in sent.iter() {
            match channel_id {
                1 => assert!(text.contains("more actions")),
                2 => assert!(!text.contains("more actions")),
                other => panic!("unexpected channel {other}"),
            }
        }
    }

    #[tokio::test]
    async fn no_targets_is_a_quiet_noop() {
        let transport = Arc::new(RecordingTransport::new(Vec::new()));
        let dispatcher = dispatcher(Vec::new(), Arc::clone(&transport));
        let report = dispatcher.dispatch_copy_signal(signal()).await;
        assert_eq!(report, FanoutReport::default());
    }

    #[tokio::test]
    async fn holding_report_sends_one_message_per_trader() {
        let transport = Arc::new(RecordingTransport::new(Vec::new()));
        let dispatcher = dispatcher(vec![target(9, false)], Arc::clone(&transport));
        let payload = serde_json::json!([
            crate::events::holding_report::tests::trader_payload(),
            crate::events::holding_report::tests::trader_payload(),
        ]);
        let Ok(report) = crate::events::HoldingReport::parse(&payload) else {
            panic!("fixture should parse");
        };

        let outcome = dispatcher.dispatch_holding_report(report).await;
        assert_eq!(outcome.delivered, 2);

        let Ok(sent) = transport.sent.lock() else {
            panic!("lock poisoned");
        };
        assert_eq!(sent.len(), 2);
        for (_, text) in sent.iter() {
            assert!(text.contains("**1. BTCUSDT"));
            assert!(text.contains("**2. ETHUSDT"));
        }
    }
}
