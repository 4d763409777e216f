//! Statistics-card rendering seam.
//!
//! Card compositing itself (avatars, fonts, backgrounds) lives outside
//! this service. The dispatcher only needs a seam that may yield an
//! attachment: `None` always degrades to text-only delivery, never to a
//! failed or withheld message.

use async_trait::async_trait;

use crate::events::{CopySignal, TradeSummary, WeeklyReport};
use crate::transport::Attachment;

/// Produces the optional image attachment for card-bearing event kinds.
#[async_trait]
pub trait CardRenderer: Send + Sync {
    /// Trader 7-day performance card for a copy signal.
    async fn copy_signal_card(&self, signal: &CopySignal) -> Option<Attachment>;

    /// Closed-position summary card.
    async fn trade_summary_card(&self, summary: &TradeSummary) -> Option<Attachment>;

    /// Weekly performance card.
    async fn weekly_report_card(&self, report: &WeeklyReport) -> Option<Attachment>;
}

/// Renderer that never produces a card; every delivery is text-only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCardRenderer;

#[async_trait]
impl CardRenderer for NoCardRenderer {
    async fn copy_signal_card(&self, _signal: &CopySignal) -> Option<Attachment> {
        None
    }

    async fn trade_summary_card(&self, _summary: &TradeSummary) -> Option<Attachment> {
        None
    }

    async fn weekly_report_card(&self, _report: &WeeklyReport) -> Option<Attachment> {
        None
    }
}
