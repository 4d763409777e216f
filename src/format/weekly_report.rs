//! Weekly-report message layout.

use crate::events::WeeklyReport;

use super::{detail_line, format_float};

/// Renders the weekly performance report text for one destination.
///
/// Losses are recomputed as `total - wins` and ROI is a fraction on the
/// wire, rendered as a percentage.
#[must_use]
pub fn render(report: &WeeklyReport, include_link: bool) -> String {
    let loss_trades = report.total_trades - report.win_trades;
    let roi_emoji = if report.total_roi >= 0.0 { "🔥" } else { "📉" };

    let mut text = format!(
        "⚡️{name} Weekly Performance Report\n\n\
         {roi_emoji} TOTAL R: {roi}%\n\n\
         📈 Total Trades: {total}\n\
         ✅ Wins: {wins}\n\
         ❌ Losses: {losses}\n\
         🏆 Win Rate: {win_rate}%",
        name = report.trader_name,
        roi = format_float(report.total_roi * 100.0),
        total = report.total_trades,
        wins = report.win_trades,
        losses = loss_trades,
        win_rate = format_float(report.win_rate),
    );

    if include_link {
        text.push_str("\n\n");
        text.push_str(&detail_line(&report.trader_name, &report.detail_url));
    }
    text
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::events::weekly_report::tests::payload;

    #[test]
    fn layout_recomputes_losses() {
        let mut value = payload();
        if let Some(obj) = value.as_object_mut() {
            // wire says 9 losses; layout recomputes from total - wins
            obj.insert("total_trades".to_string(), json!(30));
        }
        let Ok(report) = WeeklyReport::parse(&value) else {
            panic!("fixture should parse");
        };
        let text = render(&report, true);
        assert!(text.contains("🔥 TOTAL R: 12.5%"));
        assert!(text.contains("Total Trades: 30"));
        assert!(text.contains("❌ Losses: 15"));
        assert!(text.contains("🏆 Win Rate: 62.5%"));
        assert!(text.contains("more actions"));
    }

    #[test]
    fn negative_roi_changes_emoji() {
        let mut value = payload();
        if let Some(obj) = value.as_object_mut() {
            obj.insert("total_roi".to_string(), json!("-0.05"));
        }
        let Ok(report) = WeeklyReport::parse(&value) else {
            panic!("fixture should parse");
        };
        let text = render(&report, false);
        assert!(text.contains("📉 TOTAL R: -5%"));
        assert!(!text.contains("more actions"));
    }
}
