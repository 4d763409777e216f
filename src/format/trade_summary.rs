//! Trade-summary message layout.

use crate::events::TradeSummary;

use super::{detail_line, format_float, format_timestamp_ms};

/// Renders the closed-position notification text for one destination.
#[must_use]
pub fn render(summary: &TradeSummary, include_link: bool) -> String {
    let time = format_timestamp_ms(summary.close_time_ms);

    let mut text = format!(
        "📊 **Trade Summary**\n\n\
         ⚡️**{name}** Position Closed\n\n\
         **{pair}** {margin} **{leverage}X**\n\n\
         Time: {time} (UTC+0)\n\
         Direction: {side}\n\
         ROI: {roi}%\n\
         Entry Price: ${entry}\n\
         Exit Price: ${exit}",
        name = summary.trader_name,
        pair = summary.pair,
        margin = summary.margin_type.label(),
        leverage = format_float(summary.leverage),
        side = summary.side.label(),
        roi = format_float(summary.realized_pnl_percentage),
        entry = format_float(summary.entry_price),
        exit = format_float(summary.exit_price),
    );

    if include_link {
        text.push_str("\n\n");
        text.push_str(&detail_line(&summary.trader_name, &summary.detail_url));
    }
    text
}
