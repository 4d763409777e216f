//! Holding-report message layouts (single position and merged list).

use crate::events::{HoldingPosition, TraderHoldings};

use super::{detail_line, format_float};

/// Renders the single-position report for a trader with exactly one
/// open position.
#[must_use]
pub fn render_single(trader: &TraderHoldings, position: &HoldingPosition, include_link: bool) -> String {
    let mut text = format!(
        "📊 **Holding Report**\n\n\
         ⚡️**{name}** Trading Summary (Updated every 12 hours)\n\n\
         **{pair}** {margin} **{leverage}X**\n\
         Direction: {side}\n\
         Entry Price: ${entry}\n\
         Current Price: ${current}\n\
         ROI: {roi}%",
        name = trader.trader_name,
        pair = position.pair,
        margin = position.margin_type.label(),
        leverage = format_float(position.leverage),
        side = position.side.label(),
        entry = position.entry_price,
        current = position.current_price,
        roi = format_float(position.unrealized_pnl_percentage * 100.0),
    );
    push_levels(&mut text, position);

    if include_link {
        text.push_str("\n\n");
        text.push_str(&detail_line(&trader.trader_name, &trader.detail_url));
    }
    text
}

/// Renders the merged numbered-list report covering every open position
/// of one trader. One message per trader.
#[must_use]
pub fn render_merged(trader: &TraderHoldings, include_link: bool) -> String {
    let mut text = format!(
        "⚡️{} Trading Summary (Updated every 12 hours)\n\n",
        trader.trader_name
    );
    for (i, position) in trader.positions.iter().enumerate() {
        text.push_str(&format!(
            "**{no}. {pair} {margin} {leverage}X**\n\
             ➡️Direction: {side}\n\
             🎯Entry Price: ${entry}\n\
             📊Current Price: ${current}\n\
             🚀ROI: {roi}%",
            no = i + 1,
            pair = position.pair,
            margin = position.margin_type.label(),
            leverage = format_float(position.leverage),
            side = position.side.label(),
            entry = position.entry_price,
            current = position.current_price,
            roi = format_float(position.unrealized_pnl_percentage * 100.0),
        ));
        push_levels(&mut text, position);
        text.push_str("\n\n");
    }
    let mut text = text.trim_end_matches('\n').to_string();

    if include_link {
        text.push_str("\n\n");
        text.push_str(&detail_line(&trader.trader_name, &trader.detail_url));
    }
    text
}

fn push_levels(text: &mut String, position: &HoldingPosition) {
    if let Some(tp) = &position.tp_price {
        text.push_str(&format!("\n✅TP Price: ${tp}"));
    }
    if let Some(sl) = &position.sl_price {
        text.push_str(&format!("\n🛑SL Price: ${sl}"));
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::events::HoldingReport;
    use crate::events::holding_report::tests::trader_payload;

    fn trader() -> TraderHoldings {
        let Ok(report) = HoldingReport::parse(&trader_payload()) else {
            panic!("fixture should parse");
        };
        let Some(trader) = report.traders.into_iter().next() else {
            panic!("one trader expected");
        };
        trader
    }

    #[test]
    fn merged_list_numbers_positions() {
        let text = render_merged(&trader(), true);
        assert!(text.contains("**1. BTCUSDT Isolated 20X**"));
        assert!(text.contains("**2. ETHUSDT Cross 10X**"));
        assert!(text.contains("🚀ROI: 312.5%"));
        assert!(text.contains("✅TP Price: $70000"));
        // second position carries no TP/SL
        assert_eq!(text.matches("TP Price").count(), 1);
        assert!(text.ends_with("[About Ada, more actions>>](https://example.com/t/123)"));
    }

    #[test]
    fn single_layout() {
        let trader = trader();
        let Some(position) = trader.positions.first() else {
            panic!("positions expected");
        };
        let text = render_single(&trader, position, false);
        assert!(text.contains("**Holding Report**"));
        assert!(text.contains("Entry Price: $64000"));
        assert!(!text.contains("more actions"));
    }
}
