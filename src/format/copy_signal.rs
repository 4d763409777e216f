//! Copy-signal message layout.

use crate::events::CopySignal;

use super::{detail_line, format_float, format_timestamp_ms};

/// Renders the copy-signal notification text for one destination.
#[must_use]
pub fn render(signal: &CopySignal, include_link: bool) -> String {
    let time = format_timestamp_ms(signal.time_ms);
    let leverage = format_float(signal.leverage);

    let mut text = format!(
        "⚡️**{name}** New Trade Open\n\n\
         📢{pair}  {margin} {leverage}X\n\n\
         ⏰Time: {time} (UTC+0)\n\
         ➡️Direction: {action} {side}\n\
         🎯Entry Price: {price}",
        name = signal.trader_name,
        pair = signal.pair,
        margin = signal.margin_type.label(),
        action = signal.action.label(),
        side = signal.side.label(),
        price = signal.price,
    );

    if include_link {
        text.push('\n');
        text.push_str(&detail_line(&signal.trader_name, &signal.detail_url));
    }
    text
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::events::copy_signal::tests::payload;

    #[test]
    fn layout_contains_all_lines() {
        let Ok(signal) = CopySignal::parse(&payload()) else {
            panic!("fixture should parse");
        };
        let text = render(&signal, true);
        assert!(text.contains("**Ada** New Trade Open"));
        assert!(text.contains("📢BTCUSDT  Isolated 20X"));
        assert!(text.contains("(UTC+0)"));
        assert!(text.contains("Direction: Open Long"));
        assert!(text.contains("Entry Price: 64123.5"));
        assert!(text.contains("[About Ada, more actions>>](https://example.com/t/123)"));
    }

    #[test]
    fn link_omitted_without_jump() {
        let Ok(signal) = CopySignal::parse(&payload()) else {
            panic!("fixture should parse");
        };
        let text = render(&signal, false);
        assert!(!text.contains("more actions"));
    }
}
