//! Scalp-update message layout, fully catalog-driven.
//!
//! Every line comes from `scalp.*` / `common.*` catalog keys so the text
//! is locale-aware end to end. With an empty catalog the output degrades
//! to the raw keys, never to an error.

use crate::events::ScalpUpdate;
use crate::i18n::MessageCatalog;
use crate::locale::Locale;

/// Renders the TP/SL notification text for one destination.
#[must_use]
pub fn render(
    update: &ScalpUpdate,
    include_link: bool,
    locale: Locale,
    catalog: &MessageCatalog,
) -> String {
    let side = catalog
        .lookup(&format!("common.sides.{}", update.side.code()), locale)
        .to_string();
    let time = super::format_timestamp_ms(update.time_ms);

    let title_key = if update.is_update() {
        "scalp.title_update"
    } else {
        "scalp.title_setting"
    };

    let mut text = format!(
        "{}\n\n{}\n{}",
        catalog.render(
            title_key,
            locale,
            &[("trader_name", update.trader_name.clone())],
        ),
        catalog.render(
            "scalp.line_pair",
            locale,
            &[("pair", update.pair.clone()), ("pair_side", side)],
        ),
        catalog.render("scalp.line_time", locale, &[("time", time)]),
    );

    let mut level_lines = Vec::new();
    match (&update.tp_price, &update.previous_tp_price) {
        (Some(new), Some(old)) => level_lines.push(catalog.render(
            "scalp.tp_update",
            locale,
            &[("old", old.clone()), ("new", new.clone())],
        )),
        (Some(new), None) => {
            level_lines.push(catalog.render("scalp.tp", locale, &[("price", new.clone())]));
        }
        _ => {}
    }
    match (&update.sl_price, &update.previous_sl_price) {
        (Some(new), Some(old)) => level_lines.push(catalog.render(
            "scalp.sl_update",
            locale,
            &[("old", old.clone()), ("new", new.clone())],
        )),
        (Some(new), None) => {
            level_lines.push(catalog.render("scalp.sl", locale, &[("price", new.clone())]));
        }
        _ => {}
    }
    for line in level_lines {
        text.push('\n');
        text.push_str(&line);
    }

    if include_link {
        text.push_str("\n\n");
        text.push_str(&catalog.render(
            "common.detail_line",
            locale,
            &[
                ("trader_name", update.trader_name.clone()),
                ("url", update.detail_url.clone()),
            ],
        ));
    }
    text
}
