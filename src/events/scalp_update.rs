//! Scalp update: take-profit / stop-loss levels were set or moved.

use serde_json::Value;

use super::{Side, as_object, field_string, optional_price, require_fields, timestamp_ms};
use crate::error::RelayError;

const REQUIRED: &[&str] = &[
    "trader_uid",
    "trader_name",
    "trader_detail_url",
    "pair",
    "pair_side",
    "time",
];

/// Validated scalp-update payload.
///
/// Carries at least one of `tp_price` / `sl_price`. When a previous value
/// is present the event renders as an update, otherwise as the initial set.
#[derive(Debug, Clone)]
pub struct ScalpUpdate {
    /// Lead trader identifier used for target resolution.
    pub trader_uid: String,
    /// Display name.
    pub trader_name: String,
    /// "More actions" landing page.
    pub detail_url: String,
    /// Trading pair symbol.
    pub pair: String,
    /// Long or short.
    pub side: Side,
    /// Event time, millisecond epoch.
    pub time_ms: i64,
    /// New take-profit price, raw display form.
    pub tp_price: Option<String>,
    /// New stop-loss price, raw display form.
    pub sl_price: Option<String>,
    /// Take-profit price before this change.
    pub previous_tp_price: Option<String>,
    /// Stop-loss price before this change.
    pub previous_sl_price: Option<String>,
}

impl ScalpUpdate {
    /// Parses and validates a raw payload.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Validation`] naming every missing field, when
    /// both price levels are absent, or when an optional price is present
    /// but not numeric.
    pub fn parse(value: &Value) -> Result<Self, RelayError> {
        let obj = as_object(value)?;
        require_fields(obj, REQUIRED)?;

        let tp_price = optional_price(obj, "tp_price")?;
        let sl_price = optional_price(obj, "sl_price")?;
        if tp_price.is_none() && sl_price.is_none() {
            return Err(RelayError::Validation(
                "at least one of tp_price or sl_price is required".to_string(),
            ));
        }

        Ok(Self {
            trader_uid: field_string(obj, "trader_uid"),
            trader_name: field_string(obj, "trader_name"),
            detail_url: field_string(obj, "trader_detail_url"),
            pair: field_string(obj, "pair"),
            side: Side::parse("pair_side", &field_string(obj, "pair_side"))?,
            time_ms: timestamp_ms(obj, "time")?,
            tp_price,
            sl_price,
            previous_tp_price: optional_price(obj, "previous_tp_price")?,
            previous_sl_price: optional_price(obj, "previous_sl_price")?,
        })
    }

    /// True when any previous level is present, i.e. the trader moved an
    /// existing TP/SL rather than setting it for the first time.
    #[must_use]
    pub const fn is_update(&self) -> bool {
        self.previous_tp_price.is_some() || self.previous_sl_price.is_some()
    }
}
