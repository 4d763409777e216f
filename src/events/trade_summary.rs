//! Trade summary: a tracked position was closed.

use serde_json::Value;

use super::{MarginType, Side, as_object, field_string, numeric, require_fields, timestamp_ms};
use crate::error::RelayError;

const REQUIRED: &[&str] = &[
    "trader_uid",
    "trader_name",
    "trader_detail_url",
    "pair",
    "pair_side",
    "pair_margin_type",
    "pair_leverage",
    "entry_price",
    "exit_price",
    "realized_pnl",
    "realized_pnl_percentage",
    "close_time",
];

/// Validated trade-summary payload.
#[derive(Debug, Clone)]
pub struct TradeSummary {
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
    /// Cross or isolated margin.
    pub margin_type: MarginType,
    /// Position leverage.
    pub leverage: f64,
    /// Entry price.
    pub entry_price: f64,
    /// Exit price.
    pub exit_price: f64,
    /// Realized PnL in quote currency.
    pub realized_pnl: f64,
    /// Realized PnL percentage.
    pub realized_pnl_percentage: f64,
    /// Close time, millisecond epoch.
    pub close_time_ms: i64,
}

impl TradeSummary {
    /// Parses and validates a raw payload.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Validation`] naming every missing field, or
    /// describing the first enum / numeric / timestamp violation.
    pub fn parse(value: &Value) -> Result<Self, RelayError> {
        let obj = as_object(value)?;
        require_fields(obj, REQUIRED)?;

        Ok(Self {
            trader_uid: field_string(obj, "trader_uid"),
            trader_name: field_string(obj, "trader_name"),
            detail_url: field_string(obj, "trader_detail_url"),
            pair: field_string(obj, "pair"),
            side: Side::parse("pair_side", &field_string(obj, "pair_side"))?,
            margin_type: MarginType::parse(
                "pair_margin_type",
                &field_string(obj, "pair_margin_type"),
            )?,
            leverage: numeric(obj, "pair_leverage")?,
            entry_price: numeric(obj, "entry_price")?,
            exit_price: numeric(obj, "exit_price")?,
            realized_pnl: numeric(obj, "realized_pnl")?,
            realized_pnl_percentage: numeric(obj, "realized_pnl_percentage")?,
            close_time_ms: timestamp_ms(obj, "close_time")?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn payload() -> Value {
        json!({
            "trader_uid": "123",
            "trader_name": "Ada",
            "trader_detail_url": "https://example.com/t/123",
            "pair": "ETHUSDT",
            "pair_side": "2",
            "pair_margin_type": "1",
            "pair_leverage": "10",
            "entry_price": "3500.0",
            "exit_price": "3400.5",
            "realized_pnl": "99.5",
            "realized_pnl_percentage": "2.567",
            "close_time": 1_700_000_000_000_i64
        })
    }

    #[test]
    fn valid_payload_parses() {
        let Ok(summary) = TradeSummary::parse(&payload()) else {
            panic!("expected valid payload to parse");
        };
        assert_eq!(summary.side, Side::Short);
        assert_eq!(summary.margin_type, MarginType::Cross);
        assert_eq!(summary.exit_price, 3400.5);
    }

    #[test]
    fn non_numeric_price_rejected() {
        let mut value = payload();
        if let Some(obj) = value.as_object_mut() {
            obj.insert("exit_price".to_string(), json!("n/a"));
        }
        assert!(TradeSummary::parse(&value).is_err());
    }

    #[test]
    fn missing_fields_all_reported() {
        let Err(RelayError::Validation(msg)) = TradeSummary::parse(&json!({})) else {
            panic!("expected validation error");
        };
        for field in REQUIRED {
            assert!(msg.contains(field), "missing {field} in: {msg}");
        }
    }
}
