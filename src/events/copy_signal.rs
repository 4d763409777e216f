//! Copy-trade signal: a lead trader opened or closed a position.

use serde_json::Value;

use super::{
    MarginType, Side, TradeAction, as_object, field_string, numeric, require_fields, timestamp_ms,
};
use crate::error::RelayError;

const REQUIRED: &[&str] = &[
    "trader_uid",
    "trader_name",
    "trader_pnl",
    "trader_pnlpercentage",
    "trader_detail_url",
    "pair",
    "base_coin",
    "quote_coin",
    "pair_leverage",
    "pair_type",
    "price",
    "time",
    "trader_url",
    "pair_side",
    "pair_margin_type",
];

/// Validated copy-trade signal payload.
#[derive(Debug, Clone)]
pub struct CopySignal {
    /// Lead trader identifier used for target resolution.
    pub trader_uid: String,
    /// Display name.
    pub trader_name: String,
    /// 7-day realized PnL.
    pub pnl: f64,
    /// 7-day PnL percentage (fraction, not percent).
    pub pnl_percentage: f64,
    /// "More actions" landing page.
    pub detail_url: String,
    /// Trading pair symbol, e.g. `BTCUSDT`.
    pub pair: String,
    /// Base coin of the pair.
    pub base_coin: String,
    /// Quote coin of the pair.
    pub quote_coin: String,
    /// Position leverage.
    pub leverage: f64,
    /// Open or close.
    pub action: TradeAction,
    /// Entry price, kept in its wire display form.
    pub price: String,
    /// Event time, millisecond epoch.
    pub time_ms: i64,
    /// Avatar URL for the statistics card.
    pub avatar_url: String,
    /// Long or short.
    pub side: Side,
    /// Cross or isolated margin.
    pub margin_type: MarginType,
}

impl CopySignal {
    /// Parses and validates a raw payload.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Validation`] naming every missing field, or
    /// describing the first enum / numeric / cross-field violation.
    pub fn parse(value: &Value) -> Result<Self, RelayError> {
        let obj = as_object(value)?;
        require_fields(obj, REQUIRED)?;

        let pnl = numeric(obj, "trader_pnl")?;
        let pnl_percentage = numeric(obj, "trader_pnlpercentage")?;
        let leverage = numeric(obj, "pair_leverage")?;

        // Realized PnL and its percentage must point the same way.
        if (pnl >= 0.0) != (pnl_percentage >= 0.0) {
            return Err(RelayError::Validation(
                "trader_pnl and trader_pnlpercentage disagree in sign".to_string(),
            ));
        }

        let action = TradeAction::parse(&field_string(obj, "pair_type"))?;
        let side = Side::parse("pair_side", &field_string(obj, "pair_side"))?;
        let margin_type = MarginType::parse("pair_margin_type", &field_string(obj, "pair_margin_type"))?;
        let time_ms = timestamp_ms(obj, "time")?;

        Ok(Self {
            trader_uid: field_string(obj, "trader_uid"),
            trader_name: field_string(obj, "trader_name"),
            pnl,
            pnl_percentage,
            detail_url: field_string(obj, "trader_detail_url"),
            pair: field_string(obj, "pair"),
            base_coin: field_string(obj, "base_coin"),
            quote_coin: field_string(obj, "quote_coin"),
            leverage,
            action,
            price: field_string(obj, "price"),
            time_ms,
            avatar_url: field_string(obj, "trader_url"),
            side,
            margin_type,
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
            "trader_pnl": "150.5",
            "trader_pnlpercentage": "0.12",
            "trader_detail_url": "https://example.com/t/123",
            "pair": "BTCUSDT",
            "base_coin": "BTC",
            "quote_coin": "USDT",
            "pair_leverage": "20",
            "pair_type": "buy",
            "price": "64123.5",
            "time": 1_700_000_000_000_i64,
            "trader_url": "https://example.com/a/123.png",
            "pair_side": "1",
            "pair_margin_type": "2"
        })
    }

    #[test]
    fn valid_payload_parses() {
        let Ok(signal) = CopySignal::parse(&payload()) else {
            panic!("expected valid payload to parse");
        };
        assert_eq!(signal.trader_uid, "123");
        assert_eq!(signal.action, TradeAction::Open);
        assert_eq!(signal.side, Side::Long);
        assert_eq!(signal.margin_type, MarginType::Isolated);
    }

    #[test]
    fn every_missing_field_is_named() {
        let mut value = payload();
        if let Some(obj) = value.as_object_mut() {
            obj.remove("pair");
            obj.insert("price".to_string(), json!(""));
        }
        let Err(RelayError::Validation(msg)) = CopySignal::parse(&value) else {
            panic!("expected validation error");
        };
        assert!(msg.contains("pair"), "{msg}");
        assert!(msg.contains("price"), "{msg}");
    }

    #[test]
    fn pnl_sign_mismatch_rejected() {
        let mut value = payload();
        if let Some(obj) = value.as_object_mut() {
            obj.insert("trader_pnl".to_string(), json!("-5"));
        }
        assert!(CopySignal::parse(&value).is_err());
    }

    #[test]
    fn second_epoch_timestamp_rejected() {
        let mut value = payload();
        if let Some(obj) = value.as_object_mut() {
            obj.insert("time".to_string(), json!(1_700_000_000_i64));
        }
        assert!(CopySignal::parse(&value).is_err());
    }

    #[test]
    fn bad_pair_type_rejected() {
        let mut value = payload();
        if let Some(obj) = value.as_object_mut() {
            obj.insert("pair_type".to_string(), json!("hold"));
        }
        assert!(CopySignal::parse(&value).is_err());
    }
}
