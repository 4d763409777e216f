//! Weekly report: a trader's aggregate performance over the last week.

use serde_json::Value;

use super::{as_object, field_string, integer, numeric, require_fields};
use crate::error::RelayError;

const REQUIRED: &[&str] = &[
    "trader_uid",
    "trader_name",
    "trader_url",
    "trader_detail_url",
    "total_roi",
    "total_pnl",
    "total_trades",
    "win_trades",
    "loss_trades",
    "win_rate",
];

/// Validated weekly-report payload.
#[derive(Debug, Clone)]
pub struct WeeklyReport {
    /// Lead trader identifier used for target resolution.
    pub trader_uid: String,
    /// Display name.
    pub trader_name: String,
    /// Avatar URL for the statistics card.
    pub avatar_url: String,
    /// "More actions" landing page.
    pub detail_url: String,
    /// Weekly ROI as a fraction (rendered ×100).
    pub total_roi: f64,
    /// Weekly realized PnL in quote currency.
    pub total_pnl: f64,
    /// Trades closed during the week.
    pub total_trades: i64,
    /// Winning trades.
    pub win_trades: i64,
    /// Losing trades.
    pub loss_trades: i64,
    /// Win rate, 0 to 100.
    pub win_rate: f64,
}

impl WeeklyReport {
    /// Parses and validates a raw payload.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Validation`] naming every missing field, on
    /// non-numeric values, or when `win_rate` falls outside `0..=100`.
    pub fn parse(value: &Value) -> Result<Self, RelayError> {
        let obj = as_object(value)?;
        require_fields(obj, REQUIRED)?;

        let win_rate = numeric(obj, "win_rate")?;
        if !(0.0..=100.0).contains(&win_rate) {
            return Err(RelayError::Validation(
                "win_rate must be between 0 and 100".to_string(),
            ));
        }

        Ok(Self {
            trader_uid: field_string(obj, "trader_uid"),
            trader_name: field_string(obj, "trader_name"),
            avatar_url: field_string(obj, "trader_url"),
            detail_url: field_string(obj, "trader_detail_url"),
            total_roi: numeric(obj, "total_roi")?,
            total_pnl: numeric(obj, "total_pnl")?,
            total_trades: integer(obj, "total_trades")?,
            win_trades: integer(obj, "win_trades")?,
            loss_trades: integer(obj, "loss_trades")?,
            win_rate,
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
            "trader_url": "https://example.com/a/123.png",
            "trader_detail_url": "https://example.com/t/123",
            "total_roi": "0.125",
            "total_pnl": "1520.75",
            "total_trades": 24,
            "win_trades": 15,
            "loss_trades": 9,
            "win_rate": "62.5"
        })
    }

    #[test]
    fn valid_payload_parses() {
        let Ok(report) = WeeklyReport::parse(&payload()) else {
            panic!("expected valid payload to parse");
        };
        assert_eq!(report.total_trades, 24);
        assert_eq!(report.win_rate, 62.5);
    }

    #[test]
    fn win_rate_out_of_range_rejected() {
        let mut value = payload();
        if let Some(obj) = value.as_object_mut() {
            obj.insert("win_rate".to_string(), json!("101"));
        }
        assert!(WeeklyReport::parse(&value).is_err());
    }

    #[test]
    fn missing_fields_all_reported() {
        let Err(RelayError::Validation(msg)) = WeeklyReport::parse(&json!({})) else {
            panic!("expected validation error");
        };
        for field in REQUIRED {
            assert!(msg.contains(field), "missing {field} in: {msg}");
        }
    }
}
