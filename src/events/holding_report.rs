//! Holding report: a snapshot of one or more traders' open positions.

use serde_json::Value;

use super::{
    MarginType, Side, as_object, field_string, numeric, optional_price, require_fields,
};
use crate::error::RelayError;

const TRADER_REQUIRED: &[&str] = &["trader_uid", "trader_name", "trader_detail_url", "infos"];

const INFO_REQUIRED: &[&str] = &[
    "pair",
    "pair_side",
    "pair_margin_type",
    "pair_leverage",
    "entry_price",
    "current_price",
    "unrealized_pnl_percentage",
];

/// One open position inside a holding report.
#[derive(Debug, Clone)]
pub struct HoldingPosition {
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
    /// Mark price at snapshot time.
    pub current_price: f64,
    /// Unrealized PnL percentage.
    pub unrealized_pnl_percentage: f64,
    /// Take-profit level, raw display form.
    pub tp_price: Option<String>,
    /// Stop-loss level, raw display form.
    pub sl_price: Option<String>,
}

/// One trader's holdings: identity plus at least one position.
#[derive(Debug, Clone)]
pub struct TraderHoldings {
    /// Lead trader identifier used for target resolution.
    pub trader_uid: String,
    /// Display name.
    pub trader_name: String,
    /// "More actions" landing page.
    pub detail_url: String,
    /// Open positions, never empty.
    pub positions: Vec<HoldingPosition>,
}

/// Validated holding-report payload, one or many traders.
#[derive(Debug, Clone)]
pub struct HoldingReport {
    /// Traders covered by the snapshot, never empty.
    pub traders: Vec<TraderHoldings>,
}

impl HoldingReport {
    /// Parses either a single trader object or a list of trader objects.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Validation`]; for the list form the message is
    /// prefixed with the offending position ("trader 1 - info 2: ...").
    pub fn parse(value: &Value) -> Result<Self, RelayError> {
        let traders = match value {
            Value::Array(items) => {
                if items.is_empty() {
                    return Err(RelayError::Validation(
                        "holding report list must not be empty".to_string(),
                    ));
                }
                let mut traders = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let trader = parse_trader(item, i + 1)
                        .map_err(|err| prefix_error(err, &format!("trader {}", i + 1)))?;
                    traders.push(trader);
                }
                traders
            }
            _ => vec![parse_trader(value, 1)?],
        };
        Ok(Self { traders })
    }
}

fn parse_trader(value: &Value, trader_no: usize) -> Result<TraderHoldings, RelayError> {
    let obj = as_object(value)?;
    require_fields(obj, TRADER_REQUIRED)?;

    let infos = obj
        .get("infos")
        .and_then(Value::as_array)
        .ok_or_else(|| RelayError::Validation("infos must be a non-empty list".to_string()))?;
    if infos.is_empty() {
        return Err(RelayError::Validation(
            "infos must be a non-empty list".to_string(),
        ));
    }

    let mut positions = Vec::with_capacity(infos.len());
    for (j, info) in infos.iter().enumerate() {
        let position = parse_position(info)
            .map_err(|err| prefix_error(err, &format!("trader {trader_no} - info {}", j + 1)))?;
        positions.push(position);
    }

    Ok(TraderHoldings {
        trader_uid: field_string(obj, "trader_uid"),
        trader_name: field_string(obj, "trader_name"),
        detail_url: field_string(obj, "trader_detail_url"),
        positions,
    })
}

fn parse_position(value: &Value) -> Result<HoldingPosition, RelayError> {
    let obj = as_object(value)?;
    require_fields(obj, INFO_REQUIRED)?;

    Ok(HoldingPosition {
        pair: field_string(obj, "pair"),
        side: Side::parse("pair_side", &field_string(obj, "pair_side"))?,
        margin_type: MarginType::parse("pair_margin_type", &field_string(obj, "pair_margin_type"))?,
        leverage: numeric(obj, "pair_leverage")?,
        entry_price: numeric(obj, "entry_price")?,
        current_price: numeric(obj, "current_price")?,
        unrealized_pnl_percentage: numeric(obj, "unrealized_pnl_percentage")?,
        tp_price: optional_price(obj, "tp_price")?,
        sl_price: optional_price(obj, "sl_price")?,
    })
}

fn prefix_error(err: RelayError, prefix: &str) -> RelayError {
    match err {
        RelayError::Validation(msg) => RelayError::Validation(format!("{prefix}: {msg}")),
        other => other,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn trader_payload() -> Value {
        json!({
            "trader_uid": "123",
            "trader_name": "Ada",
            "trader_detail_url": "https://example.com/t/123",
            "infos": [
                {
                    "pair": "BTCUSDT",
                    "pair_side": "1",
                    "pair_margin_type": "2",
                    "pair_leverage": "20",
                    "entry_price": "64000",
                    "current_price": "65000",
                    "unrealized_pnl_percentage": "3.125",
                    "tp_price": "70000",
                    "sl_price": "None"
                },
                {
                    "pair": "ETHUSDT",
                    "pair_side": "2",
                    "pair_margin_type": "1",
                    "pair_leverage": "10",
                    "entry_price": "3500",
                    "current_price": "3400",
                    "unrealized_pnl_percentage": "2.857"
                }
            ]
        })
    }

    #[test]
    fn single_trader_parses() {
        let Ok(report) = HoldingReport::parse(&trader_payload()) else {
            panic!("expected valid payload to parse");
        };
        assert_eq!(report.traders.len(), 1);
        let Some(trader) = report.traders.first() else {
            panic!("one trader expected");
        };
        assert_eq!(trader.positions.len(), 2);
        let Some(first) = trader.positions.first() else {
            panic!("positions expected");
        };
        assert_eq!(first.tp_price.as_deref(), Some("70000"));
        assert!(first.sl_price.is_none());
    }

    #[test]
    fn trader_list_parses() {
        let list = json!([trader_payload(), trader_payload()]);
        let Ok(report) = HoldingReport::parse(&list) else {
            panic!("expected valid list to parse");
        };
        assert_eq!(report.traders.len(), 2);
    }

    #[test]
    fn list_errors_carry_position_context() {
        let mut second = trader_payload();
        if let Some(infos) = second
            .as_object_mut()
            .and_then(|o| o.get_mut("infos"))
            .and_then(Value::as_array_mut)
        {
            if let Some(info) = infos.get_mut(1).and_then(Value::as_object_mut) {
                info.remove("entry_price");
            }
        }
        let list = json!([trader_payload(), second]);
        let Err(RelayError::Validation(msg)) = HoldingReport::parse(&list) else {
            panic!("expected validation error");
        };
        assert!(msg.contains("trader 2 - info 2"), "{msg}");
        assert!(msg.contains("entry_price"), "{msg}");
    }

    #[test]
    fn empty_infos_rejected() {
        let mut value = trader_payload();
        if let Some(obj) = value.as_object_mut() {
            obj.insert("infos".to_string(), json!([]));
        }
        assert!(HoldingReport::parse(&value).is_err());
    }

    #[test]
    fn empty_list_rejected() {
        assert!(HoldingReport::parse(&json!([])).is_err());
    }
}
