//! Typed event model and schema-validating parsers.
//!
//! Inbound payloads arrive as raw `serde_json::Value` and are parsed into
//! one struct per event kind. Parsing is the validation step: it collects
//! **every** missing required field into a single message, then applies
//! enum, numeric, cross-field and timestamp checks. A parse failure is the
//! only error a client ever sees — no side effect happens before it.

pub mod announcement;
pub mod copy_signal;
pub mod holding_report;
pub mod scalp_update;
pub mod trade_summary;
pub mod weekly_report;

pub use announcement::Announcement;
pub use copy_signal::CopySignal;
pub use holding_report::{HoldingPosition, HoldingReport, TraderHoldings};
pub use scalp_update::ScalpUpdate;
pub use trade_summary::TradeSummary;
pub use weekly_report::WeeklyReport;

use serde_json::{Map, Value};

use crate::error::RelayError;

/// Position side, wire-encoded as `"1"` / `"2"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Long position (`"1"`).
    Long,
    /// Short position (`"2"`).
    Short,
}

impl Side {
    /// Parses the wire code. Accepts the string or numeric form of 1/2.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Validation`] for any other value.
    pub fn parse(field: &str, code: &str) -> Result<Self, RelayError> {
        match code {
            "1" => Ok(Self::Long),
            "2" => Ok(Self::Short),
            other => Err(RelayError::Validation(format!(
                "{field} must be '1' (Long) or '2' (Short), got '{other}'"
            ))),
        }
    }

    /// Human-readable label used in rendered messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Long => "Long",
            Self::Short => "Short",
        }
    }

    /// Wire code, for catalog key composition (`common.sides.1`).
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Long => "1",
            Self::Short => "2",
        }
    }
}

/// Margin mode, wire-encoded as `"1"` / `"2"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarginType {
    /// Cross margin (`"1"`).
    Cross,
    /// Isolated margin (`"2"`).
    Isolated,
}

impl MarginType {
    /// Parses the wire code. Accepts the string or numeric form of 1/2.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Validation`] for any other value.
    pub fn parse(field: &str, code: &str) -> Result<Self, RelayError> {
        match code {
            "1" => Ok(Self::Cross),
            "2" => Ok(Self::Isolated),
            other => Err(RelayError::Validation(format!(
                "{field} must be '1' (Cross) or '2' (Isolated), got '{other}'"
            ))),
        }
    }

    /// Human-readable label used in rendered messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cross => "Cross",
            Self::Isolated => "Isolated",
        }
    }
}

/// Trade action for copy-signals, wire-encoded as `"buy"` / `"sell"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    /// `"buy"` — a position was opened.
    Open,
    /// `"sell"` — a position was closed.
    Close,
}

impl TradeAction {
    /// Parses the wire value.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Validation`] for anything but `buy`/`sell`.
    pub fn parse(code: &str) -> Result<Self, RelayError> {
        match code {
            "buy" => Ok(Self::Open),
            "sell" => Ok(Self::Close),
            other => Err(RelayError::Validation(format!(
                "pair_type must be 'buy' or 'sell', got '{other}'"
            ))),
        }
    }

    /// Label rendered in the copy-signal headline.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Close => "Close",
        }
    }
}

// ── Field Extraction Helpers ────────────────────────────────────────────

/// Presence check: null, `""`, `false`, `0`, and empty containers count as
/// missing, matching the upstream producers' loose field conventions.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Requires the payload to be a JSON object.
pub(crate) fn as_object(value: &Value) -> Result<&Map<String, Value>, RelayError> {
    value
        .as_object()
        .ok_or_else(|| RelayError::Validation("payload must be a JSON object".to_string()))
}

/// Checks every name in `required`, reporting all absent fields at once.
pub(crate) fn require_fields(
    obj: &Map<String, Value>,
    required: &[&str],
) -> Result<(), RelayError> {
    let missing: Vec<&str> = required
        .iter()
        .filter(|name| !obj.get(**name).is_some_and(is_present))
        .copied()
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(RelayError::Validation(format!(
            "missing fields: {}",
            missing.join(", ")
        )))
    }
}

/// Returns the field's display form: strings verbatim, numbers via their
/// JSON rendering, anything else empty.
pub(crate) fn field_string(obj: &Map<String, Value>, name: &str) -> String {
    match obj.get(name) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Parses a required field as `f64`, accepting numbers and numeric strings.
pub(crate) fn numeric(obj: &Map<String, Value>, name: &str) -> Result<f64, RelayError> {
    parse_numeric(obj.get(name))
        .ok_or_else(|| RelayError::Validation(format!("{name} must be a number")))
}

/// Parses a required field as `i64`, accepting numbers and numeric strings.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn integer(obj: &Map<String, Value>, name: &str) -> Result<i64, RelayError> {
    parse_numeric(obj.get(name))
        .map(|f| f as i64)
        .ok_or_else(|| RelayError::Validation(format!("{name} must be an integer")))
}

/// Parses a millisecond-epoch timestamp field.
///
/// Values below 10^12 (e.g. 10-digit second epochs) are rejected as
/// wrong-unit rather than silently producing dates in 1970.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn timestamp_ms(obj: &Map<String, Value>, name: &str) -> Result<i64, RelayError> {
    let ts = parse_numeric(obj.get(name))
        .map(|f| f as i64)
        .ok_or_else(|| {
            RelayError::Validation(format!("{name} must be a millisecond epoch timestamp"))
        })?;
    if ts < 1_000_000_000_000 {
        return Err(RelayError::Validation(format!(
            "{name} must be a millisecond epoch timestamp (13 digits)"
        )));
    }
    Ok(ts)
}

/// Optional price-like field: absent / `""` / `"None"` / `"null"` → `None`;
/// anything else must parse as a number and is kept in its raw display form.
pub(crate) fn optional_price(
    obj: &Map<String, Value>,
    name: &str,
) -> Result<Option<String>, RelayError> {
    let raw = match obj.get(name) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.is_empty() || s == "None" || s == "null" => return Ok(None),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => {
            return Err(RelayError::Validation(format!("{name} must be a number")));
        }
    };
    if raw.parse::<f64>().is_err() {
        return Err(RelayError::Validation(format!("{name} must be a number")));
    }
    Ok(Some(raw))
}

fn parse_numeric(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}
