//! Extraction of order ids and payer names from forwarded payment notifications.
//!
//! The listener app forwards the raw Android notification extras as a JSON object. Nothing about the payload is
//! guaranteed: keys may be missing, empty, or hold non-string values. Parsing is a pure function of the payload, so
//! that rule changes never touch persistence or authorization.
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::db_types::OrderId;

pub const TITLE_KEY: &str = "android.title";
pub const TEXT_KEY: &str = "android.text";
pub const BIG_TEXT_KEY: &str = "android.bigText";
pub const UNKNOWN_PAYER: &str = "Unknown";

/// The first run of ten ASCII digits. A longer run yields its first ten digits.
static ORDER_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]{10}").expect("static regex is valid"));
static PAYER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(.+?)\s+paid\b").expect("static regex is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedNotification {
    pub order_id: Option<OrderId>,
    pub payer_name: String,
}

/// Parses a raw notification payload.
///
/// The order id is searched for in `android.bigText`, or in `android.text` if the big text is absent or empty. The
/// title is never searched for an id. The payer name is taken from a title of the form `"<name> paid ..."`.
pub fn parse_notification(raw: &Value) -> ParsedNotification {
    let order_id = order_id_source(raw).and_then(extract_order_id);
    let payer_name = string_field(raw, TITLE_KEY).and_then(extract_payer_name).unwrap_or_else(|| UNKNOWN_PAYER.into());
    ParsedNotification { order_id, payer_name }
}

/// Returns the first 10-digit run in `text`, if any.
pub fn extract_order_id(text: &str) -> Option<OrderId> {
    ORDER_ID_RE.find(text).map(|m| OrderId::from(m.as_str()))
}

pub fn extract_payer_name(title: &str) -> Option<String> {
    PAYER_RE.captures(title).and_then(|c| c.get(1)).map(|m| m.as_str().to_string())
}

fn order_id_source(raw: &Value) -> Option<&str> {
    string_field(raw, BIG_TEXT_KEY).or_else(|| string_field(raw, TEXT_KEY))
}

fn string_field<'a>(raw: &'a Value, key: &str) -> Option<&'a str> {
    raw.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}
