//! Turns a free-form judge reply into candidate labels.
//!
//! Two tiers, tried in order:
//! 1. the outermost `{...}` span parsed as JSON, reading the
//!    `selected_indices` list;
//! 2. every run of ASCII digits anywhere in the reply.
//!
//! Neither tier fails: a reply with no usable numbers means the judge picked
//! nothing.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Key the judge is asked to answer under.
pub const SELECTION_FIELD: &str = "selected_indices";

/// Compile `pattern` once into `cell`; a pattern that fails to compile is
/// logged and treated as matching nothing.
pub(crate) fn cached_regex(
    cell: &'static OnceLock<Option<Regex>>,
    pattern: &str,
) -> Option<&'static Regex> {
    cell.get_or_init(|| {
        Regex::new(pattern)
            .map_err(|err| warn!(pattern, error = %err, "regex failed to compile"))
            .ok()
    })
    .as_ref()
}

fn json_object_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    cached_regex(&PATTERN, r"(?s)\{.*\}")
}

fn digits_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    cached_regex(&PATTERN, r"\d+")
}

/// Which tier produced the labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    Structured,
    DigitScan,
}

/// Labels extracted from a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVerdict {
    pub labels: Vec<u32>,
    pub strategy: ParseStrategy,
}

/// Extract labels from `raw`, falling back to a digit scan.
pub fn parse_verdict(raw: &str) -> ParsedVerdict {
    if let Some(labels) = parse_structured(raw) {
        debug!(?labels, "parsed structured judge reply");
        return ParsedVerdict {
            labels,
            strategy: ParseStrategy::Structured,
        };
    }

    let labels = scan_digits(raw);
    if labels.is_empty() {
        warn!(reply = %raw, "judge reply contained no labels");
    } else {
        debug!(?labels, "extracted labels by digit scan");
    }
    ParsedVerdict {
        labels,
        strategy: ParseStrategy::DigitScan,
    }
}

/// Read `selected_indices` from the JSON object embedded in `raw`.
///
/// `None` when there is no object, it does not parse, or the field is missing
/// or not a list.
fn parse_structured(raw: &str) -> Option<Vec<u32>> {
    let span = json_object_pattern()?.find(raw)?;
    let value: Value = match serde_json::from_str(span.as_str()) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "judge reply JSON did not parse, scanning for digits");
            return None;
        }
    };

    let Some(Value::Array(items)) = value.get(SELECTION_FIELD) else {
        warn!("judge reply JSON lacks a '{SELECTION_FIELD}' list, scanning for digits");
        return None;
    };

    Some(items.iter().filter_map(label_from_json).collect())
}

fn label_from_json(item: &Value) -> Option<u32> {
    match item {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            s.parse().ok()
        }
        _ => None,
    }
}

fn scan_digits(raw: &str) -> Vec<u32> {
    let Some(pattern) = digits_pattern() else {
        return Vec::new();
    };
    pattern
        .find_iter(raw)
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}
