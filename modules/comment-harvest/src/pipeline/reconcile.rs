//! Payload reconciliation: raw downloader output → canonical [`CommentRecord`]s.
//!
//! The downloader writes either a bare JSON array of comment objects or a
//! `{"comments": [...]}` object. When it is killed mid-write the file ends
//! inside the array. [`repair_truncated`] salvages every complete record
//! before the cut by closing the array at the last `},` boundary.
//!
//! Known limitation: the boundary search is textual. A `},` inside the text of
//! the trailing partial record is taken as a record boundary and the repaired
//! payload then fails to parse.

use std::borrow::Cow;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use harvest_common::{CommentRecord, ItemReference};

/// Marks the end of one complete record inside the comments array.
const RECORD_TERMINATOR: &str = "},";

/// Result of reconciling one payload. Never an error: a payload that cannot be
/// used carries a `rejection` reason and no records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    pub records: Vec<CommentRecord>,
    /// Array elements that were not objects.
    pub skipped: usize,
    /// The truncation repair was applied.
    pub repaired: bool,
    pub rejection: Option<String>,
}

impl Reconciliation {
    fn rejected(reason: String, repaired: bool) -> Self {
        Self {
            records: Vec::new(),
            skipped: 0,
            repaired,
            rejection: Some(reason),
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.rejection.is_some()
    }
}

/// Parse `raw` into canonical records tagged with `item`'s identity.
pub fn reconcile(raw: &str, item: &ItemReference) -> Reconciliation {
    let trimmed = raw.trim();
    let (text, repaired) = match repair_truncated(trimmed) {
        Some(fixed) => {
            warn!(
                item_id = item.display_id(),
                "Payload looks truncated, closing the array at the last complete record"
            );
            (Cow::Owned(fixed), true)
        }
        None => (Cow::Borrowed(trimmed), false),
    };

    let value: Value = match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(e) => {
            warn!(item_id = item.display_id(), error = %e, "Payload is not valid JSON");
            return Reconciliation::rejected(format!("invalid JSON: {e}"), repaired);
        }
    };

    let elements = match value {
        Value::Array(elements) => elements,
        Value::Object(mut fields) => match fields.remove("comments") {
            Some(Value::Array(elements)) => elements,
            Some(other) => {
                let reason = format!("`comments` is {}, not an array", json_kind(&other));
                warn!(item_id = item.display_id(), reason = reason.as_str(), "Unsupported payload shape");
                return Reconciliation::rejected(reason, repaired);
            }
            None => {
                let reason = "object without a `comments` field".to_string();
                warn!(item_id = item.display_id(), reason = reason.as_str(), "Unsupported payload shape");
                return Reconciliation::rejected(reason, repaired);
            }
        },
        other => {
            let reason = format!("top-level {} payload", json_kind(&other));
            warn!(item_id = item.display_id(), reason = reason.as_str(), "Unsupported payload shape");
            return Reconciliation::rejected(reason, repaired);
        }
    };

    let mut records = Vec::with_capacity(elements.len());
    let mut skipped = 0;
    for (index, element) in elements.into_iter().enumerate() {
        match element {
            Value::Object(fields) => records.push(to_record(&fields, item)),
            other => {
                skipped += 1;
                warn!(
                    item_id = item.display_id(),
                    index,
                    kind = json_kind(&other),
                    "Skipping non-object comment entry"
                );
            }
        }
    }

    debug!(
        item_id = item.display_id(),
        records = records.len(),
        skipped,
        repaired,
        "Payload reconciled"
    );

    Reconciliation {
        records,
        skipped,
        repaired,
        rejection: None,
    }
}

/// Close a payload that stops inside its comments array.
///
/// Returns `None` when the text already ends like a complete document, when no
/// comments array can be located, or when the array holds no complete record.
/// Such text goes to the parser unchanged and is rejected there.
pub fn repair_truncated(text: &str) -> Option<String> {
    if text.ends_with('}') || text.ends_with(']') {
        return None;
    }

    let (array_start, closing) = if let Some(start) = comments_array_start(text) {
        (start, "\n    ]\n}")
    } else if text.starts_with('[') {
        (0, "\n]")
    } else {
        return None;
    };

    let boundary = text
        .rfind(RECORD_TERMINATOR)
        .filter(|boundary| *boundary > array_start)?;

    // Keep the closing brace of the last complete record.
    Some(format!("{}{}", &text[..boundary + 1], closing))
}

/// Byte offset of the `[` that opens the `"comments"` array.
fn comments_array_start(text: &str) -> Option<usize> {
    text.match_indices("\"comments\"").find_map(|(pos, key)| {
        let after_key = &text[pos + key.len()..];
        let after_colon = after_key.trim_start().strip_prefix(':')?;
        let at_bracket = after_colon.trim_start();
        at_bracket
            .starts_with('[')
            .then(|| text.len() - at_bracket.len())
    })
}

fn to_record(fields: &Map<String, Value>, item: &ItemReference) -> CommentRecord {
    let group_label = if item.group_label.is_empty() {
        None
    } else {
        Some(item.group_label.clone())
    };

    CommentRecord {
        item_id: item.item_id.clone().unwrap_or_default(),
        item_title: item.title.clone(),
        item_url: item.url.clone(),
        group_label,
        comment_id: text_field(fields, "cid"),
        text: text_field(fields, "text"),
        author: text_field(fields, "author"),
        author_channel_id: text_field(fields, "channel"),
        like_count: coerce_count(fields.get("votes")),
        reply_count: coerce_count(fields.get("replies")),
        published_time: text_field(fields, "time"),
        published_timestamp: timestamp_field(fields.get("time_parsed")),
        is_pinned: flag(fields, "pinned"),
        is_author_reply: flag(fields, "author_is_uploader"),
        photo_url: text_field(fields, "photo"),
        has_heart: flag(fields, "heart"),
    }
}

/// Counts arrive as numbers or as strings with thousands separators
/// (`"1,234"`). Anything else, including negatives, becomes 0.
pub fn coerce_count(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f > 0.0)
                    .map(|f| f as u64)
            })
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let digits: String = s.trim().chars().filter(|c| *c != ',').collect();
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                digits.parse().unwrap_or(0)
            } else {
                0
            }
        }
        _ => 0,
    }
}

fn text_field(fields: &Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn timestamp_field(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

fn flag(fields: &Map<String, Value>, key: &str) -> bool {
    matches!(fields.get(key), Some(Value::Bool(true)))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
