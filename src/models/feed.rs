//! Raw feed envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::MatchRecord;

/// The shapes the feed endpoint is known to answer with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeedPayload {
    /// A bare JSON array of matches.
    Sequence(Vec<Value>),

    /// An object with the array under `matches`.
    Wrapped { matches: Vec<Value> },

    /// Anything else; carries no matches.
    Unrecognized(Value),
}

/// Records decoded from a payload.
#[derive(Debug, Clone, Default)]
pub struct DecodedFeed {
    pub records: Vec<MatchRecord>,
    /// Object entries that did not decode as a match.
    pub skipped: usize,
}

impl FeedPayload {
    /// Decode a response body. Invalid JSON is reported and yields an
    /// unrecognized payload rather than an error.
    pub fn from_slice(body: &[u8]) -> Self {
        match serde_json::from_slice::<FeedPayload>(body) {
            Ok(payload) => payload,
            Err(e) => {
                let preview: String = String::from_utf8_lossy(body).chars().take(100).collect();
                warn!("Feed body is not valid JSON ({}): {}", e, preview);
                FeedPayload::Unrecognized(Value::Null)
            }
        }
    }

    /// Short name of the payload shape for logging.
    pub fn shape(&self) -> &'static str {
        match self {
            FeedPayload::Sequence(_) => "sequence",
            FeedPayload::Wrapped { .. } => "wrapped",
            FeedPayload::Unrecognized(_) => "unrecognized",
        }
    }

    /// Decode every object entry into a record.
    ///
    /// Non-object entries are skipped silently; objects that fail to decode
    /// are skipped with a warning.
    pub fn decode(self) -> DecodedFeed {
        let entries = match self {
            FeedPayload::Sequence(entries) => entries,
            FeedPayload::Wrapped { matches } => {
                debug!("Found 'matches' key in feed response");
                matches
            }
            FeedPayload::Unrecognized(value) => {
                warn!(
                    "Unknown feed structure (type: {}), treating as no data",
                    json_type_name(&value)
                );
                return DecodedFeed::default();
            }
        };

        let mut decoded = DecodedFeed {
            records: Vec::with_capacity(entries.len()),
            skipped: 0,
        };
        for (index, entry) in entries.into_iter().enumerate() {
            if !entry.is_object() {
                continue;
            }
            match serde_json::from_value::<MatchRecord>(entry) {
                Ok(record) => decoded.records.push(record),
                Err(e) => {
                    warn!("Skipping feed entry {}: {}", index, e);
                    decoded.skipped += 1;
                }
            }
        }
        decoded
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
