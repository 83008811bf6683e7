//! Match identifiers.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Identifier of a match as issued by the feed.
///
/// The feed sends ids either as strings or as bare numbers; both are kept
/// as their textual form so `"42"` and `42` name the same match.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for MatchId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        let id = match RawId::deserialize(deserializer)? {
            RawId::Text(s) => s.trim().to_string(),
            RawId::Number(n) => n.to_string(),
        };
        if id.is_empty() {
            return Err(serde::de::Error::custom("match id is empty"));
        }
        Ok(Self(id))
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MatchId({})", self.0)
    }
}

impl From<String> for MatchId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MatchId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Drop later items whose key was already seen, keeping the first.
pub fn dedup_by_id<T, F>(items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let mut seen: HashSet<String> = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(key(item).to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_id_from_string_json() {
        let id: MatchId = serde_json::from_str(r#""abc-123""#).unwrap();
        assert_eq!(id.as_str(), "abc-123");
    }

    #[test]
    fn test_match_id_from_number_json() {
        let id: MatchId = serde_json::from_str("98765").unwrap();
        assert_eq!(id, MatchId::from("98765"));
    }

    #[test]
    fn test_match_id_rejects_blank() {
        assert!(serde_json::from_str::<MatchId>(r#""   ""#).is_err());
    }

    #[test]
    fn test_match_id_rejects_object() {
        assert!(serde_json::from_str::<MatchId>(r#"{"id": 1}"#).is_err());
    }

    #[test]
    fn test_match_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&MatchId::new("m1")).unwrap();
        assert_eq!(json, r#""m1""#);
    }

    #[test]
    fn test_match_id_display_and_debug() {
        let id = MatchId::new("m-7");
        assert_eq!(format!("{}", id), "m-7");
        assert!(format!("{:?}", id).contains("m-7"));
    }

    #[test]
    fn test_dedup_by_id_keeps_first() {
        let items = vec![("a", 1), ("b", 2), ("a", 3)];
        let deduped = dedup_by_id(items, |i| i.0);
        assert_eq!(deduped, vec![("a", 1), ("b", 2)]);
    }
}
