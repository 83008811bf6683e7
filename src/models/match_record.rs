//! Match record model.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::MatchId;

/// Sport bucket for records that carry no sport.
pub const UNCATEGORIZED_SPORT: &str = "uncategorized";

/// League bucket for records that carry no league.
pub const OTHER_LEAGUE: &str = "other";

/// Image sources, in the order they are preferred when rendering.
const IMAGE_SOURCE_PREFERENCE: [&str; 2] = ["sport-tv-guide", "streamed"];

/// Team images keyed by the source that provided them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamImages(BTreeMap<String, Value>);

impl TeamImages {
    /// Image reference from the most preferred source that has one.
    pub fn preferred(&self) -> Option<&str> {
        IMAGE_SOURCE_PREFERENCE
            .iter()
            .filter_map(|source| self.0.get(*source))
            .filter_map(Value::as_str)
            .find(|s| !s.is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TeamImages {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), Value::String(v.into())))
                .collect(),
        )
    }
}

/// One match from the feed.
///
/// Every field except `id` may be missing or null; accessors apply the
/// display defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sport: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub league: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_team: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away_team: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_team_image: Option<TeamImages>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away_team_image: Option<TeamImages>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_live: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,

    /// Start time in milliseconds since the epoch.
    #[serde(
        rename = "startTimeUnix",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time_unix: Option<f64>,

    #[serde(rename = "startTime", default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,

    /// Display-only viewer count, kept as sent (number or text).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_viewers: Option<Value>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

impl MatchRecord {
    /// Minimal record, mostly for tests and fixtures.
    pub fn new(id: impl Into<MatchId>) -> Self {
        Self {
            id: id.into(),
            sport: None,
            league: None,
            home_team: None,
            away_team: None,
            home_team_image: None,
            away_team_image: None,
            is_live: None,
            status_text: None,
            start_time_unix: None,
            start_time: None,
            live_viewers: None,
        }
    }

    pub fn with_sport(mut self, sport: impl Into<String>) -> Self {
        self.sport = Some(sport.into());
        self
    }

    pub fn with_league(mut self, league: impl Into<String>) -> Self {
        self.league = Some(league.into());
        self
    }

    pub fn with_teams(mut self, home: impl Into<String>, away: impl Into<String>) -> Self {
        self.home_team = Some(home.into());
        self.away_team = Some(away.into());
        self
    }

    pub fn with_live(mut self, live: bool) -> Self {
        self.is_live = Some(live);
        self
    }

    pub fn with_start(mut self, unix_ms: f64) -> Self {
        self.start_time_unix = Some(unix_ms);
        self
    }

    /// Sport name as sent, or the uncategorized sentinel.
    pub fn sport_name(&self) -> &str {
        non_blank(&self.sport).unwrap_or(UNCATEGORIZED_SPORT)
    }

    /// League name as sent, or the "other" sentinel.
    pub fn league_name(&self) -> &str {
        non_blank(&self.league).unwrap_or(OTHER_LEAGUE)
    }

    pub fn home_team(&self) -> &str {
        non_blank(&self.home_team).unwrap_or("Home")
    }

    pub fn away_team(&self) -> &str {
        non_blank(&self.away_team).unwrap_or("Away")
    }

    pub fn is_live(&self) -> bool {
        self.is_live.unwrap_or(false)
    }

    pub fn status_text(&self) -> &str {
        non_blank(&self.status_text).unwrap_or("VS")
    }

    pub fn home_image(&self) -> &str {
        self.home_team_image
            .as_ref()
            .and_then(TeamImages::preferred)
            .unwrap_or("")
    }

    pub fn away_image(&self) -> &str {
        self.away_team_image
            .as_ref()
            .and_then(TeamImages::preferred)
            .unwrap_or("")
    }

    /// Start time usable as a sort key; NaN counts as missing.
    pub fn start_key(&self) -> Option<f64> {
        self.start_time_unix.filter(|t| !t.is_nan())
    }
}
