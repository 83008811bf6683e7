//! Per-country league priorities from `sport_priorities`.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::SiteConfig;

/// Score given to leagues without an explicit one.
pub const DEFAULT_SCORE: i64 = 50;

const BOOST_KEY: &str = "_BOOST";
const HIDE_OTHERS_KEY: &str = "_HIDE_OTHERS";

/// Lowercase and collapse whitespace so names compare by words.
pub fn fold_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// One configured league or sport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityRule {
    /// Display name as the operator wrote it
    pub key: String,
    pub score: i64,
    pub is_hidden: bool,
    pub has_link: bool,
    /// Folded key used for containment tests
    #[serde(skip)]
    needle: String,
}

impl PriorityRule {
    pub fn new(key: impl Into<String>, score: i64) -> Self {
        let key = key.into();
        let needle = fold_name(&key);
        Self {
            key,
            score,
            is_hidden: false,
            has_link: false,
            needle,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.is_hidden = true;
        self
    }

    pub fn linked(mut self) -> Self {
        self.has_link = true;
        self
    }

    /// True when this rule's key occurs inside `name` (case-insensitive).
    /// Containment is one-way: a short name inside a long key is no match.
    pub fn matches(&self, name: &str) -> bool {
        fold_name(name).contains(&self.needle)
    }

    fn from_entry(key: &str, value: &Value) -> Option<Self> {
        let Value::Object(fields) = value else {
            warn!("Priority rule '{}' is not an object, skipping", key);
            return None;
        };
        let mut rule = Self::new(key, fields.get("score").and_then(parse_score).unwrap_or(DEFAULT_SCORE));
        rule.is_hidden = fields.get("isHidden").and_then(Value::as_bool).unwrap_or(false);
        rule.has_link = fields.get("hasLink").and_then(Value::as_bool).unwrap_or(false);
        Some(rule)
    }
}

fn parse_score(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// League-name fragments that jump the top-upcoming queue.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoostSet(Vec<String>);

impl BoostSet {
    /// Parse the comma-separated `_BOOST` value.
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split(',')
                .map(fold_name)
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when any fragment occurs in the league name.
    pub fn is_boosted(&self, league: &str) -> bool {
        if self.0.is_empty() {
            return false;
        }
        let league = fold_name(league);
        self.0.iter().any(|fragment| league.contains(fragment.as_str()))
    }
}

/// Rules for one country, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriorityTable {
    pub rules: Vec<PriorityRule>,
    pub boost: BoostSet,
    pub hide_others: bool,
}

impl PriorityTable {
    /// Table for the site's target country.
    pub fn from_site_config(config: &SiteConfig) -> Self {
        Self::for_country(&config.sport_priorities, config.target_country())
    }

    /// Select `sport_priorities[country]`, tolerating any wrong shape.
    pub fn for_country(sport_priorities: &Value, country: &str) -> Self {
        match sport_priorities {
            Value::Object(countries) => match countries.get(country) {
                Some(value) => Self::from_value(value),
                None => {
                    debug!("No priorities configured for {}", country);
                    Self::default()
                }
            },
            Value::Null => Self::default(),
            _ => {
                warn!("sport_priorities is not an object, using empty priorities");
                Self::default()
            }
        }
    }

    /// Parse one country's entry.
    pub fn from_value(value: &Value) -> Self {
        let Value::Object(entries) = value else {
            warn!("Country priorities are not an object, using empty priorities");
            return Self::default();
        };

        let mut table = Self::default();
        for (key, value) in entries {
            match key.as_str() {
                BOOST_KEY => match value {
                    Value::String(raw) => table.boost = BoostSet::parse(raw),
                    _ => warn!("{} is not a string, ignoring it", BOOST_KEY),
                },
                HIDE_OTHERS_KEY => match value {
                    Value::Bool(flag) => table.hide_others = *flag,
                    _ => warn!("{} is not a boolean, ignoring it", HIDE_OTHERS_KEY),
                },
                control if control.starts_with('_') => {
                    debug!("Ignoring unknown control key {}", control);
                }
                name if name.trim().is_empty() => {
                    warn!("Skipping priority rule with blank name");
                }
                name => {
                    if let Some(rule) = PriorityRule::from_entry(name, value) {
                        table.rules.push(rule);
                    }
                }
            }
        }
        table
    }

    /// First rule, in configuration order, whose key occurs in `name`.
    pub fn match_name(&self, name: &str) -> Option<&PriorityRule> {
        self.rules.iter().find(|rule| rule.matches(name))
    }

    /// Rules that get their own standalone page.
    pub fn linked_rules(&self) -> impl Iterator<Item = &PriorityRule> {
        self.rules.iter().filter(|rule| rule.has_link)
    }
}
