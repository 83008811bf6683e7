//! Classifier: groups feed records into sport -> league buckets.
//!
//! Buckets and the sports holding them keep first-seen order, and matches
//! keep feed order inside their bucket. That order is the tie-break the
//! priority resolver relies on.

use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::info;

use crate::models::{FeedPayload, MatchRecord};

/// Grouping key: lowercase, trimmed, whitespace runs become one hyphen.
pub fn slugify(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// All matches of one league within one sport.
#[derive(Debug, Clone, PartialEq)]
pub struct LeagueBucket {
    pub sport_slug: String,
    pub slug: String,
    /// League name as the feed spelled it on its first match
    pub name: String,
    pub matches: Vec<MatchRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SportGroup {
    pub slug: String,
    pub leagues: Vec<LeagueBucket>,
    league_index: HashMap<String, usize>,
}

impl SportGroup {
    fn new(slug: String) -> Self {
        Self {
            slug,
            leagues: Vec::new(),
            league_index: HashMap::new(),
        }
    }

    pub fn league(&self, slug: &str) -> Option<&LeagueBucket> {
        self.league_index.get(slug).map(|&i| &self.leagues[i])
    }
}

/// Result of one classification pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedStack {
    /// Every decoded record, in feed order
    pub records: Vec<MatchRecord>,
    /// Entries dropped because they did not decode
    pub skipped: usize,
    sports: Vec<SportGroup>,
    sport_index: HashMap<String, usize>,
}

impl ClassifiedStack {
    pub fn sports(&self) -> &[SportGroup] {
        &self.sports
    }

    pub fn sport(&self, slug: &str) -> Option<&SportGroup> {
        self.sport_index.get(slug).map(|&i| &self.sports[i])
    }

    /// Every league bucket in classification order.
    pub fn buckets(&self) -> impl Iterator<Item = &LeagueBucket> {
        self.sports.iter().flat_map(|s| s.leagues.iter())
    }

    pub fn league_count(&self) -> usize {
        self.sports.iter().map(|s| s.leagues.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn insert(&mut self, record: MatchRecord) {
        let sport_slug = slugify(record.sport_name());
        let league_slug = slugify(record.league_name());

        let sport_pos = match self.sport_index.get(&sport_slug) {
            Some(&pos) => pos,
            None => {
                self.sports.push(SportGroup::new(sport_slug.clone()));
                self.sport_index.insert(sport_slug.clone(), self.sports.len() - 1);
                self.sports.len() - 1
            }
        };
        let sport = &mut self.sports[sport_pos];

        let league_pos = match sport.league_index.get(&league_slug) {
            Some(&pos) => pos,
            None => {
                sport.leagues.push(LeagueBucket {
                    sport_slug,
                    slug: league_slug.clone(),
                    name: record.league_name().to_string(),
                    matches: Vec::new(),
                });
                sport.league_index.insert(league_slug, sport.leagues.len() - 1);
                sport.leagues.len() - 1
            }
        };
        sport.leagues[league_pos].matches.push(record.clone());
        self.records.push(record);
    }

    /// Nested `{sport: {league: [matches]}}` view for the debug dump.
    pub fn to_json(&self) -> Value {
        let mut sports = Map::new();
        for sport in &self.sports {
            let mut leagues = Map::new();
            for league in &sport.leagues {
                leagues.insert(
                    league.slug.clone(),
                    serde_json::to_value(&league.matches).unwrap_or(Value::Null),
                );
            }
            sports.insert(sport.slug.clone(), Value::Object(leagues));
        }
        Value::Object(sports)
    }
}

/// Classify a raw feed payload. Unknown shapes give an empty stack.
pub fn classify(payload: FeedPayload) -> ClassifiedStack {
    let decoded = payload.decode();
    let mut stack = ClassifiedStack {
        skipped: decoded.skipped,
        ..Default::default()
    };
    for record in decoded.records {
        stack.insert(record);
    }

    info!(
        "Classified {} matches into {} sports / {} leagues ({} skipped)",
        stack.records.len(),
        stack.sports.len(),
        stack.league_count(),
        stack.skipped
    );
    stack
}
