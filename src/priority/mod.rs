//! Priority resolver.
//!
//! Turns classified league buckets into ranked, titled home page buckets,
//! and picks the matches for each standalone league page.

use serde::Serialize;
use tracing::debug;

use crate::classify::ClassifiedStack;
use crate::config::{BoostSet, PriorityTable, DEFAULT_SCORE};
use crate::models::MatchRecord;

/// Uppercase the first letter of every word, leave the rest as written.
/// Words are separated by whitespace or hyphens.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.trim().chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = c.is_whitespace() || c == '-';
    }
    out
}

/// A league bucket that survived priority filtering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedBucket {
    /// `sport-slug/league-slug`
    pub key: String,
    pub title: String,
    pub score: i64,
    pub matches: Vec<MatchRecord>,
}

/// Output of [`resolve`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Resolution {
    /// Highest score first; ties keep classification order
    pub buckets: Vec<ResolvedBucket>,
    pub boost: BoostSet,
}

/// Rank and title every league bucket against the priority table.
pub fn resolve(stack: &ClassifiedStack, table: &PriorityTable) -> Resolution {
    let mut buckets = Vec::new();

    for league in stack.buckets() {
        let key = format!("{}/{}", league.sport_slug, league.slug);
        let (title, score) = match table.match_name(&league.name) {
            Some(rule) if rule.is_hidden => {
                debug!("Hiding {} (rule '{}')", key, rule.key);
                continue;
            }
            Some(rule) => (title_case(&rule.key), rule.score),
            None if table.hide_others => {
                debug!("Hiding {} (no rule, others hidden)", key);
                continue;
            }
            None => (title_case(&league.name), DEFAULT_SCORE),
        };

        buckets.push(ResolvedBucket {
            key,
            title,
            score,
            matches: league.matches.clone(),
        });
    }

    // Vec::sort_by is stable, so equal scores keep classification order.
    buckets.sort_by(|a, b| b.score.cmp(&a.score));

    Resolution {
        buckets,
        boost: table.boost.clone(),
    }
}

/// Matches selected for one standalone league page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandaloneScope {
    pub title: String,
    /// Rule key as configured
    pub key: String,
    pub score: i64,
    pub matches: Vec<MatchRecord>,
}

/// One scope per linked rule, in configuration order.
///
/// Each scope draws from the whole feed: a record belongs to it when the
/// rule key occurs in the record's league or sport name. A record can land
/// on several pages.
pub fn standalone_scopes(records: &[MatchRecord], table: &PriorityTable) -> Vec<StandaloneScope> {
    table
        .linked_rules()
        .map(|rule| StandaloneScope {
            title: title_case(&rule.key),
            key: rule.key.clone(),
            score: rule.score,
            matches: records
                .iter()
                .filter(|m| rule.matches(m.league_name()) || rule.matches(m.sport_name()))
                .cloned()
                .collect(),
        })
        .collect()
}
