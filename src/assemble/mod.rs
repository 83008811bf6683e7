//! Section assembler.
//!
//! Splits one page's matches into the bands the page renders. Within a page
//! every match id lands in at most one band.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::config::BoostSet;
use crate::models::{dedup_by_id, MatchId, MatchRecord};
use crate::priority::{Resolution, StandaloneScope};

/// Size of the home page's top-upcoming band.
pub const TOP_UPCOMING_LIMIT: usize = 5;

/// A titled, scored group of matches on the home page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedBucket {
    pub title: String,
    pub score: i64,
    pub matches: Vec<MatchRecord>,
}

/// Everything below the live and top-upcoming bands.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "sections", rename_all = "lowercase")]
pub enum PageBody {
    /// Home page: ranked league buckets
    Grouped(Vec<GroupedBucket>),
    /// Standalone page: one flat list
    Schedule(Vec<MatchRecord>),
}

/// The sections of one output page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionAssembly {
    pub live: Vec<MatchRecord>,
    pub top_upcoming: Vec<MatchRecord>,
    pub body: PageBody,
}

impl SectionAssembly {
    pub fn grouped_buckets(&self) -> &[GroupedBucket] {
        match &self.body {
            PageBody::Grouped(buckets) => buckets,
            PageBody::Schedule(_) => &[],
        }
    }

    pub fn schedule(&self) -> &[MatchRecord] {
        match &self.body {
            PageBody::Schedule(matches) => matches,
            PageBody::Grouped(_) => &[],
        }
    }

    /// Number of matches rendered on the page.
    pub fn match_count(&self) -> usize {
        let body = match &self.body {
            PageBody::Grouped(buckets) => buckets.iter().map(|b| b.matches.len()).sum(),
            PageBody::Schedule(matches) => matches.len(),
        };
        self.live.len() + self.top_upcoming.len() + body
    }

    pub fn is_empty(&self) -> bool {
        self.match_count() == 0
    }
}

/// Missing or NaN start times sort after every real one.
fn compare_start(a: &MatchRecord, b: &MatchRecord) -> Ordering {
    match (a.start_key(), b.start_key()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Boosted leagues first, then earliest start, then feed order.
pub fn top_upcoming(candidates: &[MatchRecord], boost: &BoostSet) -> Vec<MatchRecord> {
    let mut ranked: Vec<(bool, &MatchRecord)> = candidates
        .iter()
        .filter(|m| !m.is_live())
        .map(|m| (!boost.is_boosted(m.league_name()), m))
        .collect();
    ranked.sort_by(|(a_rest, a), (b_rest, b)| a_rest.cmp(b_rest).then_with(|| compare_start(a, b)));
    ranked
        .into_iter()
        .take(TOP_UPCOMING_LIMIT)
        .map(|(_, m)| m.clone())
        .collect()
}

fn live_matches(scope: &[MatchRecord]) -> Vec<MatchRecord> {
    scope.iter().filter(|m| m.is_live()).cloned().collect()
}

/// Home page: live band, top-upcoming band, then ranked buckets with the
/// already-shown matches removed. Buckets left empty are dropped.
pub fn assemble_home(scope: &[MatchRecord], resolution: &Resolution) -> SectionAssembly {
    let scope = dedup_by_id(scope.to_vec(), |m| m.id.as_str());
    let live = live_matches(&scope);
    let top = top_upcoming(&scope, &resolution.boost);

    let mut placed: HashSet<&MatchId> = live.iter().chain(top.iter()).map(|m| &m.id).collect();
    let mut buckets = Vec::new();
    for bucket in &resolution.buckets {
        let matches: Vec<MatchRecord> = bucket
            .matches
            .iter()
            .filter(|m| !m.is_live() && placed.insert(&m.id))
            .cloned()
            .collect();
        if matches.is_empty() {
            continue;
        }
        buckets.push(GroupedBucket {
            title: bucket.title.clone(),
            score: bucket.score,
            matches,
        });
    }

    SectionAssembly {
        live,
        top_upcoming: top,
        body: PageBody::Grouped(buckets),
    }
}

/// Standalone page: live band plus a flat schedule, no top-upcoming band.
pub fn assemble_standalone(scope: &StandaloneScope) -> SectionAssembly {
    let matches = dedup_by_id(scope.matches.clone(), |m| m.id.as_str());
    let (live, schedule): (Vec<MatchRecord>, Vec<MatchRecord>) =
        matches.into_iter().partition(|m| m.is_live());

    SectionAssembly {
        live,
        top_upcoming: Vec::new(),
        body: PageBody::Schedule(schedule),
    }
}
