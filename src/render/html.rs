//! HTML fragments: match rows and section wrappers.

use crate::assemble::{PageBody, SectionAssembly};
use crate::config::SiteConfig;
use crate::models::MatchRecord;

const DEFAULT_LIVE_TITLE: &str = "Trending Live";
const DEFAULT_TOP_UPCOMING_TITLE: &str = "Top Upcoming";
const DEFAULT_SCHEDULE_TITLE: &str = "Schedule";
const DEFAULT_WATCH_TEXT: &str = "Watch";

/// Escape text for element content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Link to the watch page for one match.
pub fn watch_link(match_record: &MatchRecord) -> String {
    format!("/watch/?streams={}", match_record.id)
}

/// Section headings and button text, taken from the theme when set.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionLabels {
    pub live: String,
    pub top_upcoming: String,
    pub schedule: String,
    pub section_prefix: String,
    pub watch: String,
}

impl Default for SectionLabels {
    fn default() -> Self {
        Self {
            live: DEFAULT_LIVE_TITLE.to_string(),
            top_upcoming: DEFAULT_TOP_UPCOMING_TITLE.to_string(),
            schedule: DEFAULT_SCHEDULE_TITLE.to_string(),
            section_prefix: String::new(),
            watch: DEFAULT_WATCH_TEXT.to_string(),
        }
    }
}

impl SectionLabels {
    pub fn from_site(site: &SiteConfig) -> Self {
        let defaults = Self::default();
        let pick = |key: &str, fallback: String| {
            site.theme_text(key).map(str::to_string).unwrap_or(fallback)
        };
        Self {
            live: pick("text_live_section_title", defaults.live),
            top_upcoming: pick("text_top_upcoming_title", defaults.top_upcoming),
            schedule: defaults.schedule,
            section_prefix: pick("text_section_prefix", defaults.section_prefix),
            watch: pick("text_watch_btn", defaults.watch),
        }
    }
}

pub fn match_row(m: &MatchRecord, watch_text: &str) -> String {
    let home = escape_html(m.home_team());
    let away = escape_html(m.away_team());
    let live_class = if m.is_live() { " live" } else { "" };

    format!(
        r#"<div class="match-row{live_class}" data-match-id="{id}">
  <div class="col-time"><span class="time-main">{time}</span></div>
  <div class="teams-wrapper">
    <div class="team-name"><div class="logo-box"><img src="{home_img}" class="t-img" loading="lazy" alt="{home}"></div>{home}</div>
    <div class="team-name"><div class="logo-box"><img src="{away_img}" class="t-img" loading="lazy" alt="{away}"></div>{away}</div>
  </div>
  <div class="col-meta"><span class="meta-top">{league}</span></div>
  <div class="col-action"><a href="{link}" class="btn-watch">{watch}</a></div>
</div>
"#,
        id = escape_html(m.id.as_str()),
        time = escape_html(m.status_text()),
        home_img = escape_html(m.home_image()),
        away_img = escape_html(m.away_image()),
        league = escape_html(m.league.as_deref().unwrap_or("")),
        link = escape_html(&watch_link(m)),
        watch = escape_html(watch_text),
    )
}

fn section(class: &str, title: &str, extra_attrs: &str, matches: &[MatchRecord], watch: &str) -> String {
    let rows: String = matches.iter().map(|m| match_row(m, watch)).collect();
    format!(
        "<section class=\"match-section {class}\"{extra_attrs}>\n<h2 class=\"section-title\">{}</h2>\n{rows}</section>\n",
        escape_html(title)
    )
}

/// All sections of one page, in display order. Empty bands are skipped.
pub fn sections(assembly: &SectionAssembly, labels: &SectionLabels) -> String {
    let mut html = String::new();

    if !assembly.live.is_empty() {
        html.push_str(&section("live-section", &labels.live, "", &assembly.live, &labels.watch));
    }
    if !assembly.top_upcoming.is_empty() {
        html.push_str(&section(
            "top-upcoming-section",
            &labels.top_upcoming,
            "",
            &assembly.top_upcoming,
            &labels.watch,
        ));
    }

    match &assembly.body {
        PageBody::Grouped(buckets) => {
            for bucket in buckets {
                let title = format!("{}{}", labels.section_prefix, bucket.title);
                let attrs = format!(" data-score=\"{}\"", bucket.score);
                html.push_str(&section("league-section", &title, &attrs, &bucket.matches, &labels.watch));
            }
        }
        PageBody::Schedule(matches) if !matches.is_empty() => {
            html.push_str(&section("schedule-section", &labels.schedule, "", matches, &labels.watch));
        }
        PageBody::Schedule(_) => {}
    }

    html
}
