//! Page renderer.
//!
//! Fills `{{SLOT}}` placeholders in the master template, then places the
//! rendered sections into `<div id="grouped-container"></div>` and the
//! JSON-LD schema before `</head>`. Slots with no value render empty.

pub mod html;
pub mod schema;

use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::assemble::{PageBody, SectionAssembly};
use crate::config::{ContentPage, SiteConfig};
use crate::models::MatchRecord;
use crate::priority::title_case;

pub use html::SectionLabels;

static SLOT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([A-Z0-9_]+)\}\}").expect("slot pattern is valid"));

const GROUPED_CONTAINER: &str = r#"<div id="grouped-container"></div>"#;
const HEAD_CLOSE: &str = "</head>";

/// Directory suffix of standalone league pages.
pub const STANDALONE_SUFFIX: &str = "-streams";

/// Lowercase and drop everything but ASCII letters and digits.
pub fn compact_slug(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// `nba-streams/index.html` for a page titled "NBA".
pub fn standalone_path(title: &str) -> Option<PathBuf> {
    let slug = compact_slug(title);
    if slug.is_empty() {
        return None;
    }
    Some(PathBuf::from(format!("{}{}", slug, STANDALONE_SUFFIX)).join("index.html"))
}

/// `dmca/index.html` for slug "dmca". Slugs that would leave the site
/// directory are rejected.
pub fn content_path(slug: &str) -> Option<PathBuf> {
    let relative = Path::new(slug.trim().trim_matches('/'));
    let safe = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !safe || relative.as_os_str().is_empty() {
        return None;
    }
    Some(relative.join("index.html"))
}

/// The master HTML template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template(String);

impl Template {
    pub fn new(html: impl Into<String>) -> Self {
        Self(html.into())
    }

    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        std::fs::read_to_string(path).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn has_grouped_container(&self) -> bool {
        self.0.contains(GROUPED_CONTAINER)
    }
}

/// Values for the template's `{{SLOT}}` placeholders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderModel {
    slots: BTreeMap<String, String>,
}

fn slot_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl RenderModel {
    /// Site-wide slots: every `site_settings` key uppercased, every theme key
    /// as `THEME_<KEY>`, and `SITE_NAME`.
    pub fn for_site(site: &SiteConfig) -> Self {
        let mut model = Self::default();
        for (key, value) in site.site_settings.entries() {
            if let Some(text) = slot_text(value) {
                model.set(key.to_uppercase(), text);
            }
        }
        for (key, value) in &site.theme {
            if let Some(text) = slot_text(value) {
                model.set(format!("THEME_{}", key.to_uppercase()), text);
            }
        }
        model.set("SITE_NAME", site.site_settings.site_name());
        model
    }

    pub fn set(&mut self, slot: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.slots.insert(slot.into(), value.into());
        self
    }

    pub fn get(&self, slot: &str) -> Option<&str> {
        self.slots.get(slot).map(String::as_str)
    }

    /// Replace every `{{SLOT}}` in one pass.
    pub fn fill(&self, template: &str) -> String {
        SLOT_PATTERN
            .replace_all(template, |caps: &Captures| {
                self.get(&caps[1]).unwrap_or_default().to_string()
            })
            .into_owned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Home,
    Standalone,
    Content,
}

/// How many matches each band of a page holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SectionCounts {
    pub live: usize,
    pub top_upcoming: usize,
    pub grouped_sections: usize,
    pub grouped_matches: usize,
    pub schedule: usize,
}

impl SectionCounts {
    fn of(assembly: &SectionAssembly) -> Self {
        let mut counts = Self {
            live: assembly.live.len(),
            top_upcoming: assembly.top_upcoming.len(),
            ..Default::default()
        };
        match &assembly.body {
            PageBody::Grouped(buckets) => {
                counts.grouped_sections = buckets.len();
                counts.grouped_matches = buckets.iter().map(|b| b.matches.len()).sum();
            }
            PageBody::Schedule(matches) => counts.schedule = matches.len(),
        }
        counts
    }
}

/// A finished page, held in memory until the build writes it.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub kind: PageKind,
    /// Relative to the site directory
    pub path: PathBuf,
    pub title: String,
    pub sections: SectionCounts,
    pub html: String,
}

/// Renders every kind of page against one template and site config.
pub struct PageRenderer<'a> {
    template: &'a Template,
    site: &'a SiteConfig,
    base: RenderModel,
    labels: SectionLabels,
}

impl<'a> PageRenderer<'a> {
    pub fn new(template: &'a Template, site: &'a SiteConfig) -> Self {
        if !template.has_grouped_container() {
            warn!("Template has no grouped-container element; match sections will not be placed");
        }
        Self {
            template,
            site,
            base: RenderModel::for_site(site),
            labels: SectionLabels::from_site(site),
        }
    }

    fn canonical(&self, path: &str) -> String {
        match self.site.site_settings.domain() {
            "" => path.to_string(),
            domain => format!("https://{}{}", domain, path),
        }
    }

    fn page_model(&self) -> RenderModel {
        self.base.clone()
    }

    /// Fill slots, then place sections and schema.
    fn compose(&self, model: &RenderModel, assembly: Option<&SectionAssembly>) -> String {
        let mut page = model.fill(self.template.as_str());
        let Some(assembly) = assembly else {
            return page;
        };

        let sections = html::sections(assembly, &self.labels);
        page = page.replacen(
            GROUPED_CONTAINER,
            &format!(r#"<div id="grouped-container" class="static-stack">{}</div>"#, sections),
            1,
        );

        let matches = rendered_matches(assembly);
        let tag = schema::script_tag(&schema::item_list(&matches, self.site.site_settings.domain()));
        if page.contains(HEAD_CLOSE) {
            page = page.replacen(HEAD_CLOSE, &format!("{}\n{}", tag, HEAD_CLOSE), 1);
        } else {
            debug!("Template has no </head>, skipping structured data");
        }
        page
    }

    pub fn render_home(&self, assembly: &SectionAssembly) -> RenderedPage {
        let site_name = self.site.site_settings.site_name();
        let home = self.site.home_page();

        let title = or_default(home.map(|p| p.title.as_str()), site_name.clone());
        let mut model = self.page_model();
        model
            .set(
                "META_TITLE",
                or_default(
                    home.map(|p| p.meta_title.as_str()),
                    format!("{} - Live Sports Streams", site_name),
                ),
            )
            .set(
                "META_DESC",
                or_default(
                    home.map(|p| p.meta_desc.as_str()),
                    "Watch live sports streams. Full match schedule and streaming links.".to_string(),
                ),
            )
            .set("HERO_TEXT", "Live Sports Matches")
            .set("H1_TITLE", title.clone())
            .set("ARTICLE_CONTENT", or_default(home.map(|p| p.content.as_str()), String::new()))
            .set("CANONICAL_URL", self.canonical("/"));

        RenderedPage {
            kind: PageKind::Home,
            path: PathBuf::from("index.html"),
            title,
            sections: SectionCounts::of(assembly),
            html: self.compose(&model, Some(assembly)),
        }
    }

    /// Page for one linked league. `None` when the title yields no slug.
    pub fn render_standalone(&self, title: &str, assembly: &SectionAssembly) -> Option<RenderedPage> {
        let path = standalone_path(title)?;
        let sport = rendered_matches(assembly)
            .first()
            .map(|m| title_case(m.sport_name()))
            .unwrap_or_else(|| "Sports".to_string());

        let mut model = self.page_model();
        model
            .set("META_TITLE", format!("{} Live Stream - {}", title, sport))
            .set("META_DESC", format!("Watch {} live. Full match schedule and streaming links.", title))
            .set("HERO_TEXT", format!("Live {} Matches", title))
            .set("H1_TITLE", title)
            .set(
                "CANONICAL_URL",
                self.canonical(&format!("/{}{}/", compact_slug(title), STANDALONE_SUFFIX)),
            );

        Some(RenderedPage {
            kind: PageKind::Standalone,
            path,
            title: title.to_string(),
            sections: SectionCounts::of(assembly),
            html: self.compose(&model, Some(assembly)),
        })
    }

    /// Plain content page from `pages[]`. `None` for unusable slugs.
    pub fn render_content(&self, page: &ContentPage) -> Option<RenderedPage> {
        let path = content_path(&page.slug)?;
        let meta_title = if page.meta_title.trim().is_empty() {
            page.title.clone()
        } else {
            page.meta_title.clone()
        };

        let mut model = self.page_model();
        model
            .set("META_TITLE", meta_title)
            .set("META_DESC", page.meta_desc.clone())
            .set("H1_TITLE", page.title.clone())
            .set("HERO_TEXT", page.title.clone())
            .set("ARTICLE_CONTENT", page.content.clone())
            .set("CANONICAL_URL", self.canonical(&format!("/{}/", page.slug.trim().trim_matches('/'))));

        Some(RenderedPage {
            kind: PageKind::Content,
            path,
            title: page.title.clone(),
            sections: SectionCounts::default(),
            html: self.compose(&model, None),
        })
    }
}

fn or_default(value: Option<&str>, fallback: String) -> String {
    value
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .unwrap_or(fallback)
}

/// Matches in display order, for the page's structured data.
fn rendered_matches(assembly: &SectionAssembly) -> Vec<MatchRecord> {
    let mut matches: Vec<MatchRecord> = assembly
        .live
        .iter()
        .chain(assembly.top_upcoming.iter())
        .cloned()
        .collect();
    match &assembly.body {
        PageBody::Grouped(buckets) => {
            matches.extend(buckets.iter().flat_map(|b| b.matches.iter().cloned()))
        }
        PageBody::Schedule(schedule) => matches.extend(schedule.iter().cloned()),
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::GroupedBucket;
    use pretty_assertions::assert_eq;
    use scraper::{Html, Selector};
    use serde_json::json;

    const TEMPLATE: &str = r#"<!DOCTYPE html>
<html><head><title>{{META_TITLE}}</title>
<meta name="description" content="{{META_DESC}}">
<link rel="canonical" href="{{CANONICAL_URL}}">
<style>:root { --brand: {{THEME_BRAND_PRIMARY}}; }</style>
</head>
<body><header>{{SITE_NAME}} {{UNKNOWN_SLOT}}</header>
<h1>{{H1_TITLE}}</h1><p class="hero">{{HERO_TEXT}}</p>
<article>{{ARTICLE_CONTENT}}</article>
<div id="grouped-container"></div>
</body></html>"#;

    fn site() -> SiteConfig {
        SiteConfig::from_value(json!({
            "site_settings": {"title_part_1": "Stream", "title_part_2": "East", "domain": "streameast.to"},
            "theme": {"brand_primary": "#D00000"},
            "pages": [
                {"slug": "home", "title": "Live Sports", "meta_title": "StreamEast | Free Sports", "content": "<p>Welcome</p>"},
                {"slug": "dmca", "title": "DMCA", "meta_desc": "Notice", "content": "<p>Takedown</p>"}
            ]
        }))
    }

    fn text(doc: &Html, css: &str) -> String {
        let selector = Selector::parse(css).unwrap();
        doc.select(&selector).next().map(|e| e.text().collect()).unwrap_or_default()
    }

    fn attr(doc: &Html, css: &str, name: &str) -> Option<String> {
        let selector = Selector::parse(css).unwrap();
        doc.select(&selector).next().and_then(|e| e.value().attr(name)).map(str::to_string)
    }

    fn home_assembly() -> SectionAssembly {
        SectionAssembly {
            live: vec![MatchRecord::new("l1").with_sport("Basketball").with_live(true)],
            top_upcoming: vec![MatchRecord::new("t1")],
            body: PageBody::Grouped(vec![GroupedBucket {
                title: "NFL".into(),
                score: 100,
                matches: vec![MatchRecord::new("g1"), MatchRecord::new("g2")],
            }]),
        }
    }

    #[test]
    fn test_compact_slug() {
        assert_eq!(compact_slug("Premier League"), "premierleague");
        assert_eq!(compact_slug("Ligue-1 (France)"), "ligue1france");
        assert_eq!(compact_slug("!!!"), "");
    }

    #[test]
    fn test_output_paths() {
        assert_eq!(standalone_path("NBA"), Some(PathBuf::from("nba-streams/index.html")));
        assert_eq!(standalone_path("---"), None);
        assert_eq!(content_path("dmca"), Some(PathBuf::from("dmca/index.html")));
        assert_eq!(content_path("/legal/terms/"), Some(PathBuf::from("legal/terms/index.html")));
        assert_eq!(content_path("../etc"), None);
        assert_eq!(content_path(" "), None);
    }

    #[test]
    fn test_fill_replaces_known_and_clears_unknown() {
        let mut model = RenderModel::default();
        model.set("A", "1").set("B_2", "two");
        assert_eq!(model.fill("{{A}}-{{B_2}}-{{C}}-{{lower}}"), "1-two--{{lower}}");
    }

    #[test]
    fn test_fill_does_not_rescan_values() {
        let mut model = RenderModel::default();
        model.set("A", "{{B}}").set("B", "x");
        assert_eq!(model.fill("{{A}}"), "{{B}}");
    }

    #[test]
    fn test_site_model_slots() {
        let site = SiteConfig::from_value(json!({
            "site_settings": {"domain": "x.to", "footer_year": 2024, "nested": {"a": 1}},
            "theme": {"brand_primary": "#fff"}
        }));
        let model = RenderModel::for_site(&site);
        assert_eq!(model.get("DOMAIN"), Some("x.to"));
        assert_eq!(model.get("FOOTER_YEAR"), Some("2024"));
        assert_eq!(model.get("NESTED"), None);
        assert_eq!(model.get("THEME_BRAND_PRIMARY"), Some("#fff"));
        assert_eq!(model.get("SITE_NAME"), Some("SportStream"));
    }

    #[test]
    fn test_render_home() {
        let template = Template::new(TEMPLATE);
        let site = site();
        let page = PageRenderer::new(&template, &site).render_home(&home_assembly());

        assert_eq!(page.path, PathBuf::from("index.html"));
        assert_eq!(page.sections.live, 1);
        assert_eq!(page.sections.grouped_matches, 2);
        assert!(!page.html.contains("{{"));

        let doc = Html::parse_document(&page.html);
        assert_eq!(text(&doc, "title"), "StreamEast | Free Sports");
        assert_eq!(text(&doc, "h1"), "Live Sports");
        assert_eq!(text(&doc, "header").trim(), "StreamEast");
        assert_eq!(text(&doc, "article p"), "Welcome");
        assert_eq!(attr(&doc, "link[rel=canonical]", "href").as_deref(), Some("https://streameast.to/"));
        assert!(page.html.contains("--brand: #D00000"));

        let rows = Selector::parse("#grouped-container.static-stack .match-row").unwrap();
        let ids: Vec<&str> = doc.select(&rows).filter_map(|e| e.value().attr("data-match-id")).collect();
        assert_eq!(ids, vec!["l1", "t1", "g1", "g2"]);

        let schema_text = text(&doc, "head script[type=\"application/ld+json\"]");
        let schema: Value = serde_json::from_str(&schema_text).unwrap();
        assert_eq!(schema["itemListElement"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_render_home_without_home_page_entry() {
        let template = Template::new(TEMPLATE);
        let site = SiteConfig::default();
        let page = PageRenderer::new(&template, &site).render_home(&home_assembly());

        let doc = Html::parse_document(&page.html);
        assert_eq!(text(&doc, "title"), "SportStream - Live Sports Streams");
        assert_eq!(text(&doc, "h1"), "SportStream");
        assert_eq!(attr(&doc, "link[rel=canonical]", "href").as_deref(), Some("/"));
    }

    #[test]
    fn test_render_standalone() {
        let template = Template::new(TEMPLATE);
        let site = site();
        let assembly = SectionAssembly {
            live: Vec::new(),
            top_upcoming: Vec::new(),
            body: PageBody::Schedule(vec![MatchRecord::new("s1").with_sport("american football")]),
        };
        let page = PageRenderer::new(&template, &site)
            .render_standalone("Premier League", &assembly)
            .unwrap();

        assert_eq!(page.path, PathBuf::from("premierleague-streams/index.html"));
        assert_eq!(page.sections.schedule, 1);

        let doc = Html::parse_document(&page.html);
        assert_eq!(text(&doc, "title"), "Premier League Live Stream - American Football");
        assert_eq!(
            attr(&doc, "meta[name=description]", "content").as_deref(),
            Some("Watch Premier League live. Full match schedule and streaming links.")
        );
        assert_eq!(text(&doc, "p.hero"), "Live Premier League Matches");
        assert_eq!(
            attr(&doc, "link[rel=canonical]", "href").as_deref(),
            Some("https://streameast.to/premierleague-streams/")
        );
        assert_eq!(text(&doc, "section.schedule-section h2"), "Schedule");
    }

    #[test]
    fn test_render_content_page() {
        let template = Template::new(TEMPLATE);
        let site = site();
        let renderer = PageRenderer::new(&template, &site);
        let page = renderer.render_content(&site.pages[1]).unwrap();

        assert_eq!(page.kind, PageKind::Content);
        assert_eq!(page.path, PathBuf::from("dmca/index.html"));
        let doc = Html::parse_document(&page.html);
        assert_eq!(text(&doc, "title"), "DMCA");
        assert_eq!(text(&doc, "article p"), "Takedown");
        assert!(!page.html.contains("application/ld+json"));
        assert!(page.html.contains(r#"<div id="grouped-container"></div>"#));
    }

    #[test]
    fn test_template_without_markers_still_renders() {
        let template = Template::new("<p>{{H1_TITLE}}</p>");
        let site = SiteConfig::default();
        let page = PageRenderer::new(&template, &site).render_home(&home_assembly());
        assert_eq!(page.html, "<p>SportStream</p>");
    }
}
