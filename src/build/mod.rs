//! Build orchestrator.
//!
//! One full rebuild: load config and template, fetch the feed, classify,
//! resolve, assemble and render every page in memory, then write. Nothing
//! reaches the disk unless every step before the first write succeeded.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::assemble::{assemble_home, assemble_standalone};
use crate::classify::classify;
use crate::config::{AppConfig, PriorityTable, SiteConfig};
use crate::fetch::{FeedSource, FetchError, FetchInfo};
use crate::priority::{resolve, standalone_scopes};
use crate::render::{PageKind, PageRenderer, RenderedPage, SectionCounts, Template};

pub const RAW_FETCH_FILE: &str = "raw_fetch.json";
pub const CLASSIFIED_FILE: &str = "temp_build_data.json";
pub const MANIFEST_FILE: &str = "build_manifest.json";

/// Errors that abort a build.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Template not found at {}: {source}", path.display())]
    TemplateMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Feed fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One written page, as recorded in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageEntry {
    pub kind: PageKind,
    pub path: String,
    pub title: String,
    pub sections: SectionCounts,
    pub bytes: usize,
    pub sha256: String,
}

impl PageEntry {
    fn of(page: &RenderedPage) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(page.html.as_bytes());
        Self {
            kind: page.kind,
            path: page.path.to_string_lossy().replace('\\', "/"),
            title: page.title.clone(),
            sections: page.sections,
            bytes: page.html.len(),
            sha256: hex::encode(hasher.finalize()),
        }
    }
}

/// Summary of one build, also written as `build_manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub target_country: String,
    pub feed: FetchInfo,
    pub records: usize,
    pub skipped_records: usize,
    pub sports: usize,
    pub leagues: usize,
    pub pages: Vec<PageEntry>,
}

impl BuildReport {
    pub fn page(&self, path: &str) -> Option<&PageEntry> {
        self.pages.iter().find(|p| p.path == path)
    }
}

/// Runs builds for one site directory.
pub struct Builder<'a> {
    config: &'a AppConfig,
    feed: &'a dyn FeedSource,
}

impl<'a> Builder<'a> {
    pub fn new(config: &'a AppConfig, feed: &'a dyn FeedSource) -> Self {
        Self { config, feed }
    }

    /// Run one full build.
    pub async fn run(&self) -> Result<BuildReport, BuildError> {
        let run_id = Uuid::new_v4();
        self.run_inner(run_id)
            .instrument(info_span!("build", %run_id))
            .await
    }

    async fn run_inner(&self, run_id: Uuid) -> Result<BuildReport, BuildError> {
        let started_at = Utc::now();
        info!("Starting build in {}", self.config.site_dir.display());

        let site = SiteConfig::load_or_default(&self.config.site_config_path());
        let template_path = self.config.template_file();
        let template = Template::from_file(&template_path).map_err(|source| {
            BuildError::TemplateMissing {
                path: template_path.clone(),
                source,
            }
        })?;

        info!("Fetching feed from {}", self.feed.describe());
        let snapshot = self.feed.fetch().await?;
        let raw_dump = serde_json::to_vec_pretty(&snapshot.payload)?;
        let stack = classify(snapshot.payload);
        let classified_dump = serde_json::to_vec_pretty(&stack.to_json())?;

        let table = PriorityTable::from_site_config(&site);
        info!(
            "Priorities for {}: {} rules, {} with their own page",
            site.target_country(),
            table.rules.len(),
            table.linked_rules().count()
        );
        let resolution = resolve(&stack, &table);

        let renderer = PageRenderer::new(&template, &site);
        let mut pages = vec![renderer.render_home(&assemble_home(&stack.records, &resolution))];

        for scope in standalone_scopes(&stack.records, &table) {
            match renderer.render_standalone(&scope.title, &assemble_standalone(&scope)) {
                Some(page) => pages.push(page),
                None => warn!("Priority key '{}' gives no usable page slug, skipping", scope.key),
            }
        }

        for page in site.pages.iter().filter(|p| !p.is_home()) {
            match renderer.render_content(page) {
                Some(rendered) => pages.push(rendered),
                None => warn!("Content page slug '{}' is not a safe path, skipping", page.slug),
            }
        }

        let pages = drop_path_collisions(pages);

        // Everything below writes; everything above only reads.
        for page in &pages {
            write_file(&self.config.site_dir.join(&page.path), page.html.as_bytes()).await?;
            debug!("Wrote {}", page.path.display());
        }

        let debug_dir = self.config.debug_path();
        write_file(&debug_dir.join(RAW_FETCH_FILE), &raw_dump).await?;
        write_file(&debug_dir.join(CLASSIFIED_FILE), &classified_dump).await?;

        let report = BuildReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            target_country: site.target_country().to_string(),
            feed: snapshot.info,
            records: stack.records.len(),
            skipped_records: stack.skipped,
            sports: stack.sports().len(),
            leagues: stack.league_count(),
            pages: pages.iter().map(PageEntry::of).collect(),
        };
        write_file(
            &debug_dir.join(MANIFEST_FILE),
            &serde_json::to_vec_pretty(&report)?,
        )
        .await?;

        info!(
            "Build complete: {} pages from {} matches",
            report.pages.len(),
            report.records
        );
        Ok(report)
    }
}

/// Keep the first page for each output path.
fn drop_path_collisions(pages: Vec<RenderedPage>) -> Vec<RenderedPage> {
    let mut seen = HashSet::new();
    pages
        .into_iter()
        .filter(|page| {
            let fresh = seen.insert(page.path.clone());
            if !fresh {
                warn!(
                    "Page '{}' would overwrite {}, skipping",
                    page.title,
                    page.path.display()
                );
            }
            fresh
        })
        .collect()
}

async fn write_file(path: &Path, contents: &[u8]) -> Result<(), BuildError> {
    let wrap = |source| BuildError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(wrap)?;
    }
    fs::write(path, contents).await.map_err(wrap)
}
