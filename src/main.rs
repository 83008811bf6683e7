use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stream_cms::api::{build_router, state::AppState};
use stream_cms::build::Builder;
use stream_cms::config::AppConfig;
use stream_cms::fetch::HttpFeed;
use stream_cms::publish::{GitCli, Publisher};

#[derive(Parser)]
#[command(name = "stream-cms")]
#[command(about = "Static site builder for a sports streaming schedule")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./stream-cms.toml")]
    config: PathBuf,

    /// Site directory (overrides the config file)
    #[arg(long)]
    site_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the feed and rebuild every page once
    Build,

    /// Start the admin server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },

    /// Commit and push the generated site
    Publish,
}

fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(Some(cli.config.as_path()))
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    if let Some(site_dir) = cli.site_dir {
        config = config.with_site_dir(site_dir);
    }

    init_tracing(
        cli.log_level.as_deref().unwrap_or(&config.log_level),
        cli.json_logs,
    );
    tracing::info!("Starting stream-cms v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Build => {
            let feed = HttpFeed::new(&config.feed)?;
            let report = Builder::new(&config, &feed).run().await?;

            println!("\n=== Build Results ===");
            println!("Run id:           {}", report.run_id);
            println!("Matches:          {}", report.records);
            println!("Skipped:          {}", report.skipped_records);
            println!("Sports / leagues: {} / {}", report.sports, report.leagues);
            println!("Pages written:    {}", report.pages.len());
            for page in &report.pages {
                println!("  {}", page.path);
            }
        }
        Commands::Serve { host, port } => {
            let config = config.with_listen_addr(host, port)?;
            let addr = format!("{}:{}", config.server.host, config.server.port);

            let feed = HttpFeed::new(&config.feed)?;
            let state = AppState::new(config, Arc::new(feed), Arc::new(GitCli::new()));
            let site_dir = state.config.site_dir.clone();
            let app = build_router(state);

            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;
            tracing::info!("Admin server: http://{}", addr);
            tracing::info!("Serving: {}", site_dir.display());
            axum::serve(listener, app).await?;
        }
        Commands::Publish => {
            let git = GitCli::new();
            let outcome = Publisher::new(&git, &config.site_dir, &config.publish)
                .deploy()
                .await?;
            println!("{}", outcome.message);
            if !outcome.committed {
                println!("(nothing new to commit)");
            }
        }
    }

    Ok(())
}
