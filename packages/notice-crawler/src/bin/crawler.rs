//! Watch the configured notice sites and deliver every new notice once.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

use notice_crawler::sinks::{FileSink, MailSink};
use notice_crawler::store::open_store;
use notice_crawler::{init_tracing, sites, Config};
use notice_pipeline::pipeline::total;
use notice_pipeline::{NotificationSink, Pipeline, RunOptions, SelectorPolicy, SourceAdapter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SinkKind {
    /// HTML e-mail over SMTP
    Mail,
    /// HTML files under --out-dir
    File,
}

#[derive(Parser)]
#[command(name = "crawler")]
#[command(about = "Deliver new notices from the watched sites")]
struct Cli {
    /// Site profile to run (repeatable; default: all)
    #[arg(long = "site")]
    sites: Vec<String>,

    /// Selector policy: full or single-group
    #[arg(long, default_value = "full")]
    mode: SelectorPolicy,

    /// Maximum in-flight detail tasks per source
    #[arg(long)]
    max_concurrency: Option<usize>,

    /// Override every site's recency window (days)
    #[arg(long)]
    recency_days: Option<i64>,

    /// Override every site's keyword filter (repeatable)
    #[arg(long = "keyword")]
    keywords: Vec<String>,

    #[arg(long, value_enum, default_value = "mail")]
    sink: SinkKind,

    /// Output directory for the file sink (default: DOCUMENTS_DIR)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Print the known site profiles and exit
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.list {
        for name in sites::names() {
            println!("{}", name);
        }
        return Ok(());
    }

    init_tracing();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    let profiles = if cli.sites.is_empty() {
        sites::all()
    } else {
        cli.sites
            .iter()
            .map(|name| {
                sites::find(name).with_context(|| {
                    format!(
                        "Unknown site {} (known: {})",
                        name,
                        sites::names().join(", ")
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?
    };

    let store = open_store(config.database_url()?).await?;

    let sink: Arc<dyn NotificationSink> = match cli.sink {
        SinkKind::Mail => Arc::new(
            MailSink::new(config.smtp()?, config.delivery_timeout)
                .context("Failed to set up mail sink")?,
        ),
        SinkKind::File => Arc::new(FileSink::new(
            cli.out_dir.clone().unwrap_or_else(|| config.documents_dir.clone()),
        )),
    };

    let mut pipeline_config = config.pipeline();
    if let Some(max) = cli.max_concurrency {
        pipeline_config = pipeline_config.with_max_concurrency(max);
    }
    let pipeline = Pipeline::new(store, sink).with_config(pipeline_config);

    let mut sources: Vec<(Arc<dyn SourceAdapter>, RunOptions)> = Vec::new();
    for profile in &profiles {
        let source = profile
            .build(config.request_timeout)
            .with_context(|| format!("Failed to build source {}", profile.name))?;

        let mut filters = profile.filters();
        if !cli.keywords.is_empty() {
            filters = filters.with_keywords(cli.keywords.iter().cloned());
        }
        if let Some(days) = cli.recency_days {
            filters = filters.with_recency_window(days);
        }

        sources.push((Arc::new(source), RunOptions::new(filters, cli.mode)));
    }

    tracing::info!(sources = sources.len(), mode = ?cli.mode, "Starting run");
    let results = pipeline.run_all(sources).await;

    for (name, result) in &results {
        match result {
            Ok(summary) => tracing::info!(
                source = %name,
                discovered = summary.discovered,
                skipped = summary.skipped,
                attempted = summary.attempted,
                delivered = summary.delivered,
                failed = summary.failed,
                uncommitted = summary.uncommitted,
                "Summary"
            ),
            Err(e) => tracing::error!(source = %name, error = %e, "Summary: aborted"),
        }
    }

    let (totals, aborted) = total(&results);
    tracing::info!(
        attempted = totals.attempted,
        delivered = totals.delivered,
        failed = totals.failed,
        aborted_sources = aborted.len(),
        "Run complete"
    );

    Ok(())
}
