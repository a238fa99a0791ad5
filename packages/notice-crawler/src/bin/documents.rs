//! Transfer the documents listed in the spreadsheet, one subject group at a time.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

use notice_crawler::google::{DriveClient, SheetsClient};
use notice_crawler::sheet::{default_layout, SheetSource, SheetStatusStore};
use notice_crawler::sinks::{DriveSink, FileSink};
use notice_crawler::{init_tracing, Config};
use notice_pipeline::{DedupStore, Filters, NotificationSink, Pipeline, RunOptions, SelectorPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SinkKind {
    /// `<out-dir>/<sheet>/<subject>/<slot>/<file>`
    Local,
    /// Google Drive folder tree under DRIVE_ROOT_FOLDER_ID
    Drive,
}

#[derive(Parser)]
#[command(name = "documents")]
#[command(about = "Transfer spreadsheet-listed documents to a folder or Google Drive")]
struct Cli {
    /// Sheet title to process (repeatable; default: SHEET_TITLES)
    #[arg(long = "sheet")]
    sheets: Vec<String>,

    /// Selector policy: single-group or full
    #[arg(long, default_value = "single-group")]
    mode: SelectorPolicy,

    #[arg(long, value_enum, default_value = "local")]
    sink: SinkKind,

    /// Output directory for the local sink (default: DOCUMENTS_DIR)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Maximum in-flight downloads
    #[arg(long)]
    max_concurrency: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    let token = config.google_access_token()?;
    let sheets = Arc::new(
        SheetsClient::new(token.clone(), config.spreadsheet_id()?, config.request_timeout)
            .context("Failed to create Sheets client")?,
    );
    let store = Arc::new(SheetStatusStore::new(sheets.clone()));

    let sink: Arc<dyn NotificationSink> = match cli.sink {
        SinkKind::Local => Arc::new(FileSink::new(
            cli.out_dir.clone().unwrap_or_else(|| config.documents_dir.clone()),
        )),
        SinkKind::Drive => {
            let root = config
                .google
                .drive_root_folder_id
                .clone()
                .context("DRIVE_ROOT_FOLDER_ID must be set")?;
            let drive = DriveClient::new(token, config.request_timeout)
                .context("Failed to create Drive client")?;
            Arc::new(DriveSink::new(Arc::new(drive), root))
        }
    };

    let http = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .context("Failed to create HTTP client")?;

    let mut pipeline_config = config.pipeline();
    if let Some(max) = cli.max_concurrency {
        pipeline_config = pipeline_config.with_max_concurrency(max);
    }
    let dedup: Arc<dyn DedupStore> = store.clone();
    let pipeline = Pipeline::new(dedup, sink).with_config(pipeline_config);

    let titles = if cli.sheets.is_empty() {
        config.sheet_titles.clone()
    } else {
        cli.sheets.clone()
    };
    let options = RunOptions::new(Filters::new(), cli.mode);

    let mut worked = false;
    for title in &titles {
        let source = SheetSource::new(sheets.clone(), http.clone(), default_layout(title.as_str()), &store);

        match pipeline.run(Arc::new(source), &options).await {
            Ok(summary) => {
                tracing::info!(
                    sheet = %title,
                    attempted = summary.attempted,
                    delivered = summary.delivered,
                    failed = summary.failed,
                    "Sheet done"
                );
                if !summary.is_idle() {
                    worked = true;
                    if cli.mode == SelectorPolicy::SingleGroup {
                        break;
                    }
                }
            }
            Err(e) => tracing::error!(sheet = %title, error = %e, "Sheet run aborted"),
        }
    }

    if !worked {
        tracing::info!("No group left to transfer");
    }

    Ok(())
}
