//! Notice Crawler
//!
//! Concrete wiring for the notice pipeline: the watched site profiles, the
//! spreadsheet-driven document source, Google Sheets/Drive clients, and the
//! mail, local-directory and Drive sinks. The `crawler` and `documents`
//! binaries are thin CLIs over these modules.

pub mod config;
pub mod google;
pub mod sheet;
pub mod sinks;
pub mod sites;
pub mod store;

pub use config::Config;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber: `RUST_LOG` when set, sensible defaults otherwise.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,notice_pipeline=debug,notice_crawler=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
