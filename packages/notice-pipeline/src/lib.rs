//! Notice Pipeline
//!
//! Watches published notices (web listings, spreadsheet-driven document
//! lists), detects items not seen before, transforms each into a
//! self-contained payload and hands it to a notification sink, recording it
//! so it is never delivered again.
//!
//! # Flow
//!
//! enumerate → dedup check → select → bounded-concurrency
//! fetch/transform/deliver → commit. An identifier is committed only after its
//! delivery succeeded (at-least-once).
//!
//! # Usage
//!
//! ```rust,ignore
//! use notice_pipeline::{Pipeline, MemoryStore, RunOptions, Filters, SelectorPolicy};
//! use notice_pipeline::testing::{MockSource, RecordingSink};
//!
//! let pipeline = Pipeline::new(Arc::new(MemoryStore::new()), Arc::new(RecordingSink::new()));
//! let options = RunOptions::new(Filters::new(), SelectorPolicy::FullSweep);
//! let summary = pipeline.run(Arc::new(MockSource::new("demo")), &options).await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Capabilities (SourceAdapter, DedupStore, NotificationSink)
//! - [`types`] - Candidate, Payload, configuration and summaries
//! - [`enumerate`] - Listing and spreadsheet enumerators with filters
//! - [`select`] - Full-sweep and single-group selectors
//! - [`transform`] - Link absolutization and attachment manifests
//! - [`dispatch`] - Admission-controlled task pool
//! - [`pipeline`] - The orchestrator
//! - [`stores`] - Dedup Store backends
//! - [`sources`] - Generic web source adapter
//! - [`testing`] - Mock implementations for testing

pub mod dispatch;
pub mod enumerate;
pub mod error;
pub mod pipeline;
pub mod select;
pub mod sources;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod transform;
pub mod types;

// Re-export core types at crate root
pub use error::{
    CandidateError, CandidateResult, DispatchError, FetchError, SinkError, SinkResult,
    SourceError, SourceResult, StoreError, StoreResult, TransformError,
};
pub use traits::{sink::NotificationSink, source::SourceAdapter, store::DedupStore};
pub use types::{
    candidate::{Candidate, Tracked},
    config::{
        Filters, PipelineConfig, RunOptions, RunSummary, SelectorPolicy,
        DEFAULT_DELIVERY_TIMEOUT, DEFAULT_MAX_CONCURRENCY,
    },
    payload::{Detail, Payload, PayloadBody},
};

pub use dispatch::Dispatcher;
pub use enumerate::{
    enumerate_listing, enumerate_sheet, ListingSpec, SheetLayout, SheetSlot, SlotColumns,
};
pub use pipeline::Pipeline;
pub use select::select;
pub use sources::{ClientOptions, WebSource};
pub use transform::{ManifestSpec, Recipe, TitleSource};

// Re-export stores
pub use stores::MemoryStore;

#[cfg(feature = "sqlite")]
pub use stores::SqliteStore;

#[cfg(feature = "mysql")]
pub use stores::MySqlStore;
