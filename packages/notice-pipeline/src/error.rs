//! Typed errors for the notice pipeline.
//!
//! Errors are split by blast radius:
//! - [`SourceError`] aborts one source's run (nothing from it is processed)
//! - [`CandidateError`] is isolated to a single candidate and never crosses
//!   the dispatcher's task boundary

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that stop a whole source run.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Listing could not be reached
    #[error("listing request failed for {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: BoxError,
    },

    /// Listing answered with a non-success status
    #[error("listing returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// Listing body could not be interpreted
    #[error("listing could not be parsed: {0}")]
    Parse(String),

    /// A configured CSS selector is invalid
    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    /// A recency marker could not be parsed (fail-fast)
    #[error("malformed date `{value}`: {reason}")]
    DateParse { value: String, reason: String },

    /// A remote API (spreadsheet, drive) rejected the request
    #[error("API error: {0}")]
    Api(#[source] BoxError),
}

/// Errors isolated to a single candidate.
#[derive(Debug, Error)]
pub enum CandidateError {
    /// Detail content unreachable or non-success status
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Detail content could not be turned into a payload
    #[error("transform failed: {0}")]
    Transform(#[from] TransformError),

    /// Sink rejected the payload
    #[error("delivery failed: {0}")]
    Delivery(#[from] SinkError),

    /// Store write failed after a successful delivery
    #[error("commit failed after delivery: {0}")]
    Commit(#[source] StoreError),

    /// Dedup lookup failed before dispatch
    #[error("dedup lookup failed: {0}")]
    Lookup(#[source] StoreError),

    /// The candidate's task panicked
    #[error("task panicked: {0}")]
    Panicked(String),
}

/// Detail retrieval errors.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, TLS, timeout, reset)
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: BoxError,
    },

    /// Server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },
}

/// Errors turning raw detail content into a payload.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The required content container is absent from the detail page
    #[error("content container `{selector}` not found")]
    ContainerMissing { selector: String },

    /// An embedded attachment manifest was found but is not valid JSON
    #[error("attachment manifest is malformed: {0}")]
    Manifest(#[from] serde_json::Error),

    /// A configured CSS selector is invalid
    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    /// A manifest pattern could not be compiled
    #[error("invalid manifest pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Detail content kind does not match what the recipe expects
    #[error("unexpected detail content: {0}")]
    UnexpectedContent(String),
}

/// Dedup Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend (database, remote sheet) failed
    #[error("storage backend error: {0}")]
    Backend(#[source] BoxError),

    /// Identifier is not addressable by this store
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}

/// Notification Sink errors.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Sink refused the payload (bad address, quota, unsupported body)
    #[error("payload rejected: {0}")]
    Rejected(String),

    /// Transport to the sink failed
    #[error("sink transport error: {0}")]
    Transport(#[source] BoxError),

    /// Delivery did not finish before the deadline
    #[error("delivery timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

/// Admission pool errors.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The admission pool was closed while a task waited for a token
    #[error("admission pool closed")]
    Closed(#[from] tokio::sync::AcquireError),
}

impl StoreError {
    /// Wrap any backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }
}

impl SinkError {
    /// Wrap any transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Box::new(err))
    }
}

/// Result type alias for source-level operations.
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Result type alias for candidate-level operations.
pub type CandidateResult<T> = std::result::Result<T, CandidateError>;

/// Result type alias for Dedup Store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for sink operations.
pub type SinkResult<T> = std::result::Result<T, SinkError>;
