//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the pipeline without
//! touching the network, a database or a mail server.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{
    CandidateResult, FetchError, SinkError, SinkResult, SourceError, SourceResult, StoreError,
    StoreResult,
};
use crate::stores::MemoryStore;
use crate::traits::{sink::NotificationSink, source::SourceAdapter, store::DedupStore};
use crate::types::{
    candidate::Candidate,
    config::Filters,
    payload::{Detail, Payload},
};

/// A mock source with a fixed candidate list.
///
/// Detail content is `<p>{title}</p>`; the payload is that markup titled with
/// the candidate title.
#[derive(Default)]
pub struct MockSource {
    name: String,

    /// Candidates returned by every enumeration
    candidates: Vec<Candidate>,

    /// Enumeration fails with this message when set
    list_error: Option<String>,

    /// Identifiers whose detail fetch fails
    fail_details: Arc<RwLock<HashSet<String>>>,

    /// Artificial latency for each fetch
    fetch_delay: Option<Duration>,

    /// Fetches currently running, and the most seen at once
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,

    /// Call tracking
    calls: Arc<RwLock<Vec<MockSourceCall>>>,
}

/// Record of a call made to the mock source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockSourceCall {
    List,
    Fetch { identifier: String },
}

impl MockSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a candidate.
    pub fn with_candidate(mut self, candidate: Candidate) -> Self {
        self.candidates.push(candidate);
        self
    }

    /// Add several candidates.
    pub fn with_candidates(mut self, candidates: impl IntoIterator<Item = Candidate>) -> Self {
        self.candidates.extend(candidates);
        self
    }

    /// Make enumeration fail.
    pub fn with_list_error(mut self, message: impl Into<String>) -> Self {
        self.list_error = Some(message.into());
        self
    }

    /// Make the detail fetch for an identifier fail with a 404.
    pub fn fail_detail(self, identifier: impl Into<String>) -> Self {
        self.fail_details.write().unwrap().insert(identifier.into());
        self
    }

    /// Sleep this long in every fetch.
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockSourceCall> {
        self.calls.read().unwrap().clone()
    }

    /// Highest number of fetches that were running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Identifiers whose detail was fetched.
    pub fn fetched(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockSourceCall::Fetch { identifier } => Some(identifier),
                MockSourceCall::List => None,
            })
            .collect()
    }
}

#[async_trait]
impl SourceAdapter for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_candidates(&self, _filters: &Filters) -> SourceResult<Vec<Candidate>> {
        self.calls.write().unwrap().push(MockSourceCall::List);

        if let Some(message) = &self.list_error {
            return Err(SourceError::Parse(message.clone()));
        }
        Ok(self.candidates.clone())
    }

    async fn fetch_detail(&self, candidate: &Candidate) -> CandidateResult<Detail> {
        self.calls.write().unwrap().push(MockSourceCall::Fetch {
            identifier: candidate.identifier.clone(),
        });

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_details.read().unwrap().contains(&candidate.identifier) {
            return Err(FetchError::Status {
                url: candidate.detail_locator.clone(),
                status: 404,
            }
            .into());
        }

        Ok(Detail::Html {
            url: candidate.detail_locator.clone(),
            markup: format!("<p>{}</p>", candidate.title),
        })
    }

    fn transform(&self, candidate: &Candidate, detail: Detail) -> CandidateResult<Payload> {
        Ok(match detail {
            Detail::Html { markup, .. } => Payload::html(candidate.title.clone(), markup),
            Detail::File {
                file_name,
                content_type,
                bytes,
                ..
            } => Payload::file(candidate.title.clone(), file_name, content_type, bytes),
        })
    }
}

/// A sink that records every delivered payload.
#[derive(Default, Clone)]
pub struct RecordingSink {
    delivered: Arc<RwLock<Vec<Payload>>>,

    /// Payload titles the sink rejects
    reject_titles: Arc<RwLock<HashSet<String>>>,

    /// Artificial latency for each delivery
    delay: Option<Duration>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject payloads with this title.
    pub fn reject_title(self, title: impl Into<String>) -> Self {
        self.reject_titles.write().unwrap().insert(title.into());
        self
    }

    /// Sleep this long in every delivery.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Payloads delivered so far.
    pub fn delivered(&self) -> Vec<Payload> {
        self.delivered.read().unwrap().clone()
    }

    /// Titles delivered so far.
    pub fn titles(&self) -> Vec<String> {
        self.delivered().into_iter().map(|p| p.title).collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    async fn deliver(&self, payload: &Payload) -> SinkResult<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.reject_titles.read().unwrap().contains(&payload.title) {
            return Err(SinkError::Rejected(format!("mock rejected {}", payload.title)));
        }
        self.delivered.write().unwrap().push(payload.clone());
        Ok(())
    }
}

/// A store wrapper that counts calls and can be told to fail.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    lookups: Arc<RwLock<Vec<String>>>,
    commits: Arc<RwLock<Vec<String>>>,
    fail_lookups: bool,
    fail_commits: bool,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing memory store.
    pub fn wrapping(inner: MemoryStore) -> Self {
        Self {
            inner,
            ..Default::default()
        }
    }

    /// Every `is_processed` call fails.
    pub fn failing_lookups(mut self) -> Self {
        self.fail_lookups = true;
        self
    }

    /// Every `mark_processed` call fails.
    pub fn failing_commits(mut self) -> Self {
        self.fail_commits = true;
        self
    }

    /// Identifiers looked up so far.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.read().unwrap().clone()
    }

    /// Identifiers committed so far (including failed attempts).
    pub fn commits(&self) -> Vec<String> {
        self.commits.read().unwrap().clone()
    }

    /// The wrapped store.
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

fn mock_backend_error(message: &str) -> StoreError {
    StoreError::backend(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        message.to_string(),
    ))
}

#[async_trait]
impl DedupStore for CountingStore {
    async fn is_processed(&self, identifier: &str) -> StoreResult<bool> {
        self.lookups.write().unwrap().push(identifier.to_string());
        if self.fail_lookups {
            return Err(mock_backend_error("mock lookup failure"));
        }
        self.inner.is_processed(identifier).await
    }

    async fn mark_processed(&self, identifier: &str) -> StoreResult<()> {
        self.commits.write().unwrap().push(identifier.to_string());
        if self.fail_commits {
            return Err(mock_backend_error("mock commit failure"));
        }
        self.inner.mark_processed(identifier).await
    }
}
