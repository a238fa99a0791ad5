//! Source adapter capability.

use async_trait::async_trait;

use crate::error::{CandidateResult, SourceResult};
use crate::types::{
    candidate::Candidate,
    config::Filters,
    payload::{Detail, Payload},
};

/// Per-site or per-sheet logic: where the listing is, how candidates are
/// extracted, and how a candidate's detail becomes a payload.
///
/// The pipeline is written once against this trait.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Short name used in logs and summaries.
    fn name(&self) -> &str;

    /// Enumerate candidates in source order.
    ///
    /// Already-processed candidates are still returned; dedup is a later stage.
    async fn list_candidates(&self, filters: &Filters) -> SourceResult<Vec<Candidate>>;

    /// Retrieve the candidate's detail content.
    async fn fetch_detail(&self, candidate: &Candidate) -> CandidateResult<Detail>;

    /// Turn detail content into a deliverable payload.
    fn transform(&self, candidate: &Candidate, detail: Detail) -> CandidateResult<Payload>;
}
