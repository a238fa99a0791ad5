//! Spreadsheet-driven document source and its status-cell Dedup Store.
//!
//! Each sheet lists documents per subject (sparse label in column A) and
//! publisher (a link column next to a status column). A document is processed
//! once its status cell holds the processed mark.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};
use url::Url;

use notice_pipeline::enumerate::sheet::PROCESSED_MARK;
use notice_pipeline::{
    enumerate_sheet, Candidate, CandidateResult, DedupStore, Detail, FetchError, Filters,
    Payload, SheetLayout, SlotColumns, SourceAdapter, SourceError, SourceResult, StoreError,
    StoreResult, TransformError,
};

use crate::google::SheetsClient;
use crate::sinks::sanitize_file_name;

/// Publisher column pairs in priority order: KNTT (B, C), CTST (D, E), CD (F, G).
pub fn default_layout(sheet: impl Into<String>) -> SheetLayout {
    SheetLayout::new(
        sheet,
        vec![
            SlotColumns::new("KNTT", 1, 2),
            SlotColumns::new("CTST", 3, 4),
            SlotColumns::new("CD", 5, 6),
        ],
    )
}

/// Snapshot of status cells known to carry the processed mark.
type MarkedCells = Arc<RwLock<HashSet<String>>>;

/// Dedup Store backed by each candidate's status cell.
///
/// Lookups read the snapshot taken during enumeration; commits write the mark
/// into the sheet and then into the snapshot.
pub struct SheetStatusStore {
    sheets: Arc<SheetsClient>,
    marked: MarkedCells,
}

impl SheetStatusStore {
    pub fn new(sheets: Arc<SheetsClient>) -> Self {
        Self {
            sheets,
            marked: Arc::new(RwLock::new(HashSet::new())),
        }
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("status snapshot lock poisoned".into())
}

#[async_trait]
impl DedupStore for SheetStatusStore {
    async fn is_processed(&self, identifier: &str) -> StoreResult<bool> {
        let marked = self.marked.read().map_err(|_| poisoned())?;
        Ok(marked.contains(identifier))
    }

    async fn mark_processed(&self, identifier: &str) -> StoreResult<()> {
        if !identifier.contains('!') {
            return Err(StoreError::InvalidIdentifier(identifier.to_string()));
        }
        if self.is_processed(identifier).await? {
            return Ok(());
        }

        self.sheets
            .update_cell(identifier, PROCESSED_MARK)
            .await
            .map_err(StoreError::backend)?;
        self.marked
            .write()
            .map_err(|_| poisoned())?
            .insert(identifier.to_string());
        info!(cell = %identifier, "Marked as processed");
        Ok(())
    }
}

/// One sheet of the document spreadsheet.
pub struct SheetSource {
    name: String,
    sheets: Arc<SheetsClient>,
    http: reqwest::Client,
    layout: SheetLayout,
    marked: MarkedCells,
}

impl SheetSource {
    /// A source sharing its status snapshot with `store`.
    pub fn new(
        sheets: Arc<SheetsClient>,
        http: reqwest::Client,
        layout: SheetLayout,
        store: &SheetStatusStore,
    ) -> Self {
        Self {
            name: layout.sheet.clone(),
            sheets,
            http,
            layout,
            marked: store.marked.clone(),
        }
    }
}

/// File name for a download URL: the last path segment, sanitized.
pub fn file_name_for(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|s| !s.is_empty())
        .map(|s| sanitize_file_name(&s))
        .unwrap_or_else(|| "unknown".to_string())
}

#[async_trait]
impl SourceAdapter for SheetSource {
    fn name(&self) -> &str {
        &self.name
    }

    /// Filters do not apply: rows carry no titles or dates of their own.
    async fn list_candidates(&self, _filters: &Filters) -> SourceResult<Vec<Candidate>> {
        let rows = self
            .sheets
            .get_values(&self.layout.read_range())
            .await
            .map_err(|e| SourceError::Api(Box::new(e)))?;

        let slots = enumerate_sheet(&rows, &self.layout);
        {
            let mut marked = self
                .marked
                .write()
                .map_err(|_| SourceError::Parse("status snapshot lock poisoned".to_string()))?;
            for slot in slots.iter().filter(|s| s.marked) {
                marked.insert(slot.candidate.identifier.clone());
            }
        }

        info!(
            sheet = %self.name,
            rows = rows.len(),
            slots = slots.len(),
            marked = slots.iter().filter(|s| s.marked).count(),
            "Sheet enumerated"
        );
        Ok(slots.into_iter().map(|s| s.candidate).collect())
    }

    async fn fetch_detail(&self, candidate: &Candidate) -> CandidateResult<Detail> {
        let url = &candidate.detail_locator;
        debug!(sheet = %self.name, url = %url, "Downloading document");

        let response = self.http.get(url).send().await.map_err(|e| FetchError::Http {
            url: url.clone(),
            source: Box::new(e),
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.clone(),
                status: status.as_u16(),
            }
            .into());
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(|e| FetchError::Http {
            url: url.clone(),
            source: Box::new(e),
        })?;

        Ok(Detail::File {
            url: url.clone(),
            file_name: file_name_for(url),
            content_type,
            bytes,
        })
    }

    fn transform(&self, candidate: &Candidate, detail: Detail) -> CandidateResult<Payload> {
        match detail {
            Detail::File {
                file_name,
                content_type,
                bytes,
                ..
            } => Ok(Payload::file(candidate.title.clone(), file_name, content_type, bytes)
                .with_folder([
                    self.layout.sheet.clone(),
                    candidate.group_key.clone().unwrap_or_default(),
                    candidate.slot.clone().unwrap_or_default(),
                ])),
            Detail::Html { url, .. } => Err(TransformError::UnexpectedContent(format!(
                "expected a document, got a page from {}",
                url
            ))
            .into()),
        }
    }
}
