//! Candidate enumeration from an HTML listing page.

use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

use super::filters::{matches_keywords, within_window};
use crate::error::{SourceError, SourceResult};
use crate::types::{candidate::Candidate, config::Filters};

/// Where candidates live on a listing page.
///
/// Every selector except `item` is evaluated inside the matched item.
#[derive(Debug, Clone)]
pub struct ListingSpec {
    /// One match per potential candidate
    pub item: String,

    /// Anchor carrying the detail href; `None` when the item is the anchor
    pub link: Option<String>,

    /// Title text; `None` uses the anchor's text
    pub title: Option<String>,

    /// Recency marker text
    pub date: Option<String>,
}

impl ListingSpec {
    /// Items that are themselves anchors.
    pub fn anchors(item: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            link: None,
            title: None,
            date: None,
        }
    }

    /// Items that contain an anchor.
    pub fn rows(item: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            link: Some(link.into()),
            title: None,
            date: None,
        }
    }

    pub fn with_title(mut self, selector: impl Into<String>) -> Self {
        self.title = Some(selector.into());
        self
    }

    pub fn with_date(mut self, selector: impl Into<String>) -> Self {
        self.date = Some(selector.into());
        self
    }

    /// Parse every selector once.
    pub fn compile(&self) -> SourceResult<CompiledListing> {
        Ok(CompiledListing {
            item: parse_selector(&self.item)?,
            link: self.link.as_deref().map(parse_selector).transpose()?,
            title: self.title.as_deref().map(parse_selector).transpose()?,
            date: self.date.as_deref().map(parse_selector).transpose()?,
        })
    }
}

/// A [`ListingSpec`] with parsed selectors.
#[derive(Debug, Clone)]
pub struct CompiledListing {
    item: Selector,
    link: Option<Selector>,
    title: Option<Selector>,
    date: Option<Selector>,
}

pub(crate) fn parse_selector(selector: &str) -> SourceResult<Selector> {
    Selector::parse(selector).map_err(|e| SourceError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Visible text with whitespace runs collapsed.
pub(crate) fn element_text(el: &ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve an href to an absolute http(s) URL, or `None` if unusable.
fn resolve_href(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let url = base.join(href).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// Walk a listing document and produce candidates in document order.
///
/// Elements without a usable detail href are skipped silently. The recency
/// marker is checked before the title filter, so a malformed marker aborts the
/// whole enumeration even on a row the keywords would drop. A detail URL is
/// emitted once, at its first qualifying element. Already-processed items are
/// NOT filtered out.
pub fn enumerate_listing(
    html: &str,
    listing: &CompiledListing,
    link_base: &Url,
    filters: &Filters,
) -> SourceResult<Vec<Candidate>> {
    let document = Html::parse_document(html);
    let mut candidates = Vec::new();
    let mut seen = HashSet::new();

    for (index, item) in document.select(&listing.item).enumerate() {
        let anchor = match &listing.link {
            Some(selector) => item.select(selector).next(),
            None => Some(item),
        };
        let Some(anchor) = anchor else {
            debug!(index, "Listing item has no anchor, skipping");
            continue;
        };
        let Some(url) = anchor
            .value()
            .attr("href")
            .and_then(|href| resolve_href(href, link_base))
        else {
            debug!(index, "Listing item has no usable href, skipping");
            continue;
        };

        let marker = match &listing.date {
            Some(selector) => {
                let marker = item
                    .select(selector)
                    .next()
                    .map(|el| element_text(&el))
                    .unwrap_or_default();
                if !within_window(&marker, filters)? {
                    debug!(index, marker = %marker, "Outside recency window, skipping");
                    continue;
                }
                Some(marker)
            }
            None => None,
        };

        let title = match &listing.title {
            Some(selector) => item
                .select(selector)
                .next()
                .map(|el| element_text(&el))
                .unwrap_or_default(),
            None => element_text(&anchor),
        };

        if !matches_keywords(&title, filters) {
            debug!(index, title = %title, "Title does not match keywords, skipping");
            continue;
        }

        let identifier = url.to_string();
        if !seen.insert(identifier.clone()) {
            debug!(index, url = %identifier, "Detail URL already listed, skipping");
            continue;
        }

        let mut candidate = Candidate::new(identifier, title);
        if let Some(marker) = marker {
            candidate = candidate.with_recency_marker(marker);
        }

        candidates.push(candidate);
    }

    Ok(candidates)
}
