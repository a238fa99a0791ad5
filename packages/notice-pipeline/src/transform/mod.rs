//! Content Transformer.
//!
//! Turns a fetched detail page into a self-contained HTML payload: extract the
//! configured sections, absolutize links, expand attachment manifests and pick
//! a title. Pure: no I/O.

pub mod links;
pub mod manifest;
pub mod render;

pub use links::LinkRewriter;
pub use manifest::{expand_manifest, AttachmentFile, ManifestSpec};

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::error::TransformError;
use crate::types::{candidate::Candidate, payload::Payload};
use render::{render_element, RenderOptions, RenderState};

/// A content section to extract from a detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub selector: String,

    /// A missing required section fails the candidate; optional ones are skipped
    pub required: bool,
}

/// Where the payload title comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TitleSource {
    /// The candidate's listing title
    #[default]
    Candidate,

    /// Text of the first anchor whose href was rewritten, falling back to the
    /// candidate title
    FirstRewrittenLink,
}

/// How a source turns a detail page into a payload.
#[derive(Debug, Clone)]
pub struct Recipe {
    pub site_root: Url,
    pub sections: Vec<Section>,
    pub link_fixups: Vec<(String, String)>,
    pub manifest: Option<ManifestSpec>,
    pub title: TitleSource,
}

impl Recipe {
    /// A recipe with one required content section.
    pub fn new(site_root: Url, container: impl Into<String>) -> Self {
        Self {
            site_root,
            sections: vec![Section {
                selector: container.into(),
                required: true,
            }],
            link_fixups: Vec::new(),
            manifest: None,
            title: TitleSource::Candidate,
        }
    }

    /// Append a section that is skipped when absent.
    pub fn with_optional_section(mut self, selector: impl Into<String>) -> Self {
        self.sections.push(Section {
            selector: selector.into(),
            required: false,
        });
        self
    }

    /// Add a literal substitution for root-relative link paths.
    pub fn with_link_fixup(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.link_fixups.push((from.into(), to.into()));
        self
    }

    pub fn with_manifest(mut self, manifest: ManifestSpec) -> Self {
        self.manifest = Some(manifest);
        self
    }

    pub fn with_title(mut self, title: TitleSource) -> Self {
        self.title = title;
        self
    }

    /// Transform a fetched detail page.
    ///
    /// `page_url` is where the markup came from; document-relative links
    /// resolve against it.
    pub fn apply(
        &self,
        candidate: &Candidate,
        page_url: &str,
        markup: &str,
    ) -> Result<Payload, TransformError> {
        let page = Url::parse(page_url).unwrap_or_else(|_| self.site_root.clone());
        let rewriter = LinkRewriter::new(self.site_root.clone(), page)
            .with_fixups(self.link_fixups.iter().cloned());
        let options = RenderOptions {
            links: Some(&rewriter),
            replace_children: None,
        };

        let document = Html::parse_document(markup);
        let mut state = RenderState::default();
        let mut body = String::new();

        for section in &self.sections {
            let selector =
                Selector::parse(&section.selector).map_err(|e| TransformError::Selector {
                    selector: section.selector.clone(),
                    reason: e.to_string(),
                })?;

            match document.select(&selector).next() {
                Some(el) => render_element(el, &options, &mut state, &mut body),
                None if section.required => {
                    return Err(TransformError::ContainerMissing {
                        selector: section.selector.clone(),
                    });
                }
                None => debug!(selector = %section.selector, "Optional section absent"),
            }
        }

        if let Some(manifest) = &self.manifest {
            body = expand_manifest(&body, manifest, &rewriter)?;
        }

        let title = match self.title {
            TitleSource::Candidate => candidate.title.clone(),
            TitleSource::FirstRewrittenLink => state
                .first_rewritten_link
                .unwrap_or_else(|| candidate.title.clone()),
        };

        Ok(Payload::html(title, body))
    }
}
