//! Generic web source: a listing page plus per-item detail pages.
//!
//! Every concrete site is a `WebSource` configured with a listing spec and a
//! transform recipe; no per-site code.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::enumerate::listing::{enumerate_listing, CompiledListing, ListingSpec};
use crate::error::{CandidateResult, FetchError, SourceError, SourceResult, TransformError};
use crate::traits::source::SourceAdapter;
use crate::transform::Recipe;
use crate::types::{
    candidate::Candidate,
    config::Filters,
    payload::{Detail, Payload},
};

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// HTTP client settings for one source.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,

    /// Skip certificate verification (some government sites serve broken chains)
    pub accept_invalid_certs: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_REQUEST_TIMEOUT,
            accept_invalid_certs: false,
        }
    }
}

impl ClientOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Build a client with these settings.
    pub fn build(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
    }
}

/// A listing page whose items link to HTML detail pages.
pub struct WebSource {
    name: String,
    client: reqwest::Client,
    listing_url: Url,

    /// Base for relative listing hrefs (defaults to the listing URL)
    link_base: Url,

    listing: CompiledListing,
    recipe: Recipe,
}

impl WebSource {
    /// Create a source; selectors are validated here.
    pub fn new(
        name: impl Into<String>,
        listing_url: &str,
        listing: &ListingSpec,
        recipe: Recipe,
        client: &ClientOptions,
    ) -> SourceResult<Self> {
        let listing_url = Url::parse(listing_url)
            .map_err(|e| SourceError::Parse(format!("invalid listing URL {}: {}", listing_url, e)))?;
        let client = client.build().map_err(|e| SourceError::Http {
            url: listing_url.to_string(),
            source: Box::new(e),
        })?;

        Ok(Self {
            name: name.into(),
            client,
            link_base: listing_url.clone(),
            listing_url,
            listing: listing.compile()?,
            recipe,
        })
    }

    /// Resolve listing hrefs against another base.
    pub fn with_link_base(mut self, base: Url) -> Self {
        self.link_base = base;
        self
    }

    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Http {
                url: url.to_string(),
                source: Box::new(e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| FetchError::Http {
            url: url.to_string(),
            source: Box::new(e),
        })
    }
}

#[async_trait]
impl SourceAdapter for WebSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_candidates(&self, filters: &Filters) -> SourceResult<Vec<Candidate>> {
        let html = self
            .get_text(self.listing_url.as_str())
            .await
            .map_err(|e| match e {
                FetchError::Status { url, status } => SourceError::Status { url, status },
                FetchError::Http { url, source } => SourceError::Http { url, source },
            })?;

        let candidates = enumerate_listing(&html, &self.listing, &self.link_base, filters)?;
        info!(
            source = %self.name,
            url = %self.listing_url,
            candidates = candidates.len(),
            "Listing enumerated"
        );
        Ok(candidates)
    }

    async fn fetch_detail(&self, candidate: &Candidate) -> CandidateResult<Detail> {
        debug!(source = %self.name, url = %candidate.detail_locator, "Fetching detail");
        let markup = self.get_text(&candidate.detail_locator).await?;
        Ok(Detail::Html {
            url: candidate.detail_locator.clone(),
            markup,
        })
    }

    fn transform(&self, candidate: &Candidate, detail: Detail) -> CandidateResult<Payload> {
        match detail {
            Detail::Html { url, markup } => Ok(self.recipe.apply(candidate, &url, &markup)?),
            Detail::File { url, .. } => Err(TransformError::UnexpectedContent(format!(
                "expected an HTML page, got a file from {}",
                url
            ))
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CandidateError;
    use httpmock::prelude::*;

    const LISTING: &str = r#"<html><body>
        <div class="title"><a href="/tin/1.html">Thông báo tuyển dụng viên chức</a></div>
        <div class="title"><a href="/tin/2.html">Tin hoạt động</a></div>
    </body></html>"#;

    const DETAIL: &str = r#"<html><body>
        <div class="content-text"><p>Chi tiết <a href="/files/tb.pdf">tải về</a></p></div>
    </body></html>"#;

    fn source(server: &MockServer) -> WebSource {
        let listing_url = server.url("/thong-bao/");
        let root = Url::parse(&server.url("/")).unwrap();
        WebSource::new(
            "test",
            &listing_url,
            &ListingSpec::anchors(".title a"),
            Recipe::new(root, ".content-text"),
            &ClientOptions::default().with_timeout(Duration::from_secs(5)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_lists_filters_and_transforms() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/thong-bao/");
                then.status(200).body(LISTING);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/tin/1.html");
                then.status(200).body(DETAIL);
            })
            .await;

        let source = source(&server);
        let filters = Filters::new().with_keywords(["tuyển"]);
        let candidates = source.list_candidates(&filters).await.unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].identifier, server.url("/tin/1.html"));

        let detail = source.fetch_detail(&candidates[0]).await.unwrap();
        let payload = source.transform(&candidates[0], detail).unwrap();

        assert_eq!(payload.title, "Thông báo tuyển dụng viên chức");
        let expected_link = format!("href=\"{}\"", server.url("/files/tb.pdf"));
        assert!(payload.markup().unwrap().contains(&expected_link));
    }

    #[tokio::test]
    async fn test_listing_status_is_source_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/thong-bao/");
                then.status(503);
            })
            .await;

        let err = source(&server)
            .list_candidates(&Filters::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_detail_status_is_candidate_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/tin/9.html");
                then.status(404);
            })
            .await;

        let candidate = Candidate::new(server.url("/tin/9.html"), "Missing");
        let err = source(&server).fetch_detail(&candidate).await.unwrap_err();
        assert!(matches!(
            err,
            CandidateError::Fetch(FetchError::Status { status: 404, .. })
        ));
    }

    #[test]
    fn test_invalid_listing_url() {
        let result = WebSource::new(
            "bad",
            "not a url",
            &ListingSpec::anchors("a"),
            Recipe::new(Url::parse("https://x.vn/").unwrap(), "div"),
            &ClientOptions::default(),
        );
        assert!(matches!(result, Err(SourceError::Parse(_))));
    }
}
