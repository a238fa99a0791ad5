//! Minimal Google Sheets and Drive REST clients (bearer-token auth).

pub mod drive;
pub mod sheets;

pub use drive::DriveClient;
pub use sheets::SheetsClient;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GoogleError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Google API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid URL: {0}")]
    Url(String),

    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type GoogleResult<T> = std::result::Result<T, GoogleError>;

/// Fail on non-success status, keeping the error body for the log.
pub(crate) async fn check_status(response: reqwest::Response) -> GoogleResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GoogleError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Append path segments (percent-encoded) to a base URL.
pub(crate) fn join_segments(base: &url::Url, segments: &[&str]) -> GoogleResult<url::Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| GoogleError::Url(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
