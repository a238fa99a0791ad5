//! Google Sheets values API.

use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{check_status, join_segments, GoogleError, GoogleResult};

pub const SHEETS_API: &str = "https://sheets.googleapis.com/v4/";

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

pub struct SheetsClient {
    http: reqwest::Client,
    base: Url,
    token: String,
    spreadsheet_id: String,
}

impl SheetsClient {
    pub fn new(
        token: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        timeout: Duration,
    ) -> GoogleResult<Self> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            base: Url::parse(SHEETS_API).map_err(|e| GoogleError::Url(e.to_string()))?,
            token: token.into(),
            spreadsheet_id: spreadsheet_id.into(),
        })
    }

    /// Point at another API root (tests).
    pub fn with_base_url(mut self, base: Url) -> Self {
        self.base = base;
        self
    }

    fn values_url(&self, range: &str) -> GoogleResult<Url> {
        join_segments(
            &self.base,
            &["spreadsheets", self.spreadsheet_id.as_str(), "values", range],
        )
    }

    /// Read a range as rows of display strings. Trailing empty cells are
    /// omitted by the API, so rows can be ragged.
    pub async fn get_values(&self, range: &str) -> GoogleResult<Vec<Vec<String>>> {
        let url = self.values_url(range)?;
        debug!(range = %range, "Reading sheet values");

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        let body = check_status(response).await?.text().await?;
        let parsed: ValueRange = serde_json::from_str(&body)?;

        Ok(parsed
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    /// Overwrite a single cell with a raw value.
    pub async fn update_cell(&self, cell: &str, value: &str) -> GoogleResult<()> {
        let mut url = self.values_url(cell)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let response = self
            .http
            .put(url)
            .bearer_auth(&self.token)
            .json(&json!({ "range": cell, "values": [[value]] }))
            .send()
            .await?;
        check_status(response).await?;
        debug!(cell = %cell, value = %value, "Updated sheet cell");
        Ok(())
    }
}

fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
