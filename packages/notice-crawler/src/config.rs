use anyhow::{Context, Result};
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use notice_pipeline::{DEFAULT_MAX_CONCURRENCY, PipelineConfig};

/// SMTP settings for the mail sink
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
}

/// Google API settings for the documents workflow
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub access_token: Option<String>,
    pub token_file: PathBuf,
    pub spreadsheet_id: Option<String>,
    pub drive_root_folder_id: Option<String>,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub smtp: Option<SmtpConfig>,
    pub max_concurrency: usize,
    pub request_timeout: Duration,
    pub delivery_timeout: Duration,
    pub google: GoogleConfig,
    pub sheet_titles: Vec<String>,
    pub documents_dir: PathBuf,
}

#[derive(Deserialize)]
struct TokenFile {
    access_token: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let smtp = match var("SMTP_SERVER") {
            Some(server) => Some(SmtpConfig {
                server,
                port: var("SMTP_PORT")
                    .unwrap_or_else(|| "587".to_string())
                    .parse()
                    .context("SMTP_PORT must be a valid port number")?,
                user: var("SMTP_USER").context("SMTP_USER must be set")?,
                pass: var("SMTP_PASS").context("SMTP_PASS must be set")?,
                from: var("SMTP_FROM").context("SMTP_FROM must be set")?,
                to: split_list(&var("EMAIL_TO").context("EMAIL_TO must be set")?),
                cc: var("EMAIL_CC").map(|v| split_list(&v)).unwrap_or_default(),
            }),
            None => None,
        };

        Ok(Self {
            database_url: var("DATABASE_URL"),
            smtp,
            max_concurrency: var("MAX_CONCURRENCY")
                .map(|v| v.parse::<usize>())
                .transpose()
                .context("MAX_CONCURRENCY must be a valid number")?
                .unwrap_or(DEFAULT_MAX_CONCURRENCY),
            request_timeout: Duration::from_secs(
                var("REQUEST_TIMEOUT_SECS")
                    .unwrap_or_else(|| "30".to_string())
                    .parse()
                    .context("REQUEST_TIMEOUT_SECS must be a valid number")?,
            ),
            delivery_timeout: Duration::from_secs(
                var("DELIVERY_TIMEOUT_SECS")
                    .unwrap_or_else(|| "60".to_string())
                    .parse()
                    .context("DELIVERY_TIMEOUT_SECS must be a valid number")?,
            ),
            google: GoogleConfig {
                access_token: var("GOOGLE_ACCESS_TOKEN"),
                token_file: var("GOOGLE_TOKEN_FILE")
                    .unwrap_or_else(|| "keys/token.json".to_string())
                    .into(),
                spreadsheet_id: var("SPREADSHEET_ID"),
                drive_root_folder_id: var("DRIVE_ROOT_FOLDER_ID"),
            },
            sheet_titles: split_list(
                &var("SHEET_TITLES").unwrap_or_else(|| "Lớp 5,Lớp 9,Lớp 12".to_string()),
            ),
            documents_dir: var("DOCUMENTS_DIR")
                .unwrap_or_else(|| "documents".to_string())
                .into(),
        })
    }

    /// Pipeline settings derived from this configuration
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig::new()
            .with_max_concurrency(self.max_concurrency)
            .with_delivery_timeout(self.delivery_timeout)
    }

    /// SMTP settings, required by the mail sink
    pub fn smtp(&self) -> Result<&SmtpConfig> {
        self.smtp.as_ref().context("SMTP_SERVER must be set")
    }

    /// Database URL, required by the SQL Dedup Store
    pub fn database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set")
    }

    /// Spreadsheet id, required by the documents workflow
    pub fn spreadsheet_id(&self) -> Result<&str> {
        self.google
            .spreadsheet_id
            .as_deref()
            .context("SPREADSHEET_ID must be set")
    }

    /// Google OAuth access token, from the environment or the token file
    pub fn google_access_token(&self) -> Result<String> {
        if let Some(token) = &self.google.access_token {
            return Ok(token.clone());
        }
        let path = &self.google.token_file;
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read token file {}", path.display()))?;
        let token: TokenFile = serde_json::from_str(&raw)
            .with_context(|| format!("Token file {} has no access_token", path.display()))?;
        Ok(token.access_token)
    }
}

/// Split a comma-separated list, dropping blanks
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert!(config.smtp.is_none());
        assert!(config.database_url().is_err());
        assert_eq!(config.max_concurrency, 5);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.delivery_timeout, Duration::from_secs(60));
        assert_eq!(config.sheet_titles, vec!["Lớp 5", "Lớp 9", "Lớp 12"]);
        assert_eq!(config.documents_dir, PathBuf::from("documents"));
        assert_eq!(config.google.token_file, PathBuf::from("keys/token.json"));
    }

    #[test]
    fn test_smtp_lists() {
        let config = Config::from_lookup(lookup(&[
            ("SMTP_SERVER", "smtp.example.com"),
            ("SMTP_USER", "bot"),
            ("SMTP_PASS", "secret"),
            ("SMTP_FROM", "bot@example.com"),
            ("EMAIL_TO", "a@example.com, b@example.com"),
            ("EMAIL_CC", "c@example.com"),
        ]))
        .unwrap();

        let smtp = config.smtp().unwrap();
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.to, vec!["a@example.com", "b@example.com"]);
        assert_eq!(smtp.cc, vec!["c@example.com"]);
    }

    #[test]
    fn test_incomplete_smtp_is_an_error() {
        let result = Config::from_lookup(lookup(&[("SMTP_SERVER", "smtp.example.com")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let result = Config::from_lookup(lookup(&[("MAX_CONCURRENCY", "many")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_token_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, r#"{"access_token":"ya29.abc","token_type":"Bearer"}"#).unwrap();

        let config = Config::from_lookup(lookup(&[(
            "GOOGLE_TOKEN_FILE",
            path.to_str().unwrap(),
        )]))
        .unwrap();

        assert_eq!(config.google_access_token().unwrap(), "ya29.abc");
    }
}
