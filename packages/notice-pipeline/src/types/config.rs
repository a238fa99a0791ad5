//! Configuration and summary types for pipeline runs.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Default number of in-flight detail tasks.
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

/// Default deadline for a single sink delivery.
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(60);

/// Which candidates a run acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectorPolicy {
    /// Every pending candidate in one invocation
    #[default]
    FullSweep,

    /// The first pending group only, then stop
    SingleGroup,
}

impl FromStr for SelectorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" | "full-sweep" => Ok(Self::FullSweep),
            "single-group" | "group" => Ok(Self::SingleGroup),
            other => Err(format!("unknown selector policy: {}", other)),
        }
    }
}

/// Inclusion filters applied during enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filters {
    /// Lowercased keywords; a title must contain at least one. Empty = no filter.
    pub keywords: Vec<String>,

    /// Maximum distance in days between a recency marker and `today`
    pub recency_window_days: Option<i64>,

    /// Reference date for recency checks
    pub today: NaiveDate,
}

impl Default for Filters {
    fn default() -> Self {
        Self::new()
    }
}

impl Filters {
    /// No filtering, `today` set to the local date.
    pub fn new() -> Self {
        Self {
            keywords: Vec::new(),
            recency_window_days: None,
            today: Local::now().date_naive(),
        }
    }

    /// Require one of these keywords in the title (case-insensitive).
    pub fn with_keywords(mut self, keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.keywords = keywords
            .into_iter()
            .map(|k| k.into().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        self
    }

    /// Only keep candidates whose marker is within `days` of today.
    pub fn with_recency_window(mut self, days: i64) -> Self {
        self.recency_window_days = Some(days);
        self
    }

    /// Override the reference date.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }
}

/// Pipeline-wide settings shared by every source run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum in-flight detail tasks
    pub max_concurrency: usize,

    /// Deadline for one sink delivery
    pub delivery_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set max concurrency (clamped to at least 1).
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    /// Set the delivery deadline.
    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }
}

/// Per-source run options.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub filters: Filters,
    pub policy: SelectorPolicy,
}

impl RunOptions {
    pub fn new(filters: Filters, policy: SelectorPolicy) -> Self {
        Self { filters, policy }
    }
}

/// Outcome counts for one source run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Candidates produced by the enumerator
    pub discovered: usize,

    /// Candidates skipped because they were already processed
    pub skipped: usize,

    /// Candidates dispatched for fetch/transform/deliver
    pub attempted: usize,

    /// Candidates the sink accepted
    pub delivered: usize,

    /// Candidates that failed before or during delivery
    pub failed: usize,

    /// Delivered candidates whose commit failed (subset of `delivered`)
    pub uncommitted: usize,
}

impl RunSummary {
    /// True when nothing failed.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.uncommitted == 0
    }

    /// True when the selector found nothing to act on.
    pub fn is_idle(&self) -> bool {
        self.attempted == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_str() {
        assert_eq!("full".parse::<SelectorPolicy>(), Ok(SelectorPolicy::FullSweep));
        assert_eq!(
            "Single-Group".parse::<SelectorPolicy>(),
            Ok(SelectorPolicy::SingleGroup)
        );
        assert!("sometimes".parse::<SelectorPolicy>().is_err());
    }

    #[test]
    fn test_keywords_are_lowercased() {
        let filters = Filters::new().with_keywords(["Tuyển Dụng", ""]);
        assert_eq!(filters.keywords, vec!["tuyển dụng".to_string()]);
    }

    #[test]
    fn test_concurrency_clamped() {
        assert_eq!(PipelineConfig::new().with_max_concurrency(0).max_concurrency, 1);
    }
}
