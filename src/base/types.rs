use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

/// Where an analysis request came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TriggerOrigin {
    /// A reaction added to a channel message.
    Reaction,
    /// A slash command; the final report is delivered to `response_url`.
    Command { response_url: String },
}

/// A single request to analyze one URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub url: String,
    pub channel_id: String,
    pub thread_ts: String,
    pub origin: TriggerOrigin,
}

/// Coarse result of a page fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchOutcome {
    Success,
    Blocked,
    Timeout,
    ConnectionError,
    TlsError,
}

/// The result of fetching a single page.
///
/// Fetching never fails outright: every failure mode is folded into `outcome`.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// The URL that produced this result (may differ from the requested URL after `www.` fallback).
    pub url: String,
    /// HTTP status, if a response was received at all.
    pub status: Option<u16>,
    /// Raw body, only present on success.
    pub body: Option<String>,
    pub outcome: FetchOutcome,
    /// Operator-facing detail for failures.
    pub detail: Option<String>,
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        self.outcome == FetchOutcome::Success
    }

    /// The access status this fetch implies for the prompt.
    pub fn access_status(&self) -> AccessStatus {
        match self.outcome {
            FetchOutcome::Success => AccessStatus::Accessible,
            FetchOutcome::Blocked => AccessStatus::Blocked(self.status.unwrap_or_default()),
            FetchOutcome::Timeout => AccessStatus::Timeout,
            FetchOutcome::ConnectionError => AccessStatus::ConnectionError,
            FetchOutcome::TlsError => AccessStatus::TlsError,
        }
    }

    /// The taxonomy error for a failed fetch, if any.
    pub fn error(&self) -> Option<AnalysisError> {
        let detail = self.detail.clone().unwrap_or_default();

        match self.outcome {
            FetchOutcome::Success => None,
            FetchOutcome::Blocked => Some(AnalysisError::FetchBlocked { status: self.status.unwrap_or_default() }),
            FetchOutcome::Timeout => Some(AnalysisError::FetchTimeout),
            FetchOutcome::ConnectionError => Some(AnalysisError::FetchConnectionError(detail)),
            FetchOutcome::TlsError => Some(AnalysisError::FetchTls(detail)),
        }
    }
}

/// Whether the target site could be read directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessStatus {
    Accessible,
    Blocked(u16),
    Timeout,
    ConnectionError,
    TlsError,
}

impl AccessStatus {
    pub fn is_accessible(&self) -> bool {
        matches!(self, AccessStatus::Accessible)
    }
}

impl fmt::Display for AccessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessStatus::Accessible => write!(f, "accessible"),
            AccessStatus::Blocked(0) => write!(f, "blocked"),
            AccessStatus::Blocked(status) => write!(f, "blocked (HTTP {status})"),
            AccessStatus::Timeout => write!(f, "timed out"),
            AccessStatus::ConnectionError => write!(f, "connection failed"),
            AccessStatus::TlsError => write!(f, "TLS verification failed"),
        }
    }
}

/// Content pulled out of a single HTML page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    /// The document title, if the page had one.
    pub title: Option<String>,
    /// Whitespace-collapsed visible text, bounded by the configured budget.
    pub text: String,
    /// Best-effort company name; never empty.
    pub company_name: String,
}

/// How the intelligence in a bundle was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    Direct,
    Gathered,
    Manual,
    Failed,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Provenance::Direct => "direct",
            Provenance::Gathered => "gathered",
            Provenance::Manual => "manual",
            Provenance::Failed => "failed",
        };

        write!(f, "{label}")
    }
}

/// Everything known about the target company, tagged with its provenance.
#[derive(Debug, Clone)]
pub struct IntelligenceBundle {
    pub provenance: Provenance,
    pub text: String,
    /// Human-readable labels of where the text came from (URLs, provider names).
    pub sources: Vec<String>,
}

/// The final LLM output, plus what the pipeline knew when it asked.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub url: String,
    pub company_name: String,
    pub provenance: Provenance,
    pub access_status: AccessStatus,
    /// Verbatim LLM output.
    pub text: String,
}

/// Failure taxonomy for the analysis pipeline.
///
/// Most of these are degraded into placeholders and logged; only
/// `LlmCallFailed` and the trigger errors abort a request.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("target blocked the request (HTTP {status})")]
    FetchBlocked { status: u16 },
    #[error("target request timed out")]
    FetchTimeout,
    #[error("could not connect to target: {0}")]
    FetchConnectionError(String),
    #[error("TLS verification failed: {0}")]
    FetchTls(String),
    #[error("too little text extracted ({chars} chars)")]
    ParseEmpty { chars: usize },
    #[error("all auxiliary intelligence sources failed")]
    AuxiliaryGatherExhausted,
    #[error("LLM call failed: {0}")]
    LlmCallFailed(String),
    #[error("no URL found in message")]
    TriggerNoUrl,
    #[error("could not look up the reacted message: {0}")]
    TriggerLookupFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetch_result(outcome: FetchOutcome, status: Option<u16>) -> FetchResult {
        FetchResult {
            url: "https://example.com".to_string(),
            status,
            body: None,
            outcome,
            detail: Some("boom".to_string()),
        }
    }

    #[test]
    fn test_access_status_follows_fetch_outcome() {
        assert_eq!(fetch_result(FetchOutcome::Blocked, Some(403)).access_status(), AccessStatus::Blocked(403));
        assert_eq!(fetch_result(FetchOutcome::Timeout, None).access_status(), AccessStatus::Timeout);
        assert!(fetch_result(FetchOutcome::Success, Some(200)).access_status().is_accessible());
    }

    #[test]
    fn test_fetch_error_taxonomy() {
        assert!(fetch_result(FetchOutcome::Success, Some(200)).error().is_none());
        assert!(matches!(fetch_result(FetchOutcome::Blocked, Some(429)).error(), Some(AnalysisError::FetchBlocked { status: 429 })));
        assert!(matches!(fetch_result(FetchOutcome::TlsError, None).error(), Some(AnalysisError::FetchTls(_))));
    }

    #[test]
    fn test_access_status_display() {
        assert_eq!(AccessStatus::Blocked(403).to_string(), "blocked (HTTP 403)");
        assert_eq!(AccessStatus::Accessible.to_string(), "accessible");
        assert_eq!(Provenance::Gathered.to_string(), "gathered");
    }
}
