//! Error types for the verification routine.
//!
//! None of these ever reach the ledger: every error is logged and folded
//! into a rejected verdict.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Invalid content identifier: {0:?}")]
    InvalidContentId(String),

    #[error("Fetch budget of {0} requests exhausted")]
    FetchBudgetExhausted(usize),

    #[error("All {attempts} gateway(s) failed for {cid}")]
    AllGatewaysFailed { cid: String, attempts: usize },

    #[error("Timed out fetching {0}")]
    FetchTimeout(String),

    #[error("Verification exceeded its total time budget")]
    TotalTimeout,

    #[error("Gateway returned HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("Response exceeds {limit} bytes")]
    ResponseTooLarge { limit: usize },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Response is not JSON: {0}")]
    InvalidJson(String),

    #[error("Malformed schema at {path}: {reason}")]
    MalformedSchema { path: String, reason: String },

    #[error("Schema nesting deeper than {0}")]
    DepthExceeded(usize),

    #[error("Constraint violated at {path}: {reason}")]
    Violation { path: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl VerifyError {
    /// Document was fetched and parsed but did not satisfy the schema.
    pub fn is_violation(&self) -> bool {
        matches!(self, VerifyError::Violation { .. })
    }
}

impl From<reqwest::Error> for VerifyError {
    fn from(err: reqwest::Error) -> Self {
        match err.url() {
            Some(url) if err.is_timeout() => VerifyError::FetchTimeout(url.to_string()),
            _ => VerifyError::Transport(err.to_string()),
        }
    }
}

pub type VerifyResult<T> = Result<T, VerifyError>;
