use thiserror::Error;

/// Errors raised while building, submitting, or tracking an analysis job.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
  /// The compiled artifact lacks a field the service requires.
  #[error("compiled contract {contract} has no {missing}")]
  IncompleteArtifact {
    contract: String,
    missing: &'static str,
  },

  /// The source list handed to the request differs from the compiler's ordering.
  #[error("source list [{}] does not match compiler ordering [{}]", found.join(", "), expected.join(", "))]
  SourceListMismatch {
    expected: Vec<String>,
    found: Vec<String>,
  },

  /// The service refused the submission (HTTP 4xx).
  #[error("analysis submission rejected ({status}): {message}")]
  SubmissionRejected { status: u16, message: String },

  /// A non-recoverable HTTP error outside submission (bad credentials, unknown job).
  #[error("analysis service rejected the request ({status}): {message}")]
  Rejected { status: u16, message: String },

  /// Transport faults persisted past the retry budget.
  #[error("network error after {attempts} attempt(s): {message}")]
  TransientNetwork { attempts: u32, message: String },

  /// A response body the client could not interpret.
  #[error("unexpected response from analysis service: {0}")]
  Protocol(String),
}

impl Error {
  /// Whether another attempt at the same call could succeed.
  #[must_use]
  pub fn is_retryable(&self) -> bool {
    matches!(self, Self::TransientNetwork { .. })
  }
}

pub type Result<T> = std::result::Result<T, Error>;
