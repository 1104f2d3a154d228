//! Service endpoint, credentials, and timing knobs for [`crate::AnalysisClient`].

use std::fmt;
use std::time::Duration;

use crate::request::AnalysisMode;

pub const DEFAULT_API_URL: &str = "https://api.mythx.io/v1";

/// Free-tier identity accepted by the service when no account is configured.
pub const TRIAL_ETH_ADDRESS: &str = "0x0000000000000000000000000000000000000000";
pub const TRIAL_PASSWORD: &str = "trial";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
  pub eth_address: String,
  pub password: String,
}

impl Credentials {
  pub fn new(eth_address: impl Into<String>, password: impl Into<String>) -> Self {
    Self {
      eth_address: eth_address.into(),
      password: password.into(),
    }
  }

  pub fn trial() -> Self {
    Self::new(TRIAL_ETH_ADDRESS, TRIAL_PASSWORD)
  }

  /// Account credentials when both parts are set, otherwise the trial identity.
  pub fn from_parts(eth_address: Option<String>, password: Option<String>) -> Self {
    match (eth_address, password) {
      (Some(address), Some(password)) if !address.is_empty() && !password.is_empty() => {
        Self::new(address, password)
      }
      _ => {
        tracing::warn!(
          "no analysis credentials configured, using the trial identity (results are limited)"
        );
        Self::trial()
      }
    }
  }

  pub fn is_trial(&self) -> bool {
    self.eth_address == TRIAL_ETH_ADDRESS && self.password == TRIAL_PASSWORD
  }
}

impl fmt::Debug for Credentials {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Credentials")
      .field("eth_address", &self.eth_address)
      .field("password", &"<redacted>")
      .finish()
  }
}

/// How long to wait before the first poll and how long to keep polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeTiming {
  pub initial_delay: Duration,
  /// Measured from submission.
  pub timeout: Duration,
}

impl ModeTiming {
  pub fn for_mode(mode: AnalysisMode) -> Self {
    match mode {
      AnalysisMode::Quick => Self {
        initial_delay: Duration::from_secs(20),
        timeout: Duration::from_secs(180),
      },
      AnalysisMode::Full => Self {
        initial_delay: Duration::from_secs(300),
        timeout: Duration::from_secs(2400),
      },
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Attempts per call, the first included.
  pub attempts: u32,
  pub pause: Duration,
  pub initial_backoff: Duration,
  pub max_backoff: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      attempts: 3,
      pause: Duration::from_secs(2),
      initial_backoff: Duration::from_secs(3),
      max_backoff: Duration::from_secs(30),
    }
  }
}

impl RetryPolicy {
  /// Upper bound on time spent pausing between attempts of one call.
  pub fn overhead(&self) -> Duration {
    self.pause * self.attempts.saturating_sub(1)
  }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
  pub api_url: String,
  pub credentials: Credentials,
  pub retry: RetryPolicy,
  /// Overrides the per-mode timing; tests use this to shrink the schedule.
  pub timing: Option<ModeTiming>,
}

impl ClientConfig {
  pub fn new(api_url: impl Into<String>, credentials: Credentials) -> Self {
    Self {
      api_url: api_url.into(),
      credentials,
      retry: RetryPolicy::default(),
      timing: None,
    }
  }

  pub fn timing(&self, mode: AnalysisMode) -> ModeTiming {
    self.timing.unwrap_or_else(|| ModeTiming::for_mode(mode))
  }
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self::new(DEFAULT_API_URL, Credentials::trial())
  }
}
