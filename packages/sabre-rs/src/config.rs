//! Environment configuration, read once at startup.

use std::path::PathBuf;

use analysis::config::DEFAULT_API_URL;
use analysis::{ClientConfig, Credentials};
use compiler::provision::DEFAULT_BINARIES_URL;
use compiler::ProvisionerConfig;

pub const ENV_ETH_ADDRESS: &str = "MYTHX_ETH_ADDRESS";
pub const ENV_PASSWORD: &str = "MYTHX_PASSWORD";
pub const ENV_API_URL: &str = "MYTHX_API_URL";
pub const ENV_SOLC_CACHE: &str = "SABRE_SOLC_CACHE";
pub const ENV_BINARIES_URL: &str = "SABRE_SOLC_BINARIES_URL";

#[derive(Debug, Clone)]
pub struct Settings {
  pub api_url: String,
  pub credentials: Credentials,
  pub solc_cache: PathBuf,
  pub binaries_url: String,
}

impl Settings {
  pub fn from_env() -> Self {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Builds settings from any key lookup; empty values count as unset.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    let solc_cache = get(ENV_SOLC_CACHE)
      .map(PathBuf::from)
      .or_else(ProvisionerConfig::default_cache_dir)
      .unwrap_or_else(|| std::env::temp_dir().join("sabre").join("solc"));

    Self {
      api_url: get(ENV_API_URL).unwrap_or_else(|| DEFAULT_API_URL.to_string()),
      credentials: Credentials::from_parts(get(ENV_ETH_ADDRESS), get(ENV_PASSWORD)),
      solc_cache,
      binaries_url: get(ENV_BINARIES_URL).unwrap_or_else(|| DEFAULT_BINARIES_URL.to_string()),
    }
  }

  pub fn client_config(&self) -> ClientConfig {
    ClientConfig::new(self.api_url.clone(), self.credentials.clone())
  }

  pub fn provisioner_config(&self) -> ProvisionerConfig {
    let mut config = ProvisionerConfig::new(self.solc_cache.clone());
    config.binaries_url = self.binaries_url.clone();
    config
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use super::*;

  fn settings(vars: &[(&str, &str)]) -> Settings {
    let vars: HashMap<String, String> = vars
      .iter()
      .map(|(key, value)| (key.to_string(), value.to_string()))
      .collect();
    Settings::from_lookup(|key| vars.get(key).cloned())
  }

  #[test]
  fn defaults_without_environment() {
    let settings = settings(&[]);
    assert_eq!(settings.api_url, DEFAULT_API_URL);
    assert_eq!(settings.binaries_url, DEFAULT_BINARIES_URL);
    assert!(settings.credentials.is_trial());
  }

  #[test]
  fn environment_overrides() {
    let settings = settings(&[
      (ENV_ETH_ADDRESS, "0x1234"),
      (ENV_PASSWORD, "secret"),
      (ENV_API_URL, "http://localhost:3100/v1"),
      (ENV_SOLC_CACHE, "/tmp/solc-cache"),
      (ENV_BINARIES_URL, "http://mirror.local"),
    ]);
    assert_eq!(settings.credentials, Credentials::new("0x1234", "secret"));
    assert_eq!(settings.client_config().api_url, "http://localhost:3100/v1");

    let provisioner = settings.provisioner_config();
    assert_eq!(provisioner.cache_dir, PathBuf::from("/tmp/solc-cache"));
    assert_eq!(provisioner.binaries_url, "http://mirror.local");
  }

  #[test]
  fn blank_values_are_unset() {
    let settings = settings(&[(ENV_API_URL, "  "), (ENV_PASSWORD, "")]);
    assert_eq!(settings.api_url, DEFAULT_API_URL);
    assert!(settings.credentials.is_trial());
  }
}
