//! Fetches solc snapshots from the official binaries mirror and keeps them in a
//! per-version on-disk cache.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use foundry_compilers::solc::Solc;
use reqwest::blocking::Client;
use semver::Version;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::internal::errors::{Error, Result};
use crate::release::{CompilerRelease, ReleaseIndex};

pub const DEFAULT_BINARIES_URL: &str = "https://binaries.soliditylang.org";

const INDEX_FILE: &str = "list.json";
const MAX_DOWNLOAD_ATTEMPTS: usize = 2;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Directory name of the current platform on the binaries mirror.
pub fn platform() -> &'static str {
  if cfg!(target_os = "windows") {
    "windows-amd64"
  } else if cfg!(target_os = "macos") {
    "macosx-amd64"
  } else {
    "linux-amd64"
  }
}

fn binary_name() -> &'static str {
  if cfg!(target_os = "windows") {
    "solc.exe"
  } else {
    "solc"
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
  /// Network fault or server-side failure; worth one more attempt.
  Transient(String),
  /// The request can never succeed (missing file, forbidden).
  Permanent(String),
}

impl FetchError {
  fn reason(&self) -> &str {
    match self {
      FetchError::Transient(reason) | FetchError::Permanent(reason) => reason,
    }
  }
}

/// Transport used to pull the release index and snapshot binaries.
pub trait SnapshotFetcher {
  fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, FetchError>;
}

pub struct HttpFetcher {
  client: Client,
}

impl HttpFetcher {
  pub fn new() -> Result<Self> {
    let client = Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .user_agent(concat!("sabre/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|err| Error::ReleaseIndex(format!("failed to build HTTP client: {err}")))?;
    Ok(Self { client })
  }
}

impl SnapshotFetcher for HttpFetcher {
  fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, FetchError> {
    let response = self
      .client
      .get(url)
      .send()
      .map_err(|err| FetchError::Transient(err.to_string()))?;

    let status = response.status();
    if status.is_client_error() && status.as_u16() != 429 {
      return Err(FetchError::Permanent(format!("{url} returned {status}")));
    }
    if !status.is_success() {
      return Err(FetchError::Transient(format!("{url} returned {status}")));
    }

    response
      .bytes()
      .map(|bytes| bytes.to_vec())
      .map_err(|err| FetchError::Transient(err.to_string()))
  }
}

#[derive(Debug, Clone)]
pub struct ProvisionerConfig {
  pub cache_dir: PathBuf,
  pub binaries_url: String,
  pub platform: String,
  /// Also accept binaries installed by `svm` before downloading.
  pub svm_lookup: bool,
}

impl ProvisionerConfig {
  pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
    Self {
      cache_dir: cache_dir.into(),
      binaries_url: DEFAULT_BINARIES_URL.to_string(),
      platform: platform().to_string(),
      svm_lookup: true,
    }
  }

  /// Platform cache directory, e.g. `~/.cache/sabre/solc` on Linux.
  pub fn default_cache_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "sabre", "sabre").map(|dirs| dirs.cache_dir().join("solc"))
  }

  fn platform_url(&self, file: &str) -> String {
    format!(
      "{}/{}/{}",
      self.binaries_url.trim_end_matches('/'),
      self.platform,
      file
    )
  }
}

/// A snapshot binary present on disk, not yet probed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedCompiler {
  pub version: Version,
  pub path: PathBuf,
}

pub struct CompilerProvisioner<F = HttpFetcher> {
  config: ProvisionerConfig,
  fetcher: F,
}

impl<F: SnapshotFetcher> CompilerProvisioner<F> {
  pub fn new(config: ProvisionerConfig, fetcher: F) -> Self {
    Self { config, fetcher }
  }

  /// Fetches the platform release index. A fresh copy is written to the cache;
  /// when the mirror is unreachable the cached copy is used instead.
  pub fn release_index(&self) -> Result<ReleaseIndex> {
    let url = self.config.platform_url(INDEX_FILE);
    let cached = self.config.cache_dir.join(INDEX_FILE);

    match self.fetch_with_retry(&url) {
      Ok(bytes) => {
        let text = String::from_utf8_lossy(&bytes);
        let index = ReleaseIndex::from_json(&text)?;
        if let Err(err) = persist_atomically(&cached, &bytes, false) {
          tracing::warn!(error = %err, "could not cache solc release index");
        }
        Ok(index)
      }
      Err(fetch_error) => match fs::read_to_string(&cached) {
        Ok(text) => {
          tracing::warn!(
            reason = fetch_error.reason(),
            "solc release index unavailable, using cached copy"
          );
          ReleaseIndex::from_json(&text)
        }
        Err(_) => Err(Error::ReleaseIndex(fetch_error.reason().to_string())),
      },
    }
  }

  /// Returns a local binary for `release`, downloading it on a cache miss.
  pub fn provision(&self, release: &CompilerRelease) -> Result<ProvisionedCompiler> {
    let version = release.resolved_version.clone();
    let target = self.cached_path(&version);

    if target.is_file() {
      tracing::debug!(%version, path = %target.display(), "solc cache hit");
      return Ok(ProvisionedCompiler {
        version,
        path: target,
      });
    }

    if self.config.svm_lookup {
      if let Ok(Some(solc)) = Solc::find_svm_installed_version(&version) {
        tracing::debug!(%version, path = %solc.solc.display(), "using svm installed solc");
        return Ok(ProvisionedCompiler {
          version,
          path: solc.solc,
        });
      }
    }

    tracing::info!(%version, "downloading solc");
    let bytes = self.download(release)?;
    persist_atomically(&target, &bytes, true).map_err(|err| Error::DownloadFailed {
      version: version.to_string(),
      reason: format!("failed to write {}: {err}", target.display()),
    })?;

    Ok(ProvisionedCompiler {
      version,
      path: target,
    })
  }

  fn cached_path(&self, version: &Version) -> PathBuf {
    self
      .config
      .cache_dir
      .join(version.to_string())
      .join(binary_name())
  }

  fn download(&self, release: &CompilerRelease) -> Result<Vec<u8>> {
    let url = self.config.platform_url(&release.artifact_locator);
    let failed = |reason: String| Error::DownloadFailed {
      version: release.resolved_version.to_string(),
      reason,
    };

    let mut last_reason = String::new();
    for attempt in 1..=MAX_DOWNLOAD_ATTEMPTS {
      match self.fetcher.fetch(&url) {
        Ok(bytes) => match verify_digest(&bytes, release.sha256.as_deref()) {
          Ok(()) => return Ok(bytes),
          Err(reason) => last_reason = reason,
        },
        Err(FetchError::Permanent(reason)) => return Err(failed(reason)),
        Err(FetchError::Transient(reason)) => last_reason = reason,
      }
      if attempt < MAX_DOWNLOAD_ATTEMPTS {
        tracing::warn!(url = %url, reason = %last_reason, "solc download failed, retrying");
      }
    }
    Err(failed(last_reason))
  }

  fn fetch_with_retry(&self, url: &str) -> std::result::Result<Vec<u8>, FetchError> {
    match self.fetcher.fetch(url) {
      Err(FetchError::Transient(reason)) => {
        tracing::warn!(url, reason = %reason, "fetch failed, retrying");
        self.fetcher.fetch(url)
      }
      other => other,
    }
  }
}

fn verify_digest(bytes: &[u8], expected: Option<&str>) -> std::result::Result<(), String> {
  let Some(expected) = expected else {
    return Ok(());
  };
  let actual = hex::encode(Sha256::digest(bytes));
  if actual.eq_ignore_ascii_case(expected) {
    Ok(())
  } else {
    Err(format!("checksum mismatch: expected {expected}, got {actual}"))
  }
}

/// Writes `bytes` next to `target` and renames it into place, so readers never
/// observe a partially written file.
fn persist_atomically(target: &Path, bytes: &[u8], executable: bool) -> std::io::Result<()> {
  let dir = target
    .parent()
    .ok_or_else(|| std::io::Error::other("cache path has no parent directory"))?;
  fs::create_dir_all(dir)?;

  let mut temp = NamedTempFile::new_in(dir)?;
  temp.write_all(bytes)?;
  temp.as_file().sync_all()?;
  if executable {
    mark_executable(temp.path())?;
  }

  match temp.persist(target) {
    Ok(_) => Ok(()),
    // another invocation finished the same download first
    Err(_) if target.is_file() => Ok(()),
    Err(err) => Err(err.error),
  }
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> std::io::Result<()> {
  use std::os::unix::fs::PermissionsExt;
  fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> std::io::Result<()> {
  Ok(())
}
