use std::collections::BTreeMap;

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::internal::errors::{Error, Result};

/// A concrete, downloadable solc build chosen for a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerRelease {
  /// Constraint text as declared in the source pragma.
  pub version_constraint: String,
  pub resolved_version: Version,
  /// Build file name relative to the platform directory of the binaries mirror.
  pub artifact_locator: String,
  /// Hex encoded SHA-256 digest of the build, when the index publishes one.
  pub sha256: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseEntry {
  pub path: String,
  pub sha256: Option<String>,
}

/// Known stable solc releases for one platform.
#[derive(Debug, Clone, Default)]
pub struct ReleaseIndex {
  releases: BTreeMap<Version, ReleaseEntry>,
}

/// `list.json` as published by binaries.soliditylang.org.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListJson {
  #[serde(default)]
  builds: Vec<BuildEntry>,
  #[serde(default)]
  releases: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildEntry {
  path: String,
  version: String,
  #[serde(default)]
  sha256: Option<String>,
}

impl ReleaseIndex {
  pub fn from_json(text: &str) -> Result<Self> {
    let list: ListJson = serde_json::from_str(text)
      .map_err(|err| Error::ReleaseIndex(format!("malformed list.json: {err}")))?;

    let digests: BTreeMap<&str, &str> = list
      .builds
      .iter()
      .filter_map(|build| build.sha256.as_deref().map(|sha| (build.path.as_str(), sha)))
      .collect();

    let mut releases = BTreeMap::new();
    for (version, path) in &list.releases {
      let Ok(parsed) = Version::parse(version) else {
        tracing::debug!(version = %version, "skipping unparsable release entry");
        continue;
      };
      let sha256 = digests
        .get(path.as_str())
        .map(|digest| digest.trim_start_matches("0x").to_ascii_lowercase());
      releases.insert(
        parsed,
        ReleaseEntry {
          path: path.clone(),
          sha256,
        },
      );
    }

    if releases.is_empty() {
      return Err(Error::ReleaseIndex("list.json contains no releases".into()));
    }
    Ok(Self { releases })
  }

  pub fn from_entries(entries: impl IntoIterator<Item = (Version, ReleaseEntry)>) -> Self {
    Self {
      releases: entries.into_iter().collect(),
    }
  }

  pub fn get(&self, version: &Version) -> Option<&ReleaseEntry> {
    self.releases.get(version)
  }

  /// Releases in ascending version order.
  pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&Version, &ReleaseEntry)> {
    self.releases.iter()
  }

  pub fn len(&self) -> usize {
    self.releases.len()
  }

  pub fn is_empty(&self) -> bool {
    self.releases.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const LIST: &str = r#"{
    "builds": [
      {
        "path": "solc-linux-amd64-v0.8.24+commit.e11b9ed9",
        "version": "0.8.24",
        "build": "commit.e11b9ed9",
        "longVersion": "0.8.24+commit.e11b9ed9",
        "keccak256": "0x00",
        "sha256": "0xABCDEF",
        "urls": []
      },
      {
        "path": "solc-linux-amd64-v0.8.25+commit.b61c2a91",
        "version": "0.8.25",
        "longVersion": "0.8.25+commit.b61c2a91"
      }
    ],
    "releases": {
      "0.8.25": "solc-linux-amd64-v0.8.25+commit.b61c2a91",
      "0.8.24": "solc-linux-amd64-v0.8.24+commit.e11b9ed9"
    },
    "latestRelease": "0.8.25"
  }"#;

  #[test]
  fn parses_releases_with_digests() {
    let index = ReleaseIndex::from_json(LIST).expect("index");
    assert_eq!(index.len(), 2);

    let entry = index.get(&Version::new(0, 8, 24)).expect("0.8.24");
    assert_eq!(entry.path, "solc-linux-amd64-v0.8.24+commit.e11b9ed9");
    assert_eq!(entry.sha256.as_deref(), Some("abcdef"));

    let entry = index.get(&Version::new(0, 8, 25)).expect("0.8.25");
    assert!(entry.sha256.is_none());

    let newest = index.iter().next_back().map(|(version, _)| version.clone());
    assert_eq!(newest, Some(Version::new(0, 8, 25)));
  }

  #[test]
  fn empty_index_is_rejected() {
    let err = ReleaseIndex::from_json(r#"{"builds": [], "releases": {}}"#).expect_err("empty");
    assert!(matches!(err, Error::ReleaseIndex(_)));
  }

  #[test]
  fn malformed_index_is_rejected() {
    let err = ReleaseIndex::from_json("<html>").expect_err("malformed");
    assert!(err.to_string().contains("malformed list.json"));
  }
}
