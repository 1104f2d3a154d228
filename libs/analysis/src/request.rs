//! Assembly of the analysis submission from a compiled artifact.

use std::collections::BTreeMap;
use std::fmt;

use compiler::{CompiledArtifact, SourceSet};
use serde::Serialize;
use serde_json::Value;

use crate::errors::{Error, Result};

pub const DEFAULT_TOOL_NAME: &str = "sabre";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
  #[default]
  Quick,
  Full,
}

impl AnalysisMode {
  pub fn as_str(&self) -> &'static str {
    match self {
      AnalysisMode::Quick => "quick",
      AnalysisMode::Full => "full",
    }
  }
}

impl fmt::Display for AnalysisMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Whether the service may answer from results of an identical earlier submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CachePolicy {
  #[default]
  Allow,
  Bypass,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
  pub mode: AnalysisMode,
  pub tool_name: String,
  pub no_cache_lookup: bool,
}

impl Default for RequestOptions {
  fn default() -> Self {
    Self {
      mode: AnalysisMode::Quick,
      tool_name: DEFAULT_TOOL_NAME.to_string(),
      no_cache_lookup: false,
    }
  }
}

/// A validated submission. Built once by [`RequestBuilder`] and never mutated.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
  pub artifact: CompiledArtifact,
  /// Logical path of the file the user asked to analyse. May differ from the file declaring
  /// the selected contract.
  pub entry: String,
  pub source_list: Vec<String>,
  pub mode: AnalysisMode,
  pub tool_name: String,
  pub cache_policy: CachePolicy,
  /// Source text of every entry in `source_list`.
  pub sources: BTreeMap<String, String>,
}

impl AnalysisRequest {
  /// Body of the submission call.
  pub fn document(&self) -> RequestDocument<'_> {
    let artifact = &self.artifact;
    let sources = self
      .source_list
      .iter()
      .map(|path| {
        let entry = SourceEntry {
          source: self.sources.get(path).map(String::as_str).unwrap_or_default(),
          ast: artifact.source_asts.get(path),
        };
        (path.as_str(), entry)
      })
      .collect();

    RequestDocument {
      client_tool_name: &self.tool_name,
      no_cache_lookup: self.cache_policy == CachePolicy::Bypass,
      data: RequestData {
        contract_name: &artifact.contract_name,
        bytecode: &artifact.bytecode,
        source_map: &artifact.source_map,
        deployed_bytecode: &artifact.deployed_bytecode,
        deployed_source_map: &artifact.deployed_source_map,
        source_list: &self.source_list,
        sources,
        main_source: &artifact.source_path,
        analysis_mode: self.mode,
        solc_version: &artifact.compiler_version,
      },
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDocument<'a> {
  pub client_tool_name: &'a str,
  pub no_cache_lookup: bool,
  pub data: RequestData<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestData<'a> {
  pub contract_name: &'a str,
  pub bytecode: &'a str,
  pub source_map: &'a str,
  pub deployed_bytecode: &'a str,
  pub deployed_source_map: &'a str,
  pub source_list: &'a [String],
  pub sources: BTreeMap<&'a str, SourceEntry<'a>>,
  pub main_source: &'a str,
  pub analysis_mode: AnalysisMode,
  pub solc_version: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SourceEntry<'a> {
  pub source: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub ast: Option<&'a Value>,
}

#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
  options: RequestOptions,
}

impl RequestBuilder {
  pub fn new(options: RequestOptions) -> Self {
    Self { options }
  }

  /// Validates the artifact and binds it to its sources. No I/O.
  pub fn build(
    &self,
    artifact: &CompiledArtifact,
    source_list: &[String],
    sources: &SourceSet,
  ) -> Result<AnalysisRequest> {
    let incomplete = |missing| Error::IncompleteArtifact {
      contract: artifact.contract_name.clone(),
      missing,
    };
    if artifact.bytecode.is_empty() {
      return Err(incomplete("bytecode"));
    }
    if artifact.source_map.is_empty() {
      return Err(incomplete("source map"));
    }
    if source_list != artifact.source_list.as_slice() {
      return Err(Error::SourceListMismatch {
        expected: artifact.source_list.clone(),
        found: source_list.to_vec(),
      });
    }

    let entry = sources.entry().to_string();
    let sources = source_list
      .iter()
      .filter_map(|path| Some((path.clone(), sources.content(path)?.to_string())))
      .collect();

    Ok(AnalysisRequest {
      artifact: artifact.clone(),
      entry,
      source_list: source_list.to_vec(),
      mode: self.options.mode,
      tool_name: self.options.tool_name.clone(),
      cache_policy: if self.options.no_cache_lookup {
        CachePolicy::Bypass
      } else {
        CachePolicy::Allow
      },
      sources,
    })
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use std::io;

  use compiler::sources::resolve;
  use compiler::SourceProvider;
  use serde_json::json;

  use super::*;

  struct Files(Vec<(&'static str, &'static str)>);

  impl SourceProvider for Files {
    fn read(&self, logical_path: &str) -> io::Result<String> {
      self
        .0
        .iter()
        .find(|(path, _)| *path == logical_path)
        .map(|(_, content)| content.to_string())
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, logical_path.to_string()))
    }
  }

  pub(crate) const TOKEN_SOURCE: &str =
    "pragma solidity ^0.8.0;\nimport \"./Base.sol\";\n\ncontract Token is Base {\n  uint256 total;\n}\n";
  pub(crate) const BASE_SOURCE: &str = "pragma solidity ^0.8.0;\ncontract Base {}\n";

  pub(crate) fn source_set() -> SourceSet {
    resolve(
      "Token.sol",
      &Files(vec![("Token.sol", TOKEN_SOURCE), ("Base.sol", BASE_SOURCE)]),
    )
    .expect("sources")
  }

  pub(crate) fn artifact() -> CompiledArtifact {
    CompiledArtifact {
      contract_name: "Token".into(),
      source_path: "Token.sol".into(),
      bytecode: "0x60806040".into(),
      source_map: "0:10:1:-:0;12:3:1".into(),
      deployed_bytecode: "0x60806040526004".into(),
      deployed_source_map: "48:40:1:-:0;70:14:1;;24:17:0".into(),
      ast: json!({ "absolutePath": "Token.sol" }),
      source_asts: BTreeMap::from([
        ("Base.sol".to_string(), json!({ "absolutePath": "Base.sol" })),
        ("Token.sol".to_string(), json!({ "absolutePath": "Token.sol" })),
      ]),
      source_list: vec!["Base.sol".into(), "Token.sol".into()],
      compiler_version: "0.8.24".into(),
    }
  }

  pub(crate) fn request() -> AnalysisRequest {
    let artifact = artifact();
    RequestBuilder::default()
      .build(&artifact, &artifact.source_list, &source_set())
      .expect("request")
  }

  #[test]
  fn builds_wire_document() {
    let options = RequestOptions {
      mode: AnalysisMode::Full,
      tool_name: "ci".into(),
      no_cache_lookup: true,
    };
    let artifact = artifact();
    let request = RequestBuilder::new(options)
      .build(&artifact, &artifact.source_list, &source_set())
      .expect("request");
    assert_eq!(request.cache_policy, CachePolicy::Bypass);

    let document = serde_json::to_value(request.document()).expect("serialise");
    assert_eq!(document["clientToolName"], "ci");
    assert_eq!(document["noCacheLookup"], true);
    let data = &document["data"];
    assert_eq!(data["contractName"], "Token");
    assert_eq!(data["mainSource"], "Token.sol");
    assert_eq!(data["analysisMode"], "full");
    assert_eq!(data["solcVersion"], "0.8.24");
    assert_eq!(data["sourceList"], json!(["Base.sol", "Token.sol"]));
    assert_eq!(data["sources"]["Base.sol"]["source"], BASE_SOURCE);
    assert_eq!(data["sources"]["Token.sol"]["ast"]["absolutePath"], "Token.sol");
    assert_eq!(data["deployedSourceMap"], "48:40:1:-:0;70:14:1;;24:17:0");
  }

  #[test]
  fn empty_bytecode_is_incomplete() {
    let mut artifact = artifact();
    artifact.bytecode.clear();
    let err = RequestBuilder::default()
      .build(&artifact, &artifact.source_list, &source_set())
      .expect_err("incomplete");
    assert!(matches!(err, Error::IncompleteArtifact { missing: "bytecode", .. }));
  }

  #[test]
  fn empty_source_map_is_incomplete() {
    let mut artifact = artifact();
    artifact.source_map.clear();
    let err = RequestBuilder::default()
      .build(&artifact, &artifact.source_list, &source_set())
      .expect_err("incomplete");
    assert!(matches!(err, Error::IncompleteArtifact { missing: "source map", .. }));
  }

  #[test]
  fn reordered_source_list_is_rejected() {
    let artifact = artifact();
    let reordered = vec!["Token.sol".to_string(), "Base.sol".to_string()];
    let err = RequestBuilder::default()
      .build(&artifact, &reordered, &source_set())
      .expect_err("mismatch");
    assert!(matches!(err, Error::SourceListMismatch { .. }));
  }
}
