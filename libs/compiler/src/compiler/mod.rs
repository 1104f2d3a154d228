//! Compilation of a resolved [`SourceSet`] and selection of the contract to analyse.

use std::collections::BTreeMap;

use foundry_compilers::artifacts::contract::Contract as FoundryContract;
use foundry_compilers::artifacts::CompilerOutput;
use serde_json::Value;

use crate::ast::{contract_definitions, ContractKind};
use crate::internal::errors::{Error, Result};
use crate::internal::solc::CompilerSnapshot;
use crate::sources::SourceSet;

pub use output::{CompiledArtifact, Diagnostic, SeverityLevel, SourceLocation};

mod input;
pub mod output;

/// Drives one compiler snapshot over a source set. Holds no state beyond the borrowed snapshot.
pub struct CompilationDriver<'a, S: CompilerSnapshot + ?Sized> {
  snapshot: &'a S,
}

impl<'a, S: CompilerSnapshot + ?Sized> CompilationDriver<'a, S> {
  pub fn new(snapshot: &'a S) -> Self {
    Self { snapshot }
  }

  /// Compile every unit of `sources` and pick the contract named by `hint`, or the default
  /// contract of the entry file when no hint is given.
  ///
  /// Default policy: the last deployable contract (not an interface, library, or abstract
  /// contract) in the entry file's source order; failing that the last library; failing that,
  /// when the compiler emitted no AST, the last contract of the entry file in output order.
  pub fn compile(&self, sources: &SourceSet, hint: Option<&str>) -> Result<CompiledArtifact> {
    let version = self.snapshot.version();
    let input = input::build_input(sources, version)?;
    tracing::info!(%version, sources = sources.len(), "compiling");

    let output = self.snapshot.compile(&input)?;
    check_diagnostics(&output)?;

    let entry = sources.entry();
    let source_asts = output::source_asts(&output);
    let (file, name) = match hint {
      Some(name) => find_named(&output, entry, name)?,
      None => (
        entry.to_string(),
        default_contract(&output, entry, source_asts.get(entry))?,
      ),
    };
    tracing::debug!(contract = %name, file = %file, "selected contract");

    let contract = contracts_in(&output, &file)
      .and_then(|contracts| contracts.get(&name))
      .ok_or_else(|| Error::ContractNotFound {
        name: name.clone(),
        available: available_contracts(&output),
      })?;
    let code = output::contract_code(contract);

    Ok(CompiledArtifact {
      contract_name: name,
      source_path: file,
      bytecode: code.bytecode,
      source_map: code.source_map,
      deployed_bytecode: code.deployed_bytecode,
      deployed_source_map: code.deployed_source_map,
      ast: source_asts.get(entry).cloned().unwrap_or(Value::Null),
      source_list: output::source_list(&output),
      source_asts,
      compiler_version: version.to_string(),
    })
  }
}

fn check_diagnostics(output: &CompilerOutput) -> Result<()> {
  let mut errors = Vec::new();
  for diagnostic in output::diagnostics(output) {
    match diagnostic.severity {
      SeverityLevel::Error => errors.push(diagnostic.render()),
      SeverityLevel::Warning => tracing::warn!("{}", diagnostic.render()),
      SeverityLevel::Info => tracing::debug!("{}", diagnostic.render()),
    }
  }

  if errors.is_empty() {
    Ok(())
  } else {
    Err(Error::Compilation {
      diagnostics: errors.join("\n"),
    })
  }
}

fn contracts_in<'o>(
  output: &'o CompilerOutput,
  file: &str,
) -> Option<&'o BTreeMap<String, FoundryContract>> {
  output
    .contracts
    .iter()
    .find(|(path, _)| path.to_string_lossy() == file)
    .map(|(_, contracts)| contracts)
}

fn available_contracts(output: &CompilerOutput) -> Vec<String> {
  let mut names: Vec<String> = output
    .contracts
    .values()
    .flat_map(|contracts| contracts.keys().cloned())
    .collect();
  names.sort();
  names.dedup();
  names
}

fn find_named(output: &CompilerOutput, entry: &str, name: &str) -> Result<(String, String)> {
  if contracts_in(output, entry).is_some_and(|contracts| contracts.contains_key(name)) {
    return Ok((entry.to_string(), name.to_string()));
  }

  output
    .contracts
    .iter()
    .find(|(_, contracts)| contracts.contains_key(name))
    .map(|(path, _)| (path.to_string_lossy().to_string(), name.to_string()))
    .ok_or_else(|| Error::ContractNotFound {
      name: name.to_string(),
      available: available_contracts(output),
    })
}

fn default_contract(output: &CompilerOutput, entry: &str, ast: Option<&Value>) -> Result<String> {
  let no_deployable = || Error::NoDeployableContract {
    file: entry.to_string(),
  };
  let compiled = contracts_in(output, entry).ok_or_else(no_deployable)?;

  if let Some(ast) = ast {
    let definitions: Vec<_> = contract_definitions(ast)
      .into_iter()
      .filter(|definition| compiled.contains_key(&definition.name))
      .collect();

    if let Some(found) = definitions.iter().rev().find(|d| d.is_deployable()) {
      return Ok(found.name.clone());
    }
    return definitions
      .iter()
      .rev()
      .find(|d| d.kind == ContractKind::Library)
      .map(|found| found.name.clone())
      .ok_or_else(no_deployable);
  }

  compiled.keys().next_back().cloned().ok_or_else(no_deployable)
}

#[cfg(test)]
mod tests {
  use std::cell::Cell;

  use foundry_compilers::artifacts::SolcInput;
  use semver::Version;

  use super::*;
  use crate::sources::resolve;
  use crate::sources::tests::MemoryProvider;

  /// Snapshot returning canned standard-JSON output.
  struct FakeSnapshot {
    version: Version,
    output: String,
    calls: Cell<usize>,
  }

  impl FakeSnapshot {
    fn new(output: &str) -> Self {
      Self {
        version: Version::new(0, 8, 24),
        output: output.to_string(),
        calls: Cell::new(0),
      }
    }
  }

  impl CompilerSnapshot for FakeSnapshot {
    fn version(&self) -> &Version {
      &self.version
    }

    fn compile(&self, input: &SolcInput) -> Result<CompilerOutput> {
      self.calls.set(self.calls.get() + 1);
      assert!(!input.sources.is_empty());
      Ok(serde_json::from_str(&self.output).expect("canned output"))
    }
  }

  fn sources() -> SourceSet {
    let provider = MemoryProvider::new(&[
      ("Token.sol", r#"pragma solidity ^0.8.0; import "./Base.sol"; contract Token is Base {}"#),
      ("Base.sol", "pragma solidity ^0.8.0; abstract contract Base {}"),
    ]);
    resolve("Token.sol", &provider).expect("sources")
  }

  fn contract(object: &str, map: &str) -> String {
    format!(
      r#"{{
        "abi": [],
        "evm": {{
          "bytecode": {{ "object": "{object}", "sourceMap": "{map}" }},
          "deployedBytecode": {{ "object": "{object}", "sourceMap": "{map}", "immutableReferences": {{}} }}
        }}
      }}"#
    )
  }

  fn definition(name: &str, kind: &str, is_abstract: bool, src: &str) -> String {
    format!(
      r#"{{ "id": 1, "nodeType": "ContractDefinition", "src": "{src}", "nodes": [],
           "name": "{name}", "contractKind": "{kind}", "abstract": {is_abstract} }}"#
    )
  }

  fn source(path: &str, id: u32, nodes: &[String]) -> String {
    format!(
      r#"{{ "id": {id}, "ast": {{
          "absolutePath": "{path}", "id": {id}, "exportedSymbols": {{}},
          "nodeType": "SourceUnit", "src": "0:500:{id}", "nodes": [{}]
        }} }}"#,
      nodes.join(",")
    )
  }

  fn token_output() -> String {
    format!(
      r#"{{
        "contracts": {{
          "Base.sol": {{ "Base": {} }},
          "Token.sol": {{
            "Helper": {},
            "IToken": {},
            "MathLib": {},
            "Token": {}
          }}
        }},
        "sources": {{
          "Base.sol": {},
          "Token.sol": {}
        }}
      }}"#,
      contract("", ""),
      contract("6002", "1:1:1:-:0"),
      contract("", ""),
      contract("6003", "2:1:1:-:0"),
      contract("6080", "0:10:1:-:0"),
      source(
        "Base.sol",
        0,
        &[definition("Base", "contract", true, "24:26:0")]
      ),
      source(
        "Token.sol",
        1,
        &[
          definition("IToken", "interface", false, "50:20:1"),
          definition("Token", "contract", false, "80:40:1"),
          definition("MathLib", "library", false, "130:30:1"),
          definition("Helper", "contract", false, "10:30:1"),
        ]
      ),
    )
  }

  #[test]
  fn default_contract_is_last_deployable_in_source_order() {
    let snapshot = FakeSnapshot::new(&token_output());
    let artifact = CompilationDriver::new(&snapshot)
      .compile(&sources(), None)
      .expect("compile");

    assert_eq!(artifact.contract_name, "Token");
    assert_eq!(artifact.source_path, "Token.sol");
    assert_eq!(artifact.bytecode, "0x6080");
    assert_eq!(artifact.deployed_source_map, "0:10:1:-:0");
    assert_eq!(artifact.source_list, vec!["Base.sol", "Token.sol"]);
    assert_eq!(artifact.compiler_version, "0.8.24");
    assert_eq!(artifact.ast["absolutePath"], "Token.sol");
    assert_eq!(artifact.source_asts.len(), 2);
    assert_eq!(snapshot.calls.get(), 1);
  }

  #[test]
  fn hint_selects_named_contract_in_any_file() {
    let snapshot = FakeSnapshot::new(&token_output());
    let driver = CompilationDriver::new(&snapshot);

    let helper = driver.compile(&sources(), Some("Helper")).expect("helper");
    assert_eq!(helper.contract_name, "Helper");
    assert_eq!(helper.bytecode, "0x6002");

    let base = driver.compile(&sources(), Some("Base")).expect("base");
    assert_eq!(base.source_path, "Base.sol");
  }

  #[test]
  fn unknown_hint_lists_available_contracts() {
    let snapshot = FakeSnapshot::new(&token_output());
    let err = CompilationDriver::new(&snapshot)
      .compile(&sources(), Some("Vault"))
      .expect_err("missing");
    match err {
      Error::ContractNotFound { name, available } => {
        assert_eq!(name, "Vault");
        assert_eq!(available, vec!["Base", "Helper", "IToken", "MathLib", "Token"]);
      }
      other => panic!("unexpected error {other:?}"),
    }
  }

  #[test]
  fn library_is_fallback_when_nothing_deployable() {
    let output = format!(
      r#"{{
        "contracts": {{ "Token.sol": {{ "IToken": {}, "MathLib": {} }} }},
        "sources": {{ "Token.sol": {} }}
      }}"#,
      contract("", ""),
      contract("6003", "2:1:0:-:0"),
      source(
        "Token.sol",
        0,
        &[
          definition("MathLib", "library", false, "10:30:0"),
          definition("IToken", "interface", false, "50:20:0"),
        ]
      ),
    );
    let snapshot = FakeSnapshot::new(&output);
    let artifact = CompilationDriver::new(&snapshot)
      .compile(&sources(), None)
      .expect("compile");
    assert_eq!(artifact.contract_name, "MathLib");
  }

  #[test]
  fn interfaces_only_is_not_deployable() {
    let output = format!(
      r#"{{
        "contracts": {{ "Token.sol": {{ "IToken": {} }} }},
        "sources": {{ "Token.sol": {} }}
      }}"#,
      contract("", ""),
      source(
        "Token.sol",
        0,
        &[definition("IToken", "interface", false, "50:20:0")]
      ),
    );
    let snapshot = FakeSnapshot::new(&output);
    let err = CompilationDriver::new(&snapshot)
      .compile(&sources(), None)
      .expect_err("nothing deployable");
    assert!(matches!(err, Error::NoDeployableContract { ref file } if file == "Token.sol"));
  }

  #[test]
  fn missing_ast_falls_back_to_output_order() {
    let output = format!(
      r#"{{
        "contracts": {{ "Token.sol": {{ "Alpha": {}, "Beta": {} }} }},
        "sources": {{ "Token.sol": {{ "id": 0 }} }}
      }}"#,
      contract("6001", "0:1:0:-:0"),
      contract("6002", "0:1:0:-:0"),
    );
    let snapshot = FakeSnapshot::new(&output);
    let artifact = CompilationDriver::new(&snapshot)
      .compile(&sources(), None)
      .expect("compile");
    assert_eq!(artifact.contract_name, "Beta");
    assert!(artifact.ast.is_null());
  }

  #[test]
  fn error_diagnostics_fail_compilation() {
    let output = r#"{
      "contracts": {},
      "errors": [
        {
          "component": "general",
          "formattedMessage": "ParserError: Expected ';' but got '}'",
          "message": "Expected ';' but got '}'",
          "severity": "error",
          "type": "ParserError"
        },
        {
          "component": "general",
          "formattedMessage": "Warning: Unused local variable.",
          "message": "Unused local variable.",
          "severity": "warning",
          "type": "Warning"
        }
      ],
      "sources": {}
    }"#;
    let snapshot = FakeSnapshot::new(output);
    let err = CompilationDriver::new(&snapshot)
      .compile(&sources(), None)
      .expect_err("syntax error");
    match err {
      Error::Compilation { diagnostics } => {
        assert!(diagnostics.contains("Expected ';'"));
        assert!(!diagnostics.contains("Unused local variable"));
      }
      other => panic!("unexpected error {other:?}"),
    }
  }

  #[test]
  fn warnings_alone_do_not_fail() {
    let output = format!(
      r#"{{
        "contracts": {{ "Token.sol": {{ "Token": {} }} }},
        "errors": [{{
          "component": "general",
          "message": "SPDX license identifier not provided",
          "severity": "warning",
          "type": "Warning"
        }}],
        "sources": {{ "Token.sol": {{ "id": 0 }} }}
      }}"#,
      contract("6080", "0:1:0:-:0"),
    );
    let snapshot = FakeSnapshot::new(&output);
    let artifact = CompilationDriver::new(&snapshot)
      .compile(&sources(), None)
      .expect("compile");
    assert_eq!(artifact.contract_name, "Token");
  }
}
