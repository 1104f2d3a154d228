use std::collections::BTreeMap;

use foundry_compilers::artifacts::contract::Contract as FoundryContract;
use foundry_compilers::artifacts::error::{Error as FoundryCompilerError, Severity};
use foundry_compilers::artifacts::{BytecodeObject, CompilerOutput};
use serde::Serialize;
use serde_json::Value;

// -----------------------------------------------------------------------------
// Diagnostics
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum SeverityLevel {
  Error,
  Warning,
  Info,
}

#[derive(Clone, Debug, Serialize)]
pub struct SourceLocation {
  pub file: String,
  pub start: i32,
  pub end: i32,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
  pub message: String,
  pub formatted_message: Option<String>,
  pub severity: SeverityLevel,
  pub error_type: String,
  pub error_code: Option<u64>,
  pub source_location: Option<SourceLocation>,
}

impl Diagnostic {
  /// Compiler-formatted text when present, otherwise `type: message` prefixed with the
  /// `file:start` of the location when one is known.
  pub fn render(&self) -> String {
    match (&self.formatted_message, &self.source_location) {
      (Some(formatted), _) => formatted.trim_end().to_string(),
      (None, Some(location)) => format!(
        "{}:{}: {}: {}",
        location.file, location.start, self.error_type, self.message
      ),
      (None, None) => format!("{}: {}", self.error_type, self.message),
    }
  }
}

pub(crate) fn diagnostics(output: &CompilerOutput) -> Vec<Diagnostic> {
  output.errors.iter().map(solc_error_to_diagnostic).collect()
}

fn solc_error_to_diagnostic(error: &FoundryCompilerError) -> Diagnostic {
  let severity = match error.severity {
    Severity::Error => SeverityLevel::Error,
    Severity::Warning => SeverityLevel::Warning,
    Severity::Info => SeverityLevel::Info,
  };

  Diagnostic {
    message: error.message.clone(),
    formatted_message: error.formatted_message.clone(),
    severity,
    error_type: error.r#type.clone(),
    error_code: error.error_code,
    source_location: error.source_location.as_ref().map(|loc| SourceLocation {
      file: loc.file.clone(),
      start: loc.start,
      end: loc.end,
    }),
  }
}

// -----------------------------------------------------------------------------
// Compiled artifact
// -----------------------------------------------------------------------------

/// Everything the analysis request needs from one compiled contract.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledArtifact {
  pub contract_name: String,
  /// Logical path of the file declaring the contract.
  pub source_path: String,
  pub bytecode: String,
  pub source_map: String,
  pub deployed_bytecode: String,
  pub deployed_source_map: String,
  /// AST of the entry file.
  pub ast: Value,
  /// AST of every compiled source, keyed by logical path.
  pub source_asts: BTreeMap<String, Value>,
  /// Logical paths ordered by compiler source id; source map file indices point into it.
  pub source_list: Vec<String>,
  pub compiler_version: String,
}

/// Sources ordered by the id solc assigned them.
pub(crate) fn source_list(output: &CompilerOutput) -> Vec<String> {
  let mut entries: Vec<(u32, String)> = output
    .sources
    .iter()
    .map(|(path, source)| (source.id, path.to_string_lossy().to_string()))
    .collect();
  entries.sort();
  entries.into_iter().map(|(_, path)| path).collect()
}

pub(crate) fn source_asts(output: &CompilerOutput) -> BTreeMap<String, Value> {
  output
    .sources
    .iter()
    .filter_map(|(path, source)| {
      let ast = serde_json::to_value(source.ast.as_ref()?).ok()?;
      Some((path.to_string_lossy().to_string(), ast))
    })
    .collect()
}

/// Creation and runtime bytecode with their source maps.
pub(crate) struct ContractCode {
  pub bytecode: String,
  pub source_map: String,
  pub deployed_bytecode: String,
  pub deployed_source_map: String,
}

pub(crate) fn contract_code(contract: &FoundryContract) -> ContractCode {
  let evm = contract.evm.as_ref();
  let creation = evm.and_then(|evm| evm.bytecode.as_ref());
  let deployed = evm
    .and_then(|evm| evm.deployed_bytecode.as_ref())
    .and_then(|deployed| deployed.bytecode.as_ref());

  ContractCode {
    bytecode: creation
      .map(|bytecode| bytecode_hex(&bytecode.object))
      .unwrap_or_default(),
    source_map: creation
      .and_then(|bytecode| bytecode.source_map.clone())
      .unwrap_or_default(),
    deployed_bytecode: deployed
      .map(|bytecode| bytecode_hex(&bytecode.object))
      .unwrap_or_default(),
    deployed_source_map: deployed
      .and_then(|bytecode| bytecode.source_map.clone())
      .unwrap_or_default(),
  }
}

/// `0x`-prefixed hex; unlinked library placeholders are kept as emitted. Empty
/// objects (interfaces, abstract contracts) yield an empty string.
fn bytecode_hex(object: &BytecodeObject) -> String {
  let body = match object {
    BytecodeObject::Bytecode(bytes) => hex::encode(bytes.as_ref()),
    BytecodeObject::Unlinked(text) => text.trim_start_matches("0x").to_string(),
  };
  if body.is_empty() {
    String::new()
  } else {
    format!("0x{body}")
  }
}
