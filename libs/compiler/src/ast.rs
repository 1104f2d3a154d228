//! Minimal reads over the compact JSON AST emitted by solc.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractKind {
  Contract,
  Interface,
  Library,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractDefinition {
  pub name: String,
  pub kind: ContractKind,
  pub is_abstract: bool,
  /// Byte offset of the definition in its source file.
  pub start: usize,
}

impl ContractDefinition {
  pub fn is_deployable(&self) -> bool {
    self.kind == ContractKind::Contract && !self.is_abstract
  }
}

/// Top-level contract definitions of a source unit, in source order.
pub fn contract_definitions(ast: &Value) -> Vec<ContractDefinition> {
  let Some(nodes) = ast.get("nodes").and_then(Value::as_array) else {
    return Vec::new();
  };

  let mut definitions: Vec<ContractDefinition> = nodes
    .iter()
    .filter(|node| node.get("nodeType").and_then(Value::as_str) == Some("ContractDefinition"))
    .filter_map(|node| {
      let name = node.get("name")?.as_str()?.to_string();
      let kind = match node.get("contractKind").and_then(Value::as_str) {
        Some("interface") => ContractKind::Interface,
        Some("library") => ContractKind::Library,
        _ => ContractKind::Contract,
      };
      // `abstract` exists from 0.6; older compilers only report `fullyImplemented`
      let is_abstract = node
        .get("abstract")
        .and_then(Value::as_bool)
        .or_else(|| {
          node
            .get("fullyImplemented")
            .and_then(Value::as_bool)
            .map(|implemented| !implemented)
        })
        .unwrap_or(false);
      Some(ContractDefinition {
        name,
        kind,
        is_abstract,
        start: src_start(node.get("src")).unwrap_or(0),
      })
    })
    .collect();

  definitions.sort_by_key(|definition| definition.start);
  definitions
}

fn src_start(src: Option<&Value>) -> Option<usize> {
  match src? {
    Value::String(text) => text.split(':').next()?.parse().ok(),
    Value::Object(map) => map.get("start")?.as_u64().map(|start| start as usize),
    _ => None,
  }
}
