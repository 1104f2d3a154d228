use foundry_compilers::artifacts::Settings;
use serde_json::{json, Value};

use super::errors::{map_invocation_error, Result};

/// Artifacts the analysis request needs from every contract, plus per-file ASTs.
const CONTRACT_OUTPUTS: &[&str] = &[
  "abi",
  "evm.bytecode.object",
  "evm.bytecode.sourceMap",
  "evm.deployedBytecode.object",
  "evm.deployedBytecode.sourceMap",
];

/// Default solc settings with the output selection replaced by what analysis consumes.
pub(crate) fn analysis_settings() -> Result<Settings> {
  let mut base = map_invocation_error(
    serde_json::to_value(Settings::default()),
    "Failed to serialise base compiler settings",
  )?;
  if let Value::Object(map) = &mut base {
    map.remove("outputSelection");
  }

  merge_settings_json(
    &mut base,
    json!({
      "outputSelection": {
        "*": {
          "*": CONTRACT_OUTPUTS,
          "": ["ast"]
        }
      }
    }),
  );

  map_invocation_error(
    serde_json::from_value(base),
    "Failed to parse compiler settings",
  )
}

pub(crate) fn merge_settings_json(base: &mut Value, overrides: Value) {
  match (base, overrides) {
    (Value::Object(base_map), Value::Object(overrides_map)) => {
      for (key, value) in overrides_map {
        match base_map.get_mut(&key) {
          Some(existing) => merge_settings_json(existing, value),
          None => {
            base_map.insert(key, value);
          }
        }
      }
    }
    (target, value) => {
      *target = value;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn output_selection_requests_source_maps_and_ast() {
    let settings = analysis_settings().expect("settings");
    let value = serde_json::to_value(&settings).expect("serialise");
    let contract = &value["outputSelection"]["*"]["*"];
    let requested: Vec<&str> = contract
      .as_array()
      .expect("array")
      .iter()
      .filter_map(Value::as_str)
      .collect();
    assert!(requested.contains(&"evm.bytecode.sourceMap"));
    assert!(requested.contains(&"evm.deployedBytecode.sourceMap"));
    assert_eq!(value["outputSelection"]["*"][""][0], "ast");
  }

  #[test]
  fn merge_overrides_nested_keys_only() {
    let mut base = json!({ "optimizer": { "enabled": false, "runs": 200 } });
    merge_settings_json(&mut base, json!({ "optimizer": { "enabled": true } }));
    assert_eq!(base, json!({ "optimizer": { "enabled": true, "runs": 200 } }));
  }
}
