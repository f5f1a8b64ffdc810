use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `outputSelection` as accepted by solc: file → contract → requested outputs.
pub type OutputSelection = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Outputs requested from solc when a configuration does not choose its own.
pub const DEFAULT_CONTRACT_OUTPUTS: [&str; 5] = [
  "abi",
  "evm.bytecode",
  "evm.deployedBytecode",
  "evm.methodIdentifiers",
  "metadata",
];

pub fn default_output_selection() -> OutputSelection {
  let mut per_contract = BTreeMap::new();
  per_contract.insert(
    "*".to_owned(),
    DEFAULT_CONTRACT_OUTPUTS
      .iter()
      .map(|output| (*output).to_owned())
      .collect(),
  );
  per_contract.insert(String::new(), vec!["ast".to_owned()]);

  let mut selection = OutputSelection::new();
  selection.insert("*".to_owned(), per_contract);
  selection
}

/// solc standard-JSON `settings`. The commonly inspected keys are typed; anything else is
/// kept verbatim in `extra` so it reaches the compiler untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerSettings {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub optimizer: Option<OptimizerSettings>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub metadata: Option<SettingsMetadata>,
  #[serde(rename = "outputSelection", skip_serializing_if = "Option::is_none")]
  pub output_selection: Option<OutputSelection>,
  #[serde(rename = "evmVersion", skip_serializing_if = "Option::is_none")]
  pub evm_version: Option<String>,
  #[serde(rename = "viaIR", skip_serializing_if = "Option::is_none")]
  pub via_ir: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub remappings: Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub libraries: Option<BTreeMap<String, BTreeMap<String, String>>>,
  #[serde(flatten)]
  pub extra: BTreeMap<String, Value>,
}

impl CompilerSettings {
  pub fn optimizer_enabled(&self) -> bool {
    self
      .optimizer
      .as_ref()
      .and_then(|optimizer| optimizer.enabled)
      .unwrap_or(false)
  }

  /// Settings as sent to solc: literal source content in the metadata and the default output
  /// selection unless the configuration asks for something else.
  pub fn with_input_defaults(&self) -> CompilerSettings {
    let mut settings = self.clone();
    settings
      .metadata
      .get_or_insert_with(SettingsMetadata::default)
      .use_literal_content = Some(true);
    let keep_selection = settings
      .output_selection
      .as_ref()
      .is_some_and(|selection| !output_selection_is_effectively_empty(selection));
    if !keep_selection {
      settings.output_selection = Some(default_output_selection());
    }
    settings
  }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizerSettings {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub enabled: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub runs: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub details: Option<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsMetadata {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub use_literal_content: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub bytecode_hash: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub cbor_metadata: Option<bool>,
}

pub fn output_selection_is_effectively_empty(selection: &OutputSelection) -> bool {
  if selection.is_empty() {
    return true;
  }

  selection.values().all(|contracts| {
    contracts
      .values()
      .all(|outputs| outputs.iter().all(|output| output.trim().is_empty()))
  })
}
