mod settings;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::internal::path::canonicalize_path;
use crate::internal::range::{RangeError, VersionRange};
use crate::internal::solc::parse_version;

pub use settings::{
  default_output_selection, output_selection_is_effectively_empty, CompilerSettings,
  OptimizerSettings, OutputSelection, SettingsMetadata, DEFAULT_CONTRACT_OUTPUTS,
};

/// One compiler configuration: a solc version and the settings it is invoked with.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolcConfig {
  pub version: String,
  #[serde(default)]
  pub settings: CompilerSettings,
}

impl SolcConfig {
  pub fn new(version: impl Into<String>) -> Self {
    Self {
      version: version.into(),
      settings: CompilerSettings::default(),
    }
  }

  pub fn with_settings(mut self, settings: CompilerSettings) -> Self {
    self.settings = settings;
    self
  }
}

/// Every compiler the project may use plus per-source-name forced configurations.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolidityConfig {
  #[serde(default)]
  pub compilers: Vec<SolcConfig>,
  #[serde(default)]
  pub overrides: BTreeMap<String, SolcConfig>,
}

impl SolidityConfig {
  pub fn new(compilers: Vec<SolcConfig>) -> Self {
    Self {
      compilers,
      overrides: BTreeMap::new(),
    }
  }

  pub fn with_override(mut self, source_name: impl Into<String>, config: SolcConfig) -> Self {
    self.overrides.insert(source_name.into(), config);
    self
  }

  pub fn compiler_versions(&self) -> Vec<String> {
    self
      .compilers
      .iter()
      .map(|compiler| compiler.version.clone())
      .collect()
  }
}

/// The build tool's own package, resolvable even when it is not installed in the project
/// (global installations).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ToolPackage {
  pub name: String,
  /// Directory holding the tool's `package.json`. It must be named after the package.
  pub root: PathBuf,
}

impl ToolPackage {
  pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
    Self {
      name: name.into(),
      root: root.into(),
    }
  }

  /// Source name of the console library shipped with the tool. It is always treated as a
  /// library file, even when the project has a directory named after the tool.
  pub fn console_source_name(&self) -> String {
    format!("{}/console.sol", self.name)
  }
}

#[derive(Clone, Debug)]
pub struct ResolverConfig {
  pub project_root: PathBuf,
  pub tool_package: Option<ToolPackage>,
}

impl ResolverConfig {
  pub fn new(project_root: impl AsRef<Path>) -> Self {
    Self {
      project_root: canonicalize_path(project_root.as_ref()),
      tool_package: None,
    }
  }

  pub fn with_tool_package(mut self, tool_package: ToolPackage) -> Self {
    self.tool_package = Some(tool_package);
    self
  }
}

/// Which compiler configurations are exposed to the optimizer defect that makes solc output
/// depend on which other files share the invocation. Affected jobs are merged into exactly one
/// invocation per configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KnownBugPolicy {
  pub versions: VersionRange,
  pub requires_optimizer: bool,
}

impl KnownBugPolicy {
  pub fn new(versions: &str, requires_optimizer: bool) -> Result<Self, RangeError> {
    Ok(Self {
      versions: versions.parse()?,
      requires_optimizer,
    })
  }

  /// A policy under which no configuration is affected.
  pub fn disabled() -> Self {
    Self {
      versions: VersionRange::none(),
      requires_optimizer: true,
    }
  }

  pub fn affects(&self, config: &SolcConfig) -> bool {
    if self.requires_optimizer && !config.settings.optimizer_enabled() {
      return false;
    }
    parse_version(&config.version)
      .map(|version| self.versions.matches(&version))
      .unwrap_or(false)
  }
}

impl Default for KnownBugPolicy {
  fn default() -> Self {
    Self {
      versions: VersionRange::any(),
      requires_optimizer: true,
    }
  }
}

/// Bug policy as given by callers. `requiresOptimizer` defaults to `true`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnownBugOptions {
  pub versions: String,
  #[serde(default = "requires_optimizer_by_default")]
  pub requires_optimizer: bool,
}

fn requires_optimizer_by_default() -> bool {
  true
}

/// Optional settings of one planning run, as passed from JavaScript.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningOptions {
  #[serde(default)]
  pub tool_package: Option<ToolPackage>,
  #[serde(default)]
  pub known_bug: Option<KnownBugOptions>,
}

impl PlanningOptions {
  pub fn resolver_config(&self, project_root: impl AsRef<Path>) -> ResolverConfig {
    let config = ResolverConfig::new(project_root);
    match &self.tool_package {
      Some(tool_package) => config.with_tool_package(tool_package.clone()),
      None => config,
    }
  }

  pub fn known_bug_policy(&self) -> Result<KnownBugPolicy, RangeError> {
    match &self.known_bug {
      Some(options) => KnownBugPolicy::new(&options.versions, options.requires_optimizer),
      None => Ok(KnownBugPolicy::default()),
    }
  }
}
