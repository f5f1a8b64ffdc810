use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::resolver::ResolvedFile;

/// Internal invariant violations of the planner. These indicate a bug, not a user error.
#[derive(Debug, Error)]
pub enum PlannerError {
  #[error("Cannot merge compilation jobs for solc {left} and solc {right}: their configurations differ")]
  MismatchedSolcConfig { left: String, right: String },

  #[error("Invariant violation: {0}")]
  InvariantViolation(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CompilationJobCreationReason {
  NoCompatibleSolcVersionFound,
  IncompatibleOverriddenSolcVersion,
  DirectlyImportsIncompatibleFile,
  IndirectlyImportsIncompatibleFile,
  OtherError,
}

impl CompilationJobCreationReason {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::NoCompatibleSolcVersionFound => "no-compatible-solc-version-found",
      Self::IncompatibleOverriddenSolcVersion => "incompatible-overridden-solc-version",
      Self::DirectlyImportsIncompatibleFile => "directly-imports-incompatible-file",
      Self::IndirectlyImportsIncompatibleFile => "indirectly-imports-incompatible-file",
      Self::OtherError => "other-error",
    }
  }
}

impl fmt::Display for CompilationJobCreationReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// An import whose version range cannot be satisfied together with the importing file's.
#[derive(Debug, Clone)]
pub struct IncompatibleImport {
  pub file: Arc<ResolvedFile>,
  /// Files between the importing file and `file`. Empty for direct imports.
  pub path: Vec<Arc<ResolvedFile>>,
}

/// Why no compilation job could be planned for a file. Returned as a value so planning can
/// report every failing file at once.
#[derive(Debug, Clone)]
pub struct CompilationJobCreationError {
  pub reason: CompilationJobCreationReason,
  pub file: Arc<ResolvedFile>,
  pub direct_dependencies: Vec<Arc<ResolvedFile>>,
  /// Versions that were considered: the configured compilers, or the override alone.
  pub compiler_versions: Vec<String>,
  pub incompatible_imports: Vec<IncompatibleImport>,
}

impl CompilationJobCreationError {
  pub fn source_name(&self) -> &str {
    &self.file.source_name
  }
}

fn pragmas(file: &ResolvedFile) -> String {
  if file.content.version_pragmas.is_empty() {
    "no version pragma".to_owned()
  } else {
    file.content.version_pragmas.join(" ")
  }
}

impl fmt::Display for CompilationJobCreationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = self.source_name();
    let versions = self.compiler_versions.join(", ");
    match self.reason {
      CompilationJobCreationReason::NoCompatibleSolcVersionFound => write!(
        f,
        "{name} ({}) can't be compiled with any of the configured compilers: {versions}",
        pragmas(&self.file)
      ),
      CompilationJobCreationReason::IncompatibleOverriddenSolcVersion => write!(
        f,
        "{name} ({}) is overridden to solc {versions}, which doesn't satisfy its version pragmas",
        pragmas(&self.file)
      ),
      CompilationJobCreationReason::DirectlyImportsIncompatibleFile => {
        write!(f, "{name} ({}) imports incompatible files:", pragmas(&self.file))?;
        for import in &self.incompatible_imports {
          write!(f, "\n  * {} ({})", import.file.source_name, pragmas(&import.file))?;
        }
        Ok(())
      }
      CompilationJobCreationReason::IndirectlyImportsIncompatibleFile => {
        write!(
          f,
          "{name} ({}) depends on incompatible files through its imports:",
          pragmas(&self.file)
        )?;
        for import in &self.incompatible_imports {
          let chain = std::iter::once(name)
            .chain(import.path.iter().map(|step| step.source_name.as_str()))
            .chain(std::iter::once(import.file.source_name.as_str()))
            .collect::<Vec<_>>()
            .join(" -> ");
          write!(f, "\n  * {chain} ({})", pragmas(&import.file))?;
        }
        Ok(())
      }
      CompilationJobCreationReason::OtherError => write!(
        f,
        "{name} and its dependencies can't be compiled with any single configured compiler: {versions}"
      ),
    }
  }
}

impl std::error::Error for CompilationJobCreationError {}

/// Groups the failures by reason and renders one report section per reason.
pub fn format_job_creation_errors(errors: &[CompilationJobCreationError]) -> String {
  let mut by_reason: BTreeMap<CompilationJobCreationReason, Vec<&CompilationJobCreationError>> =
    BTreeMap::new();
  for error in errors {
    by_reason.entry(error.reason).or_default().push(error);
  }

  let mut sections = Vec::new();
  for (reason, errors) in by_reason {
    let heading = match reason {
      CompilationJobCreationReason::NoCompatibleSolcVersionFound => {
        "These files' version pragmas are not satisfied by any configured compiler:"
      }
      CompilationJobCreationReason::IncompatibleOverriddenSolcVersion => {
        "These files have overrides that don't match their version pragmas:"
      }
      CompilationJobCreationReason::DirectlyImportsIncompatibleFile => {
        "These files import other files that use a different and incompatible version of Solidity:"
      }
      CompilationJobCreationReason::IndirectlyImportsIncompatibleFile => {
        "These files depend on other files that use a different and incompatible version of Solidity:"
      }
      CompilationJobCreationReason::OtherError => {
        "These files and their dependencies cannot be compiled with a single configured compiler:"
      }
    };
    let mut section = heading.to_owned();
    for error in errors {
      for line in error.to_string().lines() {
        section.push_str("\n  ");
        section.push_str(line);
      }
    }
    sections.push(section);
  }
  sections.join("\n\n")
}
