use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Source text plus what the analyzer extracted from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContent {
  pub raw_content: String,
  /// Import targets exactly as written in the source.
  pub imports: Vec<String>,
  pub version_pragmas: Vec<String>,
}

/// Installed package a library file was resolved from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LibraryInfo {
  pub name: String,
  pub version: String,
}

/// A uniquely identified source file. Built once by the resolver and shared read-only.
#[derive(Debug, Clone)]
pub struct ResolvedFile {
  pub source_name: String,
  pub absolute_path: PathBuf,
  pub content: FileContent,
  pub content_hash: String,
  pub last_modification_date: SystemTime,
  pub library: Option<LibraryInfo>,
}

impl ResolvedFile {
  pub fn versioned_name(&self) -> String {
    match &self.library {
      Some(library) => format!("{}@v{}", self.source_name, library.version),
      None => self.source_name.clone(),
    }
  }

  pub fn is_library(&self) -> bool {
    self.library.is_some()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn file(library: Option<LibraryInfo>) -> ResolvedFile {
    ResolvedFile {
      source_name: "@openzeppelin/contracts/token/ERC20.sol".to_owned(),
      absolute_path: PathBuf::from("/tmp/ERC20.sol"),
      content: FileContent {
        raw_content: String::new(),
        imports: Vec::new(),
        version_pragmas: Vec::new(),
      },
      content_hash: "00".to_owned(),
      last_modification_date: SystemTime::UNIX_EPOCH,
      library,
    }
  }

  #[test]
  fn versioned_name_appends_library_version() {
    let library = file(Some(LibraryInfo {
      name: "@openzeppelin/contracts".to_owned(),
      version: "4.9.3".to_owned(),
    }));
    assert_eq!(
      library.versioned_name(),
      "@openzeppelin/contracts/token/ERC20.sol@v4.9.3"
    );
    assert!(library.is_library());

    let local = file(None);
    assert_eq!(local.versioned_name(), "@openzeppelin/contracts/token/ERC20.sol");
    assert!(!local.is_library());
  }
}
