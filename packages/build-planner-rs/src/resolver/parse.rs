use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use super::analyzer::SolarAnalyzer;
use super::error::{ResolverError, Result};

/// What the resolver needs to know about a file's source text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedData {
  pub imports: Vec<String>,
  pub version_pragmas: Vec<String>,
}

#[derive(Debug, Clone, Error)]
pub enum AnalyzerError {
  /// The analyzer backend itself is missing.
  #[error("{0}")]
  Unavailable(String),
  #[error("{0}")]
  Failed(String),
}

/// Extracts imports and version pragmas from Solidity source text.
pub trait SourceAnalyzer: Send + Sync {
  fn analyze(&self, content: &str) -> std::result::Result<ParsedData, AnalyzerError>;
}

/// Previously persisted analysis of a file, as stored by the build's files cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolidityFilesCacheEntry {
  pub content_hash: String,
  pub imports: Vec<String>,
  pub version_pragmas: Vec<String>,
}

/// Read access to the on-disk cache of earlier builds.
pub trait SolidityFilesCache: Send + Sync {
  fn get_entry(&self, absolute_path: &Path) -> Option<SolidityFilesCacheEntry>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EmptySolidityFilesCache;

impl SolidityFilesCache for EmptySolidityFilesCache {
  fn get_entry(&self, _absolute_path: &Path) -> Option<SolidityFilesCacheEntry> {
    None
  }
}

/// An in-memory files cache, handy when the caller already loaded its cache file.
#[derive(Debug, Default)]
pub struct MemorySolidityFilesCache {
  entries: DashMap<PathBuf, SolidityFilesCacheEntry>,
}

impl MemorySolidityFilesCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&self, absolute_path: impl Into<PathBuf>, entry: SolidityFilesCacheEntry) {
    self.entries.insert(absolute_path.into(), entry);
  }
}

impl SolidityFilesCache for MemorySolidityFilesCache {
  fn get_entry(&self, absolute_path: &Path) -> Option<SolidityFilesCacheEntry> {
    self
      .entries
      .get(absolute_path)
      .map(|entry| entry.value().clone())
  }
}

/// Analysis front-end with a per-build memo keyed by content hash.
pub struct Parser {
  analyzer: Arc<dyn SourceAnalyzer>,
  files_cache: Arc<dyn SolidityFilesCache>,
  cache: DashMap<String, ParsedData>,
}

impl Default for Parser {
  fn default() -> Self {
    Self::new(Arc::new(SolarAnalyzer::default()), Arc::new(EmptySolidityFilesCache))
  }
}

impl Parser {
  pub fn new(analyzer: Arc<dyn SourceAnalyzer>, files_cache: Arc<dyn SolidityFilesCache>) -> Self {
    Self {
      analyzer,
      files_cache,
      cache: DashMap::new(),
    }
  }

  pub fn parse(&self, content: &str, absolute_path: &Path, content_hash: &str) -> Result<ParsedData> {
    if let Some(cached) = self.get_from_cache(absolute_path, content_hash) {
      return Ok(cached);
    }

    let parsed = self.analyzer.analyze(content).map_err(|err| match err {
      AnalyzerError::Unavailable(message) => ResolverError::CorruptedInstallation(message),
      AnalyzerError::Failed(message) => ResolverError::AnalysisFailed {
        path: absolute_path.to_path_buf(),
        message,
      },
    })?;
    self.cache.insert(content_hash.to_owned(), parsed.clone());
    Ok(parsed)
  }

  pub fn cached_len(&self) -> usize {
    self.cache.len()
  }

  fn get_from_cache(&self, absolute_path: &Path, content_hash: &str) -> Option<ParsedData> {
    if let Some(entry) = self.cache.get(content_hash) {
      return Some(entry.value().clone());
    }

    let entry = self.files_cache.get_entry(absolute_path)?;
    if entry.content_hash != content_hash {
      return None;
    }
    trace!(path = %absolute_path.display(), "reusing analysis from the files cache");
    Some(ParsedData {
      imports: entry.imports,
      version_pragmas: entry.version_pragmas,
    })
  }
}
