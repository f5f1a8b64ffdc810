//! Maps source names and import paths onto resolved files, for project files and for
//! libraries installed under `node_modules`.

mod analyzer;
mod error;
mod file;
mod io;
mod parse;
mod source_names;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, trace};

pub use analyzer::{RegexAnalyzer, SolarAnalyzer};
pub use error::{ResolverError, ResolverErrorKind, Result, SourceNameFormatIssue};
pub use file::{FileContent, LibraryInfo, ResolvedFile};
pub use io::{ContentHasher, FsSourceReader, Keccak256Hasher, SourceReader};
pub use parse::{
  AnalyzerError, EmptySolidityFilesCache, MemorySolidityFilesCache, ParsedData, Parser,
  SolidityFilesCache, SolidityFilesCacheEntry, SourceAnalyzer,
};
pub use source_names::{
  get_source_name_true_case, is_local_source_name, local_path_to_source_name,
  validate_source_name_existence_and_casing, validate_source_name_format,
};

use crate::config::ResolverConfig;
use crate::internal::path::{
  is_absolute_path_source_name, normalize_source_name, replace_backslashes, source_name_dir,
  source_name_to_path,
};
use source_names::NODE_MODULES;

static URI_SCHEME: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"([a-zA-Z]+)://").expect("valid uri scheme regex"));

#[derive(Debug, Deserialize)]
struct PackageManifest {
  #[serde(default)]
  name: Option<String>,
  #[serde(default)]
  version: String,
}

/// Where a library was found on disk.
#[derive(Debug, Clone)]
struct LibraryInstallation {
  /// Directory the library's source names are relative to.
  node_modules: PathBuf,
  /// The package's own directory, used as the lookup base for imports written inside it.
  package_dir: PathBuf,
  version: String,
}

type FileCell = Arc<OnceCell<Arc<ResolvedFile>>>;

pub struct Resolver {
  config: ResolverConfig,
  parser: Arc<Parser>,
  reader: Arc<dyn SourceReader>,
  hasher: Arc<dyn ContentHasher>,
  files: DashMap<String, FileCell>,
  library_dirs: DashMap<String, PathBuf>,
  own_package_name: OnceCell<Option<String>>,
}

impl Resolver {
  pub fn new(config: ResolverConfig) -> Self {
    Self::with_collaborators(
      config,
      Arc::new(Parser::default()),
      Arc::new(FsSourceReader),
      Arc::new(Keccak256Hasher),
    )
  }

  pub fn with_collaborators(
    config: ResolverConfig,
    parser: Arc<Parser>,
    reader: Arc<dyn SourceReader>,
    hasher: Arc<dyn ContentHasher>,
  ) -> Self {
    Self {
      config,
      parser,
      reader,
      hasher,
      files: DashMap::new(),
      library_dirs: DashMap::new(),
      own_package_name: OnceCell::new(),
    }
  }

  pub fn config(&self) -> &ResolverConfig {
    &self.config
  }

  pub fn project_root(&self) -> &Path {
    &self.config.project_root
  }

  /// Resolves an entry point or any other source name given without an importing file.
  pub async fn resolve_source_name(&self, source_name: &str) -> Result<Arc<ResolvedFile>> {
    self.resolve_source_name_from(source_name, None).await
  }

  /// Resolves `imported`, exactly as written in `from`, to the file it designates.
  pub async fn resolve_import(
    &self,
    from: &ResolvedFile,
    imported: &str,
  ) -> Result<Arc<ResolvedFile>> {
    if let Some(captures) = URI_SCHEME.captures(imported) {
      return Err(ResolverError::InvalidImportProtocol {
        from: from.source_name.clone(),
        imported: imported.to_owned(),
        protocol: captures[1].to_owned(),
      });
    }
    if replace_backslashes(imported) != imported {
      return Err(ResolverError::InvalidImportBackslash {
        from: from.source_name.clone(),
        imported: imported.to_owned(),
      });
    }
    if is_absolute_path_source_name(imported) {
      return Err(ResolverError::InvalidImportAbsolutePath {
        from: from.source_name.clone(),
        imported: imported.to_owned(),
      });
    }
    if self.includes_own_package_name(imported).await? {
      return Err(ResolverError::IncludesOwnPackageName {
        from: from.source_name.clone(),
        imported: imported.to_owned(),
      });
    }

    self
      .resolve_import_unchecked(from, imported)
      .await
      .map_err(|err| err.at_import(&from.source_name, imported))
  }

  async fn resolve_import_unchecked(
    &self,
    from: &ResolvedFile,
    imported: &str,
  ) -> Result<Arc<ResolvedFile>> {
    let lookup_base = from
      .library
      .as_ref()
      .and_then(|library| self.library_dirs.get(&library.name))
      .map(|dir| dir.value().clone());

    if !is_relative_import(imported) {
      let source_name = normalize_source_name(imported);
      return self
        .resolve_source_name_from(&source_name, lookup_base.as_deref())
        .await;
    }

    let joined = normalize_source_name(&format!(
      "{}/{}",
      source_name_dir(&from.source_name),
      imported
    ));

    if from.library.is_none() && imported.split('/').any(|segment| segment == NODE_MODULES) {
      let segments: Vec<&str> = joined.split('/').collect();
      let source_name = match segments.iter().position(|segment| *segment == NODE_MODULES) {
        Some(index) => segments[index + 1..].join("/"),
        None => joined.clone(),
      };
      trace!(from = %from.source_name, imported, %source_name, "relative import into node_modules");
      return self.resolve_source_name_from(&source_name, None).await;
    }

    match &from.library {
      None => {
        if joined == ".." || joined.starts_with("../") {
          return Err(ResolverError::InvalidImportOutsideOfProject {
            from: from.source_name.clone(),
            imported: imported.to_owned(),
          });
        }
        self.resolve_local_source_name(&joined).await
      }
      Some(library) => {
        if !joined.starts_with(&format!("{}/", library.name)) {
          return Err(ResolverError::IllegalImport {
            from: from.source_name.clone(),
            imported: imported.to_owned(),
          });
        }
        self
          .resolve_source_name_from(&joined, lookup_base.as_deref())
          .await
      }
    }
  }

  async fn resolve_source_name_from(
    &self,
    source_name: &str,
    lookup_base: Option<&Path>,
  ) -> Result<Arc<ResolvedFile>> {
    if let Some(resolved) = self.cached(source_name) {
      return Ok(resolved);
    }

    validate_source_name_format(source_name)?;
    let is_local = is_local_source_name(
      &self.config.project_root,
      source_name,
      self.config.tool_package.as_ref(),
    )
    .await?;

    if is_local {
      self.resolve_local_source_name(source_name).await
    } else {
      let source_name = source_name
        .strip_prefix("node_modules/")
        .unwrap_or(source_name);
      self
        .resolve_library_source_name(source_name, lookup_base)
        .await
    }
  }

  async fn resolve_local_source_name(&self, source_name: &str) -> Result<Arc<ResolvedFile>> {
    self
      .memoized(source_name, move || async move {
        validate_source_name_existence_and_casing(&self.config.project_root, source_name, false)
          .await?;
        let absolute_path = source_name_to_path(&self.config.project_root, source_name);
        trace!(source_name, "resolved local file");
        self.resolve_file(source_name, absolute_path, None).await
      })
      .await
  }

  async fn resolve_library_source_name(
    &self,
    source_name: &str,
    lookup_base: Option<&Path>,
  ) -> Result<Arc<ResolvedFile>> {
    self
      .memoized(source_name, move || async move {
        let library_name = library_name(source_name);
        let installation = self.find_library(library_name, lookup_base).await?;

        validate_source_name_existence_and_casing(&installation.node_modules, source_name, true)
          .await?;
        let path = source_name_to_path(&installation.node_modules, source_name);
        let absolute_path = tokio::fs::canonicalize(&path)
          .await
          .map_err(|err| ResolverError::io(&path, err))?;

        self
          .library_dirs
          .entry(library_name.to_owned())
          .or_insert_with(|| installation.package_dir.clone());
        trace!(source_name, library = library_name, version = %installation.version, "resolved library file");

        let library = LibraryInfo {
          name: library_name.to_owned(),
          version: installation.version,
        };
        self
          .resolve_file(source_name, absolute_path, Some(library))
          .await
      })
      .await
  }

  async fn find_library(
    &self,
    library_name: &str,
    lookup_base: Option<&Path>,
  ) -> Result<LibraryInstallation> {
    let base = lookup_base.unwrap_or(&self.config.project_root);
    let manifest_path =
      match node_resolve::resolve_from(&format!("{library_name}/package.json"), base.to_path_buf())
      {
        Ok(path) => path,
        Err(err) => match &self.config.tool_package {
          Some(tool) if tool.name == library_name => {
            debug!(library = library_name, root = %tool.root.display(), "falling back to the tool's own installation");
            tool.root.join("package.json")
          }
          _ => {
            return Err(ResolverError::LibraryNotInstalled {
              library: library_name.to_owned(),
              reason: err.to_string(),
            })
          }
        },
      };

    let manifest = read_manifest(&manifest_path).await?;

    let package_dir = manifest_path
      .parent()
      .ok_or_else(|| corrupted_layout(&manifest_path))?;
    let depth = library_name.split('/').count();
    let node_modules = package_dir
      .ancestors()
      .nth(depth)
      .map(Path::to_path_buf)
      .ok_or_else(|| corrupted_layout(&manifest_path))?;
    let package_dir = tokio::fs::canonicalize(package_dir)
      .await
      .map_err(|err| ResolverError::io(package_dir, err))?;

    Ok(LibraryInstallation {
      node_modules,
      package_dir,
      version: manifest.version,
    })
  }

  async fn resolve_file(
    &self,
    source_name: &str,
    absolute_path: PathBuf,
    library: Option<LibraryInfo>,
  ) -> Result<ResolvedFile> {
    let raw_content = self.reader.read(&absolute_path).await?;
    let content_hash = self.hasher.hash(raw_content.as_bytes());
    let last_modification_date = tokio::fs::metadata(&absolute_path)
      .await
      .and_then(|metadata| metadata.modified())
      .map_err(|err| ResolverError::io(&absolute_path, err))?;
    let parsed = self
      .parser
      .parse(&raw_content, &absolute_path, &content_hash)?;

    Ok(ResolvedFile {
      source_name: source_name.to_owned(),
      absolute_path,
      content: FileContent {
        raw_content,
        imports: parsed.imports,
        version_pragmas: parsed.version_pragmas,
      },
      content_hash,
      last_modification_date,
      library,
    })
  }

  fn cached(&self, source_name: &str) -> Option<Arc<ResolvedFile>> {
    self
      .files
      .get(source_name)
      .and_then(|cell| cell.value().get().cloned())
  }

  /// Materializes `source_name` at most once, even when several imports race for it.
  async fn memoized<F, Fut>(&self, source_name: &str, resolve: F) -> Result<Arc<ResolvedFile>>
  where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<ResolvedFile>>,
  {
    let cell = self
      .files
      .entry(source_name.to_owned())
      .or_default()
      .value()
      .clone();
    cell
      .get_or_try_init(move || async move { resolve().await.map(Arc::new) })
      .await
      .cloned()
  }

  async fn includes_own_package_name(&self, imported: &str) -> Result<bool> {
    if is_relative_import(imported) {
      return Ok(false);
    }
    let name = self
      .own_package_name
      .get_or_try_init(|| async {
        let manifest_path = self.config.project_root.join("package.json");
        let exists = tokio::fs::try_exists(&manifest_path)
          .await
          .map_err(|err| ResolverError::io(&manifest_path, err))?;
        if !exists {
          return Ok(None);
        }
        Ok::<_, ResolverError>(read_manifest(&manifest_path).await?.name)
      })
      .await?;

    Ok(match name {
      Some(name) => imported.starts_with(&format!("{name}/")),
      None => false,
    })
  }
}

fn is_relative_import(imported: &str) -> bool {
  imported.starts_with("./") || imported.starts_with("../")
}

/// First segment of the source name, or the first two for scoped packages.
fn library_name(source_name: &str) -> &str {
  let segments = if source_name.starts_with('@') { 2 } else { 1 };
  match source_name.match_indices('/').nth(segments - 1) {
    Some((index, _)) => &source_name[..index],
    None => source_name,
  }
}

async fn read_manifest(path: &Path) -> Result<PackageManifest> {
  let text = tokio::fs::read_to_string(path)
    .await
    .map_err(|err| ResolverError::io(path, err))?;
  serde_json::from_str(&text).map_err(|source| ResolverError::InvalidPackageManifest {
    path: path.to_path_buf(),
    source,
  })
}

fn corrupted_layout(manifest_path: &Path) -> ResolverError {
  ResolverError::CorruptedInstallation(format!(
    "package manifest {} is not inside a node_modules directory",
    manifest_path.display()
  ))
}
