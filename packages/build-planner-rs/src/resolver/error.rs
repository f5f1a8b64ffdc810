use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Why a source name was rejected before touching the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceNameFormatIssue {
  AbsolutePath,
  RelativePath,
  Backslashes,
  NotNormalized,
}

impl fmt::Display for SourceNameFormatIssue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let text = match self {
      Self::AbsolutePath => "source names can't be absolute paths",
      Self::RelativePath => "source names can't start with \"./\" or \"../\"",
      Self::Backslashes => "source names must use forward slashes",
      Self::NotNormalized => "source names must be normalized",
    };
    f.write_str(text)
  }
}

/// Structural failures raised while resolving source names and imports. These abort the
/// dependency graph construction that triggered them.
#[derive(Debug, Error)]
pub enum ResolverError {
  #[error("Invalid source name \"{name}\": {issue}")]
  InvalidSourceNameFormat {
    name: String,
    issue: SourceNameFormatIssue,
  },

  #[error("{} is outside of the project and can't be used as a local source name", path.display())]
  ExternalAsLocal { path: PathBuf },

  #[error("{} is inside node_modules and can't be used as a local source name", path.display())]
  NodeModulesAsLocal { path: PathBuf },

  #[error("File {file} doesn't exist")]
  FileNotFound { file: String },

  #[error("File {file} doesn't exist in its library")]
  LibraryFileNotFound { file: String },

  #[error("Trying to resolve the file {incorrect} but its correct case-sensitive name is {correct}")]
  WrongSourceNameCasing { incorrect: String, correct: String },

  #[error("Library {library} is not installed: {reason}")]
  LibraryNotInstalled { library: String, reason: String },

  #[error("Invalid import {imported} from {from}: imports via {protocol} are not supported")]
  InvalidImportProtocol {
    from: String,
    imported: String,
    protocol: String,
  },

  #[error("Invalid import {imported} from {from}: imports must use / instead of \\")]
  InvalidImportBackslash { from: String, imported: String },

  #[error("Invalid import {imported} from {from}: imports must be relative or library paths, not absolute paths")]
  InvalidImportAbsolutePath { from: String, imported: String },

  #[error("Invalid import {imported} from {from}: it resolves outside of the project")]
  InvalidImportOutsideOfProject { from: String, imported: String },

  #[error("Illegal import {imported} from {from}: library files can't reach other libraries through relative paths")]
  IllegalImport { from: String, imported: String },

  #[error("Invalid import {imported} from {from}: it uses the project's own package name, import it with a relative path instead")]
  IncludesOwnPackageName { from: String, imported: String },

  #[error("File {imported}, imported from {from}, not found")]
  ImportedFileNotFound {
    from: String,
    imported: String,
    #[source]
    source: Box<ResolverError>,
  },

  #[error("Trying to import {imported} from {from}, but it has an incorrect casing")]
  InvalidImportWrongCasing {
    from: String,
    imported: String,
    #[source]
    source: Box<ResolverError>,
  },

  #[error("The library {library}, imported from {from}, is not installed")]
  ImportedLibraryNotInstalled {
    from: String,
    library: String,
    #[source]
    source: Box<ResolverError>,
  },

  #[error("Invalid package manifest {}", path.display())]
  InvalidPackageManifest {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("The source analyzer is not available, the installation is corrupted: {0}")]
  CorruptedInstallation(String),

  #[error("Failed to analyze {}: {message}", path.display())]
  AnalysisFailed { path: PathBuf, message: String },

  #[error("I/O error on {}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Stable tags for [`ResolverError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResolverErrorKind {
  InvalidSourceNameFormat,
  ExternalAsLocal,
  NodeModulesAsLocal,
  FileNotFound,
  LibraryFileNotFound,
  WrongSourceNameCasing,
  LibraryNotInstalled,
  InvalidImportProtocol,
  InvalidImportBackslash,
  InvalidImportAbsolutePath,
  InvalidImportOutsideOfProject,
  IllegalImport,
  IncludesOwnPackageName,
  ImportedFileNotFound,
  InvalidImportWrongCasing,
  ImportedLibraryNotInstalled,
  InvalidPackageManifest,
  CorruptedInstallation,
  AnalysisFailed,
  Io,
}

impl ResolverErrorKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::InvalidSourceNameFormat => "INVALID_SOURCE_NAME_FORMAT",
      Self::ExternalAsLocal => "EXTERNAL_AS_LOCAL",
      Self::NodeModulesAsLocal => "NODE_MODULES_AS_LOCAL",
      Self::FileNotFound => "FILE_NOT_FOUND",
      Self::LibraryFileNotFound => "LIBRARY_FILE_NOT_FOUND",
      Self::WrongSourceNameCasing => "WRONG_SOURCE_NAME_CASING",
      Self::LibraryNotInstalled => "LIBRARY_NOT_INSTALLED",
      Self::InvalidImportProtocol => "INVALID_IMPORT_PROTOCOL",
      Self::InvalidImportBackslash => "INVALID_IMPORT_BACKSLASH",
      Self::InvalidImportAbsolutePath => "INVALID_IMPORT_ABSOLUTE_PATH",
      Self::InvalidImportOutsideOfProject => "INVALID_IMPORT_OUTSIDE_OF_PROJECT",
      Self::IllegalImport => "ILLEGAL_IMPORT",
      Self::IncludesOwnPackageName => "INCLUDES_OWN_PACKAGE_NAME",
      Self::ImportedFileNotFound => "IMPORTED_FILE_NOT_FOUND",
      Self::InvalidImportWrongCasing => "INVALID_IMPORT_WRONG_CASING",
      Self::ImportedLibraryNotInstalled => "IMPORTED_LIBRARY_NOT_INSTALLED",
      Self::InvalidPackageManifest => "INVALID_PACKAGE_MANIFEST",
      Self::CorruptedInstallation => "CORRUPTED_INSTALLATION",
      Self::AnalysisFailed => "ANALYSIS_FAILED",
      Self::Io => "IO_ERROR",
    }
  }
}

impl fmt::Display for ResolverErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl ResolverError {
  pub fn kind(&self) -> ResolverErrorKind {
    match self {
      Self::InvalidSourceNameFormat { .. } => ResolverErrorKind::InvalidSourceNameFormat,
      Self::ExternalAsLocal { .. } => ResolverErrorKind::ExternalAsLocal,
      Self::NodeModulesAsLocal { .. } => ResolverErrorKind::NodeModulesAsLocal,
      Self::FileNotFound { .. } => ResolverErrorKind::FileNotFound,
      Self::LibraryFileNotFound { .. } => ResolverErrorKind::LibraryFileNotFound,
      Self::WrongSourceNameCasing { .. } => ResolverErrorKind::WrongSourceNameCasing,
      Self::LibraryNotInstalled { .. } => ResolverErrorKind::LibraryNotInstalled,
      Self::InvalidImportProtocol { .. } => ResolverErrorKind::InvalidImportProtocol,
      Self::InvalidImportBackslash { .. } => ResolverErrorKind::InvalidImportBackslash,
      Self::InvalidImportAbsolutePath { .. } => ResolverErrorKind::InvalidImportAbsolutePath,
      Self::InvalidImportOutsideOfProject { .. } => {
        ResolverErrorKind::InvalidImportOutsideOfProject
      }
      Self::IllegalImport { .. } => ResolverErrorKind::IllegalImport,
      Self::IncludesOwnPackageName { .. } => ResolverErrorKind::IncludesOwnPackageName,
      Self::ImportedFileNotFound { .. } => ResolverErrorKind::ImportedFileNotFound,
      Self::InvalidImportWrongCasing { .. } => ResolverErrorKind::InvalidImportWrongCasing,
      Self::ImportedLibraryNotInstalled { .. } => ResolverErrorKind::ImportedLibraryNotInstalled,
      Self::InvalidPackageManifest { .. } => ResolverErrorKind::InvalidPackageManifest,
      Self::CorruptedInstallation(_) => ResolverErrorKind::CorruptedInstallation,
      Self::AnalysisFailed { .. } => ResolverErrorKind::AnalysisFailed,
      Self::Io { .. } => ResolverErrorKind::Io,
    }
  }

  pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io {
      path: path.into(),
      source,
    }
  }

  /// Attach import-site context to failures raised while resolving `imported` from `from`.
  /// Errors without an import-site counterpart pass through unchanged.
  pub(crate) fn at_import(self, from: &str, imported: &str) -> Self {
    match self.kind() {
      ResolverErrorKind::FileNotFound | ResolverErrorKind::LibraryFileNotFound => {
        Self::ImportedFileNotFound {
          from: from.to_owned(),
          imported: imported.to_owned(),
          source: Box::new(self),
        }
      }
      ResolverErrorKind::WrongSourceNameCasing => Self::InvalidImportWrongCasing {
        from: from.to_owned(),
        imported: imported.to_owned(),
        source: Box::new(self),
      },
      ResolverErrorKind::LibraryNotInstalled => {
        let library = match &self {
          Self::LibraryNotInstalled { library, .. } => library.clone(),
          _ => imported.to_owned(),
        };
        Self::ImportedLibraryNotInstalled {
          from: from.to_owned(),
          library,
          source: Box::new(self),
        }
      }
      _ => self,
    }
  }
}

pub type Result<T> = std::result::Result<T, ResolverError>;
