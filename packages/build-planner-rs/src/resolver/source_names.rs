//! Source name validation and case-exact filesystem lookups.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::error::{ResolverError, Result, SourceNameFormatIssue};
use crate::config::ToolPackage;
use crate::internal::path::{
  canonicalize_path, is_absolute_path_source_name, normalize_source_name, path_to_source_name,
  replace_backslashes,
};

pub const NODE_MODULES: &str = "node_modules";

pub fn validate_source_name_format(source_name: &str) -> Result<()> {
  let issue = if is_absolute_path_source_name(source_name) {
    Some(SourceNameFormatIssue::AbsolutePath)
  } else if is_explicit_relative_path(source_name) {
    Some(SourceNameFormatIssue::RelativePath)
  } else if replace_backslashes(source_name) != source_name {
    Some(SourceNameFormatIssue::Backslashes)
  } else if normalize_source_name(source_name) != source_name {
    Some(SourceNameFormatIssue::NotNormalized)
  } else {
    None
  };

  match issue {
    Some(issue) => Err(ResolverError::InvalidSourceNameFormat {
      name: source_name.to_owned(),
      issue,
    }),
    None => Ok(()),
  }
}

fn is_explicit_relative_path(source_name: &str) -> bool {
  let base = source_name.split('/').next().unwrap_or_default();
  base == "." || base == ".."
}

/// Source name of a file given by its filesystem path, which must be inside the project
/// and outside `node_modules`.
pub fn local_path_to_source_name(project_root: &Path, path: &Path) -> Result<String> {
  let absolute = canonicalize_path(path);
  let relative = absolute
    .strip_prefix(project_root)
    .map_err(|_| ResolverError::ExternalAsLocal {
      path: path.to_path_buf(),
    })?;
  let source_name = path_to_source_name(relative);
  if source_name
    .split('/')
    .any(|segment| segment == NODE_MODULES)
  {
    return Err(ResolverError::NodeModulesAsLocal {
      path: path.to_path_buf(),
    });
  }
  Ok(source_name)
}

/// A name is local when it doesn't go through `node_modules` and its first segment exists
/// (with any casing) under the project root.
pub async fn is_local_source_name(
  project_root: &Path,
  source_name: &str,
  tool_package: Option<&ToolPackage>,
) -> Result<bool> {
  if source_name
    .split('/')
    .any(|segment| segment == NODE_MODULES)
  {
    return Ok(false);
  }
  if let Some(tool) = tool_package {
    if source_name.starts_with(&tool.console_source_name()) {
      return Ok(false);
    }
  }

  let first = source_name.split('/').next().unwrap_or(source_name);
  Ok(find_entry_true_case(project_root, first).await?.is_some())
}

/// Looks up `name` among the entries of `dir`, preferring an exact match over a
/// case-insensitive one.
async fn find_entry_true_case(dir: &Path, name: &str) -> Result<Option<String>> {
  let mut entries = match tokio::fs::read_dir(dir).await {
    Ok(entries) => entries,
    Err(err) if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
      return Ok(None)
    }
    Err(err) => return Err(ResolverError::io(dir, err)),
  };

  let lowered = name.to_lowercase();
  let mut insensitive = None;
  loop {
    let entry = match entries.next_entry().await {
      Ok(Some(entry)) => entry,
      Ok(None) => break,
      Err(err) => return Err(ResolverError::io(dir, err)),
    };
    let entry_name = entry.file_name().to_string_lossy().into_owned();
    if entry_name == name {
      return Ok(Some(entry_name));
    }
    if insensitive.is_none() && entry_name.to_lowercase() == lowered {
      insensitive = Some(entry_name);
    }
  }
  Ok(insensitive)
}

/// Resolves the on-disk casing of `source_name` below `from_dir`, or `None` when no file
/// matches even case-insensitively.
pub async fn get_source_name_true_case(from_dir: &Path, source_name: &str) -> Result<Option<String>> {
  let mut current = PathBuf::from(from_dir);
  let mut true_case = Vec::new();
  for segment in source_name.split('/') {
    match find_entry_true_case(&current, segment).await? {
      Some(entry) => {
        current.push(&entry);
        true_case.push(entry);
      }
      None => return Ok(None),
    }
  }

  match tokio::fs::metadata(&current).await {
    Ok(metadata) if metadata.is_file() => Ok(Some(true_case.join("/"))),
    Ok(_) => Ok(None),
    Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
    Err(err) => Err(ResolverError::io(current, err)),
  }
}

/// Ensures `source_name` names an existing file below `from_dir` with exactly that casing,
/// whatever the case sensitivity of the underlying filesystem.
pub async fn validate_source_name_existence_and_casing(
  from_dir: &Path,
  source_name: &str,
  is_library: bool,
) -> Result<()> {
  match get_source_name_true_case(from_dir, source_name).await? {
    None if is_library => Err(ResolverError::LibraryFileNotFound {
      file: source_name.to_owned(),
    }),
    None => Err(ResolverError::FileNotFound {
      file: source_name.to_owned(),
    }),
    Some(correct) if correct != source_name => Err(ResolverError::WrongSourceNameCasing {
      incorrect: source_name.to_owned(),
      correct,
    }),
    Some(_) => Ok(()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::resolver::ResolverErrorKind;

  fn issue(source_name: &str) -> Option<SourceNameFormatIssue> {
    match validate_source_name_format(source_name) {
      Ok(()) => None,
      Err(ResolverError::InvalidSourceNameFormat { issue, .. }) => Some(issue),
      Err(other) => panic!("unexpected error {other:?}"),
    }
  }

  #[test]
  fn validates_source_name_format() {
    assert_eq!(issue("contracts/A.sol"), None);
    assert_eq!(issue("@scope/lib/A.sol"), None);
    assert_eq!(issue("/contracts/A.sol"), Some(SourceNameFormatIssue::AbsolutePath));
    assert_eq!(issue("C:/contracts/A.sol"), Some(SourceNameFormatIssue::AbsolutePath));
    assert_eq!(issue("./contracts/A.sol"), Some(SourceNameFormatIssue::RelativePath));
    assert_eq!(issue("../A.sol"), Some(SourceNameFormatIssue::RelativePath));
    assert_eq!(issue("contracts\\A.sol"), Some(SourceNameFormatIssue::Backslashes));
    assert_eq!(issue("contracts//A.sol"), Some(SourceNameFormatIssue::NotNormalized));
    assert_eq!(issue("contracts/../A.sol"), Some(SourceNameFormatIssue::NotNormalized));
  }

  fn project() -> tempfile::TempDir {
    let temp = tempfile::tempdir().expect("tempdir");
    let contracts = temp.path().join("contracts");
    std::fs::create_dir_all(contracts.join("token")).expect("dirs");
    std::fs::write(contracts.join("token").join("Token.sol"), "").expect("write");
    std::fs::create_dir_all(temp.path().join("hardhat")).expect("tool dir");
    temp
  }

  #[tokio::test]
  async fn local_source_names_depend_on_the_first_segment() {
    let temp = project();
    let root = temp.path();
    let tool = ToolPackage::new("hardhat", root.join("tool"));

    assert!(is_local_source_name(root, "contracts/Missing.sol", None).await.unwrap());
    assert!(is_local_source_name(root, "Contracts/token/Token.sol", None).await.unwrap());
    assert!(!is_local_source_name(root, "lib/A.sol", None).await.unwrap());
    assert!(!is_local_source_name(root, "contracts/node_modules/A.sol", None).await.unwrap());
    assert!(is_local_source_name(root, "hardhat/console.sol", None).await.unwrap());
    assert!(!is_local_source_name(root, "hardhat/console.sol", Some(&tool)).await.unwrap());
  }

  #[test]
  fn local_paths_become_source_names() {
    let temp = project();
    let root = temp.path().canonicalize().unwrap();

    assert_eq!(
      local_path_to_source_name(&root, &root.join("contracts/token/Token.sol")).unwrap(),
      "contracts/token/Token.sol"
    );
    let outside = tempfile::tempdir().expect("outside");
    let err = local_path_to_source_name(&root, &outside.path().join("A.sol")).unwrap_err();
    assert_eq!(err.kind(), ResolverErrorKind::ExternalAsLocal);
    let err = local_path_to_source_name(&root, &root.join("node_modules/lib/A.sol")).unwrap_err();
    assert_eq!(err.kind(), ResolverErrorKind::NodeModulesAsLocal);
  }

  #[tokio::test]
  async fn true_case_lookup_reports_correct_casing() {
    let temp = project();
    let root = temp.path();

    assert_eq!(
      get_source_name_true_case(root, "CONTRACTS/Token/token.sol").await.unwrap(),
      Some("contracts/token/Token.sol".to_owned())
    );
    assert_eq!(get_source_name_true_case(root, "contracts/token").await.unwrap(), None);
    assert_eq!(get_source_name_true_case(root, "contracts/Nope.sol").await.unwrap(), None);
  }

  #[tokio::test]
  async fn existence_and_casing_errors() {
    let temp = project();
    let root = temp.path();

    validate_source_name_existence_and_casing(root, "contracts/token/Token.sol", false)
      .await
      .expect("exists");

    let err = validate_source_name_existence_and_casing(root, "contracts/token/TOKEN.sol", false)
      .await
      .unwrap_err();
    match err {
      ResolverError::WrongSourceNameCasing { incorrect, correct } => {
        assert_eq!(incorrect, "contracts/token/TOKEN.sol");
        assert_eq!(correct, "contracts/token/Token.sol");
      }
      other => panic!("unexpected error {other:?}"),
    }

    let missing = validate_source_name_existence_and_casing(root, "contracts/A.sol", false)
      .await
      .unwrap_err();
    assert_eq!(missing.kind(), ResolverErrorKind::FileNotFound);
    let missing = validate_source_name_existence_and_casing(root, "contracts/A.sol", true)
      .await
      .unwrap_err();
    assert_eq!(missing.kind(), ResolverErrorKind::LibraryFileNotFound);
  }
}
