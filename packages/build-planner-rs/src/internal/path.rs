use std::path::{Component, Path, PathBuf};

/// Canonicalises a path while falling back to an absolute join if canonicalisation fails.
///
/// Missing paths default to the current working directory so callers still get a stable,
/// absolute root for projects that are not fully materialised on disk yet.
pub fn canonicalize_path(path: &Path) -> PathBuf {
  match std::fs::canonicalize(path) {
    Ok(canonical) => canonical,
    Err(_) => {
      if path.is_absolute() {
        path.to_path_buf()
      } else {
        std::env::current_dir()
          .unwrap_or_else(|_| PathBuf::from("."))
          .join(path)
      }
    }
  }
}

pub fn replace_backslashes(value: &str) -> String {
  value.replace('\\', "/")
}

/// Lexically normalises a forward-slash path: collapses `.` and empty segments and folds
/// `..` into its parent where possible. Leading `..` segments of relative paths survive.
pub fn normalize_source_name(source_name: &str) -> String {
  let replaced = replace_backslashes(source_name);
  let is_absolute = replaced.starts_with('/');
  let mut segments: Vec<&str> = Vec::new();
  for segment in replaced.split('/') {
    match segment {
      "" | "." => {}
      ".." => match segments.last() {
        Some(&last) if last != ".." => {
          segments.pop();
        }
        _ if is_absolute => {}
        _ => segments.push(".."),
      },
      other => segments.push(other),
    }
  }

  let joined = segments.join("/");
  match (is_absolute, joined.is_empty()) {
    (true, _) => format!("/{joined}"),
    (false, true) => ".".to_owned(),
    (false, false) => joined,
  }
}

/// Whether the name is absolute under either POSIX or Windows conventions.
pub fn is_absolute_path_source_name(source_name: &str) -> bool {
  if source_name.starts_with('/') || source_name.starts_with('\\') {
    return true;
  }
  let bytes = source_name.as_bytes();
  bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Directory portion of a source name, `.` when the name has no directory.
pub fn source_name_dir(source_name: &str) -> &str {
  match source_name.rfind('/') {
    Some(index) => &source_name[..index],
    None => ".",
  }
}

/// Joins a (normalised) source name onto a filesystem directory segment by segment.
pub fn source_name_to_path(root: &Path, source_name: &str) -> PathBuf {
  source_name
    .split('/')
    .filter(|segment| !segment.is_empty())
    .fold(root.to_path_buf(), |path, segment| path.join(segment))
}

/// Renders a relative filesystem path as a forward-slash source name.
pub fn path_to_source_name(relative: &Path) -> String {
  let segments: Vec<String> = relative
    .components()
    .filter_map(|component| match component {
      Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
      Component::ParentDir => Some("..".to_owned()),
      _ => None,
    })
    .collect();
  normalize_source_name(&segments.join("/"))
}
