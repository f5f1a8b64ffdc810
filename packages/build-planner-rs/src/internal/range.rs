//! npm-style version ranges as written in `pragma solidity` directives.
//!
//! Parsing and matching are delegated to `nodejs_semver`, so a bare version (`0.5.5`) is an
//! exact match and pre-releases only satisfy comparators on the same release.

use std::fmt;
use std::str::FromStr;

use nodejs_semver::{Range, Version};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid version range \"{input}\": {reason}")]
pub struct RangeError {
  pub input: String,
  pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Bounds {
  Any,
  Within(Range),
  Empty,
}

/// The versions allowed by one or more pragma ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
  source: String,
  bounds: Bounds,
}

impl VersionRange {
  /// The range matching every version.
  pub fn any() -> Self {
    Self {
      source: "*".to_owned(),
      bounds: Bounds::Any,
    }
  }

  /// The range matching no version at all.
  pub fn none() -> Self {
    Self {
      source: "<0.0.0-0".to_owned(),
      bounds: Bounds::Empty,
    }
  }

  /// Combine several pragma ranges into the range satisfying all of them.
  pub fn from_pragmas<I, S>(pragmas: I) -> Result<Self, RangeError>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut combined = VersionRange::any();
    let mut sources = Vec::new();
    for pragma in pragmas {
      let range: VersionRange = pragma.as_ref().parse()?;
      combined = combined.intersection(&range);
      sources.push(pragma.as_ref().trim().to_owned());
    }
    if !sources.is_empty() {
      combined.source = sources.join(" ");
    }
    Ok(combined)
  }

  pub fn matches(&self, version: &Version) -> bool {
    match &self.bounds {
      Bounds::Any => true,
      Bounds::Within(range) => range.satisfies(version),
      Bounds::Empty => false,
    }
  }

  /// Whether some version satisfies both ranges.
  pub fn intersects(&self, other: &VersionRange) -> bool {
    match (&self.bounds, &other.bounds) {
      (Bounds::Empty, _) | (_, Bounds::Empty) => false,
      (Bounds::Any, _) | (_, Bounds::Any) => true,
      (Bounds::Within(left), Bounds::Within(right)) => left.allows_any(right),
    }
  }

  pub fn intersection(&self, other: &VersionRange) -> VersionRange {
    let bounds = match (&self.bounds, &other.bounds) {
      (Bounds::Empty, _) | (_, Bounds::Empty) => Bounds::Empty,
      (Bounds::Any, bounds) | (bounds, Bounds::Any) => bounds.clone(),
      (Bounds::Within(left), Bounds::Within(right)) => left
        .intersect(right)
        .map(Bounds::Within)
        .unwrap_or(Bounds::Empty),
    };
    VersionRange {
      source: format!("{} {}", self.source, other.source),
      bounds,
    }
  }

  pub fn max_satisfying<'a, I>(&self, versions: I) -> Option<&'a Version>
  where
    I: IntoIterator<Item = &'a Version>,
  {
    versions
      .into_iter()
      .filter(|version| self.matches(version))
      .max()
  }

  pub fn is_empty(&self) -> bool {
    self.bounds == Bounds::Empty
  }
}

impl FromStr for VersionRange {
  type Err = RangeError;

  fn from_str(input: &str) -> Result<Self, Self::Err> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
      return Ok(Self::any());
    }
    let range = Range::parse(trimmed).map_err(|err| RangeError {
      input: input.to_owned(),
      reason: err.to_string(),
    })?;
    Ok(Self {
      source: trimmed.to_owned(),
      bounds: Bounds::Within(range),
    })
  }
}

impl fmt::Display for VersionRange {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.source)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn range(input: &str) -> VersionRange {
    input.parse().expect("valid range")
  }

  fn v(input: &str) -> Version {
    Version::parse(input).expect("valid version")
  }

  #[test]
  fn bare_versions_are_exact() {
    let exact = range("0.5.5");
    assert!(exact.matches(&v("0.5.5")));
    assert!(!exact.matches(&v("0.5.6")));
  }

  #[test]
  fn caret_and_tilde_follow_npm_semantics() {
    let caret = range("^0.5.0");
    assert!(caret.matches(&v("0.5.17")));
    assert!(!caret.matches(&v("0.6.0")));

    let caret_major = range("^1.2.3");
    assert!(caret_major.matches(&v("1.9.0")));
    assert!(!caret_major.matches(&v("2.0.0")));

    let tilde = range("~0.8.1");
    assert!(tilde.matches(&v("0.8.20")));
    assert!(!tilde.matches(&v("0.8.0")));
    assert!(!tilde.matches(&v("0.9.0")));
  }

  #[test]
  fn pre_releases_need_a_comparator_on_the_same_release() {
    assert!(!range("^0.8.0").matches(&v("0.8.1-nightly")));
    assert!(range(">=0.8.1-nightly").matches(&v("0.8.1-nightly")));
  }

  #[test]
  fn comparators_are_and_combined() {
    let bounded = range(">=0.5.0 <0.7.0");
    assert!(bounded.matches(&v("0.6.12")));
    assert!(!bounded.matches(&v("0.7.0")));
    assert!(!bounded.matches(&v("0.4.26")));
  }

  #[test]
  fn wildcards_and_empty_input_match_releases() {
    assert!(range("0.8.x").matches(&v("0.8.30")));
    assert!(!range("0.8.x").matches(&v("0.9.0")));
    assert!(range("*").matches(&v("0.1.0")));
    assert!(range("").matches(&v("0.1.0")));
  }

  #[test]
  fn alternatives_and_hyphen_ranges() {
    let either = range("^0.4.0 || ^0.6.0");
    assert!(either.matches(&v("0.4.2")));
    assert!(either.matches(&v("0.6.2")));
    assert!(!either.matches(&v("0.5.2")));

    let hyphen = range("0.5.0 - 0.6.9");
    assert!(hyphen.matches(&v("0.6.9")));
    assert!(!hyphen.matches(&v("0.7.0")));
  }

  #[test]
  fn intersects_detects_disjoint_ranges() {
    assert!(!range("^0.5.0").intersects(&range("^0.6.0")));
    assert!(range(">=0.5.0").intersects(&range("^0.6.0")));
    assert!(range(">=0.6.0").intersects(&range("<=0.6.0")));
    assert!(!range(">0.6.0").intersects(&range("<=0.6.0")));
    assert!(VersionRange::any().intersects(&range("^0.6.0")));
    assert!(!VersionRange::none().intersects(&VersionRange::any()));
  }

  #[test]
  fn from_pragmas_requires_every_pragma() {
    let combined = VersionRange::from_pragmas(["^0.5.0", ">=0.5.5"]).unwrap();
    assert!(combined.matches(&v("0.5.5")));
    assert!(!combined.matches(&v("0.5.4")));
    assert_eq!(combined.to_string(), "^0.5.0 >=0.5.5");

    let unsatisfiable = VersionRange::from_pragmas(["^0.5.0", "^0.6.0"]).unwrap();
    assert!(unsatisfiable.is_empty());
    assert!(!unsatisfiable.matches(&v("0.5.0")));

    let empty = VersionRange::from_pragmas(Vec::<String>::new()).unwrap();
    assert!(empty.matches(&v("0.8.0")));
  }

  #[test]
  fn max_satisfying_returns_newest() {
    let versions = [v("0.5.5"), v("0.6.6")];
    assert_eq!(range(">=0.5.0").max_satisfying(&versions), Some(&versions[1]));
    assert_eq!(range("^0.5.0").max_satisfying(&versions), Some(&versions[0]));
    assert_eq!(range("^0.7.0").max_satisfying(&versions), None);
  }

  #[test]
  fn rejects_garbage() {
    assert!("^banana".parse::<VersionRange>().is_err());
  }
}
