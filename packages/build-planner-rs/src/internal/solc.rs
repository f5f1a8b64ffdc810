use nodejs_semver::{SemverError, Version};

use super::range::VersionRange;

/// Parse a configured compiler version, tolerating a leading `v` and surrounding whitespace.
pub(crate) fn parse_version(version: &str) -> Result<Version, SemverError> {
  let trimmed = version.trim().trim_start_matches('v');
  Version::parse(trimmed)
}

/// Pick the newest candidate satisfying `range`, returning its position in `candidates`.
/// Among candidates declaring the same version, the first one wins.
pub(crate) fn max_satisfying<'a, I>(candidates: I, range: &VersionRange) -> Option<usize>
where
  I: IntoIterator<Item = &'a str>,
{
  candidates
    .into_iter()
    .enumerate()
    .filter_map(|(index, raw)| parse_version(raw).ok().map(|version| (index, version)))
    .filter(|(_, version)| range.matches(version))
    .max_by(|(left_index, left), (right_index, right)| {
      left.cmp(right).then(right_index.cmp(left_index))
    })
    .map(|(index, _)| index)
}
