use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::error::PlannerError;
use crate::config::{KnownBugPolicy, SolcConfig};
use crate::resolver::ResolvedFile;

#[derive(Debug, Clone)]
pub struct FileToCompile {
  pub file: Arc<ResolvedFile>,
  pub emits_artifacts: bool,
}

/// One compiler invocation: a configuration plus the files handed to it.
#[derive(Debug, Clone)]
pub struct CompilationJob {
  solc_config: Arc<SolcConfig>,
  files: BTreeMap<String, FileToCompile>,
}

impl CompilationJob {
  pub fn new(solc_config: Arc<SolcConfig>) -> Self {
    Self {
      solc_config,
      files: BTreeMap::new(),
    }
  }

  /// Adds `file`, or widens its `emits_artifacts` flag if it is already part of the job.
  pub fn add_file_to_compile(&mut self, file: Arc<ResolvedFile>, emits_artifacts: bool) {
    self
      .files
      .entry(file.source_name.clone())
      .and_modify(|existing| existing.emits_artifacts |= emits_artifacts)
      .or_insert(FileToCompile {
        file,
        emits_artifacts,
      });
  }

  pub fn solc_config(&self) -> &Arc<SolcConfig> {
    &self.solc_config
  }

  pub fn has_solc_config(&self, config: &SolcConfig) -> bool {
    *self.solc_config == *config
  }

  pub fn is_empty(&self) -> bool {
    self.files.is_empty()
  }

  pub fn files(&self) -> impl Iterator<Item = &FileToCompile> {
    self.files.values()
  }

  pub fn get_resolved_files(&self) -> Vec<Arc<ResolvedFile>> {
    self.files.values().map(|entry| entry.file.clone()).collect()
  }

  /// `false` for files that are not part of the job.
  pub fn emits_artifacts(&self, file: &ResolvedFile) -> bool {
    self
      .files
      .get(&file.source_name)
      .map(|entry| entry.emits_artifacts)
      .unwrap_or(false)
  }

  /// Union of both jobs' files. Neither input is modified.
  pub fn merge(&self, other: &CompilationJob) -> Result<CompilationJob, PlannerError> {
    if !Arc::ptr_eq(&self.solc_config, &other.solc_config) && !self.has_solc_config(&other.solc_config)
    {
      return Err(PlannerError::MismatchedSolcConfig {
        left: self.solc_config.version.clone(),
        right: other.solc_config.version.clone(),
      });
    }

    let mut merged = self.clone();
    for entry in other.files.values() {
      merged.add_file_to_compile(entry.file.clone(), entry.emits_artifacts);
    }
    Ok(merged)
  }
}

/// Groups `jobs` by configuration. Mergeable jobs are folded into the group's single job;
/// the others are kept as they are.
pub fn merge_compilation_jobs<F>(
  jobs: Vec<CompilationJob>,
  is_mergeable: F,
) -> Result<Vec<CompilationJob>, PlannerError>
where
  F: Fn(&CompilationJob) -> bool,
{
  let mut groups: Vec<(Arc<SolcConfig>, Vec<CompilationJob>)> = Vec::new();
  for job in jobs {
    let position = groups
      .iter()
      .position(|(config, _)| job.has_solc_config(config));
    let Some(position) = position else {
      groups.push((job.solc_config.clone(), vec![job]));
      continue;
    };

    let group = &mut groups[position].1;
    if !is_mergeable(&job) {
      group.push(job);
      continue;
    }
    if group.len() != 1 {
      return Err(PlannerError::InvariantViolation(format!(
        "more than one mergeable job was added for solc {}",
        job.solc_config.version
      )));
    }
    group[0] = group[0].merge(&job)?;
  }

  let merged: Vec<_> = groups.into_iter().flat_map(|(_, jobs)| jobs).collect();
  debug!(jobs = merged.len(), "merged compilation jobs");
  Ok(merged)
}

/// Merges jobs whose configuration is exposed to the known optimizer defect: at most one
/// job per affected configuration survives.
pub fn merge_compilation_jobs_with_bug(
  jobs: Vec<CompilationJob>,
  policy: &KnownBugPolicy,
) -> Result<Vec<CompilationJob>, PlannerError> {
  merge_compilation_jobs(jobs, |job| policy.affects(job.solc_config()))
}

pub fn merge_compilation_jobs_without_bug(
  jobs: Vec<CompilationJob>,
) -> Result<Vec<CompilationJob>, PlannerError> {
  merge_compilation_jobs(jobs, |_| true)
}
