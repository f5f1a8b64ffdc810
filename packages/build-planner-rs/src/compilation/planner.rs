use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::error::{
  CompilationJobCreationError, CompilationJobCreationReason, IncompatibleImport, PlannerError,
};
use super::job::{
  merge_compilation_jobs_with_bug, merge_compilation_jobs_without_bug, CompilationJob,
};
use crate::config::{KnownBugPolicy, SolcConfig, SolidityConfig};
use crate::graph::{DependencyGraph, TransitiveDependency};
use crate::internal::range::VersionRange;
use crate::internal::solc::{max_satisfying, parse_version};
use crate::resolver::ResolvedFile;

/// Jobs and per-file failures planned for one connected component.
#[derive(Debug, Clone, Default)]
pub struct ComponentPlan {
  pub jobs: Vec<CompilationJob>,
  pub errors: Vec<CompilationJobCreationError>,
}

/// The plan for a whole dependency graph.
pub type CompilationPlan = ComponentPlan;

impl ComponentPlan {
  /// Source names of the failing files, grouped by failure reason.
  pub fn errors_by_reason(&self) -> BTreeMap<CompilationJobCreationReason, Vec<String>> {
    let mut grouped: BTreeMap<_, Vec<String>> = BTreeMap::new();
    for error in &self.errors {
      grouped
        .entry(error.reason)
        .or_default()
        .push(error.source_name().to_owned());
    }
    grouped
  }

  fn extend(&mut self, other: ComponentPlan) {
    self.jobs.extend(other.jobs);
    self.errors.extend(other.errors);
  }
}

/// Parses the pragmas of a set of files as one range. Unparseable pragmas make the range
/// unsatisfiable so the file surfaces as a planning error.
fn combined_range<'a, I>(pragmas: I) -> VersionRange
where
  I: IntoIterator<Item = &'a String>,
{
  let mut unique: Vec<&String> = Vec::new();
  for pragma in pragmas {
    if !unique.contains(&pragma) {
      unique.push(pragma);
    }
  }
  match VersionRange::from_pragmas(unique) {
    Ok(range) => range,
    Err(err) => {
      debug!(%err, "unparseable version pragma");
      VersionRange::none()
    }
  }
}

fn file_range(file: &ResolvedFile) -> VersionRange {
  combined_range(&file.content.version_pragmas)
}

/// Plans the job rooted at `file`: the file emits artifacts, its transitive dependencies are
/// compiled alongside it.
pub fn create_compilation_job_from_file(
  graph: &DependencyGraph,
  file: &Arc<ResolvedFile>,
  solidity_config: &SolidityConfig,
) -> Result<CompilationJob, CompilationJobCreationError> {
  let direct_dependencies = graph.get_dependencies(file);
  let transitive_dependencies = graph.get_transitive_dependencies(file);

  let config = get_compiler_config_for_file(
    file,
    &direct_dependencies,
    &transitive_dependencies,
    solidity_config,
  )?;
  debug!(source_name = %file.source_name, version = %config.version, "selected compiler");

  let mut job = CompilationJob::new(config);
  job.add_file_to_compile(file.clone(), true);
  for TransitiveDependency { dependency, .. } in transitive_dependencies {
    job.add_file_to_compile(dependency, false);
  }
  Ok(job)
}

fn get_compiler_config_for_file(
  file: &Arc<ResolvedFile>,
  direct_dependencies: &[Arc<ResolvedFile>],
  transitive_dependencies: &[TransitiveDependency],
  solidity_config: &SolidityConfig,
) -> Result<Arc<SolcConfig>, CompilationJobCreationError> {
  let range = combined_range(
    file.content.version_pragmas.iter().chain(
      transitive_dependencies
        .iter()
        .flat_map(|transitive| transitive.dependency.content.version_pragmas.iter()),
    ),
  );

  if let Some(overridden) = solidity_config.overrides.get(&file.source_name) {
    let satisfied = parse_version(&overridden.version)
      .map(|version| range.matches(&version))
      .unwrap_or(false);
    if !satisfied {
      return Err(get_compilation_job_creation_error(
        file,
        direct_dependencies,
        transitive_dependencies,
        &[overridden.version.clone()],
        true,
      ));
    }
    return Ok(Arc::new(overridden.clone()));
  }

  let versions = solidity_config.compiler_versions();
  match max_satisfying(versions.iter().map(String::as_str), &range) {
    Some(index) => Ok(Arc::new(solidity_config.compilers[index].clone())),
    None => Err(get_compilation_job_creation_error(
      file,
      direct_dependencies,
      transitive_dependencies,
      &versions,
      false,
    )),
  }
}

/// Explains a failed compiler selection, preferring the most local cause.
fn get_compilation_job_creation_error(
  file: &Arc<ResolvedFile>,
  direct_dependencies: &[Arc<ResolvedFile>],
  transitive_dependencies: &[TransitiveDependency],
  compiler_versions: &[String],
  overridden: bool,
) -> CompilationJobCreationError {
  let own_range = file_range(file);
  let error = |reason, incompatible_imports| CompilationJobCreationError {
    reason,
    file: file.clone(),
    direct_dependencies: direct_dependencies.to_vec(),
    compiler_versions: compiler_versions.to_vec(),
    incompatible_imports,
  };

  if max_satisfying(compiler_versions.iter().map(String::as_str), &own_range).is_none() {
    let reason = if overridden {
      CompilationJobCreationReason::IncompatibleOverriddenSolcVersion
    } else {
      CompilationJobCreationReason::NoCompatibleSolcVersionFound
    };
    return error(reason, Vec::new());
  }

  let direct: Vec<_> = direct_dependencies
    .iter()
    .filter(|dependency| !own_range.intersects(&file_range(dependency)))
    .map(|dependency| IncompatibleImport {
      file: dependency.clone(),
      path: Vec::new(),
    })
    .collect();
  if !direct.is_empty() {
    return error(
      CompilationJobCreationReason::DirectlyImportsIncompatibleFile,
      direct,
    );
  }

  let indirect: Vec<_> = transitive_dependencies
    .iter()
    .filter(|transitive| !own_range.intersects(&file_range(&transitive.dependency)))
    .map(|transitive| IncompatibleImport {
      file: transitive.dependency.clone(),
      path: transitive.path.clone(),
    })
    .collect();
  if !indirect.is_empty() {
    return error(
      CompilationJobCreationReason::IndirectlyImportsIncompatibleFile,
      indirect,
    );
  }

  error(CompilationJobCreationReason::OtherError, Vec::new())
}

/// Plans every file of `component`, keeping going past individual failures, then merges
/// the jobs that share a configuration.
pub fn create_compilation_jobs_from_connected_component<F>(
  component: &DependencyGraph,
  get_job_for_file: F,
  policy: &KnownBugPolicy,
) -> Result<ComponentPlan, PlannerError>
where
  F: Fn(&DependencyGraph, &Arc<ResolvedFile>) -> Result<CompilationJob, CompilationJobCreationError>,
{
  let mut jobs = Vec::new();
  let mut errors = Vec::new();
  for file in component.get_resolved_files() {
    match get_job_for_file(component, &file) {
      Ok(job) if job.emits_artifacts(&file) => jobs.push(job),
      Ok(_) => {}
      Err(error) => {
        debug!(source_name = %file.source_name, reason = %error.reason, "no compilation job");
        errors.push(error);
      }
    }
  }

  let (affected, unaffected): (Vec<_>, Vec<_>) = jobs
    .into_iter()
    .partition(|job| policy.affects(job.solc_config()));
  let mut jobs = merge_compilation_jobs_with_bug(affected, policy)?;
  jobs.extend(merge_compilation_jobs_without_bug(unaffected)?);

  Ok(ComponentPlan { jobs, errors })
}

/// Plans all connected components of `graph` with the compilers of `solidity_config`.
pub fn create_compilation_jobs(
  graph: &DependencyGraph,
  solidity_config: &SolidityConfig,
  policy: &KnownBugPolicy,
) -> Result<CompilationPlan, PlannerError> {
  let mut plan = CompilationPlan::default();
  for component in graph.get_connected_components() {
    let component_plan = create_compilation_jobs_from_connected_component(
      &component,
      |component, file| create_compilation_job_from_file(component, file, solidity_config),
      policy,
    )?;
    plan.extend(component_plan);
  }
  debug!(
    jobs = plan.jobs.len(),
    errors = plan.errors.len(),
    "planned compilation"
  );
  Ok(plan)
}
