use std::path::Path;

use napi::bindgen_prelude::*;
use serde_json::Value;

use crate::compilation::{
  create_compilation_jobs, format_job_creation_errors, get_input_from_compilation_job,
  CompilationJob,
};
use crate::config::{PlanningOptions, SolidityConfig};
use crate::graph::DependencyGraph;
use crate::internal::errors::map_napi_error;
use crate::resolver::{local_path_to_source_name, Resolver};

#[napi(object)]
#[derive(Debug, Clone)]
pub struct PlannedFile {
  pub source_name: String,
  pub absolute_path: String,
  pub emits_artifacts: bool,
  pub library_name: Option<String>,
  pub library_version: Option<String>,
}

#[napi(object)]
#[derive(Debug, Clone)]
pub struct PlannedJob {
  pub solc_version: String,
  pub files: Vec<PlannedFile>,
  /// Standard-JSON compiler input, serialized.
  pub input: String,
}

#[napi(object)]
#[derive(Debug, Clone)]
pub struct PlanningError {
  pub reason: String,
  pub source_name: String,
  pub message: String,
}

#[napi(object)]
#[derive(Debug, Clone)]
pub struct CompilationPlanOutput {
  pub jobs: Vec<PlannedJob>,
  pub errors: Vec<PlanningError>,
  /// Human readable summary of `errors`, absent when every file was planned.
  pub report: Option<String>,
}

fn planned_job(job: &CompilationJob) -> Result<PlannedJob> {
  let input = map_napi_error(
    serde_json::to_string(&get_input_from_compilation_job(job)),
    "Failed to serialize compiler input",
  )?;
  let files = job
    .files()
    .map(|entry| PlannedFile {
      source_name: entry.file.source_name.clone(),
      absolute_path: entry.file.absolute_path.to_string_lossy().to_string(),
      emits_artifacts: entry.emits_artifacts,
      library_name: entry.file.library.as_ref().map(|library| library.name.clone()),
      library_version: entry
        .file
        .library
        .as_ref()
        .map(|library| library.version.clone()),
    })
    .collect();

  Ok(PlannedJob {
    solc_version: job.solc_config().version.clone(),
    files,
    input,
  })
}

#[napi(
  ts_args_type = "projectRoot: string, sourceNames: string[], solidityConfig: { compilers: { version: string, settings?: object }[], overrides?: Record<string, { version: string, settings?: object }> }, options?: { toolPackage?: { name: string, root: string }, knownBug?: { versions: string, requiresOptimizer?: boolean } }"
)]
pub async fn plan_compilation(
  project_root: String,
  source_names: Vec<String>,
  solidity_config: Value,
  options: Option<Value>,
) -> Result<CompilationPlanOutput> {
  let solidity_config: SolidityConfig = map_napi_error(
    serde_json::from_value(solidity_config),
    "Invalid solidity config",
  )?;
  let options: PlanningOptions = match options {
    Some(options) => map_napi_error(serde_json::from_value(options), "Invalid planning options")?,
    None => PlanningOptions::default(),
  };
  let policy = map_napi_error(options.known_bug_policy(), "Invalid known bug versions")?;
  let resolver = Resolver::new(options.resolver_config(&project_root));

  let mut entries = Vec::with_capacity(source_names.len());
  for entry in &source_names {
    // Entry points may also be given as absolute paths inside the project.
    let source_name = if Path::new(entry).is_absolute() {
      local_path_to_source_name(resolver.project_root(), Path::new(entry))?
    } else {
      entry.clone()
    };
    entries.push(resolver.resolve_source_name(&source_name).await?);
  }
  let graph = DependencyGraph::create_from_resolved_files(&resolver, entries).await?;
  let plan = create_compilation_jobs(&graph, &solidity_config, &policy)?;

  let jobs = plan.jobs.iter().map(planned_job).collect::<Result<Vec<_>>>()?;
  let errors = plan
    .errors
    .iter()
    .map(|error| PlanningError {
      reason: error.reason.to_string(),
      source_name: error.source_name().to_owned(),
      message: error.to_string(),
    })
    .collect();
  let report = (!plan.errors.is_empty()).then(|| format_job_creation_errors(&plan.errors));

  Ok(CompilationPlanOutput {
    jobs,
    errors,
    report,
  })
}
