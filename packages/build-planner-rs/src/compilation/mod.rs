//! Splits a dependency graph into solc invocations and builds their standard-JSON input.

mod error;
mod input;
mod job;
mod planner;
mod tests;

pub use error::{
  format_job_creation_errors, CompilationJobCreationError, CompilationJobCreationReason,
  IncompatibleImport, PlannerError,
};
pub use input::{get_input_from_compilation_job, CompilerInput, SourceEntry};
pub use job::{
  merge_compilation_jobs, merge_compilation_jobs_with_bug, merge_compilation_jobs_without_bug,
  CompilationJob, FileToCompile,
};
pub use planner::{
  create_compilation_job_from_file, create_compilation_jobs,
  create_compilation_jobs_from_connected_component, CompilationPlan, ComponentPlan,
};
