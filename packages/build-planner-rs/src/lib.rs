#[cfg(feature = "napi")]
#[macro_use]
extern crate napi_derive;

#[cfg(feature = "napi")]
mod bindings;
pub mod compilation;
pub mod config;
pub mod graph;
mod internal;
pub mod resolver;

#[cfg(feature = "napi")]
pub use bindings::{plan_compilation, CompilationPlanOutput, PlannedFile, PlannedJob, PlanningError};
pub use compilation::{
  create_compilation_job_from_file, create_compilation_jobs,
  create_compilation_jobs_from_connected_component, format_job_creation_errors,
  get_input_from_compilation_job, CompilationJob, CompilationJobCreationError,
  CompilationJobCreationReason, CompilationPlan, CompilerInput, ComponentPlan, PlannerError,
};
pub use config::{
  CompilerSettings, KnownBugOptions, KnownBugPolicy, PlanningOptions, ResolverConfig, SolcConfig,
  SolidityConfig, ToolPackage,
};
pub use graph::{DependencyGraph, TransitiveDependency};
pub use internal::range::{RangeError, VersionRange};
pub use resolver::{
  LibraryInfo, RegexAnalyzer, ResolvedFile, Resolver, ResolverError, ResolverErrorKind,
  SolarAnalyzer,
};
