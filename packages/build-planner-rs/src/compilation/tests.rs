#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use serde_json::json;

  use super::super::*;
  use crate::config::{
    CompilerSettings, KnownBugPolicy, OptimizerSettings, ResolverConfig, SolcConfig,
    SolidityConfig,
  };
  use crate::graph::DependencyGraph;
  use crate::resolver::{ResolvedFile, Resolver};

  struct Fixture {
    _temp: tempfile::TempDir,
    graph: DependencyGraph,
  }

  impl Fixture {
    fn file(&self, name: &str) -> Arc<ResolvedFile> {
      self
        .graph
        .get_file(&format!("contracts/{name}.sol"))
        .cloned()
        .expect("file in graph")
    }
  }

  /// Writes `contracts/<name>.sol` for every `(name, pragma, comma-separated imports)` and
  /// builds the graph rooted at all of them.
  async fn fixture(files: &[(&str, &str, &str)]) -> Fixture {
    let temp = tempfile::tempdir().expect("tempdir");
    let contracts = temp.path().join("contracts");
    std::fs::create_dir_all(&contracts).expect("contracts dir");
    for (name, pragma, imports) in files {
      let mut source = String::new();
      if !pragma.is_empty() {
        source.push_str(&format!("pragma solidity {pragma};\n"));
      }
      for import in imports.split(',').filter(|import| !import.is_empty()) {
        source.push_str(&format!("import \"./{import}.sol\";\n"));
      }
      source.push_str(&format!("contract {name} {{}}\n"));
      std::fs::write(contracts.join(format!("{name}.sol")), source).expect("write source");
    }

    let resolver = Resolver::new(ResolverConfig::new(temp.path()));
    let mut entries = Vec::new();
    for (name, _, _) in files {
      entries.push(
        resolver
          .resolve_source_name(&format!("contracts/{name}.sol"))
          .await
          .expect("resolve"),
      );
    }
    let graph = DependencyGraph::create_from_resolved_files(&resolver, entries)
      .await
      .expect("graph");
    Fixture { _temp: temp, graph }
  }

  fn compilers(versions: &[&str]) -> SolidityConfig {
    SolidityConfig::new(versions.iter().map(|version| SolcConfig::new(*version)).collect())
  }

  fn optimized(version: &str) -> SolcConfig {
    SolcConfig::new(version).with_settings(CompilerSettings {
      optimizer: Some(OptimizerSettings {
        enabled: Some(true),
        runs: Some(200),
        details: None,
      }),
      ..Default::default()
    })
  }

  fn emitted(job: &CompilationJob) -> Vec<(String, bool)> {
    job
      .files()
      .map(|entry| (entry.file.source_name.clone(), entry.emits_artifacts))
      .collect()
  }

  #[tokio::test]
  async fn selects_the_only_matching_compiler() {
    let fixture = fixture(&[("Foo", "^0.5.0", "")]).await;
    let job = create_compilation_job_from_file(
      &fixture.graph,
      &fixture.file("Foo"),
      &compilers(&["0.5.5"]),
    )
    .expect("job");
    assert_eq!(job.solc_config().version, "0.5.5");
  }

  #[tokio::test]
  async fn selects_the_newest_matching_compiler() {
    let fixture = fixture(&[("Foo", ">=0.5.0", "")]).await;
    let job = create_compilation_job_from_file(
      &fixture.graph,
      &fixture.file("Foo"),
      &compilers(&["0.5.5", "0.6.6"]),
    )
    .expect("job");
    assert_eq!(job.solc_config().version, "0.6.6");
  }

  #[tokio::test]
  async fn first_declared_compiler_wins_between_equal_versions() {
    let fixture = fixture(&[("Foo", "^0.8.0", "")]).await;
    let config = SolidityConfig::new(vec![SolcConfig::new("0.8.30"), optimized("0.8.30")]);
    let job = create_compilation_job_from_file(&fixture.graph, &fixture.file("Foo"), &config)
      .expect("job");
    assert_eq!(job.solc_config().version, "0.8.30");
    assert!(!job.solc_config().settings.optimizer_enabled());
  }

  #[tokio::test]
  async fn honours_matching_overrides() {
    let fixture = fixture(&[("Foo", ">=0.5.0", "")]).await;
    let config = compilers(&["0.6.6"]).with_override("contracts/Foo.sol", SolcConfig::new("0.5.1"));
    let job = create_compilation_job_from_file(&fixture.graph, &fixture.file("Foo"), &config)
      .expect("job");
    assert_eq!(job.solc_config().version, "0.5.1");
  }

  #[tokio::test]
  async fn rejects_incompatible_overrides() {
    let fixture = fixture(&[("Foo", "^0.5.0", "")]).await;
    let config = compilers(&["0.5.5"]).with_override("contracts/Foo.sol", SolcConfig::new("0.6.0"));
    let error = create_compilation_job_from_file(&fixture.graph, &fixture.file("Foo"), &config)
      .unwrap_err();
    assert_eq!(
      error.reason,
      CompilationJobCreationReason::IncompatibleOverriddenSolcVersion
    );
    assert_eq!(error.compiler_versions, vec!["0.6.0"]);
  }

  #[tokio::test]
  async fn reports_files_without_compatible_compilers() {
    let fixture = fixture(&[("Foo", "^0.7.0", "")]).await;
    let error = create_compilation_job_from_file(
      &fixture.graph,
      &fixture.file("Foo"),
      &compilers(&["0.5.5", "0.6.6"]),
    )
    .unwrap_err();
    assert_eq!(error.reason, CompilationJobCreationReason::NoCompatibleSolcVersionFound);
    assert!(error.to_string().contains("contracts/Foo.sol"));
  }

  #[tokio::test]
  async fn reports_directly_imported_incompatible_files() {
    let fixture = fixture(&[("Foo", "^0.5.0", "Bar"), ("Bar", "^0.6.0", "")]).await;
    let error = create_compilation_job_from_file(
      &fixture.graph,
      &fixture.file("Foo"),
      &compilers(&["0.5.5", "0.6.6"]),
    )
    .unwrap_err();
    assert_eq!(error.reason, CompilationJobCreationReason::DirectlyImportsIncompatibleFile);
    let incompatible: Vec<_> = error
      .incompatible_imports
      .iter()
      .map(|import| import.file.source_name.clone())
      .collect();
    assert_eq!(incompatible, vec!["contracts/Bar.sol"]);
  }

  #[tokio::test]
  async fn reports_indirectly_imported_incompatible_files() {
    let fixture = fixture(&[
      ("Foo", "^0.5.0", "Mid"),
      ("Mid", "", "Bar"),
      ("Bar", "^0.6.0", ""),
    ])
    .await;
    let error = create_compilation_job_from_file(
      &fixture.graph,
      &fixture.file("Foo"),
      &compilers(&["0.5.5", "0.6.6"]),
    )
    .unwrap_err();
    assert_eq!(
      error.reason,
      CompilationJobCreationReason::IndirectlyImportsIncompatibleFile
    );
    assert_eq!(error.incompatible_imports.len(), 1);
    let import = &error.incompatible_imports[0];
    assert_eq!(import.file.source_name, "contracts/Bar.sol");
    assert_eq!(import.path[0].source_name, "contracts/Mid.sol");
    assert!(error
      .to_string()
      .contains("contracts/Foo.sol -> contracts/Mid.sol -> contracts/Bar.sol"));
  }

  #[tokio::test]
  async fn reports_other_errors_when_only_the_combination_fails() {
    let fixture = fixture(&[
      ("Foo", "^0.5.0", "A,B"),
      ("A", ">=0.5.5", ""),
      ("B", "<0.5.5", ""),
    ])
    .await;
    let error = create_compilation_job_from_file(
      &fixture.graph,
      &fixture.file("Foo"),
      &compilers(&["0.5.4", "0.5.5", "0.5.6"]),
    )
    .unwrap_err();
    assert_eq!(error.reason, CompilationJobCreationReason::OtherError);
  }

  #[tokio::test]
  async fn job_from_file_only_emits_the_root() {
    let fixture = fixture(&[
      ("Foo", "^0.5.0", "Bar"),
      ("Bar", "^0.5.0", "Qux"),
      ("Qux", "^0.5.0", ""),
    ])
    .await;
    let job = create_compilation_job_from_file(
      &fixture.graph,
      &fixture.file("Foo"),
      &compilers(&["0.5.5"]),
    )
    .expect("job");
    assert_eq!(
      emitted(&job),
      vec![
        ("contracts/Bar.sol".to_owned(), false),
        ("contracts/Foo.sol".to_owned(), true),
        ("contracts/Qux.sol".to_owned(), false),
      ]
    );
  }

  #[tokio::test]
  async fn plans_one_job_per_configuration() {
    let fixture = fixture(&[
      ("Foo", "^0.5.0", "Bar"),
      ("Bar", "^0.5.0", "Qux"),
      ("Qux", "^0.5.0", ""),
    ])
    .await;
    let plan = create_compilation_jobs(
      &fixture.graph,
      &compilers(&["0.5.5"]),
      &KnownBugPolicy::default(),
    )
    .expect("plan");

    assert!(plan.errors.is_empty());
    assert_eq!(plan.jobs.len(), 1);
    assert!(emitted(&plan.jobs[0]).iter().all(|(_, emits)| *emits));
  }

  #[tokio::test]
  async fn planning_collects_errors_and_keeps_going() {
    let fixture = fixture(&[
      ("Foo", "^0.5.0", "Bar"),
      ("Bar", "^0.6.0", ""),
      ("Solo", "^0.5.0", ""),
      ("Future", "^0.9.0", ""),
    ])
    .await;
    let plan = create_compilation_jobs(
      &fixture.graph,
      &compilers(&["0.5.5", "0.6.6"]),
      &KnownBugPolicy::default(),
    )
    .expect("plan");

    let versions: Vec<_> = plan
      .jobs
      .iter()
      .map(|job| job.solc_config().version.clone())
      .collect();
    assert_eq!(versions, vec!["0.6.6", "0.5.5"]);

    let by_reason = plan.errors_by_reason();
    assert_eq!(
      by_reason[&CompilationJobCreationReason::DirectlyImportsIncompatibleFile],
      vec!["contracts/Foo.sol"]
    );
    assert_eq!(
      by_reason[&CompilationJobCreationReason::NoCompatibleSolcVersionFound],
      vec!["contracts/Future.sol"]
    );

    let report = format_job_creation_errors(&plan.errors);
    assert!(report.contains("contracts/Foo.sol"));
    assert!(report.contains("contracts/Future.sol"));
  }

  #[tokio::test]
  async fn discards_jobs_that_do_not_emit_their_file() {
    let fixture = fixture(&[("Foo", "^0.5.0", ""), ("Bar", "^0.5.0", "")]).await;
    let plan = create_compilation_jobs_from_connected_component(
      &fixture.graph,
      |_, file| {
        let mut job = CompilationJob::new(Arc::new(SolcConfig::new("0.5.5")));
        job.add_file_to_compile(file.clone(), file.source_name.ends_with("Foo.sol"));
        Ok(job)
      },
      &KnownBugPolicy::default(),
    )
    .expect("plan");

    assert_eq!(plan.jobs.len(), 1);
    assert_eq!(
      emitted(&plan.jobs[0]),
      vec![("contracts/Foo.sol".to_owned(), true)]
    );
  }

  #[tokio::test]
  async fn merging_unions_files_and_ors_emission() {
    let fixture = fixture(&[("Foo", "", ""), ("Bar", "", "")]).await;
    let config = Arc::new(SolcConfig::new("0.8.30"));

    let mut left = CompilationJob::new(config.clone());
    left.add_file_to_compile(fixture.file("Foo"), true);
    left.add_file_to_compile(fixture.file("Bar"), false);
    let mut right = CompilationJob::new(Arc::new(SolcConfig::new("0.8.30")));
    right.add_file_to_compile(fixture.file("Bar"), true);

    let merged = left.merge(&right).expect("merge");
    assert_eq!(
      emitted(&merged),
      vec![
        ("contracts/Bar.sol".to_owned(), true),
        ("contracts/Foo.sol".to_owned(), true),
      ]
    );
    assert!(!left.emits_artifacts(&fixture.file("Bar")));
    assert!(!merged.is_empty());
    assert!(CompilationJob::new(config).is_empty());

    let other = CompilationJob::new(Arc::new(SolcConfig::new("0.7.6")));
    assert!(matches!(
      left.merge(&other),
      Err(PlannerError::MismatchedSolcConfig { .. })
    ));
  }

  #[tokio::test]
  async fn merge_groups_by_configuration() {
    let fixture = fixture(&[("Foo", "", ""), ("Bar", "", ""), ("Baz", "", "")]).await;
    let job = |name: &str, version: &str| {
      let mut job = CompilationJob::new(Arc::new(SolcConfig::new(version)));
      job.add_file_to_compile(fixture.file(name), true);
      job
    };

    let merged = merge_compilation_jobs_without_bug(vec![
      job("Foo", "0.8.30"),
      job("Bar", "0.7.6"),
      job("Baz", "0.8.30"),
    ])
    .expect("merge");
    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].get_resolved_files().len(), 2);
    assert_eq!(merged[1].solc_config().version, "0.7.6");

    let isolated = merge_compilation_jobs(
      vec![job("Foo", "0.8.30"), job("Bar", "0.8.30")],
      |_| false,
    )
    .expect("merge");
    assert_eq!(isolated.len(), 2);

    let err = merge_compilation_jobs(
      vec![job("Foo", "0.8.30"), job("Bar", "0.8.30"), job("Baz", "0.8.30")],
      |job| job.get_resolved_files()[0].source_name.ends_with("Baz.sol"),
    )
    .unwrap_err();
    assert!(matches!(err, PlannerError::InvariantViolation(_)));
  }

  #[tokio::test]
  async fn affected_configurations_collapse_into_one_job() {
    let fixture = fixture(&[("Foo", "", ""), ("Bar", "", "")]).await;
    let config = Arc::new(optimized("0.8.30"));
    let jobs = ["Foo", "Bar"]
      .iter()
      .map(|name| {
        let mut job = CompilationJob::new(config.clone());
        job.add_file_to_compile(fixture.file(name), true);
        job
      })
      .collect();

    let merged =
      merge_compilation_jobs_with_bug(jobs, &KnownBugPolicy::default()).expect("merge");
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].get_resolved_files().len(), 2);
  }

  #[tokio::test]
  async fn builds_compiler_input_from_job() {
    let fixture = fixture(&[("Foo", "^0.8.0", "Bar"), ("Bar", "^0.8.0", "")]).await;
    let config = SolidityConfig::new(vec![optimized("0.8.30")]);
    let job = create_compilation_job_from_file(&fixture.graph, &fixture.file("Foo"), &config)
      .expect("job");

    let input = get_input_from_compilation_job(&job);
    let sources: Vec<_> = input.sources.keys().cloned().collect();
    assert_eq!(sources, vec!["contracts/Bar.sol", "contracts/Foo.sol"]);
    assert_eq!(
      input.sources["contracts/Foo.sol"].content,
      fixture.file("Foo").content.raw_content
    );

    let value = serde_json::to_value(&input).expect("serialize");
    assert_eq!(value["language"], json!("Solidity"));
    assert_eq!(value["settings"]["metadata"]["useLiteralContent"], json!(true));
    assert_eq!(value["settings"]["optimizer"]["enabled"], json!(true));
    assert_eq!(
      value["settings"]["outputSelection"]["*"][""],
      json!(["ast"])
    );
  }
}
