
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use futures::future::{try_join_all, BoxFuture, FutureExt};
use tracing::debug;

use crate::resolver::{ResolvedFile, Resolver, Result};

/// A file reachable from another one, with the files walked through to reach it.
#[derive(Debug, Clone)]
pub struct TransitiveDependency {
  pub dependency: Arc<ResolvedFile>,
  /// Intermediate files between the queried file and `dependency`, empty for direct imports.
  pub path: Vec<Arc<ResolvedFile>>,
}

/// Directed import graph over resolved files, keyed by source name.
///
/// Every edge target is itself a node of the graph. Graphs are immutable once built, and
/// connected components share the same `Arc<ResolvedFile>`s as the graph they came from.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
  files: BTreeMap<String, Arc<ResolvedFile>>,
  dependencies: BTreeMap<String, BTreeSet<String>>,
}

struct GraphBuilder<'a> {
  resolver: &'a Resolver,
  visited: DashSet<PathBuf>,
  files: DashMap<String, Arc<ResolvedFile>>,
  dependencies: DashMap<String, BTreeSet<String>>,
}

impl<'a> GraphBuilder<'a> {
  fn add_file(&'a self, file: Arc<ResolvedFile>) -> BoxFuture<'a, Result<()>> {
    async move {
      if !self.visited.insert(file.absolute_path.clone()) {
        return Ok(());
      }
      self.files.insert(file.source_name.clone(), file.clone());

      let imports = try_join_all(
        file
          .content
          .imports
          .iter()
          .map(|imported| self.resolver.resolve_import(&file, imported)),
      )
      .await?;

      let names = imports
        .iter()
        .map(|dependency| dependency.source_name.clone())
        .collect();
      self.dependencies.insert(file.source_name.clone(), names);

      try_join_all(imports.into_iter().map(|dependency| self.add_file(dependency))).await?;
      Ok(())
    }
    .boxed()
  }
}

impl DependencyGraph {
  /// Builds the graph reachable from `entry_files`, resolving every import on the way.
  /// The first resolution failure aborts the construction.
  pub async fn create_from_resolved_files(
    resolver: &Resolver,
    entry_files: Vec<Arc<ResolvedFile>>,
  ) -> Result<Self> {
    let builder = GraphBuilder {
      resolver,
      visited: DashSet::new(),
      files: DashMap::new(),
      dependencies: DashMap::new(),
    };
    try_join_all(entry_files.into_iter().map(|file| builder.add_file(file))).await?;

    let files: BTreeMap<_, _> = builder.files.into_iter().collect();
    let mut dependencies: BTreeMap<_, _> = builder.dependencies.into_iter().collect();
    for name in files.keys() {
      dependencies.entry(name.clone()).or_default();
    }
    debug!(
      files = files.len(),
      edges = dependencies.values().map(BTreeSet::len).sum::<usize>(),
      "built dependency graph"
    );

    Ok(Self {
      files,
      dependencies,
    })
  }

  pub fn get_resolved_files(&self) -> Vec<Arc<ResolvedFile>> {
    self.files.values().cloned().collect()
  }

  pub fn get_file(&self, source_name: &str) -> Option<&Arc<ResolvedFile>> {
    self.files.get(source_name)
  }

  pub fn has(&self, file: &ResolvedFile) -> bool {
    self.files.contains_key(&file.source_name)
  }

  pub fn len(&self) -> usize {
    self.files.len()
  }

  pub fn is_empty(&self) -> bool {
    self.files.is_empty()
  }

  /// Each file with its direct dependencies.
  pub fn entries(&self) -> Vec<(Arc<ResolvedFile>, Vec<Arc<ResolvedFile>>)> {
    self
      .files
      .values()
      .map(|file| (file.clone(), self.get_dependencies(file)))
      .collect()
  }

  /// Direct dependencies only. Unknown files have none.
  pub fn get_dependencies(&self, file: &ResolvedFile) -> Vec<Arc<ResolvedFile>> {
    self.dependencies_of(&file.source_name)
  }

  fn dependencies_of(&self, source_name: &str) -> Vec<Arc<ResolvedFile>> {
    self
      .dependencies
      .get(source_name)
      .into_iter()
      .flatten()
      .filter_map(|name| self.files.get(name).cloned())
      .collect()
  }

  /// Every file reachable from `file`, each reported once and never `file` itself, even
  /// when it sits on a cycle.
  pub fn get_transitive_dependencies(&self, file: &ResolvedFile) -> Vec<TransitiveDependency> {
    let mut visited = BTreeSet::from([file.source_name.clone()]);
    let mut path = Vec::new();
    let mut found = Vec::new();
    self.collect_transitive(&file.source_name, &mut path, &mut visited, &mut found);
    found
  }

  fn collect_transitive(
    &self,
    source_name: &str,
    path: &mut Vec<Arc<ResolvedFile>>,
    visited: &mut BTreeSet<String>,
    found: &mut Vec<TransitiveDependency>,
  ) {
    let fresh: Vec<_> = self
      .dependencies_of(source_name)
      .into_iter()
      .filter(|dependency| visited.insert(dependency.source_name.clone()))
      .collect();

    found.extend(fresh.iter().map(|dependency| TransitiveDependency {
      dependency: dependency.clone(),
      path: path.clone(),
    }));

    for dependency in fresh {
      path.push(dependency.clone());
      self.collect_transitive(&dependency.source_name, path, visited, found);
      path.pop();
    }
  }

  /// Splits the graph into its weakly connected components, ordered by their smallest
  /// source name.
  pub fn get_connected_components(&self) -> Vec<DependencyGraph> {
    let mut neighbours: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for (from, targets) in &self.dependencies {
      for to in targets {
        neighbours.entry(from.as_str()).or_default().insert(to.as_str());
        neighbours.entry(to.as_str()).or_default().insert(from.as_str());
      }
    }

    let mut visited = BTreeSet::new();
    let mut components = Vec::new();
    for start in self.files.keys() {
      if !visited.insert(start.as_str()) {
        continue;
      }

      let mut component = DependencyGraph::default();
      let mut stack = vec![start.as_str()];
      while let Some(name) = stack.pop() {
        if let Some(file) = self.files.get(name) {
          component.files.insert(name.to_owned(), file.clone());
        }
        component.dependencies.insert(
          name.to_owned(),
          self.dependencies.get(name).cloned().unwrap_or_default(),
        );
        for &next in neighbours.get(name).into_iter().flatten() {
          if visited.insert(next) {
            stack.push(next);
          }
        }
      }
      components.push(component);
    }
    components
  }
}
