use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::job::CompilationJob;
use crate::config::CompilerSettings;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceEntry {
  pub content: String,
}

/// solc standard-JSON input for one compilation job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompilerInput {
  pub language: String,
  pub sources: BTreeMap<String, SourceEntry>,
  pub settings: CompilerSettings,
}

pub fn get_input_from_compilation_job(job: &CompilationJob) -> CompilerInput {
  let sources = job
    .files()
    .map(|entry| {
      (
        entry.file.source_name.clone(),
        SourceEntry {
          content: entry.file.content.raw_content.clone(),
        },
      )
    })
    .collect();

  CompilerInput {
    language: "Solidity".to_owned(),
    sources,
    settings: job.solc_config().settings.with_input_defaults(),
  }
}
