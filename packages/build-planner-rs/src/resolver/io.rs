use std::path::Path;

use alloy_primitives::keccak256;
use futures::future::{BoxFuture, FutureExt};

use super::error::{ResolverError, Result};

/// Reads source files on behalf of the resolver.
pub trait SourceReader: Send + Sync {
  fn read<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<String>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FsSourceReader;

impl SourceReader for FsSourceReader {
  fn read<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<String>> {
    async move {
      tokio::fs::read_to_string(path)
        .await
        .map_err(|err| ResolverError::io(path, err))
    }
    .boxed()
  }
}

/// Produces the opaque content identifier stored on resolved files and used as the parse
/// cache key.
pub trait ContentHasher: Send + Sync {
  fn hash(&self, content: &[u8]) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Keccak256Hasher;

impl ContentHasher for Keccak256Hasher {
  fn hash(&self, content: &[u8]) -> String {
    hex::encode(keccak256(content))
  }
}
