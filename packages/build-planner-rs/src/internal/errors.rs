use std::fmt::Display;

use napi::bindgen_prelude::Result as NapiResult;
use napi::{Error as NapiError, Status};

use crate::compilation::PlannerError;
use crate::resolver::ResolverError;

/// Create a `napi::Error` with the provided message.
pub(crate) fn napi_error(message: impl Into<String>) -> NapiError {
  NapiError::new(Status::GenericFailure, message.into())
}

/// Map an errorful result into a `napi::Result`, annotating the provided context
/// when the error is propagated.
pub(crate) fn map_napi_error<T, E>(
  result: std::result::Result<T, E>,
  context: &str,
) -> NapiResult<T>
where
  E: Display,
{
  result.map_err(|err| napi_error(format!("{context}: {err}")))
}

impl From<ResolverError> for NapiError {
  fn from(err: ResolverError) -> Self {
    napi_error(format!("{}: {}", err.kind(), err))
  }
}

impl From<PlannerError> for NapiError {
  fn from(err: PlannerError) -> Self {
    napi_error(err.to_string())
  }
}
