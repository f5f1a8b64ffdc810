#[cfg(feature = "napi")]
pub(crate) mod errors;
pub(crate) mod path;
pub(crate) mod range;
pub(crate) mod solc;
