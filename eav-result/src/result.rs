use crate::error::Error;

/// Result type alias used throughout the EAV core.
///
/// Shorthand for `std::result::Result<T, Error>`. All fallible operations in
/// the `eav-*` crates return this type.
pub type Result<T> = std::result::Result<T, Error>;
