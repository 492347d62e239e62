//! Shared types for the EAV persistence core.
//!
//! These types live in `eav-types` so they can be reused without depending
//! on the schema- or storage-specific crates.

#![forbid(unsafe_code)]

pub mod descriptor;
pub mod ids;
pub mod source;
pub mod tag;
pub mod value;

pub use descriptor::{FieldDescriptor, HostType, TypeDescription};
pub use ids::*;
pub use source::IdentitySource;
pub use tag::StorageTypeTag;
pub use value::{FieldValues, Value};
