//! Scheme metadata and schema synchronization.
//!
//! A [`Scheme`] is a named record shape holding an ordered list of
//! [`Structure`] field descriptors. [`sync`] diffs a scheme against a
//! statically-registered [`TypeDescription`](eav_types::TypeDescription) and
//! emits add/update/remove operations; [`SchemaCatalog`] is the shared,
//! internally synchronized registry with the `ensure_scheme` entry point;
//! [`MetadataCache`] is the explicit cache service instance.

#![forbid(unsafe_code)]

pub mod cache;
pub mod catalog;
pub mod scheme;
pub mod sync;
pub mod type_map;

pub use cache::{CacheConfig, MetadataCache};
pub use catalog::SchemaCatalog;
pub use scheme::{Scheme, Structure};
pub use sync::{sync_structures, StructureChange};
pub use type_map::{required_for, storage_tag_for};
