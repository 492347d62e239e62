//! EAV: schema-synchronized entity-attribute-value persistence.
//!
//! This crate is the primary entrypoint for the EAV toolkit. It re-exports
//! the public surface of the underlying `eav-*` crates and hosts the
//! [`EavEngine`] orchestration layer that ties schema synchronization, value
//! transcoding, and query building to an external row executor.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use eav::{EavEngine, FieldDescriptor, HostType, ObjectRecord, TypeDescription};
//! use eav_test_utils::MemExecutor;
//!
//! let description = TypeDescription::new("Person")
//!     .field(FieldDescriptor::new("Name", HostType::String))
//!     .field(FieldDescriptor::new("Age", HostType::I32).nullable());
//!
//! let executor = Arc::new(MemExecutor::new(Default::default()));
//! let engine = EavEngine::new(executor.clone(), executor.clone())
//!     .with_catalog(executor.catalog().clone());
//!
//! let scheme = engine.ensure_scheme(&description).unwrap();
//! let mut person = ObjectRecord::new(scheme.id, 1);
//! person.set("Name", "Ada").set("Age", 36);
//! let id = engine.save(&mut person, &description, false).unwrap();
//!
//! let loaded = engine.load(id, &description, false).unwrap();
//! assert_eq!(loaded.get("Name"), person.get("Name"));
//! ```
//!
//! # Architecture
//!
//! The workspace is layered:
//!
//! - **Types** (`eav-types`): identifiers, storage tags, literal values, and
//!   the statically-registered field descriptor tables.
//! - **Expressions** (`eav-expr`): the host-side predicate tree and the
//!   compiler that lowers it into the portable filter AST.
//! - **Schema** (`eav-schema`): scheme/structure metadata, synchronization
//!   diffing, and the metadata cache behind the schema catalog.
//! - **Store** (`eav-store`): generic value rows, the EAV transcoder,
//!   content hashing, hierarchy checks, identity batching, and the boundary
//!   traits every external collaborator implements.
//! - **Query** (`eav-query`): the fluent, clone-on-mutate query builder and
//!   its terminal operations.

#![forbid(unsafe_code)]

pub mod engine;

pub use engine::EavEngine;

pub use eav_expr::{
    computed, field, lit, ArrayOp, CompareOp, Direction, ExpressionCompiler, FilterExpr,
    LogicalOp, OrderingExpr, PredicateNode,
};
pub use eav_query::{ObjectQuery, QueryContext};
pub use eav_result::{Error, Result};
pub use eav_schema::{
    CacheConfig, MetadataCache, SchemaCatalog, Scheme, Structure, StructureChange,
};
pub use eav_store::{
    content_hash, validate_new_parent, AllowAll, EavValueMapper, IdentityCache,
    IdentityCacheConfig, ObjectRecord, PermissionOracle, RowExecutor, RowPlan, ValueRow,
};
pub use eav_types::{
    CorrelationId, FieldDescriptor, FieldValues, HostType, IdentitySource, ListId, ObjectId,
    RowId, SchemeId, StorageTypeTag, StructureId, TypeDescription, UserId, Value,
};
