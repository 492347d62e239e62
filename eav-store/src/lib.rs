//! Storage-facing core of the EAV engine.
//!
//! [`row`] defines the generic value row and its typed slots; [`mapper`]
//! transcodes between typed records and rows; [`hash`] fingerprints business
//! fields; [`hierarchy`] guards re-parenting against cycles; [`identity`]
//! batches identity allocation; [`traits`] holds the boundary contracts the
//! core consumes (row executor, permission oracle).

#![forbid(unsafe_code)]

pub mod hash;
pub mod hierarchy;
pub mod identity;
pub mod mapper;
pub mod record;
pub mod row;
pub mod traits;

pub use hash::content_hash;
pub use hierarchy::validate_new_parent;
pub use identity::{IdentityCache, IdentityCacheConfig};
pub use mapper::{EavValueMapper, RowPlan};
pub use record::ObjectRecord;
pub use row::ValueRow;
pub use traits::{AllowAll, PermissionOracle, RowExecutor};
