//! Identity source boundary contract.

use eav_result::Result;

/// External monotonic key source (a database sequence or equivalent).
///
/// Identities handed out must be monotonic and externally durable; the core
/// never generates persistent ids itself. Implementations may block.
pub trait IdentitySource: Send + Sync {
    /// Fetch the next single identity.
    fn next_id(&self) -> Result<i64>;

    /// Fetch a batch of identities in one round trip.
    fn next_ids(&self, count: usize) -> Result<Vec<i64>>;
}
