//! Content fingerprinting over business fields.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use eav_types::FieldValues;

/// Compute the deterministic content fingerprint of a record's business
/// fields.
///
/// Returns `None` when the record carries zero business fields. Otherwise
/// field names are taken in lexicographic (ordinal) order (`FieldValues`
/// is a `BTreeMap`, so declaration order never leaks in), concatenated as
/// `name=value` pairs with a stable separator, digested with SHA-256, and
/// truncated to 128 bits.
///
/// The hash covers only business fields, never identity, parent, owner, or
/// timestamp metadata: two records with identical business data but
/// different lineage hash identically. It is a change-detection/dedup key,
/// not an identity.
pub fn content_hash(fields: &FieldValues) -> Option<Uuid> {
    if fields.is_empty() {
        return None;
    }

    let joined: Vec<String> = fields
        .iter()
        .map(|(name, value)| format!("{}={}", name, value.stringify()))
        .collect();
    let digest = Sha256::digest(joined.join("|").as_bytes());

    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Some(Uuid::from_bytes(bytes))
}
