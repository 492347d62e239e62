//! Hierarchy integrity checks.

use rustc_hash::FxHashSet;

use eav_result::{Error, Result};
use eav_types::ObjectId;

/// Validate that attaching `object` under `candidate` keeps the hierarchy
/// acyclic.
///
/// Walks the ancestor chain upward from the candidate using `parent_of`.
/// Reaching `object` itself means the move would close a cycle and is
/// rejected. Revisiting any ancestor means the stored chain is already
/// cyclic, which is reported as data corruption rather than a rejected
/// move. Detaching (`candidate == None`) is always valid.
pub fn validate_new_parent(
    object: ObjectId,
    candidate: Option<ObjectId>,
    parent_of: &dyn Fn(ObjectId) -> Result<Option<ObjectId>>,
) -> Result<()> {
    let mut cursor = match candidate {
        Some(id) => id,
        None => return Ok(()),
    };

    let mut visited = FxHashSet::default();
    loop {
        if cursor == object {
            return Err(Error::Cycle(format!(
                "re-parenting object {object} under {} would create a cycle",
                candidate.unwrap_or_default()
            )));
        }
        if !visited.insert(cursor) {
            return Err(Error::Corrupt(format!(
                "ancestor chain of object {cursor} already contains a cycle"
            )));
        }
        match parent_of(cursor)? {
            Some(next) => cursor = next,
            None => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    fn chain(edges: &[(ObjectId, ObjectId)]) -> FxHashMap<ObjectId, ObjectId> {
        edges.iter().copied().collect()
    }

    #[test]
    fn detaching_is_always_valid() {
        let lookup = |_id| Ok(None);
        assert!(validate_new_parent(1, None, &lookup).is_ok());
    }

    #[test]
    fn valid_move_walks_to_a_root() {
        // 3 -> 2 -> 1, moving 9 under 3 is fine.
        let parents = chain(&[(3, 2), (2, 1)]);
        let lookup = move |id| Ok(parents.get(&id).copied());
        assert!(validate_new_parent(9, Some(3), &lookup).is_ok());
    }

    #[test]
    fn move_under_own_descendant_is_a_cycle() {
        // 3 -> 2 -> 1; moving 1 under 3 would close the loop.
        let parents = chain(&[(3, 2), (2, 1)]);
        let lookup = move |id| Ok(parents.get(&id).copied());
        let err = validate_new_parent(1, Some(3), &lookup).unwrap_err();
        assert!(matches!(err, Error::Cycle(_)));
    }

    #[test]
    fn move_under_self_is_a_cycle() {
        let lookup = |_id| Ok(None);
        let err = validate_new_parent(5, Some(5), &lookup).unwrap_err();
        assert!(matches!(err, Error::Cycle(_)));
    }

    #[test]
    fn preexisting_loop_is_corruption() {
        // 2 -> 3 -> 2, a loop that does not touch the moved object.
        let parents = chain(&[(2, 3), (3, 2)]);
        let lookup = move |id| Ok(parents.get(&id).copied());
        let err = validate_new_parent(9, Some(2), &lookup).unwrap_err();
        assert!(matches!(err, Error::Corrupt(_)));
    }
}
