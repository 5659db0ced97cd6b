use std::collections::HashMap;

use crate::Object;

/// Minimal set of index mutations implied by two object listings.
///
/// The three sets are pairwise disjoint by path: an object is added, updated
/// or removed, never more than one of these. Objects present in both listings
/// with an identical change marker appear in no set at all.
#[derive(Clone, Debug, Default)]
pub struct ObjectDiff {
    pub added: Vec<Object>,
    pub updated: Vec<Object>,
    pub removed: Vec<Object>,
}

impl ObjectDiff {
    /// Returns whether the two listings were equivalent, i.e. a rebuild would
    /// apply zero mutations.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Computes the diff between the last-synchronized snapshot and a fresh
/// listing.
///
/// Pure and deterministic: no I/O, O(n) keyed by object path. Callers are
/// expected to filter the fresh listing down to artifact packages before
/// diffing; this function compares whatever it is given.
pub fn diff(old: &[Object], new: &[Object]) -> ObjectDiff {
    let old_by_path: HashMap<&str, &Object> =
        old.iter().map(|object| (object.path(), object)).collect();
    let new_by_path: HashMap<&str, &Object> =
        new.iter().map(|object| (object.path(), object)).collect();

    let mut diff = ObjectDiff::default();

    for object in old {
        if !new_by_path.contains_key(object.path()) {
            diff.removed.push(object.clone());
        }
    }

    for object in new {
        match old_by_path.get(object.path()) {
            None => diff.added.push(object.clone()),
            // `same_content` reports false for ambiguous markers, so those
            // land in `updated` and get re-resolved.
            Some(previous) if !previous.same_content(object) => diff.updated.push(object.clone()),
            Some(_) => {}
        }
    }

    diff
}
