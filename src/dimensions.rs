//! Dimensions and the deterministic group-ID they derive.

use fnv::FnvHasher;
use smallvec::SmallVec;
use std::hash::{Hash, Hasher};

use crate::value::Tags;

/// The tag-name restriction that governs a series' group-ID.
///
/// `tag_names` is always kept sorted lexicographically; every constructor
/// and mutator in this crate re-sorts on the way in so that group-ID
/// computation never has to special-case an unsorted list.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Dimensions {
    pub tag_names: SmallVec<[String; 4]>,
    pub by_name: bool,
}

impl Dimensions {
    pub fn new(mut tag_names: Vec<String>, by_name: bool) -> Self {
        tag_names.sort();
        Dimensions {
            tag_names: tag_names.into(),
            by_name,
        }
    }
}

/// A deterministic hash of (name, tags restricted to dimensions, by_name)
/// identifying a logical series within a node.
///
/// Two points compute the same `GroupId` iff they have the same `name`, the
/// same values for every tag named in `dimensions.tag_names`, and the same
/// `by_name` flag — tags *not* named in `dimensions` never affect the hash
/// (invariant 5 in spec.md §8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub u64);

/// Compute the group-ID for `name`/`tags` under `dimensions`.
///
/// Every node that mutates tags or dimensions must call this again before
/// emitting (spec.md §3 invariants) — `GroupId` is never updated in place.
pub fn group_id(name: &str, tags: &Tags, dimensions: &Dimensions) -> GroupId {
    let mut hasher = FnvHasher::default();
    name.hash(&mut hasher);
    for tag_name in &dimensions.tag_names {
        tag_name.hash(&mut hasher);
        if let Some(value) = tags.get(tag_name.as_str()) {
            value.hash(&mut hasher);
        }
    }
    // `by_name` folds `name` into the walk a second time, mirroring the
    // original's treatment of "by measurement" as a virtual extra dimension.
    dimensions.by_name.hash(&mut hasher);
    if dimensions.by_name {
        name.hash(&mut hasher);
    }
    GroupId(hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn group_id_ignores_unrelated_tags() {
        let dims = Dimensions::new(vec!["host".into()], false);
        let a = group_id(
            "cpu",
            &tags(&[("host", "a"), ("region", "us")]),
            &dims,
        );
        let b = group_id(
            "cpu",
            &tags(&[("host", "a"), ("region", "eu")]),
            &dims,
        );
        assert_eq!(a, b, "tags outside dimensions must not affect the group id");
    }

    #[test]
    fn group_id_changes_with_restricted_tag() {
        let dims = Dimensions::new(vec!["host".into()], false);
        let a = group_id("cpu", &tags(&[("host", "a")]), &dims);
        let b = group_id("cpu", &tags(&[("host", "b")]), &dims);
        assert_ne!(a, b);
    }

    #[test]
    fn group_id_independent_of_tag_insertion_order() {
        let dims = Dimensions::new(vec!["a".into(), "b".into()], false);
        let t1 = tags(&[("a", "1"), ("b", "2")]);
        let t2 = tags(&[("b", "2"), ("a", "1")]);
        assert_eq!(group_id("m", &t1, &dims), group_id("m", &t2, &dims));
    }
}
