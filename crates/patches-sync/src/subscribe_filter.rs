//! The optional hierarchical subscription filter (§4.4.2): reduces the set
//! of tracked document ids down to the endpoints actually worth
//! subscribing to on the wire, so `users/u1/prefs` and `users/u1/stats`
//! collapse into a single `subscribe(["users/u1"])` call.

use std::collections::BTreeSet;

use patches_types::DocId;

/// `(tracked ids) -> (endpoints to subscribe)`. Called fresh against the
/// full tracked set every time tracking changes; the engine diffs the
/// result against what it's currently subscribed to.
pub trait SubscribeFilter: Send + Sync {
    fn endpoints(&self, tracked: &[DocId]) -> Vec<DocId>;
}

/// Reduces each id to its first `depth` `/`-separated path segments,
/// deduplicated. `"users/u1/prefs"` and `"users/u1/stats"` both reduce to
/// `"users/u1"` at `depth = 2`.
pub struct RootSegmentsFilter {
    depth: usize,
}

impl RootSegmentsFilter {
    pub fn new(depth: usize) -> Self {
        assert!(depth > 0, "depth must be at least 1");
        Self { depth }
    }
}

impl SubscribeFilter for RootSegmentsFilter {
    fn endpoints(&self, tracked: &[DocId]) -> Vec<DocId> {
        let mut roots = BTreeSet::new();
        for id in tracked {
            let root: String = id.as_str().split('/').take(self.depth).collect::<Vec<_>>().join("/");
            roots.insert(root);
        }
        roots.into_iter().map(DocId::new).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduces_subdocuments_to_shared_root() {
        let filter = RootSegmentsFilter::new(2);
        let tracked = vec![
            DocId::new("users/u1"),
            DocId::new("users/u1/prefs"),
            DocId::new("users/u1/stats"),
            DocId::new("users/u2/prefs"),
        ];
        let mut endpoints = filter.endpoints(&tracked);
        endpoints.sort();
        assert_eq!(endpoints, vec![DocId::new("users/u1"), DocId::new("users/u2")]);
    }

    #[test]
    #[should_panic(expected = "depth must be at least 1")]
    fn rejects_zero_depth() {
        RootSegmentsFilter::new(0);
    }
}
