//! Parent-child edge accumulator.

use std::collections::HashSet;

/// Duplicate handling for candidate edges.
///
/// `AllowDuplicates` is for sources that are strict trees: every
/// (source, target) pair is structurally visited once, so checking is
/// wasted work. `DedupExact` is for documents where the same relationship
/// is derived from more than one pass over the source; candidates are
/// checked against a running exact-tuple set before insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupPolicy {
    AllowDuplicates,
    DedupExact,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub association: String,
}

#[derive(Debug)]
pub struct LinkCollector {
    policy: DedupPolicy,
    rows: Vec<Edge>,
    seen: HashSet<Edge>,
}

impl LinkCollector {
    pub fn new(policy: DedupPolicy) -> Self {
        Self {
            policy,
            rows: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn policy(&self) -> DedupPolicy {
        self.policy
    }

    /// Append one edge row. Returns whether the edge was kept.
    pub fn add(&mut self, source: &str, target: &str, association: &str) -> bool {
        let edge = Edge {
            source: source.to_string(),
            target: target.to_string(),
            association: association.to_string(),
        };

        if self.policy == DedupPolicy::DedupExact {
            if self.seen.contains(&edge) {
                return false;
            }
            self.seen.insert(edge.clone());
        }

        self.rows.push(edge);
        true
    }

    pub fn rows(&self) -> &[Edge] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
