//! Generic depth-first catalog traversal.
//!
//! One walker serves both source domains. Everything domain-specific -
//! table schemas, child discovery, association labels, the node filter -
//! lives behind [`SchemaStrategy`]; the walker only owns traversal order,
//! identifier derivation, the scan-limit counter and the uniqueness
//! guarantee.

use crate::error::Result;
use lodestone_core::ident::{IdentBuilder, ROOT_ANCHOR};
use lodestone_core::link::{DedupPolicy, LinkCollector};
use lodestone_core::record::{RecordCollector, RecordRow, TableSpec};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Callback for reporting traversal progress
pub type ProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// A node resolved by a strategy: everything the walker needs to emit its
/// record, its edge back to the parent, and its children.
///
/// `segment` is the raw local name used for identifier derivation and may
/// differ from the display `name` (a layer's id segment is its numeric id,
/// its name column is the human title).
pub struct OpenNode<N> {
    pub kind: &'static str,
    pub segment: String,
    pub name: String,
    pub description: String,
    pub extras: Vec<String>,
    pub association: String,
    pub children: Vec<N>,
}

/// Per-domain schema strategy: column lists, child-collection accessors
/// and association-label rules, configured once per source domain.
pub trait SchemaStrategy {
    type Node;

    /// Record tables this domain produces, in output order.
    fn tables(&self) -> Vec<TableSpec>;

    /// Duplicate handling for the edge table.
    fn link_policy(&self) -> DedupPolicy;

    fn ident(&self) -> IdentBuilder;

    /// Produce the root node. May fetch or read the entry document.
    fn root(&mut self) -> Result<Self::Node>;

    /// Node kind filter. Nodes that fail it are skipped entirely: no
    /// record, no edge, no recursion.
    fn included(&self, _node: &Self::Node) -> bool {
        true
    }

    /// Whether a node counts against the cumulative scan limit.
    fn scan_limited(&self, _node: &Self::Node) -> bool {
        false
    }

    /// Resolve a node into its record data and children. May fetch.
    fn open(&mut self, node: Self::Node) -> Result<OpenNode<Self::Node>>;
}

#[derive(Debug, Clone, Copy)]
pub struct WalkOutcome {
    /// Scan-limited nodes actually expanded.
    pub scanned: usize,
    pub limit_hit: bool,
}

/// Traversal state threaded through the recursion instead of living on a
/// long-lived object: the running scan count and the issued-id set.
struct WalkContext {
    ident: IdentBuilder,
    seen: HashSet<String>,
    scanned: usize,
    limit: usize,
    limit_hit: bool,
}

pub struct TreeWalker<S: SchemaStrategy> {
    strategy: S,
    limit: usize,
    progress_callback: Option<ProgressCallback>,
}

impl<S: SchemaStrategy> TreeWalker<S> {
    pub fn new(strategy: S) -> Self {
        Self {
            strategy,
            limit: usize::MAX,
            progress_callback: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Walk the whole source depth-first, children in source order, and
    /// fill the collectors. A fatal error propagates immediately; the
    /// collectors keep whatever was emitted before it.
    pub fn walk(
        &mut self,
        records: &mut RecordCollector,
        links: &mut LinkCollector,
    ) -> Result<WalkOutcome> {
        let mut ctx = WalkContext {
            ident: self.strategy.ident(),
            seen: HashSet::new(),
            scanned: 0,
            limit: self.limit,
            limit_hit: false,
        };

        let root = self.strategy.root()?;
        self.visit(root, None, records, links, &mut ctx)?;

        Ok(WalkOutcome {
            scanned: ctx.scanned,
            limit_hit: ctx.limit_hit,
        })
    }

    fn visit(
        &mut self,
        node: S::Node,
        parent_id: Option<&str>,
        records: &mut RecordCollector,
        links: &mut LinkCollector,
        ctx: &mut WalkContext,
    ) -> Result<()> {
        if !self.strategy.included(&node) {
            debug!("node kind not in allow-list, skipping");
            return Ok(());
        }

        if self.strategy.scan_limited(&node) {
            if ctx.scanned >= ctx.limit {
                if !ctx.limit_hit {
                    warn!("scan limit of {} reached, skipping further nodes", ctx.limit);
                    ctx.limit_hit = true;
                }
                return Ok(());
            }
            ctx.scanned += 1;
        }

        let opened = self.strategy.open(node)?;

        let id = match parent_id {
            None => ctx.ident.root(&opened.segment),
            Some(parent) => ctx.ident.child(parent, &opened.segment),
        };

        // Identical ancestor chains describe the same logical node; the
        // first visit wins and later derivations are dropped. Document-mode
        // separator folding can also land two sibling names here, so the
        // drop is loud.
        if !ctx.seen.insert(id.clone()) {
            warn!("identifier {} already issued, dropping {}", id, opened.name);
            return Ok(());
        }

        if let Some(ref callback) = self.progress_callback {
            callback(format!("{}: {}", opened.kind, id));
        }

        records.add(
            opened.kind,
            RecordRow {
                external_id: id.clone(),
                name: opened.name,
                description: opened.description,
                extras: opened.extras,
            },
        )?;

        let source = parent_id.unwrap_or(ROOT_ANCHOR);
        links.add(source, &id, &opened.association);

        for child in opened.children {
            self.visit(child, Some(&id), records, links, ctx)?;
        }
        Ok(())
    }
}
