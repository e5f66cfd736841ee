//! Breadcrumb-style external identifiers.
//!
//! Every exported node gets an identifier built by joining its ancestor
//! chain of local names with a single delimiter. The builder is pure:
//! re-deriving an identifier from the same parent id and local name must
//! be byte-identical, because records and edges are cross-referenced by
//! these strings only.

/// Synthetic anchor that parents the top-level node in the edge table.
/// It is never part of any derived identifier.
pub const ROOT_ANCHOR: &str = "$resource";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentBuilder {
    delimiter: char,
    fold_separators: bool,
}

impl IdentBuilder {
    /// `/`-delimited identifiers for the remote service-tree domain.
    pub fn service_tree() -> Self {
        Self {
            delimiter: '/',
            fold_separators: false,
        }
    }

    /// `~`-delimited identifiers for the static document domain. Path
    /// separators and spaces inside a local name are folded into the
    /// delimiter, keeping the breadcrumb shape of the import format.
    pub fn document() -> Self {
        Self {
            delimiter: '~',
            fold_separators: true,
        }
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Normalize one local name into an identifier segment.
    ///
    /// Literal `%` and delimiter characters are percent-escaped before any
    /// folding, so two distinct ancestor chains can never collapse into
    /// the same identifier.
    pub fn segment(&self, name: &str) -> String {
        let mut out = String::with_capacity(name.len());
        for ch in name.chars() {
            if ch == '%' {
                out.push_str("%25");
            } else if ch == self.delimiter {
                out.push_str(&format!("%{:02X}", ch as u32));
            } else if self.fold_separators && (ch == '/' || ch == ' ') {
                out.push(self.delimiter);
            } else {
                out.push(ch);
            }
        }
        out
    }

    /// Identifier of a top-level node: just its own segment.
    pub fn root(&self, name: &str) -> String {
        self.segment(name)
    }

    /// Identifier of a child node under an already-derived parent id.
    pub fn child(&self, parent_id: &str, name: &str) -> String {
        let mut out = String::with_capacity(parent_id.len() + name.len() + 1);
        out.push_str(parent_id);
        out.push(self.delimiter);
        out.push_str(&self.segment(name));
        out
    }
}
