//! Node arena for parse tree storage.

use jbridge_common::CommentRange;
use rustc_hash::FxHashMap;
use serde::Serialize;

use super::node::{Node, NodeData, NodeFlags, NodeIndex};

/// Arena-based storage for parse tree nodes.
/// Nodes are stored contiguously and referenced by index.
#[derive(Clone, Debug, Default, Serialize)]
pub struct NodeArena {
    pub nodes: Vec<Node>,
    /// Doc comment attached to a declaration node.
    #[serde(skip)]
    docs: FxHashMap<NodeIndex, CommentRange>,
}

impl NodeArena {
    pub fn new() -> NodeArena {
        NodeArena::default()
    }

    /// Add a node to the arena and return its index
    pub fn add(&mut self, pos: u32, end: u32, data: NodeData) -> NodeIndex {
        let index = self.nodes.len() as u32;
        self.nodes.push(Node::new(pos, end, data));
        NodeIndex(index)
    }

    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        if index.is_none() {
            None
        } else {
            self.nodes.get(index.0 as usize)
        }
    }

    pub fn get_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        if index.is_none() {
            None
        } else {
            self.nodes.get_mut(index.0 as usize)
        }
    }

    pub fn data(&self, index: NodeIndex) -> Option<&NodeData> {
        self.get(index).map(|n| &n.data)
    }

    pub fn flags(&self, index: NodeIndex) -> NodeFlags {
        self.get(index).map(|n| n.flags).unwrap_or_default()
    }

    pub fn add_flags(&mut self, index: NodeIndex, flags: NodeFlags) {
        if let Some(node) = self.get_mut(index) {
            node.flags |= flags;
        }
    }

    pub fn set_end(&mut self, index: NodeIndex, end: u32) {
        if let Some(node) = self.get_mut(index) {
            node.end = end;
        }
    }

    pub fn pos_end(&self, index: NodeIndex) -> Option<(u32, u32)> {
        self.get(index).map(|n| (n.pos, n.end))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn set_doc_comment(&mut self, index: NodeIndex, comment: CommentRange) {
        self.docs.insert(index, comment);
    }

    pub fn doc_comment(&self, index: NodeIndex) -> Option<&CommentRange> {
        self.docs.get(&index)
    }

    pub fn remove_doc_comment(&mut self, index: NodeIndex) -> Option<CommentRange> {
        self.docs.remove(&index)
    }

    /// Every declaration that carries a doc comment, in source order.
    pub fn doc_comments(&self) -> Vec<(NodeIndex, &CommentRange)> {
        let mut out: Vec<_> = self.docs.iter().map(|(idx, c)| (*idx, c)).collect();
        out.sort_by_key(|(_, c)| c.pos);
        out
    }

    pub fn children(&self, index: NodeIndex) -> Vec<NodeIndex> {
        self.get(index)
            .map(|n| n.children().into_vec())
            .unwrap_or_default()
    }

    /// Fill in parent links for the subtree rooted at `root`.
    pub fn link_parents(&mut self, root: NodeIndex) {
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            let children = self.children(idx);
            for child in children {
                if let Some(node) = self.get_mut(child) {
                    node.parent = idx;
                }
                stack.push(child);
            }
        }
    }

    pub fn parent(&self, index: NodeIndex) -> NodeIndex {
        self.get(index).map_or(NodeIndex::NONE, |n| n.parent)
    }

    /// Nodes of the subtree rooted at `root`, parents before children.
    pub fn preorder(&self, root: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            if self.get(idx).is_none() {
                continue;
            }
            out.push(idx);
            let children = self.children(idx);
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Nearest ancestor (excluding `index`) satisfying `pred`.
    pub fn find_ancestor(
        &self,
        index: NodeIndex,
        mut pred: impl FnMut(&Node) -> bool,
    ) -> Option<NodeIndex> {
        let mut current = self.parent(index);
        while let Some(node) = self.get(current) {
            if pred(node) {
                return Some(current);
            }
            current = node.parent;
        }
        None
    }

    /// Innermost node whose range contains `offset`.
    pub fn node_at(&self, root: NodeIndex, offset: u32) -> NodeIndex {
        let mut current = root;
        loop {
            let next = self
                .children(current)
                .into_iter()
                .find(|c| self.get(*c).is_some_and(|n| n.pos <= offset && offset < n.end));
            match next {
                Some(child) => current = child,
                None => return current,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jbridge_common::{Atom, CommentStyle};

    #[test]
    fn test_link_parents_and_preorder() {
        let mut arena = NodeArena::new();
        let a = arena.add(4, 5, NodeData::Ident { name: Atom(1) });
        let b = arena.add(8, 9, NodeData::Ident { name: Atom(2) });
        let bin = arena.add(
            4,
            9,
            NodeData::Binary {
                op: jbridge_scanner::SyntaxKind::Plus,
                left: a,
                right: b,
            },
        );
        let stmt = arena.add(4, 10, NodeData::ExprStatement { expr: bin });
        arena.link_parents(stmt);

        assert_eq!(arena.parent(a), bin);
        assert_eq!(arena.parent(bin), stmt);
        assert_eq!(arena.preorder(stmt), vec![stmt, bin, a, b]);
        assert_eq!(arena.node_at(stmt, 8), b);
        assert_eq!(
            arena.find_ancestor(a, |n| matches!(n.data, NodeData::ExprStatement { .. })),
            Some(stmt)
        );
    }

    #[test]
    fn test_doc_comments_sorted() {
        let mut arena = NodeArena::new();
        let x = arena.add(20, 30, NodeData::Empty);
        let y = arena.add(0, 10, NodeData::Empty);
        arena.set_doc_comment(x, CommentRange::new(12, 19, CommentStyle::DocBlock, true));
        arena.set_doc_comment(y, CommentRange::new(0, 5, CommentStyle::DocBlock, true));
        let docs = arena.doc_comments();
        assert_eq!(docs[0].0, y);
        assert_eq!(docs[1].0, x);
    }
}
