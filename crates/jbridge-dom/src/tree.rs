//! Arena storage for the host AST.

use std::fmt::Write as _;

use serde::Serialize;

use crate::node::{AstChildren, AstFlags, AstId, AstNode, NodeKind};

/// Host AST nodes, stored contiguously and referenced by [`AstId`].
#[derive(Clone, Debug, Default, Serialize)]
pub struct Ast {
    nodes: Vec<AstNode>,
}

impl Ast {
    pub fn new() -> Ast {
        Ast::default()
    }

    pub fn add(&mut self, node: AstNode) -> AstId {
        let id = AstId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: AstId) -> Option<&AstNode> {
        if id.is_none() {
            None
        } else {
            self.nodes.get(id.0 as usize)
        }
    }

    pub fn get_mut(&mut self, id: AstId) -> Option<&mut AstNode> {
        if id.is_none() {
            None
        } else {
            self.nodes.get_mut(id.0 as usize)
        }
    }

    pub fn kind(&self, id: AstId) -> Option<&NodeKind> {
        self.get(id).map(|n| &n.kind)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn children(&self, id: AstId) -> AstChildren {
        self.get(id).map(|n| n.kind.children()).unwrap_or_default()
    }

    pub fn parent(&self, id: AstId) -> AstId {
        self.get(id).map_or(AstId::NONE, |n| n.parent)
    }

    /// `[start, end)` of a node.
    pub fn range(&self, id: AstId) -> Option<(u32, u32)> {
        self.get(id).map(|n| (n.start, n.end()))
    }

    pub fn set_range(&mut self, id: AstId, start: u32, end: u32) {
        if let Some(node) = self.get_mut(id) {
            node.start = start;
            node.length = end.saturating_sub(start);
        }
    }

    pub fn add_flags(&mut self, id: AstId, flags: AstFlags) {
        if let Some(node) = self.get_mut(id) {
            node.flags |= flags;
        }
    }

    /// Fill in parent links for the subtree rooted at `root`.
    pub fn link_parents(&mut self, root: AstId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            for child in self.children(id) {
                if let Some(node) = self.get_mut(child) {
                    node.parent = id;
                }
                stack.push(child);
            }
        }
    }

    /// Nodes of the subtree rooted at `root`, parents before children.
    pub fn preorder(&self, root: AstId) -> Vec<AstId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if self.get(id).is_none() {
                continue;
            }
            out.push(id);
            stack.extend(self.children(id).into_iter().rev());
        }
        out
    }

    /// Nodes of the subtree rooted at `root`, children before parents.
    pub fn postorder(&self, root: AstId) -> Vec<AstId> {
        let mut out = self.preorder(root);
        out.reverse();
        out
    }

    /// Nearest ancestor (excluding `id`) satisfying `pred`.
    pub fn find_ancestor(&self, id: AstId, mut pred: impl FnMut(&AstNode) -> bool) -> Option<AstId> {
        let mut current = self.parent(id);
        while let Some(node) = self.get(current) {
            if pred(node) {
                return Some(current);
            }
            current = node.parent;
        }
        None
    }

    /// Innermost node whose range contains `offset`.
    pub fn node_at(&self, root: AstId, offset: u32) -> AstId {
        let mut current = root;
        loop {
            let next = self
                .children(current)
                .into_iter()
                .find(|c| self.get(*c).is_some_and(|n| n.contains(offset)));
            match next {
                Some(child) => current = child,
                None => return current,
            }
        }
    }

    /// Detach `id` from its parent's child lists. Returns false when the
    /// node sits in a single-valued slot of its parent.
    pub fn remove_from_parent(&mut self, id: AstId) -> bool {
        let parent = self.parent(id);
        let Some(parent_node) = self.get_mut(parent) else {
            return false;
        };
        let mut removed = false;
        for list in parent_node.kind.child_lists_mut() {
            if let Some(pos) = list.iter().position(|c| *c == id) {
                list.remove(pos);
                removed = true;
                break;
            }
        }
        if removed {
            if let Some(node) = self.get_mut(id) {
                node.parent = AstId::NONE;
            }
        }
        removed
    }

    /// Indented outline of the subtree rooted at `root`, one node per line.
    pub fn outline(&self, root: AstId) -> String {
        let mut out = String::new();
        let mut stack = vec![(root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            let _ = write!(
                out,
                "{:indent$}{} [{}, {}]",
                "",
                node.kind.kind_name(),
                node.start,
                node.length,
                indent = depth * 2
            );
            match &node.kind {
                NodeKind::SimpleName { identifier } => {
                    let _ = write!(out, " {identifier}");
                }
                NodeKind::Modifier { keyword } | NodeKind::PrimitiveType { keyword } => {
                    let _ = write!(out, " {keyword}");
                }
                NodeKind::Infix { op, .. }
                | NodeKind::Prefix { op, .. }
                | NodeKind::Postfix { op, .. }
                | NodeKind::Assignment { op, .. } => {
                    let _ = write!(out, " {op}");
                }
                NodeKind::NumberLiteral { token: text }
                | NodeKind::StringLiteral { escaped: text }
                | NodeKind::CharacterLiteral { escaped: text } => {
                    let _ = write!(out, " {text}");
                }
                _ => {}
            }
            if node.flags.contains(AstFlags::RECOVERED) {
                out.push_str(" (recovered)");
            }
            if node.flags.contains(AstFlags::MALFORMED) {
                out.push_str(" (malformed)");
            }
            out.push('\n');
            for child in self.children(id).into_iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn name(ast: &mut Ast, text: &str, start: u32) -> AstId {
        ast.add(AstNode::new(
            NodeKind::SimpleName {
                identifier: Arc::from(text),
            },
            start,
            start + text.len() as u32,
        ))
    }

    #[test]
    fn test_node_at_and_outline() {
        let mut ast = Ast::new();
        let left = name(&mut ast, "a", 0);
        let right = name(&mut ast, "b", 4);
        let infix = ast.add(AstNode::new(NodeKind::Infix { op: "+", left, right }, 0, 5));
        let stmt = ast.add(AstNode::new(NodeKind::ExpressionStatement { expr: infix }, 0, 6));
        ast.link_parents(stmt);

        assert_eq!(ast.parent(left), infix);
        assert_eq!(ast.node_at(stmt, 4), right);
        assert_eq!(ast.node_at(stmt, 5), stmt);
        assert_eq!(ast.postorder(stmt), vec![right, left, infix, stmt]);
        assert_eq!(
            ast.outline(stmt),
            "ExpressionStatement [0, 6]\n  Infix [0, 5] +\n    SimpleName [0, 1] a\n    SimpleName [4, 1] b\n"
        );
    }

    #[test]
    fn test_remove_from_list_but_not_from_slot() {
        let mut ast = Ast::new();
        let first = ast.add(AstNode::new(NodeKind::Empty, 1, 2));
        let second = ast.add(AstNode::new(NodeKind::Empty, 2, 3));
        let block = ast.add(AstNode::new(
            NodeKind::Block {
                statements: vec![first, second],
            },
            0,
            4,
        ));
        let cond = name(&mut ast, "c", 10);
        let stmt = ast.add(AstNode::new(
            NodeKind::While {
                condition: cond,
                body: block,
            },
            5,
            20,
        ));
        ast.link_parents(stmt);

        assert!(ast.remove_from_parent(first));
        assert_eq!(ast.children(block).as_slice(), &[second]);
        assert!(ast.parent(first).is_none());
        assert!(!ast.remove_from_parent(cond));
        assert_eq!(ast.parent(cond), stmt);
    }
}
