//! Removal of recovered nodes when statements recovery is off.
//!
//! Statements and expressions that only exist because the parser recovered
//! from an error are dropped from the lists they sit in. A declaration is
//! never dropped; it is flagged `MALFORMED` instead, as is the nearest
//! list member above a recovered node that cannot be detached.

use jbridge_dom::{Ast, AstFlags, AstId, Comment, NodeKind};
use rustc_hash::FxHashMap;
use tracing::debug;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PruneStats {
    pub removed: usize,
    pub malformed: usize,
}

pub fn prune_recovered(ast: &mut Ast, root: AstId, comments: &mut [Comment]) -> PruneStats {
    let mut stats = PruneStats::default();
    // Detached node -> parent it was removed from.
    let mut former_parent: FxHashMap<AstId, AstId> = FxHashMap::default();

    for id in ast.postorder(root) {
        let Some(node) = ast.get(id) else {
            continue;
        };
        if !node.is_recovered() || id == root {
            continue;
        }
        if node.kind.is_body_declaration() || node.kind.is_declaration() {
            ast.add_flags(id, AstFlags::MALFORMED);
            stats.malformed += 1;
            continue;
        }
        let parent = node.parent;
        if ast.remove_from_parent(id) {
            former_parent.insert(id, parent);
            stats.removed += 1;
            if is_empty_shell(ast, parent) {
                let grandparent = ast.parent(parent);
                if ast.remove_from_parent(parent) {
                    former_parent.insert(parent, grandparent);
                    stats.removed += 1;
                }
            }
            continue;
        }
        if let Some(holder) = ast.find_ancestor(id, |n| n.kind.is_statement() || n.kind.is_body_declaration()) {
            ast.add_flags(holder, AstFlags::MALFORMED);
            stats.malformed += 1;
        }
    }

    if !former_parent.is_empty() {
        for comment in comments.iter_mut() {
            comment.owner = attached_owner(ast, root, comment.owner, &former_parent);
        }
        debug!(removed = stats.removed, malformed = stats.malformed, "pruned recovered nodes");
    }
    stats
}

/// A variable or field declaration left without fragments.
fn is_empty_shell(ast: &Ast, id: AstId) -> bool {
    matches!(
        ast.kind(id),
        Some(
            NodeKind::VariableDeclarationStatement { fragments, .. }
                | NodeKind::VariableDeclarationExpression { fragments, .. }
                | NodeKind::FieldDeclaration { fragments, .. }
        ) if fragments.is_empty()
    )
}

/// `owner`, or the closest node still in the tree above it.
fn attached_owner(ast: &Ast, root: AstId, owner: AstId, former_parent: &FxHashMap<AstId, AstId>) -> AstId {
    let mut candidate = owner;
    'outer: loop {
        let mut current = candidate;
        while current != root {
            let parent = ast.parent(current);
            if parent.is_none() {
                match former_parent.get(&current) {
                    Some(&above) => {
                        candidate = above;
                        continue 'outer;
                    }
                    None => return root,
                }
            }
            current = parent;
        }
        return candidate;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use jbridge_dom::{AstNode, CommentKind};

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
    fn test_recovered_statement_is_removed_and_comment_rehomed() {
        let mut ast = Ast::new();
        let good_expr = name(&mut ast, "a", 2);
        let good = ast.add(AstNode::new(NodeKind::ExpressionStatement { expr: good_expr }, 2, 4));
        let bad_expr = name(&mut ast, "b", 6);
        let bad = ast.add(AstNode::new(NodeKind::ExpressionStatement { expr: bad_expr }, 6, 8));
        ast.add_flags(bad, AstFlags::RECOVERED);
        let block = ast.add(AstNode::new(
            NodeKind::Block {
                statements: vec![good, bad],
            },
            0,
            10,
        ));
        ast.link_parents(block);
        let mut comments = [Comment {
            kind: CommentKind::Line,
            start: 6,
            length: 2,
            owner: bad_expr,
        }];

        let stats = prune_recovered(&mut ast, block, &mut comments);
        assert_eq!(stats.removed, 1);
        assert!(matches!(ast.kind(block), Some(NodeKind::Block { statements }) if statements == &vec![good]));
        assert_eq!(comments[0].owner, block);
    }

    #[test]
    fn test_single_slot_marks_holder_malformed() {
        let mut ast = Ast::new();
        let missing = name(&mut ast, "$missing$", 3);
        ast.add_flags(missing, AstFlags::RECOVERED);
        let stmt = ast.add(AstNode::new(NodeKind::Return { expr: missing }, 0, 5));
        let block = ast.add(AstNode::new(NodeKind::Block { statements: vec![stmt] }, 0, 6));
        ast.link_parents(block);

        let stats = prune_recovered(&mut ast, block, &mut []);
        assert_eq!(stats.malformed, 1);
        assert!(ast.get(stmt).unwrap().flags.contains(AstFlags::MALFORMED));
    }
}
