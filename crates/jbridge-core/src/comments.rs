//! Comment attachment for converted units.

use jbridge_common::CommentRange;
use jbridge_common::comments::get_comment_ranges;
use jbridge_dom::{Ast, AstId, Comment};
use jbridge_parser::{NodeIndex, ParsedUnit};
use rustc_hash::FxHashMap;

use crate::convert::Converted;

/// Comments of `tree` with their owners in `converted`.
///
/// A doc comment the parser attached to a declaration is owned by that
/// declaration's host node. Any other doc comment goes to the next body
/// declaration in the innermost enclosing node. Remaining comments are
/// owned by the innermost node enclosing them, or by the root.
pub fn attach_comments(tree: &ParsedUnit, converted: &Converted) -> Vec<Comment> {
    let documented: FxHashMap<u32, NodeIndex> = tree
        .arena
        .doc_comments()
        .into_iter()
        .map(|(decl, range)| (range.pos, decl))
        .collect();

    get_comment_ranges(&tree.source)
        .iter()
        .map(|range| {
            let owner = if range.style.is_doc() {
                documented
                    .get(&range.pos)
                    .and_then(|decl| converted.declarations.get(decl).copied())
                    .or_else(|| next_declaration(&converted.ast, converted.root, range))
            } else {
                None
            };
            let owner = owner.unwrap_or_else(|| enclosing(&converted.ast, converted.root, range));
            Comment::from_range(range, owner)
        })
        .collect()
}

/// Innermost node whose range covers all of `range`.
fn enclosing(ast: &Ast, root: AstId, range: &CommentRange) -> AstId {
    let mut current = ast.node_at(root, range.pos);
    while current != root {
        match ast.range(current) {
            Some((start, end)) if start <= range.pos && range.end <= end => return current,
            Some(_) => current = ast.parent(current),
            None => return root,
        }
    }
    root
}

fn next_declaration(ast: &Ast, root: AstId, range: &CommentRange) -> Option<AstId> {
    let scope = enclosing(ast, root, range);
    let mut scopes = vec![scope];
    // Type bodies hang off their declaration; look one level further down.
    scopes.extend(ast.children(scope));
    scopes
        .into_iter()
        .flat_map(|s| ast.children(s))
        .filter(|&c| {
            ast.get(c)
                .is_some_and(|n| (n.kind.is_body_declaration() || n.kind.is_declaration()) && n.start >= range.end)
        })
        .min_by_key(|&c| ast.get(c).map_or(u32::MAX, |n| n.start))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use jbridge_binder::UnitId;
    use jbridge_common::NameTable;
    use jbridge_dom::{CommentKind, NodeKind};
    use jbridge_parser::{ParseOptions, parse_unit};

    use super::*;
    use crate::convert::convert_tree;

    #[test]
    fn test_doc_comment_owned_by_declaration() {
        let source = "class A {\n  // note\n  /** Docs. */\n  void m() { int x; /* inner */ }\n}\n";
        let tree = parse_unit(Arc::from(source), NameTable::shared(), ParseOptions::default());
        let converted = convert_tree(&tree, UnitId(0)).unwrap();
        let comments = attach_comments(&tree, &converted);
        assert_eq!(comments.len(), 3);

        let doc = comments.iter().find(|c| c.kind == CommentKind::Javadoc).unwrap();
        assert!(matches!(
            converted.ast.kind(doc.owner),
            Some(NodeKind::MethodDeclaration { .. })
        ));
        let inner = comments.iter().find(|c| c.text(source) == "/* inner */").unwrap();
        assert!(matches!(converted.ast.kind(inner.owner), Some(NodeKind::Block { .. })));
    }
}
