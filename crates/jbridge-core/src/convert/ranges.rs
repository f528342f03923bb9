use jbridge_dom::{Ast, AstId};

/// Widen every node so that its range covers the ranges of its children.
///
/// Front-end ranges can be narrower than the host expects (a declaration
/// whose annotations start before its recorded position, a recovered
/// statement whose end was never extended). Children are visited before
/// their parents, so one pass suffices.
pub fn repair_ranges(ast: &mut Ast, root: AstId) {
    for id in ast.postorder(root) {
        let Some((mut start, mut end)) = ast.range(id) else {
            continue;
        };
        let mut changed = false;
        for child in ast.children(id) {
            let Some((child_start, child_end)) = ast.range(child) else {
                continue;
            };
            if child_start < start {
                start = child_start;
                changed = true;
            }
            if child_end > end {
                end = child_end;
                changed = true;
            }
        }
        if changed {
            ast.set_range(id, start, end);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use jbridge_dom::{AstNode, NodeKind};

    use super::*;

    #[test]
    fn test_parent_covers_children() {
        let mut ast = Ast::new();
        let name = ast.add(AstNode::new(
            NodeKind::SimpleName {
                identifier: Arc::from("x"),
            },
            10,
            14,
        ));
        let expr = ast.add(AstNode::new(NodeKind::ExpressionStatement { expr: name }, 12, 13));
        let block = ast.add(AstNode::new(NodeKind::Block { statements: vec![expr] }, 11, 20));
        ast.link_parents(block);
        repair_ranges(&mut ast, block);
        assert_eq!(ast.range(expr), Some((10, 14)));
        assert_eq!(ast.range(block), Some((10, 20)));
    }
}
