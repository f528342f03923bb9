//! Parse tree rewrites applied before analysis.
//!
//! Both rewrites empty method bodies in place: the body block keeps its
//! range and stays in the tree with no statements, flagged `BODY_BLANKED`.
//! Declarations outside method bodies are never touched.

use jbridge_parser::{NodeData, NodeFlags, NodeIndex, ParsedUnit};
use tracing::trace;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrimStats {
    pub bodies: usize,
    pub doc_comments: usize,
}

/// Blank the body of every method whose declaration does not contain
/// `focal` and drop every doc comment that does not contain it. Both ends
/// of a range count as inside.
pub fn trim_to_focal_point(tree: &mut ParsedUnit, focal: u32) -> TrimStats {
    let mut stats = TrimStats::default();
    for (method, body) in methods_with_bodies(tree) {
        let contains = tree
            .arena
            .pos_end(method)
            .is_some_and(|(pos, end)| pos <= focal && focal <= end);
        if !contains && blank_body(tree, body) {
            stats.bodies += 1;
        }
    }

    let stale: Vec<NodeIndex> = tree
        .arena
        .doc_comments()
        .into_iter()
        .filter(|(_, range)| !(range.pos <= focal && focal <= range.end))
        .map(|(decl, _)| decl)
        .collect();
    for decl in stale {
        if tree.arena.remove_doc_comment(decl).is_some() {
            stats.doc_comments += 1;
        }
    }
    trace!(focal, bodies = stats.bodies, doc_comments = stats.doc_comments, "trimmed");
    stats
}

/// Empty every method body.
pub fn blank_method_bodies(tree: &mut ParsedUnit) -> usize {
    methods_with_bodies(tree)
        .into_iter()
        .filter(|&(_, body)| blank_body(tree, body))
        .count()
}

fn methods_with_bodies(tree: &ParsedUnit) -> Vec<(NodeIndex, NodeIndex)> {
    tree.arena
        .preorder(tree.root)
        .into_iter()
        .filter_map(|idx| match tree.arena.data(idx) {
            Some(NodeData::MethodDecl { body, .. }) if body.is_some() => Some((idx, *body)),
            _ => None,
        })
        .collect()
}

fn blank_body(tree: &mut ParsedUnit, body: NodeIndex) -> bool {
    let Some(node) = tree.arena.get_mut(body) else {
        return false;
    };
    let NodeData::Block { statements, .. } = &mut node.data else {
        return false;
    };
    if statements.is_empty() && node.flags.contains(NodeFlags::BODY_BLANKED) {
        return false;
    }
    statements.clear();
    node.flags |= NodeFlags::BODY_BLANKED;
    true
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use jbridge_common::NameTable;
    use jbridge_parser::{ParseOptions, parse_unit};

    use super::*;

    const SOURCE: &str = "class A {\n  /** a */\n  void a() { int x = 1; }\n  /** b */\n  void b() { int y = 2; }\n}\n";

    fn parse(source: &str) -> ParsedUnit {
        parse_unit(Arc::from(source), NameTable::shared(), ParseOptions::default())
    }

    fn body_len(tree: &ParsedUnit, name: &str) -> usize {
        tree.arena
            .preorder(tree.root)
            .into_iter()
            .find_map(|idx| match tree.arena.data(idx) {
                Some(NodeData::MethodDecl { name: n, body, .. }) if tree.name_text(*n).as_ref() == name => {
                    match tree.arena.data(*body) {
                        Some(NodeData::Block { statements, .. }) => Some(statements.len()),
                        _ => None,
                    }
                }
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_focal_body_is_kept() {
        let mut tree = parse(SOURCE);
        let focal = SOURCE.find("y = 2").unwrap() as u32;
        let stats = trim_to_focal_point(&mut tree, focal);
        assert_eq!(stats.bodies, 1);
        assert_eq!(stats.doc_comments, 2);
        assert_eq!(body_len(&tree, "a"), 0);
        assert_eq!(body_len(&tree, "b"), 1);
    }

    #[test]
    fn test_focal_on_method_name_keeps_its_body() {
        let mut tree = parse(SOURCE);
        let focal = SOURCE.find("b()").unwrap() as u32;
        let stats = trim_to_focal_point(&mut tree, focal);
        assert_eq!(stats.bodies, 1);
        assert_eq!(body_len(&tree, "a"), 0);
        assert_eq!(body_len(&tree, "b"), 1);
    }

    #[test]
    fn test_focal_just_after_method_keeps_its_body() {
        let mut tree = parse(SOURCE);
        let focal = SOURCE.find("2; }").unwrap() as u32 + 4;
        trim_to_focal_point(&mut tree, focal);
        assert_eq!(body_len(&tree, "b"), 1);
    }

    #[test]
    fn test_blank_all_bodies() {
        let mut tree = parse(SOURCE);
        assert_eq!(blank_method_bodies(&mut tree), 2);
        assert_eq!(blank_method_bodies(&mut tree), 0);
        assert_eq!(body_len(&tree, "b"), 0);
    }
}
