//! `@SuppressWarnings` handling.
//!
//! Every declaration annotated with `@SuppressWarnings` opens a scope over
//! its range. A suppressible problem inside a scope carrying its token is
//! dropped and the innermost such scope records the token as used. A
//! token that suppressed nothing is itself reported as unnecessary, but
//! only for categories that were actually checked.

use jbridge_common::Severity;
use jbridge_dom::{AstId, CompilationUnit, NodeKind, Problem, ProblemFactory, ProblemId};
use rustc_hash::FxHashSet;

const SUPPRESS_WARNINGS: &str = "SuppressWarnings";
const ALL_TOKEN: &str = "all";

#[derive(Debug)]
struct Token {
    text: String,
    start: u32,
    end: u32,
    used: bool,
}

#[derive(Debug)]
struct Scope {
    start: u32,
    end: u32,
    tokens: Vec<Token>,
}

#[derive(Debug, Default)]
pub struct Suppressions {
    scopes: Vec<Scope>,
}

impl Suppressions {
    /// Collect the suppression scopes of `unit`.
    pub fn collect(unit: &CompilationUnit) -> Self {
        let ast = &unit.ast;
        let mut scopes = Vec::new();
        for id in ast.preorder(unit.root) {
            let Some(NodeKind::Annotation { type_name, values, .. }) = ast.kind(id) else {
                continue;
            };
            let name = unit.name_text(*type_name);
            if name.rsplit('.').next() != Some(SUPPRESS_WARNINGS) {
                continue;
            }
            let Some((start, end)) = ast.range(ast.parent(id)) else {
                continue;
            };
            let mut tokens = Vec::new();
            for &value in values {
                let value = match ast.kind(value) {
                    Some(NodeKind::MemberValuePair { name, value }) if unit.name_text(*name) == "value" => *value,
                    Some(NodeKind::MemberValuePair { .. }) => continue,
                    _ => value,
                };
                collect_tokens(unit, value, &mut tokens);
            }
            if !tokens.is_empty() {
                scopes.push(Scope { start, end, tokens });
            }
        }
        // Innermost scopes first.
        scopes.sort_by_key(|s| s.end - s.start);
        Suppressions { scopes }
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Whether `problem` is suppressed. Marks the suppressing token used.
    pub fn suppresses(&mut self, problem: &Problem) -> bool {
        if problem.severity == Severity::Error {
            return false;
        }
        let Some(token) = problem.id.suppress_token() else {
            return false;
        };
        for scope in &mut self.scopes {
            if problem.start < scope.start || problem.start >= scope.end {
                continue;
            }
            if let Some(t) = scope
                .tokens
                .iter_mut()
                .find(|t| t.text == token || t.text == ALL_TOKEN)
            {
                t.used = true;
                return true;
            }
        }
        false
    }

    /// Drop suppressed problems from `problems`.
    pub fn filter(&mut self, problems: Vec<Problem>) -> Vec<Problem> {
        problems.into_iter().filter(|p| !self.suppresses(p)).collect()
    }

    /// Problems for tokens that suppressed nothing. `checked` lists the
    /// tokens whose categories ran.
    pub fn unnecessary(&self, factory: &ProblemFactory<'_>, severity: Severity, checked: &FxHashSet<&str>) -> Vec<Problem> {
        if severity.is_ignored() {
            return Vec::new();
        }
        self.scopes
            .iter()
            .flat_map(|s| &s.tokens)
            .filter(|t| !t.used && checked.contains(t.text.as_str()))
            .map(|t| factory.synthesized(ProblemId::UnusedWarningToken, severity, vec![t.text.clone()], t.start, t.end))
            .collect()
    }
}

fn collect_tokens(unit: &CompilationUnit, value: AstId, out: &mut Vec<Token>) {
    match unit.ast.kind(value) {
        Some(NodeKind::StringLiteral { escaped }) => {
            let Some((start, end)) = unit.ast.range(value) else {
                return;
            };
            let text = escaped.trim_matches('"').to_string();
            out.push(Token {
                text,
                start,
                end,
                used: false,
            });
        }
        Some(NodeKind::ArrayInitializer { exprs }) => {
            for &expr in exprs {
                collect_tokens(unit, expr, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use jbridge_binder::UnitId;
    use jbridge_common::NameTable;
    use jbridge_parser::{ParseOptions, parse_unit};

    use super::*;
    use crate::convert::convert_tree;

    fn unit(source: &str) -> CompilationUnit {
        let tree = parse_unit(Arc::from(source), NameTable::shared(), ParseOptions::default());
        let converted = convert_tree(&tree, UnitId(0)).unwrap();
        let mut unit = CompilationUnit::new(Arc::from("A.java"), Arc::from(source));
        unit.ast = converted.ast;
        unit.root = converted.root;
        unit
    }

    #[test]
    fn test_used_and_unnecessary_tokens() {
        let source = "class A {\n  @SuppressWarnings(\"unused\") private int a;\n  @SuppressWarnings({\"unused\", \"deprecation\"}) void m() {}\n}\n";
        let unit = unit(source);
        let mut suppressions = Suppressions::collect(&unit);
        let factory = ProblemFactory {
            source_file: unit.source_id.clone(),
            source: &unit.source,
            line_map: &unit.line_map,
        };
        let a = source.find("a;").unwrap() as u32;
        let unused = factory.synthesized(
            ProblemId::UnusedPrivateField,
            Severity::Warning,
            vec!["A".into(), "a".into()],
            a,
            a + 1,
        );
        assert!(suppressions.filter(vec![unused]).is_empty());

        let checked: FxHashSet<&str> = ["unused"].into_iter().collect();
        let unnecessary = suppressions.unnecessary(&factory, Severity::Warning, &checked);
        assert_eq!(unnecessary.len(), 1);
        assert_eq!(unnecessary[0].args, vec!["unused".to_string()]);
        assert!(unnecessary[0].start > a);
    }
}
