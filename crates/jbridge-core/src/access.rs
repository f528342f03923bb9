//! Access restriction checks.
//!
//! Classes completed from a classpath entry may fall under one of the
//! entry's access rules. Every reference to such a class, and every
//! reference to one of its members, becomes a forbidden or discouraged
//! reference finding. Type and member references are reported separately.

use jbridge_binder::{
    AccessRestriction, EntryKind, NameEnvironment, RuleKind, Symbol, SymbolId, SymbolKind, SymbolTable, UnitId,
    symbol_flags,
};
use jbridge_common::CompilerOptions;
use jbridge_common::options::{DISCOURAGED_REFERENCE, FORBIDDEN_REFERENCE};
use jbridge_dom::ProblemId;
use jbridge_parser::{NodeData, NodeIndex, ParsedUnit};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::problems::Finding;

pub struct AccessScanner {
    environment: NameEnvironment,
    active: bool,
    /// Restriction of each top-level class looked up so far.
    restrictions: FxHashMap<SymbolId, Option<AccessRestriction>>,
}

impl AccessScanner {
    pub fn new(environment: NameEnvironment, options: &CompilerOptions) -> Self {
        AccessScanner {
            environment,
            active: !options.is_ignored(FORBIDDEN_REFERENCE) || !options.is_ignored(DISCOURAGED_REFERENCE),
            restrictions: FxHashMap::default(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Restricted references made inside top-level `class` of `unit`.
    pub fn scan_class(&mut self, table: &SymbolTable, unit: UnitId, class: SymbolId) -> Vec<Finding> {
        let mut findings = Vec::new();
        if !self.active {
            return findings;
        }
        let Some(tree) = table.tree(unit) else {
            return findings;
        };
        let Some((start, end)) = table
            .symbol(class)
            .and_then(|s| s.decl)
            .filter(|d| d.unit == unit)
            .and_then(|d| tree.arena.pos_end(d.node))
        else {
            return findings;
        };

        for (node, sym) in table.symbols_in_unit(unit) {
            let Some((pos, _)) = tree.arena.pos_end(node) else {
                continue;
            };
            if pos < start || pos >= end {
                continue;
            }
            // Invocations are recorded on both the call and its callee.
            if matches!(tree.arena.data(node), Some(NodeData::MethodCall { .. })) {
                continue;
            }
            let Some(symbol) = table.symbol(sym) else {
                continue;
            };
            if symbol.decl.is_some_and(|d| d.unit == unit && d.node == node) {
                continue;
            }
            let (owner, what, name) = match symbol.kind {
                SymbolKind::Class => (sym, "type", table.class_name(sym).to_string()),
                SymbolKind::Method | SymbolKind::Var if table.symbol(symbol.owner).is_some_and(is_class) => {
                    let (what, name) = member_display(table, sym, symbol);
                    (symbol.owner, what, name)
                }
                _ => continue,
            };
            let Some(restriction) = self.restriction_of(table, owner) else {
                continue;
            };
            let id = match restriction.kind {
                RuleKind::Forbidden => ProblemId::ForbiddenReference,
                RuleKind::Discouraged => ProblemId::DiscouragedReference,
                RuleKind::Accessible => continue,
            };
            let (from, to) = reference_range(&tree, node);
            let entry_kind = match restriction.entry_kind {
                EntryKind::Project => "project",
                EntryKind::Library | EntryKind::Platform => "library",
            };
            trace!(name = %name, pattern = %restriction.pattern, "restricted reference");
            findings.push(Finding::new(
                id,
                vec![what.to_string(), name, entry_kind.to_string(), restriction.entry_name.clone()],
                from,
                to,
            ));
        }
        findings.sort_by_key(|f| f.start);
        debug!(unit = unit.0, class = class.0, findings = findings.len(), "access scan");
        findings
    }

    /// Restriction on `class`, looked up through its top-level class. Only
    /// classes completed from the classpath can be restricted.
    fn restriction_of(&mut self, table: &SymbolTable, class: SymbolId) -> Option<AccessRestriction> {
        let top = table.outermost_class(class);
        if let Some(known) = self.restrictions.get(&top) {
            return known.clone();
        }
        let restriction = table
            .symbol(top)
            .filter(|s| s.has_flags(symbol_flags::BINARY))
            .and_then(|_| {
                let name = table.class_name(top);
                let compound: Vec<&str> = name.split('.').collect();
                self.environment.find_type(&compound)
            })
            .and_then(|answer| answer.restriction);
        self.restrictions.insert(top, restriction.clone());
        restriction
    }
}

fn is_class(symbol: &Symbol) -> bool {
    symbol.kind == SymbolKind::Class
}

/// `("method", "Type.run(int)")`, `("constructor", "Type(int)")` or
/// `("field", "Type.count")`.
fn member_display(table: &SymbolTable, sym: SymbolId, symbol: &Symbol) -> (&'static str, String) {
    let owner = table.symbol_name(symbol.owner);
    let params = || {
        table
            .param_types(sym)
            .iter()
            .map(|t| table.type_display(t))
            .collect::<Vec<_>>()
            .join(", ")
    };
    match symbol.kind {
        SymbolKind::Method if symbol.is_constructor() => ("constructor", format!("{owner}({})", params())),
        SymbolKind::Method => ("method", format!("{owner}.{}({})", table.symbol_name(sym), params())),
        _ => ("field", format!("{owner}.{}", table.symbol_name(sym))),
    }
}

/// Range reported for a reference: the selected name of a qualified
/// reference, the whole node otherwise.
fn reference_range(tree: &ParsedUnit, node: NodeIndex) -> (u32, u32) {
    let (pos, end) = tree.arena.pos_end(node).unwrap_or((0, 0));
    match tree.arena.data(node) {
        Some(NodeData::FieldAccess { name_pos, .. }) => (*name_pos, end),
        _ => (pos, end),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use jbridge_binder::{AccessRule, ClasspathEntry, FileManager};
    use jbridge_checker::{CheckerOptions, CompileTask};
    use jbridge_common::NameTable;

    use super::*;

    const LIBRARY: [(&str, &str); 2] = [
        ("p/Type.java", "package p; public class Type { public void method() {} }"),
        ("q/Open.java", "package q; public class Open { public void run() {} }"),
    ];

    fn scan(rule: RuleKind, source: &str) -> Vec<Finding> {
        let entry = ClasspathEntry::in_memory("lib", LIBRARY)
            .with_rule(AccessRule::new("p/*", rule))
            .unwrap();
        let table = SymbolTable::new(NameTable::shared(), FileManager::new(vec![entry]));
        let mut task = CompileTask::new(table, CheckerOptions::default());
        task.parse(Arc::from("B.java"), Arc::from(source));
        let mut scanner = AccessScanner::new(task.ctx.table.file_manager.name_environment(), &CompilerOptions::new());
        let mut findings = Vec::new();
        task.analyze(&mut |ctx, event| {
            if let Some(class) = event.class {
                findings.extend(scanner.scan_class(&ctx.table, event.unit, class));
            }
        })
        .unwrap();
        findings
    }

    #[test]
    fn test_type_and_member_references_are_separate() {
        let source = "import p.Type;\nclass B {\n  void m(Type t) { t.method(); }\n}\n";
        let findings = scan(RuleKind::Forbidden, source);
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.id == ProblemId::ForbiddenReference));
        assert_eq!(findings[0].args, vec!["type", "p.Type", "library", "lib"]);
        assert_eq!(findings[1].args, vec!["method", "Type.method()", "library", "lib"]);
        let method = source.find("method()").unwrap() as u32;
        assert_eq!(findings[1].start, method);
    }

    #[test]
    fn test_discouraged_and_unrestricted() {
        let source = "class B {\n  void m(p.Type t, q.Open o) { o.run(); }\n}\n";
        let findings = scan(RuleKind::Discouraged, source);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].id, ProblemId::DiscouragedReference);
    }
}
