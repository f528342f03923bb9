//! Unused code detection.
//!
//! Runs after each top-level class of a unit has been attributed and works
//! from the front-end's resolution records: a record on a symbol's own
//! declaration node declares it, any other record references it. The left
//! side of a plain assignment is a write, not a read.
//!
//! Members and locals are judged per class, inside the class's own range.
//! Imports are judged once the last class of the unit has been analyzed,
//! against everything the unit's classes referenced.

use jbridge_binder::{ImportEntry, Symbol, SymbolId, SymbolKind, SymbolTable, UnitId, annotation_name, symbol_flags};
use jbridge_checker::parse_doc_references;
use jbridge_common::CompilerOptions;
use jbridge_common::options::{UNUSED_IMPORT, UNUSED_LOCAL, UNUSED_PRIVATE_MEMBER};
use jbridge_dom::ProblemId;
use jbridge_parser::{NodeData, NodeIndex, ParsedUnit, VarKind};
use jbridge_scanner::SyntaxKind;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::problems::Finding;

const SERIAL_VERSION_UID: &str = "serialVersionUID";

#[derive(Debug, Default)]
pub struct UnusedScanner {
    imports: bool,
    members: bool,
    locals: bool,
    /// Symbols referenced by the analyzed classes of each unit.
    referenced: FxHashMap<UnitId, FxHashSet<SymbolId>>,
}

/// Resolution records of one class, split by role.
#[derive(Default)]
struct ClassRecords {
    declared: Vec<(NodeIndex, SymbolId)>,
    referenced: FxHashSet<SymbolId>,
    read: FxHashSet<SymbolId>,
}

impl UnusedScanner {
    /// A scanner for the categories `options` does not ignore.
    pub fn new(options: &CompilerOptions) -> Self {
        UnusedScanner {
            imports: !options.is_ignored(UNUSED_IMPORT),
            members: !options.is_ignored(UNUSED_PRIVATE_MEMBER),
            locals: !options.is_ignored(UNUSED_LOCAL),
            referenced: FxHashMap::default(),
        }
    }

    /// Whether any category is checked.
    pub fn is_active(&self) -> bool {
        self.imports || self.members || self.locals
    }

    /// Scan top-level `class` of `unit`. Import findings are only produced
    /// when `last_in_unit` is set.
    pub fn scan_class(&mut self, table: &SymbolTable, unit: UnitId, class: SymbolId, last_in_unit: bool) -> Vec<Finding> {
        let mut findings = Vec::new();
        let Some(tree) = table.tree(unit) else {
            return findings;
        };
        let class_node = table
            .symbol(class)
            .and_then(|s| s.decl)
            .filter(|d| d.unit == unit)
            .map_or(NodeIndex::NONE, |d| d.node);
        if let Some(records) = class_records(table, &tree, unit, class_node) {
            if self.members || self.locals {
                for &(node, sym) in &records.declared {
                    if let Some(finding) = self.judge_declaration(table, &tree, &records, node, sym) {
                        findings.push(finding);
                    }
                }
            }
            self.referenced.entry(unit).or_default().extend(records.referenced);
        }
        if last_in_unit {
            let referenced = self.referenced.remove(&unit).unwrap_or_default();
            if self.imports {
                findings.extend(unused_imports(table, &tree, unit, &referenced));
            }
        }
        findings.sort_by_key(|f| f.start);
        debug!(unit = unit.0, class = class.0, last_in_unit, findings = findings.len(), "unused scan");
        findings
    }

    fn judge_declaration(
        &self,
        table: &SymbolTable,
        tree: &ParsedUnit,
        records: &ClassRecords,
        node: NodeIndex,
        sym: SymbolId,
    ) -> Option<Finding> {
        let symbol = table.symbol(sym)?;
        if symbol.has_flags(symbol_flags::SYNTHETIC) || has_other_annotations(tree, symbol) {
            return None;
        }
        let name = table.symbol_name(sym);
        // Constructors are written with their class's name.
        let written = if symbol.is_constructor() {
            table.symbol_name(symbol.owner).len()
        } else {
            name.len()
        };
        let (start, end) = name_range(tree, node, written)?;
        match symbol.kind {
            SymbolKind::Var => {
                let var_kind = symbol.var_info()?.var_kind;
                if records.read.contains(&sym) {
                    return None;
                }
                if var_kind == VarKind::Local && self.locals {
                    return Some(Finding::new(ProblemId::LocalVariableIsNeverUsed, vec![name.to_string()], start, end));
                }
                if var_kind == VarKind::Field
                    && self.members
                    && is_private_member(symbol)
                    && !symbol.has_flags(symbol_flags::ENUM_CONSTANT)
                    && name.as_ref() != SERIAL_VERSION_UID
                {
                    let owner = table.symbol_name(symbol.owner).to_string();
                    return Some(Finding::new(ProblemId::UnusedPrivateField, vec![owner, name.to_string()], start, end));
                }
                None
            }
            SymbolKind::Method if self.members && is_private_member(symbol) => {
                if records.referenced.contains(&sym) {
                    return None;
                }
                let owner = table.symbol_name(symbol.owner).to_string();
                let params = parameter_list(table, sym);
                if symbol.is_constructor() {
                    if only_constructor(table, symbol.owner) {
                        return None;
                    }
                    return Some(Finding::new(ProblemId::UnusedPrivateConstructor, vec![owner, params], start, end));
                }
                Some(Finding::new(ProblemId::UnusedPrivateMethod, vec![owner, name.to_string(), params], start, end))
            }
            SymbolKind::Class if self.members && is_private_member(symbol) => {
                if records.referenced.contains(&sym) {
                    return None;
                }
                Some(Finding::new(ProblemId::UnusedPrivateType, vec![name.to_string()], start, end))
            }
            _ => None,
        }
    }
}

/// Private members of a class, not local to a block.
fn is_private_member(symbol: &Symbol) -> bool {
    symbol.is_private() && !symbol.has_any_flags(symbol_flags::LOCAL | symbol_flags::ANONYMOUS)
}

fn only_constructor(table: &SymbolTable, class: SymbolId) -> bool {
    let Some(info) = table.symbol(class).and_then(Symbol::class_info) else {
        return false;
    };
    let declared = info
        .members
        .iter()
        .filter_map(|&m| table.symbol(m))
        .filter(|m| m.is_constructor() && !m.has_flags(symbol_flags::SYNTHETIC))
        .count();
    declared <= 1
}

fn parameter_list(table: &SymbolTable, method: SymbolId) -> String {
    table
        .param_types(method)
        .iter()
        .map(|t| table.type_display(t))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Range of the declared name of `node`.
fn name_range(tree: &ParsedUnit, node: NodeIndex, len: usize) -> Option<(u32, u32)> {
    let pos = match tree.arena.data(node)? {
        NodeData::VarDecl { name_pos, .. }
        | NodeData::MethodDecl { name_pos, .. }
        | NodeData::ClassDecl { name_pos, .. } => *name_pos,
        _ => tree.arena.pos_end(node)?.0,
    };
    Some((pos, pos + len as u32))
}

fn class_records(table: &SymbolTable, tree: &ParsedUnit, unit: UnitId, class_node: NodeIndex) -> Option<ClassRecords> {
    let (start, end) = tree.arena.pos_end(class_node)?;
    let writes = plain_assignment_targets(tree, class_node);
    let mut records = ClassRecords::default();
    for (node, sym) in table.symbols_in_unit(unit) {
        let Some((pos, _)) = tree.arena.pos_end(node) else {
            continue;
        };
        if pos < start || pos >= end {
            continue;
        }
        let Some(symbol) = table.symbol(sym) else {
            continue;
        };
        if symbol.decl.is_some_and(|d| d.unit == unit && d.node == node) {
            records.declared.push((node, sym));
            continue;
        }
        records.referenced.insert(sym);
        if !writes.contains(&node) {
            records.read.insert(sym);
        }
    }
    trace!(
        declared = records.declared.len(),
        referenced = records.referenced.len(),
        "class records"
    );
    Some(records)
}

fn plain_assignment_targets(tree: &ParsedUnit, root: NodeIndex) -> FxHashSet<NodeIndex> {
    tree.arena
        .preorder(root)
        .into_iter()
        .filter_map(|idx| match tree.arena.data(idx) {
            Some(NodeData::Assign { op, target, .. }) if *op == SyntaxKind::Eq => Some(unparenthesized(tree, *target)),
            _ => None,
        })
        .collect()
}

fn unparenthesized(tree: &ParsedUnit, mut node: NodeIndex) -> NodeIndex {
    while let Some(NodeData::Parens { expr }) = tree.arena.data(node) {
        node = *expr;
    }
    node
}

/// Simple names of the types referenced from doc comments (`{@link X}`,
/// `@see X#m`, `@throws X`); the first segment of a qualified name.
fn doc_comment_names(tree: &ParsedUnit) -> FxHashSet<String> {
    let mut names = FxHashSet::default();
    for (_, range) in tree.arena.doc_comments() {
        let Some(text) = tree.source.get(range.pos as usize..range.end as usize) else {
            continue;
        };
        for reference in parse_doc_references(text, range.pos) {
            if let Some((name, _)) = reference.type_name
                && let Some(first) = name.split('.').next()
                && !first.is_empty()
            {
                names.insert(first.to_string());
            }
        }
    }
    names
}

fn unused_imports(
    table: &SymbolTable,
    tree: &ParsedUnit,
    unit: UnitId,
    referenced: &FxHashSet<SymbolId>,
) -> Vec<Finding> {
    let Some(source_unit) = table.unit(unit) else {
        return Vec::new();
    };
    let doc_names = doc_comment_names(tree);
    let mut findings = Vec::new();
    for import in &source_unit.imports {
        let Some(NodeData::Import { name: name_node, .. }) = tree.arena.data(import.node) else {
            continue;
        };
        let target = if import.target.is_some() {
            import.target
        } else {
            table.symbol_at(unit, *name_node).unwrap_or(SymbolId::NONE)
        };
        // Unresolved imports are reported by the front-end.
        if target.is_none() {
            continue;
        }
        if import_is_used(table, import, target, referenced, &doc_names) {
            continue;
        }
        let Some((start, end)) = tree.arena.pos_end(*name_node) else {
            continue;
        };
        let shown = if import.on_demand {
            format!("{}.*", import.name)
        } else {
            import.name.to_string()
        };
        trace!(import = %shown, "unused import");
        findings.push(Finding::new(ProblemId::UnusedImport, vec![shown], start, end));
    }
    findings
}

fn import_is_used(
    table: &SymbolTable,
    import: &ImportEntry,
    target: SymbolId,
    referenced: &FxHashSet<SymbolId>,
    doc_names: &FxHashSet<String>,
) -> bool {
    let simple = import.name.rsplit('.').next().unwrap_or(&import.name);
    let owned_by_target = |sym: &SymbolId| table.symbol(*sym).is_some_and(|s| s.owner == target);
    match (import.is_static, import.on_demand) {
        (false, false) => referenced.contains(&target) || doc_names.contains(simple),
        (false, true) => {
            referenced
                .iter()
                .any(|sym| owned_by_target(sym) && table.symbol(*sym).is_some_and(|s| s.kind == SymbolKind::Class))
                || doc_names.iter().any(|doc| {
                    table.class_by_flat_name(&format!("{}.{doc}", import.name)).is_some()
                        || table.class_by_flat_name(&format!("{}${doc}", import.name)).is_some()
                })
        }
        (true, false) => referenced
            .iter()
            .any(|sym| owned_by_target(sym) && table.symbol_name(*sym).as_ref() == simple),
        (true, true) => referenced.iter().any(owned_by_target),
    }
}

/// Annotated declarations may be used reflectively. `@SuppressWarnings`
/// and `@Deprecated` do not count.
fn has_other_annotations(tree: &ParsedUnit, symbol: &Symbol) -> bool {
    symbol
        .annotations
        .iter()
        .any(|a| !matches!(annotation_name(tree, a.node).as_deref(), Some("SuppressWarnings" | "Deprecated")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use jbridge_binder::FileManager;
    use jbridge_checker::{CheckerOptions, CompileTask, TaskEventKind};
    use jbridge_common::NameTable;

    use super::*;

    fn scan(sources: &[(&str, &str)], options: &CompilerOptions) -> Vec<(u32, bool, Vec<Finding>)> {
        let table = SymbolTable::new(NameTable::shared(), FileManager::new(Vec::new()));
        let mut task = CompileTask::new(table, CheckerOptions::default());
        for (name, text) in sources {
            task.parse(Arc::from(*name), Arc::from(*text));
        }
        let mut scanner = UnusedScanner::new(options);
        let mut out = Vec::new();
        task.analyze(&mut |ctx, event| {
            if event.kind != TaskEventKind::Analyze {
                return;
            }
            if let Some(class) = event.class {
                let findings = scanner.scan_class(&ctx.table, event.unit, class, event.last_in_unit);
                out.push((event.unit.0, event.last_in_unit, findings));
            }
        })
        .unwrap();
        out
    }

    fn ids(findings: &[Finding]) -> Vec<ProblemId> {
        findings.iter().map(|f| f.id).collect()
    }

    #[test]
    fn test_private_members_and_locals() {
        let source = "class A {\n  private int unused;\n  private int used;\n  private static final long serialVersionUID = 1L;\n  private void helper() {}\n  int get() { int dead = 1; int live = 2; return used + live; }\n}\n";
        let events = scan(&[("A.java", source)], &CompilerOptions::new());
        assert_eq!(events.len(), 1);
        let findings = &events[0].2;
        assert_eq!(
            ids(findings),
            vec![
                ProblemId::UnusedPrivateField,
                ProblemId::UnusedPrivateMethod,
                ProblemId::LocalVariableIsNeverUsed,
            ]
        );
        assert_eq!(findings[0].args, vec!["A".to_string(), "unused".to_string()]);
        let dead = source.find("dead").unwrap() as u32;
        assert_eq!((findings[2].start, findings[2].end), (dead, dead + 4));
    }

    #[test]
    fn test_write_only_local_is_unused() {
        let source = "class A {\n  void m() { int x; x = 3; }\n}\n";
        let events = scan(&[("A.java", source)], &CompilerOptions::new());
        assert_eq!(ids(&events[0].2), vec![ProblemId::LocalVariableIsNeverUsed]);
    }

    #[test]
    fn test_import_verdict_waits_for_last_class() {
        let source = "import java.util.List;\nimport java.util.Map;\nclass A {}\nclass B { List<String> items; }\n";
        let events = scan(&[("A.java", source)], &CompilerOptions::new());
        assert_eq!(events.len(), 2);
        assert!(!events[0].1);
        assert!(events[0].2.is_empty());
        assert!(events[1].1);
        let imports: Vec<_> = events[1].2.iter().filter(|f| f.id == ProblemId::UnusedImport).collect();
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].args, vec!["java.util.Map".to_string()]);
    }

    #[test]
    fn test_doc_comment_reference_uses_import() {
        let source = "import java.util.List;\n/** See {@link List}. */\nclass A {}\n";
        let events = scan(&[("A.java", source)], &CompilerOptions::new());
        assert!(events[0].2.is_empty());
    }

    #[test]
    fn test_ignored_categories_are_skipped() {
        let options = CompilerOptions::new()
            .with(UNUSED_IMPORT, "ignore")
            .with(UNUSED_PRIVATE_MEMBER, "ignore")
            .with(UNUSED_LOCAL, "ignore");
        assert!(!UnusedScanner::new(&options).is_active());
        let source = "import java.util.Map;\nclass A { private int a; void m() { int x = 1; } }\n";
        assert!(scan(&[("A.java", source)], &options)[0].2.is_empty());
    }
}
