//! Missing `@Override` detection.

use jbridge_binder::{CompletionFailure, Symbol, SymbolId, SymbolKind, SymbolTable, UnitId, has_annotation};
use jbridge_common::CompilerOptions;
use jbridge_common::options::{MISSING_OVERRIDE, MISSING_OVERRIDE_FOR_INTERFACE};
use jbridge_dom::ProblemId;
use jbridge_parser::{ClassKind, NodeData};
use tracing::trace;

use crate::problems::Finding;

const OVERRIDE: &str = "Override";
const OBJECT: &str = "java.lang.Object";

#[derive(Clone, Copy, Debug, Default)]
pub struct OverrideCheck {
    superclass: bool,
    interface: bool,
}

impl OverrideCheck {
    pub fn new(options: &CompilerOptions) -> Self {
        OverrideCheck {
            superclass: !options.is_ignored(MISSING_OVERRIDE),
            interface: !options.is_ignored(MISSING_OVERRIDE_FOR_INTERFACE),
        }
    }

    pub fn is_active(&self) -> bool {
        self.superclass || self.interface
    }

    /// Methods of `unit` that override without saying so.
    pub fn scan_unit(&self, table: &mut SymbolTable, unit: UnitId) -> Result<Vec<Finding>, CompletionFailure> {
        let mut findings = Vec::new();
        if !self.is_active() {
            return Ok(findings);
        }
        let Some(tree) = table.tree(unit) else {
            return Ok(findings);
        };
        let methods: Vec<SymbolId> = table
            .symbols_in_unit(unit)
            .into_iter()
            .filter(|&(node, sym)| {
                table.symbol(sym).is_some_and(|s| {
                    s.kind == SymbolKind::Method
                        && !s.is_constructor()
                        && !s.is_static()
                        && s.decl.is_some_and(|d| d.unit == unit && d.node == node)
                })
            })
            .map(|(_, sym)| sym)
            .collect();

        for method in methods {
            let Some(symbol) = table.symbol(method) else {
                continue;
            };
            let annotations: Vec<_> = symbol.annotations.iter().map(|a| a.node).collect();
            if has_annotation(&tree, &annotations, OVERRIDE) {
                continue;
            }
            let Some(decl) = symbol.decl else {
                continue;
            };
            let owner = symbol.owner;
            let in_interface = class_kind(table.symbol(owner)) == Some(ClassKind::Interface);

            let id = match table.overridden_methods(method)?.first() {
                Some(&overridden) => {
                    let from_interface = matches!(
                        class_kind(table.symbol(table.enclosing_class(overridden))),
                        Some(ClassKind::Interface | ClassKind::Annotation)
                    );
                    if from_interface || in_interface {
                        ProblemId::MissingOverrideAnnotationForInterfaceMethodImplementation
                    } else {
                        ProblemId::MissingOverrideAnnotation
                    }
                }
                None if in_interface && redefines_object_method(table, method)? => {
                    ProblemId::MissingOverrideAnnotationForInterfaceMethodImplementation
                }
                None => continue,
            };
            let enabled = match id {
                ProblemId::MissingOverrideAnnotation => self.superclass,
                _ => self.interface,
            };
            if !enabled {
                continue;
            }
            let Some(NodeData::MethodDecl { name_pos, .. }) = tree.arena.data(decl.node) else {
                continue;
            };
            let name = table.symbol_name(method);
            let params = table
                .param_types(method)
                .iter()
                .map(|t| table.type_display(t))
                .collect::<Vec<_>>()
                .join(", ");
            let class = table.symbol_name(owner).to_string();
            trace!(method = %name, class = %class, "missing @Override");
            findings.push(Finding::new(
                id,
                vec![name.to_string(), params, class],
                *name_pos,
                *name_pos + name.len() as u32,
            ));
        }
        findings.sort_by_key(|f| f.start);
        Ok(findings)
    }
}

fn class_kind(symbol: Option<&Symbol>) -> Option<ClassKind> {
    symbol.and_then(Symbol::class_info).map(|info| info.class_kind)
}

/// Interfaces do not inherit from `Object`, but redeclaring one of its
/// public methods counts as overriding it.
fn redefines_object_method(table: &mut SymbolTable, method: SymbolId) -> Result<bool, CompletionFailure> {
    let Some(object) = table.load_class(OBJECT)? else {
        return Ok(false);
    };
    let Some(name) = table.symbol(method).map(|s| s.name) else {
        return Ok(false);
    };
    let own: Vec<String> = table.param_types(method).iter().map(|t| table.type_display(t)).collect();
    let candidates = table.find_methods(object, name)?;
    Ok(candidates.into_iter().any(|candidate| {
        table.symbol(candidate).is_some_and(|s| !s.is_private() && !s.is_static())
            && table
                .param_types(candidate)
                .iter()
                .map(|t| table.type_display(t))
                .eq(own.iter().cloned())
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use jbridge_binder::FileManager;
    use jbridge_checker::{CheckerOptions, CompileTask};
    use jbridge_common::NameTable;

    use super::*;

    fn scan(source: &str, options: &CompilerOptions) -> Vec<Finding> {
        let table = SymbolTable::new(NameTable::shared(), FileManager::new(Vec::new()));
        let mut task = CompileTask::new(table, CheckerOptions::default());
        let (unit, _) = task.parse(Arc::from("A.java"), Arc::from(source));
        task.analyze(&mut |_, _| {}).unwrap();
        OverrideCheck::new(options).scan_unit(&mut task.ctx.table, unit).unwrap()
    }

    const SOURCE: &str = "class Base { void run() {} }\ninterface Task { void exec(); }\nclass A extends Base implements Task {\n  void run() {}\n  public void exec() {}\n  @Override public String toString() { return \"\"; }\n  void own() {}\n}\n";

    #[test]
    fn test_disabled_by_default() {
        assert!(!OverrideCheck::new(&CompilerOptions::new()).is_active());
        assert!(scan(SOURCE, &CompilerOptions::new()).is_empty());
    }

    #[test]
    fn test_superclass_and_interface_overrides() {
        let options = CompilerOptions::new()
            .with(MISSING_OVERRIDE, "warning")
            .with(MISSING_OVERRIDE_FOR_INTERFACE, "warning");
        let findings = scan(SOURCE, &options);
        let ids: Vec<_> = findings.iter().map(|f| f.id).collect();
        assert_eq!(
            ids,
            vec![
                ProblemId::MissingOverrideAnnotation,
                ProblemId::MissingOverrideAnnotationForInterfaceMethodImplementation,
            ]
        );
        assert_eq!(findings[0].args, vec!["run".to_string(), String::new(), "A".to_string()]);

        let superclass_only = CompilerOptions::new().with(MISSING_OVERRIDE, "warning");
        assert_eq!(scan(SOURCE, &superclass_only).len(), 1);
    }
}
