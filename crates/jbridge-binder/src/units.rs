//! Parsed compilation units known to a symbol table.

use std::sync::Arc;

use jbridge_parser::{NodeIndex, ParsedUnit};
use serde::Serialize;

use crate::symbols::SymbolId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UnitId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum UnitOrigin {
    /// A unit being compiled.
    Source,
    /// Completed on demand from a classpath entry.
    Classpath { entry: usize },
}

/// Resolution state of one `import` declaration.
#[derive(Clone, Debug)]
pub struct ImportEntry {
    pub node: NodeIndex,
    pub is_static: bool,
    pub on_demand: bool,
    /// Dotted name as written (without `.*`).
    pub name: Arc<str>,
    /// Imported class (single-type imports, and the class of static or
    /// on-demand imports naming a class).
    pub target: SymbolId,
}

pub struct SourceUnit {
    pub id: UnitId,
    /// Path, `mem:///` identity, or classpath-relative path.
    pub name: Arc<str>,
    pub origin: UnitOrigin,
    pub tree: Arc<ParsedUnit>,
    pub package: SymbolId,
    pub module: SymbolId,
    /// Top-level classes in declaration order.
    pub top_level: Vec<SymbolId>,
    pub imports: Vec<ImportEntry>,
    pub imports_resolved: bool,
}

impl SourceUnit {
    pub fn new(id: UnitId, name: Arc<str>, origin: UnitOrigin, tree: ParsedUnit) -> Self {
        SourceUnit {
            id,
            name,
            origin,
            tree: Arc::new(tree),
            package: SymbolId::NONE,
            module: SymbolId::NONE,
            top_level: Vec::new(),
            imports: Vec::new(),
            imports_resolved: false,
        }
    }

    pub fn is_source(&self) -> bool {
        self.origin == UnitOrigin::Source
    }

    /// Mutable access to the tree while no attribution holds it.
    pub fn tree_mut(&mut self) -> &mut ParsedUnit {
        Arc::make_mut(&mut self.tree)
    }
}
