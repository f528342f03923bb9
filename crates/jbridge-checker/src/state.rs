//! Attribution state.
//!
//! `CheckerState` attributes one top-level class of one unit: it walks the
//! declarations, statements and expressions of the class, resolves every
//! name through the symbol table, records the symbol and type of each
//! resolved node, and reports front-end diagnostics into the session log.
//!
//! The implementation is split across several files:
//! - `state.rs`: the state struct, scopes and reporting helpers
//! - `state_declarations.rs`: classes, members, annotations, doc comments
//! - `state_statements.rs`: statements and local declarations
//! - `state_expressions.rs`: expression typing
//! - `state_lookup.rs`: names, fields, methods and assignability

use std::sync::Arc;

use jbridge_binder::{CompletionFailure, SymbolId, Type, TypeScope, UnitId};
use jbridge_common::Atom;
use jbridge_common::limits::MAX_ATTRIBUTION_DEPTH;
use jbridge_parser::{NodeIndex, ParsedUnit};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::context::CheckerContext;

pub(crate) type AttrResult<T> = Result<T, CompletionFailure>;

/// Block scope: locals and local classes declared so far.
#[derive(Debug, Default)]
pub(crate) struct Scope {
    pub vars: Vec<(Atom, SymbolId)>,
    pub types: Vec<(Atom, SymbolId)>,
}

/// Class being attributed.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ClassEnv {
    pub sym: SymbolId,
    /// Attribution is inside a static member or initializer of this class.
    pub static_ctx: bool,
    /// Index into `scopes` of the first scope belonging to this class.
    pub scope_base: usize,
}

/// Method, constructor or initializer being attributed.
#[derive(Clone, Debug)]
pub(crate) struct MethodEnv {
    /// `SymbolId::NONE` for initializers.
    pub sym: SymbolId,
    pub return_type: Type,
}

/// Attributes one top-level class.
pub struct CheckerState<'a> {
    pub ctx: &'a mut CheckerContext,
    pub(crate) unit: UnitId,
    pub(crate) tree: Arc<ParsedUnit>,
    pub(crate) scopes: Vec<Scope>,
    pub(crate) classes: Vec<ClassEnv>,
    pub(crate) method: Option<MethodEnv>,
    pub(crate) depth: u32,
    /// While positive, diagnostics are dropped (recovered syntax).
    quiet: u32,
    /// Enclosing loops and switches.
    pub(crate) breakable: u32,
    /// Same-named locals seen so far in the current method.
    pub(crate) local_counts: FxHashMap<Atom, u32>,
    /// Range of the construct being attributed.
    pub(crate) last_pos: (u32, u32),
}

impl<'a> CheckerState<'a> {
    pub fn new(ctx: &'a mut CheckerContext, unit: UnitId) -> Option<Self> {
        let tree = ctx.table.tree(unit)?;
        Some(CheckerState {
            ctx,
            unit,
            tree,
            scopes: Vec::new(),
            classes: Vec::new(),
            method: None,
            depth: 0,
            quiet: 0,
            breakable: 0,
            local_counts: FxHashMap::default(),
            last_pos: (0, 0),
        })
    }

    /// Range of the construct attributed last (where a completion failure
    /// surfaced).
    pub fn last_position(&self) -> (u32, u32) {
        self.last_pos
    }

    // =========================================================================
    // Reporting
    // =========================================================================

    pub(crate) fn report(&mut self, start: u32, end: u32, code: &'static str, args: Vec<String>) {
        if self.quiet > 0 {
            trace!(code, start, "dropped in recovered syntax");
            return;
        }
        self.ctx.log.report(Some(self.unit), start, end, code, args);
    }

    pub(crate) fn report_node(&mut self, node: NodeIndex, code: &'static str, args: Vec<String>) {
        let (start, end) = self.tree.arena.pos_end(node).unwrap_or(self.last_pos);
        self.report(start, end, code, args);
    }

    /// Run `f` with diagnostics suppressed.
    pub(crate) fn quietly<T>(&mut self, f: impl FnOnce(&mut Self) -> AttrResult<T>) -> AttrResult<T> {
        self.quiet += 1;
        let result = f(self);
        self.quiet -= 1;
        result
    }

    /// Move binder diagnostics into the log, or drop them while quiet.
    pub(crate) fn settle_binder_diagnostics(&mut self) {
        if self.quiet > 0 {
            self.ctx.table.take_diagnostics();
        } else {
            self.ctx.flush_binder_diagnostics();
        }
    }

    pub(crate) fn mark(&mut self, node: NodeIndex) {
        if let Some((start, end)) = self.tree.arena.pos_end(node) {
            self.last_pos = (start, end);
        }
    }

    /// Enter one level of attribution nesting. Returns `false` when the
    /// nesting limit is hit.
    pub(crate) fn enter_depth(&mut self) -> bool {
        if self.depth >= MAX_ATTRIBUTION_DEPTH {
            return false;
        }
        self.depth += 1;
        true
    }

    pub(crate) fn leave_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // =========================================================================
    // Scopes
    // =========================================================================

    pub(crate) fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub(crate) fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    pub(crate) fn declare_var(&mut self, name: Atom, sym: SymbolId) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.vars.push((name, sym));
        }
    }

    pub(crate) fn declare_type(&mut self, name: Atom, sym: SymbolId) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.types.push((name, sym));
        }
    }

    /// Local variable `name` visible from the current class.
    pub(crate) fn lookup_local(&self, name: Atom) -> Option<SymbolId> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|s| s.vars.iter().rev())
            .find(|(n, _)| *n == name)
            .map(|(_, sym)| *sym)
    }

    /// Local variable `name` declared in the current method body.
    pub(crate) fn lookup_local_in_method(&self, name: Atom) -> Option<SymbolId> {
        let base = self.classes.last().map_or(0, |c| c.scope_base);
        self.scopes[base.min(self.scopes.len())..]
            .iter()
            .rev()
            .flat_map(|s| s.vars.iter().rev())
            .find(|(n, _)| *n == name)
            .map(|(_, sym)| *sym)
    }

    pub(crate) fn current_class(&self) -> SymbolId {
        self.classes.last().map_or(SymbolId::NONE, |c| c.sym)
    }

    /// Symbol that owns locals declared at this point.
    pub(crate) fn local_owner(&self) -> SymbolId {
        match &self.method {
            Some(m) if m.sym.is_some() => m.sym,
            _ => self.current_class(),
        }
    }

    pub(crate) fn in_static_context(&self) -> bool {
        self.classes.last().is_some_and(|c| c.static_ctx)
    }

    pub(crate) fn type_scope(&self) -> TypeScope {
        let mut scope = TypeScope::for_class(self.unit, self.local_owner());
        scope.local_types = self
            .scopes
            .iter()
            .flat_map(|s| s.types.iter().copied())
            .collect();
        scope
    }

    // =========================================================================
    // Type nodes
    // =========================================================================

    /// Resolve a type node in the current scope.
    pub(crate) fn resolve_type_node(&mut self, node: NodeIndex) -> AttrResult<Type> {
        if node.is_none() {
            return Ok(Type::Unknown);
        }
        self.mark(node);
        self.settle_binder_diagnostics();
        let scope = self.type_scope();
        let tree = self.tree.clone();
        let ty = self.ctx.table.resolve_type(&scope, &tree, node)?;
        self.settle_binder_diagnostics();
        self.check_type_use(node, &ty)?;
        Ok(ty)
    }

    pub(crate) fn record(&mut self, node: NodeIndex, sym: SymbolId, ty: &Type) {
        self.ctx.table.record_symbol(self.unit, node, sym);
        self.ctx.table.record_type(self.unit, node, ty.clone());
    }

    pub(crate) fn record_type(&mut self, node: NodeIndex, ty: &Type) {
        self.ctx.table.record_type(self.unit, node, ty.clone());
    }

    pub(crate) fn name_text(&self, atom: Atom) -> Arc<str> {
        self.tree.name_text(atom)
    }

    pub(crate) fn display(&self, ty: &Type) -> String {
        self.ctx.table.type_display(ty)
    }
}
