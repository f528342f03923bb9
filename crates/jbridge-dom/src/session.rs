//! Binding sessions.
//!
//! A [`Session`] owns the front-end context of one resolve request after
//! analysis: the symbol table, the diagnostic log and the binding cache.
//! Host compilation units reach it through a [`BindingResolver`]; bindings
//! reach it through a weak reference, so a binding that outlives its
//! session fails cleanly instead of keeping the front-end alive.
//!
//! All access goes through one lock. Queries are serialized; the front-end
//! state is not designed for concurrent mutation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use jbridge_binder::{CompletionFailure, DeclRef, SymbolId, SymbolTable, Type, UnitId};
use jbridge_checker::CheckerContext;
use jbridge_parser::{NodeData, NodeIndex, ParsedUnit};
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::debug;

use crate::binding::Binding;
use crate::cache::BindingCache;
use crate::key::{BindingKey, KeyParseError};
use crate::node::{AstId, ForeignRef, NodeKind};
use crate::tree::Ast;

#[derive(Debug, Error)]
pub enum BindingError {
    #[error("the binding session has been destroyed")]
    SessionDestroyed,
    #[error(transparent)]
    Completion(#[from] CompletionFailure),
    #[error(transparent)]
    Key(#[from] KeyParseError),
}

/// Lock-protected state of a session.
pub struct SessionState {
    pub ctx: CheckerContext,
    pub cache: BindingCache,
    units: FxHashMap<Arc<str>, UnitId>,
}

impl SessionState {
    pub fn table(&mut self) -> &mut SymbolTable {
        &mut self.ctx.table
    }

    pub fn type_binding(&mut self, ty: &Type) -> Arc<Binding> {
        self.cache.type_binding(&self.ctx.table, ty)
    }

    pub fn symbol_binding(&mut self, sym: SymbolId, receiver: Option<&Type>) -> Result<Option<Arc<Binding>>, BindingError> {
        self.cache.symbol_binding(&mut self.ctx.table, sym, receiver)
    }

    pub fn annotation_binding(&mut self, recipient: SymbolId, decl: DeclRef) -> Result<Option<Arc<Binding>>, BindingError> {
        self.cache.annotation_binding(&mut self.ctx.table, recipient, decl)
    }

    pub(crate) fn package_binding_named(&mut self, name: &str) -> Result<Option<Arc<Binding>>, BindingError> {
        self.cache
            .find_by_key(&mut self.ctx.table, &BindingKey::Package(name.to_string()))
    }
}

pub struct Session {
    state: RwLock<SessionState>,
    destroyed: AtomicBool,
}

impl Session {
    /// Wrap an analyzed context. `units` maps source names to front-end
    /// units.
    pub fn new(ctx: CheckerContext, units: FxHashMap<Arc<str>, UnitId>) -> Arc<Session> {
        Arc::new_cyclic(|me| Session {
            state: RwLock::new(SessionState {
                ctx,
                cache: BindingCache::new(me.clone()),
                units,
            }),
            destroyed: AtomicBool::new(false),
        })
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Run `f` against the session state under the session lock.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut SessionState) -> Result<R, BindingError>) -> Result<R, BindingError> {
        if self.is_destroyed() {
            return Err(BindingError::SessionDestroyed);
        }
        let mut state = match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut state)
    }

    pub fn with_context<R>(&self, f: impl FnOnce(&mut CheckerContext) -> R) -> Result<R, BindingError> {
        self.with_state(|state| Ok(f(&mut state.ctx)))
    }

    /// Binding named by a key string, or `None` when the key names nothing
    /// in this session.
    pub fn find_by_key(&self, key: &str) -> Result<Option<Arc<Binding>>, BindingError> {
        let parsed = BindingKey::parse(key)?;
        self.with_state(|state| state.cache.find_by_key(&mut state.ctx.table, &parsed))
    }

    pub fn well_known_type(&self, name: &str) -> Result<Option<Arc<Binding>>, BindingError> {
        self.with_state(|state| state.cache.well_known_type(&mut state.ctx.table, name))
    }

    pub fn unit_of(&self, source_name: &str) -> Result<Option<UnitId>, BindingError> {
        self.with_state(|state| Ok(state.units.get(source_name).copied()))
    }

    pub fn cached_bindings(&self) -> Result<usize, BindingError> {
        self.with_state(|state| Ok(state.cache.len()))
    }

    /// Forget the unit map once every unit has been delivered. Bindings
    /// stay usable.
    pub fn cleanup(&self) -> Result<(), BindingError> {
        self.with_state(|state| {
            state.units.clear();
            Ok(())
        })
    }

    /// Release the front-end. Every later query on this session or its
    /// bindings fails with [`BindingError::SessionDestroyed`].
    pub fn destroy(&self) {
        let mut state = match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        debug!(bindings = state.cache.len(), "destroying binding session");
        state.ctx.table.file_manager.close();
        state.cache.clear();
        state.units.clear();
    }

    pub fn resolver(self: &Arc<Self>, unit: UnitId, package: Arc<str>, recovery: bool) -> BindingResolver {
        BindingResolver {
            session: self.clone(),
            unit,
            package,
            recovery,
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("destroyed", &self.is_destroyed())
            .finish_non_exhaustive()
    }
}

/// Per-unit entry point into a session, attached to a host compilation
/// unit.
#[derive(Clone, Debug)]
pub struct BindingResolver {
    session: Arc<Session>,
    unit: UnitId,
    /// Package of the unit, used to qualify recovered names.
    package: Arc<str>,
    recovery: bool,
}

impl BindingResolver {
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn unit(&self) -> UnitId {
        self.unit
    }

    pub fn recovery(&self) -> bool {
        self.recovery
    }

    /// Binding of a host node: the declared or referenced entity for names
    /// and declarations, the annotation for annotations, the type for type
    /// nodes and other expressions.
    pub fn resolve_node(&self, ast: &Ast, id: AstId) -> Result<Option<Arc<Binding>>, BindingError> {
        let Some(node) = ast.get(id) else {
            return Ok(None);
        };
        let written = written_type_name(ast, id);
        let Some(foreign) = node.foreign else {
            return self.recover(written);
        };
        let found = self.session.with_state(|state| self.resolve_foreign(state, foreign))?;
        match found {
            Some(binding) => Ok(Some(binding)),
            None => self.recover(written),
        }
    }

    /// Type of an expression or type node.
    pub fn resolve_type(&self, ast: &Ast, id: AstId) -> Result<Option<Arc<Binding>>, BindingError> {
        let Some(node) = ast.get(id) else {
            return Ok(None);
        };
        let written = written_type_name(ast, id);
        let Some(foreign) = node.foreign else {
            return self.recover(written);
        };
        let found = self.session.with_state(|state| {
            let ty = state.ctx.table.type_at(foreign.unit, foreign.node).cloned();
            Ok(ty
                .filter(|t| !t.leaf_type().is_erroneous())
                .map(|t| state.type_binding(&t)))
        })?;
        match found {
            Some(binding) => Ok(Some(binding)),
            None => self.recover(written),
        }
    }

    fn resolve_foreign(&self, state: &mut SessionState, foreign: ForeignRef) -> Result<Option<Arc<Binding>>, BindingError> {
        let unit = foreign.unit;
        let Some(tree) = state.ctx.table.tree(unit) else {
            return Ok(None);
        };
        let data = tree.arena.data(foreign.node).cloned();
        let (node, receiver) = match &data {
            Some(NodeData::MethodCall { callee, .. }) => (*callee, receiver_of(state, &tree, unit, *callee)),
            Some(NodeData::FieldAccess { target, .. }) => (foreign.node, state.ctx.table.type_at(unit, *target).cloned()),
            _ => (foreign.node, None),
        };
        if let Some(sym) = state.ctx.table.symbol_at(unit, node) {
            if matches!(data, Some(NodeData::Annotation { .. })) {
                let modifiers = tree.arena.parent(foreign.node);
                let owner = tree.arena.parent(modifiers);
                if let Some(recipient) = state.ctx.table.symbol_at(unit, owner) {
                    return state.annotation_binding(
                        recipient,
                        DeclRef {
                            unit,
                            node: foreign.node,
                        },
                    );
                }
            }
            let receiver = receiver.filter(|r| !r.leaf_type().is_erroneous());
            return state.symbol_binding(sym, receiver.as_ref());
        }
        let ty = state.ctx.table.type_at(unit, foreign.node).cloned();
        Ok(ty
            .filter(|t| !t.leaf_type().is_erroneous())
            .map(|t| state.type_binding(&t)))
    }

    /// Recovered type binding for an unresolved written type name.
    fn recover(&self, written: Option<(String, u32)>) -> Result<Option<Arc<Binding>>, BindingError> {
        if !self.recovery {
            return Ok(None);
        }
        let Some((name, dims)) = written else {
            return Ok(None);
        };
        let qualified = if name.contains('.') || self.package.is_empty() {
            name
        } else {
            format!("{}.{name}", self.package)
        };
        let package = self.package.clone();
        self.session
            .with_state(move |state| Ok(Some(state.cache.recovered_type(&qualified, &package, dims))))
    }

    /// Resolve a binding key in this unit's session.
    pub fn resolve_key(&self, key: &str) -> Result<Option<Arc<Binding>>, BindingError> {
        self.session.find_by_key(key)
    }

    pub fn well_known_type(&self, name: &str) -> Result<Option<Arc<Binding>>, BindingError> {
        self.session.well_known_type(name)
    }

    /// Entity referenced by a doc comment reference starting at `offset`.
    pub fn resolve_doc_reference(&self, offset: u32) -> Result<Option<Arc<Binding>>, BindingError> {
        self.session.with_state(|state| match state.ctx.doc_symbol(self.unit, offset) {
            Some(sym) => state.symbol_binding(sym, None),
            None => Ok(None),
        })
    }
}

fn receiver_of(state: &SessionState, tree: &ParsedUnit, unit: UnitId, callee: NodeIndex) -> Option<Type> {
    match tree.arena.data(callee) {
        Some(NodeData::FieldAccess { target, .. }) => state.ctx.table.type_at(unit, *target).cloned(),
        _ => None,
    }
}

/// Written name and dimensions of a host type or name node.
fn written_type_name(ast: &Ast, id: AstId) -> Option<(String, u32)> {
    match ast.kind(id)? {
        NodeKind::SimpleName { identifier } => Some((identifier.to_string(), 0)),
        NodeKind::QualifiedName { qualifier, name } => {
            let (head, _) = written_type_name(ast, *qualifier)?;
            let (tail, _) = written_type_name(ast, *name)?;
            Some((format!("{head}.{tail}"), 0))
        }
        NodeKind::SimpleType { name } => written_type_name(ast, *name),
        NodeKind::ParameterizedType { ty, .. } => written_type_name(ast, *ty),
        NodeKind::ArrayType { element, dims } => {
            let (name, inner) = written_type_name(ast, *element)?;
            Some((name, inner + dims))
        }
        _ => None,
    }
}
