//! Bindings: lazily resolved views of front-end symbols.
//!
//! A binding holds a handle into its session's symbol table and a weak
//! reference to the session. Structural queries lock the session and read
//! the table on demand, so every query can fail with
//! [`BindingError::SessionDestroyed`] once the session is gone.
//!
//! Identity is the key: two bindings denote the same entity exactly when
//! their keys are equal, and within one session the cache hands out a
//! single instance per key.

use std::sync::{Arc, Weak};

use jbridge_binder::{
    DeclRef, SymbolId, SymbolInfo, SymbolKind, SymbolTable, Type, substitute, symbol_flags,
};
use jbridge_parser::{ClassKind, ModifierFlags, NodeData, VarKind};

use crate::cache::BindingCache;
use crate::session::{BindingError, Session, SessionState};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Type,
    Method,
    Variable,
    Package,
    Module,
    Annotation,
    MemberValuePair,
}

/// Fields shared by every binding variant.
#[derive(Debug)]
pub(crate) struct Header {
    pub(crate) session: Weak<Session>,
    pub(crate) key: Arc<str>,
    pub(crate) name: Arc<str>,
    pub(crate) recovered: bool,
}

impl Header {
    fn with_state<R>(&self, f: impl FnOnce(&mut SessionState) -> Result<R, BindingError>) -> Result<R, BindingError> {
        let session = self.session.upgrade().ok_or(BindingError::SessionDestroyed)?;
        session.with_state(f)
    }
}

#[derive(Debug)]
pub enum Binding {
    Type(TypeBinding),
    Method(MethodBinding),
    Variable(VariableBinding),
    Package(PackageBinding),
    Module(ModuleBinding),
    Annotation(AnnotationBinding),
    MemberValuePair(MemberValuePairBinding),
}

impl Binding {
    fn header(&self) -> &Header {
        match self {
            Binding::Type(b) => &b.head,
            Binding::Method(b) => &b.head,
            Binding::Variable(b) => &b.head,
            Binding::Package(b) => &b.head,
            Binding::Module(b) => &b.head,
            Binding::Annotation(b) => &b.head,
            Binding::MemberValuePair(b) => &b.head,
        }
    }

    pub fn kind(&self) -> BindingKind {
        match self {
            Binding::Type(_) => BindingKind::Type,
            Binding::Method(_) => BindingKind::Method,
            Binding::Variable(_) => BindingKind::Variable,
            Binding::Package(_) => BindingKind::Package,
            Binding::Module(_) => BindingKind::Module,
            Binding::Annotation(_) => BindingKind::Annotation,
            Binding::MemberValuePair(_) => BindingKind::MemberValuePair,
        }
    }

    pub fn key(&self) -> &str {
        &self.header().key
    }

    pub(crate) fn key_arc(&self) -> Arc<str> {
        self.header().key.clone()
    }

    /// Simple name (`List<String>`, `size`, `java.util`).
    pub fn name(&self) -> &str {
        &self.header().name
    }

    /// Backed by no real symbol, only by syntax.
    pub fn is_recovered(&self) -> bool {
        self.header().recovered
    }

    pub fn is_equal_to(&self, other: &Binding) -> bool {
        self.key() == other.key()
    }

    /// The front-end symbol behind this binding, if any.
    pub fn symbol(&self) -> Option<SymbolId> {
        match self {
            Binding::Type(b) => b.class_symbol(),
            Binding::Method(b) => Some(b.method),
            Binding::Variable(b) => Some(b.var),
            Binding::Package(b) => Some(b.package),
            Binding::Module(b) => Some(b.module),
            Binding::Annotation(b) => Some(b.annotation_class),
            Binding::MemberValuePair(b) => b.element,
        }
    }

    pub fn modifiers(&self) -> Result<ModifierFlags, BindingError> {
        let Some(sym) = self.symbol() else {
            return Ok(ModifierFlags::empty());
        };
        if matches!(self, Binding::Annotation(_) | Binding::MemberValuePair(_)) {
            return Ok(ModifierFlags::empty());
        }
        self.header()
            .with_state(|state| Ok(state.table().symbol(sym).map(|s| s.modifiers).unwrap_or_default()))
    }

    pub fn is_deprecated(&self) -> Result<bool, BindingError> {
        let Some(sym) = self.symbol() else {
            return Ok(false);
        };
        self.header().with_state(|state| {
            Ok(state
                .table()
                .symbol(sym)
                .is_some_and(|s| s.has_flags(symbol_flags::DEPRECATED) || s.modifiers.contains(ModifierFlags::DEPRECATED)))
        })
    }

    pub fn as_type(&self) -> Option<&TypeBinding> {
        match self {
            Binding::Type(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&MethodBinding> {
        match self {
            Binding::Method(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&VariableBinding> {
        match self {
            Binding::Variable(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_package(&self) -> Option<&PackageBinding> {
        match self {
            Binding::Package(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_annotation(&self) -> Option<&AnnotationBinding> {
        match self {
            Binding::Annotation(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_member_value_pair(&self) -> Option<&MemberValuePairBinding> {
        match self {
            Binding::MemberValuePair(b) => Some(b),
            _ => None,
        }
    }
}

// =============================================================================
// Types
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeRepr {
    Real(Type),
    /// Named only by syntax: the qualified name is a guess built from the
    /// written name and the enclosing file's package.
    Recovered {
        qualified_name: Arc<str>,
        package: Arc<str>,
        dims: u32,
    },
}

#[derive(Debug)]
pub struct TypeBinding {
    pub(crate) head: Header,
    pub(crate) repr: TypeRepr,
}

impl TypeBinding {
    pub fn repr(&self) -> &TypeRepr {
        &self.repr
    }

    /// The front-end type, unless recovered.
    pub fn ty(&self) -> Option<&Type> {
        match &self.repr {
            TypeRepr::Real(ty) => Some(ty),
            TypeRepr::Recovered { .. } => None,
        }
    }

    pub(crate) fn class_symbol(&self) -> Option<SymbolId> {
        self.ty().and_then(Type::class_symbol)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.ty(), Some(Type::Primitive(_) | Type::Void))
    }

    pub fn is_null_type(&self) -> bool {
        matches!(self.ty(), Some(Type::Null))
    }

    pub fn is_array(&self) -> bool {
        self.dimensions() > 0
    }

    pub fn is_parameterized(&self) -> bool {
        matches!(self.ty(), Some(Type::Class { args, .. }) if !args.is_empty())
    }

    pub fn is_type_variable(&self) -> bool {
        matches!(self.ty(), Some(Type::TypeVar(_)))
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self.ty(), Some(Type::Wildcard { .. }))
    }

    pub fn dimensions(&self) -> u32 {
        match &self.repr {
            TypeRepr::Real(ty) => ty.dimensions(),
            TypeRepr::Recovered { dims, .. } => *dims,
        }
    }

    /// Fully qualified source name (`java.util.List<java.lang.String>`,
    /// `int[]`).
    pub fn qualified_name(&self) -> Result<String, BindingError> {
        match &self.repr {
            TypeRepr::Recovered {
                qualified_name, dims, ..
            } => Ok(format!("{qualified_name}{}", "[]".repeat(*dims as usize))),
            TypeRepr::Real(ty) => {
                let ty = ty.clone();
                self.head
                    .with_state(move |state| Ok(qualified_type_name(state.table(), &ty)))
            }
        }
    }

    /// Binary name (`p.A$B`) of class types.
    pub fn binary_name(&self) -> Result<Option<String>, BindingError> {
        let Some(sym) = self.class_symbol() else {
            return Ok(None);
        };
        self.head.with_state(|state| {
            Ok(state
                .table()
                .symbol(sym)
                .and_then(|s| s.class_info())
                .map(|i| i.flat_name.to_string()))
        })
    }

    pub fn class_kind(&self) -> Result<Option<ClassKind>, BindingError> {
        let Some(sym) = self.class_symbol() else {
            return Ok(None);
        };
        self.head.with_state(|state| {
            Ok(state
                .table()
                .symbol(sym)
                .and_then(|s| s.class_info())
                .map(|i| i.class_kind))
        })
    }

    pub fn is_class(&self) -> Result<bool, BindingError> {
        Ok(self.class_kind()? == Some(ClassKind::Class))
    }

    pub fn is_interface(&self) -> Result<bool, BindingError> {
        Ok(matches!(
            self.class_kind()?,
            Some(ClassKind::Interface | ClassKind::Annotation)
        ))
    }

    pub fn is_enum(&self) -> Result<bool, BindingError> {
        Ok(self.class_kind()? == Some(ClassKind::Enum))
    }

    pub fn is_annotation(&self) -> Result<bool, BindingError> {
        Ok(self.class_kind()? == Some(ClassKind::Annotation))
    }

    fn class_flags(&self, flags: u32) -> Result<bool, BindingError> {
        let Some(sym) = self.class_symbol() else {
            return Ok(false);
        };
        self.head
            .with_state(|state| Ok(state.table().symbol(sym).is_some_and(|s| s.has_flags(flags))))
    }

    pub fn is_anonymous(&self) -> Result<bool, BindingError> {
        self.class_flags(symbol_flags::ANONYMOUS)
    }

    pub fn is_local(&self) -> Result<bool, BindingError> {
        self.class_flags(symbol_flags::LOCAL)
    }

    /// Declared in a source unit of this session rather than loaded from
    /// the classpath.
    pub fn is_from_source(&self) -> Result<bool, BindingError> {
        let Some(sym) = self.class_symbol() else {
            return Ok(false);
        };
        self.head.with_state(|state| {
            let table = state.table();
            Ok(table
                .symbol(sym)
                .and_then(|s| s.decl)
                .is_some_and(|d| table.is_source_unit(d.unit)))
        })
    }

    pub fn package(&self) -> Result<Option<Arc<Binding>>, BindingError> {
        match &self.repr {
            TypeRepr::Recovered { package, .. } => {
                let package = package.clone();
                self.head.with_state(move |state| state.package_binding_named(&package))
            }
            TypeRepr::Real(ty) => {
                let Some(sym) = ty.leaf_type().class_symbol() else {
                    return Ok(None);
                };
                self.head.with_state(|state| {
                    let package = state.table().package_of(sym);
                    state.symbol_binding(package, None)
                })
            }
        }
    }

    /// Superclass as seen from this type: `ArrayList<String>` yields
    /// `AbstractList<String>`.
    pub fn superclass(&self) -> Result<Option<Arc<Binding>>, BindingError> {
        let Some(ty) = self.ty().filter(|t| matches!(t, Type::Class { .. })).cloned() else {
            return Ok(None);
        };
        self.head.with_state(move |state| {
            let Some(sym) = ty.class_symbol() else {
                return Ok(None);
            };
            state.table().complete(sym)?;
            let superclass = state
                .table()
                .symbol(sym)
                .and_then(|s| s.class_info())
                .and_then(|i| i.superclass.clone());
            let map = state.table().type_arg_map(sym, ty.type_args());
            Ok(superclass.map(|sup| state.type_binding(&substitute(&sup, &map))))
        })
    }

    pub fn interfaces(&self) -> Result<Vec<Arc<Binding>>, BindingError> {
        let Some(ty) = self.ty().filter(|t| matches!(t, Type::Class { .. })).cloned() else {
            return Ok(Vec::new());
        };
        self.head.with_state(move |state| {
            let Some(sym) = ty.class_symbol() else {
                return Ok(Vec::new());
            };
            state.table().complete(sym)?;
            let interfaces = state
                .table()
                .symbol(sym)
                .and_then(|s| s.class_info())
                .map(|i| i.interfaces.clone())
                .unwrap_or_default();
            let map = state.table().type_arg_map(sym, ty.type_args());
            Ok(interfaces
                .iter()
                .map(|iface| state.type_binding(&substitute(iface, &map)))
                .collect())
        })
    }

    fn declared_members(&self, wanted: impl Fn(&jbridge_binder::Symbol) -> bool) -> Result<Vec<Arc<Binding>>, BindingError> {
        let Some(ty) = self.ty().filter(|t| matches!(t, Type::Class { .. })).cloned() else {
            return Ok(Vec::new());
        };
        self.head.with_state(move |state| {
            let Some(sym) = ty.class_symbol() else {
                return Ok(Vec::new());
            };
            state.table().complete(sym)?;
            let members: Vec<SymbolId> = {
                let table = state.table();
                table
                    .symbol(sym)
                    .and_then(|s| s.class_info())
                    .map(|i| i.members.clone())
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|&m| table.symbol(m).is_some_and(|s| wanted(s)))
                    .collect()
            };
            let receiver = (!ty.type_args().is_empty()).then_some(&ty);
            let mut out = Vec::with_capacity(members.len());
            for member in members {
                if let Some(binding) = state.symbol_binding(member, receiver)? {
                    out.push(binding);
                }
            }
            Ok(out)
        })
    }

    pub fn declared_fields(&self) -> Result<Vec<Arc<Binding>>, BindingError> {
        self.declared_members(|s| s.kind == SymbolKind::Var)
    }

    /// Methods and constructors in declaration order.
    pub fn declared_methods(&self) -> Result<Vec<Arc<Binding>>, BindingError> {
        self.declared_members(|s| s.kind == SymbolKind::Method)
    }

    pub fn declared_types(&self) -> Result<Vec<Arc<Binding>>, BindingError> {
        self.declared_members(|s| s.kind == SymbolKind::Class)
    }

    pub fn type_parameters(&self) -> Result<Vec<Arc<Binding>>, BindingError> {
        let Some(sym) = self.class_symbol() else {
            return Ok(Vec::new());
        };
        self.head.with_state(|state| {
            state.table().complete(sym)?;
            let params = state
                .table()
                .symbol(sym)
                .and_then(|s| s.class_info())
                .map(|i| i.type_params.clone())
                .unwrap_or_default();
            Ok(params
                .into_iter()
                .map(|tv| state.type_binding(&Type::TypeVar(tv)))
                .collect())
        })
    }

    pub fn type_arguments(&self) -> Result<Vec<Arc<Binding>>, BindingError> {
        let args = self.ty().map(|t| t.type_args().to_vec()).unwrap_or_default();
        if args.is_empty() {
            return Ok(Vec::new());
        }
        self.head
            .with_state(move |state| Ok(args.iter().map(|a| state.type_binding(a)).collect()))
    }

    /// Component type of an array (one dimension less).
    pub fn component_type(&self) -> Result<Option<Arc<Binding>>, BindingError> {
        match &self.repr {
            TypeRepr::Real(Type::Array(elem)) => {
                let elem = (**elem).clone();
                self.head.with_state(move |state| Ok(Some(state.type_binding(&elem))))
            }
            TypeRepr::Recovered {
                qualified_name,
                package,
                dims,
            } if *dims > 0 => {
                let (name, package, dims) = (qualified_name.clone(), package.clone(), dims - 1);
                self.head
                    .with_state(move |state| Ok(Some(state.cache.recovered_type(&name, &package, dims))))
            }
            _ => Ok(None),
        }
    }

    /// Innermost non-array type of an array.
    pub fn element_type(&self) -> Result<Option<Arc<Binding>>, BindingError> {
        match &self.repr {
            TypeRepr::Real(ty @ Type::Array(_)) => {
                let leaf = ty.leaf_type().clone();
                self.head.with_state(move |state| Ok(Some(state.type_binding(&leaf))))
            }
            TypeRepr::Recovered {
                qualified_name,
                package,
                dims,
            } if *dims > 0 => {
                let (name, package) = (qualified_name.clone(), package.clone());
                self.head
                    .with_state(move |state| Ok(Some(state.cache.recovered_type(&name, &package, 0))))
            }
            _ => Ok(None),
        }
    }

    pub fn erasure(&self) -> Result<Option<Arc<Binding>>, BindingError> {
        let Some(ty) = self.ty().cloned() else {
            return Ok(None);
        };
        self.head.with_state(move |state| {
            let erased = state.table().erase(&ty);
            Ok(Some(state.type_binding(&erased)))
        })
    }

    /// Enclosing class of a member, local or anonymous class.
    pub fn declaring_class(&self) -> Result<Option<Arc<Binding>>, BindingError> {
        let Some(sym) = self.class_symbol() else {
            return Ok(None);
        };
        self.head.with_state(|state| {
            let outer = state.table().enclosing_class(sym);
            if outer.is_none() {
                return Ok(None);
            }
            Ok(Some(state.type_binding(&Type::class(outer))))
        })
    }
}

/// Qualified source rendering of a type.
pub(crate) fn qualified_type_name(table: &SymbolTable, ty: &Type) -> String {
    match ty {
        Type::Class { sym, args } => {
            let mut out = table.class_name(*sym).to_string();
            if !args.is_empty() {
                let rendered: Vec<String> = args.iter().map(|a| qualified_type_name(table, a)).collect();
                out.push('<');
                out.push_str(&rendered.join(","));
                out.push('>');
            }
            out
        }
        Type::Array(elem) => format!("{}[]", qualified_type_name(table, elem)),
        Type::Wildcard { bound: Some(b), .. } => {
            let display = table.type_display(ty);
            let simple = table.type_display(b);
            display.replace(&simple, &qualified_type_name(table, b))
        }
        other => table.type_display(other),
    }
}

// =============================================================================
// Methods and variables
// =============================================================================

#[derive(Debug)]
pub struct MethodBinding {
    pub(crate) head: Header,
    pub(crate) method: SymbolId,
    /// Parameterized declaring type the method was reached through.
    pub(crate) receiver: Option<Type>,
    pub(crate) constructor: bool,
}

impl MethodBinding {
    pub fn is_constructor(&self) -> bool {
        self.constructor
    }

    pub fn symbol(&self) -> SymbolId {
        self.method
    }

    fn seen(&self, state: &mut SessionState, ty: &Type) -> Result<Type, BindingError> {
        match &self.receiver {
            Some(receiver) => Ok(state.table().member_type_in(receiver, self.method, ty)?),
            None => Ok(ty.clone()),
        }
    }

    pub fn parameter_types(&self) -> Result<Vec<Arc<Binding>>, BindingError> {
        self.head.with_state(|state| {
            let params = state.table().param_types(self.method);
            let mut out = Vec::with_capacity(params.len());
            for param in params {
                let seen = self.seen(state, &param)?;
                out.push(state.type_binding(&seen));
            }
            Ok(out)
        })
    }

    pub fn return_type(&self) -> Result<Arc<Binding>, BindingError> {
        self.head.with_state(|state| {
            let ty = if self.constructor {
                Type::Void
            } else {
                state.table().return_type(self.method)
            };
            let seen = self.seen(state, &ty)?;
            Ok(state.type_binding(&seen))
        })
    }

    pub fn exception_types(&self) -> Result<Vec<Arc<Binding>>, BindingError> {
        self.head.with_state(|state| {
            let thrown = state
                .table()
                .symbol(self.method)
                .and_then(|s| s.method_info())
                .map(|i| i.thrown.clone())
                .unwrap_or_default();
            Ok(thrown.iter().map(|t| state.type_binding(t)).collect())
        })
    }

    pub fn type_parameters(&self) -> Result<Vec<Arc<Binding>>, BindingError> {
        self.head.with_state(|state| {
            let params = state
                .table()
                .symbol(self.method)
                .and_then(|s| s.method_info())
                .map(|i| i.type_params.clone())
                .unwrap_or_default();
            Ok(params
                .into_iter()
                .map(|tv| state.type_binding(&Type::TypeVar(tv)))
                .collect())
        })
    }

    pub fn declaring_class(&self) -> Result<Option<Arc<Binding>>, BindingError> {
        self.head.with_state(|state| {
            if let Some(receiver) = &self.receiver {
                return Ok(Some(state.type_binding(receiver)));
            }
            let owner = state.table().enclosing_class(self.method);
            if owner.is_none() {
                return Ok(None);
            }
            Ok(Some(state.type_binding(&Type::class(owner))))
        })
    }

    pub fn is_varargs(&self) -> Result<bool, BindingError> {
        self.head.with_state(|state| {
            Ok(state
                .table()
                .symbol(self.method)
                .is_some_and(|s| s.has_flags(symbol_flags::VARARGS)))
        })
    }

    /// Methods of supertypes this method overrides, nearest first.
    pub fn overridden_methods(&self) -> Result<Vec<Arc<Binding>>, BindingError> {
        self.head.with_state(|state| {
            let overridden = state.table().overridden_methods(self.method)?;
            let mut out = Vec::with_capacity(overridden.len());
            for method in overridden {
                if let Some(binding) = state.symbol_binding(method, None)? {
                    out.push(binding);
                }
            }
            Ok(out)
        })
    }

    pub fn overrides(&self, other: &MethodBinding) -> Result<bool, BindingError> {
        let target = other.method;
        self.head.with_state(|state| {
            Ok(state
                .table()
                .overridden_methods(self.method)?
                .contains(&target))
        })
    }

    /// Source text of an annotation member's `default` value.
    pub fn default_value(&self) -> Result<Option<String>, BindingError> {
        self.head
            .with_state(|state| Ok(default_value_text(state.table(), self.method)))
    }
}

pub(crate) fn default_value_text(table: &SymbolTable, method: SymbolId) -> Option<String> {
    let decl = table.symbol(method)?.decl?;
    let tree = table.tree(decl.unit)?;
    match tree.arena.data(decl.node) {
        Some(NodeData::MethodDecl { default_value, .. }) if default_value.is_some() => {
            Some(tree.node_text(*default_value).to_string())
        }
        _ => None,
    }
}

#[derive(Debug)]
pub struct VariableBinding {
    pub(crate) head: Header,
    pub(crate) var: SymbolId,
    pub(crate) receiver: Option<Type>,
    pub(crate) var_kind: VarKind,
    pub(crate) index: u32,
}

impl VariableBinding {
    pub fn symbol(&self) -> SymbolId {
        self.var
    }

    pub fn is_field(&self) -> bool {
        self.var_kind == VarKind::Field
    }

    pub fn is_parameter(&self) -> bool {
        self.var_kind == VarKind::Param
    }

    /// Occurrence index among same-named locals, or parameter position.
    pub fn variable_id(&self) -> u32 {
        self.index
    }

    pub fn is_enum_constant(&self) -> Result<bool, BindingError> {
        self.head.with_state(|state| {
            Ok(state
                .table()
                .symbol(self.var)
                .is_some_and(|s| s.has_flags(symbol_flags::ENUM_CONSTANT)))
        })
    }

    pub fn ty(&self) -> Result<Arc<Binding>, BindingError> {
        self.head.with_state(|state| {
            let declared = state.table().var_type(self.var);
            let seen = match &self.receiver {
                Some(receiver) => state.table().member_type_in(receiver, self.var, &declared)?,
                None => declared,
            };
            Ok(state.type_binding(&seen))
        })
    }

    pub fn declaring_class(&self) -> Result<Option<Arc<Binding>>, BindingError> {
        if !self.is_field() {
            return Ok(None);
        }
        self.head.with_state(|state| {
            if let Some(receiver) = &self.receiver {
                return Ok(Some(state.type_binding(receiver)));
            }
            let owner = state.table().enclosing_class(self.var);
            if owner.is_none() {
                return Ok(None);
            }
            Ok(Some(state.type_binding(&Type::class(owner))))
        })
    }

    /// Method declaring a local variable or parameter.
    pub fn declaring_method(&self) -> Result<Option<Arc<Binding>>, BindingError> {
        if self.is_field() {
            return Ok(None);
        }
        self.head.with_state(|state| {
            let owner = state.table().symbol(self.var).map_or(SymbolId::NONE, |s| s.owner);
            if state.table().symbols.kind(owner) != Some(SymbolKind::Method) {
                return Ok(None);
            }
            state.symbol_binding(owner, None)
        })
    }

    /// Source text of a constant initializer.
    pub fn constant_value(&self) -> Result<Option<Arc<str>>, BindingError> {
        self.head.with_state(|state| {
            Ok(state
                .table()
                .symbol(self.var)
                .and_then(|s| s.var_info())
                .and_then(|v| v.constant.clone()))
        })
    }
}

// =============================================================================
// Packages and modules
// =============================================================================

#[derive(Debug)]
pub struct PackageBinding {
    pub(crate) head: Header,
    pub(crate) package: SymbolId,
}

impl PackageBinding {
    pub fn is_unnamed(&self) -> bool {
        self.head.name.is_empty()
    }

    pub fn name_components(&self) -> Vec<&str> {
        if self.is_unnamed() {
            Vec::new()
        } else {
            self.head.name.split('.').collect()
        }
    }
}

#[derive(Debug)]
pub struct ModuleBinding {
    pub(crate) head: Header,
    pub(crate) module: SymbolId,
    pub(crate) is_open: bool,
}

impl ModuleBinding {
    pub fn is_open(&self) -> bool {
        self.is_open
    }
}

pub(crate) fn module_is_open(table: &SymbolTable, module: SymbolId) -> bool {
    matches!(table.symbol(module).map(|s| &s.info), Some(SymbolInfo::Module(m)) if m.is_open)
}

// =============================================================================
// Annotations
// =============================================================================

#[derive(Debug)]
pub struct AnnotationBinding {
    pub(crate) head: Header,
    pub(crate) recipient: SymbolId,
    pub(crate) annotation_class: SymbolId,
    /// The `Annotation` node in the front-end tree.
    pub(crate) decl: DeclRef,
}

impl AnnotationBinding {
    pub fn recipient(&self) -> SymbolId {
        self.recipient
    }

    pub fn annotation_type(&self) -> Result<Arc<Binding>, BindingError> {
        let class = self.annotation_class;
        self.head
            .with_state(move |state| Ok(state.type_binding(&Type::class(class))))
    }

    /// Pairs written at the use site, in source order.
    pub fn declared_member_value_pairs(&self) -> Result<Vec<Arc<Binding>>, BindingError> {
        self.head
            .with_state(|state| member_value_pairs(&mut state.cache, &mut state.ctx.table, self, false))
    }

    /// Declared pairs plus a pair for every member left at its default,
    /// sorted by member name.
    pub fn all_member_value_pairs(&self) -> Result<Vec<Arc<Binding>>, BindingError> {
        self.head
            .with_state(|state| member_value_pairs(&mut state.cache, &mut state.ctx.table, self, true))
    }
}

pub(crate) fn member_value_pairs(
    cache: &mut BindingCache,
    table: &mut SymbolTable,
    annotation: &AnnotationBinding,
    with_defaults: bool,
) -> Result<Vec<Arc<Binding>>, BindingError> {
    let declared = declared_pairs(table, annotation.annotation_class, annotation.decl)?;
    let mut entries: Vec<(String, Option<SymbolId>, Option<String>, bool)> = declared
        .into_iter()
        .map(|(name, element, value)| (name, element, Some(value), false))
        .collect();
    if with_defaults {
        table.complete(annotation.annotation_class)?;
        let members = table
            .symbol(annotation.annotation_class)
            .and_then(|s| s.class_info())
            .map(|i| i.members.clone())
            .unwrap_or_default();
        for member in members {
            let Some(symbol) = table.symbol(member) else {
                continue;
            };
            if symbol.kind != SymbolKind::Method || !symbol.has_flags(symbol_flags::HAS_DEFAULT) {
                continue;
            }
            let name = table.name(symbol.name).to_string();
            if entries.iter().any(|(n, ..)| *n == name) {
                continue;
            }
            entries.push((name, Some(member), default_value_text(table, member), true));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
    }
    Ok(entries
        .into_iter()
        .map(|(name, element, value, is_default)| {
            cache.member_value_pair(&annotation.head.key, &name, element, value, is_default)
        })
        .collect())
}

/// `(member name, member symbol, value text)` of the pairs written in an
/// annotation.
fn declared_pairs(
    table: &mut SymbolTable,
    annotation_class: SymbolId,
    decl: DeclRef,
) -> Result<Vec<(String, Option<SymbolId>, String)>, BindingError> {
    let Some(tree) = table.tree(decl.unit) else {
        return Ok(Vec::new());
    };
    let Some(NodeData::Annotation { args, .. }) = tree.arena.data(decl.node) else {
        return Ok(Vec::new());
    };
    let mut out = Vec::with_capacity(args.len());
    for &arg in args.iter() {
        match tree.arena.data(arg) {
            Some(NodeData::Assign { target, value, .. }) => {
                let name = tree.node_text(*target).to_string();
                out.push((
                    name,
                    table.symbol_at(decl.unit, arg),
                    tree.node_text(*value).to_string(),
                ));
            }
            _ => {
                let value_name = table.intern("value");
                let element = table.find_methods(annotation_class, value_name)?.first().copied();
                out.push(("value".to_string(), element, tree.node_text(arg).to_string()));
            }
        }
    }
    Ok(out)
}

#[derive(Debug)]
pub struct MemberValuePairBinding {
    pub(crate) head: Header,
    pub(crate) element: Option<SymbolId>,
    pub(crate) value: Option<String>,
    pub(crate) is_default: bool,
}

impl MemberValuePairBinding {
    /// Source text of the value.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Synthesized from the member's `default` rather than written.
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    /// The annotation member this pair assigns.
    pub fn method_binding(&self) -> Result<Option<Arc<Binding>>, BindingError> {
        let Some(element) = self.element else {
            return Ok(None);
        };
        self.head.with_state(|state| state.symbol_binding(element, None))
    }
}
