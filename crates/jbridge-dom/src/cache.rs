//! Binding keys computed from front-end symbols, the per-session binding
//! cache, and key lookup.

use std::sync::{Arc, Weak};

use jbridge_binder::{
    CompletionFailure, DeclRef, PrimitiveKind, SymbolId, SymbolInfo, SymbolKind, SymbolTable, Type,
    substitute,
};
use jbridge_parser::{VarKind, WildcardBound};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::binding::{
    AnnotationBinding, Binding, Header, MemberValuePairBinding, MethodBinding, ModuleBinding,
    PackageBinding, TypeBinding, TypeRepr, VariableBinding, member_value_pairs, module_is_open,
};
use crate::key::{BindingKey, MethodKey, TypeKey};
use crate::session::{BindingError, Session};

const OBJECT_PATH: &str = "java/lang/Object";

// =============================================================================
// Key computation
// =============================================================================

pub fn type_key(table: &SymbolTable, ty: &Type) -> TypeKey {
    match ty {
        Type::Primitive(kind) => TypeKey::Primitive(kind.descriptor()),
        Type::Void => TypeKey::Void,
        Type::Null => TypeKey::Null,
        Type::Class { sym, args } => {
            let path = table
                .symbol(*sym)
                .and_then(|s| s.class_info())
                .map_or_else(|| table.class_name(*sym).to_string(), |i| i.flat_name.to_string())
                .replace('.', "/");
            TypeKey::Class {
                path,
                args: args.iter().map(|a| type_key(table, a)).collect(),
            }
        }
        Type::Array(elem) => TypeKey::Array(Box::new(type_key(table, elem))),
        Type::TypeVar(sym) => TypeKey::TypeVar(table.symbol_name(*sym).to_string()),
        Type::Wildcard { bound_kind, bound } => TypeKey::Wildcard {
            kind: match bound_kind {
                WildcardBound::Unbound => '*',
                WildcardBound::Extends => '+',
                WildcardBound::Super => '-',
            },
            bound: bound.as_ref().map(|b| Box::new(type_key(table, b))),
        },
        Type::Error { name } => TypeKey::class(name),
        Type::Unknown => TypeKey::Class {
            path: OBJECT_PATH.to_string(),
            args: Vec::new(),
        },
    }
}

/// `receiver` viewed as the class declaring `member`, or the raw
/// declaring class.
fn declaring_type(table: &mut SymbolTable, member: SymbolId, receiver: Option<&Type>) -> Result<Type, CompletionFailure> {
    let owner = table.enclosing_class(member);
    if let Some(receiver) = receiver
        && let Some(seen) = table.as_super(receiver, owner)?
    {
        return Ok(seen);
    }
    Ok(Type::class(owner))
}

fn seen_in(table: &SymbolTable, owner: &Type, ty: &Type) -> Type {
    match owner {
        Type::Class { sym, args } if !args.is_empty() => substitute(ty, &table.type_arg_map(*sym, args)),
        _ => ty.clone(),
    }
}

fn method_key(table: &mut SymbolTable, method: SymbolId, receiver: Option<&Type>) -> Result<MethodKey, CompletionFailure> {
    let owner = declaring_type(table, method, receiver)?;
    Ok(method_key_in(table, method, &owner))
}

/// Key of `method` as a member of `owner`.
fn method_key_in(table: &SymbolTable, method: SymbolId, owner: &Type) -> MethodKey {
    let Some(symbol) = table.symbol(method) else {
        return MethodKey {
            owner: type_key(table, owner),
            name: String::new(),
            type_params: Vec::new(),
            params: Vec::new(),
            return_type: TypeKey::Void,
            thrown: Vec::new(),
        };
    };
    let constructor = symbol.is_constructor();
    let name = if constructor {
        String::new()
    } else {
        table.name(symbol.name).to_string()
    };
    let info = symbol.method_info().cloned();
    let type_params = info
        .as_ref()
        .map(|i| {
            i.type_params
                .iter()
                .map(|&tv| {
                    let bound = table
                        .symbol(tv)
                        .and_then(|s| match &s.info {
                            SymbolInfo::TypeVar(t) => t.bounds.first().cloned(),
                            _ => None,
                        })
                        .map_or(
                            TypeKey::Class {
                                path: OBJECT_PATH.to_string(),
                                args: Vec::new(),
                            },
                            |b| type_key(table, &b),
                        );
                    (table.symbol_name(tv).to_string(), bound)
                })
                .collect()
        })
        .unwrap_or_default();
    let params = table
        .param_types(method)
        .iter()
        .map(|p| type_key(table, &seen_in(table, owner, p)))
        .collect();
    let return_type = if constructor {
        TypeKey::Void
    } else {
        type_key(table, &seen_in(table, owner, &table.return_type(method)))
    };
    let thrown = info
        .map(|i| i.thrown.iter().map(|t| type_key(table, t)).collect())
        .unwrap_or_default();
    MethodKey {
        owner: type_key(table, owner),
        name,
        type_params,
        params,
        return_type,
        thrown,
    }
}

/// Key of a type variable qualified by its declaring class or method,
/// e.g. `Lp/A;:TT;`.
fn type_var_key(table: &SymbolTable, tv: SymbolId) -> Option<BindingKey> {
    let symbol = table.symbol(tv)?;
    let owner = symbol.owner;
    let owner_key = match table.symbol(owner)?.kind {
        SymbolKind::Class => BindingKey::Type(type_key(table, &Type::class(owner))),
        SymbolKind::Method => {
            let declaring = Type::class(table.enclosing_class(owner));
            BindingKey::Method(method_key_in(table, owner, &declaring))
        }
        _ => return None,
    };
    Some(BindingKey::TypeVariable {
        owner: Box::new(owner_key),
        name: table.name(symbol.name).to_string(),
    })
}

/// Key of a symbol, optionally reached through a parameterized receiver.
pub fn symbol_key(
    table: &mut SymbolTable,
    sym: SymbolId,
    receiver: Option<&Type>,
) -> Result<Option<BindingKey>, CompletionFailure> {
    let Some(symbol) = table.symbol(sym) else {
        return Ok(None);
    };
    let (kind, owner, name) = (symbol.kind, symbol.owner, table.name(symbol.name));
    let key = match kind {
        SymbolKind::Package => BindingKey::Package(table.package_name(sym).to_string()),
        SymbolKind::Module => match &symbol.info {
            SymbolInfo::Module(info) => BindingKey::Module(info.qualified_name.to_string()),
            _ => BindingKey::Module(name.to_string()),
        },
        SymbolKind::Class => {
            let ty = match receiver {
                Some(r) if r.class_symbol() == Some(sym) => r.clone(),
                _ => Type::class(sym),
            };
            BindingKey::Type(type_key(table, &ty))
        }
        SymbolKind::Method => BindingKey::Method(method_key(table, sym, receiver)?),
        SymbolKind::Var => {
            let (var_kind, index) = symbol
                .var_info()
                .map_or((VarKind::Local, 0), |v| (v.var_kind, v.index));
            if var_kind == VarKind::Field {
                let owner_ty = declaring_type(table, sym, receiver)?;
                let ty = seen_in(table, &owner_ty, &table.var_type(sym));
                BindingKey::Field {
                    owner: type_key(table, &owner_ty),
                    name: name.to_string(),
                    ty: type_key(table, &ty),
                }
            } else {
                let Some(owner_key) = symbol_key(table, owner, None)? else {
                    return Ok(None);
                };
                BindingKey::LocalVariable {
                    owner: Box::new(owner_key),
                    name: name.to_string(),
                    occurrence: index,
                }
            }
        }
        SymbolKind::TypeVar => {
            let Some(owner_key) = symbol_key(table, owner, None)? else {
                return Ok(None);
            };
            BindingKey::TypeVariable {
                owner: Box::new(owner_key),
                name: name.to_string(),
            }
        }
    };
    Ok(Some(key))
}

/// Resolve a type key against the table, loading classes as needed.
pub fn resolve_type_key(table: &mut SymbolTable, key: &TypeKey) -> Result<Option<Type>, CompletionFailure> {
    Ok(match key {
        TypeKey::Primitive(c) => PrimitiveKind::from_descriptor(*c).map(Type::Primitive),
        TypeKey::Void => Some(Type::Void),
        TypeKey::Null => Some(Type::Null),
        TypeKey::Class { args, .. } => {
            let (Some(binary), Some(canonical)) = (key.binary_name(), key.canonical_name()) else {
                return Ok(None);
            };
            let sym = match table.class_by_flat_name(&binary) {
                Some(sym) => Some(sym),
                None => table.load_class(&canonical)?,
            };
            let Some(sym) = sym else {
                return Ok(None);
            };
            let mut resolved = Vec::with_capacity(args.len());
            for arg in args {
                match resolve_type_key(table, arg)? {
                    Some(ty) => resolved.push(ty),
                    None => return Ok(None),
                }
            }
            Some(Type::Class { sym, args: resolved })
        }
        TypeKey::Array(elem) => resolve_type_key(table, elem)?.map(|e| Type::Array(Box::new(e))),
        // Free type variables have no scope to resolve in.
        TypeKey::TypeVar(_) => None,
        TypeKey::Wildcard { kind, bound } => {
            let bound_kind = match kind {
                '+' => WildcardBound::Extends,
                '-' => WildcardBound::Super,
                _ => WildcardBound::Unbound,
            };
            let bound = match bound {
                Some(b) => match resolve_type_key(table, b)? {
                    Some(ty) => Some(Box::new(ty)),
                    None => return Ok(None),
                },
                None => None,
            };
            Some(Type::Wildcard { bound_kind, bound })
        }
    })
}

// =============================================================================
// Cache
// =============================================================================

/// One binding instance per key within a session.
#[derive(Debug)]
pub struct BindingCache {
    session: Weak<Session>,
    symbols: FxHashMap<(SymbolId, Option<Type>), Arc<Binding>>,
    types: FxHashMap<Type, Arc<Binding>>,
    keys: FxHashMap<Arc<str>, Arc<Binding>>,
}

impl BindingCache {
    pub(crate) fn new(session: Weak<Session>) -> Self {
        BindingCache {
            session,
            symbols: FxHashMap::default(),
            types: FxHashMap::default(),
            keys: FxHashMap::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.symbols.clear();
        self.types.clear();
        self.keys.clear();
    }

    fn header(&self, key: Arc<str>, name: &str, recovered: bool) -> Header {
        Header {
            session: self.session.clone(),
            key,
            name: Arc::from(name),
            recovered,
        }
    }

    fn intern(&mut self, key: String, build: impl FnOnce(&Self, Arc<str>) -> Binding) -> Arc<Binding> {
        if let Some(existing) = self.keys.get(key.as_str()) {
            return existing.clone();
        }
        let key: Arc<str> = Arc::from(key);
        let binding = Arc::new(build(self, key.clone()));
        trace!(key = %key, kind = ?binding.kind(), "binding created");
        self.keys.insert(key, binding.clone());
        binding
    }

    pub fn type_binding(&mut self, table: &SymbolTable, ty: &Type) -> Arc<Binding> {
        if let Some(existing) = self.types.get(ty) {
            return existing.clone();
        }
        let key = match ty {
            Type::TypeVar(tv) => type_var_key(table, *tv).map(|k| k.to_string()),
            _ => None,
        }
        .unwrap_or_else(|| type_key(table, ty).to_string());
        let name = table.type_display(ty);
        let recovered = ty.leaf_type().is_error();
        let binding = self.intern(key, |cache, key| {
            Binding::Type(TypeBinding {
                head: cache.header(key, &name, recovered),
                repr: TypeRepr::Real(ty.clone()),
            })
        });
        self.types.insert(ty.clone(), binding.clone());
        binding
    }

    /// Type binding for a name no symbol backs.
    pub fn recovered_type(&mut self, qualified_name: &str, package: &str, dims: u32) -> Arc<Binding> {
        let key = TypeKey::array_of(TypeKey::class(qualified_name), dims).to_string();
        let simple = qualified_name.rsplit('.').next().unwrap_or(qualified_name);
        let name = format!("{simple}{}", "[]".repeat(dims as usize));
        self.intern(key, |cache, key| {
            Binding::Type(TypeBinding {
                head: cache.header(key, &name, true),
                repr: TypeRepr::Recovered {
                    qualified_name: Arc::from(qualified_name),
                    package: Arc::from(package),
                    dims,
                },
            })
        })
    }

    pub fn symbol_binding(
        &mut self,
        table: &mut SymbolTable,
        sym: SymbolId,
        receiver: Option<&Type>,
    ) -> Result<Option<Arc<Binding>>, BindingError> {
        let receiver = receiver.filter(|r| !r.type_args().is_empty()).cloned();
        let cache_key = (sym, receiver);
        if let Some(existing) = self.symbols.get(&cache_key) {
            return Ok(Some(existing.clone()));
        }
        let (sym, receiver) = cache_key;
        let Some(symbol) = table.symbol(sym) else {
            return Ok(None);
        };
        let kind = symbol.kind;
        if kind == SymbolKind::Class {
            let ty = match &receiver {
                Some(r) if r.class_symbol() == Some(sym) => r.clone(),
                _ => Type::class(sym),
            };
            let binding = self.type_binding(table, &ty);
            self.symbols.insert((sym, receiver), binding.clone());
            return Ok(Some(binding));
        }
        if kind == SymbolKind::TypeVar {
            return Ok(Some(self.type_binding(table, &Type::TypeVar(sym))));
        }
        let constructor = symbol.is_constructor();
        let (var_kind, index) = symbol
            .var_info()
            .map_or((VarKind::Local, 0), |v| (v.var_kind, v.index));
        let name = if constructor {
            table.symbol_name(table.enclosing_class(sym))
        } else {
            table.symbol_name(sym)
        };
        let Some(key) = symbol_key(table, sym, receiver.as_ref())? else {
            return Ok(None);
        };
        let display = match &key {
            BindingKey::Package(qualified) | BindingKey::Module(qualified) => qualified.clone(),
            _ => name.to_string(),
        };
        let is_open = module_is_open(table, sym);
        let binding = self.intern(key.to_string(), |cache, key| {
            let head = cache.header(key, &display, false);
            match kind {
                SymbolKind::Package => Binding::Package(PackageBinding { head, package: sym }),
                SymbolKind::Module => Binding::Module(ModuleBinding {
                    head,
                    module: sym,
                    is_open,
                }),
                SymbolKind::Method => Binding::Method(MethodBinding {
                    head,
                    method: sym,
                    receiver: receiver.clone(),
                    constructor,
                }),
                _ => Binding::Variable(VariableBinding {
                    head,
                    var: sym,
                    receiver: receiver.clone(),
                    var_kind,
                    index,
                }),
            }
        });
        self.symbols.insert((sym, receiver), binding.clone());
        Ok(Some(binding))
    }

    /// Binding of the annotation written at `decl` on `recipient`.
    pub fn annotation_binding(
        &mut self,
        table: &mut SymbolTable,
        recipient: SymbolId,
        decl: DeclRef,
    ) -> Result<Option<Arc<Binding>>, BindingError> {
        let Some(annotation_class) = table.symbol_at(decl.unit, decl.node) else {
            return Ok(None);
        };
        let Some(recipient_key) = symbol_key(table, recipient, None)? else {
            return Ok(None);
        };
        let key = BindingKey::Annotation {
            recipient: Box::new(recipient_key),
            annotation_type: type_key(table, &Type::class(annotation_class)),
        };
        let name = table.symbol_name(annotation_class);
        Ok(Some(self.intern(key.to_string(), |cache, key| {
            Binding::Annotation(AnnotationBinding {
                head: cache.header(key, &name, false),
                recipient,
                annotation_class,
                decl,
            })
        })))
    }

    pub fn member_value_pair(
        &mut self,
        annotation_key: &str,
        name: &str,
        element: Option<SymbolId>,
        value: Option<String>,
        is_default: bool,
    ) -> Arc<Binding> {
        let key = format!("{annotation_key}.{name}");
        self.intern(key, |cache, key| {
            Binding::MemberValuePair(MemberValuePairBinding {
                head: cache.header(key, name, false),
                element,
                value,
                is_default,
            })
        })
    }

    /// Binding named by `key`, or `None` when nothing in the session
    /// answers to it.
    pub fn find_by_key(&mut self, table: &mut SymbolTable, key: &BindingKey) -> Result<Option<Arc<Binding>>, BindingError> {
        let text = key.to_string();
        if let Some(existing) = self.keys.get(text.as_str()) {
            return Ok(Some(existing.clone()));
        }
        match key {
            BindingKey::Package(name) => {
                if !name.is_empty() && !table.package_exists(name) {
                    return Ok(None);
                }
                let package = table.enter_package(name);
                self.symbol_binding(table, package, None)
            }
            BindingKey::Module(name) => match table.module(name) {
                Some(module) => self.symbol_binding(table, module, None),
                None => Ok(None),
            },
            BindingKey::Type(type_key) => Ok(resolve_type_key(table, type_key)?.map(|ty| self.type_binding(table, &ty))),
            BindingKey::Method(method) => {
                let Some(owner) = resolve_type_key(table, &method.owner)? else {
                    return Ok(None);
                };
                let Some(class) = owner.class_symbol() else {
                    return Ok(None);
                };
                let candidates = if method.is_constructor() {
                    table.constructors(class)?
                } else {
                    let name = table.intern(&method.name);
                    table.find_methods(class, name)?
                };
                self.first_matching(table, candidates, &owner, &text)
            }
            BindingKey::Field { owner, name, .. } => {
                let Some(owner) = resolve_type_key(table, owner)? else {
                    return Ok(None);
                };
                let Some(class) = owner.class_symbol() else {
                    return Ok(None);
                };
                let name = table.intern(name);
                let candidates = table.find_field(class, name)?.into_iter().collect();
                self.first_matching(table, candidates, &owner, &text)
            }
            BindingKey::LocalVariable {
                owner,
                name,
                occurrence,
            } => {
                let Some(owner_sym) = self.find_by_key(table, owner)?.and_then(|b| b.symbol()) else {
                    return Ok(None);
                };
                let found = table.symbols.iter().find_map(|(id, s)| {
                    let local = s.kind == SymbolKind::Var
                        && s.owner == owner_sym
                        && s.var_info().is_some_and(|v| v.var_kind != VarKind::Field && v.index == *occurrence);
                    (local && table.name(s.name).as_ref() == name.as_str()).then_some(id)
                });
                match found {
                    Some(var) => self.symbol_binding(table, var, None),
                    None => Ok(None),
                }
            }
            BindingKey::TypeVariable { owner, name } => {
                let Some(owner_sym) = self.find_by_key(table, owner)?.and_then(|b| b.symbol()) else {
                    return Ok(None);
                };
                table.complete(owner_sym)?;
                let params = match table.symbol(owner_sym).map(|s| &s.info) {
                    Some(SymbolInfo::Class(info)) => info.type_params.clone(),
                    Some(SymbolInfo::Method(info)) => info.type_params.clone(),
                    _ => Vec::new(),
                };
                let found = params
                    .into_iter()
                    .find(|&tv| table.symbol_name(tv).as_ref() == name.as_str());
                Ok(found.map(|tv| self.type_binding(table, &Type::TypeVar(tv))))
            }
            BindingKey::Annotation {
                recipient,
                annotation_type,
            } => {
                let Some(recipient_sym) = self.find_by_key(table, recipient)?.and_then(|b| b.symbol()) else {
                    return Ok(None);
                };
                let decls = table
                    .symbol(recipient_sym)
                    .map(|s| s.annotations.clone())
                    .unwrap_or_default();
                for decl in decls {
                    let Some(class) = table.symbol_at(decl.unit, decl.node) else {
                        continue;
                    };
                    if type_key(table, &Type::class(class)) == *annotation_type {
                        return self.annotation_binding(table, recipient_sym, decl);
                    }
                }
                Ok(None)
            }
            BindingKey::MemberValuePair { annotation, name } => {
                let Some(binding) = self.find_by_key(table, annotation)? else {
                    return Ok(None);
                };
                let Some(annotation) = binding.as_annotation() else {
                    return Ok(None);
                };
                let pairs = member_value_pairs(self, table, annotation, true)?;
                Ok(pairs.into_iter().find(|p| p.name() == name.as_str()))
            }
        }
    }

    fn first_matching(
        &mut self,
        table: &mut SymbolTable,
        candidates: Vec<SymbolId>,
        owner: &Type,
        key: &str,
    ) -> Result<Option<Arc<Binding>>, BindingError> {
        let receiver = (!owner.type_args().is_empty()).then_some(owner);
        for candidate in candidates {
            if table.enclosing_class(candidate) != owner.class_symbol().unwrap_or(SymbolId::NONE) {
                continue;
            }
            let matches = symbol_key(table, candidate, receiver)?.is_some_and(|k| k.to_string() == key);
            if matches {
                return self.symbol_binding(table, candidate, receiver);
            }
        }
        Ok(None)
    }

    /// `int`, `void` and classes of the platform library by qualified name.
    pub fn well_known_type(&mut self, table: &mut SymbolTable, name: &str) -> Result<Option<Arc<Binding>>, BindingError> {
        if let Some(kind) = PrimitiveKind::from_name(name) {
            return Ok(Some(self.type_binding(table, &Type::Primitive(kind))));
        }
        if name == "void" {
            return Ok(Some(self.type_binding(table, &Type::Void)));
        }
        if !name.starts_with("java.") {
            return Ok(None);
        }
        Ok(table.load_class(name)?.map(|sym| self.type_binding(table, &Type::class(sym))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_type_keys_as_object() {
        let key = TypeKey::Class {
            path: OBJECT_PATH.to_string(),
            args: Vec::new(),
        };
        assert_eq!(key.to_string(), "Ljava/lang/Object;");
        assert_eq!(key.canonical_name().as_deref(), Some("java.lang.Object"));
    }
}
