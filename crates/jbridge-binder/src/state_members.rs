//! Member lookup along the class hierarchy.
//!
//! Supertypes are returned as seen from the class that asked: walking from
//! `ArrayList<E>` to `Collection` yields `Collection<E>`, with the type
//! arguments of every intermediate supertype substituted along the way.

use std::collections::VecDeque;

use jbridge_common::Atom;
use jbridge_common::limits::MAX_SUPERTYPE_DEPTH;
use jbridge_parser::ClassKind;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::state::{CompletionFailure, SymbolTable};
use crate::symbols::{SymbolId, SymbolInfo, SymbolKind, symbol_flags};
use crate::types::Type;

/// Type variable substitution.
pub type Substitution = FxHashMap<SymbolId, Type>;

pub fn substitute(ty: &Type, map: &Substitution) -> Type {
    if map.is_empty() {
        return ty.clone();
    }
    match ty {
        Type::TypeVar(tv) => map.get(tv).cloned().unwrap_or_else(|| ty.clone()),
        Type::Class { sym, args } => Type::Class {
            sym: *sym,
            args: args.iter().map(|a| substitute(a, map)).collect(),
        },
        Type::Array(elem) => Type::Array(Box::new(substitute(elem, map))),
        Type::Wildcard { bound_kind, bound } => Type::Wildcard {
            bound_kind: *bound_kind,
            bound: bound.as_ref().map(|b| Box::new(substitute(b, map))),
        },
        other => other.clone(),
    }
}

impl SymbolTable {
    /// Declared superclass and interfaces of a completed class.
    pub fn direct_supertypes(&self, class: SymbolId) -> Vec<Type> {
        let Some(info) = self.symbols.get(class).and_then(|s| s.class_info()) else {
            return Vec::new();
        };
        info.superclass
            .iter()
            .chain(info.interfaces.iter())
            .cloned()
            .collect()
    }

    /// Maps the type parameters of `class` to `args`. Raw and non-generic
    /// uses map nothing.
    pub fn type_arg_map(&self, class: SymbolId, args: &[Type]) -> Substitution {
        let params = self
            .symbols
            .get(class)
            .and_then(|s| s.class_info())
            .map(|i| i.type_params.as_slice())
            .unwrap_or(&[]);
        if params.is_empty() || params.len() != args.len() {
            return Substitution::default();
        }
        params.iter().copied().zip(args.iter().cloned()).collect()
    }

    /// Every supertype of `class`, nearest first, in terms of the type
    /// parameters of `class`. Interfaces include `java.lang.Object`.
    pub fn all_supertypes(&mut self, class: SymbolId) -> Result<Vec<Type>, CompletionFailure> {
        self.complete(class)?;
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        seen.insert(class);
        let mut queue: VecDeque<(Type, u32)> = self
            .direct_supertypes(class)
            .into_iter()
            .map(|t| (t, 1))
            .collect();
        while let Some((ty, depth)) = queue.pop_front() {
            let Some(sym) = ty.class_symbol() else {
                continue;
            };
            if !seen.insert(sym) {
                continue;
            }
            out.push(ty.clone());
            if depth >= MAX_SUPERTYPE_DEPTH {
                continue;
            }
            self.complete(sym)?;
            let map = self.type_arg_map(sym, ty.type_args());
            for sup in self.direct_supertypes(sym) {
                queue.push_back((substitute(&sup, &map), depth + 1));
            }
        }
        let is_interface = self
            .symbols
            .get(class)
            .and_then(|s| s.class_info())
            .is_some_and(|i| matches!(i.class_kind, ClassKind::Interface | ClassKind::Annotation));
        if is_interface
            && let Some(object) = self.load_class("java.lang.Object")?
            && seen.insert(object)
        {
            out.push(Type::class(object));
        }
        Ok(out)
    }

    /// `ty` viewed as an instance of `target` (`as_super(ArrayList<String>,
    /// List)` is `List<String>`).
    pub fn as_super(&mut self, ty: &Type, target: SymbolId) -> Result<Option<Type>, CompletionFailure> {
        let Some(sym) = ty.class_symbol() else {
            return Ok(None);
        };
        if sym == target {
            return Ok(Some(ty.clone()));
        }
        let map = self.type_arg_map(sym, ty.type_args());
        let raw = ty.type_args().is_empty();
        for sup in self.all_supertypes(sym)? {
            if sup.class_symbol() == Some(target) {
                return Ok(Some(if raw { sup.erasure() } else { substitute(&sup, &map) }));
            }
        }
        Ok(None)
    }

    pub fn is_subclass(&mut self, sub: SymbolId, sup: SymbolId) -> Result<bool, CompletionFailure> {
        if sub == sup {
            return Ok(true);
        }
        if self.class_name(sup).as_ref() == "java.lang.Object" {
            return Ok(true);
        }
        Ok(self
            .all_supertypes(sub)?
            .iter()
            .any(|t| t.class_symbol() == Some(sup)))
    }

    /// Type of a member as seen through `receiver`.
    pub fn member_type_in(&mut self, receiver: &Type, member: SymbolId, ty: &Type) -> Result<Type, CompletionFailure> {
        let owner = self.enclosing_class(member);
        if owner.is_none() {
            return Ok(ty.clone());
        }
        match self.as_super(receiver, owner)? {
            Some(Type::Class { sym, args }) if !args.is_empty() => {
                let map = self.type_arg_map(sym, &args);
                Ok(substitute(ty, &map))
            }
            _ => Ok(ty.clone()),
        }
    }

    /// Erasure, with type variables replaced by their first bound.
    pub fn erase(&self, ty: &Type) -> Type {
        self.erase_depth(ty, 0)
    }

    fn erase_depth(&self, ty: &Type, depth: u32) -> Type {
        match ty {
            Type::TypeVar(tv) if depth < MAX_SUPERTYPE_DEPTH => {
                let bound = match self.symbols.get(*tv).map(|s| &s.info) {
                    Some(SymbolInfo::TypeVar(info)) => info.bounds.first().cloned(),
                    _ => None,
                };
                match bound {
                    Some(bound) => self.erase_depth(&bound, depth + 1),
                    None => self
                        .class_by_flat_name("java.lang.Object")
                        .map_or_else(|| Type::error("Object"), Type::class),
                }
            }
            Type::Array(elem) => Type::Array(Box::new(self.erase_depth(elem, depth + 1))),
            Type::Wildcard { bound: Some(b), .. } => self.erase_depth(b, depth + 1),
            other => other.erasure(),
        }
    }

    pub fn param_types(&self, method: SymbolId) -> Vec<Type> {
        self.symbols
            .get(method)
            .and_then(|s| s.method_info())
            .map(|info| {
                info.params
                    .iter()
                    .filter_map(|&p| self.symbols.get(p).and_then(|s| s.var_info()).map(|v| v.ty.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn return_type(&self, method: SymbolId) -> Type {
        self.symbols
            .get(method)
            .and_then(|s| s.method_info())
            .map_or(Type::Unknown, |i| i.return_type.clone())
    }

    /// Type of a variable symbol.
    pub fn var_type(&self, var: SymbolId) -> Type {
        self.symbols
            .get(var)
            .and_then(|s| s.var_info())
            .map_or(Type::Unknown, |v| v.ty.clone())
    }

    /// Members of a completed class named `name` of kind `kind`.
    fn own_members(&self, class: SymbolId, name: Atom, kind: SymbolKind) -> Vec<SymbolId> {
        let Some(info) = self.symbols.get(class).and_then(|s| s.class_info()) else {
            return Vec::new();
        };
        info.members
            .iter()
            .copied()
            .filter(|&m| self.symbols.get(m).is_some_and(|s| s.kind == kind && s.name == name))
            .collect()
    }

    /// Field `name` declared in `class` or inherited from a supertype.
    pub fn find_field(&mut self, class: SymbolId, name: Atom) -> Result<Option<SymbolId>, CompletionFailure> {
        self.complete(class)?;
        if let Some(&field) = self.own_members(class, name, SymbolKind::Var).first() {
            return Ok(Some(field));
        }
        for sup in self.all_supertypes(class)? {
            if let Some(sym) = sup.class_symbol()
                && let Some(&field) = self.own_members(sym, name, SymbolKind::Var).first()
            {
                return Ok(Some(field));
            }
        }
        Ok(None)
    }

    /// Methods named `name` that are members of `class`: its own, then
    /// inherited ones not overridden by a nearer declaration.
    pub fn find_methods(&mut self, class: SymbolId, name: Atom) -> Result<Vec<SymbolId>, CompletionFailure> {
        self.complete(class)?;
        let mut out = self.own_members(class, name, SymbolKind::Method);
        let mut signatures: Vec<Vec<Type>> = out.iter().map(|&m| self.erased_params(m)).collect();
        for sup in self.all_supertypes(class)? {
            let Some(sym) = sup.class_symbol() else {
                continue;
            };
            for method in self.own_members(sym, name, SymbolKind::Method) {
                let sig = self.erased_params(method);
                if signatures.contains(&sig) {
                    continue;
                }
                signatures.push(sig);
                out.push(method);
            }
        }
        Ok(out)
    }

    pub fn constructors(&mut self, class: SymbolId) -> Result<Vec<SymbolId>, CompletionFailure> {
        self.complete(class)?;
        Ok(self.own_members(class, self.init_name, SymbolKind::Method))
    }

    fn erased_params(&self, method: SymbolId) -> Vec<Type> {
        self.param_types(method).iter().map(|t| self.erase(t)).collect()
    }

    /// Methods in supertypes of the owner of `method` that it overrides,
    /// nearest first.
    pub fn overridden_methods(&mut self, method: SymbolId) -> Result<Vec<SymbolId>, CompletionFailure> {
        let Some(s) = self.symbols.get(method) else {
            return Ok(Vec::new());
        };
        if s.kind != SymbolKind::Method
            || s.has_flags(symbol_flags::CONSTRUCTOR)
            || s.is_static()
            || s.is_private()
        {
            return Ok(Vec::new());
        }
        let name = s.name;
        let class = s.owner;
        let own: Vec<Type> = self.erased_params(method);

        let mut out = Vec::new();
        for sup in self.all_supertypes(class)? {
            let Some(sup_sym) = sup.class_symbol() else {
                continue;
            };
            let map = self.type_arg_map(sup_sym, sup.type_args());
            for candidate in self.own_members(sup_sym, name, SymbolKind::Method) {
                let Some(c) = self.symbols.get(candidate) else {
                    continue;
                };
                if c.is_private() || c.is_static() {
                    continue;
                }
                let theirs: Vec<Type> = self
                    .param_types(candidate)
                    .iter()
                    .map(|t| self.erase(&substitute(t, &map)))
                    .collect();
                if theirs == own {
                    out.push(candidate);
                }
            }
        }
        Ok(out)
    }
}
