//! Front-end parse tree to host AST conversion.
//!
//! The converter walks one parse tree once, top down, and builds the host
//! tree in the host's shape:
//!
//! - `Ident`/`FieldAccess` chains become `SimpleName`/`QualifiedName` where
//!   they are pure names, and `FieldAccess`, `This`, `SuperFieldAccess`
//!   otherwise
//! - `this(..)`/`super(..)` calls become constructor invocation statements
//! - consecutive `VarDecl` fragments of one declaration are grouped into a
//!   field, statement or expression declaration
//! - modifier keywords become `Modifier` nodes in source order
//!
//! No binding is resolved here. Every resolvable host node records the
//! front-end node it came from ([`ForeignRef`]) so the session can resolve it
//! later. After the walk, parent links are filled in and ranges are repaired
//! (see [`repair_ranges`]).

mod prune;
mod ranges;

use std::sync::Arc;

use jbridge_binder::UnitId;
use jbridge_common::Atom;
use jbridge_common::limits::MAX_CONVERSION_DEPTH;
use jbridge_dom::{
    AnnotationStyle, Ast, AstFlags, AstId, AstNode, ForeignRef, ModuleDirectiveKind, NodeKind,
    TypeDeclKind,
};
use jbridge_parser::{
    ClassKind, DirectiveKind, ERROR_NAME, ModifierFlags, Node, NodeData, NodeFlags, NodeIndex,
    ParsedUnit, WildcardBound,
};
use jbridge_scanner::SyntaxKind;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::trace;

pub use prune::{PruneStats, prune_recovered};
pub use ranges::repair_ranges;

/// Identifier given to names missing from the source.
pub const MISSING_NAME: &str = "$missing$";

const MODIFIER_KEYWORDS: &[&str] = &[
    "public",
    "protected",
    "private",
    "abstract",
    "static",
    "final",
    "sealed",
    "non-sealed",
    "transient",
    "volatile",
    "synchronized",
    "native",
    "strictfp",
    "default",
    "transitive",
];

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("parse tree has no compilation unit root")]
    MissingRoot,
    #[error("tree nesting exceeds {limit} levels at offset {pos}")]
    TooDeep { pos: u32, limit: u32 },
}

/// A converted tree.
#[derive(Debug)]
pub struct Converted {
    pub ast: Ast,
    pub root: AstId,
    /// Host declaration of each front-end declaration node. A grouped
    /// field or local declaration is keyed by its first fragment.
    pub declarations: FxHashMap<NodeIndex, AstId>,
}

/// Convert the parse tree of `unit`.
pub fn convert_tree(tree: &ParsedUnit, unit: UnitId) -> Result<Converted, ConvertError> {
    let mut converter = AstConverter {
        tree,
        unit,
        ast: Ast::new(),
        declarations: FxHashMap::default(),
        depth: 0,
        overflow: None,
    };
    let root = converter.compilation_unit()?;
    if let Some(pos) = converter.overflow {
        return Err(ConvertError::TooDeep {
            pos,
            limit: MAX_CONVERSION_DEPTH,
        });
    }
    let mut ast = converter.ast;
    ast.link_parents(root);
    repair_ranges(&mut ast, root);
    trace!(unit = unit.0, nodes = ast.len(), "converted");
    Ok(Converted {
        ast,
        root,
        declarations: converter.declarations,
    })
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum VarGroup {
    Field,
    Statement,
    Expression,
}

struct AstConverter<'a> {
    tree: &'a ParsedUnit,
    unit: UnitId,
    ast: Ast,
    declarations: FxHashMap<NodeIndex, AstId>,
    depth: u32,
    /// Offset where the depth limit was first hit.
    overflow: Option<u32>,
}

impl<'a> AstConverter<'a> {
    // =========================================================================
    // Helpers
    // =========================================================================

    fn node(&self, idx: NodeIndex) -> Option<&'a Node> {
        let tree: &'a ParsedUnit = self.tree;
        tree.arena.get(idx)
    }

    fn data(&self, idx: NodeIndex) -> Option<&'a NodeData> {
        self.node(idx).map(|n| &n.data)
    }

    fn text(&self, atom: Atom) -> Arc<str> {
        self.tree.name_text(atom)
    }

    fn ident_is(&self, atom: Atom, word: &str) -> bool {
        !atom.is_none() && self.text(atom).as_ref() == word
    }

    /// Add a node converted from `from`, carrying over its recovery and
    /// blanking flags.
    fn add(&mut self, kind: NodeKind, start: u32, end: u32, from: NodeIndex) -> AstId {
        let mut node = AstNode::new(kind, start, end);
        if let Some(source) = self.node(from) {
            if source.is_recovered() {
                node.flags |= AstFlags::RECOVERED;
            }
            if source
                .flags
                .intersects(NodeFlags::BODY_BLANKED | NodeFlags::BODY_SKIPPED)
            {
                node.flags |= AstFlags::BODY_BLANKED;
            }
        }
        self.ast.add(node)
    }

    /// Like [`add`](Self::add), also recording `from` for binding
    /// resolution.
    fn linked(&mut self, kind: NodeKind, start: u32, end: u32, from: NodeIndex) -> AstId {
        let id = self.add(kind, start, end, from);
        if let Some(node) = self.ast.get_mut(id) {
            node.foreign = Some(ForeignRef {
                unit: self.unit,
                node: from,
            });
        }
        id
    }

    fn descend(&mut self, pos: u32) -> bool {
        if self.depth >= MAX_CONVERSION_DEPTH {
            self.overflow.get_or_insert(pos);
            return false;
        }
        self.depth += 1;
        true
    }

    fn missing(&mut self, start: u32, end: u32) -> AstId {
        let id = self.ast.add(AstNode::new(
            NodeKind::SimpleName {
                identifier: Arc::from(MISSING_NAME),
            },
            start,
            end,
        ));
        self.ast.add_flags(id, AstFlags::RECOVERED);
        id
    }

    fn simple_name(&mut self, atom: Atom, pos: u32, from: NodeIndex) -> AstId {
        if atom.is_none() {
            return self.missing(pos, pos);
        }
        let text = self.text(atom);
        if text.as_ref() == ERROR_NAME {
            return self.missing(pos, pos);
        }
        let end = pos + text.len() as u32;
        self.linked(NodeKind::SimpleName { identifier: text }, pos, end, from)
    }

    fn end_of(&self, id: AstId, fallback: u32) -> u32 {
        self.ast.get(id).map_or(fallback, AstNode::end)
    }

    /// `end` moved back over trailing whitespace, not before `start`.
    fn trimmed_end(&self, start: u32, end: u32) -> u32 {
        let text = self.tree.source.get(start as usize..end as usize).unwrap_or("");
        start + text.trim_end().len() as u32
    }

    fn find_byte(&self, byte: u8, start: u32, end: u32) -> Option<u32> {
        let bytes = self.tree.source.as_bytes();
        let end = (end as usize).min(bytes.len());
        let start = (start as usize).min(end);
        memchr::memchr(byte, &bytes[start..end]).map(|at| (start + at) as u32)
    }

    /// Run of declarations in `list` starting at `start`: the declaration
    /// and the fragments that continue it.
    fn fragment_group(&self, list: &'a [NodeIndex], start: usize) -> &'a [NodeIndex] {
        let mut end = start + 1;
        while end < list.len()
            && self
                .node(list[end])
                .is_some_and(|n| n.flags.contains(NodeFlags::FOLLOWS_FRAGMENT))
        {
            end += 1;
        }
        &list[start..end]
    }

    /// `Modifier` nodes for the keywords in `[start, end)`, skipping the
    /// ranges in `skip` and comments.
    fn keyword_modifiers(&mut self, start: u32, end: u32, skip: &[(u32, u32)]) -> Vec<AstId> {
        let found = modifier_keywords(&self.tree.source, start, end, skip);
        found
            .into_iter()
            .map(|(keyword, at)| {
                self.ast.add(AstNode::new(
                    NodeKind::Modifier { keyword },
                    at,
                    at + keyword.len() as u32,
                ))
            })
            .collect()
    }

    fn types(&mut self, list: &[NodeIndex]) -> Vec<AstId> {
        list.iter().map(|&t| self.ty(t)).filter(|id| id.is_some()).collect()
    }

    fn exprs(&mut self, list: &[NodeIndex]) -> Vec<AstId> {
        list.iter().map(|&e| self.expr(e)).filter(|id| id.is_some()).collect()
    }

    fn ty_opt(&mut self, idx: NodeIndex) -> AstId {
        if idx.is_none() { AstId::NONE } else { self.ty(idx) }
    }

    fn expr_opt(&mut self, idx: NodeIndex) -> AstId {
        if idx.is_none() { AstId::NONE } else { self.expr(idx) }
    }

    fn stmt_opt(&mut self, idx: NodeIndex) -> AstId {
        if idx.is_none() { AstId::NONE } else { self.stmt(idx) }
    }

    // =========================================================================
    // Units and declarations
    // =========================================================================

    fn compilation_unit(&mut self) -> Result<AstId, ConvertError> {
        let root = self.tree.root;
        let Some(NodeData::CompilationUnit {
            package,
            imports,
            types,
            module,
        }) = self.data(root)
        else {
            return Err(ConvertError::MissingRoot);
        };
        let package = self.package(*package);
        let imports = imports
            .iter()
            .map(|&i| self.import(i))
            .filter(|id| id.is_some())
            .collect();
        let module = self.module(*module);
        let classes: Vec<NodeIndex> = types
            .iter()
            .copied()
            .filter(|&t| matches!(self.data(t), Some(NodeData::ClassDecl { .. })))
            .collect();
        let types = classes
            .into_iter()
            .map(|t| self.type_declaration(t))
            .filter(|id| id.is_some())
            .collect();
        let end = self.tree.source.len() as u32;
        Ok(self.add(
            NodeKind::CompilationUnit {
                package,
                imports,
                types,
                module,
            },
            0,
            end,
            root,
        ))
    }

    fn package(&mut self, idx: NodeIndex) -> AstId {
        let Some(node) = self.node(idx) else {
            return AstId::NONE;
        };
        let NodeData::PackageDecl { annotations, name } = &node.data else {
            return AstId::NONE;
        };
        let annotations = annotations.iter().map(|&a| self.annotation(a)).collect();
        let name = self.name(*name);
        let id = self.linked(
            NodeKind::PackageDeclaration { annotations, name },
            node.pos,
            node.end,
            idx,
        );
        self.declarations.insert(idx, id);
        id
    }

    fn import(&mut self, idx: NodeIndex) -> AstId {
        let Some(node) = self.node(idx) else {
            return AstId::NONE;
        };
        let NodeData::Import {
            is_static,
            on_demand,
            name,
        } = &node.data
        else {
            return AstId::NONE;
        };
        let name = self.name(*name);
        self.linked(
            NodeKind::ImportDeclaration {
                name,
                is_static: *is_static,
                on_demand: *on_demand,
            },
            node.pos,
            node.end,
            idx,
        )
    }

    fn module(&mut self, idx: NodeIndex) -> AstId {
        let Some(node) = self.node(idx) else {
            return AstId::NONE;
        };
        let NodeData::ModuleDecl {
            annotations,
            is_open,
            name,
            directives,
        } = &node.data
        else {
            return AstId::NONE;
        };
        let annotations = annotations.iter().map(|&a| self.annotation(a)).collect();
        let name = self.name(*name);
        let directives = directives.iter().map(|&d| self.module_directive(d)).collect();
        let id = self.linked(
            NodeKind::ModuleDeclaration {
                annotations,
                open: *is_open,
                name,
                directives,
            },
            node.pos,
            node.end,
            idx,
        );
        self.declarations.insert(idx, id);
        id
    }

    fn module_directive(&mut self, idx: NodeIndex) -> AstId {
        let Some(node) = self.node(idx) else {
            return AstId::NONE;
        };
        let NodeData::ModuleDirective {
            kind,
            flags,
            name,
            targets,
        } = &node.data
        else {
            return self.missing(node.pos, node.end);
        };
        let kind = match kind {
            DirectiveKind::Requires => ModuleDirectiveKind::Requires,
            DirectiveKind::Exports => ModuleDirectiveKind::Exports,
            DirectiveKind::Opens => ModuleDirectiveKind::Opens,
            DirectiveKind::Uses => ModuleDirectiveKind::Uses,
            DirectiveKind::Provides => ModuleDirectiveKind::Provides,
        };
        let name = self.name(*name);
        let targets = targets.iter().map(|&t| self.name(t)).collect();
        self.linked(
            NodeKind::ModuleDirective {
                kind,
                transitive: flags.contains(ModifierFlags::TRANSITIVE),
                is_static: flags.contains(ModifierFlags::STATIC),
                name,
                targets,
            },
            node.pos,
            node.end,
            idx,
        )
    }

    fn modifiers(&mut self, idx: NodeIndex) -> Vec<AstId> {
        let Some(node) = self.node(idx) else {
            return Vec::new();
        };
        let NodeData::Modifiers { annotations, .. } = &node.data else {
            return Vec::new();
        };
        let skip: Vec<(u32, u32)> = annotations
            .iter()
            .filter_map(|&a| self.tree.arena.pos_end(a))
            .collect();
        let mut out: Vec<AstId> = annotations
            .iter()
            .map(|&a| self.annotation(a))
            .filter(|id| id.is_some())
            .collect();
        out.extend(self.keyword_modifiers(node.pos, node.end, &skip));
        out.sort_by_key(|id| self.ast.get(*id).map_or(0, |n| n.start));
        out
    }

    fn annotation(&mut self, idx: NodeIndex) -> AstId {
        let Some(node) = self.node(idx) else {
            return AstId::NONE;
        };
        let NodeData::Annotation {
            annotation_type,
            args,
            has_parens,
        } = &node.data
        else {
            return self.missing(node.pos, node.end);
        };
        let type_name = self.name(*annotation_type);
        let single = args.len() == 1 && !matches!(self.data(args[0]), Some(NodeData::Assign { .. }));
        let values = args.iter().map(|&a| self.member_value(a)).collect();
        let style = if !*has_parens {
            AnnotationStyle::Marker
        } else if single {
            AnnotationStyle::SingleMember
        } else {
            AnnotationStyle::Normal
        };
        self.linked(
            NodeKind::Annotation {
                type_name,
                values,
                style,
            },
            node.pos,
            node.end,
            idx,
        )
    }

    fn member_value(&mut self, idx: NodeIndex) -> AstId {
        let Some(node) = self.node(idx) else {
            return AstId::NONE;
        };
        let NodeData::Assign { target, value, .. } = &node.data else {
            return self.expr(idx);
        };
        let name = match self.node(*target) {
            Some(Node {
                data: NodeData::Ident { name },
                pos,
                ..
            }) => self.simple_name(*name, *pos, idx),
            _ => self.missing(node.pos, node.pos),
        };
        let value = self.expr(*value);
        self.linked(NodeKind::MemberValuePair { name, value }, node.pos, node.end, idx)
    }

    fn type_parameters(&mut self, list: &[NodeIndex]) -> Vec<AstId> {
        let mut out = Vec::with_capacity(list.len());
        for &idx in list {
            let Some(node) = self.node(idx) else {
                continue;
            };
            let NodeData::TypeParameter {
                annotations,
                name,
                name_pos,
                bounds,
            } = &node.data
            else {
                continue;
            };
            let modifiers = annotations.iter().map(|&a| self.annotation(a)).collect();
            let name = self.simple_name(*name, *name_pos, idx);
            let bounds = self.types(bounds);
            let id = self.linked(
                NodeKind::TypeParameter {
                    modifiers,
                    name,
                    bounds,
                },
                node.pos,
                node.end,
                idx,
            );
            self.declarations.insert(idx, id);
            out.push(id);
        }
        out
    }

    fn type_declaration(&mut self, idx: NodeIndex) -> AstId {
        let Some(node) = self.node(idx) else {
            return AstId::NONE;
        };
        let NodeData::ClassDecl {
            modifiers,
            kind,
            name,
            name_pos,
            type_params,
            extends,
            implements,
            members,
            ..
        } = &node.data
        else {
            return AstId::NONE;
        };
        if !self.descend(node.pos) {
            return AstId::NONE;
        }
        let modifiers = self.modifiers(*modifiers);
        let name = self.simple_name(*name, *name_pos, idx);
        let type_params = self.type_parameters(type_params);
        let superclass = self.ty_opt(*extends);
        let interfaces = self.types(implements);
        let (enum_constants, body) = self.body(members, *kind);
        self.depth -= 1;
        let kind = match kind {
            ClassKind::Class => TypeDeclKind::Class,
            ClassKind::Interface => TypeDeclKind::Interface,
            ClassKind::Enum => TypeDeclKind::Enum,
            ClassKind::Annotation => TypeDeclKind::Annotation,
            ClassKind::Record => TypeDeclKind::Record,
        };
        let id = self.linked(
            NodeKind::TypeDeclaration {
                kind,
                modifiers,
                name,
                type_params,
                superclass,
                interfaces,
                enum_constants,
                body,
            },
            node.pos,
            node.end,
            idx,
        );
        self.declarations.insert(idx, id);
        id
    }

    fn anonymous_class(&mut self, idx: NodeIndex) -> AstId {
        let Some(node) = self.node(idx) else {
            return AstId::NONE;
        };
        let NodeData::ClassDecl { kind, members, .. } = &node.data else {
            return AstId::NONE;
        };
        if !self.descend(node.pos) {
            return AstId::NONE;
        }
        let (_, body) = self.body(members, *kind);
        self.depth -= 1;
        let id = self.linked(
            NodeKind::AnonymousClassDeclaration { body },
            node.pos,
            node.end,
            idx,
        );
        self.declarations.insert(idx, id);
        id
    }

    /// Enum constants and the other body declarations of a type body.
    /// Members that failed to parse entirely are not represented.
    fn body(&mut self, members: &'a [NodeIndex], owner: ClassKind) -> (Vec<AstId>, Vec<AstId>) {
        let mut constants = Vec::new();
        let mut body = Vec::new();
        let mut i = 0;
        while i < members.len() {
            let member = members[i];
            match self.data(member) {
                Some(NodeData::VarDecl { .. }) => {
                    let group = self.fragment_group(members, i);
                    i += group.len();
                    body.push(self.variable_group(group, VarGroup::Field));
                    continue;
                }
                Some(NodeData::EnumConstant { .. }) => constants.push(self.enum_constant(member)),
                Some(NodeData::MethodDecl { .. }) if owner == ClassKind::Annotation => {
                    body.push(self.annotation_member(member))
                }
                Some(NodeData::MethodDecl { .. }) => body.push(self.method(member)),
                Some(NodeData::Block { .. }) => body.push(self.initializer(member)),
                Some(NodeData::ClassDecl { .. }) => body.push(self.type_declaration(member)),
                _ => {}
            }
            i += 1;
        }
        constants.retain(|id| id.is_some());
        body.retain(|id| id.is_some());
        (constants, body)
    }

    fn enum_constant(&mut self, idx: NodeIndex) -> AstId {
        let Some(node) = self.node(idx) else {
            return AstId::NONE;
        };
        let NodeData::EnumConstant {
            modifiers,
            name,
            name_pos,
            args,
            body,
            ..
        } = &node.data
        else {
            return AstId::NONE;
        };
        let modifiers = self.modifiers(*modifiers);
        let name = self.simple_name(*name, *name_pos, idx);
        let args = self.exprs(args);
        let anonymous = if body.is_none() {
            AstId::NONE
        } else {
            self.anonymous_class(*body)
        };
        let id = self.linked(
            NodeKind::EnumConstantDeclaration {
                modifiers,
                name,
                args,
                anonymous,
            },
            node.pos,
            node.end,
            idx,
        );
        self.declarations.insert(idx, id);
        id
    }

    fn method(&mut self, idx: NodeIndex) -> AstId {
        let Some(node) = self.node(idx) else {
            return AstId::NONE;
        };
        let NodeData::MethodDecl {
            modifiers,
            type_params,
            return_type,
            name,
            name_pos,
            params,
            extra_dims,
            throws,
            body,
            is_constructor,
            ..
        } = &node.data
        else {
            return AstId::NONE;
        };
        let modifiers = self.modifiers(*modifiers);
        let type_params = self.type_parameters(type_params);
        let return_type = if *is_constructor {
            AstId::NONE
        } else {
            self.ty_opt(*return_type)
        };
        let name = self.simple_name(*name, *name_pos, idx);
        let params = params.iter().map(|&p| self.single_variable(p)).collect();
        let thrown = self.types(throws);
        let body = self.stmt_opt(*body);
        let id = self.linked(
            NodeKind::MethodDeclaration {
                modifiers,
                type_params,
                return_type,
                name,
                params,
                extra_dims: *extra_dims,
                thrown,
                body,
                is_constructor: *is_constructor,
            },
            node.pos,
            node.end,
            idx,
        );
        self.declarations.insert(idx, id);
        id
    }

    fn annotation_member(&mut self, idx: NodeIndex) -> AstId {
        let Some(node) = self.node(idx) else {
            return AstId::NONE;
        };
        let NodeData::MethodDecl {
            modifiers,
            return_type,
            name,
            name_pos,
            default_value,
            ..
        } = &node.data
        else {
            return AstId::NONE;
        };
        let modifiers = self.modifiers(*modifiers);
        let ty = self.ty_opt(*return_type);
        let name = self.simple_name(*name, *name_pos, idx);
        let default = self.expr_opt(*default_value);
        let id = self.linked(
            NodeKind::AnnotationTypeMemberDeclaration {
                modifiers,
                ty,
                name,
                default,
            },
            node.pos,
            node.end,
            idx,
        );
        self.declarations.insert(idx, id);
        id
    }

    /// An initializer block. The front-end block starts at the `static`
    /// keyword; the host body starts at the brace.
    fn initializer(&mut self, idx: NodeIndex) -> AstId {
        let Some(node) = self.node(idx) else {
            return AstId::NONE;
        };
        let brace = self.find_byte(b'{', node.pos, node.end).unwrap_or(node.pos);
        let modifiers = self.keyword_modifiers(node.pos, brace, &[]);
        let body = self.block(idx, brace);
        let id = self.add(NodeKind::Initializer { modifiers, body }, node.pos, node.end, idx);
        self.declarations.insert(idx, id);
        id
    }

    /// Host type for a `var` declaration, located in the source between
    /// the declaration start and its name.
    fn implicit_type(&mut self, pos: u32, name_pos: u32) -> AstId {
        let text = self.tree.source.get(pos as usize..name_pos as usize).unwrap_or("");
        let Some(at) = find_word(text, "var") else {
            return AstId::NONE;
        };
        let start = pos + at as u32;
        let name = self.ast.add(AstNode::new(
            NodeKind::SimpleName {
                identifier: Arc::from("var"),
            },
            start,
            start + 3,
        ));
        self.ast.add(AstNode::new(NodeKind::SimpleType { name }, start, start + 3))
    }

    fn declared_type(&mut self, decl: &Node) -> AstId {
        let NodeData::VarDecl {
            var_type, name_pos, ..
        } = &decl.data
        else {
            return AstId::NONE;
        };
        if var_type.is_some() {
            self.ty(*var_type)
        } else if decl.flags.contains(NodeFlags::IMPLICIT_TYPE) {
            self.implicit_type(decl.pos, *name_pos)
        } else {
            AstId::NONE
        }
    }

    /// A field, local or `for`/resource declaration made of one or more
    /// fragments sharing modifiers and type.
    fn variable_group(&mut self, group: &[NodeIndex], kind: VarGroup) -> AstId {
        let Some(&first) = group.first() else {
            return AstId::NONE;
        };
        let Some(first_node) = self.node(first) else {
            return AstId::NONE;
        };
        let NodeData::VarDecl { modifiers, .. } = &first_node.data else {
            return AstId::NONE;
        };
        let modifiers = self.modifiers(*modifiers);
        let ty = self.declared_type(first_node);
        let fragments: Vec<AstId> = group.iter().map(|&d| self.fragment(d)).collect();
        let end = group
            .last()
            .and_then(|&d| self.node(d))
            .map_or(first_node.end, |n| n.end);
        let kind = match kind {
            VarGroup::Field => NodeKind::FieldDeclaration {
                modifiers,
                ty,
                fragments,
            },
            VarGroup::Statement => NodeKind::VariableDeclarationStatement {
                modifiers,
                ty,
                fragments,
            },
            VarGroup::Expression => NodeKind::VariableDeclarationExpression {
                modifiers,
                ty,
                fragments,
            },
        };
        let id = self.add(kind, first_node.pos, end, first);
        self.declarations.insert(first, id);
        id
    }

    fn fragment(&mut self, idx: NodeIndex) -> AstId {
        let Some(node) = self.node(idx) else {
            return AstId::NONE;
        };
        let NodeData::VarDecl {
            name,
            name_pos,
            extra_dims,
            init,
            ..
        } = &node.data
        else {
            return AstId::NONE;
        };
        let name = self.simple_name(*name, *name_pos, idx);
        let initializer = self.expr_opt(*init);
        let end = if initializer.is_some() {
            self.end_of(initializer, node.end)
        } else {
            self.end_of(name, node.end)
        };
        self.linked(
            NodeKind::VariableDeclarationFragment {
                name,
                extra_dims: *extra_dims,
                initializer,
            },
            *name_pos,
            end,
            idx,
        )
    }

    fn single_variable(&mut self, idx: NodeIndex) -> AstId {
        let Some(node) = self.node(idx) else {
            return AstId::NONE;
        };
        let NodeData::VarDecl {
            modifiers,
            name,
            name_pos,
            extra_dims,
            init,
            ..
        } = &node.data
        else {
            return self.expr(idx);
        };
        let modifiers = self.modifiers(*modifiers);
        let ty = self.declared_type(node);
        let name = self.simple_name(*name, *name_pos, idx);
        let initializer = self.expr_opt(*init);
        self.linked(
            NodeKind::SingleVariableDeclaration {
                modifiers,
                ty,
                varargs: node.flags.contains(NodeFlags::VARARGS),
                name,
                extra_dims: *extra_dims,
                initializer,
            },
            node.pos,
            node.end,
            idx,
        )
    }

    // =========================================================================
    // Names and types
    // =========================================================================

    /// An `Ident`/`FieldAccess` chain made only of names.
    fn is_name_chain(&self, idx: NodeIndex) -> bool {
        match self.data(idx) {
            Some(NodeData::Ident { name }) => !self.ident_is(*name, "this") && !self.ident_is(*name, "super"),
            Some(NodeData::FieldAccess { target, name, .. }) => {
                !self.ident_is(*name, "this") && !self.ident_is(*name, "super") && self.is_name_chain(*target)
            }
            _ => false,
        }
    }

    fn name(&mut self, idx: NodeIndex) -> AstId {
        let Some(node) = self.node(idx) else {
            return AstId::NONE;
        };
        match &node.data {
            NodeData::Ident { name } => self.simple_name(*name, node.pos, idx),
            NodeData::FieldAccess {
                target,
                name,
                name_pos,
            } => {
                if !self.descend(node.pos) {
                    return AstId::NONE;
                }
                let qualifier = self.name(*target);
                self.depth -= 1;
                let simple = self.simple_name(*name, *name_pos, idx);
                let end = self.end_of(simple, node.end).max(node.pos);
                self.linked(
                    NodeKind::QualifiedName {
                        qualifier,
                        name: simple,
                    },
                    node.pos,
                    end,
                    idx,
                )
            }
            _ => self.missing(node.pos, node.end),
        }
    }

    fn ty(&mut self, idx: NodeIndex) -> AstId {
        let Some(node) = self.node(idx) else {
            return AstId::NONE;
        };
        if !self.descend(node.pos) {
            return AstId::NONE;
        }
        let id = match &node.data {
            NodeData::Ident { .. } | NodeData::FieldAccess { .. } => {
                let name = self.name(idx);
                self.linked(NodeKind::SimpleType { name }, node.pos, node.end, idx)
            }
            NodeData::PrimitiveType { kind } => self.linked(
                NodeKind::PrimitiveType { keyword: kind.text() },
                node.pos,
                node.end,
                idx,
            ),
            NodeData::ArrayType { elem } => {
                let mut dims = 1;
                let mut inner = *elem;
                while let Some(NodeData::ArrayType { elem }) = self.data(inner) {
                    dims += 1;
                    inner = *elem;
                }
                let element = self.ty(inner);
                self.linked(NodeKind::ArrayType { element, dims }, node.pos, node.end, idx)
            }
            NodeData::ParameterizedType { base, args } => {
                let ty = self.ty(*base);
                let args = self.types(args);
                self.linked(NodeKind::ParameterizedType { ty, args }, node.pos, node.end, idx)
            }
            NodeData::Wildcard { bound_kind, bound } => {
                let bound = self.ty_opt(*bound);
                self.linked(
                    NodeKind::WildcardType {
                        bound,
                        upper: *bound_kind != WildcardBound::Super,
                    },
                    node.pos,
                    node.end,
                    idx,
                )
            }
            NodeData::UnionType { alternatives } => {
                let types = self.types(alternatives);
                self.linked(NodeKind::UnionType { types }, node.pos, node.end, idx)
            }
            NodeData::IntersectionType { bounds } => {
                let types = self.types(bounds);
                self.linked(NodeKind::IntersectionType { types }, node.pos, node.end, idx)
            }
            _ => {
                let name = self.missing(node.pos, node.end);
                let id = self.add(NodeKind::SimpleType { name }, node.pos, node.end, idx);
                self.ast.add_flags(id, AstFlags::RECOVERED);
                id
            }
        };
        self.depth -= 1;
        id
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn block(&mut self, idx: NodeIndex, start: u32) -> AstId {
        let Some(node) = self.node(idx) else {
            return AstId::NONE;
        };
        let NodeData::Block { statements, .. } = &node.data else {
            return AstId::NONE;
        };
        let statements = self.statements(statements);
        self.linked(NodeKind::Block { statements }, start, node.end, idx)
    }

    /// Statements of a block or case, grouping local declaration
    /// fragments.
    fn statements(&mut self, list: &'a [NodeIndex]) -> Vec<AstId> {
        let mut out = Vec::with_capacity(list.len());
        let mut i = 0;
        while i < list.len() {
            let idx = list[i];
            if matches!(self.data(idx), Some(NodeData::VarDecl { .. })) {
                let group = self.fragment_group(list, i);
                i += group.len();
                out.push(self.variable_group(group, VarGroup::Statement));
                continue;
            }
            out.push(self.stmt(idx));
            i += 1;
        }
        out.retain(|id| id.is_some());
        out
    }

    fn stmt(&mut self, idx: NodeIndex) -> AstId {
        let Some(node) = self.node(idx) else {
            return AstId::NONE;
        };
        if !self.descend(node.pos) {
            return AstId::NONE;
        }
        let id = self.stmt_inner(idx, node);
        self.depth -= 1;
        id
    }

    fn stmt_inner(&mut self, idx: NodeIndex, node: &'a Node) -> AstId {
        let (pos, end) = (node.pos, node.end);
        let kind = match &node.data {
            NodeData::Block { .. } => return self.block(idx, pos),
            NodeData::VarDecl { .. } => return self.variable_group(&[idx], VarGroup::Statement),
            NodeData::ClassDecl { .. } => {
                let declaration = self.type_declaration(idx);
                NodeKind::TypeDeclarationStatement { declaration }
            }
            NodeData::ExprStatement { expr } => {
                if let Some(call) = self.constructor_call(*expr, pos, end) {
                    return call;
                }
                let expr = self.expr(*expr);
                NodeKind::ExpressionStatement { expr }
            }
            NodeData::If {
                cond,
                then_stmt,
                else_stmt,
            } => NodeKind::If {
                condition: self.expr(*cond),
                then_branch: self.stmt(*then_stmt),
                else_branch: self.stmt_opt(*else_stmt),
            },
            NodeData::While { cond, body } => NodeKind::While {
                condition: self.expr(*cond),
                body: self.stmt(*body),
            },
            NodeData::DoWhile { body, cond } => NodeKind::Do {
                body: self.stmt(*body),
                condition: self.expr(*cond),
            },
            NodeData::For {
                init,
                cond,
                update,
                body,
            } => NodeKind::For {
                initializers: self.for_init(init),
                condition: self.expr_opt(*cond),
                updaters: update.iter().map(|&u| self.expression_of(u)).collect(),
                body: self.stmt(*body),
            },
            NodeData::ForEach { var, expr, body } => NodeKind::EnhancedFor {
                parameter: self.single_variable(*var),
                expr: self.expr(*expr),
                body: self.stmt(*body),
            },
            NodeData::Return { expr } => NodeKind::Return {
                expr: self.expr_opt(*expr),
            },
            NodeData::Throw { expr } => NodeKind::Throw { expr: self.expr(*expr) },
            NodeData::Yield { expr } => NodeKind::Yield { expr: self.expr(*expr) },
            NodeData::Break { label } => NodeKind::Break {
                label: self.label(*label, pos, end, idx),
            },
            NodeData::Continue { label } => NodeKind::Continue {
                label: self.label(*label, pos, end, idx),
            },
            NodeData::Try {
                resources,
                body,
                catches,
                finally,
            } => NodeKind::Try {
                resources: resources.iter().map(|&r| self.resource(r)).collect(),
                body: self.stmt(*body),
                catches: catches.iter().map(|&c| self.catch_clause(c)).collect(),
                finally: self.stmt_opt(*finally),
            },
            NodeData::Switch { selector, cases } => NodeKind::Switch {
                expr: self.expr(*selector),
                statements: self.switch_body(cases),
            },
            NodeData::Synchronized { lock, body } => NodeKind::Synchronized {
                expr: self.expr(*lock),
                body: self.stmt(*body),
            },
            NodeData::Labeled { label, body } => NodeKind::Labeled {
                label: self.simple_name(*label, pos, idx),
                body: self.stmt(*body),
            },
            NodeData::Assert { cond, detail } => NodeKind::Assert {
                expr: self.expr(*cond),
                message: self.expr_opt(*detail),
            },
            NodeData::Empty => NodeKind::Empty,
            NodeData::Erroneous { .. } => {
                let id = self.add(NodeKind::Empty, pos, end, idx);
                self.ast.add_flags(id, AstFlags::RECOVERED);
                return id;
            }
            _ => NodeKind::ExpressionStatement { expr: self.expr(idx) },
        };
        self.linked(kind, pos, end, idx)
    }

    fn label(&mut self, label: Atom, pos: u32, end: u32, from: NodeIndex) -> AstId {
        if label.is_none() {
            return AstId::NONE;
        }
        let text = self.text(label);
        let at = self
            .tree
            .source
            .get(pos as usize..end as usize)
            .and_then(|s| s.rfind(text.as_ref()))
            .map_or(pos, |at| pos + at as u32);
        self.simple_name(label, at, from)
    }

    fn expression_of(&mut self, idx: NodeIndex) -> AstId {
        match self.data(idx) {
            Some(NodeData::ExprStatement { expr }) => self.expr(*expr),
            _ => self.expr(idx),
        }
    }

    fn for_init(&mut self, list: &'a [NodeIndex]) -> Vec<AstId> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < list.len() {
            if matches!(self.data(list[i]), Some(NodeData::VarDecl { .. })) {
                let group = self.fragment_group(list, i);
                i += group.len();
                out.push(self.variable_group(group, VarGroup::Expression));
                continue;
            }
            out.push(self.expression_of(list[i]));
            i += 1;
        }
        out.retain(|id| id.is_some());
        out
    }

    fn resource(&mut self, idx: NodeIndex) -> AstId {
        match self.data(idx) {
            Some(NodeData::VarDecl { .. }) => self.variable_group(&[idx], VarGroup::Expression),
            _ => self.expression_of(idx),
        }
    }

    fn catch_clause(&mut self, idx: NodeIndex) -> AstId {
        let Some(node) = self.node(idx) else {
            return AstId::NONE;
        };
        let NodeData::Catch { param, body } = &node.data else {
            return AstId::NONE;
        };
        let exception = self.single_variable(*param);
        let body = self.stmt(*body);
        self.linked(NodeKind::CatchClause { exception, body }, node.pos, node.end, idx)
    }

    /// Case labels followed by the statements they guard.
    fn switch_body(&mut self, cases: &'a [NodeIndex]) -> Vec<AstId> {
        let mut out = Vec::new();
        for &case in cases {
            let Some(node) = self.node(case) else {
                continue;
            };
            let NodeData::Case {
                labels,
                statements,
                is_default,
                is_arrow,
            } = &node.data
            else {
                continue;
            };
            let exprs = self.exprs(labels);
            let header_end = self.case_header_end(node, labels, *is_default);
            out.push(self.add(
                NodeKind::SwitchCase {
                    exprs,
                    is_default: *is_default,
                    is_arrow: *is_arrow,
                },
                node.pos,
                header_end,
                case,
            ));
            out.extend(self.statements(statements));
        }
        out
    }

    /// End of `case x:` / `default ->`, after the colon or arrow.
    fn case_header_end(&self, node: &Node, labels: &[NodeIndex], is_default: bool) -> u32 {
        let after = labels
            .last()
            .and_then(|&l| self.tree.arena.pos_end(l))
            .map_or_else(
                || node.pos + if is_default { "default".len() } else { "case".len() } as u32,
                |(_, end)| end,
            );
        let text = self.tree.source.get(after as usize..node.end as usize).unwrap_or("");
        match (text.find(':'), text.find("->")) {
            (Some(colon), Some(arrow)) if arrow < colon => after + arrow as u32 + 2,
            (Some(colon), _) => after + colon as u32 + 1,
            (None, Some(arrow)) => after + arrow as u32 + 2,
            (None, None) => after.min(node.end),
        }
    }

    /// `this(..)`, `super(..)` and `outer.super(..)` calls.
    fn constructor_call(&mut self, idx: NodeIndex, pos: u32, end: u32) -> Option<AstId> {
        let NodeData::MethodCall {
            type_args,
            callee,
            args,
        } = self.data(idx)?
        else {
            return None;
        };
        let kind = match self.data(*callee)? {
            NodeData::Ident { name } if self.ident_is(*name, "this") => NodeKind::ConstructorInvocation {
                type_args: self.types(type_args),
                args: self.exprs(args),
            },
            NodeData::Ident { name } if self.ident_is(*name, "super") => {
                NodeKind::SuperConstructorInvocation {
                    expr: AstId::NONE,
                    type_args: self.types(type_args),
                    args: self.exprs(args),
                }
            }
            NodeData::FieldAccess { target, name, .. } if self.ident_is(*name, "super") => {
                NodeKind::SuperConstructorInvocation {
                    expr: self.expr(*target),
                    type_args: self.types(type_args),
                    args: self.exprs(args),
                }
            }
            _ => return None,
        };
        Some(self.linked(kind, pos, end, idx))
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn expr(&mut self, idx: NodeIndex) -> AstId {
        let Some(node) = self.node(idx) else {
            return AstId::NONE;
        };
        if !self.descend(node.pos) {
            return AstId::NONE;
        }
        let id = self.expr_inner(idx, node);
        self.depth -= 1;
        id
    }

    fn expr_inner(&mut self, idx: NodeIndex, node: &'a Node) -> AstId {
        let (pos, end) = (node.pos, node.end);
        let kind = match &node.data {
            NodeData::Ident { name } if self.ident_is(*name, "this") => NodeKind::This {
                qualifier: AstId::NONE,
            },
            NodeData::Ident { name } => return self.simple_name(*name, pos, idx),
            NodeData::FieldAccess {
                target,
                name,
                name_pos,
            } => return self.field_access(idx, node, *target, *name, *name_pos),
            NodeData::MethodCall {
                type_args,
                callee,
                args,
            } => return self.method_call(idx, node, type_args, *callee, args),
            NodeData::NewClass {
                outer,
                type_args,
                class_type,
                args,
                body,
            } => NodeKind::ClassInstanceCreation {
                expr: self.expr_opt(*outer),
                type_args: self.types(type_args),
                ty: self.ty(*class_type),
                args: self.exprs(args),
                anonymous: if body.is_none() {
                    AstId::NONE
                } else {
                    self.anonymous_class(*body)
                },
            },
            NodeData::NewArray {
                elem_type,
                dims,
                extra_dims,
                elements,
                has_initializer,
            } => {
                if elem_type.is_none() {
                    NodeKind::ArrayInitializer {
                        exprs: self.exprs(elements),
                    }
                } else {
                    return self.array_creation(idx, node, *elem_type, dims, *extra_dims, elements, *has_initializer);
                }
            }
            NodeData::ArrayAccess { array, index } => NodeKind::ArrayAccess {
                array: self.expr(*array),
                index: self.expr(*index),
            },
            NodeData::Unary {
                op,
                postfix,
                operand,
            } => {
                let operand = self.expr(*operand);
                if *postfix {
                    NodeKind::Postfix { op: op.text(), operand }
                } else {
                    NodeKind::Prefix { op: op.text(), operand }
                }
            }
            NodeData::Binary { op, left, right } => NodeKind::Infix {
                op: op.text(),
                left: self.expr(*left),
                right: self.expr(*right),
            },
            NodeData::Assign { op, target, value } => NodeKind::Assignment {
                op: op.text(),
                left: self.expr(*target),
                right: self.expr(*value),
            },
            NodeData::Conditional {
                cond,
                when_true,
                when_false,
            } => NodeKind::Conditional {
                condition: self.expr(*cond),
                then_expr: self.expr(*when_true),
                else_expr: self.expr(*when_false),
            },
            NodeData::InstanceOf {
                expr,
                target_type,
                binding,
            } => NodeKind::InstanceOf {
                expr: self.expr(*expr),
                ty: self.ty(*target_type),
                pattern: if binding.is_none() {
                    AstId::NONE
                } else {
                    self.single_variable(*binding)
                },
            },
            NodeData::Cast { target_type, expr } => NodeKind::Cast {
                ty: self.ty(*target_type),
                expr: self.expr(*expr),
            },
            NodeData::Parens { expr } => NodeKind::Parenthesized { expr: self.expr(*expr) },
            NodeData::Literal { kind, .. } => self.literal(idx, *kind),
            NodeData::ClassLiteral { target_type } => NodeKind::TypeLiteral {
                ty: self.ty(*target_type),
            },
            NodeData::Lambda {
                params,
                body,
                has_parens,
            } => {
                let params = params.iter().map(|&p| self.single_variable(p)).collect();
                let body = match self.data(*body) {
                    Some(NodeData::Block { .. }) => self.stmt(*body),
                    _ => self.expr(*body),
                };
                NodeKind::Lambda {
                    params,
                    body,
                    parens: *has_parens,
                }
            }
            NodeData::MethodRef {
                target,
                type_args,
                name,
            } => {
                let expr = self.expr(*target);
                let type_args = self.types(type_args);
                let name = if self.ident_is(*name, "new") {
                    AstId::NONE
                } else {
                    let len = self.text(*name).len() as u32;
                    let at = self.trimmed_end(pos, end).saturating_sub(len).max(pos);
                    self.simple_name(*name, at, idx)
                };
                NodeKind::MethodReference { expr, type_args, name }
            }
            NodeData::Annotation { .. } => return self.annotation(idx),
            NodeData::PrimitiveType { .. }
            | NodeData::ArrayType { .. }
            | NodeData::ParameterizedType { .. }
            | NodeData::Wildcard { .. }
            | NodeData::UnionType { .. }
            | NodeData::IntersectionType { .. } => return self.ty(idx),
            _ => return self.missing(pos, end),
        };
        self.linked(kind, pos, end, idx)
    }

    fn literal(&self, idx: NodeIndex, kind: SyntaxKind) -> NodeKind {
        let token: Arc<str> = Arc::from(self.tree.node_text(idx));
        match kind {
            SyntaxKind::IntLiteral
            | SyntaxKind::LongLiteral
            | SyntaxKind::FloatLiteral
            | SyntaxKind::DoubleLiteral => NodeKind::NumberLiteral { token },
            SyntaxKind::CharLiteral => NodeKind::CharacterLiteral { escaped: token },
            SyntaxKind::StringLiteral => NodeKind::StringLiteral { escaped: token },
            SyntaxKind::TextBlock => NodeKind::TextBlock { escaped: token },
            SyntaxKind::TrueKeyword => NodeKind::BooleanLiteral { value: true },
            SyntaxKind::FalseKeyword => NodeKind::BooleanLiteral { value: false },
            _ => NodeKind::NullLiteral,
        }
    }

    fn field_access(&mut self, idx: NodeIndex, node: &'a Node, target: NodeIndex, name: Atom, name_pos: u32) -> AstId {
        if self.ident_is(name, "this") || self.ident_is(name, "super") {
            let qualifier = self.name(target);
            return self.linked(NodeKind::This { qualifier }, node.pos, node.end, idx);
        }
        let super_qualifier = match self.data(target) {
            Some(NodeData::Ident { name: t }) if self.ident_is(*t, "super") => Some(AstId::NONE),
            Some(NodeData::FieldAccess { target: outer, name: t, .. }) if self.ident_is(*t, "super") => {
                Some(self.name(*outer))
            }
            _ => None,
        };
        if let Some(qualifier) = super_qualifier {
            let name = self.simple_name(name, name_pos, idx);
            return self.linked(NodeKind::SuperFieldAccess { qualifier, name }, node.pos, node.end, idx);
        }
        if self.is_name_chain(idx) {
            return self.name(idx);
        }
        let expr = self.expr(target);
        let name = self.simple_name(name, name_pos, idx);
        self.linked(NodeKind::FieldAccess { expr, name }, node.pos, node.end, idx)
    }

    fn method_call(
        &mut self,
        idx: NodeIndex,
        node: &'a Node,
        type_args: &'a [NodeIndex],
        callee: NodeIndex,
        args: &'a [NodeIndex],
    ) -> AstId {
        if let Some(call) = self.constructor_call(idx, node.pos, node.end) {
            return call;
        }
        let kind = match self.node(callee) {
            Some(Node {
                data: NodeData::Ident { name },
                pos,
                ..
            }) => NodeKind::MethodInvocation {
                expr: AstId::NONE,
                type_args: self.types(type_args),
                name: self.simple_name(*name, *pos, idx),
                args: self.exprs(args),
            },
            Some(Node {
                data:
                    NodeData::FieldAccess {
                        target,
                        name,
                        name_pos,
                    },
                ..
            }) => {
                let super_qualifier = match self.data(*target) {
                    Some(NodeData::Ident { name: t }) if self.ident_is(*t, "super") => Some(AstId::NONE),
                    Some(NodeData::FieldAccess { target: outer, name: t, .. }) if self.ident_is(*t, "super") => {
                        Some(self.name(*outer))
                    }
                    _ => None,
                };
                match super_qualifier {
                    Some(qualifier) => NodeKind::SuperMethodInvocation {
                        qualifier,
                        type_args: self.types(type_args),
                        name: self.simple_name(*name, *name_pos, idx),
                        args: self.exprs(args),
                    },
                    None => NodeKind::MethodInvocation {
                        expr: self.expr(*target),
                        type_args: self.types(type_args),
                        name: self.simple_name(*name, *name_pos, idx),
                        args: self.exprs(args),
                    },
                }
            }
            _ => NodeKind::MethodInvocation {
                expr: AstId::NONE,
                type_args: self.types(type_args),
                name: self.missing(node.pos, node.pos),
                args: self.exprs(args),
            },
        };
        self.linked(kind, node.pos, node.end, idx)
    }

    #[allow(clippy::too_many_arguments)]
    fn array_creation(
        &mut self,
        idx: NodeIndex,
        node: &'a Node,
        elem_type: NodeIndex,
        dims: &'a [NodeIndex],
        extra_dims: u32,
        elements: &'a [NodeIndex],
        has_initializer: bool,
    ) -> AstId {
        let element = self.ty(elem_type);
        let element_start = self.ast.get(element).map_or(node.pos, |n| n.start);
        let dim_exprs = self.exprs(dims);
        let element_end = self.end_of(element, node.pos);
        let brace = if has_initializer {
            self.find_byte(b'{', element_end, node.end)
        } else {
            None
        };
        let type_end = self.trimmed_end(element_start, brace.unwrap_or(node.end));
        let ty = self.linked(
            NodeKind::ArrayType {
                element,
                dims: dims.len() as u32 + extra_dims,
            },
            element_start,
            type_end,
            idx,
        );
        let initializer = match brace {
            Some(open) => {
                let exprs = self.exprs(elements);
                self.add(NodeKind::ArrayInitializer { exprs }, open, node.end, idx)
            }
            None => AstId::NONE,
        };
        self.linked(
            NodeKind::ArrayCreation {
                ty,
                dims: dim_exprs,
                initializer,
            },
            node.pos,
            node.end,
            idx,
        )
    }
}

/// Offset of `word` in `text` as a whole word.
fn find_word(text: &str, word: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let is_ident = |b: u8| b.is_ascii_alphanumeric() || b == b'_' || b == b'$';
    text.match_indices(word).map(|(at, _)| at).find(|&at| {
        let before = at.checked_sub(1).map(|i| bytes[i]);
        let after = bytes.get(at + word.len()).copied();
        !before.is_some_and(is_ident) && !after.is_some_and(is_ident)
    })
}

/// Modifier keywords in `source[start..end]`, outside `skip` ranges and
/// comments.
fn modifier_keywords(source: &str, start: u32, end: u32, skip: &[(u32, u32)]) -> Vec<(&'static str, u32)> {
    let bytes = source.as_bytes();
    let end = (end as usize).min(bytes.len());
    let mut out = Vec::new();
    let mut i = start as usize;
    while i < end {
        if let Some(&(_, skip_end)) = skip.iter().find(|(s, e)| *s as usize <= i && i < *e as usize) {
            i = skip_end as usize;
            continue;
        }
        let b = bytes[i];
        if b == b'/' && bytes.get(i + 1) == Some(&b'/') {
            i = memchr::memchr(b'\n', &bytes[i..end]).map_or(end, |n| i + n);
            continue;
        }
        if b == b'/' && bytes.get(i + 1) == Some(&b'*') {
            i = source[i + 2..end].find("*/").map_or(end, |n| i + 2 + n + 2);
            continue;
        }
        if b.is_ascii_alphabetic() {
            let word_end = bytes[i..end]
                .iter()
                .position(|c| !(c.is_ascii_alphanumeric() || matches!(c, b'-' | b'_' | b'$')))
                .map_or(end, |n| i + n);
            let word = &source[i..word_end];
            if let Some(keyword) = MODIFIER_KEYWORDS.iter().find(|k| **k == word) {
                out.push((*keyword, i as u32));
            }
            i = word_end;
            continue;
        }
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use jbridge_common::NameTable;
    use jbridge_parser::{ParseOptions, parse_unit};

    use super::*;

    fn convert(source: &str) -> Converted {
        let tree = parse_unit(Arc::from(source), NameTable::shared(), ParseOptions::default());
        convert_tree(&tree, UnitId(0)).unwrap()
    }

    fn kinds(converted: &Converted) -> Vec<&'static str> {
        converted
            .ast
            .preorder(converted.root)
            .into_iter()
            .filter_map(|id| converted.ast.kind(id).map(NodeKind::kind_name))
            .collect()
    }

    #[test]
    fn test_fragments_are_grouped() {
        let converted = convert("class A { private int a, b = 1; void m() { int x = 0, y; } }");
        let kinds = kinds(&converted);
        assert_eq!(kinds.iter().filter(|k| **k == "FieldDeclaration").count(), 1);
        assert_eq!(kinds.iter().filter(|k| **k == "VariableDeclarationStatement").count(), 1);
        assert_eq!(kinds.iter().filter(|k| **k == "VariableDeclarationFragment").count(), 4);
        assert!(kinds.contains(&"Modifier"));
    }

    #[test]
    fn test_names_and_invocations() {
        let source = "class A extends B { A() { super(); } void m() { java.util.List l = null; this.x = super.y; foo(1).bar(); } }";
        let converted = convert(source);
        let kinds = kinds(&converted);
        assert!(kinds.contains(&"SuperConstructorInvocation"));
        assert!(kinds.contains(&"QualifiedName"));
        assert!(kinds.contains(&"SuperFieldAccess"));
        assert!(kinds.contains(&"This"));
        assert_eq!(kinds.iter().filter(|k| **k == "MethodInvocation").count(), 2);
    }

    #[test]
    fn test_modifier_keywords_skip_annotations_and_comments() {
        let source = "@Deprecated /* final */ public static";
        let found = modifier_keywords(source, 0, source.len() as u32, &[(0, 11)]);
        let words: Vec<&str> = found.iter().map(|(w, _)| *w).collect();
        assert_eq!(words, vec!["public", "static"]);
        assert_eq!(found[0].1, source.find("public").unwrap() as u32);
    }

    #[test]
    fn test_declarations_are_linked() {
        let converted = convert("class A { int f; void m(int p) {} }");
        let linked = converted
            .ast
            .preorder(converted.root)
            .into_iter()
            .filter(|&id| {
                converted
                    .ast
                    .get(id)
                    .is_some_and(|n| matches!(n.kind, NodeKind::SimpleName { .. }) && n.foreign.is_some())
            })
            .count();
        // A, f, m, p
        assert_eq!(linked, 4);
        assert_eq!(converted.declarations.len(), 3);
    }
}
