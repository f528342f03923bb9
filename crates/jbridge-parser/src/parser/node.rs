//! Parse tree node definitions.
//!
//! The tree follows the shape of a classic Java compiler tree: type names are
//! plain `Ident`/`FieldAccess` chains, `this` and `super` are identifiers,
//! method calls wrap an `Ident` or `FieldAccess` callee, and every field or
//! local fragment is its own `VarDecl`.

use bitflags::bitflags;
use jbridge_common::Atom;
use jbridge_scanner::SyntaxKind;
use serde::Serialize;
use smallvec::SmallVec;

/// Index of a node in a [`NodeArena`](super::NodeArena).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    pub const NONE: NodeIndex = NodeIndex(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_some(self) -> bool {
        self != Self::NONE
    }
}

pub type NodeList = Vec<NodeIndex>;

/// Inline child buffer returned by [`NodeData::children`].
pub type Children = SmallVec<[NodeIndex; 8]>;

bitflags! {
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct NodeFlags: u16 {
        /// Synthesized or left incomplete while recovering from a syntax error.
        const RECOVERED = 1 << 0;
        /// A `VarDecl` that continues the previous declaration (`int a, b;`).
        const FOLLOWS_FRAGMENT = 1 << 1;
        /// Variable-arity parameter (`String... args`).
        const VARARGS = 1 << 2;
        /// Local declared with `var` or an implicitly typed lambda parameter.
        const IMPLICIT_TYPE = 1 << 3;
        /// Body skipped by the parser (bodies-ignored mode).
        const BODY_SKIPPED = 1 << 4;
        /// Body emptied after parsing by a tree rewrite.
        const BODY_BLANKED = 1 << 5;
    }
}

bitflags! {
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct ModifierFlags: u32 {
        const PUBLIC = 1 << 0;
        const PROTECTED = 1 << 1;
        const PRIVATE = 1 << 2;
        const STATIC = 1 << 3;
        const ABSTRACT = 1 << 4;
        const FINAL = 1 << 5;
        const NATIVE = 1 << 6;
        const SYNCHRONIZED = 1 << 7;
        const TRANSIENT = 1 << 8;
        const VOLATILE = 1 << 9;
        const STRICTFP = 1 << 10;
        const DEFAULT = 1 << 11;
        const SEALED = 1 << 12;
        const NON_SEALED = 1 << 13;
        /// `requires transitive` in a module directive.
        const TRANSITIVE = 1 << 14;
        const DEPRECATED = 1 << 15;
    }
}

impl ModifierFlags {
    pub fn from_keyword(kind: SyntaxKind) -> Option<ModifierFlags> {
        Some(match kind {
            SyntaxKind::PublicKeyword => ModifierFlags::PUBLIC,
            SyntaxKind::ProtectedKeyword => ModifierFlags::PROTECTED,
            SyntaxKind::PrivateKeyword => ModifierFlags::PRIVATE,
            SyntaxKind::StaticKeyword => ModifierFlags::STATIC,
            SyntaxKind::AbstractKeyword => ModifierFlags::ABSTRACT,
            SyntaxKind::FinalKeyword => ModifierFlags::FINAL,
            SyntaxKind::NativeKeyword => ModifierFlags::NATIVE,
            SyntaxKind::SynchronizedKeyword => ModifierFlags::SYNCHRONIZED,
            SyntaxKind::TransientKeyword => ModifierFlags::TRANSIENT,
            SyntaxKind::VolatileKeyword => ModifierFlags::VOLATILE,
            SyntaxKind::StrictfpKeyword => ModifierFlags::STRICTFP,
            SyntaxKind::DefaultKeyword => ModifierFlags::DEFAULT,
            _ => return None,
        })
    }

    /// Source keywords for the flags, in canonical order.
    pub fn keywords(self) -> Vec<&'static str> {
        const ORDER: &[(ModifierFlags, &str)] = &[
            (ModifierFlags::PUBLIC, "public"),
            (ModifierFlags::PROTECTED, "protected"),
            (ModifierFlags::PRIVATE, "private"),
            (ModifierFlags::ABSTRACT, "abstract"),
            (ModifierFlags::STATIC, "static"),
            (ModifierFlags::FINAL, "final"),
            (ModifierFlags::SEALED, "sealed"),
            (ModifierFlags::NON_SEALED, "non-sealed"),
            (ModifierFlags::TRANSIENT, "transient"),
            (ModifierFlags::VOLATILE, "volatile"),
            (ModifierFlags::SYNCHRONIZED, "synchronized"),
            (ModifierFlags::NATIVE, "native"),
            (ModifierFlags::STRICTFP, "strictfp"),
            (ModifierFlags::DEFAULT, "default"),
            (ModifierFlags::TRANSITIVE, "transitive"),
        ];
        ORDER
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, word)| *word)
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Annotation,
    Record,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum VarKind {
    Field,
    Local,
    Param,
    CatchParam,
    Resource,
    /// Loop variable of an enhanced `for`.
    ForEach,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum WildcardBound {
    Unbound,
    Extends,
    Super,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DirectiveKind {
    Requires,
    Exports,
    Opens,
    Uses,
    Provides,
}

/// Node payload.
#[derive(Clone, Debug, Serialize)]
pub enum NodeData {
    // ---- Units and declarations ----
    CompilationUnit {
        package: NodeIndex,
        imports: NodeList,
        types: NodeList,
        module: NodeIndex,
    },
    PackageDecl {
        annotations: NodeList,
        name: NodeIndex,
    },
    Import {
        is_static: bool,
        on_demand: bool,
        /// Qualified name of the imported type, member or package.
        name: NodeIndex,
    },
    ClassDecl {
        modifiers: NodeIndex,
        kind: ClassKind,
        name: Atom,
        name_pos: u32,
        type_params: NodeList,
        extends: NodeIndex,
        implements: NodeList,
        permits: NodeList,
        /// Record components.
        components: NodeList,
        members: NodeList,
    },
    MethodDecl {
        modifiers: NodeIndex,
        type_params: NodeList,
        /// `NONE` for constructors.
        return_type: NodeIndex,
        name: Atom,
        name_pos: u32,
        params: NodeList,
        extra_dims: u32,
        throws: NodeList,
        body: NodeIndex,
        default_value: NodeIndex,
        is_constructor: bool,
    },
    VarDecl {
        kind: VarKind,
        modifiers: NodeIndex,
        /// `NONE` when the type is implicit (`var`, lambda parameters).
        var_type: NodeIndex,
        name: Atom,
        name_pos: u32,
        extra_dims: u32,
        init: NodeIndex,
    },
    EnumConstant {
        modifiers: NodeIndex,
        name: Atom,
        name_pos: u32,
        args: NodeList,
        has_args: bool,
        /// Anonymous `ClassDecl` for a constant with a body.
        body: NodeIndex,
    },
    TypeParameter {
        annotations: NodeList,
        name: Atom,
        name_pos: u32,
        bounds: NodeList,
    },
    Modifiers {
        flags: ModifierFlags,
        annotations: NodeList,
    },
    Annotation {
        annotation_type: NodeIndex,
        /// Element/value pairs as `Assign` nodes, or a single bare value.
        args: NodeList,
        has_parens: bool,
    },
    ModuleDecl {
        annotations: NodeList,
        is_open: bool,
        name: NodeIndex,
        directives: NodeList,
    },
    ModuleDirective {
        kind: DirectiveKind,
        flags: ModifierFlags,
        /// Module, package or service name.
        name: NodeIndex,
        /// `to` modules or `with` implementations.
        targets: NodeList,
    },

    // ---- Statements ----
    Block {
        statements: NodeList,
        is_static: bool,
    },
    ExprStatement {
        expr: NodeIndex,
    },
    If {
        cond: NodeIndex,
        then_stmt: NodeIndex,
        else_stmt: NodeIndex,
    },
    While {
        cond: NodeIndex,
        body: NodeIndex,
    },
    DoWhile {
        body: NodeIndex,
        cond: NodeIndex,
    },
    For {
        init: NodeList,
        cond: NodeIndex,
        update: NodeList,
        body: NodeIndex,
    },
    ForEach {
        var: NodeIndex,
        expr: NodeIndex,
        body: NodeIndex,
    },
    Return {
        expr: NodeIndex,
    },
    Throw {
        expr: NodeIndex,
    },
    Break {
        label: Atom,
    },
    Continue {
        label: Atom,
    },
    Yield {
        expr: NodeIndex,
    },
    Try {
        resources: NodeList,
        body: NodeIndex,
        catches: NodeList,
        finally: NodeIndex,
    },
    Catch {
        param: NodeIndex,
        body: NodeIndex,
    },
    Switch {
        selector: NodeIndex,
        cases: NodeList,
    },
    Case {
        /// Empty for `default`.
        labels: NodeList,
        statements: NodeList,
        is_default: bool,
        is_arrow: bool,
    },
    Synchronized {
        lock: NodeIndex,
        body: NodeIndex,
    },
    Labeled {
        label: Atom,
        body: NodeIndex,
    },
    Assert {
        cond: NodeIndex,
        detail: NodeIndex,
    },
    Empty,

    // ---- Expressions ----
    Ident {
        name: Atom,
    },
    FieldAccess {
        target: NodeIndex,
        name: Atom,
        name_pos: u32,
    },
    MethodCall {
        type_args: NodeList,
        /// `Ident` or `FieldAccess` naming the method.
        callee: NodeIndex,
        args: NodeList,
    },
    NewClass {
        outer: NodeIndex,
        type_args: NodeList,
        class_type: NodeIndex,
        args: NodeList,
        /// Anonymous class body.
        body: NodeIndex,
    },
    NewArray {
        /// `NONE` for a bare initializer (`int[] a = {1, 2}`).
        elem_type: NodeIndex,
        dims: NodeList,
        extra_dims: u32,
        elements: NodeList,
        has_initializer: bool,
    },
    ArrayAccess {
        array: NodeIndex,
        index: NodeIndex,
    },
    Unary {
        op: SyntaxKind,
        postfix: bool,
        operand: NodeIndex,
    },
    Binary {
        op: SyntaxKind,
        left: NodeIndex,
        right: NodeIndex,
    },
    Assign {
        /// `Eq` or a compound assignment operator.
        op: SyntaxKind,
        target: NodeIndex,
        value: NodeIndex,
    },
    Conditional {
        cond: NodeIndex,
        when_true: NodeIndex,
        when_false: NodeIndex,
    },
    InstanceOf {
        expr: NodeIndex,
        target_type: NodeIndex,
        /// Pattern binding (`x instanceof String s`).
        binding: NodeIndex,
    },
    Cast {
        target_type: NodeIndex,
        expr: NodeIndex,
    },
    Parens {
        expr: NodeIndex,
    },
    Literal {
        kind: SyntaxKind,
        value: String,
    },
    ClassLiteral {
        target_type: NodeIndex,
    },
    Lambda {
        params: NodeList,
        body: NodeIndex,
        has_parens: bool,
    },
    MethodRef {
        target: NodeIndex,
        type_args: NodeList,
        /// `new` for constructor references.
        name: Atom,
    },

    // ---- Types ----
    PrimitiveType {
        /// A primitive keyword or `VoidKeyword`.
        kind: SyntaxKind,
    },
    ArrayType {
        elem: NodeIndex,
    },
    ParameterizedType {
        base: NodeIndex,
        args: NodeList,
    },
    Wildcard {
        bound_kind: WildcardBound,
        bound: NodeIndex,
    },
    UnionType {
        alternatives: NodeList,
    },
    IntersectionType {
        bounds: NodeList,
    },

    Erroneous {
        children: NodeList,
    },
}

impl NodeData {
    /// Stable name of the node kind, used in dumps and logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeData::CompilationUnit { .. } => "CompilationUnit",
            NodeData::PackageDecl { .. } => "PackageDecl",
            NodeData::Import { .. } => "Import",
            NodeData::ClassDecl { .. } => "ClassDecl",
            NodeData::MethodDecl { .. } => "MethodDecl",
            NodeData::VarDecl { .. } => "VarDecl",
            NodeData::EnumConstant { .. } => "EnumConstant",
            NodeData::TypeParameter { .. } => "TypeParameter",
            NodeData::Modifiers { .. } => "Modifiers",
            NodeData::Annotation { .. } => "Annotation",
            NodeData::ModuleDecl { .. } => "ModuleDecl",
            NodeData::ModuleDirective { .. } => "ModuleDirective",
            NodeData::Block { .. } => "Block",
            NodeData::ExprStatement { .. } => "ExprStatement",
            NodeData::If { .. } => "If",
            NodeData::While { .. } => "While",
            NodeData::DoWhile { .. } => "DoWhile",
            NodeData::For { .. } => "For",
            NodeData::ForEach { .. } => "ForEach",
            NodeData::Return { .. } => "Return",
            NodeData::Throw { .. } => "Throw",
            NodeData::Break { .. } => "Break",
            NodeData::Continue { .. } => "Continue",
            NodeData::Yield { .. } => "Yield",
            NodeData::Try { .. } => "Try",
            NodeData::Catch { .. } => "Catch",
            NodeData::Switch { .. } => "Switch",
            NodeData::Case { .. } => "Case",
            NodeData::Synchronized { .. } => "Synchronized",
            NodeData::Labeled { .. } => "Labeled",
            NodeData::Assert { .. } => "Assert",
            NodeData::Empty => "Empty",
            NodeData::Ident { .. } => "Ident",
            NodeData::FieldAccess { .. } => "FieldAccess",
            NodeData::MethodCall { .. } => "MethodCall",
            NodeData::NewClass { .. } => "NewClass",
            NodeData::NewArray { .. } => "NewArray",
            NodeData::ArrayAccess { .. } => "ArrayAccess",
            NodeData::Unary { .. } => "Unary",
            NodeData::Binary { .. } => "Binary",
            NodeData::Assign { .. } => "Assign",
            NodeData::Conditional { .. } => "Conditional",
            NodeData::InstanceOf { .. } => "InstanceOf",
            NodeData::Cast { .. } => "Cast",
            NodeData::Parens { .. } => "Parens",
            NodeData::Literal { .. } => "Literal",
            NodeData::ClassLiteral { .. } => "ClassLiteral",
            NodeData::Lambda { .. } => "Lambda",
            NodeData::MethodRef { .. } => "MethodRef",
            NodeData::PrimitiveType { .. } => "PrimitiveType",
            NodeData::ArrayType { .. } => "ArrayType",
            NodeData::ParameterizedType { .. } => "ParameterizedType",
            NodeData::Wildcard { .. } => "Wildcard",
            NodeData::UnionType { .. } => "UnionType",
            NodeData::IntersectionType { .. } => "IntersectionType",
            NodeData::Erroneous { .. } => "Erroneous",
        }
    }

    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            NodeData::Block { .. }
                | NodeData::ExprStatement { .. }
                | NodeData::If { .. }
                | NodeData::While { .. }
                | NodeData::DoWhile { .. }
                | NodeData::For { .. }
                | NodeData::ForEach { .. }
                | NodeData::Return { .. }
                | NodeData::Throw { .. }
                | NodeData::Break { .. }
                | NodeData::Continue { .. }
                | NodeData::Yield { .. }
                | NodeData::Try { .. }
                | NodeData::Switch { .. }
                | NodeData::Synchronized { .. }
                | NodeData::Labeled { .. }
                | NodeData::Assert { .. }
                | NodeData::Empty
        )
    }

    /// Child nodes in source order. Shared type and modifier nodes of
    /// follow-on `VarDecl` fragments are not repeated.
    pub fn children(&self, flags: NodeFlags) -> Children {
        fn one(out: &mut Children, idx: NodeIndex) {
            if idx.is_some() {
                out.push(idx);
            }
        }
        let mut out = Children::new();
        match self {
            NodeData::CompilationUnit {
                package,
                imports,
                types,
                module,
            } => {
                one(&mut out, *package);
                out.extend(imports.iter().copied());
                one(&mut out, *module);
                out.extend(types.iter().copied());
            }
            NodeData::PackageDecl { annotations, name } => {
                out.extend(annotations.iter().copied());
                one(&mut out, *name);
            }
            NodeData::Import { name, .. } => one(&mut out, *name),
            NodeData::ClassDecl {
                modifiers,
                type_params,
                extends,
                implements,
                permits,
                components,
                members,
                ..
            } => {
                one(&mut out, *modifiers);
                out.extend(type_params.iter().copied());
                out.extend(components.iter().copied());
                one(&mut out, *extends);
                out.extend(implements.iter().copied());
                out.extend(permits.iter().copied());
                out.extend(members.iter().copied());
            }
            NodeData::MethodDecl {
                modifiers,
                type_params,
                return_type,
                params,
                throws,
                body,
                default_value,
                ..
            } => {
                one(&mut out, *modifiers);
                out.extend(type_params.iter().copied());
                one(&mut out, *return_type);
                out.extend(params.iter().copied());
                out.extend(throws.iter().copied());
                one(&mut out, *default_value);
                one(&mut out, *body);
            }
            NodeData::VarDecl {
                modifiers,
                var_type,
                init,
                ..
            } => {
                if !flags.contains(NodeFlags::FOLLOWS_FRAGMENT) {
                    one(&mut out, *modifiers);
                    one(&mut out, *var_type);
                }
                one(&mut out, *init);
            }
            NodeData::EnumConstant {
                modifiers,
                args,
                body,
                ..
            } => {
                one(&mut out, *modifiers);
                out.extend(args.iter().copied());
                one(&mut out, *body);
            }
            NodeData::TypeParameter {
                annotations,
                bounds,
                ..
            } => {
                out.extend(annotations.iter().copied());
                out.extend(bounds.iter().copied());
            }
            NodeData::Modifiers { annotations, .. } => out.extend(annotations.iter().copied()),
            NodeData::Annotation {
                annotation_type,
                args,
                ..
            } => {
                one(&mut out, *annotation_type);
                out.extend(args.iter().copied());
            }
            NodeData::ModuleDecl {
                annotations,
                name,
                directives,
                ..
            } => {
                out.extend(annotations.iter().copied());
                one(&mut out, *name);
                out.extend(directives.iter().copied());
            }
            NodeData::ModuleDirective { name, targets, .. } => {
                one(&mut out, *name);
                out.extend(targets.iter().copied());
            }
            NodeData::Block { statements, .. } => out.extend(statements.iter().copied()),
            NodeData::ExprStatement { expr }
            | NodeData::Return { expr }
            | NodeData::Throw { expr }
            | NodeData::Yield { expr }
            | NodeData::Parens { expr } => one(&mut out, *expr),
            NodeData::If {
                cond,
                then_stmt,
                else_stmt,
            } => {
                one(&mut out, *cond);
                one(&mut out, *then_stmt);
                one(&mut out, *else_stmt);
            }
            NodeData::While { cond, body } => {
                one(&mut out, *cond);
                one(&mut out, *body);
            }
            NodeData::DoWhile { body, cond } => {
                one(&mut out, *body);
                one(&mut out, *cond);
            }
            NodeData::For {
                init,
                cond,
                update,
                body,
            } => {
                out.extend(init.iter().copied());
                one(&mut out, *cond);
                out.extend(update.iter().copied());
                one(&mut out, *body);
            }
            NodeData::ForEach { var, expr, body } => {
                one(&mut out, *var);
                one(&mut out, *expr);
                one(&mut out, *body);
            }
            NodeData::Break { .. } | NodeData::Continue { .. } | NodeData::Empty => {}
            NodeData::Try {
                resources,
                body,
                catches,
                finally,
            } => {
                out.extend(resources.iter().copied());
                one(&mut out, *body);
                out.extend(catches.iter().copied());
                one(&mut out, *finally);
            }
            NodeData::Catch { param, body } => {
                one(&mut out, *param);
                one(&mut out, *body);
            }
            NodeData::Switch { selector, cases } => {
                one(&mut out, *selector);
                out.extend(cases.iter().copied());
            }
            NodeData::Case {
                labels, statements, ..
            } => {
                out.extend(labels.iter().copied());
                out.extend(statements.iter().copied());
            }
            NodeData::Synchronized { lock, body } => {
                one(&mut out, *lock);
                one(&mut out, *body);
            }
            NodeData::Labeled { body, .. } => one(&mut out, *body),
            NodeData::Assert { cond, detail } => {
                one(&mut out, *cond);
                one(&mut out, *detail);
            }
            NodeData::Ident { .. } | NodeData::Literal { .. } | NodeData::PrimitiveType { .. } => {}
            NodeData::FieldAccess { target, .. } => one(&mut out, *target),
            NodeData::MethodCall {
                type_args,
                callee,
                args,
            } => {
                // The receiver of a qualified call precedes its type arguments.
                one(&mut out, *callee);
                out.extend(type_args.iter().copied());
                out.extend(args.iter().copied());
            }
            NodeData::NewClass {
                outer,
                type_args,
                class_type,
                args,
                body,
            } => {
                one(&mut out, *outer);
                out.extend(type_args.iter().copied());
                one(&mut out, *class_type);
                out.extend(args.iter().copied());
                one(&mut out, *body);
            }
            NodeData::NewArray {
                elem_type,
                dims,
                elements,
                ..
            } => {
                one(&mut out, *elem_type);
                out.extend(dims.iter().copied());
                out.extend(elements.iter().copied());
            }
            NodeData::ArrayAccess { array, index } => {
                one(&mut out, *array);
                one(&mut out, *index);
            }
            NodeData::Unary { operand, .. } => one(&mut out, *operand),
            NodeData::Binary { left, right, .. } => {
                one(&mut out, *left);
                one(&mut out, *right);
            }
            NodeData::Assign { target, value, .. } => {
                one(&mut out, *target);
                one(&mut out, *value);
            }
            NodeData::Conditional {
                cond,
                when_true,
                when_false,
            } => {
                one(&mut out, *cond);
                one(&mut out, *when_true);
                one(&mut out, *when_false);
            }
            NodeData::InstanceOf {
                expr,
                target_type,
                binding,
            } => {
                one(&mut out, *expr);
                one(&mut out, *target_type);
                one(&mut out, *binding);
            }
            NodeData::Cast { target_type, expr } => {
                one(&mut out, *target_type);
                one(&mut out, *expr);
            }
            NodeData::ClassLiteral { target_type } => one(&mut out, *target_type),
            NodeData::Lambda { params, body, .. } => {
                out.extend(params.iter().copied());
                one(&mut out, *body);
            }
            NodeData::MethodRef {
                target, type_args, ..
            } => {
                one(&mut out, *target);
                out.extend(type_args.iter().copied());
            }
            NodeData::ArrayType { elem } => one(&mut out, *elem),
            NodeData::ParameterizedType { base, args } => {
                one(&mut out, *base);
                out.extend(args.iter().copied());
            }
            NodeData::Wildcard { bound, .. } => one(&mut out, *bound),
            NodeData::UnionType { alternatives } => out.extend(alternatives.iter().copied()),
            NodeData::IntersectionType { bounds } => out.extend(bounds.iter().copied()),
            NodeData::Erroneous { children } => out.extend(children.iter().copied()),
        }
        out
    }
}

/// A parse tree node.
#[derive(Clone, Debug, Serialize)]
pub struct Node {
    pub flags: NodeFlags,
    /// Start offset (inclusive).
    pub pos: u32,
    /// End offset (exclusive).
    pub end: u32,
    pub parent: NodeIndex,
    pub data: NodeData,
}

impl Node {
    pub fn new(pos: u32, end: u32, data: NodeData) -> Self {
        Node {
            flags: NodeFlags::empty(),
            pos,
            end,
            parent: NodeIndex::NONE,
            data,
        }
    }

    pub fn is_recovered(&self) -> bool {
        self.flags.contains(NodeFlags::RECOVERED)
    }

    pub fn children(&self) -> Children {
        self.data.children(self.flags)
    }
}
