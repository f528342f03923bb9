//! Host AST node definitions.
//!
//! The host tree is shaped for consumers rather than for the compiler:
//! declarations own their names as `SimpleName` nodes, multi-fragment
//! declarations group their fragments, method invocations separate the
//! receiver from the method name, and modifiers are keyword and annotation
//! nodes in source order.

use std::sync::Arc;

use bitflags::bitflags;
use jbridge_binder::UnitId;
use jbridge_parser::NodeIndex;
use serde::Serialize;
use smallvec::SmallVec;

/// Index of a node in an [`Ast`](crate::tree::Ast).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AstId(pub u32);

impl AstId {
    pub const NONE: AstId = AstId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_some(self) -> bool {
        self != Self::NONE
    }
}

/// Inline child buffer returned by [`NodeKind::children`].
pub type AstChildren = SmallVec<[AstId; 8]>;

bitflags! {
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct AstFlags: u8 {
        /// Synthesized or left incomplete while recovering from a syntax
        /// error.
        const RECOVERED = 1 << 0;
        /// Contains recovered content that could not be removed.
        const MALFORMED = 1 << 1;
        /// Method body emptied before analysis.
        const BODY_BLANKED = 1 << 2;
    }
}

/// The compiler-tree node a host node was converted from. Used to resolve
/// bindings on demand; the host tree never owns compiler state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ForeignRef {
    pub unit: UnitId,
    pub node: NodeIndex,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TypeDeclKind {
    Class,
    Interface,
    Enum,
    Annotation,
    Record,
}

impl TypeDeclKind {
    pub fn keyword(self) -> &'static str {
        match self {
            TypeDeclKind::Class => "class",
            TypeDeclKind::Interface => "interface",
            TypeDeclKind::Enum => "enum",
            TypeDeclKind::Annotation => "@interface",
            TypeDeclKind::Record => "record",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum AnnotationStyle {
    /// `@A`
    Marker,
    /// `@A(x = 1)`
    Normal,
    /// `@A(1)`
    SingleMember,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ModuleDirectiveKind {
    Requires,
    Exports,
    Opens,
    Uses,
    Provides,
}

#[derive(Clone, Debug, Serialize)]
pub enum NodeKind {
    // ---- Units and declarations ----
    CompilationUnit {
        package: AstId,
        imports: Vec<AstId>,
        types: Vec<AstId>,
        module: AstId,
    },
    PackageDeclaration {
        annotations: Vec<AstId>,
        name: AstId,
    },
    ImportDeclaration {
        name: AstId,
        is_static: bool,
        on_demand: bool,
    },
    TypeDeclaration {
        kind: TypeDeclKind,
        modifiers: Vec<AstId>,
        name: AstId,
        type_params: Vec<AstId>,
        superclass: AstId,
        interfaces: Vec<AstId>,
        enum_constants: Vec<AstId>,
        body: Vec<AstId>,
    },
    AnonymousClassDeclaration {
        body: Vec<AstId>,
    },
    EnumConstantDeclaration {
        modifiers: Vec<AstId>,
        name: AstId,
        args: Vec<AstId>,
        anonymous: AstId,
    },
    FieldDeclaration {
        modifiers: Vec<AstId>,
        ty: AstId,
        fragments: Vec<AstId>,
    },
    MethodDeclaration {
        modifiers: Vec<AstId>,
        type_params: Vec<AstId>,
        /// `NONE` for constructors.
        return_type: AstId,
        name: AstId,
        params: Vec<AstId>,
        extra_dims: u32,
        thrown: Vec<AstId>,
        body: AstId,
        is_constructor: bool,
    },
    AnnotationTypeMemberDeclaration {
        modifiers: Vec<AstId>,
        ty: AstId,
        name: AstId,
        default: AstId,
    },
    Initializer {
        modifiers: Vec<AstId>,
        body: AstId,
    },
    VariableDeclarationFragment {
        name: AstId,
        extra_dims: u32,
        initializer: AstId,
    },
    SingleVariableDeclaration {
        modifiers: Vec<AstId>,
        /// `NONE` for implicitly typed lambda parameters.
        ty: AstId,
        varargs: bool,
        name: AstId,
        extra_dims: u32,
        initializer: AstId,
    },
    TypeParameter {
        modifiers: Vec<AstId>,
        name: AstId,
        bounds: Vec<AstId>,
    },
    Modifier {
        keyword: &'static str,
    },
    Annotation {
        type_name: AstId,
        values: Vec<AstId>,
        style: AnnotationStyle,
    },
    MemberValuePair {
        name: AstId,
        value: AstId,
    },
    ModuleDeclaration {
        annotations: Vec<AstId>,
        open: bool,
        name: AstId,
        directives: Vec<AstId>,
    },
    ModuleDirective {
        kind: ModuleDirectiveKind,
        transitive: bool,
        is_static: bool,
        name: AstId,
        targets: Vec<AstId>,
    },

    // ---- Statements ----
    Block {
        statements: Vec<AstId>,
    },
    VariableDeclarationStatement {
        modifiers: Vec<AstId>,
        ty: AstId,
        fragments: Vec<AstId>,
    },
    /// Declaration in a `for` initializer or a `try` resource.
    VariableDeclarationExpression {
        modifiers: Vec<AstId>,
        ty: AstId,
        fragments: Vec<AstId>,
    },
    TypeDeclarationStatement {
        declaration: AstId,
    },
    ExpressionStatement {
        expr: AstId,
    },
    If {
        condition: AstId,
        then_branch: AstId,
        else_branch: AstId,
    },
    While {
        condition: AstId,
        body: AstId,
    },
    Do {
        body: AstId,
        condition: AstId,
    },
    For {
        initializers: Vec<AstId>,
        condition: AstId,
        updaters: Vec<AstId>,
        body: AstId,
    },
    EnhancedFor {
        parameter: AstId,
        expr: AstId,
        body: AstId,
    },
    Return {
        expr: AstId,
    },
    Throw {
        expr: AstId,
    },
    Yield {
        expr: AstId,
    },
    Break {
        label: AstId,
    },
    Continue {
        label: AstId,
    },
    Try {
        resources: Vec<AstId>,
        body: AstId,
        catches: Vec<AstId>,
        finally: AstId,
    },
    CatchClause {
        exception: AstId,
        body: AstId,
    },
    /// Case labels and the statements they guard, flattened.
    Switch {
        expr: AstId,
        statements: Vec<AstId>,
    },
    SwitchCase {
        /// Empty for `default`.
        exprs: Vec<AstId>,
        is_default: bool,
        is_arrow: bool,
    },
    Synchronized {
        expr: AstId,
        body: AstId,
    },
    Labeled {
        label: AstId,
        body: AstId,
    },
    Assert {
        expr: AstId,
        message: AstId,
    },
    ConstructorInvocation {
        type_args: Vec<AstId>,
        args: Vec<AstId>,
    },
    SuperConstructorInvocation {
        expr: AstId,
        type_args: Vec<AstId>,
        args: Vec<AstId>,
    },
    Empty,

    // ---- Expressions ----
    SimpleName {
        identifier: Arc<str>,
    },
    QualifiedName {
        qualifier: AstId,
        name: AstId,
    },
    FieldAccess {
        expr: AstId,
        name: AstId,
    },
    SuperFieldAccess {
        qualifier: AstId,
        name: AstId,
    },
    This {
        qualifier: AstId,
    },
    MethodInvocation {
        expr: AstId,
        type_args: Vec<AstId>,
        name: AstId,
        args: Vec<AstId>,
    },
    SuperMethodInvocation {
        qualifier: AstId,
        type_args: Vec<AstId>,
        name: AstId,
        args: Vec<AstId>,
    },
    ClassInstanceCreation {
        expr: AstId,
        type_args: Vec<AstId>,
        ty: AstId,
        args: Vec<AstId>,
        anonymous: AstId,
    },
    ArrayCreation {
        ty: AstId,
        dims: Vec<AstId>,
        initializer: AstId,
    },
    ArrayInitializer {
        exprs: Vec<AstId>,
    },
    ArrayAccess {
        array: AstId,
        index: AstId,
    },
    Prefix {
        op: &'static str,
        operand: AstId,
    },
    Postfix {
        op: &'static str,
        operand: AstId,
    },
    Infix {
        op: &'static str,
        left: AstId,
        right: AstId,
    },
    Assignment {
        op: &'static str,
        left: AstId,
        right: AstId,
    },
    Conditional {
        condition: AstId,
        then_expr: AstId,
        else_expr: AstId,
    },
    InstanceOf {
        expr: AstId,
        ty: AstId,
        pattern: AstId,
    },
    Cast {
        ty: AstId,
        expr: AstId,
    },
    Parenthesized {
        expr: AstId,
    },
    NumberLiteral {
        token: Arc<str>,
    },
    StringLiteral {
        escaped: Arc<str>,
    },
    CharacterLiteral {
        escaped: Arc<str>,
    },
    TextBlock {
        escaped: Arc<str>,
    },
    BooleanLiteral {
        value: bool,
    },
    NullLiteral,
    TypeLiteral {
        ty: AstId,
    },
    Lambda {
        params: Vec<AstId>,
        body: AstId,
        parens: bool,
    },
    MethodReference {
        expr: AstId,
        type_args: Vec<AstId>,
        /// `NONE` for `::new`.
        name: AstId,
    },

    // ---- Types ----
    PrimitiveType {
        keyword: &'static str,
    },
    SimpleType {
        name: AstId,
    },
    ArrayType {
        element: AstId,
        dims: u32,
    },
    ParameterizedType {
        ty: AstId,
        args: Vec<AstId>,
    },
    WildcardType {
        bound: AstId,
        upper: bool,
    },
    UnionType {
        types: Vec<AstId>,
    },
    IntersectionType {
        types: Vec<AstId>,
    },
}

fn one(out: &mut AstChildren, id: AstId) {
    if id.is_some() {
        out.push(id);
    }
}

impl NodeKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeKind::CompilationUnit { .. } => "CompilationUnit",
            NodeKind::PackageDeclaration { .. } => "PackageDeclaration",
            NodeKind::ImportDeclaration { .. } => "ImportDeclaration",
            NodeKind::TypeDeclaration { .. } => "TypeDeclaration",
            NodeKind::AnonymousClassDeclaration { .. } => "AnonymousClassDeclaration",
            NodeKind::EnumConstantDeclaration { .. } => "EnumConstantDeclaration",
            NodeKind::FieldDeclaration { .. } => "FieldDeclaration",
            NodeKind::MethodDeclaration { .. } => "MethodDeclaration",
            NodeKind::AnnotationTypeMemberDeclaration { .. } => "AnnotationTypeMemberDeclaration",
            NodeKind::Initializer { .. } => "Initializer",
            NodeKind::VariableDeclarationFragment { .. } => "VariableDeclarationFragment",
            NodeKind::SingleVariableDeclaration { .. } => "SingleVariableDeclaration",
            NodeKind::TypeParameter { .. } => "TypeParameter",
            NodeKind::Modifier { .. } => "Modifier",
            NodeKind::Annotation { .. } => "Annotation",
            NodeKind::MemberValuePair { .. } => "MemberValuePair",
            NodeKind::ModuleDeclaration { .. } => "ModuleDeclaration",
            NodeKind::ModuleDirective { .. } => "ModuleDirective",
            NodeKind::Block { .. } => "Block",
            NodeKind::VariableDeclarationStatement { .. } => "VariableDeclarationStatement",
            NodeKind::VariableDeclarationExpression { .. } => "VariableDeclarationExpression",
            NodeKind::TypeDeclarationStatement { .. } => "TypeDeclarationStatement",
            NodeKind::ExpressionStatement { .. } => "ExpressionStatement",
            NodeKind::If { .. } => "If",
            NodeKind::While { .. } => "While",
            NodeKind::Do { .. } => "Do",
            NodeKind::For { .. } => "For",
            NodeKind::EnhancedFor { .. } => "EnhancedFor",
            NodeKind::Return { .. } => "Return",
            NodeKind::Throw { .. } => "Throw",
            NodeKind::Yield { .. } => "Yield",
            NodeKind::Break { .. } => "Break",
            NodeKind::Continue { .. } => "Continue",
            NodeKind::Try { .. } => "Try",
            NodeKind::CatchClause { .. } => "CatchClause",
            NodeKind::Switch { .. } => "Switch",
            NodeKind::SwitchCase { .. } => "SwitchCase",
            NodeKind::Synchronized { .. } => "Synchronized",
            NodeKind::Labeled { .. } => "Labeled",
            NodeKind::Assert { .. } => "Assert",
            NodeKind::ConstructorInvocation { .. } => "ConstructorInvocation",
            NodeKind::SuperConstructorInvocation { .. } => "SuperConstructorInvocation",
            NodeKind::Empty => "Empty",
            NodeKind::SimpleName { .. } => "SimpleName",
            NodeKind::QualifiedName { .. } => "QualifiedName",
            NodeKind::FieldAccess { .. } => "FieldAccess",
            NodeKind::SuperFieldAccess { .. } => "SuperFieldAccess",
            NodeKind::This { .. } => "This",
            NodeKind::MethodInvocation { .. } => "MethodInvocation",
            NodeKind::SuperMethodInvocation { .. } => "SuperMethodInvocation",
            NodeKind::ClassInstanceCreation { .. } => "ClassInstanceCreation",
            NodeKind::ArrayCreation { .. } => "ArrayCreation",
            NodeKind::ArrayInitializer { .. } => "ArrayInitializer",
            NodeKind::ArrayAccess { .. } => "ArrayAccess",
            NodeKind::Prefix { .. } => "Prefix",
            NodeKind::Postfix { .. } => "Postfix",
            NodeKind::Infix { .. } => "Infix",
            NodeKind::Assignment { .. } => "Assignment",
            NodeKind::Conditional { .. } => "Conditional",
            NodeKind::InstanceOf { .. } => "InstanceOf",
            NodeKind::Cast { .. } => "Cast",
            NodeKind::Parenthesized { .. } => "Parenthesized",
            NodeKind::NumberLiteral { .. } => "NumberLiteral",
            NodeKind::StringLiteral { .. } => "StringLiteral",
            NodeKind::CharacterLiteral { .. } => "CharacterLiteral",
            NodeKind::TextBlock { .. } => "TextBlock",
            NodeKind::BooleanLiteral { .. } => "BooleanLiteral",
            NodeKind::NullLiteral => "NullLiteral",
            NodeKind::TypeLiteral { .. } => "TypeLiteral",
            NodeKind::Lambda { .. } => "Lambda",
            NodeKind::MethodReference { .. } => "MethodReference",
            NodeKind::PrimitiveType { .. } => "PrimitiveType",
            NodeKind::SimpleType { .. } => "SimpleType",
            NodeKind::ArrayType { .. } => "ArrayType",
            NodeKind::ParameterizedType { .. } => "ParameterizedType",
            NodeKind::WildcardType { .. } => "WildcardType",
            NodeKind::UnionType { .. } => "UnionType",
            NodeKind::IntersectionType { .. } => "IntersectionType",
        }
    }

    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            NodeKind::Block { .. }
                | NodeKind::VariableDeclarationStatement { .. }
                | NodeKind::TypeDeclarationStatement { .. }
                | NodeKind::ExpressionStatement { .. }
                | NodeKind::If { .. }
                | NodeKind::While { .. }
                | NodeKind::Do { .. }
                | NodeKind::For { .. }
                | NodeKind::EnhancedFor { .. }
                | NodeKind::Return { .. }
                | NodeKind::Throw { .. }
                | NodeKind::Yield { .. }
                | NodeKind::Break { .. }
                | NodeKind::Continue { .. }
                | NodeKind::Try { .. }
                | NodeKind::Switch { .. }
                | NodeKind::SwitchCase { .. }
                | NodeKind::Synchronized { .. }
                | NodeKind::Labeled { .. }
                | NodeKind::Assert { .. }
                | NodeKind::ConstructorInvocation { .. }
                | NodeKind::SuperConstructorInvocation { .. }
                | NodeKind::Empty
        )
    }

    /// Declarations that introduce a symbol.
    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            NodeKind::PackageDeclaration { .. }
                | NodeKind::TypeDeclaration { .. }
                | NodeKind::AnonymousClassDeclaration { .. }
                | NodeKind::EnumConstantDeclaration { .. }
                | NodeKind::MethodDeclaration { .. }
                | NodeKind::AnnotationTypeMemberDeclaration { .. }
                | NodeKind::VariableDeclarationFragment { .. }
                | NodeKind::SingleVariableDeclaration { .. }
                | NodeKind::TypeParameter { .. }
                | NodeKind::ModuleDeclaration { .. }
        )
    }

    /// Members of a type body.
    pub fn is_body_declaration(&self) -> bool {
        matches!(
            self,
            NodeKind::TypeDeclaration { .. }
                | NodeKind::EnumConstantDeclaration { .. }
                | NodeKind::FieldDeclaration { .. }
                | NodeKind::MethodDeclaration { .. }
                | NodeKind::AnnotationTypeMemberDeclaration { .. }
                | NodeKind::Initializer { .. }
        )
    }

    pub fn is_name(&self) -> bool {
        matches!(self, NodeKind::SimpleName { .. } | NodeKind::QualifiedName { .. })
    }

    pub fn is_type(&self) -> bool {
        matches!(
            self,
            NodeKind::PrimitiveType { .. }
                | NodeKind::SimpleType { .. }
                | NodeKind::ArrayType { .. }
                | NodeKind::ParameterizedType { .. }
                | NodeKind::WildcardType { .. }
                | NodeKind::UnionType { .. }
                | NodeKind::IntersectionType { .. }
        )
    }

    /// Child nodes in source order.
    pub fn children(&self) -> AstChildren {
        let mut out = AstChildren::new();
        match self {
            NodeKind::CompilationUnit {
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
            NodeKind::PackageDeclaration { annotations, name } => {
                out.extend(annotations.iter().copied());
                one(&mut out, *name);
            }
            NodeKind::ImportDeclaration { name, .. } => one(&mut out, *name),
            NodeKind::TypeDeclaration {
                modifiers,
                name,
                type_params,
                superclass,
                interfaces,
                enum_constants,
                body,
                ..
            } => {
                out.extend(modifiers.iter().copied());
                one(&mut out, *name);
                out.extend(type_params.iter().copied());
                one(&mut out, *superclass);
                out.extend(interfaces.iter().copied());
                out.extend(enum_constants.iter().copied());
                out.extend(body.iter().copied());
            }
            NodeKind::AnonymousClassDeclaration { body } => out.extend(body.iter().copied()),
            NodeKind::EnumConstantDeclaration {
                modifiers,
                name,
                args,
                anonymous,
            } => {
                out.extend(modifiers.iter().copied());
                one(&mut out, *name);
                out.extend(args.iter().copied());
                one(&mut out, *anonymous);
            }
            NodeKind::FieldDeclaration {
                modifiers,
                ty,
                fragments,
            }
            | NodeKind::VariableDeclarationStatement {
                modifiers,
                ty,
                fragments,
            }
            | NodeKind::VariableDeclarationExpression {
                modifiers,
                ty,
                fragments,
            } => {
                out.extend(modifiers.iter().copied());
                one(&mut out, *ty);
                out.extend(fragments.iter().copied());
            }
            NodeKind::MethodDeclaration {
                modifiers,
                type_params,
                return_type,
                name,
                params,
                thrown,
                body,
                ..
            } => {
                out.extend(modifiers.iter().copied());
                out.extend(type_params.iter().copied());
                one(&mut out, *return_type);
                one(&mut out, *name);
                out.extend(params.iter().copied());
                out.extend(thrown.iter().copied());
                one(&mut out, *body);
            }
            NodeKind::AnnotationTypeMemberDeclaration {
                modifiers,
                ty,
                name,
                default,
            } => {
                out.extend(modifiers.iter().copied());
                one(&mut out, *ty);
                one(&mut out, *name);
                one(&mut out, *default);
            }
            NodeKind::Initializer { modifiers, body } => {
                out.extend(modifiers.iter().copied());
                one(&mut out, *body);
            }
            NodeKind::VariableDeclarationFragment {
                name, initializer, ..
            } => {
                one(&mut out, *name);
                one(&mut out, *initializer);
            }
            NodeKind::SingleVariableDeclaration {
                modifiers,
                ty,
                name,
                initializer,
                ..
            } => {
                out.extend(modifiers.iter().copied());
                one(&mut out, *ty);
                one(&mut out, *name);
                one(&mut out, *initializer);
            }
            NodeKind::TypeParameter {
                modifiers,
                name,
                bounds,
            } => {
                out.extend(modifiers.iter().copied());
                one(&mut out, *name);
                out.extend(bounds.iter().copied());
            }
            NodeKind::Modifier { .. } => {}
            NodeKind::Annotation {
                type_name, values, ..
            } => {
                one(&mut out, *type_name);
                out.extend(values.iter().copied());
            }
            NodeKind::MemberValuePair { name, value } => {
                one(&mut out, *name);
                one(&mut out, *value);
            }
            NodeKind::ModuleDeclaration {
                annotations,
                name,
                directives,
                ..
            } => {
                out.extend(annotations.iter().copied());
                one(&mut out, *name);
                out.extend(directives.iter().copied());
            }
            NodeKind::ModuleDirective { name, targets, .. } => {
                one(&mut out, *name);
                out.extend(targets.iter().copied());
            }
            NodeKind::Block { statements } => out.extend(statements.iter().copied()),
            NodeKind::TypeDeclarationStatement { declaration } => one(&mut out, *declaration),
            NodeKind::ExpressionStatement { expr }
            | NodeKind::Return { expr }
            | NodeKind::Throw { expr }
            | NodeKind::Yield { expr }
            | NodeKind::Parenthesized { expr } => one(&mut out, *expr),
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                one(&mut out, *condition);
                one(&mut out, *then_branch);
                one(&mut out, *else_branch);
            }
            NodeKind::While { condition, body } => {
                one(&mut out, *condition);
                one(&mut out, *body);
            }
            NodeKind::Do { body, condition } => {
                one(&mut out, *body);
                one(&mut out, *condition);
            }
            NodeKind::For {
                initializers,
                condition,
                updaters,
                body,
            } => {
                out.extend(initializers.iter().copied());
                one(&mut out, *condition);
                out.extend(updaters.iter().copied());
                one(&mut out, *body);
            }
            NodeKind::EnhancedFor {
                parameter,
                expr,
                body,
            } => {
                one(&mut out, *parameter);
                one(&mut out, *expr);
                one(&mut out, *body);
            }
            NodeKind::Break { label } | NodeKind::Continue { label } => one(&mut out, *label),
            NodeKind::Try {
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
            NodeKind::CatchClause { exception, body } => {
                one(&mut out, *exception);
                one(&mut out, *body);
            }
            NodeKind::Switch { expr, statements } => {
                one(&mut out, *expr);
                out.extend(statements.iter().copied());
            }
            NodeKind::SwitchCase { exprs, .. } => out.extend(exprs.iter().copied()),
            NodeKind::Synchronized { expr, body } => {
                one(&mut out, *expr);
                one(&mut out, *body);
            }
            NodeKind::Labeled { label, body } => {
                one(&mut out, *label);
                one(&mut out, *body);
            }
            NodeKind::Assert { expr, message } => {
                one(&mut out, *expr);
                one(&mut out, *message);
            }
            NodeKind::ConstructorInvocation { type_args, args } => {
                out.extend(type_args.iter().copied());
                out.extend(args.iter().copied());
            }
            NodeKind::SuperConstructorInvocation {
                expr,
                type_args,
                args,
            } => {
                one(&mut out, *expr);
                out.extend(type_args.iter().copied());
                out.extend(args.iter().copied());
            }
            NodeKind::Empty
            | NodeKind::SimpleName { .. }
            | NodeKind::NumberLiteral { .. }
            | NodeKind::StringLiteral { .. }
            | NodeKind::CharacterLiteral { .. }
            | NodeKind::TextBlock { .. }
            | NodeKind::BooleanLiteral { .. }
            | NodeKind::NullLiteral
            | NodeKind::PrimitiveType { .. } => {}
            NodeKind::QualifiedName { qualifier, name }
            | NodeKind::SuperFieldAccess { qualifier, name } => {
                one(&mut out, *qualifier);
                one(&mut out, *name);
            }
            NodeKind::FieldAccess { expr, name } => {
                one(&mut out, *expr);
                one(&mut out, *name);
            }
            NodeKind::This { qualifier } => one(&mut out, *qualifier),
            NodeKind::MethodInvocation {
                expr,
                type_args,
                name,
                args,
            } => {
                one(&mut out, *expr);
                out.extend(type_args.iter().copied());
                one(&mut out, *name);
                out.extend(args.iter().copied());
            }
            NodeKind::SuperMethodInvocation {
                qualifier,
                type_args,
                name,
                args,
            } => {
                one(&mut out, *qualifier);
                out.extend(type_args.iter().copied());
                one(&mut out, *name);
                out.extend(args.iter().copied());
            }
            NodeKind::ClassInstanceCreation {
                expr,
                type_args,
                ty,
                args,
                anonymous,
            } => {
                one(&mut out, *expr);
                out.extend(type_args.iter().copied());
                one(&mut out, *ty);
                out.extend(args.iter().copied());
                one(&mut out, *anonymous);
            }
            NodeKind::ArrayCreation {
                ty,
                dims,
                initializer,
            } => {
                one(&mut out, *ty);
                out.extend(dims.iter().copied());
                one(&mut out, *initializer);
            }
            NodeKind::ArrayInitializer { exprs } => out.extend(exprs.iter().copied()),
            NodeKind::ArrayAccess { array, index } => {
                one(&mut out, *array);
                one(&mut out, *index);
            }
            NodeKind::Prefix { operand, .. } | NodeKind::Postfix { operand, .. } => {
                one(&mut out, *operand)
            }
            NodeKind::Infix { left, right, .. } | NodeKind::Assignment { left, right, .. } => {
                one(&mut out, *left);
                one(&mut out, *right);
            }
            NodeKind::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                one(&mut out, *condition);
                one(&mut out, *then_expr);
                one(&mut out, *else_expr);
            }
            NodeKind::InstanceOf { expr, ty, pattern } => {
                one(&mut out, *expr);
                one(&mut out, *ty);
                one(&mut out, *pattern);
            }
            NodeKind::Cast { ty, expr } => {
                one(&mut out, *ty);
                one(&mut out, *expr);
            }
            NodeKind::TypeLiteral { ty } => one(&mut out, *ty),
            NodeKind::Lambda { params, body, .. } => {
                out.extend(params.iter().copied());
                one(&mut out, *body);
            }
            NodeKind::MethodReference {
                expr,
                type_args,
                name,
            } => {
                one(&mut out, *expr);
                out.extend(type_args.iter().copied());
                one(&mut out, *name);
            }
            NodeKind::SimpleType { name } => one(&mut out, *name),
            NodeKind::ArrayType { element, .. } => one(&mut out, *element),
            NodeKind::ParameterizedType { ty, args } => {
                one(&mut out, *ty);
                out.extend(args.iter().copied());
            }
            NodeKind::WildcardType { bound, .. } => one(&mut out, *bound),
            NodeKind::UnionType { types } | NodeKind::IntersectionType { types } => {
                out.extend(types.iter().copied())
            }
        }
        out
    }

    /// The list-valued child slots. A child held in one of these can be
    /// removed without leaving the parent incomplete.
    pub fn child_lists_mut(&mut self) -> SmallVec<[&mut Vec<AstId>; 4]> {
        let mut out: SmallVec<[&mut Vec<AstId>; 4]> = SmallVec::new();
        match self {
            NodeKind::CompilationUnit { imports, types, .. } => {
                out.push(imports);
                out.push(types);
            }
            NodeKind::PackageDeclaration { annotations, .. }
            | NodeKind::ModuleDeclaration {
                directives: annotations,
                ..
            } => out.push(annotations),
            NodeKind::TypeDeclaration {
                modifiers,
                type_params,
                interfaces,
                enum_constants,
                body,
                ..
            } => {
                out.push(modifiers);
                out.push(type_params);
                out.push(interfaces);
                out.push(enum_constants);
                out.push(body);
            }
            NodeKind::AnonymousClassDeclaration { body } => out.push(body),
            NodeKind::EnumConstantDeclaration {
                modifiers, args, ..
            } => {
                out.push(modifiers);
                out.push(args);
            }
            NodeKind::FieldDeclaration {
                modifiers,
                fragments,
                ..
            }
            | NodeKind::VariableDeclarationStatement {
                modifiers,
                fragments,
                ..
            }
            | NodeKind::VariableDeclarationExpression {
                modifiers,
                fragments,
                ..
            } => {
                out.push(modifiers);
                out.push(fragments);
            }
            NodeKind::MethodDeclaration {
                modifiers,
                type_params,
                params,
                thrown,
                ..
            } => {
                out.push(modifiers);
                out.push(type_params);
                out.push(params);
                out.push(thrown);
            }
            NodeKind::AnnotationTypeMemberDeclaration { modifiers, .. }
            | NodeKind::Initializer { modifiers, .. }
            | NodeKind::SingleVariableDeclaration { modifiers, .. } => out.push(modifiers),
            NodeKind::TypeParameter {
                modifiers, bounds, ..
            } => {
                out.push(modifiers);
                out.push(bounds);
            }
            NodeKind::Annotation { values, .. } => out.push(values),
            NodeKind::ModuleDirective { targets, .. } => out.push(targets),
            NodeKind::Block { statements } | NodeKind::Switch { statements, .. } => {
                out.push(statements)
            }
            NodeKind::For {
                initializers,
                updaters,
                ..
            } => {
                out.push(initializers);
                out.push(updaters);
            }
            NodeKind::Try {
                resources, catches, ..
            } => {
                out.push(resources);
                out.push(catches);
            }
            NodeKind::SwitchCase { exprs, .. }
            | NodeKind::ArrayInitializer { exprs }
            | NodeKind::UnionType { types: exprs }
            | NodeKind::IntersectionType { types: exprs } => out.push(exprs),
            NodeKind::ConstructorInvocation { type_args, args }
            | NodeKind::SuperConstructorInvocation {
                type_args, args, ..
            }
            | NodeKind::MethodInvocation {
                type_args, args, ..
            }
            | NodeKind::SuperMethodInvocation {
                type_args, args, ..
            }
            | NodeKind::ClassInstanceCreation {
                type_args, args, ..
            } => {
                out.push(type_args);
                out.push(args);
            }
            NodeKind::ArrayCreation { dims, .. } => out.push(dims),
            NodeKind::Lambda { params, .. } => out.push(params),
            NodeKind::MethodReference { type_args, .. } => out.push(type_args),
            NodeKind::ParameterizedType { args, .. } => out.push(args),
            _ => {}
        }
        out
    }
}

/// A host AST node.
#[derive(Clone, Debug, Serialize)]
pub struct AstNode {
    pub kind: NodeKind,
    /// Start offset (inclusive).
    pub start: u32,
    pub length: u32,
    pub parent: AstId,
    pub flags: AstFlags,
    #[serde(skip)]
    pub foreign: Option<ForeignRef>,
}

impl AstNode {
    pub fn new(kind: NodeKind, start: u32, end: u32) -> Self {
        AstNode {
            kind,
            start,
            length: end.saturating_sub(start),
            parent: AstId::NONE,
            flags: AstFlags::empty(),
            foreign: None,
        }
    }

    /// End offset (exclusive).
    pub fn end(&self) -> u32 {
        self.start + self.length
    }

    pub fn contains(&self, offset: u32) -> bool {
        self.start <= offset && offset < self.end()
    }

    pub fn is_recovered(&self) -> bool {
        self.flags.contains(AstFlags::RECOVERED)
    }
}
