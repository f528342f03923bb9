//! Host compilation units.

use std::sync::Arc;

use jbridge_binder::UnitId;
use jbridge_common::LineMap;
use serde::Serialize;

use crate::binding::Binding;
use crate::comment::Comment;
use crate::node::{AstId, NodeKind};
use crate::problem::Problem;
use crate::session::{BindingError, BindingResolver};
use crate::tree::Ast;

/// One converted source file: its tree, comments, problems and, when
/// bindings were requested, the resolver into its session.
#[derive(Debug, Serialize)]
pub struct CompilationUnit {
    /// Name the caller gave the source (`p/A.java`, `mem:///A.java`).
    pub source_id: Arc<str>,
    #[serde(skip)]
    pub source: Arc<str>,
    #[serde(skip)]
    pub line_map: LineMap,
    pub ast: Ast,
    pub root: AstId,
    pub comments: Vec<Comment>,
    pub problems: Vec<Problem>,
    #[serde(skip)]
    pub resolver: Option<BindingResolver>,
    /// Front-end unit this tree was converted from.
    #[serde(skip)]
    pub foreign_unit: Option<UnitId>,
}

impl CompilationUnit {
    pub fn new(source_id: Arc<str>, source: Arc<str>) -> Self {
        let line_map = LineMap::build(&source);
        CompilationUnit {
            source_id,
            source,
            line_map,
            ast: Ast::new(),
            root: AstId::NONE,
            comments: Vec::new(),
            problems: Vec::new(),
            resolver: None,
            foreign_unit: None,
        }
    }

    pub fn add_problem(&mut self, problem: Problem) {
        self.problems.push(problem);
    }

    pub fn has_errors(&self) -> bool {
        self.problems.iter().any(Problem::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Problem> {
        self.problems.iter().filter(|p| p.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Problem> {
        self.problems.iter().filter(|p| p.is_warning())
    }

    /// Binding of a node. `Ok(None)` when bindings were not requested or
    /// the node resolves to nothing.
    pub fn resolve_binding(&self, id: AstId) -> Result<Option<Arc<Binding>>, BindingError> {
        match &self.resolver {
            Some(resolver) => resolver.resolve_node(&self.ast, id),
            None => Ok(None),
        }
    }

    pub fn resolve_type_binding(&self, id: AstId) -> Result<Option<Arc<Binding>>, BindingError> {
        match &self.resolver {
            Some(resolver) => resolver.resolve_type(&self.ast, id),
            None => Ok(None),
        }
    }

    /// Dotted package name, empty for the unnamed package.
    pub fn package_name(&self) -> String {
        let Some(NodeKind::CompilationUnit { package, .. }) = self.ast.kind(self.root) else {
            return String::new();
        };
        match self.ast.kind(*package) {
            Some(NodeKind::PackageDeclaration { name, .. }) => self.name_text(*name),
            _ => String::new(),
        }
    }

    /// Top-level type declarations.
    pub fn types(&self) -> Vec<AstId> {
        match self.ast.kind(self.root) {
            Some(NodeKind::CompilationUnit { types, .. }) => types.clone(),
            _ => Vec::new(),
        }
    }

    /// Dotted text of a `SimpleName` or `QualifiedName`.
    pub fn name_text(&self, id: AstId) -> String {
        match self.ast.kind(id) {
            Some(NodeKind::SimpleName { identifier }) => identifier.to_string(),
            Some(NodeKind::QualifiedName { qualifier, name }) => {
                format!("{}.{}", self.name_text(*qualifier), self.name_text(*name))
            }
            _ => String::new(),
        }
    }

    /// Source text under a node.
    pub fn node_text(&self, id: AstId) -> &str {
        self.ast
            .range(id)
            .and_then(|(start, end)| self.source.get(start as usize..end as usize))
            .unwrap_or("")
    }

    /// Innermost node covering `offset`.
    pub fn node_at(&self, offset: u32) -> AstId {
        self.ast.node_at(self.root, offset)
    }

    /// 1-based line of an offset.
    pub fn line_number(&self, offset: u32) -> u32 {
        self.line_map.line_number(offset)
    }
}
