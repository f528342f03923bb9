//! Resolve requests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bitflags::bitflags;
use jbridge_common::CompilerOptions;
use jbridge_dom::{Binding, CompilationUnit};

use crate::overlay::WorkingCopy;
use crate::project::Project;
use crate::source::{SourceDescriptor, SourceId};

bitflags! {
    /// Behaviour switches of a resolve request.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResolveFlags: u8 {
        /// Keep the session alive and attach a binding resolver to every
        /// unit.
        const RESOLVE_BINDINGS = 1 << 0;
        /// Empty every method body after parsing.
        const IGNORE_METHOD_BODIES = 1 << 1;
        /// Run analysis and report every diagnostic category.
        const FORCE_DIAGNOSTICS = 1 << 2;
        /// Keep nodes synthesized by syntax error recovery.
        const STATEMENTS_RECOVERY = 1 << 3;
        /// Produce recovered bindings for unresolved names.
        const BINDINGS_RECOVERY = 1 << 4;
    }
}

/// Cooperative cancellation, checked before each batch and between units.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Receives the results of a key-driven resolve.
pub trait BindingRequestor {
    /// A converted unit. Not called for the placeholder unit compiled when
    /// only keys were requested.
    fn accept_ast(&mut self, source: &SourceId, unit: &CompilationUnit);

    /// The answer for one requested key.
    fn accept_binding(&mut self, key: &str, binding: Option<Arc<Binding>>);
}

/// Everything one call to the resolver needs.
#[derive(Clone, Debug, Default)]
pub struct ResolveRequest {
    pub units: Vec<SourceDescriptor>,
    pub options: CompilerOptions,
    pub project: Option<Project>,
    pub working_copies: Vec<WorkingCopy>,
    pub flags: ResolveFlags,
    pub focal_point: Option<u32>,
    pub cancellation: CancellationToken,
}

impl ResolveRequest {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_unit(mut self, unit: SourceDescriptor) -> Self {
        self.units.push(unit);
        self
    }

    #[must_use]
    pub fn with_units(mut self, units: impl IntoIterator<Item = SourceDescriptor>) -> Self {
        self.units.extend(units);
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_project(mut self, project: Project) -> Self {
        self.project = Some(project);
        self
    }

    #[must_use]
    pub fn with_working_copy(mut self, copy: WorkingCopy) -> Self {
        self.working_copies.push(copy);
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: ResolveFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[must_use]
    pub fn with_focal_point(mut self, offset: u32) -> Self {
        self.focal_point = Some(offset);
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn has(&self, flags: ResolveFlags) -> bool {
        self.flags.contains(flags)
    }

    /// Analysis runs when diagnostics or bindings are wanted, or when
    /// annotation processing could contribute.
    pub fn needs_analysis(&self) -> bool {
        self.flags.intersects(
            ResolveFlags::FORCE_DIAGNOSTICS | ResolveFlags::BINDINGS_RECOVERY | ResolveFlags::RESOLVE_BINDINGS,
        ) || self.project.as_ref().is_some_and(Project::annotation_processing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_rule() {
        let request = ResolveRequest::new().with_unit(SourceDescriptor::file("A.java"));
        assert!(!request.needs_analysis());
        assert!(request.clone().with_flags(ResolveFlags::FORCE_DIAGNOSTICS).needs_analysis());
        assert!(
            request
                .with_project(Project::new("app").with_annotation_processing(true))
                .needs_analysis()
        );
    }

    #[test]
    fn test_cancellation_is_shared() {
        let token = CancellationToken::new();
        let request = ResolveRequest::new().with_cancellation(token.clone());
        token.cancel();
        assert!(request.cancellation.is_cancelled());
    }
}
