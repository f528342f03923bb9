//! Compile task.
//!
//! A `CompileTask` drives one session's units through the front-end phases:
//! `parse` (one source at a time), `enter` (every parsed unit's
//! declarations) and `analyze` (attribution of each top-level class). The
//! task reports phase completion as [`TaskEvent`]s; the caller decides what
//! runs on each event.
//!
//! An analyze pass stops at the first completion failure. The diagnostics of
//! the interrupted class are discarded, the failure is reported, and the
//! next pass analyzes that same class again from the start. The retry gets
//! past the failure because the class that could not be loaded has been
//! replaced by an erroneous placeholder. Classes analyzed by an earlier
//! pass are not analyzed again.

use std::collections::VecDeque;
use std::sync::Arc;

use jbridge_binder::{CompletionFailure, SymbolId, SymbolTable, UnitId, UnitOrigin};
use jbridge_common::diagnostics::codes;
use jbridge_common::limits::MAX_ANALYZE_ATTEMPTS;
use jbridge_parser::{NodeIndex, ParseOptions, parse_unit};
use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::{debug, debug_span, warn};

use crate::context::{CheckerContext, CheckerOptions};
use crate::log::JavaDiagnostic;
use crate::state::CheckerState;

/// Analysis did not complete.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("analysis did not complete after {attempts} attempts")]
    RetryLimit {
        attempts: u32,
        #[source]
        last: CompletionFailure,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskEventKind {
    /// A unit was parsed.
    Parse,
    /// One top-level class was attributed.
    Analyze,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskEvent {
    pub kind: TaskEventKind,
    pub unit: UnitId,
    /// The analyzed top-level class (`Analyze` only).
    pub class: Option<SymbolId>,
    /// No other top-level class of the unit remains to be analyzed.
    pub last_in_unit: bool,
}

#[derive(Clone, Copy, Debug)]
struct PendingClass {
    unit: UnitId,
    class: SymbolId,
    node: NodeIndex,
}

pub struct CompileTask {
    pub ctx: CheckerContext,
    units: Vec<UnitId>,
    entered: FxHashSet<UnitId>,
    queue: VecDeque<PendingClass>,
    attempts: u32,
}

impl CompileTask {
    pub fn new(table: SymbolTable, options: CheckerOptions) -> Self {
        CompileTask {
            ctx: CheckerContext::new(table, options),
            units: Vec::new(),
            entered: FxHashSet::default(),
            queue: VecDeque::new(),
            attempts: 0,
        }
    }

    /// Source units in the order they were parsed.
    pub fn units(&self) -> &[UnitId] {
        &self.units
    }

    /// Parse one source and register it as a unit of this task. Syntax
    /// diagnostics go to the log.
    pub fn parse(&mut self, name: Arc<str>, text: Arc<str>) -> (UnitId, TaskEvent) {
        let _span = debug_span!("parse", unit = %name).entered();
        let names = self.ctx.table.names.clone();
        let tree = parse_unit(text, names, ParseOptions::default());
        let syntax: Vec<_> = tree
            .diagnostics
            .iter()
            .map(|d| (d.start, d.start + d.length, d.code, d.args.clone()))
            .collect();
        let unit = self.ctx.table.add_unit(name, UnitOrigin::Source, tree);
        for (start, end, code, args) in syntax {
            self.ctx.log.report(Some(unit), start, end, code, args);
        }
        self.units.push(unit);
        debug!(unit = unit.0, "parsed");
        let event = TaskEvent {
            kind: TaskEventKind::Parse,
            unit,
            class: None,
            last_in_unit: true,
        };
        (unit, event)
    }

    /// Enter the declarations of every parsed unit not entered yet and
    /// queue their top-level classes for analysis.
    pub fn enter(&mut self) {
        let _span = debug_span!("enter").entered();
        for &unit in &self.units {
            if !self.entered.insert(unit) {
                continue;
            }
            for class in self.ctx.table.enter_unit(unit) {
                let node = self
                    .ctx
                    .table
                    .symbol(class)
                    .and_then(|s| s.decl)
                    .map_or(NodeIndex::NONE, |d| d.node);
                self.queue.push_back(PendingClass { unit, class, node });
            }
        }
        self.ctx.flush_binder_diagnostics();
    }

    /// Analyze every queued class, retrying passes interrupted by a
    /// completion failure. `listener` runs after each class.
    pub fn analyze(&mut self, listener: &mut dyn FnMut(&mut CheckerContext, &TaskEvent)) -> Result<(), AnalyzeError> {
        self.enter();
        loop {
            match self.analyze_pass(listener) {
                Ok(()) => return Ok(()),
                Err(failure) => {
                    self.attempts += 1;
                    warn!(
                        attempt = self.attempts,
                        class = %failure.class_name,
                        error = %failure,
                        "analyze pass interrupted, retrying"
                    );
                    if self.attempts >= MAX_ANALYZE_ATTEMPTS {
                        return Err(AnalyzeError::RetryLimit {
                            attempts: self.attempts,
                            last: failure,
                        });
                    }
                }
            }
        }
    }

    /// One analyze pass over the queue. Stops at the first completion
    /// failure.
    pub fn analyze_pass(&mut self, listener: &mut dyn FnMut(&mut CheckerContext, &TaskEvent)) -> Result<(), CompletionFailure> {
        let _span = debug_span!("analyze", attempt = self.attempts + 1).entered();
        while let Some(pending) = self.queue.front().copied() {
            let mark = self.ctx.log.checkpoint();
            let outcome = match CheckerState::new(&mut self.ctx, pending.unit) {
                Some(mut state) => {
                    let result = state.check_top_level(pending.class, pending.node);
                    Some((result, state.last_position()))
                }
                None => None,
            };
            if let Some((Err(failure), (start, end))) = outcome {
                self.ctx.log.truncate(mark);
                self.ctx.table.take_diagnostics();
                self.ctx.log.report(
                    Some(pending.unit),
                    start,
                    end,
                    codes::COMPLETION_FAILURE,
                    vec![failure.class_name.clone(), failure.source.to_string()],
                );
                return Err(failure);
            }
            self.queue.pop_front();
            let last_in_unit = !self.queue.iter().any(|p| p.unit == pending.unit);
            let event = TaskEvent {
                kind: TaskEventKind::Analyze,
                unit: pending.unit,
                class: Some(pending.class),
                last_in_unit,
            };
            listener(&mut self.ctx, &event);
        }
        Ok(())
    }

    /// Resolve the references of the doc comment of `unit` that contains
    /// `offset`.
    pub fn attrib_doc_comment_at(&mut self, unit: UnitId, offset: u32) -> Result<bool, CompletionFailure> {
        match CheckerState::new(&mut self.ctx, unit) {
            Some(mut state) => state.attrib_doc_comment_at(offset),
            None => Ok(false),
        }
    }

    /// Diagnostics reported since the previous call.
    pub fn take_new_diagnostics(&mut self) -> Vec<JavaDiagnostic> {
        self.ctx.log.drain_new()
    }

    pub fn diagnostics(&self) -> &[JavaDiagnostic] {
        self.ctx.log.diagnostics()
    }

    /// Number of analyze passes interrupted so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn into_context(self) -> CheckerContext {
        self.ctx
    }
}
