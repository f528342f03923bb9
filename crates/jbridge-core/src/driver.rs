//! The resolution driver.
//!
//! A request is split into batches and every batch is compiled by its own
//! front-end session:
//!
//! 1. working copies are matched against the batch and the session
//!    classpath is assembled (working copies, project entries, source roots)
//! 2. each unit is parsed; parse listeners blank bodies and trim around the
//!    focal point
//! 3. when analysis is needed, every top-level class is attributed and the
//!    analyze listeners collect diagnostics and run the unused and access
//!    scanners
//! 4. each unit is converted, its problems assembled and suppressions
//!    applied
//! 5. the session either backs the units' binding resolvers or is released
//!
//! A unit that fails to convert is skipped; the first such failure is
//! returned once the batch is done.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use jbridge_binder::{ClasspathEntry, FileManager, SymbolTable, UnitId};
use jbridge_checker::{
    AnalyzeError, CheckerContext, CompileTask, DocLint, JavaDiagnostic, LintFlags, TaskEvent, TaskEventKind,
};
use jbridge_common::options::UNUSED_WARNING_TOKEN;
use jbridge_common::{NameTable, Severity};
use jbridge_dom::{Binding, BindingError, CompilationUnit, NodeKind, Problem, ProblemFactory, Session};
use jbridge_parser::{NodeData, ParsedUnit};
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;
use tracing::{debug, debug_span, error, info, trace, warn};

use crate::access::AccessScanner;
use crate::comments::attach_comments;
use crate::convert::{ConvertError, Converted, convert_tree, prune_recovered};
use crate::discovery::discover_secondary_types;
use crate::options::session_options;
use crate::overlay::Overlay;
use crate::overrides::OverrideCheck;
use crate::problems::{DiagnosticConverter, Finding};
use crate::request::{BindingRequestor, ResolveFlags, ResolveRequest};
use crate::source::{SourceDescriptor, SourceEncoding, SourceId, normalize_path, read_source};
use crate::suppress::Suppressions;
use crate::trimmer::{blank_method_bodies, trim_to_focal_point};
use crate::unused::UnusedScanner;

/// Identity of the placeholder unit compiled when keys are requested
/// without sources.
pub const MOCK_UNIT: &str = "$jbridge$Mock.java";

/// Converted units in request order.
pub type ResolvedUnits = IndexMap<SourceId, CompilationUnit>;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("resolution cancelled")]
    Cancelled,
    #[error("failed to convert {source_id}")]
    Conversion {
        source_id: SourceId,
        #[source]
        source: ConvertError,
    },
    #[error(transparent)]
    Analyze(#[from] AnalyzeError),
    #[error(transparent)]
    Binding(#[from] BindingError),
}

/// Convert every unit of `request`.
pub fn resolve(request: &ResolveRequest) -> Result<ResolvedUnits, ResolveError> {
    let run = run(request, false)?;
    if let Some(failure) = run.failure {
        return Err(failure);
    }
    Ok(run.units)
}

/// Convert every unit of `request` without bindings.
pub fn parse(request: &ResolveRequest) -> Result<ResolvedUnits, ResolveError> {
    let mut request = request.clone();
    request
        .flags
        .remove(ResolveFlags::RESOLVE_BINDINGS | ResolveFlags::BINDINGS_RECOVERY);
    resolve(&request)
}

/// Convert every unit of `request` and answer `keys`.
///
/// Every converted unit is handed to `requestor` first, then every key in
/// order. A key is answered from the nodes of the converted units when one
/// of them carries it, otherwise by looking it up in the session. Without
/// units a placeholder unit is compiled so there is a session to ask; its
/// tree is not handed out.
pub fn resolve_with_keys(
    request: &ResolveRequest,
    keys: &[&str],
    requestor: &mut dyn BindingRequestor,
) -> Result<(), ResolveError> {
    let run = run(request, !keys.is_empty())?;
    for (id, unit) in &run.units {
        requestor.accept_ast(id, unit);
    }

    let mut declared: FxHashMap<String, Arc<Binding>> = FxHashMap::default();
    for (id, unit) in &run.units {
        let keyed = unit
            .ast
            .preorder(unit.root)
            .into_iter()
            .filter(|&node| unit.ast.kind(node).is_some_and(carries_key));
        for node in keyed {
            match unit.resolve_binding(node) {
                Ok(Some(binding)) => {
                    declared.entry(binding.key().to_string()).or_insert(binding);
                }
                Ok(None) => {}
                Err(err) => debug!(unit = %id, error = %err, "node binding unavailable"),
            }
        }
    }

    for &key in keys {
        let mut answer = declared.get(key).cloned();
        for session in &run.sessions {
            if answer.is_some() {
                break;
            }
            answer = match session.find_by_key(key) {
                Ok(found) => found,
                Err(err) => {
                    debug!(key, error = %err, "key lookup failed");
                    None
                }
            };
        }
        trace!(key, found = answer.is_some(), "key answered");
        requestor.accept_binding(key, answer);
    }

    for session in &run.sessions {
        session.cleanup()?;
    }
    if let Some(failure) = run.failure {
        return Err(failure);
    }
    Ok(())
}

/// Nodes whose bindings go into the key map.
fn carries_key(kind: &NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::PackageDeclaration { .. }
            | NodeKind::ModuleDeclaration { .. }
            | NodeKind::TypeDeclaration { .. }
            | NodeKind::MethodDeclaration { .. }
            | NodeKind::AnnotationTypeMemberDeclaration { .. }
            | NodeKind::EnumConstantDeclaration { .. }
            | NodeKind::VariableDeclarationFragment { .. }
            | NodeKind::SingleVariableDeclaration { .. }
            | NodeKind::MethodInvocation { .. }
            | NodeKind::SuperMethodInvocation { .. }
            | NodeKind::ClassInstanceCreation { .. }
            | NodeKind::SimpleType { .. }
            | NodeKind::ParameterizedType { .. }
    )
}

#[derive(Default)]
struct Run {
    units: ResolvedUnits,
    sessions: Vec<Arc<Session>>,
    failure: Option<ResolveError>,
}

fn run(request: &ResolveRequest, keys: bool) -> Result<Run, ResolveError> {
    let _span = debug_span!("resolve", units = request.units.len(), keys).entered();
    let keep_session = keys || request.has(ResolveFlags::RESOLVE_BINDINGS);

    let mut converted: FxHashMap<SourceId, CompilationUnit> = FxHashMap::default();
    let mut run = Run::default();
    let mock = request.units.is_empty() && keys;
    let batches = if mock {
        vec![vec![SourceDescriptor::virtual_source(MOCK_UNIT, "")]]
    } else {
        batches(request)
    };

    for batch in &batches {
        if request.cancellation.is_cancelled() {
            info!("resolution cancelled");
            return Err(ResolveError::Cancelled);
        }
        let output = compile_batch(request, batch, keep_session)?;
        if let Some(session) = output.session {
            run.sessions.push(session);
        }
        if run.failure.is_none() {
            run.failure = output.failure;
        }
        converted.extend(output.units);
    }

    if !mock {
        for unit in &request.units {
            let id = unit.id();
            if let Some(cu) = converted.remove(&id) {
                run.units.insert(id, cu);
            }
        }
    }
    Ok(run)
}

/// Native units of one project compile together; anything else compiles
/// alone.
fn batches(request: &ResolveRequest) -> Vec<Vec<SourceDescriptor>> {
    if request.units.is_empty() {
        return Vec::new();
    }
    let together = request.project.is_some() && request.units.iter().all(SourceDescriptor::is_native);
    if together || request.units.len() == 1 {
        vec![request.units.clone()]
    } else {
        request.units.iter().map(|u| vec![u.clone()]).collect()
    }
}

type Listener<'a> = Box<dyn FnMut(&mut CheckerContext, &TaskEvent) + 'a>;

/// Phase listeners, run in registration order.
#[derive(Default)]
struct PhaseListeners<'a> {
    listeners: Vec<(&'static [TaskEventKind], Listener<'a>)>,
}

impl<'a> PhaseListeners<'a> {
    fn register(&mut self, phases: &'static [TaskEventKind], listener: impl FnMut(&mut CheckerContext, &TaskEvent) + 'a) {
        self.listeners.push((phases, Box::new(listener)));
    }

    fn dispatch(&mut self, ctx: &mut CheckerContext, event: &TaskEvent) {
        for (phases, listener) in &mut self.listeners {
            if phases.contains(&event.kind) {
                listener(ctx, event);
            }
        }
    }
}

const BOTH: &[TaskEventKind] = &[TaskEventKind::Parse, TaskEventKind::Analyze];
const PARSE: &[TaskEventKind] = &[TaskEventKind::Parse];
const ANALYZE: &[TaskEventKind] = &[TaskEventKind::Analyze];

/// Per-unit output of the listeners.
#[derive(Default)]
struct Collected {
    diagnostics: FxHashMap<UnitId, Vec<JavaDiagnostic>>,
    findings: FxHashMap<UnitId, Vec<Finding>>,
}

fn bucket(into: &mut FxHashMap<UnitId, Vec<JavaDiagnostic>>, diagnostics: Vec<JavaDiagnostic>) {
    for diag in diagnostics {
        if let Some(unit) = diag.unit {
            into.entry(unit).or_default().push(diag);
        }
    }
}

struct BatchOutput {
    units: Vec<(SourceId, CompilationUnit)>,
    session: Option<Arc<Session>>,
    failure: Option<ResolveError>,
}

fn compile_batch(
    request: &ResolveRequest,
    batch: &[SourceDescriptor],
    keep_session: bool,
) -> Result<BatchOutput, ResolveError> {
    let _span = debug_span!("batch", units = batch.len()).entered();
    let project = request.project.as_ref();
    let focal = request.focal_point;

    let overlay = Overlay::build(&request.working_copies, batch, project);
    let mut classpath: Vec<ClasspathEntry> = overlay.classpath_entry().into_iter().collect();
    if let Some(project) = project {
        classpath.extend(project.session_classpath());
    }
    let table = SymbolTable::new(NameTable::shared(), FileManager::new(classpath));
    let checker_options = session_options(&request.options, request.flags, focal, project);
    let doclint = checker_options.doclint;
    let mut task = CompileTask::new(table, checker_options);

    let analyzing = request.needs_analysis() || keep_session;
    let scanning = analyzing && task.ctx.lint(LintFlags::ALL);
    let mut unused = UnusedScanner::new(&request.options);
    let mut access = AccessScanner::new(task.ctx.table.file_manager.name_environment(), &request.options);
    let focal_source = batch.first().map(SourceDescriptor::id);
    let mut collected = Collected::default();
    let mut units: Vec<(SourceId, UnitId)> = Vec::new();

    {
        let mut listeners = PhaseListeners::default();
        let diagnostics = &mut collected.diagnostics;
        listeners.register(BOTH, move |ctx, _| bucket(diagnostics, ctx.log.drain_new()));
        if request.has(ResolveFlags::IGNORE_METHOD_BODIES) {
            listeners.register(PARSE, |ctx, event| {
                if let Some(unit) = ctx.table.unit_mut(event.unit) {
                    let blanked = blank_method_bodies(unit.tree_mut());
                    trace!(unit = event.unit.0, blanked, "method bodies ignored");
                }
            });
        }
        if let (Some(focal), Some(focal_source)) = (focal, focal_source.clone()) {
            listeners.register(PARSE, move |ctx, event| {
                let Some(unit) = ctx.table.unit_mut(event.unit) else {
                    return;
                };
                if *unit.name == *focal_source {
                    trim_to_focal_point(unit.tree_mut(), focal);
                }
            });
        }
        if scanning && (unused.is_active() || access.is_active()) {
            let findings = &mut collected.findings;
            let unused = &mut unused;
            let access = &mut access;
            listeners.register(ANALYZE, move |ctx, event| {
                let Some(class) = event.class else {
                    return;
                };
                let out = findings.entry(event.unit).or_default();
                if unused.is_active() {
                    out.extend(unused.scan_class(&ctx.table, event.unit, class, event.last_in_unit));
                }
                if access.is_active() {
                    out.extend(access.scan_class(&ctx.table, event.unit, class));
                }
            });
        }

        for descriptor in batch {
            if request.cancellation.is_cancelled() {
                info!("resolution cancelled");
                return Err(ResolveError::Cancelled);
            }
            let id = descriptor.id();
            let Some(text) = unit_text(descriptor, &overlay) else {
                continue;
            };
            let (unit, event) = task.parse(id.clone(), text);
            listeners.dispatch(&mut task.ctx, &event);
            units.push((id, unit));
        }

        if analyzing {
            add_secondary_types(request, batch, &mut task, &mut listeners);
            if let Err(err) = task.analyze(&mut |ctx, event| listeners.dispatch(ctx, event)) {
                error!(error = %err, "analysis gave up");
                return Err(err.into());
            }
        }
    }
    bucket(&mut collected.diagnostics, task.take_new_diagnostics());

    if let (Some(focal), Some(&(_, unit))) = (focal, units.first()) {
        if analyzing && doclint == DocLint::None {
            match task.attrib_doc_comment_at(unit, focal) {
                Ok(found) => trace!(focal, found, "doc comment at focal point attributed"),
                Err(err) => warn!(focal, error = %err, "doc comment attribution failed"),
            }
        }
    }

    let checks = OverrideCheck::new(&request.options);
    if keep_session && analyzing && checks.is_active() {
        for (id, unit) in &units {
            match checks.scan_unit(&mut task.ctx.table, *unit) {
                Ok(found) => collected.findings.entry(*unit).or_default().extend(found),
                Err(err) => warn!(unit = %id, error = %err, "override check incomplete"),
            }
        }
    }

    let converter = DiagnosticConverter::new(&request.options);
    let mut checked: FxHashSet<&str> = FxHashSet::default();
    if scanning && request.has(ResolveFlags::FORCE_DIAGNOSTICS) {
        if unused.is_active() {
            checked.insert("unused");
        }
        if access.is_active() {
            checked.insert("restriction");
        }
        if task.ctx.lint(LintFlags::DEPRECATION) {
            checked.insert("deprecation");
        }
        if task.ctx.lint(LintFlags::RAWTYPES) {
            checked.insert("rawtypes");
        }
    }
    let token_severity = request.options.severity(UNUSED_WARNING_TOKEN);

    let single = batch.len() == 1;
    let mut output = BatchOutput {
        units: Vec::with_capacity(units.len()),
        session: None,
        failure: None,
    };
    for (id, unit) in &units {
        if request.cancellation.is_cancelled() {
            info!("resolution cancelled");
            return Err(ResolveError::Cancelled);
        }
        if let (true, Some(focal)) = (single, focal) {
            if let Some(source) = task.ctx.table.unit_mut(*unit) {
                trim_to_focal_point(source.tree_mut(), focal);
            }
        }
        let _span = debug_span!("convert", unit = %id).entered();
        let Some(tree) = task.ctx.table.tree(*unit) else {
            continue;
        };
        let converted = match convert_tree(&tree, *unit) {
            Ok(converted) => converted,
            Err(err) => {
                error!(unit = %id, error = %err, "conversion failed");
                if output.failure.is_none() {
                    output.failure = Some(ResolveError::Conversion {
                        source_id: id.clone(),
                        source: err,
                    });
                }
                continue;
            }
        };
        let diagnostics = collected.diagnostics.remove(unit).unwrap_or_default();
        let findings = collected.findings.remove(unit).unwrap_or_default();
        let mut cu = build_unit(request, id, *unit, &tree, converted);
        cu.problems = unit_problems(&converter, &cu, &tree, &diagnostics, &findings, &checked, token_severity);
        debug!(unit = %id, problems = cu.problems.len(), "unit converted");
        output.units.push((id.clone(), cu));
    }

    if keep_session {
        let names: FxHashMap<Arc<str>, UnitId> = units.iter().map(|(id, unit)| (id.clone(), *unit)).collect();
        let packages: Vec<Arc<str>> = output
            .units
            .iter()
            .map(|(_, cu)| Arc::from(cu.package_name()))
            .collect();
        let session = Session::new(task.into_context(), names);
        let recovery = request.has(ResolveFlags::BINDINGS_RECOVERY);
        for ((_, cu), package) in output.units.iter_mut().zip(packages) {
            if let Some(unit) = cu.foreign_unit {
                cu.resolver = Some(session.resolver(unit, package, recovery));
            }
        }
        output.session = Some(session);
    } else {
        task.ctx.table.file_manager.close();
        debug!("session released");
    }
    Ok(output)
}

/// Text a unit is compiled from: a shadowing working copy, the unit's own
/// text, or the file.
fn unit_text(descriptor: &SourceDescriptor, overlay: &Overlay) -> Option<Arc<str>> {
    let id = descriptor.id();
    if let Some(text) = overlay.text_for(&id) {
        return Some(text.clone());
    }
    if let Some(text) = descriptor.own_text() {
        return Some(text.clone());
    }
    let SourceDescriptor::File { path, encoding } = descriptor else {
        return None;
    };
    match read_source(path, *encoding) {
        Ok(text) => Some(text),
        Err(err) => {
            warn!(unit = %id, error = %err, "source unreadable, skipped");
            None
        }
    }
}

/// Parse sibling files declaring secondary types as hidden units.
fn add_secondary_types(
    request: &ResolveRequest,
    batch: &[SourceDescriptor],
    task: &mut CompileTask,
    listeners: &mut PhaseListeners<'_>,
) {
    let Some(project) = request.project.as_ref() else {
        return;
    };
    if project.source_roots().is_empty() {
        return;
    }
    let files: Vec<&Path> = batch
        .iter()
        .filter_map(|d| match d {
            SourceDescriptor::File { path, .. } => Some(path.as_path()),
            _ => None,
        })
        .collect();
    let known: FxHashSet<String> = files.iter().map(|p| normalize_path(p)).collect();
    let names = task.ctx.table.names.clone();
    for found in discover_secondary_types(files.iter().copied(), &known, &names) {
        debug!(path = %found.path.display(), types = ?found.types, "secondary types added");
        let text = match read_source(&found.path, SourceEncoding::Auto) {
            Ok(text) => text,
            Err(_) => found.text,
        };
        let (_, event) = task.parse(Arc::from(normalize_path(&found.path)), text);
        listeners.dispatch(&mut task.ctx, &event);
    }
}

fn build_unit(
    request: &ResolveRequest,
    id: &SourceId,
    unit: UnitId,
    tree: &ParsedUnit,
    converted: Converted,
) -> CompilationUnit {
    let mut comments = attach_comments(tree, &converted);
    let Converted { mut ast, root, .. } = converted;
    if !request.has(ResolveFlags::STATEMENTS_RECOVERY) {
        let stats = prune_recovered(&mut ast, root, &mut comments);
        trace!(unit = %id, ?stats, "recovered nodes pruned");
    }
    let mut cu = CompilationUnit::new(id.clone(), tree.source.clone());
    cu.ast = ast;
    cu.root = root;
    cu.comments = comments;
    cu.foreign_unit = Some(unit);
    cu
}

/// Problems of one unit, ordered by position, with suppressions applied.
fn unit_problems(
    converter: &DiagnosticConverter<'_>,
    cu: &CompilationUnit,
    tree: &ParsedUnit,
    diagnostics: &[JavaDiagnostic],
    findings: &[Finding],
    checked: &FxHashSet<&str>,
    token_severity: Severity,
) -> Vec<Problem> {
    let imports = import_ranges(tree);
    let in_import = |pos: u32| imports.iter().any(|&(start, end)| start <= pos && pos < end);

    let mut problems: Vec<Problem> = diagnostics
        .iter()
        .filter_map(|diag| converter.convert(diag, cu, in_import(diag.start)))
        .chain(findings.iter().filter_map(|f| converter.convert_finding(f, cu)))
        .collect();

    let mut suppressions = Suppressions::collect(cu);
    if !suppressions.is_empty() {
        problems = suppressions.filter(problems);
        let factory = ProblemFactory {
            source_file: cu.source_id.clone(),
            source: &cu.source,
            line_map: &cu.line_map,
        };
        problems.extend(suppressions.unnecessary(&factory, token_severity, checked));
    }
    problems.sort_by_key(|p| (p.start, p.end));
    problems
}

fn import_ranges(tree: &ParsedUnit) -> Vec<(u32, u32)> {
    let Some(NodeData::CompilationUnit { imports, .. }) = tree.arena.data(tree.root) else {
        return Vec::new();
    };
    imports.iter().filter_map(|&import| tree.arena.pos_end(import)).collect()
}

#[cfg(test)]
mod tests {
    use jbridge_dom::ProblemId;

    use super::*;

    #[test]
    fn test_virtual_units_compile_alone() {
        let request = ResolveRequest::new()
            .with_unit(SourceDescriptor::virtual_source("A.java", "class A {}"))
            .with_unit(SourceDescriptor::virtual_source("B.java", "class B {}"));
        assert_eq!(batches(&request).len(), 2);
    }

    #[test]
    fn test_results_follow_request_order() {
        let request = ResolveRequest::new()
            .with_unit(SourceDescriptor::virtual_source("B.java", "class B {}"))
            .with_unit(SourceDescriptor::virtual_source("A.java", "class A {}"));
        let units = resolve(&request).unwrap();
        let ids: Vec<&str> = units.keys().map(|k| &**k).collect();
        assert_eq!(ids, vec!["mem:///B.java", "mem:///A.java"]);
    }

    #[test]
    fn test_unreadable_file_is_skipped() {
        let request = ResolveRequest::new()
            .with_unit(SourceDescriptor::file("/nonexistent/jbridge/Missing.java"))
            .with_unit(SourceDescriptor::virtual_source("A.java", "class A {}"));
        let units = resolve(&request).unwrap();
        assert_eq!(units.len(), 1);
    }

    #[test]
    fn test_cancelled_before_first_batch() {
        let request = ResolveRequest::new().with_unit(SourceDescriptor::virtual_source("A.java", "class A {}"));
        request.cancellation.cancel();
        assert!(matches!(resolve(&request), Err(ResolveError::Cancelled)));
    }

    #[test]
    fn test_suppressed_unused_field() {
        let source = "class A {\n  @SuppressWarnings(\"unused\") private int a;\n  private int b;\n}\n";
        let request = ResolveRequest::new()
            .with_unit(SourceDescriptor::virtual_source("A.java", source))
            .with_flags(ResolveFlags::FORCE_DIAGNOSTICS);
        let units = resolve(&request).unwrap();
        let unit = &units["mem:///A.java"];
        let ids: Vec<ProblemId> = unit.problems.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![ProblemId::UnusedPrivateField]);
        assert_eq!(unit.problems[0].args, vec!["A".to_string(), "b".to_string()]);
    }

    struct Recorder {
        asts: Vec<SourceId>,
        bindings: Vec<(String, bool)>,
    }

    impl BindingRequestor for Recorder {
        fn accept_ast(&mut self, source: &SourceId, _unit: &CompilationUnit) {
            self.asts.push(source.clone());
        }

        fn accept_binding(&mut self, key: &str, binding: Option<Arc<Binding>>) {
            self.bindings.push((key.to_string(), binding.is_some()));
        }
    }

    #[test]
    fn test_keys_without_units_use_placeholder() {
        let mut recorder = Recorder {
            asts: Vec::new(),
            bindings: Vec::new(),
        };
        resolve_with_keys(&ResolveRequest::new(), &["Ljava/lang/String;"], &mut recorder).unwrap();
        assert!(recorder.asts.is_empty());
        assert_eq!(recorder.bindings, vec![("Ljava/lang/String;".to_string(), true)]);
    }
}
