use std::fs;
use std::sync::Arc;

use jbridge_binder::{AccessRule, ClasspathEntry, RuleKind};
use jbridge_common::NameTable;
use jbridge_common::options::UNUSED_IMPORT;
use jbridge_common::CompilerOptions;
use jbridge_core::trimmer::{TrimStats, trim_to_focal_point};
use jbridge_core::{
    BindingRequestor, Project, ResolveFlags, ResolveRequest, SourceDescriptor, SourceId, WorkingCopy, resolve,
    resolve_with_keys,
};
use jbridge_dom::{AstFlags, AstId, Binding, CompilationUnit, NodeKind, ProblemId};
use jbridge_parser::{ParseOptions, parse_unit};

fn resolve_one(name: &str, source: &str, flags: ResolveFlags) -> CompilationUnit {
    let request = ResolveRequest::new()
        .with_unit(SourceDescriptor::virtual_source(name, source))
        .with_flags(flags);
    let mut units = resolve(&request).unwrap();
    units.swap_remove_index(0).unwrap().1
}

fn nodes_of<'a>(unit: &'a CompilationUnit, pred: impl Fn(&NodeKind) -> bool + 'a) -> Vec<AstId> {
    unit.ast
        .preorder(unit.root)
        .into_iter()
        .filter(|&id| unit.ast.kind(id).is_some_and(&pred))
        .collect()
}

#[test]
fn test_children_lie_inside_parents() {
    let source = "package p;\nimport java.util.List;\n/** Doc. */\npublic class A<T> {\n  private List<T> items;\n  int size(int extra) {\n    int n = items.size() + extra;\n    for (int i = 0; i < n; i++) { n -= i; }\n    return n > 0 ? n : -n;\n  }\n  class Inner { void run() { new Object() { }; } }\n}\n";
    let unit = resolve_one("p/A.java", source, ResolveFlags::empty());
    let ast = &unit.ast;
    for id in ast.preorder(unit.root) {
        let parent = ast.parent(id);
        if parent == AstId::NONE {
            continue;
        }
        let (start, end) = ast.range(id).unwrap();
        let (pstart, pend) = ast.range(parent).unwrap();
        assert!(
            pstart <= start && end <= pend,
            "{} [{start}, {end}) escapes its parent [{pstart}, {pend})",
            ast.kind(id).map_or("?", NodeKind::kind_name)
        );
    }
}

#[test]
fn test_focal_trimming_is_idempotent() {
    let source = "class A {\n  /** a */\n  void a() { int x = 1; }\n  void b() { int y = 2; }\n  void c() { int z = 3; }\n}\n";
    let mut tree = parse_unit(Arc::from(source), NameTable::shared(), ParseOptions::default());
    let focal = source.find("y = 2").unwrap() as u32;
    let first = trim_to_focal_point(&mut tree, focal);
    assert_eq!(first.bodies, 2);
    assert_eq!(first.doc_comments, 1);
    assert_eq!(trim_to_focal_point(&mut tree, focal), TrimStats::default());
}

#[test]
fn test_working_copy_shadows_file_but_not_buffer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("A.java");
    fs::write(&path, "class A { int disk; }").unwrap();
    let copy = WorkingCopy::new(&path, "class A { int copy; }");

    let request = ResolveRequest::new()
        .with_unit(SourceDescriptor::file(&path))
        .with_working_copy(copy.clone());
    let units = resolve(&request).unwrap();
    assert!(units[0].source.contains("copy"));

    let request = ResolveRequest::new()
        .with_unit(SourceDescriptor::buffer(&path, "class A { int buffer; }"))
        .with_working_copy(copy);
    let units = resolve(&request).unwrap();
    assert!(units[0].source.contains("buffer"));
}

#[test]
fn test_import_used_by_later_type_is_not_unused() {
    let source = "import java.util.List;\nimport java.util.Map;\nclass A {}\nclass B { List<String> names; }\n";
    let unit = resolve_one("A.java", source, ResolveFlags::FORCE_DIAGNOSTICS);
    let unused: Vec<_> = unit.problems.iter().filter(|p| p.id == ProblemId::UnusedImport).collect();
    assert_eq!(unused.len(), 1, "{:?}", unit.problems);
    assert_eq!(unused[0].args, vec!["java.util.Map".to_string()]);
    assert_eq!(unused[0].message, "The import java.util.Map is never used");
    assert_eq!(unused[0].line, 2);
}

#[test]
fn test_ignored_unused_import_is_not_reported() {
    let request = ResolveRequest::new()
        .with_unit(SourceDescriptor::virtual_source("A.java", "import java.util.Map;\nclass A {}\n"))
        .with_options(CompilerOptions::new().with(UNUSED_IMPORT, "ignore"))
        .with_flags(ResolveFlags::FORCE_DIAGNOSTICS);
    let units = resolve(&request).unwrap();
    assert!(units[0].problems.is_empty(), "{:?}", units[0].problems);
}

#[test]
fn test_missing_semicolon_gives_one_syntax_problem() {
    let unit = resolve_one("A.java", "class A { void m() { foo } }", ResolveFlags::empty());
    assert_eq!(unit.problems.len(), 1, "{:?}", unit.problems);
    assert!(unit.problems[0].is_error());

    let methods = nodes_of(&unit, |k| matches!(k, NodeKind::MethodDeclaration { .. }));
    let Some(NodeKind::MethodDeclaration { body, .. }) = unit.ast.kind(methods[0]) else {
        panic!("no method");
    };
    let body_node = unit.ast.get(*body).unwrap();
    let Some(NodeKind::Block { statements }) = unit.ast.kind(*body) else {
        panic!("no body");
    };
    assert!(statements.is_empty() || body_node.flags.intersects(AstFlags::RECOVERED | AstFlags::MALFORMED));
}

#[test]
fn test_recovered_statements_kept_on_request() {
    let unit = resolve_one(
        "A.java",
        "class A { void m() { foo } }",
        ResolveFlags::STATEMENTS_RECOVERY,
    );
    let recovered = nodes_of(&unit, |k| matches!(k, NodeKind::ExpressionStatement { .. }));
    assert_eq!(recovered.len(), 1);
    assert!(unit.ast.get(recovered[0]).unwrap().flags.contains(AstFlags::RECOVERED));
}

struct Recorder {
    asts: Vec<SourceId>,
    bindings: Vec<(String, Option<Arc<Binding>>)>,
}

impl BindingRequestor for Recorder {
    fn accept_ast(&mut self, source: &SourceId, _unit: &CompilationUnit) {
        self.asts.push(source.clone());
    }

    fn accept_binding(&mut self, key: &str, binding: Option<Arc<Binding>>) {
        self.bindings.push((key.to_string(), binding));
    }
}

fn project_request() -> ResolveRequest {
    ResolveRequest::new()
        .with_project(Project::new("app"))
        .with_unit(SourceDescriptor::buffer("src/p/A.java", "package p;\npublic class A {}\n"))
        .with_unit(SourceDescriptor::buffer("src/p/B.java", "package p;\nclass B { A a; }\n"))
        .with_flags(ResolveFlags::RESOLVE_BINDINGS)
}

#[test]
fn test_cross_unit_binding_keys_match() {
    let units = resolve(&project_request()).unwrap();
    let ids: Vec<&str> = units.keys().map(|k| &**k).collect();
    assert_eq!(ids, vec!["src/p/A.java", "src/p/B.java"]);

    let a = &units["src/p/A.java"];
    let declared = nodes_of(a, |k| matches!(k, NodeKind::TypeDeclaration { .. }));
    let declared = a.resolve_binding(declared[0]).unwrap().unwrap();
    assert_eq!(declared.key(), "Lp/A;");

    let b = &units["src/p/B.java"];
    let fields = nodes_of(b, |k| matches!(k, NodeKind::FieldDeclaration { .. }));
    let Some(NodeKind::FieldDeclaration { ty, .. }) = b.ast.kind(fields[0]) else {
        panic!("no field");
    };
    let referenced = b.resolve_type_binding(*ty).unwrap().unwrap();
    assert_eq!(referenced.key(), declared.key());
}

#[test]
fn test_keys_are_answered_after_asts() {
    let mut recorder = Recorder {
        asts: Vec::new(),
        bindings: Vec::new(),
    };
    resolve_with_keys(&project_request(), &["Lp/A;", "Lp/Missing;"], &mut recorder).unwrap();
    assert_eq!(recorder.asts.len(), 2);
    assert_eq!(recorder.bindings.len(), 2);
    assert_eq!(recorder.bindings[0].1.as_ref().map(|b| b.key().to_string()), Some("Lp/A;".to_string()));
    assert!(recorder.bindings[1].1.is_none());
}

#[test]
fn test_forbidden_type_and_member_references_are_distinct() {
    let library = ClasspathEntry::in_memory(
        "lib",
        [("p/Type.java", "package p; public class Type { public void method() {} }")],
    )
    .with_rule(AccessRule::new("p/*", RuleKind::Forbidden))
    .unwrap();
    let request = ResolveRequest::new()
        .with_project(Project::new("app").with_entry(library))
        .with_unit(SourceDescriptor::buffer(
            "src/B.java",
            "import p.Type;\nclass B {\n  void m(Type t) { t.method(); }\n}\n",
        ))
        .with_flags(ResolveFlags::FORCE_DIAGNOSTICS);
    let units = resolve(&request).unwrap();
    let forbidden: Vec<_> = units[0]
        .problems
        .iter()
        .filter(|p| p.id == ProblemId::ForbiddenReference)
        .collect();
    assert_eq!(forbidden.len(), 2, "{:?}", units[0].problems);
    assert!(forbidden.iter().all(|p| p.is_error()));
    assert_ne!(forbidden[0].message, forbidden[1].message);
    assert!(forbidden[0].message.contains("p.Type"));
    assert!(forbidden[1].message.contains("Type.method()"));
}
