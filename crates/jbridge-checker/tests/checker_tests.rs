use std::fs;
use std::sync::Arc;

use jbridge_binder::{ClasspathEntry, FileManager, SymbolTable, UnitId};
use jbridge_checker::{CheckerOptions, CompileTask, DocLint, JavaDiagnostic, TaskEvent, TaskEventKind};
use jbridge_common::NameTable;
use jbridge_common::diagnostics::codes;
use jbridge_parser::NodeData;

fn compile_with(
    sources: &[(&str, &str)],
    options: CheckerOptions,
    classpath: Vec<ClasspathEntry>,
) -> (CompileTask, Vec<UnitId>, Vec<TaskEvent>) {
    let names = NameTable::shared();
    let table = SymbolTable::new(names, FileManager::new(classpath));
    let mut task = CompileTask::new(table, options);
    let units = sources
        .iter()
        .map(|(name, text)| task.parse(Arc::from(*name), Arc::from(*text)).0)
        .collect();
    let mut events = Vec::new();
    task.analyze(&mut |_, event| events.push(*event)).unwrap();
    (task, units, events)
}

fn compile(source: &str) -> Vec<JavaDiagnostic> {
    let (task, _, _) = compile_with(&[("A.java", source)], CheckerOptions::default(), Vec::new());
    task.diagnostics().to_vec()
}

fn with_code<'a>(diags: &'a [JavaDiagnostic], code: &str) -> Vec<&'a JavaDiagnostic> {
    diags.iter().filter(|d| d.code == code).collect()
}

#[test]
fn test_clean_unit_has_no_diagnostics() {
    let diags = compile(
        "import java.util.List;\nimport java.util.ArrayList;\nclass A {\n  List<String> names = new ArrayList<>();\n  int count(String s) {\n    int total = 0;\n    for (String n : names) { total += n.length(); }\n    return total + s.length();\n  }\n}\n",
    );
    assert!(diags.is_empty(), "unexpected: {diags:?}");
}

#[test]
fn test_recovered_statement_is_not_attributed() {
    let diags = compile("class A { void m() { foo } }");
    assert!(diags.iter().any(JavaDiagnostic::is_error));
    assert!(with_code(&diags, codes::CANT_RESOLVE).is_empty());
}

#[test]
fn test_unresolved_variable_and_method() {
    let diags = compile("class A {\n  int m() { return x; }\n  void n() { \"s\".frob(); }\n}\n");
    let missing = with_code(&diags, codes::CANT_RESOLVE);
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].args, vec!["variable".to_string(), "x".to_string()]);
    assert_eq!(missing[0].message(), "cannot find symbol: variable x");

    let located = with_code(&diags, codes::CANT_RESOLVE_LOCATION);
    assert_eq!(located.len(), 1);
    assert_eq!(located[0].args[0], "method");
    assert_eq!(located[0].args[1], "frob()");
}

#[test]
fn test_statement_checks() {
    let diags = compile(
        "class A {\n  void m() { int a = 1; int a = 2; }\n  void b() { break; }\n  int r() { return; }\n}\n",
    );
    let dup = with_code(&diags, codes::ALREADY_DEFINED);
    assert_eq!(dup.len(), 1);
    assert_eq!(dup[0].args, vec!["variable".to_string(), "a".to_string(), "method m()".to_string()]);
    assert_eq!(with_code(&diags, codes::BREAK_OUTSIDE_SWITCH_LOOP).len(), 1);
    assert_eq!(with_code(&diags, codes::MISSING_RET_VAL).len(), 1);
}

#[test]
fn test_literal_assignments() {
    let diags = compile("class A {\n  void m() {\n    int i = \"s\";\n    byte b = 200;\n    byte c = 10;\n    long l = 3;\n  }\n}\n");
    let incompatible = with_code(&diags, codes::INCOMPATIBLE_TYPES);
    assert_eq!(incompatible.len(), 2);
    assert_eq!(incompatible[0].args, vec!["String".to_string(), "int".to_string()]);
    assert_eq!(incompatible[1].args, vec!["int".to_string(), "byte".to_string()]);
}

#[test]
fn test_static_context_and_arity() {
    let diags = compile("class A {\n  int f;\n  static void s() { f = 1; }\n  void n(int a) {}\n  void m() { n(); }\n}\n");
    let non_static = with_code(&diags, codes::NON_STATIC_CANT_BE_REF);
    assert_eq!(non_static.len(), 1);
    assert_eq!(non_static[0].args, vec!["variable".to_string(), "f".to_string()]);

    let inapplicable = with_code(&diags, codes::CANT_APPLY_SYMBOL);
    assert_eq!(inapplicable.len(), 1);
    assert_eq!(inapplicable[0].args[0], "method");
    assert_eq!(inapplicable[0].args[1], "n");
    assert_eq!(inapplicable[0].args[3], "int");
    assert_eq!(inapplicable[0].args[4], "no arguments");
}

#[test]
fn test_method_call_records_symbol() {
    let (mut task, units, _) = compile_with(
        &[("A.java", "class A {\n  void n(int a) {}\n  void m() { n(1); }\n}\n")],
        CheckerOptions::default(),
        Vec::new(),
    );
    let unit = units[0];
    let table = &mut task.ctx.table;
    let tree = table.tree(unit).unwrap();
    let callee = tree
        .arena
        .preorder(tree.root)
        .into_iter()
        .find_map(|n| match tree.arena.data(n) {
            Some(NodeData::MethodCall { callee, .. }) => Some(*callee),
            _ => None,
        })
        .unwrap();
    let a = table.load_class("A").unwrap().unwrap();
    let n = table.intern("n");
    let methods = table.find_methods(a, n).unwrap();
    assert_eq!(table.symbol_at(unit, callee), Some(methods[0]));
}

#[test]
fn test_cross_unit_reference() {
    let (task, _, _) = compile_with(
        &[
            ("p/Base.java", "package p;\npublic class Base { public int size() { return 0; } }\n"),
            ("q/User.java", "package q;\nimport p.Base;\nclass User { int use(Base b) { return b.size(); } }\n"),
        ],
        CheckerOptions::default(),
        Vec::new(),
    );
    assert!(task.diagnostics().is_empty(), "{:?}", task.diagnostics());
}

#[test]
fn test_anonymous_class_body_is_attributed() {
    let (task, _, _) = compile_with(
        &[(
            "A.java",
            "class A {\n  void m() {\n    Runnable r = new Runnable() {\n      public void run() { int x = y; }\n    };\n  }\n}\n",
        )],
        CheckerOptions::default(),
        Vec::new(),
    );
    let missing = with_code(task.diagnostics(), codes::CANT_RESOLVE);
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].args[1], "y");
    assert!(task.ctx.table.class_by_flat_name("A$1").is_some());
}

#[test]
fn test_enum_switch_labels() {
    let diags = compile(
        "enum E { X, Y }\nclass A {\n  void m(E e) {\n    switch (e) {\n      case X: break;\n      case Z: break;\n    }\n  }\n}\n",
    );
    let located = with_code(&diags, codes::CANT_RESOLVE_LOCATION);
    assert_eq!(located.len(), 1);
    assert_eq!(located[0].args[0], "variable");
    assert_eq!(located[0].args[1], "Z");
    assert!(with_code(&diags, codes::BREAK_OUTSIDE_SWITCH_LOOP).is_empty());
}

#[test]
fn test_deprecation_needs_lint() {
    let sources = [
        ("Old.java", "class Old { @Deprecated static void gone() {} }\n"),
        ("User.java", "class User { void m() { Old.gone(); } }\n"),
    ];
    let (task, _, _) = compile_with(&sources, CheckerOptions::default().with_lint("all"), Vec::new());
    let warnings = with_code(task.diagnostics(), codes::DEPRECATED);
    assert_eq!(warnings.len(), 1);
    assert!(!warnings[0].is_error());

    let (task, _, _) = compile_with(&sources, CheckerOptions::default().with_lint("raw"), Vec::new());
    assert!(with_code(task.diagnostics(), codes::DEPRECATED).is_empty());
}

#[test]
fn test_one_analyze_event_per_top_level_class() {
    let (_, units, events) = compile_with(
        &[("A.java", "class A {}\nclass B {}\n")],
        CheckerOptions::default(),
        Vec::new(),
    );
    let analyzed: Vec<_> = events.iter().filter(|e| e.kind == TaskEventKind::Analyze).collect();
    assert_eq!(analyzed.len(), 2);
    assert!(analyzed.iter().all(|e| e.unit == units[0]));
    assert!(!analyzed[0].last_in_unit);
    assert!(analyzed[1].last_in_unit);
}

#[test]
fn test_completion_failure_is_retried() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("q")).unwrap();
    fs::write(dir.path().join("q/Bad.java"), [0xff, 0xfe, 0x00, 0xc3]).unwrap();
    let (task, _, events) = compile_with(
        &[("A.java", "class A { q.Bad bad; }\n")],
        CheckerOptions::default(),
        vec![ClasspathEntry::directory("broken", dir.path())],
    );
    assert_eq!(task.attempts(), 1);
    assert_eq!(events.len(), 1);
    let failures = with_code(task.diagnostics(), codes::COMPLETION_FAILURE);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].args[0], "q.Bad");
}

#[test]
fn test_doc_references() {
    let source = "/** See {@link String} and {@link Missing}. */\nclass A {}\n";
    let options = CheckerOptions::default().with_doclint(DocLint::Reference);
    let (task, _, _) = compile_with(&[("A.java", source)], options, Vec::new());
    let missing = with_code(task.diagnostics(), codes::DOC_REF_NOT_FOUND);
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].args, vec!["Missing".to_string()]);

    // Without doclint nothing is reported, but a focal point inside the
    // comment resolves its references.
    let (mut task, units, _) = compile_with(&[("A.java", source)], CheckerOptions::default(), Vec::new());
    assert!(task.diagnostics().is_empty());
    let link = source.find("String").unwrap() as u32;
    assert!(task.attrib_doc_comment_at(units[0], link).unwrap());
    let string = task.ctx.table.load_class("java.lang.String").unwrap();
    assert_eq!(task.ctx.doc_symbol(units[0], link), string);
}
