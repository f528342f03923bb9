use std::sync::Arc;

use jbridge_common::NameTable;
use jbridge_common::diagnostics::codes;
use jbridge_parser::{ClassKind, NodeData, NodeFlags, NodeIndex, ParseOptions, ParsedUnit, parse_unit};

fn parse(source: &str) -> ParsedUnit {
    parse_unit(Arc::from(source), NameTable::shared(), ParseOptions::default())
}

fn types(unit: &ParsedUnit) -> Vec<NodeIndex> {
    match unit.arena.data(unit.root) {
        Some(NodeData::CompilationUnit { types, .. }) => types.clone(),
        other => panic!("expected compilation unit, got {other:?}"),
    }
}

fn members(unit: &ParsedUnit, class: NodeIndex) -> Vec<NodeIndex> {
    match unit.arena.data(class) {
        Some(NodeData::ClassDecl { members, .. }) => members.clone(),
        other => panic!("expected class, got {other:?}"),
    }
}

fn method_body(unit: &ParsedUnit, method: NodeIndex) -> Vec<NodeIndex> {
    let Some(NodeData::MethodDecl { body, .. }) = unit.arena.data(method) else {
        panic!("expected method");
    };
    match unit.arena.data(*body) {
        Some(NodeData::Block { statements, .. }) => statements.clone(),
        other => panic!("expected block, got {other:?}"),
    }
}

#[test]
fn test_parse_package_imports_and_class() {
    let unit = parse(
        "package p.q;\nimport java.util.List;\nimport static java.lang.Math.*;\npublic class A<T extends Comparable<T>> extends B implements C, D {}\n",
    );
    assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
    let Some(NodeData::CompilationUnit {
        package, imports, ..
    }) = unit.arena.data(unit.root)
    else {
        panic!("no unit");
    };
    assert!(package.is_some());
    assert_eq!(imports.len(), 2);
    assert!(matches!(
        unit.arena.data(imports[1]),
        Some(NodeData::Import {
            is_static: true,
            on_demand: true,
            ..
        })
    ));
    let class = types(&unit)[0];
    let Some(NodeData::ClassDecl {
        kind,
        type_params,
        extends,
        implements,
        ..
    }) = unit.arena.data(class)
    else {
        panic!("no class");
    };
    assert_eq!(*kind, ClassKind::Class);
    assert_eq!(type_params.len(), 1);
    assert!(extends.is_some());
    assert_eq!(implements.len(), 2);
}

#[test]
fn test_missing_semicolon_reports_once() {
    let unit = parse("class A { void m() { foo } }");
    assert_eq!(unit.diagnostics.len(), 1, "{:?}", unit.diagnostics);
    assert_eq!(unit.diagnostics[0].code, codes::EXPECTED);
    assert_eq!(unit.diagnostics[0].args, vec!["';'".to_string()]);

    let class = types(&unit)[0];
    let method = members(&unit, class)[0];
    let statements = method_body(&unit, method);
    assert_eq!(statements.len(), 1);
    let stmt = unit.arena.get(statements[0]).unwrap();
    assert!(stmt.flags.contains(NodeFlags::RECOVERED));
    assert!(matches!(stmt.data, NodeData::ExprStatement { .. }));
}

#[test]
fn test_not_a_statement() {
    let unit = parse("class A { void m() { foo; } }");
    assert_eq!(unit.diagnostics.len(), 1);
    assert_eq!(unit.diagnostics[0].code, codes::NOT_STMT);
}

#[test]
fn test_field_fragments_share_type() {
    let unit = parse("class A { private int a, b = 1; }");
    let class = types(&unit)[0];
    let fields = members(&unit, class);
    assert_eq!(fields.len(), 2);
    let first = unit.arena.get(fields[0]).unwrap();
    let second = unit.arena.get(fields[1]).unwrap();
    assert!(!first.flags.contains(NodeFlags::FOLLOWS_FRAGMENT));
    assert!(second.flags.contains(NodeFlags::FOLLOWS_FRAGMENT));
    let (NodeData::VarDecl { var_type: t1, .. }, NodeData::VarDecl { var_type: t2, init, .. }) =
        (&first.data, &second.data)
    else {
        panic!("expected fields");
    };
    assert_eq!(t1, t2);
    assert!(init.is_some());
    // The second fragment starts at its name, inside the declaration.
    assert!(second.pos > first.pos);
    assert_eq!(unit.node_text(fields[1]), "b = 1;");
}

#[test]
fn test_statements_and_expressions() {
    let source = r#"
class A {
    int f(int[] xs, String... rest) throws Exception {
        int total = 0;
        for (int i = 0; i < xs.length; i++) { total += xs[i]; }
        for (var x : xs) total = total + x;
        label: while (total > 10) { if (total % 2 == 0) break label; else continue; }
        do { total--; } while (total > 0);
        try (var r = open()) { r.run(); } catch (IOException | RuntimeException e) { throw e; } finally { total = -1; }
        switch (total) { case 1, 2: return 1; case 3 -> total = 3; default: break; }
        Object o = (Object) "s";
        boolean b = o instanceof String s && s.isEmpty();
        Runnable run = () -> System.out.println(this.toString());
        java.util.function.Function<String, Integer> len = String::length;
        int[][] grid = new int[3][];
        int[] init = {1, 2, 3};
        Class<?> k = String[].class;
        synchronized (this) { assert total >= 0 : "negative"; }
        return b ? total : new int[] {1}.length;
    }
}
"#;
    let unit = parse(source);
    assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
    let class = types(&unit)[0];
    let method = members(&unit, class)[0];
    let statements = method_body(&unit, method);
    let kinds: Vec<_> = statements
        .iter()
        .map(|s| unit.arena.data(*s).unwrap().kind_name())
        .collect();
    assert_eq!(
        kinds,
        vec![
            "VarDecl", "For", "ForEach", "Labeled", "DoWhile", "Try", "Switch", "VarDecl",
            "VarDecl", "VarDecl", "VarDecl", "VarDecl", "VarDecl", "VarDecl", "Synchronized",
            "Return",
        ]
    );
}

#[test]
fn test_generic_closing_split() {
    let unit = parse("class A { java.util.Map<String, java.util.List<String>> m; }");
    assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
}

#[test]
fn test_enum_interface_annotation_record() {
    let source = r#"
enum Color { RED, GREEN("g") { void f() {} }; Color() {} Color(String s) {} }
interface I extends J, K { void m(); default int n() { return 1; } }
@interface Ann { String value() default "x"; int[] nums() default {1, 2}; }
record Point(int x, int y) implements I {}
"#;
    let unit = parse(source);
    assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
    let kinds: Vec<_> = types(&unit)
        .iter()
        .map(|t| match unit.arena.data(*t) {
            Some(NodeData::ClassDecl { kind, .. }) => *kind,
            _ => panic!("expected type"),
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            ClassKind::Enum,
            ClassKind::Interface,
            ClassKind::Annotation,
            ClassKind::Record
        ]
    );
}

#[test]
fn test_module_declaration() {
    let unit = parse(
        "module com.example.app { requires transitive java.sql; exports com.example.api to a, b; uses com.example.Svc; provides com.example.Svc with com.example.Impl; }",
    );
    assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
    let Some(NodeData::CompilationUnit { module, .. }) = unit.arena.data(unit.root) else {
        panic!();
    };
    let Some(NodeData::ModuleDecl { directives, .. }) = unit.arena.data(*module) else {
        panic!("no module");
    };
    assert_eq!(directives.len(), 4);
}

#[test]
fn test_doc_comments_attached_to_declarations() {
    let source = "/** Type doc */\nclass A {\n  /** field doc */ int x;\n  /** method doc */ void m() {}\n}";
    let unit = parse(source);
    let class = types(&unit)[0];
    let doc = unit.arena.doc_comment(class).unwrap();
    assert_eq!(doc.get_text(source), "/** Type doc */");
    let m = members(&unit, class);
    assert_eq!(
        unit.arena.doc_comment(m[1]).unwrap().get_text(source),
        "/** method doc */"
    );
    assert_eq!(unit.arena.doc_comments().len(), 3);
}

#[test]
fn test_ignore_bodies() {
    let options = ParseOptions {
        ignore_bodies: true,
    };
    let unit = parse_unit(
        Arc::from("class A { int m() { return undefined stuff here; } }"),
        NameTable::shared(),
        options,
    );
    assert!(unit.diagnostics.is_empty());
    let class = types(&unit)[0];
    let method = members(&unit, class)[0];
    let Some(NodeData::MethodDecl { body, .. }) = unit.arena.data(method) else {
        panic!();
    };
    assert!(unit.arena.flags(*body).contains(NodeFlags::BODY_SKIPPED));
    assert!(method_body(&unit, method).is_empty());
}

#[test]
fn test_parent_links_and_containment() {
    let unit = parse("class A { void m() { int x = 1 + 2; m(); } }");
    for idx in unit.arena.preorder(unit.root) {
        let node = unit.arena.get(idx).unwrap();
        if node.parent.is_none() {
            assert_eq!(idx, unit.root);
            continue;
        }
        let parent = unit.arena.get(node.parent).unwrap();
        assert!(parent.pos <= node.pos && node.end <= parent.end);
    }
}

#[test]
fn test_unclosed_class_is_recovered() {
    let unit = parse("class A { void m() {}");
    assert!(!unit.diagnostics.is_empty());
    let class = types(&unit)[0];
    assert!(unit.arena.get(class).unwrap().is_recovered());
}

#[test]
fn test_garbage_at_top_level() {
    let unit = parse("int x; class A {}");
    assert_eq!(unit.diagnostics[0].code, codes::TYPE_DECL_EXPECTED);
    assert_eq!(types(&unit).len(), 1);
}
