use std::fs;
use std::sync::Arc;

use jbridge_binder::{
    ClasspathEntry, FileManager, SymbolKind, SymbolTable, Type, UnitId, UnitOrigin, symbol_flags,
};
use jbridge_common::NameTable;
use jbridge_common::diagnostics::codes;
use jbridge_parser::{ParseOptions, parse_unit};

fn table_with(sources: &[(&str, &str)], classpath: Vec<ClasspathEntry>) -> (SymbolTable, Vec<UnitId>) {
    let names = NameTable::shared();
    let mut table = SymbolTable::new(names.clone(), FileManager::new(classpath));
    let mut units = Vec::new();
    for (name, text) in sources {
        let tree = parse_unit(Arc::from(*text), names.clone(), ParseOptions::default());
        units.push(table.add_unit(Arc::from(*name), UnitOrigin::Source, tree));
    }
    for &unit in &units {
        table.enter_unit(unit);
    }
    (table, units)
}

fn class(table: &mut SymbolTable, name: &str) -> jbridge_binder::SymbolId {
    table
        .load_class(name)
        .unwrap()
        .unwrap_or_else(|| panic!("class {name} not found"))
}

#[test]
fn test_enter_and_complete_source_class() {
    let (mut table, _) = table_with(
        &[(
            "p/A.java",
            "package p;\npublic class A {\n  int count;\n  String name;\n  void run() {}\n  int size(int a) { return a; }\n  static class Inner {}\n}\n",
        )],
        Vec::new(),
    );
    let a = class(&mut table, "p.A");
    table.complete(a).unwrap();
    let info = table.symbol(a).unwrap().class_info().unwrap().clone();
    // count, name, run, size, Inner and the default constructor.
    assert_eq!(info.members.len(), 6);
    assert_eq!(info.qualified_name.as_ref(), "p.A");
    let object = class(&mut table, "java.lang.Object");
    assert_eq!(info.superclass, Some(Type::class(object)));

    let name_atom = table.intern("name");
    let field = table.find_field(a, name_atom).unwrap().unwrap();
    let string = class(&mut table, "java.lang.String");
    assert_eq!(table.var_type(field), Type::class(string));

    let to_string = table.intern("toString");
    let inherited = table.find_methods(a, to_string).unwrap();
    assert_eq!(inherited.len(), 1);
    assert_eq!(table.symbol(inherited[0]).unwrap().owner, object);

    let ctors = table.constructors(a).unwrap();
    assert_eq!(ctors.len(), 1);
    assert!(table.symbol(ctors[0]).unwrap().has_flags(symbol_flags::SYNTHETIC));

    let inner = class(&mut table, "p.A.Inner");
    let inner_info = table.symbol(inner).unwrap().class_info().unwrap();
    assert_eq!(inner_info.flat_name.as_ref(), "p.A$Inner");
    assert!(!table.symbol(a).unwrap().has_flags(symbol_flags::BINARY));
}

#[test]
fn test_platform_classes_are_binary() {
    let (mut table, _) = table_with(&[], Vec::new());
    let list = class(&mut table, "java.util.ArrayList");
    let symbol = table.symbol(list).unwrap();
    assert!(symbol.has_flags(symbol_flags::BINARY));
    assert_eq!(symbol.kind, SymbolKind::Class);
    assert!(table.load_class("java.util.Nope").unwrap().is_none());
    assert!(!table.has_pending_diagnostics());
}

#[test]
fn test_as_super_substitutes_type_arguments() {
    let (mut table, _) = table_with(&[], Vec::new());
    let list = class(&mut table, "java.util.ArrayList");
    let string = class(&mut table, "java.lang.String");
    let collection = class(&mut table, "java.util.Collection");
    let ty = Type::Class {
        sym: list,
        args: vec![Type::class(string)],
    };
    let seen = table.as_super(&ty, collection).unwrap().unwrap();
    assert_eq!(
        seen,
        Type::Class {
            sym: collection,
            args: vec![Type::class(string)],
        }
    );
    assert!(table.is_subclass(list, collection).unwrap());
    assert!(!table.is_subclass(string, collection).unwrap());
}

#[test]
fn test_import_diagnostics() {
    let (mut table, units) = table_with(
        &[(
            "p/A.java",
            "package p;\nimport foo.Bar;\nimport java.util.Nope;\nimport java.util.List;\nclass A {}\n",
        )],
        Vec::new(),
    );
    table.resolve_imports(units[0]).unwrap();
    let diags = table.take_diagnostics();
    let found: Vec<_> = diags.iter().map(|d| d.code).collect();
    assert_eq!(found, vec![codes::DOESNT_EXIST, codes::CANT_RESOLVE_LOCATION]);
    assert_eq!(diags[0].args, vec!["foo".to_string()]);
    assert_eq!(diags[1].args[1], "Nope");

    let imports = &table.unit(units[0]).unwrap().imports;
    assert!(imports[0].target.is_none());
    assert!(imports[2].target.is_some());
}

#[test]
fn test_unresolved_type_in_signature() {
    let (mut table, _) = table_with(
        &[("A.java", "class A { Missing field; java.util.List<String> names; }")],
        Vec::new(),
    );
    let a = class(&mut table, "A");
    table.complete(a).unwrap();
    let diags = table.take_diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, codes::CANT_RESOLVE);
    assert_eq!(diags[0].args, vec!["class".to_string(), "Missing".to_string()]);

    let names = table.intern("names");
    let field = table.find_field(a, names).unwrap().unwrap();
    let ty = table.var_type(field);
    assert_eq!(table.type_display(&ty), "List<String>");
}

#[test]
fn test_classpath_directory_and_cross_references() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("lib")).unwrap();
    fs::write(
        dir.path().join("lib/Base.java"),
        "package lib;\npublic class Base { public void greet() {} }\n",
    )
    .unwrap();
    let (mut table, _) = table_with(
        &[("app/Main.java", "package app;\nimport lib.Base;\npublic class Main extends Base {}\n")],
        vec![ClasspathEntry::directory("lib-src", dir.path())],
    );
    let main = class(&mut table, "app.Main");
    table.complete(main).unwrap();
    let base = class(&mut table, "lib.Base");
    assert!(table.symbol(base).unwrap().has_flags(symbol_flags::BINARY));
    assert!(table.is_subclass(main, base).unwrap());
    let greet = table.intern("greet");
    assert_eq!(table.find_methods(main, greet).unwrap().len(), 1);
}

#[test]
fn test_completion_failure_leaves_erroneous_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("q")).unwrap();
    fs::write(dir.path().join("q/Bad.java"), [0xff, 0xfe, 0x00, 0xc3]).unwrap();
    let (mut table, _) = table_with(
        &[("A.java", "class A { q.Bad bad; }")],
        vec![ClasspathEntry::directory("broken", dir.path())],
    );
    let a = class(&mut table, "A");
    let failure = table.complete(a).unwrap_err();
    assert_eq!(failure.class_name, "q.Bad");
    assert!(!table.symbol(a).unwrap().has_flags(symbol_flags::COMPLETED));

    // The retry sees the placeholder and completes.
    table.complete(a).unwrap();
    let bad = table.class_by_flat_name("q.Bad").unwrap();
    assert!(table.symbol(bad).unwrap().is_erroneous());
}

#[test]
fn test_overridden_methods_through_generic_interface() {
    let (mut table, _) = table_with(
        &[(
            "A.java",
            "class A implements Comparable<A> {\n  public int compareTo(A other) { return 0; }\n  public String toString() { return \"\"; }\n  public int compareTo(String s) { return 1; }\n}\n",
        )],
        Vec::new(),
    );
    let a = class(&mut table, "A");
    table.complete(a).unwrap();
    let members = table.symbol(a).unwrap().class_info().unwrap().members.clone();
    let comparable = class(&mut table, "java.lang.Comparable");
    let object = class(&mut table, "java.lang.Object");

    let overrides: Vec<_> = members
        .iter()
        .map(|&m| {
            table
                .overridden_methods(m)
                .unwrap()
                .iter()
                .map(|&o| table.symbol(o).unwrap().owner)
                .collect::<Vec<_>>()
        })
        .collect();
    assert_eq!(overrides[0], vec![comparable]);
    assert_eq!(overrides[1], vec![object]);
    assert!(overrides[2].is_empty());
}

#[test]
fn test_enum_and_record_implicit_members() {
    let (mut table, _) = table_with(
        &[(
            "p/Shapes.java",
            "package p;\nenum Color { RED, GREEN }\nrecord Point(int x, int y) {}\n",
        )],
        Vec::new(),
    );
    let color = class(&mut table, "p.Color");
    let values = table.intern("values");
    let found = table.find_methods(color, values).unwrap();
    assert_eq!(found.len(), 1);
    assert!(table.symbol(found[0]).unwrap().is_static());
    let red = table.intern("RED");
    let constant = table.find_field(color, red).unwrap().unwrap();
    assert!(table.symbol(constant).unwrap().has_flags(symbol_flags::ENUM_CONSTANT));

    let point = class(&mut table, "p.Point");
    let x = table.intern("x");
    let accessor = table.find_methods(point, x).unwrap();
    assert_eq!(accessor.len(), 1);
    let ctors = table.constructors(point).unwrap();
    assert_eq!(ctors.len(), 1);
    assert_eq!(table.param_types(ctors[0]).len(), 2);
}

#[test]
fn test_duplicate_class_reported() {
    let (mut table, _) = table_with(&[("A.java", "class A {}\nclass A {}\n")], Vec::new());
    let diags = table.take_diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, codes::ALREADY_DEFINED);
}

#[test]
fn test_deprecated_member_from_platform() {
    let (mut table, _) = table_with(&[], Vec::new());
    let thread = class(&mut table, "java.lang.Thread");
    let stop = table.intern("stop");
    let found = table.find_methods(thread, stop).unwrap();
    assert!(table.symbol(found[0]).unwrap().has_flags(symbol_flags::DEPRECATED));
}

#[test]
fn test_completing_twice_keeps_member_symbols() {
    let (mut table, _) = table_with(
        &[("p/A.java", "package p;\npublic class A {\n  int count;\n  void run() {}\n}\n")],
        Vec::new(),
    );
    let a = class(&mut table, "p.A");
    table.complete(a).unwrap();
    let run = table.intern("run");
    let first = table.find_methods(a, run).unwrap();
    let members = table.symbol(a).unwrap().class_info().unwrap().members.clone();
    let allocated = table.symbols.len();

    table.complete(a).unwrap();
    table.complete(a).unwrap();
    assert_eq!(table.find_methods(a, run).unwrap(), first);
    assert_eq!(table.symbol(a).unwrap().class_info().unwrap().members, members);
    assert_eq!(table.symbols.len(), allocated);
}
