use std::sync::Arc;

use jbridge_binder::{FileManager, SymbolTable};
use jbridge_checker::{CheckerOptions, CompileTask};
use jbridge_common::{LineMap, NameTable, Severity};
use jbridge_dom::{Binding, BindingError, BindingKind, ProblemFactory, ProblemId, Session};
use rustc_hash::FxHashMap;

const SOURCE: &str = "package p;\n\
import java.util.List;\n\
public class A<T> {\n\
  private int count;\n\
  List<String> names;\n\
  public A(int c) { count = c; }\n\
  int size(String s, int[] xs) { int local = 1; return local + s.length(); }\n\
  @Deprecated void old() {}\n\
}\n";

fn session_for(sources: &[(&str, &str)]) -> Arc<Session> {
    let table = SymbolTable::new(NameTable::shared(), FileManager::new(Vec::new()));
    let mut task = CompileTask::new(table, CheckerOptions::default());
    let mut units = FxHashMap::default();
    for (name, text) in sources {
        let name: Arc<str> = Arc::from(*name);
        let (unit, _) = task.parse(name.clone(), Arc::from(*text));
        units.insert(name, unit);
    }
    task.analyze(&mut |_, _| {}).unwrap();
    Session::new(task.into_context(), units)
}

fn find(session: &Session, key: &str) -> Arc<Binding> {
    session
        .find_by_key(key)
        .unwrap()
        .unwrap_or_else(|| panic!("no binding for {key}"))
}

#[test]
fn test_platform_type_by_key() {
    let session = session_for(&[("p/A.java", SOURCE)]);
    let string = find(&session, "Ljava/lang/String;");
    assert_eq!(string.kind(), BindingKind::Type);
    assert_eq!(string.name(), "String");
    let ty = string.as_type().unwrap();
    assert_eq!(ty.qualified_name().unwrap(), "java.lang.String");
    assert!(!ty.is_from_source().unwrap());
    assert_eq!(
        ty.superclass().unwrap().unwrap().key(),
        "Ljava/lang/Object;"
    );

    let again = find(&session, "Ljava/lang/String;");
    assert!(Arc::ptr_eq(&string, &again));
}

#[test]
fn test_source_type_members() {
    let session = session_for(&[("p/A.java", SOURCE)]);
    let a = find(&session, "Lp/A;");
    let ty = a.as_type().unwrap();
    assert!(ty.is_from_source().unwrap());
    assert!(ty.is_class().unwrap());
    assert_eq!(ty.type_parameters().unwrap().len(), 1);
    assert_eq!(ty.package().unwrap().unwrap().name(), "p");

    let fields: Vec<String> = ty
        .declared_fields()
        .unwrap()
        .iter()
        .map(|f| f.name().to_string())
        .collect();
    assert_eq!(fields, vec!["count", "names"]);

    let methods = ty.declared_methods().unwrap();
    assert!(
        methods
            .iter()
            .any(|m| m.as_method().is_some_and(|m| m.is_constructor()))
    );
    let old = methods.iter().find(|m| m.name() == "old").unwrap();
    assert!(old.is_deprecated().unwrap());
}

#[test]
fn test_member_keys_resolve_to_the_same_binding() {
    let session = session_for(&[("p/A.java", SOURCE)]);

    let size = find(&session, "Lp/A;.size(Ljava/lang/String;[I)I");
    let method = size.as_method().unwrap();
    assert!(!method.is_constructor());
    let params: Vec<String> = method
        .parameter_types()
        .unwrap()
        .iter()
        .map(|p| p.name().to_string())
        .collect();
    assert_eq!(params, vec!["String", "int[]"]);
    assert_eq!(method.return_type().unwrap().key(), "I");

    let ctor = find(&session, "Lp/A;.(I)V");
    assert!(ctor.as_method().unwrap().is_constructor());

    let count = find(&session, "Lp/A;.count)I");
    let field = count.as_variable().unwrap();
    assert!(field.is_field());
    assert_eq!(field.ty().unwrap().key(), "I");
    assert_eq!(count.key(), "Lp/A;.count)I");

    let local = find(&session, "Lp/A;.size(Ljava/lang/String;[I)I#local#0");
    let var = local.as_variable().unwrap();
    assert!(!var.is_field());
    assert_eq!(
        var.declaring_method().unwrap().unwrap().key(),
        size.key()
    );
}

#[test]
fn test_structural_type_keys() {
    let session = session_for(&[("p/A.java", SOURCE)]);

    let ints = find(&session, "[I");
    let array = ints.as_type().unwrap();
    assert!(array.is_array());
    assert_eq!(array.dimensions(), 1);
    assert_eq!(array.element_type().unwrap().unwrap().name(), "int");

    let list = find(&session, "Ljava/util/List<Ljava/lang/String;>;");
    let ty = list.as_type().unwrap();
    assert!(ty.is_parameterized());
    assert!(ty.is_interface().unwrap());
    assert_eq!(list.name(), "List<String>");
    let args = ty.type_arguments().unwrap();
    assert_eq!(args.len(), 1);
    assert_eq!(args[0].key(), "Ljava/lang/String;");
    assert_eq!(ty.erasure().unwrap().unwrap().key(), "Ljava/util/List;");

    let package = find(&session, "p");
    assert_eq!(package.kind(), BindingKind::Package);
    assert_eq!(package.key(), "p");
}

#[test]
fn test_unknown_and_malformed_keys() {
    let session = session_for(&[("p/A.java", SOURCE)]);
    assert!(session.find_by_key("Lp/Missing;").unwrap().is_none());
    assert!(session.find_by_key("Lp/A;.nothing()V").unwrap().is_none());
    assert!(matches!(
        session.find_by_key("Lp/A;.m(I"),
        Err(BindingError::Key(_))
    ));
}

#[test]
fn test_well_known_types() {
    let session = session_for(&[("p/A.java", SOURCE)]);
    assert_eq!(session.well_known_type("int").unwrap().unwrap().key(), "I");
    assert_eq!(
        session.well_known_type("java.lang.Object").unwrap().unwrap().key(),
        "Ljava/lang/Object;"
    );
    assert!(session.well_known_type("p.A").unwrap().is_none());
}

#[test]
fn test_destroyed_session_fails_queries() {
    let session = session_for(&[("p/A.java", SOURCE)]);
    let a = find(&session, "Lp/A;");
    session.destroy();
    assert!(session.is_destroyed());
    assert!(matches!(
        a.as_type().unwrap().superclass(),
        Err(BindingError::SessionDestroyed)
    ));
    assert!(matches!(
        session.find_by_key("Lp/A;"),
        Err(BindingError::SessionDestroyed)
    ));
    // Identity survives the session.
    assert_eq!(a.key(), "Lp/A;");
}

#[test]
fn test_dropped_session_fails_queries() {
    let a = {
        let session = session_for(&[("p/A.java", SOURCE)]);
        find(&session, "Lp/A;")
    };
    assert!(matches!(
        a.as_type().unwrap().interfaces(),
        Err(BindingError::SessionDestroyed)
    ));
}

#[test]
fn test_type_variables_keep_their_declaring_class() {
    let sources = [
        ("p/A.java", "package p;\nclass A<T> { T a; }\n"),
        ("p/B.java", "package p;\nclass B<T> { T b; }\n"),
    ];
    let session = session_for(&sources);
    let ta = find(&session, "Lp/A;").as_type().unwrap().type_parameters().unwrap()[0].clone();
    let tb = find(&session, "Lp/B;").as_type().unwrap().type_parameters().unwrap()[0].clone();
    assert_eq!(ta.key(), "Lp/A;:TT;");
    assert_eq!(tb.key(), "Lp/B;:TT;");
    assert!(!Arc::ptr_eq(&ta, &tb));
    assert!(Arc::ptr_eq(&find(&session, "Lp/A;:TT;"), &ta));

    let fresh = session_for(&sources);
    let again = find(&fresh, "Lp/B;:TT;");
    assert_eq!(again.key(), tb.key());
    assert_eq!(again.name(), "T");
}

#[test]
fn test_problem_serializes_for_reporting() {
    let source = "import java.util.List;\nclass A {}\n";
    let line_map = LineMap::build(source);
    let factory = ProblemFactory {
        source_file: Arc::from("A.java"),
        source,
        line_map: &line_map,
    };
    let problem = factory.synthesized(
        ProblemId::UnusedImport,
        Severity::Warning,
        vec!["java.util.List".to_string()],
        7,
        21,
    );
    let json = serde_json::to_value(&problem).unwrap();
    assert_eq!(json["id"], "UnusedImport");
    assert_eq!(json["severity"], "warning");
    assert_eq!(json["source_file"], "A.java");
    assert_eq!(json["start"], 7);
    assert_eq!(json["end"], 20);
    assert_eq!(json["line"], 1);
    assert_eq!(json["args"][0], "java.util.List");
}
