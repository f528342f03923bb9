use std::fs;

use clap::Parser;
use jbridge_binder::RuleKind;
use jbridge_cli::args::{CliArgs, OutputFormat};
use jbridge_cli::driver::run;
use jbridge_cli::reporter::{has_errors, render_json};
use jbridge_cli::request::{DEFAULT_PROJECT, build_request, load_options, parse_access_rule};
use jbridge_common::Severity;
use jbridge_common::options::UNUSED_IMPORT;
use jbridge_core::ResolveFlags;
use jbridge_dom::ProblemId;

fn args(argv: &[&str]) -> CliArgs {
    CliArgs::try_parse_from(std::iter::once("jbridge").chain(argv.iter().copied())).unwrap()
}

#[test]
fn test_access_rule_syntax() {
    let (entry, rule) = parse_access_rule("lib:-:p/**").unwrap();
    assert_eq!(entry, "lib");
    assert_eq!(rule.kind, RuleKind::Forbidden);
    assert_eq!(rule.pattern, "p/**");

    let (entry, _) = parse_access_rule("C:/libs/x:~:q/*").unwrap();
    assert_eq!(entry, "C:/libs/x");

    assert!(parse_access_rule("lib:?:p/*").is_err());
    assert!(parse_access_rule("p/*").is_err());
}

#[test]
fn test_flags_and_implicit_project() {
    let dir = tempfile::tempdir().unwrap();
    let lib = dir.path().display().to_string();
    let cli = args(&[
        "A.java",
        "--force-diagnostics",
        "--ignore-method-bodies",
        "--classpath",
        &lib,
        "--access-rule",
        &format!("{lib}:~:p/*"),
        "--focal",
        "12",
    ]);
    let request = build_request(&cli).unwrap();
    assert!(request.has(ResolveFlags::FORCE_DIAGNOSTICS | ResolveFlags::IGNORE_METHOD_BODIES));
    assert!(!request.has(ResolveFlags::RESOLVE_BINDINGS));
    assert_eq!(request.focal_point, Some(12));
    let project = request.project.unwrap();
    assert_eq!(project.name(), DEFAULT_PROJECT);
    let restriction = project.classpath()[0].restriction_for("p/Type").unwrap();
    assert_eq!(restriction.kind, RuleKind::Discouraged);
}

#[test]
fn test_rule_for_unknown_entry_is_rejected() {
    let cli = args(&["A.java", "--project", "app", "--access-rule", "nowhere:-:p/*"]);
    assert!(build_request(&cli).is_err());
}

#[test]
fn test_inline_and_file_options() {
    let inline = load_options(r#"{"compiler.problem.unusedImport": "error"}"#).unwrap();
    assert_eq!(inline.severity(UNUSED_IMPORT), Severity::Error);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("options.json");
    fs::write(&path, r#"{"compiler.problem.unusedImport": "ignore"}"#).unwrap();
    let from_file = load_options(&path.display().to_string()).unwrap();
    assert!(from_file.is_ignored(UNUSED_IMPORT));

    assert!(load_options("{not json").is_err());
}

#[test]
fn test_run_reports_problems_and_ast() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("A.java");
    fs::write(&path, "import java.util.Map;\nclass A { void m() { foo } }\n").unwrap();
    let file = path.display().to_string();

    let cli = args(&[&file, "--force-diagnostics", "--dump-ast", "--format", "json"]);
    assert_eq!(cli.format, OutputFormat::Json);
    let output = run(&cli).unwrap();
    assert_eq!(output.units.len(), 1);
    let unit = &output.units[0];
    assert!(unit.ast.as_deref().is_some_and(|ast| ast.contains("CompilationUnit")));
    assert!(unit.problems.iter().any(|p| p.id == ProblemId::UnusedImport));
    assert!(has_errors(&output.units));

    let json: serde_json::Value = serde_json::from_str(&render_json(&output.units, &output.keys).unwrap()).unwrap();
    assert_eq!(json["units"][0]["source"], serde_json::Value::String(unit.source.clone()));
    assert!(json.get("keys").is_none());
}

#[test]
fn test_keys_without_files() {
    let cli = args(&["--key", "Ljava/lang/String;", "--key", "Lnope/Nothing;"]);
    let output = run(&cli).unwrap();
    assert!(output.units.is_empty());
    assert_eq!(output.keys.len(), 2);
    assert_eq!(output.keys[0].kind.as_deref(), Some("type"));
    assert_eq!(output.keys[0].name.as_deref(), Some("String"));
    assert!(output.keys[1].kind.is_none());
}
