use colored::Colorize;
use jbridge_common::Severity;
use jbridge_core::SourceId;
use jbridge_dom::{CompilationUnit, Problem};
use serde::Serialize;

/// What gets printed for one converted unit.
#[derive(Clone, Debug, Serialize)]
pub struct UnitReport {
    pub source: String,
    pub problems: Vec<Problem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ast: Option<String>,
}

impl UnitReport {
    pub fn new(id: &SourceId, unit: &CompilationUnit, dump_ast: bool) -> Self {
        UnitReport {
            source: id.to_string(),
            problems: unit.problems.clone(),
            ast: dump_ast.then(|| unit.ast.outline(unit.root)),
        }
    }
}

/// Printable answer for one requested key.
#[derive(Clone, Debug, Serialize)]
pub struct KeyAnswer {
    pub key: String,
    pub kind: Option<String>,
    pub name: Option<String>,
}

pub struct Reporter {
    color: bool,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter { color }
    }

    pub fn render_problem(&self, problem: &Problem) -> String {
        let location = format!("{}:{}:{}", problem.source_file, problem.line, problem.column);
        format!(
            "{} - {} {}: {}",
            location,
            self.severity(problem.severity),
            self.code(problem.id.value()),
            problem.message
        )
    }

    pub fn render_units(&self, units: &[UnitReport]) -> String {
        let mut out = String::new();
        for unit in units {
            if let Some(ast) = &unit.ast {
                out.push_str(&self.header(&unit.source));
                out.push('\n');
                out.push_str(ast);
                if !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            for problem in &unit.problems {
                out.push_str(&self.render_problem(problem));
                out.push('\n');
            }
        }
        out
    }

    pub fn render_keys(&self, answers: &[KeyAnswer]) -> String {
        let mut out = String::new();
        for answer in answers {
            match (&answer.kind, &answer.name) {
                (Some(kind), Some(name)) => out.push_str(&format!("{} -> {} {}\n", answer.key, kind, name)),
                _ => {
                    let missing = if self.color { "<none>".dimmed().to_string() } else { "<none>".to_string() };
                    out.push_str(&format!("{} -> {}\n", answer.key, missing));
                }
            }
        }
        out
    }

    /// `N errors, M warnings`.
    pub fn summary(&self, units: &[UnitReport]) -> String {
        let count = |severity: Severity| -> usize {
            units
                .iter()
                .map(|u| u.problems.iter().filter(|p| p.severity == severity).count())
                .sum()
        };
        let errors = count(Severity::Error);
        let text = format!("{} errors, {} warnings", errors, count(Severity::Warning));
        if self.color && errors > 0 {
            text.red().bold().to_string()
        } else {
            text
        }
    }

    fn header(&self, id: &str) -> String {
        let text = format!("== {id}");
        if self.color { text.bold().to_string() } else { text }
    }

    fn severity(&self, severity: Severity) -> String {
        let label = match severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Ignore => "ignore",
        };
        if !self.color {
            return label.to_string();
        }
        match severity {
            Severity::Error => label.red().bold().to_string(),
            Severity::Warning => label.yellow().bold().to_string(),
            Severity::Info | Severity::Ignore => label.cyan().bold().to_string(),
        }
    }

    fn code(&self, value: u32) -> String {
        let label = format!("J{value}");
        if self.color { label.bright_blue().to_string() } else { label }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    units: &'a [UnitReport],
    #[serde(skip_serializing_if = "no_keys")]
    keys: &'a [KeyAnswer],
}

fn no_keys(keys: &&[KeyAnswer]) -> bool {
    keys.is_empty()
}

/// The whole run as one JSON document.
pub fn render_json(units: &[UnitReport], keys: &[KeyAnswer]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport { units, keys })
}

/// Whether any reported problem is an error.
pub fn has_errors(units: &[UnitReport]) -> bool {
    units.iter().any(|u| u.problems.iter().any(Problem::is_error))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use jbridge_dom::{ProblemFactory, ProblemId};

    use super::*;

    #[test]
    fn test_plain_problem_line() {
        let source = "import p.Q;\nclass A {}\n";
        let unit = CompilationUnit::new(Arc::from("A.java"), Arc::from(source));
        let factory = ProblemFactory {
            source_file: unit.source_id.clone(),
            source: &unit.source,
            line_map: &unit.line_map,
        };
        let problem = factory.synthesized(ProblemId::UnusedImport, Severity::Warning, vec!["p.Q".into()], 7, 10);
        let line = Reporter::new(false).render_problem(&problem);
        assert_eq!(
            line,
            format!("A.java:1:8 - warning J{}: The import p.Q is never used", ProblemId::UnusedImport.value())
        );
    }

    #[test]
    fn test_missing_key_answer() {
        let answers = [KeyAnswer {
            key: "Lp/Missing;".into(),
            kind: None,
            name: None,
        }];
        assert_eq!(Reporter::new(false).render_keys(&answers), "Lp/Missing; -> <none>\n");
    }
}
