use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// CLI arguments for the jbridge binary.
#[derive(Parser, Debug)]
#[command(name = "jbridge", version, about = "Resolve Java sources into host syntax trees")]
pub struct CliArgs {
    /// Source files to resolve.
    #[arg(required_unless_present = "keys")]
    pub files: Vec<PathBuf>,

    // ==================== Environment ====================
    /// Directory of sources served as a library classpath entry.
    #[arg(long = "classpath", value_name = "DIR")]
    pub classpath: Vec<PathBuf>,

    /// Access rule on a classpath entry: `<ENTRY>:<+|~|->:<GLOB>`.
    #[arg(long = "access-rule", value_name = "RULE")]
    pub access_rules: Vec<String>,

    /// Compile every file together as one project.
    #[arg(long)]
    pub project: Option<String>,

    /// Configuration map, inline JSON or a path to a JSON file.
    #[arg(long, value_name = "JSON")]
    pub options: Option<String>,

    // ==================== Request ====================
    /// Offset of interest in the first file.
    #[arg(long, value_name = "OFFSET")]
    pub focal: Option<u32>,

    #[arg(long = "resolve-bindings")]
    pub resolve_bindings: bool,

    #[arg(long = "force-diagnostics")]
    pub force_diagnostics: bool,

    #[arg(long = "statements-recovery")]
    pub statements_recovery: bool,

    #[arg(long = "bindings-recovery")]
    pub bindings_recovery: bool,

    #[arg(long = "ignore-method-bodies")]
    pub ignore_method_bodies: bool,

    /// Binding key to resolve and print.
    #[arg(long = "key", value_name = "KEY")]
    pub keys: Vec<String>,

    // ==================== Output ====================
    /// Print the host AST outline of every file.
    #[arg(long = "dump-ast")]
    pub dump_ast: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
