//! Translation of command-line arguments into a resolve request.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use jbridge_binder::{AccessRule, ClasspathEntry, RuleKind};
use jbridge_common::CompilerOptions;
use jbridge_core::{Project, ResolveFlags, ResolveRequest, SourceDescriptor};

use crate::args::CliArgs;

/// Project name used when classpath entries are given without `--project`.
pub const DEFAULT_PROJECT: &str = "default";

pub fn build_request(args: &CliArgs) -> Result<ResolveRequest> {
    let mut request = ResolveRequest::new()
        .with_units(args.files.iter().map(SourceDescriptor::file))
        .with_flags(flags(args));
    if let Some(options) = &args.options {
        request = request.with_options(load_options(options)?);
    }
    if let Some(focal) = args.focal {
        request = request.with_focal_point(focal);
    }
    if args.project.is_some() || !args.classpath.is_empty() {
        request = request.with_project(build_project(args)?);
    }
    Ok(request)
}

pub fn flags(args: &CliArgs) -> ResolveFlags {
    let mut flags = ResolveFlags::empty();
    flags.set(ResolveFlags::RESOLVE_BINDINGS, args.resolve_bindings);
    flags.set(ResolveFlags::FORCE_DIAGNOSTICS, args.force_diagnostics);
    flags.set(ResolveFlags::STATEMENTS_RECOVERY, args.statements_recovery);
    flags.set(ResolveFlags::BINDINGS_RECOVERY, args.bindings_recovery);
    flags.set(ResolveFlags::IGNORE_METHOD_BODIES, args.ignore_method_bodies);
    flags
}

fn build_project(args: &CliArgs) -> Result<Project> {
    let rules = args
        .access_rules
        .iter()
        .map(|spec| parse_access_rule(spec))
        .collect::<Result<Vec<_>>>()?;

    let mut project = Project::new(args.project.as_deref().unwrap_or(DEFAULT_PROJECT));
    for dir in &args.classpath {
        let name = dir.display().to_string();
        let mut entry = ClasspathEntry::directory(name.clone(), dir.clone());
        for (target, rule) in &rules {
            if entry_matches(target, &name, dir) {
                entry = entry
                    .with_rule(rule.clone())
                    .with_context(|| format!("invalid access rule on {name}"))?;
            }
        }
        project = project.with_entry(entry);
    }
    for (target, _) in &rules {
        if !args.classpath.iter().any(|dir| entry_matches(target, &dir.display().to_string(), dir)) {
            bail!("access rule names unknown classpath entry '{target}'");
        }
    }
    Ok(project)
}

fn entry_matches(target: &str, name: &str, dir: &Path) -> bool {
    target == name || Path::new(target) == dir
}

/// `<ENTRY>:<+|~|->:<GLOB>`. The entry may itself contain colons.
pub fn parse_access_rule(spec: &str) -> Result<(String, AccessRule)> {
    let mut parts = spec.rsplitn(3, ':');
    let (Some(glob), Some(sigil), Some(entry)) = (parts.next(), parts.next(), parts.next()) else {
        bail!("access rule '{spec}' is not <ENTRY>:<+|~|->:<GLOB>");
    };
    let Some(kind) = RuleKind::from_sigil(sigil) else {
        bail!("access rule '{spec}' has unknown kind '{sigil}'");
    };
    if entry.is_empty() || glob.is_empty() {
        bail!("access rule '{spec}' is not <ENTRY>:<+|~|->:<GLOB>");
    }
    Ok((entry.to_string(), AccessRule::new(glob, kind)))
}

/// Inline JSON when the value starts with `{`, a JSON file otherwise.
pub fn load_options(value: &str) -> Result<CompilerOptions> {
    let text = if value.trim_start().starts_with('{') {
        value.to_string()
    } else {
        fs::read_to_string(value).with_context(|| format!("failed to read options file {value}"))?
    };
    CompilerOptions::from_json(&text).context("invalid options map")
}
