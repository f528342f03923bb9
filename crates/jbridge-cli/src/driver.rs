//! One command-line run: build the request, resolve, collect reports.

use std::sync::Arc;

use anyhow::Result;
use jbridge_core::{BindingRequestor, SourceId, resolve, resolve_with_keys};
use jbridge_dom::{Binding, CompilationUnit};
use tracing::debug;

use crate::args::CliArgs;
use crate::reporter::{KeyAnswer, UnitReport};
use crate::request::build_request;

#[derive(Debug, Default)]
pub struct RunOutput {
    pub units: Vec<UnitReport>,
    pub keys: Vec<KeyAnswer>,
}

struct Collector {
    dump_ast: bool,
    output: RunOutput,
}

impl BindingRequestor for Collector {
    fn accept_ast(&mut self, source: &SourceId, unit: &CompilationUnit) {
        self.output.units.push(UnitReport::new(source, unit, self.dump_ast));
    }

    fn accept_binding(&mut self, key: &str, binding: Option<Arc<Binding>>) {
        self.output.keys.push(KeyAnswer {
            key: key.to_string(),
            kind: binding.as_ref().map(|b| format!("{:?}", b.kind()).to_lowercase()),
            name: binding.as_ref().map(|b| b.name().to_string()),
        });
    }
}

pub fn run(args: &CliArgs) -> Result<RunOutput> {
    let request = build_request(args)?;
    debug!(files = request.units.len(), keys = args.keys.len(), "resolving");
    if args.keys.is_empty() {
        let units = resolve(&request)?;
        let units = units
            .iter()
            .map(|(id, unit)| UnitReport::new(id, unit, args.dump_ast))
            .collect();
        return Ok(RunOutput {
            units,
            keys: Vec::new(),
        });
    }

    let keys: Vec<&str> = args.keys.iter().map(String::as_str).collect();
    let mut collector = Collector {
        dump_ast: args.dump_ast,
        output: RunOutput::default(),
    };
    resolve_with_keys(&request, &keys, &mut collector)?;
    Ok(collector.output)
}
