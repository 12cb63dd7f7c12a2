//! CLI domain: parse, route, scenario, output, and presentation.
//! Commands drive an in-process bridge; no transport is involved.

mod output;
mod parse;
mod presentation;
mod route;
mod scenario;

pub use output::map_error;
pub use parse::{Cli, Commands, OutputFormat};
pub use presentation::{format_config, format_events, format_profiling, format_replayed_tree};
pub use route::RunContext;
pub use scenario::{run_scenario, ReplayReport, Scenario, Step};
