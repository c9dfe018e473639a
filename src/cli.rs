//! CLI domain: parse, route, output, and presentation only.
//! No protocol logic; the route table drives the simulated tree.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, OutputFormat};
pub use presentation::{format_assignments, format_records_json, format_records_text};
pub use route::RunContext;
