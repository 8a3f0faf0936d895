//! CLI command handling module
//!
//! Handles all CLI subcommands and argument parsing.

mod backtrace;
mod commands;
mod logging;
mod version;

pub use backtrace::{
    BacktraceArgs, OutputFormat, handle_backtrace, handle_hits, handle_ping, render_hits,
};
pub use commands::{ConfigSubcommand, handle_config_command};
pub use logging::init_logging;
pub use version::display_version;
