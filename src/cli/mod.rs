//! CLI layer for gpt5-mcp.
//!
//! Parses arguments with clap and dispatches to the MCP transports or to
//! one-shot `query` and `test-connection` commands.

pub mod commands;
pub mod parser;

pub use commands::{CommandOutput, execute};
pub use parser::{Cli, Commands, DEFAULT_CONFIG_PATH};
