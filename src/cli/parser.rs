//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default location of the JSON defaults file.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.json";

/// GPT-5 MCP server.
///
/// Exposes OpenAI GPT-5 to MCP clients through `query` and
/// `test_connection` tools.
#[derive(Parser, Debug)]
#[command(name = "gpt5-mcp")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the JSON defaults file.
    #[arg(short, long, env = "GPT5_MCP_CONFIG", default_value = DEFAULT_CONFIG_PATH, global = true)]
    pub config: PathBuf,

    /// The subcommand to execute (default: stdio).
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Start MCP server with stdio transport.
    ///
    /// Reads JSON-RPC messages from stdin, writes responses to stdout.
    #[command(after_help = r#"Examples:
  gpt5-mcp                                 # Same as `gpt5-mcp stdio`
  OPENAI_API_KEY=sk-... gpt5-mcp stdio     # With API key
"#)]
    Stdio,

    /// Start MCP server with streamable HTTP transport.
    ///
    /// Serves MCP at `/mcp` on the given address.
    #[cfg(feature = "http")]
    #[command(after_help = r#"Examples:
  gpt5-mcp http                            # Listen on 127.0.0.1:3000
  gpt5-mcp http --host 0.0.0.0 --port 8080
"#)]
    Http {
        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to.
        #[arg(long, default_value = "3000")]
        port: u16,
    },

    /// Check connectivity to the OpenAI API and exit.
    TestConnection,

    /// Send one prompt to GPT-5 and print the formatted response.
    #[command(after_help = r#"Examples:
  gpt5-mcp query "Explain Rust lifetimes"
  gpt5-mcp query "Summarize" --context "$(cat notes.md)" --model gpt-5-mini
  gpt5-mcp query "Write a haiku" --verbosity low --reasoning-effort minimal
"#)]
    Query {
        /// Prompt text.
        prompt: String,

        /// Additional context prepended to the prompt.
        #[arg(long)]
        context: Option<String>,

        /// Model: gpt-5, gpt-5-mini, gpt-5-nano.
        #[arg(short, long)]
        model: Option<String>,

        /// Verbosity: low, medium, high.
        #[arg(long)]
        verbosity: Option<String>,

        /// Reasoning effort: minimal, standard, extended.
        #[arg(long)]
        reasoning_effort: Option<String>,

        /// Maximum output tokens (1-128000).
        #[arg(long)]
        max_tokens: Option<u32>,

        /// Sampling temperature (0-2).
        #[arg(short, long)]
        temperature: Option<f32>,
    },
}
