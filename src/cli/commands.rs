//! CLI command implementations.

use std::sync::Arc;

use serde_json::{Map, Value, json};

use crate::cli::parser::{Cli, Commands};
use crate::config::ServerConfig;
use crate::mcp::{Gpt5McpServer, serve_stdio};
use crate::pipeline::QueryPipeline;

/// Result of a one-shot command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Text for stdout.
    pub text: String,
    /// Whether the command succeeded.
    pub success: bool,
}

/// Executes the CLI command.
///
/// Server commands run until the transport closes and produce empty output.
///
/// # Errors
///
/// Returns an error if a transport fails to start or stops abnormally.
pub async fn execute(
    cli: &Cli,
    config: &ServerConfig,
    pipeline: Arc<QueryPipeline>,
) -> anyhow::Result<CommandOutput> {
    match cli.command.clone().unwrap_or(Commands::Stdio) {
        Commands::Stdio => {
            serve_stdio(Gpt5McpServer::new(config, pipeline)).await?;
            Ok(served())
        }
        #[cfg(feature = "http")]
        Commands::Http { host, port } => {
            crate::mcp::serve_http(Gpt5McpServer::new(config, pipeline), &host, port).await?;
            Ok(served())
        }
        Commands::TestConnection => {
            let report = pipeline.check_connection().await;
            Ok(CommandOutput {
                text: report.text,
                success: report.ok,
            })
        }
        Commands::Query {
            prompt,
            context,
            model,
            verbosity,
            reasoning_effort,
            max_tokens,
            temperature,
        } => {
            let args = query_arguments(QueryArgs {
                prompt,
                context,
                model,
                verbosity,
                reasoning_effort,
                max_tokens,
                temperature,
            });
            let response = pipeline.run(&args).await;
            Ok(CommandOutput {
                text: response.content,
                success: !response.is_error,
            })
        }
    }
}

const fn served() -> CommandOutput {
    CommandOutput {
        text: String::new(),
        success: true,
    }
}

/// Query flags collected from the command line.
#[derive(Debug, Clone, Default)]
struct QueryArgs {
    prompt: String,
    context: Option<String>,
    model: Option<String>,
    verbosity: Option<String>,
    reasoning_effort: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

/// Builds the same JSON arguments an MCP client would send.
fn query_arguments(args: QueryArgs) -> Value {
    let mut map = Map::new();
    map.insert("prompt".to_string(), json!(args.prompt));
    let optional = [
        ("context", args.context.map(Value::from)),
        ("model", args.model.map(Value::from)),
        ("verbosity", args.verbosity.map(Value::from)),
        ("reasoning_effort", args.reasoning_effort.map(Value::from)),
        ("max_tokens", args.max_tokens.map(Value::from)),
        ("temperature", args.temperature.map(Value::from)),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            map.insert(key.to_string(), value);
        }
    }
    Value::Object(map)
}
