//! MCP server implementation for gpt5-mcp.
//!
//! Tools are listed and dispatched by hand rather than through the rmcp tool
//! macros, so `query` receives its raw JSON arguments and the pipeline can
//! report malformed input with its own messages.

use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, Implementation, JsonObject, ListToolsResult,
    PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler};
use serde_json::Value;
use tracing::debug;

use super::params::{QueryParams, empty_object_schema, input_schema};
use crate::config::ServerConfig;
use crate::pipeline::QueryPipeline;

/// Name of the query tool.
pub const QUERY_TOOL: &str = "query";
/// Name of the connectivity tool.
pub const TEST_CONNECTION_TOOL: &str = "test_connection";

/// GPT-5 MCP server.
#[derive(Debug, Clone)]
pub struct Gpt5McpServer {
    pipeline: Arc<QueryPipeline>,
    name: String,
    version: String,
}

impl Gpt5McpServer {
    /// Creates a server over a ready pipeline.
    #[must_use]
    pub fn new(config: &ServerConfig, pipeline: Arc<QueryPipeline>) -> Self {
        Self {
            pipeline,
            name: config.server_name.clone(),
            version: config.server_version.clone(),
        }
    }

    /// Tools advertised to clients.
    #[must_use]
    pub fn tools() -> Vec<Tool> {
        vec![
            Tool::new(
                QUERY_TOOL,
                "Send a prompt to OpenAI GPT-5 and return the formatted response. Supports \
                 optional context, model selection (gpt-5, gpt-5-mini, gpt-5-nano), verbosity, \
                 reasoning effort, output token limit and temperature.",
                input_schema::<QueryParams>(),
            ),
            Tool::new(
                TEST_CONNECTION_TOOL,
                "Check connectivity to the OpenAI API with a minimal request.",
                Arc::new(empty_object_schema()),
            ),
        ]
    }

    /// Runs the named tool.
    ///
    /// # Errors
    ///
    /// Returns an `invalid_params` error for an unknown tool. Tool failures
    /// are reported in the result, not as errors.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        debug!(tool = name, "tool call");
        match name {
            QUERY_TOOL => {
                let raw = arguments.map_or(Value::Null, Value::Object);
                let response = self.pipeline.run(&raw).await;
                let content = vec![Content::text(response.content)];
                if response.is_error {
                    Ok(CallToolResult::error(content))
                } else {
                    Ok(CallToolResult::success(content))
                }
            }
            TEST_CONNECTION_TOOL => {
                let report = self.pipeline.check_connection().await;
                let content = vec![Content::text(report.text)];
                if report.ok {
                    Ok(CallToolResult::success(content))
                } else {
                    Ok(CallToolResult::error(content))
                }
            }
            other => Err(McpError::invalid_params(
                format!("Unknown tool: {other}"),
                None,
            )),
        }
    }
}

impl ServerHandler for Gpt5McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.name.clone(),
                title: Some("GPT-5 MCP Server".to_string()),
                version: self.version.clone(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Forwards prompts to OpenAI GPT-5. Use the `query` tool to ask a question and \
                 `test_connection` to check API access."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: Self::tools(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        CallToolRequestParams {
            name, arguments, ..
        }: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch(&name, arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::UpstreamClient;
    use crate::client::adapter::tests::{MockBackend, test_config};
    use serde_json::json;

    fn server(backend: MockBackend) -> Gpt5McpServer {
        let config = test_config();
        let client = UpstreamClient::with_backend(Arc::new(backend), &config);
        Gpt5McpServer::new(&config, Arc::new(QueryPipeline::new(&config, client)))
    }

    fn text(result: &CallToolResult) -> String {
        result
            .content
            .iter()
            .filter_map(|c| c.as_text().map(|t| t.text.clone()))
            .collect()
    }

    fn args(value: Value) -> Option<JsonObject> {
        value.as_object().cloned()
    }

    #[test]
    fn test_tools_listed() {
        let tools = Gpt5McpServer::tools();
        let names: Vec<_> = tools.iter().map(|t| t.name.to_string()).collect();
        assert_eq!(names, vec!["query", "test_connection"]);

        let query = &tools[0];
        assert!(query.input_schema.contains_key("properties"));
        assert_eq!(tools[1].input_schema["type"], "object");
    }

    #[test]
    fn test_get_info() {
        let info = server(MockBackend::replying("", 0)).get_info();
        assert_eq!(info.server_info.name, "gpt5-mcp-server");
        assert!(info.capabilities.tools.is_some());
        assert!(info.instructions.is_some());
    }

    #[tokio::test]
    async fn test_query_success() {
        let result = server(MockBackend::replying("42", 5))
            .dispatch(QUERY_TOOL, args(json!({"prompt": "Meaning of life?"})))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_ne!(result.is_error, Some(true));
        assert_eq!(text(&result), "## GPT-5 Response\n\n42");
    }

    #[tokio::test]
    async fn test_query_without_arguments() {
        let result = server(MockBackend::replying("unused", 1))
            .dispatch(QUERY_TOOL, None)
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(result.is_error, Some(true));
        assert!(text(&result).contains("Invalid request: must be an object"));
    }

    #[tokio::test]
    async fn test_query_upstream_failure_is_tool_error() {
        let result = server(MockBackend::failing("boom"))
            .dispatch(QUERY_TOOL, args(json!({"prompt": "Hi"})))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(result.is_error, Some(true));
        assert!(text(&result).starts_with("## Error"));
    }

    #[tokio::test]
    async fn test_test_connection() {
        let ok = server(MockBackend::replying("Hi", 2))
            .dispatch(TEST_CONNECTION_TOOL, None)
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(text(&ok).contains("gpt-5, gpt-5-mini, gpt-5-nano"));

        let failed = server(MockBackend::failing("down"))
            .dispatch(TEST_CONNECTION_TOOL, None)
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(failed.is_error, Some(true));
        assert!(text(&failed).contains("Possible causes"));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let err = server(MockBackend::replying("", 0))
            .dispatch("summarize", None)
            .await
            .unwrap_err();
        assert!(err.message.contains("Unknown tool: summarize"));
    }
}
