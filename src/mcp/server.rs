/// MCP server implementation that handles JSON-RPC communication
///
/// This module implements the actual MCP server that:
/// 1. Reads JSON-RPC requests from stdin
/// 2. Dispatches tool calls to the sleep tools
/// 3. Sends JSON-RPC responses to stdout

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::analytics::AnalysisOutcome;
use crate::mcp::protocol::*;
use crate::storage::StorageError;
use crate::tools;
use crate::{RestCycleServer, ServerError};

/// MCP server that handles communication with the client
pub struct McpServer {
    /// The underlying sleep coaching server
    rest_cycle: RestCycleServer,
    /// Whether the client has finished initialization
    initialized: bool,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(rest_cycle: RestCycleServer) -> Self {
        Self {
            rest_cycle,
            initialized: false,
        }
    }

    /// Whether the `initialized` notification has been received
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Run the MCP server, handling JSON-RPC over stdin/stdout
    pub async fn run(&mut self) -> Result<(), ServerError> {
        info!("Starting MCP server, waiting for JSON-RPC requests...");

        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin);
        let mut stdout = tokio::io::stdout();

        let mut line = String::new();

        loop {
            line.clear();

            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("MCP server shutting down (stdin closed)");
                    break;
                }
                Ok(_) => {
                    if let Some(response) = self.process_line(&line).await {
                        let response_str = serde_json::to_string(&response)?;

                        stdout.write_all(response_str.as_bytes()).await?;
                        stdout.write_all(b"\n").await?;
                        stdout.flush().await?;

                        debug!("Sent response: {}", response_str);
                    }
                }
                Err(e) => {
                    error!("Failed to read from stdin: {}", e);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Process a single line of JSON-RPC input
    ///
    /// Returns None for blank lines and notifications.
    pub async fn process_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        debug!("Processing request: {}", line);

        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse JSON-RPC request: {}", e);
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    error_codes::PARSE_ERROR,
                    format!("Invalid JSON: {}", e),
                    None,
                ));
            }
        };

        self.handle_request(request).await
    }

    /// Handle a JSON-RPC request
    async fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id else {
            self.handle_notification(&request.method);
            return None;
        };

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id, request.params),
            "initialized" => {
                self.initialized = true;
                JsonRpcResponse::success(id, Value::Null)
            }
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, request.params).await,
            _ => JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method '{}' not found", request.method),
                None,
            ),
        };

        Some(response)
    }

    fn handle_notification(&mut self, method: &str) {
        match method {
            "initialized" | "notifications/initialized" => {
                self.initialized = true;
                info!("MCP client finished initialization");
            }
            other => debug!("Ignoring notification '{}'", other),
        }
    }

    /// Handle MCP initialization request
    fn handle_initialize(&mut self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        match params.map(serde_json::from_value::<InitializeParams>) {
            Some(Ok(init)) => {
                let client = init.client_info.map(|c| format!("{} {}", c.name, c.version));
                info!(
                    "MCP client connected: {} (protocol {})",
                    client.as_deref().unwrap_or("unknown client"),
                    init.protocol_version
                );
            }
            Some(Err(e)) => warn!("Unrecognized initialize parameters: {}", e),
            None => info!("MCP client connected"),
        }

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: false }),
            },
            server_info: ServerInfo {
                name: "Rest Cycle MCP".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        JsonRpcResponse::from_serializable(id, &result)
    }

    /// Handle tools/list request
    fn handle_tools_list(&self, id: Value) -> JsonRpcResponse {
        let tools = vec![
            ToolDefinition::for_params::<tools::LogSleepParams>(
                "sleep_log",
                "Log a night of sleep with hours, quality, energy levels and tags",
            ),
            ToolDefinition::for_params::<tools::ListSleepParams>(
                "sleep_list",
                "List a user's most recent nights, newest first",
            ),
            ToolDefinition::for_params::<tools::UpdateSleepParams>(
                "sleep_update",
                "Correct fields of a logged night",
            ),
            ToolDefinition::for_params::<tools::DeleteSleepParams>(
                "sleep_delete",
                "Delete a logged night",
            ),
            ToolDefinition::for_params::<tools::AnalysisParams>(
                "sleep_analysis",
                "Analyze up to 30 recent nights: averages, sleep debt, efficiency, consistency, chronotype and recommendations",
            ),
            ToolDefinition::for_params::<tools::InsightsParams>(
                "sleep_insights",
                "Get personalized sleep coaching: three quick tips or a detailed narrative",
            ),
        ];

        JsonRpcResponse::success(id, json!({ "tools": tools }))
    }

    /// Handle tools/call request
    async fn handle_tools_call(&mut self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let tool_params: ToolCallParams = match params {
            Some(params) => match serde_json::from_value(params) {
                Ok(p) => p,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        error_codes::INVALID_PARAMS,
                        format!("Invalid parameters: {}", e),
                        None,
                    );
                }
            },
            None => {
                return JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    "Missing parameters".to_string(),
                    None,
                );
            }
        };

        debug!("Calling tool '{}'", tool_params.name);

        let args = tool_params.arguments;
        let result = match tool_params.name.as_str() {
            "sleep_log" => self.call_sleep_log(args),
            "sleep_list" => self.call_sleep_list(args),
            "sleep_update" => self.call_sleep_update(args),
            "sleep_delete" => self.call_sleep_delete(args),
            "sleep_analysis" => self.call_sleep_analysis(args),
            "sleep_insights" => self.call_sleep_insights(args).await,
            _ => ToolCallResult::error(format!("Unknown tool: {}", tool_params.name)),
        };

        JsonRpcResponse::from_serializable(id, &result)
    }

    fn call_sleep_log(&self, args: Map<String, Value>) -> ToolCallResult {
        let params = match parse_arguments::<tools::LogSleepParams>(args) {
            Ok(p) => p,
            Err(result) => return result,
        };

        match tools::log_sleep(self.rest_cycle.storage(), params) {
            Ok(response) => ToolCallResult::success_with_payload(
                format!("{}\nRecord ID: {}", response.message, response.record.id.to_string()),
                &response.record,
            ),
            Err(e) => tool_error("sleep_log", e),
        }
    }

    fn call_sleep_list(&self, args: Map<String, Value>) -> ToolCallResult {
        let params = match parse_arguments::<tools::ListSleepParams>(args) {
            Ok(p) => p,
            Err(result) => return result,
        };

        match tools::list_sleep(self.rest_cycle.storage(), params) {
            Ok(response) if response.records.is_empty() => {
                ToolCallResult::success("No sleep records found. Log your first night to get started!".to_string())
            }
            Ok(response) => {
                let header = format!(
                    "🛏️ **Recent Nights** ({} nights, avg {:.1}h, quality {:.1}/5)\n\n",
                    response.summary.nights, response.summary.avg_hours, response.summary.avg_quality
                );
                let lines = response
                    .records
                    .iter()
                    .map(|r| {
                        let tags = if r.tags.is_empty() { String::new() } else { format!(" [{}]", r.tags.join(", ")) };
                        format!(
                            "📅 {} | {:.1}h | quality {}/5 | energy {}/{}/{}{}\n   ID: {}",
                            r.date, r.hours, r.quality, r.morning_energy, r.afternoon_energy, r.evening_energy,
                            tags, r.id.to_string()
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                ToolCallResult::success(format!("{}{}", header, lines))
            }
            Err(e) => tool_error("sleep_list", e),
        }
    }

    fn call_sleep_update(&self, args: Map<String, Value>) -> ToolCallResult {
        let params = match parse_arguments::<tools::UpdateSleepParams>(args) {
            Ok(p) => p,
            Err(result) => return result,
        };

        match tools::update_sleep(self.rest_cycle.storage(), params) {
            Ok(response) => ToolCallResult::success_with_payload(response.message, &response.record),
            Err(e) => tool_error("sleep_update", e),
        }
    }

    fn call_sleep_delete(&self, args: Map<String, Value>) -> ToolCallResult {
        let params = match parse_arguments::<tools::DeleteSleepParams>(args) {
            Ok(p) => p,
            Err(result) => return result,
        };

        match tools::delete_sleep(self.rest_cycle.storage(), params) {
            Ok(response) => ToolCallResult::success(response.message),
            Err(e) => tool_error("sleep_delete", e),
        }
    }

    fn call_sleep_analysis(&self, args: Map<String, Value>) -> ToolCallResult {
        let params = match parse_arguments::<tools::AnalysisParams>(args) {
            Ok(p) => p,
            Err(result) => return result,
        };

        match tools::analyze_sleep(self.rest_cycle.storage(), params) {
            Ok(outcome @ AnalysisOutcome::NoData { .. }) => ToolCallResult::success(tools::format_analysis(&outcome)),
            Ok(outcome) => ToolCallResult::success_with_payload(tools::format_analysis(&outcome), &outcome),
            Err(e) => tool_error("sleep_analysis", e),
        }
    }

    async fn call_sleep_insights(&self, args: Map<String, Value>) -> ToolCallResult {
        let params = match parse_arguments::<tools::InsightsParams>(args) {
            Ok(p) => p,
            Err(result) => return result,
        };

        match tools::get_sleep_insights(self.rest_cycle.storage(), self.rest_cycle.orchestrator(), params).await {
            Ok(response) => ToolCallResult::success_with_payload(tools::format_insights(&response), &response),
            Err(e) => tool_error("sleep_insights", e),
        }
    }
}

/// Deserialize tool arguments, turning a mismatch into an error result
fn parse_arguments<P: DeserializeOwned>(args: Map<String, Value>) -> Result<P, ToolCallResult> {
    serde_json::from_value(Value::Object(args))
        .map_err(|e| ToolCallResult::error(format!("Invalid arguments: {}", e)))
}

fn tool_error(tool: &str, e: StorageError) -> ToolCallResult {
    warn!(tool, code = storage_error_to_json_rpc_code(&e), "Tool call failed: {}", e);
    ToolCallResult::error(e.to_string())
}
