/// MCP (Model Context Protocol) message structures and JSON-RPC handling
///
/// This module defines the JSON-RPC message format that Claude and other
/// MCP clients use to communicate with the sleep coaching server.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// MCP protocol version we support
pub const MCP_VERSION: &str = "2024-11-05";

/// JSON-RPC 2.0 request message
///
/// Requests without an `id` are notifications and get no response.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (always "2.0")
    #[allow(dead_code)]
    pub jsonrpc: String,
    /// Unique identifier for this request
    #[serde(default)]
    pub id: Option<Value>,
    /// The method to call (e.g., "tools/call")
    pub method: String,
    /// Parameters for the method call
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 response message
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Request ID that we're responding to
    pub id: Value,
    /// Successful result (if no error occurred)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error information (if something went wrong)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error information
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    /// Error code (standard JSON-RPC codes)
    pub code: i32,
    /// Human-readable error message
    pub message: String,
    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// MCP tool call parameters
#[derive(Debug, Deserialize)]
pub struct ToolCallParams {
    /// Name of the tool to call (e.g., "sleep_log")
    pub name: String,
    /// Arguments to pass to the tool
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

/// MCP tool call result
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    /// Tool execution results
    pub content: Vec<ToolContent>,
    /// Whether this is an error result
    pub is_error: bool,
}

/// Content returned by a tool
#[derive(Debug, Serialize)]
pub struct ToolContent {
    /// Type of content (always "text" here)
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

/// MCP tool definition
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Tool name (e.g., "sleep_insights")
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON schema for the tool's input parameters
    pub input_schema: Value,
}

impl ToolDefinition {
    /// Describe a tool whose arguments deserialize into `P`
    pub fn for_params<P: JsonSchema>(name: &str, description: &str) -> Self {
        let schema = schemars::schema_for!(P);
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: serde_json::to_value(schema).unwrap_or_else(|_| serde_json::json!({"type": "object"})),
        }
    }
}

/// MCP server capabilities
#[derive(Debug, Serialize)]
pub struct ServerCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
}

/// Tools capability information
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    /// Whether the tool list can change at runtime
    pub list_changed: bool,
}

/// MCP initialization request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// MCP protocol version the client supports
    pub protocol_version: String,
    #[allow(dead_code)]
    #[serde(default)]
    pub capabilities: Value,
    pub client_info: Option<ClientInfo>,
}

/// Information about the MCP client
#[derive(Debug, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// MCP initialization response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: ServerInfo,
}

/// Information about this server
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

// JSON-RPC error codes (standard codes)
pub mod error_codes {
    /// Parse error - Invalid JSON was received by the server
    pub const PARSE_ERROR: i32 = -32700;
    /// Invalid Request - The JSON sent is not a valid Request object
    pub const INVALID_REQUEST: i32 = -32600;
    /// Method not found - The requested method doesn't exist
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid parameters - Method exists but parameters are wrong
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal error - Internal JSON-RPC error
    pub const INTERNAL_ERROR: i32 = -32603;

    // Application-specific codes, in the -32000 to -32099 server range
    /// Record not found - The specified record ID doesn't exist
    pub const RECORD_NOT_FOUND: i32 = -32001;
    /// Validation error - Input validation failed
    pub const VALIDATION_ERROR: i32 = -32003;
    /// Storage error - Database or storage operation failed
    pub const STORAGE_ERROR: i32 = -32004;
}

impl JsonRpcResponse {
    /// Create a successful response
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Value, code: i32, message: String, data: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError { code, message, data }),
        }
    }

    /// Serialize `result` into a success response, or an internal error if that fails
    pub fn from_serializable<T: Serialize>(id: Value, result: &T) -> Self {
        match serde_json::to_value(result) {
            Ok(value) => Self::success(id, value),
            Err(e) => Self::error(id, error_codes::INTERNAL_ERROR, format!("Failed to encode result: {}", e), None),
        }
    }
}

impl ToolCallResult {
    /// Create a successful tool result with text content
    pub fn success(text: String) -> Self {
        Self {
            content: vec![ToolContent {
                content_type: "text".to_string(),
                text,
            }],
            is_error: false,
        }
    }

    /// Successful result carrying a readable message and the JSON payload
    pub fn success_with_payload<T: Serialize>(text: String, payload: &T) -> Self {
        let mut result = Self::success(text);
        if let Ok(json) = serde_json::to_string_pretty(payload) {
            result.content.push(ToolContent {
                content_type: "text".to_string(),
                text: json,
            });
        }
        result
    }

    /// Create an error tool result
    pub fn error(error_message: String) -> Self {
        Self {
            content: vec![ToolContent {
                content_type: "text".to_string(),
                text: format!("Error: {}", error_message),
            }],
            is_error: true,
        }
    }
}

/// Map storage errors to the JSON-RPC code reported alongside tool errors
pub fn storage_error_to_json_rpc_code(error: &crate::storage::StorageError) -> i32 {
    use crate::storage::StorageError;

    match error {
        StorageError::RecordNotFound { .. } => error_codes::RECORD_NOT_FOUND,
        StorageError::InvalidInput(_) | StorageError::Domain(_) => error_codes::VALIDATION_ERROR,
        StorageError::Query(_) | StorageError::Connection(_) | StorageError::Migration(_) => error_codes::STORAGE_ERROR,
        StorageError::Serialization(_) => error_codes::INTERNAL_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;
    use crate::storage::StorageError;

    #[test]
    fn test_tool_result_wire_names() {
        let json = serde_json::to_value(ToolCallResult::error("boom".into())).unwrap();
        assert_eq!(json["isError"], true);
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][0]["text"], "Error: boom");
    }

    #[test]
    fn test_tool_definition_schema() {
        let def = ToolDefinition::for_params::<crate::tools::InsightsParams>("sleep_insights", "Insights");
        let json = serde_json::to_value(&def).unwrap();

        assert_eq!(json["inputSchema"]["type"], "object");
        assert!(json["inputSchema"]["properties"]["user_id"].is_object());
        assert!(json["inputSchema"]["properties"]["quick_mode"].is_object());
    }

    #[test]
    fn test_storage_error_codes() {
        let not_found = StorageError::RecordNotFound { record_id: "x".into() };
        assert_eq!(storage_error_to_json_rpc_code(&not_found), error_codes::RECORD_NOT_FOUND);

        let invalid = StorageError::Domain(DomainError::InvalidUserId("".into()));
        assert_eq!(storage_error_to_json_rpc_code(&invalid), error_codes::VALIDATION_ERROR);

        let migration = StorageError::Migration("newer schema".into());
        assert_eq!(storage_error_to_json_rpc_code(&migration), error_codes::STORAGE_ERROR);
    }

    #[test]
    fn test_notification_has_no_id() {
        let request: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        assert!(request.id.is_none());
    }
}
