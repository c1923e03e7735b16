//! JSON-RPC 2.0 envelope types.
//!
//! Request, response and error shapes plus the standard error codes. The
//! envelope layer knows nothing about features; it only validates the
//! JSON-RPC 2.0 structure and builds well-formed response values.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// The only protocol version this server speaks.
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP server-error code for a resource URI that resolves to nothing.
pub const RESOURCE_NOT_FOUND: i32 = -32002;

/// A request id: JSON-RPC allows strings and integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric id.
    Number(i64),
    /// String id.
    String(String),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

/// An incoming JSON-RPC request.
///
/// `id` is `None` both when absent and when explicitly `null`; either way
/// the request is a notification and produces no response. `params` must
/// be a JSON object when present; a request with any other params shape
/// fails deserialisation and is reported as an invalid request.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version tag; must be `"2.0"`.
    pub jsonrpc: String,
    /// Request id; absent or null for notifications.
    #[serde(default)]
    pub id: Option<RequestId>,
    /// Method name of the form `<feature>/<action>`.
    pub method: String,
    /// Named parameters.
    #[serde(default)]
    pub params: Option<Map<String, Value>>,
}

impl JsonRpcRequest {
    /// Deserialises one request object.
    ///
    /// # Errors
    ///
    /// On a shape mismatch, fails with the request's id extracted leniently
    /// from the raw value, for use in the error response.
    pub fn from_value(value: &Value) -> Result<Self, Option<RequestId>> {
        serde_json::from_value(value.clone()).map_err(|_| extract_id(value))
    }

    /// Checks envelope invariants deserialisation cannot express.
    ///
    /// Returns a reason when the request is invalid.
    #[must_use]
    pub fn validate(&self) -> Option<&'static str> {
        if self.jsonrpc != JSONRPC_VERSION {
            return Some("jsonrpc must be \"2.0\"");
        }
        if self.method.is_empty() {
            return Some("method must be a non-empty string");
        }
        None
    }

    /// Returns whether this request expects no response.
    #[must_use]
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Pulls a usable id out of a value that failed request deserialisation,
/// so the error response can still reference it.
#[must_use]
pub fn extract_id(value: &Value) -> Option<RequestId> {
    match value.get("id") {
        Some(Value::Number(n)) => n.as_i64().map(RequestId::Number),
        Some(Value::String(s)) => Some(RequestId::String(s.clone())),
        _ => None,
    }
}

/// A successful JSON-RPC response.
#[derive(Debug, Clone)]
pub struct JsonRpcResponse {
    /// The request id this responds to.
    pub id: RequestId,
    /// The result object.
    pub result: Value,
}

impl JsonRpcResponse {
    /// Creates a success response.
    #[must_use]
    pub const fn new(id: RequestId, result: Value) -> Self {
        Self { id, result }
    }

    /// Renders the response envelope.
    #[must_use]
    pub fn into_value(self) -> Value {
        json!({
            "jsonrpc": JSONRPC_VERSION,
            "id": self.id,
            "result": self.result,
        })
    }
}

/// The standard JSON-RPC 2.0 error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid JSON was received.
    ParseError,
    /// The JSON is not a valid request object.
    InvalidRequest,
    /// The method does not exist.
    MethodNotFound,
    /// Invalid method parameters.
    InvalidParams,
    /// Internal JSON-RPC error.
    InternalError,
}

impl ErrorCode {
    /// Returns the numeric wire code.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
        }
    }

    /// Returns the canonical message for this code.
    #[must_use]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::ParseError => "Parse error",
            Self::InvalidRequest => "Invalid Request",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::InternalError => "Internal error",
        }
    }
}

/// The `error` member of an error response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcErrorData {
    /// Numeric error code.
    pub code: i32,
    /// Human-readable message.
    pub message: String,
    /// Optional structured detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcErrorData {
    /// Creates error data with a code's canonical message.
    #[must_use]
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code: code.code(),
            message: code.default_message().to_string(),
            data: None,
        }
    }

    /// Creates error data with a custom message.
    #[must_use]
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    /// Creates error data with an implementation-defined server code.
    #[must_use]
    pub fn server_error(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attaches structured detail.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// A JSON-RPC error response.
///
/// Unlike success responses, the id may be unknown (malformed input); it
/// is then serialised as an explicit `null`, as the protocol requires.
#[derive(Debug, Clone)]
pub struct JsonRpcError {
    /// The request id, when one could be determined.
    pub id: Option<RequestId>,
    /// The error payload.
    pub error: JsonRpcErrorData,
}

impl JsonRpcError {
    /// Creates an error response.
    #[must_use]
    pub const fn new(id: Option<RequestId>, error: JsonRpcErrorData) -> Self {
        Self { id, error }
    }

    /// A parse error; the id is always null.
    #[must_use]
    pub fn parse_error() -> Self {
        Self::new(None, JsonRpcErrorData::from_code(ErrorCode::ParseError))
    }

    /// An invalid-request error with an optional reason for the caller.
    #[must_use]
    pub fn invalid_request(id: Option<RequestId>, reason: Option<&str>) -> Self {
        let data = match reason {
            Some(reason) => JsonRpcErrorData::with_message(ErrorCode::InvalidRequest, reason),
            None => JsonRpcErrorData::from_code(ErrorCode::InvalidRequest),
        };
        Self::new(id, data)
    }

    /// A method-not-found error naming the offending method.
    #[must_use]
    pub fn method_not_found(id: RequestId, method: &str) -> Self {
        Self::new(
            Some(id),
            JsonRpcErrorData::with_message(
                ErrorCode::MethodNotFound,
                format!("Method not found: {method}"),
            ),
        )
    }

    /// An invalid-params error with a specific message.
    #[must_use]
    pub fn invalid_params(id: RequestId, message: impl Into<String>) -> Self {
        Self::new(
            Some(id),
            JsonRpcErrorData::with_message(ErrorCode::InvalidParams, message),
        )
    }

    /// An internal error with a specific message.
    #[must_use]
    pub fn internal_error(id: RequestId, message: impl Into<String>) -> Self {
        Self::new(
            Some(id),
            JsonRpcErrorData::with_message(ErrorCode::InternalError, message),
        )
    }

    /// Renders the error envelope. The id is always present, null when
    /// unknown.
    #[must_use]
    pub fn into_value(self) -> Value {
        json!({
            "jsonrpc": JSONRPC_VERSION,
            "id": self.id,
            "error": self.error,
        })
    }
}
