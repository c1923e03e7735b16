//! Method routing between the JSON-RPC envelope and the feature registries.
//!
//! The manager splits `method` on its first `/` into a feature and an
//! action (so `resources/templates/list` is feature `resources`, action
//! `templates/list`), pops the shared optional `cursor` parameter, and
//! dispatches to the matching registry operation. Feature failures are
//! mapped onto the JSON-RPC error taxonomy here, in one place.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::features::{ContentError, FeatureError, FeatureKind, McpRegistry};
use crate::rpc::protocol::{
    ErrorCode, JsonRpcErrorData, JsonRpcRequest, RESOURCE_NOT_FOUND,
};

/// Routes validated requests to the feature registries.
#[derive(Debug, Clone)]
pub struct RequestManager {
    registry: Arc<McpRegistry>,
}

impl RequestManager {
    /// Creates a manager over a frozen registry aggregate.
    #[must_use]
    pub fn new(registry: Arc<McpRegistry>) -> Self {
        Self { registry }
    }

    /// Processes one validated request.
    ///
    /// Notifications are logged and produce `None`; everything else
    /// produces exactly one result or error payload.
    pub fn process(&self, request: &JsonRpcRequest) -> Option<Result<Value, JsonRpcErrorData>> {
        if request.is_notification() {
            info!(method = %request.method, "Dropping notification");
            return None;
        }
        debug!(method = %request.method, "Dispatching request");
        Some(self.dispatch(request))
    }

    fn dispatch(&self, request: &JsonRpcRequest) -> Result<Value, JsonRpcErrorData> {
        let Some((feature, action)) = request.method.split_once('/') else {
            return Err(method_not_found(&request.method));
        };

        let mut params = request.params.clone().unwrap_or_default();
        let cursor = take_cursor(&mut params)?;

        let result = match (feature, action) {
            ("tools", "list") => self
                .registry
                .tools
                .list(cursor.as_deref())
                .map_err(error_data),
            ("tools", "call") => {
                let name = take_string(&mut params, "name")?;
                let arguments = take_object(&mut params, "arguments")?;
                self.registry
                    .tools
                    .call(&name, &arguments)
                    .map_err(error_data)
            }
            ("resources", "list") => self
                .registry
                .resources
                .list(cursor.as_deref())
                .map_err(error_data),
            ("resources", "templates/list") => self
                .registry
                .resources
                .list_templates(cursor.as_deref())
                .map_err(error_data),
            ("resources", "read") => {
                let uri = take_string(&mut params, "uri")?;
                self.registry.resources.read(&uri).map_err(error_data)
            }
            ("prompts", "list") => self
                .registry
                .prompts
                .list(cursor.as_deref())
                .map_err(error_data),
            ("prompts", "get") => {
                let name = take_string(&mut params, "name")?;
                let arguments = take_object(&mut params, "arguments")?;
                self.registry
                    .prompts
                    .get(&name, &arguments)
                    .map_err(error_data)
            }
            _ => Err(method_not_found(&request.method)),
        }?;

        // The assemblers only build objects; anything else is a bug, not
        // caller input.
        if result.is_object() {
            Ok(result)
        } else {
            Err(JsonRpcErrorData::with_message(
                ErrorCode::InternalError,
                "handler returned a non-object result",
            ))
        }
    }
}

fn method_not_found(method: &str) -> JsonRpcErrorData {
    JsonRpcErrorData::with_message(
        ErrorCode::MethodNotFound,
        format!("Method not found: {method}"),
    )
}

/// Pops the shared optional `cursor` parameter. Only strings qualify.
fn take_cursor(params: &mut Map<String, Value>) -> Result<Option<String>, JsonRpcErrorData> {
    match params.remove("cursor") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(cursor)) => Ok(Some(cursor)),
        Some(_) => Err(JsonRpcErrorData::with_message(
            ErrorCode::InvalidParams,
            "cursor must be a string",
        )),
    }
}

/// Pops a required string parameter.
fn take_string(params: &mut Map<String, Value>, field: &str) -> Result<String, JsonRpcErrorData> {
    match params.remove(field) {
        Some(Value::String(value)) => Ok(value),
        Some(_) => Err(JsonRpcErrorData::with_message(
            ErrorCode::InvalidParams,
            format!("{field} must be a string"),
        )),
        None => Err(JsonRpcErrorData::with_message(
            ErrorCode::InvalidParams,
            format!("Missing required parameter: {field}"),
        )),
    }
}

/// Pops an optional object parameter, defaulting to an empty map.
fn take_object(
    params: &mut Map<String, Value>,
    field: &str,
) -> Result<Map<String, Value>, JsonRpcErrorData> {
    match params.remove(field) {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(JsonRpcErrorData::with_message(
            ErrorCode::InvalidParams,
            format!("{field} must be an object"),
        )),
    }
}

/// Maps feature failures onto the JSON-RPC error taxonomy.
fn error_data(error: FeatureError) -> JsonRpcErrorData {
    match error {
        // Missing resources get the MCP server code so clients can tell
        // "no such resource" from a bad argument.
        FeatureError::FunctionNotFound {
            kind: FeatureKind::Resource,
            key,
        } => JsonRpcErrorData::server_error(RESOURCE_NOT_FOUND, "Resource not found")
            .with_data(json!({"uri": key})),
        error @ (FeatureError::FunctionNotFound { .. }
        | FeatureError::ParameterNotFound { .. }
        | FeatureError::ParameterCast { .. }
        | FeatureError::InvalidCursor
        | FeatureError::SurplusPathParameters { .. }) => {
            JsonRpcErrorData::with_message(ErrorCode::InvalidParams, error.to_string())
        }
        FeatureError::Call { function, source } => {
            // A handler reporting missing backing content is a lookup
            // failure, not an internal fault.
            if let Some(ContentError::ResourceNotFound { uri }) =
                source.downcast_ref::<ContentError>()
            {
                return JsonRpcErrorData::server_error(RESOURCE_NOT_FOUND, "Resource not found")
                    .with_data(json!({"uri": uri}));
            }
            JsonRpcErrorData::with_message(ErrorCode::InternalError, format!("'{function}' failed"))
                .with_data(json!({"cause": source.to_string()}))
        }
        error @ (FeatureError::UnsupportedResult { .. } | FeatureError::Content { .. }) => {
            JsonRpcErrorData::with_message(ErrorCode::InternalError, error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::features::{
        AbstractType, ParamSpec, PromptMessages, PromptSpec, ResourceContents, ResourceSpec,
        ToolOutcome, ToolSpec,
    };

    use super::*;

    fn sample_manager() -> RequestManager {
        let mut registry = McpRegistry::new(10);
        registry.register_tool(
            ToolSpec::new("echo").with_param(ParamSpec::required("text", AbstractType::String)),
            |args| {
                let text = args["text"].as_str().unwrap_or_default();
                Ok(ToolOutcome::text(text)?)
            },
        );
        registry.register_tool(ToolSpec::new("broken"), |_| Err("store offline".into()));
        registry
            .register_resource(
                ResourceSpec::new("site://posts").with_mime_type("application/json"),
                ResourceContents::text("[]").unwrap(),
            )
            .unwrap();
        registry.register_prompt(PromptSpec::new("style_guide"), |_| {
            let mut messages = PromptMessages::new();
            messages.add_text("Keep it short.")?;
            Ok(messages)
        });
        RequestManager::new(Arc::new(registry))
    }

    fn request(value: Value) -> JsonRpcRequest {
        JsonRpcRequest::from_value(&value).unwrap()
    }

    #[test]
    fn notifications_produce_nothing() {
        let manager = sample_manager();
        let req = request(json!({"jsonrpc": "2.0", "method": "tools/list"}));
        assert!(manager.process(&req).is_none());
    }

    #[test]
    fn tools_list_dispatches() {
        let manager = sample_manager();
        let req = request(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}));
        let result = manager.process(&req).unwrap().unwrap();
        assert_eq!(result["tools"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn method_without_slash_is_not_found() {
        let manager = sample_manager();
        let req = request(json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"}));
        let err = manager.process(&req).unwrap().unwrap_err();
        assert_eq!(err.code, ErrorCode::MethodNotFound.code());
        assert!(err.message.contains("initialize"));
    }

    #[test]
    fn unknown_action_is_not_found() {
        let manager = sample_manager();
        let req = request(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/destroy"}));
        let err = manager.process(&req).unwrap().unwrap_err();
        assert_eq!(err.code, ErrorCode::MethodNotFound.code());
    }

    #[test]
    fn templates_list_routes_past_the_second_slash() {
        let manager = sample_manager();
        let req = request(json!({
            "jsonrpc": "2.0", "id": 1, "method": "resources/templates/list",
        }));
        let result = manager.process(&req).unwrap().unwrap();
        assert!(result["resourceTemplates"].as_array().unwrap().is_empty());
    }

    #[test]
    fn non_string_cursor_is_invalid_params() {
        let manager = sample_manager();
        let req = request(json!({
            "jsonrpc": "2.0", "id": 1, "method": "tools/list", "params": {"cursor": 7},
        }));
        let err = manager.process(&req).unwrap().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidParams.code());
    }

    #[test]
    fn tool_call_requires_a_name() {
        let manager = sample_manager();
        let req = request(json!({
            "jsonrpc": "2.0", "id": 1, "method": "tools/call", "params": {},
        }));
        let err = manager.process(&req).unwrap().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidParams.code());
        assert!(err.message.contains("name"));
    }

    #[test]
    fn tool_call_round_trip() {
        let manager = sample_manager();
        let req = request(json!({
            "jsonrpc": "2.0", "id": 1, "method": "tools/call",
            "params": {"name": "echo", "arguments": {"text": "hi"}},
        }));
        let result = manager.process(&req).unwrap().unwrap();
        assert_eq!(result["content"][0]["text"], json!("hi"));
    }

    #[test]
    fn failing_tool_maps_to_internal_error_with_cause() {
        let manager = sample_manager();
        let req = request(json!({
            "jsonrpc": "2.0", "id": 1, "method": "tools/call",
            "params": {"name": "broken"},
        }));
        let err = manager.process(&req).unwrap().unwrap_err();
        assert_eq!(err.code, ErrorCode::InternalError.code());
        assert_eq!(
            err.data.as_ref().and_then(|d| d["cause"].as_str()),
            Some("store offline")
        );
    }

    #[test]
    fn unknown_resource_uses_the_server_code() {
        let manager = sample_manager();
        let req = request(json!({
            "jsonrpc": "2.0", "id": 1, "method": "resources/read",
            "params": {"uri": "post://missing"},
        }));
        let err = manager.process(&req).unwrap().unwrap_err();
        assert_eq!(err.code, RESOURCE_NOT_FOUND);
        assert_eq!(
            err.data.as_ref().and_then(|d| d["uri"].as_str()),
            Some("post://missing")
        );
    }

    #[test]
    fn unknown_tool_is_invalid_params() {
        let manager = sample_manager();
        let req = request(json!({
            "jsonrpc": "2.0", "id": 1, "method": "tools/call",
            "params": {"name": "missing"},
        }));
        let err = manager.process(&req).unwrap().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidParams.code());
        assert!(err.message.contains("unknown tool"));
    }

    #[test]
    fn handler_reported_missing_content_uses_the_server_code() {
        let mut registry = McpRegistry::new(10);
        registry
            .register_resource_handler(
                ResourceSpec::new("post://{permalink}")
                    .with_param(ParamSpec::required("permalink", AbstractType::String)),
                |args| {
                    let permalink = args["permalink"].as_str().unwrap_or_default();
                    Err(ContentError::ResourceNotFound {
                        uri: format!("post://{permalink}"),
                    }
                    .into())
                },
            )
            .unwrap();
        let manager = RequestManager::new(Arc::new(registry));
        let req = request(json!({
            "jsonrpc": "2.0", "id": 1, "method": "resources/read",
            "params": {"uri": "post://ghost"},
        }));
        let err = manager.process(&req).unwrap().unwrap_err();
        assert_eq!(err.code, RESOURCE_NOT_FOUND);
        assert_eq!(
            err.data.as_ref().and_then(|d| d["uri"].as_str()),
            Some("post://ghost")
        );
    }

    #[test]
    fn prompts_get_dispatches() {
        let manager = sample_manager();
        let req = request(json!({
            "jsonrpc": "2.0", "id": 1, "method": "prompts/get",
            "params": {"name": "style_guide"},
        }));
        let result = manager.process(&req).unwrap().unwrap();
        assert_eq!(result["messages"][0]["content"]["text"], json!("Keep it short."));
    }
}
