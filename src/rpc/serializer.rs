//! JSON-RPC body processing: single requests, batches and notifications.
//!
//! The serialiser owns the outermost protocol decisions: what counts as
//! parseable, how batch items are isolated from each other, and when no
//! body at all is the correct answer. Every path through [`process`]
//! (`JsonRpcSerializer::process`) ends in a well-formed [`RpcOutcome`];
//! nothing here panics on caller input.

use serde_json::Value;

use crate::rpc::manager::RequestManager;
use crate::rpc::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};

/// What a request body produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcOutcome {
    /// One response envelope.
    Single(Value),
    /// One response envelope per non-notification batch item.
    Batch(Vec<Value>),
    /// No body at all: the input was entirely notifications.
    NoContent,
}

/// Turns raw request bodies into response outcomes.
#[derive(Debug, Clone)]
pub struct JsonRpcSerializer {
    manager: RequestManager,
}

impl JsonRpcSerializer {
    /// Creates a serialiser over a request manager.
    #[must_use]
    pub const fn new(manager: RequestManager) -> Self {
        Self { manager }
    }

    /// Processes one HTTP request body.
    ///
    /// Accepts a single request object or a batch array. Batch items are
    /// processed independently: one malformed or failing item yields an
    /// error in its own slot and nothing else. Notifications are omitted
    /// from the output; an all-notification input yields
    /// [`RpcOutcome::NoContent`].
    #[must_use]
    pub fn process(&self, body: &[u8]) -> RpcOutcome {
        let parsed: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(_) => return RpcOutcome::Single(JsonRpcError::parse_error().into_value()),
        };

        match parsed {
            Value::Array(items) => {
                if items.is_empty() {
                    return RpcOutcome::Single(
                        JsonRpcError::invalid_request(None, Some("batch must not be empty"))
                            .into_value(),
                    );
                }
                let responses: Vec<Value> = items
                    .iter()
                    .filter_map(|item| self.process_item(item))
                    .collect();
                if responses.is_empty() {
                    RpcOutcome::NoContent
                } else {
                    RpcOutcome::Batch(responses)
                }
            }
            value @ Value::Object(_) => match self.process_item(&value) {
                Some(response) => RpcOutcome::Single(response),
                None => RpcOutcome::NoContent,
            },
            _ => RpcOutcome::Single(
                JsonRpcError::invalid_request(None, Some("request must be an object or array"))
                    .into_value(),
            ),
        }
    }

    /// Processes one request object; `None` means a notification.
    fn process_item(&self, item: &Value) -> Option<Value> {
        let request = match JsonRpcRequest::from_value(item) {
            Ok(request) => request,
            Err(id) => return Some(JsonRpcError::invalid_request(id, None).into_value()),
        };
        if let Some(reason) = request.validate() {
            // An invalid envelope gets an error even when it looks like a
            // notification; its id cannot be trusted.
            return Some(JsonRpcError::invalid_request(request.id, Some(reason)).into_value());
        }

        match self.manager.process(&request)? {
            Ok(result) => {
                // Non-notifications always carry an id.
                let id = request.id?;
                Some(JsonRpcResponse::new(id, result).into_value())
            }
            Err(error) => Some(JsonRpcError::new(request.id, error).into_value()),
        }
    }
}
