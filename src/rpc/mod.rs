//! The JSON-RPC pipeline: envelope types, method routing and body
//! processing.
//!
//! A request body flows through the serialiser, then the manager, then
//! the feature registries and back; the serialiser owns batch semantics,
//! the manager owns method routing and error mapping, and [`protocol`]
//! owns the envelope shapes.

pub mod manager;
pub mod protocol;
pub mod serializer;

pub use manager::RequestManager;
pub use protocol::{
    ErrorCode, JsonRpcError, JsonRpcErrorData, JsonRpcRequest, JsonRpcResponse, RequestId,
    JSONRPC_VERSION, RESOURCE_NOT_FOUND,
};
pub use serializer::{JsonRpcSerializer, RpcOutcome};
