//! content-site-mcp: machine-callable interface for a content site
//!
//! This library exposes a small content site over JSON-RPC 2.0: management
//! tools, URI-addressed resources and authoring prompts, served over
//! authenticated HTTP.
//!
//! # Architecture
//!
//! Requests pass through three layers:
//!
//! - **HTTP boundary** ([`http`]): bearer authentication, request logging
//!   and the single `POST /mcp` route
//! - **JSON-RPC pipeline** ([`rpc`]): envelope parsing, batch handling and
//!   method dispatch
//! - **Feature registries** ([`features`]): typed parameter casting, URI
//!   resolution and result assembly for tools, resources and prompts
//!
//! The registries are populated at boot and frozen behind an `Arc`; the only
//! mutable state while serving is the posts store itself.
//!
//! # Modules
//!
//! - [`config`] — Configuration loading and validation
//! - [`error`] — Configuration error types
//! - [`features`] — Tool, resource and prompt registries
//! - [`http`] — HTTP server, authentication and logging
//! - [`rpc`] — JSON-RPC 2.0 protocol handling
//! - [`site`] — The demo content site served by the binary

pub mod config;
pub mod error;
pub mod features;
pub mod http;
pub mod rpc;
pub mod site;
