//! Feature registries: tools, resources and prompts.
//!
//! The three feature kinds share one generic registry contract
//! ([`registry::FeatureRegistry`]) and one content model ([`content`]);
//! they differ in how results are assembled and, for resources, in how
//! keys are resolved. [`McpRegistry`] aggregates one registry per kind
//! and is populated at boot, then frozen behind an `Arc` for serving.

pub mod content;
pub mod cursor;
pub mod error;
pub mod prompts;
pub mod registry;
pub mod resources;
pub mod tools;
pub mod types;

use std::path::Path;

use serde_json::{Map, Value};

pub use content::{
    detect_from_file, BinaryContent, ContentItem, DetectedContent, EmbeddedResource,
    ResourcePayload, TextContent,
};
pub use cursor::{decode_cursor, encode_cursor, paginate};
pub use error::{BoxError, CastError, ContentError, FeatureError, RegistrationError};
pub use prompts::{PromptMessage, PromptMessages, PromptRegistry, PromptSpec, Role};
pub use registry::{Definition, EntryMeta, FeatureKind, FeatureRegistry, ParamSpec};
pub use resources::{
    ResolvedUri, ResourceContents, ResourceItem, ResourceRegistry, ResourceSpec,
};
pub use tools::{ToolOutcome, ToolRegistry, ToolSpec};
pub use types::{cast, cast_to_string, AbstractType};

/// The registry aggregate: one registry per feature kind.
///
/// Constructed and populated during process initialisation, then frozen
/// behind an `Arc`; nothing mutates it while serving, so no locking.
#[derive(Debug)]
pub struct McpRegistry {
    /// Named invocable operations.
    pub tools: ToolRegistry,
    /// URI-addressable content.
    pub resources: ResourceRegistry,
    /// Message-sequence templates.
    pub prompts: PromptRegistry,
}

impl McpRegistry {
    /// Creates an empty aggregate listing `page_size` items per page.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            tools: ToolRegistry::new(page_size),
            resources: ResourceRegistry::new(page_size),
            prompts: PromptRegistry::new(page_size),
        }
    }

    /// Registers a tool.
    pub fn register_tool<F>(&mut self, spec: ToolSpec, handler: F)
    where
        F: Fn(&Map<String, Value>) -> Result<ToolOutcome, BoxError> + Send + Sync + 'static,
    {
        self.tools.register(spec, handler);
    }

    /// Registers a resource with preloaded contents.
    ///
    /// # Errors
    ///
    /// Fails if the URI carries placeholders.
    pub fn register_resource(
        &mut self,
        spec: ResourceSpec,
        contents: ResourceContents,
    ) -> Result<(), RegistrationError> {
        self.resources.register(spec, contents)
    }

    /// Registers a resource backed by a handler.
    ///
    /// # Errors
    ///
    /// Fails on a placeholder/required-parameter arity mismatch.
    pub fn register_resource_handler<F>(
        &mut self,
        spec: ResourceSpec,
        handler: F,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&Map<String, Value>) -> Result<ResourceContents, BoxError> + Send + Sync + 'static,
    {
        self.resources.register_handler(spec, handler)
    }

    /// Registers a file as a resource, returning its `file://` URI.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or matches no content kind.
    pub fn register_file_resource(
        &mut self,
        path: impl AsRef<Path>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<String, RegistrationError> {
        self.resources.register_file(path, title, description)
    }

    /// Registers a prompt.
    pub fn register_prompt<F>(&mut self, spec: PromptSpec, handler: F)
    where
        F: Fn(&Map<String, Value>) -> Result<PromptMessages, BoxError> + Send + Sync + 'static,
    {
        self.prompts.register(spec, handler);
    }

    /// Registers a static single-message prompt.
    ///
    /// # Errors
    ///
    /// Fails if the text is empty.
    pub fn register_text_prompt(
        &mut self,
        spec: PromptSpec,
        text: impl Into<String>,
    ) -> Result<(), ContentError> {
        self.prompts.register_text(spec, text)
    }
}
