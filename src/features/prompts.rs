//! Prompt registration, invocation and message assembly.
//!
//! A prompt handler returns [`PromptMessages`]: an ordered list of
//! role-tagged messages, each carrying one content item, plus an optional
//! description that overrides the registered one. On the wire prompt
//! arguments are conventionally strings, so their definitions carry no type
//! field; the declared abstract type still drives casting before the
//! handler runs.

use std::fmt;
use std::path::Path;

use serde_json::{json, Map, Value};

use super::content::{insert_opt, ContentItem, EmbeddedResource};
use super::cursor::paginate;
use super::error::{BoxError, ContentError, FeatureError};
use super::registry::{
    Definition, EntryMeta, FeatureKind, FeatureRegistry, ParamSpec, RegistryEntry,
};

/// The speaker of a prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The end user.
    User,
    /// The assistant.
    Assistant,
}

impl Role {
    /// Returns the role as its wire string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One role-tagged message.
#[derive(Debug, Clone)]
pub struct PromptMessage {
    /// Who speaks the message.
    pub role: Role,
    /// The message content.
    pub content: ContentItem,
}

/// What a prompt handler returns: ordered messages plus an optional
/// description override.
#[derive(Debug, Clone)]
pub struct PromptMessages {
    messages: Vec<PromptMessage>,
    default_role: Role,
    description: Option<String>,
}

impl Default for PromptMessages {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptMessages {
    /// Creates an empty message list defaulting to the user role.
    #[must_use]
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            default_role: Role::User,
            description: None,
        }
    }

    /// Changes the role applied by the `add_*` builders.
    #[must_use]
    pub const fn with_default_role(mut self, role: Role) -> Self {
        self.default_role = role;
        self
    }

    /// Overrides the prompt's registered description for this result.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends a message with an explicit role.
    pub fn add_message(&mut self, role: Role, content: ContentItem) {
        self.messages.push(PromptMessage { role, content });
    }

    /// Appends a text message in the default role.
    ///
    /// # Errors
    ///
    /// Fails if the text is empty.
    pub fn add_text(&mut self, text: impl Into<String>) -> Result<(), ContentError> {
        self.add_message(self.default_role, ContentItem::text(text)?);
        Ok(())
    }

    /// Appends an image message in the default role.
    ///
    /// # Errors
    ///
    /// Fails if the blob is empty or not valid base64.
    pub fn add_image(
        &mut self,
        blob: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Result<(), ContentError> {
        self.add_message(self.default_role, ContentItem::image(blob, mime_type)?);
        Ok(())
    }

    /// Appends an audio message in the default role.
    ///
    /// # Errors
    ///
    /// Fails if the blob is empty or not valid base64.
    pub fn add_audio(
        &mut self,
        blob: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Result<(), ContentError> {
        self.add_message(self.default_role, ContentItem::audio(blob, mime_type)?);
        Ok(())
    }

    /// Appends a message by probing a file's content kind.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or matches no kind.
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> Result<(), ContentError> {
        self.add_message(self.default_role, ContentItem::from_file(path)?);
        Ok(())
    }

    /// Appends an embedded-resource message in the default role.
    pub fn add_resource(&mut self, resource: EmbeddedResource) {
        self.add_message(self.default_role, ContentItem::Resource(resource));
    }

    /// Appends a file embedded as a resource block, deriving its `file://`
    /// URI and content kind from the file itself.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or matches no kind.
    pub fn add_file_resource(&mut self, path: impl AsRef<Path>) -> Result<(), ContentError> {
        self.add_resource(EmbeddedResource::from_file(path)?);
        Ok(())
    }

    /// Returns the number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Registration-time description of a prompt.
#[derive(Debug, Clone)]
pub struct PromptSpec {
    /// Prompt name, the registry key.
    pub name: String,
    /// Optional display title.
    pub title: Option<String>,
    /// Optional description.
    pub description: Option<String>,
    /// Declared arguments.
    pub params: Vec<ParamSpec>,
}

impl PromptSpec {
    /// Creates a spec with only a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: None,
            params: Vec::new(),
        }
    }

    /// Sets the display title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends one declared argument.
    #[must_use]
    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    fn into_definition(self) -> Definition {
        let mut definition = Definition::new(self.name).with_params(self.params);
        if let Some(title) = self.title {
            definition = definition.with_title(title);
        }
        if let Some(description) = self.description {
            definition = definition.with_description(description);
        }
        definition
    }
}

/// The prompt registry with its message assembler.
#[derive(Debug)]
pub struct PromptRegistry {
    inner: FeatureRegistry<PromptMessages>,
    page_size: usize,
}

impl PromptRegistry {
    /// Creates an empty registry listing `page_size` prompts per page.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            inner: FeatureRegistry::new(FeatureKind::Prompt),
            page_size,
        }
    }

    /// Registers a prompt.
    pub fn register<F>(&mut self, spec: PromptSpec, handler: F)
    where
        F: Fn(&Map<String, Value>) -> Result<PromptMessages, BoxError> + Send + Sync + 'static,
    {
        self.inner
            .register(spec.into_definition(), EntryMeta::default(), Box::new(handler));
    }

    /// Registers a static single-message prompt from fixed text.
    ///
    /// # Errors
    ///
    /// Fails if the text is empty.
    pub fn register_text(
        &mut self,
        spec: PromptSpec,
        text: impl Into<String>,
    ) -> Result<(), ContentError> {
        let mut messages = PromptMessages::new();
        messages.add_text(text)?;
        self.register(spec, move |_| Ok(messages.clone()));
        Ok(())
    }

    /// Returns the number of registered prompts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns whether no prompts are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Invokes a prompt and renders the `prompts/get` result object.
    ///
    /// # Errors
    ///
    /// Fails if the prompt is unknown, arguments do not validate, the
    /// handler fails, or it produced no messages.
    pub fn get(&self, name: &str, arguments: &Map<String, Value>) -> Result<Value, FeatureError> {
        let (messages, entry) = self.inner.call(name, arguments)?;
        if messages.is_empty() {
            return Err(FeatureError::UnsupportedResult {
                function: name.to_string(),
                reason: "prompt produced no messages".to_string(),
            });
        }

        let rendered: Vec<Value> = messages
            .messages
            .iter()
            .map(|message| {
                json!({
                    "role": message.role.as_str(),
                    "content": message.content.to_block(),
                })
            })
            .collect();
        let mut result = Map::new();
        insert_opt(
            &mut result,
            "description",
            messages
                .description
                .clone()
                .or_else(|| entry.definition.description.clone()),
        );
        result.insert("messages".to_string(), Value::Array(rendered));
        Ok(Value::Object(result))
    }

    /// Lists one page of prompt definitions.
    ///
    /// # Errors
    ///
    /// Fails with [`FeatureError::InvalidCursor`] for a bad cursor.
    pub fn list(&self, cursor: Option<&str>) -> Result<Value, FeatureError> {
        let entries: Vec<&RegistryEntry<PromptMessages>> = self.inner.entries().collect();
        let (page, next) = paginate(&entries, cursor, self.page_size)?;
        let definitions: Vec<Value> = page.iter().map(|entry| definition_value(entry)).collect();
        let mut result = Map::new();
        result.insert("prompts".to_string(), Value::Array(definitions));
        insert_opt(&mut result, "nextCursor", next);
        Ok(Value::Object(result))
    }
}

/// Renders a prompt's wire definition. Arguments carry no type field.
fn definition_value(entry: &RegistryEntry<PromptMessages>) -> Value {
    let arguments: Vec<Value> = entry
        .definition
        .params
        .iter()
        .map(|param| {
            let mut argument = Map::new();
            argument.insert("name".to_string(), Value::from(param.name.clone()));
            insert_opt(&mut argument, "description", param.description.clone());
            argument.insert("required".to_string(), Value::from(param.required));
            Value::Object(argument)
        })
        .collect();

    let mut definition = Map::new();
    definition.insert("name".to_string(), Value::from(entry.definition.key.clone()));
    insert_opt(&mut definition, "title", entry.definition.title.clone());
    insert_opt(
        &mut definition,
        "description",
        entry.definition.description.clone(),
    );
    definition.insert("arguments".to_string(), Value::Array(arguments));
    Value::Object(definition)
}
