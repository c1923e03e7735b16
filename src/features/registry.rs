//! Generic feature registry shared by tools, resources and prompts.
//!
//! A registry maps string keys to entries in insertion order. Each entry
//! pairs a [`Definition`] (key, naming, declared parameters) with metadata
//! and a boxed handler. Calling through the registry validates and casts the
//! caller's arguments against the declared [`ParamSpec`]s before the handler
//! runs, so handlers only ever see arguments of the declared types.

use std::fmt;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::error::{BoxError, FeatureError};
use super::types::{cast, AbstractType};

/// Which feature kind a registry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    /// Callable functions with structured arguments.
    Tool,
    /// Addressable content identified by URI.
    Resource,
    /// Message-sequence templates.
    Prompt,
}

impl FeatureKind {
    /// Returns the kind as a lowercase noun.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tool => "tool",
            Self::Resource => "resource",
            Self::Prompt => "prompt",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared parameter: name, abstract type, required flag and an optional
/// description for schema assembly.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    /// Parameter name as it appears in caller arguments.
    pub name: String,
    /// Type incoming values are cast to.
    pub param_type: AbstractType,
    /// Whether the caller must supply this parameter.
    pub required: bool,
    /// Optional human-readable description.
    pub description: Option<String>,
}

impl ParamSpec {
    /// Declares a required parameter.
    #[must_use]
    pub fn required(name: impl Into<String>, param_type: AbstractType) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: true,
            description: None,
        }
    }

    /// Declares an optional parameter.
    #[must_use]
    pub fn optional(name: impl Into<String>, param_type: AbstractType) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: false,
            description: None,
        }
    }

    /// Attaches a description.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// The caller-facing identity of a registered feature.
#[derive(Debug, Clone)]
pub struct Definition {
    /// Registry key: tool name, resource URI or prompt name.
    pub key: String,
    /// Optional display title.
    pub title: Option<String>,
    /// Optional description.
    pub description: Option<String>,
    /// Declared parameters, in declaration order.
    pub params: Vec<ParamSpec>,
}

impl Definition {
    /// Creates a definition with no title, description or parameters.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
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

    /// Appends one declared parameter.
    #[must_use]
    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Replaces the declared parameters wholesale.
    #[must_use]
    pub fn with_params(mut self, params: Vec<ParamSpec>) -> Self {
        self.params = params;
        self
    }

    /// Counts the required parameters.
    #[must_use]
    pub fn required_count(&self) -> usize {
        self.params.iter().filter(|p| p.required).count()
    }
}

/// Kind-specific metadata attached to an entry outside its definition.
#[derive(Debug, Clone, Default)]
pub struct EntryMeta {
    /// Programmatic name, for resources (whose key is the URI).
    pub name: Option<String>,
    /// Mime type, for resources.
    pub mime_type: Option<String>,
    /// Payload size in bytes, for file-backed resources.
    pub size: Option<u64>,
    /// Free-form annotations surfaced in listings.
    pub annotations: Option<Value>,
    /// Declared output schema, for tools.
    pub output_schema: Option<Value>,
}

/// A boxed feature handler. Receives arguments already validated and cast
/// against the entry's declared parameters.
pub type Invocable<R> = Box<dyn Fn(&Map<String, Value>) -> Result<R, BoxError> + Send + Sync>;

/// One registered feature: definition, metadata and handler.
pub struct RegistryEntry<R> {
    /// Caller-facing identity.
    pub definition: Definition,
    /// Kind-specific metadata.
    pub meta: EntryMeta,
    handler: Invocable<R>,
}

impl<R> fmt::Debug for RegistryEntry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("definition", &self.definition)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

/// An insertion-ordered registry of features of one kind.
pub struct FeatureRegistry<R> {
    kind: FeatureKind,
    entries: IndexMap<String, RegistryEntry<R>>,
}

impl<R> fmt::Debug for FeatureRegistry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureRegistry")
            .field("kind", &self.kind)
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<R> FeatureRegistry<R> {
    /// Creates an empty registry of the given kind.
    #[must_use]
    pub fn new(kind: FeatureKind) -> Self {
        Self {
            kind,
            entries: IndexMap::new(),
        }
    }

    /// Returns the kind this registry holds.
    #[must_use]
    pub const fn kind(&self) -> FeatureKind {
        self.kind
    }

    /// Registers an entry under its definition key.
    ///
    /// Re-registering an existing key replaces the entry in place; the
    /// key keeps its original listing position.
    pub fn register(&mut self, definition: Definition, meta: EntryMeta, handler: Invocable<R>) {
        let key = definition.key.clone();
        self.entries.insert(
            key,
            RegistryEntry {
                definition,
                meta,
                handler,
            },
        );
    }

    /// Looks up an entry by key.
    ///
    /// # Errors
    ///
    /// Fails with [`FeatureError::FunctionNotFound`] for an unknown key.
    pub fn get(&self, key: &str) -> Result<&RegistryEntry<R>, FeatureError> {
        self.entries
            .get(key)
            .ok_or_else(|| FeatureError::FunctionNotFound {
                kind: self.kind,
                key: key.to_string(),
            })
    }

    /// Iterates keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterates entries in registration order.
    pub fn entries(&self) -> impl Iterator<Item = &RegistryEntry<R>> {
        self.entries.values()
    }

    /// Returns the number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validates and casts arguments, then invokes the entry's handler.
    ///
    /// Returns the handler result together with the entry, so callers can
    /// render the result against the entry's definition and metadata.
    ///
    /// # Errors
    ///
    /// Fails if the key is unknown, a required parameter is missing, a
    /// supplied parameter does not cast to its declared type, or the
    /// handler itself fails.
    pub fn call(
        &self,
        key: &str,
        arguments: &Map<String, Value>,
    ) -> Result<(R, &RegistryEntry<R>), FeatureError> {
        let entry = self.get(key)?;
        let cast_args = validate_arguments(&entry.definition, arguments)?;
        let result = (entry.handler)(&cast_args).map_err(|source| FeatureError::Call {
            function: key.to_string(),
            source,
        })?;
        Ok((result, entry))
    }
}

/// Checks supplied arguments against declared parameters and casts each
/// present value to its declared type.
///
/// Required parameters must be present. Optional parameters pass through
/// only when supplied. Arguments with no matching declaration are dropped,
/// so handlers never see names they did not declare.
///
/// # Errors
///
/// Fails with [`FeatureError::ParameterNotFound`] for a missing required
/// parameter or [`FeatureError::ParameterCast`] for an uncastable value.
pub fn validate_arguments(
    definition: &Definition,
    arguments: &Map<String, Value>,
) -> Result<Map<String, Value>, FeatureError> {
    let mut cast_args = Map::new();
    for param in &definition.params {
        match arguments.get(&param.name) {
            Some(value) => {
                let cast_value =
                    cast(value, param.param_type).map_err(|source| FeatureError::ParameterCast {
                        function: definition.key.clone(),
                        param: param.name.clone(),
                        source,
                    })?;
                cast_args.insert(param.name.clone(), cast_value);
            }
            None if param.required => {
                return Err(FeatureError::ParameterNotFound {
                    function: definition.key.clone(),
                    param: param.name.clone(),
                });
            }
            None => {}
        }
    }
    Ok(cast_args)
}
