//! Resource registration, URI resolution and read-result assembly.
//!
//! Resources are keyed by URI. A key may be concrete (`site://posts`), a
//! prefix (`posts/`) or a template with `{name}` placeholders
//! (`post://{permalink}`). Resolution tries an exact key first, then the
//! registered key with the longest *matchable prefix* (the text before the
//! first placeholder) and binds the remaining `/`-separated segments
//! positionally to the entry's declared parameters.
//!
//! Entries with at least one required parameter are advertised as templates
//! under `resources/templates/list`; the rest list as concrete resources.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::content::{
    detect_from_file, insert_opt, BinaryContent, DetectedContent, EmbeddedResource, TextContent,
};
use super::cursor::paginate;
use super::error::{BoxError, ContentError, FeatureError, RegistrationError};
use super::registry::{
    Definition, EntryMeta, FeatureKind, FeatureRegistry, ParamSpec, RegistryEntry,
};

/// Registration-time description of a resource.
#[derive(Debug, Clone)]
pub struct ResourceSpec {
    /// Resource URI, the registry key; may contain `{name}` placeholders.
    pub uri: String,
    /// Optional programmatic name.
    pub name: Option<String>,
    /// Optional display title.
    pub title: Option<String>,
    /// Optional description.
    pub description: Option<String>,
    /// Optional declared mime type.
    pub mime_type: Option<String>,
    /// Optional payload size in bytes.
    pub size: Option<u64>,
    /// Optional annotations, surfaced in listings.
    pub annotations: Option<Value>,
    /// Declared parameters, bound from trailing URI segments.
    pub params: Vec<ParamSpec>,
}

impl ResourceSpec {
    /// Creates a spec with only a URI.
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: None,
            title: None,
            description: None,
            mime_type: None,
            size: None,
            annotations: None,
            params: Vec::new(),
        }
    }

    /// Sets the programmatic name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
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

    /// Sets the declared mime type.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Sets the payload size.
    #[must_use]
    pub const fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets annotations.
    #[must_use]
    pub fn with_annotations(mut self, annotations: Value) -> Self {
        self.annotations = Some(annotations);
        self
    }

    /// Appends one declared parameter.
    #[must_use]
    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    fn into_parts(self) -> (Definition, EntryMeta) {
        let mut definition = Definition::new(self.uri).with_params(self.params);
        if let Some(title) = self.title {
            definition = definition.with_title(title);
        }
        if let Some(description) = self.description {
            definition = definition.with_description(description);
        }
        let meta = EntryMeta {
            name: self.name,
            mime_type: self.mime_type,
            size: self.size,
            annotations: self.annotations,
            output_schema: None,
        };
        (definition, meta)
    }
}

/// One item of resource content, text or binary.
#[derive(Debug, Clone)]
pub enum ResourceItem {
    /// UTF-8 text.
    Text(TextContent),
    /// Base64 blob.
    Binary(BinaryContent),
}

impl From<DetectedContent> for ResourceItem {
    fn from(detected: DetectedContent) -> Self {
        match detected {
            DetectedContent::Text(text) => Self::Text(text),
            DetectedContent::Image(binary) | DetectedContent::Audio(binary) => Self::Binary(binary),
        }
    }
}

/// What a resource handler returns: an ordered list of content items.
#[derive(Debug, Clone, Default)]
pub struct ResourceContents {
    items: Vec<ResourceItem>,
}

impl ResourceContents {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a single-text-item list.
    ///
    /// # Errors
    ///
    /// Fails if the text is empty.
    pub fn text(text: impl Into<String>) -> Result<Self, ContentError> {
        let mut contents = Self::new();
        contents.add_text(text)?;
        Ok(contents)
    }

    /// Appends a text item.
    ///
    /// # Errors
    ///
    /// Fails if the text is empty.
    pub fn add_text(&mut self, text: impl Into<String>) -> Result<(), ContentError> {
        self.items.push(ResourceItem::Text(TextContent::new(text)?));
        Ok(())
    }

    /// Appends a binary item.
    ///
    /// # Errors
    ///
    /// Fails if the blob is empty or not valid base64.
    pub fn add_binary(
        &mut self,
        blob: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Result<(), ContentError> {
        self.items
            .push(ResourceItem::Binary(BinaryContent::new(blob, mime_type)?));
        Ok(())
    }

    /// Appends an item by probing a file's content kind.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or matches no kind.
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> Result<(), ContentError> {
        self.items.push(detect_from_file(path.as_ref())?.into());
        Ok(())
    }

    /// Appends an already-built item.
    pub fn add_item(&mut self, item: ResourceItem) {
        self.items.push(item);
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The outcome of resolving a requested URI against the registered keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUri {
    /// The registered key that matched.
    pub key: String,
    /// Trailing URI segments left after stripping the matched prefix.
    pub trailing: Vec<String>,
}

/// The resource registry with its resolver and result assembler.
#[derive(Debug)]
pub struct ResourceRegistry {
    inner: FeatureRegistry<ResourceContents>,
    page_size: usize,
}

impl ResourceRegistry {
    /// Creates an empty registry listing `page_size` resources per page.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            inner: FeatureRegistry::new(FeatureKind::Resource),
            page_size,
        }
    }

    /// Registers a resource backed by a handler.
    ///
    /// For template URIs the placeholder count must equal the number of
    /// required parameters, checked here rather than at read time.
    ///
    /// # Errors
    ///
    /// Fails with [`RegistrationError::TemplateArity`] on a mismatch.
    pub fn register_handler<F>(
        &mut self,
        spec: ResourceSpec,
        handler: F,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&Map<String, Value>) -> Result<ResourceContents, BoxError> + Send + Sync + 'static,
    {
        let placeholders = placeholder_count(&spec.uri);
        let required = spec.params.iter().filter(|p| p.required).count();
        if placeholders > 0 && placeholders != required {
            return Err(RegistrationError::TemplateArity {
                uri: spec.uri,
                placeholders,
                required,
            });
        }
        let (definition, meta) = spec.into_parts();
        self.inner.register(definition, meta, Box::new(handler));
        Ok(())
    }

    /// Registers a resource with preloaded contents.
    ///
    /// # Errors
    ///
    /// Fails with [`RegistrationError::TemplateArity`] if the URI carries
    /// placeholders (preloaded contents take no parameters).
    pub fn register(
        &mut self,
        spec: ResourceSpec,
        contents: ResourceContents,
    ) -> Result<(), RegistrationError> {
        self.register_handler(spec, move |_| Ok(contents.clone()))
    }

    /// Registers a file as a resource under a `file://` URI, probing its
    /// content kind and recording mime type and size metadata.
    ///
    /// Returns the registered URI.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or matches no content kind.
    pub fn register_file(
        &mut self,
        path: impl AsRef<Path>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<String, RegistrationError> {
        let path = path.as_ref();
        let detected = detect_from_file(path)?;
        let size = std::fs::metadata(path)
            .map_err(|source| ContentError::FileRead {
                path: path.to_path_buf(),
                source,
            })?
            .len();

        let uri = format!("file://{}", path.display());
        let mut spec = ResourceSpec::new(&uri)
            .with_title(title)
            .with_description(description)
            .with_size(size);
        if let Some(name) = path.file_stem().and_then(|s| s.to_str()) {
            spec = spec.with_name(name);
        }
        if let Some(mime) = detected.mime_type() {
            spec = spec.with_mime_type(mime);
        }

        let mut contents = ResourceContents::new();
        contents.add_item(detected.into());
        self.register(spec, contents)?;
        Ok(uri)
    }

    /// Returns the number of registered resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns whether no resources are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Resolves a requested URI to a registered key plus trailing segments.
    ///
    /// An exact key match wins outright. Otherwise the key with the longest
    /// matchable prefix of the request wins; ties keep the earliest
    /// registration. The remainder, stripped of surrounding `/`, splits on
    /// `/` into trailing segments.
    ///
    /// # Errors
    ///
    /// Fails with [`FeatureError::FunctionNotFound`] when nothing matches.
    pub fn resolve(&self, uri: &str) -> Result<ResolvedUri, FeatureError> {
        if self.inner.get(uri).is_ok() {
            return Ok(ResolvedUri {
                key: uri.to_string(),
                trailing: Vec::new(),
            });
        }

        let mut best: Option<(&str, usize)> = None;
        for key in self.inner.keys() {
            let prefix = matchable_prefix(key);
            if !uri.starts_with(prefix) {
                continue;
            }
            if best.map_or(true, |(_, len)| prefix.len() > len) {
                best = Some((key, prefix.len()));
            }
        }

        let Some((key, prefix_len)) = best else {
            return Err(FeatureError::FunctionNotFound {
                kind: FeatureKind::Resource,
                key: uri.to_string(),
            });
        };

        let remainder = uri[prefix_len..].trim_matches('/');
        let trailing = if remainder.is_empty() {
            Vec::new()
        } else {
            remainder.split('/').map(str::to_string).collect()
        };
        Ok(ResolvedUri {
            key: key.to_string(),
            trailing,
        })
    }

    /// Reads a resource and renders the `resources/read` result object.
    ///
    /// # Errors
    ///
    /// Fails if the URI resolves to nothing, trailing segments do not bind
    /// to the declared parameters, or the handler fails.
    pub fn read(&self, uri: &str) -> Result<Value, FeatureError> {
        let resolved = self.resolve(uri)?;
        let entry = self.inner.get(&resolved.key)?;
        let arguments = bind_trailing(&entry.definition, uri, &resolved.trailing)?;
        let (contents, entry) = self.inner.call(&resolved.key, &arguments)?;

        let items: Vec<Value> = contents
            .items
            .iter()
            .map(|item| item_value(item, entry, uri))
            .collect();
        let mut result = Map::new();
        result.insert("contents".to_string(), Value::Array(items));
        Ok(Value::Object(result))
    }

    /// Reads a resource and returns its first item as an embedded resource,
    /// for inclusion in tool and prompt content.
    ///
    /// # Errors
    ///
    /// Fails like [`ResourceRegistry::read`], or with
    /// [`FeatureError::UnsupportedResult`] when the resource produced no
    /// content items.
    pub fn embedded(&self, uri: &str) -> Result<EmbeddedResource, FeatureError> {
        let resolved = self.resolve(uri)?;
        let entry = self.inner.get(&resolved.key)?;
        let arguments = bind_trailing(&entry.definition, uri, &resolved.trailing)?;
        let (contents, entry) = self.inner.call(&resolved.key, &arguments)?;

        let Some(item) = contents.items.into_iter().next() else {
            return Err(FeatureError::UnsupportedResult {
                function: resolved.key,
                reason: "resource produced no content items".to_string(),
            });
        };

        let wrap = |source| FeatureError::Content {
            function: resolved.key.clone(),
            source,
        };
        let resource = match item {
            ResourceItem::Text(text) => {
                let mime = text
                    .mime_type
                    .or_else(|| entry.meta.mime_type.clone())
                    .unwrap_or_else(|| "text/plain".to_string());
                let item_uri = text.uri.unwrap_or_else(|| uri.to_string());
                EmbeddedResource::text(item_uri, text.text, mime).map_err(wrap)?
            }
            ResourceItem::Binary(binary) => {
                let item_uri = binary.uri.clone().unwrap_or_else(|| uri.to_string());
                EmbeddedResource::blob(item_uri, binary.blob, binary.mime_type).map_err(wrap)?
            }
        };

        let resource = match entry.meta.name.clone() {
            Some(name) => resource.with_name(name),
            None => resource,
        };
        let resource = match entry.definition.title.clone() {
            Some(title) => resource.with_title(title),
            None => resource,
        };
        Ok(resource)
    }

    /// Lists one page of concrete resource definitions.
    ///
    /// # Errors
    ///
    /// Fails with [`FeatureError::InvalidCursor`] for a bad cursor.
    pub fn list(&self, cursor: Option<&str>) -> Result<Value, FeatureError> {
        self.list_filtered("resources", false, cursor)
    }

    /// Lists one page of template resource definitions.
    ///
    /// # Errors
    ///
    /// Fails with [`FeatureError::InvalidCursor`] for a bad cursor.
    pub fn list_templates(&self, cursor: Option<&str>) -> Result<Value, FeatureError> {
        self.list_filtered("resourceTemplates", true, cursor)
    }

    fn list_filtered(
        &self,
        field: &str,
        templates: bool,
        cursor: Option<&str>,
    ) -> Result<Value, FeatureError> {
        let entries: Vec<&RegistryEntry<ResourceContents>> = self
            .inner
            .entries()
            .filter(|entry| is_template(entry) == templates)
            .collect();
        let (page, next) = paginate(&entries, cursor, self.page_size)?;
        let definitions: Vec<Value> = page
            .iter()
            .map(|entry| definition_value(entry, templates))
            .collect();
        let mut result = Map::new();
        result.insert(field.to_string(), Value::Array(definitions));
        insert_opt(&mut result, "nextCursor", next);
        Ok(Value::Object(result))
    }
}

/// An entry is a template when it demands at least one parameter.
fn is_template(entry: &RegistryEntry<ResourceContents>) -> bool {
    entry.definition.required_count() > 0
}

/// The text before the first `{name}` placeholder, or the whole key.
fn matchable_prefix(key: &str) -> &str {
    match key.find('{') {
        Some(index) => &key[..index],
        None => key,
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{(\w+)\}").expect("placeholder pattern is valid"))
}

fn placeholder_count(uri: &str) -> usize {
    placeholder_pattern().find_iter(uri).count()
}

/// Binds trailing URI segments positionally to declared parameters.
///
/// Segments arrive as strings; the registry's argument validation casts
/// them to the declared types. Missing required parameters surface there.
///
/// # Errors
///
/// Fails with [`FeatureError::SurplusPathParameters`] when more segments
/// arrive than parameters are declared.
fn bind_trailing(
    definition: &Definition,
    uri: &str,
    trailing: &[String],
) -> Result<Map<String, Value>, FeatureError> {
    if trailing.len() > definition.params.len() {
        return Err(FeatureError::SurplusPathParameters {
            uri: uri.to_string(),
            expected: definition.params.len(),
            got: trailing.len(),
        });
    }
    let mut arguments = Map::new();
    for (param, segment) in definition.params.iter().zip(trailing) {
        arguments.insert(param.name.clone(), Value::from(segment.clone()));
    }
    Ok(arguments)
}

/// Renders one content item in `contents` position, defaulting unset fields
/// from the owning entry.
fn item_value(
    item: &ResourceItem,
    entry: &RegistryEntry<ResourceContents>,
    requested_uri: &str,
) -> Value {
    let mut rendered = Map::new();
    match item {
        ResourceItem::Text(text) => {
            rendered.insert(
                "uri".to_string(),
                Value::from(text.uri.clone().unwrap_or_else(|| requested_uri.to_string())),
            );
            rendered.insert("text".to_string(), Value::from(text.text.clone()));
            insert_opt(
                &mut rendered,
                "name",
                text.name.clone().or_else(|| entry.meta.name.clone()),
            );
            insert_opt(
                &mut rendered,
                "title",
                text.title.clone().or_else(|| entry.definition.title.clone()),
            );
            insert_opt(
                &mut rendered,
                "mimeType",
                text.mime_type.clone().or_else(|| entry.meta.mime_type.clone()),
            );
            insert_opt(
                &mut rendered,
                "annotations",
                text.annotations
                    .clone()
                    .or_else(|| entry.meta.annotations.clone()),
            );
        }
        ResourceItem::Binary(binary) => {
            rendered.insert(
                "uri".to_string(),
                Value::from(
                    binary
                        .uri
                        .clone()
                        .unwrap_or_else(|| requested_uri.to_string()),
                ),
            );
            rendered.insert("blob".to_string(), Value::from(binary.blob.clone()));
            rendered.insert(
                "mimeType".to_string(),
                Value::from(binary.mime_type.clone()),
            );
            insert_opt(
                &mut rendered,
                "name",
                binary.name.clone().or_else(|| entry.meta.name.clone()),
            );
            insert_opt(
                &mut rendered,
                "title",
                binary
                    .title
                    .clone()
                    .or_else(|| entry.definition.title.clone()),
            );
            insert_opt(
                &mut rendered,
                "annotations",
                binary
                    .annotations
                    .clone()
                    .or_else(|| entry.meta.annotations.clone()),
            );
        }
    }
    Value::Object(rendered)
}

/// Renders a resource's wire definition, keyed `uri` or `uriTemplate`.
fn definition_value(entry: &RegistryEntry<ResourceContents>, template: bool) -> Value {
    let field = if template { "uriTemplate" } else { "uri" };
    let mut definition = Map::new();
    definition.insert(field.to_string(), Value::from(entry.definition.key.clone()));
    insert_opt(&mut definition, "name", entry.meta.name.clone());
    insert_opt(&mut definition, "title", entry.definition.title.clone());
    insert_opt(
        &mut definition,
        "description",
        entry.definition.description.clone(),
    );
    insert_opt(&mut definition, "mimeType", entry.meta.mime_type.clone());
    insert_opt(&mut definition, "size", entry.meta.size);
    insert_opt(&mut definition, "annotations", entry.meta.annotations.clone());
    Value::Object(definition)
}
