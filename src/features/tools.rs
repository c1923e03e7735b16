//! Tool registration, invocation and result assembly.
//!
//! Tools are named invocables with declared parameters. A handler returns a
//! [`ToolOutcome`], a tagged union of structured data, unstructured content,
//! both, or a failed form, and the assembler renders it into the wire result
//! object. Shape dispatch is an exhaustive match on the union; the only
//! runtime check left is that a structured part is a JSON object.

use serde_json::{json, Map, Value};

use super::content::{insert_opt, ContentItem};
use super::cursor::paginate;
use super::error::{BoxError, ContentError, FeatureError};
use super::registry::{
    Definition, EntryMeta, FeatureKind, FeatureRegistry, ParamSpec, RegistryEntry,
};

/// Registration-time description of a tool.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    /// Tool name, the registry key.
    pub name: String,
    /// Optional display title.
    pub title: Option<String>,
    /// Optional description.
    pub description: Option<String>,
    /// Declared parameters.
    pub params: Vec<ParamSpec>,
    /// Optional declared output schema, surfaced in listings.
    pub output_schema: Option<Value>,
    /// Optional annotations, surfaced in listings.
    pub annotations: Option<Value>,
}

impl ToolSpec {
    /// Creates a spec with only a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: None,
            params: Vec::new(),
            output_schema: None,
            annotations: None,
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

    /// Sets the declared output schema.
    #[must_use]
    pub fn with_output_schema(mut self, schema: Value) -> Self {
        self.output_schema = Some(schema);
        self
    }

    /// Sets annotations.
    #[must_use]
    pub fn with_annotations(mut self, annotations: Value) -> Self {
        self.annotations = Some(annotations);
        self
    }

    fn into_parts(self) -> (Definition, EntryMeta) {
        let definition = Definition::new(self.name)
            .with_params(self.params);
        let definition = match self.title {
            Some(title) => definition.with_title(title),
            None => definition,
        };
        let definition = match self.description {
            Some(description) => definition.with_description(description),
            None => definition,
        };
        let meta = EntryMeta {
            output_schema: self.output_schema,
            annotations: self.annotations,
            ..EntryMeta::default()
        };
        (definition, meta)
    }
}

/// What a tool handler returns.
#[derive(Debug, Clone)]
pub enum ToolOutcome {
    /// Structured data only; also rendered into the content list as compact
    /// JSON text.
    Structured(Value),
    /// Unstructured content only.
    Content(Vec<ContentItem>),
    /// Structured data plus explicit content.
    Both {
        /// The structured part; must be a JSON object.
        structured: Value,
        /// The content list rendered alongside it.
        content: Vec<ContentItem>,
    },
    /// A business-level failure, rendered with `isError: true`.
    Failed(Vec<ContentItem>),
}

impl ToolOutcome {
    /// Builds a single-text success outcome.
    ///
    /// # Errors
    ///
    /// Fails if the text is empty.
    pub fn text(text: impl Into<String>) -> Result<Self, ContentError> {
        Ok(Self::Content(vec![ContentItem::text(text)?]))
    }

    /// Builds a single-text failed outcome.
    ///
    /// # Errors
    ///
    /// Fails if the text is empty.
    pub fn error_text(text: impl Into<String>) -> Result<Self, ContentError> {
        Ok(Self::Failed(vec![ContentItem::text(text)?]))
    }
}

/// The tool registry with its result assembler.
#[derive(Debug)]
pub struct ToolRegistry {
    inner: FeatureRegistry<ToolOutcome>,
    page_size: usize,
}

impl ToolRegistry {
    /// Creates an empty registry listing `page_size` tools per page.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            inner: FeatureRegistry::new(FeatureKind::Tool),
            page_size,
        }
    }

    /// Registers a tool.
    pub fn register<F>(&mut self, spec: ToolSpec, handler: F)
    where
        F: Fn(&Map<String, Value>) -> Result<ToolOutcome, BoxError> + Send + Sync + 'static,
    {
        let (definition, meta) = spec.into_parts();
        self.inner.register(definition, meta, Box::new(handler));
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns whether no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Calls a tool and renders its outcome as the wire result object.
    ///
    /// # Errors
    ///
    /// Fails if the tool is unknown, arguments do not validate, the handler
    /// fails, or the outcome cannot be rendered.
    pub fn call(&self, name: &str, arguments: &Map<String, Value>) -> Result<Value, FeatureError> {
        let (outcome, _) = self.inner.call(name, arguments)?;
        render_outcome(name, outcome)
    }

    /// Lists one page of tool definitions.
    ///
    /// # Errors
    ///
    /// Fails with [`FeatureError::InvalidCursor`] for a bad cursor.
    pub fn list(&self, cursor: Option<&str>) -> Result<Value, FeatureError> {
        let entries: Vec<&RegistryEntry<ToolOutcome>> = self.inner.entries().collect();
        let (page, next) = paginate(&entries, cursor, self.page_size)?;
        let definitions: Vec<Value> = page.iter().map(|entry| definition_value(entry)).collect();
        let mut result = Map::new();
        result.insert("tools".to_string(), Value::Array(definitions));
        insert_opt(&mut result, "nextCursor", next);
        Ok(Value::Object(result))
    }
}

/// Renders a tool's wire definition, including the assembled input schema.
fn definition_value(entry: &RegistryEntry<ToolOutcome>) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for param in &entry.definition.params {
        let mut schema = Map::new();
        schema.insert("type".to_string(), Value::from(param.param_type.as_str()));
        insert_opt(&mut schema, "description", param.description.clone());
        properties.insert(param.name.clone(), Value::Object(schema));
        if param.required {
            required.push(Value::from(param.name.clone()));
        }
    }

    let mut definition = Map::new();
    definition.insert("name".to_string(), Value::from(entry.definition.key.clone()));
    insert_opt(&mut definition, "title", entry.definition.title.clone());
    insert_opt(&mut definition, "description", entry.definition.description.clone());
    definition.insert(
        "inputSchema".to_string(),
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        }),
    );
    insert_opt(&mut definition, "outputSchema", entry.meta.output_schema.clone());
    insert_opt(&mut definition, "annotations", entry.meta.annotations.clone());
    Value::Object(definition)
}

/// Renders a [`ToolOutcome`] as the `tools/call` result object.
fn render_outcome(function: &str, outcome: ToolOutcome) -> Result<Value, FeatureError> {
    let (structured, content, is_error) = match outcome {
        ToolOutcome::Structured(value) => (Some(value), None, false),
        ToolOutcome::Content(items) => (None, Some(items), false),
        ToolOutcome::Both {
            structured,
            content,
        } => (Some(structured), Some(content), false),
        ToolOutcome::Failed(items) => (None, Some(items), true),
    };

    if let Some(value) = &structured {
        if !value.is_object() {
            return Err(FeatureError::UnsupportedResult {
                function: function.to_string(),
                reason: "structured result is not a JSON object".to_string(),
            });
        }
    }

    let blocks: Vec<Value> = match content {
        Some(items) => items.iter().map(ContentItem::to_block).collect(),
        // Structured-only results also serialise as compact JSON text, for
        // callers that only read the content list.
        None => {
            let text = structured.as_ref().map(Value::to_string).unwrap_or_default();
            let item = ContentItem::text(text).map_err(|source| FeatureError::Content {
                function: function.to_string(),
                source,
            })?;
            vec![item.to_block()]
        }
    };

    let mut result = Map::new();
    result.insert("content".to_string(), Value::Array(blocks));
    if let Some(value) = structured {
        result.insert("structuredContent".to_string(), value);
    }
    if is_error {
        result.insert("isError".to_string(), Value::from(true));
    }
    Ok(Value::Object(result))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::types::AbstractType;
    use super::*;

    fn echo_registry() -> ToolRegistry {
        let mut tools = ToolRegistry::new(10);
        tools.register(
            ToolSpec::new("echo")
                .with_description("Echo text back")
                .with_param(ParamSpec::required("text", AbstractType::String)),
            |args| {
                let text = args["text"].as_str().unwrap_or_default();
                Ok(ToolOutcome::text(text)?)
            },
        );
        tools
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn echo_returns_text_content() {
        let tools = echo_registry();
        let result = tools.call("echo", &args(json!({"text": "hi"}))).unwrap();
        assert_eq!(result["content"][0]["type"], json!("text"));
        assert_eq!(result["content"][0]["text"], json!("hi"));
        assert!(result.get("isError").is_none());
        assert!(result.get("structuredContent").is_none());
    }

    #[test]
    fn echo_without_text_names_the_parameter() {
        let tools = echo_registry();
        let err = tools.call("echo", &args(json!({}))).unwrap_err();
        assert!(matches!(
            err,
            FeatureError::ParameterNotFound { ref param, .. } if param == "text"
        ));
    }

    #[test]
    fn structured_outcome_renders_both_fields() {
        let mut tools = ToolRegistry::new(10);
        tools.register(ToolSpec::new("stats"), |_| {
            Ok(ToolOutcome::Structured(json!({"count": 3})))
        });
        let result = tools.call("stats", &Map::new()).unwrap();
        assert_eq!(result["structuredContent"], json!({"count": 3}));
        assert_eq!(result["content"][0]["text"], json!("{\"count\":3}"));
    }

    #[test]
    fn non_object_structured_is_unsupported() {
        let mut tools = ToolRegistry::new(10);
        tools.register(ToolSpec::new("bad"), |_| {
            Ok(ToolOutcome::Structured(json!(42)))
        });
        let err = tools.call("bad", &Map::new()).unwrap_err();
        assert!(matches!(err, FeatureError::UnsupportedResult { .. }));
    }

    #[test]
    fn failed_outcome_sets_is_error() {
        let mut tools = ToolRegistry::new(10);
        tools.register(ToolSpec::new("fails"), |_| {
            Ok(ToolOutcome::error_text("no such post")?)
        });
        let result = tools.call("fails", &Map::new()).unwrap();
        assert_eq!(result["isError"], json!(true));
        assert_eq!(result["content"][0]["text"], json!("no such post"));
    }

    #[test]
    fn handler_error_is_wrapped() {
        let mut tools = ToolRegistry::new(10);
        tools.register(ToolSpec::new("broken"), |_| {
            Err("backing store offline".into())
        });
        let err = tools.call("broken", &Map::new()).unwrap_err();
        assert!(matches!(err, FeatureError::Call { .. }));
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn definition_includes_schema_and_required() {
        let mut tools = ToolRegistry::new(10);
        tools.register(
            ToolSpec::new("create_post")
                .with_title("Create post")
                .with_param(
                    ParamSpec::required("title", AbstractType::String).describe("Post title"),
                )
                .with_param(ParamSpec::optional("draft", AbstractType::Boolean)),
            |_| Ok(ToolOutcome::Structured(json!({}))),
        );
        let listing = tools.list(None).unwrap();
        let def = &listing["tools"][0];
        assert_eq!(def["name"], json!("create_post"));
        assert_eq!(def["title"], json!("Create post"));
        assert_eq!(def["inputSchema"]["type"], json!("object"));
        assert_eq!(
            def["inputSchema"]["properties"]["title"]["type"],
            json!("string")
        );
        assert_eq!(
            def["inputSchema"]["properties"]["title"]["description"],
            json!("Post title")
        );
        assert_eq!(
            def["inputSchema"]["properties"]["draft"]["type"],
            json!("boolean")
        );
        assert_eq!(def["inputSchema"]["required"], json!(["title"]));
    }

    #[test]
    fn listing_pages_cover_all_tools() {
        let mut tools = ToolRegistry::new(2);
        for i in 0..5 {
            tools.register(ToolSpec::new(format!("tool_{i}")), |_| {
                Ok(ToolOutcome::Structured(json!({})))
            });
        }

        let mut names = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0;
        loop {
            let listing = tools.list(cursor.as_deref()).unwrap();
            pages += 1;
            for def in listing["tools"].as_array().unwrap() {
                names.push(def["name"].as_str().unwrap().to_string());
            }
            match listing.get("nextCursor").and_then(Value::as_str) {
                Some(next) => cursor = Some(next.to_string()),
                None => break,
            }
        }

        assert_eq!(pages, 3);
        assert_eq!(names, vec!["tool_0", "tool_1", "tool_2", "tool_3", "tool_4"]);
    }
}
