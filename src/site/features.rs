//! Registration of the site's tools, resources and prompts.
//!
//! Everything the server exposes over the wire is registered here at boot:
//! six post-management tools, the posts listing and per-post resources, an
//! optional directory of static assets, and three authoring prompts. Domain
//! failures (a missing post, a duplicate permalink) surface as tool results
//! with `isError`; only infrastructure failures become protocol errors.

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::features::{
    AbstractType, BoxError, ContentError, EmbeddedResource, McpRegistry, ParamSpec,
    PromptMessages, PromptSpec, RegistrationError, ResourceContents, ResourceSpec, ToolOutcome,
    ToolSpec,
};
use crate::site::store::{Post, SiteStore, StoreError};

/// House writing style, served as a static prompt.
const STYLE_GUIDE: &str = "Voice and style for this site:\n\
    - Use sentence case for headings.\n\
    - Keep paragraphs under four sentences.\n\
    - Prefer concrete examples over abstract claims.\n\
    - Link generously rather than burying references in prose.\n\
    - Read the draft aloud once before publishing.";

/// Base styles for rendered pages, served as a preloaded resource.
const SITE_STYLESHEET: &str = "body {\n  max-width: 42rem;\n  margin: 2rem auto;\n  \
    font-family: Georgia, serif;\n  line-height: 1.6;\n}\n\na {\n  color: #2a6f97;\n}\n";

/// Client-side date formatting, served as a preloaded resource.
const SITE_SCRIPT: &str = "for (const node of document.querySelectorAll(\"time[datetime]\")) {\n  \
    node.textContent = new Date(node.dateTime).toLocaleDateString();\n}\n";

/// Registers every site feature on the given registry.
///
/// `assets_dir`, when set, is scanned non-recursively; each supported file
/// registers as a `file://` resource and unsupported files are skipped.
///
/// # Errors
///
/// Fails if a registration is malformed or the assets directory cannot be
/// read.
pub fn register_features(
    registry: &mut McpRegistry,
    store: &Arc<SiteStore>,
    assets_dir: Option<&Path>,
) -> Result<(), RegistrationError> {
    register_tools(registry, store);
    register_resources(registry, store)?;
    register_prompts(registry, store)?;
    if let Some(dir) = assets_dir {
        register_assets(registry, dir)?;
    }
    info!(
        tools = registry.tools.len(),
        resources = registry.resources.len(),
        prompts = registry.prompts.len(),
        "Site features registered"
    );
    Ok(())
}

fn register_tools(registry: &mut McpRegistry, store: &Arc<SiteStore>) {
    let posts = Arc::clone(store);
    registry.register_tool(
        ToolSpec::new("create_post")
            .with_title("Create post")
            .with_description("Create a new post under a unique permalink")
            .with_param(
                ParamSpec::required("permalink", AbstractType::String)
                    .describe("URL-safe identifier, no '/'"),
            )
            .with_param(ParamSpec::required("title", AbstractType::String).describe("Post title"))
            .with_param(ParamSpec::required("body", AbstractType::String).describe("Markdown body"))
            .with_param(
                ParamSpec::optional("published", AbstractType::Boolean)
                    .describe("Publish immediately (default false)"),
            )
            .with_output_schema(post_schema()),
        move |args| {
            let published = args.get("published").and_then(Value::as_bool).unwrap_or(false);
            outcome_from(posts.create(
                str_arg(args, "permalink"),
                str_arg(args, "title"),
                str_arg(args, "body"),
                published,
            ))
        },
    );

    let posts = Arc::clone(store);
    registry.register_tool(
        ToolSpec::new("get_post")
            .with_title("Get post")
            .with_description("Fetch one post by permalink")
            .with_param(
                ParamSpec::required("permalink", AbstractType::String).describe("Post permalink"),
            )
            .with_output_schema(post_schema())
            .with_annotations(json!({"readOnlyHint": true})),
        move |args| outcome_from(posts.get(str_arg(args, "permalink"))),
    );

    let posts = Arc::clone(store);
    registry.register_tool(
        ToolSpec::new("update_post")
            .with_title("Update post")
            .with_description("Change a post's title and/or body")
            .with_param(
                ParamSpec::required("permalink", AbstractType::String).describe("Post permalink"),
            )
            .with_param(ParamSpec::optional("title", AbstractType::String).describe("New title"))
            .with_param(ParamSpec::optional("body", AbstractType::String).describe("New body"))
            .with_output_schema(post_schema()),
        move |args| {
            outcome_from(posts.update(
                str_arg(args, "permalink"),
                opt_str_arg(args, "title"),
                opt_str_arg(args, "body"),
            ))
        },
    );

    let posts = Arc::clone(store);
    registry.register_tool(
        ToolSpec::new("delete_post")
            .with_title("Delete post")
            .with_description("Delete a post permanently")
            .with_param(
                ParamSpec::required("permalink", AbstractType::String).describe("Post permalink"),
            )
            .with_annotations(json!({"destructiveHint": true})),
        move |args| match posts.delete(str_arg(args, "permalink")) {
            Ok(post) => Ok(ToolOutcome::text(format!(
                "Deleted post '{}'",
                post.permalink
            ))?),
            Err(err @ StoreError::Poisoned) => Err(err.into()),
            Err(err) => Ok(ToolOutcome::error_text(err.to_string())?),
        },
    );

    let posts = Arc::clone(store);
    registry.register_tool(
        ToolSpec::new("list_posts")
            .with_title("List posts")
            .with_description("List post summaries in creation order")
            .with_param(
                ParamSpec::optional("published", AbstractType::Boolean)
                    .describe("Only posts with this published state"),
            )
            .with_output_schema(listing_schema())
            .with_annotations(json!({"readOnlyHint": true})),
        move |args| {
            let filter = args.get("published").and_then(Value::as_bool);
            let posts = posts.list(filter)?;
            let summaries: Vec<Value> = posts.iter().map(Post::summary_value).collect();
            Ok(ToolOutcome::Structured(json!({
                "posts": summaries,
                "count": posts.len(),
            })))
        },
    );

    let posts = Arc::clone(store);
    registry.register_tool(
        ToolSpec::new("publish_post")
            .with_title("Publish post")
            .with_description("Set a post's published state")
            .with_param(
                ParamSpec::required("permalink", AbstractType::String).describe("Post permalink"),
            )
            .with_param(
                ParamSpec::optional("published", AbstractType::Boolean)
                    .describe("Target state (default true)"),
            )
            .with_output_schema(post_schema()),
        move |args| {
            let published = args.get("published").and_then(Value::as_bool).unwrap_or(true);
            outcome_from(posts.publish(str_arg(args, "permalink"), published))
        },
    );
}

fn register_resources(
    registry: &mut McpRegistry,
    store: &Arc<SiteStore>,
) -> Result<(), RegistrationError> {
    let posts = Arc::clone(store);
    registry.register_resource_handler(
        ResourceSpec::new("site://posts")
            .with_name("posts")
            .with_title("All posts")
            .with_description("Summaries of every post, drafts included")
            .with_mime_type("application/json"),
        move |_| {
            let posts = posts.list(None)?;
            let summaries: Vec<Value> = posts.iter().map(Post::summary_value).collect();
            Ok(ResourceContents::text(Value::Array(summaries).to_string())?)
        },
    )?;

    let posts = Arc::clone(store);
    registry.register_resource_handler(
        ResourceSpec::new("post://{permalink}")
            .with_name("post")
            .with_title("Post by permalink")
            .with_description("One post rendered as markdown")
            .with_mime_type("text/markdown")
            .with_param(
                ParamSpec::required("permalink", AbstractType::String).describe("Post permalink"),
            ),
        move |args| {
            let permalink = str_arg(args, "permalink");
            match posts.get(permalink) {
                Ok(post) => Ok(ResourceContents::text(post.to_markdown())?),
                Err(StoreError::PostNotFound { permalink }) => {
                    Err(ContentError::ResourceNotFound {
                        uri: format!("post://{permalink}"),
                    }
                    .into())
                }
                Err(err) => Err(err.into()),
            }
        },
    )?;

    registry.register_resource(
        ResourceSpec::new("site://assets/style.css")
            .with_name("style.css")
            .with_title("Site stylesheet")
            .with_description("Base styles for rendered pages")
            .with_mime_type("text/css"),
        ResourceContents::text(SITE_STYLESHEET)?,
    )?;

    registry.register_resource(
        ResourceSpec::new("site://assets/script.js")
            .with_name("script.js")
            .with_title("Site script")
            .with_description("Client-side date formatting")
            .with_mime_type("text/javascript"),
        ResourceContents::text(SITE_SCRIPT)?,
    )?;

    Ok(())
}

fn register_prompts(
    registry: &mut McpRegistry,
    store: &Arc<SiteStore>,
) -> Result<(), RegistrationError> {
    registry.register_prompt(
        PromptSpec::new("write_post")
            .with_title("Write a post")
            .with_description("Draft a new post on a topic")
            .with_param(
                ParamSpec::required("topic", AbstractType::String)
                    .describe("What the post is about"),
            )
            .with_param(
                ParamSpec::optional("audience", AbstractType::String)
                    .describe("Who the post is for"),
            ),
        |args| {
            let topic = str_arg(args, "topic");
            let mut instruction = format!("Write a new post about {topic}.");
            if let Some(audience) = opt_str_arg(args, "audience") {
                instruction.push_str(&format!(" Aim it at {audience}."));
            }
            instruction.push_str(" Suggest a short permalink, a title and a markdown body.");
            let mut messages = PromptMessages::new();
            messages.add_text(instruction)?;
            Ok(messages)
        },
    );

    let posts = Arc::clone(store);
    registry.register_prompt(
        PromptSpec::new("summarise_post")
            .with_title("Summarise a post")
            .with_description("Summarise an existing post")
            .with_param(
                ParamSpec::required("permalink", AbstractType::String)
                    .describe("Post to summarise"),
            ),
        move |args| {
            let permalink = str_arg(args, "permalink");
            let post = posts.get(permalink)?;
            let mut messages = PromptMessages::new();
            messages.add_text("Summarise the following post in three sentences or fewer.")?;
            messages.add_resource(
                EmbeddedResource::text(
                    format!("post://{permalink}"),
                    post.to_markdown(),
                    "text/markdown",
                )?
                .with_title(post.title),
            );
            Ok(messages)
        },
    );

    registry.register_text_prompt(
        PromptSpec::new("style_guide")
            .with_title("Site style guide")
            .with_description("House writing style for posts"),
        STYLE_GUIDE,
    )?;

    Ok(())
}

/// Registers each supported file in `dir` as a `file://` resource.
fn register_assets(registry: &mut McpRegistry, dir: &Path) -> Result<(), RegistrationError> {
    let entries = std::fs::read_dir(dir).map_err(|source| ContentError::FileRead {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ContentError::FileRead {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    // Registration order is listing order; keep it stable across platforms.
    paths.sort();

    for path in paths {
        let title = path
            .file_name()
            .and_then(|name| name.to_str())
            .map_or_else(|| path.display().to_string(), str::to_string);
        match registry.register_file_resource(&path, title, "Static site asset") {
            Ok(uri) => info!(uri = %uri, "Registered site asset"),
            Err(RegistrationError::Content(ContentError::UnsupportedFile { path })) => {
                debug!(path = %path.display(), "Skipping unsupported asset");
            }
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

/// Maps a store result to a tool outcome: success becomes structured data,
/// domain failures become `isError` results, a poisoned lock propagates.
fn outcome_from(result: Result<Post, StoreError>) -> Result<ToolOutcome, BoxError> {
    match result {
        Ok(post) => Ok(ToolOutcome::Structured(post.to_value())),
        Err(err @ StoreError::Poisoned) => Err(err.into()),
        Err(err) => Ok(ToolOutcome::error_text(err.to_string())?),
    }
}

// Required parameters are validated and cast before a handler runs, so the
// empty-string fallback is unreachable in practice.
fn str_arg<'a>(args: &'a Map<String, Value>, name: &str) -> &'a str {
    args.get(name).and_then(Value::as_str).unwrap_or_default()
}

fn opt_str_arg<'a>(args: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    args.get(name).and_then(Value::as_str)
}

fn post_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "permalink": {"type": "string"},
            "title": {"type": "string"},
            "body": {"type": "string"},
            "published": {"type": "boolean"},
            "createdAt": {"type": "string"},
            "updatedAt": {"type": "string"},
        },
        "required": ["permalink", "title", "body", "published", "createdAt", "updatedAt"],
    })
}

fn listing_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "posts": {"type": "array", "items": {"type": "object"}},
            "count": {"type": "integer"},
        },
        "required": ["posts", "count"],
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use crate::features::FeatureError;

    use super::*;

    fn site() -> (McpRegistry, Arc<SiteStore>) {
        let mut registry = McpRegistry::new(10);
        let store = Arc::new(SiteStore::with_sample_content());
        register_features(&mut registry, &store, None).unwrap();
        (registry, store)
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn create_post_returns_structured_post() {
        let (registry, _) = site();
        // "yes" exercises the lexical boolean cast on the published flag.
        let result = registry
            .tools
            .call(
                "create_post",
                &args(json!({
                    "permalink": "new-post",
                    "title": "New post",
                    "body": "Body text.",
                    "published": "yes",
                })),
            )
            .unwrap();
        let post = &result["structuredContent"];
        assert_eq!(post["permalink"], json!("new-post"));
        assert_eq!(post["published"], json!(true));
        assert!(post["createdAt"].is_string());
        assert!(result.get("isError").is_none());
    }

    #[test]
    fn duplicate_permalink_is_a_tool_error() {
        let (registry, _) = site();
        let result = registry
            .tools
            .call(
                "create_post",
                &args(json!({
                    "permalink": "hello-world",
                    "title": "Again",
                    "body": "Body.",
                })),
            )
            .unwrap();
        assert_eq!(result["isError"], json!(true));
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("already exists"));
    }

    #[test]
    fn get_post_unknown_is_a_tool_error() {
        let (registry, _) = site();
        let result = registry
            .tools
            .call("get_post", &args(json!({"permalink": "ghost"})))
            .unwrap();
        assert_eq!(result["isError"], json!(true));
    }

    #[test]
    fn update_post_changes_only_the_title() {
        let (registry, store) = site();
        let result = registry
            .tools
            .call(
                "update_post",
                &args(json!({"permalink": "hello-world", "title": "Hello again"})),
            )
            .unwrap();
        assert_eq!(result["structuredContent"]["title"], json!("Hello again"));
        let post = store.get("hello-world").unwrap();
        assert_eq!(post.title, "Hello again");
        assert!(post.body.contains("Welcome"));
    }

    #[test]
    fn delete_post_reports_what_it_deleted() {
        let (registry, store) = site();
        let result = registry
            .tools
            .call("delete_post", &args(json!({"permalink": "hello-world"})))
            .unwrap();
        assert_eq!(
            result["content"][0]["text"],
            json!("Deleted post 'hello-world'")
        );
        assert!(store.get("hello-world").is_err());
    }

    #[test]
    fn list_posts_filters_on_published() {
        let (registry, _) = site();
        let result = registry
            .tools
            .call("list_posts", &args(json!({"published": false})))
            .unwrap();
        let listing = &result["structuredContent"];
        assert_eq!(listing["count"], json!(1));
        assert_eq!(
            listing["posts"][0]["permalink"],
            json!("drafting-in-public")
        );
    }

    #[test]
    fn publish_post_defaults_to_publishing() {
        let (registry, store) = site();
        let result = registry
            .tools
            .call(
                "publish_post",
                &args(json!({"permalink": "drafting-in-public"})),
            )
            .unwrap();
        assert_eq!(result["structuredContent"]["published"], json!(true));
        assert!(store.get("drafting-in-public").unwrap().published);
    }

    #[test]
    fn posts_resource_serialises_summaries() {
        let (registry, _) = site();
        let result = registry.resources.read("site://posts").unwrap();
        let item = &result["contents"][0];
        assert_eq!(item["mimeType"], json!("application/json"));
        let listed: Value =
            serde_json::from_str(item["text"].as_str().unwrap()).unwrap();
        assert_eq!(listed.as_array().unwrap().len(), 2);
        assert_eq!(listed[0]["permalink"], json!("hello-world"));
        assert!(listed[0].get("body").is_none());
    }

    #[test]
    fn post_template_renders_markdown() {
        let (registry, _) = site();
        let result = registry.resources.read("post://hello-world").unwrap();
        let item = &result["contents"][0];
        assert_eq!(item["uri"], json!("post://hello-world"));
        assert_eq!(item["mimeType"], json!("text/markdown"));
        let text = item["text"].as_str().unwrap();
        assert!(text.starts_with("# Hello, world"));
    }

    #[test]
    fn static_assets_are_preloaded() {
        let (registry, _) = site();
        let result = registry
            .resources
            .read("site://assets/style.css")
            .unwrap();
        let item = &result["contents"][0];
        assert_eq!(item["mimeType"], json!("text/css"));
        assert!(item["text"].as_str().unwrap().contains("max-width"));

        let result = registry.resources.read("site://assets/script.js").unwrap();
        assert_eq!(
            result["contents"][0]["mimeType"],
            json!("text/javascript")
        );
    }

    #[test]
    fn missing_post_reads_as_missing_content() {
        let (registry, _) = site();
        let err = registry.resources.read("post://ghost").unwrap_err();
        let FeatureError::Call { source, .. } = err else {
            panic!("expected a call failure, got {err:?}");
        };
        assert!(matches!(
            source.downcast_ref::<ContentError>(),
            Some(ContentError::ResourceNotFound { uri }) if uri == "post://ghost"
        ));
    }

    #[test]
    fn write_post_prompt_mentions_topic_and_audience() {
        let (registry, _) = site();
        let result = registry
            .prompts
            .get(
                "write_post",
                &args(json!({"topic": "static sites", "audience": "beginners"})),
            )
            .unwrap();
        let text = result["messages"][0]["content"]["text"].as_str().unwrap();
        assert!(text.contains("static sites"));
        assert!(text.contains("beginners"));
    }

    #[test]
    fn summarise_post_embeds_the_post() {
        let (registry, _) = site();
        let result = registry
            .prompts
            .get("summarise_post", &args(json!({"permalink": "hello-world"})))
            .unwrap();
        let messages = result["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        let block = &messages[1]["content"];
        assert_eq!(block["type"], json!("resource"));
        assert_eq!(block["resource"]["uri"], json!("post://hello-world"));
        assert!(block["resource"]["text"]
            .as_str()
            .unwrap()
            .contains("Hello, world"));
    }

    #[test]
    fn style_guide_prompt_is_static() {
        let (registry, _) = site();
        let result = registry.prompts.get("style_guide", &Map::new()).unwrap();
        assert_eq!(
            result["messages"][0]["content"]["text"],
            json!(STYLE_GUIDE)
        );
    }

    #[test]
    fn asset_directory_registers_supported_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::File::create(dir.path().join("style.css"))
            .unwrap()
            .write_all(b"body { margin: 0; }")
            .unwrap();
        std::fs::File::create(dir.path().join("about.md"))
            .unwrap()
            .write_all(b"# About this site")
            .unwrap();
        // No content kind matches .bin; the loop skips it.
        std::fs::File::create(dir.path().join("blob.bin"))
            .unwrap()
            .write_all(&[0xFF, 0xFE, 0x00])
            .unwrap();

        let mut registry = McpRegistry::new(10);
        let store = Arc::new(SiteStore::new());
        register_features(&mut registry, &store, Some(dir.path())).unwrap();

        let listing = registry.resources.list(None).unwrap();
        let uris: Vec<&str> = listing["resources"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|def| def["uri"].as_str())
            .filter(|uri| uri.starts_with("file://"))
            .collect();
        assert_eq!(uris.len(), 2);
        assert!(uris[0].ends_with("about.md"));
        assert!(uris[1].ends_with("style.css"));
    }

    #[test]
    fn tool_listing_covers_all_six_tools() {
        let (registry, _) = site();
        let listing = registry.tools.list(None).unwrap();
        let names: Vec<&str> = listing["tools"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|def| def["name"].as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "create_post",
                "get_post",
                "update_post",
                "delete_post",
                "list_posts",
                "publish_post"
            ]
        );
    }
}
