//! Typed content model for tool, resource and prompt results.
//!
//! Three self-validating content kinds exist on the wire: text, binary
//! (base64 blob plus mime type, tagged `image` or `audio` in tool and prompt
//! positions) and embedded resources (URI plus exactly one of text or blob).
//! Each kind validates at construction, so a value that exists is a value
//! that serialises.
//!
//! [`detect_from_file`] probes a file as text, then image, then audio, in
//! that fixed order, and returns the first kind that matches. The
//! text-first ordering is deliberate and load-bearing: a `.svg` would match
//! both the text and image probes, and callers rely on files with text
//! extensions arriving as readable text.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use serde_json::{Map, Value};

use super::error::ContentError;

/// Self-validating text content.
#[derive(Debug, Clone)]
pub struct TextContent {
    /// The text payload; never empty.
    pub text: String,
    /// Optional URI this content belongs to.
    pub uri: Option<String>,
    /// Optional programmatic name.
    pub name: Option<String>,
    /// Optional human-readable title.
    pub title: Option<String>,
    /// Optional mime type.
    pub mime_type: Option<String>,
    /// Optional free-form annotations.
    pub annotations: Option<Value>,
}

impl TextContent {
    /// Creates text content.
    ///
    /// # Errors
    ///
    /// Fails with [`ContentError::EmptyText`] if the text is empty.
    pub fn new(text: impl Into<String>) -> Result<Self, ContentError> {
        let text = text.into();
        if text.is_empty() {
            return Err(ContentError::EmptyText);
        }
        Ok(Self {
            text,
            uri: None,
            name: None,
            title: None,
            mime_type: None,
            annotations: None,
        })
    }

    /// Sets the URI.
    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Sets the programmatic name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the human-readable title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the mime type.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Sets free-form annotations.
    #[must_use]
    pub fn with_annotations(mut self, annotations: Value) -> Self {
        self.annotations = Some(annotations);
        self
    }
}

/// Self-validating binary content carrying a base64 blob.
#[derive(Debug, Clone)]
pub struct BinaryContent {
    /// Base64-encoded payload; validated with a strict decode.
    pub blob: String,
    /// Mime type of the decoded payload.
    pub mime_type: String,
    /// Optional URI this content belongs to.
    pub uri: Option<String>,
    /// Optional programmatic name.
    pub name: Option<String>,
    /// Optional human-readable title.
    pub title: Option<String>,
    /// Optional free-form annotations.
    pub annotations: Option<Value>,
}

impl BinaryContent {
    /// Creates binary content from a base64 blob.
    ///
    /// # Errors
    ///
    /// Fails if the blob is empty or does not survive a strict base64
    /// decode (wrong padding or characters outside the standard alphabet).
    pub fn new(blob: impl Into<String>, mime_type: impl Into<String>) -> Result<Self, ContentError> {
        let blob = blob.into();
        if blob.is_empty() {
            return Err(ContentError::EmptyBlob);
        }
        BASE64_STANDARD
            .decode(&blob)
            .map_err(|source| ContentError::InvalidBase64 { source })?;
        Ok(Self {
            blob,
            mime_type: mime_type.into(),
            uri: None,
            name: None,
            title: None,
            annotations: None,
        })
    }

    /// Creates binary content by encoding raw bytes.
    ///
    /// # Errors
    ///
    /// Fails with [`ContentError::EmptyBlob`] if `bytes` is empty.
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Result<Self, ContentError> {
        if bytes.is_empty() {
            return Err(ContentError::EmptyBlob);
        }
        Self::new(BASE64_STANDARD.encode(bytes), mime_type)
    }

    /// Decodes the blob back into raw bytes.
    ///
    /// # Errors
    ///
    /// Fails if the blob no longer decodes; cannot happen for a value built
    /// through [`BinaryContent::new`].
    pub fn decode(&self) -> Result<Vec<u8>, ContentError> {
        BASE64_STANDARD
            .decode(&self.blob)
            .map_err(|source| ContentError::InvalidBase64 { source })
    }

    /// Sets the URI.
    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Sets the programmatic name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the human-readable title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets free-form annotations.
    #[must_use]
    pub fn with_annotations(mut self, annotations: Value) -> Self {
        self.annotations = Some(annotations);
        self
    }
}

/// The single payload representation of an embedded resource.
#[derive(Debug, Clone)]
pub enum ResourcePayload {
    /// UTF-8 text payload.
    Text(String),
    /// Base64 blob payload.
    Blob(String),
}

/// A resource embedded into a tool or prompt result.
///
/// Carries the resource's URI, exactly one payload representation and a
/// required mime type. The payload sum type makes a text-and-blob or
/// neither-text-nor-blob value unrepresentable.
#[derive(Debug, Clone)]
pub struct EmbeddedResource {
    /// URI of the embedded resource.
    pub uri: String,
    /// The payload, text or blob.
    pub payload: ResourcePayload,
    /// Mime type of the payload.
    pub mime_type: String,
    /// Optional programmatic name.
    pub name: Option<String>,
    /// Optional human-readable title.
    pub title: Option<String>,
    /// Optional free-form annotations.
    pub annotations: Option<Value>,
}

impl EmbeddedResource {
    /// Creates an embedded resource with a text payload.
    ///
    /// # Errors
    ///
    /// Fails with [`ContentError::EmptyText`] if the text is empty.
    pub fn text(
        uri: impl Into<String>,
        text: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Result<Self, ContentError> {
        let text = text.into();
        if text.is_empty() {
            return Err(ContentError::EmptyText);
        }
        Ok(Self {
            uri: uri.into(),
            payload: ResourcePayload::Text(text),
            mime_type: mime_type.into(),
            name: None,
            title: None,
            annotations: None,
        })
    }

    /// Creates an embedded resource with a base64 blob payload.
    ///
    /// # Errors
    ///
    /// Fails if the blob is empty or not valid base64.
    pub fn blob(
        uri: impl Into<String>,
        blob: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Result<Self, ContentError> {
        let blob = blob.into();
        if blob.is_empty() {
            return Err(ContentError::EmptyBlob);
        }
        BASE64_STANDARD
            .decode(&blob)
            .map_err(|source| ContentError::InvalidBase64 { source })?;
        Ok(Self {
            uri: uri.into(),
            payload: ResourcePayload::Blob(blob),
            mime_type: mime_type.into(),
            name: None,
            title: None,
            annotations: None,
        })
    }

    /// Embeds a file, deriving a `file://` URI and probing the content kind.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or matches no content kind.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ContentError> {
        let path = path.as_ref();
        let uri = format!("file://{}", path.display());
        let resource = match detect_from_file(path)? {
            DetectedContent::Text(text) => {
                let mime = text
                    .mime_type
                    .unwrap_or_else(|| "text/plain".to_string());
                Self::text(uri, text.text, mime)?
            }
            DetectedContent::Image(binary) | DetectedContent::Audio(binary) => {
                Self::blob(uri, binary.blob, binary.mime_type)?
            }
        };
        Ok(resource)
    }

    /// Sets the programmatic name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the human-readable title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets free-form annotations.
    #[must_use]
    pub fn with_annotations(mut self, annotations: Value) -> Self {
        self.annotations = Some(annotations);
        self
    }
}

/// One content item in a tool or prompt result.
#[derive(Debug, Clone)]
pub enum ContentItem {
    /// Text, tagged `text` on the wire.
    Text(TextContent),
    /// Binary image data, tagged `image` on the wire.
    Image(BinaryContent),
    /// Binary audio data, tagged `audio` on the wire.
    Audio(BinaryContent),
    /// An embedded resource, tagged `resource` on the wire.
    Resource(EmbeddedResource),
}

impl ContentItem {
    /// Creates a text item.
    ///
    /// # Errors
    ///
    /// Fails if the text is empty.
    pub fn text(text: impl Into<String>) -> Result<Self, ContentError> {
        Ok(Self::Text(TextContent::new(text)?))
    }

    /// Creates an image item from a base64 blob.
    ///
    /// # Errors
    ///
    /// Fails if the blob is empty or not valid base64.
    pub fn image(
        blob: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Result<Self, ContentError> {
        Ok(Self::Image(BinaryContent::new(blob, mime_type)?))
    }

    /// Creates an audio item from a base64 blob.
    ///
    /// # Errors
    ///
    /// Fails if the blob is empty or not valid base64.
    pub fn audio(
        blob: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Result<Self, ContentError> {
        Ok(Self::Audio(BinaryContent::new(blob, mime_type)?))
    }

    /// Creates an item by probing a file's content kind.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or matches no kind.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ContentError> {
        Ok(detect_from_file(path.as_ref())?.into())
    }

    /// Renders this item as a wire content block.
    #[must_use]
    pub fn to_block(&self) -> Value {
        match self {
            Self::Text(text) => {
                let mut block = Map::new();
                block.insert("type".to_string(), Value::from("text"));
                block.insert("text".to_string(), Value::from(text.text.clone()));
                insert_opt(&mut block, "mimeType", text.mime_type.clone());
                insert_opt(&mut block, "annotations", text.annotations.clone());
                Value::Object(block)
            }
            Self::Image(binary) | Self::Audio(binary) => {
                let tag = if matches!(self, Self::Image(_)) {
                    "image"
                } else {
                    "audio"
                };
                let mut block = Map::new();
                block.insert("type".to_string(), Value::from(tag));
                block.insert("data".to_string(), Value::from(binary.blob.clone()));
                block.insert(
                    "mimeType".to_string(),
                    Value::from(binary.mime_type.clone()),
                );
                insert_opt(&mut block, "annotations", binary.annotations.clone());
                Value::Object(block)
            }
            Self::Resource(resource) => {
                let mut inner = Map::new();
                inner.insert("uri".to_string(), Value::from(resource.uri.clone()));
                inner.insert(
                    "mimeType".to_string(),
                    Value::from(resource.mime_type.clone()),
                );
                match &resource.payload {
                    ResourcePayload::Text(text) => {
                        inner.insert("text".to_string(), Value::from(text.clone()));
                    }
                    ResourcePayload::Blob(blob) => {
                        inner.insert("blob".to_string(), Value::from(blob.clone()));
                    }
                }
                insert_opt(&mut inner, "name", resource.name.clone());
                insert_opt(&mut inner, "title", resource.title.clone());
                insert_opt(&mut inner, "annotations", resource.annotations.clone());
                let mut block = Map::new();
                block.insert("type".to_string(), Value::from("resource"));
                block.insert("resource".to_string(), Value::Object(inner));
                Value::Object(block)
            }
        }
    }
}

impl From<DetectedContent> for ContentItem {
    fn from(detected: DetectedContent) -> Self {
        match detected {
            DetectedContent::Text(text) => Self::Text(text),
            DetectedContent::Image(binary) => Self::Image(binary),
            DetectedContent::Audio(binary) => Self::Audio(binary),
        }
    }
}

/// Inserts an optional field into a wire map, skipping `None`.
pub(crate) fn insert_opt<T: Into<Value>>(map: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(value) = value {
        map.insert(key.to_string(), value.into());
    }
}

/// The outcome of probing a file's content kind.
#[derive(Debug, Clone)]
pub enum DetectedContent {
    /// The file is readable text.
    Text(TextContent),
    /// The file is an image, encoded as a base64 blob.
    Image(BinaryContent),
    /// The file is audio, encoded as a base64 blob.
    Audio(BinaryContent),
}

impl DetectedContent {
    /// Returns the detected mime type.
    #[must_use]
    pub fn mime_type(&self) -> Option<&str> {
        match self {
            Self::Text(text) => text.mime_type.as_deref(),
            Self::Image(binary) | Self::Audio(binary) => Some(&binary.mime_type),
        }
    }
}

/// Probes a file as text, then image, then audio, returning the first kind
/// that matches.
///
/// A probe matches when the file's extension is in the kind's table and the
/// payload passes that kind's validation (text additionally requires valid
/// UTF-8). A probe that fails falls through to the next; when all three
/// fail the file is unsupported.
///
/// # Errors
///
/// Fails with [`ContentError::FileRead`] if the file cannot be read, or
/// [`ContentError::UnsupportedFile`] if no kind matches.
pub fn detect_from_file(path: &Path) -> Result<DetectedContent, ContentError> {
    let bytes = std::fs::read(path).map_err(|source| ContentError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let extension = extension.as_deref().unwrap_or("");

    if let Some(mime) = text_mime(extension) {
        if let Ok(text) = std::str::from_utf8(&bytes) {
            if let Ok(content) = TextContent::new(text) {
                return Ok(DetectedContent::Text(content.with_mime_type(mime)));
            }
        }
    }

    if let Some(mime) = image_mime(extension) {
        if let Ok(content) = BinaryContent::from_bytes(&bytes, mime) {
            return Ok(DetectedContent::Image(content));
        }
    }

    if let Some(mime) = audio_mime(extension) {
        if let Ok(content) = BinaryContent::from_bytes(&bytes, mime) {
            return Ok(DetectedContent::Audio(content));
        }
    }

    Err(ContentError::UnsupportedFile {
        path: path.to_path_buf(),
    })
}

fn text_mime(extension: &str) -> Option<&'static str> {
    Some(match extension {
        "txt" => "text/plain",
        "md" => "text/markdown",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "text/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "csv" => "text/csv",
        "yaml" | "yml" => "application/yaml",
        _ => return None,
    })
}

fn image_mime(extension: &str) -> Option<&'static str> {
    Some(match extension {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "tiff" | "tif" => "image/tiff",
        _ => return None,
    })
}

fn audio_mime(extension: &str) -> Option<&'static str> {
    Some(match extension {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "aac" => "audio/aac",
        "ogg" | "oga" => "audio/ogg",
        "flac" => "audio/flac",
        "m4a" | "mp4" => "audio/mp4",
        "wma" => "audio/x-ms-wma",
        "opus" => "audio/opus",
        "webm" => "audio/webm",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::*;

    #[test]
    fn text_content_rejects_empty() {
        assert!(matches!(
            TextContent::new(""),
            Err(ContentError::EmptyText)
        ));
    }

    #[test]
    fn binary_content_rejects_invalid_base64() {
        assert!(matches!(
            BinaryContent::new("not base64!!!", "image/png"),
            Err(ContentError::InvalidBase64 { .. })
        ));
    }

    #[test]
    fn binary_content_rejects_missing_padding() {
        // "aGk" decodes leniently but fails a strict padded decode.
        assert!(BinaryContent::new("aGk", "text/plain").is_err());
    }

    #[test]
    fn binary_content_round_trips() {
        let original = b"hello bytes";
        let content = BinaryContent::from_bytes(original, "application/octet-stream").unwrap();
        assert_eq!(content.decode().unwrap(), original);
    }

    #[test]
    fn embedded_resource_text_block() {
        let resource = EmbeddedResource::text("site://style", "body {}", "text/css")
            .unwrap()
            .with_title("Stylesheet");
        let block = ContentItem::Resource(resource).to_block();
        assert_eq!(block["type"], json!("resource"));
        assert_eq!(block["resource"]["uri"], json!("site://style"));
        assert_eq!(block["resource"]["text"], json!("body {}"));
        assert_eq!(block["resource"]["title"], json!("Stylesheet"));
        assert!(block["resource"].get("blob").is_none());
    }

    #[test]
    fn image_block_is_tagged() {
        let blob = BASE64_STANDARD.encode(b"fake image");
        let block = ContentItem::image(blob.clone(), "image/png")
            .unwrap()
            .to_block();
        assert_eq!(block["type"], json!("image"));
        assert_eq!(block["data"], json!(blob));
        assert_eq!(block["mimeType"], json!("image/png"));
    }

    #[test]
    fn detect_prefers_text() {
        let mut file = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
        file.write_all(b"# Hello").unwrap();
        let detected = detect_from_file(file.path()).unwrap();
        let DetectedContent::Text(text) = detected else {
            panic!("expected text content");
        };
        assert_eq!(text.text, "# Hello");
        assert_eq!(text.mime_type.as_deref(), Some("text/markdown"));
    }

    #[test]
    fn detect_image_extension() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(&[0x89, 0x50, 0x4E, 0x47]).unwrap();
        let detected = detect_from_file(file.path()).unwrap();
        assert!(matches!(detected, DetectedContent::Image(_)));
        assert_eq!(detected.mime_type(), Some("image/png"));
    }

    #[test]
    fn detect_audio_extension() {
        let mut file = tempfile::Builder::new().suffix(".mp3").tempfile().unwrap();
        file.write_all(b"ID3fake").unwrap();
        let detected = detect_from_file(file.path()).unwrap();
        assert!(matches!(detected, DetectedContent::Audio(_)));
        assert_eq!(detected.mime_type(), Some("audio/mpeg"));
    }

    #[test]
    fn detect_rejects_unknown_extension() {
        let mut file = tempfile::Builder::new().suffix(".bin").tempfile().unwrap();
        file.write_all(b"payload").unwrap();
        assert!(matches!(
            detect_from_file(file.path()),
            Err(ContentError::UnsupportedFile { .. })
        ));
    }

    #[test]
    fn detect_empty_text_file_falls_through() {
        let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        // Empty text fails the text probe and nothing else matches.
        assert!(matches!(
            detect_from_file(file.path()),
            Err(ContentError::UnsupportedFile { .. })
        ));
    }

    #[test]
    fn embedded_from_file_derives_uri() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"plain text").unwrap();
        let resource = EmbeddedResource::from_file(file.path()).unwrap();
        assert!(resource.uri.starts_with("file://"));
        assert!(matches!(resource.payload, ResourcePayload::Text(_)));
        assert_eq!(resource.mime_type, "text/plain");
    }
}
