//! Error types for the feature layer.

use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

use super::registry::FeatureKind;
use super::types::AbstractType;

/// Boxed error type carried by invocable failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A value could not be coerced to a declared abstract type.
#[derive(Debug, Error)]
#[error("cannot cast {found} to {target}")]
pub struct CastError {
    /// Short description of the offending value.
    pub found: String,
    /// The type the cast targeted.
    pub target: AbstractType,
}

impl CastError {
    /// Creates a cast error describing the offending value.
    #[must_use]
    pub fn new(value: &Value, target: AbstractType) -> Self {
        Self {
            found: describe(value),
            target,
        }
    }
}

/// Renders a short, bounded description of a JSON value for error messages.
fn describe(value: &Value) -> String {
    const MAX_REPR: usize = 40;
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => {
            let mut repr: String = s.chars().take(MAX_REPR).collect();
            if s.chars().count() > MAX_REPR {
                repr.push('…');
            }
            format!("string \"{repr}\"")
        }
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}

/// Errors raised by the content model's validating constructors.
#[derive(Debug, Error)]
pub enum ContentError {
    /// Text content must not be empty.
    #[error("text content must not be empty")]
    EmptyText,

    /// Binary content must carry a non-empty blob.
    #[error("binary content must carry a non-empty blob")]
    EmptyBlob,

    /// The blob is not valid base64.
    #[error("blob is not valid base64")]
    InvalidBase64 {
        /// The underlying decode error.
        #[source]
        source: base64::DecodeError,
    },

    /// An embedded resource was requested from a URI no registry entry
    /// provides and no explicit payload was given.
    #[error("no resource content available for '{uri}'")]
    ResourceNotFound {
        /// The URI that could not be embedded.
        uri: String,
    },

    /// A file could not be read.
    #[error("failed to read file: {path}")]
    FileRead {
        /// The file that failed to read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// No content kind matches a file (text, image and audio all failed).
    #[error("no content kind matches file: {path}")]
    UnsupportedFile {
        /// The file that matched no probe.
        path: PathBuf,
    },
}

/// Errors raised while registering a feature.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// A templated URI's placeholder count does not match the required
    /// parameter count of its invocable.
    #[error(
        "template '{uri}' declares {placeholders} placeholder(s) \
         but its function requires {required} parameter(s)"
    )]
    TemplateArity {
        /// The declared URI template.
        uri: String,
        /// Number of `{name}` placeholders in the URI.
        placeholders: usize,
        /// Number of required parameters on the invocable.
        required: usize,
    },

    /// Content preparation failed (e.g. a file resource could not be read).
    #[error(transparent)]
    Content(#[from] ContentError),
}

/// Errors raised while resolving, validating or invoking a feature.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// No entry is registered under the requested key.
    #[error("unknown {kind}: {key}")]
    FunctionNotFound {
        /// The feature kind looked up.
        kind: FeatureKind,
        /// The name or URI that missed.
        key: String,
    },

    /// A required parameter is missing from the argument map.
    #[error("missing required parameter '{param}' for '{function}'")]
    ParameterNotFound {
        /// The function whose call failed.
        function: String,
        /// The missing parameter.
        param: String,
    },

    /// An argument could not be cast to its declared type.
    #[error("invalid value for parameter '{param}' of '{function}': {source}")]
    ParameterCast {
        /// The function whose call failed.
        function: String,
        /// The offending parameter.
        param: String,
        /// The underlying cast failure.
        source: CastError,
    },

    /// The invocable itself failed; the cause is preserved.
    #[error("'{function}' failed")]
    Call {
        /// The function that failed.
        function: String,
        /// The wrapped cause.
        #[source]
        source: BoxError,
    },

    /// The invocable produced a shape the assembler cannot render.
    #[error("unsupported result from '{function}': {reason}")]
    UnsupportedResult {
        /// The function that produced the result.
        function: String,
        /// Why the shape was rejected.
        reason: String,
    },

    /// The invocable produced invalid content.
    #[error("invalid content from '{function}'")]
    Content {
        /// The function that produced the content.
        function: String,
        /// The underlying content failure.
        #[source]
        source: ContentError,
    },

    /// A pagination cursor did not decode.
    #[error("invalid pagination cursor")]
    InvalidCursor,

    /// A resource URI carried more trailing path segments than the entry
    /// declares parameters.
    #[error("too many path parameters for '{uri}': expected at most {expected}, got {got}")]
    SurplusPathParameters {
        /// The requested URI.
        uri: String,
        /// Number of declared parameters.
        expected: usize,
        /// Number of extracted segments.
        got: usize,
    },
}
