//! Error types for the avatax-explorer crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while generating an example value from a schema.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerateError {
    #[error("model not found: {model}")]
    ModelNotFound { model: String },

    #[error("unresolved reference {reference} in model {from}")]
    UnresolvedReference { reference: String, from: String },

    #[error("malformed reference {reference:?} in model {from}")]
    MalformedReference { reference: String, from: String },

    #[error("array property {model}.{property} has no usable items schema")]
    MissingArrayItems { model: String, property: String },

    #[error("circular reference: {}", chain.join(" -> "))]
    CircularReference { chain: Vec<String> },
}

/// Errors raised while loading a Swagger document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DocumentError {
    #[error("failed to read swagger document: {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in swagger document")]
    Parse(#[source] serde_json::Error),

    #[error("swagger document has no definitions object")]
    MissingDefinitions,

    #[error("definition {model} is not a JSON object")]
    InvalidDefinition { model: String },

    #[error("catalog was built in memory and has no file to reload")]
    NotReloadable,
}

/// Errors that can occur during API dispatch.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DispatchError {
    #[error("invalid JSON in --json argument")]
    InvalidJsonBody(#[source] serde_json::Error),

    #[error("invalid parameter format: {value} (expected key=value)")]
    InvalidKeyValue { value: String },

    #[error("missing value for required {location} parameter {name}")]
    MissingParam { location: &'static str, name: String },

    #[error("request body is required (use --json, --json-file or --example-body)")]
    BodyRequired,

    #[error("operation {operation_id} has no body model to generate an example from")]
    NoBodyModel { operation_id: String },

    #[error("failed to generate example body")]
    BodyGeneration(#[source] GenerateError),

    #[error("unsupported HTTP method: {method}")]
    UnsupportedMethod { method: String },

    #[error("failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("HTTP request failed")]
    RequestFailed(#[source] reqwest::Error),

    #[error("failed to read response body")]
    ResponseRead(#[source] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpError {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to read JSON from file: {path}")]
    JsonFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in file: {path}")]
    InvalidJsonFile {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to save response body to {}", path.display())]
    SaveResponse {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
