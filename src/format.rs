//! Pretty JSON output with a configurable indent.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::{json, Value};

use crate::dispatch::{ApiResponse, PreparedRequest};

/// Indent width used when none is configured.
pub const DEFAULT_INDENT: usize = 3;

/// Serialize `value` as pretty JSON indented by `indent` spaces.
pub fn to_pretty_json(value: &Value, indent: usize) -> String {
    let pad = " ".repeat(indent);
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(pad.as_bytes()));
    // Writing a Value into a Vec cannot fail
    if value.serialize(&mut ser).is_err() {
        return value.to_string();
    }
    String::from_utf8(buf).unwrap_or_else(|_| value.to_string())
}

/// Dry-run view of a request, without credentials.
///
/// Query pairs render as `key=value` and headers as `Name: value`, in the
/// order they are sent, so repeated keys all show up.
pub fn render_request(request: &PreparedRequest, indent: usize) -> String {
    let query: Vec<String> = request
        .query
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    let headers: Vec<String> = request
        .headers
        .iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect();

    let view = json!({
        "method": request.method.as_str(),
        "url": request.url,
        "query": query,
        "headers": headers,
        "body": request.body,
    });
    to_pretty_json(&view, indent)
}

/// Status line followed by the body.
pub fn render_response(response: &ApiResponse, indent: usize) -> String {
    let body = match &response.body {
        Value::String(text) => text.clone(),
        other => to_pretty_json(other, indent),
    };
    format!("HTTP {}\n{}", response.status, body)
}
