//! Swagger 2.0 `paths` → flat list of API operations
//!
//! Each operation keeps what is needed to list it under its tag and to build
//! a request for it: parameters by location, the body model and the media
//! types it produces.

use std::collections::HashMap;

use serde_json::Value;

use crate::schema::model_name_from_ref;

const METHODS: [&str; 7] = ["get", "post", "put", "patch", "delete", "head", "options"];

/// A parsed API operation.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ApiOperation {
    /// operationId from the document (e.g. "CreateTransaction")
    pub operation_id: String,
    /// HTTP method (GET, POST, etc.)
    pub method: String,
    /// URL path template (e.g. "/api/v2/companies/{companyId}")
    pub path: String,
    /// First tag, used as the listing group
    pub group: String,
    pub summary: String,
    pub path_params: Vec<Param>,
    pub query_params: Vec<Param>,
    pub header_params: Vec<Param>,
    /// Model named by the `in: body` parameter's `schema.$ref`
    /// (or `schema.items.$ref` for array bodies)
    pub body_model: Option<String>,
    /// The body schema is an array of `body_model`
    pub body_is_array: bool,
    /// Whether the operation takes a body at all
    pub has_body: bool,
    pub body_required: bool,
    /// Media types for the `Accept` header
    pub produces: Vec<String>,
}

/// A single non-body parameter.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Param {
    pub name: String,
    pub description: String,
    pub required: bool,
    /// Swagger `type` (defaults to "string")
    pub param_type: String,
}

impl Param {
    pub fn new(name: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            required,
            param_type: "string".to_string(),
        }
    }
}

/// Body parameter, kept apart from the others.
struct BodyParam {
    model: Option<String>,
    is_array: bool,
    required: bool,
}

/// Extract all operations from a Swagger 2.0 document.
pub fn extract_operations(swagger: &Value) -> Vec<ApiOperation> {
    let mut ops = Vec::new();

    let paths = match swagger.get("paths").and_then(|p| p.as_object()) {
        Some(p) => p,
        None => return ops,
    };
    let default_produces = string_list(swagger.get("produces"));

    for (path, path_item) in paths {
        let path_level_params = path_item.get("parameters");

        for method in &METHODS {
            let operation = match path_item.get(*method) {
                Some(op) => op,
                None => continue,
            };

            if let Some(op) = extract_single_operation(
                path,
                method,
                operation,
                path_level_params,
                &default_produces,
            ) {
                ops.push(op);
            }
        }
    }

    ops
}

fn extract_single_operation(
    path: &str,
    method: &str,
    operation: &Value,
    path_level_params: Option<&Value>,
    default_produces: &[String],
) -> Option<ApiOperation> {
    let operation_id = operation
        .get("operationId")
        .and_then(|v| v.as_str())
        .unwrap_or("");

    if operation_id.is_empty() {
        return None;
    }

    let summary = operation
        .get("summary")
        .or_else(|| operation.get("description"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    let group = operation
        .get("tags")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|v| v.as_str())
        .unwrap_or("other")
        .to_string();

    let (mut path_params, query_params, header_params, body) =
        collect_params(path_level_params, operation.get("parameters"));

    // Path params follow their position in the template
    path_params.sort_by_cached_key(|p| path.find(&format!("{{{}}}", p.name)).unwrap_or(usize::MAX));

    let produces = match operation.get("produces") {
        Some(list) => string_list(Some(list)),
        None => default_produces.to_vec(),
    };

    Some(ApiOperation {
        operation_id: operation_id.to_string(),
        method: method.to_uppercase(),
        path: path.to_string(),
        group,
        summary,
        path_params,
        query_params,
        header_params,
        has_body: body.is_some(),
        body_required: body.as_ref().is_some_and(|b| b.required),
        body_is_array: body.as_ref().is_some_and(|b| b.is_array),
        body_model: body.and_then(|b| b.model),
        produces,
    })
}

/// Merge path-level + operation-level parameters, split by location.
/// Operation-level wins on `(name, in)`.
fn collect_params(
    path_level: Option<&Value>,
    operation_level: Option<&Value>,
) -> (Vec<Param>, Vec<Param>, Vec<Param>, Option<BodyParam>) {
    let mut param_map: HashMap<(String, String), &Value> = HashMap::new();

    for source in [path_level, operation_level].iter().flatten() {
        if let Some(params) = source.as_array() {
            for param in params {
                let name = param.get("name").and_then(|v| v.as_str());
                let location = param.get("in").and_then(|v| v.as_str());
                if let (Some(name), Some(location)) = (name, location) {
                    param_map.insert((name.to_string(), location.to_string()), param);
                }
            }
        }
    }

    let mut path_params = Vec::new();
    let mut query_params = Vec::new();
    let mut header_params = Vec::new();
    let mut body = None;

    for ((name, location), raw) in param_map {
        match location.as_str() {
            "path" => path_params.push(parse_param(name, raw)),
            "query" => query_params.push(parse_param(name, raw)),
            "header" => header_params.push(parse_param(name, raw)),
            "body" => body = Some(parse_body(raw)),
            _ => {}
        }
    }

    query_params.sort_by(|a, b| a.name.cmp(&b.name));
    header_params.sort_by(|a, b| a.name.cmp(&b.name));

    (path_params, query_params, header_params, body)
}

fn parse_param(name: String, param: &Value) -> Param {
    Param {
        name,
        description: param
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        required: param
            .get("required")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        param_type: param
            .get("type")
            .and_then(|v| v.as_str())
            .unwrap_or("string")
            .to_string(),
    }
}

fn parse_body(param: &Value) -> BodyParam {
    let schema = param.get("schema");
    let is_array = schema
        .and_then(|s| s.get("type"))
        .and_then(|v| v.as_str())
        == Some("array");
    // Arrays of models name their element model
    let reference = if is_array {
        schema.and_then(|s| s.get("items")).and_then(|i| i.get("$ref"))
    } else {
        schema.and_then(|s| s.get("$ref"))
    }
    .and_then(|v| v.as_str());

    BodyParam {
        model: reference
            .and_then(model_name_from_ref)
            .map(str::to_string),
        is_array,
        required: param
            .get("required")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Distinct tags in order of first appearance.
pub fn collect_tags(ops: &[ApiOperation]) -> Vec<&str> {
    let mut tags: Vec<&str> = Vec::new();
    for op in ops {
        if !tags.contains(&op.group.as_str()) {
            tags.push(&op.group);
        }
    }
    tags
}
