//! Operation + user values → HTTP request → response
//!
//! A request is first prepared (URL, query, headers, body) so it can be
//! shown without sending, then dispatched with the configured credentials.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderName, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::Credentials;
use crate::error::DispatchError;
use crate::generator::ExampleGenerator;
use crate::random::RandomSource;
use crate::swagger::ApiOperation;

/// Where the request body comes from.
#[derive(Debug, Clone, Default)]
pub enum BodySource {
    #[default]
    None,
    /// JSON text given on the command line
    Json(String),
    /// Path to a JSON file
    File(PathBuf),
    /// Generated from the operation's body model
    Example,
}

/// Values supplied by the user for one request.
#[derive(Debug, Clone, Default)]
pub struct RequestValues {
    pub path: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: BodySource,
}

/// A request ready to send.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// A successful response. The body is JSON when it parses, a string otherwise.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
    pub content_type: Option<String>,
    /// Raw `Content-Disposition` header
    pub content_disposition: Option<String>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body,
            content_type: None,
            content_disposition: None,
        }
    }

    /// Whether the server sent the body as a download.
    pub fn is_attachment(&self) -> bool {
        self.content_disposition
            .as_deref()
            .and_then(|d| d.split(';').next())
            .is_some_and(|kind| kind.trim().eq_ignore_ascii_case("attachment"))
    }

    /// File name to save an attachment under.
    ///
    /// Taken from the `filename=` parameter, reduced to its last path
    /// component. Without one, `untitled` with an extension guessed from the
    /// content type.
    pub fn attachment_filename(&self) -> Option<String> {
        if !self.is_attachment() {
            return None;
        }
        let named = self.content_disposition.as_deref().and_then(|d| {
            d.split(';')
                .skip(1)
                .filter_map(|part| part.trim().strip_prefix("filename="))
                .map(|name| name.trim().trim_matches('"'))
                .filter_map(|name| Path::new(name).file_name())
                .filter_map(|name| name.to_str())
                .map(str::to_string)
                .next()
        });
        Some(named.unwrap_or_else(|| {
            let ext = match self.content_type.as_deref() {
                Some(ct) if ct.contains("xml") => "xml",
                _ => "json",
            };
            format!("untitled.{ext}")
        }))
    }

    /// Body as it is written to a file: strings verbatim, JSON compact.
    pub fn body_text(&self) -> String {
        match &self.body {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

/// Split `key=value`.
pub fn parse_key_value(raw: &str) -> Result<(String, String), DispatchError> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, val)| (key.to_string(), val.to_string()))
        .ok_or_else(|| DispatchError::InvalidKeyValue {
            value: raw.to_string(),
        })
}

/// Build the request for `op` without sending it.
pub fn prepare_request<R: RandomSource>(
    op: &ApiOperation,
    base_url: &str,
    values: &RequestValues,
    generator: &mut ExampleGenerator<'_, R>,
) -> Result<PreparedRequest, DispatchError> {
    let method: Method = op
        .method
        .parse()
        .map_err(|_| DispatchError::UnsupportedMethod {
            method: op.method.clone(),
        })?;

    let url = build_url(base_url, op, &values.path)?;

    for param in op.query_params.iter().filter(|p| p.required) {
        if !values.query.iter().any(|(k, _)| k == &param.name) {
            return Err(DispatchError::MissingParam {
                location: "query",
                name: param.name.clone(),
            });
        }
    }
    for param in op.header_params.iter().filter(|p| p.required) {
        if !has_header(&values.headers, &param.name) {
            return Err(DispatchError::MissingParam {
                location: "header",
                name: param.name.clone(),
            });
        }
    }

    let mut headers = values.headers.clone();
    if !op.produces.is_empty() && !has_header(&headers, "Accept") {
        headers.push(("Accept".to_string(), op.produces.join(";")));
    }

    let body = build_body(op, &values.body, generator)?;

    Ok(PreparedRequest {
        method,
        url,
        query: values.query.clone(),
        headers,
        body,
    })
}

/// Blocking client with an optional timeout.
pub fn build_client(timeout: Option<Duration>) -> Result<Client, DispatchError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(DispatchError::ClientBuild)
}

/// Send a prepared request.
pub fn dispatch(
    client: &Client,
    request: &PreparedRequest,
    credentials: Option<&Credentials>,
) -> Result<ApiResponse, DispatchError> {
    debug!(method = %request.method, url = %request.url, "sending request");

    let mut req = client.request(request.method.clone(), &request.url);

    if let Some(creds) = credentials {
        req = req.basic_auth(&creds.account_number, Some(&creds.license_key));
    }
    if !request.query.is_empty() {
        req = req.query(&request.query);
    }
    for (name, val) in &request.headers {
        req = req.header(name, val);
    }
    if let Some(body) = &request.body {
        req = req.json(body);
    }

    send_request(req)
}

fn build_url(
    base_url: &str,
    op: &ApiOperation,
    path_values: &[(String, String)],
) -> Result<String, DispatchError> {
    let base = base_url.trim_end_matches('/');
    let mut url = format!("{}{}", base, op.path);
    for param in &op.path_params {
        let value = path_values
            .iter()
            .find(|(k, _)| k == &param.name)
            .map(|(_, v)| v);
        match value {
            Some(val) => {
                url = url.replace(&format!("{{{}}}", param.name), &urlencoding::encode(val));
            }
            None if param.required => {
                return Err(DispatchError::MissingParam {
                    location: "path",
                    name: param.name.clone(),
                })
            }
            None => {}
        }
    }
    Ok(url)
}

fn has_header(headers: &[(String, String)], name: &str) -> bool {
    headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
}

/// Write the response body to `path`.
pub fn save_response(response: &ApiResponse, path: &Path) -> Result<(), DispatchError> {
    std::fs::write(path, response.body_text()).map_err(|source| DispatchError::SaveResponse {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "saved response body");
    Ok(())
}

fn send_request(req: reqwest::blocking::RequestBuilder) -> Result<ApiResponse, DispatchError> {
    let resp = req.send().map_err(DispatchError::RequestFailed)?;
    let status = resp.status();
    let header = |name: HeaderName| {
        resp.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let content_type = header(CONTENT_TYPE);
    let content_disposition = header(CONTENT_DISPOSITION);
    let text = resp.text().map_err(DispatchError::ResponseRead)?;
    debug!(%status, bytes = text.len(), "received response");

    if !status.is_success() {
        return Err(DispatchError::HttpError { status, body: text });
    }

    let body: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));
    Ok(ApiResponse {
        status,
        body,
        content_type,
        content_disposition,
    })
}

fn build_body<R: RandomSource>(
    op: &ApiOperation,
    source: &BodySource,
    generator: &mut ExampleGenerator<'_, R>,
) -> Result<Option<Value>, DispatchError> {
    if !op.has_body {
        return Ok(None);
    }

    match source {
        BodySource::Json(text) => serde_json::from_str(text)
            .map(Some)
            .map_err(DispatchError::InvalidJsonBody),
        BodySource::File(path) => {
            let display = path.display().to_string();
            let text = std::fs::read_to_string(path).map_err(|source| {
                DispatchError::JsonFileRead {
                    path: display.clone(),
                    source,
                }
            })?;
            serde_json::from_str(&text)
                .map(Some)
                .map_err(|source| DispatchError::InvalidJsonFile {
                    path: display,
                    source,
                })
        }
        BodySource::Example => {
            let model = op
                .body_model
                .as_deref()
                .ok_or_else(|| DispatchError::NoBodyModel {
                    operation_id: op.operation_id.clone(),
                })?;
            let element = generator
                .generate_example(model, false, false)
                .map_err(DispatchError::BodyGeneration)?;
            if op.body_is_array {
                Ok(Some(Value::Array(vec![element])))
            } else {
                Ok(Some(element))
            }
        }
        BodySource::None if op.body_required => Err(DispatchError::BodyRequired),
        BodySource::None => Ok(None),
    }
}
