//! Handlers behind each CLI subcommand.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::ArgMatches;

use crate::builder::find_operation;
use crate::catalog::Catalog;
use crate::config::{Credentials, Environment, ExplorerConfig};
use crate::dispatch::{
    build_client, dispatch, parse_key_value, prepare_request, save_response, ApiResponse,
    BodySource, RequestValues,
};
use crate::format::{render_request, render_response, to_pretty_json};
use crate::generator::CyclePolicy;
use crate::swagger::ApiOperation;

/// Resolve global options into an `ExplorerConfig`.
///
/// Account number and license key must come together.
pub fn config_from_matches(matches: &ArgMatches) -> Result<ExplorerConfig> {
    let mut config = ExplorerConfig::default();

    if let Some(path) = matches.get_one::<String>("swagger") {
        config.swagger_path = PathBuf::from(path);
    }
    if let Some(env) = matches
        .get_one::<String>("environment")
        .and_then(|e| Environment::from_name(e))
    {
        config = config.environment(env);
    }
    if let Some(url) = matches.get_one::<String>("base-url") {
        config = config.base_url(url.clone());
    }
    match (
        matches.get_one::<String>("account-number"),
        matches.get_one::<String>("license-key"),
    ) {
        (Some(account), Some(license)) => {
            config = config.credentials(Credentials::new(account.clone(), license.clone()));
        }
        (None, None) => {}
        (Some(_), None) => bail!("--account-number was given without --license-key"),
        (None, Some(_)) => bail!("--license-key was given without --account-number"),
    }
    if let Some(secs) = matches.get_one::<u64>("timeout") {
        config = config.timeout_secs(*secs);
    }
    if let Some(indent) = matches.get_one::<usize>("indent") {
        config = config.indent(*indent);
    }
    if let Some(policy) = matches
        .get_one::<String>("on-cycle")
        .and_then(|p| CyclePolicy::from_name(p))
    {
        config = config.cycle_policy(policy);
    }

    Ok(config)
}

/// Run the selected subcommand, writing results to `out`.
pub fn run(matches: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let (name, sub) = matches
        .subcommand()
        .ok_or_else(|| anyhow!("no command given"))?;
    let config = config_from_matches(sub)?;
    let catalog = Catalog::load(&config.swagger_path)?;

    match name {
        "models" => list_models(&catalog, sub, out),
        "model" => show_model(&catalog, &config, sub, out),
        "example" => show_example(&catalog, &config, sub, out),
        "endpoints" => list_endpoints(&catalog, sub, out),
        "request" => send(&catalog, &config, sub, out),
        other => Err(anyhow!("unknown command: {other}")),
    }
}

fn list_models(catalog: &Catalog, sub: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let filter = sub.get_one::<String>("filter").map(|f| f.to_lowercase());
    for name in catalog.definition_names() {
        if filter
            .as_deref()
            .map_or(true, |f| name.to_lowercase().contains(f))
        {
            writeln!(out, "{name}")?;
        }
    }
    Ok(())
}

fn show_model(
    catalog: &Catalog,
    config: &ExplorerConfig,
    sub: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let name = required(sub, "name")?;
    let definition = catalog
        .generator(config.cycle_policy)
        .generate_example(name, false, true)?;
    writeln!(out, "{}", to_pretty_json(&definition, config.indent))?;
    Ok(())
}

fn show_example(
    catalog: &Catalog,
    config: &ExplorerConfig,
    sub: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let name = required(sub, "name")?;
    let example = catalog
        .generator(config.cycle_policy)
        .generate_example(name, sub.get_flag("full"), false)
        .with_context(|| format!("cannot generate an example for {name}"))?;
    writeln!(out, "{}", to_pretty_json(&example, config.indent))?;
    Ok(())
}

fn list_endpoints(catalog: &Catalog, sub: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let only = sub.get_one::<String>("tag");
    for tag in catalog.tags() {
        if only.is_some_and(|t| !t.eq_ignore_ascii_case(tag)) {
            continue;
        }
        writeln!(out, "{tag}")?;
        for op in catalog.operations().iter().filter(|o| o.group == tag) {
            write_endpoint(op, out)?;
        }
    }
    Ok(())
}

fn write_endpoint(op: &ApiOperation, out: &mut dyn Write) -> Result<()> {
    write!(out, "  {:<7} {}  {}", op.method, op.operation_id, op.path)?;
    if !op.summary.is_empty() {
        write!(out, "  - {}", op.summary)?;
    }
    writeln!(out)?;
    Ok(())
}

fn send(
    catalog: &Catalog,
    config: &ExplorerConfig,
    sub: &ArgMatches,
    out: &mut dyn Write,
) -> Result<()> {
    let op_name = required(sub, "operation")?;
    let op = find_operation(catalog.operations(), op_name)
        .ok_or_else(|| anyhow!("operation not found: {op_name}"))?;

    let values = request_values(sub)?;
    let mut generator = catalog.generator(config.cycle_policy);
    let request = prepare_request(op, config.resolved_base_url(), &values, &mut generator)?;

    if sub.get_flag("dry-run") {
        writeln!(out, "{}", render_request(&request, config.indent))?;
        return Ok(());
    }

    let client = build_client(config.timeout)?;
    let response = dispatch(&client, &request, config.credentials.as_ref())?;

    match download_target(sub, &response) {
        Some(path) => {
            save_response(&response, &path)?;
            writeln!(
                out,
                "HTTP {}\nsaved response body to {}",
                response.status,
                path.display()
            )?;
        }
        None => writeln!(out, "{}", render_response(&response, config.indent))?,
    }
    Ok(())
}

/// `--output` always wins; attachments go to the download directory
/// unless `--inline` is set.
fn download_target(sub: &ArgMatches, response: &ApiResponse) -> Option<PathBuf> {
    if let Some(path) = sub.get_one::<String>("output") {
        return Some(PathBuf::from(path));
    }
    if sub.get_flag("inline") {
        return None;
    }
    let name = response.attachment_filename()?;
    let dir = sub
        .get_one::<String>("download-dir")
        .map(PathBuf::from)
        .unwrap_or_default();
    Some(dir.join(name))
}

fn request_values(sub: &ArgMatches) -> Result<RequestValues> {
    let pairs = |id: &str| -> Result<Vec<(String, String)>> {
        sub.get_many::<String>(id)
            .into_iter()
            .flatten()
            .map(|raw| parse_key_value(raw).map_err(Into::into))
            .collect()
    };

    let body = if let Some(text) = sub.get_one::<String>("json-body") {
        BodySource::Json(text.clone())
    } else if let Some(path) = sub.get_one::<String>("json-file") {
        BodySource::File(PathBuf::from(path))
    } else if sub.get_flag("example-body") {
        BodySource::Example
    } else {
        BodySource::None
    };

    Ok(RequestValues {
        path: pairs("path")?,
        query: pairs("query")?,
        headers: pairs("header")?,
        body,
    })
}

fn required<'a>(sub: &'a ArgMatches, id: &str) -> Result<&'a str> {
    sub.get_one::<String>(id)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing argument: {id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_cli;
    use serde_json::{json, Value};

    fn swagger() -> Value {
        json!({
            "swagger": "2.0",
            "produces": ["application/json"],
            "paths": {
                "/api/v2/utilities/ping": {
                    "get": { "operationId": "Ping", "summary": "Tests connectivity", "tags": ["Utilities"] }
                },
                "/api/v2/transactions/create": {
                    "post": {
                        "operationId": "CreateTransaction",
                        "tags": ["Transactions"],
                        "parameters": [
                            {
                                "name": "model",
                                "in": "body",
                                "required": true,
                                "schema": { "$ref": "#/definitions/CreateTransactionModel" }
                            }
                        ]
                    }
                },
                "/api/v2/reports/{id}/attachment": {
                    "get": {
                        "operationId": "DownloadReport",
                        "tags": ["Reports"],
                        "parameters": [
                            { "name": "id", "in": "path", "required": true, "type": "integer" }
                        ]
                    }
                }
            },
            "definitions": {
                "CreateTransactionModel": {
                    "example": { "code": "INV-1", "type": "SalesInvoice" },
                    "properties": {
                        "code": { "type": "string" },
                        "addresses": { "$ref": "#/definitions/AddressesModel" }
                    }
                },
                "AddressesModel": {
                    "properties": {
                        "singleLocation": { "$ref": "#/definitions/AddressLocationInfo" }
                    }
                },
                "AddressLocationInfo": {
                    "properties": {
                        "country": { "type": "string", "enum": ["US"] },
                        "isVerified": { "type": "boolean" }
                    }
                },
                "NodeModel": {
                    "properties": {
                        "parent": { "$ref": "#/definitions/NodeModel" }
                    }
                }
            }
        })
    }

    fn run_cli(file: &tempfile::NamedTempFile, args: &[&str]) -> Result<String> {
        let path = file.path().to_str().unwrap().to_string();
        let mut argv = vec!["avatax-explorer", "--swagger", path.as_str()];
        argv.extend_from_slice(args);
        let matches = build_cli().try_get_matches_from(argv)?;
        let mut out = Vec::new();
        run(&matches, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    fn swagger_file() -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), swagger().to_string()).unwrap();
        file
    }

    #[test]
    fn models_lists_definitions_in_order() {
        let file = swagger_file();
        let out = run_cli(&file, &["models"]).unwrap();
        assert_eq!(
            out,
            "CreateTransactionModel\nAddressesModel\nAddressLocationInfo\nNodeModel\n"
        );
    }

    #[test]
    fn models_filter_is_case_insensitive() {
        let file = swagger_file();
        let out = run_cli(&file, &["models", "--filter", "address"]).unwrap();
        assert_eq!(out, "AddressesModel\nAddressLocationInfo\n");
    }

    #[test]
    fn model_prints_raw_definition() {
        let file = swagger_file();
        let out = run_cli(&file, &["model", "AddressesModel"]).unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, swagger()["definitions"]["AddressesModel"]);
    }

    #[test]
    fn example_uses_precomputed_example() {
        let file = swagger_file();
        let out = run_cli(&file, &["example", "CreateTransactionModel"]).unwrap();
        assert_eq!(
            out,
            "{\n   \"code\": \"INV-1\",\n   \"type\": \"SalesInvoice\"\n}\n"
        );
    }

    #[test]
    fn example_full_synthesizes_nested_models() {
        let file = swagger_file();
        let out = run_cli(&file, &["example", "CreateTransactionModel", "--full", "--indent", "2"]).unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["code"].as_str().unwrap().len(), 15);
        assert_eq!(
            parsed["addresses"],
            json!({"singleLocation": {"country": "US", "isVerified": false}})
        );
        assert!(out.starts_with("{\n  \"code\""));
    }

    #[test]
    fn example_reports_cycles_by_default() {
        let file = swagger_file();
        let err = run_cli(&file, &["example", "NodeModel"]).unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.contains("circular reference: NodeModel -> NodeModel"), "got: {chain}");
    }

    #[test]
    fn example_can_ignore_cycles() {
        let file = swagger_file();
        let out = run_cli(&file, &["example", "NodeModel", "--on-cycle", "ignore"]).unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, json!({"parent": {}}));
    }

    #[test]
    fn example_unknown_model_fails() {
        let file = swagger_file();
        let err = run_cli(&file, &["example", "Nope"]).unwrap_err();
        assert!(format!("{err:#}").contains("model not found: Nope"));
    }

    #[test]
    fn endpoints_grouped_by_tag() {
        let file = swagger_file();
        let out = run_cli(&file, &["endpoints"]).unwrap();
        assert_eq!(
            out,
            "Utilities\n  GET     Ping  /api/v2/utilities/ping  - Tests connectivity\n\
             Transactions\n  POST    CreateTransaction  /api/v2/transactions/create\n\
             Reports\n  GET     DownloadReport  /api/v2/reports/{id}/attachment\n"
        );

        let out = run_cli(&file, &["endpoints", "--tag", "transactions"]).unwrap();
        assert!(out.starts_with("Transactions\n"));
        assert!(!out.contains("Ping"));
    }

    #[test]
    fn request_dry_run_prints_generated_body() {
        let file = swagger_file();
        let out = run_cli(
            &file,
            &["request", "create-transaction", "--example-body", "--dry-run"],
        )
        .unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["method"], "POST");
        assert_eq!(
            parsed["url"],
            "https://sandbox-rest.avatax.com/api/v2/transactions/create"
        );
        assert_eq!(parsed["body"], json!({"code": "INV-1", "type": "SalesInvoice"}));
    }

    #[test]
    fn request_unknown_operation_fails() {
        let file = swagger_file();
        let err = run_cli(&file, &["request", "NoSuchThing", "--dry-run"]).unwrap_err();
        assert!(err.to_string().contains("operation not found"));
    }

    #[test]
    fn request_invalid_key_value_fails() {
        let file = swagger_file();
        let err = run_cli(&file, &["request", "Ping", "-q", "novalue", "--dry-run"]).unwrap_err();
        assert!(err.to_string().contains("invalid parameter format"));
    }

    #[test]
    fn request_sends_to_base_url_with_credentials() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/api/v2/utilities/ping")
            .match_header("authorization", mockito::Matcher::Regex("^Basic ".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"authenticated":true}"#)
            .create();

        let file = swagger_file();
        let url = server.url();
        let out = run_cli(
            &file,
            &[
                "--base-url",
                url.as_str(),
                "--account-number",
                "2000123456",
                "--license-key",
                "LICENSEKEY",
                "request",
                "Ping",
            ],
        )
        .unwrap();
        assert_eq!(out, "HTTP 200 OK\n{\n   \"authenticated\": true\n}\n");
        mock.assert();
    }

    #[test]
    fn missing_swagger_file_fails() {
        let matches = build_cli()
            .try_get_matches_from(["avatax-explorer", "--swagger", "/definitely/not/here.json", "models"])
            .unwrap();
        let mut out = Vec::new();
        let err = run(&matches, &mut out).unwrap_err();
        assert!(err.to_string().contains("failed to read swagger document"));
    }

    #[test]
    fn config_reads_global_options() {
        let matches = build_cli()
            .try_get_matches_from([
                "avatax-explorer",
                "--environment",
                "Production",
                "--timeout",
                "15",
                "--account-number",
                "42",
                "--license-key",
                "KEY",
                "models",
            ])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let config = config_from_matches(sub).unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.resolved_base_url(), crate::config::PRODUCTION_BASE_URL);
        assert_eq!(config.timeout, Some(std::time::Duration::from_secs(15)));
        let creds = config.credentials.unwrap();
        assert_eq!(creds.account_number, "42");
        assert_eq!(creds.license_key, "KEY");
    }

    #[test]
    fn partial_credentials_are_rejected() {
        for flags in [["--account-number", "42"], ["--license-key", "KEY"]] {
            let mut argv = vec!["avatax-explorer"];
            argv.extend_from_slice(&flags);
            argv.push("models");
            let matches = build_cli().try_get_matches_from(argv).unwrap();
            let (_, sub) = matches.subcommand().unwrap();
            let err = config_from_matches(sub).unwrap_err();
            assert!(err.to_string().contains("was given without"), "got: {err}");
        }
    }

    fn attachment_server() -> (mockito::ServerGuard, mockito::Mock) {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/api/v2/reports/7/attachment")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header("content-disposition", "attachment; filename=x.json")
            .with_body(r#"{"report":7}"#)
            .create();
        (server, mock)
    }

    #[test]
    fn request_saves_attachment_under_its_filename() {
        let (server, mock) = attachment_server();
        let dir = tempfile::tempdir().unwrap();
        let file = swagger_file();
        let url = server.url();
        let download_dir = dir.path().to_str().unwrap();

        let out = run_cli(
            &file,
            &[
                "--base-url",
                url.as_str(),
                "request",
                "DownloadReport",
                "-p",
                "id=7",
                "--download-dir",
                download_dir,
            ],
        )
        .unwrap();

        let saved = dir.path().join("x.json");
        assert_eq!(std::fs::read_to_string(&saved).unwrap(), r#"{"report":7}"#);
        assert_eq!(
            out,
            format!("HTTP 200 OK\nsaved response body to {}\n", saved.display())
        );
        mock.assert();
    }

    #[test]
    fn request_output_overrides_attachment_filename() {
        let (server, _mock) = attachment_server();
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("report-7.json");
        let file = swagger_file();
        let url = server.url();

        run_cli(
            &file,
            &[
                "--base-url",
                url.as_str(),
                "request",
                "DownloadReport",
                "-p",
                "id=7",
                "--output",
                target.to_str().unwrap(),
            ],
        )
        .unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), r#"{"report":7}"#);
        assert!(!dir.path().join("x.json").exists());
    }

    #[test]
    fn request_inline_prints_attachment() {
        let (server, _mock) = attachment_server();
        let file = swagger_file();
        let url = server.url();

        let out = run_cli(
            &file,
            &["--base-url", url.as_str(), "request", "DownloadReport", "-p", "id=7", "--inline"],
        )
        .unwrap();
        assert_eq!(out, "HTTP 200 OK\n{\n   \"report\": 7\n}\n");
    }

    #[test]
    fn request_dry_run_lists_repeated_query_values() {
        let file = swagger_file();
        let out = run_cli(
            &file,
            &["request", "Ping", "-q", "tag=a", "-q", "tag=b", "--dry-run"],
        )
        .unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["query"], json!(["tag=a", "tag=b"]));
    }
}
