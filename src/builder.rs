//! clap `Command` tree for the explorer CLI
//!
//! Structure: `avatax-explorer [global options] <command> [args]`.

use clap::{Arg, ArgAction, Command};

use crate::config::DEFAULT_SWAGGER_PATH;
use crate::swagger::ApiOperation;

/// Build the CLI definition.
pub fn build_cli() -> Command {
    Command::new("avatax-explorer")
        .about("Explore the AvaTax REST API from its Swagger document")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("swagger")
                .long("swagger")
                .global(true)
                .env("AVATAX_SWAGGER")
                .default_value(DEFAULT_SWAGGER_PATH)
                .help("Swagger 2.0 JSON document"),
        )
        .arg(
            Arg::new("environment")
                .long("environment")
                .global(true)
                .env("AVATAX_ENVIRONMENT")
                .value_parser(["sandbox", "production"])
                .ignore_case(true)
                .default_value("sandbox")
                .help("AvaTax environment requests are sent to"),
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .global(true)
                .env("AVATAX_BASE_URL")
                .help("Override the environment's base URL"),
        )
        .arg(
            Arg::new("account-number")
                .long("account-number")
                .global(true)
                .env("AVATAX_ACCOUNT_NUMBER")
                .help("AvaTax account number (Basic auth user)"),
        )
        .arg(
            Arg::new("license-key")
                .long("license-key")
                .global(true)
                .env("AVATAX_LICENSE_KEY")
                .hide_env_values(true)
                .help("AvaTax license key (Basic auth password)"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .global(true)
                .env("AVATAX_REQUEST_TIMEOUT")
                .value_parser(clap::value_parser!(u64))
                .default_value("0")
                .help("Request timeout in seconds (0 = none)"),
        )
        .arg(
            Arg::new("indent")
                .long("indent")
                .global(true)
                .value_parser(clap::value_parser!(usize))
                .default_value("3")
                .help("Indent width of printed JSON"),
        )
        .arg(
            Arg::new("on-cycle")
                .long("on-cycle")
                .global(true)
                .value_parser(["error", "ignore"])
                .default_value("error")
                .help("What to do when example generation meets a circular reference"),
        )
        .subcommand(
            Command::new("models").about("List model definitions").arg(
                Arg::new("filter")
                    .long("filter")
                    .help("Only names containing this text (case-insensitive)"),
            ),
        )
        .subcommand(
            Command::new("model")
                .about("Show a model definition as written in the document")
                .arg(Arg::new("name").required(true).help("Model name")),
        )
        .subcommand(
            Command::new("example")
                .about("Generate an example value for a model")
                .arg(Arg::new("name").required(true).help("Model name"))
                .arg(
                    Arg::new("full")
                        .long("full")
                        .action(ArgAction::SetTrue)
                        .help("Ignore precomputed model examples and synthesize every field"),
                ),
        )
        .subcommand(
            Command::new("endpoints")
                .about("List API operations grouped by tag")
                .arg(Arg::new("tag").long("tag").help("Only this tag")),
        )
        .subcommand(build_request_command())
}

fn build_request_command() -> Command {
    Command::new("request")
        .about("Build and send a request for an operation")
        .arg(
            Arg::new("operation")
                .required(true)
                .help("operationId (e.g. CreateTransaction or create-transaction)"),
        )
        .arg(
            Arg::new("path")
                .long("path")
                .short('p')
                .action(ArgAction::Append)
                .help("Path parameter: key=value (repeatable)"),
        )
        .arg(
            Arg::new("query")
                .long("query")
                .short('q')
                .action(ArgAction::Append)
                .help("Query parameter: key=value (repeatable)"),
        )
        .arg(
            Arg::new("header")
                .long("header")
                .short('H')
                .action(ArgAction::Append)
                .help("Header: key=value (repeatable)"),
        )
        .arg(
            Arg::new("json-body")
                .long("json")
                .short('j')
                .action(ArgAction::Set)
                .conflicts_with_all(["json-file", "example-body"])
                .help("Request body as JSON string"),
        )
        .arg(
            Arg::new("json-file")
                .long("json-file")
                .action(ArgAction::Set)
                .conflicts_with("example-body")
                .help("Read the request body from a JSON file"),
        )
        .arg(
            Arg::new("example-body")
                .long("example-body")
                .action(ArgAction::SetTrue)
                .help("Generate the request body from the operation's model"),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .action(ArgAction::SetTrue)
                .help("Print the request instead of sending it"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .action(ArgAction::Set)
                .help("Write the response body to this file instead of printing it"),
        )
        .arg(
            Arg::new("download-dir")
                .long("download-dir")
                .action(ArgAction::Set)
                .default_value(".")
                .help("Directory attachment responses are saved to, under the server's filename"),
        )
        .arg(
            Arg::new("inline")
                .long("inline")
                .action(ArgAction::SetTrue)
                .conflicts_with("output")
                .help("Print attachment responses instead of saving them"),
        )
}

/// Find an operation by operationId: exact, then case-insensitive, then
/// kebab-case (`create-transaction`).
pub fn find_operation<'a>(ops: &'a [ApiOperation], name: &str) -> Option<&'a ApiOperation> {
    ops.iter()
        .find(|o| o.operation_id == name)
        .or_else(|| ops.iter().find(|o| o.operation_id.eq_ignore_ascii_case(name)))
        .or_else(|| {
            ops.iter()
                .find(|o| normalize_operation_id(&o.operation_id) == name)
        })
}

/// `CreateTransaction` → `create-transaction`, `GetHTTPStatus` → `get-http-status`.
pub fn normalize_operation_id(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + 4);
    for i in 0..chars.len() {
        let c = chars[i];
        if c.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                if prev.is_lowercase() || (prev.is_uppercase() && next_is_lower) {
                    result.push('-');
                }
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swagger::extract_operations;
    use serde_json::json;

    fn ops() -> Vec<ApiOperation> {
        extract_operations(&json!({
            "paths": {
                "/api/v2/transactions/create": {
                    "post": { "operationId": "CreateTransaction", "tags": ["Transactions"] }
                },
                "/api/v2/companies/{id}/certificates/{certId}/attachment": {
                    "get": { "operationId": "DownloadCertificateImage", "tags": ["Certificates"] }
                }
            }
        }))
    }

    // -- normalize_operation_id --

    #[test]
    fn normalize_operation_id_pascal_case() {
        assert_eq!(normalize_operation_id("CreateTransaction"), "create-transaction");
    }

    #[test]
    fn normalize_operation_id_camel_case() {
        assert_eq!(normalize_operation_id("listNexus"), "list-nexus");
    }

    #[test]
    fn normalize_operation_id_consecutive_uppercase() {
        assert_eq!(normalize_operation_id("GetHTTPStatus"), "get-http-status");
        assert_eq!(normalize_operation_id("ListTaxCodesByHSCode"), "list-tax-codes-by-hs-code");
    }

    #[test]
    fn normalize_operation_id_acronym_at_end() {
        assert_eq!(normalize_operation_id("GetW9"), "get-w9");
        assert_eq!(normalize_operation_id("getAPI"), "get-api");
    }

    #[test]
    fn normalize_operation_id_empty() {
        assert_eq!(normalize_operation_id(""), "");
    }

    // -- find_operation --

    #[test]
    fn find_operation_exact() {
        let ops = ops();
        let found = find_operation(&ops, "CreateTransaction").unwrap();
        assert_eq!(found.method, "POST");
    }

    #[test]
    fn find_operation_case_insensitive() {
        let ops = ops();
        let found = find_operation(&ops, "createtransaction").unwrap();
        assert_eq!(found.operation_id, "CreateTransaction");
    }

    #[test]
    fn find_operation_kebab_case() {
        let ops = ops();
        let found = find_operation(&ops, "download-certificate-image").unwrap();
        assert_eq!(found.operation_id, "DownloadCertificateImage");
    }

    #[test]
    fn find_operation_returns_none_for_nonexistent() {
        assert!(find_operation(&ops(), "DeleteTransaction").is_none());
    }

    // -- build_cli --

    #[test]
    fn build_cli_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn build_cli_has_all_commands() {
        let cmd = build_cli();
        let names: Vec<&str> = cmd.get_subcommands().map(|c| c.get_name()).collect();
        assert_eq!(names, ["models", "model", "example", "endpoints", "request"]);
    }

    #[test]
    fn global_defaults() {
        let matches = build_cli()
            .try_get_matches_from(["avatax-explorer", "models"])
            .unwrap();
        assert_eq!(matches.get_one::<String>("environment").unwrap(), "sandbox");
        assert_eq!(*matches.get_one::<usize>("indent").unwrap(), 3);
        assert_eq!(*matches.get_one::<u64>("timeout").unwrap(), 0);
        assert_eq!(matches.get_one::<String>("on-cycle").unwrap(), "error");
    }

    #[test]
    fn global_options_after_subcommand() {
        let matches = build_cli()
            .try_get_matches_from(["avatax-explorer", "example", "Address", "--full", "--indent", "2"])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "example");
        assert_eq!(sub.get_one::<String>("name").unwrap(), "Address");
        assert!(sub.get_flag("full"));
        assert_eq!(*sub.get_one::<usize>("indent").unwrap(), 2);
    }

    #[test]
    fn request_body_sources_conflict() {
        let result = build_cli().try_get_matches_from([
            "avatax-explorer",
            "request",
            "CreateTransaction",
            "--json",
            "{}",
            "--example-body",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn request_collects_repeated_params() {
        let matches = build_cli()
            .try_get_matches_from([
                "avatax-explorer",
                "request",
                "GetTransactionByCode",
                "-p",
                "companyCode=DEFAULT",
                "-p",
                "transactionCode=INV1",
                "-q",
                "$include=Lines",
                "--dry-run",
            ])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let paths: Vec<&String> = sub.get_many::<String>("path").unwrap().collect();
        assert_eq!(paths, ["companyCode=DEFAULT", "transactionCode=INV1"]);
        assert!(sub.get_flag("dry-run"));
    }

    #[test]
    fn unknown_environment_is_rejected() {
        let result =
            build_cli().try_get_matches_from(["avatax-explorer", "--environment", "staging", "models"]);
        assert!(result.is_err());
    }
}
