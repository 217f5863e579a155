use std::io::Write;
use std::process::ExitCode;

use avatax_explorer::{build_cli, commands};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = build_cli().get_matches();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match commands::run(&matches, &mut out) {
        Ok(()) => {
            let _ = out.flush();
            ExitCode::SUCCESS
        }
        Err(err) => {
            let _ = out.flush();
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
