use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

mod artifact;
mod collaborator;
mod config;
mod dispatch;
mod error;
mod output;
mod utils;

use config::Config;
use dispatch::Kind;
use error::Result;
use utils::read_input;

#[derive(Parser, Debug)]
#[command(name = "pemview", version)]
#[command(about = "Render PEM-formatted certificates, OCSP responses and CRLs as text", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: Config,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let mut out = io::stdout().lock();
            let _ = output::banner(&mut out).and_then(|_| output::usage(&mut out, &usage_error(&e)));
            return ExitCode::from(1);
        }
    };

    init_logging(cli.config.verbose);

    match run(&cli.config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "aborting");
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// One line describing an argument error, without clap's styling.
fn usage_error(e: &clap::Error) -> String {
    if e.kind() == ErrorKind::MissingRequiredArgument {
        return "File argument required.".to_string();
    }
    let rendered = e.render().to_string();
    let line = rendered.lines().next().unwrap_or_default();
    line.strip_prefix("error: ").unwrap_or(line).to_string()
}

fn run(config: &Config) -> Result<()> {
    let mut out = io::stdout().lock();
    output::banner(&mut out)?;
    output::processing(&mut out, config)?;

    let input = read_input(&config.file)?;
    output::unmodified_input(&mut out, &config.file, &input)?;
    output::blocks_heading(&mut out)?;
    out.flush()?;

    let dispatcher = config.dispatcher();
    let mut blocks = pem::scan(&input);

    // the first block is mandatory, later ones may be cut short
    let first = blocks.next().unwrap_or(Err(pem::Error::NoBlock))?;
    let mut results = vec![dispatcher.dispatch(&first)?];
    output::block(&mut out, &results[0])?;

    for block in blocks {
        match block {
            Ok(block) => {
                let result = dispatcher.dispatch(&block)?;
                output::block(&mut out, &result)?;
                results.push(result);
            }
            Err(e) => {
                warn!(error = %e, "stopped scanning input");
                output::scan_warning(&mut out, &e)?;
            }
        }
    }
    output::finish(&mut out)?;

    let unsupported = results
        .iter()
        .filter(|r| r.kind == Kind::Unsupported)
        .count();
    let failed = results.iter().filter(|r| !r.success()).count() - unsupported;
    debug!(blocks = results.len(), failed, unsupported, "done");

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use clap::Parser;

    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["pemview", "certstate.out"]).unwrap();
        assert_eq!(cli.config.file, PathBuf::from("certstate.out"));
        assert_eq!(cli.config.timeout(), None);
        assert!(!cli.config.verbose);
        assert_eq!(
            cli.config.commands("tempfile"),
            Config::default_commands("tempfile")
        );
        assert_eq!(
            cli.config.commands("tempfile")[0],
            "openssl x509 -certopt ext_dump -text -noout -inform PEM -in tempfile"
        );
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::try_parse_from([
            "pemview",
            "--cert-cmd",
            "cat {}",
            "--ocsp-cmd",
            "xxd {}",
            "--crl-cmd",
            "head {}",
            "--timeout",
            "5",
            "-v",
            "chain.pem",
        ])
        .unwrap();
        assert_eq!(
            cli.config.commands("f"),
            ["cat f".to_string(), "xxd f".to_string(), "head f".to_string()]
        );
        assert_eq!(cli.config.timeout(), Some(Duration::from_secs(5)));
        assert!(cli.config.verbose);
    }

    #[test]
    fn test_cli_requires_exactly_one_file() {
        let missing = Cli::try_parse_from(["pemview"]).unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(usage_error(&missing), "File argument required.");

        let extra = Cli::try_parse_from(["pemview", "a.pem", "b.pem"]).unwrap_err();
        assert_eq!(extra.kind(), ErrorKind::UnknownArgument);
        assert!(usage_error(&extra).contains("b.pem"));
    }
}
