//! Text report written to stdout.

use std::io::{self, Write};
use std::path::Path;

use crate::config::Config;
use crate::dispatch::{Kind, Outcome, RenderResult};

const PROGRAM_NAME: &str = env!("CARGO_BIN_NAME");
const PROGRAM_VERSION: &str = env!("CARGO_PKG_VERSION");
const PROGRAM_PURPOSE: &str = "PEM decode";
const PROGRAM_INFO: &str = "Decodes PEM-formatted certificates, OCSP responses and CRLs.";

/// Shown instead of the artifact path when printing command templates.
const TEMPFILE: &str = "tempfile";

const SEPARATOR: &str = "\n------------------------------------------------------------------------------------------------------------\n";

pub(crate) fn banner(out: &mut impl Write) -> io::Result<()> {
    write!(
        out,
        "\nProgram:\n  Name    : {}\n  Release : v{}\n  Purpose : {}\n  Info    : {}\n",
        PROGRAM_NAME, PROGRAM_VERSION, PROGRAM_PURPOSE, PROGRAM_INFO
    )
}

pub(crate) fn processing(out: &mut impl Write, config: &Config) -> io::Result<()> {
    let [certificate, ocsp_response, crl] = config.commands(TEMPFILE);
    write!(out, "\nProcessing:\n")?;
    writeln!(out, "  Input File           : {}", config.file.display())?;
    writeln!(out, "  Output Certificate   : {}", certificate)?;
    writeln!(out, "  Output OCSP Response : {}", ocsp_response)?;
    writeln!(out, "  Output CRL           : {}", crl)
}

/// Echo the input file as read, before any block is decoded.
pub(crate) fn unmodified_input(out: &mut impl Write, path: &Path, input: &[u8]) -> io::Result<()> {
    write!(
        out,
        "{}Unmodified data from file {:?} ...{}",
        SEPARATOR,
        path.display().to_string(),
        SEPARATOR
    )?;
    out.write_all(b"\n")?;
    out.write_all(input)
}

pub(crate) fn blocks_heading(out: &mut impl Write) -> io::Result<()> {
    writeln!(
        out,
        "{}PEM blocks in textual form (decoder output) ...{}",
        SEPARATOR, SEPARATOR
    )
}

pub(crate) fn block(out: &mut impl Write, result: &RenderResult) -> io::Result<()> {
    if result.kind == Kind::Unsupported {
        return writeln!(out, "\nPEM type <{}> not supported.", result.label);
    }

    writeln!(out, "{}", result.pem)?;
    match &result.outcome {
        Outcome::Failed { status } => {
            let status = status.map_or_else(|| "killed by signal".to_string(), |s| s.to_string());
            writeln!(out, "Decoder failed for {} (exit status {}):", result.label, status)?;
        }
        Outcome::Unavailable(reason) => {
            writeln!(out, "Decoder could not be run for {}: {}", result.label, reason)?;
        }
        Outcome::Decoded | Outcome::Unsupported => {}
    }
    writeln!(out, "{}", result.decoded)
}

/// A later block could not be scanned; everything after it is ignored.
pub(crate) fn scan_warning(out: &mut impl Write, error: &pem::Error) -> io::Result<()> {
    write!(
        out,
        "\nWarning:\n  {}\n  Remaining input ignored.\n",
        error
    )
}

pub(crate) fn finish(out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    out.flush()
}

/// Usage text for argument errors.
pub(crate) fn usage(out: &mut impl Write, error: &str) -> io::Result<()> {
    let [certificate, ocsp_response, crl] = Config::default_commands(TEMPFILE);
    write!(out, "\nError:\n  {}\n", error)?;
    write!(out, "\nUsage:\n  {} [OPTIONS] <FILE>\n", PROGRAM_NAME)?;
    write!(out, "\nExamples:\n  {} certstate.out\n", PROGRAM_NAME)?;
    write!(
        out,
        "\nArgument:\n  FILE\n        file with one or more PEM-formatted certificates, OCSP responses or CRLs\n"
    )?;
    write!(
        out,
        "\nDecoder commands (override with --cert-cmd, --ocsp-cmd, --crl-cmd):\n  Certificate   : {}\n  OCSP response : {}\n  CRL           : {}\n",
        certificate, ocsp_response, crl
    )?;
    write!(out, "\nRun '{} --help' for all options.\n\n", PROGRAM_NAME)?;
    out.flush()
}
