use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use crate::collaborator::ShellCommand;
use crate::dispatch::Dispatcher;

const CERTIFICATE_COMMAND: &str = "openssl x509 -certopt ext_dump -text -noout -inform PEM -in {}";
const OCSP_RESPONSE_COMMAND: &str = "openssl ocsp -text -noverify -respin {}";
const CRL_COMMAND: &str = "openssl crl -text -noout -inform PEM -in {}";

/// Everything a run needs, parsed once at startup.
#[derive(Args, Debug)]
pub(crate) struct Config {
    /// File with one or more PEM-formatted certificates, OCSP responses or CRLs
    #[arg(value_name = "FILE")]
    pub(crate) file: PathBuf,

    /// Decoder command for CERTIFICATE blocks; `{}` is replaced by the PEM artifact path
    #[arg(long, value_name = "TEMPLATE", default_value = CERTIFICATE_COMMAND)]
    pub(crate) cert_cmd: String,

    /// Decoder command for OCSP RESPONSE blocks; `{}` is replaced by the DER artifact path
    #[arg(long, value_name = "TEMPLATE", default_value = OCSP_RESPONSE_COMMAND)]
    pub(crate) ocsp_cmd: String,

    /// Decoder command for X509 CRL blocks; `{}` is replaced by the PEM artifact path
    #[arg(long, value_name = "TEMPLATE", default_value = CRL_COMMAND)]
    pub(crate) crl_cmd: String,

    /// Kill a decoder that runs longer than this many seconds
    #[arg(long, value_name = "SECS")]
    pub(crate) timeout: Option<u64>,

    /// Log every decoder invocation, including successful ones
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl Config {
    pub(crate) fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }

    fn shell_commands(&self) -> [ShellCommand; 3] {
        [&self.cert_cmd, &self.ocsp_cmd, &self.crl_cmd]
            .map(|template| ShellCommand::new(template.as_str()).with_timeout(self.timeout()))
    }

    /// Certificate, OCSP response and CRL command lines for `path`.
    pub(crate) fn commands(&self, path: &str) -> [String; 3] {
        self.shell_commands().map(|command| command.render(path))
    }

    pub(crate) fn default_commands(path: &str) -> [String; 3] {
        [CERTIFICATE_COMMAND, OCSP_RESPONSE_COMMAND, CRL_COMMAND]
            .map(|template| ShellCommand::new(template).render(path))
    }

    pub(crate) fn dispatcher(&self) -> Dispatcher {
        let [certificate, ocsp_response, crl] = self.shell_commands();
        Dispatcher::new(Box::new(certificate), Box::new(ocsp_response), Box::new(crl))
    }
}
