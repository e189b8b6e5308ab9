//! Per-block rendering.
//!
//! Each block is classified by its label, re-encoded as canonical PEM, handed
//! to the matching decoder through a transient artifact and turned into a
//! [`RenderResult`]. Decoder failures are part of the result; only artifact
//! failures abort the run.

use std::path::PathBuf;

use pem::{Label, Pem};
use tracing::{debug, warn};

use crate::artifact::Artifact;
use crate::collaborator::Collaborator;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    Certificate,
    OcspResponse,
    Crl,
    Unsupported,
}

impl Kind {
    pub(crate) fn classify(label: &Label) -> Kind {
        match label {
            Label::Certificate => Kind::Certificate,
            Label::OcspResponse => Kind::OcspResponse,
            Label::X509Crl => Kind::Crl,
            Label::Other(_) => Kind::Unsupported,
        }
    }

    fn artifact_prefix(self) -> &'static str {
        match self {
            Kind::Certificate => "Certificate_PEM_Tempfile_",
            Kind::OcspResponse => "OCSPResponse_DER_Tempfile_",
            Kind::Crl => "CRL_PEM_Tempfile_",
            Kind::Unsupported => "Unsupported_Tempfile_",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The decoder ran and exited with status 0
    Decoded,
    /// The decoder ran and failed
    Failed { status: Option<i32> },
    /// The decoder could not be started or was stopped by the timeout
    Unavailable(String),
    /// The label has no decoder
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RenderResult {
    pub(crate) label: Label,
    pub(crate) kind: Kind,
    pub(crate) pem: String,
    pub(crate) decoded: String,
    pub(crate) outcome: Outcome,
}

impl RenderResult {
    pub(crate) fn success(&self) -> bool {
        self.outcome == Outcome::Decoded
    }
}

pub(crate) struct Dispatcher {
    certificate: Box<dyn Collaborator>,
    ocsp_response: Box<dyn Collaborator>,
    crl: Box<dyn Collaborator>,
    artifact_dir: Option<PathBuf>,
}

impl Dispatcher {
    pub(crate) fn new(
        certificate: Box<dyn Collaborator>,
        ocsp_response: Box<dyn Collaborator>,
        crl: Box<dyn Collaborator>,
    ) -> Self {
        Dispatcher {
            certificate,
            ocsp_response,
            crl,
            artifact_dir: None,
        }
    }

    /// Create artifacts in `dir` instead of the system temp directory.
    #[cfg(test)]
    pub(crate) fn with_artifact_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.artifact_dir = dir;
        self
    }

    fn collaborator(&self, kind: Kind) -> Option<&dyn Collaborator> {
        match kind {
            Kind::Certificate => Some(self.certificate.as_ref()),
            Kind::OcspResponse => Some(self.ocsp_response.as_ref()),
            Kind::Crl => Some(self.crl.as_ref()),
            Kind::Unsupported => None,
        }
    }

    pub(crate) fn dispatch(&self, block: &Pem) -> Result<RenderResult> {
        let label = block.label().clone();
        let kind = Kind::classify(&label);
        let pem = block.to_canonical();

        let Some(collaborator) = self.collaborator(kind) else {
            debug!(%label, "PEM type not supported");
            return Ok(RenderResult {
                label,
                kind,
                pem,
                decoded: String::new(),
                outcome: Outcome::Unsupported,
            });
        };

        // the OCSP decoder reads DER, the others read PEM
        let contents = match kind {
            Kind::OcspResponse => block.contents(),
            _ => pem.as_bytes(),
        };
        let artifact = Artifact::create(
            kind.artifact_prefix(),
            contents,
            self.artifact_dir.as_deref(),
        )
        .map_err(Error::Artifact)?;
        debug!(%label, artifact = %artifact.path().display(), "invoking decoder");

        let (decoded, outcome) = match collaborator.invoke(artifact.path()) {
            Ok(invocation) if invocation.success() => (invocation.output, Outcome::Decoded),
            Ok(invocation) => (
                invocation.output,
                Outcome::Failed {
                    status: invocation.status,
                },
            ),
            Err(e) => {
                warn!(%label, error = %e, "cannot run decoder");
                (String::new(), Outcome::Unavailable(e.to_string()))
            }
        };

        Ok(RenderResult {
            label,
            kind,
            pem,
            decoded,
            outcome,
        })
    }
}
