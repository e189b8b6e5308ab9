use base64::DecodeError;
use thiserror::Error;

/// Errors that can occur when scanning or decoding PEM data.
///
/// Offsets are byte positions of the `-----BEGIN` marker of the block that
/// failed, counted from the start of the scanned buffer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The buffer holds no `-----BEGIN <label>-----` marker at all
    #[error("no PEM block found")]
    NoBlock,

    /// Missing the closing boundary marker (e.g., `-----END CERTIFICATE-----`)
    #[error("missing a post encapsulation boundary for {label} at offset {offset}")]
    MissingPostEncapsulationBoundary { label: String, offset: usize },

    /// A header line before the body is not of the form `Name: value`
    #[error("invalid header line in {label} at offset {offset}")]
    InvalidHeader { label: String, offset: usize },

    /// Failed to decode base64 data
    #[error("base64 decode of {label} at offset {offset}: {source}")]
    Base64Decode {
        label: String,
        offset: usize,
        source: DecodeError,
    },
}

impl Error {
    /// Byte offset of the block that failed, if the error belongs to one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::NoBlock => None,
            Error::MissingPostEncapsulationBoundary { offset, .. }
            | Error::InvalidHeader { offset, .. }
            | Error::Base64Decode { offset, .. } => Some(*offset),
        }
    }
}
