//! # pem
//!
//! Scanning and encoding of PEM blocks as described in RFC 7468.
//!
//! [`scan`] walks a byte buffer and lazily yields every
//! `-----BEGIN <label>-----` / `-----END <label>-----` section it finds,
//! skipping any text in between. [`Pem`]'s `Display` implementation writes the
//! canonical form back out.
//!
//! ```
//! let input = b"leading commentary\n-----BEGIN CERTIFICATE-----\naGVsbG8=\n-----END CERTIFICATE-----\n";
//! let blocks = pem::parse_many(input).unwrap();
//! assert_eq!(blocks.len(), 1);
//! assert_eq!(blocks[0].label(), &pem::Label::Certificate);
//! assert_eq!(blocks[0].contents(), b"hello");
//! ```

pub mod error;

use std::{
    fmt::{Display, Formatter},
    iter::FusedIterator,
    str::FromStr,
    sync::LazyLock,
};

use base64::{Engine, engine::general_purpose::STANDARD};
pub use error::Error;
use regex::bytes::Regex;

const CERTIFICATE_LABEL: &str = "CERTIFICATE";
const OCSP_RESPONSE_LABEL: &str = "OCSP RESPONSE";
const X509_CRL_LABEL: &str = "X509 CRL";

// RFC 7468: base64 text is wrapped at 64 characters
const LINE_WIDTH: usize = 64;

static BEGIN_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^-----BEGIN ([^\r\n]*?)-----[ \t]*\r?$")
        .expect("BEGIN boundary pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    /// X.509 Certificate
    Certificate,
    /// DER encoded OCSP response
    OcspResponse,
    /// X.509 certificate revocation list
    X509Crl,
    /// Any other label, kept verbatim
    Other(String),
}

impl Label {
    pub fn as_str(&self) -> &str {
        match self {
            Label::Certificate => CERTIFICATE_LABEL,
            Label::OcspResponse => OCSP_RESPONSE_LABEL,
            Label::X509Crl => X509_CRL_LABEL,
            Label::Other(s) => s,
        }
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        match s {
            CERTIFICATE_LABEL => Label::Certificate,
            OCSP_RESPONSE_LABEL => Label::OcspResponse,
            X509_CRL_LABEL => Label::X509Crl,
            other => Label::Other(other.to_string()),
        }
    }
}

/// A single decoded PEM block.
///
/// `contents` holds the base64-decoded payload, never the armored text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pem {
    label: Label,
    headers: Vec<(String, String)>,
    contents: Vec<u8>,
}

impl Pem {
    pub fn new(label: impl Into<Label>, contents: Vec<u8>) -> Self {
        Pem {
            label: label.into(),
            headers: Vec::new(),
            contents,
        }
    }

    /// Attach RFC 1421 style headers (`Proc-Type`, `DEK-Info`, ...).
    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    pub fn label(&self) -> &Label {
        &self.label
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    pub fn into_contents(self) -> Vec<u8> {
        self.contents
    }

    /// Canonical PEM text, terminated by a newline.
    pub fn to_canonical(&self) -> String {
        format!("{}\n", self)
    }
}

impl Display for Pem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "-----BEGIN {}-----", self.label)?;
        if !self.headers.is_empty() {
            for (name, value) in &self.headers {
                writeln!(f, "{}: {}", name, value)?;
            }
            writeln!(f)?;
        }
        let encoded = STANDARD.encode(&self.contents);
        for chunk in encoded.as_bytes().chunks(LINE_WIDTH) {
            let line = std::str::from_utf8(chunk).map_err(|_| std::fmt::Error)?;
            writeln!(f, "{}", line)?;
        }
        write!(f, "-----END {}-----", self.label)
    }
}

impl FromStr for Pem {
    type Err = Error;

    /// Parse the first PEM block in `s`, ignoring anything after it.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        scan(s.as_bytes()).next().unwrap_or(Err(Error::NoBlock))
    }
}

/// Start scanning `buf` for PEM blocks.
pub fn scan(buf: &[u8]) -> Blocks<'_> {
    Blocks {
        buf,
        pos: 0,
        done: false,
    }
}

/// Parse every PEM block in `buf`.
///
/// Unlike iterating [`scan`] directly, this fails on the first malformed
/// block and when no block is present at all.
///
/// # Example
/// ```
/// use pem::parse_many;
///
/// let pem_data = b"-----BEGIN CERTIFICATE-----\nAAA=\n-----END CERTIFICATE-----\n-----BEGIN X509 CRL-----\nAQID\n-----END X509 CRL-----";
/// let pems = parse_many(pem_data).unwrap();
/// assert_eq!(pems.len(), 2);
/// ```
pub fn parse_many(buf: &[u8]) -> Result<Vec<Pem>, Error> {
    let pems = scan(buf).collect::<Result<Vec<_>, _>>()?;
    if pems.is_empty() {
        return Err(Error::NoBlock);
    }
    Ok(pems)
}

/// Lazy iterator over the PEM blocks of a buffer.
///
/// The cursor only moves forward. Once an item is `Err` the iterator is
/// exhausted; blocks yielded before stay valid.
#[derive(Debug)]
pub struct Blocks<'a> {
    buf: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> Blocks<'a> {
    /// Byte offset of the first unconsumed byte.
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Bytes not consumed by the blocks yielded so far.
    pub fn remainder(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    fn fail(&mut self, err: Error) -> Option<Result<Pem, Error>> {
        self.done = true;
        Some(Err(err))
    }
}

impl Iterator for Blocks<'_> {
    type Item = Result<Pem, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let rest = &self.buf[self.pos..];
        let Some(captures) = BEGIN_BOUNDARY.captures(rest) else {
            // no further BEGIN marker; the trailing bytes are commentary
            self.done = true;
            return None;
        };
        let (boundary, label) = match (captures.get(0), captures.get(1)) {
            (Some(b), Some(l)) => (b, String::from_utf8_lossy(l.as_bytes()).into_owned()),
            _ => {
                self.done = true;
                return None;
            }
        };
        let offset = self.pos + boundary.start();

        // body starts at the newline closing the BEGIN line
        let body_start = boundary.end();
        let end_marker = format!("\n-----END {}-----", label);
        let Some((end, line_end)) = find_end_boundary(&rest[body_start..], end_marker.as_bytes())
        else {
            return self.fail(Error::MissingPostEncapsulationBoundary { label, offset });
        };
        let body = &rest[body_start..body_start + end];
        let consumed = body_start + line_end;

        match decode_body(body, &label, offset) {
            Ok((headers, contents)) => {
                self.pos += consumed;
                Some(Ok(Pem {
                    label: Label::from(label.as_str()),
                    headers,
                    contents,
                }))
            }
            Err(e) => self.fail(e),
        }
    }
}

impl FusedIterator for Blocks<'_> {}

type Decoded = (Vec<(String, String)>, Vec<u8>);

fn decode_body(body: &[u8], label: &str, offset: usize) -> Result<Decoded, Error> {
    let body = body.strip_prefix(b"\n").unwrap_or(body);
    let mut headers = Vec::new();
    let mut lines = body.split(|&b| b == b'\n').peekable();

    while let Some(line) = lines.peek() {
        let Some(colon) = line.iter().position(|&b| b == b':') else {
            break;
        };
        let name = String::from_utf8_lossy(&line[..colon]).trim().to_string();
        if name.is_empty() {
            return Err(Error::InvalidHeader {
                label: label.to_string(),
                offset,
            });
        }
        let value = String::from_utf8_lossy(&line[colon + 1..]).trim().to_string();
        headers.push((name, value));
        lines.next();
    }

    // whitespace and line wrapping inside the body are not significant
    let base64_data = lines
        .flatten()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect::<Vec<u8>>();
    let contents = STANDARD
        .decode(&base64_data)
        .map_err(|source| Error::Base64Decode {
            label: label.to_string(),
            offset,
            source,
        })?;

    Ok((headers, contents))
}

/// Locate `marker` followed by nothing but blanks up to the end of its line.
///
/// Returns the marker position and the position just past its line.
fn find_end_boundary(haystack: &[u8], marker: &[u8]) -> Option<(usize, usize)> {
    let mut from = 0;
    while let Some(at) = find(&haystack[from..], marker) {
        let start = from + at;
        let after = start + marker.len();
        let (line_end, next_line) = match haystack[after..].iter().position(|&b| b == b'\n') {
            Some(newline) => (after + newline, after + newline + 1),
            None => (haystack.len(), haystack.len()),
        };
        if haystack[after..line_end]
            .iter()
            .all(|b| matches!(b, b' ' | b'\t' | b'\r'))
        {
            return Some((start, next_line));
        }
        from = start + 1;
    }
    None
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
