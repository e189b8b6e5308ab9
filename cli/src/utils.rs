use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Read the whole input file.
pub(crate) fn read_input(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| Error::Input {
        path: path.display().to_string(),
        source,
    })
}

/// Quote `s` for use as a single word in a POSIX shell command line.
pub(crate) fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
