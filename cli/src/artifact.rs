use std::io::{self, Write};
use std::path::Path;

use tempfile::{Builder, TempPath};

/// A uniquely named file that exists only as long as this value.
///
/// The file is closed once written, so the decoder sees complete contents,
/// and deleted when the `Artifact` is dropped on any exit path.
#[derive(Debug)]
pub(crate) struct Artifact {
    path: TempPath,
}

impl Artifact {
    pub(crate) fn create(prefix: &str, contents: &[u8], dir: Option<&Path>) -> io::Result<Self> {
        let mut builder = Builder::new();
        builder.prefix(prefix);
        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(contents)?;
        file.flush()?;
        Ok(Artifact {
            path: file.into_temp_path(),
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}
