//! # Temporary Artifact Module
//!
//! Writes generated lines to a temporary text file that lives only as long
//! as it takes to deliver it.

use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// A transient text file holding one generated value per line.
///
/// The file is deleted when the artifact is dropped or [`TempArtifact::remove`]
/// is called.
#[derive(Debug)]
pub struct TempArtifact {
    file: NamedTempFile,
    lines: usize,
    bytes: u64,
}

impl TempArtifact {
    /// Write every line (newline terminated, UTF-8) into a new temporary file
    pub fn write_lines<I, S>(prefix: &str, suffix: &str, lines: I) -> std::io::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile()?;

        let mut count = 0;
        {
            let mut writer = BufWriter::new(file.as_file_mut());
            for line in lines {
                writer.write_all(line.as_ref().as_bytes())?;
                writer.write_all(b"\n")?;
                count += 1;
            }
            writer.flush()?;
        }

        let bytes = file.as_file().metadata()?.len();
        Ok(Self {
            file,
            lines: count,
            bytes,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn line_count(&self) -> usize {
        self.lines
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes
    }

    /// Delete the file now, reporting any failure
    pub fn remove(self) -> std::io::Result<()> {
        self.file.close()
    }
}

/// Write generated vehicle numbers to a temporary `.txt` artifact
pub fn write_numbers<I, S>(numbers: I) -> std::io::Result<TempArtifact>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    TempArtifact::write_lines("vehicle_numbers_", ".txt", numbers)
}
