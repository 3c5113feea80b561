/*!
Stream selection for the CLI commands.

Both `inspect` and `roundtrip` take one document in and put one result
out, so a single selector covers both ends: a path names a file, and `-`
names whichever standard stream the command uses the selector for.
*/

use std::io::{Read, Write};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;

/// A CLI stream argument: a file path, or `-` for the standard stream.
#[derive(Debug, Clone, Default)]
pub struct Stream(Option<PathBuf>);

impl Stream {
    /// Read the whole document from the selected source.
    pub fn read(&self) -> anyhow::Result<Vec<u8>> {
        match &self.0 {
            None => {
                let mut data = Vec::new();
                std::io::stdin()
                    .read_to_end(&mut data)
                    .context("cannot read stdin")?;
                Ok(data)
            }
            Some(path) => std::fs::read(path)
                .with_context(|| format!("cannot read {}", path.display())),
        }
    }

    /// Write the whole result to the selected destination.
    pub fn write(&self, data: &[u8]) -> anyhow::Result<()> {
        match &self.0 {
            None => std::io::stdout()
                .write_all(data)
                .context("cannot write to stdout"),
            Some(path) => std::fs::write(path, data)
                .with_context(|| format!("cannot write {}", path.display())),
        }
    }

    /// Whether output goes to the terminal-facing standard stream, where
    /// a trailing newline is wanted.
    pub fn is_std(&self) -> bool {
        self.0.is_none()
    }
}

impl FromStr for Stream {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s.is_empty() || s == "-" {
            Stream(None)
        } else {
            Stream(Some(PathBuf::from(s)))
        })
    }
}
