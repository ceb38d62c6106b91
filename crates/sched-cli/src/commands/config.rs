//! `schedctl show config`: print the configuration file, flattened.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::config::load_raw;
use crate::error::CliError;
use crate::flatten::{table_to_json, write_flat};
use crate::output::{OutputFormat, TableDisplay};

/// The configuration file as a generic tree.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ConfigDump(pub Value);

impl TableDisplay for ConfigDump {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        write_flat(writer, &self.0)
    }
}

/// Dump the configuration file. Needs no daemon connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigCommand {
    /// File to read.
    pub path: PathBuf,
}

impl ConfigCommand {
    /// Dump the file at `path`.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Read and print the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or output cannot be written.
    pub fn execute<W: Write>(&self, writer: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let table = load_raw(&self.path)?;
        format.write(writer, &ConfigDump(table_to_json(table)))
    }
}
