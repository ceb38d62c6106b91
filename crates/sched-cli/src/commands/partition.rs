//! Partition inspection.

use std::io::Write;

use crate::client::{ControlClient, Transport};
use crate::error::CliError;
use crate::output::{Message, OutputFormat, PartitionList};
use crate::query::exactly_one;

/// Show one partition, or all partitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionCommand {
    /// Partition name; `None` shows all.
    pub name: Option<String>,
}

impl PartitionCommand {
    /// Execute against the daemon.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or output cannot be written.
    pub async fn execute<T: Transport, W: Write>(
        self,
        client: &mut ControlClient<T>,
        writer: &mut W,
        format: &OutputFormat,
    ) -> Result<(), CliError> {
        let partitions = client.query_partitions(self.name.as_deref()).await?;
        match self.name {
            None if partitions.is_empty() => {
                format.write(writer, &Message::info("No partition is available."))?;
            }
            None => format.write(writer, &PartitionList(partitions))?,
            Some(name) => match exactly_one(partitions, &name)? {
                Some(partition) => format.write(writer, &PartitionList(vec![partition]))?,
                None => format.write(
                    writer,
                    &Message::info(format!("Partition {name} not found.")),
                )?,
            },
        }
        Ok(())
    }
}
