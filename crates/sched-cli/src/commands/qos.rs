//! QoS policy management.

use std::io::Write;

use sched_proto::{EntityKind, Qos};

use crate::cli::{AddQosArgs, ModifyQosArgs};
use crate::client::{ControlClient, Transport};
use crate::dispatch::{apply_changes, ModifyTarget};
use crate::error::CliError;
use crate::output::{Message, OutputFormat, QosList};
use crate::query::{find_qos, list_qos};
use crate::resolve::AttributeChange;

use super::{applied_summary, require_name};

/// A validated QoS operation, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QosCommand {
    /// Create a policy.
    Add(Qos),
    /// Remove a policy.
    Delete(String),
    /// Apply attribute changes in order.
    Modify {
        /// Policy addressed.
        target: ModifyTarget,
        /// Resolved changes.
        changes: Vec<AttributeChange>,
    },
    /// List all policies.
    Show,
    /// Look up one policy.
    Find(String),
}

impl QosCommand {
    /// Build an `add` from its arguments. Omitted limits stay unlimited.
    ///
    /// # Errors
    ///
    /// Returns a usage error if the name is empty.
    pub fn add(args: AddQosArgs) -> Result<Self, CliError> {
        require_name("QoS", &args.name)?;
        let mut qos = Qos::new(args.name);
        if let Some(description) = args.description {
            qos.description = description;
        }
        if let Some(priority) = args.priority {
            qos.priority = priority;
        }
        if let Some(max_jobs) = args.max_jobs_per_user {
            qos.max_jobs_per_user = max_jobs;
        }
        if let Some(max_cpus) = args.max_cpus_per_user {
            qos.max_cpus_per_user = max_cpus;
        }
        if let Some(max_time) = args.max_time_limit_per_task {
            qos.max_time_limit_per_task = max_time;
        }
        Ok(Self::Add(qos))
    }

    /// Build a `modify` from its arguments, resolving the changes.
    ///
    /// # Errors
    ///
    /// Returns a usage error when nothing would change.
    pub fn modify(args: &ModifyQosArgs) -> Result<Self, CliError> {
        require_name("QoS", &args.name)?;
        Ok(Self::Modify {
            target: ModifyTarget::new(EntityKind::Qos, &args.name),
            changes: args.modification().resolve()?,
        })
    }

    /// Execute against the daemon.
    ///
    /// # Errors
    ///
    /// Returns an error if a remote call fails or output cannot be written.
    pub async fn execute<T: Transport, W: Write>(
        self,
        client: &mut ControlClient<T>,
        writer: &mut W,
        format: &OutputFormat,
    ) -> Result<(), CliError> {
        match self {
            Self::Add(qos) => {
                let name = qos.name.clone();
                client.add_qos(qos).await?;
                format.write(writer, &Message::success(format!("QoS {name} added")))?;
            }
            Self::Delete(name) => {
                client.delete_entity(EntityKind::Qos, &name, None).await?;
                format.write(writer, &Message::success(format!("QoS {name} deleted")))?;
            }
            Self::Modify { target, changes } => {
                let applied = apply_changes(client, &target, &changes).await?;
                let msg = format!("QoS {} modified: {}", target.name, applied_summary(&applied));
                format.write(writer, &Message::success(msg))?;
            }
            Self::Show => {
                let qos = list_qos(client).await?;
                format.write(writer, &QosList(qos))?;
            }
            Self::Find(name) => match find_qos(client, &name).await? {
                Some(qos) => format.write(writer, &QosList(vec![qos]))?,
                None => format.write(writer, &Message::info(format!("QoS {name} not found.")))?,
            },
        }
        Ok(())
    }
}
