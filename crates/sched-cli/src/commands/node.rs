//! Node inspection and drain/resume.

use std::io::Write;

use sched_proto::ctl::NodeStateChange;

use crate::cli::UpdateNodeArgs;
use crate::client::{ControlClient, Transport};
use crate::error::CliError;
use crate::output::{Message, NodeList, OutputFormat};
use crate::query::exactly_one;

use super::require_name;

/// A validated node operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeCommand {
    /// Show one node, or all when `None`.
    Show(Option<String>),
    /// Change a node's scheduling state.
    SetState {
        /// Node name.
        name: String,
        /// Requested state.
        state: NodeStateChange,
        /// Operator-supplied reason.
        reason: Option<String>,
    },
}

impl NodeCommand {
    /// Build a state change from its arguments.
    ///
    /// # Errors
    ///
    /// Returns a usage error if the name is empty or a drain has no reason.
    pub fn update(args: UpdateNodeArgs) -> Result<Self, CliError> {
        require_name("node", &args.name)?;
        let state = NodeStateChange::from(args.state);
        let reason = args.reason.filter(|r| !r.trim().is_empty());
        if state == NodeStateChange::Drain && reason.is_none() {
            return Err(CliError::Usage("a reason is required to drain a node".into()));
        }
        Ok(Self::SetState {
            name: args.name,
            state,
            reason,
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
            Self::Show(None) => {
                let nodes = client.query_nodes(None).await?;
                if nodes.is_empty() {
                    format.write(writer, &Message::info("No node is available."))?;
                } else {
                    format.write(writer, &NodeList(nodes))?;
                }
            }
            Self::Show(Some(name)) => {
                let nodes = client.query_nodes(Some(&name)).await?;
                match exactly_one(nodes, &name)? {
                    Some(node) => format.write(writer, &NodeList(vec![node]))?,
                    None => format.write(writer, &Message::info(format!("Node {name} not found.")))?,
                }
            }
            Self::SetState {
                name,
                state,
                reason,
            } => {
                client
                    .modify_node_state(&name, state, reason.as_deref())
                    .await?;
                let verb = match state {
                    NodeStateChange::Drain => "drained",
                    NodeStateChange::Resume => "resumed",
                };
                format.write(writer, &Message::success(format!("Node {name} {verb}")))?;
            }
        }
        Ok(())
    }
}
