//! User management.
//!
//! Users are scoped to an account: a name may appear once per account, so
//! lookups and blocks take an account alongside the name.

use std::io::Write;

use sched_proto::{EntityKind, PartitionQos, User};

use crate::cli::{AddUserArgs, ModifyUserArgs};
use crate::client::{ControlClient, Transport};
use crate::dispatch::{apply_changes, ModifyTarget};
use crate::error::CliError;
use crate::output::{Message, OutputFormat, UserList};
use crate::query::{find_user, list_users};
use crate::resolve::AttributeChange;

use super::{applied_summary, require_name};

/// A validated user operation, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// Add a user to an account.
    Add(User),
    /// Remove a user, from one account or all of them.
    Delete {
        /// User name.
        name: String,
        /// Account scope.
        account: Option<String>,
    },
    /// Apply attribute changes in order.
    Modify {
        /// User addressed.
        target: ModifyTarget,
        /// Resolved changes.
        changes: Vec<AttributeChange>,
    },
    /// List users.
    Show {
        /// Account scope.
        account: Option<String>,
    },
    /// Look up a user's memberships.
    Find {
        /// User name.
        name: String,
        /// Account scope.
        account: Option<String>,
    },
    /// Block or unblock a user within one account.
    SetBlocked {
        /// User name.
        name: String,
        /// Account the user belongs to.
        account: String,
        /// New blocked state.
        blocked: bool,
    },
}

impl UserCommand {
    /// Build an `add` from its arguments.
    ///
    /// # Errors
    ///
    /// Returns a usage error if the name or account is empty.
    pub fn add(args: AddUserArgs) -> Result<Self, CliError> {
        require_name("user", &args.name)?;
        require_name("account", &args.account)?;
        let allowed_partition_qos = args
            .partition
            .into_iter()
            .map(|partition| PartitionQos {
                partition,
                ..PartitionQos::default()
            })
            .collect();
        Ok(Self::Add(User {
            name: args.name,
            account: args.account,
            admin_level: args.level,
            allowed_partition_qos,
            coordinator: args.coordinator,
            ..User::default()
        }))
    }

    /// Build a `modify` from its arguments, resolving the changes.
    ///
    /// # Errors
    ///
    /// Returns a usage error for conflicting flags or when nothing would change.
    pub fn modify(args: &ModifyUserArgs) -> Result<Self, CliError> {
        require_name("user", &args.name)?;
        let changes = args.modification().resolve()?;
        Ok(Self::Modify {
            target: ModifyTarget {
                account: args.account.clone(),
                partition: args.partition.clone(),
                force: args.force,
                ..ModifyTarget::new(EntityKind::User, &args.name)
            },
            changes,
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
            Self::Add(user) => {
                let msg = format!("User {} added to account {}", user.name, user.account);
                client.add_user(user).await?;
                format.write(writer, &Message::success(msg))?;
            }
            Self::Delete { name, account } => {
                client
                    .delete_entity(EntityKind::User, &name, account.as_deref())
                    .await?;
                format.write(writer, &Message::success(format!("User {name} deleted")))?;
            }
            Self::Modify { target, changes } => {
                let applied = apply_changes(client, &target, &changes).await?;
                let msg = format!("User {} modified: {}", target.name, applied_summary(&applied));
                format.write(writer, &Message::success(msg))?;
            }
            Self::Show { account } => {
                let users = list_users(client, account.as_deref()).await?;
                format.write(writer, &UserList(users))?;
            }
            Self::Find { name, account } => {
                let users = find_user(client, &name, account.as_deref()).await?;
                if users.is_empty() {
                    format.write(writer, &Message::info(format!("User {name} not found.")))?;
                } else {
                    format.write(writer, &UserList(users))?;
                }
            }
            Self::SetBlocked {
                name,
                account,
                blocked,
            } => {
                client
                    .set_blocked(EntityKind::User, &name, Some(&account), blocked)
                    .await?;
                let verb = if blocked { "blocked" } else { "unblocked" };
                format.write(
                    writer,
                    &Message::success(format!("User {name} {verb} in account {account}")),
                )?;
            }
        }
        Ok(())
    }
}
