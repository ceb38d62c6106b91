//! CLI command implementations.
//!
//! Every invocation is turned into a plan first. Building a plan does all
//! local validation (flag conflicts, attribute resolution, format strings,
//! time specs), so a bad invocation fails before a connection is opened.
//!
//! - [`account`], [`user`], [`qos`] - `schedacct`
//! - [`node`], [`partition`], [`job`], [`config`] - `schedctl`

pub mod account;
pub mod config;
pub mod job;
pub mod node;
pub mod partition;
pub mod qos;
pub mod user;

use std::io::Write;
use std::path::Path;

use sched_proto::Attribute;

pub use account::AccountCommand;
pub use config::ConfigCommand;
pub use job::JobCommand;
pub use node::NodeCommand;
pub use partition::PartitionCommand;
pub use qos::QosCommand;
pub use user::UserCommand;

use crate::cli::{
    AcctCommands, AddEntity, BlockEntity, CtlCommands, ModifyEntity, NamedEntity, ShowEntity,
    ShowTarget, UpdateTarget,
};
use crate::client::{operator_uid, ControlClient, CtldClient, Transport};
use crate::config::ClientConfig;
use crate::error::CliError;
use crate::output::OutputFormat;

fn require_name(what: &str, name: &str) -> Result<(), CliError> {
    if name.trim().is_empty() {
        return Err(CliError::Usage(format!("{what} name cannot be empty")));
    }
    Ok(())
}

fn applied_summary(applied: &[Attribute]) -> String {
    applied
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolve the operator identity, load the configuration and connect.
///
/// # Errors
///
/// Returns an error if the identity or configuration is unavailable, or the
/// daemon cannot be reached.
pub async fn connect(config_path: &Path) -> Result<ControlClient<CtldClient>, CliError> {
    let uid = operator_uid()?;
    let config = ClientConfig::from_file(config_path)?;
    let transport = CtldClient::connect(&config).await?;
    Ok(ControlClient::new(transport, uid))
}

/// A validated `schedacct` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcctPlan {
    /// Account operation.
    Account(AccountCommand),
    /// User operation.
    User(UserCommand),
    /// QoS operation.
    Qos(QosCommand),
}

impl TryFrom<AcctCommands> for AcctPlan {
    type Error = CliError;

    fn try_from(command: AcctCommands) -> Result<Self, Self::Error> {
        let plan = match command {
            AcctCommands::Add { entity } => match entity {
                AddEntity::Account(args) => Self::Account(AccountCommand::add(args)?),
                AddEntity::User(args) => Self::User(UserCommand::add(args)?),
                AddEntity::Qos(args) => Self::Qos(QosCommand::add(args)?),
            },
            AcctCommands::Delete { entity } => match entity {
                NamedEntity::Account { name } => Self::Account(AccountCommand::Delete(name)),
                NamedEntity::User { name, account } => {
                    Self::User(UserCommand::Delete { name, account })
                }
                NamedEntity::Qos { name } => Self::Qos(QosCommand::Delete(name)),
            },
            AcctCommands::Modify { entity } => match entity {
                ModifyEntity::Account(args) => Self::Account(AccountCommand::modify(&args)?),
                ModifyEntity::User(args) => Self::User(UserCommand::modify(&args)?),
                ModifyEntity::Qos(args) => Self::Qos(QosCommand::modify(&args)?),
            },
            AcctCommands::Show { entity } => match entity {
                ShowEntity::Account(args) => Self::Account(AccountCommand::show(&args)?),
                ShowEntity::User { account } => Self::User(UserCommand::Show { account }),
                ShowEntity::Qos => Self::Qos(QosCommand::Show),
            },
            AcctCommands::Find { entity } => match entity {
                NamedEntity::Account { name } => Self::Account(AccountCommand::Find(name)),
                NamedEntity::User { name, account } => {
                    Self::User(UserCommand::Find { name, account })
                }
                NamedEntity::Qos { name } => Self::Qos(QosCommand::Find(name)),
            },
            AcctCommands::Block { entity } => blocked(entity, true),
            AcctCommands::Unblock { entity } => blocked(entity, false),
        };
        Ok(plan)
    }
}

fn blocked(entity: BlockEntity, blocked: bool) -> AcctPlan {
    match entity {
        BlockEntity::Account { name } => {
            AcctPlan::Account(AccountCommand::SetBlocked { name, blocked })
        }
        BlockEntity::User { name, account } => AcctPlan::User(UserCommand::SetBlocked {
            name,
            account,
            blocked,
        }),
    }
}

impl AcctPlan {
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
            Self::Account(command) => command.execute(client, writer, format).await,
            Self::User(command) => command.execute(client, writer, format).await,
            Self::Qos(command) => command.execute(client, writer, format).await,
        }
    }
}

/// A validated `schedctl` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CtlPlan {
    /// Node operation.
    Node(NodeCommand),
    /// Partition query.
    Partition(PartitionCommand),
    /// Job operation.
    Job(JobCommand),
    /// Configuration dump.
    Config(ConfigCommand),
}

impl CtlPlan {
    /// Validate a parsed `schedctl` command.
    ///
    /// # Errors
    ///
    /// Returns a usage error for invalid arguments.
    pub fn new(command: CtlCommands, config_path: &Path) -> Result<Self, CliError> {
        let plan = match command {
            CtlCommands::Show { target } => match target {
                ShowTarget::Node { name } => Self::Node(NodeCommand::Show(name)),
                ShowTarget::Partition { name } => Self::Partition(PartitionCommand { name }),
                ShowTarget::Job { id } => Self::Job(JobCommand::Show(id)),
                ShowTarget::Config => Self::Config(ConfigCommand::new(config_path)),
            },
            CtlCommands::Update { target } => match target {
                UpdateTarget::Job(args) => Self::Job(JobCommand::update(&args)?),
                UpdateTarget::Node(args) => Self::Node(NodeCommand::update(args)?),
            },
        };
        Ok(plan)
    }

    /// Whether this plan talks to the daemon.
    #[must_use]
    pub const fn needs_connection(&self) -> bool {
        !matches!(self, Self::Config(_))
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
            Self::Node(command) => command.execute(client, writer, format).await,
            Self::Partition(command) => command.execute(client, writer, format).await,
            Self::Job(command) => command.execute(client, writer, format).await,
            Self::Config(command) => command.execute(writer, format),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{AcctCli, CtlCli};
    use crate::client::testing::{fake_client, FakeTransport};
    use clap::Parser;
    use sched_proto::{CtlRequest, EntityKind};

    fn acct_plan(args: &[&str]) -> Result<AcctPlan, CliError> {
        let cli = AcctCli::try_parse_from(std::iter::once("schedacct").chain(args.iter().copied()))
            .expect("parses");
        AcctPlan::try_from(cli.command)
    }

    fn ctl_plan(args: &[&str]) -> Result<CtlPlan, CliError> {
        let cli = CtlCli::try_parse_from(std::iter::once("schedctl").chain(args.iter().copied()))
            .expect("parses");
        CtlPlan::new(cli.command, &cli.global.config)
    }

    #[test]
    fn missing_modification_fails_at_plan_time() {
        for args in [
            &["modify", "account", "-N", "physics"][..],
            &["modify", "user", "-N", "alice", "-A", "physics"][..],
            &["modify", "qos", "-N", "normal"][..],
        ] {
            let err = acct_plan(args).unwrap_err();
            assert_eq!(err.exit_code(), crate::error::exit_codes::USAGE);
        }
        assert!(ctl_plan(&["update", "job", "1"]).is_err());
    }

    #[test]
    fn block_plans() {
        assert_eq!(
            acct_plan(&["block", "account", "physics"]).expect("valid"),
            AcctPlan::Account(AccountCommand::SetBlocked {
                name: "physics".into(),
                blocked: true,
            })
        );
        assert!(matches!(
            acct_plan(&["unblock", "user", "alice", "-A", "physics"]).expect("valid"),
            AcctPlan::User(UserCommand::SetBlocked { blocked: false, .. })
        ));
    }

    #[test]
    fn config_dump_needs_no_connection() {
        let plan = ctl_plan(&["show", "config", "-C", "/tmp/sched.toml"]).expect("valid");
        assert!(!plan.needs_connection());
        assert_eq!(plan, CtlPlan::Config(ConfigCommand::new("/tmp/sched.toml")));
        assert!(ctl_plan(&["show", "node"]).expect("valid").needs_connection());
    }

    #[tokio::test]
    async fn qos_modify_end_to_end() {
        let plan = acct_plan(&["modify", "qos", "-N", "normal", "-T", "3600", "-P", "10"])
            .expect("valid");
        let mut client = fake_client(FakeTransport::new());
        let mut out = Vec::new();
        plan.execute(&mut client, &mut out, &OutputFormat::default())
            .await
            .expect("ok");

        let requests = client.into_inner().requests;
        let sent: Vec<(EntityKind, String)> = requests
            .iter()
            .filter_map(|r| match r {
                CtlRequest::ModifyEntity { kind, attribute, .. } => {
                    Some((*kind, attribute.to_string()))
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            sent,
            vec![
                (EntityKind::Qos, "priority".to_string()),
                (EntityKind::Qos, "max_time_limit_per_task".to_string()),
            ]
        );
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "✓ QoS normal modified: priority, max_time_limit_per_task\n"
        );
    }

    #[test]
    fn applied_summary_joins_wire_names() {
        assert_eq!(
            applied_summary(&[Attribute::Description, Attribute::DefaultQos]),
            "description, default_qos"
        );
        assert_eq!(applied_summary(&[]), "");
    }
}
