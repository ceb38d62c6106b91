//! Account management.

use std::io::Write;

use sched_proto::{Account, EntityKind};

use crate::cli::{AddAccountArgs, ModifyAccountArgs, ShowAccountArgs};
use crate::client::{ControlClient, Transport};
use crate::dispatch::{apply_changes, ModifyTarget};
use crate::error::CliError;
use crate::fieldfmt::FieldFormat;
use crate::output::{AccountList, Message, OutputFormat};
use crate::query::{find_account, list_accounts};
use crate::resolve::AttributeChange;

use super::{applied_summary, require_name};

/// A validated account operation, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountCommand {
    /// Create an account.
    Add(Account),
    /// Remove an account.
    Delete(String),
    /// Apply attribute changes in order.
    Modify {
        /// Account addressed.
        target: ModifyTarget,
        /// Resolved changes.
        changes: Vec<AttributeChange>,
    },
    /// List all accounts.
    Show {
        /// Field format to print with, instead of the output format.
        layout: Option<FieldFormat>,
        /// Print the field format header.
        header: bool,
    },
    /// Look up one account.
    Find(String),
    /// Block or unblock.
    SetBlocked {
        /// Account name.
        name: String,
        /// New blocked state.
        blocked: bool,
    },
}

impl AccountCommand {
    /// Build an `add` from its arguments.
    ///
    /// # Errors
    ///
    /// Returns a usage error if the name is empty.
    pub fn add(args: AddAccountArgs) -> Result<Self, CliError> {
        require_name("account", &args.name)?;
        Ok(Self::Add(Account {
            name: args.name,
            description: args.description.unwrap_or_default(),
            parent_account: args.parent,
            allowed_partitions: args.partition,
            default_qos: args.default_qos,
            allowed_qos_list: args.qos_list,
            ..Account::default()
        }))
    }

    /// Build a `modify` from its arguments, resolving the changes.
    ///
    /// # Errors
    ///
    /// Returns a usage error for conflicting flags or when nothing would change.
    pub fn modify(args: &ModifyAccountArgs) -> Result<Self, CliError> {
        require_name("account", &args.name)?;
        let changes = args.modification().resolve()?;
        Ok(Self::Modify {
            target: ModifyTarget {
                force: args.force,
                ..ModifyTarget::new(EntityKind::Account, &args.name)
            },
            changes,
        })
    }

    /// Build a `show`, parsing any field format.
    ///
    /// # Errors
    ///
    /// Returns a usage error for an invalid field format.
    pub fn show(args: &ShowAccountArgs) -> Result<Self, CliError> {
        let layout = args.format.as_deref().map(FieldFormat::parse).transpose()?;
        Ok(Self::Show {
            layout,
            header: !args.noheader,
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
            Self::Add(account) => {
                let name = account.name.clone();
                client.add_account(account).await?;
                format.write(writer, &Message::success(format!("Account {name} added")))?;
            }
            Self::Delete(name) => {
                client.delete_entity(EntityKind::Account, &name, None).await?;
                format.write(writer, &Message::success(format!("Account {name} deleted")))?;
            }
            Self::Modify { target, changes } => {
                let applied = apply_changes(client, &target, &changes).await?;
                let msg = format!("Account {} modified: {}", target.name, applied_summary(&applied));
                format.write(writer, &Message::success(msg))?;
            }
            Self::Show { layout, header } => {
                let accounts = list_accounts(client).await?;
                match layout {
                    Some(layout) => {
                        if header {
                            writeln!(writer, "{}", layout.header())?;
                        }
                        for account in &accounts {
                            writeln!(writer, "{}", layout.render(account))?;
                        }
                    }
                    None => format.write(writer, &AccountList(accounts))?,
                }
            }
            Self::Find(name) => match find_account(client, &name).await? {
                Some(account) => format.write(writer, &AccountList(vec![account]))?,
                None => format.write(writer, &Message::info(format!("Account {name} not found.")))?,
            },
            Self::SetBlocked { name, blocked } => {
                client
                    .set_blocked(EntityKind::Account, &name, None, blocked)
                    .await?;
                let verb = if blocked { "blocked" } else { "unblocked" };
                format.write(writer, &Message::success(format!("Account {name} {verb}")))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{PartitionListArgs, QosListArgs};
    use crate::client::testing::{fake_client, FakeTransport};
    use sched_proto::{CtlReply, CtlRequest};

    fn modify_args() -> ModifyAccountArgs {
        ModifyAccountArgs {
            name: "physics".into(),
            description: None,
            partitions: PartitionListArgs::default(),
            qos_list: QosListArgs::default(),
            default_qos: None,
            force: false,
        }
    }

    async fn run(
        command: AccountCommand,
        transport: FakeTransport,
    ) -> (Result<(), CliError>, String, Vec<CtlRequest>) {
        let mut client = fake_client(transport);
        let mut out = Vec::new();
        let result = command
            .execute(&mut client, &mut out, &OutputFormat::default())
            .await;
        (
            result,
            String::from_utf8(out).expect("utf8"),
            client.into_inner().requests,
        )
    }

    fn accounts(accounts: Vec<Account>) -> CtlReply {
        CtlReply::Accounts {
            ok: true,
            reason: String::new(),
            accounts,
        }
    }

    #[tokio::test]
    async fn add_builds_account() {
        let args = AddAccountArgs {
            name: "physics".into(),
            description: Some("dept".into()),
            parent: Some("science".into()),
            partition: vec!["cpu".into()],
            default_qos: None,
            qos_list: vec!["normal".into()],
        };
        let command = AccountCommand::add(args).expect("valid");
        let (result, out, requests) = run(command, FakeTransport::new()).await;
        result.expect("ok");
        assert_eq!(out, "✓ Account physics added\n");
        let CtlRequest::AddAccount { account, .. } = &requests[0] else {
            panic!("expected add_account");
        };
        assert_eq!(account.parent_account.as_deref(), Some("science"));
        assert_eq!(account.allowed_qos_list, vec!["normal".to_string()]);
    }

    #[test]
    fn add_rejects_empty_name() {
        let args = AddAccountArgs {
            name: " ".into(),
            description: None,
            parent: None,
            partition: vec![],
            default_qos: None,
            qos_list: vec![],
        };
        assert!(matches!(AccountCommand::add(args), Err(CliError::Usage(_))));
    }

    #[test]
    fn modify_without_items_fails_before_any_call() {
        let err = AccountCommand::modify(&modify_args()).unwrap_err();
        assert!(err.to_string().contains("at least one modification item"));
    }

    #[tokio::test]
    async fn modify_reports_applied_attributes() {
        let args = ModifyAccountArgs {
            description: Some("new".into()),
            default_qos: Some("normal".into()),
            force: true,
            ..modify_args()
        };
        let command = AccountCommand::modify(&args).expect("valid");
        let (result, out, requests) = run(command, FakeTransport::new()).await;
        result.expect("ok");
        assert_eq!(requests.len(), 2);
        assert!(requests
            .iter()
            .all(|r| matches!(r, CtlRequest::ModifyEntity { force: true, .. })));
        assert_eq!(out, "✓ Account physics modified: description, default_qos\n");
    }

    #[tokio::test]
    async fn modify_rejection_is_partial_error() {
        let args = ModifyAccountArgs {
            description: Some("new".into()),
            default_qos: Some("ghost".into()),
            ..modify_args()
        };
        let command = AccountCommand::modify(&args).expect("valid");
        let transport = FakeTransport::new()
            .reply(CtlReply::ack())
            .reply(CtlReply::rejected("qos ghost not allowed"));
        let (result, out, _) = run(command, transport).await;
        let err = result.unwrap_err();
        assert_eq!(err.exit_code(), crate::error::exit_codes::REJECTED);
        assert!(err.to_string().contains("already applied: description"));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn find_missing_prints_not_found() {
        let command = AccountCommand::Find("ghost".into());
        let (result, out, _) = run(command, FakeTransport::new().reply(accounts(vec![]))).await;
        result.expect("not found is not an error");
        assert_eq!(out, "Account ghost not found.\n");
    }

    #[tokio::test]
    async fn show_with_field_format() {
        let command = AccountCommand::show(&ShowAccountArgs {
            noheader: false,
            format: Some("%.8n|%q".into()),
        })
        .expect("valid");
        let reply = accounts(vec![Account {
            name: "physics".into(),
            allowed_qos_list: vec!["normal".into(), "high".into()],
            ..Account::default()
        }]);
        let (result, out, _) = run(command, FakeTransport::new().reply(reply)).await;
        result.expect("ok");
        assert_eq!(out, "NAME    |ALLOWED_QOS_LIST\nphysics |normal,high\n");
    }

    #[test]
    fn show_rejects_bad_format_locally() {
        let err = AccountCommand::show(&ShowAccountArgs {
            noheader: true,
            format: Some("%z".into()),
        })
        .unwrap_err();
        assert_eq!(err.exit_code(), crate::error::exit_codes::USAGE);
    }

    #[tokio::test]
    async fn block_and_unblock() {
        let command = AccountCommand::SetBlocked {
            name: "physics".into(),
            blocked: false,
        };
        let (result, out, requests) = run(command, FakeTransport::new()).await;
        result.expect("ok");
        assert_eq!(out, "✓ Account physics unblocked\n");
        assert!(matches!(
            requests[0],
            CtlRequest::SetEntityBlocked { blocked: false, .. }
        ));
    }
}
