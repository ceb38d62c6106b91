//! List and find queries over accounts, users and QoS policies.
//!
//! An empty filter lists everything of a kind. A name filter finds one
//! record; getting nothing back is an ordinary outcome, not an error.

use sched_proto::{Account, NodeInfo, PartitionInfo, Qos, User};

use crate::client::{ControlClient, Transport};
use crate::error::CliError;

/// Query filter sent with `QueryEntities`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityFilter {
    /// Exact entity name.
    pub name: Option<String>,
    /// Parent account (users only).
    pub account: Option<String>,
}

impl EntityFilter {
    /// Match everything.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Match one name.
    #[must_use]
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            account: None,
        }
    }

    /// Restrict to one account.
    #[must_use]
    pub fn in_account(mut self, account: Option<String>) -> Self {
        self.account = account;
        self
    }
}

/// Records addressed by a unique name.
pub trait Named {
    /// The record's name.
    fn name(&self) -> &str;
}

impl Named for Account {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Qos {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for User {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for NodeInfo {
    fn name(&self) -> &str {
        &self.hostname
    }
}

impl Named for PartitionInfo {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Pick the record called `name` out of a filtered reply.
///
/// # Errors
///
/// Returns a backend error if the reply holds the name more than once.
pub fn exactly_one<T: Named>(records: Vec<T>, name: &str) -> Result<Option<T>, CliError> {
    let mut matching = records.into_iter().filter(|r| r.name() == name);
    let first = matching.next();
    if matching.next().is_some() {
        return Err(CliError::Backend(format!(
            "reply contains more than one record named {name}"
        )));
    }
    Ok(first)
}

/// List all accounts.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn list_accounts<T: Transport>(
    client: &mut ControlClient<T>,
) -> Result<Vec<Account>, CliError> {
    client.query_accounts(&EntityFilter::all()).await
}

/// Find one account.
///
/// # Errors
///
/// Returns an error if the query fails or the reply is inconsistent.
pub async fn find_account<T: Transport>(
    client: &mut ControlClient<T>,
    name: &str,
) -> Result<Option<Account>, CliError> {
    let accounts = client.query_accounts(&EntityFilter::by_name(name)).await?;
    exactly_one(accounts, name)
}

/// List users, optionally scoped to one account.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn list_users<T: Transport>(
    client: &mut ControlClient<T>,
    account: Option<&str>,
) -> Result<Vec<User>, CliError> {
    let filter = EntityFilter::all().in_account(account.map(str::to_string));
    client.query_users(&filter).await
}

/// Find a user's memberships.
///
/// A user may belong to several accounts, so this returns one record per
/// membership; empty means not found.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn find_user<T: Transport>(
    client: &mut ControlClient<T>,
    name: &str,
    account: Option<&str>,
) -> Result<Vec<User>, CliError> {
    let filter = EntityFilter::by_name(name).in_account(account.map(str::to_string));
    let users = client.query_users(&filter).await?;
    Ok(users.into_iter().filter(|u| u.name == name).collect())
}

/// List all QoS policies.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn list_qos<T: Transport>(client: &mut ControlClient<T>) -> Result<Vec<Qos>, CliError> {
    client.query_qos(&EntityFilter::all()).await
}

/// Find one QoS policy.
///
/// # Errors
///
/// Returns an error if the query fails or the reply is inconsistent.
pub async fn find_qos<T: Transport>(
    client: &mut ControlClient<T>,
    name: &str,
) -> Result<Option<Qos>, CliError> {
    let qos = client.query_qos(&EntityFilter::by_name(name)).await?;
    exactly_one(qos, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{fake_client, FakeTransport};
    use sched_proto::{CtlReply, CtlRequest, EntityKind};

    fn account(name: &str) -> Account {
        Account {
            name: name.into(),
            ..Account::default()
        }
    }

    fn accounts_reply(accounts: Vec<Account>) -> CtlReply {
        CtlReply::Accounts {
            ok: true,
            reason: String::new(),
            accounts,
        }
    }

    #[tokio::test]
    async fn test_find_sends_name_filter() {
        let transport = FakeTransport::new().reply(accounts_reply(vec![account("physics")]));
        let mut client = fake_client(transport);
        let found = find_account(&mut client, "physics").await.expect("ok");
        assert_eq!(found.map(|a| a.name), Some("physics".to_string()));

        let requests = client.into_inner().requests;
        assert_eq!(
            requests,
            vec![CtlRequest::QueryEntities {
                uid: 1000,
                kind: EntityKind::Account,
                name: Some("physics".into()),
                account: None,
            }]
        );
    }

    #[tokio::test]
    async fn test_find_missing_is_none() {
        let transport = FakeTransport::new().reply(accounts_reply(vec![]));
        let mut client = fake_client(transport);
        assert!(find_account(&mut client, "ghost").await.expect("ok").is_none());
    }

    #[tokio::test]
    async fn test_list_sends_empty_filter() {
        let transport =
            FakeTransport::new().reply(accounts_reply(vec![account("a"), account("b")]));
        let mut client = fake_client(transport);
        assert_eq!(list_accounts(&mut client).await.expect("ok").len(), 2);
        assert!(matches!(
            &client.into_inner().requests[0],
            CtlRequest::QueryEntities { name: None, account: None, .. }
        ));
    }

    #[tokio::test]
    async fn test_users_scoped_to_account() {
        let transport = FakeTransport::new().reply(CtlReply::Users {
            ok: true,
            reason: String::new(),
            users: vec![],
        });
        let mut client = fake_client(transport);
        list_users(&mut client, Some("physics")).await.expect("ok");
        assert!(matches!(
            &client.into_inner().requests[0],
            CtlRequest::QueryEntities { kind: EntityKind::User, account: Some(a), .. } if a == "physics"
        ));
    }

    #[test]
    fn test_exactly_one_ignores_other_names() {
        let found = exactly_one(vec![account("a"), account("b")], "b").expect("ok");
        assert_eq!(found.map(|a| a.name), Some("b".to_string()));
    }

    #[test]
    fn test_exactly_one_rejects_duplicates() {
        let err = exactly_one(vec![account("a"), account("a")], "a").unwrap_err();
        assert_eq!(err.exit_code(), crate::error::exit_codes::BACKEND);
    }
}
