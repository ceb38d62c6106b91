//! Sequential, fail-fast execution of attribute changes.

use sched_proto::{Attribute, EntityKind};
use tracing::info;

use crate::client::{ControlClient, Transport};
use crate::error::CliError;
use crate::resolve::AttributeChange;

/// Entity addressed by a modify run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyTarget {
    /// Entity kind.
    pub kind: EntityKind,
    /// Entity name.
    pub name: String,
    /// Account scope (users only).
    pub account: Option<String>,
    /// Partition scope (users only).
    pub partition: Option<String>,
    /// Ask the daemon to apply the change to dependents as well.
    pub force: bool,
}

impl ModifyTarget {
    /// Target an entity by kind and name, without scope.
    #[must_use]
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            account: None,
            partition: None,
            force: false,
        }
    }
}

/// Apply `changes` one call at a time, stopping at the first failure.
///
/// Returns the attributes applied, in order.
///
/// # Errors
///
/// Returns [`CliError::Modify`] naming the failed attribute and those
/// already applied.
pub async fn apply_changes<T: Transport>(
    client: &mut ControlClient<T>,
    target: &ModifyTarget,
    changes: &[AttributeChange],
) -> Result<Vec<Attribute>, CliError> {
    let mut applied = Vec::with_capacity(changes.len());

    for change in changes {
        if let Err(source) = client.modify_entity(target, change).await {
            return Err(CliError::Modify {
                attribute: change.attribute.to_string(),
                applied: applied.iter().map(ToString::to_string).collect(),
                source: Box::new(source),
            });
        }
        info!(
            kind = ?target.kind,
            name = %target.name,
            attribute = %change.attribute,
            operation = ?change.operation,
            "Attribute modified"
        );
        applied.push(change.attribute);
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{fake_client, FakeTransport};
    use crate::resolve::{AccountModification, ListEdit, QosModification};
    use sched_proto::{CtlReply, CtlRequest, ModifyOperation};

    fn modified_attributes(requests: &[CtlRequest]) -> Vec<Attribute> {
        requests
            .iter()
            .filter_map(|r| match r {
                CtlRequest::ModifyEntity { attribute, .. } => Some(*attribute),
                _ => None,
            })
            .collect()
    }

    fn four_changes() -> Vec<AttributeChange> {
        AccountModification {
            description: Some("d".into()),
            partitions: ListEdit::set(&["cpu"]),
            qos_list: ListEdit::add(&["normal"]),
            default_qos: Some("normal".into()),
        }
        .resolve()
        .expect("valid")
    }

    #[tokio::test]
    async fn test_single_change_single_call() {
        let changes = QosModification {
            priority: Some(5),
            ..QosModification::default()
        }
        .resolve()
        .expect("valid");

        let mut client = fake_client(FakeTransport::new());
        let target = ModifyTarget::new(EntityKind::Qos, "normal");
        let applied = apply_changes(&mut client, &target, &changes).await.expect("ok");
        assert_eq!(applied, vec![Attribute::Priority]);

        let requests = client.into_inner().requests;
        assert_eq!(requests.len(), 1);
        assert!(matches!(
            &requests[0],
            CtlRequest::ModifyEntity {
                uid: 1000,
                kind: EntityKind::Qos,
                operation: ModifyOperation::Overwrite,
                value,
                ..
            } if value == "5"
        ));
    }

    #[tokio::test]
    async fn test_all_changes_applied_in_order() {
        let mut client = fake_client(FakeTransport::new());
        let target = ModifyTarget::new(EntityKind::Account, "physics");
        let changes = four_changes();
        let applied = apply_changes(&mut client, &target, &changes).await.expect("ok");
        assert_eq!(applied.len(), 4);
        assert_eq!(modified_attributes(&client.into_inner().requests), applied);
    }

    #[tokio::test]
    async fn test_stops_at_rejected_call() {
        let transport = FakeTransport::new()
            .reply(CtlReply::ack())
            .reply(CtlReply::ack())
            .reply(CtlReply::rejected("qos does not exist"));
        let mut client = fake_client(transport);
        let target = ModifyTarget::new(EntityKind::Account, "physics");

        let err = apply_changes(&mut client, &target, &four_changes())
            .await
            .unwrap_err();

        match &err {
            CliError::Modify {
                attribute,
                applied,
                source,
            } => {
                assert_eq!(attribute, "allowed_qos_list");
                assert_eq!(applied, &["description", "allowed_partition"]);
                assert!(matches!(**source, CliError::Rejected(_)));
            }
            other => panic!("expected partial modify error, got {other:?}"),
        }
        assert_eq!(err.exit_code(), crate::error::exit_codes::REJECTED);

        // The fourth attribute is never sent.
        assert_eq!(
            modified_attributes(&client.into_inner().requests),
            vec![
                Attribute::Description,
                Attribute::AllowedPartition,
                Attribute::AllowedQosList,
            ]
        );
    }

    #[tokio::test]
    async fn test_transport_failure_on_first_call() {
        let transport = FakeTransport::new().fail(CliError::Timeout("request timed out".into()));
        let mut client = fake_client(transport);
        let target = ModifyTarget::new(EntityKind::Account, "physics");

        let err = apply_changes(&mut client, &target, &four_changes())
            .await
            .unwrap_err();
        assert!(matches!(&err, CliError::Modify { applied, .. } if applied.is_empty()));
        assert_eq!(err.exit_code(), crate::error::exit_codes::TRANSPORT);
        assert_eq!(client.into_inner().requests.len(), 1);
    }

    #[tokio::test]
    async fn test_scope_and_force_forwarded() {
        let mut client = fake_client(FakeTransport::new());
        let target = ModifyTarget {
            account: Some("physics".into()),
            partition: Some("gpu".into()),
            force: true,
            ..ModifyTarget::new(EntityKind::User, "alice")
        };
        let changes = vec![AttributeChange::overwrite(Attribute::DefaultQos, "low")];
        apply_changes(&mut client, &target, &changes).await.expect("ok");

        let requests = client.into_inner().requests;
        assert!(matches!(
            &requests[0],
            CtlRequest::ModifyEntity { account: Some(a), partition: Some(p), force: true, .. }
                if a == "physics" && p == "gpu"
        ));
    }
}
