//! Translation of modification flags into ordered attribute changes.
//!
//! Each entity kind has a plain modification struct whose fields mirror the
//! flags the operator may pass (`None` means "flag absent"). Resolving one
//! yields the [`AttributeChange`]s to send, always in this order:
//!
//! 1. description
//! 2. allowed partition list
//! 3. allowed QoS list
//! 4. default QoS
//! 5. kind-specific trailers (admin level; priority and limits for QoS)
//!
//! List values are passed through as given. For `Add`/`Delete` the daemon
//! computes the union or difference.

use sched_proto::{AdminLevel, Attribute, ModifyOperation};

use crate::error::CliError;
use crate::units::{encode_duration, encode_list, encode_uint};

/// One attribute mutation, consumed by exactly one remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeChange {
    /// Attribute to change.
    pub attribute: Attribute,
    /// How to apply `value`.
    pub operation: ModifyOperation,
    /// Wire-encoded value.
    pub value: String,
}

impl AttributeChange {
    /// An overwrite of `attribute` with `value`.
    #[must_use]
    pub fn overwrite(attribute: Attribute, value: impl Into<String>) -> Self {
        Self {
            attribute,
            operation: ModifyOperation::Overwrite,
            value: value.into(),
        }
    }
}

/// Set/add/delete flags for one list attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListEdit {
    /// Replace the list.
    pub set: Option<Vec<String>>,
    /// Add to the list.
    pub add: Option<Vec<String>>,
    /// Remove from the list.
    pub delete: Option<Vec<String>>,
}

impl ListEdit {
    /// Replace the list with `items`.
    #[must_use]
    pub fn set(items: &[&str]) -> Self {
        Self {
            set: Some(owned(items)),
            ..Self::default()
        }
    }

    /// Add `items` to the list.
    #[must_use]
    pub fn add(items: &[&str]) -> Self {
        Self {
            add: Some(owned(items)),
            ..Self::default()
        }
    }

    /// Remove `items` from the list.
    #[must_use]
    pub fn delete(items: &[&str]) -> Self {
        Self {
            delete: Some(owned(items)),
            ..Self::default()
        }
    }

    /// Whether no flag was given.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.set.is_none() && self.add.is_none() && self.delete.is_none()
    }

    /// The single change this edit produces for `attribute`, if any.
    ///
    /// # Errors
    ///
    /// Returns a usage error if more than one of set/add/delete is present.
    pub fn resolve(&self, attribute: Attribute) -> Result<Option<AttributeChange>, CliError> {
        let present = [
            (ModifyOperation::Overwrite, &self.set),
            (ModifyOperation::Add, &self.add),
            (ModifyOperation::Delete, &self.delete),
        ];
        let mut chosen = present
            .into_iter()
            .filter_map(|(operation, items)| items.as_ref().map(|items| (operation, items)));

        let Some((operation, items)) = chosen.next() else {
            return Ok(None);
        };
        if chosen.next().is_some() {
            return Err(CliError::Usage(format!(
                "only one of set, add or delete may be given for {attribute}"
            )));
        }

        Ok(Some(AttributeChange {
            attribute,
            operation,
            value: encode_list(items),
        }))
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Requested changes to an account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountModification {
    /// New description.
    pub description: Option<String>,
    /// Allowed partition list edit.
    pub partitions: ListEdit,
    /// Allowed QoS list edit.
    pub qos_list: ListEdit,
    /// New default QoS.
    pub default_qos: Option<String>,
}

impl AccountModification {
    /// Ordered changes for this modification.
    ///
    /// # Errors
    ///
    /// Returns a usage error on conflicting list flags or when nothing would change.
    pub fn resolve(&self) -> Result<Vec<AttributeChange>, CliError> {
        let mut changes = Vec::new();
        if let Some(description) = &self.description {
            changes.push(AttributeChange::overwrite(Attribute::Description, description));
        }
        changes.extend(self.partitions.resolve(Attribute::AllowedPartition)?);
        changes.extend(self.qos_list.resolve(Attribute::AllowedQosList)?);
        if let Some(qos) = &self.default_qos {
            changes.push(AttributeChange::overwrite(Attribute::DefaultQos, qos));
        }
        non_empty(changes)
    }
}

/// Requested changes to a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserModification {
    /// Allowed partition list edit.
    pub partitions: ListEdit,
    /// Allowed QoS list edit.
    pub qos_list: ListEdit,
    /// New default QoS.
    pub default_qos: Option<String>,
    /// New administrative level.
    pub admin_level: Option<AdminLevel>,
}

impl UserModification {
    /// Ordered changes for this modification.
    ///
    /// # Errors
    ///
    /// Returns a usage error on conflicting list flags or when nothing would change.
    pub fn resolve(&self) -> Result<Vec<AttributeChange>, CliError> {
        let mut changes = Vec::new();
        changes.extend(self.partitions.resolve(Attribute::AllowedPartition)?);
        changes.extend(self.qos_list.resolve(Attribute::AllowedQosList)?);
        if let Some(qos) = &self.default_qos {
            changes.push(AttributeChange::overwrite(Attribute::DefaultQos, qos));
        }
        if let Some(level) = self.admin_level {
            changes.push(AttributeChange::overwrite(Attribute::AdminLevel, level.as_str()));
        }
        non_empty(changes)
    }
}

/// Requested changes to a QoS policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QosModification {
    /// New description.
    pub description: Option<String>,
    /// New priority.
    pub priority: Option<u32>,
    /// New per-user job limit.
    pub max_jobs_per_user: Option<u32>,
    /// New per-user CPU limit.
    pub max_cpus_per_user: Option<u32>,
    /// New per-job time limit in seconds.
    pub max_time_limit_per_task: Option<u64>,
}

impl QosModification {
    /// Ordered changes for this modification.
    ///
    /// # Errors
    ///
    /// Returns a usage error when nothing would change.
    pub fn resolve(&self) -> Result<Vec<AttributeChange>, CliError> {
        let mut changes = Vec::new();
        if let Some(description) = &self.description {
            changes.push(AttributeChange::overwrite(Attribute::Description, description));
        }
        let counts = [
            (Attribute::Priority, self.priority),
            (Attribute::MaxJobsPerUser, self.max_jobs_per_user),
            (Attribute::MaxCpusPerUser, self.max_cpus_per_user),
        ];
        for (attribute, value) in counts {
            if let Some(value) = value {
                changes.push(AttributeChange::overwrite(attribute, encode_uint(value)));
            }
        }
        if let Some(secs) = self.max_time_limit_per_task {
            changes.push(AttributeChange::overwrite(
                Attribute::MaxTimeLimitPerTask,
                encode_duration(secs),
            ));
        }
        non_empty(changes)
    }
}

fn non_empty(changes: Vec<AttributeChange>) -> Result<Vec<AttributeChange>, CliError> {
    if changes.is_empty() {
        return Err(CliError::Usage(
            "you must specify at least one modification item".to_string(),
        ));
    }
    Ok(changes)
}
