//! Management entities owned by the control daemon.
//!
//! Accounts form a tree, users belong to an account, and QoS policies are
//! referenced by name from both. The client never stores these records; they
//! are received, displayed and dropped within a single invocation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtoError;

/// Count limit meaning "unlimited" (jobs per user, CPUs per user).
pub const UNLIMITED_COUNT: u32 = u32::MAX;

/// Time limit meaning "unlimited": the largest duration the daemon can represent.
pub const UNLIMITED_TIME_LIMIT_SECS: u64 = 315_576_000_000;

/// Kind of managed entity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// An account (node of the account tree).
    Account,
    /// A user under an account.
    User,
    /// A quality-of-service policy.
    Qos,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account => write!(f, "account"),
            Self::User => write!(f, "user"),
            Self::Qos => write!(f, "qos"),
        }
    }
}

/// Administrative privilege of a user.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AdminLevel {
    /// Regular user.
    #[default]
    None,
    /// May manage accounts and users below their own.
    Operator,
    /// Full administrative rights.
    Admin,
}

impl AdminLevel {
    /// Wire and display name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Operator => "operator",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for AdminLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminLevel {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "operator" => Ok(Self::Operator),
            "admin" => Ok(Self::Admin),
            _ => Err(ProtoError::InvalidValue {
                what: "admin level (expected none, operator or admin)",
                value: s.to_string(),
            }),
        }
    }
}

/// How a modify request changes an attribute.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ModifyOperation {
    /// Replace the current value.
    Overwrite,
    /// Union the supplied values into the current ones.
    Add,
    /// Remove the supplied values from the current ones.
    Delete,
}

impl fmt::Display for ModifyOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overwrite => write!(f, "overwrite"),
            Self::Add => write!(f, "add"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Modifiable entity attribute.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    /// Free-form description (accounts, QoS).
    Description,
    /// Allowed partition list (accounts, users).
    AllowedPartition,
    /// Allowed QoS list (accounts, users).
    AllowedQosList,
    /// Default QoS (accounts, users).
    DefaultQos,
    /// Administrative level (users).
    AdminLevel,
    /// Job priority (QoS).
    Priority,
    /// Maximum concurrent jobs per user (QoS).
    MaxJobsPerUser,
    /// Maximum CPUs per user (QoS).
    MaxCpusPerUser,
    /// Maximum time limit per job in seconds (QoS).
    MaxTimeLimitPerTask,
}

impl Attribute {
    /// Wire name of the attribute.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::AllowedPartition => "allowed_partition",
            Self::AllowedQosList => "allowed_qos_list",
            Self::DefaultQos => "default_qos",
            Self::AdminLevel => "admin_level",
            Self::Priority => "priority",
            Self::MaxJobsPerUser => "max_jobs_per_user",
            Self::MaxCpusPerUser => "max_cpus_per_user",
            Self::MaxTimeLimitPerTask => "max_time_limit_per_task",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An account record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    /// Unique account name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Parent account, absent for roots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_account: Option<String>,
    /// Partitions the account may submit to.
    #[serde(default)]
    pub allowed_partitions: Vec<String>,
    /// Default QoS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_qos: Option<String>,
    /// QoS policies the account may use.
    #[serde(default)]
    pub allowed_qos_list: Vec<String>,
    /// Users directly under the account (read-only).
    #[serde(default)]
    pub users: Vec<String>,
    /// Child accounts (read-only).
    #[serde(default)]
    pub child_accounts: Vec<String>,
    /// Coordinators of the account (read-only).
    #[serde(default)]
    pub coordinators: Vec<String>,
    /// Whether the account is blocked (read-only).
    #[serde(default)]
    pub blocked: bool,
}

/// Per-partition QoS settings of a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartitionQos {
    /// Partition name.
    pub partition: String,
    /// QoS policies allowed in the partition.
    #[serde(default)]
    pub allowed_qos_list: Vec<String>,
    /// Default QoS in the partition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_qos: Option<String>,
}

/// A user record, scoped to one account.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// User name.
    pub name: String,
    /// Numeric uid (assigned by the daemon).
    #[serde(default)]
    pub uid: u32,
    /// Owning account.
    pub account: String,
    /// Administrative level.
    #[serde(default)]
    pub admin_level: AdminLevel,
    /// Per-partition QoS overrides.
    #[serde(default)]
    pub allowed_partition_qos: Vec<PartitionQos>,
    /// Coordinator of the owning account.
    #[serde(default)]
    pub coordinator: bool,
    /// Whether the user is blocked (read-only).
    #[serde(default)]
    pub blocked: bool,
}

/// A QoS policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Qos {
    /// Unique policy name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Job priority.
    #[serde(default)]
    pub priority: u32,
    /// Maximum concurrent jobs per user.
    #[serde(default = "unlimited_count")]
    pub max_jobs_per_user: u32,
    /// Maximum CPUs per user.
    #[serde(default = "unlimited_count")]
    pub max_cpus_per_user: u32,
    /// Maximum time limit per job, in seconds.
    #[serde(default = "unlimited_time_limit")]
    pub max_time_limit_per_task: u64,
}

impl Qos {
    /// A policy with the given name and every limit unlimited.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            priority: 0,
            max_jobs_per_user: UNLIMITED_COUNT,
            max_cpus_per_user: UNLIMITED_COUNT,
            max_time_limit_per_task: UNLIMITED_TIME_LIMIT_SECS,
        }
    }
}

const fn unlimited_count() -> u32 {
    UNLIMITED_COUNT
}

const fn unlimited_time_limit() -> u64 {
    UNLIMITED_TIME_LIMIT_SECS
}
