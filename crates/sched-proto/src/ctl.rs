//! Control protocol between the administration tools and the control daemon.
//!
//! Every request is answered by exactly one reply. Mutations are answered with
//! an [`CtlReply::Ack`]; queries with a typed record list. A daemon-level
//! failure (malformed request, unsupported operation) is an [`CtlReply::Error`].
//!
//! # Message Flow
//!
//! ```text
//! ┌───────────┐     CtlRequest     ┌──────────────┐
//! │ schedacct │───────────────────►│              │
//! │ schedctl  │◄───────────────────│     ctld     │
//! └───────────┘      CtlReply      └──────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use sched_proto::ctl::{CtlReply, CtlRequest};
//! use sched_proto::EntityKind;
//!
//! let request = CtlRequest::QueryEntities {
//!     uid: 1000,
//!     kind: EntityKind::Qos,
//!     name: None,
//!     account: None,
//! };
//! let json = request.to_json().unwrap();
//! assert!(json.contains("query_entities"));
//!
//! let reply = CtlReply::from_json(r#"{"type": "ack", "ok": false, "reason": "no such qos"}"#).unwrap();
//! assert_eq!(reply, CtlReply::Ack { ok: false, reason: "no such qos".into() });
//! ```

use serde::{Deserialize, Serialize};

use crate::entity::{Account, Attribute, EntityKind, ModifyOperation, Qos, User};
use crate::live::{NodeInfo, PartitionInfo, TaskInfo};
use crate::ProtoError;

/// Protocol version for control communication.
pub const CTL_PROTOCOL_VERSION: u32 = 1;

/// Messages sent from a tool to the control daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CtlRequest {
    /// Handshake.
    Hello {
        /// Client version.
        version: String,
        /// Protocol version.
        protocol_version: u32,
    },

    // =========================================================================
    // Entity management
    // =========================================================================
    /// Create an account.
    AddAccount {
        /// Requesting operator.
        uid: u32,
        /// Account to create.
        account: Account,
    },

    /// Create a user under an account.
    AddUser {
        /// Requesting operator.
        uid: u32,
        /// User to create.
        user: User,
    },

    /// Create a QoS policy.
    AddQos {
        /// Requesting operator.
        uid: u32,
        /// Policy to create.
        qos: Qos,
    },

    /// Remove an entity.
    DeleteEntity {
        /// Requesting operator.
        uid: u32,
        /// Entity kind.
        kind: EntityKind,
        /// Entity name.
        name: String,
        /// Account scope (users only).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        account: Option<String>,
    },

    /// Change one attribute of an entity.
    ModifyEntity {
        /// Requesting operator.
        uid: u32,
        /// Entity kind.
        kind: EntityKind,
        /// Entity name.
        name: String,
        /// Account scope (users only).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        account: Option<String>,
        /// Partition scope (users only).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        partition: Option<String>,
        /// Attribute to change.
        attribute: Attribute,
        /// New value, string encoded.
        value: String,
        /// How to apply the value.
        operation: ModifyOperation,
        /// Apply even if dependent records are affected.
        #[serde(default)]
        force: bool,
    },

    /// List entities, optionally filtered.
    QueryEntities {
        /// Requesting operator.
        uid: u32,
        /// Entity kind.
        kind: EntityKind,
        /// Exact name filter.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        /// Account scope (users only).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        account: Option<String>,
    },

    /// Block or unblock an account or a user.
    SetEntityBlocked {
        /// Requesting operator.
        uid: u32,
        /// Entity kind.
        kind: EntityKind,
        /// Entity name.
        name: String,
        /// Account scope (users only).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        account: Option<String>,
        /// New blocked state.
        blocked: bool,
    },

    // =========================================================================
    // Live state
    // =========================================================================
    /// List nodes, or one node by name.
    QueryNodes {
        /// Exact node name filter.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// List partitions, or one partition by name.
    QueryPartitions {
        /// Exact partition name filter.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// List jobs; an empty id list means all jobs.
    QueryTasks {
        /// Job ids to return.
        #[serde(default)]
        task_ids: Vec<u32>,
    },

    /// Change an attribute of a job.
    ModifyTask {
        /// Requesting operator.
        uid: u32,
        /// Job id.
        task_id: u32,
        /// Change to apply.
        change: TaskChange,
    },

    /// Drain or resume a node.
    ModifyNodeState {
        /// Requesting operator.
        uid: u32,
        /// Node name.
        node: String,
        /// Target state.
        state: NodeStateChange,
        /// Reason recorded with the change.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

/// A job attribute change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "attribute", rename_all = "snake_case")]
pub enum TaskChange {
    /// New time limit.
    TimeLimit {
        /// Limit in seconds.
        seconds: u64,
    },
    /// New priority.
    Priority {
        /// Priority value.
        value: u32,
    },
}

/// Requested node state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NodeStateChange {
    /// Stop scheduling new jobs on the node.
    Drain,
    /// Return the node to service.
    Resume,
}

/// Replies sent from the control daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CtlReply {
    /// Handshake accepted.
    Welcome {
        /// Daemon version.
        server_version: String,
        /// Protocol version.
        protocol_version: u32,
    },

    /// Outcome of a mutation.
    Ack {
        /// Whether the mutation was applied.
        ok: bool,
        /// Rejection reason.
        #[serde(default)]
        reason: String,
    },

    /// Account query result.
    Accounts {
        /// Whether the query succeeded.
        ok: bool,
        /// Failure reason.
        #[serde(default)]
        reason: String,
        /// Matching accounts.
        #[serde(default)]
        accounts: Vec<Account>,
    },

    /// User query result.
    Users {
        /// Whether the query succeeded.
        ok: bool,
        /// Failure reason.
        #[serde(default)]
        reason: String,
        /// Matching users.
        #[serde(default)]
        users: Vec<User>,
    },

    /// QoS query result.
    QosList {
        /// Whether the query succeeded.
        ok: bool,
        /// Failure reason.
        #[serde(default)]
        reason: String,
        /// Matching policies.
        #[serde(default)]
        qos: Vec<Qos>,
    },

    /// Node query result.
    Nodes {
        /// Matching nodes.
        nodes: Vec<NodeInfo>,
    },

    /// Partition query result.
    Partitions {
        /// Matching partitions.
        partitions: Vec<PartitionInfo>,
    },

    /// Job query result.
    Tasks {
        /// Whether the query succeeded.
        ok: bool,
        /// Failure reason.
        #[serde(default)]
        reason: String,
        /// Matching jobs.
        #[serde(default)]
        tasks: Vec<TaskInfo>,
    },

    /// Daemon-level error.
    Error {
        /// Error code.
        code: u32,
        /// Error message.
        message: String,
        /// Original request type (if applicable).
        request_type: Option<String>,
    },
}

/// Error codes carried by [`CtlReply::Error`].
pub mod error_codes {
    /// Request could not be decoded.
    pub const INVALID_REQUEST: u32 = 2001;
    /// Operator lacks the privilege for the request.
    pub const PERMISSION_DENIED: u32 = 2002;
    /// Internal daemon error.
    pub const INTERNAL_ERROR: u32 = 2003;
    /// Protocol version mismatch.
    pub const PROTOCOL_MISMATCH: u32 = 2004;
}

impl CtlRequest {
    /// Create a hello message.
    #[must_use]
    pub fn hello(version: impl Into<String>) -> Self {
        Self::Hello {
            version: version.into(),
            protocol_version: CTL_PROTOCOL_VERSION,
        }
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> Result<Self, ProtoError> {
        serde_json::from_str(json).map_err(|e| ProtoError::Decoding(e.to_string()))
    }

    /// Get the request type name for error reporting.
    #[must_use]
    pub const fn request_type(&self) -> &'static str {
        match self {
            Self::Hello { .. } => "hello",
            Self::AddAccount { .. } => "add_account",
            Self::AddUser { .. } => "add_user",
            Self::AddQos { .. } => "add_qos",
            Self::DeleteEntity { .. } => "delete_entity",
            Self::ModifyEntity { .. } => "modify_entity",
            Self::QueryEntities { .. } => "query_entities",
            Self::SetEntityBlocked { .. } => "set_entity_blocked",
            Self::QueryNodes { .. } => "query_nodes",
            Self::QueryPartitions { .. } => "query_partitions",
            Self::QueryTasks { .. } => "query_tasks",
            Self::ModifyTask { .. } => "modify_task",
            Self::ModifyNodeState { .. } => "modify_node_state",
        }
    }
}

impl CtlReply {
    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> Result<Self, ProtoError> {
        serde_json::from_str(json).map_err(|e| ProtoError::Decoding(e.to_string()))
    }

    /// Create a successful acknowledgement.
    #[must_use]
    pub fn ack() -> Self {
        Self::Ack {
            ok: true,
            reason: String::new(),
        }
    }

    /// Create a rejection.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Ack {
            ok: false,
            reason: reason.into(),
        }
    }
}
