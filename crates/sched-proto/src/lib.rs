//! # sched-proto
//!
//! Protocol definitions shared by the scheduler administration tools.
//!
//! - [`entity`] - accounts, users and QoS policies managed by the control daemon
//! - [`live`] - read-only snapshots of nodes, partitions and jobs
//! - [`ctl`] - the request/reply messages exchanged with the control daemon

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ctl;
pub mod entity;
pub mod error;
pub mod live;

pub use ctl::{CtlReply, CtlRequest, CTL_PROTOCOL_VERSION};
pub use entity::{
    Account, AdminLevel, Attribute, EntityKind, ModifyOperation, PartitionQos, Qos, User,
    UNLIMITED_COUNT, UNLIMITED_TIME_LIMIT_SECS,
};
pub use error::ProtoError;
pub use live::{NodeInfo, NodeState, PartitionInfo, PartitionState, TaskInfo, TaskStatus};
