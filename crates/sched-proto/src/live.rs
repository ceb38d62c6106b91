//! Live cluster state snapshots.
//!
//! These records are returned by the daemon on demand and have no mutation
//! path in the client.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State of a compute node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    /// No job running.
    Idle,
    /// Partially allocated.
    Mix,
    /// Fully allocated.
    Alloc,
    /// Not responding.
    Down,
    /// Refusing new jobs.
    Drain,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Mix => write!(f, "MIX"),
            Self::Alloc => write!(f, "ALLOC"),
            Self::Down => write!(f, "DOWN"),
            Self::Drain => write!(f, "DRAIN"),
        }
    }
}

/// State of a partition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PartitionState {
    /// Accepting jobs.
    Up,
    /// Not accepting jobs.
    Down,
}

impl fmt::Display for PartitionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "UP"),
            Self::Down => write!(f, "DOWN"),
        }
    }
}

/// Status of a job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for resources.
    Pending,
    /// Running.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
    /// Killed for exceeding its time limit.
    ExceedTimeLimit,
    /// Cancelled by a user or operator.
    Cancelled,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Running => write!(f, "Running"),
            Self::Completed => write!(f, "Completed"),
            Self::Failed => write!(f, "Failed"),
            Self::ExceedTimeLimit => write!(f, "ExceedTimeLimit"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Snapshot of one compute node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeInfo {
    /// Host name.
    pub hostname: String,
    /// Current state.
    pub state: NodeState,
    /// Total CPUs.
    pub cpu: f64,
    /// Allocated CPUs.
    pub alloc_cpu: f64,
    /// Free CPUs.
    pub free_cpu: f64,
    /// Total memory in bytes.
    pub real_mem: u64,
    /// Allocated memory in bytes.
    pub alloc_mem: u64,
    /// Free memory in bytes.
    pub free_mem: u64,
    /// Partitions the node belongs to.
    #[serde(default)]
    pub partition_names: Vec<String>,
    /// Number of jobs running on the node.
    pub running_task_num: u32,
}

/// Snapshot of one partition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartitionInfo {
    /// Partition name.
    pub name: String,
    /// Current state.
    pub state: PartitionState,
    /// Nodes in the partition.
    pub total_nodes: u32,
    /// Nodes currently alive.
    pub alive_nodes: u32,
    /// Total CPUs.
    pub total_cpu: f64,
    /// CPUs available for allocation.
    pub avail_cpu: f64,
    /// Allocated CPUs.
    pub alloc_cpu: f64,
    /// Total memory in bytes.
    pub total_mem: u64,
    /// Available memory in bytes.
    pub avail_mem: u64,
    /// Allocated memory in bytes.
    pub alloc_mem: u64,
    /// Compressed host list, e.g. `cn[01-16]`.
    #[serde(default)]
    pub hostlist: String,
}

/// Snapshot of one job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskInfo {
    /// Job id.
    pub task_id: u32,
    /// Job name.
    pub name: String,
    /// Owner uid.
    pub uid: u32,
    /// Owner gid.
    pub gid: u32,
    /// Charged account.
    pub account: String,
    /// Current status.
    pub status: TaskStatus,
    /// Time limit in seconds.
    pub time_limit_secs: u64,
    /// Submission time.
    #[serde(default)]
    pub submit_time: Option<DateTime<Utc>>,
    /// Start time, if started.
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    /// End time, if finished.
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Partition the job runs in.
    pub partition: String,
    /// Nodes allocated to the job.
    #[serde(default)]
    pub craned_list: String,
    /// Number of allocated nodes.
    pub node_num: u32,
    /// Submitted command line.
    #[serde(default)]
    pub cmd_line: String,
    /// Working directory.
    #[serde(default)]
    pub cwd: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_state_display() {
        assert_eq!(NodeState::Idle.to_string(), "IDLE");
        assert_eq!(NodeState::Drain.to_string(), "DRAIN");
    }

    #[test]
    fn test_task_info_absent_times() {
        let json = r#"{
            "task_id": 7, "name": "train", "uid": 1000, "gid": 1000,
            "account": "physics", "status": "pending", "time_limit_secs": 3600,
            "partition": "gpu", "node_num": 1
        }"#;
        let task: TaskInfo = serde_json::from_str(json).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.start_time.is_none());
        assert!(task.cmd_line.is_empty());
    }
}
