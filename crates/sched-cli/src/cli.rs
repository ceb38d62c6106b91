//! Command-line argument parsing with clap.
//!
//! [`AcctCli`] is the `schedacct` command tree, [`CtlCli`] the `schedctl` one.
//! Mutually exclusive set/add/delete flags are declared here so that clap
//! rejects them before anything else runs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use sched_proto::ctl::NodeStateChange;
use sched_proto::AdminLevel;

use crate::config::DEFAULT_CONFIG_PATH;
use crate::resolve::{AccountModification, ListEdit, QosModification, UserModification};

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable fixed layout.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
    /// One `path = value` line per field.
    Flat,
}

/// Options shared by both tools.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Configuration file.
    #[arg(
        short = 'C',
        long,
        env = "SCHED_CONFIG",
        default_value = DEFAULT_CONFIG_PATH,
        global = true
    )]
    pub config: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Table, global = true)]
    pub output_format: Format,
}

// ============================================================================
// schedacct
// ============================================================================

/// Manage scheduler accounts, users and QoS policies.
#[derive(Parser, Debug, Clone)]
#[command(name = "schedacct")]
#[command(version, about, long_about = None)]
pub struct AcctCli {
    /// Shared options.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: AcctCommands,
}

/// `schedacct` verbs.
#[derive(Subcommand, Debug, Clone)]
pub enum AcctCommands {
    /// Create an account, user or QoS policy.
    Add {
        /// Entity to create.
        #[command(subcommand)]
        entity: AddEntity,
    },

    /// Remove an account, user or QoS policy.
    #[command(alias = "remove")]
    Delete {
        /// Entity to remove.
        #[command(subcommand)]
        entity: NamedEntity,
    },

    /// Change attributes of an account, user or QoS policy.
    Modify {
        /// Entity to change.
        #[command(subcommand)]
        entity: ModifyEntity,
    },

    /// List accounts, users or QoS policies.
    #[command(alias = "list")]
    Show {
        /// Entity kind to list.
        #[command(subcommand)]
        entity: ShowEntity,
    },

    /// Look up one account, user or QoS policy.
    #[command(aliases = ["search", "query"])]
    Find {
        /// Entity to look up.
        #[command(subcommand)]
        entity: NamedEntity,
    },

    /// Block an account or user.
    Block {
        /// Entity to block.
        #[command(subcommand)]
        entity: BlockEntity,
    },

    /// Unblock an account or user.
    Unblock {
        /// Entity to unblock.
        #[command(subcommand)]
        entity: BlockEntity,
    },
}

/// Entities for `add`.
#[derive(Subcommand, Debug, Clone)]
pub enum AddEntity {
    /// Create an account.
    Account(AddAccountArgs),
    /// Add a user to an account.
    User(AddUserArgs),
    /// Create a QoS policy.
    Qos(AddQosArgs),
}

/// Arguments for `add account`.
#[derive(Args, Debug, Clone)]
pub struct AddAccountArgs {
    /// Account name.
    #[arg(short = 'N', long)]
    pub name: String,

    /// Description.
    #[arg(short = 'D', long)]
    pub description: Option<String>,

    /// Parent account.
    #[arg(short = 'P', long)]
    pub parent: Option<String>,

    /// Allowed partitions (comma-separated).
    #[arg(short = 'p', long, value_delimiter = ',')]
    pub partition: Vec<String>,

    /// Default QoS.
    #[arg(short = 'Q', long)]
    pub default_qos: Option<String>,

    /// Allowed QoS list (comma-separated).
    #[arg(short = 'q', long, value_delimiter = ',')]
    pub qos_list: Vec<String>,
}

/// Arguments for `add user`.
#[derive(Args, Debug, Clone)]
pub struct AddUserArgs {
    /// User name.
    #[arg(short = 'N', long)]
    pub name: String,

    /// Owning account.
    #[arg(short = 'A', long)]
    pub account: String,

    /// Allowed partitions (comma-separated).
    #[arg(short = 'p', long, value_delimiter = ',')]
    pub partition: Vec<String>,

    /// Administrative level: none, operator or admin.
    #[arg(short = 'L', long, default_value = "none")]
    pub level: AdminLevel,

    /// Make the user a coordinator of the account.
    #[arg(short = 'c', long)]
    pub coordinator: bool,
}

/// Arguments for `add qos`.
#[derive(Args, Debug, Clone)]
pub struct AddQosArgs {
    /// QoS name.
    #[arg(short = 'N', long)]
    pub name: String,

    /// Description.
    #[arg(short = 'D', long)]
    pub description: Option<String>,

    /// Job priority.
    #[arg(short = 'P', long)]
    pub priority: Option<u32>,

    /// Maximum concurrent jobs per user.
    #[arg(short = 'J', long)]
    pub max_jobs_per_user: Option<u32>,

    /// Maximum CPUs per user.
    #[arg(short = 'c', long)]
    pub max_cpus_per_user: Option<u32>,

    /// Maximum time limit per job, in seconds.
    #[arg(short = 'T', long)]
    pub max_time_limit_per_task: Option<u64>,
}

/// Entities addressed by name, for `delete` and `find`.
#[derive(Subcommand, Debug, Clone)]
pub enum NamedEntity {
    /// An account.
    Account {
        /// Account name.
        name: String,
    },
    /// A user.
    User {
        /// User name.
        name: String,
        /// Restrict to one account.
        #[arg(short = 'A', long)]
        account: Option<String>,
    },
    /// A QoS policy.
    Qos {
        /// QoS name.
        name: String,
    },
}

/// Entities for `show`.
#[derive(Subcommand, Debug, Clone)]
pub enum ShowEntity {
    /// List accounts.
    #[command(alias = "accounts")]
    Account(ShowAccountArgs),
    /// List users.
    #[command(alias = "users")]
    User {
        /// Only users of this account.
        #[arg(short = 'A', long)]
        account: Option<String>,
    },
    /// List QoS policies.
    Qos,
}

/// Arguments for `show account`.
#[derive(Args, Debug, Clone)]
pub struct ShowAccountArgs {
    /// Do not print the header line of a `--format` listing.
    #[arg(short = 'n', long)]
    pub noheader: bool,

    /// Field format, e.g. `%.15n %.20d %q`.
    #[arg(short = 'o', long)]
    pub format: Option<String>,
}

/// Entities for `block` and `unblock`.
#[derive(Subcommand, Debug, Clone)]
pub enum BlockEntity {
    /// An account.
    Account {
        /// Account name.
        name: String,
    },
    /// A user within one account.
    User {
        /// User name.
        name: String,
        /// Account the user belongs to.
        #[arg(short = 'A', long)]
        account: String,
    },
}

/// Entities for `modify`.
#[derive(Subcommand, Debug, Clone)]
pub enum ModifyEntity {
    /// Change an account.
    Account(ModifyAccountArgs),
    /// Change a user.
    User(ModifyUserArgs),
    /// Change a QoS policy.
    Qos(ModifyQosArgs),
}

/// Set/add/delete flags for the allowed partition list.
#[derive(Args, Debug, Clone, Default)]
pub struct PartitionListArgs {
    /// Replace the allowed partition list.
    #[arg(
        long,
        value_delimiter = ',',
        conflicts_with_all = ["add_allowed_partition", "delete_allowed_partition"]
    )]
    pub set_allowed_partition: Option<Vec<String>>,

    /// Add to the allowed partition list.
    #[arg(long, value_delimiter = ',', conflicts_with = "delete_allowed_partition")]
    pub add_allowed_partition: Option<Vec<String>>,

    /// Remove from the allowed partition list.
    #[arg(long, value_delimiter = ',')]
    pub delete_allowed_partition: Option<Vec<String>>,
}

impl From<PartitionListArgs> for ListEdit {
    fn from(args: PartitionListArgs) -> Self {
        Self {
            set: args.set_allowed_partition,
            add: args.add_allowed_partition,
            delete: args.delete_allowed_partition,
        }
    }
}

/// Set/add/delete flags for the allowed QoS list.
#[derive(Args, Debug, Clone, Default)]
pub struct QosListArgs {
    /// Replace the allowed QoS list.
    #[arg(
        long,
        value_delimiter = ',',
        conflicts_with_all = ["add_allowed_qos_list", "delete_allowed_qos_list"]
    )]
    pub set_allowed_qos_list: Option<Vec<String>>,

    /// Add to the allowed QoS list.
    #[arg(long, value_delimiter = ',', conflicts_with = "delete_allowed_qos_list")]
    pub add_allowed_qos_list: Option<Vec<String>>,

    /// Remove from the allowed QoS list.
    #[arg(long, value_delimiter = ',')]
    pub delete_allowed_qos_list: Option<Vec<String>>,
}

impl From<QosListArgs> for ListEdit {
    fn from(args: QosListArgs) -> Self {
        Self {
            set: args.set_allowed_qos_list,
            add: args.add_allowed_qos_list,
            delete: args.delete_allowed_qos_list,
        }
    }
}

/// Arguments for `modify account`.
#[derive(Args, Debug, Clone)]
pub struct ModifyAccountArgs {
    /// Account name.
    #[arg(short = 'N', long)]
    pub name: String,

    /// New description.
    #[arg(short = 'D', long)]
    pub description: Option<String>,

    /// Allowed partition list edit.
    #[command(flatten)]
    pub partitions: PartitionListArgs,

    /// Allowed QoS list edit.
    #[command(flatten)]
    pub qos_list: QosListArgs,

    /// New default QoS.
    #[arg(short = 'Q', long)]
    pub default_qos: Option<String>,

    /// Apply to child accounts and users as well.
    #[arg(short = 'F', long)]
    pub force: bool,
}

impl ModifyAccountArgs {
    /// The requested changes.
    #[must_use]
    pub fn modification(&self) -> AccountModification {
        AccountModification {
            description: self.description.clone(),
            partitions: self.partitions.clone().into(),
            qos_list: self.qos_list.clone().into(),
            default_qos: self.default_qos.clone(),
        }
    }
}

/// Arguments for `modify user`.
#[derive(Args, Debug, Clone)]
pub struct ModifyUserArgs {
    /// User name.
    #[arg(short = 'N', long)]
    pub name: String,

    /// Account scope.
    #[arg(short = 'A', long)]
    pub account: Option<String>,

    /// Partition scope for QoS changes.
    #[arg(short = 'p', long)]
    pub partition: Option<String>,

    /// Allowed partition list edit.
    #[command(flatten)]
    pub partitions: PartitionListArgs,

    /// Allowed QoS list edit.
    #[command(flatten)]
    pub qos_list: QosListArgs,

    /// New default QoS.
    #[arg(short = 'Q', long)]
    pub default_qos: Option<String>,

    /// New administrative level: none, operator or admin.
    #[arg(short = 'L', long)]
    pub level: Option<AdminLevel>,

    /// Apply even if the daemon would otherwise refuse.
    #[arg(short = 'F', long)]
    pub force: bool,
}

impl ModifyUserArgs {
    /// The requested changes.
    #[must_use]
    pub fn modification(&self) -> UserModification {
        UserModification {
            partitions: self.partitions.clone().into(),
            qos_list: self.qos_list.clone().into(),
            default_qos: self.default_qos.clone(),
            admin_level: self.level,
        }
    }
}

/// Arguments for `modify qos`.
#[derive(Args, Debug, Clone)]
pub struct ModifyQosArgs {
    /// QoS name.
    #[arg(short = 'N', long)]
    pub name: String,

    /// New description.
    #[arg(short = 'D', long)]
    pub description: Option<String>,

    /// New job priority.
    #[arg(short = 'P', long)]
    pub priority: Option<u32>,

    /// New maximum concurrent jobs per user.
    #[arg(short = 'J', long)]
    pub max_jobs_per_user: Option<u32>,

    /// New maximum CPUs per user.
    #[arg(short = 'c', long)]
    pub max_cpus_per_user: Option<u32>,

    /// New maximum time limit per job, in seconds.
    #[arg(short = 'T', long)]
    pub max_time_limit_per_task: Option<u64>,
}

impl ModifyQosArgs {
    /// The requested changes.
    #[must_use]
    pub fn modification(&self) -> QosModification {
        QosModification {
            description: self.description.clone(),
            priority: self.priority,
            max_jobs_per_user: self.max_jobs_per_user,
            max_cpus_per_user: self.max_cpus_per_user,
            max_time_limit_per_task: self.max_time_limit_per_task,
        }
    }
}

// ============================================================================
// schedctl
// ============================================================================

/// Inspect and control live cluster state.
#[derive(Parser, Debug, Clone)]
#[command(name = "schedctl")]
#[command(version, about, long_about = None)]
pub struct CtlCli {
    /// Shared options.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: CtlCommands,
}

/// `schedctl` verbs.
#[derive(Subcommand, Debug, Clone)]
pub enum CtlCommands {
    /// Show nodes, partitions, jobs or the configuration.
    Show {
        /// What to show.
        #[command(subcommand)]
        target: ShowTarget,
    },

    /// Change a job or node.
    Update {
        /// What to change.
        #[command(subcommand)]
        target: UpdateTarget,
    },
}

/// Targets for `schedctl show`.
#[derive(Subcommand, Debug, Clone)]
pub enum ShowTarget {
    /// Show one node or all nodes.
    Node {
        /// Node name.
        name: Option<String>,
    },
    /// Show one partition or all partitions.
    Partition {
        /// Partition name.
        name: Option<String>,
    },
    /// Show one job or all jobs.
    Job {
        /// Job id.
        id: Option<u32>,
    },
    /// Print the configuration file, flattened.
    Config,
}

/// Targets for `schedctl update`.
#[derive(Subcommand, Debug, Clone)]
pub enum UpdateTarget {
    /// Change a job's time limit or priority.
    Job(UpdateJobArgs),
    /// Drain or resume a node.
    Node(UpdateNodeArgs),
}

/// Arguments for `update job`.
#[derive(Args, Debug, Clone)]
pub struct UpdateJobArgs {
    /// Job id.
    pub id: u32,

    /// New time limit, `[D-]HH:MM:SS`.
    #[arg(short = 'T', long)]
    pub time_limit: Option<String>,

    /// New priority.
    #[arg(short = 'P', long)]
    pub priority: Option<u32>,
}

/// Node state requested by `update node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NodeStateArg {
    /// Stop scheduling new jobs on the node.
    Drain,
    /// Return the node to service.
    Resume,
}

impl From<NodeStateArg> for NodeStateChange {
    fn from(arg: NodeStateArg) -> Self {
        match arg {
            NodeStateArg::Drain => Self::Drain,
            NodeStateArg::Resume => Self::Resume,
        }
    }
}

/// Arguments for `update node`.
#[derive(Args, Debug, Clone)]
pub struct UpdateNodeArgs {
    /// Node name.
    #[arg(short = 'n', long)]
    pub name: String,

    /// New state.
    #[arg(short = 't', long, value_enum)]
    pub state: NodeStateArg,

    /// Reason, required when draining.
    #[arg(short = 'r', long, required_if_eq("state", "drain"))]
    pub reason: Option<String>,
}
