//! Output formatting for CLI commands.
//!
//! Supports table (fixed human-readable layouts), JSON and flat
//! (`path = value` lines) output formats.

use std::io::Write;

use chrono::{DateTime, Local, Utc};
use sched_proto::{Account, NodeInfo, PartitionInfo, Qos, TaskInfo, TaskStatus, User};
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;
use crate::flatten::write_flat;
use crate::units::{
    bytes_to_mib, encode_list, format_count_limit, format_duration, format_time_limit,
    is_unlimited_time,
};

/// Output formatter for the selected [`Format`].
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Get the current format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Flat => {
                let tree = serde_json::to_value(value)
                    .map_err(|e| CliError::Format(format!("serialization failed: {e}")))?;
                write_flat(writer, &tree)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Write one record: a title line, then aligned `label: value` lines.
fn write_record<W: Write>(
    writer: &mut W,
    title: &str,
    fields: &[(&str, String)],
) -> Result<(), CliError> {
    let width = fields.iter().map(|(label, _)| label.len()).max().unwrap_or(0) + 1;
    writeln!(writer, "{title}")?;
    for (label, value) in fields {
        writeln!(writer, "  {:<width$} {value}", format!("{label}:"))?;
    }
    Ok(())
}

fn write_records<W, T>(
    writer: &mut W,
    items: &[T],
    empty: &str,
    record: impl Fn(&mut W, &T) -> Result<(), CliError>,
) -> Result<(), CliError>
where
    W: Write,
{
    if items.is_empty() {
        writeln!(writer, "{empty}")?;
        return Ok(());
    }
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            writeln!(writer)?;
        }
        record(writer, item)?;
    }
    Ok(())
}

fn or_empty(value: Option<&String>) -> String {
    value.cloned().unwrap_or_default()
}

fn cpu(value: f64) -> String {
    format!("{value:.2}")
}

fn mib(bytes: u64) -> String {
    format!("{} MiB", bytes_to_mib(bytes))
}

// ============================================================================
// Entities
// ============================================================================

/// Accounts for display.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct AccountList(pub Vec<Account>);

impl TableDisplay for AccountList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        write_records(writer, &self.0, "No account found.", |w, account| {
            write_record(
                w,
                &format!("Account {}", account.name),
                &[
                    ("Description", account.description.clone()),
                    ("Parent", or_empty(account.parent_account.as_ref())),
                    ("Allowed Partitions", encode_list(&account.allowed_partitions)),
                    ("Default QoS", or_empty(account.default_qos.as_ref())),
                    ("Allowed QoS", encode_list(&account.allowed_qos_list)),
                    ("Users", encode_list(&account.users)),
                    ("Child Accounts", encode_list(&account.child_accounts)),
                    ("Coordinators", encode_list(&account.coordinators)),
                    ("Blocked", account.blocked.to_string()),
                ],
            )
        })
    }
}

/// Users for display.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct UserList(pub Vec<User>);

impl TableDisplay for UserList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        write_records(writer, &self.0, "No user found.", |w, user| {
            let mut fields = vec![
                ("Uid", user.uid.to_string()),
                ("Account", user.account.clone()),
                ("Admin Level", user.admin_level.to_string()),
                ("Coordinator", user.coordinator.to_string()),
                ("Blocked", user.blocked.to_string()),
            ];
            for pq in &user.allowed_partition_qos {
                fields.push((
                    "Partition",
                    format!(
                        "{} (qos: {}; default: {})",
                        pq.partition,
                        encode_list(&pq.allowed_qos_list),
                        or_empty(pq.default_qos.as_ref())
                    ),
                ));
            }
            write_record(w, &format!("User {}", user.name), &fields)
        })
    }
}

/// QoS policies for display.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct QosList(pub Vec<Qos>);

impl TableDisplay for QosList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        write_records(writer, &self.0, "No QoS found.", |w, qos| {
            write_record(
                w,
                &format!("QoS {}", qos.name),
                &[
                    ("Description", qos.description.clone()),
                    ("Priority", qos.priority.to_string()),
                    ("Max Jobs Per User", format_count_limit(qos.max_jobs_per_user)),
                    ("Max CPUs Per User", format_count_limit(qos.max_cpus_per_user)),
                    ("Max Time Limit", format_time_limit(qos.max_time_limit_per_task)),
                ],
            )
        })
    }
}

// ============================================================================
// Live state
// ============================================================================

/// Nodes for display.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct NodeList(pub Vec<NodeInfo>);

impl TableDisplay for NodeList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        write_records(writer, &self.0, "No node is available.", |w, node| {
            write_record(
                w,
                &format!("Node {}", node.hostname),
                &[
                    ("State", node.state.to_string()),
                    ("CPU", cpu(node.cpu)),
                    ("Alloc CPU", cpu(node.alloc_cpu)),
                    ("Free CPU", cpu(node.free_cpu)),
                    ("Real Memory", mib(node.real_mem)),
                    ("Alloc Memory", mib(node.alloc_mem)),
                    ("Free Memory", mib(node.free_mem)),
                    ("Partitions", encode_list(&node.partition_names)),
                    ("Running Jobs", node.running_task_num.to_string()),
                ],
            )
        })
    }
}

/// Partitions for display.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct PartitionList(pub Vec<PartitionInfo>);

impl TableDisplay for PartitionList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        write_records(writer, &self.0, "No partition is available.", |w, p| {
            write_record(
                w,
                &format!("Partition {}", p.name),
                &[
                    ("State", p.state.to_string()),
                    ("Total Nodes", p.total_nodes.to_string()),
                    ("Alive Nodes", p.alive_nodes.to_string()),
                    ("Total CPU", cpu(p.total_cpu)),
                    ("Avail CPU", cpu(p.avail_cpu)),
                    ("Alloc CPU", cpu(p.alloc_cpu)),
                    ("Total Memory", mib(p.total_mem)),
                    ("Avail Memory", mib(p.avail_mem)),
                    ("Alloc Memory", mib(p.alloc_mem)),
                    ("Hosts", p.hostlist.clone()),
                ],
            )
        })
    }
}

/// Jobs for display, evaluated against a fixed "now".
#[derive(Debug, Clone, Serialize)]
pub struct JobList {
    /// Jobs to show.
    pub tasks: Vec<TaskInfo>,
    /// Reference time for run time of running jobs.
    #[serde(skip)]
    pub now: DateTime<Utc>,
}

impl JobList {
    /// Jobs evaluated against the current time.
    #[must_use]
    pub fn new(tasks: Vec<TaskInfo>) -> Self {
        Self {
            tasks,
            now: Utc::now(),
        }
    }
}

fn timestamp(time: Option<DateTime<Utc>>) -> String {
    time.map_or_else(
        || "unknown".to_string(),
        |t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

/// Elapsed run time: end − start once finished, now − start while running.
#[must_use]
pub fn run_time(task: &TaskInfo, now: DateTime<Utc>) -> String {
    let Some(start) = task.start_time else {
        return "unknown".to_string();
    };
    let end = task.end_time.unwrap_or(now);
    let secs = u64::try_from((end - start).num_seconds()).unwrap_or(0);
    format_duration(secs)
}

/// Displayed end time: actual once finished, projected from the limit while running.
#[must_use]
pub fn end_time(task: &TaskInfo) -> String {
    if let Some(end) = task.end_time {
        return timestamp(Some(end));
    }
    if task.status != TaskStatus::Running || is_unlimited_time(task.time_limit_secs) {
        return "unknown".to_string();
    }
    let projected = task.start_time.and_then(|start| {
        let limit = i64::try_from(task.time_limit_secs).ok()?;
        start.checked_add_signed(chrono::Duration::try_seconds(limit)?)
    });
    timestamp(projected)
}

impl TableDisplay for JobList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        write_records(writer, &self.tasks, "No job is running.", |w, task| {
            write_record(
                w,
                &format!("Job {}", task.task_id),
                &[
                    ("Name", task.name.clone()),
                    ("User/Group", format!("{}/{}", task.uid, task.gid)),
                    ("Account", task.account.clone()),
                    ("State", task.status.to_string()),
                    ("Run Time", run_time(task, self.now)),
                    ("Time Limit", format_time_limit(task.time_limit_secs)),
                    ("Submit Time", timestamp(task.submit_time)),
                    ("Start Time", timestamp(task.start_time)),
                    ("End Time", end_time(task)),
                    ("Partition", task.partition.clone()),
                    ("Nodes", task.craned_list.clone()),
                    ("Node Count", task.node_num.to_string()),
                    ("Command", task.cmd_line.clone()),
                    ("Work Dir", task.cwd.clone()),
                ],
            )
        })
    }
}

// ============================================================================
// Messages
// ============================================================================

/// A simple message for operations that don't return data.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Message text.
    pub message: String,
    /// Whether this is a success message.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub success: bool,
}

impl Message {
    /// Create a success message.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }

    /// Create an informational message.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: false,
        }
    }
}

impl TableDisplay for Message {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.success {
            writeln!(writer, "✓ {}", self.message)?;
        } else {
            writeln!(writer, "{}", self.message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sched_proto::{NodeState, UNLIMITED_COUNT, UNLIMITED_TIME_LIMIT_SECS};

    fn node() -> NodeInfo {
        NodeInfo {
            hostname: "cn01".into(),
            state: NodeState::Mix,
            cpu: 64.0,
            alloc_cpu: 16.5,
            free_cpu: 47.5,
            real_mem: 256 * 1024 * 1024 * 1024,
            alloc_mem: 3 * 1024 * 1024 + 1_048_575,
            free_mem: 0,
            partition_names: vec!["cpu".into(), "debug".into()],
            running_task_num: 3,
        }
    }

    fn task(status: TaskStatus) -> TaskInfo {
        TaskInfo {
            task_id: 42,
            name: "train".into(),
            uid: 1000,
            gid: 100,
            account: "physics".into(),
            status,
            time_limit_secs: 3600,
            submit_time: None,
            start_time: None,
            end_time: None,
            partition: "gpu".into(),
            craned_list: "gn01".into(),
            node_num: 1,
            cmd_line: "python train.py".into(),
            cwd: "/home/alice".into(),
        }
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, m, s).single().expect("valid time")
    }

    #[test]
    fn output_format_default_is_table() {
        let fmt = OutputFormat::default();
        assert_eq!(fmt.format(), Format::Table);
        assert!(!fmt.is_json());
    }

    #[test]
    fn node_table_uses_mib_and_two_decimals() {
        let fmt = OutputFormat::new(Format::Table);
        let output = fmt.to_string(&NodeList(vec![node()])).expect("should format");

        assert!(output.starts_with("Node cn01\n"));
        assert!(output.contains("State:        MIX"));
        assert!(output.contains("Alloc CPU:    16.50"));
        assert!(output.contains("Real Memory:  262144 MiB"));
        // Truncated, not rounded.
        assert!(output.contains("Alloc Memory: 3 MiB"));
        assert!(output.contains("Partitions:   cpu,debug"));
    }

    #[test]
    fn empty_node_list_message() {
        let fmt = OutputFormat::new(Format::Table);
        let output = fmt.to_string(&NodeList(vec![])).expect("should format");
        assert_eq!(output, "No node is available.\n");
    }

    #[test]
    fn qos_limits_render_unlimited() {
        let fmt = OutputFormat::new(Format::Table);
        let output = fmt.to_string(&QosList(vec![Qos::new("normal")])).expect("should format");
        assert!(output.contains("Max Jobs Per User: unlimited"));
        assert!(output.contains("Max Time Limit:    unlimited"));

        let limited = Qos {
            max_jobs_per_user: 10,
            max_time_limit_per_task: 86_400 + 60,
            ..Qos::new("short")
        };
        let output = fmt.to_string(&QosList(vec![limited])).expect("should format");
        assert!(output.contains("Max Jobs Per User: 10"));
        assert!(output.contains("Max Time Limit:    1-00:01:00"));
        assert!(output.contains(&format!("Max CPUs Per User: {}", format_count_limit(UNLIMITED_COUNT))));
    }

    #[test]
    fn flat_output_renders_sentinel() {
        let fmt = OutputFormat::new(Format::Flat);
        let output = fmt.to_string(&QosList(vec![Qos::new("normal")])).expect("should format");
        assert!(output.contains("0.name = normal\n"));
        assert!(output.contains("0.max_time_limit_per_task = unlimited\n"));
    }

    #[test]
    fn account_json_output() {
        let account = Account {
            name: "physics".into(),
            allowed_partitions: vec!["cpu".into()],
            ..Account::default()
        };
        let fmt = OutputFormat::new(Format::Json);
        let output = fmt.to_string(&AccountList(vec![account])).expect("should format");
        assert!(output.trim_start().starts_with('['));
        assert!(output.contains("\"name\": \"physics\""));
    }

    #[test]
    fn user_partition_qos_lines() {
        let user = User {
            name: "alice".into(),
            account: "physics".into(),
            allowed_partition_qos: vec![sched_proto::PartitionQos {
                partition: "gpu".into(),
                allowed_qos_list: vec!["normal".into(), "high".into()],
                default_qos: Some("normal".into()),
            }],
            ..User::default()
        };
        let output = OutputFormat::default()
            .to_string(&UserList(vec![user]))
            .expect("should format");
        assert!(output.contains("gpu (qos: normal,high; default: normal)"));
        assert!(output.contains("Admin Level:  none"));
    }

    #[test]
    fn pending_job_times_unknown() {
        let job = task(TaskStatus::Pending);
        assert_eq!(run_time(&job, at(12, 0, 0)), "unknown");
        assert_eq!(end_time(&job), "unknown");
    }

    #[test]
    fn running_job_uses_now() {
        let job = TaskInfo {
            start_time: Some(at(10, 0, 0)),
            ..task(TaskStatus::Running)
        };
        assert_eq!(run_time(&job, at(11, 30, 5)), "01:30:05");
        assert_eq!(end_time(&job), timestamp(Some(at(11, 0, 0))));
    }

    #[test]
    fn running_job_without_limit_has_unknown_end() {
        let job = TaskInfo {
            start_time: Some(at(10, 0, 0)),
            time_limit_secs: UNLIMITED_TIME_LIMIT_SECS,
            ..task(TaskStatus::Running)
        };
        assert_eq!(end_time(&job), "unknown");
        let list = JobList {
            tasks: vec![job],
            now: at(10, 0, 1),
        };
        let output = OutputFormat::default().to_string(&list).expect("should format");
        assert!(output.contains("Time Limit:  unlimited"));
    }

    #[test]
    fn finished_job_uses_end_time() {
        let job = TaskInfo {
            start_time: Some(at(10, 0, 0)),
            end_time: Some(at(10, 20, 0)),
            ..task(TaskStatus::Completed)
        };
        assert_eq!(run_time(&job, at(23, 0, 0)), "00:20:00");
        assert_eq!(end_time(&job), timestamp(Some(at(10, 20, 0))));
    }

    #[test]
    fn message_success() {
        let msg = Message::success("Account physics added");
        let output = OutputFormat::default().to_string(&msg).expect("should format");
        assert_eq!(output, "✓ Account physics added\n");
    }

    #[test]
    fn message_json() {
        let msg = Message::info("Node cn09 not found.");
        let fmt = OutputFormat::new(Format::Json);
        let output = fmt.to_string(&msg).expect("should format");
        assert!(output.contains("\"message\": \"Node cn09 not found.\""));
        assert!(!output.contains("success"));
    }
}
