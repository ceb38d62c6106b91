//! Job inspection and time limit / priority changes.

use std::io::Write;

use sched_proto::ctl::TaskChange;
use tracing::info;

use crate::cli::UpdateJobArgs;
use crate::client::{ControlClient, Transport};
use crate::error::CliError;
use crate::output::{JobList, Message, OutputFormat};
use crate::units::{format_time_limit, parse_time_limit};

/// A validated job operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobCommand {
    /// Show one job, or all when `None`.
    Show(Option<u32>),
    /// Apply changes to one job, time limit first.
    Update {
        /// Job id.
        id: u32,
        /// Changes, in the order they are sent.
        changes: Vec<TaskChange>,
    },
}

fn change_name(change: &TaskChange) -> &'static str {
    match change {
        TaskChange::TimeLimit { .. } => "time_limit",
        TaskChange::Priority { .. } => "priority",
    }
}

fn describe(change: &TaskChange) -> String {
    match change {
        TaskChange::TimeLimit { seconds } => format!("time limit set to {}", format_time_limit(*seconds)),
        TaskChange::Priority { value } => format!("priority set to {value}"),
    }
}

impl JobCommand {
    /// Build an update from its arguments, parsing the time limit.
    ///
    /// # Errors
    ///
    /// Returns a usage error for a malformed time limit or when nothing would change.
    pub fn update(args: &UpdateJobArgs) -> Result<Self, CliError> {
        let mut changes = Vec::new();
        if let Some(text) = &args.time_limit {
            changes.push(TaskChange::TimeLimit {
                seconds: parse_time_limit(text)?,
            });
        }
        if let Some(value) = args.priority {
            changes.push(TaskChange::Priority { value });
        }
        if changes.is_empty() {
            return Err(CliError::Usage(
                "you must specify at least one modification item".into(),
            ));
        }
        Ok(Self::Update {
            id: args.id,
            changes,
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
            Self::Show(id) => {
                let tasks = client.query_tasks(id.into_iter().collect()).await?;
                match (id, tasks.is_empty()) {
                    (Some(id), true) => {
                        format.write(writer, &Message::info(format!("Job {id} is not running.")))?;
                    }
                    (None, true) => format.write(writer, &Message::info("No job is running."))?,
                    (_, false) => format.write(writer, &JobList::new(tasks))?,
                }
            }
            Self::Update { id, changes } => {
                let mut applied: Vec<String> = Vec::with_capacity(changes.len());
                for change in changes {
                    if let Err(source) = client.modify_task(id, change).await {
                        return Err(CliError::Modify {
                            attribute: change_name(&change).to_string(),
                            applied,
                            source: Box::new(source),
                        });
                    }
                    info!(task_id = id, attribute = change_name(&change), "Job modified");
                    format.write(
                        writer,
                        &Message::success(format!("Job {id}: {}", describe(&change))),
                    )?;
                    applied.push(change_name(&change).to_string());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{fake_client, FakeTransport};
    use sched_proto::{CtlReply, CtlRequest};

    fn args(time_limit: Option<&str>, priority: Option<u32>) -> UpdateJobArgs {
        UpdateJobArgs {
            id: 42,
            time_limit: time_limit.map(str::to_string),
            priority,
        }
    }

    #[test]
    fn update_needs_a_change() {
        let err = JobCommand::update(&args(None, None)).unwrap_err();
        assert!(err.to_string().contains("at least one modification item"));
    }

    #[test]
    fn update_rejects_bad_time() {
        let err = JobCommand::update(&args(Some("90 minutes"), None)).unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
    }

    #[test]
    fn time_limit_before_priority() {
        let command = JobCommand::update(&args(Some("1-02:00:00"), Some(5))).expect("valid");
        assert_eq!(
            command,
            JobCommand::Update {
                id: 42,
                changes: vec![
                    TaskChange::TimeLimit { seconds: 93_600 },
                    TaskChange::Priority { value: 5 },
                ],
            }
        );
    }

    #[tokio::test]
    async fn priority_failure_after_time_limit() {
        let command = JobCommand::update(&args(Some("00:30:00"), Some(5))).expect("valid");
        let transport = FakeTransport::new()
            .reply(CtlReply::ack())
            .reply(CtlReply::rejected("permission denied"));
        let mut client = fake_client(transport);
        let mut out = Vec::new();
        let err = command
            .execute(&mut client, &mut out, &OutputFormat::default())
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "modifying priority failed: request rejected: permission denied \
             (already applied: time_limit)"
        );
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "✓ Job 42: time limit set to 00:30:00\n"
        );
        assert_eq!(client.into_inner().requests.len(), 2);
    }

    #[tokio::test]
    async fn show_missing_job() {
        let reply = CtlReply::Tasks {
            ok: true,
            reason: String::new(),
            tasks: vec![],
        };
        let mut client = fake_client(FakeTransport::new().reply(reply));
        let mut out = Vec::new();
        JobCommand::Show(Some(7))
            .execute(&mut client, &mut out, &OutputFormat::default())
            .await
            .expect("ok");
        assert_eq!(String::from_utf8(out).expect("utf8"), "Job 7 is not running.\n");
        assert_eq!(
            client.into_inner().requests,
            vec![CtlRequest::QueryTasks { task_ids: vec![7] }]
        );
    }

    #[tokio::test]
    async fn show_no_jobs() {
        let reply = CtlReply::Tasks {
            ok: true,
            reason: String::new(),
            tasks: vec![],
        };
        let mut client = fake_client(FakeTransport::new().reply(reply));
        let mut out = Vec::new();
        JobCommand::Show(None)
            .execute(&mut client, &mut out, &OutputFormat::default())
            .await
            .expect("ok");
        assert_eq!(String::from_utf8(out).expect("utf8"), "No job is running.\n");
    }
}
