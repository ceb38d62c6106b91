//! `schedctl` binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sched_cli::cli::CtlCli;
use sched_cli::commands::{connect, CtlPlan};
use sched_cli::output::OutputFormat;
use sched_cli::CliError;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = CtlCli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(&e)
        }
    }
}

async fn run(cli: CtlCli) -> Result<(), CliError> {
    let format = OutputFormat::new(cli.global.output_format);
    let plan = CtlPlan::new(cli.command, &cli.global.config)?;
    let mut stdout = io::stdout().lock();

    match plan {
        CtlPlan::Config(command) => command.execute(&mut stdout, &format),
        plan => {
            let mut client = connect(&cli.global.config).await?;
            plan.execute(&mut client, &mut stdout, &format).await?;
            if let Err(e) = client.into_inner().close().await {
                tracing::debug!(error = %e, "Closing connection failed");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bad_time_limit_is_usage_error() {
        let cli = CtlCli::parse_from(["schedctl", "update", "job", "7", "-T", "1h"]);
        let err = run(cli).await.unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
    }

    #[tokio::test]
    async fn config_dump_of_missing_file() {
        let cli = CtlCli::parse_from(["schedctl", "-C", "/nonexistent/sched.toml", "show", "config"]);
        let err = run(cli).await.unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
