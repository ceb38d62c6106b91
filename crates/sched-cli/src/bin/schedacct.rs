//! `schedacct` binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sched_cli::cli::AcctCli;
use sched_cli::commands::{connect, AcctPlan};
use sched_cli::output::OutputFormat;
use sched_cli::CliError;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = AcctCli::parse();

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

async fn run(cli: AcctCli) -> Result<(), CliError> {
    let format = OutputFormat::new(cli.global.output_format);
    let plan = AcctPlan::try_from(cli.command)?;

    let mut client = connect(&cli.global.config).await?;
    let mut stdout = io::stdout().lock();
    plan.execute(&mut client, &mut stdout, &format).await?;

    if let Err(e) = client.into_inner().close().await {
        tracing::debug!(error = %e, "Closing connection failed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn usage_error_before_config_is_read() {
        let cli = AcctCli::parse_from([
            "schedacct",
            "-C",
            "/nonexistent/sched.toml",
            "modify",
            "account",
            "-N",
            "physics",
        ]);
        let err = run(cli).await.unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
    }

    #[tokio::test]
    async fn missing_config_is_config_error() {
        let cli = AcctCli::parse_from(["schedacct", "-C", "/nonexistent/sched.toml", "show", "qos"]);
        let err = run(cli).await.unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
