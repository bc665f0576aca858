use std::process::ExitCode;

use anyhow::Result;
use autostale::{GraphQlClient, actions, parse_args, run};
use chrono::Utc;
use tracing::info;

fn handle_clap_help_version(clap_err: &clap::Error) -> ExitCode {
    use clap::error::ErrorKind;
    match clap_err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            print!("{clap_err}");
            ExitCode::SUCCESS
        }
        _ => {
            eprint!("{clap_err}");
            ExitCode::from(2)
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    // The runner sets RUNNER_DEBUG=1 when step debug logging is enabled.
    let default_level = match std::env::var("RUNNER_DEBUG").as_deref() {
        Ok("1") => "debug",
        _ => "info",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn execute(config: autostale::Config) -> Result<ExitCode> {
    let client = GraphQlClient::new(config.api_url.clone(), &config.token)?;
    let summary = run(&config, &client, Utc::now()).await?;

    if let Some(app_names) = &summary.app_names {
        actions::export_variable("APP_NAME", app_names)?;
    }

    if !summary.is_success() {
        actions::set_failed(&format!(
            "{} of {} stale PR(s) could not be commented on and closed",
            summary.failed_count(),
            summary.stale.len()
        ));
        return Ok(ExitCode::FAILURE);
    }

    info!(
        fetched = summary.fetched,
        stale = summary.stale.len(),
        dry_run = config.dry_run,
        "Run complete"
    );
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config = match parse_args(std::env::args_os()) {
        Ok(config) => config,
        Err(err) => {
            if let Some(clap_err) = err.downcast_ref::<clap::Error>() {
                return handle_clap_help_version(clap_err);
            }
            actions::set_failed(&format!("{err:#}"));
            return ExitCode::FAILURE;
        }
    };

    match execute(config).await {
        Ok(code) => code,
        Err(err) => {
            actions::set_failed(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}
