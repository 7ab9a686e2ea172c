mod api;
mod cli;
mod config;
mod provision;

use clap::Parser;
use colored::*;
use std::process::ExitCode;

use cli::Cli;
use cli::commands::provision::{RunOutcome, handle_provision_command};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // .env is optional; GROUPS_* variables may come from the shell
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .format_timestamp(None)
        .init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let pause = !cli.provision.no_pause && cli::prompt::is_interactive();

    let code = match handle_provision_command(cli.provision).await {
        Ok(RunOutcome::Completed) => ExitCode::SUCCESS,
        // Nothing ran, so there is nothing to read before the window closes
        Ok(RunOutcome::Cancelled) => return ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{} {:#}", "Error:".bright_red().bold(), err);
            ExitCode::FAILURE
        }
    };

    if pause && let Err(err) = cli::prompt::pause() {
        log::debug!("Pause failed: {:#}", err);
    }

    code
}
