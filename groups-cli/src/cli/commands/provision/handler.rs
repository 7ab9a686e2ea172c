//! Provision command handler

use anyhow::{Context, Result};
use colored::*;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{DisplayStyle, ProvisionArgs};
use crate::api::{AuthManager, GraphDirectory};
use crate::cli::prompt;
use crate::config::{Config, resolve_principal};
use crate::provision::{
    ColumnMap, ProvisionMode, RowProcessor, RunReporter, Spreadsheet, process_sheet,
    read_group_specs, results_path,
};

/// How the command ended when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
}

/// Handle the provision command
pub async fn handle_provision_command(args: ProvisionArgs) -> Result<RunOutcome> {
    let verbose = matches!(args.style, DisplayStyle::Verbose);

    // Pick the input file
    let input = match args.file.clone() {
        Some(path) => path,
        None => match prompt::select_input_file()? {
            Some(path) => path,
            None => {
                println!("{}", "Operation cancelled: no file selected.".yellow());
                return Ok(RunOutcome::Cancelled);
            }
        },
    };

    if !input.exists() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    // Load settings
    let mut config = Config::load(args.config.as_deref())?;
    config.apply_env();
    if args.batch {
        config.provisioning.mode = ProvisionMode::Batch;
    }
    if args.no_hide {
        config.provisioning.hide_from_address_lists = false;
    }
    let csv_log = args.csv_log.clone().or(config.provisioning.csv_log.clone());
    let output = args.output.clone().unwrap_or_else(|| results_path(&input));

    if verbose {
        println!("Reading groups from: {}", input.display().to_string().cyan());
        println!("Mode: {:?}", config.provisioning.mode);
        println!(
            "Hide from address lists: {}",
            config.provisioning.hide_from_address_lists
        );
    }

    // Open the spreadsheet before touching the directory so input errors abort early
    let mut sheet = Spreadsheet::open(&input)?;
    let columns = ColumnMap::resolve(sheet.headers())
        .with_context(|| format!("Invalid header row in {}", input.display()))?;

    if args.dry_run {
        print_plan(&sheet, &columns, config.provisioning.mode);
        return Ok(RunOutcome::Completed);
    }

    // Checked before any group exists in the directory
    sheet.check_output(&output)?;

    // One session for the whole run; failure here stops before any row
    let start_connect = Instant::now();
    let principal = resolve_principal(&config.directory, prompt::is_interactive())?;
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.directory.timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;
    let auth = Arc::new(AuthManager::new(http.clone(), &config.directory.authority));
    if !auth.has_open_session().await {
        auth.open_session(&principal)
            .await
            .context("Failed to connect to the directory service")?;
    }
    let directory = GraphDirectory::new(http, auth, &config.directory.graph_url);

    if verbose {
        println!(
            "Connected to tenant {} in {:.2}s",
            principal.tenant_id.bright_green().bold(),
            start_connect.elapsed().as_secs_f64()
        );
        println!();
    }

    // Process rows
    let start_run = Instant::now();
    let processor = RowProcessor::new(&directory, config.provisioning.processor_options());
    let mut reporter = RunReporter::new(!matches!(args.style, DisplayStyle::Quiet));

    println!("Provisioning groups from {}...", input.display());
    process_sheet(&mut sheet, &processor, &mut reporter).await?;

    // Results. The summary and CSV log are produced even when the copy cannot be saved.
    let saved = sheet.save_as(&output);
    let saved_to = sheet.close();

    reporter.print_summary();
    if let Err(err) = &saved {
        log::error!("Annotated copy was not saved: {:#}", err);
    }

    if let Some(path) = saved_to {
        println!();
        println!(
            "Annotated copy saved to: {}",
            path.display().to_string().bright_green()
        );
    }

    if let Some(path) = csv_log {
        reporter.write_csv_log(&path)?;
        println!("CSV log saved to: {}", path.display().to_string().bright_green());
    }

    if verbose {
        println!("Total time: {:.2}s", start_run.elapsed().as_secs_f64());
    }

    let summary = reporter.into_summary();
    if summary.has_failures() {
        log::info!("Run finished with failures; re-running will attempt every row again");
    }

    saved?;
    Ok(RunOutcome::Completed)
}

/// Print what a real run would do
fn print_plan(sheet: &Spreadsheet, columns: &ColumnMap, mode: ProvisionMode) {
    let specs = read_group_specs(sheet, columns);

    println!(
        "{} {} groups ({:?} mode), no changes made:",
        "Dry run:".bold(),
        specs.len(),
        mode
    );
    for spec in &specs {
        println!(
            "  Row {:<4} {} \"{}\"",
            spec.row,
            spec.address.cyan(),
            spec.display_name
        );
        if let Some(owner) = &spec.owner {
            println!("           owner: {}", owner);
        }
        if !spec.members.is_empty() {
            println!("           members: {}", spec.members.join(", ").dimmed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::{Path, PathBuf};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn write_config(dir: &Path, server: &MockServer) -> PathBuf {
        let config = dir.join("config.toml");
        std::fs::write(
            &config,
            format!(
                r#"
                [directory]
                tenant_id = "tenant"
                client_id = "app"
                client_secret = "secret"
                authority = "{uri}"
                graph_url = "{uri}/v1.0"
                "#,
                uri = server.uri()
            ),
        )
        .unwrap();
        config
    }

    fn write_input(dir: &Path) -> PathBuf {
        let input = dir.join("groups.csv");
        std::fs::write(&input, "Address,Name\nsales@contoso.com,Sales\n").unwrap();
        input
    }

    fn args(input: PathBuf, output: PathBuf, csv_log: PathBuf, config: PathBuf) -> ProvisionArgs {
        ProvisionArgs {
            file: Some(input),
            output: Some(output),
            csv_log: Some(csv_log),
            batch: false,
            no_hide: false,
            dry_run: false,
            config: Some(config),
            no_pause: true,
            style: DisplayStyle::Quiet,
        }
    }

    #[tokio::test]
    async fn test_output_over_input_fails_before_any_request() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());
        let config = write_config(dir.path(), &server);
        let csv_log = dir.path().join("log.csv");

        let err = handle_provision_command(args(input.clone(), input, csv_log.clone(), config))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Refusing to overwrite"));
        assert!(server.received_requests().await.unwrap().is_empty());
        assert!(!csv_log.exists());
    }

    #[tokio::test]
    async fn test_failed_save_still_writes_csv_log() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1.0/groups"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "group-id",
                "mail": "sales@contoso.com"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/v1.0/groups/group-id"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());
        let config = write_config(dir.path(), &server);
        let csv_log = dir.path().join("log.csv");
        let output = dir.path().join("missing").join("groups_results.xlsx");

        let err = handle_provision_command(args(input, output.clone(), csv_log.clone(), config))
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("Failed to save results"));
        assert!(!output.exists());

        let log = std::fs::read_to_string(&csv_log).unwrap();
        assert!(log.contains("sales@contoso.com,Created,Group created successfully."));
    }
}
