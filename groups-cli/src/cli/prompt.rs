//! Interactive prompts: input file selection and the exit pause

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal;
use dialoguer::Input;
use dialoguer::theme::ColorfulTheme;
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// Whether both stdin and stdout are attached to a terminal
pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
}

/// Ask for the spreadsheet to process. None means the user cancelled.
pub fn select_input_file() -> Result<Option<PathBuf>> {
    if !is_interactive() {
        return Ok(None);
    }

    let answer: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Spreadsheet to process (leave empty to cancel)")
        .allow_empty(true)
        .validate_with(|input: &String| -> Result<(), String> {
            let trimmed = clean_path(input);
            if trimmed.is_empty() || PathBuf::from(trimmed).is_file() {
                Ok(())
            } else {
                Err(format!("File not found: {}", trimmed))
            }
        })
        .interact_text()
        .context("Failed to read file selection")?;

    let path = clean_path(&answer);
    if path.is_empty() {
        Ok(None)
    } else {
        Ok(Some(PathBuf::from(path)))
    }
}

/// Paths pasted from a file manager often carry quotes
fn clean_path(input: &str) -> &str {
    input.trim().trim_matches(|c| c == '"' || c == '\'')
}

/// Wait for a single key press
pub fn pause() -> Result<()> {
    println!();
    println!("Press any key to exit...");

    terminal::enable_raw_mode().context("Failed to enable raw mode")?;
    let result = wait_for_key();
    terminal::disable_raw_mode().context("Failed to disable raw mode")?;
    result
}

fn wait_for_key() -> Result<()> {
    loop {
        if let Event::Key(key) = event::read().context("Failed to read key press")?
            && key.kind == KeyEventKind::Press
        {
            return Ok(());
        }
    }
}
