//! Outputs understood by the workflow runner: exported environment
//! variables and the failure annotation.

use std::{
    fs::OpenOptions,
    io::{self, Write},
    path::Path,
};

use anyhow::{Context, Result};
use chrono::Utc;

/// Exports `name=value` for later workflow steps.
///
/// Appends to the file named by `GITHUB_ENV` when the runner provides one,
/// otherwise prints the assignment to stdout.
pub fn export_variable(name: &str, value: &str) -> Result<()> {
    match std::env::var_os("GITHUB_ENV") {
        Some(path) if !path.is_empty() => append_env_file(Path::new(&path), name, value),
        _ => {
            println!("{name}={value}");
            Ok(())
        }
    }
}

fn append_env_file(path: &Path, name: &str, value: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let delimiter = pick_delimiter(value, Utc::now().timestamp_micros());
    write_env_entry(&mut file, name, value, &delimiter)
        .with_context(|| format!("Failed to export {name} to {}", path.display()))
}

/// Returns a heredoc delimiter derived from `seed` that does not occur in
/// `value`.
pub fn pick_delimiter(value: &str, seed: i64) -> String {
    let base = format!("ghadelimiter_{seed}");
    let mut delimiter = base.clone();
    let mut attempt = 0u32;
    while value.contains(&delimiter) {
        attempt += 1;
        delimiter = format!("{base}_{attempt}");
    }
    delimiter
}

/// Writes one entry in the env-file format. Multi-line values use the
/// heredoc form; `delimiter` must not occur in `value`.
pub fn write_env_entry<W: Write>(
    out: &mut W,
    name: &str,
    value: &str,
    delimiter: &str,
) -> io::Result<()> {
    if value.contains('\n') || value.contains('\r') {
        writeln!(out, "{name}<<{delimiter}")?;
        writeln!(out, "{value}")?;
        writeln!(out, "{delimiter}")
    } else {
        writeln!(out, "{name}={value}")
    }
}

/// Formats the `::error::` workflow command for `message`.
pub fn error_command(message: &str) -> String {
    let escaped = message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A");
    format!("::error::{escaped}")
}

/// Marks the step failed. The caller is responsible for the exit status.
pub fn set_failed(message: &str) {
    println!("{}", error_command(message));
}
