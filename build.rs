//! Build script for autostale: embeds a human-readable version string.
//!
//! The version is `CARGO_PKG_VERSION`, followed by the output of
//! `git describe --tags --always --dirty` when it names a tag, or a
//! pseudo-version `v{version}-{timestamp}-{commit}[+dirty]` otherwise,
//! followed by the rustc version. Builds outside a git checkout fall back
//! to the build timestamp.

use std::{env, process::Command};

use chrono::Utc;

fn main() {
    ["src", "build.rs", "Cargo.toml"]
        .iter()
        .for_each(|path| println!("cargo:rerun-if-changed={path}"));

    let components = [
        Some(env!("CARGO_PKG_VERSION").to_string()),
        describe_revision().map(|v| format!("({v})")),
        run(Command::new(env::var("RUSTC").unwrap_or_else(|_| "rustc".into())).arg("--version")),
    ];

    let build_info = components.into_iter().flatten().collect::<Vec<_>>().join(" ");
    println!("cargo:rustc-env=BUILD_INFO_HUMAN={build_info}");
}

fn run(command: &mut Command) -> Option<String> {
    command
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn git(args: &[&str]) -> Option<String> {
    run(Command::new("git").args(args))
}

fn describe_revision() -> Option<String> {
    match git(&["describe", "--tags", "--always", "--dirty"]) {
        Some(desc) if desc.starts_with('v') || desc.contains("-g") => Some(desc),
        _ => Some(pseudo_version()),
    }
}

fn pseudo_version() -> String {
    let commit = git(&["rev-parse", "--short=12", "HEAD"]).unwrap_or_else(|| "unknown".into());
    let dirty = git(&["status", "--porcelain"])
        .map(|out| out.lines().any(|line| line.get(3..) != Some(".cargo-ok")));

    // Clean checkouts use the commit time so the same commit yields the same version.
    let stamp = match dirty {
        Some(false) => git(&["log", "-1", "--format=%ct"])
            .and_then(|s| s.parse::<i64>().ok())
            .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0)),
        _ => None,
    }
    .unwrap_or_else(Utc::now)
    .format("%Y%m%d%H%M%S");

    let suffix = if dirty == Some(true) { "+dirty" } else { "" };
    format!("v{}-{stamp}-{commit}{suffix}", env!("CARGO_PKG_VERSION"))
}
