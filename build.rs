// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");

    // Packagers can pin the version string
    let version = match std::env::var("CAMERA_ENGINE_VERSION") {
        Ok(v) => v,
        Err(_) => describe_version(),
    };

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// `git describe` output turned into `<tag>-<hash>` or `<tag>-dirty-<hash>`,
/// falling back to the crate version when git is unavailable.
fn describe_version() -> String {
    let described = run_git(&["describe", "--tags", "--always", "--match", "v*"]);
    let hash = run_git(&["rev-parse", "--short", "HEAD"]);

    match (described, hash) {
        (Some(described), Some(hash)) => {
            let described = described.strip_prefix('v').unwrap_or(&described).to_string();
            let parts: Vec<&str> = described.rsplitn(3, '-').collect();
            if parts.len() == 3 {
                format!("{}-dirty-{}", parts[2], hash)
            } else {
                format!("{}-{}", described, hash)
            }
        }
        _ => std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "unknown".to_string()),
    }
}

fn run_git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if output.status.success() {
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        None
    }
}
