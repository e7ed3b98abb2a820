// SPDX-License-Identifier: MPL-2.0

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");
    println!("cargo::rerun-if-env-changed=DEPTHVIEW_VERSION");

    // Packagers building outside a git checkout set the version explicitly
    let version = std::env::var("DEPTHVIEW_VERSION").unwrap_or_else(|_| git_version());

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// Version from `git describe`
///
/// - exact tag `v0.2.0` becomes `0.2.0-abcdef1`
/// - `v0.2.0-5-gabcdef1` (commits after a tag) becomes `0.2.0-dirty-abcdef1`
/// - no tag at all falls back to the commit hash, then to the crate version
fn git_version() -> String {
    let hash = git(&["rev-parse", "--short", "HEAD"]);
    let Some(described) = git(&["describe", "--tags", "--always", "--match", "v*"]) else {
        return hash.unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());
    };
    let described = described.strip_prefix('v').unwrap_or(&described);

    let parts: Vec<&str> = described.rsplitn(3, '-').collect();
    match parts.as_slice() {
        [commit, _count, base] => {
            let commit = commit.strip_prefix('g').unwrap_or(commit);
            format!("{}-dirty-{}", base, commit)
        }
        _ => match hash {
            Some(hash) if hash != described => format!("{}-{}", described, hash),
            _ => described.to_string(),
        },
    }
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}
