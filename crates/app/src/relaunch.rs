//! Re-exec restart: start a new copy of this executable with the same
//! arguments.

use std::process::{Child, Command};

use anyhow::{Context, Result};

/// Spawn the current executable with the arguments this process got.
///
/// # Errors
/// Fails when the executable path cannot be resolved or the spawn fails.
pub fn spawn_self() -> Result<Child> {
    let exe = std::env::current_exe().context("resolving current executable")?;
    Command::new(&exe)
        .args(std::env::args_os().skip(1))
        .spawn()
        .with_context(|| format!("spawning {}", exe.display()))
}
