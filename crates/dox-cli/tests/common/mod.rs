#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::path::Path;
use std::time::Duration;

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(15);

/// Creates a configured `dox` command suitable for integration tests: a
/// bounded timeout and colors forced off so output assertions are stable.
#[allow(dead_code)]
pub fn dox_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("dox"));
    cmd.timeout(CMD_TIMEOUT);
    cmd.env("NO_COLOR", "1");
    cmd
}

/// A `dox` command scoped to an explicit config file, run from `cwd`.
#[allow(dead_code)]
pub fn dox_cmd_with_config(cwd: &Path, config_path: &Path) -> Command {
    let mut cmd = dox_cmd();
    cmd.current_dir(cwd);
    cmd.arg("--config").arg(config_path);
    cmd
}
