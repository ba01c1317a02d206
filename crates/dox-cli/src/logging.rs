//! Logging initialization: a `tracing` fmt subscriber whose verbosity is
//! driven by `-v`/`--json`, matching the teacher's `initialize_logging`.

use anyhow::Result;
use colored::control as color_control;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::cli::Cli;

/// Sets up the global tracing subscriber and color control for one CLI
/// invocation. Machine-readable (`--json`) output suppresses info logs so
/// stdout stays parseable.
///
/// # Errors
///
/// Returns an error if the global subscriber has already been set.
pub fn init(cli: &Cli) -> Result<()> {
    let level = match cli.verbose {
        0 if cli.json => Level::ERROR,
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let env_no_color = std::env::var("NO_COLOR").is_ok();
    if cli.no_color || env_no_color || cli.json {
        color_control::set_override(false);
    }
    Ok(())
}
