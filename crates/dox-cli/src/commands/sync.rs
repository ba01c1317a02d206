//! `dox sync` — drives [`dox_core::sync::run`] and renders progress with
//! `indicatif`, matching the teacher's progress-bar-per-sync pattern in
//! `blz-cli::commands::sync`.

use anyhow::Result;
use colored::Colorize;
use dox_core::config::Config;
use dox_core::drivers::SyncOutcome;
use dox_core::sync::{self, SyncEventSink, SyncFlags};
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;

struct ProgressSink {
    bar: ProgressBar,
}

impl SyncEventSink for ProgressSink {
    fn source_start(&self, name: &str) {
        self.bar.set_message(format!("syncing {name}"));
    }

    fn source_done(&self, name: &str, result: &std::result::Result<SyncOutcome, dox_core::Error>) {
        self.bar.inc(1);
        match result {
            Ok(outcome) if outcome.skipped => {
                self.bar
                    .println(format!("{} {name} (unchanged)", "=".dimmed()));
            },
            Ok(outcome) => {
                self.bar.println(format!(
                    "{} {name} (+{} -{})",
                    "✓".green(),
                    outcome.downloaded,
                    outcome.deleted
                ));
            },
            Err(err) => {
                self.bar.println(format!("{} {name}: {err}", "✗".red()));
            },
        }
    }

    fn manifest_error(&self, err: &dox_core::Error) {
        self.bar
            .println(format!("{} manifest regeneration failed: {err}", "!".yellow()));
    }
}

#[allow(clippy::too_many_arguments)]
pub async fn run(
    config: &Config,
    names: Vec<String>,
    force: bool,
    dry_run: bool,
    clean: bool,
    parallel: Option<usize>,
    json: bool,
) -> Result<()> {
    let flags = SyncFlags {
        force,
        dry_run,
        clean,
        max_parallel: parallel,
    };

    let total = if names.is_empty() {
        config.sources.len()
    } else {
        names.len()
    };

    let bar = ProgressBar::new(total as u64);
    if json || total == 0 {
        bar.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    } else if let Ok(style) = ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}") {
        bar.set_style(style);
    }

    let sink = ProgressSink { bar: bar.clone() };
    let summary = sync::run(config, &names, flags, &sink, CancellationToken::new()).await?;
    bar.finish_and_clear();

    if json {
        crate::output::render_json(&[summary_json(&summary)])?;
    } else {
        println!(
            "{} sources, {} downloaded, {} deleted, {} skipped, {} errors",
            summary.sources, summary.downloaded, summary.deleted, summary.skipped, summary.errors
        );
    }

    Ok(())
}

fn summary_json(summary: &sync::SyncSummary) -> serde_json::Value {
    serde_json::json!({
        "sources": summary.sources,
        "downloaded": summary.downloaded,
        "deleted": summary.deleted,
        "skipped": summary.skipped,
        "errors": summary.errors,
    })
}
