//! dox CLI — thin `clap` front-end over `dox-core`'s sync/manifest/search
//! core, per spec.md §6.

use std::path::PathBuf;

use anyhow::Result;
use dox_core::config::Config;

pub mod cli;
mod commands;
mod logging;
mod output;

use cli::{Cli, Commands};

/// Parses arguments, wires up logging, and dispatches to the selected
/// subcommand.
///
/// # Errors
///
/// Returns an error if argument parsing, config loading, or the dispatched
/// command fails.
pub async fn run() -> Result<()> {
    use clap::Parser;
    let cli = Cli::parse();
    logging::init(&cli)?;

    if let Commands::Init { force } = &cli.command {
        return commands::init::run(*force);
    }

    let config_path = resolve_config_path(cli.config.clone())?;

    if let Commands::Add {
        name,
        url,
        repo,
        git_ref,
        path,
    } = &cli.command
    {
        return commands::add::run(
            &config_path,
            name,
            url.as_deref(),
            repo.as_deref(),
            git_ref.as_deref(),
            path.as_deref(),
        );
    }

    let config = Config::load_from(&config_path)?;

    match &cli.command {
        Commands::Sync {
            names,
            force,
            dry_run,
            clean,
            parallel,
        } => {
            commands::sync::run(
                &config,
                names.clone(),
                *force,
                *dry_run,
                *clean,
                *parallel,
                cli.json,
            )
            .await
        },
        Commands::List { format, limit } | Commands::Collections { format, limit } => {
            let fmt = output::resolve_format(cli.json, *format, config.display.format);
            commands::collections::run(&config, fmt, limit.unwrap_or(config.display.default_limit))
        },
        Commands::Files {
            collection,
            format,
            limit,
        } => {
            let fmt = output::resolve_format(cli.json, *format, config.display.format);
            commands::files::run(&config, collection, fmt, limit.unwrap_or(config.display.default_limit))
        },
        Commands::Cat {
            collection,
            file,
            line_numbers,
        } => commands::cat::run(
            &config,
            collection,
            file,
            *line_numbers || config.display.line_numbers,
        ),
        Commands::Search {
            query,
            collection,
            content,
            regex,
            format,
            limit,
        } => {
            let fmt = output::resolve_format(cli.json, *format, config.display.format);
            commands::search::run(
                &config,
                query,
                collection.as_deref(),
                *content,
                *regex,
                fmt,
                limit.unwrap_or(config.display.default_limit),
            )
        },
        Commands::Clean => commands::clean::run(&config),
        Commands::Add { .. } | Commands::Init { .. } => {
            unreachable!("handled before config load")
        },
    }
}

/// Resolves the config file path: an explicit `--config` override, or
/// discovery by walking up from the current directory.
fn resolve_config_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    let cwd = std::env::current_dir()?;
    dox_core::config::discover(&cwd).ok_or_else(|| {
        dox_core::Error::config_not_found("no dox.toml or .dox.toml found")
            .with_hint("run `dox init` to create one")
            .into()
    })
}
