//! `dox list` / `dox collections` — lists every collection in the manifest.

use anyhow::Result;
use serde::Serialize;

use dox_core::config::Config;
use dox_core::manifest;
use dox_core::types::Manifest;

use crate::cli::Format;
use crate::output::{self, Table};

#[derive(Debug, Serialize)]
struct CollectionRow {
    name: String,
    kind: String,
    origin: String,
    files: usize,
    last_sync: String,
}

pub fn run(config: &Config, format: Format, limit: usize) -> Result<()> {
    let manifest: Manifest = manifest::load(&config.output_root())?;
    run_with(&manifest, format, limit)
}

fn run_with(manifest: &Manifest, format: Format, limit: usize) -> Result<()> {
    let mut names: Vec<&String> = manifest.collections.keys().collect();
    names.sort();
    if limit > 0 {
        names.truncate(limit);
    }

    let rows: Vec<CollectionRow> = names
        .iter()
        .map(|name| {
            let c = &manifest.collections[*name];
            CollectionRow {
                name: c.name.clone(),
                kind: c.kind.clone(),
                origin: c.origin.clone(),
                files: c.file_count,
                last_sync: c.last_sync.to_rfc3339(),
            }
        })
        .collect();

    let mut table = Table::new(&["NAME", "KIND", "ORIGIN", "FILES", "LAST SYNC"]);
    for row in &rows {
        table.push_row(vec![
            row.name.clone(),
            row.kind.clone(),
            row.origin.clone(),
            row.files.to_string(),
            row.last_sync.clone(),
        ]);
    }

    output::render(format, &table, &rows)
}
