//! `dox files <collection>` — lists the file records within one collection.

use anyhow::Result;
use serde::Serialize;

use dox_core::config::Config;
use dox_core::manifest;

use crate::cli::Format;
use crate::output::{self, Table};

#[derive(Debug, Serialize)]
struct FileRow {
    path: String,
    r#type: String,
    size: u64,
    lines: usize,
    description: String,
}

pub fn run(config: &Config, collection: &str, format: Format, limit: usize) -> Result<()> {
    let manifest = manifest::load(&config.output_root())?;
    let coll = manifest.collections.get(collection).ok_or_else(|| {
        dox_core::Error::collection_not_found(format!("no collection named `{collection}`"))
            .with_context("collection", collection)
    })?;

    let mut files = coll.files.clone();
    files.sort_by(|a, b| a.path.cmp(&b.path));
    if limit > 0 {
        files.truncate(limit);
    }

    let rows: Vec<FileRow> = files
        .iter()
        .map(|f| FileRow {
            path: f.path.clone(),
            r#type: f.r#type.clone(),
            size: f.size,
            lines: f.lines,
            description: f.description.clone(),
        })
        .collect();

    let mut table = Table::new(&["PATH", "TYPE", "SIZE", "LINES", "DESCRIPTION"]);
    for row in &rows {
        table.push_row(vec![
            row.path.clone(),
            row.r#type.clone(),
            row.size.to_string(),
            row.lines.to_string(),
            output::truncate(&row.description, 80),
        ]);
    }

    output::render(format, &table, &rows)
}
