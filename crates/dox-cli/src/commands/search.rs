//! `dox search <query>` — fuzzy metadata search, or `--content` for
//! streamed grep, per spec.md §4.7.

use anyhow::Result;
use serde::Serialize;

use dox_core::config::Config;
use dox_core::manifest;
use dox_core::search;

use crate::cli::Format;
use crate::output::{self, Table};

#[derive(Debug, Serialize)]
struct MetadataRow {
    collection: String,
    path: String,
    field: String,
    value: String,
    score: i64,
}

#[derive(Debug, Serialize)]
struct ContentRow {
    collection: String,
    path: String,
    line: usize,
    text: String,
}

#[allow(clippy::too_many_arguments)]
pub fn run(
    config: &Config,
    query: &str,
    collection: Option<&str>,
    content: bool,
    regex: bool,
    format: Format,
    limit: usize,
) -> Result<()> {
    let manifest = manifest::load(&config.output_root())?;

    if content {
        let matches = search::content_search(&manifest, &config.output_root(), query, collection, regex, limit)?;
        let rows: Vec<ContentRow> = matches
            .into_iter()
            .map(|m| ContentRow {
                collection: m.collection,
                path: m.path,
                line: m.line,
                text: m.text,
            })
            .collect();

        let mut table = Table::new(&["COLLECTION", "PATH", "LINE", "TEXT"]);
        for row in &rows {
            table.push_row(vec![
                row.collection.clone(),
                row.path.clone(),
                row.line.to_string(),
                output::truncate(&row.text, 100),
            ]);
        }
        output::render(format, &table, &rows)
    } else {
        let matches = search::metadata_search(&manifest, query, collection, limit)?;
        let rows: Vec<MetadataRow> = matches
            .into_iter()
            .map(|m| MetadataRow {
                collection: m.collection,
                path: m.path,
                field: m.field,
                value: m.value,
                score: m.score,
            })
            .collect();

        let mut table = Table::new(&["COLLECTION", "PATH", "FIELD", "MATCH", "SCORE"]);
        for row in &rows {
            table.push_row(vec![
                row.collection.clone(),
                row.path.clone(),
                row.field.clone(),
                output::truncate(&row.value, 60),
                row.score.to_string(),
            ]);
        }
        output::render(format, &table, &rows)
    }
}
