//! `dox cat <collection> <file>` — prints a cached file's contents.

use anyhow::Result;

use dox_core::config::Config;
use dox_core::manifest;

pub fn run(config: &Config, collection: &str, file: &str, line_numbers: bool) -> Result<()> {
    let manifest = manifest::load(&config.output_root())?;
    let coll = manifest.collections.get(collection).ok_or_else(|| {
        dox_core::Error::collection_not_found(format!("no collection named `{collection}`"))
            .with_context("collection", collection)
    })?;

    if !coll.files.iter().any(|f| f.path == file) {
        return Err(dox_core::Error::file_not_found(format!("no file `{file}` in `{collection}`"))
            .with_context("collection", collection)
            .with_context("path", file)
            .into());
    }

    let target = config.output_root().join(&coll.output_subdir).join(file);
    let text = std::fs::read_to_string(&target).map_err(|e| {
        dox_core::Error::file_read_error(format!("{}: {e}", target.display()))
            .with_context("path", target.display())
    })?;

    if line_numbers {
        for (i, line) in text.lines().enumerate() {
            println!("{:>6}  {line}", i + 1);
        }
    } else {
        print!("{text}");
    }

    Ok(())
}
