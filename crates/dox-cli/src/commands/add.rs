//! `dox add <name>` — appends a new `[sources.<name>]` block to the config
//! file on disk. A thin text operation: this command never rewrites the
//! rest of the file, it only appends, so existing formatting and comments
//! are preserved.

use std::path::Path;

use anyhow::{Result, bail};

pub fn run(
    config_path: &Path,
    name: &str,
    url: Option<&str>,
    repo: Option<&str>,
    git_ref: Option<&str>,
    path: Option<&str>,
) -> Result<()> {
    if url.is_none() && repo.is_none() {
        bail!("`dox add` requires either --url or --repo");
    }
    if url.is_some() && repo.is_some() {
        bail!("`dox add` accepts only one of --url or --repo");
    }

    let mut block = format!("\n[sources.{name}]\n");
    if let Some(url) = url {
        block.push_str(&format!("url = {}\n", toml_string(url)));
    } else if let Some(repo) = repo {
        block.push_str(&format!("repo = {}\n", toml_string(repo)));
        if let Some(r) = git_ref {
            block.push_str(&format!("ref = {}\n", toml_string(r)));
        }
        if let Some(p) = path {
            block.push_str(&format!("path = {}\n", toml_string(p)));
        }
    }

    let mut existing = std::fs::read_to_string(config_path).unwrap_or_default();
    if !existing.is_empty() && !existing.ends_with('\n') {
        existing.push('\n');
    }
    existing.push_str(&block);
    std::fs::write(config_path, existing)?;

    println!("added source `{name}` to {}", config_path.display());
    Ok(())
}

fn toml_string(value: &str) -> String {
    format!("{:?}", value)
}
