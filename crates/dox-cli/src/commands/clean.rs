//! `dox clean` — removes the output root: cached files, lock, and manifest.

use anyhow::Result;

use dox_core::config::Config;

pub fn run(config: &Config) -> Result<()> {
    let output_root = config.output_root();
    if output_root.exists() {
        std::fs::remove_dir_all(&output_root)?;
        println!("removed {}", output_root.display());
    } else {
        println!("{} does not exist; nothing to clean", output_root.display());
    }
    Ok(())
}
