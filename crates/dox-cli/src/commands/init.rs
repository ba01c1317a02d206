//! `dox init` — writes a starter `dox.toml` in the current directory.

use anyhow::{Result, bail};

const TEMPLATE: &str = r#"# dox configuration.

output = ".dox"
# github_token = "..."
# max_parallel = 10
excludes = []

[display]
default_limit = 50
description_length = 200
line_numbers = false
format = "table"

# [sources.react]
# url = "https://react.dev/llms.txt"

# [sources.vue-docs]
# repo = "vuejs/docs"
# path = "src"
"#;

pub fn run(force: bool) -> Result<()> {
    let path = std::path::Path::new("dox.toml");
    if path.exists() && !force {
        bail!("dox.toml already exists; pass --force to overwrite");
    }
    std::fs::write(path, TEMPLATE)?;
    println!("wrote {}", path.display());
    Ok(())
}
