//! Primary entrypoint for the `dox` CLI binary.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(err) = dox_cli::run().await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
    Ok(())
}
