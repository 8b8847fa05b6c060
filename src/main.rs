// Quadshard binary entry point
use anyhow::Result;

fn main() -> Result<()> {
    quadshard::cli::run()?;
    Ok(())
}
