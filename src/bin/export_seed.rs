//! Write the built-in seed tables as JSON, for editing and reuse via SEED_FILE.
//!
//! Usage: export_seed [path]   (stdout when no path is given)

use anyhow::{Context, Result};

use blackdiamond::seed::SeedTables;

fn main() -> Result<()> {
    let json = SeedTables::builtin().to_json_pretty()?;
    match std::env::args().nth(1) {
        Some(path) => {
            std::fs::write(&path, json).with_context(|| format!("write {}", path))?;
            eprintln!("seed tables written to {}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}
