use anyhow::{Context, Result};
use std::path::PathBuf;

use eventharvest::config::Config;
use eventharvest::parser::RecordAssembler;

/// Run the extraction engine over a saved event page
pub fn extract(config: &Config, input: PathBuf, url: String) -> Result<()> {
    let markup = std::fs::read_to_string(&input)
        .with_context(|| format!("Failed to read page: {}", input.display()))?;

    let assembler = RecordAssembler::new(&config.extraction);
    let record = assembler
        .assemble(&url, &markup)
        .with_context(|| format!("Failed to extract {}", input.display()))?;

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
