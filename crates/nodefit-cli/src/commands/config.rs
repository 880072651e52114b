//! `nodefit config`: print the effective configuration.

use super::{GlobalArgs, Outcome, OutputFormat, load_config, print_json};

pub fn show(global: &GlobalArgs) -> anyhow::Result<Outcome> {
    let config = load_config(global.config.as_deref())?;
    match global.format {
        OutputFormat::Json => print_json(&config)?,
        OutputFormat::Text => print!("{}", config.to_toml_string()?),
    }
    Ok(Outcome::Success)
}
