use std::path::PathBuf;

use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

/// Run settings from `certsplit.toml` and `CERTSPLIT_*` variables; CLI flags win over both.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub output_dir: PathBuf,
    pub organize: bool,
    pub zip: bool,
    pub zip_name: String,
    pub chunk_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            output_dir: PathBuf::from("output"),
            organize: false,
            zip: false,
            zip_name: "certificate_pages.zip".to_string(),
            chunk_size: 500,
        }
    }
}

pub fn load() -> Result<Settings> {
    let builder = Config::builder()
        .add_source(File::with_name("certsplit").required(false))
        .add_source(Environment::with_prefix("CERTSPLIT").try_parsing(true));
    from_builder(builder)
}

fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Settings> {
    let mut settings: Settings = builder
        .build()
        .context("failed to load settings")?
        .try_deserialize()
        .context("invalid settings")?;
    settings.chunk_size = settings.chunk_size.max(1);
    Ok(settings)
}
