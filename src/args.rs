use clap::Parser;
use page_harvest::harvest::DEFAULT_TIMEOUT_MS;
use page_harvest::{HarvestConfig, HarvestError};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "page-harvest")]
#[command(about = "Loads a web page in a headless browser and harvests its content, assets, design tokens and metadata")]
#[command(version)]
pub struct Args {
    /// Page URL to harvest
    pub url: String,

    /// Only locate assets, do not download them
    #[arg(long)]
    pub no_assets: bool,

    /// Keep downloaded rasters in their original format
    #[arg(long)]
    pub no_webp: bool,

    /// Navigation timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout: u64,

    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// WebDriver endpoint (overrides config and WEBDRIVER_URL)
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Directory for the JSON snapshots
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Root directory for downloaded assets
    #[arg(long)]
    pub assets_dir: Option<PathBuf>,
}

impl Args {
    /// Resolve the effective configuration: file or defaults, then
    /// environment, then command-line flags
    pub fn harvest_config(&self) -> Result<HarvestConfig, HarvestError> {
        let mut config = match &self.config {
            Some(path) => HarvestConfig::from_file(path)?,
            None => HarvestConfig::default(),
        }
        .with_env_overrides();

        if let Some(url) = &self.webdriver_url {
            config.webdriver_url = url.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(dir) = &self.assets_dir {
            config.assets_dir = dir.clone();
        }
        Ok(config)
    }
}
