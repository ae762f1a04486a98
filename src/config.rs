use crate::error::HarvestError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Configuration for a harvest run
///
/// Every field has a default, so a config file only needs to name the
/// values it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Run the browser without a visible window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Browser viewport width in pixels
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    /// Browser viewport height in pixels
    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,

    /// User agent presented by the browser
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Pause after network idle, before scrolling
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Pause after scrolling back to the top, before extraction
    #[serde(default = "default_post_scroll_delay_ms")]
    pub post_scroll_delay_ms: u64,

    /// Pixels scrolled per auto-scroll step
    #[serde(default = "default_scroll_step_px")]
    pub scroll_step_px: u32,

    /// Milliseconds between auto-scroll steps
    #[serde(default = "default_scroll_interval_ms")]
    pub scroll_interval_ms: u64,

    /// Upper bound on auto-scroll steps (infinite-scroll pages never reach the bottom)
    #[serde(default = "default_max_scroll_steps")]
    pub max_scroll_steps: u32,

    /// Quiet period with no new resource loads that counts as network idle
    #[serde(default = "default_network_idle_ms")]
    pub network_idle_ms: u64,

    /// Directory for the JSON snapshots
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Root directory for downloaded images and inline SVGs
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,

    /// Maximum number of asset downloads in flight
    #[serde(default = "default_download_concurrency")]
    pub download_concurrency: usize,

    /// Per-request timeout for asset downloads
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,

    /// Lossy WebP quality (0-100)
    #[serde(default = "default_webp_quality")]
    pub webp_quality: f32,
}

impl HarvestConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, HarvestError> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .map_err(|e| HarvestError::Config(format!("{}: {}", path.display(), e)))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, HarvestError> {
        serde_json::from_str(json).map_err(|e| HarvestError::Config(e.to_string()))
    }

    /// Override the WebDriver URL with the WEBDRIVER_URL environment variable if set
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
        self
    }

    /// Directory that receives downloaded raster images
    pub fn images_dir(&self) -> PathBuf {
        self.assets_dir.join("images")
    }

    /// Directory that receives inline SVG files
    pub fn svg_dir(&self) -> PathBuf {
        self.assets_dir.join("svg")
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            headless: default_headless(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            user_agent: default_user_agent(),
            settle_delay_ms: default_settle_delay_ms(),
            post_scroll_delay_ms: default_post_scroll_delay_ms(),
            scroll_step_px: default_scroll_step_px(),
            scroll_interval_ms: default_scroll_interval_ms(),
            max_scroll_steps: default_max_scroll_steps(),
            network_idle_ms: default_network_idle_ms(),
            output_dir: default_output_dir(),
            assets_dir: default_assets_dir(),
            download_concurrency: default_download_concurrency(),
            download_timeout_secs: default_download_timeout_secs(),
            webp_quality: default_webp_quality(),
        }
    }
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_headless() -> bool {
    true
}

fn default_viewport_width() -> u32 {
    1920
}

fn default_viewport_height() -> u32 {
    1080
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

fn default_settle_delay_ms() -> u64 {
    2000
}

fn default_post_scroll_delay_ms() -> u64 {
    1000
}

fn default_scroll_step_px() -> u32 {
    100
}

fn default_scroll_interval_ms() -> u64 {
    100
}

fn default_max_scroll_steps() -> u32 {
    500
}

fn default_network_idle_ms() -> u64 {
    500
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("assets")
}

fn default_download_concurrency() -> usize {
    6
}

fn default_download_timeout_secs() -> u64 {
    30
}

fn default_webp_quality() -> f32 {
    85.0
}
