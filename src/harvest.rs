use crate::browser::{self, Evaluate};
use crate::config::HarvestConfig;
use crate::error::HarvestError;
use crate::extractors;
use crate::materialize::{ContentHashTable, Materializer};
use crate::results::{
    AssetRecord, AssetsOutcome, ContentRecord, MetaRecord, PipelineResult, TokenRecord,
};
use chrono::Utc;
use serde::Serialize;
use std::path::Path;
use url::Url;

/// Default navigation bound in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Builder for a single-page harvest
pub struct Harvest {
    url: String,
    save_assets: bool,
    convert_to_webp: bool,
    timeout_ms: u64,
    config: HarvestConfig,
}

/// The four records read from one settled page
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub content: ContentRecord,
    pub assets: AssetRecord,
    pub tokens: TokenRecord,
    pub meta: MetaRecord,
}

impl Harvest {
    /// Create a harvest for `url` with default configuration
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            save_assets: true,
            convert_to_webp: true,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            config: HarvestConfig::default().with_env_overrides(),
        }
    }

    /// Download located assets to local storage
    pub fn with_assets(mut self, save_assets: bool) -> Self {
        self.save_assets = save_assets;
        self
    }

    /// Convert raster assets to WebP while materializing
    pub fn with_webp(mut self, convert_to_webp: bool) -> Self {
        self.convert_to_webp = convert_to_webp;
        self
    }

    /// Set the navigation timeout in milliseconds
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Apply a configuration
    pub fn with_config(mut self, config: HarvestConfig) -> Self {
        self.config = config;
        self
    }

    /// Load configuration from a JSON file
    pub fn with_config_file(self, path: impl AsRef<Path>) -> Result<Self, HarvestError> {
        let config = HarvestConfig::from_file(path)?.with_env_overrides();
        Ok(self.with_config(config))
    }

    /// Settle the page, extract all records, then materialize assets if requested
    pub async fn run(self) -> Result<PipelineResult, HarvestError> {
        let base_url = Url::parse(&self.url).map_err(|e| HarvestError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;

        let session = browser::settle(&self.config, base_url.as_str(), self.timeout_ms).await?;
        ::log::info!("Extracting data from {}", base_url);
        let extraction = extract_all(&session, &base_url).await;
        session.close().await;

        let assets = if self.save_assets {
            let materializer = Materializer::new(&self.config)?;
            let table = ContentHashTable::new();
            AssetsOutcome::Materialized(
                materializer
                    .materialize(&extraction.assets, self.convert_to_webp, &table)
                    .await,
            )
        } else {
            AssetsOutcome::Located(extraction.assets)
        };

        if let Err(e) = write_snapshots(
            &self.config.output_dir,
            &extraction.content,
            &assets,
            &extraction.tokens,
            &extraction.meta,
        ) {
            ::log::warn!(
                "Could not write snapshots to {}: {}",
                self.config.output_dir.display(),
                e
            );
        }

        ::log::info!("Harvest complete: {}", base_url);
        Ok(PipelineResult {
            url: base_url.to_string(),
            content: extraction.content,
            assets,
            tokens: extraction.tokens,
            meta: extraction.meta,
            scraped_at: Utc::now(),
        })
    }
}

/// Runs the four extraction passes one after another on the same page
///
/// In-page scripts are not safe to interleave against a mutating document,
/// so the passes are never issued concurrently.
pub async fn extract_all<E: Evaluate>(page: &E, base_url: &Url) -> Extraction {
    let content = extractors::extract_content(page).await;
    let assets = extractors::locate_assets(page, base_url).await;
    let tokens = extractors::extract_tokens(page).await;
    let meta = extractors::extract_meta(page, base_url.as_str()).await;

    Extraction {
        content,
        assets,
        tokens,
        meta,
    }
}

/// Writes one pretty-printed JSON file per record into `dir`
pub fn write_snapshots(
    dir: &Path,
    content: &ContentRecord,
    assets: &AssetsOutcome,
    tokens: &TokenRecord,
    meta: &MetaRecord,
) -> Result<(), HarvestError> {
    std::fs::create_dir_all(dir)?;
    write_json(&dir.join("content.json"), content)?;
    write_json(&dir.join("assets.json"), assets)?;
    write_json(&dir.join("tokens.json"), tokens)?;
    write_json(&dir.join("meta.json"), meta)?;
    ::log::debug!("Wrote snapshots to {}", dir.display());
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), HarvestError> {
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::Script;
    use crate::extractors::tests::FakePage;
    use serde_json::json;

    fn styled() -> serde_json::Value {
        json!({ "display": "block", "visibility": "visible", "opacity": "1", "inLayout": true })
    }

    #[tokio::test]
    async fn test_extract_all_combines_passes() {
        let page = FakePage::new()
            .with_script(
                Script::Content,
                json!({
                    "paragraphs": [{ "text": "Bienvenue au café du coin", "style": styled() }]
                }),
            )
            .with_script(
                Script::Assets,
                json!({ "images": [{ "src": "hero.png", "alt": "Hero" }] }),
            )
            .with_script(
                Script::Tokens,
                json!({ "variables": [["--brand", " #ff0000 "]] }),
            )
            .with_html("<html lang=\"fr\"><head><title>Café</title></head><body></body></html>");

        let base = Url::parse("https://example.com/menu/").unwrap();
        let extraction = extract_all(&page, &base).await;

        assert_eq!(extraction.content.paragraphs, vec!["Bienvenue au café du coin"]);
        assert_eq!(extraction.assets.images[0].url, "https://example.com/menu/hero.png");
        assert_eq!(extraction.tokens.css_variables["--brand"], "#ff0000");
        assert_eq!(extraction.meta.title, "Café");
        assert_eq!(extraction.meta.language.as_deref(), Some("fr"));
        assert_eq!(extraction.meta.url, "https://example.com/menu/");
    }

    #[tokio::test]
    async fn test_extract_all_degrades_to_empty_records() {
        let page = FakePage::new();
        let base = Url::parse("https://example.com/").unwrap();
        let extraction = extract_all(&page, &base).await;

        assert_eq!(extraction.content, ContentRecord::default());
        assert_eq!(extraction.assets, AssetRecord::default());
        assert_eq!(extraction.tokens, TokenRecord::default());
        assert_eq!(extraction.meta.url, "https://example.com/");
        assert!(extraction.meta.title.is_empty());
    }

    #[test]
    fn test_snapshots_are_pretty_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let content = ContentRecord {
            paragraphs: vec!["Grüße aus München, schön!".to_string()],
            ..ContentRecord::default()
        };
        let assets = AssetsOutcome::Located(AssetRecord::default());

        write_snapshots(
            dir.path(),
            &content,
            &assets,
            &TokenRecord::default(),
            &MetaRecord::default(),
        )
        .unwrap();

        let written = std::fs::read_to_string(dir.path().join("content.json")).unwrap();
        assert!(written.contains("Grüße aus München, schön!"));
        assert!(written.contains("\n  \"headings\""));
        for name in ["assets.json", "tokens.json", "meta.json"] {
            assert!(dir.path().join(name).exists(), "{} missing", name);
        }
    }

    #[tokio::test]
    async fn test_invalid_url_fails_before_browser() {
        let err = Harvest::new("not a url").run().await.unwrap_err();
        assert!(matches!(err, HarvestError::InvalidUrl { .. }));
    }
}
