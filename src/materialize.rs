//! Download, deduplicate and optionally convert located assets.
//!
//! Raster candidates are fetched concurrently up to a fixed cap. Storage is
//! content addressed: the MD5 of the downloaded bytes names the file, and a
//! [`ContentHashTable`] owned by the caller makes byte-identical assets from
//! different URLs share one file. Failures of a single asset are logged and
//! skipped; a materialization call as a whole never fails.

use crate::config::HarvestConfig;
use crate::error::{AssetError, HarvestError};
use crate::results::{
    AssetCandidate, AssetRecord, InlineSvg, MaterializedAssets, MaterializedImage, MaterializedSvg,
};
use crate::utils::{is_data_url, is_raster_extension, url_extension};
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use image::{DynamicImage, Rgb, RgbImage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};

/// A file already written for some content hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    pub local_path: String,
    pub converted: bool,
}

/// Content hash -> stored file, for the duration of one materialization call
///
/// The first download to finish claims a hash and stores the file; later
/// arrivals with the same bytes wait for that store and reuse its path. The
/// map lock is only held to look up or create a claim, so stores of distinct
/// hashes run in parallel. A failed store leaves the claim open for the next
/// arrival.
#[derive(Debug, Default)]
pub struct ContentHashTable {
    entries: Mutex<HashMap<String, Arc<OnceCell<StoredAsset>>>>,
}

impl ContentHashTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored file for `hash`, if a store has completed
    pub async fn get(&self, hash: &str) -> Option<StoredAsset> {
        self.entries
            .lock()
            .await
            .get(hash)
            .and_then(|cell| cell.get().cloned())
    }

    /// Number of hashes with a stored file
    pub async fn len(&self) -> usize {
        self.entries
            .lock()
            .await
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn claim(&self, hash: &str) -> Arc<OnceCell<StoredAsset>> {
        self.entries
            .lock()
            .await
            .entry(hash.to_string())
            .or_default()
            .clone()
    }
}

/// Writes located assets to the images and svg directories
pub struct Materializer {
    client: reqwest::Client,
    images_dir: PathBuf,
    svg_dir: PathBuf,
    concurrency: usize,
    webp_quality: f32,
}

impl Materializer {
    /// Builds the HTTP client and creates the asset directories
    pub fn new(config: &HarvestConfig) -> Result<Self, HarvestError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.download_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        let images_dir = config.images_dir();
        let svg_dir = config.svg_dir();
        std::fs::create_dir_all(&images_dir)?;
        std::fs::create_dir_all(&svg_dir)?;

        Ok(Self {
            client,
            images_dir,
            svg_dir,
            concurrency: config.download_concurrency.max(1),
            webp_quality: config.webp_quality,
        })
    }

    /// Materializes every image and background, then every inline SVG
    pub async fn materialize(
        &self,
        assets: &AssetRecord,
        convert_to_webp: bool,
        table: &ContentHashTable,
    ) -> MaterializedAssets {
        let candidates = assets.raster_candidates();
        let candidate_count = candidates.len();
        ::log::info!(
            "Materializing {} raster assets and {} inline SVGs",
            candidate_count,
            assets.svgs.len()
        );

        let images: Vec<MaterializedImage> = stream::iter(candidates)
            .map(|candidate| self.materialize_image(candidate, convert_to_webp, table))
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .flatten()
            .collect();

        let svgs = self.write_svgs(&assets.svgs).await;

        let total_images = images.len();
        let unique_files = images.iter().filter(|image| !image.duplicate).count();
        let result = MaterializedAssets {
            total_svgs: svgs.len(),
            images,
            svgs,
            total_images,
            unique_files,
            skipped: candidate_count - total_images,
            deduplicated: candidate_count - unique_files,
        };

        ::log::info!(
            "Materialized {} images ({} files, {} skipped) and {} SVGs",
            result.total_images,
            result.unique_files,
            result.skipped,
            result.total_svgs
        );
        result
    }

    async fn materialize_image(
        &self,
        candidate: AssetCandidate,
        convert_to_webp: bool,
        table: &ContentHashTable,
    ) -> Option<MaterializedImage> {
        if is_data_url(&candidate.url) {
            ::log::debug!("Skipping data URL asset");
            return None;
        }

        let bytes = match self.download(&candidate.url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                ::log::warn!("Skipping asset: {}", e);
                return None;
            }
        };
        let content_hash = format!("{:x}", md5::compute(&bytes));

        let claim = table.claim(&content_hash).await;
        let mut stored_here = false;
        let stored = match claim
            .get_or_try_init(|| {
                stored_here = true;
                self.store(&candidate.url, &content_hash, bytes, convert_to_webp)
            })
            .await
        {
            Ok(stored) => stored.clone(),
            Err(e) => {
                ::log::warn!("Skipping asset: {}", e);
                return None;
            }
        };

        if stored_here {
            ::log::debug!("Stored {} as {}", candidate.url, stored.local_path);
        } else {
            ::log::debug!(
                "{} duplicates {} ({})",
                candidate.url,
                stored.local_path,
                content_hash
            );
        }

        Some(MaterializedImage {
            source: candidate,
            local_path: stored.local_path,
            content_hash,
            converted: stored.converted,
            duplicate: !stored_here,
        })
    }

    async fn download(&self, url: &str) -> Result<Bytes, AssetError> {
        let download_error = |reason: String| AssetError::Download {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| download_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(download_error(format!("HTTP {}", status)));
        }

        response
            .bytes()
            .await
            .map_err(|e| download_error(e.to_string()))
    }

    /// Writes new content, converting eligible rasters to WebP
    async fn store(
        &self,
        url: &str,
        content_hash: &str,
        bytes: Bytes,
        convert_to_webp: bool,
    ) -> Result<StoredAsset, AssetError> {
        let extension = url_extension(url);

        if convert_to_webp && is_raster_extension(&extension) {
            let quality = self.webp_quality;
            let source = bytes.clone();
            let encoded = tokio::task::spawn_blocking(move || encode_webp(&source, quality))
                .await
                .unwrap_or_else(|e| Err(format!("encoder task failed: {}", e)));

            match encoded {
                Ok(webp) => {
                    let path = self.images_dir.join(format!("{}.webp", content_hash));
                    write_file(&path, &webp).await?;
                    return Ok(StoredAsset {
                        local_path: display_path(&path),
                        converted: true,
                    });
                }
                Err(reason) => {
                    let error = AssetError::Conversion {
                        url: url.to_string(),
                        reason,
                    };
                    ::log::warn!("{}; keeping original bytes", error);
                }
            }
        }

        let path = self
            .images_dir
            .join(format!("{}.{}", content_hash, extension));
        write_file(&path, &bytes).await?;
        Ok(StoredAsset {
            local_path: display_path(&path),
            converted: false,
        })
    }

    /// Writes each inline SVG verbatim, named by its document position
    async fn write_svgs(&self, svgs: &[InlineSvg]) -> Vec<MaterializedSvg> {
        let mut written = Vec::with_capacity(svgs.len());
        for svg in svgs {
            let path = self.svg_dir.join(format!("inline-svg-{}.svg", svg.index));
            match write_file(&path, svg.content.as_bytes()).await {
                Ok(()) => written.push(MaterializedSvg {
                    svg: svg.clone(),
                    local_path: display_path(&path),
                }),
                Err(e) => ::log::warn!("Skipping inline SVG {}: {}", svg.index, e),
            }
        }
        written
    }
}

/// Decodes a raster image, flattens it onto white and encodes lossy WebP
pub fn encode_webp(bytes: &[u8], quality: f32) -> Result<Vec<u8>, String> {
    let decoded = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
    let flattened = flatten_on_white(&decoded);
    let encoder = webp::Encoder::from_rgb(flattened.as_raw(), flattened.width(), flattened.height());
    let encoded = encoder
        .encode_simple(false, quality)
        .map_err(|e| format!("WebP encoding failed: {:?}", e))?;
    Ok(encoded.to_vec())
}

/// Composites any transparency over an opaque white background
///
/// Indexed and grayscale images are expanded to RGBA first.
pub fn flatten_on_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    let mut flattened = RgbImage::new(rgba.width(), rgba.height());

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = u16::from(a);
        let blend = |channel: u8| {
            ((u16::from(channel) * alpha + 255 * (255 - alpha) + 127) / 255) as u8
        };
        flattened.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }

    flattened
}

async fn write_file(path: &Path, contents: &[u8]) -> Result<(), AssetError> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|source| AssetError::Write {
            path: display_path(path),
            source,
        })
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
