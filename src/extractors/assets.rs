use crate::browser::{Evaluate, Script, evaluate_as};
use crate::results::{AssetRecord, BackgroundRef, ImageOrigin, ImageRef, InlineSvg};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

/// `url(...)` references inside a computed `background-image`
static CSS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*["']?([^"')]+)["']?\s*\)"#).expect("CSS url() pattern should be valid")
});

/// Raw output of the assets script
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AssetSnapshot {
    images: Vec<RawImage>,
    backgrounds: Vec<RawBackground>,
    svgs: Vec<RawSvg>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawImage {
    src: Option<String>,
    data_src: Option<String>,
    srcset: Option<String>,
    alt: Option<String>,
    width: Option<f64>,
    height: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawBackground {
    tag: String,
    background_image: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSvg {
    markup: String,
    width: Option<String>,
    height: Option<String>,
}

/// Locates images, CSS backgrounds and inline SVGs, resolved against `base_url`
pub async fn locate_assets<E: Evaluate>(page: &E, base_url: &Url) -> AssetRecord {
    match evaluate_as::<AssetSnapshot, _>(page, Script::Assets, vec![]).await {
        Ok(snapshot) => {
            let record = reduce(snapshot, base_url);
            ::log::debug!(
                "Assets: {} images, {} backgrounds, {} inline SVGs",
                record.images.len(),
                record.backgrounds.len(),
                record.svgs.len()
            );
            record
        }
        Err(e) => {
            ::log::warn!("Asset location failed, returning empty record: {}", e);
            AssetRecord::default()
        }
    }
}

/// Resolves and deduplicates a raw snapshot
///
/// A URL is recorded once across images and backgrounds; the first
/// occurrence wins. Candidates that do not resolve are dropped.
pub fn reduce(snapshot: AssetSnapshot, base_url: &Url) -> AssetRecord {
    let mut seen = HashSet::new();
    let mut record = AssetRecord::default();

    for image in snapshot.images {
        let alt = image.alt.unwrap_or_default();
        let primary = non_empty(image.src).or_else(|| non_empty(image.data_src));

        if let Some(url) = primary.and_then(|src| resolve(base_url, &src)) {
            if seen.insert(url.clone()) {
                record.images.push(ImageRef {
                    url,
                    alt: alt.clone(),
                    width: dimension(image.width),
                    height: dimension(image.height),
                    origin: ImageOrigin::Img,
                });
            }
        }

        if let Some(srcset) = image.srcset {
            for candidate in srcset_urls(&srcset) {
                let Some(url) = resolve(base_url, candidate) else {
                    continue;
                };
                if seen.insert(url.clone()) {
                    record.images.push(ImageRef {
                        url,
                        alt: alt.clone(),
                        width: None,
                        height: None,
                        origin: ImageOrigin::Srcset,
                    });
                }
            }
        }
    }

    for background in snapshot.backgrounds {
        for candidate in css_urls(&background.background_image) {
            let Some(url) = resolve(base_url, candidate) else {
                continue;
            };
            if seen.insert(url.clone()) {
                record.backgrounds.push(BackgroundRef {
                    url,
                    element: background.tag.to_ascii_lowercase(),
                });
            }
        }
    }

    record.svgs = snapshot
        .svgs
        .into_iter()
        .enumerate()
        .map(|(index, svg)| InlineSvg {
            content: svg.markup,
            index,
            width: svg.width,
            height: svg.height,
        })
        .collect();

    record
}

/// URL part of each comma-separated `srcset` candidate
pub fn srcset_urls(srcset: &str) -> Vec<&str> {
    srcset
        .split(',')
        .filter_map(|candidate| candidate.split_whitespace().next())
        .collect()
}

/// Every `url(...)` target in a CSS value, in order
pub fn css_urls(value: &str) -> Vec<&str> {
    CSS_URL
        .captures_iter(value)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|url| !url.is_empty())
        .collect()
}

fn resolve(base_url: &Url, candidate: &str) -> Option<String> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return None;
    }
    match base_url.join(candidate) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            ::log::trace!("Dropping malformed asset URL {:?}: {}", candidate, e);
            None
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn dimension(value: Option<f64>) -> Option<u32> {
    value
        .filter(|v| v.is_finite() && *v >= 1.0)
        .map(|v| v.round() as u32)
}
