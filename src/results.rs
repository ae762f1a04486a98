use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A visible heading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// Heading level, always 1 through 6
    pub level: u8,
    pub text: String,
    /// Source tag name (h1..h6)
    pub tag: String,
}

/// Kind of HTML list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    /// `<ul>`
    Ul,
    /// `<ol>`
    Ol,
}

/// A visible list with its visible items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBlock {
    #[serde(rename = "type")]
    pub kind: ListKind,
    pub items: Vec<String>,
}

/// A link found inside a navigation landmark
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavLink {
    pub text: String,
    pub href: Option<String>,
}

/// A structural landmark and the headings it contains
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionInfo {
    pub tag: String,
    pub id: Option<String>,
    pub class: Option<String>,
    pub headings: Vec<String>,
}

/// Visible text and structure of a page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub headings: Vec<Heading>,
    pub paragraphs: Vec<String>,
    pub lists: Vec<ListBlock>,
    pub navigation: Vec<NavLink>,
    pub structure: Vec<SectionInfo>,
}

/// Where an image reference was discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageOrigin {
    Img,
    Srcset,
}

/// An `<img>` reference resolved to an absolute URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
    pub alt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(rename = "type")]
    pub origin: ImageOrigin,
}

/// A computed CSS background image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundRef {
    pub url: String,
    /// Tag name of the element carrying the background
    pub element: String,
}

/// Verbatim inline `<svg>` markup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineSvg {
    pub content: String,
    /// Position among all `<svg>` elements in document order
    pub index: usize,
    pub width: Option<String>,
    pub height: Option<String>,
}

/// Visual assets located on a page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub images: Vec<ImageRef>,
    pub backgrounds: Vec<BackgroundRef>,
    pub svgs: Vec<InlineSvg>,
}

/// Candidate colors grouped by role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorTokens {
    pub primary: Vec<String>,
    pub text: Vec<String>,
    pub background: Vec<String>,
    pub border: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontTokens {
    pub families: Vec<String>,
    pub weights: Vec<String>,
    /// Sorted ascending by numeric value
    pub sizes: Vec<String>,
}

/// Design tokens inferred from computed styles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub css_variables: BTreeMap<String, String>,
    pub colors: ColorTokens,
    pub fonts: FontTokens,
    pub spacing: Vec<String>,
}

/// SEO and social metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaRecord {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub author: Option<String>,
    pub language: Option<String>,
    pub canonical: Option<String>,
    pub favicon: Option<String>,
    pub opengraph: BTreeMap<String, String>,
    pub twitter: BTreeMap<String, String>,
}

/// Kind of raster asset submitted for materialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Img,
    Srcset,
    Background,
}

/// One download candidate, taken from the image or background list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetCandidate {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: AssetKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
}

impl From<&ImageRef> for AssetCandidate {
    fn from(image: &ImageRef) -> Self {
        Self {
            url: image.url.clone(),
            kind: match image.origin {
                ImageOrigin::Img => AssetKind::Img,
                ImageOrigin::Srcset => AssetKind::Srcset,
            },
            alt: Some(image.alt.clone()),
            element: None,
        }
    }
}

impl From<&BackgroundRef> for AssetCandidate {
    fn from(background: &BackgroundRef) -> Self {
        Self {
            url: background.url.clone(),
            kind: AssetKind::Background,
            alt: None,
            element: Some(background.element.clone()),
        }
    }
}

impl AssetRecord {
    /// Images followed by backgrounds, in record order
    pub fn raster_candidates(&self) -> Vec<AssetCandidate> {
        self.images
            .iter()
            .map(AssetCandidate::from)
            .chain(self.backgrounds.iter().map(AssetCandidate::from))
            .collect()
    }
}

/// A raster asset stored on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializedImage {
    #[serde(flatten)]
    pub source: AssetCandidate,
    pub local_path: String,
    pub content_hash: String,
    pub converted: bool,
    /// Bytes matched an asset stored earlier in the same call
    pub duplicate: bool,
}

/// An inline SVG written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializedSvg {
    #[serde(flatten)]
    pub svg: InlineSvg,
    pub local_path: String,
}

/// Outcome of one materialization call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializedAssets {
    pub images: Vec<MaterializedImage>,
    pub svgs: Vec<MaterializedSvg>,
    /// Image entries that received a local path (duplicates included)
    pub total_images: usize,
    pub total_svgs: usize,
    /// Distinct files written for raster assets
    pub unique_files: usize,
    /// Candidates that ended without a local path
    pub skipped: usize,
    /// Candidates minus distinct files written
    pub deduplicated: usize,
}

/// Assets as returned to the caller: located only, or also materialized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetsOutcome {
    Materialized(MaterializedAssets),
    Located(AssetRecord),
}

/// Everything extracted from one page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub url: String,
    pub content: ContentRecord,
    pub assets: AssetsOutcome,
    pub tokens: TokenRecord,
    pub meta: MetaRecord,
    pub scraped_at: DateTime<Utc>,
}
