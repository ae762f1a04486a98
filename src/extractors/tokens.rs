use crate::browser::{Evaluate, Script, evaluate_as};
use crate::results::{ColorTokens, FontTokens, TokenRecord};
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

/// Maximum entries per color role
pub const COLOR_CAP: usize = 10;
/// Maximum spacing values
pub const SPACING_CAP: usize = 15;

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)")
        .expect("numeric prefix pattern should be valid")
});

/// Raw output of the tokens script
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TokenSnapshot {
    variables: Vec<(String, String)>,
    samples: Vec<StyleSample>,
    spacing: Vec<SpacingSample>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StyleSample {
    tag: String,
    class_name: String,
    color: String,
    background_color: String,
    border_color: String,
    font_family: String,
    font_size: String,
    font_weight: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SpacingSample {
    padding: String,
    margin: String,
    gap: String,
}

/// What a sampled element says about the palette
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Background,
    Text,
    Primary,
    Other,
}

impl Role {
    fn of(tag: &str, class_name: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "body" | "html" => Role::Background,
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "p" | "span" => Role::Text,
            "button" => Role::Primary,
            _ if class_name.contains("button") || class_name.contains("btn") => Role::Primary,
            _ => Role::Other,
        }
    }
}

/// Extracts CSS variables, role colors, fonts and spacing from computed styles
pub async fn extract_tokens<E: Evaluate>(page: &E) -> TokenRecord {
    match evaluate_as::<TokenSnapshot, _>(page, Script::Tokens, vec![]).await {
        Ok(snapshot) => {
            let record = reduce(snapshot);
            ::log::debug!(
                "Tokens: {} variables, {} font sizes, {} spacing values",
                record.css_variables.len(),
                record.fonts.sizes.len(),
                record.spacing.len()
            );
            record
        }
        Err(e) => {
            ::log::warn!("Token extraction failed, returning empty record: {}", e);
            TokenRecord::default()
        }
    }
}

pub fn reduce(snapshot: TokenSnapshot) -> TokenRecord {
    let css_variables = snapshot
        .variables
        .into_iter()
        .filter(|(name, _)| name.starts_with("--"))
        .map(|(name, value)| (name, value.trim().to_string()))
        .collect();

    let mut colors = ColorTokens::default();
    let mut fonts = FontTokens::default();

    for sample in &snapshot.samples {
        match Role::of(&sample.tag, &sample.class_name) {
            Role::Background => push_color(&mut colors.background, &sample.background_color),
            Role::Text => push_color(&mut colors.text, &sample.color),
            Role::Primary => {
                push_color(&mut colors.primary, &sample.background_color);
                push_color(&mut colors.primary, &sample.color);
            }
            Role::Other => {}
        }
        push_color(&mut colors.background, &sample.background_color);
        push_color(&mut colors.border, &sample.border_color);

        push_unique(&mut fonts.families, &sample.font_family, usize::MAX);
        push_unique(&mut fonts.sizes, &sample.font_size, usize::MAX);
        push_unique(&mut fonts.weights, &sample.font_weight, usize::MAX);
    }
    sort_by_magnitude(&mut fonts.sizes);

    let mut spacing = Vec::new();
    for sample in &snapshot.spacing {
        for value in [&sample.padding, &sample.margin, &sample.gap] {
            if !is_zero_length(value) {
                push_unique(&mut spacing, value, SPACING_CAP);
            }
        }
    }

    TokenRecord {
        css_variables,
        colors,
        fonts,
        spacing,
    }
}

/// Canonical `rgb(...)`/`rgba(...)` form of a CSS color
///
/// Returns `None` for values that do not parse as a single color and for
/// fully transparent colors.
pub fn canonicalize_color(raw: &str) -> Option<String> {
    let color = csscolorparser::parse(raw.trim()).ok()?;
    let [r, g, b, a] = color.to_rgba8();
    match a {
        0 => None,
        255 => Some(format!("rgb({}, {}, {})", r, g, b)),
        _ => {
            let alpha = (f64::from(a) / 255.0 * 100.0).round() / 100.0;
            Some(format!("rgba({}, {}, {}, {})", r, g, b, alpha))
        }
    }
}

/// Leading numeric literal of a CSS value (`"16px"` -> 16.0)
pub fn leading_number(value: &str) -> Option<f64> {
    LEADING_NUMBER
        .captures(value)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Stable ascending sort on the leading number; values without one go last
pub fn sort_by_magnitude(values: &mut [String]) {
    values.sort_by(|a, b| {
        let a = leading_number(a).unwrap_or(f64::INFINITY);
        let b = leading_number(b).unwrap_or(f64::INFINITY);
        a.total_cmp(&b)
    });
}

/// True when every component of a (possibly shorthand) value is a zero length
pub fn is_zero_length(value: &str) -> bool {
    let mut parts = value.split_whitespace().peekable();
    if parts.peek().is_none() {
        return true;
    }
    parts.all(|part| leading_number(part) == Some(0.0))
}

fn push_color(list: &mut Vec<String>, raw: &str) {
    if let Some(color) = canonicalize_color(raw) {
        push_unique(list, &color, COLOR_CAP);
    }
}

fn push_unique(list: &mut Vec<String>, value: &str, cap: usize) {
    let value = value.trim();
    if value.is_empty() || list.len() >= cap || list.iter().any(|v| v == value) {
        return;
    }
    list.push(value.to_string());
}
