//! Read-only extraction passes over a settled page.
//!
//! Every pass runs one fixed script (or reads the serialized DOM) and reduces
//! the raw snapshot into a typed record. Passes never fail: a script error
//! is logged and the pass yields an empty record.

pub mod assets;
pub mod content;
pub mod meta;
pub mod tokens;

#[cfg(test)]
pub(crate) mod tests;

use serde::Deserialize;

pub use assets::locate_assets;
pub use content::extract_content;
pub use meta::extract_meta;
pub use tokens::extract_tokens;

/// Computed-style facts used to decide whether an element is visible
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleProbe {
    pub display: String,
    pub visibility: String,
    pub opacity: String,
    /// The element has an offset parent, i.e. it takes part in layout
    pub in_layout: bool,
}

impl StyleProbe {
    /// Displayed, not hidden, not fully transparent, and laid out
    pub fn is_visible(&self) -> bool {
        let transparent = self
            .opacity
            .trim()
            .parse::<f64>()
            .map(|opacity| opacity == 0.0)
            .unwrap_or(false);

        self.display != "none" && self.visibility != "hidden" && !transparent && self.in_layout
    }
}
