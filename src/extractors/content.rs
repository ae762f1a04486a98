use super::StyleProbe;
use crate::browser::{Evaluate, Script, evaluate_as};
use crate::results::{ContentRecord, Heading, ListBlock, ListKind, NavLink, SectionInfo};
use serde::Deserialize;

/// Paragraphs at or below this many characters are treated as fragments
pub const MIN_PARAGRAPH_CHARS: usize = 10;

/// Raw output of the content script
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContentSnapshot {
    headings: Vec<RawHeading>,
    paragraphs: Vec<RawText>,
    lists: Vec<RawList>,
    navigation: Vec<RawNavLink>,
    sections: Vec<RawSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawText {
    text: String,
    style: StyleProbe,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawHeading {
    tag: String,
    text: String,
    style: StyleProbe,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawList {
    tag: String,
    style: StyleProbe,
    items: Vec<RawText>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawNavLink {
    text: String,
    href: Option<String>,
    style: StyleProbe,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawSection {
    tag: String,
    id: Option<String>,
    class_name: Option<String>,
    style: StyleProbe,
    headings: Vec<RawText>,
}

/// Extracts visible headings, paragraphs, lists, navigation and landmarks
pub async fn extract_content<E: Evaluate>(page: &E) -> ContentRecord {
    match evaluate_as::<ContentSnapshot, _>(page, Script::Content, vec![]).await {
        Ok(snapshot) => {
            let record = reduce(snapshot);
            ::log::debug!(
                "Content: {} headings, {} paragraphs, {} lists, {} nav links, {} sections",
                record.headings.len(),
                record.paragraphs.len(),
                record.lists.len(),
                record.navigation.len(),
                record.structure.len()
            );
            record
        }
        Err(e) => {
            ::log::warn!("Content extraction failed, returning empty record: {}", e);
            ContentRecord::default()
        }
    }
}

/// Turns a raw snapshot into a [`ContentRecord`], keeping visible entries only
pub fn reduce(snapshot: ContentSnapshot) -> ContentRecord {
    let mut headings: Vec<Heading> = snapshot
        .headings
        .into_iter()
        .filter(|h| h.style.is_visible())
        .filter_map(|h| {
            let level = heading_level(&h.tag)?;
            let text = clean_text(&h.text)?;
            Some(Heading {
                level,
                text,
                tag: format!("h{}", level),
            })
        })
        .collect();
    // Grouped by level, document order within a level
    headings.sort_by_key(|h| h.level);

    let paragraphs = snapshot
        .paragraphs
        .into_iter()
        .filter(|p| p.style.is_visible())
        .filter_map(|p| clean_text(&p.text))
        .filter(|text| text.chars().count() > MIN_PARAGRAPH_CHARS)
        .collect();

    let lists = snapshot
        .lists
        .into_iter()
        .filter(|list| list.style.is_visible())
        .filter_map(|list| {
            let kind = match list.tag.to_ascii_lowercase().as_str() {
                "ul" => ListKind::Ul,
                "ol" => ListKind::Ol,
                _ => return None,
            };
            let items: Vec<String> = visible_texts(list.items);
            (!items.is_empty()).then_some(ListBlock { kind, items })
        })
        .collect();

    let navigation = snapshot
        .navigation
        .into_iter()
        .filter(|link| link.style.is_visible())
        .filter_map(|link| {
            Some(NavLink {
                text: clean_text(&link.text)?,
                href: link.href,
            })
        })
        .collect();

    let structure = snapshot
        .sections
        .into_iter()
        .filter(|section| section.style.is_visible())
        .filter_map(|section| {
            let tag = section.tag.to_ascii_lowercase();
            let headings = visible_texts(section.headings);
            let landmark = tag == "header" || tag == "footer";
            if headings.is_empty() && !landmark {
                return None;
            }
            Some(SectionInfo {
                tag,
                id: section.id.and_then(|id| clean_text(&id)),
                class: section.class_name.and_then(|class| clean_text(&class)),
                headings,
            })
        })
        .collect();

    ContentRecord {
        headings,
        paragraphs,
        lists,
        navigation,
        structure,
    }
}

/// Level of an `h1`..`h6` tag, `None` for anything else
pub fn heading_level(tag: &str) -> Option<u8> {
    let tag = tag.to_ascii_lowercase();
    let level: u8 = tag.strip_prefix('h')?.parse().ok()?;
    (1..=6).contains(&level).then_some(level)
}

fn clean_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn visible_texts(items: Vec<RawText>) -> Vec<String> {
    items
        .into_iter()
        .filter(|item| item.style.is_visible())
        .filter_map(|item| clean_text(&item.text))
        .collect()
}
