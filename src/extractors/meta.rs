use crate::browser::Evaluate;
use crate::results::MetaRecord;
use scraper::{Html, Selector};
use std::sync::LazyLock;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("metadata selectors should be valid")
}

static META: LazyLock<Selector> = LazyLock::new(|| selector("meta"));
static HEAD_TITLE: LazyLock<Selector> = LazyLock::new(|| selector("head title"));
static ANY_TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static CANONICAL: LazyLock<Selector> = LazyLock::new(|| selector(r#"link[rel="canonical"]"#));
static ICON: LazyLock<Selector> = LazyLock::new(|| selector(r#"link[rel="icon"]"#));
static SHORTCUT_ICON: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"link[rel="shortcut icon"]"#));
static HTML_ROOT: LazyLock<Selector> = LazyLock::new(|| selector("html"));

/// Extracts title, description, keywords, social tags and link metadata
///
/// Works on the serialized live DOM, so tags injected by scripts are seen.
pub async fn extract_meta<E: Evaluate>(page: &E, url: &str) -> MetaRecord {
    match page.page_source().await {
        Ok(html) => {
            let record = parse(&html, url);
            ::log::debug!(
                "Meta: title {:?}, {} opengraph, {} twitter tags",
                record.title,
                record.opengraph.len(),
                record.twitter.len()
            );
            record
        }
        Err(e) => {
            ::log::warn!("Metadata extraction failed, returning empty record: {}", e);
            MetaRecord {
                url: url.to_string(),
                ..MetaRecord::default()
            }
        }
    }
}

/// Parses metadata out of an HTML document
pub fn parse(html: &str, url: &str) -> MetaRecord {
    let doc = Html::parse_document(html);
    let mut record = MetaRecord {
        url: url.to_string(),
        ..MetaRecord::default()
    };

    record.title = doc
        .select(&HEAD_TITLE)
        .next()
        .or_else(|| doc.select(&ANY_TITLE).next())
        .map(|title| {
            title
                .text()
                .collect::<Vec<_>>()
                .join(" ")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();

    for element in doc.select(&META) {
        let meta = element.value();
        let Some(name) = meta
            .attr("name")
            .filter(|n| !n.is_empty())
            .or_else(|| meta.attr("property"))
            .filter(|n| !n.is_empty())
        else {
            continue;
        };
        let Some(content) = meta.attr("content").filter(|c| !c.is_empty()) else {
            continue;
        };

        let lowered = name.to_ascii_lowercase();
        match lowered.as_str() {
            "description" => record.description = Some(content.to_string()),
            "keywords" => {
                record.keywords = content
                    .split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(str::to_string)
                    .collect()
            }
            "author" => record.author = Some(content.to_string()),
            "language" | "lang" => record.language = Some(content.to_string()),
            _ => {}
        }

        if lowered.starts_with("og:") {
            record
                .opengraph
                .insert(name["og:".len()..].to_string(), content.to_string());
        } else if lowered.starts_with("twitter:") {
            record
                .twitter
                .insert(name["twitter:".len()..].to_string(), content.to_string());
        }
    }

    record.canonical = first_href(&doc, &CANONICAL);
    record.favicon = first_href(&doc, &ICON).or_else(|| first_href(&doc, &SHORTCUT_ICON));

    if record.language.is_none() {
        record.language = doc
            .select(&HTML_ROOT)
            .next()
            .and_then(|root| root.value().attr("lang"))
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
            .map(str::to_string);
    }

    record
}

fn first_href(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .next()
        .and_then(|link| link.value().attr("href"))
        .map(str::to_string)
}
