use super::FakePage;
use crate::browser::Script;
use crate::extractors::assets::{AssetSnapshot, css_urls, locate_assets, reduce, srcset_urls};
use crate::results::{AssetRecord, ImageOrigin};
use serde_json::{Value, json};
use url::Url;

#[cfg(test)]
mod assets_tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/shop/").unwrap()
    }

    fn snapshot(value: Value) -> AssetSnapshot {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_images_are_resolved_and_deduplicated() {
        let record = reduce(
            snapshot(json!({
                "images": [
                    { "src": "/a.png", "srcset": "b.png 1x, /a.png 2x", "alt": "Logo", "width": 100.4, "height": 0 },
                    { "src": "", "dataSrc": "lazy.jpg", "alt": null },
                    { "src": "http://[bad" },
                    { "src": "https://cdn.example.net/x.png" },
                ]
            })),
            &base(),
        );

        let urls: Vec<_> = record.images.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/a.png",
                "https://example.com/shop/b.png",
                "https://example.com/shop/lazy.jpg",
                "https://cdn.example.net/x.png",
            ]
        );

        let logo = &record.images[0];
        assert_eq!(logo.origin, ImageOrigin::Img);
        assert_eq!(logo.alt, "Logo");
        assert_eq!(logo.width, Some(100));
        assert_eq!(logo.height, None);

        let srcset = &record.images[1];
        assert_eq!(srcset.origin, ImageOrigin::Srcset);
        assert_eq!(srcset.alt, "Logo");
        assert_eq!(srcset.width, None);

        assert_eq!(record.images[2].alt, "");
    }

    #[test]
    fn test_backgrounds_share_dedup_with_images() {
        let record = reduce(
            snapshot(json!({
                "images": [{ "src": "/a.png" }],
                "backgrounds": [
                    { "tag": "DIV", "backgroundImage": "url(\"/bg.jpg\"), linear-gradient(red, blue), url('/a.png')" },
                    { "tag": "section", "backgroundImage": "url(/bg.jpg)" },
                    { "tag": "header", "backgroundImage": "url( hero.webp )" },
                ]
            })),
            &base(),
        );

        assert_eq!(record.images.len(), 1);
        assert_eq!(record.backgrounds.len(), 2);
        assert_eq!(record.backgrounds[0].url, "https://example.com/bg.jpg");
        assert_eq!(record.backgrounds[0].element, "div");
        assert_eq!(record.backgrounds[1].url, "https://example.com/shop/hero.webp");
        assert_eq!(record.backgrounds[1].element, "header");
    }

    #[test]
    fn test_inline_svgs_keep_document_index() {
        let record = reduce(
            snapshot(json!({
                "svgs": [
                    { "markup": "<svg width=\"24\"></svg>", "width": "24", "height": null },
                    { "markup": "<svg><path d=\"M0 0\"/></svg>" },
                ]
            })),
            &base(),
        );

        assert_eq!(record.svgs.len(), 2);
        assert_eq!(record.svgs[0].index, 0);
        assert_eq!(record.svgs[0].width.as_deref(), Some("24"));
        assert_eq!(record.svgs[1].index, 1);
        assert!(record.svgs[1].content.contains("<path"));
    }

    #[test]
    fn test_srcset_urls() {
        assert_eq!(
            srcset_urls("small.jpg 480w,  large.jpg 800w"),
            vec!["small.jpg", "large.jpg"]
        );
        assert_eq!(srcset_urls("only.png"), vec!["only.png"]);
        assert!(srcset_urls(" , ").is_empty());
    }

    #[test]
    fn test_css_urls() {
        assert_eq!(
            css_urls(r#"url("a.png"), url('b.png'), url(c.png)"#),
            vec!["a.png", "b.png", "c.png"]
        );
        assert!(css_urls("none").is_empty());
        assert!(css_urls("linear-gradient(red, blue)").is_empty());
    }

    #[tokio::test]
    async fn test_locate_assets_through_page() {
        let page = FakePage::new().with_script(
            Script::Assets,
            json!({ "images": [{ "src": "img/cat.gif", "alt": "Cat" }] }),
        );
        let record = locate_assets(&page, &base()).await;
        assert_eq!(record.images[0].url, "https://example.com/shop/img/cat.gif");
    }

    #[tokio::test]
    async fn test_script_failure_yields_empty_record() {
        let record = locate_assets(&FakePage::new(), &base()).await;
        assert_eq!(record, AssetRecord::default());
    }
}
