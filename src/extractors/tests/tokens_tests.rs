use super::FakePage;
use crate::extractors::tokens::{
    COLOR_CAP, SPACING_CAP, TokenSnapshot, canonicalize_color, extract_tokens, is_zero_length,
    leading_number, reduce, sort_by_magnitude,
};
use crate::results::TokenRecord;
use serde_json::{Value, json};

#[cfg(test)]
mod tokens_tests {
    use super::*;

    fn snapshot(value: Value) -> TokenSnapshot {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_css_variables() {
        let record = reduce(snapshot(json!({
            "variables": [
                ["--brand", "  #0066cc "],
                ["--spacing-lg", "32px"],
                ["color", "red"],
            ]
        })));

        assert_eq!(record.css_variables.len(), 2);
        assert_eq!(record.css_variables["--brand"], "#0066cc");
        assert_eq!(record.css_variables["--spacing-lg"], "32px");
    }

    #[test]
    fn test_colors_by_role() {
        let record = reduce(snapshot(json!({
            "samples": [
                { "tag": "BODY", "backgroundColor": "rgb(255, 255, 255)", "color": "rgb(0, 0, 0)" },
                { "tag": "H1", "color": "rgb(17, 17, 17)", "backgroundColor": "rgba(0, 0, 0, 0)" },
                { "tag": "p", "color": "rgb(17,17,17)" },
                { "tag": "BUTTON", "backgroundColor": "rgb(0, 102, 204)", "color": "#fff" },
                { "tag": "a", "className": "btn btn-ghost", "color": "rgba(0, 0, 0, 0.5)", "borderColor": "rgb(200, 200, 200)" },
                { "tag": "div", "borderColor": "transparent" },
            ]
        })));

        assert_eq!(record.colors.text, vec!["rgb(17, 17, 17)"]);
        assert_eq!(
            record.colors.primary,
            vec!["rgb(0, 102, 204)", "rgb(255, 255, 255)", "rgba(0, 0, 0, 0.5)"]
        );
        assert_eq!(
            record.colors.background,
            vec!["rgb(255, 255, 255)", "rgb(0, 102, 204)"]
        );
        assert_eq!(record.colors.border, vec!["rgb(200, 200, 200)"]);
    }

    #[test]
    fn test_color_lists_are_capped() {
        let samples: Vec<Value> = (0..15)
            .map(|i| json!({ "tag": "div", "backgroundColor": format!("rgb({}, 0, 0)", i) }))
            .collect();
        let record = reduce(snapshot(json!({ "samples": samples })));

        assert_eq!(record.colors.background.len(), COLOR_CAP);
        assert_eq!(record.colors.background[0], "rgb(0, 0, 0)");
        assert_eq!(record.colors.background[9], "rgb(9, 0, 0)");
    }

    #[test]
    fn test_fonts_deduplicated_and_sorted() {
        let record = reduce(snapshot(json!({
            "samples": [
                { "tag": "h1", "fontFamily": "Inter, sans-serif", "fontSize": "32px", "fontWeight": "700" },
                { "tag": "p", "fontFamily": "Inter, sans-serif", "fontSize": "16px", "fontWeight": "400" },
                { "tag": "small", "fontFamily": "Georgia, serif", "fontSize": "14px", "fontWeight": "400" },
                { "tag": "span", "fontSize": "16px" },
            ]
        })));

        assert_eq!(
            record.fonts.families,
            vec!["Inter, sans-serif", "Georgia, serif"]
        );
        assert_eq!(record.fonts.weights, vec!["700", "400"]);
        assert_eq!(record.fonts.sizes, vec!["14px", "16px", "32px"]);
    }

    #[test]
    fn test_spacing_skips_zero_lengths() {
        let record = reduce(snapshot(json!({
            "spacing": [
                { "padding": "0px", "margin": "0px 0px", "gap": "normal" },
                { "padding": "8px 16px", "margin": "0px", "gap": "normal" },
                { "padding": "8px 16px", "margin": "0px auto", "gap": "24px" },
            ]
        })));

        assert_eq!(record.spacing, vec!["normal", "8px 16px", "0px auto", "24px"]);
    }

    #[test]
    fn test_spacing_is_capped() {
        let spacing: Vec<Value> = (1..=20)
            .map(|i| json!({ "padding": format!("{}px", i), "margin": "0px", "gap": "0px" }))
            .collect();
        let record = reduce(snapshot(json!({ "spacing": spacing })));

        assert_eq!(record.spacing.len(), SPACING_CAP);
        assert_eq!(record.spacing.last().map(String::as_str), Some("15px"));
    }

    #[test]
    fn test_canonicalize_color() {
        assert_eq!(canonicalize_color("#fff").as_deref(), Some("rgb(255, 255, 255)"));
        assert_eq!(canonicalize_color("red").as_deref(), Some("rgb(255, 0, 0)"));
        assert_eq!(
            canonicalize_color(" rgb(10,20,30) ").as_deref(),
            Some("rgb(10, 20, 30)")
        );
        assert_eq!(
            canonicalize_color("rgba(0, 0, 0, 0.5)").as_deref(),
            Some("rgba(0, 0, 0, 0.5)")
        );
        assert_eq!(canonicalize_color("transparent"), None);
        assert_eq!(canonicalize_color("rgba(12, 34, 56, 0)"), None);
        assert_eq!(canonicalize_color("not-a-color"), None);
        assert_eq!(canonicalize_color(""), None);
    }

    #[test]
    fn test_numeric_helpers() {
        assert_eq!(leading_number("16px"), Some(16.0));
        assert_eq!(leading_number("-0.5rem"), Some(-0.5));
        assert_eq!(leading_number(".75em"), Some(0.75));
        assert_eq!(leading_number("auto"), None);

        let mut sizes = vec![
            "2em".to_string(),
            "auto".to_string(),
            "10px".to_string(),
            "1.5rem".to_string(),
        ];
        sort_by_magnitude(&mut sizes);
        assert_eq!(sizes, vec!["1.5rem", "2em", "10px", "auto"]);

        assert!(is_zero_length("0px"));
        assert!(is_zero_length("0 0px 0em"));
        assert!(is_zero_length(""));
        assert!(!is_zero_length("normal"));
        assert!(!is_zero_length("0px 4px"));
    }

    #[tokio::test]
    async fn test_script_failure_yields_empty_record() {
        assert_eq!(extract_tokens(&FakePage::new()).await, TokenRecord::default());
    }
}
