use url::Url;

/// Extensions of raster formats that can be normalized to WebP
pub const RASTER_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

/// Extension used when the URL path carries none
pub const FALLBACK_EXTENSION: &str = "jpg";

/// Whether the URL is an inline `data:` URI
pub fn is_data_url(url: &str) -> bool {
    url.trim_start()
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Lowercased file extension of the last URL path segment
///
/// Query strings and fragments are ignored. Returns the fallback extension
/// when the path has none or the URL does not parse.
pub fn url_extension(url: &str) -> String {
    let extension = Url::parse(url).ok().and_then(|parsed| {
        let segment = parsed.path_segments()?.next_back()?.to_string();
        let (stem, ext) = segment.rsplit_once('.')?;
        let valid = !stem.is_empty()
            && !ext.is_empty()
            && ext.len() <= 5
            && ext.chars().all(|c| c.is_ascii_alphanumeric());
        valid.then(|| ext.to_ascii_lowercase())
    });

    extension.unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}

/// Whether files with this extension go through WebP conversion
pub fn is_raster_extension(extension: &str) -> bool {
    RASTER_EXTENSIONS.contains(&extension)
}
