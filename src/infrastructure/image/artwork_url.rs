//! App Store artwork URL scaling.
//!
//! Artwork endpoints encode the rendered size in the last path component
//! (`.../100x100bb.png`). Requesting the size matched to the display scale
//! avoids downloading a thumbnail and upscaling it client-side.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

/// Default scale factor when the caller does not specify one.
pub const DEFAULT_SCALE: f64 = 2.0;

fn dimension_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)x(\d+)(.*)$").expect("Invalid regex"))
}

/// Scales the `<width>x<height>` pair in the last path component of an
/// artwork URL.
///
/// Returns the input unchanged when the URL does not parse, the last path
/// component carries no dimension pair, or the scale is not positive.
#[must_use]
pub fn scale_artwork_url(url: &str, scale: f64) -> String {
    if scale <= 0.0 {
        return url.to_string();
    }

    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };

    let mut segments: Vec<String> = match parsed.path_segments() {
        Some(segments) => segments.map(str::to_string).collect(),
        None => return url.to_string(),
    };

    let Some(last) = segments.last_mut() else {
        return url.to_string();
    };

    let Some(caps) = dimension_regex().captures(last) else {
        return url.to_string();
    };

    let (Ok(width), Ok(height)) = (caps[1].parse::<f64>(), caps[2].parse::<f64>()) else {
        return url.to_string();
    };

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let scaled = format!(
        "{}x{}{}",
        (width * scale) as u64,
        (height * scale) as u64,
        &caps[3]
    );
    *last = scaled;

    parsed.set_path(&segments.join("/"));
    parsed.to_string()
}

/// Scales an artwork URL by [`DEFAULT_SCALE`].
#[must_use]
pub fn scale_artwork_url_default(url: &str) -> String {
    scale_artwork_url(url, DEFAULT_SCALE)
}
