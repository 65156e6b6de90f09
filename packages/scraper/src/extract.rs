//! Extraction of the embedded listing model from catalog HTML.
//!
//! The catalog serialises its data as `let model = { … };` inside an inline
//! script tag. The serialised object is not strict JSON — the site's
//! templating leaves trailing commas before closing braces and brackets —
//! so the captured text is cleaned before decoding.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::ScrapeError;

/// Matches the inline-script assignment holding the listing model. The
/// capture is non-greedy to the first `};` so trailing script code is never
/// swallowed.
static MODEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"let model\s*=\s*(\{[\s\S]*?\});").expect("valid regex"));

/// Matches a comma immediately preceding a closing brace or bracket.
static TRAILING_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("valid regex"));

/// Locates the embedded model assignment in `html` and returns the raw
/// (uncleaned) object text.
#[must_use]
pub fn find_model(html: &str) -> Option<&str> {
    MODEL_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Strips trailing commas before closing braces/brackets so the text can be
/// decoded as strict JSON.
#[must_use]
pub fn strip_trailing_commas(text: &str) -> Cow<'_, str> {
    TRAILING_COMMA_RE.replace_all(text, "$1")
}

/// Extracts and decodes the embedded listing model from catalog HTML.
///
/// # Errors
///
/// Returns [`ScrapeError::ModelMissing`] when the assignment pattern is
/// absent and [`ScrapeError::Json`] when the cleaned text still fails to
/// decode.
pub fn decode_model(html: &str) -> Result<serde_json::Value, ScrapeError> {
    let raw = find_model(html).ok_or(ScrapeError::ModelMissing)?;
    let cleaned = strip_trailing_commas(raw);
    Ok(serde_json::from_str(&cleaned)?)
}
