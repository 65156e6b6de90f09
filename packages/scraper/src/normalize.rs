//! Per-listing normalisation: derived slug, detail URL, and image URL.
//!
//! Source fields are never dropped or rewritten; normalisation only *adds*
//! the derived fields the rest of the system keys on.

use std::sync::LazyLock;

use regex::Regex;

/// Base URL for a listing's canonical detail page; the slug is appended.
pub const DETAIL_URL_BASE: &str = "https://www.vrmproperties.com/property/";

/// Base URL for listing photos; the media identifier is appended.
pub const MEDIA_URL_BASE: &str = "https://media.vrmproperties.com/photo/";

/// Fixed suffix appended after the media identifier.
pub const MEDIA_URL_SUFFIX: &str = "-lg.jpg";

/// Runs of anything that is not a lowercase letter or digit, collapsed to a
/// single hyphen during slug derivation.
static NON_ALNUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

/// Reads a field as a non-empty string, accepting numeric values (zip codes
/// arrive as either).
fn field_str(record: &serde_json::Value, key: &str) -> Option<String> {
    match record.get(key)? {
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Derives the URL slug from the listing's address components.
///
/// Returns `None` unless all four of `addressLine1`, `city`, `state`, and
/// `zip` are non-empty. The slug is the lower-cased concatenation with runs
/// of non-alphanumerics collapsed to single hyphens, no leading or trailing
/// hyphen.
#[must_use]
pub fn derive_slug(record: &serde_json::Value) -> Option<String> {
    let line = field_str(record, "addressLine1")?;
    let city = field_str(record, "city")?;
    let state = field_str(record, "state")?;
    let zip = field_str(record, "zip")?;

    let joined = format!("{line} {city} {state} {zip}").to_lowercase();
    let slug = NON_ALNUM_RE
        .replace_all(&joined, "-")
        .trim_matches('-')
        .to_owned();

    if slug.is_empty() { None } else { Some(slug) }
}

/// Derives the photo URL from the listing's media identifier.
///
/// Prefers the `mediaGuid` string; falls back to a numeric `mediaId`.
/// Returns `None` when the listing carries no media reference.
#[must_use]
pub fn derive_media_url(record: &serde_json::Value) -> Option<String> {
    let media_id = field_str(record, "mediaGuid").or_else(|| field_str(record, "mediaId"))?;
    Some(format!("{MEDIA_URL_BASE}{media_id}{MEDIA_URL_SUFFIX}"))
}

/// Returns the listing's stable identifier (`assetId`) as a string, or
/// `None` when the source record lacks one.
#[must_use]
pub fn listing_id(record: &serde_json::Value) -> Option<String> {
    field_str(record, "assetId")
}

/// Adds the derived `slug`, `detailUrl`, and `imageUrl` fields to a listing
/// in place. The derived fields are explicit nulls (not absent) when
/// underivable, so consumers see a uniform shape.
pub fn normalize_listing(record: &mut serde_json::Value) {
    let slug = derive_slug(record);
    let detail_url = slug
        .as_deref()
        .map(|slug| format!("{DETAIL_URL_BASE}{slug}"));
    let image_url = derive_media_url(record);

    if let Some(obj) = record.as_object_mut() {
        obj.insert("slug".to_owned(), slug.map_or(serde_json::Value::Null, Into::into));
        obj.insert(
            "detailUrl".to_owned(),
            detail_url.map_or(serde_json::Value::Null, Into::into),
        );
        obj.insert(
            "imageUrl".to_owned(),
            image_url.map_or(serde_json::Value::Null, Into::into),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn derives_slug_from_address_components() {
        let record = json!({
            "addressLine1": "1208 N. Jackson St.",
            "city": "Little Rock",
            "state": "AR",
            "zip": "72207",
        });
        assert_eq!(
            derive_slug(&record).as_deref(),
            Some("1208-n-jackson-st-little-rock-ar-72207")
        );
    }

    #[test]
    fn slug_accepts_numeric_zip() {
        let record = json!({
            "addressLine1": "5 Main St",
            "city": "Mobile",
            "state": "AL",
            "zip": 36602,
        });
        assert_eq!(
            derive_slug(&record).as_deref(),
            Some("5-main-st-mobile-al-36602")
        );
    }

    #[test]
    fn null_address_component_yields_no_slug_or_detail_url() {
        for missing in ["addressLine1", "city", "state", "zip"] {
            let mut record = json!({
                "addressLine1": "5 Main St",
                "city": "Mobile",
                "state": "AL",
                "zip": "36602",
            });
            record[missing] = serde_json::Value::Null;

            normalize_listing(&mut record);
            assert!(record["slug"].is_null(), "slug with {missing} null");
            assert!(record["detailUrl"].is_null(), "detailUrl with {missing} null");
        }
    }

    #[test]
    fn empty_string_component_counts_as_missing() {
        let record = json!({
            "addressLine1": "5 Main St",
            "city": "  ",
            "state": "AL",
            "zip": "36602",
        });
        assert!(derive_slug(&record).is_none());
    }

    #[test]
    fn media_url_is_base_plus_identifier_plus_suffix() {
        let record = json!({"mediaGuid": "ab12cd34"});
        assert_eq!(
            derive_media_url(&record).as_deref(),
            Some("https://media.vrmproperties.com/photo/ab12cd34-lg.jpg")
        );
    }

    #[test]
    fn media_url_falls_back_to_numeric_media_id() {
        let record = json!({"mediaGuid": null, "mediaId": 99123});
        assert_eq!(
            derive_media_url(&record).as_deref(),
            Some("https://media.vrmproperties.com/photo/99123-lg.jpg")
        );
    }

    #[test]
    fn no_media_reference_yields_null_image_url() {
        let mut record = json!({"assetId": 1});
        normalize_listing(&mut record);
        assert!(record["imageUrl"].is_null());
    }

    #[test]
    fn listing_id_accepts_string_or_number() {
        assert_eq!(listing_id(&json!({"assetId": 4417})).as_deref(), Some("4417"));
        assert_eq!(
            listing_id(&json!({"assetId": "A-4417"})).as_deref(),
            Some("A-4417")
        );
        assert!(listing_id(&json!({"assetId": null})).is_none());
        assert!(listing_id(&json!({})).is_none());
    }

    #[test]
    fn normalize_preserves_source_fields_verbatim() {
        let mut record = json!({
            "assetId": 7,
            "addressLine1": "5 Main St",
            "city": "Mobile",
            "state": "AL",
            "zip": "36602",
            "county": null,
            "displayPrice": 129900,
        });
        normalize_listing(&mut record);

        assert_eq!(record["assetId"], 7);
        assert!(record["county"].is_null());
        assert_eq!(record["displayPrice"], 129900);
        assert_eq!(record["slug"], "5-main-st-mobile-al-36602");
        assert_eq!(
            record["detailUrl"],
            "https://www.vrmproperties.com/property/5-main-st-mobile-al-36602"
        );
    }
}
