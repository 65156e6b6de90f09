//! The reqwest-backed catalog page fetcher.

use vrm_harvest_models::{PageResult, Pagination};

use crate::{PageSource, ScrapeConfig, ScrapeError, extract, normalize};

/// Fetches catalog pages over HTTP and decodes their embedded model.
#[derive(Debug)]
pub struct PageFetcher {
    client: reqwest::Client,
    config: ScrapeConfig,
}

impl PageFetcher {
    /// Builds a fetcher with the configured headers and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] if a configured header is malformed or the
    /// HTTP client cannot be constructed.
    pub fn new(config: ScrapeConfig) -> Result<Self, ScrapeError> {
        let mut header_map = reqwest::header::HeaderMap::new();
        for (key, value) in &config.headers {
            let name = reqwest::header::HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| ScrapeError::Config(format!("invalid header name '{key}': {e}")))?;
            let val = reqwest::header::HeaderValue::from_str(value)
                .map_err(|e| ScrapeError::Config(format!("invalid header value '{value}': {e}")))?;
            header_map.insert(name, val);
        }
        let client = reqwest::Client::builder()
            .default_headers(header_map)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// Returns a reference to the underlying scrape configuration.
    #[must_use]
    pub const fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Builds the full request URL for the given page number.
    fn page_url(&self, page: u32) -> String {
        format!("{}{page}", self.config.base_url)
    }
}

impl PageSource for PageFetcher {
    async fn fetch_page(&self, page: u32) -> Result<PageResult, ScrapeError> {
        let url = self.page_url(page);
        log::debug!("Fetching catalog page {page}: {url}");

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let html = response.text().await?;

        let model = extract::decode_model(&html)?;
        Ok(page_result_from_model(&model, page))
    }
}

/// Builds a [`PageResult`] from a decoded embedded model.
///
/// Listings live under the model's `properties` key; each gets the derived
/// slug/URL fields added. The metadata block (every model key that is not
/// listing or pagination data) is captured from page 1 only.
#[must_use]
pub fn page_result_from_model(model: &serde_json::Value, page: u32) -> PageResult {
    let mut records: Vec<serde_json::Value> = model
        .get("properties")
        .and_then(serde_json::Value::as_array)
        .cloned()
        .unwrap_or_default();

    for record in &mut records {
        normalize::normalize_listing(record);
    }

    let pagination = parse_pagination(model, page);

    let metadata = if page == 1 {
        metadata_from_model(model)
    } else {
        None
    };

    log::debug!(
        "Page {page}: {} records, {} total pages declared",
        records.len(),
        pagination.total_pages,
    );

    PageResult {
        records,
        metadata,
        pagination,
    }
}

/// Reads the model's pagination block leniently. Missing or malformed
/// fields default to zero; `current_page` falls back to the requested page.
fn parse_pagination(model: &serde_json::Value, page: u32) -> Pagination {
    let block = model.get("pagination");
    Pagination {
        current_page: read_u32(block, "currentPage").unwrap_or(page),
        total_pages: read_u32(block, "totalPages").unwrap_or(0),
        item_count: read_u64(block, "itemCount").unwrap_or(0),
        page_size: read_u32(block, "pageSize").unwrap_or(0),
    }
}

/// Reads a numeric field that the source serialises as either a number or a
/// string.
fn read_u64(block: Option<&serde_json::Value>, key: &str) -> Option<u64> {
    let value = block?.get(key)?;
    value
        .as_u64()
        .or_else(|| value.as_str()?.trim().parse().ok())
}

fn read_u32(block: Option<&serde_json::Value>, key: &str) -> Option<u32> {
    read_u64(block, key).and_then(|n| u32::try_from(n).ok())
}

/// Captures the catalog-wide facets: everything in the model that is not
/// the listing array or the pagination block. Returns `None` when nothing
/// remains.
fn metadata_from_model(model: &serde_json::Value) -> Option<serde_json::Value> {
    let mut facets = model.as_object()?.clone();
    facets.remove("properties");
    facets.remove("pagination");

    if facets.is_empty() {
        None
    } else {
        Some(serde_json::Value::Object(facets))
    }
}
