//! HTTP handler functions for the harvester API.

use actix_web::{HttpRequest, HttpResponse, web};
use vrm_harvest_store::StoreError;

use crate::AppState;

/// Header carrying the inbound API key.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Columns of the CSV export: the source fields the original export
/// shipped, plus the derived fields.
pub const EXPORT_FIELDS: &[&str] = &[
    "assetId",
    "assetReferenceId",
    "addressLine1",
    "city",
    "state",
    "zip",
    "county",
    "displayPrice",
    "squareFootage",
    "bedrooms",
    "bathrooms",
    "lotSize",
    "lotSizeSource",
    "propertyType",
    "assetListingStatus",
    "isVendeeFinancing",
    "listingStartDate",
    "isNewListing",
    "mediaGuid",
    "mediaId",
    "slug",
    "detailUrl",
    "imageUrl",
];

/// Checks the inbound credential. When no key is configured every caller
/// is accepted; otherwise the request must carry the exact key.
fn authorized(state: &AppState, req: &HttpRequest) -> bool {
    let Some(expected) = state.api_key.as_deref() else {
        return true;
    };
    req.headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|provided| provided == expected)
}

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(serde_json::json!({
        "error": "missing or invalid API key"
    }))
}

/// `GET /`
///
/// Service banner listing the available endpoints.
pub async fn banner() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "VRM listing harvester is live",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/api/run",
            "/api/progress",
            "/api/kill",
            "/api/latest",
            "/api/images",
            "/export.csv",
        ],
    }))
}

/// `POST /api/run`
///
/// Starts a run. Idempotent: when a run is already in flight the current
/// progress comes back unchanged and no second run is spawned.
pub async fn start_run(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if !authorized(&state, &req) {
        return unauthorized();
    }
    HttpResponse::Ok().json(state.controller.start())
}

/// `GET /api/progress`
pub async fn progress(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if !authorized(&state, &req) {
        return unauthorized();
    }
    HttpResponse::Ok().json(state.controller.progress())
}

/// `POST /api/kill`
///
/// Sets the kill switch. The in-flight run stops at its next page
/// boundary; the response reflects the immediately-updated progress.
pub async fn kill(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if !authorized(&state, &req) {
        return unauthorized();
    }
    HttpResponse::Ok().json(state.controller.kill())
}

/// `GET /api/latest`
///
/// Returns the most recently persisted run, or 404 when no run has ever
/// completed.
pub async fn latest(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if !authorized(&state, &req) {
        return unauthorized();
    }
    match state.store.load_latest() {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(StoreError::NotFound { .. }) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "no run has been persisted yet"
        })),
        Err(e) => {
            log::error!("Failed to load latest snapshot: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "failed to load latest snapshot"
            }))
        }
    }
}

/// `GET /api/images`
///
/// Image URLs derived from the latest snapshot.
pub async fn images(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if !authorized(&state, &req) {
        return unauthorized();
    }
    match state.store.load_latest() {
        Ok(result) => HttpResponse::Ok().json(result.image_urls()),
        Err(StoreError::NotFound { .. }) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "no run has been persisted yet"
        })),
        Err(e) => {
            log::error!("Failed to load latest snapshot: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "failed to load latest snapshot"
            }))
        }
    }
}

/// `GET /export.csv`
///
/// The latest snapshot as a downloadable CSV with a fixed column set.
pub async fn export_csv(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if !authorized(&state, &req) {
        return unauthorized();
    }
    let result = match state.store.load_latest() {
        Ok(result) => result,
        Err(StoreError::NotFound { .. }) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "error": "no run has been persisted yet"
            }));
        }
        Err(e) => {
            log::error!("Failed to load latest snapshot: {e}");
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "failed to load latest snapshot"
            }));
        }
    };

    match listings_to_csv(&result.properties) {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/csv")
            .insert_header((
                "Content-Disposition",
                "attachment; filename=vrm_listings.csv",
            ))
            .body(body),
        Err(e) => {
            log::error!("CSV export failed: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "CSV export failed"
            }))
        }
    }
}

/// Renders listings as CSV with the [`EXPORT_FIELDS`] columns.
fn listings_to_csv(listings: &[serde_json::Value]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_FIELDS)?;

    for listing in listings {
        let row: Vec<String> = EXPORT_FIELDS
            .iter()
            .map(|field| csv_field(listing.get(*field)))
            .collect();
        writer.write_record(&row)?;
    }

    writer.into_inner().map_err(|e| e.into_error().into())
}

/// Renders one JSON value as a CSV cell. Nulls and missing fields become
/// empty cells; strings are written bare, everything else as its JSON
/// text.
fn csv_field(value: Option<&serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
