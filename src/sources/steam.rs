//! Steam store sources: the app catalog, per-app details and the review
//! summary. The store enforces a 200-requests-per-5-minutes budget; the
//! details and review batches run against the same basket parameters.

use std::collections::HashMap;

use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{HarvestError, Result};
use crate::transport::classify;
use crate::types::{AppId, RequestOutcome};

pub const DETAILS_LABEL: &str = "steam-details";
pub const REVIEWS_LABEL: &str = "steam-reviews";

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct AppListResponse {
    applist: AppList,
}

#[derive(Debug, Deserialize)]
struct AppList {
    apps: Vec<CatalogEntry>,
}

/// One entry of the full identifier universe. The catalog also carries a
/// display name, but every later stage keys on the appid alone.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CatalogEntry {
    pub appid: AppId,
}

/// Fetches the complete app universe. A single unthrottled call per run;
/// anything but 200 here leaves the run with nothing to do.
pub async fn fetch_catalog(client: &Client, cfg: &Config) -> Result<Vec<CatalogEntry>> {
    let url = format!("{}/ISteamApps/GetAppList/v2/", cfg.steam_api_url);
    let response = client.get(&url).send().await?;
    let status = response.status().as_u16();
    if status != 200 {
        return Err(HarvestError::Catalog(format!("app list returned status {status}")));
    }
    let body: AppListResponse = response.json().await?;
    Ok(body.applist.apps)
}

// ---------------------------------------------------------------------------
// App details
// ---------------------------------------------------------------------------

/// Typed subset of the store's appdetails payload that the pipeline
/// consumes downstream. The long tail of page fields belongs to the
/// external merge step.
#[derive(Debug, Clone, PartialEq)]
pub struct AppDetails {
    pub appid: AppId,
    pub name: String,
    pub kind: String,
    pub coming_soon: bool,
    pub release_date: Option<NaiveDate>,
    pub windows: bool,
    pub mac: bool,
    pub linux: bool,
    pub developer: Option<String>,
    pub publisher: Option<String>,
    pub price_cents: Option<u64>,
    pub genres: Vec<String>,
    pub categories: Vec<String>,
}

impl AppDetails {
    /// Only released games feed the review, player and summary stages.
    pub fn is_released_game(&self) -> bool {
        self.kind == "game" && !self.coming_soon
    }

    pub fn release_year(&self) -> Option<i32> {
        use chrono::Datelike;
        self.release_date.map(|d| d.year())
    }
}

#[derive(Debug, Deserialize)]
struct DetailsEnvelope {
    success: bool,
    data: Option<DetailsData>,
}

#[derive(Debug, Deserialize)]
struct DetailsData {
    #[serde(rename = "type")]
    kind: String,
    name: String,
    steam_appid: AppId,
    #[serde(default)]
    developers: Vec<String>,
    #[serde(default)]
    publishers: Vec<String>,
    price_overview: Option<PriceOverview>,
    #[serde(default)]
    platforms: Platforms,
    #[serde(default)]
    release_date: ReleaseDate,
    #[serde(default)]
    genres: Vec<Descriptor>,
    #[serde(default)]
    categories: Vec<Descriptor>,
}

#[derive(Debug, Deserialize)]
struct PriceOverview {
    #[serde(rename = "final")]
    final_cents: u64,
}

#[derive(Debug, Default, Deserialize)]
struct Platforms {
    #[serde(default)]
    windows: bool,
    #[serde(default)]
    mac: bool,
    #[serde(default)]
    linux: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ReleaseDate {
    #[serde(default)]
    coming_soon: bool,
    #[serde(default)]
    date: String,
}

#[derive(Debug, Deserialize)]
struct Descriptor {
    description: String,
}

pub async fn fetch_details(
    client: &Client,
    cfg: &Config,
    appid: AppId,
) -> Result<RequestOutcome<AppDetails>> {
    let url = format!("{}/api/appdetails?appids={}&cc=us&l=en", cfg.store_api_url, appid);
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|inner| HarvestError::Transport { source_label: DETAILS_LABEL, appid, inner })?;

    if let Some(outcome) = classify(DETAILS_LABEL, appid, response.status().as_u16())?.without_payload() {
        return Ok(outcome);
    }

    let body = response
        .text()
        .await
        .map_err(|inner| HarvestError::Transport { source_label: DETAILS_LABEL, appid, inner })?;
    parse_details(appid, &body)
}

/// The envelope is keyed by the appid; `success: false` marks an app the
/// store has no sellable record of: absent, not an error.
fn parse_details(appid: AppId, body: &str) -> Result<RequestOutcome<AppDetails>> {
    let mut envelope: HashMap<String, DetailsEnvelope> =
        serde_json::from_str(body).map_err(|e| payload(DETAILS_LABEL, appid, e.to_string()))?;

    let entry = envelope
        .remove(&appid.to_string())
        .ok_or_else(|| payload(DETAILS_LABEL, appid, "response missing the requested appid".into()))?;

    let data = match (entry.success, entry.data) {
        (true, Some(data)) => data,
        _ => return Ok(RequestOutcome::Absent),
    };

    Ok(RequestOutcome::Success(AppDetails {
        appid: data.steam_appid,
        name: data.name,
        kind: data.kind,
        coming_soon: data.release_date.coming_soon,
        release_date: parse_release_date(&data.release_date.date),
        windows: data.platforms.windows,
        mac: data.platforms.mac,
        linux: data.platforms.linux,
        developer: data.developers.into_iter().next(),
        publisher: data.publishers.into_iter().next(),
        price_cents: data.price_overview.map(|p| p.final_cents),
        genres: data.genres.into_iter().map(|d| d.description).collect(),
        categories: data.categories.into_iter().map(|d| d.description).collect(),
    }))
}

const RELEASE_DATE_FORMATS: &[&str] = &["%b %d, %Y", "%d %b, %Y", "%B %d, %Y", "%d %B, %Y"];

/// Store release dates come in a couple of locale shapes; an unparseable or
/// empty date (unannounced titles) is simply unknown.
fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    RELEASE_DATE_FORMATS.iter().find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

// ---------------------------------------------------------------------------
// Review summary
// ---------------------------------------------------------------------------

/// Review-count summary for one app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ReviewSummary {
    #[serde(default)]
    pub total_positive: u64,
    #[serde(default)]
    pub total_negative: u64,
    #[serde(default, rename = "total_reviews")]
    pub reviews_total: u64,
}

#[derive(Debug, Deserialize)]
struct ReviewsEnvelope {
    query_summary: ReviewSummary,
}

pub async fn fetch_review_summary(
    client: &Client,
    cfg: &Config,
    appid: AppId,
) -> Result<RequestOutcome<ReviewSummary>> {
    let url = format!(
        "{}/appreviews/{}?json=1&language=all&purchase_type=all&num_per_page=1",
        cfg.store_api_url, appid
    );
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|inner| HarvestError::Transport { source_label: REVIEWS_LABEL, appid, inner })?;

    if let Some(outcome) = classify(REVIEWS_LABEL, appid, response.status().as_u16())?.without_payload() {
        return Ok(outcome);
    }

    let body = response
        .text()
        .await
        .map_err(|inner| HarvestError::Transport { source_label: REVIEWS_LABEL, appid, inner })?;
    let envelope: ReviewsEnvelope =
        serde_json::from_str(&body).map_err(|e| payload(REVIEWS_LABEL, appid, e.to_string()))?;
    Ok(RequestOutcome::Success(envelope.query_summary))
}

fn payload(source_label: &'static str, appid: AppId, detail: String) -> HarvestError {
    HarvestError::Payload { source_label, appid, detail }
}
