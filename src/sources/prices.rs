//! Price-history site: a scraped breakdown table of dated price changes.

use reqwest::Client;

use crate::config::Config;
use crate::error::{HarvestError, Result};
use crate::extract;
use crate::transport::classify;
use crate::types::{AppId, PricePoint, RequestOutcome};

pub const PRICES_LABEL: &str = "price-history";

pub async fn fetch_price_history(
    client: &Client,
    cfg: &Config,
    appid: AppId,
) -> Result<RequestOutcome<Vec<PricePoint>>> {
    let url = format!("{}/app/{}", cfg.price_history_url, appid);
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|inner| HarvestError::Transport { source_label: PRICES_LABEL, appid, inner })?;

    if let Some(outcome) = classify(PRICES_LABEL, appid, response.status().as_u16())?.without_payload() {
        return Ok(outcome);
    }

    let body = response
        .text()
        .await
        .map_err(|inner| HarvestError::Transport { source_label: PRICES_LABEL, appid, inner })?;
    parse_price_page(appid, &body)
}

/// A page without the breakdown table means the site never tracked the app:
/// absent, not an error. A table whose cells fail to type is malformed and
/// fails the run. The Gain and Discount columns are merge-side concerns and
/// are not carried.
pub fn parse_price_page(appid: AppId, body: &str) -> Result<RequestOutcome<Vec<PricePoint>>> {
    let Some(table) = extract::breakdown_table(body) else {
        return Ok(RequestOutcome::Absent);
    };

    let date_col = table
        .column("Date")
        .ok_or_else(|| payload(appid, "missing Date column".into()))?;
    let price_col = table
        .column("Price")
        .ok_or_else(|| payload(appid, "missing Price column".into()))?;

    let mut points = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let date_cell = row
            .get(date_col)
            .ok_or_else(|| payload(appid, format!("short row: {row:?}")))?;
        let price_cell = row
            .get(price_col)
            .ok_or_else(|| payload(appid, format!("short row: {row:?}")))?;

        let date = extract::parse_date(date_cell)
            .ok_or_else(|| payload(appid, format!("unparseable date {date_cell:?}")))?;
        let price = extract::parse_price(price_cell)
            .ok_or_else(|| payload(appid, format!("unparseable price {price_cell:?}")))?;
        points.push(PricePoint { date, price });
    }
    Ok(RequestOutcome::Success(points))
}

fn payload(appid: AppId, detail: String) -> HarvestError {
    HarvestError::Payload { source_label: PRICES_LABEL, appid, detail }
}
