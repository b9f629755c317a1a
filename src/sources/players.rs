//! Player-history site: a scraped breakdown table of monthly concurrent
//! player statistics.

use chrono::NaiveDate;
use reqwest::Client;

use crate::calendar;
use crate::config::Config;
use crate::error::{HarvestError, Result};
use crate::extract;
use crate::transport::classify;
use crate::types::{AppId, PlayerMonth, RequestOutcome};

pub const PLAYERS_LABEL: &str = "player-history";

pub async fn fetch_player_history(
    client: &Client,
    cfg: &Config,
    appid: AppId,
) -> Result<RequestOutcome<Vec<PlayerMonth>>> {
    let url = format!("{}/app/{}", cfg.player_history_url, appid);
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|inner| HarvestError::Transport { source_label: PLAYERS_LABEL, appid, inner })?;

    if let Some(outcome) = classify(PLAYERS_LABEL, appid, response.status().as_u16())?.without_payload() {
        return Ok(outcome);
    }

    let body = response
        .text()
        .await
        .map_err(|inner| HarvestError::Transport { source_label: PLAYERS_LABEL, appid, inner })?;
    parse_player_page(appid, &body)
}

pub fn parse_player_page(appid: AppId, body: &str) -> Result<RequestOutcome<Vec<PlayerMonth>>> {
    let Some(table) = extract::breakdown_table(body) else {
        return Ok(RequestOutcome::Absent);
    };

    let month_col = column(&table, appid, "Month")?;
    let peak_col = column(&table, appid, "Peak")?;
    let min_col = column(&table, appid, "Min Daily Peak")?;
    let mean_col = column(&table, appid, "Avg Daily Peak")?;

    let mut months = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        months.push(PlayerMonth {
            month: cell(row, month_col, appid, extract::parse_month)?,
            peak: cell(row, peak_col, appid, extract::parse_count)?,
            min_peak: cell(row, min_col, appid, extract::parse_count)?,
            mean_peak: cell(row, mean_col, appid, extract::parse_count)?,
        });
    }
    Ok(RequestOutcome::Success(months))
}

/// Months before the app's release month are dropped and the rest ordered
/// ascending, so the first row is the launch month.
pub fn release_window(mut months: Vec<PlayerMonth>, release_date: Option<NaiveDate>) -> Vec<PlayerMonth> {
    if let Some(release) = release_date {
        let release_month = calendar::month_start(release);
        months.retain(|m| m.month >= release_month);
    }
    months.sort_by_key(|m| m.month);
    months
}

fn column(table: &extract::RawTable, appid: AppId, name: &str) -> Result<usize> {
    table
        .column(name)
        .ok_or_else(|| payload(appid, format!("missing {name} column")))
}

fn cell<T>(
    row: &[String],
    index: usize,
    appid: AppId,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T> {
    let raw = row
        .get(index)
        .ok_or_else(|| payload(appid, format!("short row: {row:?}")))?;
    parse(raw).ok_or_else(|| payload(appid, format!("unparseable cell {raw:?}")))
}

fn payload(appid: AppId, detail: String) -> HarvestError {
    HarvestError::Payload { source_label: PLAYERS_LABEL, appid, detail }
}
