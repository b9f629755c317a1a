//! CSV output for the run's durable tables, keyed by appid.

use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::sources::steam::ReviewSummary;
use crate::types::{AppId, MonthlyPrice, PlayerMonth};

/// One row of `summary.csv`: everything the run learned about one game.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    pub appid: AppId,
    pub name: String,
    pub release_date: Option<NaiveDate>,
    pub windows: bool,
    pub mac: bool,
    pub linux: bool,
    pub developer: Option<String>,
    pub publisher: Option<String>,
    pub price_cents: Option<u64>,
    pub reviews_total: Option<u64>,
    pub positive: Option<u64>,
    pub negative: Option<u64>,
    pub playtime_mean: Option<u64>,
    pub playtime_median: Option<u64>,
    pub mean_price: Option<f64>,
    pub peak_launch: Option<u64>,
    pub peak_year_mean: Option<f64>,
    pub owners: Option<u64>,
    pub revenue: Option<u64>,
}

pub fn write_summary(path: &Path, rows: &[SummaryRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!("wrote {} summary rows to {}", rows.len(), path.display());
    Ok(())
}

#[derive(Debug, Serialize)]
struct PriceMonthRow {
    appid: AppId,
    month: NaiveDate,
    average_price: f64,
}

pub fn write_price_months(path: &Path, series: &[(AppId, Vec<MonthlyPrice>)]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    let mut count = 0usize;
    for (appid, months) in series {
        for m in months {
            writer.serialize(PriceMonthRow {
                appid: *appid,
                month: m.month,
                average_price: m.average_price,
            })?;
            count += 1;
        }
    }
    writer.flush()?;
    info!("wrote {count} monthly price rows to {}", path.display());
    Ok(())
}

#[derive(Debug, Serialize)]
struct PlayerMonthRow {
    appid: AppId,
    month: NaiveDate,
    peak: u64,
    min_peak: u64,
    mean_peak: u64,
}

pub fn write_player_months(path: &Path, series: &[(AppId, Vec<PlayerMonth>)]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    let mut count = 0usize;
    for (appid, months) in series {
        for m in months {
            writer.serialize(PlayerMonthRow {
                appid: *appid,
                month: m.month,
                peak: m.peak,
                min_peak: m.min_peak,
                mean_peak: m.mean_peak,
            })?;
            count += 1;
        }
    }
    writer.flush()?;
    info!("wrote {count} monthly player rows to {}", path.display());
    Ok(())
}

#[derive(Debug, Serialize)]
struct ReviewRow {
    appid: AppId,
    total_positive: u64,
    total_negative: u64,
    reviews_total: u64,
}

/// Per-app review counts as the store reports them.
pub fn write_reviews(path: &Path, reviews: &[(AppId, ReviewSummary)]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for (appid, r) in reviews {
        writer.serialize(ReviewRow {
            appid: *appid,
            total_positive: r.total_positive,
            total_negative: r.total_negative,
            reviews_total: r.reviews_total,
        })?;
    }
    writer.flush()?;
    info!("wrote {} review rows to {}", reviews.len(), path.display());
    Ok(())
}

#[derive(Debug, Serialize)]
struct TagRow<'a> {
    appid: AppId,
    tag: &'a str,
    votes: u64,
}

/// Long-form community tag table: one row per (app, tag) pair.
pub fn write_tags(path: &Path, tags: &[(AppId, Vec<(String, u64)>)]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    let mut count = 0usize;
    for (appid, entries) in tags {
        for (tag, votes) in entries {
            writer.serialize(TagRow { appid: *appid, tag, votes: *votes })?;
            count += 1;
        }
    }
    writer.flush()?;
    info!("wrote {count} tag rows to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn summary_rows_serialize_with_blank_absences() {
        let row = SummaryRow {
            appid: 620,
            name: "Portal 2".into(),
            release_date: Some(d(2011, 4, 18)),
            windows: true,
            mac: true,
            linux: true,
            developer: Some("Valve".into()),
            publisher: Some("Valve".into()),
            price_cents: Some(999),
            reviews_total: Some(120),
            positive: Some(110),
            negative: Some(10),
            playtime_mean: Some(300),
            playtime_median: Some(120),
            mean_price: Some(8.32),
            peak_launch: None,
            peak_year_mean: None,
            owners: Some(7_200),
            revenue: Some(28_700),
        };

        let mut writer = csv::Writer::from_writer(vec![]);
        writer.serialize(&row).unwrap();
        let bytes = writer.into_inner().map_err(|e| e.to_string()).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("appid,name,release_date"));
        let data = lines.next().unwrap();
        assert!(data.starts_with("620,Portal 2,2011-04-18"));
        assert!(data.contains(",8.32,,,"), "absent scalars must stay blank: {data}");
    }
}
