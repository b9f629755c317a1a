use chrono::NaiveDate;
use serde::Serialize;

/// Steam application id, the correlation key across every source.
pub type AppId = u32;

// ---------------------------------------------------------------------------
// Request outcomes
// ---------------------------------------------------------------------------

/// Result of one remote call for one app, after status classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome<T> {
    /// 200 with a usable payload.
    Success(T),
    /// The source has no record of the app (404, or an in-body absence flag).
    Absent,
    /// Transient failure (503): the app is abandoned, the batch continues.
    Skip,
    /// Quota exhausted (429): the batch stops; remaining apps are not attempted.
    Halted,
}

// ---------------------------------------------------------------------------
// Observations
// ---------------------------------------------------------------------------

/// One dated price observation scraped from the price-history table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// One month of concurrent-player statistics, as the player site reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlayerMonth {
    pub month: NaiveDate,
    pub peak: u64,
    pub min_peak: u64,
    pub mean_peak: u64,
}

// ---------------------------------------------------------------------------
// Reconciled series
// ---------------------------------------------------------------------------

/// One row of a reconciled price series: the value in force starting at
/// `date`, attributed to calendar month `month`, weighted by the `period`
/// days it remained the latest known price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesRow {
    pub month: NaiveDate,
    pub date: NaiveDate,
    pub price: f64,
    pub period: i64,
}

/// Month-level period-weighted average price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyPrice {
    pub month: NaiveDate,
    pub average_price: f64,
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// Launch-window player scalars for one app. `None` marks an app with no
/// usable player history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PlayerSummary {
    /// Peak concurrent players in the first recorded month.
    pub peak_launch: Option<u64>,
    /// Mean of the monthly `mean_peak` over months 2–12, rounded to 2 places.
    pub peak_year_mean: Option<f64>,
}
