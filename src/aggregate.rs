//! Period-weighted aggregation of reconciled series into per-app summary
//! scalars, plus the reviews-based owners and revenue estimates.

use chrono::NaiveDate;

use crate::types::{MonthlyPrice, PlayerMonth, PlayerSummary, SeriesRow};

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Per-month average price, each row weighted by the days its value was in
/// force. Zero-period rows carry no days and are excluded so the weight sum
/// can never be zero. Input rows must be in date order (as `reconcile`
/// produces them).
pub fn monthly_average_prices(series: &[SeriesRow]) -> Vec<MonthlyPrice> {
    let mut result: Vec<MonthlyPrice> = Vec::new();
    // (month, Σ price·days, Σ days)
    let mut acc: Option<(NaiveDate, f64, f64)> = None;

    for row in series {
        if row.period == 0 {
            continue;
        }
        let weight = row.period as f64;
        match acc {
            Some((month, vw, w)) if month == row.month => {
                acc = Some((month, vw + row.price * weight, w + weight));
            }
            Some((month, vw, w)) => {
                result.push(MonthlyPrice { month, average_price: round2(vw / w) });
                acc = Some((row.month, row.price * weight, weight));
            }
            None => acc = Some((row.month, row.price * weight, weight)),
        }
    }
    if let Some((month, vw, w)) = acc {
        result.push(MonthlyPrice { month, average_price: round2(vw / w) });
    }
    result
}

/// Run-level price summary: unweighted mean of the monthly averages.
/// `None` when the app produced no months at all.
pub fn mean_price(months: &[MonthlyPrice]) -> Option<f64> {
    if months.is_empty() {
        return None;
    }
    let sum: f64 = months.iter().map(|m| m.average_price).sum();
    Some(round2(sum / months.len() as f64))
}

/// Launch peak (the first recorded month) and the mean of `mean_peak`
/// across months 2–12, the first post-launch year. Histories shorter than
/// a year use whatever months exist; a history without a second month has
/// no year mean, and an empty history has no summary at all.
pub fn player_summary(months: &[PlayerMonth]) -> PlayerSummary {
    let peak_launch = months.first().map(|m| m.peak);

    let year = months
        .get(1..)
        .map(|rest| &rest[..rest.len().min(11)])
        .filter(|rows| !rows.is_empty());
    let peak_year_mean = year.map(|rows| {
        let sum: f64 = rows.iter().map(|m| m.mean_peak as f64).sum();
        round2(sum / rows.len() as f64)
    });

    PlayerSummary { peak_launch, peak_year_mean }
}

// ---------------------------------------------------------------------------
// Owners and revenue estimates
// ---------------------------------------------------------------------------

/// Reviews-to-owners multiplier, banded by release year. Older titles sold
/// far more copies per review left.
pub fn estimate_owners(reviews_total: u64, release_year: i32) -> u64 {
    let multiplier = if release_year < 2014 {
        60
    } else if release_year < 2017 {
        50
    } else if release_year < 2018 {
        40
    } else if release_year < 2020 {
        35
    } else {
        30
    };
    reviews_total * multiplier
}

/// Gross revenue estimate: owners × mean price, discounted for the platform
/// cut, regional pricing, VAT and returns.
pub fn estimate_revenue(owners: u64, mean_price: f64) -> u64 {
    const PLATFORM_CUT: f64 = 0.7;
    const REGIONAL_PRICE: f64 = 0.8;
    const VAT: f64 = 0.93;
    const RETURNS: f64 = 0.92;
    (owners as f64 * mean_price * PLATFORM_CUT * REGIONAL_PRICE * VAT * RETURNS).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn row(m: u32, day: u32, price: f64, period: i64) -> SeriesRow {
        SeriesRow { month: d(2023, m, 1), date: d(2023, m, day), price, period }
    }

    fn player(m: u32, peak: u64, mean_peak: u64) -> PlayerMonth {
        PlayerMonth { month: d(2023, m, 1), peak, min_peak: 0, mean_peak }
    }

    #[test]
    fn months_average_by_days_in_force() {
        let series = [row(5, 5, 10.0, 15), row(5, 20, 8.0, 12)];
        let months = monthly_average_prices(&series);

        assert_eq!(months.len(), 1);
        // (10·15 + 8·12) / 27 = 9.11
        assert_eq!(months[0].average_price, 9.11);
    }

    #[test]
    fn zero_period_rows_carry_no_weight() {
        let series = [row(5, 1, 10.0, 30), row(5, 31, 99.0, 0)];
        let months = monthly_average_prices(&series);

        assert_eq!(months.len(), 1);
        assert_eq!(months[0].average_price, 10.0);
    }

    #[test]
    fn a_month_of_only_zero_periods_is_dropped() {
        let series = [row(4, 1, 10.0, 30), row(5, 1, 99.0, 0)];
        let months = monthly_average_prices(&series);

        assert_eq!(months.len(), 1);
        assert_eq!(months[0].month, d(2023, 4, 1));
    }

    #[test]
    fn mean_price_averages_months_unweighted() {
        let months = [
            MonthlyPrice { month: d(2023, 1, 1), average_price: 9.99 },
            MonthlyPrice { month: d(2023, 2, 1), average_price: 9.99 },
            MonthlyPrice { month: d(2023, 3, 1), average_price: 4.99 },
        ];
        assert_eq!(mean_price(&months), Some(8.32));
        assert_eq!(mean_price(&[]), None);
    }

    #[test]
    fn empty_series_aggregates_to_no_summary() {
        assert!(monthly_average_prices(&[]).is_empty());
        assert_eq!(player_summary(&[]), PlayerSummary::default());
    }

    #[test]
    fn launch_peak_comes_from_the_first_month_only() {
        let months: Vec<PlayerMonth> =
            (1..=13).map(|m| player(m.min(12), 1000 - m as u64, 100)).collect();
        let summary = player_summary(&months);
        assert_eq!(summary.peak_launch, Some(999));
    }

    #[test]
    fn year_mean_spans_months_two_through_twelve() {
        // mean_peak 100, 90, 80, ... month 13 (40) must not contribute.
        let months: Vec<PlayerMonth> =
            (0..13).map(|i| player((i % 12) + 1, 500, 100 - i as u64 * 5)).collect();
        let summary = player_summary(&months);

        // months 2..=12 carry 95, 90, ..., 45 → mean 70
        assert_eq!(summary.peak_year_mean, Some(70.0));
    }

    #[test]
    fn short_histories_use_the_months_that_exist() {
        let months = [player(1, 300, 120), player(2, 200, 80), player(3, 150, 40)];
        let summary = player_summary(&months);

        assert_eq!(summary.peak_launch, Some(300));
        assert_eq!(summary.peak_year_mean, Some(60.0));
    }

    #[test]
    fn single_month_history_has_no_year_mean() {
        let summary = player_summary(&[player(1, 300, 120)]);
        assert_eq!(summary.peak_launch, Some(300));
        assert_eq!(summary.peak_year_mean, None);
    }

    #[test]
    fn owner_bands_follow_release_year() {
        assert_eq!(estimate_owners(100, 2010), 6_000);
        assert_eq!(estimate_owners(100, 2015), 5_000);
        assert_eq!(estimate_owners(100, 2017), 4_000);
        assert_eq!(estimate_owners(100, 2018), 3_500);
        assert_eq!(estimate_owners(100, 2023), 3_000);
    }

    #[test]
    fn revenue_applies_all_discount_factors() {
        // 1000 × 10 × 0.7 × 0.8 × 0.93 × 0.92 = 4790.976 → 4791
        assert_eq!(estimate_revenue(1000, 10.0), 4_791);
    }
}
