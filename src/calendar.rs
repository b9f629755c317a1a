//! Reconstruction of sparse dated observations into a complete monthly
//! series with carry-forward values and day-count weights.

use chrono::{Datelike, NaiveDate};

use crate::types::{PricePoint, SeriesRow};

/// First day of the month containing `d`.
pub fn month_start(d: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(d.year(), d.month(), 1).expect("first of month")
}

fn next_month(d: NaiveDate) -> NaiveDate {
    if d.month() == 12 {
        NaiveDate::from_ymd_opt(d.year() + 1, 1, 1).expect("january first")
    } else {
        NaiveDate::from_ymd_opt(d.year(), d.month() + 1, 1).expect("first of month")
    }
}

/// Expands observations into one row per observation or month boundary
/// strictly before `cutoff`, carrying the latest known price forward into
/// months without a direct observation and weighting each row by the days
/// its value stayed in force.
///
/// Guarantees: months are contiguous from the earliest observation's month
/// up to `cutoff`; the periods sum to exactly
/// `(cutoff - earliest_observation).days`; no observations → empty series.
/// Observations dated on or after `cutoff` carry no whole days and are
/// dropped.
pub fn reconcile(observations: &[PricePoint], cutoff: NaiveDate) -> Vec<SeriesRow> {
    let mut obs: Vec<PricePoint> =
        observations.iter().copied().filter(|p| p.date < cutoff).collect();
    if obs.is_empty() {
        return Vec::new();
    }
    obs.sort_by_key(|p| p.date);

    // Collapse same-day repricings: the last one wins.
    let mut dated: Vec<PricePoint> = Vec::with_capacity(obs.len());
    for p in obs {
        match dated.last_mut() {
            Some(last) if last.date == p.date => *last = p,
            _ => dated.push(p),
        }
    }

    let first = dated[0].date;
    let mut dates: Vec<NaiveDate> = dated.iter().map(|p| p.date).collect();
    let mut boundary = month_start(first);
    while boundary < cutoff {
        if boundary >= first {
            dates.push(boundary);
        }
        boundary = next_month(boundary);
    }
    dates.sort();
    dates.dedup();

    let mut rows = Vec::with_capacity(dates.len());
    let mut idx = 0;
    let mut price = dated[0].price;
    for (i, &date) in dates.iter().enumerate() {
        while idx < dated.len() && dated[idx].date <= date {
            price = dated[idx].price;
            idx += 1;
        }
        let until = dates.get(i + 1).copied().unwrap_or(cutoff);
        rows.push(SeriesRow {
            month: month_start(date),
            date,
            price,
            period: (until - date).num_days(),
        });
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn point(y: i32, m: u32, day: u32, price: f64) -> PricePoint {
        PricePoint { date: d(y, m, day), price }
    }

    #[test]
    fn fills_months_between_observations_and_cutoff() {
        let obs = [point(2023, 3, 1, 4.99), point(2023, 1, 15, 9.99)];
        let rows = reconcile(&obs, d(2023, 4, 1));

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], SeriesRow { month: d(2023, 1, 1), date: d(2023, 1, 15), price: 9.99, period: 17 });
        assert_eq!(rows[1], SeriesRow { month: d(2023, 2, 1), date: d(2023, 2, 1), price: 9.99, period: 28 });
        assert_eq!(rows[2], SeriesRow { month: d(2023, 3, 1), date: d(2023, 3, 1), price: 4.99, period: 31 });

        let span = (d(2023, 4, 1) - d(2023, 1, 15)).num_days();
        assert_eq!(rows.iter().map(|r| r.period).sum::<i64>(), span);
    }

    #[test]
    fn empty_observations_reconcile_to_an_empty_series() {
        assert!(reconcile(&[], d(2023, 4, 1)).is_empty());
    }

    #[test]
    fn observations_at_or_after_the_cutoff_are_dropped() {
        let obs = [point(2023, 4, 1, 1.99), point(2023, 4, 10, 0.99)];
        assert!(reconcile(&obs, d(2023, 4, 1)).is_empty());
    }

    #[test]
    fn multiple_changes_inside_one_month_share_the_month() {
        let obs = [point(2023, 5, 5, 10.0), point(2023, 5, 20, 8.0)];
        let rows = reconcile(&obs, d(2023, 6, 1));

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].month, d(2023, 5, 1));
        assert_eq!(rows[1].month, d(2023, 5, 1));
        assert_eq!(rows[0].period, 15); // May 5 → May 20
        assert_eq!(rows[1].period, 12); // May 20 → June 1
    }

    #[test]
    fn no_month_is_skipped_over_a_long_gap() {
        let obs = [point(2022, 11, 20, 19.99)];
        let rows = reconcile(&obs, d(2023, 3, 1));

        let months: Vec<NaiveDate> = rows.iter().map(|r| r.month).collect();
        assert_eq!(months, vec![d(2022, 11, 1), d(2022, 12, 1), d(2023, 1, 1), d(2023, 2, 1)]);
        let span = (d(2023, 3, 1) - d(2022, 11, 20)).num_days();
        assert_eq!(rows.iter().map(|r| r.period).sum::<i64>(), span);
    }

    #[test]
    fn observation_in_the_cutoff_month_runs_to_the_cutoff() {
        let obs = [point(2023, 3, 15, 2.49)];
        let rows = reconcile(&obs, d(2023, 4, 1));

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].period, 17); // March 15 → April 1
    }

    #[test]
    fn same_day_repricings_keep_the_last_value() {
        let obs = [point(2023, 2, 10, 5.0), point(2023, 2, 10, 3.0)];
        let rows = reconcile(&obs, d(2023, 3, 1));

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].price, 3.0);
    }

    #[test]
    fn observation_on_a_month_boundary_does_not_duplicate_the_row() {
        let obs = [point(2023, 2, 1, 7.0)];
        let rows = reconcile(&obs, d(2023, 4, 1));

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, d(2023, 2, 1));
        assert_eq!(rows[1].date, d(2023, 3, 1));
        assert_eq!(rows.iter().map(|r| r.period).sum::<i64>(), 59);
    }
}
