//! Calendar buckets for the popularity ranking
//!
//! A bucket is named by its anchor (the day, the Monday of the week, or the
//! first of the month) and covers everything up to its upper edge.

use chrono::{Datelike, Duration, NaiveDate};

use crate::model::Granularity;

/// Monday on or before `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First day of the following month, rolling December into January
pub fn next_month(date: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Anchor of the bucket containing `date`
pub fn anchor_of(granularity: Granularity, date: NaiveDate) -> NaiveDate {
    match granularity {
        Granularity::Daily => date,
        Granularity::Weekly => week_start(date),
        Granularity::Monthly => month_start(date),
    }
}

/// Last day covered by the bucket at `anchor`
pub fn upper_edge(granularity: Granularity, anchor: NaiveDate) -> NaiveDate {
    match granularity {
        Granularity::Daily => anchor,
        Granularity::Weekly => anchor + Duration::days(6),
        Granularity::Monthly => next_month(anchor)
            .and_then(|d| d.pred_opt())
            .unwrap_or(anchor),
    }
}

fn next_anchor(granularity: Granularity, anchor: NaiveDate) -> Option<NaiveDate> {
    match granularity {
        Granularity::Daily => anchor.succ_opt(),
        Granularity::Weekly => anchor.checked_add_signed(Duration::days(7)),
        Granularity::Monthly => next_month(anchor),
    }
}

/// Every anchor from the bucket containing `start` through the bucket
/// containing `end`, in order. Empty when `end < start`.
pub fn anchors(granularity: Granularity, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    if end < start {
        return out;
    }
    let mut current = Some(anchor_of(granularity, start));
    while let Some(anchor) = current {
        if anchor > end {
            break;
        }
        out.push(anchor);
        current = next_anchor(granularity, anchor);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_start_is_monday() {
        // 2017-09-25 was a Monday
        assert_eq!(week_start(date(2017, 9, 25)), date(2017, 9, 25));
        assert_eq!(week_start(date(2017, 10, 1)), date(2017, 9, 25));
        assert_eq!(week_start(date(2017, 10, 2)), date(2017, 10, 2));
    }

    #[test]
    fn test_monthly_rolls_over_december() {
        let months = anchors(Granularity::Monthly, date(2017, 11, 20), date(2018, 2, 3));
        assert_eq!(
            months,
            vec![date(2017, 11, 1), date(2017, 12, 1), date(2018, 1, 1), date(2018, 2, 1)]
        );
    }

    #[test]
    fn test_upper_edges() {
        assert_eq!(upper_edge(Granularity::Daily, date(2018, 3, 4)), date(2018, 3, 4));
        assert_eq!(upper_edge(Granularity::Weekly, date(2017, 9, 25)), date(2017, 10, 1));
        assert_eq!(upper_edge(Granularity::Monthly, date(2017, 12, 1)), date(2017, 12, 31));
        assert_eq!(upper_edge(Granularity::Monthly, date(2016, 2, 1)), date(2016, 2, 29));
    }

    #[test]
    fn test_daily_and_weekly_ranges() {
        let days = anchors(Granularity::Daily, date(2017, 12, 30), date(2018, 1, 2));
        assert_eq!(days.len(), 4);
        assert_eq!(days[3], date(2018, 1, 2));

        // Wed to the following Tue spans two weeks
        let weeks = anchors(Granularity::Weekly, date(2017, 9, 27), date(2017, 10, 3));
        assert_eq!(weeks, vec![date(2017, 9, 25), date(2017, 10, 2)]);
    }

    #[test]
    fn test_single_day_range() {
        let d = date(2018, 5, 17);
        assert_eq!(anchors(Granularity::Daily, d, d), vec![d]);
        assert_eq!(anchors(Granularity::Weekly, d, d), vec![date(2018, 5, 14)]);
        assert_eq!(anchors(Granularity::Monthly, d, d), vec![date(2018, 5, 1)]);
        assert!(anchors(Granularity::Daily, d, date(2018, 5, 16)).is_empty());
    }
}
