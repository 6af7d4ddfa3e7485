use chrono::NaiveDate;
use log::debug;

use crate::schema::CleanedRecord;

/// Keeps rows whose `created_at` UTC calendar date falls within the inclusive
/// `[start, end]` interval. Rows without a timestamp are excluded. The source
/// slice is never mutated; an inverted range yields an empty result.
pub fn filter_by_date(
    records: &[CleanedRecord],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<CleanedRecord> {
    if start > end {
        debug!("Date filter start {start} is after end {end}; returning empty set");
        return Vec::new();
    }

    let filtered: Vec<CleanedRecord> = records
        .iter()
        .filter(|record| {
            record
                .created_at
                .map(|ts| {
                    let date = ts.date_naive();
                    date >= start && date <= end
                })
                .unwrap_or(false)
        })
        .cloned()
        .collect();

    debug!(
        "Date filter [{start}, {end}] kept {} of {} row(s)",
        filtered.len(),
        records.len()
    );

    filtered
}

/// Earliest and latest observed calendar dates, for bounding the caller's
/// date-range control. `None` when no row has a parsed timestamp.
pub fn observed_date_range(records: &[CleanedRecord]) -> Option<(NaiveDate, NaiveDate)> {
    let mut dates = records
        .iter()
        .filter_map(|record| record.created_at)
        .map(|ts| ts.date_naive());

    let first = dates.next()?;
    let (min, max) = dates.fold((first, first), |(min, max), date| {
        (min.min(date), max.max(date))
    });

    Some((min, max))
}
