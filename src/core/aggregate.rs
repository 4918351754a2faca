//! Monthly aggregate maintenance.
//!
//! [`apply_entry`] is the incremental path: fold one new footprint value into
//! the previous aggregate. [`rebuild_aggregate`] recomputes the same aggregate
//! from the full set of entries and is the recovery path when an incremental
//! update was lost or never applied. Both are pure; callers supply `now`.

use crate::{
    errors::{Error, Result},
    models::{FootprintEntry, MonthlyAggregate, YearMonth},
};
use chrono::{DateTime, Utc};

/// Largest total/average difference still treated as consistent.
pub const DRIFT_TOLERANCE: f64 = 1e-6;

/// Folds `footprint_value` into `existing`, or starts a new aggregate for `period`.
///
/// The result always carries `period` as its key; an `existing` aggregate for
/// another month is rejected.
pub fn apply_entry(
    existing: Option<&MonthlyAggregate>,
    footprint_value: f64,
    period: YearMonth,
    now: DateTime<Utc>,
) -> Result<MonthlyAggregate> {
    if !footprint_value.is_finite() {
        return Err(Error::invalid_input(
            "footprint_value",
            "must be a finite number",
        ));
    }

    let Some(existing) = existing else {
        return Ok(MonthlyAggregate {
            year: period.year(),
            month: period.month(),
            total_footprint: footprint_value,
            count: 1,
            average_footprint: footprint_value,
            last_updated: now,
        });
    };

    if existing.year != period.year() || existing.month != period.month() {
        return Err(Error::invalid_input(
            "aggregate",
            format!(
                "aggregate for {}-{} cannot absorb an entry for {period}",
                existing.year, existing.month
            ),
        ));
    }

    let count = existing.count.checked_add(1).ok_or_else(|| {
        Error::invalid_input("aggregate", format!("entry count overflow for {period}"))
    })?;
    let total_footprint = existing.total_footprint + footprint_value;

    Ok(MonthlyAggregate {
        year: period.year(),
        month: period.month(),
        total_footprint,
        count,
        average_footprint: total_footprint / f64::from(count),
        last_updated: now,
    })
}

/// Recomputes an aggregate from every entry for a single month.
///
/// Returns `None` for an empty slice. Entries from more than one month are rejected.
pub fn rebuild_aggregate(entries: &[FootprintEntry]) -> Result<Option<MonthlyAggregate>> {
    let Some(first) = entries.first() else {
        return Ok(None);
    };
    let period = first.period()?;

    let mut total_footprint = 0.0;
    let mut count: u32 = 0;
    let mut last_updated = first.created_at;

    for entry in entries {
        if entry.year != period.year() || entry.month != period.month() {
            return Err(Error::invalid_input(
                "entries",
                format!(
                    "entry {} belongs to {}-{}, not {period}",
                    entry.id, entry.year, entry.month
                ),
            ));
        }

        total_footprint += entry.footprint_value;
        count = count.checked_add(1).ok_or_else(|| {
            Error::invalid_input("entries", format!("entry count overflow for {period}"))
        })?;
        last_updated = last_updated.max(entry.created_at);
    }

    Ok(Some(MonthlyAggregate {
        year: period.year(),
        month: period.month(),
        total_footprint,
        count,
        average_footprint: total_footprint / f64::from(count),
        last_updated,
    }))
}

/// Whether `stored` disagrees with an aggregate rebuilt from the entries.
#[must_use]
pub fn aggregate_drift(stored: Option<&MonthlyAggregate>, rebuilt: Option<&MonthlyAggregate>) -> bool {
    match (stored, rebuilt) {
        (None, None) => false,
        (Some(stored), Some(rebuilt)) => {
            stored.year != rebuilt.year
                || stored.month != rebuilt.month
                || stored.count != rebuilt.count
                || (stored.total_footprint - rebuilt.total_footprint).abs() > DRIFT_TOLERANCE
                || (stored.average_footprint - rebuilt.average_footprint).abs() > DRIFT_TOLERANCE
        }
        _ => true,
    }
}
