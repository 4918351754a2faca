//! Save and load flows over a [`FootprintStore`].
//!
//! [`FootprintRecorder`] is what a host calls when the user saves the
//! calculator form or opens the history screen. It scores, persists the entry,
//! folds the value into the monthly aggregate and builds the history view.
//!
//! The entry is the source of truth. Once it is written it is never rolled
//! back: if the aggregate step fails afterwards the save still succeeds, with
//! [`AggregateStatus::Pending`], and [`FootprintRecorder::reconcile`] repairs
//! the aggregate from the stored entries later.

use crate::{
    config::AppConfig,
    core::{
        aggregate::{aggregate_drift, apply_entry, rebuild_aggregate},
        factors::FactorTable,
        history::{HistoryView, build_history_view},
        scoring::{FootprintBreakdown, compute_breakdown},
    },
    errors::{Error, Result},
    models::{ActivityForm, FootprintEntry, MonthlyAggregate, NewFootprintEntry, YearMonth},
    store::FootprintStore,
};
use chrono::{DateTime, Datelike, Local, TimeZone, Utc};
use tracing::{debug, info, instrument, warn};

/// What happened to the monthly aggregate after an entry was saved.
#[derive(Debug)]
pub enum AggregateStatus {
    /// The aggregate now includes the entry
    Updated(MonthlyAggregate),
    /// The aggregate update failed; the entry is saved and needs a reconcile
    Pending(Error),
}

/// Outcome of a successful save.
#[derive(Debug)]
pub struct SavedFootprint {
    /// The stored entry
    pub entry: FootprintEntry,
    /// Per-category emissions behind `entry.footprint_value`
    pub breakdown: FootprintBreakdown,
    /// Aggregate outcome
    pub aggregate: AggregateStatus,
}

/// Scores, saves and reads footprints for any user through one store.
pub struct FootprintRecorder<S> {
    store: S,
    factors: FactorTable,
    recent_limit: u64,
}

impl<S: FootprintStore> FootprintRecorder<S> {
    /// Creates a recorder scoring with `factors` and listing `recent_limit` recent entries by default.
    #[must_use]
    pub const fn new(store: S, factors: FactorTable, recent_limit: u64) -> Self {
        Self {
            store,
            factors,
            recent_limit,
        }
    }

    /// Creates a recorder with the factor table and history settings from `config`.
    #[must_use]
    pub fn from_config(store: S, config: &AppConfig) -> Self {
        Self::new(
            store,
            config.factors.clone(),
            config.history.recent_limit,
        )
    }

    /// The backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Scores a form without saving anything.
    pub fn preview(&self, form: &ActivityForm) -> Result<FootprintBreakdown> {
        compute_breakdown(&form.parse()?, &self.factors)
    }

    /// Saves a submission dated now, in local time.
    pub async fn record(&self, user_id: &str, form: &ActivityForm) -> Result<SavedFootprint> {
        self.record_at(user_id, form, Local::now()).await
    }

    /// Saves a submission dated `at`.
    ///
    /// The calendar year, month and day come from `at` in its own time zone.
    /// Invalid input fails before anything is written.
    #[instrument(skip(self, form, at))]
    pub async fn record_at<Tz: TimeZone>(
        &self,
        user_id: &str,
        form: &ActivityForm,
        at: DateTime<Tz>,
    ) -> Result<SavedFootprint> {
        let activity = form.parse()?;
        let breakdown = compute_breakdown(&activity, &self.factors)?;

        let date = at.date_naive();
        let period = YearMonth::from_date(date);
        let created_at = at.with_timezone(&Utc);
        let new_entry = NewFootprintEntry {
            activity,
            footprint_value: breakdown.total,
            created_at,
            year: period.year(),
            month: period.month(),
            day: date.day(),
        };

        let id = self.store.create_entry(user_id, new_entry.clone()).await?;
        info!(entry_id = id, %period, footprint = breakdown.total, "Footprint saved");

        let aggregate = match self
            .store
            .increment_aggregate(user_id, period, breakdown.total, created_at)
            .await
        {
            Ok(aggregate) => AggregateStatus::Updated(aggregate),
            Err(err) => {
                warn!(entry_id = id, %period, error = %err, "Aggregate update failed, entry kept");
                AggregateStatus::Pending(err)
            }
        };

        Ok(SavedFootprint {
            entry: FootprintEntry {
                id,
                user_id: user_id.to_string(),
                activity: new_entry.activity,
                footprint_value: new_entry.footprint_value,
                created_at: new_entry.created_at,
                year: new_entry.year,
                month: new_entry.month,
                day: new_entry.day,
            },
            breakdown,
            aggregate,
        })
    }

    /// Folds `footprint_value` into the aggregate with a single read and a
    /// compare-and-swap write.
    ///
    /// # Errors
    /// [`Error::AggregateConflict`] if the aggregate changed between the read and
    /// the write. Nothing is retried here.
    #[instrument(skip(self))]
    pub async fn apply_optimistic(
        &self,
        user_id: &str,
        period: YearMonth,
        footprint_value: f64,
        at: DateTime<Utc>,
    ) -> Result<MonthlyAggregate> {
        let existing = self.store.get_aggregate(user_id, period).await?;
        let next = apply_entry(existing.as_ref(), footprint_value, period, at)?;
        self.store
            .replace_aggregate(user_id, existing.as_ref(), &next)
            .await?;
        Ok(next)
    }

    /// Rebuilds the aggregate for `period` from its entries and writes it back.
    ///
    /// The stored aggregate is read before the entries, and the rebuild is
    /// written with a compare-and-swap against that read. Returns `None` when
    /// the month has no entries.
    ///
    /// # Errors
    /// [`Error::AggregateConflict`] if a save landed while rebuilding; the
    /// stored aggregate is left as that save wrote it and a later reconcile
    /// can run again.
    #[instrument(skip(self))]
    pub async fn reconcile(
        &self,
        user_id: &str,
        period: YearMonth,
    ) -> Result<Option<MonthlyAggregate>> {
        let stored = self.store.get_aggregate(user_id, period).await?;
        let entries = self.store.list_entries_for_month(user_id, period).await?;
        let rebuilt = rebuild_aggregate(&entries)?;

        if aggregate_drift(stored.as_ref(), rebuilt.as_ref()) {
            warn!(
                %period,
                stored_count = stored.as_ref().map(|a| a.count),
                rebuilt_count = rebuilt.as_ref().map(|a| a.count),
                "Aggregate drifted from entries"
            );
        }

        if let Some(aggregate) = &rebuilt {
            self.store
                .replace_aggregate(user_id, stored.as_ref(), aggregate)
                .await?;
            debug!(%period, count = aggregate.count, "Aggregate reconciled");
        }

        Ok(rebuilt)
    }

    /// Loads everything the history screen needs for `year`.
    ///
    /// `recent_limit` overrides the configured number of recent entries.
    #[instrument(skip(self))]
    pub async fn load_history(
        &self,
        user_id: &str,
        year: i32,
        recent_limit: Option<u64>,
    ) -> Result<HistoryView> {
        let limit = recent_limit.unwrap_or(self.recent_limit);
        let aggregates = self.store.list_aggregates(user_id).await?;
        let entries = self.store.list_recent_entries(user_id, limit).await?;

        debug!(
            aggregates = aggregates.len(),
            entries = entries.len(),
            "History loaded"
        );
        Ok(build_history_view(
            &aggregates,
            &entries,
            year,
            usize::try_from(limit).unwrap_or(usize::MAX),
        ))
    }
}
