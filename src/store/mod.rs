//! Record store interface.
//!
//! The engine persists through [`FootprintStore`] only. Every method takes the
//! owning `user_id` explicitly; implementations scope all reads and writes to it.

/// `SeaORM`-backed store
pub mod sea;

pub use sea::SeaOrmStore;

use crate::{
    errors::Result,
    models::{FootprintEntry, MonthlyAggregate, NewFootprintEntry, YearMonth},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Persistence for footprint entries and monthly aggregates.
#[async_trait]
pub trait FootprintStore: Send + Sync {
    /// Appends an entry and returns its id.
    async fn create_entry(&self, user_id: &str, entry: NewFootprintEntry) -> Result<i64>;

    /// The aggregate for `period`, if one exists.
    async fn get_aggregate(
        &self,
        user_id: &str,
        period: YearMonth,
    ) -> Result<Option<MonthlyAggregate>>;

    /// Writes `aggregate` as-is, inserting or overwriting the row for its key.
    async fn put_aggregate(&self, user_id: &str, aggregate: &MonthlyAggregate) -> Result<()>;

    /// Compare-and-swap write: succeeds only if the stored aggregate still has
    /// the `count` of `expected` (or still doesn't exist when `expected` is `None`).
    ///
    /// # Errors
    /// [`crate::errors::Error::AggregateConflict`] when another writer got there first.
    async fn replace_aggregate(
        &self,
        user_id: &str,
        expected: Option<&MonthlyAggregate>,
        next: &MonthlyAggregate,
    ) -> Result<()>;

    /// Atomically folds `footprint_value` into the aggregate for `period`,
    /// creating it if needed, and returns the updated aggregate.
    async fn increment_aggregate(
        &self,
        user_id: &str,
        period: YearMonth,
        footprint_value: f64,
        at: DateTime<Utc>,
    ) -> Result<MonthlyAggregate>;

    /// Every aggregate the user has, ordered by year then month.
    async fn list_aggregates(&self, user_id: &str) -> Result<Vec<MonthlyAggregate>>;

    /// Up to `limit` entries, newest first.
    async fn list_recent_entries(&self, user_id: &str, limit: u64) -> Result<Vec<FootprintEntry>>;

    /// Every entry counted towards `period`, oldest first.
    async fn list_entries_for_month(
        &self,
        user_id: &str,
        period: YearMonth,
    ) -> Result<Vec<FootprintEntry>>;
}
