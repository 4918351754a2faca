//! Shared test utilities for `carbon_ledger`.
//!
//! This module provides in-memory store setup and sample records with sensible
//! defaults. Every sample is dated 2024-03-15 10:00 UTC unless stated otherwise.

#![allow(clippy::unwrap_used)]

use crate::{
    config::StoreSettings,
    core::factors::{DietType, FuelType, TransportMedium},
    errors::{Error, Result},
    models::{
        ActivityInput, FootprintEntry, MonthlyAggregate, NewFootprintEntry, YearMonth,
    },
    store::{FootprintStore, SeaOrmStore},
};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use sea_orm::DatabaseConnection;
use std::sync::atomic::{AtomicBool, Ordering};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all store tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// A [`SeaOrmStore`] over a fresh in-memory database with default settings.
pub async fn setup_test_store() -> Result<SeaOrmStore> {
    Ok(SeaOrmStore::new(
        setup_test_db().await?,
        StoreSettings::default(),
    ))
}

/// Fixed timestamp used by every sample: 2024-03-15 10:00:00 UTC.
pub fn sample_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap()
}

/// Car / Petrol / Average activity with the given amounts.
pub const fn sample_input(hours: f64, kwh: f64, waste: f64) -> ActivityInput {
    ActivityInput {
        transport_medium: TransportMedium::Car,
        fuel_type: FuelType::Petrol,
        diet_type: DietType::Average,
        hours_traveled: hours,
        electricity_consumption: kwh,
        waste_generation: waste,
    }
}

/// Unsaved entry for `year`/`month` created at `at`.
pub fn sample_new_entry(
    year: i32,
    month: u32,
    footprint_value: f64,
    at: DateTime<Utc>,
) -> NewFootprintEntry {
    NewFootprintEntry {
        activity: sample_input(1.0, 1.0, 1.0),
        footprint_value,
        created_at: at,
        year,
        month,
        day: at.day(),
    }
}

/// Saved entry for user `alice`, created at [`sample_time`].
pub fn sample_entry(id: i64, year: i32, month: u32, footprint_value: f64) -> FootprintEntry {
    FootprintEntry {
        id,
        user_id: "alice".to_string(),
        activity: sample_input(1.0, 1.0, 1.0),
        footprint_value,
        created_at: sample_time(),
        year,
        month,
        day: 15,
    }
}

/// Single-entry aggregate whose total and average are both `average`.
pub fn sample_aggregate(year: i32, month: u32, average: f64) -> MonthlyAggregate {
    MonthlyAggregate {
        year,
        month,
        total_footprint: average,
        count: 1,
        average_footprint: average,
        last_updated: sample_time(),
    }
}

/// Store whose aggregate increments always fail; everything else goes to the inner store.
pub struct FailingIncrementStore {
    /// Store handling every other call
    pub inner: SeaOrmStore,
}

#[async_trait]
impl FootprintStore for FailingIncrementStore {
    async fn create_entry(&self, user_id: &str, entry: NewFootprintEntry) -> Result<i64> {
        self.inner.create_entry(user_id, entry).await
    }

    async fn get_aggregate(
        &self,
        user_id: &str,
        period: YearMonth,
    ) -> Result<Option<MonthlyAggregate>> {
        self.inner.get_aggregate(user_id, period).await
    }

    async fn put_aggregate(&self, user_id: &str, aggregate: &MonthlyAggregate) -> Result<()> {
        self.inner.put_aggregate(user_id, aggregate).await
    }

    async fn replace_aggregate(
        &self,
        user_id: &str,
        expected: Option<&MonthlyAggregate>,
        next: &MonthlyAggregate,
    ) -> Result<()> {
        self.inner.replace_aggregate(user_id, expected, next).await
    }

    async fn increment_aggregate(
        &self,
        _user_id: &str,
        _period: YearMonth,
        _footprint_value: f64,
        _at: DateTime<Utc>,
    ) -> Result<MonthlyAggregate> {
        Err(Error::StoreUnavailable {
            message: "increment_aggregate timed out".to_string(),
        })
    }

    async fn list_aggregates(&self, user_id: &str) -> Result<Vec<MonthlyAggregate>> {
        self.inner.list_aggregates(user_id).await
    }

    async fn list_recent_entries(&self, user_id: &str, limit: u64) -> Result<Vec<FootprintEntry>> {
        self.inner.list_recent_entries(user_id, limit).await
    }

    async fn list_entries_for_month(
        &self,
        user_id: &str,
        period: YearMonth,
    ) -> Result<Vec<FootprintEntry>> {
        self.inner.list_entries_for_month(user_id, period).await
    }
}

/// Store that, the first time a month's entries are listed, saves one more
/// entry for that month (entry plus increment) right after the listing.
pub struct InterleavedSaveStore {
    /// Store handling every call
    pub inner: SeaOrmStore,
    interleaved: AtomicBool,
}

impl InterleavedSaveStore {
    /// Wraps `inner`; the extra save happens once.
    pub const fn new(inner: SeaOrmStore) -> Self {
        Self {
            inner,
            interleaved: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl FootprintStore for InterleavedSaveStore {
    async fn create_entry(&self, user_id: &str, entry: NewFootprintEntry) -> Result<i64> {
        self.inner.create_entry(user_id, entry).await
    }

    async fn get_aggregate(
        &self,
        user_id: &str,
        period: YearMonth,
    ) -> Result<Option<MonthlyAggregate>> {
        self.inner.get_aggregate(user_id, period).await
    }

    async fn put_aggregate(&self, user_id: &str, aggregate: &MonthlyAggregate) -> Result<()> {
        self.inner.put_aggregate(user_id, aggregate).await
    }

    async fn replace_aggregate(
        &self,
        user_id: &str,
        expected: Option<&MonthlyAggregate>,
        next: &MonthlyAggregate,
    ) -> Result<()> {
        self.inner.replace_aggregate(user_id, expected, next).await
    }

    async fn increment_aggregate(
        &self,
        user_id: &str,
        period: YearMonth,
        footprint_value: f64,
        at: DateTime<Utc>,
    ) -> Result<MonthlyAggregate> {
        self.inner
            .increment_aggregate(user_id, period, footprint_value, at)
            .await
    }

    async fn list_aggregates(&self, user_id: &str) -> Result<Vec<MonthlyAggregate>> {
        self.inner.list_aggregates(user_id).await
    }

    async fn list_recent_entries(&self, user_id: &str, limit: u64) -> Result<Vec<FootprintEntry>> {
        self.inner.list_recent_entries(user_id, limit).await
    }

    async fn list_entries_for_month(
        &self,
        user_id: &str,
        period: YearMonth,
    ) -> Result<Vec<FootprintEntry>> {
        let entries = self.inner.list_entries_for_month(user_id, period).await?;

        if !self.interleaved.swap(true, Ordering::SeqCst) {
            let value = 25.0;
            self.inner
                .create_entry(
                    user_id,
                    sample_new_entry(period.year(), period.month(), value, sample_time()),
                )
                .await?;
            self.inner
                .increment_aggregate(user_id, period, value, sample_time())
                .await?;
        }

        Ok(entries)
    }
}
