//! `SeaORM` implementation of [`FootprintStore`].
//!
//! Aggregate updates never read-then-write from the client. The increment path
//! is a single `UPDATE … SET total = total + v, count = count + 1, …` inside a
//! transaction, falling back to an insert when the month has no row yet. Two
//! writers racing to create the same month collide on the unique
//! `(user_id, year, month)` index; the loser retries the update.
//!
//! Every operation runs under the configured timeout. A timed-out transaction is
//! dropped, which rolls it back, so a timeout never leaves a half-applied aggregate.

use crate::{
    config::{
        AppConfig, StoreSettings,
        database::{create_connection, create_tables},
    },
    entities::{FootprintEntry as EntryEntity, MonthlyAggregate as AggregateEntity},
    entities::{footprint_entry, monthly_aggregate},
    errors::{Error, Result},
    models::{FootprintEntry, MonthlyAggregate, NewFootprintEntry, YearMonth},
    store::FootprintStore,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    Condition, DbErr, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use std::{future::Future, time::Duration};
use tracing::{debug, instrument, warn};

/// Footprint store backed by any `SeaORM` connection.
#[derive(Debug, Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
    timeout: Duration,
    max_attempts: u32,
}

impl SeaOrmStore {
    /// Wraps an open connection. Tables must already exist
    /// (see [`crate::config::database::create_tables`]).
    #[must_use]
    pub const fn new(db: DatabaseConnection, settings: StoreSettings) -> Self {
        Self {
            db,
            timeout: settings.timeout(),
            max_attempts: settings.max_attempts,
        }
    }

    /// Opens `config.database_url`, creates missing tables and wraps the connection.
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let db = create_connection(&config.database_url, config.store.timeout()).await?;
        create_tables(&db).await?;
        Ok(Self::new(db, config.store))
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    async fn timed<T, F>(&self, operation: &'static str, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.timeout, future)
            .await
            .unwrap_or_else(|_| {
                warn!(operation, timeout = ?self.timeout, "Store operation timed out");
                Err(Error::StoreUnavailable {
                    message: format!("{operation} timed out after {:?}", self.timeout),
                })
            })
    }

    /// One increment attempt. `Ok(None)` means a concurrent insert won the race
    /// for a new month and the attempt was rolled back.
    async fn try_increment(
        &self,
        user_id: &str,
        period: YearMonth,
        footprint_value: f64,
        at: DateTime<Utc>,
    ) -> Result<Option<monthly_aggregate::Model>> {
        use monthly_aggregate::Column;

        let txn = self.db.begin().await?;

        // SET expressions all read the pre-update row, so the average uses the new total and count.
        let updated = AggregateEntity::update_many()
            .col_expr(
                Column::TotalFootprint,
                Expr::col(Column::TotalFootprint).add(footprint_value),
            )
            .col_expr(Column::Count, Expr::col(Column::Count).add(1))
            .col_expr(
                Column::AverageFootprint,
                Expr::col(Column::TotalFootprint)
                    .add(footprint_value)
                    .div(Expr::col(Column::Count).add(1)),
            )
            .col_expr(Column::LastUpdated, Expr::value(at))
            .filter(aggregate_key(user_id, period)?)
            .exec(&txn)
            .await?;

        if updated.rows_affected == 0 {
            let fresh = monthly_aggregate::ActiveModel {
                user_id: Set(user_id.to_string()),
                year: Set(period.year()),
                month: Set(month_column(period.month())?),
                total_footprint: Set(footprint_value),
                count: Set(1),
                average_footprint: Set(footprint_value),
                last_updated: Set(at),
                ..Default::default()
            };

            if let Err(err) = fresh.insert(&txn).await {
                if is_unique_violation(&err) {
                    return Ok(None);
                }
                return Err(err.into());
            }
        }

        let model = find_aggregate(&txn, user_id, period)
            .await?
            .ok_or_else(|| Error::StoreUnavailable {
                message: format!("aggregate {period} for {user_id} missing after increment"),
            })?;
        txn.commit().await?;

        Ok(Some(model))
    }

    /// One upsert attempt. `Ok(false)` means a concurrent insert won the race.
    async fn try_put(&self, user_id: &str, aggregate: &MonthlyAggregate) -> Result<bool> {
        let period = aggregate.period()?;
        let txn = self.db.begin().await?;

        if let Some(existing) = find_aggregate(&txn, user_id, period).await? {
            let mut active: monthly_aggregate::ActiveModel = existing.into();
            write_fields(&mut active, aggregate)?;
            active.update(&txn).await?;
        } else {
            let mut active = monthly_aggregate::ActiveModel {
                user_id: Set(user_id.to_string()),
                ..Default::default()
            };
            write_fields(&mut active, aggregate)?;

            if let Err(err) = active.insert(&txn).await {
                if is_unique_violation(&err) {
                    return Ok(false);
                }
                return Err(err.into());
            }
        }

        txn.commit().await?;
        Ok(true)
    }

    fn conflict(user_id: &str, period: YearMonth) -> Error {
        Error::AggregateConflict {
            user_id: user_id.to_string(),
            year: period.year(),
            month: period.month(),
        }
    }
}

#[async_trait]
impl FootprintStore for SeaOrmStore {
    #[instrument(skip(self, entry))]
    async fn create_entry(&self, user_id: &str, entry: NewFootprintEntry) -> Result<i64> {
        let period = entry.period()?;
        let day = i32::try_from(entry.day)
            .map_err(|e| Error::invalid_input("day", e.to_string()))?;

        self.timed("create_entry", async {
            let model = footprint_entry::ActiveModel {
                user_id: Set(user_id.to_string()),
                transport_medium: Set(entry.activity.transport_medium.as_str().to_string()),
                fuel_type: Set(entry.activity.fuel_type.as_str().to_string()),
                diet_type: Set(entry.activity.diet_type.as_str().to_string()),
                hours_traveled: Set(entry.activity.hours_traveled),
                electricity_consumption: Set(entry.activity.electricity_consumption),
                waste_generation: Set(entry.activity.waste_generation),
                footprint_value: Set(entry.footprint_value),
                year: Set(period.year()),
                month: Set(month_column(period.month())?),
                day: Set(day),
                created_at: Set(entry.created_at),
                ..Default::default()
            };

            let inserted = model.insert(&self.db).await?;
            debug!(entry_id = inserted.id, "Footprint entry created");
            Ok(inserted.id)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn get_aggregate(
        &self,
        user_id: &str,
        period: YearMonth,
    ) -> Result<Option<MonthlyAggregate>> {
        self.timed("get_aggregate", async {
            find_aggregate(&self.db, user_id, period)
                .await?
                .map(MonthlyAggregate::try_from)
                .transpose()
        })
        .await
    }

    #[instrument(skip(self, aggregate))]
    async fn put_aggregate(&self, user_id: &str, aggregate: &MonthlyAggregate) -> Result<()> {
        let period = aggregate.period()?;

        self.timed("put_aggregate", async {
            for attempt in 1..=self.max_attempts {
                if self.try_put(user_id, aggregate).await? {
                    debug!(%period, "Aggregate written");
                    return Ok(());
                }
                warn!(%period, attempt, "Aggregate insert raced, retrying");
            }
            Err(Self::conflict(user_id, period))
        })
        .await
    }

    #[instrument(skip(self, expected, next))]
    async fn replace_aggregate(
        &self,
        user_id: &str,
        expected: Option<&MonthlyAggregate>,
        next: &MonthlyAggregate,
    ) -> Result<()> {
        use monthly_aggregate::Column;

        let period = next.period()?;
        if let Some(expected) = expected {
            if expected.period()? != period {
                return Err(Error::invalid_input(
                    "aggregate",
                    format!(
                        "cannot replace {}-{} with {period}",
                        expected.year, expected.month
                    ),
                ));
            }
        }

        self.timed("replace_aggregate", async {
            if let Some(expected) = expected {
                let result = AggregateEntity::update_many()
                    .col_expr(Column::TotalFootprint, Expr::value(next.total_footprint))
                    .col_expr(Column::Count, Expr::value(i64::from(next.count)))
                    .col_expr(Column::AverageFootprint, Expr::value(next.average_footprint))
                    .col_expr(Column::LastUpdated, Expr::value(next.last_updated))
                    .filter(aggregate_key(user_id, period)?)
                    .filter(Column::Count.eq(i64::from(expected.count)))
                    .exec(&self.db)
                    .await?;

                if result.rows_affected == 0 {
                    return Err(Self::conflict(user_id, period));
                }
            } else {
                let mut active = monthly_aggregate::ActiveModel {
                    user_id: Set(user_id.to_string()),
                    ..Default::default()
                };
                write_fields(&mut active, next)?;

                if let Err(err) = active.insert(&self.db).await {
                    if is_unique_violation(&err) {
                        return Err(Self::conflict(user_id, period));
                    }
                    return Err(err.into());
                }
            }

            debug!(%period, count = next.count, "Aggregate replaced");
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn increment_aggregate(
        &self,
        user_id: &str,
        period: YearMonth,
        footprint_value: f64,
        at: DateTime<Utc>,
    ) -> Result<MonthlyAggregate> {
        if !footprint_value.is_finite() {
            return Err(Error::invalid_input(
                "footprint_value",
                "must be a finite number",
            ));
        }

        self.timed("increment_aggregate", async {
            for attempt in 1..=self.max_attempts {
                if let Some(model) = self
                    .try_increment(user_id, period, footprint_value, at)
                    .await?
                {
                    debug!(%period, count = model.count, "Aggregate incremented");
                    return MonthlyAggregate::try_from(model);
                }
                warn!(%period, attempt, "Aggregate insert raced, retrying");
            }
            Err(Self::conflict(user_id, period))
        })
        .await
    }

    #[instrument(skip(self))]
    async fn list_aggregates(&self, user_id: &str) -> Result<Vec<MonthlyAggregate>> {
        use monthly_aggregate::Column;

        self.timed("list_aggregates", async {
            AggregateEntity::find()
                .filter(Column::UserId.eq(user_id))
                .order_by_asc(Column::Year)
                .order_by_asc(Column::Month)
                .all(&self.db)
                .await?
                .into_iter()
                .map(MonthlyAggregate::try_from)
                .collect()
        })
        .await
    }

    #[instrument(skip(self))]
    async fn list_recent_entries(&self, user_id: &str, limit: u64) -> Result<Vec<FootprintEntry>> {
        use footprint_entry::Column;

        self.timed("list_recent_entries", async {
            EntryEntity::find()
                .filter(Column::UserId.eq(user_id))
                .order_by_desc(Column::CreatedAt)
                .order_by_desc(Column::Id)
                .limit(limit)
                .all(&self.db)
                .await?
                .into_iter()
                .map(FootprintEntry::try_from)
                .collect()
        })
        .await
    }

    #[instrument(skip(self))]
    async fn list_entries_for_month(
        &self,
        user_id: &str,
        period: YearMonth,
    ) -> Result<Vec<FootprintEntry>> {
        use footprint_entry::Column;

        self.timed("list_entries_for_month", async {
            EntryEntity::find()
                .filter(Column::UserId.eq(user_id))
                .filter(Column::Year.eq(period.year()))
                .filter(Column::Month.eq(month_column(period.month())?))
                .order_by_asc(Column::CreatedAt)
                .order_by_asc(Column::Id)
                .all(&self.db)
                .await?
                .into_iter()
                .map(FootprintEntry::try_from)
                .collect()
        })
        .await
    }
}

fn month_column(month: u32) -> Result<i32> {
    i32::try_from(month).map_err(|e| Error::invalid_input("month", e.to_string()))
}

fn aggregate_key(user_id: &str, period: YearMonth) -> Result<Condition> {
    use monthly_aggregate::Column;

    Ok(Condition::all()
        .add(Column::UserId.eq(user_id))
        .add(Column::Year.eq(period.year()))
        .add(Column::Month.eq(month_column(period.month())?)))
}

async fn find_aggregate<C>(
    db: &C,
    user_id: &str,
    period: YearMonth,
) -> Result<Option<monthly_aggregate::Model>>
where
    C: ConnectionTrait,
{
    AggregateEntity::find()
        .filter(aggregate_key(user_id, period)?)
        .one(db)
        .await
        .map_err(Into::into)
}

fn write_fields(
    active: &mut monthly_aggregate::ActiveModel,
    aggregate: &MonthlyAggregate,
) -> Result<()> {
    active.year = Set(aggregate.year);
    active.month = Set(month_column(aggregate.month)?);
    active.total_footprint = Set(aggregate.total_footprint);
    active.count = Set(i64::from(aggregate.count));
    active.average_footprint = Set(aggregate.average_footprint);
    active.last_updated = Set(aggregate.last_updated);
    Ok(())
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
