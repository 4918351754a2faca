//! Database configuration module.
//!
//! This module handles the `SQLite` connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs. The composite unique index on monthly aggregates is created here as
//! well since the entity derive can't express it.

use crate::entities::{FootprintEntry, MonthlyAggregate, monthly_aggregate};
use crate::errors::Result;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema, sea_query::Index,
};
use std::time::Duration;
use tracing::{debug, info, instrument};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/carbon_ledger.sqlite?mode=rwc";

/// Name of the unique index on `(user_id, year, month)`.
pub const AGGREGATE_KEY_INDEX: &str = "idx_monthly_aggregates_user_period";

/// Gets the database URL from the `DATABASE_URL` environment variable or the default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Opens a connection to `database_url`, failing after `connect_timeout`.
#[instrument(skip(database_url))]
pub async fn create_connection(
    database_url: &str,
    connect_timeout: Duration,
) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(database_url.to_string());
    options
        .connect_timeout(connect_timeout)
        .acquire_timeout(connect_timeout)
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    info!("Database connection established");
    Ok(db)
}

/// Creates the footprint tables and the aggregate key index if they don't exist yet.
#[instrument(skip(db))]
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let entry_table = schema
        .create_table_from_entity(FootprintEntry)
        .if_not_exists()
        .to_owned();
    let aggregate_table = schema
        .create_table_from_entity(MonthlyAggregate)
        .if_not_exists()
        .to_owned();
    let aggregate_key = Index::create()
        .name(AGGREGATE_KEY_INDEX)
        .table(MonthlyAggregate)
        .col(monthly_aggregate::Column::UserId)
        .col(monthly_aggregate::Column::Year)
        .col(monthly_aggregate::Column::Month)
        .unique()
        .if_not_exists()
        .to_owned();

    db.execute(builder.build(&entry_table)).await?;
    db.execute(builder.build(&aggregate_table)).await?;
    db.execute(builder.build(&aggregate_key)).await?;

    debug!("Footprint tables ensured");
    Ok(())
}
