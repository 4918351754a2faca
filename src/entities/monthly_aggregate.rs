//! Monthly aggregate entity - Running footprint statistics per user-month.
//!
//! `(user_id, year, month)` is unique; the index is created alongside the table
//! in [`crate::config::database::create_tables`].

use crate::models::MonthlyAggregate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Monthly aggregate database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "monthly_aggregates")]
pub struct Model {
    /// Unique identifier for the aggregate row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the aggregate
    pub user_id: String,
    /// Calendar year
    pub year: i32,
    /// Calendar month, 1-12
    pub month: i32,
    /// Sum of all contributing footprint values
    pub total_footprint: f64,
    /// Number of contributing entries
    pub count: i64,
    /// `total_footprint / count`
    pub average_footprint: f64,
    /// When the aggregate last changed
    pub last_updated: DateTimeUtc,
}

/// `MonthlyAggregate` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for MonthlyAggregate {
    type Error = crate::errors::Error;

    fn try_from(model: Model) -> crate::errors::Result<Self> {
        let corrupt = |what: &str, err: &dyn std::fmt::Display| {
            crate::errors::Error::CorruptRecord {
                message: format!(
                    "monthly aggregate {}-{} for {}: {what}: {err}",
                    model.year, model.month, model.user_id
                ),
            }
        };

        let month = u32::try_from(model.month).map_err(|e| corrupt("month", &e))?;
        let count = u32::try_from(model.count).map_err(|e| corrupt("count", &e))?;

        Ok(Self {
            year: model.year,
            month,
            total_footprint: model.total_footprint,
            count,
            average_footprint: model.average_footprint,
            last_updated: model.last_updated,
        })
    }
}
