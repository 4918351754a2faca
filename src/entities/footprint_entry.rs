//! Footprint entry entity - One saved footprint submission.
//!
//! Rows are append-only: the engine inserts them and never updates or deletes them.
//! Category columns hold the display names (e.g. `"Meat Heavy"`).

use crate::models::{ActivityInput, FootprintEntry};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Footprint entry database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "footprint_entries")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the entry
    pub user_id: String,
    /// Transport medium name
    pub transport_medium: String,
    /// Fuel type name
    pub fuel_type: String,
    /// Diet type name
    pub diet_type: String,
    /// Hours travelled
    pub hours_traveled: f64,
    /// Electricity used in kWh
    pub electricity_consumption: f64,
    /// Waste generated in kg
    pub waste_generation: f64,
    /// Rounded footprint score
    pub footprint_value: f64,
    /// Calendar year the entry counts towards
    pub year: i32,
    /// Calendar month (1-12) the entry counts towards
    pub month: i32,
    /// Day of month the entry was saved on
    pub day: i32,
    /// When the entry was saved
    pub created_at: DateTimeUtc,
}

/// `FootprintEntry` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for FootprintEntry {
    type Error = crate::errors::Error;

    fn try_from(model: Model) -> crate::errors::Result<Self> {
        let corrupt = |what: &str, err: &dyn std::fmt::Display| {
            crate::errors::Error::CorruptRecord {
                message: format!("footprint entry {}: {what}: {err}", model.id),
            }
        };

        let activity = ActivityInput {
            transport_medium: model
                .transport_medium
                .parse()
                .map_err(|e| corrupt("transport_medium", &e))?,
            fuel_type: model.fuel_type.parse().map_err(|e| corrupt("fuel_type", &e))?,
            diet_type: model.diet_type.parse().map_err(|e| corrupt("diet_type", &e))?,
            hours_traveled: model.hours_traveled,
            electricity_consumption: model.electricity_consumption,
            waste_generation: model.waste_generation,
        };
        let month = u32::try_from(model.month).map_err(|e| corrupt("month", &e))?;
        let day = u32::try_from(model.day).map_err(|e| corrupt("day", &e))?;

        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            activity,
            footprint_value: model.footprint_value,
            created_at: model.created_at,
            year: model.year,
            month,
            day,
        })
    }
}
