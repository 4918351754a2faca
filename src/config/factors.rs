//! Emission factor configuration from config.toml
//!
//! The `[factors]` table mirrors [`FactorTable`] with category names as keys.
//! Every category must be listed; unknown names are rejected so a typo in the
//! config can't silently zero out a category.

use crate::{
    core::factors::{DEFAULT_MEALS_PER_PERIOD, FactorTable},
    errors::{Error, Result},
};
use serde::Deserialize;
use std::{collections::BTreeMap, str::FromStr};

/// `[factors]` section of config.toml
#[derive(Debug, Deserialize, Clone)]
pub struct FactorTableConfig {
    /// Multiplier per hour travelled, keyed by transport medium name
    pub transport: BTreeMap<String, f64>,
    /// Multiplier per fuel type name
    pub fuel: BTreeMap<String, f64>,
    /// Emissions per meal, keyed by diet type name
    pub diet: BTreeMap<String, f64>,
    /// kg CO₂ per kWh
    pub electricity: f64,
    /// kg CO₂ per kg of waste
    pub waste: f64,
    /// Meals counted per reporting period
    #[serde(default = "default_meals_per_period")]
    pub meals_per_period: u32,
}

const fn default_meals_per_period() -> u32 {
    DEFAULT_MEALS_PER_PERIOD
}

impl TryFrom<FactorTableConfig> for FactorTable {
    type Error = Error;

    fn try_from(config: FactorTableConfig) -> Result<Self> {
        Self::new(
            keyed("transport", config.transport)?,
            keyed("fuel", config.fuel)?,
            keyed("diet", config.diet)?,
            config.electricity,
            config.waste,
            config.meals_per_period,
        )
    }
}

fn keyed<K>(table: &str, raw: BTreeMap<String, f64>) -> Result<BTreeMap<K, f64>>
where
    K: FromStr<Err = Error> + Ord,
{
    raw.into_iter()
        .map(|(name, factor)| {
            name.parse::<K>()
                .map(|key| (key, factor))
                .map_err(|e| Error::Config {
                    message: format!("[factors.{table}] {e}"),
                })
        })
        .collect()
}
