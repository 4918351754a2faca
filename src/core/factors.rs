//! Activity categories and the emission factor table.
//!
//! Categories are closed enums so an unknown category can only appear at the
//! text boundary (form input, config files, stored rows), where it is rejected.
//! A [`FactorTable`] is validated once at construction: every category must
//! carry a finite, nonnegative multiplier.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

/// Meals assumed per reporting period when scoring diet.
pub const DEFAULT_MEALS_PER_PERIOD: u32 = 30;

/// How the user travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TransportMedium {
    /// Private car
    Car,
    /// Public bus
    Bus,
    /// Train or metro
    Train,
    /// Bicycle (no emissions)
    Bicycle,
    /// Aeroplane
    Plane,
}

impl TransportMedium {
    /// Every transport medium, in display order.
    pub const ALL: [Self; 5] = [Self::Car, Self::Bus, Self::Train, Self::Bicycle, Self::Plane];

    /// Display name, also used for storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Car => "Car",
            Self::Bus => "Bus",
            Self::Train => "Train",
            Self::Bicycle => "Bicycle",
            Self::Plane => "Plane",
        }
    }
}

/// Fuel powering the transport medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FuelType {
    /// Petrol / gasoline
    Petrol,
    /// Diesel
    Diesel,
    /// Battery electric
    Electric,
    /// Petrol-electric hybrid
    Hybrid,
}

impl FuelType {
    /// Every fuel type, in display order.
    pub const ALL: [Self; 4] = [Self::Petrol, Self::Diesel, Self::Electric, Self::Hybrid];

    /// Display name, also used for storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Petrol => "Petrol",
            Self::Diesel => "Diesel",
            Self::Electric => "Electric",
            Self::Hybrid => "Hybrid",
        }
    }
}

/// The user's typical diet over the period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DietType {
    /// Meat at most meals
    #[serde(rename = "Meat Heavy")]
    MeatHeavy,
    /// Mixed diet
    Average,
    /// No meat
    Vegetarian,
    /// No animal products
    Vegan,
}

impl DietType {
    /// Every diet type, in display order.
    pub const ALL: [Self; 4] = [Self::MeatHeavy, Self::Average, Self::Vegetarian, Self::Vegan];

    /// Display name, also used for storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MeatHeavy => "Meat Heavy",
            Self::Average => "Average",
            Self::Vegetarian => "Vegetarian",
            Self::Vegan => "Vegan",
        }
    }
}

fn parse_category<T: Copy>(
    all: &[T],
    name: fn(T) -> &'static str,
    field: &str,
    text: &str,
) -> Result<T> {
    let wanted = text.trim();
    all.iter()
        .copied()
        .find(|candidate| name(*candidate) == wanted)
        .ok_or_else(|| Error::invalid_input(field, format!("unknown category '{wanted}'")))
}

impl FromStr for TransportMedium {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_category(&Self::ALL, Self::as_str, "transport_medium", s)
    }
}

impl FromStr for FuelType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_category(&Self::ALL, Self::as_str, "fuel_type", s)
    }
}

impl FromStr for DietType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_category(&Self::ALL, Self::as_str, "diet_type", s)
    }
}

impl fmt::Display for TransportMedium {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for DietType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emission multipliers for every activity category.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorTable {
    transport: BTreeMap<TransportMedium, f64>,
    fuel: BTreeMap<FuelType, f64>,
    diet: BTreeMap<DietType, f64>,
    electricity: f64,
    waste: f64,
    meals_per_period: u32,
}

impl FactorTable {
    /// Builds a factor table, rejecting missing categories and negative or
    /// non-finite multipliers.
    pub fn new(
        transport: BTreeMap<TransportMedium, f64>,
        fuel: BTreeMap<FuelType, f64>,
        diet: BTreeMap<DietType, f64>,
        electricity: f64,
        waste: f64,
        meals_per_period: u32,
    ) -> Result<Self> {
        ensure_complete("transport", &TransportMedium::ALL, &transport, |m| m.as_str())?;
        ensure_complete("fuel", &FuelType::ALL, &fuel, |f| f.as_str())?;
        ensure_complete("diet", &DietType::ALL, &diet, |d| d.as_str())?;
        ensure_factor("electricity", electricity)?;
        ensure_factor("waste", waste)?;

        if meals_per_period == 0 {
            return Err(Error::Config {
                message: "meals_per_period must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            transport,
            fuel,
            diet,
            electricity,
            waste,
            meals_per_period,
        })
    }

    /// Multiplier per hour travelled with `medium`.
    pub fn transport_factor(&self, medium: TransportMedium) -> Result<f64> {
        lookup(&self.transport, medium, "transport_medium", medium.as_str())
    }

    /// Multiplier applied on top of the transport factor for `fuel`.
    pub fn fuel_factor(&self, fuel: FuelType) -> Result<f64> {
        lookup(&self.fuel, fuel, "fuel_type", fuel.as_str())
    }

    /// Emissions per meal for `diet`.
    pub fn diet_factor(&self, diet: DietType) -> Result<f64> {
        lookup(&self.diet, diet, "diet_type", diet.as_str())
    }

    /// kg CO₂ per kWh of electricity.
    #[must_use]
    pub const fn electricity_factor(&self) -> f64 {
        self.electricity
    }

    /// kg CO₂ per kg of waste.
    #[must_use]
    pub const fn waste_factor(&self) -> f64 {
        self.waste
    }

    /// Meals counted per reporting period.
    #[must_use]
    pub const fn meals_per_period(&self) -> u32 {
        self.meals_per_period
    }
}

impl Default for FactorTable {
    fn default() -> Self {
        Self {
            transport: BTreeMap::from([
                (TransportMedium::Car, 2.3),
                (TransportMedium::Bus, 0.8),
                (TransportMedium::Train, 0.4),
                (TransportMedium::Bicycle, 0.0),
                (TransportMedium::Plane, 4.5),
            ]),
            fuel: BTreeMap::from([
                (FuelType::Petrol, 2.3),
                (FuelType::Diesel, 2.7),
                (FuelType::Electric, 0.5),
                (FuelType::Hybrid, 1.8),
            ]),
            diet: BTreeMap::from([
                (DietType::MeatHeavy, 3.3),
                (DietType::Average, 2.5),
                (DietType::Vegetarian, 1.7),
                (DietType::Vegan, 1.5),
            ]),
            electricity: 0.5,
            waste: 0.7,
            meals_per_period: DEFAULT_MEALS_PER_PERIOD,
        }
    }
}

fn ensure_factor(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::Config {
            message: format!("factor '{name}' must be a finite, nonnegative number (got {value})"),
        });
    }
    Ok(())
}

fn ensure_complete<K: Ord + Copy>(
    table: &str,
    all: &[K],
    factors: &BTreeMap<K, f64>,
    name: fn(K) -> &'static str,
) -> Result<()> {
    for key in all {
        let value = factors.get(key).copied().ok_or_else(|| Error::Config {
            message: format!("{table} factor table has no entry for '{}'", name(*key)),
        })?;
        ensure_factor(&format!("{table}.{}", name(*key)), value)?;
    }
    Ok(())
}

fn lookup<K: Ord>(factors: &BTreeMap<K, f64>, key: K, field: &str, name: &str) -> Result<f64> {
    factors
        .get(&key)
        .copied()
        .ok_or_else(|| Error::invalid_input(field, format!("no emission factor for '{name}'")))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_category_names_round_trip_through_from_str() {
        for medium in TransportMedium::ALL {
            assert_eq!(medium.as_str().parse::<TransportMedium>().unwrap(), medium);
        }
        for fuel in FuelType::ALL {
            assert_eq!(fuel.to_string().parse::<FuelType>().unwrap(), fuel);
        }
        assert_eq!("Meat Heavy".parse::<DietType>().unwrap(), DietType::MeatHeavy);
        assert_eq!("  Vegan ".parse::<DietType>().unwrap(), DietType::Vegan);
    }

    #[test]
    fn test_unknown_category_is_invalid_input() {
        let err = "Rocket".parse::<TransportMedium>().unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidInputKind { ref field, .. } if field == "transport_medium"
        ));

        let err = "meat heavy".parse::<DietType>().unwrap_err();
        assert!(matches!(err, Error::InvalidInputKind { .. }));
    }

    #[test]
    fn test_serde_uses_display_names() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            diet: DietType,
        }

        let rendered = toml::to_string(&Wrapper {
            diet: DietType::MeatHeavy,
        })
        .unwrap();
        assert_eq!(rendered.trim(), "diet = \"Meat Heavy\"");

        let parsed: Wrapper = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.diet, DietType::MeatHeavy);
    }

    #[test]
    fn test_default_table_matches_reference_factors() {
        let table = FactorTable::default();
        assert_eq!(table.transport_factor(TransportMedium::Car).unwrap(), 2.3);
        assert_eq!(table.transport_factor(TransportMedium::Bicycle).unwrap(), 0.0);
        assert_eq!(table.fuel_factor(FuelType::Diesel).unwrap(), 2.7);
        assert_eq!(table.diet_factor(DietType::MeatHeavy).unwrap(), 3.3);
        assert_eq!(table.electricity_factor(), 0.5);
        assert_eq!(table.waste_factor(), 0.7);
        assert_eq!(table.meals_per_period(), DEFAULT_MEALS_PER_PERIOD);
    }

    fn complete_maps() -> (
        BTreeMap<TransportMedium, f64>,
        BTreeMap<FuelType, f64>,
        BTreeMap<DietType, f64>,
    ) {
        (
            TransportMedium::ALL.iter().map(|m| (*m, 1.0)).collect(),
            FuelType::ALL.iter().map(|f| (*f, 1.0)).collect(),
            DietType::ALL.iter().map(|d| (*d, 1.0)).collect(),
        )
    }

    #[test]
    fn test_new_accepts_complete_table() {
        let (transport, fuel, diet) = complete_maps();
        let table = FactorTable::new(transport, fuel, diet, 0.4, 0.6, 28).unwrap();
        assert_eq!(table.meals_per_period(), 28);
        assert_eq!(table.electricity_factor(), 0.4);
    }

    #[test]
    fn test_new_rejects_missing_category() {
        let (mut transport, fuel, diet) = complete_maps();
        transport.remove(&TransportMedium::Plane);
        let err = FactorTable::new(transport, fuel, diet, 0.5, 0.7, 30).unwrap_err();
        assert!(matches!(err, Error::Config { ref message } if message.contains("Plane")));
    }

    #[test]
    fn test_new_rejects_negative_and_non_finite_factors() {
        let (transport, fuel, mut diet) = complete_maps();
        diet.insert(DietType::Vegan, -1.0);
        assert!(FactorTable::new(transport.clone(), fuel.clone(), diet, 0.5, 0.7, 30).is_err());

        let (_, _, diet) = complete_maps();
        assert!(
            FactorTable::new(transport.clone(), fuel.clone(), diet.clone(), f64::NAN, 0.7, 30)
                .is_err()
        );
        assert!(FactorTable::new(transport, fuel, diet, 0.5, 0.7, 0).is_err());
    }
}
