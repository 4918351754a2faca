//! Footprint scoring.
//!
//! Turns one [`ActivityInput`] into a footprint value using a [`FactorTable`].
//! Scoring is pure: no I/O, no logging, same input always gives the same score.

use crate::{
    core::factors::FactorTable,
    errors::{Error, Result},
    models::ActivityInput,
};
use serde::{Deserialize, Serialize};

/// Per-category emissions for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FootprintBreakdown {
    /// `hours * transport factor * fuel factor`
    pub transport: f64,
    /// `kWh * electricity factor`
    pub electricity: f64,
    /// `diet factor * meals per period`
    pub diet: f64,
    /// `kg * waste factor`
    pub waste: f64,
    /// Sum of the four categories, rounded to two decimals
    pub total: f64,
}

/// Computes the rounded footprint score for `input`.
///
/// Negative or non-finite amounts are rejected rather than clamped.
pub fn compute_footprint(input: &ActivityInput, factors: &FactorTable) -> Result<f64> {
    compute_breakdown(input, factors).map(|breakdown| breakdown.total)
}

/// Computes each category's emissions and the rounded total.
pub fn compute_breakdown(input: &ActivityInput, factors: &FactorTable) -> Result<FootprintBreakdown> {
    let hours = ensure_amount("hours_traveled", input.hours_traveled)?;
    let electricity_kwh = ensure_amount("electricity_consumption", input.electricity_consumption)?;
    let waste_kg = ensure_amount("waste_generation", input.waste_generation)?;

    let transport = hours
        * factors.transport_factor(input.transport_medium)?
        * factors.fuel_factor(input.fuel_type)?;
    let electricity = electricity_kwh * factors.electricity_factor();
    let diet = factors.diet_factor(input.diet_type)? * f64::from(factors.meals_per_period());
    let waste = waste_kg * factors.waste_factor();

    Ok(FootprintBreakdown {
        transport,
        electricity,
        diet,
        waste,
        total: round_to_hundredths(transport + electricity + diet + waste),
    })
}

/// Rounds to two decimal places, halves away from zero.
#[must_use]
pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn ensure_amount(field: &str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(Error::invalid_input(field, "must be a finite number"));
    }
    if value < 0.0 {
        return Err(Error::invalid_input(
            field,
            format!("must not be negative (got {value})"),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::factors::{DietType, FuelType, TransportMedium};
    use crate::test_utils::sample_input;
    use proptest::prelude::*;

    #[test]
    fn test_reference_scenario_scores_181_4() {
        let input = sample_input(10.0, 100.0, 5.0);
        let breakdown = compute_breakdown(&input, &FactorTable::default()).unwrap();

        assert!((breakdown.transport - 52.9).abs() < 1e-9);
        assert_eq!(breakdown.electricity, 50.0);
        assert_eq!(breakdown.diet, 75.0);
        assert_eq!(breakdown.waste, 3.5);
        assert_eq!(breakdown.total, 181.4);
        assert_eq!(
            compute_footprint(&input, &FactorTable::default()).unwrap(),
            181.4
        );
    }

    #[test]
    fn test_zero_amounts_score_the_diet_constant() {
        let factors = FactorTable::default();
        for diet in DietType::ALL {
            let input = ActivityInput {
                diet_type: diet,
                ..sample_input(0.0, 0.0, 0.0)
            };
            let expected = round_to_hundredths(factors.diet_factor(diet).unwrap() * 30.0);
            assert_eq!(compute_footprint(&input, &factors).unwrap(), expected);
        }
    }

    #[test]
    fn test_bicycle_travel_adds_nothing() {
        let input = ActivityInput {
            transport_medium: TransportMedium::Bicycle,
            fuel_type: FuelType::Diesel,
            ..sample_input(40.0, 0.0, 0.0)
        };
        assert_eq!(compute_footprint(&input, &FactorTable::default()).unwrap(), 75.0);
    }

    #[test]
    fn test_rounding_is_half_away_from_zero() {
        assert_eq!(round_to_hundredths(0.125), 0.13);
        assert_eq!(round_to_hundredths(0.375), 0.38);
        assert_eq!(round_to_hundredths(52.899_999_999), 52.9);
        assert_eq!(round_to_hundredths(0.0), 0.0);
    }

    #[test]
    fn test_negative_amount_is_rejected() {
        let input = sample_input(-1.0, 0.0, 0.0);
        let err = compute_footprint(&input, &FactorTable::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidInputKind { ref field, .. } if field == "hours_traveled"
        ));

        let input = sample_input(0.0, 0.0, -0.5);
        assert!(compute_footprint(&input, &FactorTable::default()).is_err());
    }

    #[test]
    fn test_non_finite_amount_is_rejected() {
        let input = sample_input(0.0, f64::INFINITY, 0.0);
        let err = compute_footprint(&input, &FactorTable::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidInputKind { ref field, .. } if field == "electricity_consumption"
        ));
    }

    fn transport_strategy() -> impl Strategy<Value = TransportMedium> {
        prop::sample::select(TransportMedium::ALL.to_vec())
    }

    fn fuel_strategy() -> impl Strategy<Value = FuelType> {
        prop::sample::select(FuelType::ALL.to_vec())
    }

    fn diet_strategy() -> impl Strategy<Value = DietType> {
        prop::sample::select(DietType::ALL.to_vec())
    }

    proptest! {
        /// Property: raising any single amount never lowers the score.
        #[test]
        fn score_is_monotonic_in_each_amount(
            medium in transport_strategy(),
            fuel in fuel_strategy(),
            diet in diet_strategy(),
            hours in 0.0f64..1_000.0,
            kwh in 0.0f64..10_000.0,
            waste in 0.0f64..1_000.0,
            bump in 0.0f64..500.0,
        ) {
            let factors = FactorTable::default();
            let base = ActivityInput {
                transport_medium: medium,
                fuel_type: fuel,
                diet_type: diet,
                hours_traveled: hours,
                electricity_consumption: kwh,
                waste_generation: waste,
            };
            let score = compute_footprint(&base, &factors).unwrap();

            let more_hours = ActivityInput { hours_traveled: hours + bump, ..base };
            let more_kwh = ActivityInput { electricity_consumption: kwh + bump, ..base };
            let more_waste = ActivityInput { waste_generation: waste + bump, ..base };

            prop_assert!(compute_footprint(&more_hours, &factors).unwrap() >= score);
            prop_assert!(compute_footprint(&more_kwh, &factors).unwrap() >= score);
            prop_assert!(compute_footprint(&more_waste, &factors).unwrap() >= score);
        }

        /// Property: scoring is deterministic.
        #[test]
        fn score_is_deterministic(hours in 0.0f64..1_000.0, kwh in 0.0f64..1_000.0) {
            let input = sample_input(hours, kwh, 1.0);
            let factors = FactorTable::default();
            prop_assert_eq!(
                compute_footprint(&input, &factors).unwrap(),
                compute_footprint(&input, &factors).unwrap()
            );
        }
    }
}
