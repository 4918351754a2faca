//! Domain records shared by the scoring engine, the aggregate updater and the store.

use crate::{
    core::factors::{DietType, FuelType, TransportMedium},
    errors::{Error, Result},
};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw form values as typed by the user. Every field is text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityForm {
    /// Transport medium name, e.g. `"Car"`
    pub transport_medium: String,
    /// Fuel type name, e.g. `"Petrol"`
    pub fuel_type: String,
    /// Diet type name, e.g. `"Meat Heavy"`
    pub diet_type: String,
    /// Hours travelled, free text
    pub hours_traveled: String,
    /// Electricity used in kWh, free text
    pub electricity_consumption: String,
    /// Waste generated in kg, free text
    pub waste_generation: String,
}

impl Default for ActivityForm {
    fn default() -> Self {
        Self {
            transport_medium: TransportMedium::Car.as_str().to_string(),
            fuel_type: FuelType::Petrol.as_str().to_string(),
            diet_type: DietType::Average.as_str().to_string(),
            hours_traveled: String::new(),
            electricity_consumption: String::new(),
            waste_generation: String::new(),
        }
    }
}

impl ActivityForm {
    /// Resolves the category names and coerces the numeric fields.
    ///
    /// Unknown category names are rejected; unparseable numeric text becomes `0`.
    pub fn parse(&self) -> Result<ActivityInput> {
        Ok(ActivityInput {
            transport_medium: self.transport_medium.parse()?,
            fuel_type: self.fuel_type.parse()?,
            diet_type: self.diet_type.parse()?,
            hours_traveled: coerce_amount(&self.hours_traveled),
            electricity_consumption: coerce_amount(&self.electricity_consumption),
            waste_generation: coerce_amount(&self.waste_generation),
        })
    }
}

/// Parses a numeric form field, mapping empty, malformed or non-finite text to `0`.
///
/// Only the leading number is read, so `"12 kWh"` is `12` and `"1,5"` is `1`.
#[must_use]
pub fn coerce_amount(text: &str) -> f64 {
    numeric_prefix(text.trim_start())
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Longest prefix of `text` shaped like a decimal number: sign, digits,
/// fraction, exponent. Empty when there is no mantissa digit.
fn numeric_prefix(text: &str) -> &str {
    let bytes = text.as_bytes();
    let digits_from = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };

    let sign = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let mut end = digits_from(sign);
    let mut mantissa_digits = end - sign;

    if bytes.get(end) == Some(&b'.') {
        let fraction_end = digits_from(end + 1);
        mantissa_digits += fraction_end - end - 1;
        end = fraction_end;
    }
    if mantissa_digits == 0 {
        return "";
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let exponent = end + 1 + usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exponent_end = digits_from(exponent);
        if exponent_end > exponent {
            end = exponent_end;
        }
    }

    text.get(..end).unwrap_or_default()
}

/// One validated activity submission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityInput {
    /// How the user travelled
    pub transport_medium: TransportMedium,
    /// What powered the transport
    pub fuel_type: FuelType,
    /// Typical diet over the period
    pub diet_type: DietType,
    /// Hours travelled
    pub hours_traveled: f64,
    /// Electricity used in kWh
    pub electricity_consumption: f64,
    /// Waste generated in kg
    pub waste_generation: f64,
}

/// Calendar month key for a monthly aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Builds a key, rejecting months outside 1..=12.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::invalid_input(
                "month",
                format!("{month} is not a calendar month (1-12)"),
            ));
        }
        Ok(Self { year, month })
    }

    /// The month containing `date`.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Calendar year.
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// Calendar month, 1-12.
    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.year, self.month)
    }
}

/// An entry about to be persisted; the store assigns its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFootprintEntry {
    /// The scored activity
    pub activity: ActivityInput,
    /// Rounded footprint score
    pub footprint_value: f64,
    /// When the entry was saved
    pub created_at: DateTime<Utc>,
    /// Calendar year the entry counts towards
    pub year: i32,
    /// Calendar month (1-12) the entry counts towards
    pub month: u32,
    /// Day of month the entry was saved on
    pub day: u32,
}

impl NewFootprintEntry {
    /// Monthly aggregate key this entry contributes to.
    pub fn period(&self) -> Result<YearMonth> {
        YearMonth::new(self.year, self.month)
    }
}

/// A persisted footprint submission. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintEntry {
    /// Store-assigned identifier
    pub id: i64,
    /// Owner of the entry
    pub user_id: String,
    /// The scored activity
    pub activity: ActivityInput,
    /// Rounded footprint score
    pub footprint_value: f64,
    /// When the entry was saved
    pub created_at: DateTime<Utc>,
    /// Calendar year the entry counts towards
    pub year: i32,
    /// Calendar month (1-12) the entry counts towards
    pub month: u32,
    /// Day of month the entry was saved on
    pub day: u32,
}

impl FootprintEntry {
    /// Monthly aggregate key this entry contributes to.
    pub fn period(&self) -> Result<YearMonth> {
        YearMonth::new(self.year, self.month)
    }
}

/// Running total, count and average of footprint values for one user-month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    /// Calendar year
    pub year: i32,
    /// Calendar month, 1-12
    pub month: u32,
    /// Sum of all contributing footprint values
    pub total_footprint: f64,
    /// Number of contributing entries, at least 1
    pub count: u32,
    /// `total_footprint / count`
    pub average_footprint: f64,
    /// When the aggregate last changed
    pub last_updated: DateTime<Utc>,
}

impl MonthlyAggregate {
    /// Key of this aggregate.
    pub fn period(&self) -> Result<YearMonth> {
        YearMonth::new(self.year, self.month)
    }
}
