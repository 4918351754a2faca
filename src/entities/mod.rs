//! Entity module - Contains all SeaORM entity definitions for the database.
//! Each entity has a Model struct for data and an Entity struct for operations,
//! plus a fallible conversion into the matching domain record.

pub mod footprint_entry;
pub mod monthly_aggregate;

// Re-export specific types to avoid conflicts
pub use footprint_entry::{
    Column as FootprintEntryColumn, Entity as FootprintEntry, Model as FootprintEntryModel,
};
pub use monthly_aggregate::{
    Column as MonthlyAggregateColumn, Entity as MonthlyAggregate, Model as MonthlyAggregateModel,
};
