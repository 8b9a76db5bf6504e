pub mod bdew;
pub mod calendar;
pub mod day_types;
pub mod industrial;
pub mod reference_table;
pub mod resolver;
pub mod scaling;
pub mod units;
pub mod vdi;
