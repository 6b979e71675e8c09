//! The farm database: two SQLite tables the assistant answers questions from.
//!
//! - `Crops`: monthly yield and target per crop
//! - `Wages`: monthly wage and hours per employee
//!
//! [`FarmDatabase`] implements [`fieldhand_core::SqlExecutor`] so the SQL
//! tools can run model-generated queries against it.

pub mod csv_import;
pub mod sqlite;

pub use csv_import::{CropRecord, WageRecord, parse_crops, parse_wages};
pub use sqlite::{FarmDatabase, RowCounts, clean_query};
