pub mod aggregate;
pub mod daily_table;
pub mod error;
pub mod timeseries;
