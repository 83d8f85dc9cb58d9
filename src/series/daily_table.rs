//! Flat multi-location view of raw daily data.
//!
//! Interpolation works one date at a time: for a given day it needs every
//! location that reported that day, with its values, as a reference pool.
//! [`DailyTable`] stores the fetched per-location series side by side and
//! answers that per-date query.

use crate::geometry::point::GeoPoint;
use crate::interpolate::neighbors::ReferencePoint;
use crate::series::timeseries::TimeSeries;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// One location's row for one date.
#[derive(Debug, Clone)]
pub struct DailyRow {
    pub date: NaiveDate,
    pub location: GeoPoint,
    pub values: Vec<f64>,
}

/// Daily observations of many locations over a shared variable list.
#[derive(Debug, Clone, Default)]
pub struct DailyTable {
    columns: Vec<String>,
    rows: Vec<DailyRow>,
}

impl DailyTable {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Appends every row of `series`, observed at `location`.
    ///
    /// The series is expected to carry exactly the table's columns; rows
    /// with a different width are skipped with a warning rather than
    /// poisoning the pool.
    pub fn push_series(&mut self, location: GeoPoint, series: &TimeSeries) {
        for (date, values) in series.rows() {
            if values.len() != self.columns.len() {
                log::warn!(
                    "skipping {date} at {location}: {} values, table has {} columns",
                    values.len(),
                    self.columns.len()
                );
                continue;
            }
            self.rows.push(DailyRow {
                date,
                location,
                values: values.to_vec(),
            });
        }
    }

    /// All distinct dates present, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let set: BTreeSet<NaiveDate> = self.rows.iter().map(|r| r.date).collect();
        set.into_iter().collect()
    }

    /// The reference pool for one date: every location that reported it.
    pub fn pool_for(&self, date: NaiveDate) -> Vec<ReferencePoint> {
        self.rows
            .iter()
            .filter(|r| r.date == date)
            .map(|r| ReferencePoint {
                location: r.location,
                values: r.values.clone(),
            })
            .collect()
    }
}
