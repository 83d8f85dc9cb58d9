//! Per-location daily time series with sentinel-gap repair.

use crate::series::error::SeriesError;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Reserved numeric flag marking a missing observation in raw input data.
pub const SENTINEL: f64 = -999.0;

/// A per-location daily series: one row of variable values per calendar
/// date, kept sorted by date.
///
/// Raw rows may contain the [`SENTINEL`] value; [`TimeSeries::repair_gaps`]
/// must run before aggregation consumes the series.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    variables: Vec<String>,
    rows: BTreeMap<NaiveDate, Vec<f64>>,
}

impl TimeSeries {
    pub fn new<I, S>(variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            variables: variables.into_iter().map(Into::into).collect(),
            rows: BTreeMap::new(),
        }
    }

    /// Builds a series from pre-assembled rows. The caller guarantees every
    /// row has one value per variable.
    pub(crate) fn from_rows(variables: Vec<String>, rows: BTreeMap<NaiveDate, Vec<f64>>) -> Self {
        Self { variables, rows }
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.keys().next_back().copied()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.keys().copied()
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = (NaiveDate, &[f64])> + '_ {
        self.rows.iter().map(|(d, v)| (*d, v.as_slice()))
    }

    /// Inserts (or replaces) the row for `date`. The value count must match
    /// the variable count.
    pub fn insert(&mut self, date: NaiveDate, values: Vec<f64>) -> Result<(), SeriesError> {
        if values.len() != self.variables.len() {
            return Err(SeriesError::ColumnMismatch {
                expected: self.variables.len(),
                found: values.len(),
            });
        }
        self.rows.insert(date, values);
        Ok(())
    }

    fn variable_index(&self, name: &str) -> Result<usize, SeriesError> {
        self.variables
            .iter()
            .position(|v| v == name)
            .ok_or_else(|| SeriesError::MissingVariable(name.to_string()))
    }

    pub fn value(&self, date: NaiveDate, variable: &str) -> Option<f64> {
        let idx = self.variables.iter().position(|v| v == variable)?;
        self.rows.get(&date).map(|row| row[idx])
    }

    /// Appends a synthetic variable whose values copy `source` row by row.
    ///
    /// Used for the extremal variants: the copy is aggregated with min/max
    /// while the source keeps its primary statistic.
    pub fn duplicate_variable(&mut self, source: &str, name: &str) -> Result<(), SeriesError> {
        if self.variables.iter().any(|v| v == name) {
            return Err(SeriesError::DuplicateVariable(name.to_string()));
        }
        let src = self.variable_index(source)?;
        for row in self.rows.values_mut() {
            let v = row[src];
            row.push(v);
        }
        self.variables.push(name.to_string());
        Ok(())
    }

    /// Replaces every sentinel with a value linearly interpolated between
    /// the nearest non-sentinel observations, per variable.
    ///
    /// Rows are equally spaced (daily), so the interpolation is positional.
    /// Leading and trailing sentinel runs copy the nearest interior
    /// observation. A variable with no real observation at all is left
    /// untouched. Running the repair twice is a no-op.
    pub fn repair_gaps(&mut self) {
        let n = self.rows.len();
        if n == 0 {
            return;
        }

        for col in 0..self.variables.len() {
            let mut values: Vec<f64> = self.rows.values().map(|row| row[col]).collect();
            repair_column(&mut values);
            for (row, v) in self.rows.values_mut().zip(values) {
                row[col] = v;
            }
        }
    }
}

fn repair_column(values: &mut [f64]) {
    let known: Vec<usize> = values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v != SENTINEL)
        .map(|(i, _)| i)
        .collect();
    if known.is_empty() {
        return;
    }

    let first = known[0];
    let last = *known.last().expect("known is non-empty");

    for i in 0..first {
        values[i] = values[first];
    }
    for i in (last + 1)..values.len() {
        values[i] = values[last];
    }

    for pair in known.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if hi - lo <= 1 {
            continue;
        }
        let (v_lo, v_hi) = (values[lo], values[hi]);
        let span = (hi - lo) as f64;
        for i in (lo + 1)..hi {
            let t = (i - lo) as f64 / span;
            values[i] = v_lo + t * (v_hi - v_lo);
        }
    }
}
