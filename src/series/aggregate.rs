//! Multi-horizon temporal aggregation.
//!
//! A repaired daily series is collapsed into six aggregation horizons:
//! calendar month, two-month, three-month, six-month and twelve-month
//! buckets, each right-labeled, plus a single whole-history record keyed by
//! the series' last date. The statistic applied per variable comes from an
//! explicit [`AggregationSpec`] value object injected by the caller.

use crate::series::error::SeriesError;
use crate::series::timeseries::TimeSeries;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use std::fmt;

/// Statistic applied to the values of one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    Mean,
    Min,
    Max,
}

impl Stat {
    pub fn apply(&self, values: &[f64]) -> f64 {
        match self {
            Stat::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Stat::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Stat::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// A synthetic variable that copies a raw variable so it can be aggregated
/// with an extremal statistic instead of the raw variable's primary one.
#[derive(Debug, Clone)]
pub struct ExtremalSpec {
    pub source: String,
    pub name: String,
    pub stat: Stat,
}

/// Per-variable aggregation mapping plus the extremal variants to derive.
///
/// Passed explicitly to [`aggregate`]: there is no process-wide statistic
/// table, so the mapping is overridable per call and trivially testable.
#[derive(Debug, Clone)]
pub struct AggregationSpec {
    stats: Vec<(String, Stat)>,
    extremals: Vec<ExtremalSpec>,
}

impl AggregationSpec {
    pub fn new<I, S>(stats: I) -> Self
    where
        I: IntoIterator<Item = (S, Stat)>,
        S: Into<String>,
    {
        Self {
            stats: stats.into_iter().map(|(n, s)| (n.into(), s)).collect(),
            extremals: Vec::new(),
        }
    }

    /// Adds an extremal variant of `source` named `name`.
    pub fn with_extremal(
        mut self,
        source: impl Into<String>,
        name: impl Into<String>,
        stat: Stat,
    ) -> Self {
        self.extremals.push(ExtremalSpec {
            source: source.into(),
            name: name.into(),
            stat,
        });
        self
    }

    /// The default wind-energy mapping: mean for every raw variable, plus
    /// min-of-min / max-of-max variants for the temperature and wind-speed
    /// extremes.
    pub fn wind_energy_default() -> Self {
        Self::new(
            crate::fetch::client::WIND_ENERGY_VARIABLES
                .iter()
                .map(|v| (*v, Stat::Mean)),
        )
        .with_extremal("T2M_MIN", "T2M_MIN_LOW", Stat::Min)
        .with_extremal("T2M_MAX", "T2M_MAX_PEAK", Stat::Max)
        .with_extremal("WS10M_MAX", "WS10M_MAX_PEAK", Stat::Max)
        .with_extremal("WS50M_MAX", "WS50M_MAX_PEAK", Stat::Max)
        .with_extremal("WS10M_MIN", "WS10M_MIN_LOW", Stat::Min)
        .with_extremal("WS50M_MIN", "WS50M_MIN_LOW", Stat::Min)
    }

    pub fn extremals(&self) -> &[ExtremalSpec] {
        &self.extremals
    }

    /// Output column order: raw variables first, extremal variants after.
    pub fn column_names(&self) -> Vec<String> {
        self.stats
            .iter()
            .map(|(n, _)| n.clone())
            .chain(self.extremals.iter().map(|e| e.name.clone()))
            .collect()
    }

    /// Raw variable names, in spec order (the fetch request list).
    pub fn raw_variables(&self) -> Vec<String> {
        self.stats.iter().map(|(n, _)| n.clone()).collect()
    }

    fn output_stats(&self) -> impl Iterator<Item = (&str, Stat)> {
        self.stats
            .iter()
            .map(|(n, s)| (n.as_str(), *s))
            .chain(self.extremals.iter().map(|e| (e.name.as_str(), e.stat)))
    }
}

/// One of the six temporal aggregation granularities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Horizon {
    Monthly,
    Bimonthly,
    Trimestral,
    Semestral,
    Annual,
    History,
}

impl Horizon {
    pub const ALL: [Horizon; 6] = [
        Horizon::Monthly,
        Horizon::Bimonthly,
        Horizon::Trimestral,
        Horizon::Semestral,
        Horizon::Annual,
        Horizon::History,
    ];

    /// Bucket width in calendar months; `None` for the whole-history bucket.
    pub fn months(&self) -> Option<i32> {
        match self {
            Horizon::Monthly => Some(1),
            Horizon::Bimonthly => Some(2),
            Horizon::Trimestral => Some(3),
            Horizon::Semestral => Some(6),
            Horizon::Annual => Some(12),
            Horizon::History => None,
        }
    }

    /// Directory name used in the persisted layout.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Horizon::Monthly => "monthly",
            Horizon::Bimonthly => "bimonthly",
            Horizon::Trimestral => "trimestral",
            Horizon::Semestral => "semestral",
            Horizon::Annual => "annual",
            Horizon::History => "history",
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

/// One aggregated row: the bucket's period-end date and one value per
/// output column.
#[derive(Debug, Clone, PartialEq)]
pub struct HorizonRecord {
    pub period_end: NaiveDate,
    pub values: Vec<f64>,
}

/// The aggregated table of one horizon for one location.
#[derive(Debug, Clone)]
pub struct HorizonTable {
    pub horizon: Horizon,
    pub columns: Vec<String>,
    pub records: Vec<HorizonRecord>,
}

/// Aggregates a raw daily series into the six horizon tables.
///
/// The input series is repaired (sentinels interpolated away) and extended
/// with the spec's extremal variants before resampling. Buckets with zero
/// observations are omitted, not recorded with nulls.
pub fn aggregate(series: &TimeSeries, spec: &AggregationSpec) -> Result<Vec<HorizonTable>, SeriesError> {
    if series.is_empty() {
        return Err(SeriesError::EmptySeries);
    }

    let mut work = series.clone();
    work.repair_gaps();
    for extremal in spec.extremals() {
        work.duplicate_variable(&extremal.source, &extremal.name)?;
    }

    // (column name, statistic, index into the working series).
    let mut outputs: Vec<(String, Stat, usize)> = Vec::new();
    for (name, stat) in spec.output_stats() {
        let idx = work
            .variables()
            .iter()
            .position(|v| v == name)
            .ok_or_else(|| SeriesError::MissingVariable(name.to_string()))?;
        outputs.push((name.to_string(), stat, idx));
    }

    let columns: Vec<String> = outputs.iter().map(|(n, _, _)| n.clone()).collect();
    let last_date = work.last_date().ok_or(SeriesError::EmptySeries)?;
    let first_month = work
        .first_date()
        .map(month_index)
        .ok_or(SeriesError::EmptySeries)?;

    let tables = Horizon::ALL
        .iter()
        .map(|&horizon| {
            let records = match horizon.months() {
                Some(span) => {
                    resample_calendar(&work, &outputs, first_month, last_date, span)
                }
                None => vec![HorizonRecord {
                    period_end: last_date,
                    values: whole_history(&work, &outputs),
                }],
            };
            HorizonTable {
                horizon,
                columns: columns.clone(),
                records,
            }
        })
        .collect();

    Ok(tables)
}

/// Partitions the date axis into `span`-month calendar buckets anchored at
/// the series' first month, right-labeled by the bucket's calendar end date
/// (capped at the series' last date).
fn resample_calendar(
    series: &TimeSeries,
    outputs: &[(String, Stat, usize)],
    first_month: i32,
    last_date: NaiveDate,
    span: i32,
) -> Vec<HorizonRecord> {
    let mut buckets: BTreeMap<i32, Vec<&[f64]>> = BTreeMap::new();
    for (date, row) in series.rows() {
        let bucket = (month_index(date) - first_month).div_euclid(span);
        buckets.entry(bucket).or_default().push(row);
    }

    buckets
        .into_iter()
        .map(|(bucket, rows)| {
            let nominal_end = month_end(first_month + (bucket + 1) * span - 1);
            HorizonRecord {
                period_end: nominal_end.min(last_date),
                values: apply_stats(&rows, outputs),
            }
        })
        .collect()
}

fn whole_history(series: &TimeSeries, outputs: &[(String, Stat, usize)]) -> Vec<f64> {
    let rows: Vec<&[f64]> = series.rows().map(|(_, row)| row).collect();
    apply_stats(&rows, outputs)
}

fn apply_stats(rows: &[&[f64]], outputs: &[(String, Stat, usize)]) -> Vec<f64> {
    outputs
        .iter()
        .map(|(_, stat, idx)| {
            let column: Vec<f64> = rows.iter().map(|row| row[*idx]).collect();
            stat.apply(&column)
        })
        .collect()
}

fn month_index(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}

/// Last calendar day of the month identified by `month_index`.
fn month_end(month_index: i32) -> NaiveDate {
    let year = month_index.div_euclid(12);
    let month0 = month_index.rem_euclid(12) as u32;
    let (next_year, next_month) = if month0 == 11 {
        (year + 1, 1)
    } else {
        (year, month0 + 2)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .expect("month arithmetic stays in range")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    fn daily_series(start: NaiveDate, values: &[f64]) -> TimeSeries {
        let mut s = TimeSeries::new(["X"]);
        let mut day = start;
        for v in values {
            s.insert(day, vec![*v]).expect("one column");
            day = day.succ_opt().expect("date in range");
        }
        s
    }

    fn mean_spec() -> AggregationSpec {
        AggregationSpec::new([("X", Stat::Mean)])
    }

    fn table<'a>(tables: &'a [HorizonTable], horizon: Horizon) -> &'a HorizonTable {
        tables
            .iter()
            .find(|t| t.horizon == horizon)
            .expect("all six horizons present")
    }

    #[test]
    fn monthly_mean_of_a_full_month() {
        // 31 days of January: exactly one monthly record, equal to the mean.
        let values: Vec<f64> = (1..=31).map(|v| v as f64).collect();
        let s = daily_series(date(2023, 1, 1), &values);
        let tables = aggregate(&s, &mean_spec()).expect("valid spec");

        let monthly = table(&tables, Horizon::Monthly);
        assert_eq!(monthly.records.len(), 1);
        assert_eq!(monthly.records[0].period_end, date(2023, 1, 31));
        assert!((monthly.records[0].values[0] - 16.0).abs() < 1e-9);
    }

    #[test]
    fn one_record_per_calendar_month_present() {
        // 60 days starting Jan 1 span January and February.
        let values: Vec<f64> = vec![1.0; 59];
        let s = daily_series(date(2023, 1, 1), &values);
        let tables = aggregate(&s, &mean_spec()).expect("valid spec");

        let monthly = table(&tables, Horizon::Monthly);
        assert_eq!(monthly.records.len(), 2);
        assert_eq!(monthly.records[0].period_end, date(2023, 1, 31));
        assert_eq!(monthly.records[1].period_end, date(2023, 2, 28));

        // The same span fits in a single bimonthly bucket.
        let bimonthly = table(&tables, Horizon::Bimonthly);
        assert_eq!(bimonthly.records.len(), 1);
        assert_eq!(bimonthly.records[0].period_end, date(2023, 2, 28));
    }

    #[test]
    fn whole_history_is_a_single_record_keyed_by_the_last_date() {
        let s = daily_series(date(2022, 11, 20), &[2.0, 4.0, 6.0]);
        let tables = aggregate(&s, &mean_spec()).expect("valid spec");

        let history = table(&tables, Horizon::History);
        assert_eq!(history.records.len(), 1);
        assert_eq!(history.records[0].period_end, date(2022, 11, 22));
        assert!((history.records[0].values[0] - 4.0).abs() < 1e-9);
    }

    #[test]
    fn every_horizon_ends_on_or_before_the_history_date() {
        let values: Vec<f64> = (0..400).map(|v| v as f64).collect();
        let s = daily_series(date(2022, 3, 15), &values);
        let tables = aggregate(&s, &mean_spec()).expect("valid spec");

        let history_end = table(&tables, Horizon::History).records[0].period_end;
        for t in &tables {
            let latest = t.records.last().expect("no empty tables").period_end;
            assert!(
                latest <= history_end,
                "{} ends {latest}, after history {history_end}",
                t.horizon
            );
        }
    }

    #[test]
    fn buckets_without_observations_are_omitted() {
        // January and March data, nothing in February.
        let mut s = TimeSeries::new(["X"]);
        s.insert(date(2023, 1, 10), vec![1.0]).expect("one column");
        s.insert(date(2023, 3, 10), vec![3.0]).expect("one column");
        let tables = aggregate(&s, &mean_spec()).expect("valid spec");

        let monthly = table(&tables, Horizon::Monthly);
        assert_eq!(monthly.records.len(), 2);
        assert_eq!(monthly.records[0].period_end, date(2023, 1, 31));
        assert_eq!(monthly.records[1].period_end, date(2023, 3, 10));
    }

    #[test]
    fn sentinels_are_repaired_before_aggregation() {
        use crate::series::timeseries::SENTINEL;
        let s = daily_series(date(2023, 1, 1), &[10.0, SENTINEL, 30.0]);
        let tables = aggregate(&s, &mean_spec()).expect("valid spec");
        let history = table(&tables, Horizon::History);
        assert!((history.records[0].values[0] - 20.0).abs() < 1e-9);
    }

    #[test]
    fn extremal_variant_uses_its_own_statistic() {
        let spec = AggregationSpec::new([("T2M_MIN", Stat::Mean)]).with_extremal(
            "T2M_MIN",
            "T2M_MIN_LOW",
            Stat::Min,
        );
        let mut s = TimeSeries::new(["T2M_MIN"]);
        s.insert(date(2023, 1, 1), vec![18.0]).expect("one column");
        s.insert(date(2023, 1, 2), vec![12.0]).expect("one column");
        s.insert(date(2023, 1, 3), vec![15.0]).expect("one column");

        let tables = aggregate(&s, &spec).expect("valid spec");
        let monthly = table(&tables, Horizon::Monthly);
        assert_eq!(monthly.columns, vec!["T2M_MIN", "T2M_MIN_LOW"]);
        assert!((monthly.records[0].values[0] - 15.0).abs() < 1e-9);
        assert_eq!(monthly.records[0].values[1], 12.0);
    }

    #[test]
    fn unknown_variable_is_a_configuration_error() {
        let spec = AggregationSpec::new([("MISSING", Stat::Mean)]);
        let s = daily_series(date(2023, 1, 1), &[1.0]);
        assert!(matches!(
            aggregate(&s, &spec),
            Err(SeriesError::MissingVariable(_))
        ));
    }

    #[test]
    fn empty_series_is_rejected() {
        let s = TimeSeries::new(["X"]);
        assert!(matches!(aggregate(&s, &mean_spec()), Err(SeriesError::EmptySeries)));
    }

    #[test]
    fn month_end_handles_year_rollover() {
        assert_eq!(month_end(month_index(date(2023, 12, 5))), date(2023, 12, 31));
        assert_eq!(month_end(month_index(date(2024, 2, 1))), date(2024, 2, 29));
    }

    #[test]
    fn default_spec_lists_raw_then_extremal_columns() {
        let spec = AggregationSpec::wind_energy_default();
        let columns = spec.column_names();
        assert_eq!(columns.len(), 18);
        assert_eq!(columns[0], "QV2M");
        assert!(columns.contains(&"WS50M_MIN_LOW".to_string()));
        assert_eq!(spec.raw_variables().len(), 12);
    }
}
