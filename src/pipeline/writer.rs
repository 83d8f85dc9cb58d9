//! Persists pipeline output as the on-disk CSV layout.
//!
//! Under the output root, one directory per horizon holds a
//! `{lon}_{lat}.csv` per location (comma separated) plus a single
//! `compacted.csv` joining every location with its geometry encoded as WKT
//! (semicolon separated, since WKT itself contains commas). Interpolated
//! daily estimates land in `interpolated.csv` at the root.

use crate::interpolate::InterpolationResult;
use crate::pipeline::error::PipelineError;
use crate::pipeline::LocationDataset;
use crate::series::aggregate::{Horizon, HorizonTable};
use polars::prelude::{Column, CsvWriter, DataFrame, SerWriter};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Date format for CSV cells and filenames.
pub const DATE_FORMAT: &str = "%Y%m%d";

/// Writes datasets beneath a fixed output root.
#[derive(Debug, Clone)]
pub struct DatasetWriter {
    root: PathBuf,
}

impl DatasetWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes one `{lon}_{lat}.csv` per horizon for `dataset`.
    pub fn write_location(&self, dataset: &LocationDataset) -> Result<(), PipelineError> {
        let center = dataset.cell.center;
        let file_name = format!("{}_{}.csv", center.lon, center.lat);
        for table in &dataset.tables {
            let dir = self.horizon_dir(table.horizon)?;
            let path = dir.join(&file_name);
            let mut frame = horizon_frame(table, &path)?;
            write_frame(&mut frame, &path, b',')?;
        }
        Ok(())
    }

    /// Writes each horizon's `compacted.csv`, one row per location and
    /// period, with the cell geometry as WKT columns.
    pub fn write_compacted(&self, datasets: &[LocationDataset]) -> Result<(), PipelineError> {
        for horizon in Horizon::ALL {
            let dir = self.horizon_dir(horizon)?;
            let path = dir.join("compacted.csv");

            let mut center_points: Vec<String> = Vec::new();
            let mut envelopes: Vec<String> = Vec::new();
            let mut regions: Vec<Option<String>> = Vec::new();
            let mut dates: Vec<String> = Vec::new();
            let mut columns: Vec<String> = Vec::new();
            let mut values: Vec<Vec<f64>> = Vec::new();

            for dataset in datasets {
                let Some(table) = dataset.tables.iter().find(|t| t.horizon == horizon) else {
                    continue;
                };
                if columns.is_empty() {
                    columns = table.columns.clone();
                    values = vec![Vec::new(); columns.len()];
                }
                let center_wkt = format!(
                    "POINT ({} {})",
                    dataset.cell.center.lon, dataset.cell.center.lat
                );
                for record in &table.records {
                    center_points.push(center_wkt.clone());
                    envelopes.push(dataset.cell.envelope.to_wkt());
                    regions.push(dataset.cell.region.clone());
                    dates.push(record.period_end.format(DATE_FORMAT).to_string());
                    for (column, value) in values.iter_mut().zip(&record.values) {
                        column.push(*value);
                    }
                }
            }

            let mut frame_columns = vec![
                Column::new("center_point".into(), center_points),
                Column::new("envelope".into(), envelopes),
                Column::new("region".into(), regions),
                Column::new("date".into(), dates),
            ];
            for (name, column) in columns.iter().zip(values) {
                frame_columns.push(Column::new(name.as_str().into(), column));
            }
            let mut frame = DataFrame::new(frame_columns)
                .map_err(|e| PipelineError::OutputEncode(path.clone(), e))?;
            write_frame(&mut frame, &path, b';')?;
        }
        Ok(())
    }

    /// Writes interpolated daily estimates to `interpolated.csv`.
    pub fn write_interpolated(
        &self,
        results: &[InterpolationResult],
        columns: &[String],
    ) -> Result<(), PipelineError> {
        fs::create_dir_all(&self.root)
            .map_err(|e| PipelineError::OutputDirCreation(self.root.clone(), e))?;
        let path = self.root.join("interpolated.csv");

        let mut dates: Vec<String> = Vec::new();
        let mut lats: Vec<f64> = Vec::new();
        let mut lons: Vec<f64> = Vec::new();
        let mut regions: Vec<Option<String>> = Vec::new();
        let mut values: Vec<Vec<f64>> = vec![Vec::new(); columns.len()];

        for result in results {
            dates.push(result.date.format(DATE_FORMAT).to_string());
            lats.push(result.target.lat);
            lons.push(result.target.lon);
            regions.push(result.region.clone());
            for (column, value) in values.iter_mut().zip(&result.values) {
                column.push(*value);
            }
        }

        let mut frame_columns = vec![
            Column::new("date".into(), dates),
            Column::new("lat".into(), lats),
            Column::new("lon".into(), lons),
            Column::new("region".into(), regions),
        ];
        for (name, column) in columns.iter().zip(values) {
            frame_columns.push(Column::new(name.as_str().into(), column));
        }
        let mut frame = DataFrame::new(frame_columns)
            .map_err(|e| PipelineError::OutputEncode(path.clone(), e))?;
        write_frame(&mut frame, &path, b';')
    }

    fn horizon_dir(&self, horizon: Horizon) -> Result<PathBuf, PipelineError> {
        let dir = self.root.join(horizon.dir_name());
        fs::create_dir_all(&dir).map_err(|e| PipelineError::OutputDirCreation(dir.clone(), e))?;
        Ok(dir)
    }
}

fn horizon_frame(table: &HorizonTable, path: &Path) -> Result<DataFrame, PipelineError> {
    let dates: Vec<String> = table
        .records
        .iter()
        .map(|r| r.period_end.format(DATE_FORMAT).to_string())
        .collect();

    let mut frame_columns = vec![Column::new("date".into(), dates)];
    for (i, name) in table.columns.iter().enumerate() {
        let column: Vec<f64> = table.records.iter().map(|r| r.values[i]).collect();
        frame_columns.push(Column::new(name.as_str().into(), column));
    }
    DataFrame::new(frame_columns).map_err(|e| PipelineError::OutputEncode(path.to_path_buf(), e))
}

fn write_frame(frame: &mut DataFrame, path: &Path, separator: u8) -> Result<(), PipelineError> {
    let mut file =
        File::create(path).map_err(|e| PipelineError::OutputIo(path.to_path_buf(), e))?;
    CsvWriter::new(&mut file)
        .with_separator(separator)
        .include_header(true)
        .finish(frame)
        .map_err(|e| PipelineError::OutputEncode(path.to_path_buf(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point::GeoPoint;
    use crate::geometry::polygon::Envelope;
    use crate::grid::builder::Cell;
    use crate::series::aggregate::HorizonRecord;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    fn dataset() -> LocationDataset {
        let center = GeoPoint::new(-7.5, -36.0);
        let table = |horizon| HorizonTable {
            horizon,
            columns: vec!["T2M".to_string()],
            records: vec![HorizonRecord {
                period_end: date(2023, 1, 31),
                values: vec![26.4],
            }],
        };
        LocationDataset {
            cell_index: 0,
            cell: Cell {
                center,
                envelope: Envelope::square(&center, 0.5),
                region: Some("cariri".to_string()),
            },
            tables: Horizon::ALL.iter().map(|&h| table(h)).collect(),
        }
    }

    #[test]
    fn location_files_land_in_horizon_directories() {
        let dir = tempfile::tempdir().expect("temp dir");
        let writer = DatasetWriter::new(dir.path());
        writer.write_location(&dataset()).expect("writable");

        for horizon in Horizon::ALL {
            let path = dir
                .path()
                .join(horizon.dir_name())
                .join("-36_-7.5.csv");
            let body = fs::read_to_string(&path).expect("file written");
            assert!(body.starts_with("date,T2M"), "got {body}");
            assert!(body.contains("20230131,26.4"));
        }
    }

    #[test]
    fn compacted_files_carry_wkt_geometry() {
        let dir = tempfile::tempdir().expect("temp dir");
        let writer = DatasetWriter::new(dir.path());
        writer.write_compacted(&[dataset()]).expect("writable");

        let path = dir.path().join("monthly").join("compacted.csv");
        let body = fs::read_to_string(&path).expect("file written");
        assert!(body.starts_with("center_point;envelope;region;date;T2M"));
        assert!(body.contains("POINT (-36 -7.5)"));
        assert!(body.contains("POLYGON"));
        assert!(body.contains("cariri"));
    }

    #[test]
    fn interpolated_rows_keep_their_coordinates() {
        let dir = tempfile::tempdir().expect("temp dir");
        let writer = DatasetWriter::new(dir.path());
        let results = vec![InterpolationResult {
            target: GeoPoint::new(-7.0, -35.5),
            date: date(2023, 1, 1),
            region: None,
            values: vec![25.0],
        }];
        writer
            .write_interpolated(&results, &["T2M".to_string()])
            .expect("writable");

        let body =
            fs::read_to_string(dir.path().join("interpolated.csv")).expect("file written");
        assert!(body.starts_with("date;lat;lon;region;T2M"));
        assert!(body.contains("20230101;-7.0;-35.5;;25.0"));
    }

}
