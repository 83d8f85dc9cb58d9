//! HTTP client for the NASA POWER single-point temporal API.

use crate::fetch::error::FetchError;
use crate::geometry::point::GeoPoint;
use crate::series::timeseries::{TimeSeries, SENTINEL};
use bon::bon;
use chrono::NaiveDate;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::future::Future;
use std::time::Duration;

/// Raw variables requested for wind-energy site assessment.
pub const WIND_ENERGY_VARIABLES: [&str; 12] = [
    "QV2M",
    "RH2M",
    "PS",
    "T2M",
    "T2M_MIN",
    "T2M_MAX",
    "WS10M",
    "WS50M",
    "WS10M_MAX",
    "WS50M_MAX",
    "WS10M_MIN",
    "WS50M_MIN",
];

const DEFAULT_BASE_URL: &str = "https://power.larc.nasa.gov";
const DATE_PARAM_FORMAT: &str = "%Y%m%d";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Temporal granularity of a point request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Granularity {
    #[default]
    Daily,
    Monthly,
    Climatology,
}

impl Granularity {
    pub fn path_segment(&self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Monthly => "monthly",
            Granularity::Climatology => "climatology",
        }
    }
}

/// One point-data request: where, which variables, which date window.
#[derive(Debug, Clone)]
pub struct PointQuery {
    pub location: GeoPoint,
    pub variables: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Anything able to produce a raw daily series for a point.
///
/// The orchestrator is generic over this seam, so tests drive it with an
/// in-memory source instead of the live service.
pub trait DailyPointSource: Sync {
    fn fetch_daily(
        &self,
        query: PointQuery,
    ) -> impl Future<Output = Result<TimeSeries, FetchError>> + Send;
}

/// Client for the POWER API's `SinglePoint` endpoint.
#[derive(Debug, Clone)]
pub struct PowerClient {
    http: Client,
    base_url: String,
    community: String,
    user: String,
}

#[bon]
impl PowerClient {
    /// Creates a client.
    ///
    /// All parameters are optional: `base_url` defaults to the public POWER
    /// host, `community` to the renewable-energy community tag `"SB"` and
    /// `user` to `"climgrid"`.
    ///
    /// # Example
    ///
    /// ```
    /// use climgrid::PowerClient;
    ///
    /// let client = PowerClient::builder().build();
    /// let staging = PowerClient::builder()
    ///     .base_url("https://staging.example.org")
    ///     .build();
    /// ```
    #[builder]
    pub fn new(
        #[builder(into)] base_url: Option<String>,
        #[builder(into)] community: Option<String>,
        #[builder(into)] user: Option<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            community: community.unwrap_or_else(|| "SB".to_string()),
            user: user.unwrap_or_else(|| "climgrid".to_string()),
        }
    }

    fn endpoint(&self, granularity: Granularity) -> String {
        format!(
            "{}/api/temporal/{}/point",
            self.base_url,
            granularity.path_segment()
        )
    }

    async fn request_point(
        &self,
        granularity: Granularity,
        query: &PointQuery,
    ) -> Result<PointResponse, FetchError> {
        let url = self.endpoint(granularity);
        let params = [
            ("start", query.start.format(DATE_PARAM_FORMAT).to_string()),
            ("end", query.end.format(DATE_PARAM_FORMAT).to_string()),
            ("latitude", query.location.lat.to_string()),
            ("longitude", query.location.lon.to_string()),
            ("community", self.community.clone()),
            ("parameters", query.variables.join(",")),
            ("request", "execute".to_string()),
            ("identifier", "SinglePoint".to_string()),
            ("user", self.user.clone()),
        ];

        debug!(
            "requesting {} {} for {} ({} variables)",
            granularity.path_segment(),
            query.location,
            query.start,
            query.variables.len()
        );

        let response = self
            .http
            .get(&url)
            .query(&params)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout(url.clone())
                } else {
                    FetchError::Network(url.clone(), e)
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::GATEWAY_TIMEOUT {
            return Err(FetchError::Overloaded(status));
        }
        if !status.is_success() {
            return Err(FetchError::Service(status));
        }

        response.json().await.map_err(FetchError::Decode)
    }
}

impl DailyPointSource for PowerClient {
    async fn fetch_daily(&self, query: PointQuery) -> Result<TimeSeries, FetchError> {
        let response = self.request_point(Granularity::Daily, &query).await?;
        response.into_series(&query.variables)
    }
}

#[derive(Debug, Deserialize)]
struct PointResponse {
    properties: PointProperties,
}

#[derive(Debug, Deserialize)]
struct PointProperties {
    /// variable name -> date string (`YYYYMMDD`) -> value.
    parameter: HashMap<String, BTreeMap<String, f64>>,
}

impl PointResponse {
    /// Rearranges the per-variable maps into one row per date.
    ///
    /// Rows cover the union of all dates reported; a variable with no value
    /// for a date contributes the sentinel, to be repaired downstream.
    fn into_series(self, variables: &[String]) -> Result<TimeSeries, FetchError> {
        for variable in variables {
            if !self.properties.parameter.contains_key(variable) {
                return Err(FetchError::MissingVariable(variable.clone()));
            }
        }

        let mut dates: BTreeSet<NaiveDate> = BTreeSet::new();
        for values in self.properties.parameter.values() {
            for raw in values.keys() {
                let date = NaiveDate::parse_from_str(raw, DATE_PARAM_FORMAT)
                    .map_err(|_| FetchError::BadDate(raw.clone()))?;
                dates.insert(date);
            }
        }

        let mut rows: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        for date in dates {
            let key = date.format(DATE_PARAM_FORMAT).to_string();
            let row: Vec<f64> = variables
                .iter()
                .map(|v| {
                    self.properties
                        .parameter
                        .get(v)
                        .and_then(|m| m.get(&key))
                        .copied()
                        .unwrap_or(SENTINEL)
                })
                .collect();
            rows.insert(date, row);
        }
        Ok(TimeSeries::from_rows(variables.to_vec(), rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    const FIXTURE: &str = r#"{
        "type": "Feature",
        "geometry": { "type": "Point", "coordinates": [-34.845, -7.1195, 10.0] },
        "properties": {
            "parameter": {
                "T2M":   { "20230101": 26.4, "20230102": 27.1 },
                "WS50M": { "20230101": 8.2 }
            }
        }
    }"#;

    #[test]
    fn response_rows_cover_the_union_of_dates() {
        let response: PointResponse = serde_json::from_str(FIXTURE).expect("valid fixture");
        let series = response
            .into_series(&["T2M".to_string(), "WS50M".to_string()])
            .expect("variables present");

        assert_eq!(series.len(), 2);
        assert_eq!(series.value(date(2023, 1, 1), "WS50M"), Some(8.2));
        assert_eq!(series.value(date(2023, 1, 2), "T2M"), Some(27.1));
        // WS50M has no value for the second date: sentinel.
        assert_eq!(series.value(date(2023, 1, 2), "WS50M"), Some(SENTINEL));
    }

    #[test]
    fn missing_variables_are_reported_by_name() {
        let response: PointResponse = serde_json::from_str(FIXTURE).expect("valid fixture");
        let err = response
            .into_series(&["T2M".to_string(), "PS".to_string()])
            .expect_err("PS is absent");
        assert!(matches!(err, FetchError::MissingVariable(name) if name == "PS"));
    }

    #[test]
    fn malformed_dates_are_rejected() {
        let raw = r#"{ "properties": { "parameter": { "T2M": { "not-a-date": 1.0 } } } }"#;
        let response: PointResponse = serde_json::from_str(raw).expect("valid json");
        let err = response
            .into_series(&["T2M".to_string()])
            .expect_err("bad date key");
        assert!(matches!(err, FetchError::BadDate(_)));
    }

    #[test]
    fn endpoint_paths_follow_the_granularity() {
        let client = PowerClient::builder().base_url("https://example.org").build();
        assert_eq!(
            client.endpoint(Granularity::Daily),
            "https://example.org/api/temporal/daily/point"
        );
        assert_eq!(
            client.endpoint(Granularity::Climatology),
            "https://example.org/api/temporal/climatology/point"
        );
    }
}
