use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{FetchError, LocateError};
use crate::forecast::{Metric, RawSeries};

const GEOLOCATION_URL: &str = "https://api.ipgeolocation.io/ipgeo";
const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

const USER_AGENT: &str = "wxchart";
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
}

pub trait LocationSource {
    fn detect(&self) -> Result<Location, LocateError>;

    fn search(&self, city: &str) -> Result<Location, LocateError>;
}

pub trait ForecastSource {
    fn fetch(&self, location: &Location, metric: Metric) -> Result<RawSeries, FetchError>;
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub geolocation: String,
    pub geocoding: String,
    pub forecast: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            geolocation: GEOLOCATION_URL.to_string(),
            geocoding: GEOCODING_URL.to_string(),
            forecast: FORECAST_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Providers {
    client: Client,
    endpoints: Endpoints,
    api_key: Option<String>,
}

impl Providers {
    pub fn new(api_key: Option<String>) -> Result<Self, reqwest::Error> {
        Self::with_endpoints(api_key, Endpoints::default())
    }

    pub fn with_endpoints(
        api_key: Option<String>,
        endpoints: Endpoints,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            endpoints,
            api_key,
        })
    }

    fn get_web_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, reqwest::Error> {
        debug!("GET {url} {query:?}");
        self.client
            .get(url)
            .query(query)
            .send()?
            .error_for_status()?
            .json()
    }
}

impl LocationSource for Providers {
    fn detect(&self) -> Result<Location, LocateError> {
        let api_key = self.api_key.as_deref().ok_or(LocateError::MissingApiKey)?;
        let response: geolocation::Response = self
            .get_web_json(&self.endpoints.geolocation, &[("apiKey", api_key)])
            .map_err(LocateError::Detect)?;
        let location = response.into_location()?;
        info!("Detected location {} ({}, {})", location.name, location.latitude, location.longitude);
        Ok(location)
    }

    fn search(&self, city: &str) -> Result<Location, LocateError> {
        let response: geocoding::Response = self
            .get_web_json(
                &self.endpoints.geocoding,
                &[("name", city), ("count", "1"), ("language", "en"), ("format", "json")],
            )
            .map_err(LocateError::Search)?;
        let location = response.into_location(city)?;
        info!("Found {city:?} at {} ({}, {})", location.name, location.latitude, location.longitude);
        Ok(location)
    }
}

impl ForecastSource for Providers {
    fn fetch(&self, location: &Location, metric: Metric) -> Result<RawSeries, FetchError> {
        let latitude = location.latitude.to_string();
        let longitude = location.longitude.to_string();
        let response: hourly::Response = self.get_web_json(
            &self.endpoints.forecast,
            &[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("hourly", metric.key()),
            ],
        )?;
        let series = response.into_raw_series(metric, &location.name)?;
        info!("Fetched {} hourly {} points for {}", series.len(), series.metric().key(), location.name);
        let missing = series.values().iter().filter(|v| !v.is_finite()).count();
        if missing > 0 {
            warn!("{missing} {} readings missing for {}", metric.key(), location.name);
        }
        Ok(series)
    }
}

pub mod geolocation {
    use super::*;

    /// ipgeolocation.io sends coordinates as strings; accept numbers too.
    #[derive(Deserialize, Debug, Clone, PartialEq)]
    #[serde(untagged)]
    pub enum Coordinate {
        Number(f64),
        Text(String),
    }

    impl Coordinate {
        pub fn value(&self) -> Option<f64> {
            let value = match self {
                Self::Number(v) => Some(*v),
                Self::Text(s) => s.trim().parse::<f64>().ok(),
            };
            value.filter(|v| v.is_finite())
        }
    }

    #[derive(Deserialize, Debug)]
    pub struct Response {
        pub latitude: Coordinate,

        pub longitude: Coordinate,

        pub city: Option<String>,
    }

    impl Response {
        pub fn into_location(self) -> Result<Location, LocateError> {
            let (latitude, longitude) = match (self.latitude.value(), self.longitude.value()) {
                (Some(lat), Some(lon)) => (lat, lon),
                _ => {
                    return Err(LocateError::InvalidCoordinates(format!(
                        "{:?}, {:?}",
                        self.latitude, self.longitude
                    )))
                }
            };
            let name = match self.city {
                Some(city) if !city.trim().is_empty() => city,
                _ => format!("{latitude:.2}, {longitude:.2}"),
            };
            Ok(Location {
                latitude,
                longitude,
                name,
            })
        }
    }
}

pub mod geocoding {
    use super::*;

    #[derive(Deserialize, Debug, Default)]
    pub struct Response {
        // Open-Meteo omits the key entirely when nothing matched.
        #[serde(default)]
        pub results: Vec<Place>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Place {
        pub name: Option<String>,

        pub latitude: f64,

        pub longitude: f64,
    }

    impl Response {
        pub fn into_location(self, query: &str) -> Result<Location, LocateError> {
            let place = self
                .results
                .into_iter()
                .next()
                .ok_or_else(|| LocateError::CityNotFound(query.to_string()))?;
            Ok(Location {
                latitude: place.latitude,
                longitude: place.longitude,
                name: place.name.unwrap_or_else(|| query.trim().to_string()),
            })
        }
    }
}

pub mod hourly {
    use super::*;
    use crate::forecast::parse_timestamp;

    #[derive(Deserialize, Debug)]
    pub struct Response {
        pub hourly: Option<Hourly>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Hourly {
        pub time: Vec<String>,

        pub temperature_2m: Option<Vec<Option<f64>>>,

        pub precipitation: Option<Vec<Option<f64>>>,
    }

    impl Response {
        pub fn into_raw_series(self, metric: Metric, location: &str) -> Result<RawSeries, FetchError> {
            let hourly = self
                .hourly
                .ok_or_else(|| FetchError::Malformed("missing hourly block".to_string()))?;
            let values = match metric {
                Metric::Temperature => hourly.temperature_2m,
                Metric::Precipitation => hourly.precipitation,
            }
            .ok_or_else(|| FetchError::Malformed(format!("missing hourly.{}", metric.key())))?;

            let timestamps = hourly
                .time
                .iter()
                .map(|t| {
                    parse_timestamp(t)
                        .map_err(|e| FetchError::Malformed(format!("bad timestamp {t:?}: {e}")))
                })
                .collect::<Result<Vec<_>, _>>()?;
            // null readings stay in place as NaN so the series keeps its shape
            let values = values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();

            RawSeries::new(metric, location, timestamps, values)
        }
    }
}
