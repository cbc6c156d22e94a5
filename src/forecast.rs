use chrono::{DateTime, NaiveDateTime};
use clap::ValueEnum;

use crate::error::FetchError;
use crate::units::temperature;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Metric {
    Temperature,
    Precipitation,
}

impl Metric {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Temperature => "temperature_2m",
            Self::Precipitation => "precipitation",
        }
    }

    pub fn label_base(&self) -> &'static str {
        match self {
            Self::Temperature => "Temperature",
            Self::Precipitation => "Precipitation",
        }
    }

    pub fn has_unit(&self) -> bool {
        matches!(self, Self::Temperature)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Unit {
    #[default]
    Kelvin,
    Celsius,
    Fahrenheit,
}

impl Unit {
    pub const ALL: [Unit; 3] = [Unit::Kelvin, Unit::Celsius, Unit::Fahrenheit];

    pub fn convert(&self, celsius: f64) -> f64 {
        match self {
            Self::Kelvin => temperature::c2k(celsius),
            Self::Celsius => temperature::c2c(celsius),
            Self::Fahrenheit => temperature::c2f(celsius),
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Kelvin => "K",
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Kelvin => "Kelvin",
            Self::Celsius => "Celsius",
            Self::Fahrenheit => "Fahrenheit",
        }
    }

    pub fn palette(&self) -> Palette {
        match self {
            // khaki
            Self::Kelvin => Palette::new(Rgba::rgb(240, 230, 140), Rgba::new(240, 230, 140, 0.2)),
            // cyan
            Self::Celsius => Palette::new(Rgba::rgb(0, 255, 255), Rgba::new(0, 255, 255, 0.2)),
            // fuchsia
            Self::Fahrenheit => Palette::new(Rgba::rgb(255, 0, 255), Rgba::new(255, 0, 255, 0.2)),
        }
    }
}

const PRECIPITATION_SUFFIX: &str = "mm";

const PRECIPITATION_PALETTE: Palette = Palette::new(
    Rgba::rgb(0x41, 0x69, 0xe1),
    Rgba::new(0x41, 0x69, 0xe1, 0.2),
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ForecastWindow {
    #[default]
    #[value(name = "24h")]
    H24,
    #[value(name = "48h")]
    H48,
    #[value(name = "72h")]
    H72,
    #[value(name = "168h")]
    H168,
}

impl ForecastWindow {
    pub const ALL: [ForecastWindow; 4] = [Self::H24, Self::H48, Self::H72, Self::H168];

    pub fn hours(&self) -> usize {
        match self {
            Self::H24 => 24,
            Self::H48 => 48,
            Self::H72 => 72,
            Self::H168 => 168,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::H24 => "24h",
            Self::H48 => "48h",
            Self::H72 => "72h",
            Self::H168 => "168h",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::H24 => "Next 24 Hours",
            Self::H48 => "Next 2 Days",
            Self::H72 => "Next 3 Days",
            Self::H168 => "Next Week",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, alpha: f32) -> Self {
        Self { r, g, b, alpha }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 1.0)
    }

    pub fn css(&self) -> String {
        if self.alpha >= 1.0 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.alpha)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub stroke: Rgba,
    pub fill: Rgba,
}

impl Palette {
    pub const fn new(stroke: Rgba, fill: Rgba) -> Self {
        Self { stroke, fill }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawSeries {
    metric: Metric,
    location: String,
    timestamps: Vec<NaiveDateTime>,
    values: Vec<f64>,
}

impl RawSeries {
    pub fn new(
        metric: Metric,
        location: impl Into<String>,
        timestamps: Vec<NaiveDateTime>,
        values: Vec<f64>,
    ) -> Result<Self, FetchError> {
        if timestamps.len() != values.len() {
            return Err(FetchError::Malformed(format!(
                "{} timestamps but {} values",
                timestamps.len(),
                values.len()
            )));
        }
        if let Some(pair) = timestamps.windows(2).find(|w| w[0] >= w[1]) {
            return Err(FetchError::Malformed(format!(
                "timestamps out of order at {} -> {}",
                pair[0], pair[1]
            )));
        }
        Ok(Self {
            metric,
            location: location.into(),
            timestamps,
            values,
        })
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub series_label: String,
    pub values: Vec<f64>,
    pub stroke: Rgba,
    pub fill: Rgba,
}

/// `unit` only matters for temperature; without one the series stays in Celsius.
/// Windows longer than the series truncate. Never mutates `raw`.
pub fn transform(raw: &RawSeries, window: ForecastWindow, unit: Option<Unit>) -> ChartSeries {
    let hours = window.hours().min(raw.len());

    let labels = raw.timestamps[..hours].iter().map(format_label).collect();

    let (values, suffix, palette) = match raw.metric {
        Metric::Temperature => {
            let unit = unit.unwrap_or(Unit::Celsius);
            let values: Vec<f64> = raw.values[..hours].iter().map(|v| unit.convert(*v)).collect();
            (values, unit.suffix(), unit.palette())
        }
        Metric::Precipitation => (
            raw.values[..hours].to_vec(),
            PRECIPITATION_SUFFIX,
            PRECIPITATION_PALETTE,
        ),
    };

    ChartSeries {
        labels,
        series_label: format!("{} in {} ({})", raw.metric.label_base(), raw.location, suffix),
        values,
        stroke: palette.stroke,
        fill: palette.fill,
    }
}

pub fn format_label(ts: &NaiveDateTime) -> String {
    ts.format("%b %-d, %I %p").to_string()
}

// Open-Meteo sends wall-clock `YYYY-MM-DDTHH:MM`; RFC 3339 keeps its own offset.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.naive_local()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn hourly(metric: Metric, values: Vec<f64>) -> RawSeries {
        let start = NaiveDate::from_ymd_opt(2024, 10, 17)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let timestamps = (0..values.len())
            .map(|i| start + Duration::hours(i as i64))
            .collect();
        RawSeries::new(metric, "Madison", timestamps, values).unwrap()
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err = RawSeries::new(Metric::Temperature, "x", vec![], vec![1.0]).unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn test_unordered_timestamps_rejected() {
        let at = |h| {
            NaiveDate::from_ymd_opt(2024, 10, 17)
                .unwrap()
                .and_hms_opt(h, 0, 0)
                .unwrap()
        };
        let shuffled = RawSeries::new(
            Metric::Temperature,
            "x",
            vec![at(5), at(1), at(3)],
            vec![1.0, 2.0, 3.0],
        );
        assert!(matches!(shuffled, Err(FetchError::Malformed(_))));

        let repeated = RawSeries::new(Metric::Temperature, "x", vec![at(1), at(1)], vec![1.0, 2.0]);
        assert!(matches!(repeated, Err(FetchError::Malformed(_))));
    }

    #[test]
    fn test_window_length_is_min_of_hours_and_series() {
        for n in [0, 1, 10, 24, 100, 200] {
            let raw = hourly(Metric::Temperature, vec![1.0; n]);
            for window in ForecastWindow::ALL {
                let chart = transform(&raw, window, Some(Unit::Celsius));
                let expected = window.hours().min(n);
                assert_eq!(chart.labels.len(), expected);
                assert_eq!(chart.values.len(), expected);
            }
        }
    }

    #[test]
    fn test_week_window_truncates_short_series() {
        let raw = hourly(Metric::Precipitation, (0..10).map(f64::from).collect());
        let chart = transform(&raw, ForecastWindow::H168, None);
        assert_eq!(chart.values.len(), 10);
        assert_eq!(chart.values, raw.values());
    }

    #[test]
    fn test_fahrenheit_scenario() {
        let raw = hourly(Metric::Temperature, vec![0.0, 100.0]);
        let chart = transform(&raw, ForecastWindow::H24, Some(Unit::Fahrenheit));
        assert_eq!(chart.values, vec![32.0, 212.0]);
        assert_eq!(chart.series_label, "Temperature in Madison (°F)");
        assert_eq!(chart.stroke, Unit::Fahrenheit.palette().stroke);
    }

    #[test]
    fn test_kelvin_scenario() {
        let raw = hourly(Metric::Temperature, vec![0.0]);
        let chart = transform(&raw, ForecastWindow::H24, Some(Unit::Kelvin));
        assert_eq!(chart.values, vec![273.15]);
        assert_eq!(chart.series_label, "Temperature in Madison (K)");
    }

    #[test]
    fn test_celsius_is_identity() {
        let raw = hourly(Metric::Temperature, vec![-3.5, 0.0, 18.25]);
        let chart = transform(&raw, ForecastWindow::H24, Some(Unit::Celsius));
        assert_eq!(chart.values, raw.values());
        assert_eq!(chart.series_label, "Temperature in Madison (°C)");
    }

    #[test]
    fn test_missing_unit_defaults_to_celsius() {
        let raw = hourly(Metric::Temperature, vec![12.0]);
        assert_eq!(
            transform(&raw, ForecastWindow::H24, None),
            transform(&raw, ForecastWindow::H24, Some(Unit::Celsius))
        );
    }

    #[test]
    fn test_repeat_transform_does_not_accumulate() {
        let raw = hourly(Metric::Temperature, vec![5.0, 6.0, 7.0]);
        let snapshot = raw.clone();
        let first = transform(&raw, ForecastWindow::H48, Some(Unit::Fahrenheit));
        let second = transform(&raw, ForecastWindow::H48, Some(Unit::Fahrenheit));
        assert_eq!(first, second);
        assert_eq!(raw, snapshot);
    }

    #[test]
    fn test_toggle_back_restores_output() {
        let raw = hourly(Metric::Temperature, vec![20.0; 30]);
        let before = transform(&raw, ForecastWindow::H24, Some(Unit::Celsius));
        let _ = transform(&raw, ForecastWindow::H72, Some(Unit::Kelvin));
        let after = transform(&raw, ForecastWindow::H24, Some(Unit::Celsius));
        assert_eq!(before, after);
    }

    #[test]
    fn test_precipitation_ignores_unit() {
        let raw = hourly(Metric::Precipitation, vec![0.0, 1.2, 0.4]);
        let chart = transform(&raw, ForecastWindow::H24, Some(Unit::Fahrenheit));
        assert_eq!(chart.values, vec![0.0, 1.2, 0.4]);
        assert_eq!(chart.series_label, "Precipitation in Madison (mm)");
        assert_eq!(chart.stroke.css(), "#4169e1");
        assert_eq!(chart.fill.css(), "rgba(65, 105, 225, 0.2)");
    }

    #[test]
    fn test_non_finite_values_propagate() {
        let raw = hourly(Metric::Temperature, vec![f64::NAN, 1.0]);
        let chart = transform(&raw, ForecastWindow::H24, Some(Unit::Kelvin));
        assert!(chart.values[0].is_nan());
        assert_eq!(chart.values[1], 274.15);
    }

    #[test]
    fn test_label_format() {
        let raw = hourly(Metric::Temperature, vec![0.0; 16]);
        let chart = transform(&raw, ForecastWindow::H24, None);
        assert_eq!(chart.labels[0], "Oct 17, 12 AM");
        assert_eq!(chart.labels[15], "Oct 17, 03 PM");
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(13, 0, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2024-01-02T13:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-01-02T13:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-01-02T13:00:00+05:00").unwrap(), expected);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_unit_palettes_are_distinct() {
        let strokes: Vec<String> = Unit::ALL.iter().map(|u| u.palette().stroke.css()).collect();
        assert_eq!(strokes, vec!["#f0e68c", "#00ffff", "#ff00ff"]);
    }
}
