use std::path::PathBuf;

use clap::builder::{styling::AnsiColor, Styles};
use clap::Parser;

use crate::forecast::{ForecastWindow, Metric, Unit};

const ABOUT: &str = "Hourly temperature and precipitation charts in the terminal";

const LONG_ABOUT: &str = "
Charts the hourly temperature and precipitation forecast for a city, using Open-Meteo for
geocoding and forecasts.

Without a CITY the location is detected from your IP address via ipgeolocation.io, which needs an
API key (--api-key or IPGEOLOCATION_API_KEY). Searching by city works without one.

Keys: Tab switch chart, k/c/f unit, 1-4 forecast window, / search, r detect again, q quit.
";

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default())
    .usage(AnsiColor::Green.on_default())
    .literal(AnsiColor::Green.on_default())
    .placeholder(AnsiColor::Green.on_default());

#[derive(Parser, Debug)]
#[command(version, styles=STYLES, about=ABOUT, long_about = LONG_ABOUT)]
pub struct Args {
    #[arg(help = "City to chart instead of detecting the location (e.g. Madison, Oslo)")]
    pub city: Option<String>,

    #[arg(long, value_enum, default_value_t = Metric::Temperature, help = "Chart shown first")]
    pub metric: Metric,

    #[arg(long, value_enum, default_value_t = Unit::Kelvin, help = "Temperature unit")]
    pub unit: Unit,

    #[arg(long, value_enum, default_value_t = ForecastWindow::H24, help = "Forecast window")]
    pub duration: ForecastWindow,

    #[arg(long, env = "IPGEOLOCATION_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, help = "Print the chart data as chart.js JSON and exit")]
    pub json: bool,

    #[arg(long, help = "Write logs to this file (RUST_LOG sets the filter)")]
    pub log_file: Option<PathBuf>,
}
