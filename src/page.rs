use tracing::{debug, warn};

use crate::api::{ForecastSource, LocationSource};
use crate::error::PageError;
use crate::forecast::{transform, ChartSeries, ForecastWindow, Metric, RawSeries, Unit};

pub type RequestId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Detect,
    Search(String),
}

pub fn resolve_and_fetch(
    locations: &dyn LocationSource,
    forecasts: &dyn ForecastSource,
    query: &Query,
    metric: Metric,
) -> Result<RawSeries, PageError> {
    let location = match query {
        Query::Detect => locations.detect()?,
        Query::Search(city) => locations.search(city)?,
    };
    Ok(forecasts.fetch(&location, metric)?)
}

#[derive(Debug, Clone)]
pub struct PageState {
    metric: Metric,
    unit: Unit,
    window: ForecastWindow,
    raw: Option<RawSeries>,
    chart: Option<ChartSeries>,
    error: Option<String>,
    latest: RequestId,
    pending: bool,
}

impl PageState {
    pub fn new(metric: Metric, unit: Unit, window: ForecastWindow) -> Self {
        Self {
            metric,
            unit,
            window,
            raw: None,
            chart: None,
            error: None,
            latest: 0,
            pending: false,
        }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn window(&self) -> ForecastWindow {
        self.window
    }

    pub fn raw(&self) -> Option<&RawSeries> {
        self.raw.as_ref()
    }

    pub fn chart(&self) -> Option<&ChartSeries> {
        self.chart.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.pending
    }

    /// Start a new fetch. Any response carrying an older id is ignored.
    pub fn begin_request(&mut self) -> RequestId {
        self.latest += 1;
        self.pending = true;
        self.error = None;
        self.latest
    }

    /// Apply a finished fetch. Returns `false` if it was superseded.
    ///
    /// A failure only sets the error message; the previous series and chart
    /// stay as they were.
    pub fn apply(&mut self, id: RequestId, result: Result<RawSeries, PageError>) -> bool {
        if id != self.latest {
            debug!(
                "Dropping stale {} response #{id} (latest is #{})",
                self.metric.key(),
                self.latest
            );
            return false;
        }
        self.pending = false;
        match result {
            Ok(raw) => {
                self.raw = Some(raw);
                self.error = None;
                self.recompute();
            }
            Err(e) => {
                warn!("{} request #{id} failed: {e}", self.metric.key());
                self.error = Some(e.user_message().to_string());
            }
        }
        true
    }

    pub fn set_unit(&mut self, unit: Unit) {
        debug!("{} unit -> {}", self.metric.key(), unit.suffix());
        self.unit = unit;
        self.recompute();
    }

    pub fn set_window(&mut self, window: ForecastWindow) {
        debug!("{} window -> {}", self.metric.key(), window.key());
        self.window = window;
        self.recompute();
    }

    fn recompute(&mut self) {
        let unit = self.metric.has_unit().then_some(self.unit);
        self.chart = self
            .raw
            .as_ref()
            .map(|raw| transform(raw, self.window, unit));
    }
}
