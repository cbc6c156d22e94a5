use std::io;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Tabs},
    Frame, Terminal,
};
use tracing::{debug, info};

use crate::api::{ForecastSource, LocationSource};
use crate::chart;
use crate::error::PageError;
use crate::forecast::{ForecastWindow, Metric, RawSeries, Unit};
use crate::page::{resolve_and_fetch, PageState, Query, RequestId};

const MISSING: &str = "--";
const TICK: Duration = Duration::from_millis(100);
const METRICS: [Metric; 2] = [Metric::Temperature, Metric::Precipitation];

pub type SharedLocations = Arc<dyn LocationSource + Send + Sync>;
pub type SharedForecasts = Arc<dyn ForecastSource + Send + Sync>;

struct Loaded {
    page: usize,
    id: RequestId,
    result: Result<RawSeries, PageError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
}

pub struct App {
    pages: Vec<PageState>,
    active: usize,
    mode: InputMode,
    input: String,
    locations: SharedLocations,
    forecasts: SharedForecasts,
    tx: mpsc::Sender<Loaded>,
    rx: mpsc::Receiver<Loaded>,
}

impl App {
    pub fn new(
        locations: SharedLocations,
        forecasts: SharedForecasts,
        first: Metric,
        unit: Unit,
        window: ForecastWindow,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            pages: METRICS
                .iter()
                .map(|m| PageState::new(*m, unit, window))
                .collect(),
            active: METRICS.iter().position(|m| *m == first).unwrap_or(0),
            mode: InputMode::Normal,
            input: String::new(),
            locations,
            forecasts,
            tx,
            rx,
        }
    }

    pub fn start(&mut self, query: Query) {
        for page in 0..self.pages.len() {
            self.dispatch(page, query.clone());
        }
    }

    pub fn active_page(&self) -> &PageState {
        &self.pages[self.active]
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    fn dispatch(&mut self, page: usize, query: Query) {
        let id = self.pages[page].begin_request();
        let metric = self.pages[page].metric();
        info!("Request #{id} for {}: {query:?}", metric.key());

        let locations = Arc::clone(&self.locations);
        let forecasts = Arc::clone(&self.forecasts);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = resolve_and_fetch(locations.as_ref(), forecasts.as_ref(), &query, metric);
            // receiver is gone once the app has quit
            let _ = tx.send(Loaded { page, id, result });
        });
    }

    fn receive(&mut self, loaded: Loaded) {
        if let Some(page) = self.pages.get_mut(loaded.page) {
            page.apply(loaded.id, loaded.result);
        }
    }

    pub fn drain(&mut self) {
        while let Ok(loaded) = self.rx.try_recv() {
            self.receive(loaded);
        }
    }

    /// Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self.mode {
            InputMode::Search => self.handle_search_key(key),
            InputMode::Normal => return self.handle_normal_key(key),
        }
        false
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.mode = InputMode::Normal;
                let city = self.input.trim().to_string();
                if city.is_empty() {
                    debug!("Ignoring blank search");
                    return;
                }
                self.dispatch(self.active, Query::Search(city));
            }
            KeyCode::Esc => self.mode = InputMode::Normal,
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        let active = self.active;
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Tab => self.active = (active + 1) % self.pages.len(),
            KeyCode::Char('/') => {
                self.mode = InputMode::Search;
                self.input = self.pages[active]
                    .raw()
                    .map(RawSeries::location)
                    .unwrap_or_default()
                    .to_string();
            }
            KeyCode::Char('r') => self.dispatch(active, Query::Detect),
            KeyCode::Char(c @ '1'..='4') => {
                let idx = c as usize - '1' as usize;
                self.pages[active].set_window(ForecastWindow::ALL[idx]);
            }
            KeyCode::Char(c) => {
                let page = &mut self.pages[active];
                if let Some(unit) = unit_key(c).filter(|_| page.metric().has_unit()) {
                    page.set_unit(unit);
                }
            }
            _ => {}
        }
        false
    }
}

fn unit_key(c: char) -> Option<Unit> {
    match c {
        'k' => Some(Unit::Kelvin),
        'c' => Some(Unit::Celsius),
        'f' => Some(Unit::Fahrenheit),
        _ => None,
    }
}

pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: App) -> io::Result<()> {
    loop {
        app.drain();
        terminal.draw(|f| ui(f, &app))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key(key) {
                    return Ok(());
                }
            }
        }
    }
}

fn bordered(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(title, Style::default().fg(Color::Yellow)))
        .title_alignment(Alignment::Left)
        .border_style(Style::default().fg(Color::Cyan))
        .border_type(BorderType::Rounded)
}

fn option_span(text: &str, selected: bool, color: Color) -> Span<'_> {
    if selected {
        Span::styled(
            format!(" {text} "),
            Style::default().fg(Color::Black).bg(color).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::raw(format!(" {text} "))
    }
}

fn display_controls(page: &PageState) -> Paragraph<'_> {
    let mut spans = vec![Span::raw(" ")];
    let accent = if page.metric().has_unit() {
        for unit in Unit::ALL {
            spans.push(option_span(
                unit.name(),
                unit == page.unit(),
                chart::tui_color(unit.palette().stroke),
            ));
        }
        spans.push(Span::raw("  |  "));
        chart::tui_color(page.unit().palette().stroke)
    } else {
        Color::Blue
    };
    for window in ForecastWindow::ALL {
        spans.push(option_span(window.label(), window == page.window(), accent));
    }
    Paragraph::new(Line::from(spans)).block(bordered(" Options "))
}

fn display_search(app: &App) -> Paragraph<'_> {
    let page = app.active_page();
    let line = match app.mode() {
        InputMode::Search => Line::from(vec![
            Span::styled(" / ", Style::default().fg(Color::Yellow)),
            Span::raw(app.input.as_str()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ]),
        InputMode::Normal if page.is_loading() => {
            Line::from(Span::styled(" Searching...", Style::default().fg(Color::Yellow)))
        }
        InputMode::Normal => {
            let name = page.raw().map(|raw| raw.location()).unwrap_or(MISSING);
            Line::from(vec![
                Span::raw(" "),
                Span::styled(name, Style::default().fg(Color::Green)),
                Span::raw("   (press / to search for a city)"),
            ])
        }
    };
    Paragraph::new(line).block(bordered(" City "))
}

fn ui(f: &mut Frame, app: &App) {
    let page = app.active_page();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(f.area());

    let tabs = Tabs::new(METRICS.iter().map(|m| m.label_base()))
        .select(app.active)
        .block(bordered(" Weather Dashboard "))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, rows[0]);
    f.render_widget(display_controls(page), rows[1]);
    f.render_widget(display_search(app), rows[2]);

    if let Some(error) = page.error() {
        let message = Paragraph::new(Span::styled(
            format!(" {error}"),
            Style::default().fg(Color::Red),
        ));
        f.render_widget(message, rows[3]);
    }

    match page.chart() {
        Some(series) => chart::render(f, rows[4], series),
        None => f.render_widget(
            Paragraph::new(format!("\n  {MISSING}")).block(bordered(" Forecast ")),
            rows[4],
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::tests::{CountingForecasts, FakeLocations};
    use crossterm::event::KeyModifiers;

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn wait(app: &mut App) {
        let loaded = app.rx.recv_timeout(Duration::from_secs(5)).unwrap();
        app.receive(loaded);
    }

    fn app(detects: bool, forecasts: Arc<CountingForecasts>) -> App {
        App::new(
            Arc::new(FakeLocations { detects }),
            forecasts,
            Metric::Temperature,
            Unit::Kelvin,
            ForecastWindow::H24,
        )
    }

    #[test]
    fn test_start_loads_every_tab() {
        let forecasts = Arc::new(CountingForecasts::new(200));
        let mut app = app(true, forecasts.clone());
        app.start(Query::Detect);
        wait(&mut app);
        wait(&mut app);

        assert_eq!(forecasts.calls(), 2);
        assert!(app.pages.iter().all(|p| p.chart().is_some()));
    }

    #[test]
    fn test_toggles_do_not_fetch() {
        let forecasts = Arc::new(CountingForecasts::new(200));
        let mut app = app(true, forecasts.clone());
        app.dispatch(0, Query::Detect);
        wait(&mut app);

        press(&mut app, KeyCode::Char('4'));
        press(&mut app, KeyCode::Char('f'));
        let chart = app.active_page().chart().unwrap();
        assert_eq!(chart.labels.len(), 168);
        assert_eq!(chart.series_label, "Temperature in Madison (°F)");
        assert_eq!(forecasts.calls(), 1);
    }

    #[test]
    fn test_unit_keys_ignored_on_precipitation() {
        let forecasts = Arc::new(CountingForecasts::new(24));
        let mut app = app(true, forecasts);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.active_page().metric(), Metric::Precipitation);
        press(&mut app, KeyCode::Char('f'));
        assert_eq!(app.active_page().unit(), Unit::Kelvin);
    }

    #[test]
    fn test_search_flow() {
        let forecasts = Arc::new(CountingForecasts::new(24));
        let mut app = app(false, forecasts.clone());

        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.mode(), InputMode::Search);
        type_text(&mut app, "Oslx");
        press(&mut app, KeyCode::Backspace);
        type_text(&mut app, "o");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode(), InputMode::Normal);
        wait(&mut app);

        let chart = app.active_page().chart().unwrap();
        assert_eq!(chart.series_label, "Temperature in Oslo (K)");

        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.input, "Oslo");
        for _ in 0..4 {
            press(&mut app, KeyCode::Backspace);
        }
        type_text(&mut app, "Atlantis");
        press(&mut app, KeyCode::Enter);
        wait(&mut app);

        assert_eq!(app.active_page().error(), Some("City not found"));
        assert_eq!(app.active_page().raw().unwrap().location(), "Oslo");
        assert_eq!(forecasts.calls(), 1);
    }

    #[test]
    fn test_search_box_starts_with_current_city() {
        let forecasts = Arc::new(CountingForecasts::new(24));
        let mut app = app(true, forecasts);
        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.input, "");
        press(&mut app, KeyCode::Esc);

        app.dispatch(0, Query::Detect);
        wait(&mut app);
        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.input, "Madison");
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let forecasts = Arc::new(CountingForecasts::new(24));
        let mut app = app(false, forecasts);
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "   ");
        press(&mut app, KeyCode::Enter);
        assert!(!app.active_page().is_loading());
    }

    #[test]
    fn test_quit_only_outside_search() {
        let forecasts = Arc::new(CountingForecasts::new(24));
        let mut app = app(false, forecasts);
        press(&mut app, KeyCode::Char('/'));
        assert!(!press(&mut app, KeyCode::Char('q')));
        press(&mut app, KeyCode::Esc);
        assert!(press(&mut app, KeyCode::Char('q')));
    }
}
