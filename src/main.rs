use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{error::Error, fs::File, io, sync::Arc, sync::Mutex};
use tracing_subscriber::EnvFilter;

mod api;
mod app;
mod chart;
mod cli;
mod error;
mod forecast;
mod page;
mod units;

use crate::api::Providers;
use crate::app::{run_app, App};
use crate::chart::ChartData;
use crate::cli::Args;
use crate::forecast::transform;
use crate::page::{resolve_and_fetch, Query};

const DEFAULT_LOG_FILTER: &str = "wxchart=info";

fn init_logging(args: &Args) -> Result<(), Box<dyn Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if let Some(path) = &args.log_file {
        let file = File::create(path)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }
    // Otherwise the TUI owns the terminal and logging stays off.
    Ok(())
}

fn query(args: &Args) -> Query {
    match args.city.as_deref().map(str::trim) {
        Some(city) if !city.is_empty() => Query::Search(city.to_string()),
        _ => Query::Detect,
    }
}

fn print_json(args: &Args, providers: &Providers) -> Result<(), Box<dyn Error>> {
    let raw = resolve_and_fetch(providers, providers, &query(args), args.metric)
        .map_err(|e| format!("{}: {e}", e.user_message()))?;
    let series = transform(&raw, args.duration, Some(args.unit));
    println!("{}", serde_json::to_string_pretty(&ChartData::from(&series))?);
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(&args)?;

    let providers = Providers::new(args.api_key.clone())?;
    if args.json {
        return print_json(&args, &providers);
    }

    let providers = Arc::new(providers);
    let mut app = App::new(
        providers.clone(),
        providers,
        args.metric,
        args.unit,
        args.duration,
    );
    app.start(query(&args));

    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{:?}", err)
    }

    Ok(())
}
