use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event};
use crossterm::execute;
use press_map::app::{App, Screen};
use press_map::chart::ChartView;
use press_map::config::{AppConfig, LogConfig};
use press_map::map::MapView;
use press_map::ui::{ChartScreen, MapScreen};
use ratatui::DefaultTerminal;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "press-map", version, about = "Journalist deaths over time, in the terminal")]
struct Cli {
    /// TOML configuration file (optional on disk)
    #[arg(long, default_value = "press-map.toml")]
    config: PathBuf,

    /// Base directory for relative data paths
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Multi-series line chart of deaths per country
    Chart {
        /// CSV with country,year,counts columns
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Spike map of deaths over a press-freedom choropleth
    Map {
        /// Initial year on the slider
        #[arg(long)]
        year: Option<i32>,
    },
}

/// Log to a file; the terminal belongs to the UI. `RUST_LOG` wins over the
/// configured level.
fn init_logging(cfg: &LogConfig) -> Result<()> {
    let file = File::create(&cfg.file)
        .with_context(|| format!("Failed to create log file: {:?}", cfg.file))?;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.level))
        .with_context(|| format!("Invalid log level {:?}", cfg.level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {e}"))
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut cfg = AppConfig::load_or_default(&cli.config)?;
    if let Some(dir) = &cli.data_dir {
        cfg.rebase(dir);
    }
    match &cli.command {
        Command::Chart { csv: Some(csv) } => cfg.chart.csv = csv.clone(),
        Command::Map { year: Some(year) } => cfg.map.initial_year = *year,
        _ => {}
    }
    cfg.validate()?;
    Ok(cfg)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = load_config(&cli)?;
    init_logging(&cfg.log)?;
    tracing::info!(command = ?cli.command, config = ?cli.config, "starting");

    let now = Instant::now();
    let screen: Box<dyn Screen> = match cli.command {
        Command::Chart { .. } => Box::new(ChartScreen::new(ChartView::from_config(&cfg.chart, now))),
        Command::Map { .. } => Box::new(MapScreen::new(MapView::from_config(&cfg.map, now)?)),
    };
    let mut app = App::new(screen);

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, &mut app);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    if let Err(e) = &result {
        tracing::error!("exited with error: {e:#}");
    }
    result
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    tracing::debug!(screen = app.title(), "event loop started");

    loop {
        let now = Instant::now();
        terminal.draw(|frame| app.draw(frame, now))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            let now = Instant::now();
            match event::read()? {
                Event::Key(key) => app.handle_key(key, now),
                Event::Mouse(mouse) => app.handle_mouse(mouse, now),
                // The next draw picks up the new size
                Event::Resize(width, height) => tracing::debug!(width, height, "terminal resized"),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
