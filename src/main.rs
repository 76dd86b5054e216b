use crossterm::{
    event::{self, Event as CEvent, KeyCode},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::error::Error;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::{mpsc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use tui::{backend::CrosstermBackend, Terminal};

use nesd_dashboard::app::{Dashboard, DashboardControls};
use nesd_dashboard::compat::ChartKind;
use nesd_dashboard::config::DashboardConfig;
use nesd_dashboard::csv_reader::load_tables;
use nesd_dashboard::pipeline::Pipeline;
use nesd_dashboard::ui;

enum Event<I> {
    Input(I),
    Tick,
}

// stdout belongs to the terminal UI, so logs go to a file
fn init_logging(config: &DashboardConfig) -> Result<(), Box<dyn Error>> {
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    let file = File::create(&config.log_file)?;
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let config = DashboardConfig::load(std::env::args_os().nth(1).map(PathBuf::from))?;
    init_logging(&config)?;
    info!(?config, "startup");

    let tables = load_tables(&config)?;
    let pipeline = Pipeline::new(&tables, config.variant);
    let mut dashboard = Dashboard::new(pipeline, config.default_year);

    enable_raw_mode()?;

    let (tx, rx) = mpsc::channel();
    let tick_rate = config.tick_rate();
    thread::spawn(move || {
        let mut last_tick = Instant::now();
        loop {
            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_secs(0));

            if event::poll(timeout).unwrap_or(false) {
                if let Ok(CEvent::Key(key)) = event::read() {
                    if tx.send(Event::Input(key)).is_err() {
                        break;
                    }
                }
            }

            if last_tick.elapsed() >= tick_rate {
                if tx.send(Event::Tick).is_err() {
                    break;
                }
                last_tick = Instant::now();
            }
        }
    });

    let stdout = io::stdout();
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    loop {
        terminal.draw(|rect| ui::draw(rect, &dashboard))?;

        match rx.recv()? {
            Event::Input(event) => match event.code {
                KeyCode::Char('q') => {
                    disable_raw_mode()?;
                    terminal.clear()?;
                    terminal.show_cursor()?;
                    break;
                }
                KeyCode::Char('b') => dashboard.select_tab(ChartKind::Bar),
                KeyCode::Char('l') => dashboard.select_tab(ChartKind::Line),
                KeyCode::Char('s') => dashboard.select_tab(ChartKind::Share),
                KeyCode::Char('m') => dashboard.cycle_metric(),
                KeyCode::Char('g') => dashboard.cycle_group(),
                KeyCode::Char('c') => dashboard.cycle_color(),
                KeyCode::Char('t') => dashboard.toggle_compare(),
                KeyCode::Char('y') => dashboard.cycle_year(),
                KeyCode::Char('n') => dashboard.cycle_industry(),
                _ => {}
            },
            Event::Tick => {}
        }
    }

    info!("shutdown");
    Ok(())
}
