use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use queuewatch_types::current_timestamp_ms;
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;

use queuewatch::app::Export;
use queuewatch::ui::{self, Theme};
use queuewatch::{
    events, telemetry, App, DataSource, FileSource, Poller, Session, Settings, StreamSource,
    ViewOptions,
};

/// How often the dashboard recomputes the overview from the session.
const REFRESH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Parser, Debug)]
#[command(name = "queuewatch")]
#[command(about = "Terminal dashboard for job queue counters and their recent trends")]
struct Args {
    /// Path to a JSON snapshot file that an exporter keeps overwriting
    #[arg(short, long, default_value = "queues.json", conflicts_with = "connect")]
    file: PathBuf,

    /// Connect to a TCP endpoint streaming newline-delimited snapshots (host:port)
    #[arg(short, long)]
    connect: Option<String>,

    /// Settings file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Initial window range (e.g. "15m", "1h", "6h", "24h", "7d")
    #[arg(short, long)]
    window: Option<String>,

    /// Maximum points per sparkline
    #[arg(short, long)]
    points: Option<usize>,

    /// Sample the file once, write the overview as JSON and exit
    #[arg(short, long, conflicts_with = "connect")]
    export: Option<PathBuf>,

    /// Write logs to this file (filtered by RUST_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    telemetry::init_tracing(args.log_file.as_deref())?;

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(ref window) = args.window {
        settings.window.default = window.clone();
    }
    if let Some(points) = args.points {
        settings.window.max_points = points;
    }

    let options = ViewOptions {
        range: settings.window_range()?,
        thresholds: settings.thresholds.clone(),
        max_points: settings.window.max_points,
    };

    // Non-interactive export
    if let Some(ref export_path) = args.export {
        return export_once(&args.file, export_path, &settings, &options);
    }

    let rt = tokio::runtime::Runtime::new()?;

    let source: Box<dyn DataSource> = match args.connect {
        Some(ref addr) => rt.block_on(connect(addr))?,
        None => Box::new(FileSource::new(&args.file)),
    };

    let session = Session::init(&settings.sampling);
    let poller = {
        let _guard = rt.enter();
        Poller::spawn(source, session.clone(), settings.cadence())
    };

    let result = run_tui(App::new(session.clone(), options, Theme::auto_detect()));

    poller.cancel();
    session.dispose();
    info!("queuewatch exiting");

    result
}

/// Open a TCP connection and read snapshots from it.
async fn connect(addr: &str) -> Result<Box<dyn DataSource>> {
    use tokio::net::TcpStream;

    println!("Connecting to {}...", addr);
    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("Failed to connect to {}", addr))?;
    println!("Connected!");
    info!(addr, "connected to snapshot stream");

    Ok(Box::new(StreamSource::spawn(stream, addr)))
}

/// Run the dashboard until the user quits.
fn run_tui(mut app: App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Restore the terminal before printing a panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    app.refresh();
    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let mut last_refresh = Instant::now();

    while app.running {
        terminal.draw(|frame| ui::draw(frame, app))?;

        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => {
                    let rows = ui::queue_table_rows(terminal.size()?.height);
                    events::handle_mouse_event(app, mouse, ui::FIRST_QUEUE_ROW, rows);
                }
                // Redrawn on the next iteration
                _ => {}
            }
        }

        if last_refresh.elapsed() >= REFRESH_INTERVAL {
            app.refresh();
            last_refresh = Instant::now();
        }
    }

    Ok(())
}

/// Read the snapshot file once and write its overview.
fn export_once(
    snapshot_path: &Path,
    export_path: &Path,
    settings: &Settings,
    options: &ViewOptions,
) -> Result<()> {
    let mut source = FileSource::new(snapshot_path);
    let Some(snapshot) = source.poll() else {
        anyhow::bail!(
            "{}: {}",
            source.description(),
            source.error().unwrap_or_else(|| "no snapshot".to_string())
        );
    };

    let session = Session::init(&settings.sampling);
    session.record(snapshot);
    let overview = session.overview(
        options.range,
        &options.thresholds,
        options.max_points,
        current_timestamp_ms(),
    );

    Export::new(options.range, source.description(), &overview).write(export_path)?;
    session.dispose();

    println!("Exported queue overview to: {}", export_path.display());
    Ok(())
}
