mod app;
mod config;
mod constants;
mod corpus;
mod display;
mod engine;
mod graphics;
mod input;
mod query;
mod theme;
mod ui;
mod youtube;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use directories::ProjectDirs;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::App;
use config::Config;
use corpus::corpus;
use display::CliDisplayMode;
use engine::{Engine, Mode, Status};
use youtube::{Gateway, YouTubeClient};

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Kindervideos im Terminal finden", long_about = None)]
struct Args {
  /// YouTube Data API key. Without one the bundled offline videos are shown.
  #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
  api_key: Option<String>,

  /// Thumbnail rendering: 'auto', 'direct' (true-colour half-blocks) or 'ascii'
  #[arg(short, long)]
  display_mode: Option<CliDisplayMode>,

  /// Print results to stdout instead of starting the TUI
  #[arg(long)]
  print: bool,

  /// Search term for --print (defaults to the startup term)
  #[arg(short, long, requires = "print")]
  query: Option<String>,

  /// Category id to filter by for --print
  #[arg(short, long, requires = "print")]
  category: Option<String>,

  /// Print shell completions and exit
  #[arg(long, value_name = "SHELL")]
  completions: Option<Shell>,
}

// --- Logging ---

/// Log to a file in the cache dir; the terminal belongs to the TUI.
/// Filter via `KKKISTE_LOG` (defaults to `kkkiste=info`).
fn init_logging() -> Result<Option<WorkerGuard>> {
  let Some(proj_dirs) = ProjectDirs::from("", "", "kkkiste") else { return Ok(None) };
  let log_dir = proj_dirs.cache_dir();
  std::fs::create_dir_all(log_dir).with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

  let appender = tracing_appender::rolling::never(log_dir, "kkkiste.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);
  let filter = EnvFilter::try_from_env("KKKISTE_LOG").unwrap_or_else(|_| EnvFilter::new("kkkiste=info"));
  tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).init();
  Ok(Some(guard))
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(shell) = args.completions {
    clap_complete::generate(shell, &mut Args::command(), "kkkiste", &mut std::io::stdout());
    return Ok(());
  }

  let _guard = init_logging().context("Failed to initialize logging")?;
  info!(version = env!("CARGO_PKG_VERSION"), has_api_key = args.api_key.is_some(), "starting");

  let config = Config::load();
  let http = Client::builder()
    .user_agent(concat!("kkkiste/", env!("CARGO_PKG_VERSION")))
    .build()
    .context("Failed to build HTTP client")?;
  let gateway: Arc<dyn Gateway> = Arc::new(YouTubeClient::new(http.clone(), args.api_key.clone(), config.region_code()));

  if args.print {
    return print_results(gateway.as_ref(), &config, &args).await;
  }

  let cli_mode = args
    .display_mode
    .or_else(|| config.display_mode.as_deref().map(CliDisplayMode::from_config))
    .unwrap_or(CliDisplayMode::Auto);
  let display_mode = display::resolve_display_mode(cli_mode);

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let mut app = App::new(gateway, http, config, display_mode);
  let result = run(&mut terminal, &mut app).await;
  ratatui::restore();
  result
}

async fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
  app.start();

  loop {
    app.check_pending();
    app.expire_error();

    terminal.draw(|frame| ui::ui(frame, app)).context("Failed to draw frame")?;

    // Poll briefly so background task results show up promptly.
    if event::poll(Duration::from_millis(100)).context("Failed to poll terminal events")? {
      match event::read().context("Failed to read terminal event")? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(app, key);
        }
        _ => {}
      }
    }

    // Let spawned gateway tasks make progress between frames.
    tokio::task::yield_now().await;

    if app.should_quit {
      break;
    }
  }

  info!("exiting");
  Ok(())
}

/// Headless mode: initialize, apply the optional search and category, print the outcome.
async fn print_results(gateway: &dyn Gateway, config: &Config, args: &Args) -> Result<()> {
  let mut engine = Engine::new(corpus(), config.category_rules()).with_max_results(config.max_results());
  engine.initialize(gateway).await;
  if let Some(ref query) = args.query {
    engine.search(gateway, query).await;
  }
  if let Some(ref category) = args.category {
    engine.select_category(gateway, Some(category.as_str())).await;
  }

  let mode = match engine.mode() {
    Mode::Live => "live",
    Mode::Static => "offline",
  };
  println!("# {} | Suchbegriff: \"{}\" | Kategorie: {}", mode, engine.term(), engine.selected_category().unwrap_or("Alle"));
  if engine.mode() == Mode::Static {
    println!("# {}", constants::constants().static_banner);
  }
  if let Status::Error(msg) = engine.status() {
    eprintln!("Fehler: {}", msg);
  }
  if engine.results().is_empty() {
    println!("{}", constants::constants().no_results_message);
  }
  for video in engine.results() {
    println!("{}\t{}\t{}", video.id, video.title, video.channel_name);
  }
  Ok(())
}
