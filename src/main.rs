mod app;
mod bridge;
mod config;
mod constants;
mod error;
mod gateway;
mod input;
mod models;
mod pagination;
mod session;
mod theme;
mod timecode;
mod ui;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use app::App;
use bridge::DesktopBridge;
use config::Config;
use gateway::HttpGateway;
use input::handle_key_event;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// Backend base URL (overrides prefs.toml), e.g. http://localhost:5001/api
  #[arg(long)]
  api_base: Option<String>,

  /// Media player executable, or the application name on macOS
  #[arg(long)]
  player: Option<String>,

  /// Log filter when RUST_LOG is unset, e.g. 'info' or 'vsearch=debug'
  #[arg(long, default_value = "info")]
  log_level: String,

  /// Print shell completions and exit
  #[arg(long, value_name = "SHELL")]
  completions: Option<Shell>,
}

// --- Logging ---

/// Log to a daily-rotated file in the data dir. The terminal belongs to the UI.
fn init_tracing(level: &str) -> Result<Option<WorkerGuard>> {
  let Some(dirs) = directories::ProjectDirs::from("", "", "vsearch") else {
    return Ok(None);
  };
  let log_dir = dirs.data_dir().join("logs");
  std::fs::create_dir_all(&log_dir).with_context(|| format!("Failed to create log dir {}", log_dir.display()))?;

  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(&log_dir, "vsearch.log"));
  let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level)).context("Invalid log level")?;

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(false))
    .try_init()
    .context("Failed to install tracing subscriber")?;
  Ok(Some(guard))
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(shell) = args.completions {
    clap_complete::generate(shell, &mut Args::command(), "vsearch", &mut std::io::stdout());
    return Ok(());
  }

  let _guard = init_tracing(&args.log_level)?;

  let config = Config::load();
  let api_base = config.resolve_api_base(args.api_base.as_deref());
  let player = config.resolve_player(args.player.as_deref());
  let label = host_label(&api_base);
  let gateway = HttpGateway::new(api_base).context("Failed to set up backend client")?;
  let bridge = DesktopBridge::new(player);
  info!(api_base = gateway.base(), player = bridge.player(), "starting");

  let mut app = App::new(Arc::new(gateway), Arc::new(bridge), config);
  app.backend_label = label;

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, app).await;
  ratatui::restore();
  result
}

/// `host:port` of the backend URL, for the header.
fn host_label(base: &str) -> String {
  let rest = base.split_once("://").map_or(base, |(_, rest)| rest);
  rest.split('/').next().unwrap_or(rest).to_string()
}

async fn run(terminal: &mut DefaultTerminal, mut app: App) -> Result<()> {
  app.open_index_list();

  loop {
    app.check_pending();
    app.expire_error();

    terminal.draw(|frame| ui::ui(frame, &mut app)).context("Failed to draw frame")?;

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key_event(&mut app, key),
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  info!("exiting");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn host_label_strips_scheme_and_path() {
    assert_eq!(host_label("http://localhost:5001/api"), "localhost:5001");
    assert_eq!(host_label("https://search.example.com"), "search.example.com");
    assert_eq!(host_label("localhost:5001/api"), "localhost:5001");
  }

  #[test]
  fn cli_parses_overrides() {
    let args = Args::try_parse_from(["vsearch", "--api-base", "http://h:1/api", "--player", "mpv"]).unwrap();
    assert_eq!(args.api_base.as_deref(), Some("http://h:1/api"));
    assert_eq!(args.player.as_deref(), Some("mpv"));
    assert_eq!(args.log_level, "info");
  }
}
