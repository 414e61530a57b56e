//! Host-privileged operations: native file dialogs and external process launch.
//!
//! Everything the console does to the host OS goes through [`HostBridge`], so the
//! controller can be driven by a fake in tests.

use async_trait::async_trait;
use std::process::{Command, ExitStatus, Stdio};
use tracing::{info, warn};

use crate::constants::constants;
use crate::error::BridgeError;
use crate::timecode::parse_hms;

#[async_trait]
pub trait HostBridge: Send + Sync {
  /// Multi-select video picker. An empty list means the user cancelled.
  async fn pick_files(&self) -> Result<Vec<String>, BridgeError>;

  /// Launch the external player on `path`, seeking to `start` (`HH:MM:SS`).
  fn open_in_player(&self, path: &str, start: &str) -> Result<(), BridgeError>;

  /// Open `path` with the OS default handler.
  fn open_path(&self, path: &str) -> Result<(), BridgeError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
  Windows,
  MacOs,
  /// Linux and the other POSIX systems.
  Unix,
}

impl Platform {
  pub fn current() -> Self {
    if cfg!(target_os = "windows") {
      Platform::Windows
    } else if cfg!(target_os = "macos") {
      Platform::MacOs
    } else {
      Platform::Unix
    }
  }

  pub fn default_player(self) -> &'static str {
    let c = constants();
    match self {
      Platform::Windows => &c.player_windows,
      Platform::MacOs => &c.player_macos_app,
      Platform::Unix => &c.player_unix,
    }
  }
}

/// A fully built command line, kept separate from spawning so it can be tested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
  pub program: String,
  pub args: Vec<String>,
}

/// Build the player invocation for `platform`.
///
/// - Windows: `<player.exe> --start-time=N <path>`
/// - macOS: `open -a <App> --args --start-time=N <path>`
/// - other POSIX: `<binary> --start-time=N <path>`
pub fn player_command(platform: Platform, player: &str, path: &str, seek_secs: u64) -> LaunchCommand {
  let seek = format!("{}={}", constants().player_seek_flag, seek_secs);
  match platform {
    Platform::MacOs => LaunchCommand {
      program: "open".to_string(),
      args: vec!["-a".to_string(), player.to_string(), "--args".to_string(), seek, path.to_string()],
    },
    Platform::Windows | Platform::Unix => {
      LaunchCommand { program: player.to_string(), args: vec![seek, path.to_string()] }
    }
  }
}

/// Build the "open with default handler" invocation for `platform`.
pub fn open_command(platform: Platform, path: &str) -> LaunchCommand {
  match platform {
    // `start` treats the first quoted argument as a window title, hence the empty one.
    Platform::Windows => LaunchCommand {
      program: "cmd".to_string(),
      args: vec!["/C".to_string(), "start".to_string(), String::new(), path.to_string()],
    },
    Platform::MacOs => LaunchCommand { program: "open".to_string(), args: vec![path.to_string()] },
    Platform::Unix => LaunchCommand { program: "xdg-open".to_string(), args: vec![path.to_string()] },
  }
}

/// Describe a non-successful exit. `open -a <App>` only reports a missing app this way.
fn exit_failure(status: ExitStatus) -> Option<String> {
  if status.success() {
    return None;
  }
  Some(match status.code() {
    Some(code) => format!("exited with status {}", code),
    None => "terminated by signal".to_string(),
  })
}

/// Spawn detached with null stdio and reap the child on a background thread.
fn spawn_detached(cmd: &LaunchCommand) -> Result<(), BridgeError> {
  let child = Command::new(&cmd.program)
    .args(&cmd.args)
    .stdin(Stdio::null())
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .spawn();

  match child {
    Ok(mut child) => {
      // Reap the child in a background thread to avoid zombie processes.
      let program = cmd.program.clone();
      std::thread::spawn(move || match child.wait() {
        Ok(status) => {
          if let Some(reason) = exit_failure(status) {
            warn!(program = %program, %reason, "bridge: launched process failed");
          }
        }
        Err(e) => warn!(program = %program, err = %e, "bridge: failed to wait on launched process"),
      });
      Ok(())
    }
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(BridgeError::PlayerNotFound(cmd.program.clone())),
    Err(e) => Err(BridgeError::Launch { program: cmd.program.clone(), source: e }),
  }
}

/// The real bridge: rfd dialogs and `std::process` launches.
pub struct DesktopBridge {
  platform: Platform,
  player: String,
}

impl DesktopBridge {
  pub fn new(player_override: Option<String>) -> Self {
    let platform = Platform::current();
    let player = player_override.unwrap_or_else(|| platform.default_player().to_string());
    Self { platform, player }
  }

  pub fn player(&self) -> &str {
    &self.player
  }
}

#[async_trait]
impl HostBridge for DesktopBridge {
  async fn pick_files(&self) -> Result<Vec<String>, BridgeError> {
    let extensions = constants().video_extensions.clone();
    // rfd's blocking dialog runs its own event loop; keep it off the async workers.
    let picked = tokio::task::spawn_blocking(move || {
      rfd::FileDialog::new().set_title("Select video files").add_filter("Video files", extensions.as_slice()).pick_files()
    })
    .await
    .map_err(|e| BridgeError::Dialog(e.to_string()))?;

    let paths: Vec<String> =
      picked.unwrap_or_default().into_iter().map(|p| p.to_string_lossy().into_owned()).collect();
    info!(count = paths.len(), "bridge: file dialog closed");
    Ok(paths)
  }

  fn open_in_player(&self, path: &str, start: &str) -> Result<(), BridgeError> {
    let secs = parse_hms(start).ok_or_else(|| BridgeError::InvalidTimecode(start.to_string()))?;
    let cmd = player_command(self.platform, &self.player, path, secs);
    info!(program = %cmd.program, path, secs, "bridge: launching player");
    spawn_detached(&cmd).inspect_err(|e| warn!(err = %e, "bridge: player launch failed"))
  }

  fn open_path(&self, path: &str) -> Result<(), BridgeError> {
    let cmd = open_command(self.platform, path);
    info!(program = %cmd.program, path, "bridge: opening with default handler");
    spawn_detached(&cmd).map_err(|e| match e {
      // The handler, not a media player, is what's missing here.
      BridgeError::PlayerNotFound(program) => BridgeError::Launch {
        program,
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "command not found"),
      },
      other => other,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn strings(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn windows_player_invocation() {
    let cmd = player_command(Platform::Windows, "C:\\VLC\\vlc.exe", "D:\\clips\\a b.mp4", 75);
    assert_eq!(cmd.program, "C:\\VLC\\vlc.exe");
    assert_eq!(cmd.args, strings(&["--start-time=75", "D:\\clips\\a b.mp4"]));
  }

  #[test]
  fn macos_player_invocation() {
    let cmd = player_command(Platform::MacOs, "VLC", "/Users/u/a.mov", 3600);
    assert_eq!(cmd.program, "open");
    assert_eq!(cmd.args, strings(&["-a", "VLC", "--args", "--start-time=3600", "/Users/u/a.mov"]));
  }

  #[test]
  fn unix_player_invocation() {
    let cmd = player_command(Platform::Unix, "vlc", "/home/u/a.mkv", 0);
    assert_eq!(cmd.program, "vlc");
    assert_eq!(cmd.args, strings(&["--start-time=0", "/home/u/a.mkv"]));
  }

  #[test]
  fn open_commands_per_platform() {
    assert_eq!(open_command(Platform::Unix, "/a.mp4").program, "xdg-open");
    assert_eq!(open_command(Platform::MacOs, "/a.mp4").args, strings(&["/a.mp4"]));
    assert_eq!(open_command(Platform::Windows, "C:\\a.mp4").args, strings(&["/C", "start", "", "C:\\a.mp4"]));
  }

  #[test]
  fn default_player_comes_from_constants() {
    let bridge = DesktopBridge::new(None);
    assert_eq!(bridge.player(), Platform::current().default_player());
    assert_eq!(DesktopBridge::new(Some("mpv".into())).player(), "mpv");
  }

  #[test]
  fn bad_timecode_is_rejected_before_spawning() {
    let bridge = DesktopBridge::new(Some("definitely-not-a-player".into()));
    let err = bridge.open_in_player("/a.mp4", "ten past").unwrap_err();
    assert!(matches!(err, BridgeError::InvalidTimecode(_)));
  }

  #[cfg(unix)]
  #[test]
  fn non_zero_exit_is_described() {
    let failed = Command::new("false").status().unwrap();
    assert_eq!(exit_failure(failed).as_deref(), Some("exited with status 1"));
    let ok = Command::new("true").status().unwrap();
    assert_eq!(exit_failure(ok), None);
  }

  #[test]
  fn missing_player_reports_not_found() {
    let bridge = DesktopBridge { platform: Platform::Unix, player: "vsearch-no-such-player-binary".into() };
    let err = bridge.open_in_player("/a.mp4", "00:00:10").unwrap_err();
    assert!(matches!(err, BridgeError::PlayerNotFound(ref p) if p == "vsearch-no-such-player-binary"));
  }
}
