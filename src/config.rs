use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::constants;

/// User preferences persisted to `prefs.toml` in the platform config dir.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct Config {
  pub theme_name: Option<String>,
  /// Backend base URL, e.g. `http://localhost:5001/api`.
  pub api_base: Option<String>,
  /// Player executable (Windows/Linux) or application name (macOS).
  pub player: Option<String>,
}

impl Config {
  pub fn load() -> Self {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "vsearch") {
      let config_file = proj_dirs.config_dir().join("prefs.toml");
      if let Ok(content) = std::fs::read_to_string(&config_file) {
        match Self::parse(&content) {
          Some(config) => return config,
          None => warn!(path = %config_file.display(), "config: ignoring malformed prefs file"),
        }
      }
    }
    Self::default()
  }

  fn parse(content: &str) -> Option<Self> {
    toml::from_str(content).ok()
  }

  pub fn save(&self) {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "vsearch") {
      let config_dir = proj_dirs.config_dir();
      if std::fs::create_dir_all(config_dir).is_ok() {
        let config_file = config_dir.join("prefs.toml");
        if let Ok(content) = toml::to_string(self)
          && let Err(e) = std::fs::write(&config_file, content)
        {
          warn!(err = %e, path = %config_file.display(), "config: failed to save prefs");
        }
      }
    }
  }

  /// Backend URL with precedence: CLI flag, then prefs file, then the compiled default.
  pub fn resolve_api_base(&self, cli: Option<&str>) -> String {
    let base = cli.map(str::to_string).or_else(|| self.api_base.clone()).unwrap_or_else(|| constants().api_base.clone());
    base.trim_end_matches('/').to_string()
  }

  /// Player override with the same precedence. `None` means the platform default.
  pub fn resolve_player(&self, cli: Option<&str>) -> Option<String> {
    cli.map(str::to_string).or_else(|| self.player.clone()).filter(|p| !p.trim().is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_partial_prefs() {
    let config = Config::parse("theme_name = \"Dusk\"\n").unwrap();
    assert_eq!(config.theme_name.as_deref(), Some("Dusk"));
    assert!(config.api_base.is_none());
  }

  #[test]
  fn parse_malformed_prefs() {
    assert!(Config::parse("theme_name = [").is_none());
  }

  #[test]
  fn api_base_precedence() {
    let config = Config { api_base: Some("http://box:9000/api/".into()), ..Default::default() };
    assert_eq!(config.resolve_api_base(Some("http://cli:1/api")), "http://cli:1/api");
    assert_eq!(config.resolve_api_base(None), "http://box:9000/api");
    assert_eq!(Config::default().resolve_api_base(None), constants().api_base);
  }

  #[test]
  fn blank_player_means_default() {
    let config = Config { player: Some("  ".into()), ..Default::default() };
    assert_eq!(config.resolve_player(None), None);
    assert_eq!(config.resolve_player(Some("mpv")).as_deref(), Some("mpv"));
  }
}
