//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available,
//! no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // Backend
  pub api_base: String,
  pub request_timeout_secs: u64,

  // Paging
  pub index_page_size: usize,
  pub segment_page_size: usize,

  // Search
  pub default_search_limit: usize,
  pub search_limit_choices: Vec<usize>,

  // File picker
  pub video_extensions: Vec<String>,

  // External player
  pub player_windows: String,
  pub player_macos_app: String,
  pub player_unix: String,
  pub player_seek_flag: String,

  // Notifications
  pub error_dismiss_secs: u64,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed every test fails on first access.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn embedded_constants_parse() {
    let c = constants();
    assert!(c.api_base.starts_with("http://"));
    assert_eq!(c.segment_page_size, 100);
    assert!(c.search_limit_choices.contains(&c.default_search_limit));
    assert!(c.video_extensions.iter().any(|e| e == "mp4"));
  }
}
