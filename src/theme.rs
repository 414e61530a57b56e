use ratatui::style::Color;

use crate::models::IndexStatus;

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub status: Color,
  pub success: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

impl Theme {
  /// Badge color for an index or file status.
  pub fn status_color(&self, status: IndexStatus) -> Color {
    match status {
      IndexStatus::Completed => self.success,
      IndexStatus::Processing => self.status,
      IndexStatus::Waiting => self.accent,
      IndexStatus::Error => self.error,
      IndexStatus::Unknown => self.muted,
    }
  }
}

pub static THEMES: [Theme; 3] = [
  Theme {
    name: "Midnight",
    bg: Color::Rgb(22, 24, 33),
    fg: Color::Rgb(205, 214, 244),
    accent: Color::Rgb(137, 180, 250),
    muted: Color::Rgb(108, 112, 134),
    border: Color::Rgb(69, 71, 90),
    highlight_fg: Color::Rgb(22, 24, 33),
    highlight_bg: Color::Rgb(137, 180, 250),
    stripe_bg: Color::Rgb(30, 32, 44),
    status: Color::Rgb(249, 226, 175),
    success: Color::Rgb(166, 227, 161),
    error: Color::Rgb(243, 139, 168),
    key_fg: Color::Rgb(22, 24, 33),
    key_bg: Color::Rgb(108, 112, 134),
  },
  Theme {
    name: "Paper",
    bg: Color::Rgb(250, 248, 240),
    fg: Color::Rgb(60, 56, 54),
    accent: Color::Rgb(7, 102, 120),
    muted: Color::Rgb(146, 131, 116),
    border: Color::Rgb(213, 196, 161),
    highlight_fg: Color::Rgb(250, 248, 240),
    highlight_bg: Color::Rgb(7, 102, 120),
    stripe_bg: Color::Rgb(242, 237, 222),
    status: Color::Rgb(181, 118, 20),
    success: Color::Rgb(121, 116, 14),
    error: Color::Rgb(157, 0, 6),
    key_fg: Color::Rgb(250, 248, 240),
    key_bg: Color::Rgb(146, 131, 116),
  },
  Theme {
    name: "Terminal",
    bg: Color::Reset,
    fg: Color::Reset,
    accent: Color::Cyan,
    muted: Color::DarkGray,
    border: Color::DarkGray,
    highlight_fg: Color::Black,
    highlight_bg: Color::Cyan,
    stripe_bg: Color::Reset,
    status: Color::Yellow,
    success: Color::Green,
    error: Color::Red,
    key_fg: Color::Black,
    key_bg: Color::Gray,
  },
];
