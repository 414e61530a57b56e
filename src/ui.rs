use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Flex, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, BorderType, Clear, List, ListItem, ListState, Padding, Paragraph, Wrap},
};

use crate::app::{App, CreateField, Loading, SearchField, SearchState, View};
use crate::input::TextField;
use crate::models::{IndexStatus, file_name};
use crate::pagination::Pager;
use crate::theme::Theme;
use crate::timecode::format_secs_f64;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

/// `page x/y`, only when there is more than one page.
fn pager_label(pager: &Pager) -> Option<String> {
  pager.is_active().then(|| format!("page {}/{}", pager.page(), pager.total_pages()))
}

fn panel<'a>(theme: &Theme, title: impl Into<Line<'a>>, focused: bool) -> Block<'a> {
  let color = if focused { theme.accent } else { theme.border };
  Block::bordered()
    .title(title)
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(color))
}

fn status_badge(theme: &Theme, status: IndexStatus) -> Span<'static> {
  Span::styled(format!("[{}]", status.label()), Style::default().fg(theme.status_color(status)))
}

/// Left text and right-aligned metadata on one row of width `inner_w`.
fn split_row(left: String, right: Vec<Span<'static>>, inner_w: usize, fg: ratatui::style::Color) -> Line<'static> {
  let right_w: usize = right.iter().map(|s| s.content.chars().count()).sum();
  let left = truncate_str(&left, inner_w.saturating_sub(right_w + 2));
  let gap = inner_w.saturating_sub(left.chars().count() + right_w);
  let mut spans = vec![Span::styled(left, Style::default().fg(fg)), Span::raw(" ".repeat(gap))];
  spans.extend(right);
  Line::from(spans)
}

fn row_style(theme: &Theme, i: usize, selected: Option<usize>) -> (ratatui::style::Color, ratatui::style::Color) {
  if Some(i) == selected {
    (theme.highlight_fg, theme.highlight_bg)
  } else if i % 2 == 1 {
    (theme.fg, theme.stripe_bg)
  } else {
    (theme.fg, theme.bg)
  }
}

fn render_list(frame: &mut Frame, theme: &Theme, block: Block, items: Vec<ListItem>, area: Rect, state: &mut ListState) {
  let list = List::new(items)
    .block(block)
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));
  frame.render_stateful_widget(list, area, state);
}

fn render_placeholder(frame: &mut Frame, theme: &Theme, block: Block, text: &str, area: Rect) {
  let paragraph = Paragraph::new(vec![Line::from(""), Line::from(Span::styled(text, Style::default().fg(theme.muted)))])
    .alignment(Alignment::Center)
    .block(block);
  frame.render_widget(paragraph, area);
}

/// Render a single-line input, keeping the cursor in view when focused.
fn render_input(frame: &mut Frame, theme: &Theme, field: &mut TextField, title: &str, focused: bool, area: Rect) {
  let border_color = if focused { theme.accent } else { theme.border };
  let block = Block::bordered()
    .title(format!(" {} ", title))
    .title_style(Style::default().fg(border_color))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  // At least one column, so the scroll arithmetic below stays in range on tiny terminals.
  let inner_w = (area.width.saturating_sub(4) as usize).max(1);
  let cursor_col = display_width(&field.text, field.cursor);

  if cursor_col < field.scroll {
    field.scroll = cursor_col;
  } else if cursor_col >= field.scroll + inner_w {
    field.scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let visible: String = field
    .text
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= field.scroll)
    .take_while(|(start, _, _)| *start < field.scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  frame.render_widget(Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(block), area);

  if focused {
    let cursor_x = area.x + 2 + cursor_col.saturating_sub(field.scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, footer_area] =
    Layout::vertical([Constraint::Length(1), Constraint::Min(3), Constraint::Length(1), Constraint::Length(1)])
      .areas(frame.area());

  render_header(frame, app, header_area);
  match app.view {
    View::IndexList => render_index_list(frame, app, main_area),
    View::CreateIndex => render_create_form(frame, app, main_area),
    View::IndexDetail => render_index_detail(frame, app, main_area),
    View::Search => render_search(frame, app, main_area),
    View::VideoDetail => render_video_detail(frame, app, main_area),
  }
  render_status(frame, app, status_area);
  render_footer(frame, app, footer_area);

  if app.confirm.is_some() {
    render_confirm(frame, app, main_area);
  }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let mut spans = vec![Span::styled(" ◆ vsearch ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))];
  if let Some(index) = app.session.current_index() {
    spans.push(Span::styled(format!("› {} ", index.name), Style::default().fg(theme.fg)));
    if let Some(video) = app.session.current_video() {
      spans.push(Span::styled(format!("› {} ", file_name(video)), Style::default().fg(theme.fg)));
    }
  }
  frame.render_widget(Line::from(spans), area);

  let right_text = format!("{}  v{} ", app.backend_label, env!("CARGO_PKG_VERSION"));
  let w = right_text.chars().count() as u16;
  let right = Line::from(Span::styled(right_text, Style::default().fg(theme.muted)));
  let right_area = Rect { x: area.x + area.width.saturating_sub(w), width: w.min(area.width), ..area };
  frame.render_widget(right, right_area);
}

fn render_index_list(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let title = match pager_label(&app.session.list_pager) {
    Some(p) => format!(" Indexes ({}) · {} ", app.indexes.len(), p),
    None => format!(" Indexes ({}) ", app.indexes.len()),
  };
  let block = panel(theme, title, true);

  if app.indexes.is_empty() {
    let text = if app.is_loading(Loading::List) {
      "Loading indexes…"
    } else {
      "No indexes yet. Press n to create one."
    };
    render_placeholder(frame, theme, block, text, area);
    return;
  }

  // Inner width: area minus 2 borders minus 2 chars for highlight symbol ("▶ ")
  let inner_w = area.width.saturating_sub(4) as usize;
  let selected = app.list_state.selected();
  let items: Vec<ListItem> = app
    .visible_indexes()
    .iter()
    .enumerate()
    .map(|(i, index)| {
      let (fg, bg) = row_style(theme, i, selected);
      let right = vec![
        Span::styled(index.created_label(), Style::default().fg(theme.muted)),
        Span::raw("  "),
        status_badge(theme, index.status),
      ];
      ListItem::new(split_row(index.name.clone(), right, inner_w, fg)).bg(bg)
    })
    .collect();

  render_list(frame, theme, block, items, area, &mut app.list_state);
}

fn render_create_form(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let [name_area, path_area, files_area] =
    Layout::vertical([Constraint::Length(3), Constraint::Length(3), Constraint::Min(3)]).areas(area);

  let form = &mut app.create_form;
  render_input(frame, theme, &mut form.name, "Index name", form.focus == CreateField::Name, name_area);
  render_input(frame, theme, &mut form.path, "Add path (Enter) · ^o browse", form.focus == CreateField::Path, path_area);

  let block = panel(theme, format!(" Selected files ({}) ", form.files.len()), form.focus == CreateField::Files);
  if form.files.is_empty() {
    render_placeholder(frame, theme, block, "No files selected. Press Ctrl+O to browse.", files_area);
    return;
  }

  let inner_w = files_area.width.saturating_sub(4) as usize;
  let selected = form.file_state.selected();
  let items: Vec<ListItem> = form
    .files
    .iter()
    .enumerate()
    .map(|(i, path)| {
      let (fg, bg) = row_style(theme, i, selected);
      let right = vec![Span::styled(truncate_str(path, inner_w / 2), Style::default().fg(theme.muted))];
      ListItem::new(split_row(file_name(path).to_string(), right, inner_w, fg)).bg(bg)
    })
    .collect();
  render_list(frame, theme, block, items, files_area, &mut form.file_state);
}

fn render_index_detail(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let [info_area, files_area] = Layout::vertical([Constraint::Length(4), Constraint::Min(3)]).areas(area);

  let mut info = Vec::new();
  if let Some(index) = app.session.current_index() {
    info.push(Line::from(Span::styled(index.name.clone(), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))));
    info.push(Line::from(vec![
      Span::styled("Created  ", Style::default().fg(theme.muted)),
      Span::styled(index.created_label(), Style::default().fg(theme.fg)),
      Span::raw("   "),
      Span::styled("Status  ", Style::default().fg(theme.muted)),
      status_badge(theme, index.status),
    ]));
  }
  frame.render_widget(
    Paragraph::new(info).block(Block::default().padding(Padding::new(1, 1, 1, 0))).wrap(Wrap { trim: true }),
    info_area,
  );

  let count = app.detail.as_ref().map_or(0, |d| d.files.len());
  let block = panel(theme, format!(" Videos ({}) ", count), true);
  let Some(detail) = app.detail.as_ref() else {
    render_placeholder(frame, theme, block, "Loading index…", files_area);
    return;
  };
  if detail.files.is_empty() {
    render_placeholder(frame, theme, block, "This index has no videos. Press a to add some.", files_area);
    return;
  }

  let inner_w = files_area.width.saturating_sub(4) as usize;
  let selected = app.list_state.selected();
  let items: Vec<ListItem> = detail
    .files
    .iter()
    .enumerate()
    .map(|(i, file)| {
      let (fg, bg) = row_style(theme, i, selected);
      ListItem::new(split_row(file.file_name().to_string(), vec![status_badge(theme, file.status)], inner_w, fg)).bg(bg)
    })
    .collect();
  render_list(frame, theme, block, items, files_area, &mut app.list_state);
}

fn render_search(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let [query_area, keyword_area, options_area, results_area] =
    Layout::vertical([Constraint::Length(3), Constraint::Length(3), Constraint::Length(1), Constraint::Min(3)])
      .areas(area);

  let scoped_video = app.session.current_video().map(|v| file_name(v).to_string());
  let form = &mut app.search_form;
  render_input(frame, theme, &mut form.query, "Search", form.focus == SearchField::Query, query_area);
  render_input(frame, theme, &mut form.keyword, "Keyword (optional)", form.focus == SearchField::Keyword, keyword_area);

  let scope = match (&scoped_video, form.scope_to_video) {
    (Some(name), true) => format!("only {}", name),
    _ => "all videos".to_string(),
  };
  let options = Line::from(vec![
    Span::styled(" Limit ", Style::default().fg(theme.muted)),
    Span::styled(form.limit.to_string(), Style::default().fg(theme.fg)),
    Span::styled("   Scope ", Style::default().fg(theme.muted)),
    Span::styled(scope, Style::default().fg(theme.fg)),
  ]);
  frame.render_widget(options, options_area);

  let results_focused = form.focus == SearchField::Results;
  let rows = app.search_rows();
  let block = panel(theme, format!(" Results ({}) ", rows.len()), results_focused);
  let placeholder = match &app.search {
    SearchState::Idle if app.is_loading(Loading::Search) => Some("Searching…"),
    SearchState::Idle => Some("Type a query and press Enter."),
    SearchState::Empty => Some("No results."),
    SearchState::Results(_) => None,
  };
  if let Some(text) = placeholder {
    render_placeholder(frame, theme, block, text, results_area);
    return;
  }

  let inner_w = results_area.width.saturating_sub(4) as usize;
  let selected = if results_focused { app.list_state.selected() } else { None };
  let items: Vec<ListItem> = rows
    .iter()
    .enumerate()
    .map(|(i, row)| {
      let (fg, bg) = row_style(theme, i, selected);
      let head = Line::from(vec![
        Span::styled(format!("{}  ", row.start_time), Style::default().fg(theme.accent)),
        Span::styled(truncate_str(file_name(&row.video_path), inner_w.saturating_sub(10)), Style::default().fg(theme.muted)),
      ]);
      let text = Line::from(Span::styled(truncate_str(row.text.trim(), inner_w), Style::default().fg(fg)));
      ListItem::new(vec![head, text]).bg(bg)
    })
    .collect();

  if results_focused {
    render_list(frame, theme, block, items, results_area, &mut app.list_state);
  } else {
    frame.render_widget(List::new(items).block(block), results_area);
  }
}

fn render_video_detail(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let name = app.session.current_video().map(file_name).unwrap_or_default();
  let title = match pager_label(&app.session.segment_pager) {
    Some(p) => format!(" {} · {} ", name, p),
    None => format!(" {} ", name),
  };
  let block = panel(theme, title, true);

  if app.segments.is_empty() {
    let text =
      if app.is_loading(Loading::Segments) { "Loading transcript…" } else { "No transcript segments." };
    render_placeholder(frame, theme, block, text, area);
    return;
  }

  let inner_w = area.width.saturating_sub(4) as usize;
  let selected = app.list_state.selected();
  let items: Vec<ListItem> = app
    .segments
    .iter()
    .enumerate()
    .map(|(i, seg)| {
      let (fg, bg) = row_style(theme, i, selected);
      let stamp = format!("{} → {}  ", format_secs_f64(seg.start), format_secs_f64(seg.end));
      let text_w = inner_w.saturating_sub(stamp.chars().count());
      ListItem::new(Line::from(vec![
        Span::styled(stamp, Style::default().fg(theme.accent)),
        Span::styled(truncate_str(seg.text.trim(), text_w), Style::default().fg(fg)),
      ]))
      .bg(bg)
    })
    .collect();
  render_list(frame, theme, block, items, area, &mut app.list_state);
}

fn render_confirm(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let Some(action) = &app.confirm else { return };

  let [row] = Layout::vertical([Constraint::Length(6)]).flex(Flex::Center).areas(area);
  let [modal] = Layout::horizontal([Constraint::Percentage(60)]).flex(Flex::Center).areas(row);

  let text = vec![
    Line::from(Span::styled(action.prompt(), Style::default().fg(theme.fg))),
    Line::from(""),
    Line::from(vec![
      Span::styled(" y ", Style::default().fg(theme.key_fg).bg(theme.key_bg)),
      Span::styled(" Confirm ", Style::default().fg(theme.muted)),
      Span::raw("  "),
      Span::styled(" n ", Style::default().fg(theme.key_fg).bg(theme.key_bg)),
      Span::styled(" Cancel ", Style::default().fg(theme.muted)),
    ]),
  ];
  let block = Block::bordered()
    .title(" Confirm ")
    .title_style(Style::default().fg(theme.error).add_modifier(Modifier::BOLD))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(theme.error))
    .style(Style::default().bg(theme.bg))
    .padding(Padding::horizontal(1));

  frame.render_widget(Clear, modal);
  frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }).block(block), modal);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = app.loading_message() {
    (format!(" ⏳ {}", msg), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(info) = &app.info_message {
    (format!(" ✓ {}", info), Style::default().fg(theme.success))
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let keys: Vec<(&str, &str)> = if app.confirm.is_some() {
    vec![("y", "Confirm"), ("n", "Cancel")]
  } else {
    match app.view {
      View::IndexList => {
        let mut k = vec![("Enter", "Open"), ("n", "New"), ("d", "Delete"), ("r", "Refresh")];
        if app.session.list_pager.is_active() {
          k.push(("←/→", "Page"));
        }
        k.push(("^t", "Theme"));
        k.push(("q", "Quit"));
        k
      }
      View::CreateIndex => {
        vec![("Tab", "Field"), ("^o", "Browse"), ("Del", "Remove"), ("^s", "Create"), ("Esc", "Cancel")]
      }
      View::IndexDetail => {
        vec![("Enter", "Transcript"), ("s", "Search"), ("a", "Add"), ("x", "Remove"), ("o", "Open"), ("Esc", "Back")]
      }
      View::Search => match app.search_form.focus {
        SearchField::Results => vec![("Enter", "Play"), ("o", "Open"), ("Tab", "Query"), ("Esc", "Back")],
        _ => vec![("Enter", "Search"), ("Tab", "Field"), ("^l", "Limit"), ("^v", "Scope"), ("Esc", "Back")],
      },
      View::VideoDetail => {
        let mut k = vec![("Enter", "Play"), ("o", "Open"), ("s", "Search")];
        if app.session.segment_pager.is_active() {
          k.push(("←/→", "Page"));
        }
        k.push(("Esc", "Back"));
        k
      }
    }
  };

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::theme::THEMES;

  #[test]
  fn truncate_keeps_short_strings() {
    assert_eq!(truncate_str("clip.mp4", 20), "clip.mp4");
    assert_eq!(truncate_str("a_very_long_name.mp4", 8), "a_very_…");
  }

  #[test]
  fn display_width_counts_wide_chars() {
    assert_eq!(display_width("ab", 2), 2);
    assert_eq!(display_width("日本", 2), 4);
    assert_eq!(display_width("日本", 1), 2);
  }

  #[test]
  fn pager_label_hidden_for_single_page() {
    let mut pager = Pager::default();
    pager.reset(1);
    assert_eq!(pager_label(&pager), None);
    pager.reset(3);
    assert_eq!(pager_label(&pager).as_deref(), Some("page 1/3"));
  }

  #[test]
  fn narrow_input_renders_without_overflow() {
    let mut terminal = ratatui::Terminal::new(ratatui::backend::TestBackend::new(4, 3)).unwrap();
    let mut field = TextField::default();
    field.set("lectures");
    terminal.draw(|frame| render_input(frame, &THEMES[0], &mut field, "Name", true, frame.area())).unwrap();
    assert_eq!(field.scroll, field.cursor);
  }

  #[test]
  fn split_row_right_aligns_metadata() {
    let line = split_row("talks".into(), vec![Span::raw("[done]")], 20, ratatui::style::Color::Reset);
    let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
    assert_eq!(text.chars().count(), 20);
    assert!(text.starts_with("talks") && text.ends_with("[done]"));
  }
}
