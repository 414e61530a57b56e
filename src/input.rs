use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, CreateField, PickPurpose, SearchField, View};
use crate::pagination::PageNav;

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

/// Single-line text input: contents, char cursor, and horizontal scroll (in display columns).
#[derive(Debug, Default, Clone)]
pub struct TextField {
  pub text: String,
  pub cursor: usize,
  pub scroll: usize,
}

impl TextField {
  pub fn set(&mut self, s: &str) {
    self.text = s.to_string();
    self.cursor = self.text.chars().count();
    self.scroll = 0;
  }

  pub fn clear(&mut self) {
    self.text.clear();
    self.cursor = 0;
    self.scroll = 0;
  }

  pub fn is_empty(&self) -> bool {
    self.text.is_empty()
  }

  /// Apply an editing key. Returns whether the key was consumed.
  pub fn handle_key(&mut self, key: KeyEvent) -> bool {
    if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
      return false;
    }
    match key.code {
      KeyCode::Char(c) => {
        let byte_idx = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_idx, c);
        self.cursor += 1;
      }
      KeyCode::Backspace => {
        if self.cursor > 0 {
          self.cursor -= 1;
          let byte_idx = char_to_byte_index(&self.text, self.cursor);
          self.text.remove(byte_idx);
        }
      }
      KeyCode::Delete => {
        if self.cursor < self.text.chars().count() {
          let byte_idx = char_to_byte_index(&self.text, self.cursor);
          self.text.remove(byte_idx);
        }
      }
      KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
      KeyCode::Right => {
        if self.cursor < self.text.chars().count() {
          self.cursor += 1;
        }
      }
      KeyCode::Home => self.cursor = 0,
      KeyCode::End => self.cursor = self.text.chars().count(),
      _ => return false,
    }
    true
  }
}

fn ctrl(key: &KeyEvent, c: char) -> bool {
  key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(c)
}

/// Paging keys shared by the index list and the transcript view.
fn page_nav(key: &KeyEvent, total: usize) -> Option<PageNav> {
  match key.code {
    KeyCode::Left | KeyCode::Char('[') => Some(PageNav::Prev),
    KeyCode::Right | KeyCode::Char(']') => Some(PageNav::Next),
    KeyCode::Home => Some(PageNav::Jump(1)),
    KeyCode::End => Some(PageNav::Jump(total)),
    _ => None,
  }
}

// --- Event Handling ---

pub fn handle_key_event(app: &mut App, key: KeyEvent) {
  if ctrl(&key, 'c') {
    app.should_quit = true;
    return;
  }

  if ctrl(&key, 't') {
    app.next_theme();
    return;
  }

  // A pending confirmation swallows every other key.
  if app.confirm.is_some() {
    match key.code {
      KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.resolve_confirm(true),
      KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.resolve_confirm(false),
      _ => {}
    }
    return;
  }

  app.clear_error();
  app.info_message = None;

  match app.view {
    View::IndexList => handle_list_key(app, key),
    View::CreateIndex => handle_create_key(app, key),
    View::IndexDetail => handle_detail_key(app, key),
    View::Search => handle_search_key(app, key),
    View::VideoDetail => handle_video_key(app, key),
  }
}

fn handle_list_key(app: &mut App, key: KeyEvent) {
  if let Some(nav) = page_nav(&key, app.session.list_pager.total_pages()) {
    app.list_page(nav);
    return;
  }
  match key.code {
    KeyCode::Down | KeyCode::Char('j') => app.select_next(),
    KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
    KeyCode::Enter => {
      if let Some(summary) = app.selected_summary().cloned() {
        app.select_index(summary);
      }
    }
    KeyCode::Char('n') => app.open_create_form(),
    KeyCode::Char('d') | KeyCode::Delete => {
      if let Some(id) = app.selected_summary().map(|s| s.id.clone()) {
        app.request_delete_index(&id);
      }
    }
    KeyCode::Char('r') => app.refresh_list(),
    KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
    _ => {}
  }
}

fn handle_create_key(app: &mut App, key: KeyEvent) {
  if ctrl(&key, 'o') {
    app.pick_files(PickPurpose::CreateForm);
    return;
  }
  if ctrl(&key, 's') {
    app.submit_create_form();
    return;
  }

  let form = &mut app.create_form;
  match key.code {
    KeyCode::Tab => {
      form.focus = match form.focus {
        CreateField::Name => CreateField::Path,
        CreateField::Path if !form.files.is_empty() => CreateField::Files,
        CreateField::Path | CreateField::Files => CreateField::Name,
      };
      return;
    }
    KeyCode::Esc => {
      app.back();
      return;
    }
    _ => {}
  }

  match form.focus {
    CreateField::Name => {
      if key.code == KeyCode::Enter {
        app.submit_create_form();
      } else {
        form.name.handle_key(key);
      }
    }
    CreateField::Path => {
      if key.code == KeyCode::Enter {
        let path = form.path.text.clone();
        if form.add_files([path]) > 0 {
          form.path.clear();
        }
      } else {
        form.path.handle_key(key);
      }
    }
    CreateField::Files => match key.code {
      KeyCode::Down | KeyCode::Char('j') => {
        let count = form.files.len();
        if count > 0 {
          let i = form.file_state.selected().map_or(0, |i| (i + 1) % count);
          form.file_state.select(Some(i));
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        let count = form.files.len();
        if count > 0 {
          let i = form.file_state.selected().map_or(0, |i| if i == 0 { count - 1 } else { i - 1 });
          form.file_state.select(Some(i));
        }
      }
      KeyCode::Delete | KeyCode::Backspace | KeyCode::Char('x') => {
        form.remove_selected();
        if form.files.is_empty() {
          form.focus = CreateField::Path;
        }
      }
      KeyCode::Enter => app.submit_create_form(),
      _ => {}
    },
  }
}

fn handle_detail_key(app: &mut App, key: KeyEvent) {
  match key.code {
    KeyCode::Down | KeyCode::Char('j') => app.select_next(),
    KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
    KeyCode::Enter => {
      if let Some(path) = app.selected_file().map(str::to_string) {
        app.open_video_detail(&path);
      }
    }
    KeyCode::Char('s') | KeyCode::Char('/') => app.open_search(),
    KeyCode::Char('a') => app.pick_files(PickPurpose::AddToIndex),
    KeyCode::Char('x') | KeyCode::Delete => {
      if let Some(path) = app.selected_file().map(str::to_string) {
        app.request_remove_file(&path);
      }
    }
    KeyCode::Char('d') => {
      if let Some(id) = app.session.current_index_id().map(str::to_string) {
        app.request_delete_index(&id);
      }
    }
    KeyCode::Char('o') => {
      if let Some(path) = app.selected_file().map(str::to_string) {
        app.open_in_shell(&path);
      }
    }
    KeyCode::Char('r') => app.refresh_detail(),
    KeyCode::Esc | KeyCode::Backspace => app.back(),
    _ => {}
  }
}

fn handle_search_key(app: &mut App, key: KeyEvent) {
  if ctrl(&key, 'l') {
    app.cycle_search_limit();
    return;
  }
  if ctrl(&key, 'v') {
    app.toggle_search_scope();
    return;
  }

  let has_results = !app.search_rows().is_empty();
  if key.code == KeyCode::Tab {
    app.search_form.focus = match app.search_form.focus {
      SearchField::Query => SearchField::Keyword,
      SearchField::Keyword if has_results => SearchField::Results,
      SearchField::Keyword | SearchField::Results => SearchField::Query,
    };
    return;
  }

  match app.search_form.focus {
    SearchField::Query | SearchField::Keyword => {
      let field = if app.search_form.focus == SearchField::Query {
        &mut app.search_form.query
      } else {
        &mut app.search_form.keyword
      };
      match key.code {
        KeyCode::Enter => app.submit_search(),
        KeyCode::Esc => {
          if field.is_empty() {
            app.back();
          } else {
            field.clear();
          }
        }
        KeyCode::Down if has_results => app.search_form.focus = SearchField::Results,
        _ => {
          field.handle_key(key);
        }
      }
    }
    SearchField::Results => match key.code {
      KeyCode::Down | KeyCode::Char('j') => app.select_next(),
      KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
      KeyCode::Enter | KeyCode::Char('p') => app.play_selected(),
      KeyCode::Char('o') => {
        let path = app.list_state.selected().and_then(|i| app.search_rows().get(i)).map(|r| r.video_path.clone());
        if let Some(path) = path {
          app.open_in_shell(&path);
        }
      }
      KeyCode::Char('/') => app.search_form.focus = SearchField::Query,
      KeyCode::Esc => app.back(),
      _ => {}
    },
  }
}

fn handle_video_key(app: &mut App, key: KeyEvent) {
  if let Some(nav) = page_nav(&key, app.session.segment_pager.total_pages()) {
    app.segment_page(nav);
    return;
  }
  match key.code {
    KeyCode::Down | KeyCode::Char('j') => app.select_next(),
    KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
    KeyCode::Enter | KeyCode::Char('p') => app.play_selected(),
    KeyCode::Char('o') => {
      if let Some(path) = app.session.current_video().map(str::to_string) {
        app.open_in_shell(&path);
      }
    }
    KeyCode::Char('s') | KeyCode::Char('/') => app.open_search(),
    KeyCode::Char('x') => {
      if let Some(path) = app.session.current_video().map(str::to_string) {
        app.request_remove_file(&path);
      }
    }
    KeyCode::Esc | KeyCode::Backspace => app.back(),
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  // --- char_to_byte_index ---

  #[test]
  fn char_to_byte_ascii() {
    assert_eq!(char_to_byte_index("hello", 0), 0);
    assert_eq!(char_to_byte_index("hello", 3), 3);
    assert_eq!(char_to_byte_index("hello", 5), 5); // past end
  }

  #[test]
  fn char_to_byte_multibyte() {
    let s = "aé日"; // a=1 byte, é=2 bytes, 日=3 bytes
    assert_eq!(char_to_byte_index(s, 0), 0);
    assert_eq!(char_to_byte_index(s, 1), 1);
    assert_eq!(char_to_byte_index(s, 2), 3);
    assert_eq!(char_to_byte_index(s, 3), 6);
  }

  #[test]
  fn char_to_byte_empty() {
    assert_eq!(char_to_byte_index("", 0), 0);
    assert_eq!(char_to_byte_index("", 5), 0);
  }

  // --- TextField ---

  fn press(field: &mut TextField, code: KeyCode) -> bool {
    field.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
  }

  #[test]
  fn text_field_edits_at_cursor() {
    let mut f = TextField::default();
    for c in "ct".chars() {
      press(&mut f, KeyCode::Char(c));
    }
    press(&mut f, KeyCode::Left);
    press(&mut f, KeyCode::Char('a'));
    assert_eq!(f.text, "cat");
    press(&mut f, KeyCode::Home);
    press(&mut f, KeyCode::Delete);
    assert_eq!(f.text, "at");
    press(&mut f, KeyCode::End);
    press(&mut f, KeyCode::Backspace);
    assert_eq!((f.text.as_str(), f.cursor), ("a", 1));
  }

  #[test]
  fn text_field_handles_multibyte() {
    let mut f = TextField::default();
    f.set("日本");
    press(&mut f, KeyCode::Backspace);
    assert_eq!(f.text, "日");
    press(&mut f, KeyCode::Right);
    assert_eq!(f.cursor, 1);
  }

  #[test]
  fn text_field_ignores_control_chords() {
    let mut f = TextField::default();
    assert!(!f.handle_key(KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL)));
    assert!(!press(&mut f, KeyCode::Tab));
    assert!(f.is_empty());
  }

  #[test]
  fn page_keys_map_to_navigation() {
    let key = |code| KeyEvent::new(code, KeyModifiers::NONE);
    assert_eq!(page_nav(&key(KeyCode::Char(']')), 4), Some(PageNav::Next));
    assert_eq!(page_nav(&key(KeyCode::Left), 4), Some(PageNav::Prev));
    assert_eq!(page_nav(&key(KeyCode::End), 4), Some(PageNav::Jump(4)));
    assert_eq!(page_nav(&key(KeyCode::Enter), 4), None);
  }
}
