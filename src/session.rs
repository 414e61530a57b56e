//! The console's process-wide session: which index and video are current,
//! the page cursors, and the search whose results are on screen.
//!
//! Owned by `App`, which is its only writer.

use crate::models::{IndexSummary, SearchQuery};
use crate::pagination::Pager;

/// What an in-flight request was issued for. Compared against the session
/// when the response arrives; a mismatch means the response is stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
  IndexList,
  Detail { index_id: String },
  /// `epoch` is the session's index epoch at dispatch time.
  Search { index_id: String, query: SearchQuery, epoch: u64 },
  Segments { index_id: String, path: String, page: usize },
  Mutation,
}

#[derive(Debug, Default)]
pub struct Session {
  current_index: Option<IndexSummary>,
  current_video: Option<String>,
  /// Last search whose results were applied.
  active_search: Option<(String, SearchQuery)>,
  /// Bumped whenever the user leaves or switches index.
  epoch: u64,
  pub list_pager: Pager,
  pub segment_pager: Pager,
}

impl Session {
  pub fn current_index(&self) -> Option<&IndexSummary> {
    self.current_index.as_ref()
  }

  pub fn current_index_id(&self) -> Option<&str> {
    self.current_index.as_ref().map(|i| i.id.as_str())
  }

  pub fn current_video(&self) -> Option<&str> {
    self.current_video.as_deref()
  }

  /// Make `summary` current. Switching to a different index forgets the open video and search.
  pub fn select_index(&mut self, summary: IndexSummary) {
    if self.current_index_id() != Some(summary.id.as_str()) {
      self.close_video();
      self.active_search = None;
      self.epoch += 1;
    }
    self.current_index = Some(summary);
  }

  /// Refresh the cached summary of the current index, if `summary` is that index.
  pub fn refresh_index(&mut self, summary: &IndexSummary) {
    if let Some(ref mut current) = self.current_index
      && current.id == summary.id
    {
      *current = summary.clone();
    }
  }

  pub fn clear_index(&mut self) {
    if self.current_index.is_some() {
      self.epoch += 1;
    }
    self.current_index = None;
    self.active_search = None;
    self.close_video();
  }

  /// Open `path` as the current video. Refused while no index is current.
  pub fn open_video(&mut self, path: &str) -> bool {
    if self.current_index.is_none() {
      return false;
    }
    self.current_video = Some(path.to_string());
    self.segment_pager.reset(0);
    true
  }

  pub fn close_video(&mut self) {
    self.current_video = None;
    self.segment_pager.reset(0);
  }

  pub fn epoch(&self) -> u64 {
    self.epoch
  }

  /// Record the search whose results were just applied.
  pub fn set_active_search(&mut self, index_id: &str, query: SearchQuery) {
    self.active_search = Some((index_id.to_string(), query));
  }

  pub fn active_search(&self) -> Option<&(String, SearchQuery)> {
    self.active_search.as_ref()
  }

  /// Whether a response for `target` still matches what the session is showing.
  pub fn is_current(&self, target: &Target) -> bool {
    match target {
      Target::IndexList | Target::Mutation => true,
      Target::Detail { index_id } => self.current_index_id() == Some(index_id.as_str()),
      Target::Search { index_id, epoch, .. } => {
        self.current_index_id() == Some(index_id.as_str()) && *epoch == self.epoch
      }
      Target::Segments { index_id, path, .. } => {
        self.current_index_id() == Some(index_id.as_str()) && self.current_video() == Some(path.as_str())
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::IndexStatus;

  fn summary(id: &str) -> IndexSummary {
    IndexSummary {
      id: id.to_string(),
      name: format!("index {id}"),
      create_date: "2024-01-01 00:00:00".into(),
      status: IndexStatus::Completed,
    }
  }

  #[test]
  fn video_requires_an_index() {
    let mut s = Session::default();
    assert!(!s.open_video("/a.mp4"));
    assert_eq!(s.current_video(), None);

    s.select_index(summary("1"));
    assert!(s.open_video("/a.mp4"));
    assert_eq!(s.current_video(), Some("/a.mp4"));
  }

  #[test]
  fn clearing_index_clears_video() {
    let mut s = Session::default();
    s.select_index(summary("1"));
    s.open_video("/a.mp4");
    s.clear_index();
    assert!(s.current_index().is_none());
    assert!(s.current_video().is_none());
  }

  #[test]
  fn switching_index_forgets_video_but_reselecting_keeps_it() {
    let mut s = Session::default();
    s.select_index(summary("1"));
    s.open_video("/a.mp4");
    s.select_index(summary("1"));
    assert_eq!(s.current_video(), Some("/a.mp4"));
    s.select_index(summary("2"));
    assert_eq!(s.current_video(), None);
  }

  #[test]
  fn staleness_follows_session_state() {
    let mut s = Session::default();
    s.select_index(summary("1"));
    let search = Target::Search { index_id: "1".into(), query: SearchQuery::new("cat", 10), epoch: s.epoch() };
    let detail = Target::Detail { index_id: "1".into() };
    assert!(s.is_current(&search));
    assert!(s.is_current(&detail));

    s.select_index(summary("2"));
    assert!(!s.is_current(&detail));
    assert!(!s.is_current(&search));
    assert!(s.is_current(&Target::IndexList));
  }

  #[test]
  fn leaving_and_reopening_an_index_invalidates_old_searches() {
    let mut s = Session::default();
    s.select_index(summary("1"));
    let before = Target::Search { index_id: "1".into(), query: SearchQuery::new("cat", 10), epoch: s.epoch() };
    s.set_active_search("1", SearchQuery::new("cat", 10));

    s.clear_index();
    assert!(s.active_search().is_none());
    s.select_index(summary("1"));
    assert!(!s.is_current(&before));

    // Re-selecting the already current index keeps the epoch.
    let after = Target::Search { index_id: "1".into(), query: SearchQuery::new("cat", 10), epoch: s.epoch() };
    s.select_index(summary("1"));
    assert!(s.is_current(&after));
  }

  #[test]
  fn segments_target_tracks_video() {
    let mut s = Session::default();
    s.select_index(summary("1"));
    s.open_video("/a.mp4");
    let t = Target::Segments { index_id: "1".into(), path: "/a.mp4".into(), page: 1 };
    assert!(s.is_current(&t));
    s.open_video("/b.mp4");
    assert!(!s.is_current(&t));
  }
}
