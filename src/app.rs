use ratatui::widgets::ListState;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::bridge::HostBridge;
use crate::config::Config;
use crate::constants::constants;
use crate::error::{BridgeError, ConsoleError, GatewayError};
use crate::gateway::Backend;
use crate::input::TextField;
use crate::models::{IndexDetail, IndexSummary, SearchQuery, SearchResultRow, SegmentPage, VideoSegment};
use crate::pagination::{PageNav, total_pages, window_for};
use crate::session::{Session, Target};
use crate::theme::THEMES;
use crate::timecode::format_secs_f64;

// --- Types ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
  IndexList,
  CreateIndex,
  IndexDetail,
  Search,
  VideoDetail,
}

/// What the search pane shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchState {
  /// Nothing searched yet for the current index.
  #[default]
  Idle,
  Results(Vec<SearchResultRow>),
  /// The last search came back with no rows.
  Empty,
}

/// Where the paths chosen in the file dialog go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickPurpose {
  CreateForm,
  AddToIndex,
}

/// A destructive action waiting for the user's yes/no.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destructive {
  DeleteIndex { id: String, name: String },
  RemoveFile { path: String },
}

impl Destructive {
  pub fn prompt(&self) -> String {
    match self {
      Destructive::DeleteIndex { name, .. } => format!("Delete index '{}' and all of its transcripts?", name),
      Destructive::RemoveFile { path } => format!("Remove '{}' from this index?", crate::models::file_name(path)),
    }
  }
}

/// Per-action loading flags. Derived from task-slot occupancy, so they are
/// released whenever a result (or a dropped task) is taken out of the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loading {
  List,
  Detail,
  Search,
  Segments,
  Mutation,
  Picker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreateField {
  #[default]
  Name,
  Path,
  Files,
}

#[derive(Debug, Default)]
pub struct CreateForm {
  pub name: TextField,
  /// Manual path entry for hosts without a native dialog.
  pub path: TextField,
  pub files: Vec<String>,
  pub focus: CreateField,
  pub file_state: ListState,
}

impl CreateForm {
  /// Append paths, skipping blanks and ones already listed. Returns how many were added.
  pub fn add_files<I: IntoIterator<Item = String>>(&mut self, paths: I) -> usize {
    let mut added = 0;
    for p in paths {
      let p = p.trim().to_string();
      if !p.is_empty() && !self.files.contains(&p) {
        self.files.push(p);
        added += 1;
      }
    }
    if self.file_state.selected().is_none() && !self.files.is_empty() {
      self.file_state.select(Some(0));
    }
    added
  }

  pub fn remove_selected(&mut self) {
    let Some(i) = self.file_state.selected() else { return };
    if i < self.files.len() {
      self.files.remove(i);
    }
    if self.files.is_empty() {
      self.file_state.select(None);
    } else if i >= self.files.len() {
      self.file_state.select(Some(self.files.len() - 1));
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchField {
  #[default]
  Query,
  Keyword,
  Results,
}

#[derive(Debug)]
pub struct SearchForm {
  pub query: TextField,
  pub keyword: TextField,
  pub focus: SearchField,
  pub limit: usize,
  /// Restrict the search to the currently open video.
  pub scope_to_video: bool,
}

impl Default for SearchForm {
  fn default() -> Self {
    Self {
      query: TextField::default(),
      keyword: TextField::default(),
      focus: SearchField::Query,
      limit: constants().default_search_limit,
      scope_to_video: false,
    }
  }
}

/// Sequence number plus the target a request was dispatched for.
#[derive(Debug, Clone)]
pub struct Ticket {
  pub seq: u64,
  pub target: Target,
}

pub(crate) struct Pending<T> {
  ticket: Ticket,
  rx: oneshot::Receiver<T>,
}

/// Successful outcome of a backend mutation.
#[derive(Debug)]
pub enum MutationDone {
  Created(IndexDetail),
  Deleted { id: String },
  FilesAdded { index_id: String, count: usize },
  FileRemoved { index_id: String, path: String },
}

type Reply<T> = Result<T, GatewayError>;

/// In-flight request slots. Dispatching into an occupied slot replaces it.
#[derive(Default)]
pub(crate) struct AsyncTasks {
  list: Option<Pending<Reply<Vec<IndexSummary>>>>,
  detail: Option<Pending<Reply<IndexDetail>>>,
  search: Option<Pending<Reply<Vec<SearchResultRow>>>>,
  segments: Option<Pending<Reply<SegmentPage>>>,
  mutation: Option<Pending<Reply<MutationDone>>>,
  picker: Option<(PickPurpose, oneshot::Receiver<Result<Vec<String>, BridgeError>>)>,
}

impl AsyncTasks {
  #[cfg(test)]
  fn is_empty(&self) -> bool {
    self.list.is_none()
      && self.detail.is_none()
      && self.search.is_none()
      && self.segments.is_none()
      && self.mutation.is_none()
      && self.picker.is_none()
  }
}

/// Take a finished result out of `slot`. `Err(ticket)` means the task died without replying.
fn poll_slot<T>(slot: &mut Option<Pending<T>>) -> Option<Result<(Ticket, T), Ticket>> {
  let mut pending = slot.take()?;
  match pending.rx.try_recv() {
    Ok(value) => Some(Ok((pending.ticket, value))),
    Err(oneshot::error::TryRecvError::Empty) => {
      *slot = Some(pending);
      None
    }
    Err(oneshot::error::TryRecvError::Closed) => Some(Err(pending.ticket)),
  }
}

fn in_flight_for<T>(slot: &Option<Pending<T>>, target: &Target) -> bool {
  slot.as_ref().is_some_and(|p| &p.ticket.target == target)
}

// --- App State ---

pub struct App {
  pub session: Session,
  pub view: View,
  pub indexes: Vec<IndexSummary>,
  pub detail: Option<IndexDetail>,
  pub search: SearchState,
  pub segments: Vec<VideoSegment>,
  pub create_form: CreateForm,
  pub search_form: SearchForm,
  pub confirm: Option<Destructive>,
  /// Selection in whichever list the current view shows.
  pub list_state: ListState,
  pub theme_index: usize,
  pub last_error: Option<String>,
  /// Informational message, lower priority than loading/error.
  pub info_message: Option<String>,
  pub should_quit: bool,
  /// Shown in the header, e.g. the backend base URL.
  pub backend_label: String,
  pub(crate) tasks: AsyncTasks,
  seq: u64,
  backend: Arc<dyn Backend>,
  bridge: Arc<dyn HostBridge>,
  config: Config,
  /// When the last error was set, used for auto-dismiss.
  error_time: Option<Instant>,
}

impl App {
  pub fn new(backend: Arc<dyn Backend>, bridge: Arc<dyn HostBridge>, config: Config) -> Self {
    let theme_index =
      if let Some(ref name) = config.theme_name { THEMES.iter().position(|t| t.name == name.as_str()).unwrap_or(0) } else { 0 };

    Self {
      session: Session::default(),
      view: View::IndexList,
      indexes: Vec::new(),
      detail: None,
      search: SearchState::Idle,
      segments: Vec::new(),
      create_form: CreateForm::default(),
      search_form: SearchForm::default(),
      confirm: None,
      list_state: ListState::default(),
      theme_index,
      last_error: None,
      info_message: None,
      should_quit: false,
      backend_label: String::new(),
      tasks: AsyncTasks::default(),
      seq: 0,
      backend,
      bridge,
      config,
      error_time: None,
    }
  }

  pub fn theme(&self) -> &'static crate::theme::Theme {
    // theme_index is bounded by modular arithmetic in next_theme() and by position() in new().
    &THEMES[self.theme_index]
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.config.theme_name = Some(self.theme().name.to_string());
    self.config.save();
  }

  // --- Notifications ---

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.info_message = None;
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  /// Clear the current error message and its expiry timer.
  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages after the configured delay.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(constants().error_dismiss_secs)
    {
      self.clear_error();
    }
  }

  fn report(&mut self, err: impl Into<ConsoleError>) {
    let err = err.into();
    match &err {
      ConsoleError::Validation(msg) => debug!(msg = %msg, "rejected before dispatch"),
      ConsoleError::Gateway(e) => warn!(status = ?e.status, err = %e, "backend call failed"),
      ConsoleError::Bridge(e) => warn!(err = %e, "host operation failed"),
    }
    self.set_error(err.to_string());
  }

  fn notify(&mut self, msg: impl Into<String>) {
    self.info_message = Some(msg.into());
  }

  // --- Loading state ---

  pub fn is_loading(&self, kind: Loading) -> bool {
    match kind {
      Loading::List => self.tasks.list.is_some(),
      Loading::Detail => self.tasks.detail.is_some(),
      Loading::Search => self.tasks.search.is_some(),
      Loading::Segments => self.tasks.segments.is_some(),
      Loading::Mutation => self.tasks.mutation.is_some(),
      Loading::Picker => self.tasks.picker.is_some(),
    }
  }

  /// Whether nothing is in flight.
  #[cfg(test)]
  pub fn is_idle(&self) -> bool {
    self.tasks.is_empty()
  }

  /// Status line text for the most relevant in-flight action.
  pub fn loading_message(&self) -> Option<&'static str> {
    if self.is_loading(Loading::Picker) {
      Some("Waiting for file dialog…")
    } else if self.is_loading(Loading::Mutation) {
      Some("Saving…")
    } else if self.is_loading(Loading::Search) {
      Some("Searching…")
    } else if self.is_loading(Loading::Segments) {
      Some("Loading transcript…")
    } else if self.is_loading(Loading::Detail) {
      Some("Loading index…")
    } else if self.is_loading(Loading::List) {
      Some("Loading indexes…")
    } else {
      None
    }
  }

  // --- Dispatch ---

  /// Spawn `call` against the backend and return the slot entry that will receive its reply.
  fn dispatch<T, F, Fut>(&mut self, target: Target, call: F) -> Pending<T>
  where
    F: FnOnce(Arc<dyn Backend>) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
  {
    self.seq += 1;
    let ticket = Ticket { seq: self.seq, target };
    debug!(seq = ticket.seq, target = ?ticket.target, "dispatch");
    let fut = call(Arc::clone(&self.backend));
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(fut.await);
    });
    Pending { ticket, rx }
  }

  /// `force` replaces a same-target request already in flight, whose reply may predate a change.
  fn fetch_list(&mut self, force: bool) {
    if !force && in_flight_for(&self.tasks.list, &Target::IndexList) {
      return;
    }
    let pending = self.dispatch(Target::IndexList, |b| async move { b.list_indexes().await });
    self.tasks.list = Some(pending);
  }

  fn fetch_detail(&mut self, index_id: &str, force: bool) {
    let target = Target::Detail { index_id: index_id.to_string() };
    if !force && in_flight_for(&self.tasks.detail, &target) {
      return;
    }
    let id = index_id.to_string();
    let pending = self.dispatch(target, |b| async move { b.get_index(&id).await });
    self.tasks.detail = Some(pending);
  }

  fn fetch_segments(&mut self, page: usize) {
    let (Some(index_id), Some(path)) = (self.session.current_index_id(), self.session.current_video()) else {
      return;
    };
    let (index_id, path) = (index_id.to_string(), path.to_string());
    let target = Target::Segments { index_id: index_id.clone(), path: path.clone(), page };
    if in_flight_for(&self.tasks.segments, &target) {
      return;
    }
    let page_size = constants().segment_page_size;
    let pending =
      self.dispatch(target, |b| async move { b.get_video_segments(&index_id, &path, page, page_size).await });
    self.tasks.segments = Some(pending);
  }

  /// Only one mutation runs at a time.
  fn begin_mutation<F, Fut>(&mut self, call: F) -> Result<(), ConsoleError>
  where
    F: FnOnce(Arc<dyn Backend>) -> Fut,
    Fut: Future<Output = Reply<MutationDone>> + Send + 'static,
  {
    if self.tasks.mutation.is_some() {
      return Err(ConsoleError::validation("Another change is still being saved."));
    }
    let pending = self.dispatch(Target::Mutation, call);
    self.tasks.mutation = Some(pending);
    Ok(())
  }

  // --- Navigation ---

  /// Show the index list and refetch it. Leaves the current index.
  pub fn open_index_list(&mut self) {
    self.leave_index();
    self.fetch_list(false);
  }

  fn leave_index(&mut self) {
    self.session.clear_index();
    self.detail = None;
    self.search = SearchState::Idle;
    self.segments.clear();
    self.view = View::IndexList;
    self.select_first(self.visible_indexes().len());
  }

  /// Refetch the index list without changing view.
  pub fn refresh_list(&mut self) {
    self.fetch_list(false);
  }

  pub fn select_index(&mut self, summary: IndexSummary) {
    info!(index_id = %summary.id, name = %summary.name, "select index");
    let switching = self.session.current_index_id() != Some(summary.id.as_str());
    let id = summary.id.clone();
    self.session.select_index(summary);
    if switching {
      self.detail = None;
      self.search = SearchState::Idle;
      self.segments.clear();
    }
    self.view = View::IndexDetail;
    self.select_first(self.detail.as_ref().map_or(0, |d| d.files.len()));
    self.fetch_detail(&id, false);
  }

  /// Refetch the current index's detail in place.
  pub fn refresh_detail(&mut self) {
    if let Some(id) = self.session.current_index_id().map(str::to_string) {
      self.fetch_detail(&id, false);
    }
  }

  pub fn open_create_form(&mut self) {
    self.create_form = CreateForm::default();
    self.view = View::CreateIndex;
  }

  pub fn open_search(&mut self) {
    if self.session.current_index().is_none() {
      self.report(ConsoleError::validation("Select an index first."));
      return;
    }
    self.search_form.focus = SearchField::Query;
    self.view = View::Search;
    self.select_first(self.search_rows().len());
  }

  pub fn open_video_detail(&mut self, path: &str) {
    if !self.session.open_video(path) {
      self.report(ConsoleError::validation("Select an index first."));
      return;
    }
    info!(path, "open video detail");
    self.segments.clear();
    self.view = View::VideoDetail;
    self.list_state.select(None);
    self.fetch_segments(1);
  }

  /// One level up: video/search → detail → list.
  pub fn back(&mut self) {
    match self.view {
      View::IndexList => {}
      View::CreateIndex | View::IndexDetail => self.open_index_list(),
      View::Search => {
        self.view = View::IndexDetail;
        self.select_first(self.detail.as_ref().map_or(0, |d| d.files.len()));
      }
      View::VideoDetail => {
        self.session.close_video();
        self.segments.clear();
        self.view = View::IndexDetail;
        self.select_first(self.detail.as_ref().map_or(0, |d| d.files.len()));
      }
    }
  }

  // --- Paging ---

  /// Index list rows on the current page.
  pub fn visible_indexes(&self) -> &[IndexSummary] {
    window_for(&self.indexes, constants().index_page_size, self.session.list_pager.page())
  }

  pub fn list_page(&mut self, nav: PageNav) {
    if self.session.list_pager.go(nav) {
      self.select_first(self.visible_indexes().len());
    }
  }

  /// Request another transcript page. The cursor moves when the page arrives.
  pub fn segment_page(&mut self, nav: PageNav) {
    if self.session.current_video().is_none() {
      return;
    }
    if let Some(page) = self.session.segment_pager.target(nav) {
      self.fetch_segments(page);
    }
  }

  // --- Index mutations ---

  pub fn request_delete_index(&mut self, id: &str) {
    let name = self.indexes.iter().find(|i| i.id == id).map(|i| i.name.clone());
    let name = name
      .or_else(|| self.session.current_index().filter(|i| i.id == id).map(|i| i.name.clone()))
      .unwrap_or_else(|| id.to_string());
    self.confirm = Some(Destructive::DeleteIndex { id: id.to_string(), name });
  }

  pub fn request_remove_file(&mut self, path: &str) {
    if self.session.current_index().is_none() {
      return;
    }
    self.confirm = Some(Destructive::RemoveFile { path: path.to_string() });
  }

  /// Answer the pending confirmation prompt.
  pub fn resolve_confirm(&mut self, accept: bool) {
    let Some(action) = self.confirm.take() else { return };
    if !accept {
      debug!(?action, "confirmation declined");
      return;
    }
    match action {
      Destructive::DeleteIndex { id, .. } => self.delete_index(id),
      Destructive::RemoveFile { path } => self.remove_file(path),
    }
  }

  fn delete_index(&mut self, id: String) {
    info!(index_id = %id, "delete index");
    let result = self.begin_mutation(|b| async move {
      b.delete_index(&id).await?;
      Ok::<_, GatewayError>(MutationDone::Deleted { id })
    });
    if let Err(e) = result {
      self.report(e);
    }
  }

  pub fn submit_create_form(&mut self) {
    let name = self.create_form.name.text.clone();
    let files = self.create_form.files.clone();
    self.create_index(&name, files);
  }

  pub fn create_index(&mut self, name: &str, files: Vec<String>) {
    let name = name.trim().to_string();
    let result = if name.is_empty() {
      Err(ConsoleError::validation("Enter an index name."))
    } else if files.is_empty() {
      Err(ConsoleError::validation("Select at least one video file."))
    } else {
      info!(name = %name, files = files.len(), "create index");
      self.begin_mutation(|b| async move { b.create_index(&name, &files).await.map(MutationDone::Created) })
    };
    if let Err(e) = result {
      self.report(e);
    }
  }

  pub fn add_files(&mut self, paths: Vec<String>) {
    let result = match self.session.current_index_id() {
      None => Err(ConsoleError::validation("Select an index first.")),
      Some(_) if paths.is_empty() => Err(ConsoleError::validation("No files selected.")),
      Some(id) => {
        let index_id = id.to_string();
        info!(index_id = %index_id, files = paths.len(), "add files");
        self.begin_mutation(|b| async move {
          b.add_files(&index_id, &paths).await?;
          Ok::<_, GatewayError>(MutationDone::FilesAdded { index_id, count: paths.len() })
        })
      }
    };
    if let Err(e) = result {
      self.report(e);
    }
  }

  fn remove_file(&mut self, path: String) {
    let Some(index_id) = self.session.current_index_id().map(str::to_string) else { return };
    info!(index_id = %index_id, path = %path, "remove file");
    let result = self.begin_mutation(|b| async move {
      b.remove_file(&index_id, &path).await?;
      Ok::<_, GatewayError>(MutationDone::FileRemoved { index_id, path })
    });
    if let Err(e) = result {
      self.report(e);
    }
  }

  // --- Search ---

  pub fn submit_search(&mut self) {
    let mut query = SearchQuery::new(self.search_form.query.text.trim(), self.search_form.limit);
    let keyword = self.search_form.keyword.text.trim();
    if !keyword.is_empty() {
      query.keyword = Some(keyword.to_string());
    }
    if self.search_form.scope_to_video
      && let Some(path) = self.session.current_video()
    {
      query.video_paths = Some(vec![path.to_string()]);
    }
    self.search(query);
  }

  pub fn search(&mut self, query: SearchQuery) {
    if query.query.trim().is_empty() {
      self.report(ConsoleError::validation("Enter a search term."));
      return;
    }
    let Some(index_id) = self.session.current_index_id().map(str::to_string) else {
      self.report(ConsoleError::validation("Select an index first."));
      return;
    };
    let target = Target::Search { index_id: index_id.clone(), query: query.clone(), epoch: self.session.epoch() };
    if in_flight_for(&self.tasks.search, &target) {
      debug!(query = %query.query, "search already in flight");
      return;
    }
    info!(index_id = %index_id, query = %query.query, limit = query.limit, "search");
    self.clear_error();
    let pending = self.dispatch(target, |b| async move { b.search(&index_id, &query).await });
    self.tasks.search = Some(pending);
  }

  pub fn cycle_search_limit(&mut self) {
    let choices = &constants().search_limit_choices;
    let idx = choices.iter().position(|&c| c == self.search_form.limit).map_or(0, |i| (i + 1) % choices.len());
    if let Some(&limit) = choices.get(idx) {
      self.search_form.limit = limit;
    }
  }

  pub fn toggle_search_scope(&mut self) {
    if self.session.current_video().is_none() {
      self.search_form.scope_to_video = false;
      self.notify("Open a video first to restrict the search to it.");
      return;
    }
    self.search_form.scope_to_video = !self.search_form.scope_to_video;
  }

  pub fn search_rows(&self) -> &[SearchResultRow] {
    match &self.search {
      SearchState::Results(rows) => rows,
      SearchState::Idle | SearchState::Empty => &[],
    }
  }

  // --- Host bridge ---

  pub fn pick_files(&mut self, purpose: PickPurpose) {
    if self.tasks.picker.is_some() {
      return;
    }
    let bridge = Arc::clone(&self.bridge);
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(bridge.pick_files().await);
    });
    self.tasks.picker = Some((purpose, rx));
  }

  pub fn play_segment(&mut self, path: &str, time: &str) {
    if let Err(e) = self.bridge.open_in_player(path, time) {
      self.report(e);
    } else {
      self.notify(format!("Playing {} from {}", crate::models::file_name(path), time));
    }
  }

  pub fn open_in_shell(&mut self, path: &str) {
    if let Err(e) = self.bridge.open_path(path) {
      self.report(e);
    }
  }

  /// Play whatever row is selected in the search or transcript view.
  pub fn play_selected(&mut self) {
    let Some(i) = self.list_state.selected() else { return };
    let target = match self.view {
      View::Search => self.search_rows().get(i).map(|r| (r.video_path.clone(), r.start_time.clone())),
      View::VideoDetail => match (self.session.current_video(), self.segments.get(i)) {
        (Some(path), Some(seg)) => Some((path.to_string(), format_secs_f64(seg.start))),
        _ => None,
      },
      _ => None,
    };
    if let Some((path, time)) = target {
      self.play_segment(&path, &time);
    }
  }

  // --- Selection ---

  fn select_first(&mut self, len: usize) {
    self.list_state.select(if len == 0 { None } else { Some(0) });
  }

  /// Number of rows in the list the current view shows.
  pub fn current_list_len(&self) -> usize {
    match self.view {
      View::IndexList => self.visible_indexes().len(),
      View::CreateIndex => self.create_form.files.len(),
      View::IndexDetail => self.detail.as_ref().map_or(0, |d| d.files.len()),
      View::Search => self.search_rows().len(),
      View::VideoDetail => self.segments.len(),
    }
  }

  pub fn select_next(&mut self) {
    let count = self.current_list_len();
    if count > 0 {
      let i = self.list_state.selected().map_or(0, |i| (i + 1) % count);
      self.list_state.select(Some(i));
    }
  }

  pub fn select_prev(&mut self) {
    let count = self.current_list_len();
    if count > 0 {
      let i = self.list_state.selected().map_or(0, |i| if i == 0 { count - 1 } else { i - 1 });
      self.list_state.select(Some(i));
    }
  }

  pub fn selected_summary(&self) -> Option<&IndexSummary> {
    self.list_state.selected().and_then(|i| self.visible_indexes().get(i))
  }

  pub fn selected_file(&self) -> Option<&str> {
    let detail = self.detail.as_ref()?;
    let i = self.list_state.selected()?;
    detail.files.get(i).map(|f| f.path.as_str())
  }

  fn clamp_selection(&mut self) {
    let len = self.current_list_len();
    match self.list_state.selected() {
      _ if len == 0 => self.list_state.select(None),
      Some(i) if i >= len => self.list_state.select(Some(len - 1)),
      None => self.list_state.select(Some(0)),
      Some(_) => {}
    }
  }

  // --- Result application ---

  fn is_stale(&self, ticket: &Ticket) -> bool {
    let stale = !self.session.is_current(&ticket.target);
    if stale {
      debug!(seq = ticket.seq, target = ?ticket.target, "discarding stale response");
    }
    stale
  }

  /// Drain finished requests and apply their results. Called once per UI tick.
  pub fn check_pending(&mut self) {
    if let Some(done) = poll_slot(&mut self.tasks.list) {
      match done {
        Ok((_, Ok(indexes))) => self.apply_index_list(indexes),
        Ok((_, Err(e))) => self.report(e),
        Err(_) => self.set_error("Index list request was interrupted.".to_string()),
      }
    }

    if let Some(done) = poll_slot(&mut self.tasks.detail) {
      match done {
        Ok((ticket, _)) if self.is_stale(&ticket) => {}
        Ok((_, Ok(detail))) => {
          self.session.refresh_index(&detail.summary);
          self.detail = Some(detail);
          if self.view == View::IndexDetail {
            self.clamp_selection();
          }
        }
        Ok((_, Err(e))) => self.report(e),
        Err(_) => self.set_error("Index request was interrupted.".to_string()),
      }
    }

    if let Some(done) = poll_slot(&mut self.tasks.search) {
      match done {
        Ok((ticket, _)) if self.is_stale(&ticket) => {}
        Ok((ticket, Ok(rows))) => {
          info!(rows = rows.len(), "search results");
          if let Target::Search { index_id, query, .. } = ticket.target {
            self.session.set_active_search(&index_id, query);
          }
          self.search = if rows.is_empty() { SearchState::Empty } else { SearchState::Results(rows) };
          if self.view == View::Search {
            self.select_first(self.search_rows().len());
            if !self.search_rows().is_empty() {
              self.search_form.focus = SearchField::Results;
            }
          }
        }
        Ok((_, Err(e))) => self.report(e),
        Err(_) => self.set_error("Search was interrupted.".to_string()),
      }
    }

    if let Some(done) = poll_slot(&mut self.tasks.segments) {
      match done {
        Ok((ticket, _)) if self.is_stale(&ticket) => {}
        Ok((_, Ok(page))) => {
          self.session.segment_pager.set(page.page, page.total_pages);
          self.segments = page.results;
          if self.view == View::VideoDetail {
            self.select_first(self.segments.len());
          }
        }
        Ok((_, Err(e))) => self.report(e),
        Err(_) => self.set_error("Transcript request was interrupted.".to_string()),
      }
    }

    if let Some(done) = poll_slot(&mut self.tasks.mutation) {
      match done {
        Ok((_, Ok(outcome))) => self.apply_mutation(outcome),
        Ok((_, Err(e))) => self.report(e),
        Err(_) => self.set_error("The change was interrupted; refresh to check its state.".to_string()),
      }
    }

    if let Some((purpose, mut rx)) = self.tasks.picker.take() {
      match rx.try_recv() {
        Ok(Ok(paths)) => self.apply_picked(purpose, paths),
        Ok(Err(e)) => self.report(e),
        Err(oneshot::error::TryRecvError::Empty) => self.tasks.picker = Some((purpose, rx)),
        Err(oneshot::error::TryRecvError::Closed) => self.set_error("File dialog closed unexpectedly.".to_string()),
      }
    }
  }

  fn apply_index_list(&mut self, indexes: Vec<IndexSummary>) {
    info!(count = indexes.len(), "index list loaded");
    if let Some(current) = self.session.current_index().map(|c| c.id.clone())
      && let Some(fresh) = indexes.iter().find(|i| i.id == current)
    {
      self.session.refresh_index(fresh);
    }
    self.indexes = indexes;
    self.session.list_pager.reset(total_pages(self.indexes.len(), constants().index_page_size));
    if self.view == View::IndexList {
      self.select_first(self.visible_indexes().len());
    }
  }

  fn apply_mutation(&mut self, outcome: MutationDone) {
    match outcome {
      MutationDone::Created(detail) => {
        info!(index_id = %detail.summary.id, "index created");
        let name = detail.summary.name.clone();
        self.session.select_index(detail.summary.clone());
        self.detail = Some(detail);
        self.search = SearchState::Idle;
        self.create_form = CreateForm::default();
        self.view = View::IndexDetail;
        self.select_first(self.detail.as_ref().map_or(0, |d| d.files.len()));
        self.notify(format!("Index '{}' created.", name));
      }
      MutationDone::Deleted { id } => {
        info!(index_id = %id, "index deleted");
        if self.session.current_index_id() == Some(id.as_str()) {
          self.leave_index();
        }
        self.fetch_list(true);
        self.notify("Index deleted.");
      }
      MutationDone::FilesAdded { index_id, count } => {
        self.notify(format!("Added {} file(s).", count));
        if self.session.current_index_id() == Some(index_id.as_str()) {
          self.fetch_detail(&index_id, true);
        }
      }
      MutationDone::FileRemoved { index_id, path } => {
        self.notify(format!("Removed {}.", crate::models::file_name(&path)));
        if self.session.current_index_id() != Some(index_id.as_str()) {
          return;
        }
        if self.session.current_video() == Some(path.as_str()) {
          self.session.close_video();
          self.segments.clear();
          if self.view == View::VideoDetail {
            self.view = View::IndexDetail;
          }
        }
        self.fetch_detail(&index_id, true);
      }
    }
  }

  fn apply_picked(&mut self, purpose: PickPurpose, paths: Vec<String>) {
    if paths.is_empty() {
      debug!("file dialog cancelled");
      return;
    }
    match purpose {
      PickPurpose::CreateForm => {
        let added = self.create_form.add_files(paths);
        self.notify(format!("{} file(s) selected.", self.create_form.files.len()));
        debug!(added, "create form files updated");
      }
      PickPurpose::AddToIndex => self.add_files(paths),
    }
  }
}
