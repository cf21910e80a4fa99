use anyhow::Result;
use image::DynamicImage;
use ratatui::widgets::ListState;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::Config;
use crate::corpus::corpus;
use crate::display::DisplayMode;
use crate::engine::{Engine, Step, Ticket};
use crate::theme::{THEMES, Theme};
use crate::youtube::{Category, Gateway, GatewayError, VideoResult, fetch_thumbnail};

// --- Types ---

pub type SearchOutcome = std::result::Result<Vec<VideoResult>, GatewayError>;
pub type CategoriesOutcome = std::result::Result<Vec<Category>, GatewayError>;
pub type ThumbnailResult = (String, Result<DynamicImage>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  Input,
  Categories,
  Results,
}

/// A spawned gateway request and the ticket the engine expects back with it.
pub(crate) struct Pending<T> {
  ticket: Ticket,
  rx: oneshot::Receiver<T>,
  handle: JoinHandle<()>,
}

/// In-flight async task receivers and handles.
#[derive(Default)]
pub(crate) struct AsyncTasks {
  pub(crate) categories: Option<Pending<CategoriesOutcome>>,
  pub(crate) search: Option<Pending<SearchOutcome>>,
  pub(crate) thumbnail_rx: Option<oneshot::Receiver<ThumbnailResult>>,
  pub(crate) thumbnail_handle: Option<JoinHandle<()>>,
}

pub struct App {
  pub engine: Engine,
  gateway: Arc<dyn Gateway>,
  http: Client,
  config: Config,
  pub input: String,
  pub cursor_position: usize,
  pub input_scroll: usize,
  pub mode: AppMode,
  pub theme_index: usize,
  pub display_mode: DisplayMode,
  pub list_state: ListState,
  /// Cursor in the category bar. 0 is "Alle", `n` is `categories()[n - 1]`.
  pub category_cursor: usize,
  pub thumbnail: Option<(String, DynamicImage)>,
  /// Thumbnail resized for the last preview area: (video id, width, height, image).
  pub resized_thumb: Option<(String, u16, u16, DynamicImage)>,
  /// UI-level errors (e.g. browser launch), separate from the engine status.
  pub last_error: Option<String>,
  pub should_quit: bool,
  pub(crate) tasks: AsyncTasks,
  error_time: Option<Instant>,
}

impl App {
  pub fn new(gateway: Arc<dyn Gateway>, http: Client, config: Config, display_mode: DisplayMode) -> Self {
    let theme_index =
      if let Some(ref name) = config.theme_name { THEMES.iter().position(|t| t.name == name).unwrap_or(0) } else { 0 };
    let engine = Engine::new(corpus(), config.category_rules()).with_max_results(config.max_results());
    let input = engine.term().to_string();
    let cursor_position = input.chars().count();

    Self {
      engine,
      gateway,
      http,
      config,
      input,
      cursor_position,
      input_scroll: 0,
      mode: AppMode::Input,
      theme_index,
      display_mode,
      list_state: ListState::default(),
      category_cursor: 0,
      thumbnail: None,
      resized_thumb: None,
      last_error: None,
      should_quit: false,
      tasks: AsyncTasks::default(),
      error_time: None,
    }
  }

  pub fn theme(&self) -> &'static Theme {
    // Safety: theme_index is always bounded by modular arithmetic in next_theme()
    // and by position() on initialization.
    &THEMES[self.theme_index]
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.config.theme_name = Some(self.theme().name.to_string());
    self.config.save();
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages after 5 seconds.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(5)
    {
      self.clear_error();
    }
  }

  pub fn selected_video(&self) -> Option<&VideoResult> {
    self.list_state.selected().and_then(|i| self.engine.results().get(i))
  }

  /// Number of entries in the category bar, including "Alle".
  pub fn category_count(&self) -> usize {
    self.engine.categories().len() + 1
  }

  // --- Engine commands ---

  /// Fetch categories in the background; the initial search follows once they arrive.
  pub fn start(&mut self) {
    let ticket = self.engine.begin_initialize();
    let gateway = Arc::clone(&self.gateway);
    let (tx, rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
      let _ = tx.send(gateway.list_categories().await);
    });
    self.tasks.categories = Some(Pending { ticket, rx, handle });
  }

  pub fn trigger_search(&mut self) {
    let term = self.input.trim().to_string();
    info!(term = %term, "search triggered");
    self.clear_error();
    let step = self.engine.begin_search(&term);
    self.dispatch(step);
  }

  pub fn trigger_select_category(&mut self) {
    let category_id = match self.category_cursor {
      0 => None,
      n => self.engine.categories().get(n - 1).map(|c| c.id.clone()),
    };
    info!(category = ?category_id, "category selected");
    self.clear_error();
    let step = self.engine.begin_select_category(category_id.as_deref());
    self.dispatch(step);
  }

  /// Abort whatever search is still running and start the next one, if any.
  fn dispatch(&mut self, step: Step) {
    if let Some(previous) = self.tasks.search.take() {
      debug!("aborting superseded search task");
      previous.handle.abort();
    }
    match step {
      Step::Resolved => self.on_results_changed(),
      Step::Fetch(live) => {
        let gateway = Arc::clone(&self.gateway);
        let (tx, rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
          let _ = tx.send(gateway.search_videos(&live.query, live.max_results).await);
        });
        self.tasks.search = Some(Pending { ticket: live.ticket, rx, handle });
      }
    }
  }

  fn on_results_changed(&mut self) {
    if self.engine.results().is_empty() {
      self.list_state.select(None);
    } else {
      self.list_state.select(Some(0));
    }
    self.category_cursor = match self.engine.selected_category() {
      Some(id) => self.engine.categories().iter().position(|c| c.id == id).map_or(0, |i| i + 1),
      None => 0,
    };
    self.trigger_thumbnail();
  }

  // --- Selection ---

  pub fn select_next(&mut self) {
    let count = self.engine.results().len();
    if count > 0 {
      let i = self.list_state.selected().map_or(0, |i| (i + 1) % count);
      self.list_state.select(Some(i));
      self.trigger_thumbnail();
    }
  }

  pub fn select_previous(&mut self) {
    let count = self.engine.results().len();
    if count > 0 {
      let i = self.list_state.selected().map_or(0, |i| if i == 0 { count - 1 } else { i - 1 });
      self.list_state.select(Some(i));
      self.trigger_thumbnail();
    }
  }

  pub fn next_category(&mut self) {
    self.category_cursor = (self.category_cursor + 1) % self.category_count();
  }

  pub fn previous_category(&mut self) {
    let count = self.category_count();
    self.category_cursor = (self.category_cursor + count - 1) % count;
  }

  /// Open the selected video on youtube.com in the default browser.
  pub fn open_selected(&mut self) {
    let Some(video) = self.selected_video() else { return };
    let url = video.watch_url();
    info!(url = %url, "opening video in browser");
    #[cfg(target_os = "macos")]
    let cmd = "open";
    #[cfg(not(target_os = "macos"))]
    let cmd = "xdg-open";
    match std::process::Command::new(cmd)
      .arg(&url)
      .stdin(std::process::Stdio::null())
      .stdout(std::process::Stdio::null())
      .stderr(std::process::Stdio::null())
      .spawn()
    {
      Ok(mut child) => {
        // Reap the child in a background thread to avoid zombie processes.
        std::thread::spawn(move || {
          let _ = child.wait();
        });
      }
      Err(e) => {
        self.set_error(format!("Browser konnte nicht geöffnet werden: {}", e));
      }
    }
  }

  // --- Thumbnails ---

  fn cancel_thumbnail(&mut self) {
    if let Some(handle) = self.tasks.thumbnail_handle.take() {
      handle.abort();
    }
    self.tasks.thumbnail_rx = None;
  }

  /// Fetch the selected video's thumbnail unless it's already shown.
  fn trigger_thumbnail(&mut self) {
    let Some(video) = self.selected_video() else {
      self.cancel_thumbnail();
      return;
    };
    if self.thumbnail.as_ref().is_some_and(|(id, _)| *id == video.id) {
      return;
    }
    let video_id = video.id.clone();
    let url = video.thumbnail_url.clone();
    self.cancel_thumbnail();

    let client = self.http.clone();
    let (tx, rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
      let image = fetch_thumbnail(&client, &url).await;
      let _ = tx.send((video_id, image));
    });
    self.tasks.thumbnail_rx = Some(rx);
    self.tasks.thumbnail_handle = Some(handle);
  }

  // --- Polling ---

  /// Feed finished background tasks into the engine. Called once per frame.
  pub fn check_pending(&mut self) {
    if let Some(mut pending) = self.tasks.categories.take() {
      let outcome = match pending.rx.try_recv() {
        Ok(outcome) => outcome,
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.categories = Some(pending);
          return self.check_search_and_thumbnail();
        }
        Err(oneshot::error::TryRecvError::Closed) => Err(GatewayError::Interrupted),
      };
      // A user action since startup owns the running search; leave it alone.
      let superseded = !self.engine.is_pending(pending.ticket);
      let step = self.engine.finish_categories(pending.ticket, outcome);
      self.category_cursor = self.category_cursor.min(self.category_count() - 1);
      if !superseded {
        self.dispatch(step);
      } else if self.tasks.search.is_none() {
        // The engine may have re-resolved offline.
        self.on_results_changed();
      }
    }

    self.check_search_and_thumbnail();
  }

  fn check_search_and_thumbnail(&mut self) {
    if let Some(mut pending) = self.tasks.search.take() {
      match pending.rx.try_recv() {
        Ok(outcome) => {
          if self.engine.finish_search(pending.ticket, outcome) {
            self.on_results_changed();
          }
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.search = Some(pending);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          if self.engine.finish_search(pending.ticket, Err(GatewayError::Interrupted)) {
            self.on_results_changed();
          }
        }
      }
    }

    if let Some(mut rx) = self.tasks.thumbnail_rx.take() {
      match rx.try_recv() {
        Ok((video_id, Ok(image))) => {
          self.thumbnail = Some((video_id, image));
          self.resized_thumb = None;
          self.tasks.thumbnail_handle = None;
        }
        Ok((video_id, Err(e))) => {
          // Preview stays empty; not worth bothering the user.
          debug!(video_id = %video_id, err = %e, "thumbnail fetch failed");
          self.tasks.thumbnail_handle = None;
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.thumbnail_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.tasks.thumbnail_handle = None;
        }
      }
    }
  }
}
