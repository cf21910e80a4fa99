//! Result resolution: decides on every user action whether to ask the gateway or
//! to filter the bundled fallback corpus, and keeps the single `SearchState`
//! the renderer draws from.
//!
//! Operations are split into a synchronous `begin_*` half, which updates state and
//! tells the caller whether a network request is needed, and a `finish_*` half fed
//! with the request's outcome. The TUI runs requests on spawned tasks between the
//! two; the `async` convenience methods run both halves inline.
//!
//! Every request carries a [`Ticket`]. Starting any operation invalidates the
//! previous ticket, so a superseded request's completion is dropped instead of
//! overwriting newer state.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::constants::constants;
use crate::corpus::Corpus;
use crate::query::compose;
use crate::youtube::{Category, Gateway, GatewayError, VideoResult};

/// Where results come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  /// Backed by the remote gateway.
  Live,
  /// Backed by the fallback corpus for the rest of the session.
  Static,
}

/// What a gateway round-trip produced, as far as mode switching is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
  Items,
  Empty,
  Failure,
}

impl Mode {
  /// The only mode transition. `Static` never goes back to `Live`.
  pub fn next(self, outcome: Outcome) -> Mode {
    match (self, outcome) {
      (Mode::Static, _) => Mode::Static,
      (Mode::Live, Outcome::Items) => Mode::Live,
      (Mode::Live, Outcome::Empty | Outcome::Failure) => Mode::Static,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
  Idle,
  Loading,
  Error(String),
}

/// Keywords a fallback title must contain (any of, case-insensitive) to belong to a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
  pub id: String,
  pub keywords: Vec<String>,
}

/// Category id to title predicate, used only when filtering the fallback corpus.
#[derive(Debug, Clone, Default)]
pub struct CategoryRules {
  rules: Vec<CategoryRule>,
}

impl CategoryRules {
  pub fn new(rules: Vec<CategoryRule>) -> Self {
    let rules = rules
      .into_iter()
      .map(|r| CategoryRule { id: r.id, keywords: r.keywords.iter().map(|k| k.to_lowercase()).collect() })
      .collect();
    Self { rules }
  }

  /// Rules from `constants.ron`.
  pub fn defaults() -> Self {
    Self::new(constants().category_rules.clone())
  }

  /// Ids without a rule accept every title.
  pub fn matches(&self, category_id: &str, title: &str) -> bool {
    let Some(rule) = self.rules.iter().find(|r| r.id == category_id) else { return true };
    let title = title.to_lowercase();
    rule.keywords.iter().any(|k| title.contains(k.as_str()))
  }
}

/// Identifies one in-flight gateway request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// A search the caller has to run against the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveQuery {
  pub ticket: Ticket,
  pub query: String,
  pub max_results: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
  /// State is final; nothing to fetch.
  Resolved,
  Fetch(LiveQuery),
}

/// Everything the renderer needs, owned by the engine.
#[derive(Debug, Clone)]
pub struct SearchState {
  term: String,
  selected_category: Option<String>,
  mode: Mode,
  results: Vec<VideoResult>,
  categories: Vec<Category>,
  status: Status,
}

impl SearchState {
  fn new(term: String) -> Self {
    Self {
      term,
      selected_category: None,
      mode: Mode::Live,
      results: Vec::new(),
      categories: Vec::new(),
      status: Status::Loading,
    }
  }
}

pub struct Engine {
  state: SearchState,
  corpus: &'static Corpus,
  rules: CategoryRules,
  default_term: String,
  max_results: u32,
  /// Term the latest operation actually searches for.
  query_term: String,
  /// Startup failure to surface once the running search lands offline.
  deferred_error: Option<String>,
  next_ticket: u64,
  in_flight: Option<Ticket>,
}

impl Engine {
  pub fn new(corpus: &'static Corpus, rules: CategoryRules) -> Self {
    let default_term = constants().default_term.clone();
    Self {
      state: SearchState::new(default_term.clone()),
      corpus,
      rules,
      query_term: default_term.clone(),
      default_term,
      max_results: constants().max_results,
      deferred_error: None,
      next_ticket: 0,
      in_flight: None,
    }
  }

  pub fn with_max_results(mut self, max_results: u32) -> Self {
    self.max_results = max_results.max(1);
    self
  }

  // --- Read side ---

  pub fn results(&self) -> &[VideoResult] {
    &self.state.results
  }

  pub fn categories(&self) -> &[Category] {
    &self.state.categories
  }

  pub fn status(&self) -> &Status {
    &self.state.status
  }

  pub fn mode(&self) -> Mode {
    self.state.mode
  }

  pub fn term(&self) -> &str {
    &self.state.term
  }

  pub fn selected_category(&self) -> Option<&str> {
    self.state.selected_category.as_deref()
  }

  pub fn is_pending(&self, ticket: Ticket) -> bool {
    self.in_flight == Some(ticket)
  }

  // --- Operations ---

  /// Start up: the caller must fetch categories and pass the outcome to [`Engine::finish_categories`].
  pub fn begin_initialize(&mut self) -> Ticket {
    info!("engine: initializing");
    self.state.status = Status::Loading;
    self.issue_ticket()
  }

  /// Store the category listing outcome and kick off the initial search with the current term.
  ///
  /// If another operation started in the meantime, categories are still stored but the
  /// initial search is skipped. A fallback triggered here still reaches the results: right
  /// away when nothing is running, otherwise when the running search finishes.
  pub fn finish_categories(&mut self, ticket: Ticket, outcome: Result<Vec<Category>, GatewayError>) -> Step {
    let superseded = !self.is_pending(ticket);
    let was_live = self.state.mode == Mode::Live;
    let failed = match outcome {
      Ok(_) if !was_live => {
        debug!("engine: categories arrived after fallback, keeping fallback categories");
        false
      }
      Ok(categories) if !categories.is_empty() => {
        info!(count = categories.len(), "engine: categories loaded");
        self.state.categories = categories;
        false
      }
      Ok(_) => {
        warn!("engine: gateway returned no categories, using fallback categories");
        self.switch_to_fallback(Outcome::Empty);
        false
      }
      Err(e) => {
        error!(err = %e, "engine: category listing failed, using fallback data");
        self.switch_to_fallback(Outcome::Failure);
        true
      }
    };

    if superseded {
      debug!("engine: initial search superseded by user action");
      if was_live && self.state.mode == Mode::Static {
        let error = failed.then(|| constants().init_failed_message.clone());
        if self.in_flight.is_some() {
          self.deferred_error = error;
        } else {
          self.resolve();
          if let Some(msg) = error {
            self.state.status = Status::Error(msg);
          }
        }
      }
      return Step::Resolved;
    }
    self.in_flight = None;

    let step = self.resolve();
    if failed {
      self.state.status = Status::Error(constants().init_failed_message.clone());
    }
    step
  }

  /// New free-text search. Clears any category selection.
  pub fn begin_search(&mut self, term: &str) -> Step {
    info!(term = %term, mode = ?self.state.mode, "engine: search");
    self.state.term = term.to_string();
    self.state.selected_category = None;
    self.query_term = self.state.term.clone();
    self.resolve()
  }

  /// Select a category (`None` for all) and re-run the current term against it.
  /// An empty term is replaced by the default term.
  pub fn begin_select_category(&mut self, category_id: Option<&str>) -> Step {
    info!(category = ?category_id, mode = ?self.state.mode, "engine: select category");
    self.state.selected_category = category_id.map(str::to_string);
    self.query_term =
      if self.state.term.is_empty() { self.default_term.clone() } else { self.state.term.clone() };
    self.resolve()
  }

  /// Apply a search outcome. Returns `false` when the ticket was superseded and nothing changed.
  pub fn finish_search(&mut self, ticket: Ticket, outcome: Result<Vec<VideoResult>, GatewayError>) -> bool {
    if !self.is_pending(ticket) {
      debug!(?ticket, "engine: dropping superseded search result");
      return false;
    }
    self.in_flight = None;

    if self.state.mode == Mode::Static {
      debug!("engine: live result arrived after fallback, re-resolving offline");
      let deferred = self.deferred_error.take();
      self.resolve();
      if let Some(msg) = deferred {
        self.state.status = Status::Error(msg);
      }
      return true;
    }

    match outcome {
      Ok(items) if !items.is_empty() => {
        info!(count = items.len(), "engine: live results");
        self.state.results = items;
        self.state.status = Status::Idle;
      }
      Ok(_) => {
        warn!("engine: gateway returned no videos, falling back to static data");
        self.switch_to_fallback(Outcome::Empty);
        self.state.results = self.corpus.videos.clone();
        self.state.status = Status::Idle;
      }
      Err(e) => {
        error!(err = %e, "engine: video search failed, falling back to static data");
        self.switch_to_fallback(Outcome::Failure);
        self.state.results = self.corpus.videos.clone();
        self.state.status = Status::Error(constants().search_failed_message.clone());
      }
    }
    true
  }

  // --- Async drivers ---

  pub async fn initialize(&mut self, gateway: &dyn Gateway) {
    let ticket = self.begin_initialize();
    let outcome = gateway.list_categories().await;
    let step = self.finish_categories(ticket, outcome);
    self.drive(gateway, step).await;
  }

  pub async fn search(&mut self, gateway: &dyn Gateway, term: &str) {
    let step = self.begin_search(term);
    self.drive(gateway, step).await;
  }

  pub async fn select_category(&mut self, gateway: &dyn Gateway, category_id: Option<&str>) {
    let step = self.begin_select_category(category_id);
    self.drive(gateway, step).await;
  }

  async fn drive(&mut self, gateway: &dyn Gateway, step: Step) {
    if let Step::Fetch(live) = step {
      let outcome = gateway.search_videos(&live.query, live.max_results).await;
      self.finish_search(live.ticket, outcome);
    }
  }

  // --- Internals ---

  fn issue_ticket(&mut self) -> Ticket {
    self.next_ticket += 1;
    let ticket = Ticket(self.next_ticket);
    self.in_flight = Some(ticket);
    ticket
  }

  /// Re-derive results from the query term and selected category.
  fn resolve(&mut self) -> Step {
    self.state.status = Status::Loading;
    self.in_flight = None;
    self.deferred_error = None;

    let term = self.query_term.clone();

    match self.state.mode {
      Mode::Static => {
        self.state.results = self.filter_corpus(&term, self.state.selected_category.as_deref());
        debug!(count = self.state.results.len(), "engine: filtered fallback corpus");
        self.state.status = Status::Idle;
        Step::Resolved
      }
      Mode::Live => {
        let category_name = self
          .state
          .selected_category
          .as_deref()
          .map(|id| self.state.categories.iter().find(|c| c.id == id).map_or("", |c| c.display_name.as_str()));
        let query = compose(&term, category_name);
        let ticket = self.issue_ticket();
        debug!(query = %query, ?ticket, "engine: live query");
        Step::Fetch(LiveQuery { ticket, query, max_results: self.max_results })
      }
    }
  }

  fn filter_corpus(&self, term: &str, category_id: Option<&str>) -> Vec<VideoResult> {
    let needle = term.to_lowercase();
    self
      .corpus
      .videos
      .iter()
      .filter(|v| needle.is_empty() || v.title.to_lowercase().contains(&needle))
      .filter(|v| category_id.is_none_or(|id| self.rules.matches(id, &v.title)))
      .cloned()
      .collect()
  }

  fn switch_to_fallback(&mut self, outcome: Outcome) {
    let next = self.state.mode.next(outcome);
    if next != self.state.mode {
      warn!(?outcome, "engine: switching to static mode for the rest of the session");
    }
    self.state.mode = next;
    self.state.categories = self.corpus.categories.clone();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::corpus::corpus;
  use async_trait::async_trait;
  use std::sync::Mutex;
  use std::sync::atomic::{AtomicUsize, Ordering};

  fn video(id: &str, title: &str) -> VideoResult {
    VideoResult {
      id: id.to_string(),
      title: title.to_string(),
      channel_name: "Kanal".to_string(),
      thumbnail_url: format!("https://i.ytimg.com/vi/{}/mqdefault.jpg", id),
    }
  }

  fn category(id: &str, name: &str) -> Category {
    Category { id: id.to_string(), display_name: name.to_string() }
  }

  fn ids(results: &[VideoResult]) -> Vec<&str> {
    results.iter().map(|v| v.id.as_str()).collect()
  }

  fn engine() -> Engine {
    Engine::new(corpus(), CategoryRules::defaults())
  }

  #[derive(Clone, Copy)]
  enum Reply {
    Items,
    Empty,
    Fail,
  }

  struct MockGateway {
    categories: Reply,
    videos: Reply,
    search_calls: AtomicUsize,
    category_calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
  }

  impl MockGateway {
    fn new(categories: Reply, videos: Reply) -> Self {
      Self {
        categories,
        videos,
        search_calls: AtomicUsize::new(0),
        category_calls: AtomicUsize::new(0),
        queries: Mutex::new(Vec::new()),
      }
    }

    fn search_calls(&self) -> usize {
      self.search_calls.load(Ordering::SeqCst)
    }

    fn last_query(&self) -> Option<String> {
      self.queries.lock().unwrap().last().cloned()
    }
  }

  #[async_trait]
  impl Gateway for MockGateway {
    async fn search_videos(&self, query: &str, _max_results: u32) -> Result<Vec<VideoResult>, GatewayError> {
      self.search_calls.fetch_add(1, Ordering::SeqCst);
      self.queries.lock().unwrap().push(query.to_string());
      match self.videos {
        Reply::Items => Ok(vec![video("live1", &format!("{} eins", query)), video("live2", "zwei")]),
        Reply::Empty => Ok(Vec::new()),
        Reply::Fail => Err(GatewayError::Api { status: 403, message: "quotaExceeded".into() }),
      }
    }

    async fn list_categories(&self) -> Result<Vec<Category>, GatewayError> {
      self.category_calls.fetch_add(1, Ordering::SeqCst);
      match self.categories {
        Reply::Items => Ok(vec![category("1", "Film & Animation"), category("10", "Musik")]),
        Reply::Empty => Ok(Vec::new()),
        Reply::Fail => Err(GatewayError::MissingApiKey),
      }
    }
  }

  // --- Mode::next ---

  #[test]
  fn mode_transitions_are_one_way() {
    assert_eq!(Mode::Live.next(Outcome::Items), Mode::Live);
    assert_eq!(Mode::Live.next(Outcome::Empty), Mode::Static);
    assert_eq!(Mode::Live.next(Outcome::Failure), Mode::Static);
    assert_eq!(Mode::Static.next(Outcome::Items), Mode::Static);
    assert_eq!(Mode::Static.next(Outcome::Empty), Mode::Static);
  }

  // --- CategoryRules ---

  #[test]
  fn default_rules_match_keywords_case_insensitively() {
    let rules = CategoryRules::defaults();
    assert!(rules.matches("1", "KINDERLIEDER-MIX"));
    assert!(!rules.matches("1", "Learning Videos"));
    assert!(rules.matches("2", "Fun Educational"));
    assert!(rules.matches("2", "Preschool LEARNING"));
    assert!(rules.matches("3", "Cartoon Time"));
    assert!(rules.matches("3", "Animation Special"));
    assert!(!rules.matches("3", "Kinderlieder"));
  }

  #[test]
  fn unknown_category_accepts_everything() {
    let rules = CategoryRules::defaults();
    assert!(rules.matches("42", "anything"));
  }

  #[test]
  fn custom_rules_replace_defaults() {
    let rules = CategoryRules::new(vec![CategoryRule { id: "1".into(), keywords: vec!["Tiere".into()] }]);
    assert!(rules.matches("1", "Lustige tiere"));
    assert!(!rules.matches("1", "Kinderlieder"));
    assert!(rules.matches("2", "whatever"));
  }

  // --- Initial state ---

  #[test]
  fn starts_live_and_loading_with_default_term() {
    let e = engine();
    assert_eq!(e.mode(), Mode::Live);
    assert_eq!(*e.status(), Status::Loading);
    assert_eq!(e.term(), "kinderlieder");
    assert!(e.results().is_empty());
  }

  // --- initialize ---

  #[tokio::test]
  async fn initialize_with_failing_categories_falls_back() {
    let gw = MockGateway::new(Reply::Fail, Reply::Items);
    let mut e = engine();
    e.initialize(&gw).await;

    assert_eq!(e.mode(), Mode::Static);
    assert_eq!(e.categories(), corpus().categories.as_slice());
    assert_eq!(ids(e.results()), ["riF8E7wtZH8", "R6KqXS4Ilas", "N2bs935Eudw"]);
    assert!(matches!(e.status(), Status::Error(msg) if !msg.is_empty()));
    assert_eq!(gw.search_calls(), 0);
  }

  #[tokio::test]
  async fn initialize_with_empty_categories_falls_back_silently() {
    let gw = MockGateway::new(Reply::Empty, Reply::Items);
    let mut e = engine();
    e.initialize(&gw).await;

    assert_eq!(e.mode(), Mode::Static);
    assert_eq!(e.categories().len(), 3);
    assert_eq!(e.results().len(), 3);
    assert_eq!(*e.status(), Status::Idle);
    assert_eq!(gw.search_calls(), 0);
  }

  #[tokio::test]
  async fn initialize_live_stores_categories_and_searches_default_term() {
    let gw = MockGateway::new(Reply::Items, Reply::Items);
    let mut e = engine();
    e.initialize(&gw).await;

    assert_eq!(e.mode(), Mode::Live);
    assert_eq!(e.categories().len(), 2);
    assert_eq!(ids(e.results()), ["live1", "live2"]);
    assert_eq!(*e.status(), Status::Idle);
    assert_eq!(gw.last_query().as_deref(), Some("kinderlieder"));
    assert_eq!(gw.category_calls.load(Ordering::SeqCst), 1);
  }

  // --- search, live ---

  #[tokio::test]
  async fn live_search_replaces_results_with_returned_items() {
    let gw = MockGateway::new(Reply::Items, Reply::Items);
    let mut e = engine();
    e.initialize(&gw).await;
    e.search(&gw, "tiere").await;

    assert_eq!(e.mode(), Mode::Live);
    assert_eq!(e.results()[0].title, "tiere eins");
    assert_eq!(e.results().len(), 2);
    assert_eq!(e.term(), "tiere");
    assert_eq!(gw.last_query().as_deref(), Some("tiere"));
  }

  #[tokio::test]
  async fn empty_live_search_falls_back_without_error() {
    let gw = MockGateway::new(Reply::Items, Reply::Empty);
    let mut e = engine();
    e.initialize(&gw).await;

    assert_eq!(e.mode(), Mode::Static);
    assert_eq!(e.results(), corpus().videos.as_slice());
    assert_eq!(*e.status(), Status::Idle);
    assert_eq!(e.categories(), corpus().categories.as_slice());
  }

  #[tokio::test]
  async fn failing_live_search_falls_back_with_error() {
    let gw = MockGateway::new(Reply::Items, Reply::Fail);
    let mut e = engine();
    e.initialize(&gw).await;

    assert_eq!(e.mode(), Mode::Static);
    assert_eq!(e.results(), corpus().videos.as_slice());
    assert_eq!(*e.status(), Status::Error(constants().search_failed_message.clone()));
  }

  #[tokio::test]
  async fn no_gateway_calls_once_static() {
    let gw = MockGateway::new(Reply::Items, Reply::Fail);
    let mut e = engine();
    e.initialize(&gw).await;
    assert_eq!(gw.search_calls(), 1);

    e.search(&gw, "lieder").await;
    e.select_category(&gw, Some("2")).await;
    e.select_category(&gw, None).await;
    e.search(&gw, "").await;

    assert_eq!(gw.search_calls(), 1);
    assert_eq!(e.mode(), Mode::Static);
  }

  #[tokio::test]
  async fn search_is_idempotent() {
    let gw = MockGateway::new(Reply::Items, Reply::Items);
    let mut e = engine();
    e.initialize(&gw).await;
    e.search(&gw, "tiere").await;
    let first = e.results().to_vec();
    e.search(&gw, "tiere").await;
    assert_eq!(e.results(), first.as_slice());
  }

  // --- search, static ---

  #[tokio::test]
  async fn static_search_filters_by_title_substring() {
    let gw = MockGateway::new(Reply::Fail, Reply::Fail);
    let mut e = engine();
    e.initialize(&gw).await;

    e.search(&gw, "LEARNING").await;
    assert_eq!(ids(e.results()), ["iz621fw5pUc"]);
    assert_eq!(*e.status(), Status::Idle);

    e.search(&gw, "sekunden").await;
    assert_eq!(ids(e.results()), ["N2bs935Eudw"]);

    e.search(&gw, "dinosaurier").await;
    assert!(e.results().is_empty());
  }

  #[tokio::test]
  async fn static_search_with_empty_term_returns_everything() {
    let gw = MockGateway::new(Reply::Fail, Reply::Fail);
    let mut e = engine();
    e.initialize(&gw).await;
    e.search(&gw, "").await;
    assert_eq!(e.results().len(), 4);
  }

  #[tokio::test]
  async fn search_clears_category_selection() {
    let gw = MockGateway::new(Reply::Fail, Reply::Fail);
    let mut e = engine();
    e.initialize(&gw).await;
    e.select_category(&gw, Some("1")).await;
    assert_eq!(e.selected_category(), Some("1"));
    e.search(&gw, "mix").await;
    assert_eq!(e.selected_category(), None);
  }

  // --- select_category, static ---

  #[tokio::test]
  async fn static_category_filters() {
    let gw = MockGateway::new(Reply::Fail, Reply::Fail);
    let mut e = engine();
    e.initialize(&gw).await;
    e.search(&gw, "").await;

    e.select_category(&gw, Some("1")).await;
    assert_eq!(ids(e.results()), ["riF8E7wtZH8", "R6KqXS4Ilas", "N2bs935Eudw"]);

    // Empty term falls back to the default term, which no English title contains.
    e.select_category(&gw, Some("2")).await;
    assert!(e.results().is_empty());

    e.select_category(&gw, Some("3")).await;
    assert!(e.results().is_empty());

    e.select_category(&gw, Some("99")).await;
    assert_eq!(e.results().len(), 3);
  }

  #[tokio::test]
  async fn static_category_combines_with_term() {
    let gw = MockGateway::new(Reply::Fail, Reply::Fail);
    let mut e = engine();
    e.initialize(&gw).await;

    e.search(&gw, "fun").await;
    e.select_category(&gw, Some("2")).await;
    assert_eq!(ids(e.results()), ["iz621fw5pUc"]);
    assert_eq!(e.term(), "fun");

    e.select_category(&gw, Some("1")).await;
    assert!(e.results().is_empty());

    e.select_category(&gw, None).await;
    assert_eq!(ids(e.results()), ["iz621fw5pUc"]);
  }

  // --- select_category, live ---

  #[tokio::test]
  async fn live_category_adds_display_name_to_query() {
    let gw = MockGateway::new(Reply::Items, Reply::Items);
    let mut e = engine();
    e.initialize(&gw).await;

    e.select_category(&gw, Some("10")).await;
    assert_eq!(gw.last_query().as_deref(), Some("kinderlieder Musik"));
    assert_eq!(e.mode(), Mode::Live);

    e.search(&gw, "").await;
    e.select_category(&gw, Some("1")).await;
    assert_eq!(gw.last_query().as_deref(), Some("kinderlieder Film & Animation"));

    e.search(&gw, "tiere").await;
    e.select_category(&gw, Some("unknown")).await;
    assert_eq!(gw.last_query().as_deref(), Some("tiere"));

    e.select_category(&gw, None).await;
    assert_eq!(gw.last_query().as_deref(), Some("tiere"));
  }

  #[test]
  fn failing_live_category_search_falls_back_with_error() {
    let mut e = engine();
    let t = e.begin_initialize();
    let Step::Fetch(initial) = e.finish_categories(t, Ok(vec![category("1", "Film & Animation")])) else { panic!() };
    assert!(e.finish_search(initial.ticket, Ok(vec![video("a", "A")])));

    let Step::Fetch(live) = e.begin_select_category(Some("1")) else { panic!() };
    assert_eq!(live.query, "kinderlieder Film & Animation");
    assert!(e.finish_search(live.ticket, Err(GatewayError::Api { status: 500, message: "backendError".into() })));

    assert_eq!(e.mode(), Mode::Static);
    assert_eq!(e.results(), corpus().videos.as_slice());
    assert_eq!(e.categories(), corpus().categories.as_slice());
    assert_eq!(e.selected_category(), Some("1"));
    assert_eq!(*e.status(), Status::Error(constants().search_failed_message.clone()));
  }

  // --- Default term ---

  #[tokio::test]
  async fn select_all_after_empty_search_uses_default_term_offline() {
    let gw = MockGateway::new(Reply::Fail, Reply::Fail);
    let mut e = engine();
    e.initialize(&gw).await;

    e.search(&gw, "").await;
    assert_eq!(e.results().len(), 4);

    e.select_category(&gw, None).await;
    assert_eq!(ids(e.results()), ["riF8E7wtZH8", "R6KqXS4Ilas", "N2bs935Eudw"]);
    assert_eq!(e.term(), "");
  }

  #[tokio::test]
  async fn select_all_after_empty_search_uses_default_term_live() {
    let gw = MockGateway::new(Reply::Items, Reply::Items);
    let mut e = engine();
    e.initialize(&gw).await;

    e.search(&gw, "").await;
    e.select_category(&gw, None).await;
    assert_eq!(gw.last_query().as_deref(), Some("kinderlieder"));
    assert_eq!(e.mode(), Mode::Live);
  }

  // --- Tickets / status ---

  #[test]
  fn begin_sets_loading_until_finished() {
    let mut e = engine();
    let t = e.begin_initialize();
    let step = e.finish_categories(t, Ok(vec![category("1", "Film")]));
    let Step::Fetch(live) = step else { panic!("expected a live fetch") };
    assert_eq!(*e.status(), Status::Loading);
    assert!(e.finish_search(live.ticket, Ok(vec![video("a", "A")])));
    assert_eq!(*e.status(), Status::Idle);
  }

  #[test]
  fn superseded_search_result_is_dropped() {
    let mut e = engine();
    let t = e.begin_initialize();
    let Step::Fetch(first) = e.finish_categories(t, Ok(vec![category("1", "Film")])) else { panic!() };
    let Step::Fetch(second) = e.begin_search("tiere") else { panic!() };

    assert!(!e.finish_search(first.ticket, Err(GatewayError::Interrupted)));
    assert_eq!(e.mode(), Mode::Live);
    assert_eq!(*e.status(), Status::Loading);

    assert!(e.finish_search(second.ticket, Ok(vec![video("t", "Tiere")])));
    assert_eq!(ids(e.results()), ["t"]);
  }

  #[test]
  fn user_action_during_initialize_skips_initial_search() {
    let mut e = engine();
    let t = e.begin_initialize();
    let Step::Fetch(user) = e.begin_search("tiere") else { panic!() };

    assert_eq!(e.finish_categories(t, Ok(vec![category("1", "Film")])), Step::Resolved);
    assert_eq!(e.categories().len(), 1);
    assert!(e.is_pending(user.ticket));
  }

  #[test]
  fn live_result_after_fallback_is_resolved_offline() {
    let mut e = engine();
    let t = e.begin_initialize();
    let Step::Fetch(user) = e.begin_search("learning") else { panic!() };
    assert_eq!(e.finish_categories(t, Err(GatewayError::MissingApiKey)), Step::Resolved);
    assert_eq!(e.mode(), Mode::Static);

    assert!(e.finish_search(user.ticket, Ok(vec![video("x", "X")])));
    assert_eq!(ids(e.results()), ["iz621fw5pUc"]);
    assert_eq!(*e.status(), Status::Error(constants().init_failed_message.clone()));
  }

  #[test]
  fn category_failure_after_finished_search_replaces_live_results() {
    let mut e = engine();
    let t = e.begin_initialize();
    let Step::Fetch(user) = e.begin_search("tiere") else { panic!() };
    assert!(e.finish_search(user.ticket, Ok(vec![video("live", "Tiere live")])));
    assert_eq!(e.mode(), Mode::Live);

    assert_eq!(e.finish_categories(t, Err(GatewayError::MissingApiKey)), Step::Resolved);
    assert_eq!(e.mode(), Mode::Static);
    assert_eq!(e.categories(), corpus().categories.as_slice());
    assert!(e.results().is_empty());
    assert_eq!(*e.status(), Status::Error(constants().init_failed_message.clone()));
  }

  #[test]
  fn categories_arriving_after_fallback_keep_fallback_categories() {
    let mut e = engine();
    let t = e.begin_initialize();
    let Step::Fetch(user) = e.begin_search("learning") else { panic!() };
    assert!(e.finish_search(user.ticket, Err(GatewayError::Interrupted)));

    assert_eq!(e.finish_categories(t, Ok(vec![category("10", "Musik")])), Step::Resolved);
    assert_eq!(e.categories(), corpus().categories.as_slice());
    assert_eq!(*e.status(), Status::Error(constants().search_failed_message.clone()));
  }

  #[test]
  fn max_results_is_passed_through() {
    let mut e = engine().with_max_results(5);
    let Step::Fetch(live) = e.begin_search("x") else { panic!() };
    assert_eq!(live.max_results, 5);
  }
}
