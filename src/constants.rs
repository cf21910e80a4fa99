//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available,
//! no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

use crate::engine::CategoryRule;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  /// Search term used at startup and whenever a category is picked with an empty term.
  pub default_term: String,
  pub max_results: u32,

  // YouTube Data API
  pub region_code: String,
  pub api_base_url: String,
  pub watch_url_prefix: String,

  // User-facing messages
  pub search_failed_message: String,
  pub init_failed_message: String,
  pub static_banner: String,
  pub loading_message: String,
  pub no_results_message: String,

  /// Keyword rules applied to fallback titles when a category is selected offline.
  pub category_rules: Vec<CategoryRule>,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed this is a build-time error.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}
