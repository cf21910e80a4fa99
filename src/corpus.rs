//! Bundled fallback videos and categories, embedded from `corpus.ron`.

use serde::Deserialize;
use std::sync::LazyLock;

use crate::youtube::{Category, VideoResult};

#[derive(Debug, Deserialize)]
pub struct Corpus {
  pub videos: Vec<VideoResult>,
  pub categories: Vec<Category>,
}

static CORPUS: LazyLock<Corpus> = LazyLock::new(|| {
  // Safety: embedded at compile time, same as constants.ron.
  ron::from_str(include_str!("../corpus.ron")).expect("corpus.ron must be valid RON (embedded at compile time)")
});

/// The fallback corpus shipped with the binary.
pub fn corpus() -> &'static Corpus {
  &CORPUS
}
