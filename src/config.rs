use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::constants::constants;
use crate::engine::{CategoryRule, CategoryRules};

/// User preferences from `prefs.toml` in the platform config dir.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Config {
  pub theme_name: Option<String>,
  pub display_mode: Option<String>,
  pub region_code: Option<String>,
  pub max_results: Option<u32>,
  /// Replaces the built-in offline category keyword rules when set.
  pub category_rules: Option<Vec<CategoryRule>>,
}

impl Config {
  pub fn load() -> Self {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "kkkiste") {
      let config_file = proj_dirs.config_dir().join("prefs.toml");
      if let Ok(content) = std::fs::read_to_string(config_file) {
        return Self::parse(&content);
      }
    }
    Self::default()
  }

  /// Malformed files yield defaults rather than an error.
  pub fn parse(content: &str) -> Self {
    match toml::from_str(content) {
      Ok(config) => config,
      Err(e) => {
        tracing::warn!(err = %e, "config: ignoring malformed prefs.toml");
        Self::default()
      }
    }
  }

  pub fn save(&self) {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "kkkiste") {
      let config_dir = proj_dirs.config_dir();
      if std::fs::create_dir_all(config_dir).is_ok() {
        let config_file = config_dir.join("prefs.toml");
        if let Ok(content) = toml::to_string(self) {
          let _ = std::fs::write(config_file, content);
        }
      }
    }
  }

  pub fn region_code(&self) -> String {
    self.region_code.clone().unwrap_or_else(|| constants().region_code.clone())
  }

  pub fn max_results(&self) -> u32 {
    self.max_results.unwrap_or(constants().max_results)
  }

  pub fn category_rules(&self) -> CategoryRules {
    match &self.category_rules {
      Some(rules) => CategoryRules::new(rules.clone()),
      None => CategoryRules::defaults(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_file_uses_defaults() {
    let config = Config::parse("");
    assert_eq!(config, Config::default());
    assert_eq!(config.region_code(), "DE");
    assert_eq!(config.max_results(), 20);
  }

  #[test]
  fn malformed_file_uses_defaults() {
    assert_eq!(Config::parse("theme_name = [unclosed"), Config::default());
  }

  #[test]
  fn overrides_are_read() {
    let config = Config::parse(
      r#"
theme_name = "Mint"
region_code = "AT"
max_results = 12

[[category_rules]]
id = "1"
keywords = ["Tiere"]
"#,
    );
    assert_eq!(config.theme_name.as_deref(), Some("Mint"));
    assert_eq!(config.region_code(), "AT");
    assert_eq!(config.max_results(), 12);
    let rules = config.category_rules();
    assert!(rules.matches("1", "Lustige Tiere"));
    assert!(!rules.matches("1", "Kinderlieder"));
  }

  #[test]
  fn default_rules_when_not_configured() {
    let rules = Config::default().category_rules();
    assert!(rules.matches("3", "Animation"));
  }
}
