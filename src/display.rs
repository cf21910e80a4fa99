use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliDisplayMode {
  Auto,
  Direct,
  Ascii,
}

/// How thumbnails are drawn in the preview pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
  Ascii,
  Direct,
}

impl DisplayMode {
  pub fn label(self) -> &'static str {
    match self {
      DisplayMode::Ascii => "ASCII",
      DisplayMode::Direct => "Half-block",
    }
  }
}

impl CliDisplayMode {
  pub fn from_config(s: &str) -> Self {
    match s.to_lowercase().as_str() {
      "direct" => CliDisplayMode::Direct,
      "ascii" => CliDisplayMode::Ascii,
      _ => CliDisplayMode::Auto,
    }
  }
}

/// Half-blocks need true colour; anything else gets ASCII shading.
fn mode_for_colorterm(colorterm: &str) -> DisplayMode {
  match colorterm.to_lowercase().as_str() {
    "truecolor" | "24bit" => DisplayMode::Direct,
    _ => DisplayMode::Ascii,
  }
}

pub fn detect_display_mode() -> DisplayMode {
  mode_for_colorterm(&std::env::var("COLORTERM").unwrap_or_default())
}

pub fn resolve_display_mode(cli: CliDisplayMode) -> DisplayMode {
  match cli {
    CliDisplayMode::Auto => detect_display_mode(),
    CliDisplayMode::Direct => DisplayMode::Direct,
    CliDisplayMode::Ascii => DisplayMode::Ascii,
  }
}
