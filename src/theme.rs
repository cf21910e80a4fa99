use ratatui::style::Color;

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub status: Color,
  pub error: Color,
  /// Static-mode notice.
  pub banner: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub const THEMES: [Theme; 3] = [
  Theme {
    name: "Regenbogen",
    bg: Color::Rgb(250, 245, 255),
    fg: Color::Rgb(55, 48, 70),
    accent: Color::Rgb(147, 51, 234),
    muted: Color::Rgb(130, 120, 150),
    border: Color::Rgb(196, 181, 253),
    status: Color::Rgb(59, 130, 246),
    error: Color::Rgb(239, 68, 68),
    banner: Color::Rgb(249, 115, 22),
    highlight_fg: Color::Rgb(255, 255, 255),
    highlight_bg: Color::Rgb(168, 85, 247),
    stripe_bg: Color::Rgb(243, 236, 252),
    key_fg: Color::Rgb(255, 255, 255),
    key_bg: Color::Rgb(147, 51, 234),
  },
  Theme {
    name: "Nacht",
    bg: Color::Rgb(24, 24, 37),
    fg: Color::Rgb(205, 214, 244),
    accent: Color::Rgb(245, 194, 231),
    muted: Color::Rgb(127, 132, 156),
    border: Color::Rgb(69, 71, 90),
    status: Color::Rgb(137, 180, 250),
    error: Color::Rgb(243, 139, 168),
    banner: Color::Rgb(250, 179, 135),
    highlight_fg: Color::Rgb(24, 24, 37),
    highlight_bg: Color::Rgb(203, 166, 247),
    stripe_bg: Color::Rgb(30, 30, 46),
    key_fg: Color::Rgb(24, 24, 37),
    key_bg: Color::Rgb(245, 194, 231),
  },
  Theme {
    name: "Mint",
    bg: Color::Rgb(240, 253, 244),
    fg: Color::Rgb(20, 83, 45),
    accent: Color::Rgb(22, 163, 74),
    muted: Color::Rgb(100, 130, 110),
    border: Color::Rgb(134, 239, 172),
    status: Color::Rgb(13, 148, 136),
    error: Color::Rgb(220, 38, 38),
    banner: Color::Rgb(234, 88, 12),
    highlight_fg: Color::Rgb(255, 255, 255),
    highlight_bg: Color::Rgb(34, 197, 94),
    stripe_bg: Color::Rgb(220, 252, 231),
    key_fg: Color::Rgb(255, 255, 255),
    key_bg: Color::Rgb(22, 163, 74),
  },
];
