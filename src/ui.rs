use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, BorderType, List, ListItem, Padding, Paragraph, Wrap},
};

use crate::app::{App, AppMode};
use crate::constants::constants;
use crate::engine::{Mode, Status};
use crate::graphics::{ThumbnailWidget, fit_to_area};
use crate::theme::Theme;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width chars).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

/// Horizontal scroll that keeps the cursor inside a field `inner_w` columns wide.
fn scroll_for_cursor(scroll: usize, cursor_col: usize, inner_w: usize) -> usize {
  let inner_w = inner_w.max(1);
  if cursor_col < scroll {
    cursor_col
  } else if cursor_col >= scroll + inner_w {
    cursor_col + 1 - inner_w
  } else {
    scroll
  }
}

fn rounded(theme: &Theme, focused: bool) -> Block<'static> {
  let color = if focused { theme.accent } else { theme.border };
  Block::bordered().border_type(BorderType::Rounded).border_style(Style::default().fg(color))
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let banner_height = if app.engine.mode() == Mode::Static { 1 } else { 0 };
  let [header_area, banner_area, input_area, categories_area, status_area, main_area, footer_area] =
    Layout::vertical([
      Constraint::Length(1),
      Constraint::Length(banner_height),
      Constraint::Length(3),
      Constraint::Length(3),
      Constraint::Length(1),
      Constraint::Min(3),
      Constraint::Length(1),
    ])
    .areas(frame.area());

  render_header(frame, theme, header_area);
  if banner_height > 0 {
    render_banner(frame, theme, banner_area);
  }
  render_input(frame, app, input_area);
  render_categories(frame, app, categories_area);
  render_status(frame, app, status_area);
  render_main(frame, app, main_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, theme: &Theme, area: Rect) {
  let left = Line::from(vec![
    Span::styled(" 🌈 KKKiste ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
    Span::styled("Tolle Videos für Kinder", Style::default().fg(theme.muted)),
  ]);
  frame.render_widget(left, area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: version.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

fn render_banner(frame: &mut Frame, theme: &Theme, area: Rect) {
  let text = format!(" ℹ {}", constants().static_banner);
  frame.render_widget(Paragraph::new(text).style(Style::default().fg(theme.banner)), area);
}

fn render_input(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let focused = app.mode == AppMode::Input;
  let block = rounded(theme, focused)
    .title(" Videos suchen ")
    .title_style(Style::default().fg(if focused { theme.accent } else { theme.border }))
    .padding(Padding::horizontal(1));

  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&app.input, app.cursor_position);
  app.input_scroll = scroll_for_cursor(app.input_scroll, cursor_col, inner_w);

  let visible: String = app
    .input
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= app.input_scroll)
    .take_while(|(start, _, _)| *start < app.input_scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  frame.render_widget(Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(block), area);

  if focused {
    let cursor_x = area.x + 2 + cursor_col.saturating_sub(app.input_scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn render_categories(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let focused = app.mode == AppMode::Categories;
  let selected = app.engine.selected_category();

  let labels = std::iter::once((None, "Alle"))
    .chain(app.engine.categories().iter().map(|c| (Some(c.id.as_str()), c.display_name.as_str())));

  let mut spans = Vec::new();
  for (i, (id, label)) in labels.enumerate() {
    let active = id == selected;
    let under_cursor = focused && i == app.category_cursor;
    let mut style = if active {
      Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(theme.fg)
    };
    if under_cursor {
      style = style.add_modifier(Modifier::UNDERLINED | Modifier::BOLD);
    }
    spans.push(Span::styled(format!(" {} ", label), style));
    spans.push(Span::raw(" "));
  }

  let block = rounded(theme, focused)
    .title(" Kategorien ")
    .title_style(Style::default().fg(if focused { theme.accent } else { theme.border }));
  frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = match app.engine.status() {
    Status::Loading => (format!(" ⏳ {}", constants().loading_message), Style::default().fg(theme.status)),
    Status::Error(msg) => (format!(" ⚠  Fehler: {}", msg), Style::default().fg(theme.error)),
    Status::Idle => {
      if let Some(err) = &app.last_error {
        (format!(" ⚠  {}", err), Style::default().fg(theme.error))
      } else if app.engine.results().is_empty() {
        (format!(" {}", constants().no_results_message), Style::default().fg(theme.muted))
      } else {
        let count = app.engine.results().len();
        (format!(" {} Videos", count), Style::default().fg(theme.muted))
      }
    }
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_main(frame: &mut Frame, app: &mut App, area: Rect) {
  let [list_area, preview_area] =
    Layout::horizontal([Constraint::Percentage(62), Constraint::Percentage(38)]).areas(area);
  render_results(frame, app, list_area);
  render_preview(frame, app, preview_area);
}

fn render_results(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let focused = app.mode == AppMode::Results;

  // Inner width: area minus 2 borders minus 2 chars for highlight symbol ("▶ ")
  let inner_w = area.width.saturating_sub(4) as usize;

  let items: Vec<ListItem> = app
    .engine
    .results()
    .iter()
    .enumerate()
    .map(|(i, video)| {
      let is_selected = Some(i) == app.list_state.selected();
      let fg = if is_selected { theme.highlight_fg } else { theme.fg };
      let bg = if is_selected {
        theme.highlight_bg
      } else if i % 2 == 1 {
        theme.stripe_bg
      } else {
        theme.bg
      };
      let lines = vec![
        Line::from(Span::styled(truncate_str(&video.title, inner_w), Style::default().fg(fg))),
        Line::from(Span::styled(
          truncate_str(&video.channel_name, inner_w),
          Style::default().fg(if is_selected { theme.highlight_fg } else { theme.muted }),
        )),
      ];
      ListItem::new(lines).bg(bg)
    })
    .collect();

  let title = match app.engine.mode() {
    Mode::Live => " Videos ".to_string(),
    Mode::Static => " Videos (offline) ".to_string(),
  };

  let list = List::new(items)
    .block(
      rounded(theme, focused)
        .title(title)
        .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
    )
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));

  frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_preview(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let block = rounded(theme, false)
    .title(Line::from(vec![
      Span::styled(" Vorschau ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
      Span::styled(format!("[{}] ", app.display_mode.label().to_lowercase()), Style::default().fg(theme.muted)),
    ]))
    .padding(Padding::horizontal(1));
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let Some(video) = app.selected_video().cloned() else {
    let hint = Paragraph::new(Span::styled("Kein Video ausgewählt", Style::default().fg(theme.muted)))
      .alignment(Alignment::Center);
    frame.render_widget(hint, inner);
    return;
  };

  // Thumbnail on top at roughly 16:9 (cells are about twice as tall as wide), details below.
  let ideal_h = (inner.width as f32 * 9.0 / 32.0).round() as u16;
  let thumb_h = ideal_h.min(inner.height.saturating_sub(4));
  let [thumb_area, info_area] = Layout::vertical([Constraint::Length(thumb_h), Constraint::Min(0)]).areas(inner);

  if let Some((ref id, ref image)) = app.thumbnail
    && *id == video.id
    && !thumb_area.is_empty()
  {
    let needs_resize = match &app.resized_thumb {
      Some((rid, w, h, _)) => rid != id || *w != thumb_area.width || *h != thumb_area.height,
      None => true,
    };
    if needs_resize {
      let resized = fit_to_area(image, thumb_area, app.display_mode);
      app.resized_thumb = Some((id.clone(), thumb_area.width, thumb_area.height, resized));
    }
    if let Some((_, _, _, ref resized)) = app.resized_thumb {
      frame.render_widget(ThumbnailWidget { image: resized, display_mode: app.display_mode }, thumb_area);
    }
  }

  let lines = vec![
    Line::from(""),
    Line::from(Span::styled(video.title.clone(), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
    Line::from(Span::styled(video.channel_name.clone(), Style::default().fg(theme.muted))),
    Line::from(""),
    Line::from(Span::styled(
      video.watch_url(),
      Style::default().fg(theme.accent).add_modifier(Modifier::UNDERLINED),
    )),
  ];
  frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), info_area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let has_results = !app.engine.results().is_empty();
  let keys: Vec<(&str, &str)> = match app.mode {
    AppMode::Input => {
      let mut k = vec![("Enter", "Suchen"), ("Tab", "Kategorien")];
      if has_results {
        k.push(("↓", "Videos"));
      }
      k.push(("^t", "Farben"));
      k.push(("Esc", if app.input.is_empty() && !has_results { "Beenden" } else { "Leeren" }));
      k
    }
    AppMode::Categories => vec![("←/→", "Wählen"), ("Enter", "Filtern"), ("Tab", "Weiter"), ("Esc", "Zurück")],
    AppMode::Results => {
      vec![("Enter", "Öffnen"), ("j/k", "Navigieren"), ("/", "Suchen"), ("^t", "Farben"), ("Esc", "Zurück")]
    }
  };

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}
