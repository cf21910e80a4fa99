use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

use crate::app::{App, AppMode};

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

// --- Event Handling ---

pub fn handle_key_event(app: &mut App, key: event::KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return;
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('t') {
    app.next_theme();
    return;
  }

  // Tab cycles focus: search field -> categories -> results.
  if key.code == KeyCode::Tab {
    app.mode = match app.mode {
      AppMode::Input => AppMode::Categories,
      AppMode::Categories if !app.engine.results().is_empty() => AppMode::Results,
      AppMode::Categories | AppMode::Results => AppMode::Input,
    };
    return;
  }

  match app.mode {
    AppMode::Input => handle_input_key(app, key),
    AppMode::Categories => handle_categories_key(app, key),
    AppMode::Results => handle_results_key(app, key),
  }
}

fn handle_input_key(app: &mut App, key: event::KeyEvent) {
  app.clear_error();
  match key.code {
    KeyCode::Enter => {
      app.trigger_search();
    }
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
      app.input.insert(byte_idx, c);
      app.cursor_position += 1;
    }
    KeyCode::Backspace => {
      if app.cursor_position > 0 {
        app.cursor_position -= 1;
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Delete => {
      if app.cursor_position < app.input.chars().count() {
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Left => {
      app.cursor_position = app.cursor_position.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.cursor_position < app.input.chars().count() {
        app.cursor_position += 1;
      }
    }
    KeyCode::Home => {
      app.cursor_position = 0;
    }
    KeyCode::End => {
      app.cursor_position = app.input.chars().count();
    }
    KeyCode::Esc => {
      if !app.input.is_empty() {
        app.input.clear();
        app.cursor_position = 0;
        app.input_scroll = 0;
      } else if !app.engine.results().is_empty() {
        app.mode = AppMode::Results;
      } else {
        app.should_quit = true;
      }
    }
    KeyCode::Down => {
      if !app.engine.results().is_empty() {
        app.mode = AppMode::Results;
      }
    }
    _ => {}
  }
}

fn handle_categories_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Right | KeyCode::Char('l') => app.next_category(),
    KeyCode::Left | KeyCode::Char('h') => app.previous_category(),
    KeyCode::Enter | KeyCode::Char(' ') => app.trigger_select_category(),
    KeyCode::Down => {
      if !app.engine.results().is_empty() {
        app.mode = AppMode::Results;
      }
    }
    KeyCode::Esc | KeyCode::Up => {
      app.mode = AppMode::Input;
    }
    _ => {}
  }
}

fn handle_results_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => {
      app.open_selected();
    }
    KeyCode::Down | KeyCode::Char('j') => {
      app.select_next();
    }
    KeyCode::Up | KeyCode::Char('k') => {
      app.select_previous();
    }
    KeyCode::Char('/') => {
      app.mode = AppMode::Input;
    }
    KeyCode::Esc => {
      app.mode = AppMode::Categories;
    }
    _ => {}
  }
}
