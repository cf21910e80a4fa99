use image::{DynamicImage, imageops::FilterType};
use ratatui::{
  buffer::Buffer,
  layout::Rect,
  style::{Color, Style},
  widgets::Widget,
};

use crate::display::DisplayMode;

// --- Thumbnail Widget ---

/// Draws an already-sized image into the buffer, centred in `area`.
pub struct ThumbnailWidget<'a> {
  pub image: &'a DynamicImage,
  pub display_mode: DisplayMode,
}

const ASCII_CHARS: [&str; 10] = [" ", ".", ":", "-", "=", "+", "*", "#", "%", "@"];

impl Widget for ThumbnailWidget<'_> {
  fn render(self, area: Rect, buf: &mut Buffer) {
    if area.is_empty() {
      return;
    }
    match self.display_mode {
      DisplayMode::Direct => render_direct(self.image, area, buf),
      DisplayMode::Ascii => render_ascii(self.image, area, buf),
    }
  }
}

/// Resize a thumbnail to fill `area`. Half-blocks pack two pixel rows per cell.
pub fn fit_to_area(image: &DynamicImage, area: Rect, display_mode: DisplayMode) -> DynamicImage {
  let target_w = (area.width as u32).max(1);
  let target_h = match display_mode {
    DisplayMode::Direct => area.height as u32 * 2,
    DisplayMode::Ascii => area.height as u32,
  };
  image.resize_to_fill(target_w, target_h.max(1), FilterType::Triangle)
}

fn cell_position(area: Rect, offset_x: u32, offset_y: u32, x: u32, y: u32) -> (u16, u16) {
  let clamp = |v: u32| v.min(u16::MAX as u32) as u16;
  (area.x.saturating_add(clamp(offset_x)).saturating_add(clamp(x)), area.y.saturating_add(clamp(offset_y)).saturating_add(clamp(y)))
}

fn render_direct(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let rgb = image.to_rgb8();
  let img_w = rgb.width().min(area.width as u32);
  let img_h = rgb.height();
  let cell_h = img_h.div_ceil(2);
  let offset_x = (area.width as u32).saturating_sub(img_w) / 2;
  let offset_y = (area.height as u32).saturating_sub(cell_h) / 2;

  for y in 0..cell_h.min(area.height as u32) {
    for x in 0..img_w {
      let upper = rgb.get_pixel(x, y * 2);
      let lower_y = y * 2 + 1;
      let fg = Color::Rgb(upper[0], upper[1], upper[2]);
      let bg = if lower_y < img_h {
        let lower = rgb.get_pixel(x, lower_y);
        Color::Rgb(lower[0], lower[1], lower[2])
      } else {
        Color::Reset
      };
      let (cx, cy) = cell_position(area, offset_x, offset_y, x, y);
      buf.set_string(cx, cy, "▀", Style::default().fg(fg).bg(bg));
    }
  }
}

fn luma_to_char(luma: u8) -> &'static str {
  let idx = ((luma as f32 / 255.0) * (ASCII_CHARS.len() - 1) as f32).round() as usize;
  ASCII_CHARS[idx.min(ASCII_CHARS.len() - 1)]
}

fn render_ascii(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let gray = image.to_luma8();
  let img_w = gray.width().min(area.width as u32);
  let img_h = gray.height().min(area.height as u32);
  let offset_x = (area.width as u32).saturating_sub(img_w) / 2;
  let offset_y = (area.height as u32).saturating_sub(img_h) / 2;

  for y in 0..img_h {
    for x in 0..img_w {
      let (cx, cy) = cell_position(area, offset_x, offset_y, x, y);
      buf.set_string(cx, cy, luma_to_char(gray.get_pixel(x, y)[0]), Style::default());
    }
  }
}
