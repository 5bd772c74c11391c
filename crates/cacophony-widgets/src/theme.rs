//! Colour conversions and shared visual constants

use cacophony_core::palette::Rgba8;
use iced::Color;

/// Convert an engine colour to an iced colour
#[inline]
pub fn to_color(c: Rgba8) -> Color {
    Color::from_rgba8(c.r, c.g, c.b, c.alpha_f32())
}

/// Metadata label background
pub const LABEL_BG: Color = Color::WHITE;

/// Metadata label border (gray-300)
pub const LABEL_BORDER: Color = Color::from_rgb(0.82, 0.84, 0.86);

/// Primary label text
pub const LABEL_TEXT: Color = Color::BLACK;

/// Text colour for values without a palette entry
pub const MUTED_TEXT: Color = Color::from_rgb(0.33, 0.33, 0.33);

/// Gap between the spotlight's top edge and the label (px)
pub const LABEL_GAP: f32 = 10.0;
