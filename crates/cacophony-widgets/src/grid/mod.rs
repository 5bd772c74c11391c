//! Clip grid display
//!
//! The engine produces a [`RenderFrame`] per animation frame; this module
//! paints it on an iced canvas and turns pointer input back into
//! [`GridEvent`]s for the application to forward to the engine.
//!
//! Uploading a 4608² image is not free, so the image handles are cached in
//! [`GridImages`] and only rebuilt when the grid generation or the spotlight
//! thumbnail changes.

mod canvas;

pub use canvas::{GridCanvas, GridInteraction};

use std::sync::Arc;

use cacophony_core::compositor::RgbaImage;
use cacophony_core::dataset::ClipRecord;
use cacophony_core::engine::RenderFrame;
use cacophony_core::palette::{age_color, gender_color, sound_type_color};
use cacophony_core::types::{ScreenPoint, Viewport};
use iced::widget::image::Handle;
use iced::widget::Canvas;
use iced::{Color, Element, Length};

use crate::theme::{to_color, LABEL_TEXT};

/// Input published by the grid canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridEvent {
    Pressed(ScreenPoint),
    /// Pointer moved while pressed (position may lie outside the canvas)
    Moved(ScreenPoint),
    /// Left button or finger lifted anywhere in the window
    Released,
    /// Vertical wheel delta, negative when scrolling up
    Wheel(f32),
    Resized(Viewport),
}

/// GPU image handles for the current grid and spotlight
#[derive(Debug, Default)]
pub struct GridImages {
    grid: Option<(u64, Handle)>,
    spotlight: Option<(Arc<RgbaImage>, Handle)>,
}

impl GridImages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh handles that no longer match `frame`
    pub fn sync(&mut self, frame: &RenderFrame) {
        if let Some(layer) = &frame.grid {
            if self.grid.as_ref().map(|(g, _)| *g) != Some(layer.generation) {
                log::debug!("Uploading grid generation {}", layer.generation);
                let handle = Handle::from_rgba(
                    layer.image.width(),
                    layer.image.height(),
                    layer.image.as_raw().clone(),
                );
                self.grid = Some((layer.generation, handle));
            }
        }

        match frame.spotlight.as_ref().and_then(|s| s.image.as_ref()) {
            Some(image) => {
                let stale = self
                    .spotlight
                    .as_ref()
                    .map_or(true, |(cached, _)| !Arc::ptr_eq(cached, image));
                if stale {
                    let handle =
                        Handle::from_rgba(image.width(), image.height(), image.as_raw().clone());
                    self.spotlight = Some((Arc::clone(image), handle));
                }
            }
            None => self.spotlight = None,
        }
    }

    pub fn grid(&self, generation: u64) -> Option<&Handle> {
        self.grid
            .as_ref()
            .filter(|(g, _)| *g == generation)
            .map(|(_, h)| h)
    }

    pub fn spotlight(&self) -> Option<&Handle> {
        self.spotlight.as_ref().map(|(_, h)| h)
    }
}

/// One coloured run of label text
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSpan {
    pub text: String,
    pub color: Color,
    pub size: f32,
}

/// Metadata readout drawn above the spotlight
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataLabel {
    /// Id and sound type
    pub title: Vec<LabelSpan>,
    /// Gender and age
    pub detail: Vec<LabelSpan>,
    pub emoji: &'static str,
}

impl MetadataLabel {
    pub fn for_record(record: &ClipRecord) -> Self {
        let span = |text: String, color: Color, size: f32| LabelSpan { text, color, size };
        Self {
            title: vec![
                span(record.id.clone(), LABEL_TEXT, 16.0),
                span(
                    record.sound_type.name().to_string(),
                    to_color(sound_type_color(record.sound_type)),
                    16.0,
                ),
            ],
            detail: vec![
                span(
                    record.gender.name().to_string(),
                    to_color(gender_color(record.gender)),
                    12.0,
                ),
                span(format_age(record.age), to_color(age_color(record.age)), 12.0),
            ],
            emoji: record.sound_type.emoji(),
        }
    }
}

/// Whole ages print without decimals; unknown ages print as `?`
pub fn format_age(age: f64) -> String {
    if !age.is_finite() {
        "?".to_string()
    } else if age.fract() == 0.0 {
        format!("{:.0}", age)
    } else {
        format!("{}", age)
    }
}

/// Full-size grid canvas
///
/// `frame` is `None` until the engine renders its first frame; the canvas
/// then only paints the neutral background and reports its size. `held`
/// mirrors the engine's pointer state so moves are reported during a press.
pub fn grid_view<'a, Message>(
    frame: Option<&'a RenderFrame>,
    images: &'a GridImages,
    label: Option<&'a MetadataLabel>,
    held: bool,
    on_event: impl Fn(GridEvent) -> Message + 'a,
) -> Element<'a, Message>
where
    Message: Clone + 'a,
{
    Canvas::new(GridCanvas {
        frame,
        images,
        label,
        held,
        on_event,
    })
    .width(Length::Fill)
    .height(Length::Fill)
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cacophony_core::dataset::{Gender, SoundType};

    fn record(age: f64) -> ClipRecord {
        ClipRecord {
            id: "c-17".to_string(),
            age,
            gender: Gender::Female,
            sound_type: SoundType::Laughter,
            start_time: 0.0,
            end_time: 1.0,
        }
    }

    #[test]
    fn test_age_formatting() {
        assert_eq!(format_age(34.0), "34");
        assert_eq!(format_age(34.5), "34.5");
        assert_eq!(format_age(f64::NAN), "?");
    }

    #[test]
    fn test_label_spans_use_palettes() {
        let label = MetadataLabel::for_record(&record(30.0));
        assert_eq!(label.title[0].text, "c-17");
        assert_eq!(label.title[1].text, SoundType::Laughter.name());
        assert_eq!(label.title[1].color, to_color(sound_type_color(SoundType::Laughter)));
        assert_eq!(label.detail[0].color, to_color(gender_color(Gender::Female)));
        assert_eq!(label.detail[1].text, "30");
        assert_eq!(label.emoji, SoundType::Laughter.emoji());
    }
}
