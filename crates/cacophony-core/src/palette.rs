//! Metadata palettes
//!
//! [`ColorMode`] is a lookup table from a record to its overlay colour. Each
//! mode owns one palette; `None` resolves nothing and the render pass falls
//! back to the accent colour.

use std::fmt;

use crate::dataset::{ClipRecord, Gender, SoundType};
use crate::filter::{age_range_for, FilterPredicate, AGE_RANGES};

/// 8-bit RGBA colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Opaque colour from `0xRRGGBB`
    pub const fn hex(rgb: u32) -> Self {
        Self::rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Alpha as a 0..=1 float
    pub fn alpha_f32(&self) -> f32 {
        self.a as f32 / 255.0
    }

    /// Source-over blend of `self` onto an opaque destination pixel
    pub fn blend_over(&self, dst: [u8; 4]) -> [u8; 4] {
        let a = self.alpha_f32();
        let mix = |src: u8, dst: u8| (src as f32 * a + dst as f32 * (1.0 - a)).round() as u8;
        [
            mix(self.r, dst[0]),
            mix(self.g, dst[1]),
            mix(self.b, dst[2]),
            dst[3].max(self.a),
        ]
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Darken each channel by `amount` (0.3 darkens by 30%)
pub fn darken(color: Rgba8, amount: f32) -> Rgba8 {
    let factor = (1.0 - amount).clamp(0.0, 1.0);
    let scale = |c: u8| (c as f32 * factor).round().clamp(0.0, 255.0) as u8;
    Rgba8 {
        r: scale(color.r),
        g: scale(color.g),
        b: scale(color.b),
        a: color.a,
    }
}

/// Shade factor applied to overlay colours for borders
pub const BORDER_DARKEN: f32 = 0.3;
/// Alpha of the per-cell tint in the composited grid
pub const TINT_ALPHA: u8 = 0x33;
/// Beige used outside the grid and for filtered-out cells
pub const NEUTRAL: Rgba8 = Rgba8::hex(0xF4F3EF);
/// Default highlight colour (selection border, trail stroke)
pub const ACCENT: Rgba8 = Rgba8::hex(0x5DADE2);
/// Translucent wash over the spotlight thumbnail
pub const SPOTLIGHT_TINT: Rgba8 = Rgba8 { r: 215, g: 236, b: 255, a: 102 };
/// Age colour for values outside every bucket
pub const AGE_FALLBACK: Rgba8 = Rgba8::hex(0xBDC3C7);

const AGE_COLORS: [Rgba8; 6] = [
    Rgba8::hex(0x2ECC71),
    Rgba8::hex(0xF1C40F),
    Rgba8::hex(0xE67E22),
    Rgba8::hex(0xE74C3C),
    Rgba8::hex(0x9B59B6),
    Rgba8::hex(0x758C8D),
];

pub fn sound_type_color(sound_type: SoundType) -> Rgba8 {
    match sound_type {
        SoundType::Sigh => Rgba8::hex(0x5DADE2),
        SoundType::Throatclearing => Rgba8::hex(0xF5B041),
        SoundType::Sniff => Rgba8::hex(0x48C9B0),
        SoundType::Laughter => Rgba8::hex(0xE84393),
        SoundType::Sneeze => Rgba8::hex(0xE74C3C),
        SoundType::Cough => Rgba8::hex(0x8E44AD),
    }
}

pub fn gender_color(gender: Gender) -> Rgba8 {
    match gender {
        Gender::Male => Rgba8::hex(0x3498DB),
        Gender::Female => Rgba8::hex(0xE84393),
        Gender::Other => Rgba8::hex(0x1ABC9C),
    }
}

pub fn age_color(age: f64) -> Rgba8 {
    age_range_for(age)
        .and_then(|range| AGE_RANGES.iter().position(|r| r == range))
        .map(|idx| AGE_COLORS[idx])
        .unwrap_or(AGE_FALLBACK)
}

/// Chip colour for a filter name; unknown names have none
pub fn filter_color(name: &str) -> Option<Rgba8> {
    match FilterPredicate::parse(name) {
        FilterPredicate::Gender(g) => Some(gender_color(g)),
        FilterPredicate::SoundType(s) => Some(sound_type_color(s)),
        FilterPredicate::Age(range) => AGE_RANGES
            .iter()
            .position(|r| r == range)
            .map(|idx| AGE_COLORS[idx]),
        FilterPredicate::Unknown => None,
    }
}

/// Which metadata field tints the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorMode {
    #[default]
    None,
    Age,
    Gender,
    SoundType,
}

impl ColorMode {
    pub const ALL: [ColorMode; 4] = [
        ColorMode::None,
        ColorMode::Age,
        ColorMode::Gender,
        ColorMode::SoundType,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ColorMode::None => "None",
            ColorMode::Age => "Age",
            ColorMode::Gender => "Gender",
            ColorMode::SoundType => "Sound Type",
        }
    }

    /// Overlay colour for a record, `None` when the mode draws no overlay
    pub fn color_for(&self, record: &ClipRecord) -> Option<Rgba8> {
        match self {
            ColorMode::None => None,
            ColorMode::Age => Some(age_color(record.age)),
            ColorMode::Gender => Some(gender_color(record.gender)),
            ColorMode::SoundType => Some(sound_type_color(record.sound_type)),
        }
    }

    /// Legend entries for the control panel
    pub fn legend(&self) -> Vec<(String, Rgba8)> {
        match self {
            ColorMode::None => Vec::new(),
            ColorMode::Age => AGE_RANGES
                .iter()
                .zip(AGE_COLORS)
                .map(|(range, color)| (range.label.to_string(), color))
                .collect(),
            ColorMode::Gender => Gender::ALL
                .iter()
                .map(|g| (g.name().to_string(), gender_color(*g)))
                .collect(),
            ColorMode::SoundType => SoundType::ALL
                .iter()
                .map(|s| (format!("{} {}", s.emoji(), s.name()), sound_type_color(*s)))
                .collect(),
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
