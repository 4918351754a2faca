//! Value-to-color mapping for the monthly heatmap.
//!
//! Colors run linearly from green (range minimum) to red (range maximum). A
//! value of exactly zero means "no data" and always maps to [`NEUTRAL_COLOR`].

use serde::{Deserialize, Serialize};

/// RGB triple with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedColor {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl NormalizedColor {
    /// CSS functional notation, e.g. `rgb(255, 0, 0)`.
    #[must_use]
    pub fn to_css(self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }

    /// Lowercase hex notation, e.g. `#ff0000`.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Color for months without data (`#e0e0e0`).
pub const NEUTRAL_COLOR: NormalizedColor = NormalizedColor {
    r: 224,
    g: 224,
    b: 224,
};

/// Bounds used to scale heatmap values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorScaleRange {
    /// Value mapped to pure green
    pub min: f64,
    /// Value mapped to pure red
    pub max: f64,
}

impl Default for ColorScaleRange {
    fn default() -> Self {
        Self { min: 0.0, max: 100.0 }
    }
}

impl ColorScaleRange {
    /// Range spanning the positive values in `averages`; the default range if there are none.
    pub fn from_averages<I>(averages: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        averages
            .into_iter()
            .filter(|value| value.is_finite() && *value > 0.0)
            .fold(None, |range: Option<Self>, value| {
                Some(range.map_or(Self { min: value, max: value }, |range| Self {
                    min: range.min.min(value),
                    max: range.max.max(value),
                }))
            })
            .unwrap_or_default()
    }

    /// Position of `value` within the range, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn ratio(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span == 0.0 || !span.is_finite() {
            return 0.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }
}

/// Maps `value` onto the green-to-red scale described by `range`.
#[must_use]
pub fn color_for(value: f64, range: &ColorScaleRange) -> NormalizedColor {
    if value == 0.0 || !value.is_finite() {
        return NEUTRAL_COLOR;
    }

    let ratio = range.ratio(value);
    NormalizedColor {
        r: channel(255.0 * ratio),
        g: channel(255.0 * (1.0 - ratio)),
        b: 0,
    }
}

/// White, for labels drawn on the hot half of the scale.
pub const LIGHT_TEXT: NormalizedColor = NormalizedColor { r: 255, g: 255, b: 255 };

/// Black, for labels drawn on the cool half of the scale.
pub const DARK_TEXT: NormalizedColor = NormalizedColor { r: 0, g: 0, b: 0 };

/// Label color for a cell holding `value`: light above the range midpoint, dark otherwise.
#[must_use]
pub fn text_color_for(value: f64, range: &ColorScaleRange) -> NormalizedColor {
    if value > (range.min + range.max) / 2.0 {
        LIGHT_TEXT
    } else {
        DARK_TEXT
    }
}

// Cast safety: callers pass 255 * ratio with ratio clamped to [0, 1].
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// One entry in the heatmap legend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LegendStop {
    /// `Low`, `Medium` or `High`
    pub label: &'static str,
    /// Value the stop represents
    pub value: f64,
    /// Color drawn for the stop
    pub color: NormalizedColor,
}

/// Low / medium / high legend for `range`.
#[must_use]
pub fn legend(range: &ColorScaleRange) -> [LegendStop; 3] {
    let midpoint = (range.min + range.max) / 2.0;
    [
        ("Low", range.min),
        ("Medium", midpoint),
        ("High", range.max),
    ]
    .map(|(label, value)| LegendStop {
        label,
        value,
        color: color_for(value, range),
    })
}
