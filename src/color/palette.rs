//! Four-stop color ramp
//!
//! Maps an 8-bit index onto three evenly spaced segments between four
//! colors, the way a 256-entry palette is built from four anchors.

use crate::color::{Rgb, blend_colors};

/// A palette defined by four evenly spaced color stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    stops: [Rgb; 4],
}

impl Palette {
    pub const fn new(c0: Rgb, c1: Rgb, c2: Rgb, c3: Rgb) -> Self {
        Self {
            stops: [c0, c1, c2, c3],
        }
    }

    /// Color at `index` (0 = first stop, 255 = last stop)
    #[allow(clippy::cast_possible_truncation)]
    pub fn color_at(&self, index: u8) -> Rgb {
        // 3 segments of 85 steps each cover 0..=255
        let segment = (index / 85).min(2) as usize;
        let offset = u16::from(index) - (segment as u16) * 85;
        let amount = ((offset * 255) / 85).min(255) as u8;
        blend_colors(self.stops[segment], self.stops[segment + 1], amount)
    }

    pub const fn stops(&self) -> &[Rgb; 4] {
        &self.stops
    }
}
