//! Solid color fill
//!
//! Fills every LED with one color. Used for remote white and for the
//! blank shown while all roster effects are disabled.

use embassy_time::Instant;

use super::{Effect, InitError, OutputTargets};
use crate::color::{BLACK, Rgb};

const NAME: &str = "Color Fill";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorFillEffect {
    color: Rgb,
}

impl ColorFillEffect {
    pub const fn new(color: Rgb) -> Self {
        Self { color }
    }

    pub const fn color(&self) -> Rgb {
        self.color
    }

    pub fn set_color(&mut self, color: Rgb) {
        self.color = color;
    }

    pub const fn is_black(&self) -> bool {
        self.color.r == BLACK.r && self.color.g == BLACK.g && self.color.b == BLACK.b
    }
}

impl Effect for ColorFillEffect {
    fn init(&mut self, targets: &OutputTargets) -> Result<(), InitError> {
        if targets.pixel_count == 0 {
            return Err(InitError::NoOutput { effect: NAME });
        }
        Ok(())
    }

    fn draw(&mut self, _now: Instant, leds: &mut [Rgb]) {
        leds.fill(self.color);
    }

    fn friendly_name(&self) -> &str {
        NAME
    }
}
