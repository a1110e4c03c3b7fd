//! Palette-mapped flame
//!
//! Classic heat-diffusion fire: every cell cools a little each frame, heat
//! drifts away from the base, and random sparks ignite near the base. Heat
//! is mapped onto a four-stop [`Palette`].

use embassy_time::{Duration, Instant};
use heapless::Vec;

use super::{Effect, InitError, OutputTargets};
use crate::color::{Palette, Rgb};
use crate::math8::{qadd8, qsub8, scale8};

const NAME: &str = "Custom Fire";

/// Tuning knobs for [`PaletteFireEffect`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FireParams {
    /// How much heat each cell loses per frame (higher = shorter flames)
    pub cooling: u8,
    /// Chance out of 255 that a new spark ignites each frame
    pub sparking: u8,
    /// Sparks ignite within this many cells of the base
    pub spark_height: u8,
    /// Draw the flame from the far end of the strip
    pub reversed: bool,
    /// Draw two flames meeting in the middle
    pub mirrored: bool,
}

impl FireParams {
    /// Flame used for remote color overrides
    pub const CUSTOM: Self = Self {
        cooling: 50,
        sparking: 120,
        spark_height: 24,
        reversed: true,
        mirrored: false,
    };
}

/// Four-stop palette flame over at most `MAX_PIXELS` cells
#[derive(Debug, Clone)]
pub struct PaletteFireEffect<const MAX_PIXELS: usize> {
    palette: Palette,
    params: FireParams,
    heat: Vec<u8, MAX_PIXELS>,
    rng: Lcg,
    last_step: Option<Instant>,
}

impl<const MAX_PIXELS: usize> PaletteFireEffect<MAX_PIXELS> {
    /// Simulation step; flames advance at this rate whatever the draw rate
    const STEP: Duration = Duration::from_millis(1000 / 30);

    pub const fn new(palette: Palette, params: FireParams) -> Self {
        Self {
            palette,
            params,
            heat: Vec::new(),
            rng: Lcg::new(0x5EED),
            last_step: None,
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Lcg::new(seed);
        self
    }

    pub const fn palette(&self) -> &Palette {
        &self.palette
    }

    #[allow(clippy::cast_possible_truncation)]
    fn step(&mut self) {
        let len = self.heat.len();
        if len == 0 {
            return;
        }

        // Cool down every cell
        let max_cooling = ((usize::from(self.params.cooling) * 10) / len + 2).min(255) as u8;
        for cell in &mut self.heat {
            let amount = self.rng.below(max_cooling);
            *cell = qsub8(*cell, amount);
        }

        // Heat drifts up and diffuses
        for k in (2..len).rev() {
            let sum = u16::from(self.heat[k - 1]) + 2 * u16::from(self.heat[k - 2]);
            self.heat[k] = (sum / 3) as u8;
        }

        // Ignite a new spark near the base
        if self.rng.next_u8() < self.params.sparking {
            let height = usize::from(self.params.spark_height).clamp(1, len);
            let y = usize::from(self.rng.below(height.min(255) as u8));
            let spark = 160 + self.rng.below(95);
            self.heat[y] = qadd8(self.heat[y], spark);
        }
    }

    fn render(&self, leds: &mut [Rgb]) {
        let len = leds.len().min(self.heat.len());
        for (i, heat) in self.heat.iter().take(len).enumerate() {
            // Keep the hottest cells just below pure white
            let color = self.palette.color_at(scale8(*heat, 240));
            let index = if self.params.reversed { len - 1 - i } else { i };
            leds[index] = color;
        }
        if self.params.mirrored {
            let half = len / 2;
            for i in 0..half {
                leds[len - 1 - i] = leds[i];
            }
        }
    }
}

impl<const MAX_PIXELS: usize> Effect for PaletteFireEffect<MAX_PIXELS> {
    fn init(&mut self, targets: &OutputTargets) -> Result<(), InitError> {
        if targets.pixel_count == 0 {
            return Err(InitError::NoOutput { effect: NAME });
        }
        if targets.pixel_count > MAX_PIXELS {
            return Err(InitError::OutputTooLarge {
                effect: NAME,
                required: targets.pixel_count,
                available: MAX_PIXELS,
            });
        }
        self.heat.clear();
        self.heat
            .resize(targets.pixel_count, 0)
            .map_err(|()| InitError::OutputTooLarge {
                effect: NAME,
                required: targets.pixel_count,
                available: MAX_PIXELS,
            })
    }

    fn start(&mut self, _now: Instant) {
        self.heat.iter_mut().for_each(|cell| *cell = 0);
        self.last_step = None;
    }

    fn draw(&mut self, now: Instant, leds: &mut [Rgb]) {
        let due = match self.last_step {
            None => true,
            Some(last) => now
                .checked_duration_since(last)
                .is_some_and(|elapsed| elapsed >= Self::STEP),
        };
        if due {
            self.step();
            self.last_step = Some(now);
        }
        self.render(leds);
    }

    fn friendly_name(&self) -> &str {
        NAME
    }
}

/// Linear congruential generator; plenty for flicker
#[derive(Debug, Clone, Copy)]
struct Lcg {
    state: u64,
}

impl Lcg {
    const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1);
        (self.state >> 32) as u32
    }

    #[allow(clippy::cast_possible_truncation)]
    fn next_u8(&mut self) -> u8 {
        (self.next_u32() >> 24) as u8
    }

    /// Uniform-ish value in `0..limit` (0 when `limit` is 0)
    #[allow(clippy::cast_possible_truncation)]
    fn below(&mut self, limit: u8) -> u8 {
        if limit == 0 {
            return 0;
        }
        ((u32::from(self.next_u8()) * u32::from(limit)) >> 8) as u8
    }
}
