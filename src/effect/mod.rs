//! Effect capability contract and the built-in override effects.
//!
//! Roster effects are supplied by the application as any type implementing
//! [`Effect`]. The scheduler itself only ever constructs the closed set of
//! [`OverrideEffect`] variants.

mod color_fill;
mod palette_fire;

use embassy_time::Instant;
use thiserror::Error;

pub use color_fill::ColorFillEffect;
pub use palette_fire::{FireParams, PaletteFireEffect};

use crate::color::{BLACK, Palette, Rgb, WHITE, YELLOW};

/// Frame rate effects ask for unless they override [`Effect::desired_fps`]
pub const DEFAULT_EFFECT_FPS: u16 = 30;

/// Output surfaces an effect draws onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputTargets {
    /// Pixels per channel
    pub pixel_count: usize,
    /// Number of parallel output channels
    pub channels: u8,
}

impl OutputTargets {
    pub const fn new(pixel_count: usize) -> Self {
        Self {
            pixel_count,
            channels: 1,
        }
    }
}

/// An effect could not prepare itself for the given outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InitError {
    #[error("{effect}: output has no pixels")]
    NoOutput { effect: &'static str },
    #[error("{effect}: needs room for {required} pixels, has {available}")]
    OutputTooLarge {
        effect: &'static str,
        required: usize,
        available: usize,
    },
}

pub trait Effect {
    /// Prepare effect-local state for `targets`.
    ///
    /// An effect that fails here must never be scheduled.
    fn init(&mut self, _targets: &OutputTargets) -> Result<(), InitError> {
        Ok(())
    }

    /// Called once each time the effect becomes active
    fn start(&mut self, _now: Instant) {}

    /// Render a single frame. Must not block.
    fn draw(&mut self, now: Instant, leds: &mut [Rgb]);

    fn friendly_name(&self) -> &str;

    fn desired_fps(&self) -> u16 {
        DEFAULT_EFFECT_FPS
    }

    fn requires_double_buffering(&self) -> bool {
        false
    }
}

impl<T: Effect + ?Sized> Effect for &mut T {
    fn init(&mut self, targets: &OutputTargets) -> Result<(), InitError> {
        (**self).init(targets)
    }

    fn start(&mut self, now: Instant) {
        (**self).start(now);
    }

    fn draw(&mut self, now: Instant, leds: &mut [Rgb]) {
        (**self).draw(now, leds);
    }

    fn friendly_name(&self) -> &str {
        (**self).friendly_name()
    }

    fn desired_fps(&self) -> u16 {
        (**self).desired_fps()
    }

    fn requires_double_buffering(&self) -> bool {
        (**self).requires_double_buffering()
    }
}

/// Transient effects that pre-empt the roster.
#[derive(Debug, Clone)]
pub enum OverrideEffect<const MAX_PIXELS: usize> {
    /// Solid fill; black is used as the "everything disabled" blank
    Fill(ColorFillEffect),
    /// Palette flame built around a remote-selected color
    Fire(PaletteFireEffect<MAX_PIXELS>),
}

impl<const MAX_PIXELS: usize> OverrideEffect<MAX_PIXELS> {
    /// Blank output used while no roster effect is enabled
    pub const fn blank() -> Self {
        Self::Fill(ColorFillEffect::new(BLACK))
    }

    /// Build the override for a remote color change from `previous` to `color`.
    ///
    /// Pure white and black become solid fills; any other color drives a
    /// flame through black, the color, yellow and white.
    pub fn for_color(previous: Rgb, color: Rgb) -> Self {
        if color == WHITE || color == BLACK {
            return Self::Fill(ColorFillEffect::new(color));
        }
        let palette = Palette::new(BLACK, color, YELLOW, WHITE);
        let fire =
            PaletteFireEffect::new(palette, FireParams::CUSTOM).with_seed(seed_from(previous, color));
        Self::Fire(fire)
    }

    pub const fn is_blank(&self) -> bool {
        matches!(self, Self::Fill(fill) if fill.is_black())
    }
}

fn seed_from(previous: Rgb, color: Rgb) -> u64 {
    let pack = |c: Rgb| (u64::from(c.r) << 16) | (u64::from(c.g) << 8) | u64::from(c.b);
    (pack(previous) << 24) | pack(color)
}

impl<const MAX_PIXELS: usize> Effect for OverrideEffect<MAX_PIXELS> {
    fn init(&mut self, targets: &OutputTargets) -> Result<(), InitError> {
        match self {
            Self::Fill(effect) => effect.init(targets),
            Self::Fire(effect) => effect.init(targets),
        }
    }

    fn start(&mut self, now: Instant) {
        match self {
            Self::Fill(effect) => effect.start(now),
            Self::Fire(effect) => effect.start(now),
        }
    }

    fn draw(&mut self, now: Instant, leds: &mut [Rgb]) {
        match self {
            Self::Fill(effect) => effect.draw(now, leds),
            Self::Fire(effect) => effect.draw(now, leds),
        }
    }

    fn friendly_name(&self) -> &str {
        match self {
            Self::Fill(effect) => effect.friendly_name(),
            Self::Fire(effect) => effect.friendly_name(),
        }
    }

    fn desired_fps(&self) -> u16 {
        match self {
            Self::Fill(effect) => effect.desired_fps(),
            Self::Fire(effect) => effect.desired_fps(),
        }
    }

    fn requires_double_buffering(&self) -> bool {
        match self {
            Self::Fill(effect) => effect.requires_double_buffering(),
            Self::Fire(effect) => effect.requires_double_buffering(),
        }
    }
}
