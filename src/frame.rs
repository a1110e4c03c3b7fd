//! Timestamped pixel frames.

use heapless::Vec;

use crate::color::Rgb;

pub const MICROS_PER_SECOND: u64 = 1_000_000;

/// Wall-clock capture time stamped by the frame sender.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Timestamp {
    pub seconds: u64,
    pub micros: u64,
}

impl Timestamp {
    pub const ZERO: Self = Self {
        seconds: 0,
        micros: 0,
    };

    pub const fn new(seconds: u64, micros: u64) -> Self {
        Self { seconds, micros }
    }

    pub const fn from_micros(micros: u64) -> Self {
        Self {
            seconds: micros / MICROS_PER_SECOND,
            micros: micros % MICROS_PER_SECOND,
        }
    }

    /// Total microseconds, saturating on overflow
    pub const fn as_micros(self) -> u64 {
        self.seconds
            .saturating_mul(MICROS_PER_SECOND)
            .saturating_add(self.micros)
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn as_secs_f64(self) -> f64 {
        self.seconds as f64 + self.micros as f64 / MICROS_PER_SECOND as f64
    }

    /// A zero timestamp marks a slot that was drawn or never written
    pub const fn is_zero(self) -> bool {
        self.seconds == 0 && self.micros == 0
    }

    /// `true` if this timestamp is strictly before `other`
    pub const fn is_older_than(self, other: Self) -> bool {
        self.seconds < other.seconds
            || (self.seconds == other.seconds && self.micros < other.micros)
    }

    /// Signed distance `self - now`, in seconds.
    ///
    /// Positive while the frame is still in the future.
    pub fn seconds_from(self, now: Self) -> f64 {
        self.as_secs_f64() - now.as_secs_f64()
    }
}

/// One timestamped pixel payload.
///
/// `MAX_PIXELS` is the display capacity; the pixel count can never exceed it.
#[derive(Debug, Clone)]
pub struct Frame<const MAX_PIXELS: usize> {
    pixels: Vec<Rgb, MAX_PIXELS>,
    captured_at: Timestamp,
    channel: u16,
}

impl<const MAX_PIXELS: usize> Frame<MAX_PIXELS> {
    pub const fn new() -> Self {
        Self {
            pixels: Vec::new(),
            captured_at: Timestamp::ZERO,
            channel: 0,
        }
    }

    /// Build a frame from a pixel slice.
    ///
    /// Returns `None` if the slice is larger than `MAX_PIXELS`.
    pub fn from_pixels(pixels: &[Rgb], captured_at: Timestamp) -> Option<Self> {
        let mut frame = Self::new();
        frame.pixels.extend_from_slice(pixels).ok()?;
        frame.captured_at = captured_at;
        Some(frame)
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    pub const fn captured_at(&self) -> Timestamp {
        self.captured_at
    }

    pub const fn channel(&self) -> u16 {
        self.channel
    }

    pub fn set_channel(&mut self, channel: u16) {
        self.channel = channel;
    }

    pub const fn max_pixels(&self) -> usize {
        MAX_PIXELS
    }

    /// `true` once the frame has been drawn (or was never filled)
    pub const fn is_drawn(&self) -> bool {
        self.captured_at.is_zero()
    }

    /// Mark the frame as consumed; pixel storage is kept for reuse
    pub fn mark_drawn(&mut self) {
        self.captured_at = Timestamp::ZERO;
    }

    /// Drop the payload and timestamp, keeping pixel storage for reuse
    pub(crate) fn reset(&mut self) {
        self.pixels.clear();
        self.captured_at = Timestamp::ZERO;
        self.channel = 0;
    }

    /// Overwrite this frame with the contents of `other`
    pub fn copy_from(&mut self, other: &Self) {
        self.pixels.clone_from(&other.pixels);
        self.captured_at = other.captured_at;
        self.channel = other.channel;
    }

    /// Replace the payload with packed RGB triples.
    ///
    /// The caller has already checked that `rgb` holds at most `MAX_PIXELS`
    /// whole triples; anything past capacity is ignored.
    pub(crate) fn fill_packed(&mut self, rgb: &[u8], captured_at: Timestamp, channel: u16) {
        self.pixels.clear();
        for triple in rgb.chunks_exact(3) {
            let pixel = Rgb {
                r: triple[0],
                g: triple[1],
                b: triple[2],
            };
            if self.pixels.push(pixel).is_err() {
                break;
            }
        }
        self.captured_at = captured_at;
        self.channel = channel;
    }
}

impl<const MAX_PIXELS: usize> Default for Frame<MAX_PIXELS> {
    fn default() -> Self {
        Self::new()
    }
}
