//! Frame scheduling and timing utilities.
//!
//! Provides portable frame pacing without async/await or platform-specific
//! timers. Each tick shows either the next due network frame or a locally
//! drawn effect, then tells the caller how long to sleep.

use embassy_time::{Duration, Instant};

use crate::OutputDriver;
use crate::clock::Clock;
use crate::color::{Rgb, scale_color};
use crate::control::ControlLink;
use crate::effect::Effect;
use crate::frame::{Frame, Timestamp};
use crate::ring::FrameRingBuffer;
use crate::scheduler::EffectScheduler;

/// Default target frame rate (60 FPS).
pub const DEFAULT_FPS: u32 = 60;

/// Default frame duration based on target FPS.
pub const DEFAULT_FRAME_DURATION: Duration = Duration::from_millis(1000 / DEFAULT_FPS as u64);

/// Default time without network frames before local effects take over.
pub const DEFAULT_STALL_TIMEOUT: Duration = Duration::from_secs(2);

/// Network feed configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedConfig {
    /// How long the display keeps waiting for network frames after the last
    /// one before switching back to local effects
    pub stall_timeout: Duration,
    /// Frame pacing
    pub frame_duration: Duration,
}

impl FeedConfig {
    pub const DEFAULT: Self = Self {
        stall_timeout: DEFAULT_STALL_TIMEOUT,
        frame_duration: DEFAULT_FRAME_DURATION,
    };
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// What produced the pixels of a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// A network frame was shown
    Network,
    /// Network frames are arriving but none is due yet; output untouched
    Waiting,
    /// A local effect was drawn
    Local,
}

/// Result of a frame tick operation.
#[derive(Debug, Clone, Copy)]
pub struct FrameResult {
    /// The deadline for the next frame.
    pub next_deadline: Instant,
    /// How long to wait until the next frame (may be zero if behind schedule).
    pub sleep_duration: Duration,
    pub mode: DisplayMode,
}

/// The render loop.
///
/// Owns the [`EffectScheduler`] and the output driver; shares the frame ring
/// with the network receiver and the [`ControlLink`] with command handlers.
///
/// # Usage
///
/// ```ignore
/// static FRAMES: FrameRingBuffer<8, 144> = FrameRingBuffer::new();
/// static CONTROL: ControlLink<8, 16> = ControlLink::new();
///
/// let mut render = FrameScheduler::new(scheduler, driver, &FRAMES, &CONTROL, FeedConfig::DEFAULT);
/// loop {
///     let result = render.tick(clock.now(), wall_clock.now());
///     sleep_ms(result.sleep_duration.as_millis());
/// }
/// ```
pub struct FrameScheduler<
    'a,
    O: OutputDriver,
    E: Effect,
    C: Clock,
    const N: usize,
    const SLOTS: usize,
    const MAX_PIXELS: usize,
    const SIZE: usize,
> {
    output: O,
    scheduler: EffectScheduler<E, C, N, MAX_PIXELS>,
    frames: &'a FrameRingBuffer<SLOTS, MAX_PIXELS>,
    control: &'a ControlLink<N, SIZE>,
    config: FeedConfig,
    network_frame: Frame<MAX_PIXELS>,
    /// Effect canvas, kept between ticks
    local_buffer: [Rgb; MAX_PIXELS],
    /// Faded copy of the canvas sent to the driver
    output_buffer: [Rgb; MAX_PIXELS],
    last_network_frame: Option<Instant>,
    mode: DisplayMode,
    next_frame: Instant,
}

impl<
    'a,
    O: OutputDriver,
    E: Effect,
    C: Clock,
    const N: usize,
    const SLOTS: usize,
    const MAX_PIXELS: usize,
    const SIZE: usize,
> FrameScheduler<'a, O, E, C, N, SLOTS, MAX_PIXELS, SIZE>
{
    pub fn new(
        scheduler: EffectScheduler<E, C, N, MAX_PIXELS>,
        driver: O,
        frames: &'a FrameRingBuffer<SLOTS, MAX_PIXELS>,
        control: &'a ControlLink<N, SIZE>,
        config: FeedConfig,
    ) -> Self {
        control.publish(&scheduler);
        Self {
            output: driver,
            scheduler,
            frames,
            control,
            config,
            network_frame: Frame::new(),
            local_buffer: [Rgb::default(); MAX_PIXELS],
            output_buffer: [Rgb::default(); MAX_PIXELS],
            last_network_frame: None,
            mode: DisplayMode::Local,
            next_frame: Instant::from_millis(0),
        }
    }

    /// Process one frame and return timing information.
    ///
    /// This method:
    /// 1. Applies drift correction if we've fallen too far behind
    /// 2. Applies queued control commands
    /// 3. Shows a due network frame, or draws the local effect when the
    ///    network feed is idle
    /// 4. Publishes scheduler status
    /// 5. Returns the deadline for the next frame
    ///
    /// `now` is monotonic time, `wall_now` the sender timebase used to
    /// decide which network frames are due.
    pub fn tick(&mut self, now: Instant, wall_now: Timestamp) -> FrameResult {
        // Drift correction: if we've fallen too far behind, reset to now
        // This prevents catch-up bursts after long stalls
        let max_drift_ms = self.config.frame_duration.as_millis() * 2;
        if now.as_millis() > self.next_frame.as_millis() + max_drift_ms {
            self.next_frame = now;
        }

        self.scheduler.process_commands(self.control);

        let mode = self.render(now, wall_now);
        if mode != self.mode {
            log::debug!("display mode {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }

        self.control.publish(&self.scheduler);

        // Calculate next frame deadline
        self.next_frame += self.config.frame_duration;

        // Calculate sleep duration (may be zero if we're behind)
        let sleep_duration = if self.next_frame.as_millis() > now.as_millis() {
            Duration::from_millis(self.next_frame.as_millis() - now.as_millis())
        } else {
            Duration::from_millis(0)
        };

        FrameResult {
            next_deadline: self.next_frame,
            sleep_duration,
            mode,
        }
    }

    fn render(&mut self, now: Instant, wall_now: Timestamp) -> DisplayMode {
        if let Some(skipped) = self.frames.take_due_into(wall_now, &mut self.network_frame) {
            if skipped > 0 {
                log::trace!("skipped {} late network frames", skipped);
            }
            self.last_network_frame = Some(now);
            self.output.write(self.network_frame.pixels());
            return DisplayMode::Network;
        }

        if self.feed_active(now, wall_now) {
            return DisplayMode::Waiting;
        }

        let len = self.scheduler.targets().pixel_count.min(MAX_PIXELS);
        let canvas = &mut self.local_buffer[..len];
        let fader = self.scheduler.update(canvas);
        if fader == 255 {
            self.output.write(canvas);
        } else {
            let out = &mut self.output_buffer[..len];
            for (dst, src) in out.iter_mut().zip(canvas.iter()) {
                *dst = scale_color(*src, fader);
            }
            self.output.write(out);
        }
        DisplayMode::Local
    }

    /// Network frames arrived recently, or one is queued to become due
    /// within the stall timeout
    #[allow(clippy::cast_precision_loss)]
    fn feed_active(&self, now: Instant, wall_now: Timestamp) -> bool {
        let recent = self.last_network_frame.is_some_and(|last| {
            now.checked_duration_since(last)
                .is_some_and(|since| since < self.config.stall_timeout)
        });
        if recent {
            return true;
        }
        let stall_secs = self.config.stall_timeout.as_micros() as f64 / 1_000_000.0;
        !self.frames.is_empty() && self.frames.age_of_oldest(wall_now) < stall_secs
    }

    pub const fn mode(&self) -> DisplayMode {
        self.mode
    }

    /// Get a reference to the effect scheduler.
    pub fn scheduler(&self) -> &EffectScheduler<E, C, N, MAX_PIXELS> {
        &self.scheduler
    }

    /// Get a mutable reference to the effect scheduler.
    pub fn scheduler_mut(&mut self) -> &mut EffectScheduler<E, C, N, MAX_PIXELS> {
        &mut self.scheduler
    }

    pub fn output(&self) -> &O {
        &self.output
    }
}
