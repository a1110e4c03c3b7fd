#![no_std]

pub mod clock;
pub mod color;
pub mod control;
pub mod effect;
pub mod frame;
pub mod frame_scheduler;
#[cfg(feature = "esp32-log")]
pub mod logging;
pub mod math8;
pub mod ring;
pub mod scheduler;
pub mod wire;

pub use clock::{Clock, EmbassyClock, ManualClock, OffsetWallClock, WallClock};
pub use control::{ControlError, ControlLink, SchedulerCommand, SchedulerStatus};
pub use effect::{Effect, InitError, OutputTargets, OverrideEffect};
pub use frame::{Frame, Timestamp};
pub use frame_scheduler::{DisplayMode, FeedConfig, FrameResult, FrameScheduler};
pub use ring::{FrameHandle, FrameRingBuffer};
pub use scheduler::{
    EffectScheduler, IndexError, MAX_EFFECTS, OverrideSource, RosterError, SchedulerConfig,
    fade_level,
};
pub use wire::{DecodeError, WireHeader};

pub use color::Rgb;
pub use embassy_time::{Duration, Instant};

/// Abstract LED driver trait
///
/// Implement this trait to support different hardware platforms.
/// The render loop is generic over this trait.
pub trait OutputDriver {
    /// Write colors to the LED strip
    fn write(&mut self, colors: &[Rgb]);
}
