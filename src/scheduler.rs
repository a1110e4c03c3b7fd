//! Effect scheduling.
//!
//! [`EffectScheduler`] owns a fixed roster of effects and decides which one
//! draws: it rotates through the enabled effects on a timer, lets a
//! transient override pre-empt the roster, and publishes a fader level that
//! ramps output in and out around each transition.
//!
//! The scheduler is a plain owned value driven from the render loop. Other
//! contexts talk to it through [`crate::control`], never by sharing it.

use embassy_time::{Duration, Instant};
use heapless::Vec;
use thiserror::Error;

use crate::clock::Clock;
use crate::color::Rgb;
use crate::effect::{Effect, InitError, OutputTargets, OverrideEffect};

/// Upper bound on roster size
pub const MAX_EFFECTS: usize = 32;

/// Time each effect stays active before rotating
pub const DEFAULT_EFFECT_INTERVAL: Duration = Duration::from_secs(30);

/// Length of the fade at each end of an effect's interval
pub const EFFECT_CROSS_FADE_TIME: Duration = Duration::from_millis(1500);

/// Scheduler configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Rotation interval; zero disables rotation and fading
    pub interval: Duration,
    /// Fade-in/fade-out duration
    pub fade_window: Duration,
    /// Rotate through every effect, ignoring the enabled set
    pub play_all: bool,
    /// Whether the VU overlay is drawn
    pub show_vu: bool,
}

impl SchedulerConfig {
    pub const DEFAULT: Self = Self {
        interval: DEFAULT_EFFECT_INTERVAL,
        fade_window: EFFECT_CROSS_FADE_TIME,
        play_all: false,
        show_vu: true,
    };
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// An effect index outside the roster was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("effect index {index} out of range, roster has {count} effects")]
pub struct IndexError {
    pub index: usize,
    pub count: usize,
}

/// The roster handed to [`EffectScheduler::new`] is unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("effect roster is empty")]
    Empty,
    #[error("effect roster holds more than {max} effects")]
    TooManyEffects { max: usize },
}

/// Why an override is installed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideSource {
    /// Color chosen remotely
    Remote,
    /// Blank forced because no effect is enabled
    AutoBlank,
}

/// Fader level for an effect that has been active for `used`.
///
/// `interval` of `None` means the effect never expires, which keeps the
/// output fully opaque. Ramps up over the first `fade_window` and down over
/// the last `fade_window` before the interval ends.
#[allow(clippy::cast_possible_truncation)]
pub fn fade_level(used: Duration, interval: Option<Duration>, fade_window: Duration) -> u8 {
    let Some(interval) = interval else {
        return 255;
    };
    let window = fade_window.as_millis();
    if window == 0 {
        return 255;
    }

    let used = used.as_millis();
    let remaining = interval.as_millis().saturating_sub(used);
    if used < window {
        (255 * used / window) as u8
    } else if remaining < window {
        (255 * remaining / window) as u8
    } else {
        255
    }
}

/// Owns the effect roster and decides what draws each frame.
///
/// `N` bounds the roster size, `MAX_PIXELS` the display size used by the
/// built-in override effects.
pub struct EffectScheduler<E: Effect, C: Clock, const N: usize, const MAX_PIXELS: usize> {
    effects: Vec<E, N>,
    enabled: Vec<bool, N>,
    enabled_count: usize,
    current: usize,
    interval: Duration,
    fade_window: Duration,
    start_time: Instant,
    play_all: bool,
    show_vu: bool,
    override_effect: Option<(OverrideEffect<MAX_PIXELS>, OverrideSource)>,
    last_manual_color: Rgb,
    targets: OutputTargets,
    fader: u8,
    clock: C,
}

impl<E: Effect, C: Clock, const N: usize, const MAX_PIXELS: usize>
    EffectScheduler<E, C, N, MAX_PIXELS>
{
    /// Build a scheduler over `effects` with every effect enabled.
    ///
    /// Effects are not initialised here; call [`Self::init_all`] once the
    /// outputs exist.
    pub fn new(
        effects: impl IntoIterator<Item = E>,
        targets: OutputTargets,
        config: &SchedulerConfig,
        clock: C,
    ) -> Result<Self, RosterError> {
        const { assert!(N <= MAX_EFFECTS, "roster capacity exceeds MAX_EFFECTS") };

        let mut roster = Vec::new();
        for effect in effects {
            roster
                .push(effect)
                .map_err(|_| RosterError::TooManyEffects { max: N })?;
        }
        if roster.is_empty() {
            return Err(RosterError::Empty);
        }

        let count = roster.len();
        let mut enabled = Vec::new();
        // Same length as the roster, which already fit in N
        let _ = enabled.resize(count, true);

        let start_time = clock.now();
        Ok(Self {
            effects: roster,
            enabled,
            enabled_count: count,
            current: 0,
            interval: config.interval,
            fade_window: config.fade_window,
            start_time,
            play_all: config.play_all,
            show_vu: config.show_vu,
            override_effect: None,
            last_manual_color: Rgb { r: 255, g: 0, b: 0 },
            targets,
            fader: 255,
            clock,
        })
    }

    /// Initialise every roster effect and start the first one.
    ///
    /// Stops at the first failure; a roster with an effect that cannot
    /// initialise must not be run.
    pub fn init_all(&mut self) -> Result<(), InitError> {
        for effect in &mut self.effects {
            log::debug!("initialising effect {}", effect.friendly_name());
            if let Err(err) = effect.init(&self.targets) {
                log::warn!("could not initialise effect: {}", err);
                return Err(err);
            }
        }
        log::debug!("first effect: {}", self.current_effect_name());
        self.start_effect();
        Ok(())
    }

    fn check_index(&self, index: usize, operation: &str) -> Result<(), IndexError> {
        if index < self.effects.len() {
            return Ok(());
        }
        log::warn!("invalid index {} for {}", index, operation);
        Err(IndexError {
            index,
            count: self.effects.len(),
        })
    }

    fn elapsed_since_start(&self) -> Duration {
        self.clock
            .now()
            .checked_duration_since(self.start_time)
            .unwrap_or(Duration::from_ticks(0))
    }

    fn skips(&self, index: usize) -> bool {
        self.enabled_count > 0 && !self.play_all && !self.enabled[index]
    }

    /// Activate whatever should draw now: the override if one is installed,
    /// the current roster effect otherwise. Restarts the fade clock.
    pub fn start_effect(&mut self) {
        let now = self.clock.now();
        match &mut self.override_effect {
            Some((effect, _)) => effect.start(now),
            None => self.effects[self.current].start(now),
        }
        self.start_time = now;
    }

    /// Advance to the next effect, skipping disabled ones unless none are
    /// enabled or play-all is set.
    pub fn next_effect(&mut self) {
        let count = self.effects.len();
        loop {
            self.current = (self.current + 1) % count;
            if !self.skips(self.current) {
                break;
            }
        }
        log::debug!("next effect: {} ({})", self.current, self.current_effect_name());
        self.start_effect();
    }

    /// Step back to the previous effect with the same skip rule as
    /// [`Self::next_effect`].
    pub fn previous_effect(&mut self) {
        let count = self.effects.len();
        loop {
            self.current = (self.current + count - 1) % count;
            if !self.skips(self.current) {
                break;
            }
        }
        log::debug!("previous effect: {} ({})", self.current, self.current_effect_name());
        self.start_effect();
    }

    /// Rotate if the current effect has used up its interval
    pub fn check_timer_expired(&mut self) {
        if self.interval.as_ticks() == 0 {
            return;
        }
        let used = self.elapsed_since_start();
        if used >= self.interval {
            log::trace!("{}ms elapsed, rotating", used.as_millis());
            self.next_effect();
        }
    }

    pub fn enable_effect(&mut self, index: usize) -> Result<(), IndexError> {
        self.check_index(index, "enable_effect")?;
        if self.enabled[index] {
            return Ok(());
        }

        self.enabled[index] = true;
        let was_blank = self.enabled_count == 0;
        self.enabled_count += 1;
        if was_blank {
            log::debug!("effect {} enabled, leaving blank state", index);
            self.override_effect = None;
            if self.enabled[self.current] {
                self.start_effect();
            } else {
                self.next_effect();
            }
        }
        Ok(())
    }

    pub fn disable_effect(&mut self, index: usize) -> Result<(), IndexError> {
        self.check_index(index, "disable_effect")?;
        if !self.enabled[index] {
            return Ok(());
        }

        self.enabled[index] = false;
        self.enabled_count -= 1;
        if self.enabled_count == 0 {
            log::debug!("last effect disabled, blanking output");
            self.install_blank();
        }
        Ok(())
    }

    pub fn is_effect_enabled(&self, index: usize) -> Result<bool, IndexError> {
        self.check_index(index, "is_effect_enabled")?;
        Ok(self.enabled[index])
    }

    /// Select an effect directly, restarting its timer
    pub fn set_current_effect_index(&mut self, index: usize) -> Result<(), IndexError> {
        self.check_index(index, "set_current_effect_index")?;
        self.current = index;
        self.start_effect();
        Ok(())
    }

    fn install_blank(&mut self) {
        let mut blank = OverrideEffect::blank();
        match blank.init(&self.targets) {
            Ok(()) => {
                self.override_effect = Some((blank, OverrideSource::AutoBlank));
                self.start_effect();
            }
            // Only fails with no pixels, where nothing is drawn anyway
            Err(err) => log::warn!("could not blank output: {}", err),
        }
    }

    /// Pre-empt the roster with an effect built for `color`.
    ///
    /// If the new effect fails to initialise, the previous state is kept.
    pub fn set_global_override(&mut self, color: Rgb) -> Result<(), InitError> {
        let mut effect = OverrideEffect::for_color(self.last_manual_color, color);
        if let Err(err) = effect.init(&self.targets) {
            log::warn!("override for color {:?} rejected: {}", color, err);
            return Err(err);
        }

        log::debug!("installing override {}", effect.friendly_name());
        self.last_manual_color = color;
        self.override_effect = Some((effect, OverrideSource::Remote));
        self.start_effect();
        Ok(())
    }

    /// Drop the override and return to the roster.
    ///
    /// With nothing enabled the blank stays in place instead.
    pub fn clear_override(&mut self) {
        if self.override_effect.is_none() {
            return;
        }
        if self.enabled_count == 0 {
            if self.override_source() != Some(OverrideSource::AutoBlank) {
                self.install_blank();
            }
            return;
        }
        log::debug!("clearing override");
        self.override_effect = None;
        self.start_effect();
    }

    /// Render one frame into `leds` and return the fader level.
    ///
    /// Does nothing on a display without pixels.
    pub fn update(&mut self, leds: &mut [Rgb]) -> u8 {
        let len = leds.len().min(self.targets.pixel_count);
        if len == 0 {
            return self.fader;
        }

        self.check_timer_expired();

        let now = self.clock.now();
        let leds = &mut leds[..len];
        match &mut self.override_effect {
            Some((effect, _)) => effect.draw(now, leds),
            None => self.effects[self.current].draw(now, leds),
        }

        self.fader = if self.effects.len() < 2 {
            255
        } else {
            fade_level(
                self.elapsed_since_start(),
                self.effective_interval(),
                self.fade_window,
            )
        };
        self.fader
    }

    /// Last fader level computed by [`Self::update`]
    pub const fn fader(&self) -> u8 {
        self.fader
    }

    /// Interval, or `None` when rotation is disabled
    pub fn effective_interval(&self) -> Option<Duration> {
        (self.interval.as_ticks() != 0).then_some(self.interval)
    }

    pub const fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub const fn fade_window(&self) -> Duration {
        self.fade_window
    }

    /// Time the current effect has been active
    pub fn time_used(&self) -> Duration {
        self.elapsed_since_start()
    }

    /// Time left before rotation; `Duration::MAX` when rotation is disabled
    pub fn time_remaining(&self) -> Duration {
        match self.effective_interval() {
            None => Duration::MAX,
            Some(interval) => interval
                .checked_sub(self.elapsed_since_start())
                .unwrap_or(Duration::from_ticks(0)),
        }
    }

    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    pub const fn enabled_count(&self) -> usize {
        self.enabled_count
    }

    pub const fn current_effect_index(&self) -> usize {
        self.current
    }

    /// The roster effect at the current index, override or not
    pub fn current_effect(&self) -> &E {
        &self.effects[self.current]
    }

    pub fn effects(&self) -> &[E] {
        &self.effects
    }

    /// Name of what is drawing: the override when present
    pub fn current_effect_name(&self) -> &str {
        match &self.override_effect {
            Some((effect, _)) => effect.friendly_name(),
            None => self.effects[self.current].friendly_name(),
        }
    }

    pub fn override_effect(&self) -> Option<&OverrideEffect<MAX_PIXELS>> {
        self.override_effect.as_ref().map(|(effect, _)| effect)
    }

    pub fn override_source(&self) -> Option<OverrideSource> {
        self.override_effect.as_ref().map(|(_, source)| *source)
    }

    pub const fn is_overridden(&self) -> bool {
        self.override_effect.is_some()
    }

    /// `true` when the blank is showing because nothing is enabled
    pub fn is_blanked(&self) -> bool {
        self.override_source() == Some(OverrideSource::AutoBlank)
    }

    pub const fn last_manual_color(&self) -> Rgb {
        self.last_manual_color
    }

    pub fn set_play_all(&mut self, play_all: bool) {
        self.play_all = play_all;
    }

    pub const fn play_all(&self) -> bool {
        self.play_all
    }

    /// Toggle the VU overlay, returning the previous setting
    pub fn show_vu(&mut self, show: bool) -> bool {
        log::debug!("setting show_vu to {}", show);
        core::mem::replace(&mut self.show_vu, show)
    }

    pub const fn is_vu_visible(&self) -> bool {
        self.show_vu
    }

    pub const fn targets(&self) -> OutputTargets {
        self.targets
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
