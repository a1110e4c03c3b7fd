//! Control surface for the effect scheduler.
//!
//! REST handlers and remote inputs run outside the render loop, so they never
//! touch the [`EffectScheduler`] directly. Instead they go through a
//! [`ControlLink`]:
//!
//! - commands are queued in a bounded `heapless::Deque` and drained by the
//!   render loop at the start of each tick;
//! - after each tick the render loop publishes a [`SchedulerStatus`]
//!   snapshot that queries read back.
//!
//! Both halves sit behind their own `critical-section` mutex and each lock
//! is held only to copy a value in or out. Effect drawing never happens
//! under either lock.

use core::cell::RefCell;

use critical_section::Mutex;
use embassy_time::Duration;
use heapless::{Deque, String, Vec};
use thiserror::Error;

use crate::clock::Clock;
use crate::color::Rgb;
use crate::effect::Effect;
use crate::scheduler::{EffectScheduler, IndexError};

/// Longest effect name kept in a status snapshot; longer names are cut
pub const NAME_LEN: usize = 32;

/// Requests the control layer can make of the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerCommand {
    NextEffect,
    PreviousEffect,
    SetCurrentEffect(usize),
    SetInterval(Duration),
    EnableEffect(usize),
    DisableEffect(usize),
    SetPlayAll(bool),
    ShowVu(bool),
    SetGlobalColor(Rgb),
    ClearOverride,
}

/// A control request was refused before reaching the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("command queue is full")]
    QueueFull(SchedulerCommand),
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// One roster entry as seen by the control layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectEntry {
    pub name: String<NAME_LEN>,
    pub enabled: bool,
}

/// Snapshot of scheduler state published once per render tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerStatus<const N: usize> {
    pub current_effect: usize,
    /// Name of what is drawing, override included
    pub current_name: String<NAME_LEN>,
    pub interval: Duration,
    pub time_remaining: Duration,
    pub enabled_count: usize,
    pub effects: Vec<EffectEntry, N>,
    pub overridden: bool,
    pub fader: u8,
    pub show_vu: bool,
    pub play_all: bool,
}

impl<const N: usize> SchedulerStatus<N> {
    /// Status before the first publish: an empty roster
    pub const fn new() -> Self {
        Self {
            current_effect: 0,
            current_name: String::new(),
            interval: Duration::from_ticks(0),
            time_remaining: Duration::from_ticks(0),
            enabled_count: 0,
            effects: Vec::new(),
            overridden: false,
            fader: 255,
            show_vu: true,
            play_all: false,
        }
    }

    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    /// `None` if `index` is outside the published roster
    pub fn is_effect_enabled(&self, index: usize) -> Option<bool> {
        self.effects.get(index).map(|entry| entry.enabled)
    }
}

impl<const N: usize> Default for SchedulerStatus<N> {
    fn default() -> Self {
        Self::new()
    }
}

fn copy_name(dst: &mut String<NAME_LEN>, name: &str) {
    dst.clear();
    for ch in name.chars() {
        if dst.push(ch).is_err() {
            break;
        }
    }
}

/// Shared link between control contexts and the render loop.
///
/// `N` is the scheduler's roster capacity, `SIZE` the command queue depth.
/// Usually lives in a `static`.
pub struct ControlLink<const N: usize, const SIZE: usize> {
    commands: Mutex<RefCell<Deque<SchedulerCommand, SIZE>>>,
    status: Mutex<RefCell<SchedulerStatus<N>>>,
}

impl<const N: usize, const SIZE: usize> ControlLink<N, SIZE> {
    pub const fn new() -> Self {
        Self {
            commands: Mutex::new(RefCell::new(Deque::new())),
            status: Mutex::new(RefCell::new(SchedulerStatus::new())),
        }
    }

    /// Queue a command for the next render tick
    pub fn send(&self, command: SchedulerCommand) -> Result<(), ControlError> {
        critical_section::with(|cs| {
            let mut queue = self.commands.borrow(cs).borrow_mut();
            queue.push_back(command).map_err(ControlError::QueueFull)
        })
    }

    /// Take the oldest queued command
    pub fn try_receive(&self) -> Option<SchedulerCommand> {
        critical_section::with(|cs| self.commands.borrow(cs).borrow_mut().pop_front())
    }

    pub fn pending(&self) -> usize {
        critical_section::with(|cs| self.commands.borrow(cs).borrow().len())
    }

    /// Copy of the last published status
    pub fn status(&self) -> SchedulerStatus<N> {
        critical_section::with(|cs| self.status.borrow(cs).borrow().clone())
    }

    fn read_status<R>(&self, f: impl FnOnce(&SchedulerStatus<N>) -> R) -> R {
        critical_section::with(|cs| f(&self.status.borrow(cs).borrow()))
    }

    /// Reject indices outside the published roster.
    ///
    /// Before the first publish the roster size is unknown and the
    /// scheduler performs the check itself.
    fn check_index(&self, index: usize) -> Result<(), ControlError> {
        let count = self.read_status(SchedulerStatus::effect_count);
        if count > 0 && index >= count {
            log::warn!("control: invalid effect index {}", index);
            return Err(IndexError { index, count }.into());
        }
        Ok(())
    }

    pub fn next_effect(&self) -> Result<(), ControlError> {
        self.send(SchedulerCommand::NextEffect)
    }

    pub fn previous_effect(&self) -> Result<(), ControlError> {
        self.send(SchedulerCommand::PreviousEffect)
    }

    pub fn set_current_effect_index(&self, index: usize) -> Result<(), ControlError> {
        self.check_index(index)?;
        self.send(SchedulerCommand::SetCurrentEffect(index))
    }

    pub fn set_interval(&self, interval: Duration) -> Result<(), ControlError> {
        self.send(SchedulerCommand::SetInterval(interval))
    }

    pub fn enable_effect(&self, index: usize) -> Result<(), ControlError> {
        self.check_index(index)?;
        self.send(SchedulerCommand::EnableEffect(index))
    }

    pub fn disable_effect(&self, index: usize) -> Result<(), ControlError> {
        self.check_index(index)?;
        self.send(SchedulerCommand::DisableEffect(index))
    }

    pub fn set_play_all(&self, play_all: bool) -> Result<(), ControlError> {
        self.send(SchedulerCommand::SetPlayAll(play_all))
    }

    pub fn show_vu(&self, show: bool) -> Result<(), ControlError> {
        self.send(SchedulerCommand::ShowVu(show))
    }

    pub fn set_global_color(&self, color: Rgb) -> Result<(), ControlError> {
        self.send(SchedulerCommand::SetGlobalColor(color))
    }

    pub fn clear_override(&self) -> Result<(), ControlError> {
        self.send(SchedulerCommand::ClearOverride)
    }

    pub fn current_effect_index(&self) -> usize {
        self.read_status(|status| status.current_effect)
    }

    pub fn interval(&self) -> Duration {
        self.read_status(|status| status.interval)
    }

    pub fn effect_count(&self) -> usize {
        self.read_status(SchedulerStatus::effect_count)
    }

    pub fn enabled_count(&self) -> usize {
        self.read_status(|status| status.enabled_count)
    }

    pub fn time_remaining(&self) -> Duration {
        self.read_status(|status| status.time_remaining)
    }

    pub fn is_effect_enabled(&self, index: usize) -> Option<bool> {
        self.read_status(|status| status.is_effect_enabled(index))
    }

    /// Publish the scheduler's current state
    pub fn publish<E: Effect, C: Clock, const MAX_PIXELS: usize>(
        &self,
        scheduler: &EffectScheduler<E, C, N, MAX_PIXELS>,
    ) {
        critical_section::with(|cs| {
            scheduler.write_status(&mut self.status.borrow(cs).borrow_mut());
        });
    }
}

impl<const N: usize, const SIZE: usize> Default for ControlLink<N, SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Effect, C: Clock, const N: usize, const MAX_PIXELS: usize>
    EffectScheduler<E, C, N, MAX_PIXELS>
{
    /// Apply one control command. Bad requests are logged and dropped.
    pub fn apply(&mut self, command: SchedulerCommand) {
        log::trace!("applying {:?}", command);
        let result = match command {
            SchedulerCommand::NextEffect => {
                self.next_effect();
                Ok(())
            }
            SchedulerCommand::PreviousEffect => {
                self.previous_effect();
                Ok(())
            }
            SchedulerCommand::SetCurrentEffect(index) => self.set_current_effect_index(index),
            SchedulerCommand::EnableEffect(index) => self.enable_effect(index),
            SchedulerCommand::DisableEffect(index) => self.disable_effect(index),
            SchedulerCommand::SetInterval(interval) => {
                self.set_interval(interval);
                Ok(())
            }
            SchedulerCommand::SetPlayAll(play_all) => {
                self.set_play_all(play_all);
                Ok(())
            }
            SchedulerCommand::ShowVu(show) => {
                self.show_vu(show);
                Ok(())
            }
            SchedulerCommand::SetGlobalColor(color) => {
                // Failure already logged; previous override stays
                let _ = self.set_global_override(color);
                Ok(())
            }
            SchedulerCommand::ClearOverride => {
                self.clear_override();
                Ok(())
            }
        };
        if let Err(err) = result {
            log::warn!("ignoring {:?}: {}", command, err);
        }
    }

    /// Drain and apply every queued command
    pub fn process_commands<const SIZE: usize>(&mut self, link: &ControlLink<N, SIZE>) -> usize {
        let mut applied = 0;
        while let Some(command) = link.try_receive() {
            self.apply(command);
            applied += 1;
        }
        applied
    }

    /// Fill `status` from the current state
    pub fn write_status(&self, status: &mut SchedulerStatus<N>) {
        status.current_effect = self.current_effect_index();
        copy_name(&mut status.current_name, self.current_effect_name());
        status.interval = self.interval();
        status.time_remaining = self.time_remaining();
        status.enabled_count = self.enabled_count();
        status.overridden = self.is_overridden();
        status.fader = self.fader();
        status.show_vu = self.is_vu_visible();
        status.play_all = self.play_all();

        status.effects.clear();
        for (index, effect) in self.effects().iter().enumerate() {
            let mut entry = EffectEntry {
                name: String::new(),
                enabled: self.is_effect_enabled(index).unwrap_or(false),
            };
            copy_name(&mut entry.name, effect.friendly_name());
            if status.effects.push(entry).is_err() {
                break;
            }
        }
    }

    /// Snapshot of the current state
    pub fn status(&self) -> SchedulerStatus<N> {
        let mut status = SchedulerStatus::new();
        self.write_status(&mut status);
        status
    }
}

impl<const N: usize> core::fmt::Display for SchedulerStatus<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "effect {} ({}), {}/{} enabled, {}ms left",
            self.current_effect,
            self.current_name,
            self.enabled_count,
            self.effect_count(),
            self.time_remaining.as_millis()
        )?;
        if self.overridden {
            f.write_str(", overridden")?;
        }
        Ok(())
    }
}
