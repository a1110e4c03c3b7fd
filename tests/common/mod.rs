#![allow(dead_code)]

use myrtio_light_sync::{
    Effect, InitError, Instant, OutputDriver, OutputTargets, Rgb,
};

pub const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };
pub const GREEN: Rgb = Rgb { r: 0, g: 255, b: 0 };
pub const BLUE: Rgb = Rgb { r: 0, g: 0, b: 255 };
pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
pub const WHITE: Rgb = Rgb {
    r: 255,
    g: 255,
    b: 255,
};

/// Roster effect that fills with one color and counts lifecycle calls
#[derive(Debug, Clone)]
pub struct TestEffect {
    pub name: &'static str,
    pub color: Rgb,
    pub fail_init: bool,
    pub inits: usize,
    pub starts: usize,
    pub draws: usize,
}

impl TestEffect {
    pub fn new(name: &'static str, color: Rgb) -> Self {
        Self {
            name,
            color,
            fail_init: false,
            inits: 0,
            starts: 0,
            draws: 0,
        }
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            fail_init: true,
            ..Self::new(name, BLACK)
        }
    }
}

impl Effect for TestEffect {
    fn init(&mut self, _targets: &OutputTargets) -> Result<(), InitError> {
        self.inits += 1;
        if self.fail_init {
            return Err(InitError::NoOutput { effect: "test" });
        }
        Ok(())
    }

    fn start(&mut self, _now: Instant) {
        self.starts += 1;
    }

    fn draw(&mut self, _now: Instant, leds: &mut [Rgb]) {
        self.draws += 1;
        leds.fill(self.color);
    }

    fn friendly_name(&self) -> &str {
        self.name
    }
}

const NAMES: [&str; 8] = [
    "Zero", "One", "Two", "Three", "Four", "Five", "Six", "Seven",
];

/// `count` test effects, each with a distinct color
pub fn roster(count: usize) -> Vec<TestEffect> {
    (0..count)
        .map(|i| {
            let shade = u8::try_from(i * 20 + 10).unwrap_or(255);
            TestEffect::new(NAMES[i % NAMES.len()], Rgb { r: shade, g: 0, b: 0 })
        })
        .collect()
}

/// Output driver that records what it was given
#[derive(Debug, Default)]
pub struct RecordingDriver {
    pub frames: Vec<Vec<Rgb>>,
}

impl RecordingDriver {
    pub fn last(&self) -> Option<&[Rgb]> {
        self.frames.last().map(Vec::as_slice)
    }
}

impl OutputDriver for RecordingDriver {
    fn write(&mut self, colors: &[Rgb]) {
        self.frames.push(colors.to_vec());
    }
}
