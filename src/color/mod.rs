mod palette;
mod utils;

use smart_leds::RGB8;

pub use palette::Palette;
pub use utils::{blend_colors, scale_color};

pub type Rgb = RGB8;

pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
pub const WHITE: Rgb = Rgb {
    r: 255,
    g: 255,
    b: 255,
};
pub const YELLOW: Rgb = Rgb {
    r: 255,
    g: 255,
    b: 0,
};
