mod tests {
    use myrtio_light_sync::color::{Palette, Rgb, blend_colors, scale_color};

    const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };
    const GREEN: Rgb = Rgb { r: 0, g: 255, b: 0 };
    const BLUE: Rgb = Rgb { r: 0, g: 0, b: 255 };
    const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    #[test]
    fn test_blend_colors() {
        assert_eq!(blend_colors(RED, BLUE, 0), RED);
        assert_eq!(blend_colors(RED, BLUE, 255), BLUE);
        assert_eq!(
            blend_colors(RED, BLUE, 128),
            Rgb {
                r: 127,
                g: 0,
                b: 128
            }
        );
        assert_eq!(blend_colors(WHITE, BLACK, 255), BLACK);
        assert_eq!(blend_colors(WHITE, BLACK, 0), WHITE);
    }

    #[test]
    fn test_scale_color() {
        assert_eq!(scale_color(RED, 255), RED);
        assert_eq!(scale_color(WHITE, 0), BLACK);
        assert_eq!(
            scale_color(WHITE, 127),
            Rgb {
                r: 127,
                g: 127,
                b: 127
            }
        );
    }

    #[test]
    fn test_palette_stops() {
        let palette = Palette::new(BLACK, RED, GREEN, BLUE);

        assert_eq!(palette.color_at(0), BLACK);
        assert_eq!(palette.color_at(85), RED);
        assert_eq!(palette.color_at(170), GREEN);
        assert_eq!(palette.color_at(255), BLUE);
        assert_eq!(palette.stops(), &[BLACK, RED, GREEN, BLUE]);
    }

    #[test]
    fn test_palette_between_stops() {
        let palette = Palette::new(BLACK, WHITE, WHITE, WHITE);
        let mid = palette.color_at(42);

        assert!(mid.r > 100 && mid.r < 155);
        assert_eq!(mid.r, mid.g);
        assert_eq!(mid.g, mid.b);
    }
}
