mod common;

mod tests {
    use myrtio_light_sync::color::{BLACK, Palette, WHITE, YELLOW};
    use myrtio_light_sync::effect::{ColorFillEffect, FireParams, PaletteFireEffect};
    use myrtio_light_sync::{Effect, InitError, Instant, OutputTargets, OverrideEffect, Rgb};

    use super::common::{BLUE, RED, TestEffect};

    fn fire_palette() -> Palette {
        Palette::new(BLACK, RED, YELLOW, WHITE)
    }

    #[test]
    fn test_color_fill_draws_every_led() {
        let mut fill = ColorFillEffect::new(BLUE);
        let mut leds = [Rgb::default(); 6];

        fill.init(&OutputTargets::new(6)).unwrap();
        fill.draw(Instant::from_millis(0), &mut leds);

        assert!(leds.iter().all(|led| *led == BLUE));
        assert_eq!(fill.friendly_name(), "Color Fill");
        assert!(!fill.is_black());
    }

    #[test]
    fn test_color_fill_needs_pixels() {
        let mut fill = ColorFillEffect::new(BLUE);
        assert_eq!(
            fill.init(&OutputTargets::new(0)),
            Err(InitError::NoOutput {
                effect: "Color Fill"
            })
        );
    }

    #[test]
    fn test_fire_init_errors() {
        let mut fire = PaletteFireEffect::<8>::new(fire_palette(), FireParams::CUSTOM);

        assert_eq!(
            fire.init(&OutputTargets::new(0)),
            Err(InitError::NoOutput {
                effect: "Custom Fire"
            })
        );
        assert_eq!(
            fire.init(&OutputTargets::new(9)),
            Err(InitError::OutputTooLarge {
                effect: "Custom Fire",
                required: 9,
                available: 8,
            })
        );
        assert_eq!(fire.init(&OutputTargets::new(8)), Ok(()));
    }

    #[test]
    fn test_fire_starts_cold_and_heats_up() {
        let mut fire = PaletteFireEffect::<32>::new(fire_palette(), FireParams::CUSTOM);
        fire.init(&OutputTargets::new(32)).unwrap();
        fire.start(Instant::from_millis(0));

        let mut leds = [WHITE; 32];
        for step in 0..60 {
            fire.draw(Instant::from_millis(step * 40), &mut leds);
        }

        // Palette colors only: blue never appears
        assert!(leds.iter().all(|led| led.b == 0 || led.r == 255));
        assert!(leds.iter().any(|led| *led != BLACK));
    }

    #[test]
    fn test_fire_is_deterministic_for_a_seed() {
        let targets = OutputTargets::new(16);
        let mut a = PaletteFireEffect::<16>::new(fire_palette(), FireParams::CUSTOM).with_seed(7);
        let mut b = PaletteFireEffect::<16>::new(fire_palette(), FireParams::CUSTOM).with_seed(7);
        a.init(&targets).unwrap();
        b.init(&targets).unwrap();

        let mut leds_a = [Rgb::default(); 16];
        let mut leds_b = [Rgb::default(); 16];
        for step in 0..20 {
            let now = Instant::from_millis(step * 34);
            a.draw(now, &mut leds_a);
            b.draw(now, &mut leds_b);
        }
        assert_eq!(leds_a, leds_b);
    }

    #[test]
    fn test_override_for_color() {
        assert!(matches!(
            OverrideEffect::<8>::for_color(RED, WHITE),
            OverrideEffect::Fill(fill) if fill.color() == WHITE
        ));
        assert!(OverrideEffect::<8>::for_color(RED, BLACK).is_blank());

        let fire = OverrideEffect::<8>::for_color(WHITE, BLUE);
        let OverrideEffect::Fire(effect) = &fire else {
            panic!("expected a fire override");
        };
        assert_eq!(effect.palette(), &Palette::new(BLACK, BLUE, YELLOW, WHITE));
        assert_eq!(fire.friendly_name(), "Custom Fire");
        assert!(!fire.is_blank());
    }

    #[test]
    fn test_blank_draws_black() {
        let mut blank = OverrideEffect::<8>::blank();
        let mut leds = [WHITE; 8];

        blank.init(&OutputTargets::new(8)).unwrap();
        blank.draw(Instant::from_millis(0), &mut leds);

        assert!(blank.is_blank());
        assert!(leds.iter().all(|led| *led == BLACK));
    }

    #[test]
    fn test_trait_defaults() {
        let effect = TestEffect::new("Plain", RED);
        assert_eq!(effect.desired_fps(), 30);
        assert!(!effect.requires_double_buffering());
    }

    #[test]
    fn test_override_forwards_buffering_hint() {
        let fill = ColorFillEffect::new(BLUE);
        let fire = PaletteFireEffect::<8>::new(fire_palette(), FireParams::CUSTOM);

        assert_eq!(
            OverrideEffect::<8>::Fill(fill).requires_double_buffering(),
            fill.requires_double_buffering()
        );
        assert_eq!(
            OverrideEffect::Fire(fire.clone()).requires_double_buffering(),
            fire.requires_double_buffering()
        );
    }

    fn drive<E: Effect>(mut effect: E, leds: &mut [Rgb]) -> String {
        effect.init(&OutputTargets::new(leds.len())).unwrap();
        effect.start(Instant::from_millis(0));
        effect.draw(Instant::from_millis(1), leds);
        effect.friendly_name().to_owned()
    }

    #[test]
    fn test_effect_through_mutable_reference() {
        let mut inner = TestEffect::new("Borrowed", RED);
        let mut leds = [Rgb::default(); 2];

        assert_eq!(drive(&mut inner, &mut leds), "Borrowed");
        assert_eq!(leds, [RED; 2]);
        assert_eq!((inner.inits, inner.starts, inner.draws), (1, 1, 1));
    }
}
