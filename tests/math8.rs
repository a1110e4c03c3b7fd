mod tests {
    use myrtio_light_sync::math8::{blend8, qadd8, qsub8, scale8};

    #[test]
    fn test_scale8() {
        assert_eq!(scale8(255, 128), 128);
        assert_eq!(scale8(0, 128), 0);
        assert_eq!(scale8(128, 128), 64);
        assert_eq!(scale8(128, 255), 128);
        assert_eq!(scale8(128, 0), 0);
        assert_eq!(scale8(10, 127), 5);
    }

    #[test]
    fn test_blend8() {
        assert_eq!(blend8(255, 128, 128), 191);
        assert_eq!(blend8(0, 128, 255), 128);
        assert_eq!(blend8(255, 0, 128), 127);
        assert_eq!(blend8(255, 128, 0), 255);
    }

    #[test]
    fn test_saturating_ops() {
        assert_eq!(qadd8(200, 100), 255);
        assert_eq!(qadd8(20, 30), 50);
        assert_eq!(qsub8(20, 30), 0);
        assert_eq!(qsub8(30, 20), 10);
    }
}
