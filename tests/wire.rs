mod tests {
    use myrtio_light_sync::wire::{
        self, BYTES_PER_PIXEL, COMMAND_PIXELDATA, EncodeError, HEADER_LEN,
    };
    use myrtio_light_sync::{DecodeError, Frame, Rgb, Timestamp, WireHeader};

    fn header_bytes(pixel_count: u32, seconds: u64, micros: u64) -> Vec<u8> {
        let header = WireHeader {
            command: COMMAND_PIXELDATA,
            channel: 0,
            pixel_count,
            timestamp: Timestamp::new(seconds, micros),
        };
        let mut out = [0u8; HEADER_LEN];
        header.write(&mut out);
        out.to_vec()
    }

    fn pixel(i: usize) -> Rgb {
        let i = u8::try_from(i).unwrap();
        Rgb {
            r: i,
            g: i.wrapping_mul(2),
            b: 255 - i,
        }
    }

    #[test]
    fn test_header_is_little_endian() {
        let bytes = [
            0x03, 0x00, // command
            0x02, 0x01, // channel
            0x05, 0x00, 0x00, 0x00, // pixel count
            0x2A, 0, 0, 0, 0, 0, 0, 0, // seconds
            0x20, 0xA1, 0x07, 0, 0, 0, 0, 0, // micros
        ];

        let header = WireHeader::parse(&bytes).unwrap();
        assert_eq!(header.command, 3);
        assert_eq!(header.channel, 0x0102);
        assert_eq!(header.pixel_count, 5);
        assert_eq!(header.timestamp, Timestamp::new(42, 500_000));
        assert_eq!(header.packet_len(), HEADER_LEN + 5 * BYTES_PER_PIXEL);
    }

    #[test]
    fn test_too_short_leaves_frame_untouched() {
        let mut frame = Frame::<100>::from_pixels(&[pixel(9)], Timestamp::new(1, 2)).unwrap();

        let result = wire::decode_into(&[0u8; 23], &mut frame);
        assert_eq!(result, Err(DecodeError::TooShort { len: 23 }));
        assert_eq!(frame.pixels(), &[pixel(9)]);
        assert_eq!(frame.captured_at(), Timestamp::new(1, 2));
    }

    #[test]
    fn test_capacity_exceeded() {
        let mut bytes = header_bytes(200, 1, 0);
        bytes.resize(HEADER_LEN + 200 * BYTES_PER_PIXEL, 0);

        assert_eq!(
            wire::decode::<100>(&bytes).err(),
            Some(DecodeError::CapacityExceeded {
                pixel_count: 200,
                max_pixels: 100,
            })
        );
    }

    #[test]
    fn test_capacity_reported_before_truncation() {
        let bytes = header_bytes(200, 1, 0);

        assert!(matches!(
            wire::decode::<100>(&bytes),
            Err(DecodeError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn test_size_mismatch() {
        let mut bytes = header_bytes(10, 1, 0);
        bytes.extend_from_slice(&[0u8; 5 * BYTES_PER_PIXEL]);
        let mut frame = Frame::<100>::new();

        assert_eq!(
            wire::decode_into(&bytes, &mut frame),
            Err(DecodeError::SizeMismatch {
                expected: 54,
                actual: 39,
            })
        );
        assert_eq!(frame.pixel_count(), 0);
    }

    #[test]
    fn test_round_trip() {
        let pixels: Vec<Rgb> = (0..100).map(pixel).collect();
        let mut frame = Frame::<100>::from_pixels(&pixels, Timestamp::new(5, 500_000)).unwrap();
        frame.set_channel(7);

        let mut bytes = vec![0u8; HEADER_LEN + 100 * BYTES_PER_PIXEL];
        let written = wire::encode(&frame, COMMAND_PIXELDATA, &mut bytes).unwrap();
        assert_eq!(written, 324);
        assert_eq!(&bytes[HEADER_LEN..HEADER_LEN + 3], &[0, 0, 255]);

        let decoded = wire::decode::<100>(&bytes).unwrap();
        assert_eq!(decoded.pixels(), pixels.as_slice());
        assert_eq!(decoded.captured_at(), Timestamp::new(5, 500_000));
        assert_eq!(decoded.channel(), 7);
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut bytes = header_bytes(2, 3, 4);
        bytes.extend_from_slice(&[1, 2, 3, 4, 5, 6, 0xFF, 0xFF]);

        let frame = wire::decode::<4>(&bytes).unwrap();
        assert_eq!(
            frame.pixels(),
            &[Rgb { r: 1, g: 2, b: 3 }, Rgb { r: 4, g: 5, b: 6 }]
        );
    }

    #[test]
    fn test_decode_replaces_previous_payload() {
        let mut frame = Frame::<4>::from_pixels(&[pixel(1); 4], Timestamp::new(1, 0)).unwrap();
        let mut bytes = header_bytes(1, 8, 0);
        bytes.extend_from_slice(&[9, 9, 9]);

        let header = wire::decode_into(&bytes, &mut frame).unwrap();
        assert_eq!(header.pixel_count, 1);
        assert_eq!(frame.pixel_count(), 1);
        assert_eq!(frame.captured_at(), Timestamp::new(8, 0));
    }

    #[test]
    fn test_encode_into_small_buffer() {
        let frame = Frame::<4>::from_pixels(&[pixel(1); 2], Timestamp::new(1, 0)).unwrap();
        let mut bytes = [0u8; 20];

        assert_eq!(
            wire::encode(&frame, COMMAND_PIXELDATA, &mut bytes),
            Err(EncodeError {
                needed: 30,
                available: 20,
            })
        );
    }

    #[test]
    fn test_huge_pixel_count_does_not_overflow() {
        let bytes = header_bytes(u32::MAX, 0, 0);
        let header = WireHeader::parse(&bytes).unwrap();

        assert!(header.packet_len() > HEADER_LEN);
        assert!(wire::decode::<8>(&bytes).is_err());
    }
}
