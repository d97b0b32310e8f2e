//! Integration tests for the MQ arithmetic decoder.
//!
//! Tests cover:
//! - The ITU-T T.88 H.2 decoding sequence
//! - Decoding data produced by a reference MQ encoder (Annex E), with many
//!   interleaved contexts and with the IAx / IAID integer procedures
//! - Decoding from a bounded substream inside a larger buffer
//! - Context store snapshot and commit

use jbig2_oxide::arithmetic::qe_table::QE_TABLE;
use jbig2_oxide::arithmetic::{ArithmeticDecoder, ContextStore, INT_CONTEXT_SIZE};
use jbig2_oxide::bitio::{Reader, StreamReader, SubstreamReader};
use jbig2_oxide::CodecOptions;
use proptest::prelude::*;

/// Encoded sequence from T.88 H.2.
const CONFORMANCE_DATA: [u8; 30] = [
    0x84, 0xC7, 0x3B, 0xFC, 0xE1, 0xA1, 0x43, 0x04, 0x02, 0x20, 0x00, 0x00, 0x41, 0x0D, 0xBB, 0x86,
    0xF4, 0x31, 0x7F, 0xFF, 0x88, 0xFF, 0x37, 0x47, 0x1A, 0xDB, 0x6A, 0xDF, 0xFF, 0xAC,
];

/// Source data of the H.2 sequence, decoded MSB first.
const CONFORMANCE_BITS: [u8; 32] = [
    0x00, 0x02, 0x00, 0x51, 0x00, 0x00, 0x00, 0xC0, 0x03, 0x52, 0x87, 0x2A, 0xAA, 0xAA, 0xAA, 0xAA,
    0x82, 0xC0, 0x20, 0x00, 0xFC, 0xD7, 0x9E, 0xF6, 0xBF, 0x7F, 0xED, 0x90, 0x4F, 0x46, 0xA3, 0xBF,
];

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Reference MQ encoder (T.88 E.2) used to produce test streams.
struct MqEncoder {
    a: u32,
    c: u32,
    ct: u32,
    b: u8,
    started: bool,
    out: Vec<u8>,
}

impl MqEncoder {
    fn new() -> Self {
        Self {
            a: 0x8000,
            c: 0,
            ct: 12,
            b: 0,
            started: false,
            out: Vec::new(),
        }
    }

    fn emit(&mut self) {
        if self.started {
            self.out.push(self.b);
        }
        self.started = true;
    }

    fn byte_out(&mut self) {
        if self.b == 0xFF {
            self.emit();
            self.b = (self.c >> 20) as u8;
            self.c &= 0xF_FFFF;
            self.ct = 7;
        } else if self.c < 0x800_0000 {
            self.emit();
            self.b = (self.c >> 19) as u8;
            self.c &= 0x7_FFFF;
            self.ct = 8;
        } else {
            self.b += 1;
            if self.b == 0xFF {
                self.c &= 0x7FF_FFFF;
                self.emit();
                self.b = (self.c >> 20) as u8;
                self.c &= 0xF_FFFF;
                self.ct = 7;
            } else {
                self.emit();
                self.b = (self.c >> 19) as u8;
                self.c &= 0x7_FFFF;
                self.ct = 8;
            }
        }
    }

    fn renormalize(&mut self) {
        loop {
            self.a <<= 1;
            self.c <<= 1;
            self.ct -= 1;
            if self.ct == 0 {
                self.byte_out();
            }
            if self.a & 0x8000 != 0 {
                break;
            }
        }
    }

    fn encode(&mut self, store: &mut ContextStore, cx: usize, bit: u8) {
        let state = store.state(cx).unwrap();
        let mps = store.mps(cx).unwrap();
        let entry = &QE_TABLE[state as usize];
        let qe = entry.qe;

        self.a -= qe;
        if bit == mps {
            if self.a & 0x8000 == 0 {
                if self.a < qe {
                    self.a = qe;
                } else {
                    self.c += qe;
                }
                store.set(cx, entry.nmps, mps).unwrap();
                self.renormalize();
            } else {
                self.c += qe;
            }
        } else {
            if self.a < qe {
                self.c += qe;
            } else {
                self.a = qe;
            }
            let next_mps = if entry.switch { mps ^ 1 } else { mps };
            store.set(cx, entry.nlps, next_mps).unwrap();
            self.renormalize();
        }
    }

    fn encode_int_bit(&mut self, store: &mut ContextStore, prev: &mut usize, bit: u8) {
        self.encode(store, *prev, bit);
        let shifted = (*prev << 1) | usize::from(bit);
        *prev = if *prev < 0x100 {
            shifted
        } else {
            (shifted & 0x1FF) | 0x100
        };
    }

    /// IAx encoding; `None` is the out-of-band value.
    fn encode_int(&mut self, store: &mut ContextStore, value: Option<i32>) {
        const RANGES: [(u32, i64); 6] =
            [(2, 0), (4, 4), (6, 20), (8, 84), (12, 340), (32, 4436)];

        let (sign, magnitude) = match value {
            None => (1, 0i64),
            Some(v) => (u8::from(v < 0), i64::from(v).abs()),
        };
        let index = RANGES
            .iter()
            .rposition(|&(_, offset)| magnitude >= offset)
            .unwrap();

        let mut prev = 1usize;
        self.encode_int_bit(store, &mut prev, sign);
        for _ in 0..index {
            self.encode_int_bit(store, &mut prev, 1);
        }
        if index < RANGES.len() - 1 {
            self.encode_int_bit(store, &mut prev, 0);
        }

        let (bits, offset) = RANGES[index];
        let v = magnitude - offset;
        for i in (0..bits).rev() {
            self.encode_int_bit(store, &mut prev, ((v >> i) & 1) as u8);
        }
    }

    fn encode_iaid(&mut self, store: &mut ContextStore, code_len: u32, id: u32) {
        let mut prev = 1usize;
        for i in (0..code_len).rev() {
            let bit = ((id >> i) & 1) as u8;
            self.encode(store, prev, bit);
            prev = (prev << 1) | usize::from(bit);
        }
    }

    fn finish(mut self) -> Vec<u8> {
        let temp = self.c + self.a;
        self.c |= 0xFFFF;
        if self.c >= temp {
            self.c -= 0x8000;
        }
        self.c <<= self.ct;
        self.byte_out();
        self.c <<= self.ct;
        self.byte_out();
        self.emit();
        self.out.extend_from_slice(&[0xFF, 0xAC]);
        self.out
    }
}

/// Deterministic skewed decision source for multi-context streams.
fn skewed_decisions(count: usize) -> Vec<(usize, u8)> {
    let mut state = 0x9E37_79B9u32;
    (0..count)
        .map(|i| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let cx = i % 5;
            // Context 0 almost always 0, context 4 close to fair
            let threshold = [250, 200, 160, 140, 128][cx];
            (cx, u8::from((state >> 24) as u8 >= threshold))
        })
        .collect()
}

#[test]
fn test_conformance_decoding() {
    init_logging();
    let mut decoder = ArithmeticDecoder::new(Reader::from_slice(&CONFORMANCE_DATA)).unwrap();
    let mut store = ContextStore::new(512);

    let mut decoded = Vec::new();
    for _ in 0..CONFORMANCE_BITS.len() {
        let mut byte = 0u8;
        for _ in 0..8 {
            byte = (byte << 1) | decoder.decode_bit(&mut store, 0).unwrap();
        }
        decoded.push(byte);
    }
    assert_eq!(decoded, CONFORMANCE_BITS);
}

#[test]
fn test_reference_encoder_conformance_round_trip() {
    init_logging();
    let mut encoder = MqEncoder::new();
    let mut encoder_store = ContextStore::new(512);
    for &byte in &CONFORMANCE_BITS {
        for i in (0..8).rev() {
            encoder.encode(&mut encoder_store, 0, (byte >> i) & 1);
        }
    }
    let data = encoder.finish();

    let mut decoder = ArithmeticDecoder::new(Reader::new(data)).unwrap();
    let mut store = ContextStore::new(512);
    for &byte in &CONFORMANCE_BITS {
        for i in (0..8).rev() {
            assert_eq!(decoder.decode_bit(&mut store, 0).unwrap(), (byte >> i) & 1);
        }
    }
    assert_eq!(store, encoder_store);
}

#[test]
fn test_interleaved_contexts() {
    init_logging();
    let decisions = skewed_decisions(20_000);

    let mut encoder = MqEncoder::new();
    let mut encoder_store = ContextStore::new(5);
    for &(cx, bit) in &decisions {
        encoder.encode(&mut encoder_store, cx, bit);
    }
    let data = encoder.finish();
    assert!(data.len() < decisions.len() / 8);

    let mut decoder = ArithmeticDecoder::new(Reader::new(data)).unwrap();
    let mut store = ContextStore::new(5);
    for &(cx, bit) in &decisions {
        assert_eq!(decoder.decode_bit(&mut store, cx).unwrap(), bit);
    }
    assert_eq!(store, encoder_store);
}

#[test]
fn test_decoding_past_marker_never_fails() {
    let mut encoder = MqEncoder::new();
    let mut encoder_store = ContextStore::new(1);
    for _ in 0..100 {
        encoder.encode(&mut encoder_store, 0, 1);
    }
    let data = encoder.finish();

    let mut decoder = ArithmeticDecoder::new(Reader::new(data)).unwrap();
    let mut store = ContextStore::new(1);
    for _ in 0..100 {
        assert_eq!(decoder.decode_bit(&mut store, 0).unwrap(), 1);
    }
    for _ in 0..10_000 {
        decoder.decode_bit(&mut store, 0).unwrap();
    }
    assert!(decoder.marker_reached());
}

#[test]
fn test_integer_procedures() {
    init_logging();
    let values = [
        Some(0),
        Some(3),
        Some(-1),
        Some(4),
        Some(-19),
        Some(20),
        Some(83),
        Some(-84),
        Some(339),
        Some(340),
        Some(4435),
        Some(-4436),
        Some(1_000_000),
        Some(i32::MAX),
        Some(-i32::MAX),
        None,
        Some(7),
    ];

    let mut encoder = MqEncoder::new();
    let mut iadw = ContextStore::new(INT_CONTEXT_SIZE);
    let mut iaid = ContextStore::new(1 << 10);
    for (i, &value) in values.iter().enumerate() {
        encoder.encode_int(&mut iadw, value);
        encoder.encode_iaid(&mut iaid, 10, (i as u32 * 97) % 1024);
    }
    let data = encoder.finish();

    let mut decoder = ArithmeticDecoder::new(Reader::new(data)).unwrap();
    let mut iadw = ContextStore::new(INT_CONTEXT_SIZE);
    let mut iaid = ContextStore::new(1 << 10);
    for (i, &value) in values.iter().enumerate() {
        assert_eq!(decoder.decode_int(&mut iadw).unwrap(), value);
        assert_eq!(
            decoder.decode_iaid(10, &mut iaid).unwrap(),
            (i as u32 * 97) % 1024
        );
    }
}

#[test]
fn test_integer_out_of_i32_range() {
    // Largest range with every value bit set: 4436 + (2^32 - 1)
    let mut encoder = MqEncoder::new();
    let mut encoder_store = ContextStore::new(INT_CONTEXT_SIZE);
    let mut prev = 1usize;
    encoder.encode_int_bit(&mut encoder_store, &mut prev, 0);
    for _ in 0..(5 + 32) {
        encoder.encode_int_bit(&mut encoder_store, &mut prev, 1);
    }
    encoder.encode_int(&mut encoder_store, Some(7));
    let data = encoder.finish();

    let mut decoder = ArithmeticDecoder::new(Reader::new(data)).unwrap();
    let mut store = ContextStore::new(INT_CONTEXT_SIZE);
    let err = decoder.decode_int(&mut store).unwrap_err();
    assert!(matches!(err, jbig2_oxide::Error::Decode(_)));

    // The rejected value's decisions were consumed; decoding carries on
    assert_eq!(decoder.decode_int(&mut store).unwrap(), Some(7));
}

#[test]
fn test_integers_from_noise_decode_or_reject() {
    let mut state = 0x2545_F491u32;
    let noise: Vec<u8> = (0..4096)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8 & 0x7F
        })
        .collect();

    let mut decoder =
        ArithmeticDecoder::with_options(Reader::new(noise), &CodecOptions::lenient()).unwrap();
    let mut store = ContextStore::new(INT_CONTEXT_SIZE);
    for _ in 0..4096 {
        match decoder.decode_int(&mut store) {
            Ok(_) | Err(jbig2_oxide::Error::Decode(_)) => {},
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
}

#[test]
fn test_decode_from_substream() {
    init_logging();
    let decisions = skewed_decisions(4_000);
    let mut encoder = MqEncoder::new();
    let mut encoder_store = ContextStore::new(5);
    for &(cx, bit) in &decisions {
        encoder.encode(&mut encoder_store, cx, bit);
    }
    let payload = encoder.finish();

    // Segment data surrounded by header bytes and the next segment
    let mut file = vec![0x97, 0x4A, 0x42, 0x32, 0x0D, 0x0A, 0x1A, 0x0A];
    let offset = file.len() as u64;
    file.extend_from_slice(&payload);
    file.extend_from_slice(&[0xFF; 64]);

    let options = CodecOptions::default().with_substream_buffer_size(16);
    let segment =
        SubstreamReader::with_options(Reader::new(file), offset, payload.len() as u64, &options)
            .unwrap();
    let mut decoder = ArithmeticDecoder::new(segment).unwrap();
    let mut store = ContextStore::new(5);
    for &(cx, bit) in &decisions {
        assert_eq!(decoder.decode_bit(&mut store, cx).unwrap(), bit);
    }
    assert_eq!(store, encoder_store);
    assert!(decoder.into_inner().stream_position() <= payload.len() as u64);
}

#[test]
fn test_truncated_segment_strict_and_lenient() {
    init_logging();
    let decisions = skewed_decisions(4_000);
    let mut encoder = MqEncoder::new();
    let mut encoder_store = ContextStore::new(5);
    for &(cx, bit) in &decisions {
        encoder.encode(&mut encoder_store, cx, bit);
    }
    let payload = encoder.finish();
    let truncated = &payload[..payload.len() / 2];

    let mut strict = ArithmeticDecoder::new(Reader::from_slice(truncated)).unwrap();
    let mut store = ContextStore::new(5);
    let failed = decisions
        .iter()
        .any(|&(cx, _)| strict.decode_bit(&mut store, cx).is_err());
    assert!(failed);

    let mut lenient =
        ArithmeticDecoder::with_options(Reader::from_slice(truncated), &CodecOptions::lenient())
            .unwrap();
    let mut store = ContextStore::new(5);
    for &(cx, _) in &decisions {
        lenient.decode_bit(&mut store, cx).unwrap();
    }
    assert!(lenient.marker_reached());
}

#[test]
fn test_snapshot_and_commit() {
    let decisions = skewed_decisions(2_000);
    let mut encoder = MqEncoder::new();
    let mut encoder_store = ContextStore::new(5);
    for &(cx, bit) in &decisions {
        encoder.encode(&mut encoder_store, cx, bit);
    }
    let data = encoder.finish();

    let mut decoder = ArithmeticDecoder::new(Reader::new(data.clone())).unwrap();
    let mut store = ContextStore::new(5);
    for &(cx, _) in &decisions[..1_000] {
        decoder.decode_bit(&mut store, cx).unwrap();
    }

    // Trial decode on a copy leaves the original untouched
    let checkpoint = store.clone();
    let mut trial = store.clone();
    for &(cx, bit) in &decisions[1_000..] {
        assert_eq!(decoder.decode_bit(&mut trial, cx).unwrap(), bit);
    }
    assert_eq!(store, checkpoint);
    assert_eq!(trial, encoder_store);

    store.overwrite(&trial);
    assert_eq!(store, encoder_store);

    // A reset store decodes the stream again from scratch
    store.reset();
    let mut again = ArithmeticDecoder::new(Reader::new(data)).unwrap();
    for &(cx, bit) in &decisions {
        assert_eq!(again.decode_bit(&mut store, cx).unwrap(), bit);
    }
}

#[test]
fn test_independent_decoders_are_deterministic() {
    let mut first_store = ContextStore::new(512);
    let mut second_store = ContextStore::new(512);
    first_store.set(0, 30, 1).unwrap();
    first_store.reset();

    let mut first = ArithmeticDecoder::new(Reader::from_slice(&CONFORMANCE_DATA)).unwrap();
    let mut second = ArithmeticDecoder::new(Reader::from_slice(&CONFORMANCE_DATA)).unwrap();
    for i in 0..256 {
        let cx = (i * 31) % 512;
        assert_eq!(
            first.decode_bit(&mut first_store, cx).unwrap(),
            second.decode_bit(&mut second_store, cx).unwrap()
        );
    }
    assert_eq!(first_store, second_store);
    assert_eq!(
        (first.a(), first.c(), first.ct()),
        (second.a(), second.c(), second.ct())
    );
}

proptest! {
    #[test]
    fn test_arbitrary_decisions_decode(
        decisions in prop::collection::vec((0usize..8, 0u8..2), 1..2000),
    ) {
        let mut encoder = MqEncoder::new();
        let mut encoder_store = ContextStore::new(8);
        for &(cx, bit) in &decisions {
            encoder.encode(&mut encoder_store, cx, bit);
        }
        let data = encoder.finish();

        let mut decoder = ArithmeticDecoder::new(Reader::new(data)).unwrap();
        let mut store = ContextStore::new(8);
        for &(cx, bit) in &decisions {
            prop_assert_eq!(decoder.decode_bit(&mut store, cx).unwrap(), bit);
        }
        prop_assert_eq!(store, encoder_store);
    }
}
