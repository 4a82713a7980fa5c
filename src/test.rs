use crate::{
    gm, num::*, primitive::write_varlen, varlen_len, Document, Error, Event,
    FieldPolicy, Format, InvalidInput, Operation, Options, Track, TICKS_PER_QUARTER,
};
use std::fs;

/// Build a document with explicit options, independent of the enabled features.
macro_rules! doc {
    () => {
        doc!(FieldPolicy::Lenient)
    };
    ($policy:expr) => {
        Document::with_options(Options {
            policy: $policy,
            parallel: false,
        })
    };
}

/// Assert that the last recorded rejection of a document has the given reason.
macro_rules! assert_rejected {
    ($doc:expr, $reason:pat) => {{
        let last = $doc.rejections().last().expect("expected a rejection");
        assert!(
            matches!(last.reason, $reason),
            "unexpected rejection: {}",
            last
        );
    }};
}

/// Read a variable-length integer, advancing the slice.
fn read_varlen(raw: &mut &[u8]) -> u32 {
    let mut int: u32 = 0;
    loop {
        let byte = raw[0];
        *raw = &raw[1..];
        int <<= 7;
        int |= (byte & 0x7F) as u32;
        if byte & 0x80 == 0 {
            return int;
        }
    }
}

fn varlen(int: u32) -> Vec<u8> {
    let mut out = Vec::new();
    write_varlen(&mut out, u28::try_from(int).unwrap()).unwrap();
    out
}

/// Split a rendered file into its header data and the bodies of its track chunks.
fn split_chunks(mut raw: &[u8]) -> ([u8; 6], Vec<&[u8]>) {
    assert_eq!(&raw[0..8], b"MThd\0\0\0\x06");
    let mut header = [0; 6];
    header.copy_from_slice(&raw[8..14]);
    raw = &raw[14..];
    let mut tracks = Vec::new();
    while !raw.is_empty() {
        assert_eq!(&raw[0..4], b"MTrk");
        let len = u32::from_be_bytes([raw[4], raw[5], raw[6], raw[7]]) as usize;
        tracks.push(&raw[8..8 + len]);
        raw = &raw[8 + len..];
    }
    (header, tracks)
}

/// Decode the body of a track chunk into delta times and raw event bytes.
fn decode_track(mut raw: &[u8]) -> Vec<(u32, Vec<u8>)> {
    let mut events = Vec::new();
    while !raw.is_empty() {
        let delta = read_varlen(&mut raw);
        let len = match raw[0] >> 4 {
            0x8 | 0x9 => 3,
            0xC => 2,
            0xF => {
                let mut data = &raw[2..];
                let data_len = read_varlen(&mut data) as usize;
                raw.len() - data.len() + data_len
            }
            status => panic!("unexpected status nibble {:x}", status),
        };
        events.push((delta, raw[..len].to_vec()));
        raw = &raw[len..];
    }
    events
}

/// A tiny deterministic pseudo-random sequence.
fn lcg(seed: &mut u32) -> u32 {
    *seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
    *seed >> 8
}

/// Test the variable-length integer encoder.
mod varlen {
    use super::*;

    #[test]
    fn boundaries() {
        assert_eq!(varlen(0), [0x00]);
        assert_eq!(varlen(0x40), [0x40]);
        assert_eq!(varlen(0x7F), [0x7F]);
        assert_eq!(varlen(0x80), [0x81, 0x00]);
        assert_eq!(varlen(480), [0x83, 0x60]);
        assert_eq!(varlen(0x2000), [0xC0, 0x00]);
        assert_eq!(varlen(0x3FFF), [0xFF, 0x7F]);
        assert_eq!(varlen(0x4000), [0x81, 0x80, 0x00]);
        assert_eq!(varlen(0x1F_FFFF), [0xFF, 0xFF, 0x7F]);
        assert_eq!(varlen(0x20_0000), [0x81, 0x80, 0x80, 0x00]);
        assert_eq!(varlen(0x0FFF_FFFF), [0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn roundtrip() {
        let mut seed = 7;
        let samples = (0..28)
            .flat_map(|bit| {
                let int = 1u32 << bit;
                vec![int - 1, int, int + 1]
            })
            .chain((0..2000).map(|_| lcg(&mut seed) & 0x0FFF_FFFF))
            .filter(|&int| int <= 0x0FFF_FFFF);
        for int in samples {
            let bytes = varlen(int);
            let mut raw = &bytes[..];
            assert_eq!(read_varlen(&mut raw), int);
            assert!(raw.is_empty(), "trailing bytes encoding {}", int);
            assert_eq!(bytes.len() == 1, int < 0x80, "encoding {}", int);
            assert_eq!(bytes.len(), varlen_len(u28::new(int)));
            //Continuation bit on every byte but the last
            for &byte in &bytes[..bytes.len() - 1] {
                assert_ne!(byte & 0x80, 0);
            }
            assert_eq!(bytes[bytes.len() - 1] & 0x80, 0);
        }
    }

    #[test]
    fn restricted_ints_mask() {
        assert_eq!(u4::new(17), 1);
        assert_eq!(u7::new(200), 72);
        assert_eq!(u7::try_from(128), None);
        assert_eq!(u24::max_value(), 0xFF_FFFF);
        assert_eq!(u28::try_from(0x1000_0000), None);
    }
}

/// Test the encoding of single events.
mod event {
    use super::*;

    fn encode(ev: Event) -> Vec<u8> {
        let mut out = Vec::new();
        ev.write(&mut out).unwrap();
        assert_eq!(out.len(), ev.encoded_len());
        out
    }

    #[test]
    fn channel_events() {
        let (channel, key, vel) = (u4::new(3), u7::new(60), u7::new(100));
        assert_eq!(encode(Event::NoteOn { channel, key, vel }), [0x93, 60, 100]);
        assert_eq!(encode(Event::NoteOff { channel, key }), [0x83, 60, 0]);
        assert_eq!(
            encode(Event::ProgramChange {
                channel,
                program: u7::new(13)
            }),
            [0xC3, 13]
        );
    }

    #[test]
    fn meta_events() {
        assert_eq!(
            encode(Event::Tempo(u24::new(500_000))),
            [0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20]
        );
        assert_eq!(encode(Event::EndOfTrack), [0xFF, 0x2F, 0x00]);
        assert!(Event::EndOfTrack.is_meta());
        assert_eq!(Event::Tempo(u24::new(1)).channel(), None);
    }
}

/// Test event ordering and delta times within a single track.
mod track {
    use super::*;

    fn program(program: u8) -> Event {
        Event::ProgramChange {
            channel: u4::new(0),
            program: u7::new(program),
        }
    }

    #[test]
    fn stable_ordering() {
        let (a, b, c) = (program(1), program(2), program(3));
        let mut track = Track::new();
        track.push(5, a);
        track.push(5, b);
        track.push(3, c);
        let ordered = track.iter_ordered().collect::<Vec<_>>();
        assert_eq!(ordered, [(3, c), (5, a), (5, b)]);

        let rendered = track.render().unwrap();
        let events = decode_track(&rendered[8..]);
        assert_eq!(
            events,
            [
                (3, vec![0xC0, 3]),
                (2, vec![0xC0, 1]),
                (0, vec![0xC0, 2]),
                (0, vec![0xFF, 0x2F, 0x00]),
            ]
        );
    }

    #[test]
    fn render_keeps_append_order() {
        let mut track = Track::new();
        track.push(10, program(1));
        track.push(0, program(2));
        let before = track.iter().collect::<Vec<_>>();
        let first = track.render().unwrap();
        let second = track.render().unwrap();
        assert_eq!(first, second);
        assert_eq!(track.iter().collect::<Vec<_>>(), before);
    }

    #[test]
    fn deltas_follow_ticks() {
        let mut seed = 42;
        let mut track = Track::new();
        let mut ticks = Vec::new();
        for i in 0..500 {
            let tick = lcg(&mut seed) % 10_000;
            ticks.push(tick);
            track.push(tick, program((i % 128) as u8));
        }
        ticks.sort();

        let rendered = track.render().unwrap();
        let events = decode_track(&rendered[8..]);
        assert_eq!(events.len(), ticks.len() + 1);
        let mut now = 0;
        for ((delta, _), &tick) in events.iter().zip(ticks.iter()) {
            now += delta;
            assert_eq!(now, tick);
        }
        assert_eq!(
            track.iter_deltas().map(|(delta, _)| delta).sum::<u32>(),
            track.end_tick()
        );
    }

    #[test]
    fn end_of_track_once() {
        let track = Track::new();
        assert_eq!(track.render().unwrap(), b"MTrk\0\0\0\x04\x00\xFF\x2F\x00");
        assert_eq!(track.encoded_len().unwrap(), 4);
        assert!(track.is_empty());
    }

    #[test]
    fn encoded_len_matches_chunk() {
        let mut track = Track::new();
        track.push(0, Event::Tempo(u24::new(500_000)));
        track.push(480, program(4));
        track.push(100_000, program(5));
        let rendered = track.render().unwrap();
        assert_eq!(track.encoded_len().unwrap() as usize, rendered.len() - 8);
    }

    #[test]
    fn oversized_delta() {
        let mut track = Track::new();
        track.push(0x1000_0000, program(0));
        let err = track.render().unwrap_err();
        assert!(!err.is_storage());
        assert_eq!(err.message(), Some("delta time exceeds 28 bits"));
        assert!(track.encoded_len().is_err());
    }
}

/// Test the document operations and the rendered files.
mod document {
    use super::*;

    #[test]
    fn tempo_and_note() {
        let mut doc = doc!();
        doc.add_tempo(0, 0, 120.0);
        doc.add_note(0, 0, 0, 480, 60, 120);
        let file = doc.render().unwrap();
        let expected: &[u8] = &[
            b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 0, 0, 1, 0x01, 0xE0, //header
            b'M', b'T', b'r', b'k', 0, 0, 0, 20, //track header
            0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, //tempo
            0x00, 0x90, 0x3C, 0x78, //note on
            0x83, 0x60, 0x80, 0x3C, 0x00, //note off
            0x00, 0xFF, 0x2F, 0x00, //end of track
        ];
        assert_eq!(file, expected);
        assert!(doc.rejections().is_empty());
    }

    #[test]
    fn header_format() {
        let mut doc = doc!();
        doc.add_track();
        let file = doc.render().unwrap();
        let (header, tracks) = split_chunks(&file);
        assert_eq!(header, [0, 0, 0, 1, 0x01, 0xE0]);
        assert_eq!(tracks.len(), 1);
        assert_eq!(doc.header().format, Format::SingleTrack);

        doc.add_track();
        let file = doc.render().unwrap();
        let (header, tracks) = split_chunks(&file);
        assert_eq!(header, [0, 1, 0, 2, 0x01, 0xE0]);
        assert_eq!(tracks.len(), 2);
        assert_eq!(doc.header().format, Format::Parallel);
        assert_eq!(doc.header().ticks_per_quarter, TICKS_PER_QUARTER);
    }

    #[test]
    fn empty_document() {
        let doc = doc!();
        let file = doc.render().unwrap();
        assert_eq!(file, b"MThd\0\0\0\x06\0\x01\0\0\x01\xE0");
    }

    #[test]
    fn auto_extension() {
        let mut doc = doc!();
        doc.set_channel_program(0, 5);
        doc.add_note(3, 0, 0, 480, 60, 100);
        assert_eq!(doc.track_count(), 4);
        assert_eq!(doc.track(0).unwrap().len(), 1);
        assert!(doc.track(1).unwrap().is_empty());
        assert!(doc.track(2).unwrap().is_empty());
        assert_eq!(doc.track(3).unwrap().len(), 2);
        assert_eq!(doc.add_track(), 4);
    }

    #[test]
    fn zero_duration_is_skipped() {
        let mut doc = doc!();
        doc.add_note(0, 0, 0, 480, 60, 100);
        doc.add_note(0, 0, 480, 0, 62, 100);
        assert_eq!(doc.track(0).unwrap().len(), 2);
        assert_eq!(doc.rejections().len(), 1);
        assert_rejected!(doc, InvalidInput::ZeroDuration);
        match doc.rejections()[0].operation {
            Operation::AddNote { start, key, .. } => assert_eq!((start, key), (480, 62)),
            op => panic!("unexpected operation {}", op),
        }
        //The rest of the document is still rendered
        let file = doc.render().unwrap();
        let (_, tracks) = split_chunks(&file);
        assert_eq!(decode_track(tracks[0]).len(), 3);
    }

    #[test]
    fn invalid_note_input() {
        let mut doc = doc!();
        doc.add_note(0, 0, 0, 480, 60, 128);
        assert_rejected!(doc, InvalidInput::VelocityOutOfRange(128));
        doc.add_note(0, 0, u32::max_value() - 10, 480, 60, 100);
        assert_rejected!(doc, InvalidInput::TickOverflow { .. });
        doc.add_note(70_000, 0, 0, 480, 60, 100);
        assert_rejected!(doc, InvalidInput::TrackOutOfRange(70_000));
        assert_eq!(doc.track_count(), 0);
        assert_eq!(doc.take_rejections().len(), 3);
        assert!(doc.rejections().is_empty());
    }

    #[test]
    fn invalid_tempo_input() {
        let mut doc = doc!();
        doc.add_tempo(0, 0, 0.0);
        assert_rejected!(doc, InvalidInput::InvalidBpm(_));
        doc.add_tempo(0, 0, -120.0);
        assert_rejected!(doc, InvalidInput::InvalidBpm(_));
        doc.add_tempo(0, 0, std::f64::NAN);
        assert_rejected!(doc, InvalidInput::InvalidBpm(_));
        //60_000_000 / 3 does not fit in 24 bits
        doc.add_tempo(0, 0, 3.0);
        assert_rejected!(doc, InvalidInput::TempoOutOfRange(_));
        assert_eq!(doc.track_count(), 0);
        assert_eq!(doc.rejections().len(), 4);
    }

    #[test]
    fn tempo_conversion_truncates() {
        let mut doc = doc!();
        doc.add_tempo(0, 0, 120.0);
        doc.add_tempo(0, 480, 7.0);
        doc.add_tempo(0, 960, 180.0);
        let tempos = doc
            .track(0)
            .unwrap()
            .iter()
            .map(|(tick, ev)| match ev {
                Event::Tempo(micros) => (tick, micros.as_int()),
                ev => panic!("unexpected event {:?}", ev),
            })
            .collect::<Vec<_>>();
        assert_eq!(tempos, [(0, 500_000), (480, 8_571_428), (960, 333_333)]);
    }

    #[test]
    fn program_change_goes_to_track_zero() {
        let mut doc = doc!();
        doc.add_note(1, 1, 0, 480, 60, 100);
        doc.set_channel_program(1, 40);
        assert_eq!(doc.program_for(1), Some(40));
        assert_eq!(doc.program_for(2), None);
        assert_eq!(
            doc.track(0).unwrap().iter().collect::<Vec<_>>(),
            [(
                0,
                Event::ProgramChange {
                    channel: u4::new(1),
                    program: u7::new(40)
                }
            )]
        );
        assert_eq!(doc.track(1).unwrap().len(), 2);
    }

    #[test]
    fn program_change_before_note_at_same_tick() {
        let mut doc = doc!();
        doc.set_channel_program(0, 13);
        doc.add_note(0, 0, 0, 240, 60, 100);
        let file = doc.render().unwrap();
        let (_, tracks) = split_chunks(&file);
        let events = decode_track(tracks[0]);
        assert_eq!(events[0], (0, vec![0xC0, 13]));
        assert_eq!(events[1], (0, vec![0x90, 60, 100]));
    }

    #[test]
    fn legato_notes_keep_insertion_order() {
        let mut doc = doc!();
        doc.add_note(0, 0, 0, 480, 60, 100);
        doc.add_note(0, 0, 480, 480, 60, 100);
        let file = doc.render().unwrap();
        let (_, tracks) = split_chunks(&file);
        let events = decode_track(tracks[0]);
        //The first note ends before the second one starts, even though they share a tick
        assert_eq!(events[1], (480, vec![0x80, 60, 0]));
        assert_eq!(events[2], (0, vec![0x90, 60, 100]));
    }

    #[test]
    fn lenient_policy_masks() {
        let mut doc = doc!(FieldPolicy::Lenient);
        doc.add_note(0, 17, 0, 480, 200, 100);
        doc.set_channel_program(18, 130);
        assert!(doc.rejections().is_empty());
        let file = doc.render().unwrap();
        let (_, tracks) = split_chunks(&file);
        let events = decode_track(tracks[0]);
        assert_eq!(events[0], (0, vec![0x91, 72, 100]));
        assert_eq!(events[1], (0, vec![0xC2, 2]));
        assert_eq!(events[2], (480, vec![0x81, 72, 0]));
        assert_eq!(doc.program_for(2), Some(2));
    }

    #[test]
    fn strict_policy_rejects() {
        let mut doc = doc!(FieldPolicy::Strict);
        doc.add_note(0, 16, 0, 480, 60, 100);
        assert_rejected!(doc, InvalidInput::ChannelOutOfRange(16));
        doc.add_note(0, 0, 0, 480, 128, 100);
        assert_rejected!(doc, InvalidInput::KeyOutOfRange(128));
        doc.set_channel_program(0, 128);
        assert_rejected!(doc, InvalidInput::ProgramOutOfRange(128));
        doc.add_note(0, 15, 0, 480, 127, 127);
        assert_eq!(doc.rejections().len(), 3);
        assert_eq!(doc.track(0).unwrap().len(), 2);
    }

    #[test]
    fn rejection_message() {
        let mut doc = doc!();
        doc.add_note(2, 0, 0, 0, 60, 100);
        assert_eq!(
            doc.rejections()[0].to_string(),
            "could not add note (track=2, channel=0, start=0, duration=0, key=60, velocity=100): \
             duration must be greater than zero"
        );
    }

    #[test]
    fn idempotent_render() {
        let mut doc = doc!();
        doc.add_tempo(0, 0, 90.0);
        for i in 0..16 {
            doc.add_note(i % 3, 0, (15 - i as u32) * 120, 240, 60 + i as u8, 90);
        }
        let first = doc.render().unwrap();
        let second = doc.render().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn parallel_matches_serial() {
        let build = |parallel| {
            let mut doc = Document::with_options(Options {
                policy: FieldPolicy::Lenient,
                parallel,
            });
            let mut seed = 1;
            doc.add_tempo(0, 0, 125.0);
            for track in 0..8 {
                for _ in 0..300 {
                    let start = lcg(&mut seed) % 50_000;
                    let key = (lcg(&mut seed) % 128) as u8;
                    doc.add_note(track, track as u8, start, 120, key, 100);
                }
            }
            doc.render().unwrap()
        };
        assert_eq!(build(true), build(false));
    }

    #[test]
    fn far_ticks_are_skipped() {
        let mut doc = doc!();
        doc.add_tempo(0, 0, 120.0);
        doc.add_note(0, 0, 0, 480, 60, 100);
        doc.add_note(1, 0, 0x1000_0000, 480, 64, 100);
        assert_rejected!(doc, InvalidInput::TickOutOfRange(0x1000_0000));
        doc.add_note(1, 0, 0, 0x1000_0000, 64, 100);
        assert_rejected!(doc, InvalidInput::TickOutOfRange(0x1000_0000));
        doc.add_tempo(0, 0x1000_0000, 90.0);
        assert_rejected!(doc, InvalidInput::TickOutOfRange(0x1000_0000));
        assert_eq!(doc.rejections().len(), 3);
        assert_eq!(doc.track_count(), 1);

        //The last tick of the range is still accepted and renders
        doc.add_note(0, 0, 0x0FFF_FF00, 0xFF, 62, 100);
        assert_eq!(doc.rejections().len(), 3);
        let file = doc.render().unwrap();
        let (header, tracks) = split_chunks(&file);
        assert_eq!(header[..4], [0, 0, 0, 1]);
        let events = decode_track(tracks[0]);
        assert_eq!(events.len(), 6);
        assert_eq!(events[3], (0x0FFF_FF00 - 480, vec![0x90, 62, 100]));
        assert_eq!(events[4], (0xFF, vec![0x80, 62, 0]));
    }
}

/// Test writing rendered documents out.
mod storage {
    use super::*;

    fn scale() -> Document {
        let mut doc = doc!();
        doc.add_tempo(0, 0, 120.0);
        doc.set_channel_program(0, 0);
        for (beat, &key) in [60, 62, 64, 65, 67, 69, 71, 72].iter().enumerate() {
            doc.add_note(0, 0, beat as u32 * 480, 480, key, 120);
        }
        doc
    }

    #[test]
    fn save_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scale.mid");
        let doc = scale();
        doc.save(&path).unwrap();
        assert_eq!(fs::read(&path).unwrap(), doc.render().unwrap());
    }

    #[test]
    fn write_into_vec() {
        let doc = scale();
        let mut out = Vec::new();
        doc.write(&mut out).unwrap();
        assert_eq!(out, doc.render().unwrap());
    }

    #[test]
    fn save_into_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("scale.mid");
        let err = scale().save(&path).unwrap_err();
        assert!(err.is_storage());
        assert!(!path.exists());
    }
}

/// Test the General MIDI name tables.
mod names {
    use super::*;

    #[test]
    fn programs() {
        assert_eq!(gm::program("acoustic_grand_piano"), Some(0));
        assert_eq!(gm::program("rock_organ"), Some(18));
        assert_eq!(gm::program("xylophone"), Some(13));
        assert_eq!(gm::program("gunshot"), Some(127));
        assert_eq!(gm::program("kazoo"), None);
        assert_eq!(gm::program_name(40), Some("violin"));
        assert_eq!(gm::program_name(128), None);
    }

    #[test]
    fn drums() {
        assert_eq!(gm::drum("laser"), Some(27));
        assert_eq!(gm::drum("kick_drum"), Some(35));
        assert_eq!(gm::drum("cowbell"), Some(56));
        assert_eq!(gm::drum("snare_drum_brush"), Some(89));
        assert_eq!(gm::drum_name(42), Some("cymbal_hi_hat_closed"));
        assert_eq!(gm::drum_name(26), None);
        assert_eq!(gm::drum_name(90), None);
        assert_eq!(gm::DRUM_CHANNEL, 9);
    }
}
