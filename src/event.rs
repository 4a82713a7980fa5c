//! The events a track can hold and their raw encoding.

use crate::prelude::*;

/// A single event stored in a [`Track`](struct.Track.html).
///
/// Events do not carry their timing: tracks store every event alongside its absolute tick, and
/// delta times are only computed when the track is rendered.
///
/// Channel events always write their own status byte (running status is never used), so each
/// event contributes exactly the bytes documented on its variant.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Event {
    /// Start playing a key.
    ///
    /// Encoded as `0x90 | channel`, `key`, `vel`.
    NoteOn { channel: u4, key: u7, vel: u7 },
    /// Stop playing a key.
    ///
    /// Encoded as `0x80 | channel`, `key`, `0x00`.
    NoteOff { channel: u4, key: u7 },
    /// Change the program (also known as instrument) of a channel.
    ///
    /// Encoded as `0xC0 | channel`, `program`.
    ProgramChange { channel: u4, program: u7 },
    /// Change the tempo, in microseconds per quarter note.
    ///
    /// Encoded as the meta event `FF 51 03` followed by the 24-bit big-endian tempo.
    Tempo(u24),
    /// Marks the end of a track.
    ///
    /// Encoded as the meta event `FF 2F 00`.
    /// Exactly one of these is written at the end of every track when rendering.
    EndOfTrack,
}
impl Event {
    /// The channel this event is addressed to, if it is a channel event.
    #[inline]
    pub fn channel(&self) -> Option<u4> {
        match *self {
            Event::NoteOn { channel, .. }
            | Event::NoteOff { channel, .. }
            | Event::ProgramChange { channel, .. } => Some(channel),
            Event::Tempo(_) | Event::EndOfTrack => None,
        }
    }

    /// Whether this event is a meta event (tempo or end of track) rather than a channel event.
    #[inline]
    pub fn is_meta(&self) -> bool {
        self.channel().is_none()
    }

    /// The amount of bytes this event takes up in a track, not including its delta time.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        match self {
            Event::NoteOn { .. } | Event::NoteOff { .. } => 3,
            Event::ProgramChange { .. } => 2,
            Event::Tempo(_) => 6,
            Event::EndOfTrack => 3,
        }
    }

    /// Write the raw bytes of this event, without any delta time.
    ///
    /// Event bytes can be written into a `Vec<u8>`:
    ///
    /// ```rust
    /// use smfwrite::{num::u24, Event};
    ///
    /// let mut bytes: Vec<u8> = Vec::new();
    /// Event::Tempo(u24::new(500_000)).write(&mut bytes).unwrap();
    /// assert_eq!(bytes, [0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20]);
    /// ```
    pub fn write<W: Write>(&self, out: &mut W) -> WriteResult<W> {
        match *self {
            Event::NoteOn { channel, key, vel } => {
                out.write(&[0x90 | channel.as_int(), key.as_int(), vel.as_int()])
            }
            Event::NoteOff { channel, key } => out.write(&[0x80 | channel.as_int(), key.as_int(), 0]),
            Event::ProgramChange { channel, program } => {
                out.write(&[0xC0 | channel.as_int(), program.as_int()])
            }
            Event::Tempo(micros_per_beat) => {
                write_meta(out, 0x51, &micros_per_beat.as_int().to_be_bytes()[1..])
            }
            Event::EndOfTrack => write_meta(out, 0x2F, &[]),
        }
    }
}

/// Write a meta event: the `0xFF` prefix, its type byte and its length-prefixed data.
fn write_meta<W: Write>(out: &mut W, type_byte: u8, data: &[u8]) -> WriteResult<W> {
    // Payloads are at most 3 bytes long, so the length is always a single varlen byte
    out.write(&[0xFF, type_byte, data.len() as u8])?;
    out.write(data)
}
