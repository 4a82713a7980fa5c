//! Input checks run before a document operation is allowed to touch a track.
//!
//! Every check is a pure function: it either accepts the input (returning the derived values the
//! operation needs) or returns the reason it was rejected. Track indices, channels and ticks are
//! unsigned, so they can never be negative to begin with.

use crate::prelude::*;
use thiserror::Error;

/// What to do with channels, keys and programs that do not fit in their bit width.
///
/// Timing and velocity are always checked. Channels (4 bits), keys and programs (7 bits) are
/// governed by this policy.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum FieldPolicy {
    /// Mask out-of-range values down to their bit width, so channel 17 becomes channel 1 and key
    /// 200 becomes key 72.
    Lenient,
    /// Reject calls with out-of-range values, as with any other invalid input.
    Strict,
}
impl FieldPolicy {
    /// The policy picked by the crate features: `Strict` if the `strict` feature is enabled,
    /// `Lenient` otherwise.
    #[inline]
    pub const fn from_features() -> FieldPolicy {
        if cfg!(feature = "strict") {
            FieldPolicy::Strict
        } else {
            FieldPolicy::Lenient
        }
    }
}
impl Default for FieldPolicy {
    #[inline]
    fn default() -> FieldPolicy {
        FieldPolicy::from_features()
    }
}

/// Why a document operation was rejected.
#[derive(Copy, Clone, PartialEq, Debug, Error)]
pub enum InvalidInput {
    #[error("track index {0} is beyond the 16-bit track count of a midi file")]
    TrackOutOfRange(usize),
    #[error("duration must be greater than zero")]
    ZeroDuration,
    #[error("note starting at tick {start} with duration {duration} ends beyond the tick range")]
    TickOverflow { start: u32, duration: u32 },
    #[error("tick {0} does not fit in a 28-bit delta time")]
    TickOutOfRange(u32),
    #[error("velocity {0} must be in range [0, 127]")]
    VelocityOutOfRange(u8),
    #[error("bpm {0} must be a finite number greater than zero")]
    InvalidBpm(f64),
    #[error("bpm {0} results in a tempo that does not fit in 24 bits")]
    TempoOutOfRange(f64),
    #[error("channel {0} must be in range [0, 15]")]
    ChannelOutOfRange(u8),
    #[error("key {0} must be in range [0, 127]")]
    KeyOutOfRange(u8),
    #[error("program {0} must be in range [0, 127]")]
    ProgramOutOfRange(u8),
}

/// A document operation, along with the arguments it was called with.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Operation {
    AddNote {
        track: usize,
        channel: u8,
        start: u32,
        duration: u32,
        key: u8,
        velocity: u8,
    },
    AddTempo {
        track: usize,
        start: u32,
        bpm: f64,
    },
    SetChannelProgram {
        channel: u8,
        program: u8,
    },
}
impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Operation::AddNote {
                track,
                channel,
                start,
                duration,
                key,
                velocity,
            } => write!(
                f,
                "add note (track={}, channel={}, start={}, duration={}, key={}, velocity={})",
                track, channel, start, duration, key, velocity
            ),
            Operation::AddTempo { track, start, bpm } => {
                write!(f, "add tempo (track={}, start={}, bpm={})", track, start, bpm)
            }
            Operation::SetChannelProgram { channel, program } => write!(
                f,
                "set channel program (channel={}, program={})",
                channel, program
            ),
        }
    }
}

/// A document operation that was skipped because of invalid input.
#[derive(Copy, Clone, PartialEq, Debug, Error)]
#[error("could not {operation}: {reason}")]
pub struct Rejection {
    /// The skipped call.
    pub operation: Operation,
    /// Why it was skipped.
    pub reason: InvalidInput,
}

/// Check that a track index can be part of a MIDI file.
#[inline]
pub fn check_track(track: usize) -> StdResult<(), InvalidInput> {
    ensure!(
        track < u16::max_value() as usize,
        InvalidInput::TrackOutOfRange(track)
    );
    Ok(())
}

/// Check that an absolute tick fits in 28 bits.
///
/// Every delta time of a track is bounded by the largest tick in it, so a track made of checked
/// ticks always renders.
#[inline]
pub fn check_tick(tick: u32) -> StdResult<(), InvalidInput> {
    ensure!(
        tick <= u28::max_value().as_int(),
        InvalidInput::TickOutOfRange(tick)
    );
    Ok(())
}

fn check_channel(channel: u8, policy: FieldPolicy) -> StdResult<u4, InvalidInput> {
    match policy {
        FieldPolicy::Lenient => Ok(u4::new(channel)),
        FieldPolicy::Strict => u4::try_from(channel).ok_or(InvalidInput::ChannelOutOfRange(channel)),
    }
}

fn check_u7(
    raw: u8,
    policy: FieldPolicy,
    err: fn(u8) -> InvalidInput,
) -> StdResult<u7, InvalidInput> {
    match policy {
        FieldPolicy::Lenient => Ok(u7::new(raw)),
        FieldPolicy::Strict => u7::try_from(raw).ok_or_else(|| err(raw)),
    }
}

/// Check the arguments of a note, returning the events that start and end it along with the
/// tick at which the note ends.
pub fn check_note(
    channel: u8,
    start: u32,
    duration: u32,
    key: u8,
    velocity: u8,
    policy: FieldPolicy,
) -> StdResult<(Event, Event, u32), InvalidInput> {
    ensure!(duration > 0, InvalidInput::ZeroDuration);
    let vel = u7::try_from(velocity).ok_or(InvalidInput::VelocityOutOfRange(velocity))?;
    let end = start
        .checked_add(duration)
        .ok_or(InvalidInput::TickOverflow { start, duration })?;
    check_tick(end)?;
    let channel = check_channel(channel, policy)?;
    let key = check_u7(key, policy, InvalidInput::KeyOutOfRange)?;
    Ok((
        Event::NoteOn { channel, key, vel },
        Event::NoteOff { channel, key },
        end,
    ))
}

/// Check a tempo given in beats per minute, converting it to microseconds per quarter note.
///
/// The conversion truncates towards zero: `60_000_000 / bpm`.
pub fn check_tempo(bpm: f64) -> StdResult<u24, InvalidInput> {
    ensure!(bpm.is_finite() && bpm > 0.0, InvalidInput::InvalidBpm(bpm));
    let micros = (60_000_000.0 / bpm).trunc();
    ensure!(
        micros >= 1.0 && micros <= u24::max_value().as_int() as f64,
        InvalidInput::TempoOutOfRange(bpm)
    );
    Ok(u24::new(micros as u32))
}

/// Check the arguments of a program change.
pub fn check_program(
    channel: u8,
    program: u8,
    policy: FieldPolicy,
) -> StdResult<(u4, u7), InvalidInput> {
    let channel = check_channel(channel, policy)?;
    let program = check_u7(program, policy, InvalidInput::ProgramOutOfRange)?;
    Ok((channel, program))
}
