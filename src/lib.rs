//! # Overview
//!
//! `smfwrite` composes notes, tempo changes and program changes into byte-exact Standard Midi
//! Files (`.mid` files).
//!
//! Usage is as simple as:
//!
//! ```rust
//! use smfwrite::Document;
//!
//! let mut doc = Document::new();
//! doc.add_tempo(0, 0, 120.0);
//! doc.set_channel_program(0, 0);
//! for (beat, &key) in [60, 62, 64, 65, 67, 69, 71, 72].iter().enumerate() {
//!     doc.add_note(0, 0, beat as u32 * 480, 480, key, 120);
//! }
//!
//! let bytes = doc.render().unwrap();
//! assert_eq!(&bytes[..4], b"MThd");
//! ```
//!
//! The [`Document`](struct.Document.html) struct is the main type in the crate.
//! All times are absolute MIDI ticks, at a fixed resolution of
//! [`TICKS_PER_QUARTER`](constant.TICKS_PER_QUARTER.html) ticks per quarter note:
//!
//! - 480 ticks = quarter note
//! - 240 ticks = eighth note
//! - 120 ticks = sixteenth note
//!
//! # Writing files
//!
//! Rendering happens fully in memory. The rendered file can then be saved to disk:
//!
//! ```rust,no_run
//! # use smfwrite::Document;
//! # let doc = Document::new();
//! doc.save("scale.mid").unwrap();
//! ```
//!
//! Or written into any `std::io::Write` writer:
//!
//! ```rust
//! # use smfwrite::Document;
//! # let mut doc = Document::new();
//! # doc.add_note(0, 0, 0, 480, 60, 100);
//! let mut in_memory = Vec::new();
//! doc.write(&mut in_memory).unwrap();
//!
//! println!("midi file fits in {} bytes!", in_memory.len());
//! ```
//!
//! # Invalid input
//!
//! Composing never aborts halfway. Calls with nonsensical timing or velocity (a zero duration, a
//! tick beyond 28 bits, a velocity above 127, a non-positive BPM, ...) are skipped: the document
//! is left untouched, a warning is emitted through the [`log`](https://docs.rs/log) facade, and a
//! [`Rejection`](struct.Rejection.html) describing the call is recorded.
//! Rejections can be inspected later through
//! [`Document::rejections`](struct.Document.html#method.rejections).
//!
//! Only two things can make rendering or saving fail, both reported as an
//! [`Error`](enum.Error.html): a document that cannot be represented as a MIDI file at all (such
//! as one with more than 65535 tracks), and failing storage.
//!
//! # About features
//!
//! - The `parallel` feature (enabled by default)
//!
//!   Tracks are independent from each other, so large documents are rendered using multiple
//!   threads through the `rayon` dependency. The output is identical to serial rendering.
//!
//! - The `strict` feature
//!
//!   By default out-of-range channels, keys and programs are masked down to their bit width
//!   (channel 17 becomes channel 1, key 200 becomes key 72).
//!   By enabling the `strict` feature such calls are rejected instead.
//!   This only chooses the default [`FieldPolicy`](enum.FieldPolicy.html); it can always be
//!   picked at runtime through [`Options`](struct.Options.html).

macro_rules! bail {
    ($err:expr) => {{
        return Err($err.into());
    }};
}
macro_rules! ensure {
    ($cond:expr, $err:expr) => {{
        if !$cond {
            bail!($err)
        }
    }};
}

/// All of the errors this crate produces.
#[macro_use]
mod error;

mod prelude {
    pub(crate) use crate::{
        error::{Error, Result},
        event::Event,
        io::{Write, WriteCounter, WriteResult},
        primitive::{u15, u24, u28, u4, u7, write_varlen},
        track::Track,
        validate::{FieldPolicy, InvalidInput, Operation, Rejection},
    };
    pub(crate) use core::{convert::TryFrom, fmt, result::Result as StdResult};
    pub(crate) use std::{collections::BTreeMap, fs::File, io, path::Path};
}

mod document;
mod event;
pub mod gm;
pub mod io;
mod primitive;
mod track;
mod validate;

pub use crate::{
    document::{Document, Format, Header, Options, TICKS_PER_QUARTER},
    error::{Error, Result},
    event::Event,
    primitive::varlen_len,
    track::Track,
    validate::{
        check_note, check_program, check_tempo, check_tick, check_track, FieldPolicy, InvalidInput,
        Operation, Rejection,
    },
};

/// Exotically-sized integers used by the MIDI standard.
pub mod num {
    pub use crate::primitive::{u15, u24, u28, u4, u7};
}

#[cfg(test)]
mod test;
