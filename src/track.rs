//! A single track: an append-only list of events stamped with absolute ticks.

use crate::prelude::*;

/// A rough estimate of how many encoded bytes a single event takes up, delta time included.
///
/// Used to preallocate buffers and to decide whether rendering in parallel is worth it.
pub(crate) const EVENTS_TO_BYTES: f32 = 4.2;

/// One track of a document, usually holding the notes of a single instrument or staff.
///
/// Events are stored in the order they were added, alongside the absolute tick at which they
/// fire. The stored order is never modified: rendering computes a stably sorted view of the
/// events, so events sharing a tick are always rendered in the order they were added.
/// This is what keeps a note-off and a note-on at the same tick, or a program change and a
/// note-on at tick 0, in a reproducible order.
///
/// Tracks are built through the [`Document`](struct.Document.html) operations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Track {
    events: Vec<(u32, Event)>,
}
impl Track {
    /// Create a new empty track.
    #[inline]
    pub fn new() -> Track {
        Track::default()
    }

    #[inline]
    pub(crate) fn push(&mut self, tick: u32, event: Event) {
        self.events.push((tick, event));
    }

    /// The amount of events stored in this track.
    ///
    /// The end-of-track marker added when rendering is not counted.
    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterate over the events in the order they were added, along with their absolute ticks.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (u32, Event)> + '_ {
        self.events.iter().copied()
    }

    /// Iterate over the events in the order they will be rendered, along with their absolute
    /// ticks.
    pub fn iter_ordered(&self) -> impl Iterator<Item = (u32, Event)> + '_ {
        self.render_order()
            .into_iter()
            .map(move |idx| self.events[idx])
    }

    /// Iterate over the events in the order they will be rendered, along with the delta time
    /// since the previous event.
    ///
    /// The first delta is relative to tick 0.
    pub fn iter_deltas(&self) -> impl Iterator<Item = (u32, Event)> + '_ {
        let mut prev_tick = 0;
        self.iter_ordered().map(move |(tick, ev)| {
            // Cannot underflow, ticks are visited in ascending order
            let delta = tick - prev_tick;
            prev_tick = tick;
            (delta, ev)
        })
    }

    /// The tick of the last event of this track, or `0` if it is empty.
    #[inline]
    pub fn end_tick(&self) -> u32 {
        self.events.iter().map(|&(tick, _)| tick).max().unwrap_or(0)
    }

    /// Indices into `events`, stably sorted by tick.
    fn render_order(&self) -> Vec<usize> {
        let mut order = (0..self.events.len()).collect::<Vec<_>>();
        order.sort_by_key(|&idx| self.events[idx].0);
        order
    }

    /// Render this track into a complete `MTrk` chunk.
    ///
    /// Rendering does not modify the track, so rendering twice produces identical bytes.
    pub fn render(&self) -> Result<Vec<u8>> {
        let mut chunk = Vec::new();
        self.write_to_vec(&mut chunk).map_err(Error::Encoding)?;
        Ok(chunk)
    }

    /// The length of the body of the `MTrk` chunk of this track, end-of-track marker included.
    pub fn encoded_len(&self) -> Result<u32> {
        let mut counter = WriteCounter(0);
        self.write_raw(&mut counter).map_err(Error::Encoding)?;
        check_len::<WriteCounter, _>(counter.0).map_err(Error::Encoding)
    }

    /// Write this track as a chunk into an in-memory `Vec`.
    ///
    /// Because the output is in-memory, the chunk can simply wind back and write the chunk length
    /// last.
    pub(crate) fn write_to_vec(&self, out: &mut Vec<u8>) -> WriteResult<Vec<u8>> {
        let cap = (self.events.len() as f32 * EVENTS_TO_BYTES) as usize;
        out.clear();
        out.reserve(8 + cap + 4);
        out.extend_from_slice(b"MTrk\0\0\0\0");
        self.write_raw(out)?;
        let len = check_len::<Vec<u8>, _>(out.len() - 8)?;
        out[4..8].copy_from_slice(&len.to_be_bytes());
        Ok(())
    }

    /// Write the body of the chunk: every event preceded by its delta time, followed by the
    /// end-of-track marker.
    fn write_raw<W: Write>(&self, out: &mut W) -> WriteResult<W> {
        for (delta, ev) in self.iter_deltas() {
            let delta =
                u28::try_from(delta).ok_or_else(|| W::invalid_input("delta time exceeds 28 bits"))?;
            write_varlen(out, delta)?;
            ev.write(out)?;
        }
        write_varlen(out, u28::new(0))?;
        Event::EndOfTrack.write(out)?;
        Ok(())
    }
}

/// Given an arbitrary-width length, fit it into a 32-bit integer, reporting an error if it does
/// not fit.
fn check_len<W, T>(len: T) -> StdResult<u32, W::Error>
where
    u32: TryFrom<T>,
    W: Write,
{
    u32::try_from(len).map_err(|_| W::invalid_input("midi chunk size exceeds 32 bit range"))
}
