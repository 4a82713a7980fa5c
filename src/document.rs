//! Specific to the SMF packaging of tracks: the document, its header and the rendering pass.

use crate::{
    prelude::*,
    track::EVENTS_TO_BYTES,
    validate::{check_note, check_program, check_tempo, check_tick, check_track},
};
use log::{debug, warn};

/// The resolution of every document, in ticks per quarter note.
pub const TICKS_PER_QUARTER: u16 = 480;

/// How many bytes must a document body have in order to enable multithreading.
///
/// The body size is estimated from the event count using `EVENTS_TO_BYTES`.
#[cfg(feature = "parallel")]
const PARALLEL_ENABLE_THRESHOLD: usize = 3 * 1024;

/// The order in which tracks should be laid out when playing back a file.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Format {
    /// The file has a single track only.
    SingleTrack,
    /// The file has several tracks that should be played simultaneously.
    ///
    /// Usually the first track holds the tempo changes and program changes.
    Parallel,
}
impl Format {
    /// The format a file with the given amount of tracks is written with.
    ///
    /// Only a file with exactly one track is written as `SingleTrack`.
    #[inline]
    pub fn for_track_count(track_count: usize) -> Format {
        if track_count == 1 {
            Format::SingleTrack
        } else {
            Format::Parallel
        }
    }

    /// The value of the format field in the header chunk.
    #[inline]
    pub fn as_bits(self) -> u16 {
        match self {
            Format::SingleTrack => 0,
            Format::Parallel => 1,
        }
    }
}

/// A MIDI file header, as written into the `MThd` chunk.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct Header {
    /// How should the tracks be laid out when playing them back.
    pub format: Format,
    /// The amount of ticks in a quarter note.
    pub ticks_per_quarter: u15,
}
impl Header {
    /// Create a new header from its raw parts.
    #[inline]
    pub fn new(format: Format, ticks_per_quarter: u15) -> Header {
        Header {
            format,
            ticks_per_quarter,
        }
    }

    #[inline]
    fn encode(&self, track_count: u16) -> [u8; 6] {
        let mut bytes = [0; 6];
        bytes[0..2].copy_from_slice(&self.format.as_bits().to_be_bytes()[..]);
        bytes[2..4].copy_from_slice(&track_count.to_be_bytes()[..]);
        bytes[4..6].copy_from_slice(&self.ticks_per_quarter.as_int().to_be_bytes()[..]);
        bytes
    }

    /// Write the whole header chunk.
    fn write(&self, track_count: usize, out: &mut Vec<u8>) -> Result<()> {
        let track_count = u16::try_from(track_count)
            .map_err(|_| err_encoding!("track count exceeds 16 bit range"))?;
        let header = self.encode(track_count);
        out.extend_from_slice(b"MThd");
        out.extend_from_slice(&(header.len() as u32).to_be_bytes());
        out.extend_from_slice(&header);
        Ok(())
    }
}

/// Runtime configuration of a [`Document`](struct.Document.html).
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct Options {
    /// What to do with out-of-range channels, keys and programs.
    ///
    /// Defaults to [`FieldPolicy::from_features`](enum.FieldPolicy.html#method.from_features).
    pub policy: FieldPolicy,
    /// Allow rendering tracks in multiple threads when the document is large enough.
    ///
    /// Defaults to `true` if the `parallel` feature is enabled. Has no effect otherwise.
    pub parallel: bool,
}
impl Default for Options {
    #[inline]
    fn default() -> Options {
        Options {
            policy: FieldPolicy::default(),
            parallel: cfg!(feature = "parallel"),
        }
    }
}

/// A MIDI document being composed.
///
/// A document owns an ordered list of tracks. Track `i` of the document becomes track chunk `i`
/// of the rendered file. Tracks can be referred to by index without declaring them first:
/// referring to a track beyond the last one creates it, along with every empty track in between.
///
/// All of the composition methods validate their input first. Invalid calls are skipped without
/// touching the document, and are logged and recorded as [`Rejection`](struct.Rejection.html)s.
#[derive(Clone, Debug, Default)]
pub struct Document {
    options: Options,
    tracks: Vec<Track>,
    channel_program: BTreeMap<u4, u7>,
    rejections: Vec<Rejection>,
}
impl Document {
    /// Create an empty document with the default options.
    #[inline]
    pub fn new() -> Document {
        Document::default()
    }

    /// Create an empty document with the given options.
    #[inline]
    pub fn with_options(options: Options) -> Document {
        Document {
            options,
            ..Document::default()
        }
    }

    #[inline]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The resolution of this document, which is always
    /// [`TICKS_PER_QUARTER`](constant.TICKS_PER_QUARTER.html).
    #[inline]
    pub fn ticks_per_quarter(&self) -> u16 {
        TICKS_PER_QUARTER
    }

    /// The header this document is currently rendered with.
    #[inline]
    pub fn header(&self) -> Header {
        Header::new(
            Format::for_track_count(self.tracks.len()),
            u15::new(TICKS_PER_QUARTER),
        )
    }

    #[inline]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    #[inline]
    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    #[inline]
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// The programs assigned to each channel through
    /// [`set_channel_program`](#method.set_channel_program).
    #[inline]
    pub fn channel_program(&self) -> &BTreeMap<u4, u7> {
        &self.channel_program
    }

    /// The program last assigned to the given channel, if any.
    #[inline]
    pub fn program_for(&self, channel: u8) -> Option<u8> {
        u4::try_from(channel)
            .and_then(|channel| self.channel_program.get(&channel))
            .map(|program| program.as_int())
    }

    /// Every call that was skipped because of invalid input, oldest first.
    #[inline]
    pub fn rejections(&self) -> &[Rejection] {
        &self.rejections
    }

    /// Take the recorded rejections out of the document, leaving it with none.
    #[inline]
    pub fn take_rejections(&mut self) -> Vec<Rejection> {
        std::mem::take(&mut self.rejections)
    }

    /// Append a new empty track, returning its index.
    pub fn add_track(&mut self) -> usize {
        self.tracks.push(Track::new());
        self.tracks.len() - 1
    }

    /// Get a track, creating it and any missing tracks before it if necessary.
    fn track_mut_or_create(&mut self, index: usize) -> &mut Track {
        while index >= self.tracks.len() {
            self.add_track();
        }
        &mut self.tracks[index]
    }

    fn reject(&mut self, operation: Operation, reason: InvalidInput) {
        let rejection = Rejection { operation, reason };
        warn!("{}", rejection);
        self.rejections.push(rejection);
    }

    /// Set the program (also known as instrument) of a channel.
    ///
    /// The program change is always placed at tick 0 of track 0, no matter which track plays
    /// on the channel later on.
    ///
    /// See the [`gm`](gm/index.html) module for the General MIDI program numbers.
    pub fn set_channel_program(&mut self, channel: u8, program: u8) {
        let operation = Operation::SetChannelProgram { channel, program };
        match check_program(channel, program, self.options.policy) {
            Ok((channel, program)) => {
                self.channel_program.insert(channel, program);
                self.track_mut_or_create(0)
                    .push(0, Event::ProgramChange { channel, program });
            }
            Err(reason) => self.reject(operation, reason),
        }
    }

    /// Insert a tempo change at the given tick, in beats (quarter notes) per minute.
    ///
    /// Tempo changes are usually placed in track 0.
    pub fn add_tempo(&mut self, track: usize, start: u32, bpm: f64) {
        let operation = Operation::AddTempo { track, start, bpm };
        let checked = check_track(track)
            .and_then(|()| check_tick(start))
            .and_then(|()| check_tempo(bpm));
        match checked {
            Ok(micros_per_beat) => self
                .track_mut_or_create(track)
                .push(start, Event::Tempo(micros_per_beat)),
            Err(reason) => self.reject(operation, reason),
        }
    }

    /// Add a note to a track.
    ///
    /// Adds a note-on event at `start` and a note-off event at `start + duration`, both on the
    /// same track and channel. Times are in ticks. Channel 9 is usually reserved for drums.
    pub fn add_note(
        &mut self,
        track: usize,
        channel: u8,
        start: u32,
        duration: u32,
        key: u8,
        velocity: u8,
    ) {
        let operation = Operation::AddNote {
            track,
            channel,
            start,
            duration,
            key,
            velocity,
        };
        let policy = self.options.policy;
        let checked = check_track(track)
            .and_then(|()| check_note(channel, start, duration, key, velocity, policy));
        match checked {
            Ok((note_on, note_off, end)) => {
                let track = self.track_mut_or_create(track);
                track.push(start, note_on);
                track.push(end, note_off);
            }
            Err(reason) => self.reject(operation, reason),
        }
    }

    /// Render the document into the bytes of a complete Standard Midi File.
    ///
    /// Rendering does not modify the document, so rendering twice without composing in between
    /// produces identical bytes.
    ///
    /// Fails with `Error::Encoding` if the document cannot be represented as a MIDI file.
    /// Composition already rejects ticks and track indices beyond the format limits, so this only
    /// happens if `add_track` was called more than 65535 times or a chunk grows beyond 4GB.
    pub fn render(&self) -> Result<Vec<u8>> {
        let event_count = self.tracks.iter().map(Track::len).sum::<usize>();
        let cap = 14 + self.tracks.len() * 12 + (event_count as f32 * EVENTS_TO_BYTES) as usize;
        let mut out = Vec::with_capacity(cap);

        //Write the header first
        self.header().write(self.tracks.len(), &mut out)?;

        //Try to render the tracks in parallel
        #[cfg(feature = "parallel")]
        {
            if self.options.parallel
                && (event_count as f32 * EVENTS_TO_BYTES) > PARALLEL_ENABLE_THRESHOLD as f32
            {
                use rayon::prelude::*;

                debug!(
                    "rendering {} tracks ({} events) in parallel",
                    self.tracks.len(),
                    event_count
                );
                //Write out the tracks in parallel into several different buffers
                let mut track_chunks = Vec::new();
                self.tracks
                    .par_iter()
                    .map(|track| -> StdResult<Vec<u8>, &'static str> {
                        let mut track_chunk = Vec::new();
                        track.write_to_vec(&mut track_chunk)?;
                        Ok(track_chunk)
                    })
                    .collect_into_vec(&mut track_chunks);

                //Write down the tracks sequentially and in order
                for result in track_chunks {
                    let track_chunk = result.map_err(Error::Encoding)?;
                    out.extend_from_slice(&track_chunk);
                }
                return Ok(out);
            }
        }

        debug!(
            "rendering {} tracks ({} events)",
            self.tracks.len(),
            event_count
        );
        //Write the tracks into a reusable buffer before appending them
        let mut buf = Vec::new();
        for track in &self.tracks {
            track.write_to_vec(&mut buf).map_err(Error::Encoding)?;
            out.extend_from_slice(&buf);
        }
        Ok(out)
    }

    /// Render the document and write it to the given `std::io::Write` writer.
    ///
    /// The whole file is rendered before anything is written, so encoding errors never leave a
    /// partially written file behind.
    pub fn write<W: io::Write>(&self, mut out: W) -> Result<()> {
        let bytes = self.render()?;
        out.write_all(&bytes)?;
        out.flush()?;
        Ok(())
    }

    /// Render the document and save it to the given path, creating or truncating the file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        /// A non-generic, non-inline function.
        /// This means that this function will be compiled and monomorphized once, and reused for
        /// every call to `save`.
        fn save_impl(doc: &Document, path: &Path) -> Result<()> {
            let bytes = doc.render()?;
            let mut file = File::create(path)?;
            io::Write::write_all(&mut file, &bytes)?;
            debug!("saved {} bytes to {}", bytes.len(), path.display());
            Ok(())
        }
        save_impl(self, path.as_ref())
    }
}
