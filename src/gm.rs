//! General MIDI name tables, for picking programs and percussion keys by name.
//!
//! These are plain static data, independent from the encoder: look a number up here and pass it
//! to [`Document::set_channel_program`](../struct.Document.html#method.set_channel_program) or
//! [`Document::add_note`](../struct.Document.html#method.add_note).
//!
//! ```rust
//! use smfwrite::{gm, Document};
//!
//! let mut doc = Document::new();
//! doc.set_channel_program(0, gm::program("rock_organ").unwrap_or(0));
//! doc.add_note(0, gm::DRUM_CHANNEL, 0, 120, gm::drum("kick_drum").unwrap(), 120);
//! ```

/// The channel percussion is played on (channel 10 when counting from 1).
pub const DRUM_CHANNEL: u8 = 9;

/// The key of the first entry in [`DRUMS`](static.DRUMS.html).
pub const FIRST_DRUM_KEY: u8 = 27;

/// Program names, indexed by program number.
pub static PROGRAMS: [&str; 128] = [
    "acoustic_grand_piano", "bright_acoustic_piano", "electric_grand_piano", "honky-tonk_piano",
    "rhodes_piano", "chorused_piano", "harpsichord", "clavinet", "celesta", "glockenspiel",
    "music_box", "vibraphone", "marimba", "xylophone", "tubular_bells", "dulcimer", "hammond_organ",
    "percussive_organ", "rock_organ", "church_organ", "reed_organ", "accordion", "harmonica",
    "tango_accordion", "acoustic_guitar_(nylon)", "acoustic_guitar_(steel)",
    "electric_guitar_(jazz)", "electric_guitar_(clean)", "electric_guitar_(muted)",
    "overdriven_guitar", "distortion_guitar", "guitar_harmonics", "acoustic_bass",
    "electric_bass_(finger)", "electric_bass_(pick)", "fretless_bass", "slap_bass_1", "slap_bass_2",
    "synth_bass_1", "synth_bass_2", "violin", "viola", "cello", "contrabass", "tremolo_strings",
    "pizzicato_strings", "orchestral_harp", "timpani", "string_ensemble_1", "string_ensemble_2",
    "synth_strings_1", "synth_strings_2", "choir_aahs", "voice_oohs", "synth_voice",
    "orchestra_hit", "trumpet", "trombone", "tuba", "muted_trumpet", "french_horn", "brass_section",
    "synth_brass_1", "synth_brass_2", "soprano_sax", "alto_sax", "tenor_sax", "baritone_sax",
    "oboe", "english_horn", "bassoon", "clarinet", "piccolo", "flute", "recorder", "pan_flute",
    "bottle_blow", "shakuhachi", "whistle", "ocarina", "lead_1_(square)", "lead_2_(sawtooth)",
    "lead_3_(calliope_lead)", "lead_4_(chiffer_lead)", "lead_5_(charang)", "lead_6_(voice)",
    "lead_7_(fifths)", "lead_8_(brass_+_lead)", "pad_1_(new_age)", "pad_2_(warm)",
    "pad_3_(polysynth)", "pad_4_(choir)", "pad_5_(bowed)", "pad_6_(metallic)", "pad_7_(halo)",
    "pad_8_(sweep)", "fx_1_(rain)", "fx_2_(soundtrack)", "fx_3_(crystal)", "fx_4_(atmosphere)",
    "fx_5_(brightness)", "fx_6_(goblins)", "fx_7_(echoes)", "fx_8_(sci-fi)", "sitar", "banjo",
    "shamisen", "koto", "kalimba", "bagpipe", "fiddle", "shana", "tinkle_bell", "agogo",
    "steel_drums", "woodblock", "taiko_drum", "melodic_tom", "synth_drum", "cymbal_reverse",
    "guitar_fret_noise", "breath_noise", "seashore", "bird_tweet", "telephone_ring", "helicopter",
    "applause", "gunshot",
];

/// Percussion names, indexed by key minus [`FIRST_DRUM_KEY`](constant.FIRST_DRUM_KEY.html).
pub static DRUMS: [&str; 63] = [
    "laser", "whip", "scratch_push", "scratch_pull", "sticks", "metronome_click", "metronome_bell",
    "bass_drum", "kick_drum", "bass_drum_1", "snare_cross_stick", "snare_drum_1", "hand_clap",
    "snare_drum_2", "tom_1", "cymbal_hi_hat_closed", "tom_2", "cymbal_hi_hat_pedal", "tom_3",
    "cymbal_hi_hat_open", "tom_4", "tom_5", "cymbal_crash_1", "tom_6", "cymbal_ride_1",
    "cymbal_china", "cymbal_ride_bell", "tambourine", "cymbal_splash", "cowbell", "cymbal_crash_2",
    "vibraslap", "cymbal_ride_2", "high_bongo", "low_bongo", "conga_dead_stroke", "conga",
    "high_timbale", "low_timbale", "high_agogo", "low_agogo", "cabasa", "maracas", "whistle_short",
    "whistle_long", "guiro_short", "guiro_long", "claves", "high_woodblock", "low_woodblock",
    "cuica_high", "cuica_low", "triangle_mute", "triangle_open", "shaker", "sleigh_bell",
    "bell_tree", "castanets", "surdu_dead_stroke", "surdu", "snare_drum_rod", "ocean_drum",
    "snare_drum_brush",
];

/// Look up a program number by name, such as `"acoustic_grand_piano"` or `"xylophone"`.
#[inline]
pub fn program(name: &str) -> Option<u8> {
    PROGRAMS
        .iter()
        .position(|&prog| prog == name)
        .map(|idx| idx as u8)
}

/// The name of a program number, if it is in range.
#[inline]
pub fn program_name(program: u8) -> Option<&'static str> {
    PROGRAMS.get(program as usize).copied()
}

/// Look up the key of a percussion sound by name, such as `"kick_drum"` or `"cowbell"`.
#[inline]
pub fn drum(name: &str) -> Option<u8> {
    DRUMS
        .iter()
        .position(|&drum| drum == name)
        .map(|idx| FIRST_DRUM_KEY + idx as u8)
}

/// The name of the percussion sound played by a key on the drum channel, if there is one.
#[inline]
pub fn drum_name(key: u8) -> Option<&'static str> {
    let idx = key.checked_sub(FIRST_DRUM_KEY)?;
    DRUMS.get(idx as usize).copied()
}
