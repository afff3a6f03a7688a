/// Sound engine: procedural chiptune cues played through rodio.
///
/// Every `Cue` is synthesized once into an in-memory WAV buffer when the
/// engine starts; playback is fire-and-forget through a detached Sink.
///
/// Build without the "sound" feature to get a silent stub with the same API.

use crate::sim::event::Cue;

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
const SAMPLE_RATE: u32 = 22050;

/// One note of a cue: start/end frequency (a sweep when they differ),
/// duration in seconds, and how much noise is mixed in.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
struct Note {
    from: f32,
    to: f32,
    secs: f32,
    noise: f32,
}

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
const fn tone(freq: f32, secs: f32) -> Note {
    Note { from: freq, to: freq, secs, noise: 0.0 }
}

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
const fn sweep(from: f32, to: f32, secs: f32) -> Note {
    Note { from, to, secs, noise: 0.0 }
}

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
const JUMP: &[Note] = &[sweep(300.0, 720.0, 0.09)];
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
const GEM: &[Note] = &[tone(1047.0, 0.045), tone(1319.0, 0.045), tone(1568.0, 0.06)];
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
const POWER_UP: &[Note] = &[
    tone(523.0, 0.06),
    tone(659.0, 0.06),
    tone(784.0, 0.06),
    tone(1047.0, 0.06),
    tone(1319.0, 0.12),
];
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
const LAND_KILL: &[Note] = &[Note { from: 500.0, to: 120.0, secs: 0.12, noise: 0.6 }];
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
const HURT: &[Note] = &[tone(330.0, 0.08), tone(220.0, 0.12)];
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
const DEATH: &[Note] = &[tone(440.0, 0.12), tone(370.0, 0.12), tone(311.0, 0.12), tone(261.0, 0.25)];
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
const EXIT: &[Note] = &[tone(523.0, 0.1), tone(659.0, 0.1), tone(784.0, 0.1), tone(1047.0, 0.3)];

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn score(cue: Cue) -> &'static [Note] {
    match cue {
        Cue::Jump => JUMP,
        Cue::Gem => GEM,
        Cue::PowerUp => POWER_UP,
        Cue::LandKill => LAND_KILL,
        Cue::Hurt => HURT,
        Cue::Death => DEATH,
        Cue::ExitReached => EXIT,
    }
}

/// Render a cue to mono samples in -1..=1.
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn synthesize(cue: Cue) -> Vec<f32> {
    use std::f32::consts::TAU;

    let mut samples = Vec::new();
    let mut lcg: u32 = 12345;
    for note in score(cue) {
        let n = (SAMPLE_RATE as f32 * note.secs) as usize;
        let mut phase = 0.0_f32;
        for i in 0..n {
            let t = i as f32 / n as f32;
            let freq = note.from + (note.to - note.from) * t;
            phase = (phase + freq / SAMPLE_RATE as f32).fract();
            // Sine plus a third harmonic gives the square-ish retro edge.
            let wave = (phase * TAU).sin() * 0.7 + (phase * 3.0 * TAU).sin() * 0.3;
            lcg = lcg.wrapping_mul(1103515245).wrapping_add(12345);
            let noise = (lcg as f32 / u32::MAX as f32) * 2.0 - 1.0;
            let env = (1.0 - t).powf(0.6);
            samples.push((wave * (1.0 - note.noise) + noise * note.noise) * env * 0.3);
        }
    }
    samples
}

/// 16-bit mono PCM WAV.
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn encode_wav(samples: &[f32]) -> Vec<u8> {
    let data_size = samples.len() as u32 * 2;
    let mut buf = Vec::with_capacity(44 + data_size as usize);

    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_size).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&1u16.to_le_bytes()); // mono
    buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    buf.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
    buf.extend_from_slice(&2u16.to_le_bytes());
    buf.extend_from_slice(&16u16.to_le_bytes());

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &s in samples {
        let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
        buf.extend_from_slice(&val.to_le_bytes());
    }
    buf
}

#[cfg(feature = "sound")]
mod inner {
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};
    use tracing::{debug, warn};

    use super::{encode_wav, synthesize};
    use crate::sim::event::Cue;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: HashMap<Cue, Arc<Vec<u8>>>,
    }

    impl SoundEngine {
        /// `None` when no audio device is available; the game runs silent.
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("audio output unavailable, running silent: {e}");
                    return None;
                }
            };
            let buffers = Cue::ALL
                .iter()
                .map(|&cue| (cue, Arc::new(encode_wav(&synthesize(cue)))))
                .collect();
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, cue: Cue) {
            let Some(buf) = self.buffers.get(&cue) else {
                return;
            };
            let sink = match Sink::try_new(&self.handle) {
                Ok(sink) => sink,
                Err(e) => {
                    debug!(?cue, "could not open sink: {e}");
                    return;
                }
            };
            match rodio::Decoder::new(Cursor::new(buf.as_ref().clone())) {
                Ok(src) => {
                    sink.append(src);
                    sink.detach();
                }
                Err(e) => debug!(?cue, "could not decode cue: {e}"),
            }
        }
    }
}

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> {
        Some(SoundEngine)
    }
    pub fn play(&self, _cue: Cue) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_cue_renders_audible_bounded_samples() {
        for cue in Cue::ALL {
            let s = synthesize(cue);
            assert!(!s.is_empty(), "{cue:?}");
            assert!(s.iter().all(|v| v.abs() <= 1.0));
            assert!(s.iter().any(|v| v.abs() > 0.01), "{cue:?} is silent");
        }
    }

    #[test]
    fn wav_header_matches_payload() {
        let wav = encode_wav(&[0.0, 1.0, -1.0]);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(wav.len(), 44 + 6);
        assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 6);
        assert_eq!(i16::from_le_bytes([wav[46], wav[47]]), 32767);
    }

    #[test]
    fn death_is_longer_than_jump() {
        assert!(synthesize(Cue::Death).len() > synthesize(Cue::Jump).len());
    }
}
