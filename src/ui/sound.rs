/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink; a failed
/// playback is dropped silently.
///
/// Build without the "sound" feature to disable audio entirely (the stub
/// SoundEngine does nothing).

use crate::sim::event::GameEvent;

/// One sound effect per audible game event.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Coin,
    Exit,
    EnemyKilled,
    PlayerDied,
    GameOver,
}

impl Sfx {
    pub const ALL: [Sfx; 5] = [Sfx::Coin, Sfx::Exit, Sfx::EnemyKilled, Sfx::PlayerDied, Sfx::GameOver];

    pub fn for_event(event: &GameEvent) -> Sfx {
        match event {
            GameEvent::CoinCollected { .. } => Sfx::Coin,
            GameEvent::ExitReached => Sfx::Exit,
            GameEvent::EnemyKilled { .. } => Sfx::EnemyKilled,
            GameEvent::PlayerDied => Sfx::PlayerDied,
            GameEvent::GameOver => Sfx::GameOver,
        }
    }
}

#[cfg(any(feature = "sound", test))]
mod synth {
    use std::f32::consts::TAU;

    use super::Sfx;

    pub const SAMPLE_RATE: u32 = 22050;

    /// Mono samples for an effect.
    pub fn samples(sfx: Sfx) -> Vec<f32> {
        match sfx {
            // Quick rising pair: B5 → E6
            Sfx::Coin => notes(&[(988.0, 0.05), (1319.0, 0.12)], 0.25, bright),
            // Ascending fanfare C5 → E5 → G5 → C6, last note held
            Sfx::Exit => notes(
                &[(523.0, 0.09), (659.0, 0.09), (784.0, 0.09), (1047.0, 0.3)],
                0.3,
                bright,
            ),
            Sfx::EnemyKilled => sweep(700.0, 150.0, 0.14, 0.3),
            // Sad descent A4 → F#4 → Eb4 → C4
            Sfx::PlayerDied => notes(
                &[(440.0, 0.12), (370.0, 0.12), (311.0, 0.12), (261.0, 0.25)],
                0.3,
                pure,
            ),
            Sfx::GameOver => notes(
                &[(392.0, 0.2), (330.0, 0.2), (262.0, 0.2), (196.0, 0.6)],
                0.3,
                pure,
            ),
        }
    }

    fn pure(phase: f32) -> f32 {
        phase.sin()
    }

    /// Sine plus octave and twelfth for a retro edge.
    fn bright(phase: f32) -> f32 {
        phase.sin() * 0.6 + (phase * 2.0).sin() * 0.3 + (phase * 3.0).sin() * 0.1
    }

    /// Play `(frequency, seconds)` pairs back to back, each with a linear decay.
    fn notes(seq: &[(f32, f32)], volume: f32, wave: fn(f32) -> f32) -> Vec<f32> {
        let mut out = Vec::new();
        for &(freq, dur) in seq {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            out.extend((0..n).map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - i as f32 / n as f32;
                wave(t * freq * TAU) * env * volume
            }));
        }
        out
    }

    /// Linear pitch sweep with a fading envelope.
    fn sweep(from: f32, to: f32, dur: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * dur) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let progress = i as f32 / n as f32;
                let freq = from + (to - from) * progress;
                phase += freq * TAU / SAMPLE_RATE as f32;
                phase.sin() * (1.0 - progress).powf(0.7) * volume
            })
            .collect()
    }

    /// Wrap mono f32 samples into a 16-bit PCM WAV buffer.
    pub fn make_wav(samples: &[f32]) -> Vec<u8> {
        let channels: u16 = 1;
        let bits: u16 = 16;
        let byte_rate = SAMPLE_RATE * channels as u32 * bits as u32 / 8;
        let block_align = channels * bits / 8;
        let data_size = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let v = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};
    use tracing::{debug, info};

    use super::{synth, Sfx};
    use crate::sim::event::GameEvent;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        /// Indexed by `Sfx as usize`.
        buffers: Vec<Arc<Vec<u8>>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    info!("no audio output, sound disabled: {e}");
                    return None;
                }
            };
            let buffers = Sfx::ALL
                .iter()
                .map(|&sfx| Arc::new(synth::make_wav(&synth::samples(sfx))))
                .collect();
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, sfx: Sfx) {
            let Some(buf) = self.buffers.get(sfx as usize) else { return };
            let Ok(sink) = Sink::try_new(&self.handle) else { return };
            match rodio::Decoder::new(Cursor::new(buf.as_ref().clone())) {
                Ok(src) => {
                    sink.append(src);
                    sink.detach();
                }
                Err(e) => debug!(?sfx, "sound decode failed: {e}"),
            }
        }

        pub fn play_events(&self, events: &[GameEvent]) {
            for event in events {
                self.play(Sfx::for_event(event));
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: no-ops when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
    pub fn play_events(&self, _events: &[GameEvent]) {}
}
