//! Procedural audio engine
//!
//! Every sound is synthesized - no asset files. Buffers are built once at
//! startup; triggers only pick a random slice of cached noise. The host pulls
//! mono PCM through `render` (Web Audio worklet, native device callback, or a
//! test harness).

pub mod filter;
pub mod synth;

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::settings::Settings;
use crate::sim::SoundCue;
use filter::{Biquad, BiquadCoeffs};
use synth::BurstParams;

/// Simultaneous one-shot voices; the oldest is dropped past this
pub const MAX_VOICES: usize = 24;
/// Background loop playback rate bounds (0 is reserved for paused)
pub const MIN_MUSIC_RATE: f32 = 0.5;
pub const MAX_MUSIC_RATE: f32 = 2.0;

/// Fixed output trim before user volumes
const MASTER_GAIN: f32 = 0.5;
/// Cutoff of the low-pass that softens the background loop
const MUSIC_DAMPING_HZ: f32 = 1200.0;
const MUSIC_DAMPING_Q: f32 = 0.707;

/// A one-shot clip being played back
#[derive(Debug, Clone)]
struct Voice {
    clip: Arc<[f32]>,
    /// Fractional read head (samples)
    position: f64,
    rate: f32,
    gain: f32,
}

impl Voice {
    fn finished(&self) -> bool {
        self.position >= self.clip.len() as f64
    }

    /// Linear-interpolated sample at the read head, then advance
    fn next_sample(&mut self) -> f32 {
        let s = sample_at(&self.clip, self.position, false);
        self.position += self.rate as f64;
        s * self.gain
    }
}

/// Linear interpolation into `clip`; `wrap` reads past the end from the start
fn sample_at(clip: &[f32], position: f64, wrap: bool) -> f32 {
    let len = clip.len();
    if len == 0 {
        return 0.0;
    }
    let i = position.floor() as usize;
    let frac = (position - position.floor()) as f32;
    let (a, b) = if wrap {
        (clip[i % len], clip[(i + 1) % len])
    } else {
        if i >= len {
            return 0.0;
        }
        (clip[i], clip.get(i + 1).copied().unwrap_or(0.0))
    };
    a + (b - a) * frac
}

/// Buffers synthesized at startup
#[derive(Debug)]
struct SoundBank {
    noise: Vec<f32>,
    terminal: Arc<[f32]>,
    bar: Arc<[f32]>,
}

/// Looping background transport
#[derive(Debug)]
struct MusicBus {
    playing: bool,
    position: f64,
    rate: f32,
    damping: Biquad,
}

/// Audio manager for the game
pub struct AudioManager {
    sample_rate: f32,
    bank: SoundBank,
    voices: Vec<Voice>,
    music: MusicBus,
    rng: Pcg32,
    master_volume: f32,
    sfx_volume: f32,
    music_volume: f32,
    muted: bool,
}

impl std::fmt::Debug for AudioManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioManager")
            .field("sample_rate", &self.sample_rate)
            .field("voices", &self.voices.len())
            .field("music_playing", &self.music.playing)
            .field("music_rate", &self.music.rate)
            .field("muted", &self.muted)
            .finish()
    }
}

impl AudioManager {
    pub fn new(sample_rate: u32, seed: u64) -> Self {
        let sample_rate = sample_rate.max(8_000) as f32;
        let mut rng = Pcg32::seed_from_u64(seed);

        let noise_len = (synth::NOISE_SECONDS * sample_rate) as usize;
        let bank = SoundBank {
            noise: synth::white_noise(&mut rng, noise_len),
            terminal: synth::terminal_cue(sample_rate, &mut rng).into(),
            bar: synth::background_bar(sample_rate, &mut rng).into(),
        };
        log::debug!(
            "Audio bank ready: {} noise, {} loop samples @ {} Hz",
            bank.noise.len(),
            bank.bar.len(),
            sample_rate
        );

        Self {
            sample_rate,
            bank,
            voices: Vec::with_capacity(MAX_VOICES),
            music: MusicBus {
                playing: false,
                position: 0.0,
                rate: 1.0,
                damping: Biquad::new(BiquadCoeffs::low_pass(
                    MUSIC_DAMPING_HZ,
                    MUSIC_DAMPING_Q,
                    sample_rate,
                )),
            },
            rng,
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            muted: false,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate as u32
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Set music volume (0.0 - 1.0)
    pub fn set_music_volume(&mut self, vol: f32) {
        self.music_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.set_master_volume(settings.master_volume);
        self.set_sfx_volume(settings.sfx_volume);
        self.set_music_volume(settings.music_volume);
        self.set_muted(settings.muted);
    }

    /// Play a simulation sound cue
    pub fn play(&mut self, cue: SoundCue, pitch: f32) {
        match cue {
            SoundCue::BrittleBreak => self.play_brittle_break(pitch),
            SoundCue::FrozenBreak => self.play_frozen_break(pitch),
            SoundCue::Terminal => self.play_terminal_cue(),
        }
    }

    /// Glass shatter - bright high-passed noise, pitch rises with combo
    pub fn play_brittle_break(&mut self, pitch: f32) {
        let rate = 1.0 + self.rng.random::<f32>() * 0.5 + (pitch - 1.0) * 0.2;
        self.play_burst(&BurstParams::BRITTLE, rate, 1.0);
    }

    /// Ice crunch - dull low-passed noise
    pub fn play_frozen_break(&mut self, pitch: f32) {
        let rate = 0.8 + self.rng.random::<f32>() * 0.2 + (pitch - 1.0) * 0.2;
        self.play_burst(&BurstParams::FROZEN, rate, 1.0);
    }

    /// Game-over sting
    pub fn play_terminal_cue(&mut self) {
        let clip = self.bank.terminal.clone();
        self.push_voice(Voice {
            clip,
            position: 0.0,
            rate: 1.0,
            gain: 1.0,
        });
    }

    fn play_burst(&mut self, params: &BurstParams, rate: f32, gain: f32) {
        let offset = self.rng.random_range(0..self.bank.noise.len().max(1));
        let clip = synth::noise_burst(&self.bank.noise, offset, params, self.sample_rate);
        self.push_voice(Voice {
            clip: clip.into(),
            position: 0.0,
            rate: rate.max(0.1),
            gain,
        });
    }

    fn push_voice(&mut self, voice: Voice) {
        if self.voices.len() >= MAX_VOICES {
            self.voices.remove(0);
        }
        self.voices.push(voice);
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Start the background loop from the top
    pub fn play_background_loop(&mut self) {
        if self.music.playing {
            return;
        }
        self.music.playing = true;
        self.music.position = 0.0;
        self.music.damping.reset();
        log::debug!("Background loop started");
    }

    pub fn stop_background_loop(&mut self) {
        if self.music.playing {
            self.music.playing = false;
            log::debug!("Background loop stopped");
        }
    }

    /// Samples in one pass of the background bar
    pub fn background_loop_len(&self) -> usize {
        self.bank.bar.len()
    }

    pub fn is_background_playing(&self) -> bool {
        self.music.playing
    }

    /// 0 (or anything not positive) pauses; otherwise clamped to 0.5..=2.0
    pub fn set_background_playback_rate(&mut self, rate: f32) {
        self.music.rate = if rate > 0.0 {
            rate.clamp(MIN_MUSIC_RATE, MAX_MUSIC_RATE)
        } else {
            0.0
        };
    }

    pub fn background_playback_rate(&self) -> f32 {
        self.music.rate
    }

    /// Fill `out` with the next mono samples
    pub fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);

        for voice in &mut self.voices {
            for s in out.iter_mut() {
                if voice.finished() {
                    break;
                }
                *s += voice.next_sample() * self.sfx_volume;
            }
        }
        self.voices.retain(|v| !v.finished());

        if self.music.playing && self.music.rate > 0.0 {
            let bar = &self.bank.bar;
            let len = bar.len() as f64;
            for s in out.iter_mut() {
                let m = sample_at(bar, self.music.position, true);
                *s += self.music.damping.process(m) * self.music_volume;
                self.music.position = (self.music.position + self.music.rate as f64) % len;
            }
        }

        let gain = if self.muted {
            0.0
        } else {
            self.master_volume * MASTER_GAIN
        };
        for s in out.iter_mut() {
            *s = soft_clip(*s * gain);
        }
    }
}

/// Gentle saturation into (-1, 1)
#[inline]
fn soft_clip(x: f32) -> f32 {
    x.tanh()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SAMPLE_RATE;

    fn audio() -> AudioManager {
        AudioManager::new(SAMPLE_RATE, 7)
    }

    fn rms(buf: &[f32]) -> f32 {
        (buf.iter().map(|s| s * s).sum::<f32>() / buf.len() as f32).sqrt()
    }

    #[test]
    fn test_silent_by_default() {
        let mut audio = audio();
        let mut buf = vec![1.0; 512];
        audio.render(&mut buf);
        assert!(buf.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_break_voice_plays_and_ends() {
        let mut audio = audio();
        audio.play(SoundCue::FrozenBreak, 1.0);
        assert_eq!(audio.active_voices(), 1);

        let mut buf = vec![0.0; 4096];
        audio.render(&mut buf);
        assert!(rms(&buf) > 0.0);

        // Frozen clip is 0.6s at rate <= 1.0, a second is plenty
        let mut long = vec![0.0; SAMPLE_RATE as usize];
        audio.render(&mut long);
        assert_eq!(audio.active_voices(), 0);
    }

    #[test]
    fn test_voice_cap() {
        let mut audio = audio();
        for _ in 0..MAX_VOICES + 10 {
            audio.play_brittle_break(2.0);
        }
        assert_eq!(audio.active_voices(), MAX_VOICES);
    }

    #[test]
    fn test_playback_rate_rules() {
        let mut audio = audio();
        audio.set_background_playback_rate(0.0);
        assert_eq!(audio.background_playback_rate(), 0.0);
        audio.set_background_playback_rate(-1.0);
        assert_eq!(audio.background_playback_rate(), 0.0);
        audio.set_background_playback_rate(f32::NAN);
        assert_eq!(audio.background_playback_rate(), 0.0);
        audio.set_background_playback_rate(0.1);
        assert_eq!(audio.background_playback_rate(), MIN_MUSIC_RATE);
        audio.set_background_playback_rate(9.0);
        assert_eq!(audio.background_playback_rate(), MAX_MUSIC_RATE);
        audio.set_background_playback_rate(1.3);
        assert_eq!(audio.background_playback_rate(), 1.3);
    }

    #[test]
    fn test_paused_loop_is_silent() {
        let mut audio = audio();
        audio.play_background_loop();
        let mut buf = vec![0.0; 4096];
        audio.render(&mut buf);
        assert!(rms(&buf) > 0.0);

        audio.set_background_playback_rate(0.0);
        audio.render(&mut buf);
        assert!(buf.iter().all(|&s| s == 0.0));

        audio.stop_background_loop();
        audio.set_background_playback_rate(1.0);
        audio.render(&mut buf);
        assert!(buf.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_loop_tempo_independent_of_rate() {
        for rate in [22_050, 44_100, 48_000] {
            let audio = AudioManager::new(rate, 1);
            let seconds = audio.background_loop_len() as f32 / rate as f32;
            assert!((seconds - 2.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_mute() {
        let mut audio = audio();
        audio.set_muted(true);
        audio.play_terminal_cue();
        audio.play_background_loop();
        let mut buf = vec![0.0; 1024];
        audio.render(&mut buf);
        assert!(buf.iter().all(|&s| s == 0.0));
        // Muting doesn't stall playback
        assert_eq!(audio.active_voices(), 1);
    }

    #[test]
    fn test_output_bounded() {
        let mut audio = audio();
        audio.set_master_volume(1.0);
        for _ in 0..MAX_VOICES {
            audio.play_terminal_cue();
        }
        audio.play_background_loop();
        let mut buf = vec![0.0; 8192];
        audio.render(&mut buf);
        assert!(buf.iter().all(|s| s.is_finite() && s.abs() <= 1.0));
    }

    #[test]
    fn test_volume_clamped() {
        let mut audio = audio();
        audio.set_master_volume(3.0);
        audio.set_sfx_volume(-1.0);
        audio.play_brittle_break(1.0);
        let mut buf = vec![0.0; 1024];
        audio.render(&mut buf);
        assert!(buf.iter().all(|&s| s == 0.0));
    }
}
