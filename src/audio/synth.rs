//! Waveform generators - every buffer is mono `f32` at the engine sample rate
//!
//! Nothing here touches an output device. The engine calls these once at
//! construction (cached buffers) or per trigger (filtered noise bursts).

use std::f32::consts::TAU;

use rand::Rng;

use super::filter::{Biquad, BiquadCoeffs};

/// Background loop tempo
pub const LOOP_BPM: f32 = 120.0;
/// Beats in the loop (one bar of 4/4)
pub const LOOP_BEATS: usize = 4;
/// Seconds of cached white noise that bursts are cut from
pub const NOISE_SECONDS: f32 = 2.0;

/// Bass line, one note per eighth (Hz, 0 = rest)
const BASS_PATTERN: [f32; 8] = [55.0, 0.0, 55.0, 65.41, 0.0, 73.42, 55.0, 49.0];

/// Value of an exponential ramp from `start` to `end` over `duration`,
/// holding `end` afterwards
#[inline]
pub fn exp_ramp(start: f32, end: f32, duration: f32, t: f32) -> f32 {
    if t <= 0.0 {
        start
    } else if t >= duration {
        end
    } else {
        start * (end / start).powf(t / duration)
    }
}

#[inline]
fn samples_for(seconds: f32, sample_rate: f32) -> usize {
    (seconds * sample_rate).round().max(0.0) as usize
}

/// Uniform white noise in [-1, 1)
pub fn white_noise(rng: &mut impl Rng, len: usize) -> Vec<f32> {
    (0..len).map(|_| rng.random_range(-1.0f32..1.0)).collect()
}

/// Filter applied to a noise burst
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BurstFilter {
    HighPass { freq: f32, q: f32 },
    LowPass { freq: f32, q: f32 },
}

/// Shape of a one-shot shatter sound
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurstParams {
    pub filter: BurstFilter,
    /// Seconds for the gain to fall from 1.0 to 0.01
    pub decay: f32,
    /// Total clip length in seconds
    pub length: f32,
}

impl BurstParams {
    /// Bright, ringing glass
    pub const BRITTLE: BurstParams = BurstParams {
        filter: BurstFilter::HighPass {
            freq: 2000.0,
            q: 10.0,
        },
        decay: 0.3,
        length: 0.5,
    };

    /// Dull ice crunch
    pub const FROZEN: BurstParams = BurstParams {
        filter: BurstFilter::LowPass {
            freq: 400.0,
            q: 0.707,
        },
        decay: 0.5,
        length: 0.6,
    };
}

/// Cut a burst out of cached noise starting at `offset` (wrapping), then
/// filter and envelope it
pub fn noise_burst(noise: &[f32], offset: usize, params: &BurstParams, sample_rate: f32) -> Vec<f32> {
    if noise.is_empty() {
        return Vec::new();
    }
    let coeffs = match params.filter {
        BurstFilter::HighPass { freq, q } => BiquadCoeffs::high_pass(freq, q, sample_rate),
        BurstFilter::LowPass { freq, q } => BiquadCoeffs::low_pass(freq, q, sample_rate),
    };
    let n = samples_for(params.length, sample_rate);
    let mut clip: Vec<f32> = (0..n).map(|i| noise[(offset + i) % noise.len()]).collect();
    Biquad::new(coeffs).process_buffer(&mut clip);

    for (i, s) in clip.iter_mut().enumerate() {
        *s *= exp_ramp(1.0, 0.01, params.decay, i as f32 / sample_rate);
    }
    clip
}

/// Sine with an exponential pitch glide and gain envelope
pub fn sweep_tone(
    sample_rate: f32,
    length: f32,
    freq: (f32, f32),
    gain: (f32, f32),
) -> Vec<f32> {
    let n = samples_for(length, sample_rate);
    let mut phase = 0.0f32;
    (0..n)
        .map(|i| {
            let t = i as f32 / sample_rate;
            let f = exp_ramp(freq.0, freq.1, length, t);
            let s = phase.sin() * exp_ramp(gain.0, gain.1, length, t);
            phase = (phase + TAU * f / sample_rate) % TAU;
            s
        })
        .collect()
}

/// Game-over sting: a falling sine thud layered over a darkening noise crash
pub fn terminal_cue(sample_rate: f32, rng: &mut impl Rng) -> Vec<f32> {
    let mut out = sweep_tone(sample_rate, 0.8, (150.0, 40.0), (0.8, 0.01));

    // Crash: low-pass cutoff glides 1000 Hz → 100 Hz over 0.5s
    let crash_len = samples_for(0.6, sample_rate);
    let noise = white_noise(rng, crash_len);
    let mut filter = Biquad::new(BiquadCoeffs::low_pass(1000.0, 0.707, sample_rate));
    for (i, x) in noise.iter().enumerate() {
        let t = i as f32 / sample_rate;
        if i % 32 == 0 {
            let cutoff = exp_ramp(1000.0, 100.0, 0.5, t);
            filter.set_coeffs(BiquadCoeffs::low_pass(cutoff, 0.707, sample_rate));
        }
        let s = filter.process(*x) * exp_ramp(0.5, 0.01, 0.6, t);
        if i < out.len() {
            out[i] += s;
        } else {
            out.push(s);
        }
    }
    out
}

/// Add `clip` into `buf` at `start`, wrapping past the end so the buffer
/// loops without a click
fn mix_wrapping(buf: &mut [f32], start: usize, clip: &[f32]) {
    let len = buf.len();
    if len == 0 {
        return;
    }
    for (i, s) in clip.iter().enumerate() {
        buf[(start + i) % len] += s;
    }
}

fn kick(sample_rate: f32) -> Vec<f32> {
    sweep_tone(sample_rate, 0.3, (150.0, 45.0), (0.9, 0.001))
}

fn hat(sample_rate: f32, rng: &mut impl Rng) -> Vec<f32> {
    let noise = white_noise(rng, samples_for(0.05, sample_rate));
    let params = BurstParams {
        filter: BurstFilter::HighPass {
            freq: 7000.0,
            q: 0.707,
        },
        decay: 0.05,
        length: 0.05,
    };
    noise_burst(&noise, 0, &params, sample_rate)
        .into_iter()
        .map(|s| s * 0.25)
        .collect()
}

fn bass_note(sample_rate: f32, freq: f32, length: f32) -> Vec<f32> {
    let n = samples_for(length, sample_rate);
    let attack = samples_for(0.005, sample_rate).max(1);
    let mut phase = 0.0f32;
    (0..n)
        .map(|i| {
            let t = i as f32 / sample_rate;
            let env = if i < attack {
                i as f32 / attack as f32
            } else {
                exp_ramp(1.0, 0.001, length, t)
            };
            // Sine plus a touch of second harmonic for some growl
            let s = phase.sin() + 0.3 * (2.0 * phase).sin();
            phase = (phase + TAU * freq / sample_rate) % TAU;
            s * env * 0.35
        })
        .collect()
}

/// One seamlessly loopable bar of kick / hat / bass
pub fn background_bar(sample_rate: f32, rng: &mut impl Rng) -> Vec<f32> {
    let beat = 60.0 / LOOP_BPM;
    let eighth = beat / 2.0;
    let len = samples_for(beat * LOOP_BEATS as f32, sample_rate);
    let mut bar = vec![0.0f32; len];

    let kick = kick(sample_rate);
    for b in 0..LOOP_BEATS {
        mix_wrapping(&mut bar, samples_for(b as f32 * beat, sample_rate), &kick);
    }

    for e in 0..LOOP_BEATS * 2 {
        let start = samples_for(e as f32 * eighth, sample_rate);
        if e % 2 == 1 {
            let hat = hat(sample_rate, rng);
            mix_wrapping(&mut bar, start, &hat);
        }
        let freq = BASS_PATTERN[e % BASS_PATTERN.len()];
        if freq > 0.0 {
            mix_wrapping(&mut bar, start, &bass_note(sample_rate, freq, eighth * 0.9));
        }
    }

    // Leave headroom for effects on top
    let peak = bar.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if peak > 0.8 {
        let gain = 0.8 / peak;
        bar.iter_mut().for_each(|s| *s *= gain);
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const SR: f32 = 44_100.0;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(5)
    }

    /// Count sign changes, a cheap brightness measure
    fn zero_crossings(samples: &[f32]) -> usize {
        samples
            .windows(2)
            .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
            .count()
    }

    #[test]
    fn test_exp_ramp_endpoints() {
        assert_eq!(exp_ramp(1.0, 0.01, 0.3, 0.0), 1.0);
        assert_eq!(exp_ramp(1.0, 0.01, 0.3, 0.5), 0.01);
        assert!((exp_ramp(1.0, 0.01, 0.3, 0.15) - 0.1).abs() < 1e-4);
    }

    #[test]
    fn test_brittle_is_brighter_than_frozen() {
        let noise = white_noise(&mut rng(), samples_for(NOISE_SECONDS, SR));
        let brittle = noise_burst(&noise, 0, &BurstParams::BRITTLE, SR);
        let frozen = noise_burst(&noise, 0, &BurstParams::FROZEN, SR);
        assert_eq!(brittle.len(), samples_for(0.5, SR));
        assert_eq!(frozen.len(), samples_for(0.6, SR));

        let window = samples_for(0.1, SR);
        assert!(zero_crossings(&brittle[..window]) > 3 * zero_crossings(&frozen[..window]));
    }

    #[test]
    fn test_burst_decays() {
        let noise = white_noise(&mut rng(), samples_for(NOISE_SECONDS, SR));
        let burst = noise_burst(&noise, 1234, &BurstParams::FROZEN, SR);
        let head = burst[..2000].iter().map(|s| s.abs()).fold(0.0, f32::max);
        let tail = burst[burst.len() - 2000..].iter().map(|s| s.abs()).fold(0.0, f32::max);
        assert!(tail < head * 0.1);
    }

    #[test]
    fn test_sweep_tone_descends() {
        let tone = sweep_tone(SR, 0.8, (150.0, 40.0), (1.0, 1.0));
        let quarter = tone.len() / 4;
        let early = zero_crossings(&tone[..quarter]);
        let late = zero_crossings(&tone[tone.len() - quarter..]);
        assert!(early > late);
    }

    #[test]
    fn test_terminal_cue_length() {
        let cue = terminal_cue(SR, &mut rng());
        assert_eq!(cue.len(), samples_for(0.8, SR));
        assert!(cue.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_background_bar_loops_cleanly() {
        let bar = background_bar(SR, &mut rng());
        assert_eq!(bar.len(), samples_for(2.0, SR));
        let peak = bar.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak > 0.1 && peak <= 0.8 + 1e-6);
        // No step at the loop point
        assert!((bar[0] - bar[bar.len() - 1]).abs() < 0.1);
    }

    #[test]
    fn test_mix_wrapping_wraps() {
        let mut buf = vec![0.0; 4];
        mix_wrapping(&mut buf, 3, &[1.0, 2.0, 3.0]);
        assert_eq!(buf, vec![2.0, 3.0, 0.0, 1.0]);
    }
}
