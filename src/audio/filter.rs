//! Biquad filters (RBJ cookbook) for shaping synthesized audio

use std::f32::consts::PI;

/// Lowest cutoff we accept (Hz)
const MIN_CUTOFF_HZ: f32 = 10.0;
/// Highest cutoff as a fraction of the sample rate (just under Nyquist)
const MAX_CUTOFF_FRACTION: f32 = 0.45;

/// Biquad filter coefficients, normalized so a0 == 1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

impl BiquadCoeffs {
    fn clamp_freq(freq: f32, sample_rate: f32) -> f32 {
        freq.clamp(MIN_CUTOFF_HZ, sample_rate * MAX_CUTOFF_FRACTION)
    }

    /// Second-order low-pass
    pub fn low_pass(freq: f32, q: f32, sample_rate: f32) -> Self {
        let w0 = 2.0 * PI * Self::clamp_freq(freq, sample_rate) / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q.max(0.01));

        let a0 = 1.0 + alpha;
        Self {
            b0: ((1.0 - cos_w0) / 2.0) / a0,
            b1: (1.0 - cos_w0) / a0,
            b2: ((1.0 - cos_w0) / 2.0) / a0,
            a1: (-2.0 * cos_w0) / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    /// Second-order high-pass
    pub fn high_pass(freq: f32, q: f32, sample_rate: f32) -> Self {
        let w0 = 2.0 * PI * Self::clamp_freq(freq, sample_rate) / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q.max(0.01));

        let a0 = 1.0 + alpha;
        Self {
            b0: ((1.0 + cos_w0) / 2.0) / a0,
            b1: (-(1.0 + cos_w0)) / a0,
            b2: ((1.0 + cos_w0) / 2.0) / a0,
            a1: (-2.0 * cos_w0) / a0,
            a2: (1.0 - alpha) / a0,
        }
    }
}

/// Mono biquad with its own delay line
#[derive(Debug, Clone)]
pub struct Biquad {
    coeffs: BiquadCoeffs,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    pub fn new(coeffs: BiquadCoeffs) -> Self {
        Self {
            coeffs,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Swap coefficients without clearing history (for sweeps)
    pub fn set_coeffs(&mut self, coeffs: BiquadCoeffs) {
        self.coeffs = coeffs;
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let c = &self.coeffs;
        let out = c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = out;
        out
    }

    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    /// Filter a whole buffer in place
    pub fn process_buffer(&mut self, samples: &mut [f32]) {
        for s in samples.iter_mut() {
            *s = self.process(*s);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44_100.0;

    fn sine(freq: f32, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f32 / SR).sin())
            .collect()
    }

    fn rms(x: &[f32]) -> f32 {
        (x.iter().map(|s| s * s).sum::<f32>() / x.len() as f32).sqrt()
    }

    #[test]
    fn test_low_pass_attenuates_highs() {
        let mut lp = Biquad::new(BiquadCoeffs::low_pass(400.0, 0.707, SR));
        let mut high = sine(8000.0, 4410);
        lp.process_buffer(&mut high);
        lp.reset();
        let mut low = sine(100.0, 4410);
        lp.process_buffer(&mut low);
        assert!(rms(&high[1000..]) < 0.05);
        assert!(rms(&low[1000..]) > 0.6);
    }

    #[test]
    fn test_high_pass_attenuates_lows() {
        let mut hp = Biquad::new(BiquadCoeffs::high_pass(2000.0, 0.707, SR));
        let mut low = sine(100.0, 4410);
        hp.process_buffer(&mut low);
        assert!(rms(&low[1000..]) < 0.05);
    }

    #[test]
    fn test_cutoff_is_clamped() {
        // Above Nyquist must still produce a stable filter
        let mut lp = Biquad::new(BiquadCoeffs::low_pass(100_000.0, 1.0, SR));
        let mut x = sine(1000.0, 2000);
        lp.process_buffer(&mut x);
        assert!(x.iter().all(|s| s.is_finite()));
    }
}
