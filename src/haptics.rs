//! Haptic feedback collaborators
//!
//! The simulation only names an impact strength; drivers turn that into a
//! device pattern. Failures come back as `Err` and the session logs and
//! drops them.

use crate::error::Result;
pub use crate::sim::HapticImpact;

impl HapticImpact {
    /// Vibration pattern in milliseconds (on, off, on, ...)
    pub fn pattern_ms(self) -> &'static [u32] {
        match self {
            HapticImpact::Light => &[10],
            HapticImpact::Medium => &[25],
            HapticImpact::Heavy => &[60],
            HapticImpact::Success => &[15, 40, 15],
        }
    }
}

/// Something that can buzz
pub trait HapticDriver {
    fn impact(&mut self, impact: HapticImpact) -> Result<()>;
}

/// Does nothing (desktop, tests, haptics disabled)
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHaptics;

impl HapticDriver for NullHaptics {
    fn impact(&mut self, _impact: HapticImpact) -> Result<()> {
        Ok(())
    }
}

/// Records impacts to the log
#[derive(Debug, Default, Clone)]
pub struct LogHaptics {
    count: u64,
}

impl LogHaptics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Impacts seen so far
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl HapticDriver for LogHaptics {
    fn impact(&mut self, impact: HapticImpact) -> Result<()> {
        self.count += 1;
        log::debug!("Haptic {:?} {:?}", impact, impact.pattern_ms());
        Ok(())
    }
}

/// `navigator.vibrate` where the browser has it
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct WebHaptics;

#[cfg(target_arch = "wasm32")]
impl HapticDriver for WebHaptics {
    fn impact(&mut self, impact: HapticImpact) -> Result<()> {
        let window = web_sys::window()
            .ok_or_else(|| crate::Error::Haptics("no window".to_string()))?;
        let pattern = js_sys::Array::new();
        for ms in impact.pattern_ms() {
            pattern.push(&wasm_bindgen::JsValue::from(*ms));
        }
        if window.navigator().vibrate_with_pattern(&pattern) {
            Ok(())
        } else {
            Err(crate::Error::Haptics("vibrate rejected".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_nonempty() {
        for impact in [
            HapticImpact::Light,
            HapticImpact::Medium,
            HapticImpact::Heavy,
            HapticImpact::Success,
        ] {
            assert!(!impact.pattern_ms().is_empty());
        }
        assert!(HapticImpact::Heavy.pattern_ms()[0] > HapticImpact::Light.pattern_ms()[0]);
    }

    #[test]
    fn test_log_haptics_counts() {
        let mut driver = LogHaptics::new();
        driver.impact(HapticImpact::Light).unwrap();
        driver.impact(HapticImpact::Success).unwrap();
        assert_eq!(driver.count(), 2);
        assert!(NullHaptics.impact(HapticImpact::Heavy).is_ok());
    }
}
