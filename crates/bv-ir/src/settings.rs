//! Static configuration of a pulse.

use arrayvec::ArrayString;
use core::fmt;

use crate::curve::ResponseCurve;
use crate::payload::PulsePayload;

/// Maximum length of a pulse label. Longer labels are truncated.
pub const MAX_LABEL_LEN: usize = 32;

/// Identity of a pulse on its owner: `(index, index_filter)`.
///
/// `index_filter` groups related pulses (e.g. all cues of one lane) so
/// they can be cleared together or spared from a bulk removal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PulseKey {
    pub index: i32,
    pub index_filter: i32,
}

/// Output range the progress (or curve output) is remapped into.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutRange {
    pub min: f32,
    pub max: f32,
}

impl OutRange {
    /// The identity range [0, 1].
    pub const UNIT: OutRange = OutRange { min: 0.0, max: 1.0 };

    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Whether this is exactly [0, 1], in which case no remap is applied.
    pub fn is_unit(&self) -> bool {
        self.min == 0.0 && self.max == 1.0
    }

    /// Linear remap of `t` into [min, max]. `t` is not clamped.
    pub fn lerp(&self, t: f32) -> f32 {
        self.min + (self.max - self.min) * t
    }
}

impl Default for OutRange {
    fn default() -> Self {
        Self::UNIT
    }
}

/// Settings of a single pulse, fixed when it is registered.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PulseSettings {
    /// Display label, only used for diagnostics.
    pub label: ArrayString<MAX_LABEL_LEN>,
    /// Identifier of the pulse on its owner.
    pub index: i32,
    /// Group identifier, matched together with `index`.
    pub index_filter: i32,
    /// When false the pulse is a pure timing event: no value is computed.
    pub use_value: bool,
    /// Context forwarded to the owner.
    pub payload: PulsePayload,
    /// Optional response curve; overrides the plain range remap.
    pub curve: Option<ResponseCurve>,
    /// Range the output is remapped into. [0, 1] means "no remap".
    pub out_range: OutRange,
    /// Exponential smoothing rate of the output value (per second).
    pub interp_speed: f32,
}

impl Default for PulseSettings {
    fn default() -> Self {
        Self {
            label: ArrayString::new(),
            index: 0,
            index_filter: 0,
            use_value: true,
            payload: PulsePayload::default(),
            curve: None,
            out_range: OutRange::UNIT,
            interp_speed: 15.0,
        }
    }
}

impl PulseSettings {
    /// Create settings with a label and identity key; everything else default.
    pub fn new(label: &str, index: i32, index_filter: i32) -> Self {
        let mut settings = Self { index, index_filter, ..Self::default() };
        settings.set_label(label);
        settings
    }

    /// Replace the label, truncating on a char boundary if it is too long.
    pub fn set_label(&mut self, label: &str) {
        self.label.clear();
        for c in label.chars() {
            if self.label.try_push(c).is_err() {
                break;
            }
        }
    }

    /// The identity key of this pulse.
    pub fn key(&self) -> PulseKey {
        PulseKey { index: self.index, index_filter: self.index_filter }
    }

    pub fn with_curve(mut self, curve: ResponseCurve) -> Self {
        self.curve = Some(curve);
        self
    }

    pub fn with_range(mut self, min: f32, max: f32) -> Self {
        self.out_range = OutRange::new(min, max);
        self
    }

    pub fn with_speed(mut self, interp_speed: f32) -> Self {
        self.interp_speed = interp_speed;
        self
    }

    pub fn with_payload(mut self, payload: PulsePayload) -> Self {
        self.payload = payload;
        self
    }

    /// Mark the pulse as a timing-only event.
    pub fn without_value(mut self) -> Self {
        self.use_value = false;
        self
    }
}

impl fmt::Display for PulseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Index: {} IndexFilter: {}", self.label, self.index, self.index_filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_a_plain_unit_pulse() {
        let s = PulseSettings::default();
        assert!(s.use_value);
        assert!(s.curve.is_none());
        assert!(s.out_range.is_unit());
        assert_eq!(s.interp_speed, 15.0);
    }

    #[test]
    fn long_labels_are_truncated() {
        let long = "a-very-long-label-that-does-not-fit-in-thirty-two";
        let s = PulseSettings::new(long, 0, 0);
        assert_eq!(s.label.len(), MAX_LABEL_LEN);
        assert!(long.starts_with(s.label.as_str()));
    }

    #[test]
    fn key_pairs_index_and_filter() {
        let s = PulseSettings::new("kick", 3, 7);
        assert_eq!(s.key(), PulseKey { index: 3, index_filter: 7 });
    }

    #[test]
    fn range_lerp() {
        let r = OutRange::new(10.0, 20.0);
        assert!(!r.is_unit());
        assert_eq!(r.lerp(0.0), 10.0);
        assert_eq!(r.lerp(0.5), 15.0);
        assert_eq!(r.lerp(1.0), 20.0);
    }

    #[test]
    fn display_lists_identity() {
        let s = PulseSettings::new("snare", 1, 2);
        assert_eq!(s.to_string(), "snare Index: 1 IndexFilter: 2");
    }
}
