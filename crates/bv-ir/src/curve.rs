//! Response curves mapping normalized progress to an output value.
//!
//! A `ResponseCurve` is a short piecewise function over progress
//! (0.0..=1.0 in practice, though any ascending times work). Each
//! breakpoint says how to interpolate from itself to the next one, so a
//! handful of points covers ramps, eases, flashes and stepped sequences.

use arrayvec::ArrayVec;
use core::f32::consts::FRAC_PI_2;

/// Maximum breakpoints per curve. A flash (rise, hold, fall) needs four;
/// anything denser is better expressed as several pulses.
pub const MAX_CURVE_POINTS: usize = 8;

/// A piecewise curve evaluated at normalized progress.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResponseCurve {
    /// Breakpoints sorted by ascending `time`.
    pub points: ArrayVec<CurvePoint, MAX_CURVE_POINTS>,
}

/// A breakpoint in a response curve.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurvePoint {
    /// Progress at which this point sits.
    pub time: f32,
    /// Value at this point.
    pub value: f32,
    /// How to interpolate FROM this point TO the next.
    #[cfg_attr(feature = "serde", serde(default = "CurveKind::linear"))]
    pub kind: CurveKind,
}

/// Interpolation curve between two breakpoints.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CurveKind {
    /// Hold this value until the next point.
    Step,
    /// Straight line to the next point.
    Linear,
    /// Sine quarter-wave: fast start, soft landing.
    SineQuarter,
    /// Exponential curve. 0.0 = linear, >0 = starts slow, <0 = starts fast.
    Exponential(f32),
}

impl CurveKind {
    #[cfg(feature = "serde")]
    fn linear() -> Self {
        CurveKind::Linear
    }
}

/// Interpolate between two values using the given curve at position `t` (0.0..1.0).
pub fn interpolate(curve: CurveKind, from: f32, to: f32, t: f32) -> f32 {
    let factor = match curve {
        CurveKind::Step => 0.0,
        CurveKind::Linear => t,
        CurveKind::SineQuarter => libm::sinf(t * FRAC_PI_2),
        CurveKind::Exponential(k) => {
            if k.abs() < 1e-6 {
                t
            } else {
                (libm::expf(k * t) - 1.0) / (libm::expf(k) - 1.0)
            }
        }
    };
    from + (to - from) * factor
}

impl ResponseCurve {
    /// Build a curve from breakpoints. Points are sorted by time; any
    /// beyond `MAX_CURVE_POINTS` are dropped.
    pub fn from_points(pts: &[CurvePoint]) -> Self {
        let mut points: ArrayVec<CurvePoint, MAX_CURVE_POINTS> =
            pts.iter().copied().take(MAX_CURVE_POINTS).collect();
        // Insertion sort: stable (coincident points keep their order) and alloc-free.
        for i in 1..points.len() {
            let mut j = i;
            while j > 0 && points[j - 1].time > points[j].time {
                points.swap(j - 1, j);
                j -= 1;
            }
        }
        Self { points }
    }

    /// A 0 → 1 ramp over the whole pulse using `kind`.
    pub fn ramp(kind: CurveKind) -> Self {
        Self::from_points(&[CurvePoint::new(0.0, 0.0, kind), CurvePoint::new(1.0, 1.0, CurveKind::Step)])
    }

    /// Rise to 1 at the midpoint and fall back to 0 by the end.
    pub fn flash() -> Self {
        Self::from_points(&[
            CurvePoint::new(0.0, 0.0, CurveKind::SineQuarter),
            CurvePoint::new(0.5, 1.0, CurveKind::Linear),
            CurvePoint::new(1.0, 0.0, CurveKind::Step),
        ])
    }

    /// Evaluate the curve at `t`. Outside the breakpoint span the nearest
    /// endpoint value is held; an empty curve is the identity.
    pub fn evaluate(&self, t: f32) -> f32 {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return t,
        };
        if t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        for pair in self.points.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if t < b.time {
                let span = b.time - a.time;
                if span <= 0.0 {
                    return b.value;
                }
                return interpolate(a.kind, a.value, b.value, (t - a.time) / span);
            }
        }
        last.value
    }

    /// Number of breakpoints.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the curve has no breakpoints.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl CurvePoint {
    /// Create a new breakpoint.
    pub const fn new(time: f32, value: f32, kind: CurveKind) -> Self {
        Self { time, value, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolate_step_holds_value() {
        assert_eq!(interpolate(CurveKind::Step, 0.0, 10.0, 0.0), 0.0);
        assert_eq!(interpolate(CurveKind::Step, 0.0, 10.0, 0.99), 0.0);
    }

    #[test]
    fn interpolate_linear_midpoint() {
        assert_eq!(interpolate(CurveKind::Linear, 0.0, 10.0, 0.5), 5.0);
        assert_eq!(interpolate(CurveKind::Linear, 10.0, -10.0, 0.5), 0.0);
    }

    #[test]
    fn interpolate_sine_quarter_midpoint_above_linear() {
        let sine_mid = interpolate(CurveKind::SineQuarter, 0.0, 10.0, 0.5);
        assert!(sine_mid > 5.0);
        let end = interpolate(CurveKind::SineQuarter, 0.0, 10.0, 1.0);
        assert!((end - 10.0).abs() < 0.01);
    }

    #[test]
    fn interpolate_exponential_signs() {
        let slow = interpolate(CurveKind::Exponential(3.0), 0.0, 10.0, 0.5);
        let fast = interpolate(CurveKind::Exponential(-3.0), 0.0, 10.0, 0.5);
        let flat = interpolate(CurveKind::Exponential(0.0), 0.0, 10.0, 0.5);
        assert!(slow < 5.0, "positive k should start slow, got {}", slow);
        assert!(fast > 5.0, "negative k should start fast, got {}", fast);
        assert!((flat - 5.0).abs() < 0.01);
    }

    #[test]
    fn empty_curve_is_identity() {
        let curve = ResponseCurve::default();
        assert_eq!(curve.evaluate(0.0), 0.0);
        assert_eq!(curve.evaluate(0.37), 0.37);
        assert_eq!(curve.evaluate(1.0), 1.0);
    }

    #[test]
    fn linear_ramp_tracks_progress() {
        let curve = ResponseCurve::ramp(CurveKind::Linear);
        assert_eq!(curve.evaluate(0.25), 0.25);
        assert_eq!(curve.evaluate(1.0), 1.0);
    }

    #[test]
    fn evaluate_clamps_outside_span() {
        let curve = ResponseCurve::from_points(&[
            CurvePoint::new(0.2, 3.0, CurveKind::Linear),
            CurvePoint::new(0.8, 7.0, CurveKind::Step),
        ]);
        assert_eq!(curve.evaluate(0.0), 3.0);
        assert_eq!(curve.evaluate(1.0), 7.0);
        assert!((curve.evaluate(0.5) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn flash_peaks_in_the_middle() {
        let curve = ResponseCurve::flash();
        assert_eq!(curve.evaluate(0.0), 0.0);
        assert!((curve.evaluate(0.5) - 1.0).abs() < 1e-6);
        assert_eq!(curve.evaluate(1.0), 0.0);
        assert!(curve.evaluate(0.75) > 0.0 && curve.evaluate(0.75) < 1.0);
    }

    #[test]
    fn from_points_sorts_and_truncates() {
        let mut pts = [CurvePoint::new(0.0, 0.0, CurveKind::Linear); 10];
        for (i, p) in pts.iter_mut().enumerate() {
            p.time = 1.0 - i as f32 * 0.1;
        }
        let curve = ResponseCurve::from_points(&pts);
        assert_eq!(curve.len(), MAX_CURVE_POINTS);
        assert!(curve.points.windows(2).all(|w| w[0].time <= w[1].time));
    }

    #[test]
    fn coincident_points_jump() {
        let curve = ResponseCurve::from_points(&[
            CurvePoint::new(0.0, 0.0, CurveKind::Linear),
            CurvePoint::new(0.5, 0.5, CurveKind::Linear),
            CurvePoint::new(0.5, 2.0, CurveKind::Linear),
            CurvePoint::new(1.0, 2.0, CurveKind::Step),
        ]);
        assert!((curve.evaluate(0.6) - 2.0).abs() < 1e-6);
    }
}
