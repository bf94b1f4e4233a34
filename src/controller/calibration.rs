//! # Calibration Module
//!
//! Normalizes raw controller axes into sample ranges and applies deadzones.
//!
//! ## Deadzone
//!
//! A deadzone eliminates small stick movements near center to prevent drift.
//! Values within the deadzone are mapped to exactly 0.0, while values outside
//! are scaled to use the full range.
//!
//! ## Raw Ranges
//!
//! | Input | Raw range | Normalized |
//! |-------|-----------|------------|
//! | Stick axis | -32768 to 32767 (i16) | -1.0 to 1.0 |
//! | Trigger | 0 to 255 (u8) | 0.0 to 1.0 |
//! | evdev axis | absinfo `minimum..=maximum` | either of the above |
//!
//! ## Usage
//!
//! ```
//! use padlink::controller::calibration::{normalize_stick, normalize_trigger, Calibration};
//!
//! let cal = Calibration::new(0.05, 0.0);
//!
//! // Near center (within deadzone)
//! assert_eq!(normalize_stick(900, &cal), 0.0);
//!
//! // Full deflection
//! assert!((normalize_stick(i16::MAX, &cal) - 1.0).abs() < 1e-9);
//! assert_eq!(normalize_trigger(255, &cal), 1.0);
//! ```

use super::sample::{STICK_MAX, STICK_MIN, TRIGGER_MAX, TRIGGER_MIN};

/// Largest deadzone accepted for either sticks or triggers.
pub const MAX_DEADZONE: f64 = 0.25;

/// Deadzone settings applied to already-normalized axis values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// Stick deadzone as a fraction of half-travel (0.0 to 0.25).
    stick_deadzone: f64,
    /// Trigger deadzone as a fraction of travel (0.0 to 0.25).
    trigger_deadzone: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            stick_deadzone: 0.05,
            trigger_deadzone: 0.0,
        }
    }
}

impl Calibration {
    /// Creates a calibration. Values outside 0.0..=0.25 are clamped.
    #[must_use]
    pub fn new(stick_deadzone: f64, trigger_deadzone: f64) -> Self {
        Self {
            stick_deadzone: clamp_deadzone(stick_deadzone),
            trigger_deadzone: clamp_deadzone(trigger_deadzone),
        }
    }

    /// Creates a calibration with no deadzones.
    #[must_use]
    pub fn linear() -> Self {
        Self {
            stick_deadzone: 0.0,
            trigger_deadzone: 0.0,
        }
    }

    #[must_use]
    pub fn stick_deadzone(&self) -> f64 {
        self.stick_deadzone
    }

    #[must_use]
    pub fn trigger_deadzone(&self) -> f64 {
        self.trigger_deadzone
    }

    /// Applies the stick deadzone to a value in -1.0..=1.0.
    ///
    /// Input outside the range is clamped first; non-finite input yields 0.0.
    ///
    /// ```
    /// use padlink::controller::calibration::Calibration;
    ///
    /// let cal = Calibration::new(0.1, 0.0);
    /// assert_eq!(cal.apply_stick(0.05), 0.0);
    /// assert_eq!(cal.apply_stick(-0.1), 0.0);
    /// assert!((cal.apply_stick(-1.0) - (-1.0)).abs() < 1e-9);
    /// ```
    #[must_use]
    pub fn apply_stick(&self, input: f64) -> f64 {
        if !input.is_finite() {
            return 0.0;
        }
        let clamped = input.clamp(STICK_MIN, STICK_MAX);
        let magnitude = apply_deadzone(clamped.abs(), self.stick_deadzone);
        if magnitude == 0.0 {
            0.0
        } else {
            magnitude.copysign(clamped)
        }
    }

    /// Applies the trigger deadzone to a value in 0.0..=1.0.
    #[must_use]
    pub fn apply_trigger(&self, input: f64) -> f64 {
        if !input.is_finite() {
            return 0.0;
        }
        apply_deadzone(input.clamp(TRIGGER_MIN, TRIGGER_MAX), self.trigger_deadzone)
    }
}

fn clamp_deadzone(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, MAX_DEADZONE)
    } else {
        0.0
    }
}

/// Maps values within `deadzone` to 0, and scales the remaining range to 0..1.
#[inline]
fn apply_deadzone(magnitude: f64, deadzone: f64) -> f64 {
    if magnitude <= deadzone {
        0.0
    } else {
        ((magnitude - deadzone) / (1.0 - deadzone)).min(1.0)
    }
}

/// Inclusive raw range reported by an input device for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    pub min: i32,
    pub max: i32,
}

impl AxisRange {
    /// Signed 16-bit stick axis (Xbox controllers, gilrs raw scale).
    pub const STICK_I16: AxisRange = AxisRange {
        min: i16::MIN as i32,
        max: i16::MAX as i32,
    };

    /// Single-byte trigger.
    pub const TRIGGER_U8: AxisRange = AxisRange { min: 0, max: 255 };

    #[must_use]
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Maps `raw` onto 0.0..=1.0. Out-of-range input is clamped.
    ///
    /// A degenerate range (`max <= min`) always yields 0.0.
    #[must_use]
    pub fn to_unit(&self, raw: i32) -> f64 {
        if self.max <= self.min {
            return 0.0;
        }
        let span = f64::from(self.max) - f64::from(self.min);
        let offset = f64::from(raw.clamp(self.min, self.max)) - f64::from(self.min);
        offset / span
    }

    /// Maps `raw` onto -1.0..=1.0 with the range midpoint at 0.0.
    #[must_use]
    pub fn to_signed(&self, raw: i32) -> f64 {
        if self.max <= self.min {
            return 0.0;
        }
        (self.to_unit(raw) * 2.0 - 1.0).clamp(STICK_MIN, STICK_MAX)
    }
}

/// Converts a raw signed 16-bit stick axis to a calibrated value in -1.0..=1.0.
#[must_use]
pub fn normalize_stick(raw: i16, calibration: &Calibration) -> f64 {
    calibration.apply_stick(AxisRange::STICK_I16.to_signed(i32::from(raw)))
}

/// Converts a raw trigger byte to a calibrated value in 0.0..=1.0.
#[must_use]
pub fn normalize_trigger(raw: u8, calibration: &Calibration) -> f64 {
    calibration.apply_trigger(AxisRange::TRIGGER_U8.to_unit(i32::from(raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Calibration Tests ====================

    #[test]
    fn test_calibration_new() {
        let cal = Calibration::new(0.05, 0.1);
        assert!((cal.stick_deadzone() - 0.05).abs() < 1e-9);
        assert!((cal.trigger_deadzone() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_calibration_default() {
        let cal = Calibration::default();
        assert!((cal.stick_deadzone() - 0.05).abs() < 1e-9);
        assert_eq!(cal.trigger_deadzone(), 0.0);
    }

    #[test]
    fn test_calibration_clamps_deadzone() {
        let cal = Calibration::new(0.5, -0.1);
        assert_eq!(cal.stick_deadzone(), MAX_DEADZONE);
        assert_eq!(cal.trigger_deadzone(), 0.0);

        let cal = Calibration::new(f64::NAN, f64::INFINITY);
        assert_eq!(cal.stick_deadzone(), 0.0);
        assert_eq!(cal.trigger_deadzone(), 0.0);
    }

    // ==================== Deadzone Tests ====================

    #[test]
    fn test_deadzone_within_zone() {
        let cal = Calibration::new(0.1, 0.0);
        assert_eq!(cal.apply_stick(0.05), 0.0);
        assert_eq!(cal.apply_stick(-0.05), 0.0);
        assert_eq!(cal.apply_stick(0.1), 0.0);
        assert_eq!(cal.apply_stick(-0.1), 0.0);
    }

    #[test]
    fn test_deadzone_yields_positive_zero() {
        let cal = Calibration::new(0.1, 0.0);
        let value = cal.apply_stick(-0.05);
        assert!(value == 0.0 && value.is_sign_positive());
    }

    #[test]
    fn test_deadzone_scaling() {
        let cal = Calibration::new(0.1, 0.0);

        // Halfway between deadzone and max
        assert!((cal.apply_stick(0.55) - 0.5).abs() < 1e-9);
        assert!((cal.apply_stick(-0.55) - (-0.5)).abs() < 1e-9);
        assert!((cal.apply_stick(1.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_stick_clamps_out_of_range() {
        let cal = Calibration::linear();
        assert_eq!(cal.apply_stick(1.8), 1.0);
        assert_eq!(cal.apply_stick(-4.0), -1.0);
        assert_eq!(cal.apply_stick(f64::NAN), 0.0);
    }

    #[test]
    fn test_apply_trigger_deadzone() {
        let cal = Calibration::new(0.05, 0.1);

        assert_eq!(cal.apply_trigger(0.05), 0.0);
        assert_eq!(cal.apply_trigger(0.10), 0.0);
        assert!((cal.apply_trigger(1.0) - 1.0).abs() < 1e-9);
        assert_eq!(cal.apply_trigger(-0.5), 0.0);
        assert_eq!(cal.apply_trigger(3.0), 1.0);
    }

    // ==================== AxisRange Tests ====================

    #[test]
    fn test_axis_range_unit() {
        let range = AxisRange::new(0, 1023);
        assert_eq!(range.to_unit(0), 0.0);
        assert_eq!(range.to_unit(1023), 1.0);
        assert_eq!(range.to_unit(2000), 1.0);
        assert_eq!(range.to_unit(-7), 0.0);
    }

    #[test]
    fn test_axis_range_signed() {
        let range = AxisRange::new(0, 255);
        assert_eq!(range.to_signed(0), -1.0);
        assert_eq!(range.to_signed(255), 1.0);
        assert!(range.to_signed(128).abs() < 0.01);
    }

    #[test]
    fn test_axis_range_degenerate() {
        let range = AxisRange::new(10, 10);
        assert_eq!(range.to_unit(10), 0.0);
        assert_eq!(range.to_signed(10), 0.0);
    }

    // ==================== Normalization Tests ====================

    #[test]
    fn test_normalize_trigger_range_and_monotonic() {
        for deadzone in [0.0, 0.1, 0.25] {
            let cal = Calibration::new(0.05, deadzone);
            let mut previous = normalize_trigger(0, &cal);
            assert_eq!(previous, 0.0);

            for raw in 0..=u8::MAX {
                let value = normalize_trigger(raw, &cal);
                assert!((0.0..=1.0).contains(&value), "raw {} -> {}", raw, value);
                assert!(value >= previous, "not monotonic at raw {}", raw);
                previous = value;
            }
            assert_eq!(previous, 1.0);
        }
    }

    #[test]
    fn test_normalize_stick_range() {
        let cal = Calibration::default();
        for raw in (i16::MIN..=i16::MAX).step_by(97) {
            let value = normalize_stick(raw, &cal);
            assert!((-1.0..=1.0).contains(&value), "raw {} -> {}", raw, value);
        }
        assert_eq!(normalize_stick(i16::MIN, &cal), -1.0);
        assert_eq!(normalize_stick(i16::MAX, &cal), 1.0);
    }

    #[test]
    fn test_normalize_stick_deadzone_is_exact_zero() {
        let cal = Calibration::new(0.05, 0.0);
        // 5% of half-travel is ~1638 raw units around center
        for raw in -1500..=1500 {
            assert_eq!(normalize_stick(raw, &cal), 0.0, "raw {}", raw);
        }
    }

    #[test]
    fn test_normalize_stick_idempotent() {
        let cal = Calibration::default();
        for raw in [i16::MIN, -20000, -100, 0, 100, 12345, i16::MAX] {
            assert_eq!(normalize_stick(raw, &cal), normalize_stick(raw, &cal));
        }
    }

    #[test]
    fn test_normalize_stick_symmetry() {
        let cal = Calibration::linear();
        let positive = normalize_stick(16384, &cal);
        let negative = normalize_stick(-16385, &cal);
        assert!((positive + negative).abs() < 1e-9);
    }
}
