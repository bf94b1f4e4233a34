//! # gilrs Backend
//!
//! Cross-platform gamepad input through the `gilrs` library. Only built with
//! the `gilrs` cargo feature.
//!
//! `Gilrs` is not `Send`, so this backend must be opened on the thread that
//! polls it. The sampler takes care of that.
//!
//! gilrs reports stick Y as positive-up; it is inverted here so that up is
//! negative, matching the evdev backend and the wire format.

use gilrs::{Axis, Button as PadButton, Event, EventType, GamepadId, Gilrs};
use tracing::{debug, info, warn};

use super::backend::InputBackend;
use super::calibration::Calibration;
use super::sample::{Button, ControllerState, Stick, Triggers};
use crate::error::{PadlinkError, Result};

const BACKEND: &str = "gilrs";

/// Raw state accumulated from gilrs events, in gilrs' own scale.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GilrsPad {
    pub left_x: f32,
    pub left_y: f32,
    pub right_x: f32,
    pub right_y: f32,
    pub left_trigger: f32,
    pub right_trigger: f32,
    pub dpad_x: f32,
    pub dpad_y: f32,
    pub buttons: super::sample::Buttons,
}

/// Maps a gilrs digital button onto a sample button.
///
/// `LeftTrigger2`/`RightTrigger2` are analog triggers and handled separately.
fn map_button(button: PadButton) -> Option<Button> {
    match button {
        PadButton::South => Some(Button::A),
        PadButton::East => Some(Button::B),
        PadButton::West => Some(Button::X),
        PadButton::North => Some(Button::Y),
        PadButton::LeftTrigger => Some(Button::LeftBumper),
        PadButton::RightTrigger => Some(Button::RightBumper),
        PadButton::Start => Some(Button::Start),
        PadButton::Select => Some(Button::Back),
        PadButton::Mode => Some(Button::Guide),
        PadButton::LeftThumb => Some(Button::LeftStickClick),
        PadButton::RightThumb => Some(Button::RightStickClick),
        PadButton::DPadUp => Some(Button::DPadUp),
        PadButton::DPadDown => Some(Button::DPadDown),
        PadButton::DPadLeft => Some(Button::DPadLeft),
        PadButton::DPadRight => Some(Button::DPadRight),
        _ => None,
    }
}

impl GilrsPad {
    /// Records a digital press or release. Returns true if it was mapped.
    pub fn apply_button(&mut self, button: PadButton, pressed: bool) -> bool {
        match button {
            PadButton::LeftTrigger2 => {
                self.left_trigger = if pressed { 1.0 } else { 0.0 };
                true
            }
            PadButton::RightTrigger2 => {
                self.right_trigger = if pressed { 1.0 } else { 0.0 };
                true
            }
            other => match map_button(other) {
                Some(mapped) => {
                    self.buttons.set(mapped, pressed);
                    true
                }
                None => false,
            },
        }
    }

    /// Records an analog button value (0.0..=1.0).
    pub fn apply_button_value(&mut self, button: PadButton, value: f32) -> bool {
        match button {
            PadButton::LeftTrigger2 => {
                self.left_trigger = value;
                true
            }
            PadButton::RightTrigger2 => {
                self.right_trigger = value;
                true
            }
            // Digital buttons also report values; treat half travel as pressed
            other => self.apply_button(other, value >= 0.5),
        }
    }

    /// Records an axis value (-1.0..=1.0, Y positive-up).
    pub fn apply_axis(&mut self, axis: Axis, value: f32) -> bool {
        match axis {
            Axis::LeftStickX => self.left_x = value,
            Axis::LeftStickY => self.left_y = value,
            Axis::RightStickX => self.right_x = value,
            Axis::RightStickY => self.right_y = value,
            // Some mappings expose triggers as -1..1 Z axes
            Axis::LeftZ => self.left_trigger = (value + 1.0) / 2.0,
            Axis::RightZ => self.right_trigger = (value + 1.0) / 2.0,
            Axis::DPadX => self.dpad_x = value,
            Axis::DPadY => self.dpad_y = value,
            _ => return false,
        }
        true
    }

    /// Converts to sample ranges with `calibration` applied.
    #[must_use]
    pub fn normalize(&self, calibration: &Calibration) -> ControllerState {
        let stick = |v: f32| calibration.apply_stick(f64::from(v));
        let trigger = |v: f32| calibration.apply_trigger(f64::from(v));
        // Keeps a centered stick at +0.0
        let inverted = |v: f32| 0.0 - stick(v);

        let mut buttons = self.buttons;
        buttons.dpad_left |= self.dpad_x < -0.5;
        buttons.dpad_right |= self.dpad_x > 0.5;
        buttons.dpad_up |= self.dpad_y > 0.5;
        buttons.dpad_down |= self.dpad_y < -0.5;

        ControllerState {
            left_stick: Stick::new(stick(self.left_x), inverted(self.left_y)),
            right_stick: Stick::new(stick(self.right_x), inverted(self.right_y)),
            triggers: Triggers {
                left: trigger(self.left_trigger),
                right: trigger(self.right_trigger),
            },
            buttons,
        }
        .clamped()
    }
}

/// Gamepad input through gilrs.
pub struct GilrsBackend {
    gilrs: Gilrs,
    active: Option<GamepadId>,
    pad: GilrsPad,
}

impl std::fmt::Debug for GilrsBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GilrsBackend")
            .field("active", &self.active)
            .field("pad", &self.pad)
            .finish_non_exhaustive()
    }
}

impl GilrsBackend {
    /// Initializes gilrs and selects the first connected gamepad.
    ///
    /// # Errors
    ///
    /// Returns `Backend` if gilrs cannot start on this platform or no gamepad
    /// is connected.
    pub fn open() -> Result<Self> {
        let gilrs = Gilrs::new().map_err(|e| PadlinkError::Backend {
            backend: BACKEND,
            reason: e.to_string(),
        })?;

        let active = match gilrs.gamepads().next() {
            Some((id, gamepad)) => {
                info!("Using gamepad '{}' ({})", gamepad.name(), id);
                id
            }
            None => {
                return Err(PadlinkError::Backend {
                    backend: BACKEND,
                    reason: "no gamepad connected".to_string(),
                })
            }
        };

        Ok(Self {
            gilrs,
            active: Some(active),
            pad: GilrsPad::default(),
        })
    }

    fn handle(&mut self, id: GamepadId, event: EventType) -> bool {
        // No reconnection: once the active pad is gone everything is ignored
        if self.active != Some(id) {
            return false;
        }

        match event {
            EventType::ButtonPressed(button, _) => self.pad.apply_button(button, true),
            EventType::ButtonReleased(button, _) => self.pad.apply_button(button, false),
            EventType::ButtonChanged(button, value, _) => {
                self.pad.apply_button_value(button, value)
            }
            EventType::AxisChanged(axis, value, _) => self.pad.apply_axis(axis, value),
            EventType::Disconnected => {
                warn!("Gamepad {} disconnected, holding neutral state", id);
                self.active = None;
                self.pad = GilrsPad::default();
                true
            }
            _ => {
                debug!("Unhandled gilrs event: {:?}", event);
                false
            }
        }
    }
}

impl InputBackend for GilrsBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn poll(&mut self) -> Result<bool> {
        let mut changed = false;
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            changed |= self.handle(id, event);
        }
        Ok(changed)
    }

    fn normalize(&self, calibration: &Calibration) -> ControllerState {
        self.pad.normalize(calibration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== GilrsPad Tests ====================

    #[test]
    fn test_default_is_neutral() {
        let pad = GilrsPad::default();
        assert_eq!(pad.normalize(&Calibration::default()), ControllerState::neutral());
    }

    #[test]
    fn test_face_buttons() {
        let mut pad = GilrsPad::default();
        assert!(pad.apply_button(PadButton::South, true));
        assert!(pad.apply_button(PadButton::North, true));

        let state = pad.normalize(&Calibration::default());
        assert!(state.buttons.a);
        assert!(state.buttons.y);
        assert!(!state.buttons.x);
    }

    #[test]
    fn test_bumpers_are_first_triggers() {
        let mut pad = GilrsPad::default();
        pad.apply_button(PadButton::LeftTrigger, true);
        pad.apply_button(PadButton::RightTrigger, true);

        let state = pad.normalize(&Calibration::default());
        assert!(state.buttons.lb);
        assert!(state.buttons.rb);
        assert_eq!(state.triggers.left, 0.0);
    }

    #[test]
    fn test_analog_triggers() {
        let mut pad = GilrsPad::default();
        pad.apply_button_value(PadButton::RightTrigger2, 1.0);

        let state = pad.normalize(&Calibration::default());
        assert_eq!(state.triggers.right, 1.0);
        assert!(!state.buttons.rb);
    }

    #[test]
    fn test_z_axis_triggers() {
        let mut pad = GilrsPad::default();
        pad.apply_axis(Axis::LeftZ, 1.0);
        pad.apply_axis(Axis::RightZ, -1.0);

        let state = pad.normalize(&Calibration::default());
        assert_eq!(state.triggers.left, 1.0);
        assert_eq!(state.triggers.right, 0.0);
    }

    #[test]
    fn test_y_axis_inverted() {
        let mut pad = GilrsPad::default();
        pad.apply_axis(Axis::LeftStickY, 1.0);
        pad.apply_axis(Axis::RightStickX, -1.0);

        let state = pad.normalize(&Calibration::default());
        assert_eq!(state.left_stick.y, -1.0);
        assert_eq!(state.right_stick.x, -1.0);
    }

    #[test]
    fn test_stick_deadzone_applied() {
        let mut pad = GilrsPad::default();
        pad.apply_axis(Axis::LeftStickX, 0.02);
        assert_eq!(pad.normalize(&Calibration::default()).left_stick.x, 0.0);
    }

    #[test]
    fn test_dpad_axes() {
        let mut pad = GilrsPad::default();
        pad.apply_axis(Axis::DPadX, 1.0);
        pad.apply_axis(Axis::DPadY, 1.0);

        let state = pad.normalize(&Calibration::default());
        assert!(state.buttons.dpad_right);
        assert!(state.buttons.dpad_up);
    }

    #[test]
    fn test_unmapped_inputs_ignored() {
        let mut pad = GilrsPad::default();
        assert!(!pad.apply_button(PadButton::C, true));
        assert!(!pad.apply_axis(Axis::Unknown, 0.7));
        assert_eq!(pad, GilrsPad::default());
    }
}
