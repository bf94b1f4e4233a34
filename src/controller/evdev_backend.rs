//! # evdev Backend
//!
//! Reads a gamepad through the Linux evdev interface.
//!
//! ## Controller Detection
//!
//! Every `/dev/input/event*` node is opened in sorted order. The first device
//! that reports both `BTN_SOUTH` and `ABS_X` is treated as a gamepad.
//!
//! ## Polling
//!
//! Instead of reading the event queue (which blocks), each poll asks the
//! kernel for the current key and axis state with one ioctl each. Axis
//! ranges come from the device's own `absinfo`, so pads reporting 0..255
//! and pads reporting -32768..32767 both scale correctly.
//!
//! ## Axis Codes (xpad layout)
//!
//! | Input | evdev Code |
//! |-------|------------|
//! | Left stick | ABS_X, ABS_Y |
//! | Right stick | ABS_RX, ABS_RY |
//! | Left / right trigger | ABS_Z, ABS_RZ |
//! | D-Pad | ABS_HAT0X, ABS_HAT0Y or BTN_DPAD_* |

use std::path::Path;

use evdev::{AbsoluteAxisType, AttributeSetRef, Device, Key};
use tracing::{debug, info};

use super::backend::InputBackend;
use super::calibration::{AxisRange, Calibration};
use super::sample::{Button, Buttons, ControllerState, Stick, Triggers};
use crate::error::{PadlinkError, Result};

const BACKEND: &str = "evdev";

/// Key codes mapped onto sample buttons.
const KEY_MAP: [(Key, Button); 15] = [
    (Key::BTN_SOUTH, Button::A),
    (Key::BTN_EAST, Button::B),
    (Key::BTN_NORTH, Button::X),
    (Key::BTN_WEST, Button::Y),
    (Key::BTN_TL, Button::LeftBumper),
    (Key::BTN_TR, Button::RightBumper),
    (Key::BTN_START, Button::Start),
    (Key::BTN_SELECT, Button::Back),
    (Key::BTN_MODE, Button::Guide),
    (Key::BTN_THUMBL, Button::LeftStickClick),
    (Key::BTN_THUMBR, Button::RightStickClick),
    (Key::BTN_DPAD_UP, Button::DPadUp),
    (Key::BTN_DPAD_DOWN, Button::DPadDown),
    (Key::BTN_DPAD_LEFT, Button::DPadLeft),
    (Key::BTN_DPAD_RIGHT, Button::DPadRight),
];

/// One axis value together with the range the device declared for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisReading {
    pub value: i32,
    pub range: AxisRange,
}

impl AxisReading {
    #[must_use]
    pub fn new(value: i32, min: i32, max: i32) -> Self {
        Self {
            value,
            range: AxisRange::new(min, max),
        }
    }
}

/// Raw pad state as last read from the kernel.
///
/// `None` axes are either unsupported by the device or reset to neutral.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPad {
    pub left_x: Option<AxisReading>,
    pub left_y: Option<AxisReading>,
    pub right_x: Option<AxisReading>,
    pub right_y: Option<AxisReading>,
    pub left_trigger: Option<AxisReading>,
    pub right_trigger: Option<AxisReading>,
    /// -1 = left, 1 = right
    pub hat_x: i32,
    /// -1 = up, 1 = down
    pub hat_y: i32,
    pub buttons: Buttons,
}

impl RawPad {
    /// Records the pressed state of every mapped key.
    pub fn apply_keys(&mut self, keys: &AttributeSetRef<Key>) {
        for (key, button) in KEY_MAP {
            self.buttons.set(button, keys.contains(key));
        }
    }

    /// Stores the reading for a single axis. Unmapped axes are ignored.
    pub fn apply_axis(&mut self, axis: AbsoluteAxisType, reading: AxisReading) {
        match axis {
            AbsoluteAxisType::ABS_X => self.left_x = Some(reading),
            AbsoluteAxisType::ABS_Y => self.left_y = Some(reading),
            AbsoluteAxisType::ABS_RX => self.right_x = Some(reading),
            AbsoluteAxisType::ABS_RY => self.right_y = Some(reading),
            AbsoluteAxisType::ABS_Z => self.left_trigger = Some(reading),
            AbsoluteAxisType::ABS_RZ => self.right_trigger = Some(reading),
            AbsoluteAxisType::ABS_HAT0X => self.hat_x = reading.value.signum(),
            AbsoluteAxisType::ABS_HAT0Y => self.hat_y = reading.value.signum(),
            _ => {}
        }
    }

    /// Converts to sample ranges with `calibration` applied.
    #[must_use]
    pub fn normalize(&self, calibration: &Calibration) -> ControllerState {
        let stick = |axis: Option<AxisReading>| {
            axis.map_or(0.0, |a| calibration.apply_stick(a.range.to_signed(a.value)))
        };
        let trigger = |axis: Option<AxisReading>| {
            axis.map_or(0.0, |a| calibration.apply_trigger(a.range.to_unit(a.value)))
        };

        let mut buttons = self.buttons;
        // Hat and dedicated d-pad keys both count
        buttons.dpad_left |= self.hat_x < 0;
        buttons.dpad_right |= self.hat_x > 0;
        buttons.dpad_up |= self.hat_y < 0;
        buttons.dpad_down |= self.hat_y > 0;

        ControllerState {
            left_stick: Stick::new(stick(self.left_x), stick(self.left_y)),
            right_stick: Stick::new(stick(self.right_x), stick(self.right_y)),
            triggers: Triggers {
                left: trigger(self.left_trigger),
                right: trigger(self.right_trigger),
            },
            buttons,
        }
        .clamped()
    }
}

/// Gamepad opened through `/dev/input/event*`.
pub struct EvdevBackend {
    device: Device,
    device_path: String,
    raw: RawPad,
}

impl std::fmt::Debug for EvdevBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvdevBackend")
            .field("device_path", &self.device_path)
            .field("raw", &self.raw)
            .finish_non_exhaustive()
    }
}

fn backend_error(reason: String) -> PadlinkError {
    PadlinkError::Backend {
        backend: BACKEND,
        reason,
    }
}

/// Returns true for devices that look like a gamepad.
fn is_gamepad(device: &Device) -> bool {
    let has_south = device
        .supported_keys()
        .map_or(false, |keys| keys.contains(Key::BTN_SOUTH));
    let has_stick = device
        .supported_absolute_axes()
        .map_or(false, |axes| axes.contains(AbsoluteAxisType::ABS_X));
    has_south && has_stick
}

impl EvdevBackend {
    /// Opens the first gamepad found under `/dev/input`.
    ///
    /// # Errors
    ///
    /// Returns `Backend` if `/dev/input` cannot be read or holds no readable
    /// gamepad (missing permissions look the same as a missing device).
    pub fn open() -> Result<Self> {
        let input_dir = Path::new("/dev/input");

        if !input_dir.exists() {
            return Err(backend_error("/dev/input directory not found".to_string()));
        }

        let mut entries: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| backend_error(format!("failed to read /dev/input: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| backend_error(format!("failed to read directory entry: {}", e)))?;

        // Deterministic pick when several pads are plugged in
        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            let path = entry.path();

            let is_event_node = path
                .file_name()
                .map_or(false, |name| name.to_string_lossy().starts_with("event"));
            if !is_event_node {
                continue;
            }

            match Device::open(&path) {
                Ok(device) => {
                    let id = device.input_id();
                    debug!(
                        "Found input device: {} (vendor: 0x{:04x}, product: 0x{:04x})",
                        path.display(),
                        id.vendor(),
                        id.product()
                    );

                    if is_gamepad(&device) {
                        return Ok(Self::from_device(device, path.to_string_lossy().to_string()));
                    }
                }
                Err(e) => {
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(backend_error("no gamepad found under /dev/input".to_string()))
    }

    /// Opens a specific event node, e.g. `/dev/input/event5`.
    ///
    /// # Errors
    ///
    /// Returns `Backend` if the node cannot be opened or is not a gamepad.
    pub fn open_path(path: &str) -> Result<Self> {
        let device = Device::open(path)
            .map_err(|e| backend_error(format!("cannot open {}: {}", path, e)))?;

        if !is_gamepad(&device) {
            return Err(backend_error(format!("{} is not a gamepad", path)));
        }

        Ok(Self::from_device(device, path.to_string()))
    }

    fn from_device(device: Device, device_path: String) -> Self {
        info!(
            "Using gamepad '{}' at {}",
            device.name().unwrap_or("unknown"),
            device_path
        );
        Self {
            device,
            device_path,
            raw: RawPad::default(),
        }
    }

    /// The `/dev/input/eventX` path this backend was opened from.
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Human-readable device name reported by the kernel.
    pub fn device_name(&self) -> Option<&str> {
        self.device.name()
    }

    fn read_state(&self) -> std::io::Result<RawPad> {
        let mut raw = RawPad::default();

        let keys = self.device.get_key_state()?;
        raw.apply_keys(&keys);

        if let Some(supported) = self.device.supported_absolute_axes() {
            let abs = self.device.get_abs_state()?;
            for axis in supported.iter() {
                if let Some(info) = abs.get(axis.0 as usize) {
                    raw.apply_axis(
                        axis,
                        AxisReading::new(info.value, info.minimum, info.maximum),
                    );
                }
            }
        }

        Ok(raw)
    }
}

impl InputBackend for EvdevBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn poll(&mut self) -> Result<bool> {
        match self.read_state() {
            Ok(raw) => {
                let changed = raw != self.raw;
                self.raw = raw;
                Ok(changed)
            }
            Err(e) => {
                self.raw = RawPad::default();
                Err(backend_error(format!(
                    "{} stopped answering: {}",
                    self.device_path, e
                )))
            }
        }
    }

    fn normalize(&self, calibration: &Calibration) -> ControllerState {
        self.raw.normalize(calibration)
    }
}
