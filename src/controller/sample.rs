//! # Controller Sample Types
//!
//! The normalized, full-state snapshot of a controller that travels from the
//! sampler to the receiver.
//!
//! | Field | Range | Neutral |
//! |-------|-------|---------|
//! | `left_stick.x/y`, `right_stick.x/y` | -1.0 to 1.0 | 0.0 |
//! | `triggers.left/right` | 0.0 to 1.0 | 0.0 |
//! | `buttons.*` (15 fixed names) | bool | false |
//!
//! Every sample carries every field, whether or not the hardware reported a
//! change since the previous one.

use serde::{Deserialize, Serialize};

/// Lower bound of a stick axis.
pub const STICK_MIN: f64 = -1.0;
/// Upper bound of a stick axis.
pub const STICK_MAX: f64 = 1.0;
/// Lower bound of a trigger.
pub const TRIGGER_MIN: f64 = 0.0;
/// Upper bound of a trigger.
pub const TRIGGER_MAX: f64 = 1.0;

/// Position of one analog stick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Stick {
    pub x: f64,
    pub y: f64,
}

impl Stick {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Analog trigger travel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Triggers {
    pub left: f64,
    pub right: f64,
}

/// One of the fixed set of digital buttons carried in every sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    A,
    B,
    X,
    Y,
    LeftBumper,
    RightBumper,
    Start,
    Back,
    Guide,
    LeftStickClick,
    RightStickClick,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
}

impl Button {
    /// Every button, in wire order.
    pub const ALL: [Button; 15] = [
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
        Button::LeftBumper,
        Button::RightBumper,
        Button::Start,
        Button::Back,
        Button::Guide,
        Button::LeftStickClick,
        Button::RightStickClick,
        Button::DPadUp,
        Button::DPadDown,
        Button::DPadLeft,
        Button::DPadRight,
    ];

    /// Key used for this button in the wire format.
    #[must_use]
    pub fn wire_name(self) -> &'static str {
        match self {
            Button::A => "A",
            Button::B => "B",
            Button::X => "X",
            Button::Y => "Y",
            Button::LeftBumper => "LB",
            Button::RightBumper => "RB",
            Button::Start => "start",
            Button::Back => "back",
            Button::Guide => "guide",
            Button::LeftStickClick => "left_stick_click",
            Button::RightStickClick => "right_stick_click",
            Button::DPadUp => "dpad_up",
            Button::DPadDown => "dpad_down",
            Button::DPadLeft => "dpad_left",
            Button::DPadRight => "dpad_right",
        }
    }
}

impl std::fmt::Display for Button {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// State of all 15 buttons. Every key is required on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Buttons {
    #[serde(rename = "A")]
    pub a: bool,
    #[serde(rename = "B")]
    pub b: bool,
    #[serde(rename = "X")]
    pub x: bool,
    #[serde(rename = "Y")]
    pub y: bool,
    #[serde(rename = "LB")]
    pub lb: bool,
    #[serde(rename = "RB")]
    pub rb: bool,
    pub start: bool,
    pub back: bool,
    pub guide: bool,
    pub left_stick_click: bool,
    pub right_stick_click: bool,
    pub dpad_up: bool,
    pub dpad_down: bool,
    pub dpad_left: bool,
    pub dpad_right: bool,
}

impl Buttons {
    fn slot(&mut self, button: Button) -> &mut bool {
        match button {
            Button::A => &mut self.a,
            Button::B => &mut self.b,
            Button::X => &mut self.x,
            Button::Y => &mut self.y,
            Button::LeftBumper => &mut self.lb,
            Button::RightBumper => &mut self.rb,
            Button::Start => &mut self.start,
            Button::Back => &mut self.back,
            Button::Guide => &mut self.guide,
            Button::LeftStickClick => &mut self.left_stick_click,
            Button::RightStickClick => &mut self.right_stick_click,
            Button::DPadUp => &mut self.dpad_up,
            Button::DPadDown => &mut self.dpad_down,
            Button::DPadLeft => &mut self.dpad_left,
            Button::DPadRight => &mut self.dpad_right,
        }
    }

    /// Returns whether `button` is pressed.
    #[must_use]
    pub fn get(&self, button: Button) -> bool {
        match button {
            Button::A => self.a,
            Button::B => self.b,
            Button::X => self.x,
            Button::Y => self.y,
            Button::LeftBumper => self.lb,
            Button::RightBumper => self.rb,
            Button::Start => self.start,
            Button::Back => self.back,
            Button::Guide => self.guide,
            Button::LeftStickClick => self.left_stick_click,
            Button::RightStickClick => self.right_stick_click,
            Button::DPadUp => self.dpad_up,
            Button::DPadDown => self.dpad_down,
            Button::DPadLeft => self.dpad_left,
            Button::DPadRight => self.dpad_right,
        }
    }

    /// Sets the pressed state of `button`.
    pub fn set(&mut self, button: Button, pressed: bool) {
        *self.slot(button) = pressed;
    }

    /// Iterates over the buttons currently held, in wire order.
    pub fn pressed(&self) -> impl Iterator<Item = Button> + '_ {
        Button::ALL.into_iter().filter(move |b| self.get(*b))
    }

    #[must_use]
    pub fn any_pressed(&self) -> bool {
        self.pressed().next().is_some()
    }
}

/// Normalized controller state without a timestamp.
///
/// This is what the sampler publishes between ticks; [`ControllerSample`]
/// stamps it at capture time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControllerState {
    pub left_stick: Stick,
    pub right_stick: Stick,
    pub triggers: Triggers,
    pub buttons: Buttons,
}

impl ControllerState {
    /// Neutral state: sticks centered, triggers released, no buttons held.
    #[must_use]
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Returns a copy with every analog value forced into its documented range.
    ///
    /// Non-finite values become 0.0.
    #[must_use]
    pub fn clamped(&self) -> Self {
        let stick = |v: f64| clamp_finite(v, STICK_MIN, STICK_MAX);
        let trigger = |v: f64| clamp_finite(v, TRIGGER_MIN, TRIGGER_MAX);
        Self {
            left_stick: Stick::new(stick(self.left_stick.x), stick(self.left_stick.y)),
            right_stick: Stick::new(stick(self.right_stick.x), stick(self.right_stick.y)),
            triggers: Triggers {
                left: trigger(self.triggers.left),
                right: trigger(self.triggers.right),
            },
            buttons: self.buttons,
        }
    }

    /// Finds the first analog field outside its range, if any.
    #[must_use]
    pub fn out_of_range(&self) -> Option<(&'static str, f64)> {
        let sticks = [
            ("left_stick.x", self.left_stick.x),
            ("left_stick.y", self.left_stick.y),
            ("right_stick.x", self.right_stick.x),
            ("right_stick.y", self.right_stick.y),
        ];
        let triggers = [
            ("triggers.left", self.triggers.left),
            ("triggers.right", self.triggers.right),
        ];

        sticks
            .into_iter()
            .find(|(_, v)| !(STICK_MIN..=STICK_MAX).contains(v))
            .or_else(|| {
                triggers
                    .into_iter()
                    .find(|(_, v)| !(TRIGGER_MIN..=TRIGGER_MAX).contains(v))
            })
    }
}

fn clamp_finite(value: f64, min: f64, max: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        0.0
    }
}

/// One full snapshot of controller state at an instant.
///
/// Serializes to the datagram shape
/// `{"timestamp": .., "controller_data": {..}}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControllerSample {
    /// Seconds since the Unix epoch, assigned when the sample was captured.
    pub timestamp: f64,
    #[serde(rename = "controller_data")]
    pub state: ControllerState,
}

impl ControllerSample {
    #[must_use]
    pub fn new(timestamp: f64, state: ControllerState) -> Self {
        Self { timestamp, state }
    }

    /// Stamps `state` with the current wall-clock time.
    #[must_use]
    pub fn capture(state: ControllerState) -> Self {
        Self::new(now_timestamp(), state)
    }
}

/// Current wall-clock time as floating-point seconds since the Unix epoch.
#[must_use]
pub fn now_timestamp() -> f64 {
    let now = chrono::Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_nanos()) / 1e9
}
