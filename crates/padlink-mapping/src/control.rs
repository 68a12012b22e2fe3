use std::fmt;

/// Logical buttons of the reference controller layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    A,
    B,
    X,
    Y,
    Back,
    Guide,
    Start,
    LeftStick,
    RightStick,
    LeftShoulder,
    RightShoulder,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
    Misc1,
    Paddle1,
    Paddle2,
    Paddle3,
    Paddle4,
    Touchpad,
}

/// Logical axes of the reference controller layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    LeftX,
    LeftY,
    RightX,
    RightY,
    LeftTrigger,
    RightTrigger,
}

/// Output range of an axis binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AxisRange {
    #[default]
    Full,
    /// `+axis`: 0 to max.
    Positive,
    /// `-axis`: 0 to min.
    Negative,
}

/// A semantic control a mapping binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Button(Button),
    Axis { axis: Axis, range: AxisRange },
}

const BUTTON_NAMES: [(Button, &str); 21] = [
    (Button::A, "a"),
    (Button::B, "b"),
    (Button::X, "x"),
    (Button::Y, "y"),
    (Button::Back, "back"),
    (Button::Guide, "guide"),
    (Button::Start, "start"),
    (Button::LeftStick, "leftstick"),
    (Button::RightStick, "rightstick"),
    (Button::LeftShoulder, "leftshoulder"),
    (Button::RightShoulder, "rightshoulder"),
    (Button::DPadUp, "dpup"),
    (Button::DPadDown, "dpdown"),
    (Button::DPadLeft, "dpleft"),
    (Button::DPadRight, "dpright"),
    (Button::Misc1, "misc1"),
    (Button::Paddle1, "paddle1"),
    (Button::Paddle2, "paddle2"),
    (Button::Paddle3, "paddle3"),
    (Button::Paddle4, "paddle4"),
    (Button::Touchpad, "touchpad"),
];

const AXIS_NAMES: [(Axis, &str); 6] = [
    (Axis::LeftX, "leftx"),
    (Axis::LeftY, "lefty"),
    (Axis::RightX, "rightx"),
    (Axis::RightY, "righty"),
    (Axis::LeftTrigger, "lefttrigger"),
    (Axis::RightTrigger, "righttrigger"),
];

impl Button {
    pub fn from_name(name: &str) -> Option<Self> {
        BUTTON_NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(button, _)| *button)
    }

    pub fn name(self) -> &'static str {
        BUTTON_NAMES
            .iter()
            .find(|(button, _)| *button == self)
            .map_or("", |(_, n)| n)
    }

    pub fn is_dpad(self) -> bool {
        matches!(
            self,
            Button::DPadUp | Button::DPadDown | Button::DPadLeft | Button::DPadRight
        )
    }
}

impl Axis {
    pub fn from_name(name: &str) -> Option<Self> {
        AXIS_NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(axis, _)| *axis)
    }

    pub fn name(self) -> &'static str {
        AXIS_NAMES
            .iter()
            .find(|(axis, _)| *axis == self)
            .map_or("", |(_, n)| n)
    }
}

impl Control {
    /// Parses a control name as it appears left of `:` in a mapping record,
    /// including the optional `+`/`-` half-axis prefix.
    pub fn from_name(name: &str) -> Option<Self> {
        let (range, bare) = match name.as_bytes().first() {
            Some(b'+') => (AxisRange::Positive, &name[1..]),
            Some(b'-') => (AxisRange::Negative, &name[1..]),
            _ => (AxisRange::Full, name),
        };
        if let Some(axis) = Axis::from_name(bare) {
            return Some(Control::Axis { axis, range });
        }
        if range != AxisRange::Full {
            return None;
        }
        Button::from_name(bare).map(Control::Button)
    }

    pub fn is_axis(&self) -> bool {
        matches!(self, Control::Axis { .. })
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Control::Button(button) => f.write_str(button.name()),
            Control::Axis { axis, range } => {
                match range {
                    AxisRange::Full => {}
                    AxisRange::Positive => f.write_str("+")?,
                    AxisRange::Negative => f.write_str("-")?,
                }
                f.write_str(axis.name())
            }
        }
    }
}
