use std::fmt;

use padlink_mapping::{Axis, Button, Control};

/// A control in the console-style API's fixed layout: a bit of the button
/// word or an analog axis index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsoleCode {
    Button(u16),
    Axis(u8),
}

impl fmt::Display for ConsoleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleCode::Button(mask) => write!(f, "button {mask:#06x}"),
            ConsoleCode::Axis(index) => write!(f, "axis {index}"),
        }
    }
}

const BUTTON_MASKS: [(Button, u16); 15] = [
    (Button::DPadUp, 0x0001),
    (Button::DPadDown, 0x0002),
    (Button::DPadLeft, 0x0004),
    (Button::DPadRight, 0x0008),
    (Button::Start, 0x0010),
    (Button::Back, 0x0020),
    (Button::LeftStick, 0x0040),
    (Button::RightStick, 0x0080),
    (Button::LeftShoulder, 0x0100),
    (Button::RightShoulder, 0x0200),
    (Button::Guide, 0x0400),
    (Button::A, 0x1000),
    (Button::B, 0x2000),
    (Button::X, 0x4000),
    (Button::Y, 0x8000),
];

/// Console-style code for `control`. Controls the layout lacks (paddles,
/// touchpad, misc) have none.
pub fn console_code(control: Control) -> Option<ConsoleCode> {
    match control {
        Control::Button(button) => BUTTON_MASKS
            .iter()
            .find(|(b, _)| *b == button)
            .map(|(_, mask)| ConsoleCode::Button(*mask)),
        Control::Axis { axis, .. } => Some(ConsoleCode::Axis(match axis {
            Axis::LeftX => 0,
            Axis::LeftY => 1,
            Axis::RightX => 2,
            Axis::RightY => 3,
            Axis::LeftTrigger => 4,
            Axis::RightTrigger => 5,
        })),
    }
}

#[cfg(test)]
mod tests {
    use padlink_mapping::AxisRange;

    use super::*;

    #[test]
    fn maps_buttons_to_masks() {
        assert_eq!(console_code(Control::Button(Button::A)), Some(ConsoleCode::Button(0x1000)));
        assert_eq!(console_code(Control::Button(Button::DPadLeft)), Some(ConsoleCode::Button(0x0004)));
        assert_eq!(console_code(Control::Button(Button::Guide)), Some(ConsoleCode::Button(0x0400)));
        assert_eq!(console_code(Control::Button(Button::Paddle1)), None);
    }

    #[test]
    fn half_axes_share_the_full_axis_index() {
        let full = Control::Axis { axis: Axis::LeftY, range: AxisRange::Full };
        let half = Control::Axis { axis: Axis::LeftY, range: AxisRange::Negative };
        assert_eq!(console_code(full), Some(ConsoleCode::Axis(1)));
        assert_eq!(console_code(half), console_code(full));
        assert_eq!(
            console_code(Control::Axis { axis: Axis::RightTrigger, range: AxisRange::Full }),
            Some(ConsoleCode::Axis(5))
        );
    }

    #[test]
    fn masks_are_distinct_bits() {
        let combined = BUTTON_MASKS.iter().fold(0u16, |acc, (_, mask)| {
            assert_eq!(mask.count_ones(), 1);
            assert_eq!(acc & mask, 0);
            acc | mask
        });
        assert_eq!(combined, 0xF7FF);
    }
}
