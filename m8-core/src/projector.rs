//! Control-surface projection: M8 key bitmask to gamepad buttons.

use m8_proto::Keys;

/// Logical gamepad button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    /// M8 EDIT key.
    A,
    /// M8 OPTION key.
    B,
    Start,
    Select,
}

impl Button {
    /// All buttons in the order they are reported to the output sink.
    pub const ALL: [Button; 8] = [
        Button::DpadUp,
        Button::DpadDown,
        Button::DpadLeft,
        Button::DpadRight,
        Button::A,
        Button::B,
        Button::Start,
        Button::Select,
    ];

    /// M8 key bit driving this button.
    #[must_use]
    pub const fn key(self) -> Keys {
        match self {
            Button::DpadUp => Keys::UP,
            Button::DpadDown => Keys::DOWN,
            Button::DpadLeft => Keys::LEFT,
            Button::DpadRight => Keys::RIGHT,
            Button::A => Keys::EDIT,
            Button::B => Keys::OPT,
            Button::Start => Keys::START,
            Button::Select => Keys::SELECT,
        }
    }
}

/// Complete snapshot of the eight digital buttons.
///
/// Always delivered to the output sink as a whole so consumers never see a
/// partially applied update.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonState {
    pub dpad_up: bool,
    pub dpad_down: bool,
    pub dpad_left: bool,
    pub dpad_right: bool,
    pub a: bool,
    pub b: bool,
    pub start: bool,
    pub select: bool,
}

impl ButtonState {
    /// All buttons released.
    #[must_use]
    pub const fn released() -> Self {
        Self {
            dpad_up: false,
            dpad_down: false,
            dpad_left: false,
            dpad_right: false,
            a: false,
            b: false,
            start: false,
            select: false,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_pressed(&self, button: Button) -> bool {
        match button {
            Button::DpadUp => self.dpad_up,
            Button::DpadDown => self.dpad_down,
            Button::DpadLeft => self.dpad_left,
            Button::DpadRight => self.dpad_right,
            Button::A => self.a,
            Button::B => self.b,
            Button::Start => self.start,
            Button::Select => self.select,
        }
    }

    #[inline]
    pub fn set(&mut self, button: Button, pressed: bool) {
        let slot = match button {
            Button::DpadUp => &mut self.dpad_up,
            Button::DpadDown => &mut self.dpad_down,
            Button::DpadLeft => &mut self.dpad_left,
            Button::DpadRight => &mut self.dpad_right,
            Button::A => &mut self.a,
            Button::B => &mut self.b,
            Button::Start => &mut self.start,
            Button::Select => &mut self.select,
        };
        *slot = pressed;
    }

    /// Every button with its state, in [`Button::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Button, bool)> + '_ {
        Button::ALL.iter().map(move |&b| (b, self.is_pressed(b)))
    }

    /// Pack back into an M8 key bitmask.
    #[must_use]
    pub fn keys(&self) -> Keys {
        self.iter()
            .filter(|&(_, pressed)| pressed)
            .fold(Keys::NONE, |acc, (b, _)| acc | b.key())
    }
}

/// Map a joypad keycode onto the eight gamepad buttons.
///
/// Every bit is tested on its own; any combination may be pressed.
///
/// ```
/// use m8_core::{project, Button};
///
/// let state = project(0b1000_0001);
/// assert!(state.is_pressed(Button::DpadLeft));
/// assert!(state.is_pressed(Button::A));
/// assert!(!state.is_pressed(Button::Select));
/// ```
#[must_use]
pub fn project(keycode: u8) -> ButtonState {
    let keys = Keys(keycode);
    let mut state = ButtonState::released();
    for button in Button::ALL {
        state.set(button, keys.contains(button.key()));
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_left_and_edit() {
        let state = project(0b1000_0001);
        assert_eq!(
            state,
            ButtonState {
                dpad_left: true,
                a: true,
                ..ButtonState::released()
            }
        );
    }

    #[test]
    fn test_nothing_pressed() {
        assert_eq!(project(0), ButtonState::released());
    }

    #[test]
    fn test_everything_pressed() {
        let state = project(0xFF);
        assert!(state.iter().all(|(_, pressed)| pressed));
    }

    #[test]
    fn test_each_bit_maps_to_one_button() {
        let expected = [
            (7, Button::DpadLeft),
            (6, Button::DpadUp),
            (5, Button::DpadDown),
            (4, Button::Select),
            (3, Button::Start),
            (2, Button::DpadRight),
            (1, Button::B),
            (0, Button::A),
        ];
        for (bit, button) in expected {
            let state = project(1 << bit);
            for (other, pressed) in state.iter() {
                assert_eq!(pressed, other == button, "bit {} -> {:?}", bit, other);
            }
        }
    }

    #[test]
    fn test_set_and_clear() {
        let mut state = ButtonState::released();
        state.set(Button::Start, true);
        assert!(state.is_pressed(Button::Start));
        state.set(Button::Start, false);
        assert_eq!(state, ButtonState::released());
    }

    proptest! {
        #[test]
        fn prop_projection_preserves_every_bit(keycode in any::<u8>()) {
            let state = project(keycode);
            prop_assert_eq!(state.keys(), Keys(keycode));
            prop_assert_eq!(
                state.iter().filter(|&(_, p)| p).count() as u32,
                keycode.count_ones()
            );
        }
    }
}
