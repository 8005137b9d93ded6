use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, BusType, EventType, InputEvent, InputId, Key};
use log::{info, warn};
use m8_core::{Button, ButtonState, OutputError, OutputSink};

use crate::config::JoystickConfig;
use crate::error::AppError;

/// Linux uinput key code for a gamepad button.
#[must_use]
pub const fn key_for(button: Button) -> Key {
    match button {
        Button::DpadUp => Key::BTN_DPAD_UP,
        Button::DpadDown => Key::BTN_DPAD_DOWN,
        Button::DpadLeft => Key::BTN_DPAD_LEFT,
        Button::DpadRight => Key::BTN_DPAD_RIGHT,
        Button::A => Key::BTN_SOUTH,
        Button::B => Key::BTN_EAST,
        Button::Start => Key::BTN_START,
        Button::Select => Key::BTN_SELECT,
    }
}

/// One key event per button, in [`Button::ALL`] order.
pub fn snapshot_events(state: &ButtonState) -> [InputEvent; 8] {
    Button::ALL.map(|button| {
        InputEvent::new(
            EventType::KEY,
            key_for(button).code(),
            i32::from(state.is_pressed(button)),
        )
    })
}

/// Virtual joystick exposing the eight M8 buttons.
///
/// Every snapshot is written as eight key events followed by a single
/// sync report, so readers see the buttons change together. The device is
/// removed when the value is dropped.
pub struct UinputJoystick {
    device: VirtualDevice,
}

impl UinputJoystick {
    pub fn create(config: &JoystickConfig) -> Result<Self, AppError> {
        let mut keys = AttributeSet::<Key>::new();
        for button in Button::ALL {
            keys.insert(key_for(button));
        }

        let device = VirtualDeviceBuilder::new()?
            .name(&config.name)
            .input_id(InputId::new(
                BusType::BUS_USB,
                config.vendor,
                config.product,
                config.version,
            ))
            .with_keys(&keys)?
            .build()?;

        info!("Virtual joystick initialized");
        Ok(Self { device })
    }
}

impl OutputSink for UinputJoystick {
    fn send(&mut self, state: &ButtonState) -> Result<(), OutputError> {
        // emit() appends SYN_REPORT.
        self.device.emit(&snapshot_events(state)).map_err(|e| {
            warn!("Error writing to virtual joystick: {}", e);
            OutputError::Io
        })
    }

    fn is_ready(&self) -> bool {
        true
    }
}

impl Drop for UinputJoystick {
    fn drop(&mut self) {
        info!("Virtual joystick destroyed");
    }
}
