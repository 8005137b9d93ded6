mod uinput;

pub use uinput::{key_for, snapshot_events, UinputJoystick};
