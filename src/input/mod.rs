mod serial;

pub use serial::{find_m8, list_m8, select_port, SerialTransport};
