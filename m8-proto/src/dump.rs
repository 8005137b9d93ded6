//! Hex dump formatting for diagnostics.
//!
//! Rejected packets are logged together with their raw bytes. [`HexDump`]
//! formats lazily through `core::fmt`, so no allocation is needed.

use core::fmt;

/// Space-separated `0xNN` rendering of a byte slice.
///
/// ```
/// use m8_proto::HexDump;
///
/// assert_eq!(format!("{}", HexDump(&[0xFB, 0x01])), "0xFB 0x01");
/// ```
#[derive(Clone, Copy)]
pub struct HexDump<'a>(pub &'a [u8]);

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, &byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "0x{:02X}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
