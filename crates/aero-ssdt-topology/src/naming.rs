//! Dense index -> 4-character ACPI name segment.

use aero_aml::NameSeg;

use crate::error::{Error, Result};

/// Template for the shared C-state packages: `CST0..CSTF`, `CS10..CSFF`,
/// `C100..CFFF`.
pub const CST_NAME_TEMPLATE: [u8; 4] = *b"CST0";
/// Template for processor devices: `C000..CFFF`.
pub const CPU_NAME_TEMPLATE: [u8; 4] = *b"C000";

/// Largest index representable with three hex digits.
pub const MAX_NAME_INDEX: usize = 0xFFF;

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Overwrites the tail of `template` with `index` in hex, using as few digits
/// as the value needs (at least one, at most three).
pub fn synthesize_name(template: [u8; 4], index: usize) -> Result<NameSeg> {
    if index > MAX_NAME_INDEX {
        return Err(Error::invalid(format!(
            "name index {index:#x} exceeds {MAX_NAME_INDEX:#x}"
        )));
    }

    let mut name = template;
    name[3] = HEX[index & 0xF];
    if index > 0xF {
        name[2] = HEX[(index >> 4) & 0xF];
    }
    if index > 0xFF {
        name[1] = HEX[(index >> 8) & 0xF];
    }
    Ok(NameSeg::from_bytes(name)?)
}
