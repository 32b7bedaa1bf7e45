//! Resource template descriptors used by processor power objects.

/// ACPI Generic Address Structure, as carried by a Generic Register
/// Descriptor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GenericAddress {
    pub address_space: u8,
    pub bit_width: u8,
    pub bit_offset: u8,
    pub access_size: u8,
    pub address: u64,
}

pub const ADDRESS_SPACE_SYSTEM_IO: u8 = 0x01;
pub const ADDRESS_SPACE_FIXED_HARDWARE: u8 = 0x7F;

const GENERIC_REGISTER_DESCRIPTOR: u8 = 0x82;
const GENERIC_REGISTER_PAYLOAD_LEN: u16 = 0x000C;
const END_TAG: u8 = 0x79;

/// `ResourceTemplate () { Register (...) }` contents: a Generic Register
/// Descriptor followed by an End Tag with a zero checksum.
pub fn register_template(reg: &GenericAddress) -> Vec<u8> {
    let mut out = Vec::with_capacity(17);
    out.push(GENERIC_REGISTER_DESCRIPTOR);
    out.extend_from_slice(&GENERIC_REGISTER_PAYLOAD_LEN.to_le_bytes());
    out.push(reg.address_space);
    out.push(reg.bit_width);
    out.push(reg.bit_offset);
    out.push(reg.access_size);
    out.extend_from_slice(&reg.address.to_le_bytes());
    out.extend_from_slice(&[END_TAG, 0x00]);
    out
}
