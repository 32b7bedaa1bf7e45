//! Byte-level AML encoders shared by the tree serializer.

use crate::error::{AmlError, Result};

pub const AML_OP_ZERO: u8 = 0x00;
pub const AML_OP_ONE: u8 = 0x01;
pub const AML_OP_NAME: u8 = 0x08;
pub const AML_OP_BYTE_PREFIX: u8 = 0x0A;
pub const AML_OP_WORD_PREFIX: u8 = 0x0B;
pub const AML_OP_DWORD_PREFIX: u8 = 0x0C;
pub const AML_OP_STRING_PREFIX: u8 = 0x0D;
pub const AML_OP_QWORD_PREFIX: u8 = 0x0E;
pub const AML_OP_SCOPE: u8 = 0x10;
pub const AML_OP_BUFFER: u8 = 0x11;
pub const AML_OP_PACKAGE: u8 = 0x12;
pub const AML_OP_METHOD: u8 = 0x14;
pub const AML_OP_RETURN: u8 = 0xA4;

pub const AML_EXT_OP_PREFIX: u8 = 0x5B;
pub const AML_EXT_OP_DEVICE: u8 = 0x82;

pub const AML_NAME_DUAL_PREFIX: u8 = 0x2E;
pub const AML_NAME_MULTI_PREFIX: u8 = 0x2F;
pub const AML_NAME_ROOT_PREFIX: u8 = 0x5C;
pub const AML_NAME_PARENT_PREFIX: u8 = 0x5E;

const MAX_PKG_LENGTH: usize = 0x0FFF_FFFF;

/// Raw PkgLength value encoding.
///
/// Bits 4-5 of the lead byte are reserved and zero when follow bytes are
/// present.
pub fn encode_pkg_length(len: usize) -> Result<Vec<u8>> {
    if len > MAX_PKG_LENGTH {
        return Err(AmlError::PkgLengthOverflow(len));
    }
    if len <= 0x3F {
        return Ok(vec![len as u8]);
    }
    if len <= 0x0FFF {
        return Ok(vec![((len & 0x0F) as u8) | 0x40, (len >> 4) as u8]);
    }
    if len <= 0x0F_FFFF {
        return Ok(vec![
            ((len & 0x0F) as u8) | 0x80,
            (len >> 4) as u8,
            (len >> 12) as u8,
        ]);
    }
    Ok(vec![
        ((len & 0x0F) as u8) | 0xC0,
        (len >> 4) as u8,
        (len >> 12) as u8,
        (len >> 20) as u8,
    ])
}

/// PkgLength for an opcode whose payload is `payload_len` bytes.
///
/// The encoded value covers the PkgLength field itself, which makes it
/// self-referential; iterate until the encoding width stops changing.
pub fn pkg_length_for_payload(payload_len: usize) -> Result<Vec<u8>> {
    let overflow = || AmlError::PkgLengthOverflow(payload_len);
    let mut total_len = payload_len.checked_add(1).ok_or_else(overflow)?;
    loop {
        let enc = encode_pkg_length(total_len)?;
        let new_total_len = payload_len.checked_add(enc.len()).ok_or_else(overflow)?;
        if new_total_len == total_len {
            return Ok(enc);
        }
        total_len = new_total_len;
    }
}

/// Decodes a PkgLength at `offset`, returning `(value, encoded_len)`.
pub fn parse_pkg_length(bytes: &[u8], offset: usize) -> Option<(usize, usize)> {
    let b0 = *bytes.get(offset)?;
    let follow_bytes = (b0 >> 6) as usize;
    let mut len: usize = if follow_bytes == 0 {
        (b0 & 0x3F) as usize
    } else {
        (b0 & 0x0F) as usize
    };
    for i in 0..follow_bytes {
        let b = *bytes.get(offset + 1 + i)?;
        len |= (b as usize) << (4 + i * 8);
    }
    Some((len, 1 + follow_bytes))
}

/// Wraps `payload` as `opcode PkgLength payload`.
pub fn pkg(opcode: &[u8], payload: &[u8]) -> Result<Vec<u8>> {
    let len = pkg_length_for_payload(payload.len())?;
    let mut out = Vec::with_capacity(opcode.len() + len.len() + payload.len());
    out.extend_from_slice(opcode);
    out.extend_from_slice(&len);
    out.extend_from_slice(payload);
    Ok(out)
}

/// Shortest integer encoding (ZeroOp/OneOp/Byte/Word/DWord/QWord).
pub fn integer(value: u64) -> Vec<u8> {
    match value {
        0 => vec![AML_OP_ZERO],
        1 => vec![AML_OP_ONE],
        v if v <= u8::MAX as u64 => vec![AML_OP_BYTE_PREFIX, v as u8],
        v if v <= u16::MAX as u64 => {
            let mut out = vec![AML_OP_WORD_PREFIX];
            out.extend_from_slice(&(v as u16).to_le_bytes());
            out
        }
        v if v <= u32::MAX as u64 => {
            let mut out = vec![AML_OP_DWORD_PREFIX];
            out.extend_from_slice(&(v as u32).to_le_bytes());
            out
        }
        v => {
            let mut out = vec![AML_OP_QWORD_PREFIX];
            out.extend_from_slice(&v.to_le_bytes());
            out
        }
    }
}

pub fn string(value: &str) -> Result<Vec<u8>> {
    if value.as_bytes().contains(&0) {
        return Err(AmlError::StringContainsNul);
    }
    let mut out = Vec::with_capacity(value.len() + 2);
    out.push(AML_OP_STRING_PREFIX);
    out.extend_from_slice(value.as_bytes());
    out.push(0x00);
    Ok(out)
}

pub fn buffer(raw: &[u8]) -> Result<Vec<u8>> {
    let mut payload = integer(raw.len() as u64);
    payload.extend_from_slice(raw);
    pkg(&[AML_OP_BUFFER], &payload)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn pkg_length_encoding_matches_acpica_examples() {
        assert_eq!(encode_pkg_length(0x3F).unwrap(), vec![0x3F]);
        assert_eq!(encode_pkg_length(0x40).unwrap(), vec![0x40, 0x04]);
        assert_eq!(encode_pkg_length(0x70).unwrap(), vec![0x40, 0x07]);
        assert_eq!(encode_pkg_length(0x0FFF).unwrap(), vec![0x4F, 0xFF]);
        assert_eq!(encode_pkg_length(0x1000).unwrap(), vec![0x80, 0x00, 0x01]);
        assert_eq!(
            encode_pkg_length(0x1000_0000),
            Err(AmlError::PkgLengthOverflow(0x1000_0000))
        );
    }

    #[test]
    fn pkg_length_for_payload_is_self_inclusive_fixed_point() {
        for payload_len in [0usize, 4, 62, 63, 64, 4093, 4094, 0x1_0000] {
            let enc = pkg_length_for_payload(payload_len).unwrap();
            let (decoded, consumed) = parse_pkg_length(&enc, 0).unwrap();
            assert_eq!(consumed, enc.len());
            assert_eq!(decoded, payload_len + enc.len());
        }
    }

    #[test]
    fn pkg_length_boundary_forces_two_byte_encoding() {
        assert_eq!(pkg_length_for_payload(15).unwrap(), vec![0x10]);
        assert_eq!(pkg_length_for_payload(0x3F).unwrap(), vec![0x41, 0x04]);
    }

    #[test]
    fn integers_use_shortest_prefix() {
        assert_eq!(integer(0), vec![0x00]);
        assert_eq!(integer(1), vec![0x01]);
        assert_eq!(integer(0x0F), vec![0x0A, 0x0F]);
        assert_eq!(integer(0x1234), vec![0x0B, 0x34, 0x12]);
        assert_eq!(integer(0x0001_0000), vec![0x0C, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(integer(u64::MAX)[0], 0x0E);
    }

    #[test]
    fn strings_reject_embedded_nul() {
        assert_eq!(
            string("ACPI0007").unwrap(),
            [&[0x0D][..], b"ACPI0007", &[0x00]].concat()
        );
        assert_eq!(string("A\0B"), Err(AmlError::StringContainsNul));
    }

    #[test]
    fn buffer_prefixes_length() {
        assert_eq!(buffer(&[0x79, 0x00]).unwrap(), vec![0x11, 0x05, 0x0A, 0x02, 0x79, 0x00]);
    }

    proptest! {
        #[test]
        fn pkg_length_roundtrips(payload_len in 0usize..0x0FF0_0000) {
            let enc = pkg_length_for_payload(payload_len).unwrap();
            let (decoded, consumed) = parse_pkg_length(&enc, 0).unwrap();
            prop_assert_eq!(consumed, enc.len());
            prop_assert_eq!(decoded, payload_len + enc.len());
        }
    }
}
