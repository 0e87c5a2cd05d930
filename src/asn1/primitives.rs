//! Decoders for the primitive values found in Kerberos messages.

use crate::error::ProtocolError;
use std::convert::TryFrom;

pub fn decode_integer(value: &[u8]) -> Result<i64, ProtocolError> {
    if value.is_empty() || value.len() > 8 {
        return Err(ProtocolError::invalid(
            "INTEGER",
            format!("{} octets", value.len()),
        ));
    }

    let mut integer: i64 = if value[0] & 0x80 != 0 { -1 } else { 0 };
    for octet in value {
        integer = (integer << 8) | *octet as i64;
    }
    return Ok(integer);
}

pub fn decode_int32(value: &[u8]) -> Result<i32, ProtocolError> {
    let integer = decode_integer(value)?;
    return i32::try_from(integer).map_err(|_| {
        ProtocolError::invalid("Int32", format!("{} out of range", integer))
    });
}

pub fn decode_uint32(value: &[u8]) -> Result<u32, ProtocolError> {
    let integer = decode_integer(value)?;
    return u32::try_from(integer).map_err(|_| {
        ProtocolError::invalid("UInt32", format!("{} out of range", integer))
    });
}

/// KerberosString is a GeneralString restricted to IA5 characters.
pub fn decode_kerberos_string(value: &[u8]) -> Result<String, ProtocolError> {
    if !value.is_ascii() {
        return Err(ProtocolError::invalid(
            "KerberosString",
            "non IA5 characters",
        ));
    }
    return String::from_utf8(value.to_vec())
        .map_err(|err| ProtocolError::invalid("KerberosString", err.to_string()));
}

/// KerberosFlags BIT STRING. Bits beyond the first 32 are ignored and
/// missing bits read as zero.
pub fn decode_bit_string_u32(value: &[u8]) -> Result<u32, ProtocolError> {
    let (unused, bits) = match value.split_first() {
        Some(split) => split,
        None => {
            return Err(ProtocolError::invalid("BIT STRING", "missing unused bits octet"))
        }
    };
    if *unused > 7 || (bits.is_empty() && *unused != 0) {
        return Err(ProtocolError::invalid(
            "BIT STRING",
            format!("{} unused bits", unused),
        ));
    }

    let mut flags = [0u8; 4];
    for (i, octet) in bits.iter().take(4).enumerate() {
        flags[i] = *octet;
    }
    return Ok(u32::from_be_bytes(flags));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_integer_sign() {
        assert_eq!(decode_integer(&[0x05]).unwrap(), 5);
        assert_eq!(decode_integer(&[0xFF]).unwrap(), -1);
        assert_eq!(decode_integer(&[0x00, 0x80]).unwrap(), 128);
        assert_eq!(decode_integer(&[0xFF, 0x7F]).unwrap(), -129);
    }

    #[test]
    fn test_decode_integer_empty() {
        assert!(decode_integer(&[]).is_err());
    }

    #[test]
    fn test_decode_int32_range() {
        assert_eq!(decode_int32(&[0x7F, 0xFF, 0xFF, 0xFF]).unwrap(), i32::MAX);
        assert!(decode_int32(&[0x00, 0x80, 0x00, 0x00, 0x00]).is_err());
    }

    #[test]
    fn test_decode_uint32_rejects_negative() {
        assert_eq!(
            decode_uint32(&[0x00, 0xFF, 0xFF, 0xFF, 0xFF]).unwrap(),
            u32::MAX
        );
        assert!(decode_uint32(&[0xFF]).is_err());
    }

    #[test]
    fn test_decode_kerberos_string() {
        assert_eq!(decode_kerberos_string(b"EXAMPLE.COM").unwrap(), "EXAMPLE.COM");
        assert!(decode_kerberos_string(&[0xC3, 0xB1]).is_err());
    }

    #[test]
    fn test_decode_bit_string() {
        assert_eq!(
            decode_bit_string_u32(&[0x00, 0x40, 0x80, 0x00, 0x00]).unwrap(),
            0x40800000
        );
        assert_eq!(decode_bit_string_u32(&[0x00, 0x40]).unwrap(), 0x40000000);
        assert!(decode_bit_string_u32(&[0x08, 0x00]).is_err());
    }
}
