//! Canonical DER writers used to build messages before sealing or
//! sending them.

use super::Tag;

pub fn encode_length(length: usize) -> Vec<u8> {
    if length < 0x80 {
        return vec![length as u8];
    }

    let bytes = (length as u64).to_be_bytes();
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(7);
    let mut encoded = vec![0x80 | (8 - start) as u8];
    encoded.extend_from_slice(&bytes[start..]);
    return encoded;
}

pub fn tlv(tag: Tag, content: &[u8]) -> Vec<u8> {
    let mut raw = tag.to_bytes();
    raw.extend(encode_length(content.len()));
    raw.extend_from_slice(content);
    return raw;
}

/// Minimal two's complement INTEGER.
pub fn integer(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < 7 {
        let redundant_zero = bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0;
        let redundant_ones = bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0;
        if !(redundant_zero || redundant_ones) {
            break;
        }
        start += 1;
    }
    return tlv(Tag::INTEGER, &bytes[start..]);
}

pub fn octet_string(value: &[u8]) -> Vec<u8> {
    return tlv(Tag::OCTET_STRING, value);
}

pub fn kerberos_string(value: &str) -> Vec<u8> {
    return tlv(Tag::GENERAL_STRING, value.as_bytes());
}

pub fn generalized_time(value: &str) -> Vec<u8> {
    return tlv(Tag::GENERALIZED_TIME, value.as_bytes());
}

/// 32 bit KerberosFlags: no unused bits, most significant bit is flag 0.
pub fn bit_string(flags: u32) -> Vec<u8> {
    let mut content = vec![0x00];
    content.extend_from_slice(&flags.to_be_bytes());
    return tlv(Tag::BIT_STRING, &content);
}

pub fn sequence(elements: &[Vec<u8>]) -> Vec<u8> {
    return tlv(Tag::SEQUENCE, &elements.concat());
}

pub fn explicit(number: u32, inner: &[u8]) -> Vec<u8> {
    return tlv(Tag::context(number), inner);
}

pub fn application(number: u32, inner: &[u8]) -> Vec<u8> {
    return tlv(Tag::application(number), inner);
}
