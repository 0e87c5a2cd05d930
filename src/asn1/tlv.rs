//! Incremental reading of Tag-Length-Value headers.
//!
//! Headers may arrive split across any number of fragments, so the reader
//! is fed one octet at a time and keeps its partial state between calls.

use super::Tag;
use crate::error::ProtocolError;

/// Longest length field accepted, in octets after the initial one.
const MAX_LENGTH_OCTETS: usize = 4;

/// Longest high tag number accepted, in octets after the initial one.
const MAX_TAG_OCTETS: usize = 4;

/// Tag and length of a TLV, with the number of octets they took.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tlv {
    pub tag: Tag,
    pub length: usize,
    pub header_length: usize,
}

impl Tlv {
    /// Total number of octets covered by the TLV, header included.
    pub fn total_length(&self) -> usize {
        return self.header_length + self.length;
    }
}

#[derive(Debug)]
enum HeaderState {
    Tag,
    TagNumber { tag: Tag, octets: usize },
    Length { tag: Tag },
    LongLength {
        tag: Tag,
        remaining: usize,
        length: usize,
    },
}

#[derive(Debug)]
pub struct TlvReader {
    state: HeaderState,
    consumed: usize,
}

impl Default for TlvReader {
    fn default() -> Self {
        return Self::new();
    }
}

impl TlvReader {
    pub fn new() -> Self {
        return Self {
            state: HeaderState::Tag,
            consumed: 0,
        };
    }

    /// True if no octet of the next header has been read yet.
    pub fn is_idle(&self) -> bool {
        return self.consumed == 0;
    }

    /// Feeds one octet. Returns the header once it is complete, resetting
    /// the reader for the next one.
    pub fn push(&mut self, octet: u8) -> Result<Option<Tlv>, ProtocolError> {
        self.consumed += 1;

        let (next, done) = match self.state {
            HeaderState::Tag => {
                let (tag, high) = Tag::from_first_octet(octet);
                if high {
                    let tag = Tag { number: 0, ..tag };
                    (HeaderState::TagNumber { tag, octets: 0 }, None)
                } else {
                    (HeaderState::Length { tag }, None)
                }
            }
            HeaderState::TagNumber { tag, octets } => {
                if octets == MAX_TAG_OCTETS {
                    return Err(ProtocolError::TagOverflow);
                }
                let number = (tag.number << 7) | (octet & 0x7F) as u32;
                let tag = Tag { number, ..tag };
                if octet & 0x80 != 0 {
                    (
                        HeaderState::TagNumber {
                            tag,
                            octets: octets + 1,
                        },
                        None,
                    )
                } else {
                    (HeaderState::Length { tag }, None)
                }
            }
            HeaderState::Length { tag } => {
                if octet < 0x80 {
                    (HeaderState::Tag, Some((tag, octet as usize)))
                } else if octet == 0x80 {
                    return Err(ProtocolError::IndefiniteLength);
                } else {
                    let octets = (octet & 0x7F) as usize;
                    if octets > MAX_LENGTH_OCTETS {
                        return Err(ProtocolError::LengthOverflow(octets));
                    }
                    (
                        HeaderState::LongLength {
                            tag,
                            remaining: octets,
                            length: 0,
                        },
                        None,
                    )
                }
            }
            HeaderState::LongLength {
                tag,
                remaining,
                length,
            } => {
                let length = (length << 8) | octet as usize;
                if remaining == 1 {
                    (HeaderState::Tag, Some((tag, length)))
                } else {
                    (
                        HeaderState::LongLength {
                            tag,
                            remaining: remaining - 1,
                            length,
                        },
                        None,
                    )
                }
            }
        };
        self.state = next;

        if let Some((tag, length)) = done {
            let header_length = self.consumed;
            self.consumed = 0;
            return Ok(Some(Tlv {
                tag,
                length,
                header_length,
            }));
        }

        return Ok(None);
    }
}
