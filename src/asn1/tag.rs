use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TagClass {
    Universal,
    Application,
    Context,
    Private,
}

impl TagClass {
    fn from_bits(bits: u8) -> Self {
        match bits & 0xC0 {
            0x00 => TagClass::Universal,
            0x40 => TagClass::Application,
            0x80 => TagClass::Context,
            _ => TagClass::Private,
        }
    }

    fn bits(self) -> u8 {
        match self {
            TagClass::Universal => 0x00,
            TagClass::Application => 0x40,
            TagClass::Context => 0x80,
            TagClass::Private => 0xC0,
        }
    }
}

/// BER identifier: class, primitive/constructed bit and tag number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tag {
    pub class: TagClass,
    pub constructed: bool,
    pub number: u32,
}

impl Tag {
    pub const INTEGER: Tag = Tag::universal(0x02, false);
    pub const BIT_STRING: Tag = Tag::universal(0x03, false);
    pub const OCTET_STRING: Tag = Tag::universal(0x04, false);
    pub const SEQUENCE: Tag = Tag::universal(0x10, true);
    pub const GENERALIZED_TIME: Tag = Tag::universal(0x18, false);
    pub const GENERAL_STRING: Tag = Tag::universal(0x1B, false);

    pub const fn universal(number: u32, constructed: bool) -> Self {
        return Self {
            class: TagClass::Universal,
            constructed,
            number,
        };
    }

    /// Explicit context tag `[n]`, always constructed.
    pub const fn context(number: u32) -> Self {
        return Self {
            class: TagClass::Context,
            constructed: true,
            number,
        };
    }

    /// Explicit application tag `[APPLICATION n]`, always constructed.
    pub const fn application(number: u32) -> Self {
        return Self {
            class: TagClass::Application,
            constructed: true,
            number,
        };
    }

    /// Parses the first identifier octet. Returns the tag and whether the
    /// number continues in subsequent octets (high tag number form).
    pub(crate) fn from_first_octet(octet: u8) -> (Self, bool) {
        let tag = Self {
            class: TagClass::from_bits(octet),
            constructed: octet & 0x20 != 0,
            number: (octet & 0x1F) as u32,
        };
        return (tag, octet & 0x1F == 0x1F);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut first = self.class.bits();
        if self.constructed {
            first |= 0x20;
        }

        if self.number < 0x1F {
            return vec![first | self.number as u8];
        }

        let mut bytes = vec![first | 0x1F];
        let mut groups = Vec::new();
        let mut number = self.number;
        loop {
            groups.push((number & 0x7F) as u8);
            number >>= 7;
            if number == 0 {
                break;
            }
        }
        for (i, group) in groups.iter().rev().enumerate() {
            if i + 1 < groups.len() {
                bytes.push(group | 0x80);
            } else {
                bytes.push(*group);
            }
        }
        return bytes;
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class {
            TagClass::Universal => write!(f, "UNIVERSAL {}", self.number),
            TagClass::Application => write!(f, "[APPLICATION {}]", self.number),
            TagClass::Context => write!(f, "[{}]", self.number),
            TagClass::Private => write!(f, "[PRIVATE {}]", self.number),
        }
    }
}
