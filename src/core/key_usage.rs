use kerberos_constants::{etypes, key_usages};
use std::fmt;

/// Key usage number passed to the ciphers. Each protocol field is
/// encrypted under its own usage, so a ciphertext lifted from one field
/// does not decrypt as another.
///
/// RC4-HMAC is the exception: RFC 4757 encrypts the AS-REP enc-part under
/// usage 8, so with that etype `AS_REP_ENC_PART` and
/// `TGS_REP_ENC_PART_SESSION_KEY` are interchangeable. See [`effective`].
///
/// [`effective`]: KeyUsage::effective
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeyUsage(i32);

impl KeyUsage {
    /// Ticket enc-part, sealed with the service key.
    pub const AS_REP_TICKET: KeyUsage =
        KeyUsage(key_usages::KEY_USAGE_AS_REP_TICKET);

    /// EncASRepPart, sealed with the client key.
    pub const AS_REP_ENC_PART: KeyUsage =
        KeyUsage(key_usages::KEY_USAGE_AS_REP_ENC_PART);

    /// EncTGSRepPart, sealed with the TGS session key.
    pub const TGS_REP_ENC_PART_SESSION_KEY: KeyUsage =
        KeyUsage(key_usages::KEY_USAGE_TGS_REP_ENC_PART_SESSION_KEY);

    pub const AS_REQ_TIMESTAMP: KeyUsage =
        KeyUsage(key_usages::KEY_USAGE_AS_REQ_TIMESTAMP);

    pub const TGS_REQ_AUTHEN: KeyUsage =
        KeyUsage(key_usages::KEY_USAGE_TGS_REQ_AUTHEN);

    pub const fn new(number: i32) -> Self {
        return Self(number);
    }

    pub fn number(&self) -> i32 {
        return self.0;
    }

    /// Usage the cipher of `etype` actually applies.
    pub fn effective(&self, etype: i32) -> KeyUsage {
        if etype == etypes::RC4_HMAC && *self == Self::AS_REP_ENC_PART {
            return Self::TGS_REP_ENC_PART_SESSION_KEY;
        }
        return *self;
    }
}

impl From<KeyUsage> for i32 {
    fn from(usage: KeyUsage) -> Self {
        return usage.0;
    }
}

impl fmt::Display for KeyUsage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
