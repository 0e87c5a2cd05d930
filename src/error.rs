use crate::asn1::Tag;
use kerberos_constants::error_codes;
use std::io;
use std::result;
use thiserror::Error;

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or non-conformant wire data.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Failures of encryption, decryption or key handling.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Well formed data whose content is semantically inconsistent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Errors due to IO while reading the byte stream.
    #[error("{0}: {1}")]
    IOError(String, io::Error),
}

impl Error {
    pub fn is_protocol_error(&self) -> bool {
        if let Error::Protocol(_) = self {
            return true;
        }
        return false;
    }

    pub fn is_crypto_error(&self) -> bool {
        if let Error::Crypto(_) = self {
            return true;
        }
        return false;
    }

    pub fn is_validation_error(&self) -> bool {
        if let Error::Validation(_) = self {
            return true;
        }
        return false;
    }

    /// Code to report to the peer in a KRB-ERROR. Every failure collapses
    /// into the same generic code so the peer cannot tell a malformed
    /// message from a bad key or a bad checksum.
    pub fn krb_error_code(&self) -> i32 {
        return error_codes::KRB_ERR_GENERIC;
    }
}

impl From<(&str, io::Error)> for Error {
    fn from(error: (&str, io::Error)) -> Self {
        return Self::IOError(error.0.into(), error.1);
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("zero length TLV not permitted for tag {0}")]
    ZeroLength(Tag),

    #[error("length mismatch: {expected} bytes remaining in scope, {actual} declared")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("unexpected tag {tag} in state {state} of {grammar}")]
    UnexpectedTag {
        grammar: &'static str,
        state: String,
        tag: Tag,
    },

    #[error("stream truncated before the end of the message")]
    Truncated,

    #[error("{0} bytes found after the end of the message")]
    TrailingBytes(usize),

    #[error("{grammar} ended in state {state} before its mandatory fields")]
    Incomplete {
        grammar: &'static str,
        state: String,
    },

    #[error("indefinite length form is not allowed")]
    IndefiniteLength,

    #[error("length field of {0} octets is too long")]
    LengthOverflow(usize),

    #[error("tag number is too long")]
    TagOverflow,

    #[error("message of {0} bytes exceeds the maximum PDU size")]
    TooLarge(usize),

    #[error("nesting deeper than {0} levels")]
    TooDeep(usize),

    #[error("invalid {what}: {reason}")]
    InvalidValue {
        what: &'static str,
        reason: String,
    },

    #[error("expected {expected} but decoded {found}")]
    MessageMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("decoder already failed")]
    Aborted,
}

impl ProtocolError {
    pub fn invalid<S: Into<String>>(what: &'static str, reason: S) -> Self {
        return Self::InvalidValue {
            what,
            reason: reason.into(),
        };
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("unsupported encryption type {0}")]
    UnsupportedEtype(i32),

    #[error("key of etype {key} cannot decrypt data of etype {data}")]
    EtypeMismatch { key: i32, data: i32 },

    /// Decryption or integrity check failed. Raised for a wrong key as well
    /// as for a wrong key usage, which the ciphers cannot tell apart.
    #[error("integrity check failed")]
    Integrity,

    #[error("unable to generate random key material")]
    RandomGeneration,

    #[error("key of {actual} bytes does not fit etype {etype}")]
    InvalidKeyLength { etype: i32, actual: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("end time must be later than auth time")]
    EndTimeNotAfterAuthTime,

    #[error("start time is later than end time")]
    StartTimeAfterEndTime,

    #[error("renew-till set on a ticket without the RENEWABLE flag")]
    RenewTillWithoutRenewable,

    #[error("no secret found for principal {0}")]
    UnknownPrincipal(String),

    #[error("{0} is out of the representable time range")]
    TimeOutOfRange(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_collapse_into_generic_code() {
        let protocol: Error = ProtocolError::Truncated.into();
        let crypto: Error = CryptoError::Integrity.into();
        assert!(protocol.is_protocol_error());
        assert!(crypto.is_crypto_error());
        assert_eq!(protocol.krb_error_code(), crypto.krb_error_code());
        assert_eq!(crypto.krb_error_code(), error_codes::KRB_ERR_GENERIC);
    }
}
