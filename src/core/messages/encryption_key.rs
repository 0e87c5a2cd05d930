use super::{required, Asn1Message, Message, MessageType};
use crate::asn1::der;
use crate::asn1::primitives::decode_int32;
use crate::asn1::{Action, Container, Grammar, Tag};
use crate::error::Result;
use lazy_static::lazy_static;
use std::fmt;

/// EncryptionKey ::= SEQUENCE {
///     keytype     [0] Int32,
///     keyvalue    [1] OCTET STRING
/// }
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey {
    pub keytype: i32,
    pub keyvalue: Vec<u8>,
}

impl EncryptionKey {
    pub fn new(keytype: i32, keyvalue: Vec<u8>) -> Self {
        return Self { keytype, keyvalue };
    }
}

/// Key bytes never show up in logs.
impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("keytype", &self.keytype)
            .field("keyvalue", &format!("<{} bytes>", self.keyvalue.len()))
            .finish()
    }
}

impl Asn1Message for EncryptionKey {
    const MESSAGE_TYPE: MessageType = MessageType::EncryptionKey;

    fn build(&self) -> Vec<u8> {
        return der::sequence(&[
            der::explicit(0, &der::integer(self.keytype as i64)),
            der::explicit(1, &der::octet_string(&self.keyvalue)),
        ]);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum State {
    Start,
    Sequence,
    KeyTypeTag,
    KeyType,
    KeyValueTag,
    KeyValue,
}

#[derive(Default)]
pub(crate) struct EncryptionKeyContainer {
    keytype: Option<i32>,
    keyvalue: Option<Vec<u8>>,
}

lazy_static! {
    static ref GRAMMAR: Grammar<EncryptionKeyContainer> =
        Grammar::new("EncryptionKey")
            .on(State::Start, Tag::SEQUENCE, Action::Constructed, State::Sequence)
            .on(State::Sequence, Tag::context(0), Action::Explicit, State::KeyTypeTag)
            .on(
                State::KeyTypeTag,
                Tag::INTEGER,
                Action::Store(store_keytype),
                State::KeyType
            )
            .on(State::KeyType, Tag::context(1), Action::Explicit, State::KeyValueTag)
            .on(
                State::KeyValueTag,
                Tag::OCTET_STRING,
                Action::Store(store_keyvalue),
                State::KeyValue
            )
            .accept(&[State::KeyValue]);
}

fn store_keytype(container: &mut EncryptionKeyContainer, value: &[u8]) -> Result<()> {
    container.keytype = Some(decode_int32(value)?);
    return Ok(());
}

fn store_keyvalue(container: &mut EncryptionKeyContainer, value: &[u8]) -> Result<()> {
    container.keyvalue = Some(value.to_vec());
    return Ok(());
}

impl Container for EncryptionKeyContainer {
    type State = State;
    const START: State = State::Start;

    fn grammar() -> &'static Grammar<Self> {
        return &GRAMMAR;
    }

    fn finish(self) -> Result<Message> {
        let name = GRAMMAR.name();
        return Ok(EncryptionKey {
            keytype: required(self.keytype, name, "keytype")?,
            keyvalue: required(self.keyvalue, name, "keyvalue")?,
        }
        .into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_key_bytes() {
        let key = EncryptionKey::new(18, vec![0xAB; 32]);
        let debug = format!("{:?}", key);
        assert!(debug.contains("<32 bytes>"));
        assert!(!debug.contains("171"));
    }

    #[test]
    fn test_parse_encryption_key() {
        let raw = vec![
            0x30, 0x0B, 0xA0, 0x03, 0x02, 0x01, 0x17, 0xA1, 0x04, 0x04, 0x02,
            0x01, 0x02,
        ];
        let key = EncryptionKey::parse(&raw).unwrap();
        assert_eq!(key, EncryptionKey::new(23, vec![0x01, 0x02]));
        assert_eq!(key.build(), raw);
    }

    #[test]
    fn test_parse_missing_keyvalue() {
        let raw = vec![0x30, 0x05, 0xA0, 0x03, 0x02, 0x01, 0x17];
        let err = EncryptionKey::parse(&raw).unwrap_err();
        assert!(err.is_protocol_error());
    }
}
