use super::{required, Asn1Message, Message, MessageType};
use crate::asn1::der;
use crate::asn1::primitives::{decode_int32, decode_uint32};
use crate::asn1::{Action, Container, Grammar, Tag};
use crate::error::Result;
use lazy_static::lazy_static;

/// EncryptedData ::= SEQUENCE {
///     etype   [0] Int32,
///     kvno    [1] UInt32 OPTIONAL,
///     cipher  [2] OCTET STRING
/// }
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedData {
    pub etype: i32,
    pub kvno: Option<u32>,
    pub cipher: Vec<u8>,
}

impl EncryptedData {
    pub fn new(etype: i32, kvno: Option<u32>, cipher: Vec<u8>) -> Self {
        return Self {
            etype,
            kvno,
            cipher,
        };
    }
}

impl Asn1Message for EncryptedData {
    const MESSAGE_TYPE: MessageType = MessageType::EncryptedData;

    fn build(&self) -> Vec<u8> {
        let mut fields = vec![der::explicit(0, &der::integer(self.etype as i64))];
        if let Some(kvno) = self.kvno {
            fields.push(der::explicit(1, &der::integer(kvno as i64)));
        }
        fields.push(der::explicit(2, &der::octet_string(&self.cipher)));
        return der::sequence(&fields);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum State {
    Start,
    Sequence,
    EtypeTag,
    Etype,
    KvnoTag,
    Kvno,
    CipherTag,
    Cipher,
}

#[derive(Default)]
pub(crate) struct EncryptedDataContainer {
    etype: Option<i32>,
    kvno: Option<u32>,
    cipher: Option<Vec<u8>>,
}

lazy_static! {
    static ref GRAMMAR: Grammar<EncryptedDataContainer> =
        Grammar::new("EncryptedData")
            .on(State::Start, Tag::SEQUENCE, Action::Constructed, State::Sequence)
            .on(State::Sequence, Tag::context(0), Action::Explicit, State::EtypeTag)
            .on(State::EtypeTag, Tag::INTEGER, Action::Store(store_etype), State::Etype)
            .on(State::Etype, Tag::context(1), Action::Explicit, State::KvnoTag)
            .on(State::KvnoTag, Tag::INTEGER, Action::Store(store_kvno), State::Kvno)
            .on_any(
                &[State::Etype, State::Kvno],
                Tag::context(2),
                Action::Explicit,
                State::CipherTag
            )
            .on(
                State::CipherTag,
                Tag::OCTET_STRING,
                Action::Store(store_cipher),
                State::Cipher
            )
            .accept(&[State::Cipher])
            .extensible(&[State::Etype]);
}

fn store_etype(container: &mut EncryptedDataContainer, value: &[u8]) -> Result<()> {
    container.etype = Some(decode_int32(value)?);
    return Ok(());
}

fn store_kvno(container: &mut EncryptedDataContainer, value: &[u8]) -> Result<()> {
    container.kvno = Some(decode_uint32(value)?);
    return Ok(());
}

fn store_cipher(container: &mut EncryptedDataContainer, value: &[u8]) -> Result<()> {
    container.cipher = Some(value.to_vec());
    return Ok(());
}

impl Container for EncryptedDataContainer {
    type State = State;
    const START: State = State::Start;

    fn grammar() -> &'static Grammar<Self> {
        return &GRAMMAR;
    }

    fn finish(self) -> Result<Message> {
        let name = GRAMMAR.name();
        return Ok(EncryptedData {
            etype: required(self.etype, name, "etype")?,
            kvno: self.kvno,
            cipher: required(self.cipher, name, "cipher")?,
        }
        .into());
    }
}
