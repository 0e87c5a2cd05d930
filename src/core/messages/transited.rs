use super::{required, Asn1Message, Message, MessageType};
use crate::asn1::der;
use crate::asn1::primitives::decode_int32;
use crate::asn1::{Action, Container, Grammar, Tag};
use crate::error::Result;
use lazy_static::lazy_static;

/// Domain-X500-compress, the only transited encoding defined.
pub const DOMAIN_X500_COMPRESS: i32 = 1;

/// TransitedEncoding ::= SEQUENCE {
///     tr-type     [0] Int32,
///     contents    [1] OCTET STRING
/// }
///
/// The default value, with empty contents, is the one of a ticket issued
/// directly by the realm of the service.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransitedEncoding {
    pub tr_type: i32,
    pub contents: Vec<u8>,
}

impl Asn1Message for TransitedEncoding {
    const MESSAGE_TYPE: MessageType = MessageType::TransitedEncoding;

    fn build(&self) -> Vec<u8> {
        return der::sequence(&[
            der::explicit(0, &der::integer(self.tr_type as i64)),
            der::explicit(1, &der::octet_string(&self.contents)),
        ]);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum State {
    Start,
    Sequence,
    TrTypeTag,
    TrType,
    ContentsTag,
    Contents,
}

#[derive(Default)]
pub(crate) struct TransitedEncodingContainer {
    tr_type: Option<i32>,
    contents: Option<Vec<u8>>,
}

lazy_static! {
    static ref GRAMMAR: Grammar<TransitedEncodingContainer> =
        Grammar::new("TransitedEncoding")
            .on(State::Start, Tag::SEQUENCE, Action::Constructed, State::Sequence)
            .on(State::Sequence, Tag::context(0), Action::Explicit, State::TrTypeTag)
            .on(State::TrTypeTag, Tag::INTEGER, Action::Store(store_tr_type), State::TrType)
            .on(State::TrType, Tag::context(1), Action::Explicit, State::ContentsTag)
            .on_maybe_empty(
                State::ContentsTag,
                Tag::OCTET_STRING,
                Action::Store(store_contents),
                State::Contents
            )
            .accept(&[State::Contents]);
}

fn store_tr_type(container: &mut TransitedEncodingContainer, value: &[u8]) -> Result<()> {
    container.tr_type = Some(decode_int32(value)?);
    return Ok(());
}

fn store_contents(container: &mut TransitedEncodingContainer, value: &[u8]) -> Result<()> {
    container.contents = Some(value.to_vec());
    return Ok(());
}

impl Container for TransitedEncodingContainer {
    type State = State;
    const START: State = State::Start;

    fn grammar() -> &'static Grammar<Self> {
        return &GRAMMAR;
    }

    fn finish(self) -> Result<Message> {
        let name = GRAMMAR.name();
        return Ok(TransitedEncoding {
            tr_type: required(self.tr_type, name, "tr-type")?,
            contents: required(self.contents, name, "contents")?,
        }
        .into());
    }
}
