use super::{required, Asn1Message, KerberosTime, Message, MessageType};
use crate::asn1::der;
use crate::asn1::primitives::decode_int32;
use crate::asn1::{Action, Container, Grammar, Tag};
use crate::error::Result;
use lazy_static::lazy_static;
use std::convert::TryFrom;

/// LastReq ::= SEQUENCE OF SEQUENCE {
///     lr-type     [0] Int32,
///     lr-value    [1] KerberosTime
/// }
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LastReqEntry {
    pub lr_type: i32,
    pub lr_value: KerberosTime,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LastReq {
    pub entries: Vec<LastReqEntry>,
}

impl Asn1Message for LastReqEntry {
    const MESSAGE_TYPE: MessageType = MessageType::LastReqEntry;

    fn build(&self) -> Vec<u8> {
        return der::sequence(&[
            der::explicit(0, &der::integer(self.lr_type as i64)),
            der::explicit(
                1,
                &der::generalized_time(&self.lr_value.to_generalized_time()),
            ),
        ]);
    }
}

impl Asn1Message for LastReq {
    const MESSAGE_TYPE: MessageType = MessageType::LastReq;

    fn build(&self) -> Vec<u8> {
        let entries: Vec<Vec<u8>> =
            self.entries.iter().map(LastReqEntry::build).collect();
        return der::sequence(&entries);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum EntryState {
    Start,
    Sequence,
    LrTypeTag,
    LrType,
    LrValueTag,
    LrValue,
}

#[derive(Default)]
pub(crate) struct LastReqEntryContainer {
    lr_type: Option<i32>,
    lr_value: Option<KerberosTime>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum LastReqState {
    Start,
    Sequence,
}

#[derive(Default)]
pub(crate) struct LastReqContainer {
    entries: Vec<LastReqEntry>,
}

lazy_static! {
    static ref ENTRY_GRAMMAR: Grammar<LastReqEntryContainer> =
        Grammar::new("LastReqEntry")
            .on(EntryState::Start, Tag::SEQUENCE, Action::Constructed, EntryState::Sequence)
            .on(EntryState::Sequence, Tag::context(0), Action::Explicit, EntryState::LrTypeTag)
            .on(
                EntryState::LrTypeTag,
                Tag::INTEGER,
                Action::Store(store_lr_type),
                EntryState::LrType
            )
            .on(EntryState::LrType, Tag::context(1), Action::Explicit, EntryState::LrValueTag)
            .on(
                EntryState::LrValueTag,
                Tag::GENERALIZED_TIME,
                Action::Store(store_lr_value),
                EntryState::LrValue
            )
            .accept(&[EntryState::LrValue]);

    static ref LAST_REQ_GRAMMAR: Grammar<LastReqContainer> =
        Grammar::new("LastReq")
            .on(LastReqState::Start, Tag::SEQUENCE, Action::Constructed, LastReqState::Sequence)
            .on(
                LastReqState::Sequence,
                Tag::SEQUENCE,
                Action::Nested(MessageType::LastReqEntry, merge_entry),
                LastReqState::Sequence
            )
            .accept(&[LastReqState::Sequence]);
}

fn store_lr_type(container: &mut LastReqEntryContainer, value: &[u8]) -> Result<()> {
    container.lr_type = Some(decode_int32(value)?);
    return Ok(());
}

fn store_lr_value(container: &mut LastReqEntryContainer, value: &[u8]) -> Result<()> {
    container.lr_value = Some(KerberosTime::parse(value)?);
    return Ok(());
}

fn merge_entry(container: &mut LastReqContainer, message: Message) -> Result<()> {
    container.entries.push(LastReqEntry::try_from(message)?);
    return Ok(());
}

impl Container for LastReqEntryContainer {
    type State = EntryState;
    const START: EntryState = EntryState::Start;

    fn grammar() -> &'static Grammar<Self> {
        return &ENTRY_GRAMMAR;
    }

    fn finish(self) -> Result<Message> {
        let name = ENTRY_GRAMMAR.name();
        return Ok(LastReqEntry {
            lr_type: required(self.lr_type, name, "lr-type")?,
            lr_value: required(self.lr_value, name, "lr-value")?,
        }
        .into());
    }
}

impl Container for LastReqContainer {
    type State = LastReqState;
    const START: LastReqState = LastReqState::Start;

    fn grammar() -> &'static Grammar<Self> {
        return &LAST_REQ_GRAMMAR;
    }

    fn finish(self) -> Result<Message> {
        return Ok(LastReq {
            entries: self.entries,
        }
        .into());
    }
}
