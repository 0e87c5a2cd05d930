use super::{required, Asn1Message, Message, MessageType};
use crate::asn1::der;
use crate::asn1::primitives::decode_int32;
use crate::asn1::{Action, Container, Grammar, Tag};
use crate::error::Result;
use lazy_static::lazy_static;
use std::convert::TryFrom;

/// AuthorizationData ::= SEQUENCE OF SEQUENCE {
///     ad-type     [0] Int32,
///     ad-data     [1] OCTET STRING
/// }
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationDataEntry {
    pub ad_type: i32,
    pub ad_data: Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthorizationData {
    pub entries: Vec<AuthorizationDataEntry>,
}

impl Asn1Message for AuthorizationDataEntry {
    const MESSAGE_TYPE: MessageType = MessageType::AuthorizationDataEntry;

    fn build(&self) -> Vec<u8> {
        return der::sequence(&[
            der::explicit(0, &der::integer(self.ad_type as i64)),
            der::explicit(1, &der::octet_string(&self.ad_data)),
        ]);
    }
}

impl Asn1Message for AuthorizationData {
    const MESSAGE_TYPE: MessageType = MessageType::AuthorizationData;

    fn build(&self) -> Vec<u8> {
        let entries: Vec<Vec<u8>> = self
            .entries
            .iter()
            .map(AuthorizationDataEntry::build)
            .collect();
        return der::sequence(&entries);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum EntryState {
    Start,
    Sequence,
    AdTypeTag,
    AdType,
    AdDataTag,
    AdData,
}

#[derive(Default)]
pub(crate) struct AuthorizationDataEntryContainer {
    ad_type: Option<i32>,
    ad_data: Option<Vec<u8>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum DataState {
    Start,
    Sequence,
}

#[derive(Default)]
pub(crate) struct AuthorizationDataContainer {
    entries: Vec<AuthorizationDataEntry>,
}

lazy_static! {
    static ref ENTRY_GRAMMAR: Grammar<AuthorizationDataEntryContainer> =
        Grammar::new("AuthorizationDataEntry")
            .on(EntryState::Start, Tag::SEQUENCE, Action::Constructed, EntryState::Sequence)
            .on(EntryState::Sequence, Tag::context(0), Action::Explicit, EntryState::AdTypeTag)
            .on(
                EntryState::AdTypeTag,
                Tag::INTEGER,
                Action::Store(store_ad_type),
                EntryState::AdType
            )
            .on(EntryState::AdType, Tag::context(1), Action::Explicit, EntryState::AdDataTag)
            .on_maybe_empty(
                EntryState::AdDataTag,
                Tag::OCTET_STRING,
                Action::Store(store_ad_data),
                EntryState::AdData
            )
            .accept(&[EntryState::AdData]);

    static ref DATA_GRAMMAR: Grammar<AuthorizationDataContainer> =
        Grammar::new("AuthorizationData")
            .on(DataState::Start, Tag::SEQUENCE, Action::Constructed, DataState::Sequence)
            .on(
                DataState::Sequence,
                Tag::SEQUENCE,
                Action::Nested(MessageType::AuthorizationDataEntry, merge_entry),
                DataState::Sequence
            )
            .accept(&[DataState::Sequence]);
}

fn store_ad_type(container: &mut AuthorizationDataEntryContainer, value: &[u8]) -> Result<()> {
    container.ad_type = Some(decode_int32(value)?);
    return Ok(());
}

fn store_ad_data(container: &mut AuthorizationDataEntryContainer, value: &[u8]) -> Result<()> {
    container.ad_data = Some(value.to_vec());
    return Ok(());
}

fn merge_entry(container: &mut AuthorizationDataContainer, message: Message) -> Result<()> {
    container
        .entries
        .push(AuthorizationDataEntry::try_from(message)?);
    return Ok(());
}

impl Container for AuthorizationDataEntryContainer {
    type State = EntryState;
    const START: EntryState = EntryState::Start;

    fn grammar() -> &'static Grammar<Self> {
        return &ENTRY_GRAMMAR;
    }

    fn finish(self) -> Result<Message> {
        let name = ENTRY_GRAMMAR.name();
        return Ok(AuthorizationDataEntry {
            ad_type: required(self.ad_type, name, "ad-type")?,
            ad_data: required(self.ad_data, name, "ad-data")?,
        }
        .into());
    }
}

impl Container for AuthorizationDataContainer {
    type State = DataState;
    const START: DataState = DataState::Start;

    fn grammar() -> &'static Grammar<Self> {
        return &DATA_GRAMMAR;
    }

    fn finish(self) -> Result<Message> {
        return Ok(AuthorizationData {
            entries: self.entries,
        }
        .into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AD_IF_RELEVANT: i32 = 1;

    #[test]
    fn test_parse_authorization_data() {
        let inner = AuthorizationData {
            entries: vec![AuthorizationDataEntry {
                ad_type: 128,
                ad_data: vec![0xCA, 0xFE],
            }],
        };
        let data = AuthorizationData {
            entries: vec![AuthorizationDataEntry {
                ad_type: AD_IF_RELEVANT,
                ad_data: inner.build(),
            }],
        };

        let parsed = AuthorizationData::parse(&data.build()).unwrap();
        assert_eq!(parsed, data);
        assert_eq!(
            AuthorizationData::parse(&parsed.entries[0].ad_data).unwrap(),
            inner
        );
    }

    #[test]
    fn test_empty_authorization_data_rejected() {
        let err = AuthorizationData::parse(&[0x30, 0x00]).unwrap_err();
        assert!(err.is_protocol_error());
    }
}
