use super::{required, Asn1Message, Message, MessageType};
use crate::asn1::der;
use crate::asn1::primitives::{decode_int32, decode_kerberos_string};
use crate::asn1::{Action, Container, Grammar, Tag};
use crate::error::Result;
use kerberos_constants::principal_names;
use lazy_static::lazy_static;
use std::fmt;

/// PrincipalName ::= SEQUENCE {
///     name-type   [0] Int32,
///     name-string [1] SEQUENCE OF KerberosString
/// }
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PrincipalName {
    pub name_type: i32,
    pub name_string: Vec<String>,
}

impl fmt::Display for PrincipalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name_string.join("/"))
    }
}

pub fn new_nt_principal(name: &str) -> PrincipalName {
    return new_principal_name(name, principal_names::NT_PRINCIPAL);
}

pub fn new_nt_srv_inst(service: &str) -> PrincipalName {
    return new_principal_name(service, principal_names::NT_SRV_INST);
}

pub fn new_principal_name(name: &str, name_type: i32) -> PrincipalName {
    return PrincipalName {
        name_type: name_type,
        name_string: spn_to_service_parts(name),
    };
}

pub fn spn_to_service_parts(spn: &str) -> Vec<String> {
    spn.split("/").map(|s| s.to_string()).collect()
}

impl Asn1Message for PrincipalName {
    const MESSAGE_TYPE: MessageType = MessageType::PrincipalName;

    fn build(&self) -> Vec<u8> {
        let names: Vec<Vec<u8>> = self
            .name_string
            .iter()
            .map(|name| der::kerberos_string(name))
            .collect();

        return der::sequence(&[
            der::explicit(0, &der::integer(self.name_type as i64)),
            der::explicit(1, &der::sequence(&names)),
        ]);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum State {
    Start,
    Sequence,
    NameTypeTag,
    NameType,
    NameStringTag,
    NameString,
    NameStringDone,
}

#[derive(Default)]
pub(crate) struct PrincipalNameContainer {
    name_type: Option<i32>,
    name_string: Vec<String>,
}

lazy_static! {
    static ref GRAMMAR: Grammar<PrincipalNameContainer> =
        Grammar::new("PrincipalName")
            .on(State::Start, Tag::SEQUENCE, Action::Constructed, State::Sequence)
            .on(State::Sequence, Tag::context(0), Action::Explicit, State::NameTypeTag)
            .on(
                State::NameTypeTag,
                Tag::INTEGER,
                Action::Store(store_name_type),
                State::NameType
            )
            .on(State::NameType, Tag::context(1), Action::Explicit, State::NameStringTag)
            .on(
                State::NameStringTag,
                Tag::SEQUENCE,
                Action::Constructed,
                State::NameString
            )
            .on(
                State::NameString,
                Tag::GENERAL_STRING,
                Action::Store(store_name_string),
                State::NameString
            )
            .on_close(State::NameString, State::NameStringDone)
            .accept(&[State::NameStringDone]);
}

fn store_name_type(container: &mut PrincipalNameContainer, value: &[u8]) -> Result<()> {
    container.name_type = Some(decode_int32(value)?);
    return Ok(());
}

fn store_name_string(container: &mut PrincipalNameContainer, value: &[u8]) -> Result<()> {
    container.name_string.push(decode_kerberos_string(value)?);
    return Ok(());
}

impl Container for PrincipalNameContainer {
    type State = State;
    const START: State = State::Start;

    fn grammar() -> &'static Grammar<Self> {
        return &GRAMMAR;
    }

    fn finish(self) -> Result<Message> {
        return Ok(PrincipalName {
            name_type: required(self.name_type, GRAMMAR.name(), "name-type")?,
            name_string: self.name_string,
        }
        .into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ProtocolError};

    #[test]
    fn test_service_parts() {
        let name = new_nt_srv_inst("krbtgt/EXAMPLE.COM");
        assert_eq!(name.name_type, principal_names::NT_SRV_INST);
        assert_eq!(name.name_string, vec!["krbtgt", "EXAMPLE.COM"]);
        assert_eq!(name.to_string(), "krbtgt/EXAMPLE.COM");
    }

    #[test]
    fn test_parse_principal_name() {
        let name = new_nt_srv_inst("krbtgt/EXAMPLE.COM");
        let raw = name.build();
        assert_eq!(PrincipalName::parse(&raw).unwrap(), name);
    }

    #[test]
    fn test_parse_fragmented_input() {
        let name = new_nt_principal("alice");
        let raw = name.build();
        let mut decoder = crate::asn1::Asn1Decoder::new(MessageType::PrincipalName);
        let mut decoded = None;
        for octet in raw.iter() {
            if let Some(message) = decoder.feed(&[*octet]).unwrap() {
                decoded = Some(message);
            }
        }
        assert_eq!(decoded, Some(Message::PrincipalName(name)));
    }

    #[test]
    fn test_empty_name_string_rejected() {
        let raw = der::sequence(&[
            der::explicit(0, &der::integer(1)),
            der::explicit(1, &der::sequence(&[])),
        ]);
        match PrincipalName::parse(&raw) {
            Err(Error::Protocol(ProtocolError::ZeroLength(tag))) => {
                assert_eq!(tag, Tag::SEQUENCE);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_extra_string_outside_sequence_of() {
        // name-string SEQUENCE OF declares one string but [1] holds two
        let raw = der::sequence(&[
            der::explicit(0, &der::integer(1)),
            der::explicit(
                1,
                &[der::sequence(&[der::kerberos_string("a")]), der::kerberos_string("b")]
                    .concat(),
            ),
        ]);
        match PrincipalName::parse(&raw) {
            Err(Error::Protocol(ProtocolError::LengthMismatch { .. })) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_string_after_name_string_rejected() {
        let raw = der::sequence(&[
            der::explicit(0, &der::integer(1)),
            der::explicit(1, &der::sequence(&[der::kerberos_string("a")])),
            der::kerberos_string("b"),
        ]);
        match PrincipalName::parse(&raw) {
            Err(Error::Protocol(ProtocolError::UnexpectedTag { state, tag, .. })) => {
                assert_eq!(state, "NameStringDone");
                assert_eq!(tag, Tag::GENERAL_STRING);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }
}
