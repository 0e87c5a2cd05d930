use super::{
    required, Asn1Message, EncryptedData, Message, MessageType, PrincipalName,
};
use crate::asn1::der;
use crate::asn1::primitives::{decode_integer, decode_kerberos_string};
use crate::asn1::{Action, Container, Grammar, Tag};
use crate::error::{ProtocolError, Result};
use lazy_static::lazy_static;
use std::convert::TryFrom;

pub const KERBEROS_V5: i32 = 5;

const TICKET_TAG: u32 = 1;

/// Ticket ::= [APPLICATION 1] SEQUENCE {
///     tkt-vno     [0] INTEGER (5),
///     realm       [1] Realm,
///     sname       [2] PrincipalName,
///     enc-part    [3] EncryptedData
/// }
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ticket {
    pub tkt_vno: i32,
    pub realm: String,
    pub sname: PrincipalName,
    pub enc_part: EncryptedData,
}

impl Ticket {
    pub fn new(realm: String, sname: PrincipalName, enc_part: EncryptedData) -> Self {
        return Self {
            tkt_vno: KERBEROS_V5,
            realm,
            sname,
            enc_part,
        };
    }
}

impl Asn1Message for Ticket {
    const MESSAGE_TYPE: MessageType = MessageType::Ticket;

    fn build(&self) -> Vec<u8> {
        return der::application(
            TICKET_TAG,
            &der::sequence(&[
                der::explicit(0, &der::integer(self.tkt_vno as i64)),
                der::explicit(1, &der::kerberos_string(&self.realm)),
                der::explicit(2, &self.sname.build()),
                der::explicit(3, &self.enc_part.build()),
            ]),
        );
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum State {
    Start,
    ApplicationTag,
    Sequence,
    TktVnoTag,
    TktVno,
    RealmTag,
    Realm,
    SnameTag,
    Sname,
    EncPartTag,
    EncPart,
}

#[derive(Default)]
pub(crate) struct TicketContainer {
    tkt_vno: Option<i32>,
    realm: Option<String>,
    sname: Option<PrincipalName>,
    enc_part: Option<EncryptedData>,
}

lazy_static! {
    static ref GRAMMAR: Grammar<TicketContainer> = Grammar::new("Ticket")
        .on(
            State::Start,
            Tag::application(TICKET_TAG),
            Action::Explicit,
            State::ApplicationTag
        )
        .on(State::ApplicationTag, Tag::SEQUENCE, Action::Constructed, State::Sequence)
        .on(State::Sequence, Tag::context(0), Action::Explicit, State::TktVnoTag)
        .on(State::TktVnoTag, Tag::INTEGER, Action::Store(store_tkt_vno), State::TktVno)
        .on(State::TktVno, Tag::context(1), Action::Explicit, State::RealmTag)
        .on(State::RealmTag, Tag::GENERAL_STRING, Action::Store(store_realm), State::Realm)
        .on(State::Realm, Tag::context(2), Action::Explicit, State::SnameTag)
        .on(
            State::SnameTag,
            Tag::SEQUENCE,
            Action::Nested(MessageType::PrincipalName, merge_sname),
            State::Sname
        )
        .on(State::Sname, Tag::context(3), Action::Explicit, State::EncPartTag)
        .on(
            State::EncPartTag,
            Tag::SEQUENCE,
            Action::Nested(MessageType::EncryptedData, merge_enc_part),
            State::EncPart
        )
        .accept(&[State::EncPart])
        .extensible(&[State::EncPart]);
}

fn store_tkt_vno(container: &mut TicketContainer, value: &[u8]) -> Result<()> {
    let tkt_vno = decode_integer(value)?;
    if tkt_vno != KERBEROS_V5 as i64 {
        return Err(ProtocolError::invalid(
            "tkt-vno",
            format!("version {} is not {}", tkt_vno, KERBEROS_V5),
        ))?;
    }
    container.tkt_vno = Some(KERBEROS_V5);
    return Ok(());
}

fn store_realm(container: &mut TicketContainer, value: &[u8]) -> Result<()> {
    container.realm = Some(decode_kerberos_string(value)?);
    return Ok(());
}

fn merge_sname(container: &mut TicketContainer, message: Message) -> Result<()> {
    container.sname = Some(PrincipalName::try_from(message)?);
    return Ok(());
}

fn merge_enc_part(container: &mut TicketContainer, message: Message) -> Result<()> {
    container.enc_part = Some(EncryptedData::try_from(message)?);
    return Ok(());
}

impl Container for TicketContainer {
    type State = State;
    const START: State = State::Start;

    fn grammar() -> &'static Grammar<Self> {
        return &GRAMMAR;
    }

    fn finish(self) -> Result<Message> {
        let name = GRAMMAR.name();
        return Ok(Ticket {
            tkt_vno: required(self.tkt_vno, name, "tkt-vno")?,
            realm: required(self.realm, name, "realm")?,
            sname: required(self.sname, name, "sname")?,
            enc_part: required(self.enc_part, name, "enc-part")?,
        }
        .into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asn1::{decode, Asn1Decoder};
    use crate::core::messages::new_nt_srv_inst;
    use crate::error::Error;
    use kerberos_asn1::Asn1Object;
    use std::io::Cursor;

    fn ticket() -> Ticket {
        return Ticket::new(
            "EXAMPLE.COM".to_string(),
            new_nt_srv_inst("krbtgt/EXAMPLE.COM"),
            EncryptedData::new(18, Some(1), vec![0x5A; 64]),
        );
    }

    #[test]
    fn test_parse_ticket() {
        let ticket = ticket();
        let raw = ticket.build();
        assert_eq!(raw[0], 0x61);
        assert_eq!(Ticket::parse(&raw).unwrap(), ticket);
    }

    #[test]
    fn test_parse_ticket_byte_by_byte() {
        let ticket = ticket();
        let raw = ticket.build();
        let mut decoder = Asn1Decoder::new(MessageType::Ticket);

        let (last, head) = raw.split_last().unwrap();
        for octet in head {
            assert_eq!(decoder.feed(&[*octet]).unwrap(), None);
        }
        let message = decoder.feed(&[*last]).unwrap().unwrap();
        assert_eq!(Ticket::try_from(message).unwrap(), ticket);
        assert_eq!(decoder.consumed(), raw.len());
    }

    #[test]
    fn test_decode_from_stream() {
        let ticket = ticket();
        let message = decode(MessageType::Ticket, Cursor::new(ticket.build())).unwrap();
        assert_eq!(Ticket::try_from(message).unwrap(), ticket);
    }

    #[test]
    fn test_truncated_stream() {
        let mut raw = ticket().build();
        raw.truncate(raw.len() - 3);
        match decode(MessageType::Ticket, Cursor::new(raw)) {
            Err(Error::Protocol(ProtocolError::Truncated)) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_trailing_bytes() {
        let mut raw = ticket().build();
        raw.extend(&[0, 0]);
        match Ticket::parse(&raw) {
            Err(Error::Protocol(ProtocolError::TrailingBytes(2))) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_wrong_ticket_version() {
        let mut ticket = ticket();
        ticket.tkt_vno = 4;
        match Ticket::parse(&ticket.build()) {
            Err(Error::Protocol(ProtocolError::InvalidValue { what, .. })) => {
                assert_eq!(what, "tkt-vno");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_wrong_message_type() {
        let raw = ticket().build();
        let err = decode(MessageType::EncTicketPart, Cursor::new(raw)).unwrap_err();
        assert!(err.is_protocol_error());
    }

    #[test]
    fn test_interoperates_with_kerberos_asn1() {
        let ticket = ticket();

        let (_, theirs) = kerberos_asn1::Ticket::parse(&ticket.build()).unwrap();
        assert_eq!(theirs.tkt_vno, 5);
        assert_eq!(theirs.realm, "EXAMPLE.COM");
        assert_eq!(
            theirs.sname.name_string,
            vec!["krbtgt".to_string(), "EXAMPLE.COM".to_string()]
        );
        assert_eq!(theirs.enc_part.cipher, ticket.enc_part.cipher);

        assert_eq!(Ticket::parse(&theirs.build()).unwrap(), ticket);
    }
}
