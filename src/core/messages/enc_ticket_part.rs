use super::{
    required, Asn1Message, AuthorizationData, EncryptionKey, HostAddresses,
    KerberosTime, Message, MessageType, PrincipalName, TicketFlags,
    TransitedEncoding,
};
use crate::asn1::der;
use crate::asn1::primitives::{decode_bit_string_u32, decode_kerberos_string};
use crate::asn1::{Action, Container, Grammar, Tag};
use crate::error::{Result, ValidationError};
use lazy_static::lazy_static;
use log::debug;
use std::convert::TryFrom;

/// EncTicketPart ::= [APPLICATION 3] SEQUENCE {
///     flags               [0] TicketFlags,
///     key                 [1] EncryptionKey,
///     crealm              [2] Realm,
///     cname               [3] PrincipalName,
///     transited           [4] TransitedEncoding,
///     authtime            [5] KerberosTime,
///     starttime           [6] KerberosTime OPTIONAL,
///     endtime             [7] KerberosTime,
///     renew-till          [8] KerberosTime OPTIONAL,
///     caddr               [9] HostAddresses OPTIONAL,
///     authorization-data  [10] AuthorizationData OPTIONAL
/// }
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncTicketPart {
    pub flags: TicketFlags,
    pub key: EncryptionKey,
    pub crealm: String,
    pub cname: PrincipalName,
    pub transited: TransitedEncoding,
    pub authtime: KerberosTime,
    pub starttime: Option<KerberosTime>,
    pub endtime: KerberosTime,
    pub renew_till: Option<KerberosTime>,
    pub caddr: Option<HostAddresses>,
    /// An empty list is not encoded, so it decodes back as `None`.
    pub authorization_data: Option<AuthorizationData>,
}

impl EncTicketPart {
    /// Checks the time window and the renewability of the ticket.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        self.validate_times()?;

        if self.renew_till.is_some() && !self.flags.is_renewable() {
            return Err(ValidationError::RenewTillWithoutRenewable);
        }

        return Ok(());
    }

    /// Checks only the time window. A stale renew-till is tolerated since
    /// it is never honoured without the RENEWABLE flag.
    pub fn validate_times(&self) -> std::result::Result<(), ValidationError> {
        if self.endtime <= self.authtime {
            return Err(ValidationError::EndTimeNotAfterAuthTime);
        }

        if let Some(starttime) = self.starttime {
            if starttime > self.endtime {
                return Err(ValidationError::StartTimeAfterEndTime);
            }
        }

        return Ok(());
    }

    /// Renew time that may be honoured, none unless RENEWABLE is set.
    pub fn effective_renew_till(&self) -> Option<KerberosTime> {
        if self.flags.is_renewable() {
            return self.renew_till;
        }
        return None;
    }
}

impl Asn1Message for EncTicketPart {
    const MESSAGE_TYPE: MessageType = MessageType::EncTicketPart;

    fn build(&self) -> Vec<u8> {
        let time = |t: &KerberosTime| der::generalized_time(&t.to_generalized_time());

        let mut fields = vec![
            der::explicit(0, &der::bit_string(self.flags.bits())),
            der::explicit(1, &self.key.build()),
            der::explicit(2, &der::kerberos_string(&self.crealm)),
            der::explicit(3, &self.cname.build()),
            der::explicit(4, &self.transited.build()),
            der::explicit(5, &time(&self.authtime)),
        ];
        if let Some(starttime) = &self.starttime {
            fields.push(der::explicit(6, &time(starttime)));
        }
        fields.push(der::explicit(7, &time(&self.endtime)));
        if let Some(renew_till) = &self.renew_till {
            fields.push(der::explicit(8, &time(renew_till)));
        }
        if let Some(caddr) = &self.caddr {
            fields.push(der::explicit(9, &caddr.build()));
        }
        if let Some(authorization_data) = &self.authorization_data {
            if !authorization_data.entries.is_empty() {
                fields.push(der::explicit(10, &authorization_data.build()));
            }
        }

        return der::application(3, &der::sequence(&fields));
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum State {
    Start,
    ApplicationTag,
    Sequence,
    FlagsTag,
    Flags,
    KeyTag,
    Key,
    CrealmTag,
    Crealm,
    CnameTag,
    Cname,
    TransitedTag,
    Transited,
    AuthTimeTag,
    AuthTime,
    StartTimeTag,
    StartTime,
    EndTimeTag,
    EndTime,
    RenewTillTag,
    RenewTill,
    CaddrTag,
    Caddr,
    AuthorizationDataTag,
    AuthorizationData,
}

#[derive(Default)]
pub(crate) struct EncTicketPartContainer {
    flags: Option<TicketFlags>,
    key: Option<EncryptionKey>,
    crealm: Option<String>,
    cname: Option<PrincipalName>,
    transited: Option<TransitedEncoding>,
    authtime: Option<KerberosTime>,
    starttime: Option<KerberosTime>,
    endtime: Option<KerberosTime>,
    renew_till: Option<KerberosTime>,
    caddr: Option<HostAddresses>,
    authorization_data: Option<AuthorizationData>,
}

lazy_static! {
    static ref GRAMMAR: Grammar<EncTicketPartContainer> =
        Grammar::new("EncTicketPart")
            .on(State::Start, Tag::application(3), Action::Explicit, State::ApplicationTag)
            .on(State::ApplicationTag, Tag::SEQUENCE, Action::Constructed, State::Sequence)
            .on(State::Sequence, Tag::context(0), Action::Explicit, State::FlagsTag)
            .on(State::FlagsTag, Tag::BIT_STRING, Action::Store(store_flags), State::Flags)
            .on(State::Flags, Tag::context(1), Action::Explicit, State::KeyTag)
            .on(
                State::KeyTag,
                Tag::SEQUENCE,
                Action::Nested(MessageType::EncryptionKey, merge_key),
                State::Key
            )
            .on(State::Key, Tag::context(2), Action::Explicit, State::CrealmTag)
            .on(
                State::CrealmTag,
                Tag::GENERAL_STRING,
                Action::Store(store_crealm),
                State::Crealm
            )
            .on(State::Crealm, Tag::context(3), Action::Explicit, State::CnameTag)
            .on(
                State::CnameTag,
                Tag::SEQUENCE,
                Action::Nested(MessageType::PrincipalName, merge_cname),
                State::Cname
            )
            .on(State::Cname, Tag::context(4), Action::Explicit, State::TransitedTag)
            .on(
                State::TransitedTag,
                Tag::SEQUENCE,
                Action::Nested(MessageType::TransitedEncoding, merge_transited),
                State::Transited
            )
            .on(State::Transited, Tag::context(5), Action::Explicit, State::AuthTimeTag)
            .on(
                State::AuthTimeTag,
                Tag::GENERALIZED_TIME,
                Action::Store(store_authtime),
                State::AuthTime
            )
            .on(State::AuthTime, Tag::context(6), Action::Explicit, State::StartTimeTag)
            .on(
                State::StartTimeTag,
                Tag::GENERALIZED_TIME,
                Action::Store(store_starttime),
                State::StartTime
            )
            .on_any(
                &[State::AuthTime, State::StartTime],
                Tag::context(7),
                Action::Explicit,
                State::EndTimeTag
            )
            .on(
                State::EndTimeTag,
                Tag::GENERALIZED_TIME,
                Action::Store(store_endtime),
                State::EndTime
            )
            .on(State::EndTime, Tag::context(8), Action::Explicit, State::RenewTillTag)
            .on(
                State::RenewTillTag,
                Tag::GENERALIZED_TIME,
                Action::Store(store_renew_till),
                State::RenewTill
            )
            .on_any(
                &[State::EndTime, State::RenewTill],
                Tag::context(9),
                Action::Explicit,
                State::CaddrTag
            )
            .on(
                State::CaddrTag,
                Tag::SEQUENCE,
                Action::Nested(MessageType::HostAddresses, merge_caddr),
                State::Caddr
            )
            .on_any(
                &[State::EndTime, State::RenewTill, State::Caddr],
                Tag::context(10),
                Action::Explicit,
                State::AuthorizationDataTag
            )
            .on(
                State::AuthorizationDataTag,
                Tag::SEQUENCE,
                Action::Nested(MessageType::AuthorizationData, merge_authorization_data),
                State::AuthorizationData
            )
            .accept(&[
                State::EndTime,
                State::RenewTill,
                State::Caddr,
                State::AuthorizationData,
            ])
            .extensible(&[
                State::AuthTime,
                State::StartTime,
                State::EndTime,
                State::RenewTill,
                State::Caddr,
                State::AuthorizationData,
            ]);
}

fn store_flags(container: &mut EncTicketPartContainer, value: &[u8]) -> Result<()> {
    container.flags = Some(decode_bit_string_u32(value)?.into());
    return Ok(());
}

fn merge_key(container: &mut EncTicketPartContainer, message: Message) -> Result<()> {
    container.key = Some(EncryptionKey::try_from(message)?);
    return Ok(());
}

fn store_crealm(container: &mut EncTicketPartContainer, value: &[u8]) -> Result<()> {
    container.crealm = Some(decode_kerberos_string(value)?);
    return Ok(());
}

fn merge_cname(container: &mut EncTicketPartContainer, message: Message) -> Result<()> {
    let cname = PrincipalName::try_from(message)?;
    debug!("EncTicketPart cname: {}", cname);
    container.cname = Some(cname);
    return Ok(());
}

fn merge_transited(container: &mut EncTicketPartContainer, message: Message) -> Result<()> {
    container.transited = Some(TransitedEncoding::try_from(message)?);
    return Ok(());
}

fn store_authtime(container: &mut EncTicketPartContainer, value: &[u8]) -> Result<()> {
    container.authtime = Some(KerberosTime::parse(value)?);
    return Ok(());
}

fn store_starttime(container: &mut EncTicketPartContainer, value: &[u8]) -> Result<()> {
    container.starttime = Some(KerberosTime::parse(value)?);
    return Ok(());
}

fn store_endtime(container: &mut EncTicketPartContainer, value: &[u8]) -> Result<()> {
    container.endtime = Some(KerberosTime::parse(value)?);
    return Ok(());
}

fn store_renew_till(container: &mut EncTicketPartContainer, value: &[u8]) -> Result<()> {
    container.renew_till = Some(KerberosTime::parse(value)?);
    return Ok(());
}

fn merge_caddr(container: &mut EncTicketPartContainer, message: Message) -> Result<()> {
    container.caddr = Some(HostAddresses::try_from(message)?);
    return Ok(());
}

fn merge_authorization_data(
    container: &mut EncTicketPartContainer,
    message: Message,
) -> Result<()> {
    container.authorization_data = Some(AuthorizationData::try_from(message)?);
    return Ok(());
}

impl Container for EncTicketPartContainer {
    type State = State;
    const START: State = State::Start;

    fn grammar() -> &'static Grammar<Self> {
        return &GRAMMAR;
    }

    fn finish(self) -> Result<Message> {
        let name = GRAMMAR.name();
        return Ok(EncTicketPart {
            flags: required(self.flags, name, "flags")?,
            key: required(self.key, name, "key")?,
            crealm: required(self.crealm, name, "crealm")?,
            cname: required(self.cname, name, "cname")?,
            transited: required(self.transited, name, "transited")?,
            authtime: required(self.authtime, name, "authtime")?,
            starttime: self.starttime,
            endtime: required(self.endtime, name, "endtime")?,
            renew_till: self.renew_till,
            caddr: self.caddr,
            authorization_data: self.authorization_data,
        }
        .into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::messages::{
        new_nt_principal, AuthorizationDataEntry, HostAddress, TicketFlag,
    };
    use crate::asn1::TlvReader;
    use crate::error::{Error, ProtocolError};
    use chrono::{TimeZone, Utc};
    use kerberos_asn1::Asn1Object;

    fn time(hour: u32) -> KerberosTime {
        return Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap().into();
    }

    fn enc_ticket_part() -> EncTicketPart {
        return EncTicketPart {
            flags: TicketFlags::from(TicketFlag::Renewable),
            key: EncryptionKey::new(18, vec![7; 32]),
            crealm: "EXAMPLE.COM".to_string(),
            cname: new_nt_principal("alice"),
            transited: TransitedEncoding::default(),
            authtime: time(8),
            starttime: None,
            endtime: time(18),
            renew_till: Some(time(20)),
            caddr: None,
            authorization_data: None,
        };
    }

    #[test]
    fn test_parse_enc_ticket_part() {
        let mut part = enc_ticket_part();
        part.starttime = Some(time(9));
        part.caddr = Some(HostAddresses {
            addresses: vec![HostAddress::from(
                "10.1.2.3".parse::<std::net::IpAddr>().unwrap(),
            )],
        });
        part.authorization_data = Some(AuthorizationData {
            entries: vec![AuthorizationDataEntry {
                ad_type: 1,
                ad_data: vec![1, 2, 3],
            }],
        });

        assert_eq!(EncTicketPart::parse(&part.build()).unwrap(), part);
    }

    fn content_of(raw: &[u8]) -> &[u8] {
        let mut reader = TlvReader::new();
        for (i, octet) in raw.iter().enumerate() {
            if reader.push(*octet).unwrap().is_some() {
                return &raw[i + 1..];
            }
        }
        panic!("no TLV header");
    }

    #[test]
    fn test_unknown_optional_field_is_skipped() {
        let part = enc_ticket_part();
        let raw = part.build();
        let mut sequence = content_of(content_of(&raw)).to_vec();
        sequence.extend(der::explicit(15, &der::octet_string(&[9, 9, 9])));
        let extended = der::application(3, &der::tlv(Tag::SEQUENCE, &sequence));

        assert_eq!(EncTicketPart::parse(&extended).unwrap(), part);
    }

    #[test]
    fn test_duplicated_endtime_rejected() {
        let raw = enc_ticket_part().build();
        let mut sequence = content_of(content_of(&raw)).to_vec();
        sequence.extend(der::explicit(7, &der::generalized_time("19990101000000Z")));
        let duplicated = der::application(3, &der::tlv(Tag::SEQUENCE, &sequence));

        match EncTicketPart::parse(&duplicated) {
            Err(Error::Protocol(ProtocolError::UnexpectedTag { tag, .. })) => {
                assert_eq!(tag, Tag::context(7));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_out_of_order_field_rejected() {
        let mut part = enc_ticket_part();
        part.renew_till = None;
        let raw = part.build();
        let mut sequence = content_of(content_of(&raw)).to_vec();
        sequence.extend(der::explicit(6, &der::generalized_time("20240501090000Z")));
        let reordered = der::application(3, &der::tlv(Tag::SEQUENCE, &sequence));

        match EncTicketPart::parse(&reordered) {
            Err(Error::Protocol(ProtocolError::UnexpectedTag { tag, .. })) => {
                assert_eq!(tag, Tag::context(6));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_empty_authorization_data_decodes_as_absent() {
        let mut part = enc_ticket_part();
        part.authorization_data = Some(AuthorizationData::default());

        let parsed = EncTicketPart::parse(&part.build()).unwrap();
        assert_eq!(parsed.authorization_data, None);
        assert_eq!(parsed.build(), part.build());
    }

    #[test]
    fn test_missing_endtime() {
        let part = enc_ticket_part();
        let raw = der::application(
            3,
            &der::sequence(&[
                der::explicit(0, &der::bit_string(part.flags.bits())),
                der::explicit(1, &part.key.build()),
                der::explicit(2, &der::kerberos_string(&part.crealm)),
                der::explicit(3, &part.cname.build()),
                der::explicit(4, &part.transited.build()),
                der::explicit(5, &der::generalized_time("20240501080000Z")),
            ]),
        );
        match EncTicketPart::parse(&raw) {
            Err(Error::Protocol(ProtocolError::Incomplete { grammar, .. })) => {
                assert_eq!(grammar, "EncTicketPart");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_validate_time_window() {
        let mut part = enc_ticket_part();
        assert_eq!(part.validate(), Ok(()));

        part.endtime = part.authtime;
        assert_eq!(
            part.validate(),
            Err(ValidationError::EndTimeNotAfterAuthTime)
        );

        let mut part = enc_ticket_part();
        part.starttime = Some(time(19));
        assert_eq!(part.validate(), Err(ValidationError::StartTimeAfterEndTime));
    }

    #[test]
    fn test_validate_renewability() {
        let mut part = enc_ticket_part();
        part.flags = TicketFlags::new();
        assert_eq!(
            part.validate(),
            Err(ValidationError::RenewTillWithoutRenewable)
        );
        assert_eq!(part.effective_renew_till(), None);
    }

    #[test]
    fn test_interoperates_with_kerberos_asn1() {
        let part = enc_ticket_part();

        let (_, theirs) = kerberos_asn1::EncTicketPart::parse(&part.build()).unwrap();
        assert_eq!(theirs.flags.flags, part.flags.bits());
        assert_eq!(theirs.key.keytype, 18);
        assert_eq!(theirs.crealm, "EXAMPLE.COM");
        assert_eq!(theirs.cname.name_string, vec!["alice".to_string()]);
        assert_eq!(theirs.endtime.timestamp(), part.endtime.timestamp());

        let ours = EncTicketPart::parse(&theirs.build()).unwrap();
        assert_eq!(ours, part);
    }
}
