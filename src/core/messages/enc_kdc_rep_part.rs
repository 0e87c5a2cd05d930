use super::{
    required, Asn1Message, EncryptionKey, HostAddresses, KerberosTime, LastReq,
    Message, MessageType, PrincipalName, TicketFlags,
};
use crate::asn1::der;
use crate::asn1::primitives::{
    decode_bit_string_u32, decode_kerberos_string, decode_uint32,
};
use crate::asn1::{Action, Container, Grammar, Tag};
use crate::error::Result;
use lazy_static::lazy_static;
use log::debug;
use std::convert::TryFrom;

const ENC_AS_REP_PART_TAG: u32 = 25;
const ENC_TGS_REP_PART_TAG: u32 = 26;

/// Whether the part travels in an AS-REP or in a TGS-REP.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncKdcRepPartKind {
    AsRep,
    TgsRep,
}

impl EncKdcRepPartKind {
    fn application_tag(self) -> u32 {
        match self {
            EncKdcRepPartKind::AsRep => ENC_AS_REP_PART_TAG,
            EncKdcRepPartKind::TgsRep => ENC_TGS_REP_PART_TAG,
        }
    }
}

/// EncASRepPart ::= [APPLICATION 25] EncKDCRepPart
/// EncTGSRepPart ::= [APPLICATION 26] EncKDCRepPart
///
/// EncKDCRepPart ::= SEQUENCE {
///     key             [0] EncryptionKey,
///     last-req        [1] LastReq,
///     nonce           [2] UInt32,
///     key-expiration  [3] KerberosTime OPTIONAL,
///     flags           [4] TicketFlags,
///     authtime        [5] KerberosTime,
///     starttime       [6] KerberosTime OPTIONAL,
///     endtime         [7] KerberosTime,
///     renew-till      [8] KerberosTime OPTIONAL,
///     srealm          [9] Realm,
///     sname           [10] PrincipalName,
///     caddr           [11] HostAddresses OPTIONAL
/// }
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncKdcRepPart {
    pub kind: EncKdcRepPartKind,
    pub key: EncryptionKey,
    pub last_req: LastReq,
    pub nonce: u32,
    pub key_expiration: Option<KerberosTime>,
    pub flags: TicketFlags,
    pub authtime: KerberosTime,
    pub starttime: Option<KerberosTime>,
    pub endtime: KerberosTime,
    pub renew_till: Option<KerberosTime>,
    pub srealm: String,
    pub sname: PrincipalName,
    pub caddr: Option<HostAddresses>,
}

impl Asn1Message for EncKdcRepPart {
    const MESSAGE_TYPE: MessageType = MessageType::EncKdcRepPart;

    fn build(&self) -> Vec<u8> {
        let time = |t: &KerberosTime| der::generalized_time(&t.to_generalized_time());

        let mut fields = vec![
            der::explicit(0, &self.key.build()),
            der::explicit(1, &self.last_req.build()),
            der::explicit(2, &der::integer(self.nonce as i64)),
        ];
        if let Some(key_expiration) = &self.key_expiration {
            fields.push(der::explicit(3, &time(key_expiration)));
        }
        fields.push(der::explicit(4, &der::bit_string(self.flags.bits())));
        fields.push(der::explicit(5, &time(&self.authtime)));
        if let Some(starttime) = &self.starttime {
            fields.push(der::explicit(6, &time(starttime)));
        }
        fields.push(der::explicit(7, &time(&self.endtime)));
        if let Some(renew_till) = &self.renew_till {
            fields.push(der::explicit(8, &time(renew_till)));
        }
        fields.push(der::explicit(9, &der::kerberos_string(&self.srealm)));
        fields.push(der::explicit(10, &self.sname.build()));
        if let Some(caddr) = &self.caddr {
            fields.push(der::explicit(11, &caddr.build()));
        }

        return der::application(
            self.kind.application_tag(),
            &der::sequence(&fields),
        );
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum State {
    Start,
    ApplicationTag,
    Sequence,
    KeyTag,
    Key,
    LastReqTag,
    LastReq,
    NonceTag,
    Nonce,
    KeyExpirationTag,
    KeyExpiration,
    FlagsTag,
    Flags,
    AuthTimeTag,
    AuthTime,
    StartTimeTag,
    StartTime,
    EndTimeTag,
    EndTime,
    RenewTillTag,
    RenewTill,
    SrealmTag,
    Srealm,
    SnameTag,
    Sname,
    CaddrTag,
    Caddr,
}

#[derive(Default)]
pub(crate) struct EncKdcRepPartContainer {
    kind: Option<EncKdcRepPartKind>,
    key: Option<EncryptionKey>,
    last_req: Option<LastReq>,
    nonce: Option<u32>,
    key_expiration: Option<KerberosTime>,
    flags: Option<TicketFlags>,
    authtime: Option<KerberosTime>,
    starttime: Option<KerberosTime>,
    endtime: Option<KerberosTime>,
    renew_till: Option<KerberosTime>,
    srealm: Option<String>,
    sname: Option<PrincipalName>,
    caddr: Option<HostAddresses>,
}

lazy_static! {
    static ref GRAMMAR: Grammar<EncKdcRepPartContainer> =
        Grammar::new("EncKdcRepPart")
            .on(
                State::Start,
                Tag::application(ENC_AS_REP_PART_TAG),
                Action::ExplicitMark(mark_as_rep),
                State::ApplicationTag
            )
            .on(
                State::Start,
                Tag::application(ENC_TGS_REP_PART_TAG),
                Action::ExplicitMark(mark_tgs_rep),
                State::ApplicationTag
            )
            .on(State::ApplicationTag, Tag::SEQUENCE, Action::Constructed, State::Sequence)
            .on(State::Sequence, Tag::context(0), Action::Explicit, State::KeyTag)
            .on(
                State::KeyTag,
                Tag::SEQUENCE,
                Action::Nested(MessageType::EncryptionKey, merge_key),
                State::Key
            )
            .on(State::Key, Tag::context(1), Action::Explicit, State::LastReqTag)
            .on(
                State::LastReqTag,
                Tag::SEQUENCE,
                Action::Nested(MessageType::LastReq, merge_last_req),
                State::LastReq
            )
            .on(State::LastReq, Tag::context(2), Action::Explicit, State::NonceTag)
            .on(State::NonceTag, Tag::INTEGER, Action::Store(store_nonce), State::Nonce)
            .on(State::Nonce, Tag::context(3), Action::Explicit, State::KeyExpirationTag)
            .on(
                State::KeyExpirationTag,
                Tag::GENERALIZED_TIME,
                Action::Store(store_key_expiration),
                State::KeyExpiration
            )
            .on_any(
                &[State::Nonce, State::KeyExpiration],
                Tag::context(4),
                Action::Explicit,
                State::FlagsTag
            )
            .on(State::FlagsTag, Tag::BIT_STRING, Action::Store(store_flags), State::Flags)
            .on(State::Flags, Tag::context(5), Action::Explicit, State::AuthTimeTag)
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
                State::SrealmTag
            )
            .on(
                State::SrealmTag,
                Tag::GENERAL_STRING,
                Action::Store(store_srealm),
                State::Srealm
            )
            .on(State::Srealm, Tag::context(10), Action::Explicit, State::SnameTag)
            .on(
                State::SnameTag,
                Tag::SEQUENCE,
                Action::Nested(MessageType::PrincipalName, merge_sname),
                State::Sname
            )
            .on(State::Sname, Tag::context(11), Action::Explicit, State::CaddrTag)
            .on(
                State::CaddrTag,
                Tag::SEQUENCE,
                Action::Nested(MessageType::HostAddresses, merge_caddr),
                State::Caddr
            )
            .accept(&[State::Sname, State::Caddr])
            .extensible(&[
                State::Nonce,
                State::AuthTime,
                State::EndTime,
                State::Sname,
                State::Caddr,
            ]);
}

fn mark_as_rep(container: &mut EncKdcRepPartContainer) {
    container.kind = Some(EncKdcRepPartKind::AsRep);
}

fn mark_tgs_rep(container: &mut EncKdcRepPartContainer) {
    container.kind = Some(EncKdcRepPartKind::TgsRep);
}

fn merge_key(container: &mut EncKdcRepPartContainer, message: Message) -> Result<()> {
    container.key = Some(EncryptionKey::try_from(message)?);
    return Ok(());
}

fn merge_last_req(container: &mut EncKdcRepPartContainer, message: Message) -> Result<()> {
    let last_req = LastReq::try_from(message)?;
    debug!("LastReq : {:?}", last_req);
    container.last_req = Some(last_req);
    return Ok(());
}

fn store_nonce(container: &mut EncKdcRepPartContainer, value: &[u8]) -> Result<()> {
    container.nonce = Some(decode_uint32(value)?);
    return Ok(());
}

fn store_key_expiration(container: &mut EncKdcRepPartContainer, value: &[u8]) -> Result<()> {
    container.key_expiration = Some(KerberosTime::parse(value)?);
    return Ok(());
}

fn store_flags(container: &mut EncKdcRepPartContainer, value: &[u8]) -> Result<()> {
    container.flags = Some(decode_bit_string_u32(value)?.into());
    return Ok(());
}

fn store_authtime(container: &mut EncKdcRepPartContainer, value: &[u8]) -> Result<()> {
    container.authtime = Some(KerberosTime::parse(value)?);
    return Ok(());
}

fn store_starttime(container: &mut EncKdcRepPartContainer, value: &[u8]) -> Result<()> {
    container.starttime = Some(KerberosTime::parse(value)?);
    return Ok(());
}

fn store_endtime(container: &mut EncKdcRepPartContainer, value: &[u8]) -> Result<()> {
    container.endtime = Some(KerberosTime::parse(value)?);
    return Ok(());
}

fn store_renew_till(container: &mut EncKdcRepPartContainer, value: &[u8]) -> Result<()> {
    container.renew_till = Some(KerberosTime::parse(value)?);
    return Ok(());
}

fn store_srealm(container: &mut EncKdcRepPartContainer, value: &[u8]) -> Result<()> {
    container.srealm = Some(decode_kerberos_string(value)?);
    return Ok(());
}

fn merge_sname(container: &mut EncKdcRepPartContainer, message: Message) -> Result<()> {
    container.sname = Some(PrincipalName::try_from(message)?);
    return Ok(());
}

fn merge_caddr(container: &mut EncKdcRepPartContainer, message: Message) -> Result<()> {
    container.caddr = Some(HostAddresses::try_from(message)?);
    return Ok(());
}

impl Container for EncKdcRepPartContainer {
    type State = State;
    const START: State = State::Start;

    fn grammar() -> &'static Grammar<Self> {
        return &GRAMMAR;
    }

    fn finish(self) -> Result<Message> {
        let name = GRAMMAR.name();
        return Ok(EncKdcRepPart {
            kind: required(self.kind, name, "application tag")?,
            key: required(self.key, name, "key")?,
            last_req: required(self.last_req, name, "last-req")?,
            nonce: required(self.nonce, name, "nonce")?,
            key_expiration: self.key_expiration,
            flags: required(self.flags, name, "flags")?,
            authtime: required(self.authtime, name, "authtime")?,
            starttime: self.starttime,
            endtime: required(self.endtime, name, "endtime")?,
            renew_till: self.renew_till,
            srealm: required(self.srealm, name, "srealm")?,
            sname: required(self.sname, name, "sname")?,
            caddr: self.caddr,
        }
        .into());
    }
}
