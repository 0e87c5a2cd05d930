//! Kerberos structures, their DER encoding and the grammars that decode
//! them.

use crate::asn1::{decode_slice, Frame, GrammarFrame};
use crate::error::{Error, ProtocolError, Result};
use std::convert::TryFrom;

mod kerberos_time;
pub use kerberos_time::KerberosTime;

mod ticket_flags;
pub use ticket_flags::{TicketFlag, TicketFlags, TICKET_FLAGS_SIZE};

mod encryption_key;
pub use encryption_key::EncryptionKey;
use encryption_key::EncryptionKeyContainer;

mod encrypted_data;
pub use encrypted_data::EncryptedData;
use encrypted_data::EncryptedDataContainer;

mod principal_name;
pub use principal_name::{
    new_nt_principal, new_nt_srv_inst, new_principal_name,
    spn_to_service_parts, PrincipalName,
};
use principal_name::PrincipalNameContainer;

mod transited;
pub use transited::TransitedEncoding;
use transited::TransitedEncodingContainer;

mod host_address;
pub use host_address::{HostAddress, HostAddresses};
use host_address::{HostAddressContainer, HostAddressesContainer};

mod authorization_data;
pub use authorization_data::{AuthorizationData, AuthorizationDataEntry};
use authorization_data::{
    AuthorizationDataContainer, AuthorizationDataEntryContainer,
};

mod last_req;
pub use last_req::{LastReq, LastReqEntry};
use last_req::{LastReqContainer, LastReqEntryContainer};

mod enc_ticket_part;
pub use enc_ticket_part::EncTicketPart;
use enc_ticket_part::EncTicketPartContainer;

mod enc_kdc_rep_part;
pub use enc_kdc_rep_part::{EncKdcRepPart, EncKdcRepPartKind};
use enc_kdc_rep_part::EncKdcRepPartContainer;

mod ticket;
pub use ticket::{Ticket, KERBEROS_V5};
use ticket::TicketContainer;

/// Structure that can be encoded to DER and decoded from a complete buffer.
pub trait Asn1Message: Sized + TryFrom<Message, Error = Error> {
    const MESSAGE_TYPE: MessageType;

    fn build(&self) -> Vec<u8>;

    fn parse(raw: &[u8]) -> Result<Self> {
        return Self::try_from(decode_slice(Self::MESSAGE_TYPE, raw)?);
    }
}

macro_rules! messages {
    ($($variant:ident),+ $(,)?) => {
        /// Any decoded structure.
        #[derive(Clone, Debug, PartialEq)]
        pub enum Message {
            $($variant($variant)),+
        }

        /// Selects the grammar a decode starts with.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum MessageType {
            $($variant),+
        }

        impl Message {
            pub fn name(&self) -> &'static str {
                match self {
                    $(Message::$variant(_) => stringify!($variant)),+
                }
            }

            pub fn message_type(&self) -> MessageType {
                match self {
                    $(Message::$variant(_) => MessageType::$variant),+
                }
            }
        }

        impl MessageType {
            pub fn name(&self) -> &'static str {
                match self {
                    $(MessageType::$variant => stringify!($variant)),+
                }
            }
        }

        $(
            impl From<$variant> for Message {
                fn from(value: $variant) -> Self {
                    return Message::$variant(value);
                }
            }

            impl TryFrom<Message> for $variant {
                type Error = Error;

                fn try_from(message: Message) -> Result<Self> {
                    match message {
                        Message::$variant(value) => return Ok(value),
                        other => {
                            return Err(ProtocolError::MessageMismatch {
                                expected: stringify!($variant),
                                found: other.name(),
                            })?
                        }
                    }
                }
            }
        )+
    };
}

messages!(
    Ticket,
    EncTicketPart,
    EncKdcRepPart,
    LastReq,
    LastReqEntry,
    EncryptedData,
    EncryptionKey,
    PrincipalName,
    TransitedEncoding,
    HostAddresses,
    HostAddress,
    AuthorizationData,
    AuthorizationDataEntry,
);

impl MessageType {
    pub(crate) fn new_frame(&self) -> Box<dyn Frame> {
        match self {
            MessageType::Ticket => GrammarFrame::<TicketContainer>::boxed(),
            MessageType::EncTicketPart => {
                GrammarFrame::<EncTicketPartContainer>::boxed()
            }
            MessageType::EncKdcRepPart => {
                GrammarFrame::<EncKdcRepPartContainer>::boxed()
            }
            MessageType::LastReq => GrammarFrame::<LastReqContainer>::boxed(),
            MessageType::LastReqEntry => {
                GrammarFrame::<LastReqEntryContainer>::boxed()
            }
            MessageType::EncryptedData => {
                GrammarFrame::<EncryptedDataContainer>::boxed()
            }
            MessageType::EncryptionKey => {
                GrammarFrame::<EncryptionKeyContainer>::boxed()
            }
            MessageType::PrincipalName => {
                GrammarFrame::<PrincipalNameContainer>::boxed()
            }
            MessageType::TransitedEncoding => {
                GrammarFrame::<TransitedEncodingContainer>::boxed()
            }
            MessageType::HostAddresses => {
                GrammarFrame::<HostAddressesContainer>::boxed()
            }
            MessageType::HostAddress => {
                GrammarFrame::<HostAddressContainer>::boxed()
            }
            MessageType::AuthorizationData => {
                GrammarFrame::<AuthorizationDataContainer>::boxed()
            }
            MessageType::AuthorizationDataEntry => {
                GrammarFrame::<AuthorizationDataEntryContainer>::boxed()
            }
        }
    }
}

/// Takes a mandatory field out of a container being finished.
pub(crate) fn required<T>(
    field: Option<T>,
    grammar: &'static str,
    name: &'static str,
) -> Result<T> {
    return field.ok_or_else(|| {
        Error::from(ProtocolError::Incomplete {
            grammar,
            state: format!("missing {}", name),
        })
    });
}
