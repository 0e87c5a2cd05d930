use crate::core::messages::{
    Asn1Message, EncTicketPart, Ticket, TicketFlags, TICKET_FLAGS_SIZE,
};
use crate::core::KerberosPrincipal;
use chrono::{DateTime, Utc};
use std::fmt;
use std::net::IpAddr;

/// Flat view of a ticket and its decrypted enc-part, for callers that do
/// not deal with the protocol structures.
#[derive(Clone, PartialEq, Eq)]
pub struct ExternalTicket {
    /// DER encoding of the ticket, enc-part still sealed.
    pub encoded: Vec<u8>,
    pub client: KerberosPrincipal,
    pub server: KerberosPrincipal,
    pub session_key_type: i32,
    pub session_key: Vec<u8>,
    pub flags: [bool; TICKET_FLAGS_SIZE],
    pub auth_time: DateTime<Utc>,
    /// Defaults to the auth time when absent from the ticket.
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Only present for renewable tickets.
    pub renew_till: Option<DateTime<Utc>>,
    pub client_addresses: Vec<IpAddr>,
}

impl ExternalTicket {
    pub fn new(ticket: &Ticket, enc_part: &EncTicketPart) -> Self {
        return Self {
            encoded: ticket.build(),
            client: KerberosPrincipal::new(
                enc_part.cname.clone(),
                enc_part.crealm.clone(),
            ),
            server: KerberosPrincipal::new(
                ticket.sname.clone(),
                ticket.realm.clone(),
            ),
            session_key_type: enc_part.key.keytype,
            session_key: enc_part.key.keyvalue.clone(),
            flags: enc_part.flags.to_bool_array(),
            auth_time: enc_part.authtime.to_datetime(),
            start_time: enc_part
                .starttime
                .unwrap_or(enc_part.authtime)
                .to_datetime(),
            end_time: enc_part.endtime.to_datetime(),
            renew_till: enc_part
                .effective_renew_till()
                .map(|renew_till| renew_till.to_datetime()),
            client_addresses: enc_part
                .caddr
                .as_ref()
                .map(|caddr| caddr.ips())
                .unwrap_or_default(),
        };
    }

    pub fn ticket_flags(&self) -> TicketFlags {
        return TicketFlags::from(self.flags);
    }

    pub fn is_flag_set(&self, index: usize) -> bool {
        return self.flags.get(index).copied().unwrap_or(false);
    }

    pub fn is_renewable(&self) -> bool {
        return self.ticket_flags().is_renewable();
    }
}

impl fmt::Debug for ExternalTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalTicket")
            .field("client", &self.client.to_string())
            .field("server", &self.server.to_string())
            .field("session_key_type", &self.session_key_type)
            .field("session_key", &format!("<{} bytes>", self.session_key.len()))
            .field("flags", &self.ticket_flags())
            .field("auth_time", &self.auth_time)
            .field("start_time", &self.start_time)
            .field("end_time", &self.end_time)
            .field("renew_till", &self.renew_till)
            .field("client_addresses", &self.client_addresses)
            .finish()
    }
}

impl From<&super::IssuedTicket> for ExternalTicket {
    fn from(issued: &super::IssuedTicket) -> Self {
        return Self::new(&issued.ticket, &issued.enc_part);
    }
}
