use super::TicketPolicy;
use crate::core::cipher::{seal, unseal};
use crate::core::keys::{check_key, derive_key, random_key};
use crate::core::messages::{
    EncTicketPart, EncryptionKey, KerberosTime, Ticket, TransitedEncoding,
};
use crate::core::store::{PrincipalSecret, PrincipalStore};
use crate::core::{Clock, KerberosPrincipal, KeyUsage, SystemClock};
use crate::error::{CryptoError, Result, ValidationError};
use chrono::Duration;
use log::{debug, info};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use std::sync::Arc;

/// Ticket as put on the wire, together with the plaintext of its enc-part
/// that the KDC needs to build the reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedTicket {
    pub ticket: Ticket,
    pub enc_part: EncTicketPart,
}

impl IssuedTicket {
    pub fn session_key(&self) -> &EncryptionKey {
        return &self.enc_part.key;
    }
}

/// Issues tickets following a policy. Holds no state across calls, so a
/// single factory can be shared between threads.
#[derive(Clone)]
pub struct TicketFactory {
    policy: TicketPolicy,
    clock: Arc<dyn Clock>,
}

impl TicketFactory {
    pub fn new(policy: TicketPolicy) -> Self {
        return Self::with_clock(policy, Arc::new(SystemClock));
    }

    pub fn with_clock(policy: TicketPolicy, clock: Arc<dyn Clock>) -> Self {
        return Self { policy, clock };
    }

    pub fn policy(&self) -> &TicketPolicy {
        return &self.policy;
    }

    /// Issues a ticket for the client to the server, with a session key
    /// drawn from the OS random generator.
    pub fn issue_ticket(
        &self,
        client: &KerberosPrincipal,
        server: &KerberosPrincipal,
        server_key: &EncryptionKey,
    ) -> Result<IssuedTicket> {
        return self.issue_ticket_with(&mut OsRng, client, server, server_key);
    }

    pub fn issue_ticket_with<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        client: &KerberosPrincipal,
        server: &KerberosPrincipal,
        server_key: &EncryptionKey,
    ) -> Result<IssuedTicket> {
        check_key(server_key)?;

        let flags = self.policy.flags;
        let session_key = random_key(rng, self.policy.etype)?;

        let authtime = self.clock.now();
        let endtime = shift(authtime, self.policy.lifetime, "endtime")?;
        let renew_till = if flags.is_renewable() {
            Some(shift(authtime, self.policy.renewal_window, "renew-till")?)
        } else {
            None
        };

        let enc_part = EncTicketPart {
            flags,
            key: session_key,
            crealm: client.realm.clone(),
            cname: client.name.clone(),
            transited: TransitedEncoding::default(),
            authtime,
            starttime: None,
            endtime,
            renew_till,
            caddr: None,
            authorization_data: None,
        };
        enc_part.validate()?;

        let mut sealed = seal(server_key, &enc_part, KeyUsage::AS_REP_TICKET)?;
        sealed.kvno = self.policy.kvno;

        let ticket =
            Ticket::new(server.realm.clone(), server.name.clone(), sealed);

        info!(
            "Issued ticket for {} to {} valid until {}",
            client, server, endtime
        );

        return Ok(IssuedTicket { ticket, enc_part });
    }

    /// Derives the key of a service from its password.
    pub fn server_key(
        &self,
        server: &KerberosPrincipal,
        password: &str,
        etype: i32,
    ) -> Result<EncryptionKey> {
        return derive_key(server, password, etype);
    }

    /// Retrieves the key of a service from the store, deriving it when the
    /// store only holds its password.
    pub fn server_key_from_store(
        &self,
        store: &dyn PrincipalStore,
        server: &KerberosPrincipal,
        etype: i32,
    ) -> Result<EncryptionKey> {
        let secret = store
            .get_secret(server)?
            .ok_or_else(|| ValidationError::UnknownPrincipal(server.to_string()))?;

        debug!("Server key of {} retrieved from {}", server, store.id());

        match secret {
            PrincipalSecret::Password(password) => {
                return derive_key(server, &password, etype);
            }
            PrincipalSecret::Key(key) => {
                if key.keytype != etype {
                    return Err(CryptoError::EtypeMismatch {
                        key: key.keytype,
                        data: etype,
                    })?;
                }
                return Ok(key);
            }
        }
    }

    /// Decrypts the enc-part of a ticket received by a service.
    pub fn unseal_ticket(
        &self,
        ticket: &Ticket,
        server_key: &EncryptionKey,
    ) -> Result<EncTicketPart> {
        let enc_part: EncTicketPart =
            unseal(server_key, &ticket.enc_part, KeyUsage::AS_REP_TICKET)?;
        enc_part.validate_times()?;
        return Ok(enc_part);
    }
}

fn shift(
    time: KerberosTime,
    offset: Duration,
    what: &'static str,
) -> Result<KerberosTime> {
    return Ok(time
        .checked_add(offset)
        .ok_or(ValidationError::TimeOutOfRange(what))?);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::messages::{Asn1Message, TicketFlag, TicketFlags};
    use crate::core::store::MemoryStore;
    use crate::core::FixedClock;
    use crate::error::Error;
    use chrono::{TimeZone, Utc};
    use kerberos_constants::etypes;
    use std::convert::TryFrom;
    use std::thread;

    fn principal(name: &str) -> KerberosPrincipal {
        return KerberosPrincipal::try_from(name).unwrap();
    }

    fn factory(policy: TicketPolicy) -> TicketFactory {
        let now: KerberosTime =
            Utc.with_ymd_and_hms(2024, 2, 29, 23, 30, 0).unwrap().into();
        return TicketFactory::with_clock(policy, Arc::new(FixedClock::new(now)));
    }

    fn krbtgt_key(factory: &TicketFactory) -> EncryptionKey {
        return factory
            .server_key(
                &principal("krbtgt/EXAMPLE.COM@EXAMPLE.COM"),
                "kdc-master-secret",
                etypes::AES256_CTS_HMAC_SHA1_96,
            )
            .unwrap();
    }

    #[test]
    fn test_issue_ticket_default_policy() {
        let factory = factory(TicketPolicy::default());
        let alice = principal("alice@EXAMPLE.COM");
        let krbtgt = principal("krbtgt@EXAMPLE.COM");
        let server_key = krbtgt_key(&factory);

        let issued = factory.issue_ticket(&alice, &krbtgt, &server_key).unwrap();
        let part = &issued.enc_part;

        assert_eq!(
            part.endtime.timestamp_millis() - part.authtime.timestamp_millis(),
            86400000
        );
        assert_eq!(
            part.renew_till.unwrap().timestamp_millis()
                - part.authtime.timestamp_millis(),
            604800000
        );
        assert!(part.flags.is_set(TicketFlag::Renewable));
        assert_eq!(part.cname, alice.name);
        assert_eq!(part.crealm, "EXAMPLE.COM");
        assert_eq!(part.key.keytype, etypes::AES256_CTS_HMAC_SHA1_96);
        assert_eq!(part.key.keyvalue.len(), 32);

        let ticket = &issued.ticket;
        assert_eq!(ticket.tkt_vno, 5);
        assert_eq!(ticket.sname, krbtgt.name);
        assert_eq!(ticket.realm, "EXAMPLE.COM");
        assert_eq!(ticket.enc_part.kvno, Some(1));
        assert_eq!(ticket.enc_part.etype, server_key.keytype);
    }

    #[test]
    fn test_ticket_carries_ciphertext() {
        let factory = factory(TicketPolicy::default());
        let server_key = krbtgt_key(&factory);
        let issued = factory
            .issue_ticket(
                &principal("alice@EXAMPLE.COM"),
                &principal("krbtgt/EXAMPLE.COM@EXAMPLE.COM"),
                &server_key,
            )
            .unwrap();

        let raw = issued.ticket.build();
        let plaintext = issued.enc_part.build();
        assert!(!raw
            .windows(plaintext.len())
            .any(|window| window == plaintext.as_slice()));

        let parsed = Ticket::parse(&raw).unwrap();
        let unsealed = factory.unseal_ticket(&parsed, &server_key).unwrap();
        assert_eq!(unsealed, issued.enc_part);
    }

    #[test]
    fn test_session_keys_are_fresh() {
        let factory = factory(TicketPolicy::default());
        let server_key = krbtgt_key(&factory);
        let alice = principal("alice@EXAMPLE.COM");
        let krbtgt = principal("krbtgt/EXAMPLE.COM@EXAMPLE.COM");

        let first = factory.issue_ticket(&alice, &krbtgt, &server_key).unwrap();
        let second = factory.issue_ticket(&alice, &krbtgt, &server_key).unwrap();
        assert_ne!(first.session_key(), second.session_key());
        assert_ne!(first.ticket.enc_part.cipher, second.ticket.enc_part.cipher);
    }

    #[test]
    fn test_not_renewable_policy() {
        let policy = TicketPolicy::new()
            .flags(TicketFlags::from(TicketFlag::Forwardable))
            .etype(etypes::AES128_CTS_HMAC_SHA1_96);
        let factory = factory(policy);
        let server_key = krbtgt_key(&factory);

        let issued = factory
            .issue_ticket(
                &principal("alice@EXAMPLE.COM"),
                &principal("host/web.example.com@EXAMPLE.COM"),
                &server_key,
            )
            .unwrap();
        assert_eq!(issued.enc_part.renew_till, None);
        assert!(!issued.enc_part.flags.is_renewable());
        assert_eq!(issued.session_key().keyvalue.len(), 16);
    }

    #[test]
    fn test_zero_lifetime_is_rejected() {
        let factory = factory(TicketPolicy::new().lifetime(Duration::zero()));
        let server_key = krbtgt_key(&factory);

        match factory.issue_ticket(
            &principal("alice@EXAMPLE.COM"),
            &principal("krbtgt/EXAMPLE.COM@EXAMPLE.COM"),
            &server_key,
        ) {
            Err(Error::Validation(ValidationError::EndTimeNotAfterAuthTime)) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_lifetime_out_of_range() {
        let factory = factory(TicketPolicy::new().lifetime(Duration::days(365 * 400_000)));
        let server_key = krbtgt_key(&factory);

        match factory.issue_ticket(
            &principal("alice@EXAMPLE.COM"),
            &principal("krbtgt/EXAMPLE.COM@EXAMPLE.COM"),
            &server_key,
        ) {
            Err(Error::Validation(ValidationError::TimeOutOfRange("endtime"))) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_session_etype() {
        let factory = factory(TicketPolicy::new().etype(etypes::DES_CBC_MD5));
        let server_key = krbtgt_key(&factory);

        match factory.issue_ticket(
            &principal("alice@EXAMPLE.COM"),
            &principal("krbtgt/EXAMPLE.COM@EXAMPLE.COM"),
            &server_key,
        ) {
            Err(Error::Crypto(CryptoError::UnsupportedEtype(etype))) => {
                assert_eq!(etype, etypes::DES_CBC_MD5);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_unseal_with_wrong_key() {
        let factory = factory(TicketPolicy::default());
        let server_key = krbtgt_key(&factory);
        let issued = factory
            .issue_ticket(
                &principal("alice@EXAMPLE.COM"),
                &principal("krbtgt/EXAMPLE.COM@EXAMPLE.COM"),
                &server_key,
            )
            .unwrap();

        let wrong_key = factory
            .server_key(
                &principal("krbtgt/EXAMPLE.COM@EXAMPLE.COM"),
                "not-the-secret",
                etypes::AES256_CTS_HMAC_SHA1_96,
            )
            .unwrap();
        let err = factory.unseal_ticket(&issued.ticket, &wrong_key).unwrap_err();
        assert!(err.is_crypto_error());
    }

    #[test]
    fn test_server_key_from_store() {
        let factory = factory(TicketPolicy::default());
        let krbtgt = principal("krbtgt/EXAMPLE.COM@EXAMPLE.COM");
        let http = principal("HTTP/web.example.com@EXAMPLE.COM");
        let rc4_key = EncryptionKey::new(etypes::RC4_HMAC, vec![0x11; 16]);

        let mut store = MemoryStore::new();
        store
            .add(krbtgt.clone(), PrincipalSecret::Password("kdc-master-secret".into()))
            .unwrap();
        store
            .add(http.clone(), PrincipalSecret::Key(rc4_key.clone()))
            .unwrap();

        let derived = factory
            .server_key_from_store(&store, &krbtgt, etypes::AES256_CTS_HMAC_SHA1_96)
            .unwrap();
        assert_eq!(derived, krbtgt_key(&factory));

        let stored = factory
            .server_key_from_store(&store, &http, etypes::RC4_HMAC)
            .unwrap();
        assert_eq!(stored, rc4_key);

        match factory.server_key_from_store(
            &store,
            &http,
            etypes::AES256_CTS_HMAC_SHA1_96,
        ) {
            Err(Error::Crypto(CryptoError::EtypeMismatch { .. })) => {}
            other => panic!("unexpected result {:?}", other),
        }

        match factory.server_key_from_store(
            &store,
            &principal("nobody@EXAMPLE.COM"),
            etypes::RC4_HMAC,
        ) {
            Err(Error::Validation(ValidationError::UnknownPrincipal(name))) => {
                assert_eq!(name, "nobody@EXAMPLE.COM");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_concurrent_issuance() {
        let factory = factory(TicketPolicy::default());
        let server_key = krbtgt_key(&factory);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let factory = factory.clone();
                let server_key = server_key.clone();
                thread::spawn(move || {
                    let client = principal(&format!("user{}@EXAMPLE.COM", i));
                    let server = principal("krbtgt/EXAMPLE.COM@EXAMPLE.COM");
                    let issued =
                        factory.issue_ticket(&client, &server, &server_key).unwrap();
                    let raw = issued.ticket.build();
                    let ticket = Ticket::parse(&raw).unwrap();
                    let part = factory.unseal_ticket(&ticket, &server_key).unwrap();
                    assert_eq!(part.cname, client.name);
                    part.key
                })
            })
            .collect();

        let keys: Vec<EncryptionKey> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        for (i, key) in keys.iter().enumerate() {
            assert!(keys[i + 1..].iter().all(|other| other != key));
        }
    }
}
