use crate::core::messages::{Asn1Message, EncryptedData, EncryptionKey};
use crate::core::KeyUsage;
use crate::error::{CryptoError, Result};
use kerberos_constants::etypes;
use kerberos_crypto::{new_kerberos_cipher, KerberosCipher};
use log::debug;

/// Encryption types a key may have.
pub const SUPPORTED_ETYPES: [i32; 3] = [
    etypes::AES256_CTS_HMAC_SHA1_96,
    etypes::AES128_CTS_HMAC_SHA1_96,
    etypes::RC4_HMAC,
];

pub fn is_supported_etype(etype: i32) -> bool {
    return SUPPORTED_ETYPES.contains(&etype);
}

/// Kerberos cipher bound to a key. It is the only place where key material
/// touches plaintext.
pub struct Cipher {
    cipher: Box<dyn KerberosCipher>,
    key: Vec<u8>,
}

impl Cipher {
    pub fn new(key: &EncryptionKey) -> Result<Self> {
        let cipher = new_cipher(key.keytype)?;
        return Ok(Self {
            cipher,
            key: key.keyvalue.clone(),
        });
    }

    pub fn etype(&self) -> i32 {
        return self.cipher.etype();
    }

    pub fn encrypt(&self, key_usage: KeyUsage, plaintext: &[u8]) -> Vec<u8> {
        return self.cipher.encrypt(&self.key, key_usage.number(), plaintext);
    }

    /// Fails with a bare `Integrity` error, the cause is only logged at
    /// debug level.
    pub fn decrypt(
        &self,
        key_usage: KeyUsage,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>> {
        return self
            .cipher
            .decrypt(&self.key, key_usage.number(), ciphertext)
            .map_err(|err| {
                debug!(
                    "Decryption with etype {} and usage {} failed: {}",
                    self.etype(),
                    key_usage,
                    err
                );
                CryptoError::Integrity.into()
            });
    }
}

pub(crate) fn new_cipher(etype: i32) -> Result<Box<dyn KerberosCipher>> {
    if !is_supported_etype(etype) {
        return Err(CryptoError::UnsupportedEtype(etype))?;
    }
    return new_kerberos_cipher(etype)
        .map_err(|_| CryptoError::UnsupportedEtype(etype).into());
}

/// Encodes the structure and encrypts it under the key usage.
pub fn seal<T: Asn1Message>(
    key: &EncryptionKey,
    plaintext: &T,
    key_usage: KeyUsage,
) -> Result<EncryptedData> {
    let cipher = Cipher::new(key)?;
    let raw = plaintext.build();
    debug!(
        "Sealing {} bytes of {} with etype {} and usage {}",
        raw.len(),
        T::MESSAGE_TYPE.name(),
        cipher.etype(),
        key_usage
    );
    return Ok(EncryptedData::new(
        cipher.etype(),
        None,
        cipher.encrypt(key_usage, &raw),
    ));
}

/// Decrypts the data and decodes the plaintext. Data that decrypts but
/// does not decode as `T` is reported as an integrity failure too.
pub fn unseal<T: Asn1Message>(
    key: &EncryptionKey,
    encrypted: &EncryptedData,
    key_usage: KeyUsage,
) -> Result<T> {
    if key.keytype != encrypted.etype {
        return Err(CryptoError::EtypeMismatch {
            key: key.keytype,
            data: encrypted.etype,
        })?;
    }

    let cipher = Cipher::new(key)?;
    let raw = cipher.decrypt(key_usage, &encrypted.cipher)?;

    return T::parse(&raw).map_err(|err| {
        debug!(
            "Decrypted data is not a valid {}: {}",
            T::MESSAGE_TYPE.name(),
            err
        );
        CryptoError::Integrity.into()
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::messages::{
        new_nt_principal, EncTicketPart, KerberosTime, TicketFlag,
        TicketFlags, TransitedEncoding,
    };
    use crate::error::Error;
    use chrono::{Duration, TimeZone, Utc};

    fn service_key(etype: i32) -> EncryptionKey {
        let size = if etype == etypes::AES256_CTS_HMAC_SHA1_96 { 32 } else { 16 };
        return EncryptionKey::new(etype, (0..size).map(|i| i as u8).collect());
    }

    fn enc_ticket_part() -> EncTicketPart {
        let authtime: KerberosTime =
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap().into();
        return EncTicketPart {
            flags: TicketFlags::from(TicketFlag::Renewable),
            key: EncryptionKey::new(17, vec![0xAB; 16]),
            crealm: "EXAMPLE.COM".to_string(),
            cname: new_nt_principal("alice"),
            transited: TransitedEncoding::default(),
            authtime,
            starttime: None,
            endtime: authtime.checked_add(Duration::hours(10)).unwrap(),
            renew_till: authtime.checked_add(Duration::days(7)),
            caddr: None,
            authorization_data: None,
        };
    }

    #[test]
    fn test_seal_unseal() {
        let part = enc_ticket_part();
        for etype in SUPPORTED_ETYPES.iter() {
            let key = service_key(*etype);
            let sealed = seal(&key, &part, KeyUsage::AS_REP_TICKET).unwrap();
            assert_eq!(sealed.etype, *etype);
            assert_ne!(sealed.cipher, part.build());

            let unsealed: EncTicketPart =
                unseal(&key, &sealed, KeyUsage::AS_REP_TICKET).unwrap();
            assert_eq!(unsealed, part);
        }
    }

    const USAGES: [KeyUsage; 5] = [
        KeyUsage::AS_REQ_TIMESTAMP,
        KeyUsage::AS_REP_TICKET,
        KeyUsage::AS_REP_ENC_PART,
        KeyUsage::TGS_REQ_AUTHEN,
        KeyUsage::TGS_REP_ENC_PART_SESSION_KEY,
    ];

    #[test]
    fn test_unseal_with_other_usage() {
        for etype in SUPPORTED_ETYPES.iter() {
            let key = service_key(*etype);
            for sealing in USAGES.iter() {
                let sealed = seal(&key, &enc_ticket_part(), *sealing).unwrap();
                for unsealing in USAGES.iter() {
                    let result = unseal::<EncTicketPart>(&key, &sealed, *unsealing);
                    if sealing.effective(*etype) == unsealing.effective(*etype) {
                        assert_eq!(result.unwrap(), enc_ticket_part());
                        continue;
                    }
                    match result {
                        Err(Error::Crypto(CryptoError::Integrity)) => {}
                        other => panic!(
                            "etype {} sealed with {} unsealed with {}: {:?}",
                            etype, sealing, unsealing, other
                        ),
                    }
                }
            }
        }
    }

    #[test]
    fn test_rc4_as_rep_usage_alias() {
        let key = service_key(etypes::RC4_HMAC);
        let sealed =
            seal(&key, &enc_ticket_part(), KeyUsage::AS_REP_ENC_PART).unwrap();

        let part = unseal::<EncTicketPart>(
            &key,
            &sealed,
            KeyUsage::TGS_REP_ENC_PART_SESSION_KEY,
        )
        .unwrap();
        assert_eq!(part, enc_ticket_part());
    }

    #[test]
    fn test_unseal_with_other_key() {
        let key = service_key(etypes::AES128_CTS_HMAC_SHA1_96);
        let other_key = EncryptionKey::new(key.keytype, vec![0x42; 16]);
        let sealed =
            seal(&key, &enc_ticket_part(), KeyUsage::AS_REP_TICKET).unwrap();

        let err = unseal::<EncTicketPart>(&other_key, &sealed, KeyUsage::AS_REP_TICKET)
            .unwrap_err();
        assert!(err.is_crypto_error());
    }

    #[test]
    fn test_corrupted_cipher() {
        let key = service_key(etypes::RC4_HMAC);
        let mut sealed =
            seal(&key, &enc_ticket_part(), KeyUsage::AS_REP_TICKET).unwrap();
        let middle = sealed.cipher.len() / 2;
        sealed.cipher[middle] ^= 0x01;

        match unseal::<EncTicketPart>(&key, &sealed, KeyUsage::AS_REP_TICKET) {
            Err(Error::Crypto(CryptoError::Integrity)) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_etype_mismatch() {
        let key = service_key(etypes::AES256_CTS_HMAC_SHA1_96);
        let sealed =
            seal(&key, &enc_ticket_part(), KeyUsage::AS_REP_TICKET).unwrap();
        let rc4_key = service_key(etypes::RC4_HMAC);

        match unseal::<EncTicketPart>(&rc4_key, &sealed, KeyUsage::AS_REP_TICKET) {
            Err(Error::Crypto(CryptoError::EtypeMismatch { key, data })) => {
                assert_eq!(key, etypes::RC4_HMAC);
                assert_eq!(data, etypes::AES256_CTS_HMAC_SHA1_96);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_etype() {
        let key = EncryptionKey::new(etypes::DES_CBC_MD5, vec![0; 8]);
        match Cipher::new(&key) {
            Err(Error::Crypto(CryptoError::UnsupportedEtype(etype))) => {
                assert_eq!(etype, etypes::DES_CBC_MD5);
            }
            Err(err) => panic!("unexpected error {:?}", err),
            Ok(_) => panic!("DES must not be supported"),
        }
    }
}
