use crate::core::messages::{TicketFlag, TicketFlags};
use chrono::Duration;
use kerberos_constants::etypes;

const DEFAULT_LIFETIME_DAYS: i64 = 1;
const DEFAULT_RENEWAL_WINDOW_DAYS: i64 = 7;
const DEFAULT_KVNO: u32 = 1;

/// Parameters applied to every ticket issued by a factory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketPolicy {
    pub lifetime: Duration,
    pub renewal_window: Duration,
    pub flags: TicketFlags,
    /// Etype of the session keys.
    pub etype: i32,
    /// Version of the service key, announced in the ticket enc-part.
    pub kvno: Option<u32>,
}

impl Default for TicketPolicy {
    fn default() -> Self {
        return Self {
            lifetime: Duration::days(DEFAULT_LIFETIME_DAYS),
            renewal_window: Duration::days(DEFAULT_RENEWAL_WINDOW_DAYS),
            flags: TicketFlag::Renewable.into(),
            etype: etypes::AES256_CTS_HMAC_SHA1_96,
            kvno: Some(DEFAULT_KVNO),
        };
    }
}

impl TicketPolicy {
    pub fn new() -> Self {
        return Self::default();
    }

    pub fn lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        return self;
    }

    pub fn renewal_window(mut self, renewal_window: Duration) -> Self {
        self.renewal_window = renewal_window;
        return self;
    }

    pub fn flags(mut self, flags: TicketFlags) -> Self {
        self.flags = flags;
        return self;
    }

    pub fn add_flag(mut self, flag: TicketFlag) -> Self {
        self.flags.set(flag);
        return self;
    }

    pub fn etype(mut self, etype: i32) -> Self {
        self.etype = etype;
        return self;
    }

    pub fn kvno(mut self, kvno: Option<u32>) -> Self {
        self.kvno = kvno;
        return self;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = TicketPolicy::default();
        assert_eq!(policy.lifetime.num_seconds(), 86400);
        assert_eq!(policy.renewal_window.num_seconds(), 7 * 86400);
        assert!(policy.flags.is_renewable());
        assert_eq!(policy.etype, etypes::AES256_CTS_HMAC_SHA1_96);
        assert_eq!(policy.kvno, Some(1));
    }

    #[test]
    fn test_policy_builder() {
        let policy = TicketPolicy::new()
            .lifetime(Duration::hours(10))
            .flags(TicketFlags::new())
            .add_flag(TicketFlag::Forwardable)
            .etype(etypes::RC4_HMAC)
            .kvno(None);
        assert_eq!(policy.lifetime.num_hours(), 10);
        assert!(!policy.flags.is_renewable());
        assert!(policy.flags.is_set(TicketFlag::Forwardable));
        assert_eq!(policy.kvno, None);
    }
}
