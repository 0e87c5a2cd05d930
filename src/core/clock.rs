use crate::core::messages::KerberosTime;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> KerberosTime;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> KerberosTime {
        return KerberosTime::now();
    }
}

/// Clock stopped at a given instant.
#[derive(Clone, Debug)]
pub struct FixedClock {
    now: KerberosTime,
}

impl FixedClock {
    pub fn new(now: KerberosTime) -> Self {
        return Self { now };
    }
}

impl Clock for FixedClock {
    fn now(&self) -> KerberosTime {
        return self.now;
    }
}
