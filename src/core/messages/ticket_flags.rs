use kerberos_constants::ticket_flags;
use std::fmt;

pub const TICKET_FLAGS_SIZE: usize = 32;

/// Named ticket flags, with the bit masks registered for them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TicketFlag {
    Forwardable,
    Forwarded,
    Proxiable,
    Proxy,
    MayPostdate,
    Postdated,
    Invalid,
    Renewable,
    Initial,
    PreAuthent,
    HwAuthent,
    TransitedPolicyChecked,
    OkAsDelegate,
}

impl TicketFlag {
    pub fn mask(self) -> u32 {
        match self {
            TicketFlag::Forwardable => ticket_flags::FORWARDABLE,
            TicketFlag::Forwarded => ticket_flags::FORWARDED,
            TicketFlag::Proxiable => ticket_flags::PROXIABLE,
            TicketFlag::Proxy => ticket_flags::PROXY,
            TicketFlag::MayPostdate => ticket_flags::MAY_POSTDATE,
            TicketFlag::Postdated => ticket_flags::POSTDATE,
            TicketFlag::Invalid => ticket_flags::INVALID,
            TicketFlag::Renewable => ticket_flags::RENEWABLE,
            TicketFlag::Initial => ticket_flags::INITIAL,
            TicketFlag::PreAuthent => ticket_flags::PRE_AUTHENT,
            TicketFlag::HwAuthent => ticket_flags::HW_AUTHENT,
            TicketFlag::TransitedPolicyChecked => {
                ticket_flags::TRANSITED_POLICY_CHECKED
            }
            TicketFlag::OkAsDelegate => ticket_flags::OK_AS_DELEGATE,
        }
    }

    /// Position in the bit string, 0 being the most significant bit.
    pub fn index(self) -> usize {
        return self.mask().leading_zeros() as usize;
    }
}

/// The 32 bit KerberosFlags of a ticket.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TicketFlags {
    flags: u32,
}

impl TicketFlags {
    pub fn new() -> Self {
        return Self::default();
    }

    pub fn bits(&self) -> u32 {
        return self.flags;
    }

    /// Sets the flag at `index`. Indexes out of the 32 slots are ignored.
    pub fn set_flag(&mut self, index: usize) {
        if let Some(mask) = Self::index_mask(index) {
            self.flags |= mask;
        }
    }

    pub fn clear_flag(&mut self, index: usize) {
        if let Some(mask) = Self::index_mask(index) {
            self.flags &= !mask;
        }
    }

    pub fn is_flag_set(&self, index: usize) -> bool {
        return match Self::index_mask(index) {
            Some(mask) => self.flags & mask != 0,
            None => false,
        };
    }

    pub fn set(&mut self, flag: TicketFlag) {
        self.flags |= flag.mask();
    }

    pub fn is_set(&self, flag: TicketFlag) -> bool {
        return self.flags & flag.mask() != 0;
    }

    pub fn is_renewable(&self) -> bool {
        return self.is_set(TicketFlag::Renewable);
    }

    pub fn to_bool_array(&self) -> [bool; TICKET_FLAGS_SIZE] {
        let mut flags = [false; TICKET_FLAGS_SIZE];
        for (i, flag) in flags.iter_mut().enumerate() {
            *flag = self.is_flag_set(i);
        }
        return flags;
    }

    fn index_mask(index: usize) -> Option<u32> {
        if index >= TICKET_FLAGS_SIZE {
            return None;
        }
        return Some(0x8000_0000 >> index);
    }
}

impl From<u32> for TicketFlags {
    fn from(flags: u32) -> Self {
        return Self { flags };
    }
}

impl From<TicketFlag> for TicketFlags {
    fn from(flag: TicketFlag) -> Self {
        return Self { flags: flag.mask() };
    }
}

impl From<[bool; TICKET_FLAGS_SIZE]> for TicketFlags {
    fn from(flags: [bool; TICKET_FLAGS_SIZE]) -> Self {
        let mut ticket_flags = Self::new();
        for (i, set) in flags.iter().enumerate() {
            if *set {
                ticket_flags.set_flag(i);
            }
        }
        return ticket_flags;
    }
}

impl fmt::Debug for TicketFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TicketFlags({:#010x})", self.flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_flag_position_is_independent() {
        for i in 0..TICKET_FLAGS_SIZE {
            let mut flags = TicketFlags::new();
            flags.set_flag(i);
            for j in 0..TICKET_FLAGS_SIZE {
                assert_eq!(flags.is_flag_set(j), i == j, "set {} read {}", i, j);
            }
            let array = flags.to_bool_array();
            assert_eq!(TicketFlags::from(array), flags);
        }
    }

    #[test]
    fn test_registered_positions() {
        assert_eq!(TicketFlag::Forwardable.index(), 1);
        assert_eq!(TicketFlag::Renewable.index(), 8);
        assert_eq!(TicketFlag::Initial.index(), 9);
        assert_eq!(TicketFlag::PreAuthent.index(), 10);
        assert_eq!(TicketFlag::Renewable.mask(), 0x00800000);
    }

    #[test]
    fn test_renewable() {
        let mut flags = TicketFlags::from(TicketFlag::Renewable);
        assert!(flags.is_renewable());
        assert!(flags.is_flag_set(8));
        flags.clear_flag(8);
        assert!(!flags.is_renewable());
    }

    #[test]
    fn test_out_of_range_index() {
        let mut flags = TicketFlags::new();
        flags.set_flag(32);
        assert_eq!(flags.bits(), 0);
        assert!(!flags.is_flag_set(40));
    }
}
