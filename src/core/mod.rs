pub mod messages;

pub mod cipher;
pub use cipher::{seal, unseal, Cipher};

mod key_usage;
pub use key_usage::KeyUsage;

pub mod keys;

mod principal;
pub use principal::KerberosPrincipal;

mod clock;
pub use clock::{Clock, FixedClock, SystemClock};

pub mod store;

mod forge;
pub use forge::{ExternalTicket, IssuedTicket, TicketFactory, TicketPolicy};
