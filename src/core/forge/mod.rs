//! Issuance of tickets and their conversion to the flat representation
//! used outside the protocol code.

mod policy;
pub use policy::TicketPolicy;

mod factory;
pub use factory::{IssuedTicket, TicketFactory};

mod external;
pub use external::ExternalTicket;
