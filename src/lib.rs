//! Kerberos codec and ticket issuance core of a KDC.
//!
//! The [`asn1`] module holds a streaming, table driven DER decoder. The
//! Kerberos structures and their grammars live in [`core::messages`], and
//! the rest of [`core`] seals, unseals and issues tickets.

pub mod asn1;
pub mod core;
pub mod error;

pub use error::{Error, Result};
