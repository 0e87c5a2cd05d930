//! ASN.1 BER/DER machinery: tags, TLV reading, DER writing and the grammar
//! driven decoder.

mod tag;
pub use tag::{Tag, TagClass};

mod tlv;
pub use tlv::{Tlv, TlvReader};

pub mod der;

pub mod primitives;

mod grammar;
pub use grammar::{Action, Container, Frame, Grammar, GrammarFrame, Step};

mod decoder;
pub use decoder::{
    decode, decode_slice, decode_with_config, Asn1Decoder, DecoderConfig,
};
