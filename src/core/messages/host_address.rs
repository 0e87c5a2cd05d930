use super::{required, Asn1Message, Message, MessageType};
use crate::asn1::der;
use crate::asn1::primitives::decode_int32;
use crate::asn1::{Action, Container, Grammar, Tag};
use crate::error::Result;
use lazy_static::lazy_static;
use std::convert::TryFrom;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

pub const ADDRTYPE_INET: i32 = 2;
pub const ADDRTYPE_INET6: i32 = 24;

/// HostAddress ::= SEQUENCE {
///     addr-type   [0] Int32,
///     address     [1] OCTET STRING
/// }
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostAddress {
    pub addr_type: i32,
    pub address: Vec<u8>,
}

impl HostAddress {
    /// IP address held, if the address is an IPv4 or IPv6 one.
    pub fn ip(&self) -> Option<IpAddr> {
        match self.addr_type {
            ADDRTYPE_INET => {
                let octets = <[u8; 4]>::try_from(self.address.as_slice()).ok()?;
                return Some(Ipv4Addr::from(octets).into());
            }
            ADDRTYPE_INET6 => {
                let octets = <[u8; 16]>::try_from(self.address.as_slice()).ok()?;
                return Some(Ipv6Addr::from(octets).into());
            }
            _ => return None,
        }
    }
}

impl From<IpAddr> for HostAddress {
    fn from(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(ip) => {
                return Self {
                    addr_type: ADDRTYPE_INET,
                    address: ip.octets().to_vec(),
                }
            }
            IpAddr::V6(ip) => {
                return Self {
                    addr_type: ADDRTYPE_INET6,
                    address: ip.octets().to_vec(),
                }
            }
        }
    }
}

/// HostAddresses ::= SEQUENCE OF HostAddress
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostAddresses {
    pub addresses: Vec<HostAddress>,
}

impl HostAddresses {
    pub fn ips(&self) -> Vec<IpAddr> {
        return self.addresses.iter().filter_map(HostAddress::ip).collect();
    }
}

impl Asn1Message for HostAddress {
    const MESSAGE_TYPE: MessageType = MessageType::HostAddress;

    fn build(&self) -> Vec<u8> {
        return der::sequence(&[
            der::explicit(0, &der::integer(self.addr_type as i64)),
            der::explicit(1, &der::octet_string(&self.address)),
        ]);
    }
}

impl Asn1Message for HostAddresses {
    const MESSAGE_TYPE: MessageType = MessageType::HostAddresses;

    fn build(&self) -> Vec<u8> {
        let addresses: Vec<Vec<u8>> =
            self.addresses.iter().map(HostAddress::build).collect();
        return der::sequence(&addresses);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum AddressState {
    Start,
    Sequence,
    AddrTypeTag,
    AddrType,
    AddressTag,
    Address,
}

#[derive(Default)]
pub(crate) struct HostAddressContainer {
    addr_type: Option<i32>,
    address: Option<Vec<u8>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum AddressesState {
    Start,
    Sequence,
}

#[derive(Default)]
pub(crate) struct HostAddressesContainer {
    addresses: Vec<HostAddress>,
}

lazy_static! {
    static ref ADDRESS_GRAMMAR: Grammar<HostAddressContainer> =
        Grammar::new("HostAddress")
            .on(AddressState::Start, Tag::SEQUENCE, Action::Constructed, AddressState::Sequence)
            .on(
                AddressState::Sequence,
                Tag::context(0),
                Action::Explicit,
                AddressState::AddrTypeTag
            )
            .on(
                AddressState::AddrTypeTag,
                Tag::INTEGER,
                Action::Store(store_addr_type),
                AddressState::AddrType
            )
            .on(
                AddressState::AddrType,
                Tag::context(1),
                Action::Explicit,
                AddressState::AddressTag
            )
            .on_maybe_empty(
                AddressState::AddressTag,
                Tag::OCTET_STRING,
                Action::Store(store_address),
                AddressState::Address
            )
            .accept(&[AddressState::Address]);

    static ref ADDRESSES_GRAMMAR: Grammar<HostAddressesContainer> =
        Grammar::new("HostAddresses")
            .on_maybe_empty(
                AddressesState::Start,
                Tag::SEQUENCE,
                Action::Constructed,
                AddressesState::Sequence
            )
            .on(
                AddressesState::Sequence,
                Tag::SEQUENCE,
                Action::Nested(MessageType::HostAddress, merge_address),
                AddressesState::Sequence
            )
            .accept(&[AddressesState::Sequence]);
}

fn store_addr_type(container: &mut HostAddressContainer, value: &[u8]) -> Result<()> {
    container.addr_type = Some(decode_int32(value)?);
    return Ok(());
}

fn store_address(container: &mut HostAddressContainer, value: &[u8]) -> Result<()> {
    container.address = Some(value.to_vec());
    return Ok(());
}

fn merge_address(container: &mut HostAddressesContainer, message: Message) -> Result<()> {
    container.addresses.push(HostAddress::try_from(message)?);
    return Ok(());
}

impl Container for HostAddressContainer {
    type State = AddressState;
    const START: AddressState = AddressState::Start;

    fn grammar() -> &'static Grammar<Self> {
        return &ADDRESS_GRAMMAR;
    }

    fn finish(self) -> Result<Message> {
        let name = ADDRESS_GRAMMAR.name();
        return Ok(HostAddress {
            addr_type: required(self.addr_type, name, "addr-type")?,
            address: required(self.address, name, "address")?,
        }
        .into());
    }
}

impl Container for HostAddressesContainer {
    type State = AddressesState;
    const START: AddressesState = AddressesState::Start;

    fn grammar() -> &'static Grammar<Self> {
        return &ADDRESSES_GRAMMAR;
    }

    fn finish(self) -> Result<Message> {
        return Ok(HostAddresses {
            addresses: self.addresses,
        }
        .into());
    }
}
