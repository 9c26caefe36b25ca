// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use std::net::Ipv4Addr;

/// Errors raised by the IPv4 primitives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Ipv4Error {
    /// The provided string is not a valid dotted-quad IPv4 address.
    #[error("'{0}' is not a valid IPv4 address")]
    BadAddress(String),
    /// The provided string is not a valid `a.b.c.d/p` CIDR subnet.
    #[error("'{0}' is not a valid IPv4 CIDR subnet")]
    BadCidr(String),
    /// A subnet of size `size` cannot be fragmented into `fragments` pieces.
    #[error("subnet of size {size} is too small to fragment into {fragments} pieces")]
    SubnetTooSmall { size: u64, fragments: u32 },
    /// The address space covered by an iterator has been fully enumerated.
    #[error("address space exhausted iterating {0}")]
    AddressSpaceExhausted(Ipv4Addr),
}
