// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! An IPv4 subnet: an address together with a prefix length, canonicalized so
//! that host bits are always zero.

use crate::ipv4::Ipv4Error;
use ipnet::Ipv4Net;
use std::fmt::{Display, Formatter};
use std::net::Ipv4Addr;
use std::str::FromStr;

/// An IPv4 address with a prefix length in `[0, 32]`.
///
/// Unlike a raw `(Ipv4Addr, u8)` pair, an [`Ipv4Subnet`] is always
/// canonicalized at construction: any set host bits in the supplied address
/// are silently zeroed, matching the invariant that `mask = !((1 <<
/// (32-prefix_len)) - 1)` and the address has no bits set outside of that
/// mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ipv4Subnet(Ipv4Net);

impl Ipv4Subnet {
    /// `0.0.0.0/0`, the subnet containing every address.
    #[must_use]
    #[allow(clippy::missing_panics_doc)] // infallible: 0.0.0.0/0 is always valid
    pub fn root() -> Ipv4Subnet {
        Ipv4Subnet::new(Ipv4Addr::UNSPECIFIED, 0).unwrap_or_else(|_| unreachable!())
    }

    /// Construct a subnet from an address and prefix length, zeroing any set
    /// host bits.
    ///
    /// # Errors
    ///
    /// Returns [`Ipv4Error::BadCidr`] if `prefix_len` is greater than 32.
    pub fn new(addr: Ipv4Addr, prefix_len: u8) -> Result<Self, Ipv4Error> {
        let net = Ipv4Net::new(addr, prefix_len)
            .map_err(|_| Ipv4Error::BadCidr(format!("{addr}/{prefix_len}")))?;
        Ok(Ipv4Subnet(net.trunc()))
    }

    /// The network address (host bits zero).
    #[must_use]
    pub fn address(&self) -> Ipv4Addr {
        self.0.addr()
    }

    /// The prefix length, in `[0, 32]`.
    #[must_use]
    pub fn prefix_len(&self) -> u8 {
        self.0.prefix_len()
    }

    /// The 32-bit network mask, with the top `prefix_len` bits set.
    #[must_use]
    pub fn mask(&self) -> u32 {
        (!0u32).checked_shl(u32::from(32 - self.prefix_len())).unwrap_or(0)
    }

    /// The number of addresses covered by this subnet, i.e. `2^(32 -
    /// prefix_len)`. Fits in a `u64` even for `/0` (2^32).
    #[must_use]
    pub fn size(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix_len()))
    }

    /// The first address in the subnet, as a plain `u32` in host-comparable
    /// (big-endian numeric) order.
    #[must_use]
    pub fn first_bits(&self) -> u32 {
        self.address().to_bits()
    }

    /// The last address in the subnet (inclusive), as a `u32`.
    #[must_use]
    pub fn last_bits(&self) -> u32 {
        #[allow(clippy::cast_possible_truncation)] // bounded by construction: first + size - 1 <= u32::MAX
        let last = u64::from(self.first_bits()) + self.size() - 1;
        last as u32
    }

    /// Returns true iff `addr` falls within this subnet.
    #[must_use]
    pub fn contains_addr(&self, addr: Ipv4Addr) -> bool {
        self.0.contains(&addr)
    }

    /// Returns true iff this subnet and `other` overlap: masking both
    /// addresses by the shorter of the two prefixes yields the same network.
    #[must_use]
    pub fn overlaps(&self, other: &Ipv4Subnet) -> bool {
        let shorter = self.prefix_len().min(other.prefix_len());
        let mask = (!0u32).checked_shl(u32::from(32 - shorter)).unwrap_or(0);
        (self.first_bits() & mask) == (other.first_bits() & mask)
    }

    /// Split this subnet into `n` contiguous, power-of-two-aligned
    /// fragments. See [`SubnetFragments`] for the algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`Ipv4Error::SubnetTooSmall`] if `n` exceeds the number of
    /// addresses in this subnet.
    pub fn fragment(&self, n: u32) -> Result<super::SubnetFragments, Ipv4Error> {
        super::SubnetFragments::new(*self, n)
    }
}

impl Display for Ipv4Subnet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.address(), self.prefix_len())
    }
}

impl FromStr for Ipv4Subnet {
    type Err = Ipv4Error;

    /// Parse `"a.b.c.d/p"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let net = Ipv4Net::from_str(s).map_err(|_| Ipv4Error::BadCidr(s.to_owned()))?;
        Ipv4Subnet::new(net.addr(), net.prefix_len())
    }
}

/// Parse a bare dotted-quad IPv4 address.
///
/// # Errors
///
/// Returns [`Ipv4Error::BadAddress`] if `s` is not a valid IPv4 address.
pub fn parse_addr(s: &str) -> Result<Ipv4Addr, Ipv4Error> {
    Ipv4Addr::from_str(s).map_err(|_| Ipv4Error::BadAddress(s.to_owned()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn canonicalizes_host_bits() {
        let s = Ipv4Subnet::new(Ipv4Addr::new(10, 0, 0, 5), 24).unwrap();
        assert_eq!(s.address(), Ipv4Addr::new(10, 0, 0, 0));
    }

    #[test]
    fn parse_bad_address() {
        assert!(matches!(parse_addr("not.an.ip"), Err(Ipv4Error::BadAddress(_))));
    }

    #[test]
    fn parse_bad_cidr() {
        assert!(matches!("10.0.0.0/99".parse::<Ipv4Subnet>(), Err(Ipv4Error::BadCidr(_))));
    }

    #[test]
    fn size_and_bounds() {
        let s: Ipv4Subnet = "192.168.1.0/24".parse().unwrap();
        assert_eq!(s.size(), 256);
        assert_eq!(s.first_bits(), Ipv4Addr::new(192, 168, 1, 0).to_bits());
        assert_eq!(s.last_bits(), Ipv4Addr::new(192, 168, 1, 255).to_bits());
    }

    #[test]
    fn root_covers_everything() {
        let root = Ipv4Subnet::root();
        assert_eq!(root.size(), 1u64 << 32);
        assert_eq!(root.first_bits(), 0);
        assert_eq!(root.last_bits(), u32::MAX);
    }

    #[test]
    fn overlap_detection() {
        let a: Ipv4Subnet = "10.0.0.0/24".parse().unwrap();
        let b: Ipv4Subnet = "10.0.0.128/25".parse().unwrap();
        let c: Ipv4Subnet = "10.0.1.0/24".parse().unwrap();
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn restricted_ranges_never_overlap_with_disjoint_subnet() {
        let loopback: Ipv4Subnet = "127.0.0.0/8".parse().unwrap();
        let client: Ipv4Subnet = "192.168.0.0/24".parse().unwrap();
        assert!(!loopback.overlaps(&client));
    }
}
