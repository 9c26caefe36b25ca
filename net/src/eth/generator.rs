// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! A monotonic 48-bit MAC address counter.

use crate::eth::Mac;
use tracing::warn;

/// The 48-bit MAC address space, as a count of addresses.
const MAC_SPACE: u64 = 1u64 << 48;

/// Allocates distinct MAC addresses from a monotonically increasing 48-bit
/// counter. The all-zero address is reserved and is never handed out: the
/// first call to [`next_one`](MacGenerator::next_one) returns `00:00:00:00:00:01`.
#[derive(Debug, Clone, Copy)]
pub struct MacGenerator {
    next: u64,
}

impl Default for MacGenerator {
    fn default() -> Self {
        MacGenerator::new()
    }
}

/// A contiguous block of MAC addresses allocated from a [`MacGenerator`].
pub type MacBlock = Vec<Mac>;

/// Returned when the MAC address space is exhausted. Carries whatever
/// addresses were successfully allocated before the counter wrapped, so a
/// caller requesting a block can decide whether a partial allocation is
/// usable.
#[derive(Debug, Clone, thiserror::Error)]
#[error("MAC address space exhausted after allocating {} of {requested} addresses", allocated.len())]
pub struct MacOverflow {
    /// Addresses successfully allocated before the counter wrapped.
    pub allocated: MacBlock,
    /// The number of addresses that were requested.
    pub requested: usize,
}

impl MacGenerator {
    /// A fresh generator. The counter starts at zero, so the first address
    /// handed out by `next_one` is `00:00:00:00:00:01`: the zero address
    /// itself is never allocated.
    #[must_use]
    pub fn new() -> Self {
        MacGenerator { next: 1 }
    }

    /// Allocate the next MAC address.
    ///
    /// # Errors
    ///
    /// Returns `Err(())` if the 48-bit counter has wrapped through every
    /// value (i.e. the address space is exhausted).
    pub fn next_one(&mut self) -> Result<Mac, ()> {
        if self.next >= MAC_SPACE {
            warn!("MAC address space exhausted");
            return Err(());
        }
        let mac = Mac::from_u64(self.next);
        self.next += 1;
        Ok(mac)
    }

    /// Allocate `k` consecutive MAC addresses.
    ///
    /// # Errors
    ///
    /// Returns [`MacOverflow`] (with whatever was allocated before
    /// exhaustion) if the address space runs out partway through.
    pub fn next_many(&mut self, k: usize) -> Result<MacBlock, MacOverflow> {
        let mut block = Vec::with_capacity(k);
        for _ in 0..k {
            match self.next_one() {
                Ok(mac) => block.push(mac),
                Err(()) => {
                    return Err(MacOverflow {
                        allocated: block,
                        requested: k,
                    });
                }
            }
        }
        Ok(block)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn first_allocation_skips_zero() {
        let mut gen = MacGenerator::new();
        assert_eq!(gen.next_one().unwrap(), Mac([0, 0, 0, 0, 0, 1]));
    }

    #[test]
    fn strictly_increasing() {
        let mut gen = MacGenerator::new();
        let a = gen.next_one().unwrap();
        let b = gen.next_one().unwrap();
        let c = gen.next_one().unwrap();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn next_many_strictly_increasing() {
        let mut gen = MacGenerator::new();
        let block = gen.next_many(10).unwrap();
        assert_eq!(block.len(), 10);
        for pair in block.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert!(!block[0].is_zero());
    }

    #[test]
    fn overflow_reported_exactly_at_wraparound() {
        let mut gen = MacGenerator {
            next: MAC_SPACE - 2,
        };
        assert!(gen.next_one().is_ok());
        assert!(gen.next_one().is_ok());
        assert!(gen.next_one().is_err());
    }

    #[test]
    fn next_many_overflow_reports_partial_allocation() {
        let mut gen = MacGenerator {
            next: MAC_SPACE - 3,
        };
        let err = gen.next_many(10).unwrap_err();
        assert_eq!(err.allocated.len(), 3);
        assert_eq!(err.requested, 10);
    }
}
