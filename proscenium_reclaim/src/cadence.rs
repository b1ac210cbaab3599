// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Ticks between swaps of the release queues, minus one.
///
/// The back queue is emptied and the queues are swapped whenever
/// `frame & SWAP_MASK == 0`, i.e. every 4th tick.
pub const SWAP_MASK: u8 = 0x03;

/// Ticks between full orphan sweeps, minus one.
///
/// A sweep runs whenever `frame & SWEEP_MASK == 0`, i.e. every 32nd tick.
pub const SWEEP_MASK: u8 = 0x1F;

/// What a single collection tick should do.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectActions {
    /// Empty the back queue and swap it with the front queue.
    pub swap: bool,
    /// Sweep unreachable orphans and flush script binding releases.
    pub sweep: bool,
}

impl CollectActions {
    /// Both actions, used by forced collection.
    pub const ALL: Self = Self {
        swap: true,
        sweep: true,
    };
}

/// Eight-bit frame counter driving the reclaim cadence.
///
/// The counter wraps at 256, which is a multiple of both intervals, so the cadence
/// stays regular across the wrap.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameCounter(u8);

impl FrameCounter {
    /// A counter at frame zero.
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Returns the current frame value.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Advances by one frame and reports which actions are due.
    pub fn advance(&mut self) -> CollectActions {
        self.0 = self.0.wrapping_add(1);
        CollectActions {
            swap: self.0 & SWAP_MASK == 0,
            sweep: self.0 & SWEEP_MASK == 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cadence_counts() {
        let mut counter = FrameCounter::new();
        let mut swaps = 0;
        let mut sweeps = 0;
        for _ in 0..256 {
            let actions = counter.advance();
            swaps += usize::from(actions.swap);
            sweeps += usize::from(actions.sweep);
            // Every sweep frame is also a swap frame.
            assert!(!actions.sweep || actions.swap, "sweep without swap");
        }
        assert_eq!(swaps, 64);
        assert_eq!(sweeps, 8);
        assert_eq!(counter.get(), 0);
    }

    #[test]
    fn first_actions() {
        let mut counter = FrameCounter::new();
        assert_eq!(counter.advance(), CollectActions::default());
        assert_eq!(counter.advance(), CollectActions::default());
        assert_eq!(counter.advance(), CollectActions::default());
        assert_eq!(
            counter.advance(),
            CollectActions {
                swap: true,
                sweep: false
            }
        );
    }
}
