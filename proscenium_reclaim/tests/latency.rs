// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Release latency bounds of the reclaim cadence.

use proscenium_reclaim::{GpuHandle, ResourceReclaimer};

/// Queues one handle at every tick of a long run and records when each is freed.
#[test]
fn every_release_waits_one_cycle_and_no_more_than_two() {
    let mut reclaimer = ResourceReclaimer::new();
    let mut freed_at: Vec<Option<u64>> = vec![None; 600];

    for tick in 0_u64..640 {
        if tick < 600 {
            reclaimer.queue_release(GpuHandle(tick));
        }
        let mut freed = Vec::new();
        reclaimer.advance(&mut |h: GpuHandle| freed.push(h));
        for h in freed {
            let slot = &mut freed_at[usize::try_from(h.0).unwrap()];
            assert!(slot.is_none(), "handle {} freed twice", h.0);
            *slot = Some(tick);
        }
    }

    for (queued, freed) in freed_at.iter().enumerate() {
        let queued = queued as u64;
        let freed = freed.unwrap_or_else(|| panic!("handle {queued} never freed"));
        assert!(freed >= queued + 4, "handle {queued} freed early at {freed}");
        assert!(freed <= queued + 32, "handle {queued} freed late at {freed}");
    }
}

#[test]
fn sweep_due_every_thirty_two_ticks_across_wrap() {
    let mut reclaimer = ResourceReclaimer::new();
    let mut last_sweep = 0_u32;
    for tick in 1_u32..=1024 {
        let actions = reclaimer.advance(&mut |_: GpuHandle| {});
        if actions.sweep {
            assert_eq!(tick - last_sweep, 32, "sweep spacing at tick {tick}");
            last_sweep = tick;
        }
    }
    assert_eq!(last_sweep, 1024);
}
