// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame collection: deferred resource release and orphan teardown.

use alloc::vec::Vec;

use proscenium_reclaim::{CollectActions, ReleaseSink};

use crate::{NodeId, Scene, ScriptBinding};

/// Outbound side of collection.
///
/// Backend resources arrive through [`ReleaseSink::release_resource`]; host
/// objects through [`release_binding`](Self::release_binding).
pub trait SceneSink: ReleaseSink {
    /// Releases a host object.
    fn release_binding(&mut self, binding: ScriptBinding);

    /// Whether the host still references `binding`.
    ///
    /// An orphan whose binding is reachable survives the sweep, since the host may
    /// attach it again.
    fn is_binding_reachable(&self, binding: ScriptBinding) -> bool {
        let _ = binding;
        false
    }
}

/// What a collection pass did.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectReport {
    /// Actions the cadence called for.
    pub actions: CollectActions,
    /// Nodes torn down by the sweep.
    pub nodes_freed: usize,
    /// Host objects handed to the sink.
    pub bindings_released: usize,
}

impl Scene {
    /// Runs one frame of collection; call once per tick after rendering.
    ///
    /// Every 4th call releases the reclaimer's back queue and swaps the queues;
    /// every 32nd call also sweeps the orphanage and flushes host object releases.
    pub fn collect<S: SceneSink>(&mut self, sink: &mut S) -> CollectReport {
        let actions = self.reclaimer.advance(sink);
        let mut report = CollectReport {
            actions,
            ..CollectReport::default()
        };
        if actions.sweep {
            report.nodes_freed = self.sweep_orphans(sink);
            report.bindings_released = self.flush_script_releases(sink);
        }
        report
    }

    /// Collects everything immediately, ignoring the cadence.
    ///
    /// Sweeps the orphanage, then empties both release queues (including what the
    /// sweep just queued) and flushes host object releases. Use before the
    /// rendering context is lost.
    pub fn force_collect<S: SceneSink>(&mut self, sink: &mut S) -> CollectReport {
        let nodes_freed = self.sweep_orphans(sink);
        self.reclaimer.flush_all(sink);
        let bindings_released = self.flush_script_releases(sink);
        log::info!("forced collection freed {nodes_freed} nodes");
        CollectReport {
            actions: CollectActions::ALL,
            nodes_freed,
            bindings_released,
        }
    }

    /// Tears down every orphan the host no longer references.
    ///
    /// Returns the number of nodes freed. A nested call while a sweep is running
    /// does nothing and returns zero.
    pub fn sweep_orphans<S: SceneSink>(&mut self, sink: &mut S) -> usize {
        let Some(_token) = self.latch.try_enter() else {
            log::warn!("sweep requested while one is running; skipped");
            return 0;
        };
        let orphans: Vec<NodeId> = self.children_of(self.orphanage()).to_vec();
        let mut freed = 0;
        for id in orphans {
            let reachable = self
                .script_binding(id)
                .is_some_and(|b| sink.is_binding_reachable(b));
            if !reachable {
                freed += self.destroy_subtree(id);
            }
        }
        if freed > 0 {
            log::debug!("swept {freed} orphaned nodes");
        }
        freed
    }

    /// Detaches `id` and frees it with its whole subtree.
    ///
    /// Backend resources go to the reclaimer and host objects to the release list.
    /// Returns the number of nodes freed. Stages and orphanages are never freed.
    pub(crate) fn destroy_subtree(&mut self, id: NodeId) -> usize {
        if self.is_root(id) {
            return 0;
        }
        self.unlink(id);
        let mut freed = 0;
        for n in self.subtree(id) {
            let Some(node) = self.free(n) else { continue };
            if let Some(r) = node.data.renderable {
                for handle in r.resources {
                    self.reclaimer.queue_release(handle);
                }
            }
            if let Some(binding) = node.data.script {
                self.script_releases.push(binding);
            }
            freed += 1;
        }
        freed
    }

    fn flush_script_releases<S: SceneSink>(&mut self, sink: &mut S) -> usize {
        let pending = core::mem::take(&mut self.script_releases);
        let count = pending.len();
        for binding in pending {
            sink.release_binding(binding);
        }
        count
    }
}
