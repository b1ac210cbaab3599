// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyed cache of shareable render resources.

use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::Cell;
use core::ops::Deref;

use hashbrown::HashMap;

use crate::{GpuHandle, ReclaimSender};

/// Category of a cached resource, used by [`ResourceCache::release_by_type`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// An image loaded from a file or generated once.
    Image,
    /// A per-pixel mask bitmap.
    Mask,
    /// A render target or canvas that is redrawn.
    Canvas,
    /// A resource provided by a plugin or the host.
    External,
}

/// Selects which owned entries [`ResourceCache::release_by_type`] removes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KindFilter {
    /// Every owned entry.
    Any,
    /// Only entries of the given kind.
    Only(ResourceKind),
}

impl KindFilter {
    fn matches(self, kind: ResourceKind) -> bool {
        match self {
            Self::Any => true,
            Self::Only(k) => k == kind,
        }
    }
}

/// A resource that can live in a [`ResourceCache`].
pub trait RenderResource {
    /// Category used for bulk release.
    fn kind(&self) -> ResourceKind;

    /// Bytes of backend memory this resource accounts for.
    fn byte_size(&self) -> usize;

    /// Backend handle to free once the resource is dropped, if it has one.
    fn gpu_handle(&self) -> Option<GpuHandle> {
        None
    }
}

/// Running total of bytes held by live cached resources.
#[derive(Debug, Default)]
struct MemoryLedger {
    used: Cell<usize>,
}

impl MemoryLedger {
    fn did_add(&self, bytes: usize) {
        self.used.set(self.used.get().saturating_add(bytes));
    }

    fn will_remove(&self, bytes: usize) {
        self.used.set(self.used.get().saturating_sub(bytes));
    }
}

/// A resource owned by the cache machinery.
///
/// Dereferences to the resource. When the last [`Rc`] to it is dropped, its bytes
/// are removed from the cache's memory total and its [`GpuHandle`], if any, is
/// queued on the reclaimer rather than freed on the spot.
#[derive(Debug)]
pub struct Cached<R: RenderResource> {
    key: String,
    resource: R,
    bytes: usize,
    ledger: Rc<MemoryLedger>,
    reclaim: ReclaimSender,
}

impl<R: RenderResource> Cached<R> {
    /// The key this resource was created under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<R: RenderResource> Deref for Cached<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.resource
    }
}

impl<R: RenderResource> Drop for Cached<R> {
    fn drop(&mut self) {
        self.ledger.will_remove(self.bytes);
        if let Some(handle) = self.resource.gpu_handle() {
            self.reclaim.queue_release(handle);
        }
        log::trace!("dropped cached resource {:?}", self.key);
    }
}

/// Keyed cache of shareable render resources.
///
/// Lookups go through a table of weak references: a resource stays findable only
/// while something else holds it. The separate *owned* table keeps strong
/// references for resources that must persist regardless, such as preloaded
/// images or render targets.
#[derive(Debug)]
pub struct ResourceCache<R: RenderResource> {
    entries: HashMap<String, Weak<Cached<R>>>,
    owned: HashMap<String, Rc<Cached<R>>>,
    preload: Vec<Rc<Cached<R>>>,
    updates: Vec<Weak<Cached<R>>>,
    default: Option<Rc<Cached<R>>>,
    ledger: Rc<MemoryLedger>,
    reclaim: ReclaimSender,
}

impl<R: RenderResource> ResourceCache<R> {
    /// Creates an empty cache whose resources release through `reclaim`.
    #[must_use]
    pub fn new(reclaim: ReclaimSender) -> Self {
        Self {
            entries: HashMap::new(),
            owned: HashMap::new(),
            preload: Vec::new(),
            updates: Vec::new(),
            default: None,
            ledger: Rc::new(MemoryLedger::default()),
            reclaim,
        }
    }

    fn wrap(&self, key: &str, resource: R) -> Rc<Cached<R>> {
        let bytes = resource.byte_size();
        self.ledger.did_add(bytes);
        Rc::new(Cached {
            key: String::from(key),
            resource,
            bytes,
            ledger: Rc::clone(&self.ledger),
            reclaim: self.reclaim.clone(),
        })
    }

    /// Returns the live resource cached under `key`, if any.
    ///
    /// A dead weak entry is removed on the way.
    pub fn find(&mut self, key: &str) -> Option<Rc<Cached<R>>> {
        let weak = self.entries.get(key)?;
        match weak.upgrade() {
            Some(rc) => Some(rc),
            None => {
                self.entries.remove(key);
                None
            }
        }
    }

    /// Returns the resource under `key`, creating it with `create` if needed.
    ///
    /// `create` returning `None` means the resource does not exist; the caller
    /// gets `None` back and is expected to substitute a default.
    pub fn find_or_create(
        &mut self,
        key: &str,
        create: impl FnOnce(&str) -> Option<R>,
    ) -> Option<Rc<Cached<R>>> {
        if let Some(found) = self.find(key) {
            return Some(found);
        }
        let resource = create(key)?;
        let rc = self.wrap(key, resource);
        self.entries.insert(String::from(key), Rc::downgrade(&rc));
        log::trace!("cached new resource {key:?}");
        Some(rc)
    }

    /// Like [`find`](Self::find), falling back to the default resource.
    pub fn find_or_default(&mut self, key: &str) -> Option<Rc<Cached<R>>> {
        self.find(key).or_else(|| self.default.clone())
    }

    /// Installs the resource returned for missing keys by
    /// [`find_or_default`](Self::find_or_default).
    pub fn set_default(&mut self, key: &str, resource: R) {
        self.default = Some(self.wrap(key, resource));
    }

    /// The default resource, if one was installed.
    #[must_use]
    pub fn default_resource(&self) -> Option<&Rc<Cached<R>>> {
        self.default.as_ref()
    }

    /// Keeps a strong reference to `resource` under its key.
    pub fn retain(&mut self, resource: &Rc<Cached<R>>) {
        self.owned
            .insert(String::from(resource.key()), Rc::clone(resource));
    }

    /// Drops the owned strong reference under `key`.
    ///
    /// The weak entry stays until every other holder lets go. Returns whether an
    /// owned reference was present.
    pub fn release(&mut self, key: &str) -> bool {
        self.owned.remove(key).is_some()
    }

    /// Drops every owned reference whose kind matches `filter`.
    ///
    /// Returns how many owned entries were removed.
    pub fn release_by_type(&mut self, filter: KindFilter) -> usize {
        let before = self.owned.len();
        self.owned.retain(|_, r| !filter.matches(r.kind()));
        let removed = before - self.owned.len();
        if removed > 0 {
            log::debug!("released {removed} owned resources ({filter:?})");
        }
        removed
    }

    /// Whether an owned reference exists under `key`.
    #[must_use]
    pub fn is_retained(&self, key: &str) -> bool {
        self.owned.contains_key(key)
    }

    /// Bytes held by all live resources created through this cache.
    #[must_use]
    pub fn texture_memory_used(&self) -> usize {
        self.ledger.used.get()
    }

    /// Queues `resource` for upload before the next render.
    ///
    /// The queue holds a strong reference until [`preload`](Self::preload) runs.
    pub fn add_to_preload_queue(&mut self, resource: &Rc<Cached<R>>) {
        self.preload.push(Rc::clone(resource));
    }

    /// Hands every queued resource to `upload` and empties the queue.
    pub fn preload(&mut self, mut upload: impl FnMut(&Cached<R>)) {
        for resource in self.preload.drain(..) {
            upload(&resource);
        }
    }

    /// Number of resources waiting in the preload queue.
    #[must_use]
    pub fn preload_len(&self) -> usize {
        self.preload.len()
    }

    /// Marks `resource` as needing its backend copy refreshed.
    pub fn mark_for_update(&mut self, resource: &Rc<Cached<R>>) {
        self.updates.push(Rc::downgrade(resource));
    }

    /// Takes the resources marked for update that are still alive.
    pub fn take_updates(&mut self) -> Vec<Rc<Cached<R>>> {
        self.updates.drain(..).filter_map(|w| w.upgrade()).collect()
    }

    /// Removes weak entries whose resource has been dropped.
    ///
    /// Returns how many entries were removed.
    pub fn purge_dead_entries(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, w| w.strong_count() > 0);
        before - self.entries.len()
    }

    /// Number of weak entries, live or not yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache has no weak entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResourceReclaimer;
    use alloc::vec;

    #[derive(Debug, PartialEq)]
    struct Image {
        kind: ResourceKind,
        bytes: usize,
        handle: u64,
    }

    impl RenderResource for Image {
        fn kind(&self) -> ResourceKind {
            self.kind
        }

        fn byte_size(&self) -> usize {
            self.bytes
        }

        fn gpu_handle(&self) -> Option<GpuHandle> {
            Some(GpuHandle(self.handle))
        }
    }

    fn image(kind: ResourceKind, bytes: usize, handle: u64) -> impl FnOnce(&str) -> Option<Image> {
        move |_: &str| {
            Some(Image {
                kind,
                bytes,
                handle,
            })
        }
    }

    #[test]
    fn find_or_create_shares_live_entries() {
        let reclaimer = ResourceReclaimer::new();
        let mut cache = ResourceCache::new(reclaimer.sender());
        let a = cache
            .find_or_create("a.png", image(ResourceKind::Image, 16, 1))
            .unwrap();
        let again = cache
            .find_or_create("a.png", |_| panic!("should reuse the live entry"))
            .unwrap();
        assert!(Rc::ptr_eq(&a, &again));
        assert_eq!(cache.texture_memory_used(), 16);
    }

    #[test]
    fn weak_entry_dies_with_last_holder() {
        let reclaimer = ResourceReclaimer::new();
        let mut cache = ResourceCache::new(reclaimer.sender());
        let a = cache
            .find_or_create("a.png", image(ResourceKind::Image, 16, 1))
            .unwrap();
        drop(a);
        assert!(cache.find("a.png").is_none());
        assert_eq!(cache.texture_memory_used(), 0);
        // The backend handle waits in the reclaimer instead of being freed.
        assert_eq!(reclaimer.pending(), (1, 0));
    }

    #[test]
    fn missing_resource_is_not_an_error() {
        let reclaimer = ResourceReclaimer::new();
        let mut cache = ResourceCache::<Image>::new(reclaimer.sender());
        assert!(cache.find_or_create("missing.png", |_| None).is_none());
        assert!(cache.find_or_default("missing.png").is_none());

        cache.set_default("default", Image {
            kind: ResourceKind::Image,
            bytes: 4,
            handle: 9,
        });
        let d = cache.find_or_default("missing.png").unwrap();
        assert_eq!(d.key(), "default");
    }

    #[test]
    fn retain_and_release() {
        let reclaimer = ResourceReclaimer::new();
        let mut cache = ResourceCache::new(reclaimer.sender());
        let a = cache
            .find_or_create("a.png", image(ResourceKind::Image, 8, 1))
            .unwrap();
        cache.retain(&a);
        drop(a);
        assert!(cache.find("a.png").is_some());
        assert!(cache.release("a.png"));
        assert!(!cache.release("a.png"));
        assert!(cache.find("a.png").is_none());
    }

    #[test]
    fn release_by_type_filters_owned() {
        let reclaimer = ResourceReclaimer::new();
        let mut cache = ResourceCache::new(reclaimer.sender());
        for (key, kind, handle) in [
            ("a", ResourceKind::Image, 1),
            ("b", ResourceKind::Mask, 2),
            ("c", ResourceKind::Canvas, 3),
            ("d", ResourceKind::Mask, 4),
        ] {
            let r = cache.find_or_create(key, image(kind, 1, handle)).unwrap();
            cache.retain(&r);
        }
        assert_eq!(cache.texture_memory_used(), 4);
        assert_eq!(cache.release_by_type(KindFilter::Only(ResourceKind::Mask)), 2);
        assert!(cache.is_retained("a"));
        assert!(!cache.is_retained("b"));
        assert_eq!(cache.texture_memory_used(), 2);
        assert_eq!(cache.release_by_type(KindFilter::Any), 2);
        assert_eq!(cache.texture_memory_used(), 0);
        assert_eq!(cache.purge_dead_entries(), 4);
        assert!(cache.is_empty());
    }

    #[test]
    fn preload_and_update_lists() {
        let reclaimer = ResourceReclaimer::new();
        let mut cache = ResourceCache::new(reclaimer.sender());
        let a = cache
            .find_or_create("a", image(ResourceKind::Canvas, 1, 1))
            .unwrap();
        cache.add_to_preload_queue(&a);
        drop(a);
        // The preload queue keeps the resource alive.
        assert!(cache.find("a").is_some());

        let mut uploaded = vec![];
        cache.preload(|r| uploaded.push(r.handle));
        assert_eq!(uploaded, vec![1]);
        assert_eq!(cache.preload_len(), 0);
        assert!(cache.find("a").is_none());

        let b = cache
            .find_or_create("b", image(ResourceKind::Canvas, 1, 2))
            .unwrap();
        let c = cache
            .find_or_create("c", image(ResourceKind::Canvas, 1, 3))
            .unwrap();
        cache.mark_for_update(&b);
        cache.mark_for_update(&c);
        drop(c);
        let updates = cache.take_updates();
        assert_eq!(updates.len(), 1);
        assert!(Rc::ptr_eq(&updates[0], &b));
    }
}
