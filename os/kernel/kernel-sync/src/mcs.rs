//! MCS queue lock.
//!
//! Every waiter spins on the `locked` flag of its own [`McsNode`] instead of
//! a shared word, and the lock itself only stores the tail of the wait
//! queue. Hand-over is strictly FIFO.
//!
//! ```text
//!   tail ───────────────────────────────┐
//!                                       ▼
//!   [holder] ──next──▶ [waiter] ──next──▶ [waiter]
//!                       locked=1           locked=1
//! ```

use crate::misuse::{LockMisuse, context_id, report};
use core::{
    cell::UnsafeCell,
    hint::spin_loop,
    marker::PhantomData,
    ops::{Deref, DerefMut},
    ptr,
    sync::atomic::{AtomicBool, AtomicPtr, AtomicUsize, Ordering},
};

/// A queue entry for one acquisition of an MCS lock.
///
/// The node is owned by the acquiring context. While queued it must not
/// move, and it must not be used for a second acquisition until the first
/// one has been released.
#[derive(Debug)]
pub struct McsNode {
    /// Set while the owner waits; cleared by the predecessor on hand-over.
    locked: AtomicBool,
    /// Successor in the queue, null until one attaches itself.
    next: AtomicPtr<McsNode>,
    /// Between acquire and release.
    queued: AtomicBool,
}

impl McsNode {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
            next: AtomicPtr::new(ptr::null_mut()),
            queued: AtomicBool::new(false),
        }
    }

    /// Whether the node is currently part of a lock's queue.
    #[must_use]
    pub fn is_queued(&self) -> bool {
        self.queued.load(Ordering::Relaxed)
    }

    fn prepare(&self) {
        if self.queued.swap(true, Ordering::Relaxed) {
            report(LockMisuse::NodeInUse);
        }
        self.next.store(ptr::null_mut(), Ordering::Relaxed);
        self.locked.store(true, Ordering::Relaxed);
    }

    const fn as_ptr(&self) -> *mut Self {
        ptr::from_ref(self).cast_mut()
    }
}

impl Default for McsNode {
    fn default() -> Self {
        Self::new()
    }
}

/// The lock word: a pointer to the last queued node, null when free.
#[derive(Debug)]
pub struct RawMcs {
    tail: AtomicPtr<McsNode>,
    /// Context id of the holder, 0 if unknown. Tracked in debug builds only.
    holder: AtomicUsize,
}

impl RawMcs {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tail: AtomicPtr::new(ptr::null_mut()),
            holder: AtomicUsize::new(0),
        }
    }

    /// Whether someone holds or waits for the lock.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        !self.tail.load(Ordering::Relaxed).is_null()
    }

    /// Enqueues `node` and spins until it is at the head of the queue.
    ///
    /// # Safety
    /// `node` must stay at its address and must not be reused until
    /// [`release`](Self::release) has been called with it and returned.
    pub unsafe fn acquire(&self, node: &McsNode) {
        let context = self.check_reentry();
        node.prepare();

        // AcqRel: publishes the node reset above to whoever links behind us,
        // and pairs with the predecessor's release.
        let prev = self.tail.swap(node.as_ptr(), Ordering::AcqRel);
        if prev.is_null() {
            node.locked.store(false, Ordering::Relaxed);
            self.mark_held(context);
            return;
        }

        // SAFETY: the predecessor cannot finish its release before it sees
        // this link, so `prev` is still alive.
        unsafe { (*prev).next.store(node.as_ptr(), Ordering::Release) };

        while node.locked.load(Ordering::Acquire) {
            spin_loop();
        }
        self.mark_held(context);
    }

    /// Takes the lock only if nobody holds or waits for it.
    ///
    /// # Safety
    /// As for [`acquire`](Self::acquire), if this returns `true`.
    #[must_use]
    pub unsafe fn try_acquire(&self, node: &McsNode) -> bool {
        node.prepare();
        node.locked.store(false, Ordering::Relaxed);

        let taken = self
            .tail
            .compare_exchange(
                ptr::null_mut(),
                node.as_ptr(),
                Ordering::AcqRel,
                Ordering::Relaxed,
            )
            .is_ok();
        if taken {
            self.mark_held(context_id());
        } else {
            node.queued.store(false, Ordering::Relaxed);
        }
        taken
    }

    /// Hands the lock to the next waiter, or frees it if there is none.
    ///
    /// # Safety
    /// `node` must be the node the current holder acquired with.
    pub unsafe fn release(&self, node: &McsNode) {
        if !node.queued.swap(false, Ordering::Relaxed) {
            report(LockMisuse::NotHeld);
            return;
        }
        // Cleared before hand-over; the successor writes its own id.
        self.mark_held(0);

        let mut next = node.next.load(Ordering::Acquire);
        if next.is_null() {
            if self
                .tail
                .compare_exchange(
                    node.as_ptr(),
                    ptr::null_mut(),
                    Ordering::Release,
                    Ordering::Relaxed,
                )
                .is_ok()
            {
                return;
            }

            // A successor swapped itself in but hasn't linked yet.
            loop {
                next = node.next.load(Ordering::Acquire);
                if !next.is_null() {
                    break;
                }
                spin_loop();
            }
        }

        // SAFETY: the successor spins on its node until this store, so it is alive.
        unsafe { (*next).locked.store(false, Ordering::Release) };
    }

    /// Reports a context queueing behind itself. Returns the caller's id.
    fn check_reentry(&self) -> usize {
        if !cfg!(debug_assertions) {
            return 0;
        }
        let context = context_id();
        // Only this context ever stores its own id, so a stale read cannot match.
        if context != 0 && self.holder.load(Ordering::Relaxed) == context {
            report(LockMisuse::Reentrant);
        }
        context
    }

    fn mark_held(&self, context: usize) {
        if cfg!(debug_assertions) {
            self.holder.store(context, Ordering::Relaxed);
        }
    }
}

impl Default for RawMcs {
    fn default() -> Self {
        Self::new()
    }
}

/// Data protected by an MCS lock.
///
/// The safe entry points ([`with_lock`](Self::with_lock),
/// [`with_node`](Self::with_node), [`try_with_lock`](Self::try_with_lock))
/// scope the acquisition to a closure. Guards are only available through
/// the `unsafe` [`lock`](Self::lock): leaking a guard would leave a node in
/// the queue after its storage is gone.
pub struct McsLock<T> {
    raw: RawMcs,
    value: UnsafeCell<T>,
}

// Safety: mutual exclusion; only T: Send may cross threads.
unsafe impl<T: Send> Sync for McsLock<T> {}

impl<T> McsLock<T> {
    pub const fn new(value: T) -> Self {
        Self {
            raw: RawMcs::new(),
            value: UnsafeCell::new(value),
        }
    }

    /// Runs `f` with exclusive access, queueing on a node on this stack frame.
    ///
    /// Not reentrant: locking again from inside `f` waits on itself forever.
    /// Debug builds report it as [`LockMisuse::Reentrant`] once
    /// [`set_context_id`](crate::set_context_id) is installed. Use
    /// [`try_with_lock`](Self::try_with_lock) where the lock may already be held.
    #[inline]
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut node = McsNode::new();
        self.with_node(&mut node, f)
    }

    /// Runs `f` with exclusive access, queueing on a caller-provided node.
    #[inline]
    pub fn with_node<R>(&self, node: &mut McsNode, f: impl FnOnce(&mut T) -> R) -> R {
        // SAFETY: `node` is exclusively borrowed for the whole acquisition and
        // the guard cannot escape this frame.
        let mut guard = unsafe { self.lock(node) };
        f(&mut guard)
    }

    /// Runs `f` only if the lock is free right now.
    #[inline]
    pub fn try_with_lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let node = McsNode::new();
        // SAFETY: as in `with_node`.
        let mut guard = unsafe { self.try_lock(&node) }?;
        Some(f(&mut guard))
    }

    /// Acquires the lock and returns a guard that releases it on drop.
    ///
    /// # Safety
    /// The guard must be dropped; forgetting it while `node` goes out of
    /// scope leaves a dangling pointer in the queue. `node` must not be
    /// queued elsewhere.
    #[inline]
    pub unsafe fn lock<'a>(&'a self, node: &'a McsNode) -> McsGuard<'a, T> {
        // SAFETY: `node` outlives the guard, which releases it.
        unsafe { self.raw.acquire(node) };
        McsGuard::new(self, node)
    }

    /// Like [`lock`](Self::lock) but fails instead of queueing.
    ///
    /// # Safety
    /// See [`lock`](Self::lock).
    #[inline]
    pub unsafe fn try_lock<'a>(&'a self, node: &'a McsNode) -> Option<McsGuard<'a, T>> {
        // SAFETY: see `lock`.
        if unsafe { self.raw.try_acquire(node) } {
            Some(McsGuard::new(self, node))
        } else {
            None
        }
    }

    /// Whether the lock is held or contended.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }

    /// Mutable access when you have `&mut self` (no contention possible).
    #[inline]
    pub const fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }

    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }
}

impl<T: Default> Default for McsLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Exclusive access to the data of an [`McsLock`].
pub struct McsGuard<'a, T> {
    lock: &'a McsLock<T>,
    node: &'a McsNode,
    /// Sync only if `T` is.
    _data: PhantomData<&'a mut T>,
}

impl<'a, T> McsGuard<'a, T> {
    const fn new(lock: &'a McsLock<T>, node: &'a McsNode) -> Self {
        Self {
            lock,
            node,
            _data: PhantomData,
        }
    }
}

impl<T> Deref for McsGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.lock.value.get() }
    }
}

impl<T> DerefMut for McsGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.value.get() }
    }
}

impl<T> Drop for McsGuard<'_, T> {
    fn drop(&mut self) {
        // SAFETY: the guard exists only after a successful acquire with `node`.
        unsafe { self.lock.raw.release(self.node) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::thread;

    #[test]
    fn uncontended_acquire_leaves_no_tail() {
        let raw = RawMcs::new();
        let node = McsNode::new();
        unsafe { raw.acquire(&node) };
        assert_eq!(raw.tail.load(Ordering::Relaxed), node.as_ptr());
        assert!(node.is_queued());
        unsafe { raw.release(&node) };
        assert!(raw.tail.load(Ordering::Relaxed).is_null());
        assert!(!node.is_queued());
    }

    #[test]
    fn try_acquire_fails_while_queued() {
        let raw = RawMcs::new();
        let holder = McsNode::new();
        let other = McsNode::new();
        assert!(unsafe { raw.try_acquire(&holder) });
        assert!(!unsafe { raw.try_acquire(&other) });
        assert!(!other.is_queued());
        unsafe { raw.release(&holder) };
        assert!(unsafe { raw.try_acquire(&other) });
        unsafe { raw.release(&other) };
    }

    /// Waiters are admitted one at a time, each only after the previous one
    /// is visibly the tail, so their arrival order is known.
    #[test]
    fn hand_over_is_fifo() {
        const WAITERS: usize = 16;

        let lock = Arc::new(McsLock::new(()));
        let order = Arc::new(Mutex::new(Vec::with_capacity(WAITERS)));

        let holder = McsNode::new();
        let guard = unsafe { lock.lock(&holder) };

        let mut handles = Vec::with_capacity(WAITERS);
        for id in 0..WAITERS {
            let before = lock.raw.tail.load(Ordering::Acquire);
            let waiter_lock = Arc::clone(&lock);
            let order = Arc::clone(&order);
            handles.push(thread::spawn(move || {
                waiter_lock.with_lock(|_| order.lock().unwrap().push(id));
            }));
            while lock.raw.tail.load(Ordering::Acquire) == before {
                thread::yield_now();
            }
        }

        drop(guard);
        for handle in handles {
            handle.join().unwrap();
        }

        let order = order.lock().unwrap();
        assert_eq!(*order, (0..WAITERS).collect::<Vec<_>>());
        assert!(!lock.is_locked());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "lock misuse")]
    fn reusing_a_queued_node_panics() {
        let raw = RawMcs::new();
        let node = McsNode::new();
        unsafe {
            raw.acquire(&node);
            raw.acquire(&node);
        }
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "lock misuse")]
    fn release_without_acquire_panics() {
        let raw = RawMcs::new();
        let node = McsNode::new();
        unsafe { raw.release(&node) };
    }
}
