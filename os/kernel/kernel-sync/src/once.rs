use core::{
    cell::UnsafeCell,
    hint::spin_loop,
    mem::MaybeUninit,
    sync::atomic::{AtomicU8, Ordering},
};

const EMPTY: u8 = 0;
const WRITING: u8 = 1;
const PUBLISHED: u8 = 2;

/// Write-once storage for data that is read-only after early init.
///
/// Readers never take a lock; they see either nothing or the complete value.
pub struct Once<T> {
    state: AtomicU8,
    value: UnsafeCell<MaybeUninit<T>>,
}

impl<T> Default for Once<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Once<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(EMPTY),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    /// The published value, if any.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        if self.state.load(Ordering::Acquire) == PUBLISHED {
            // SAFETY: PUBLISHED is stored only after the write completed.
            Some(unsafe { (*self.value.get()).assume_init_ref() })
        } else {
            None
        }
    }

    /// Publishes `value` unless something was published before.
    ///
    /// # Errors
    /// Hands `value` back if the slot was already taken.
    pub fn publish(&self, value: T) -> Result<&T, T> {
        if self
            .state
            .compare_exchange(EMPTY, WRITING, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(value);
        }

        // SAFETY: WRITING makes this the only writer, and no reader looks
        // before PUBLISHED.
        let value = unsafe { (*self.value.get()).write(value) };
        self.state.store(PUBLISHED, Ordering::Release);
        Ok(value)
    }

    /// Returns the value, running `init` if nobody published yet. Concurrent
    /// callers spin until the winner is done.
    ///
    /// If `init` panics the slot is empty again and the next caller runs its
    /// own initializer.
    pub fn get_or_init(&self, init: impl FnOnce() -> T) -> &T {
        loop {
            match self
                .state
                .compare_exchange(EMPTY, WRITING, Ordering::Acquire, Ordering::Acquire)
            {
                Ok(_) => {
                    let reset = ResetOnUnwind(&self.state);
                    // SAFETY: as in `publish`.
                    let value = unsafe { (*self.value.get()).write(init()) };
                    core::mem::forget(reset);
                    self.state.store(PUBLISHED, Ordering::Release);
                    return value;
                }
                // SAFETY: PUBLISHED was observed with Acquire.
                Err(PUBLISHED) => return unsafe { (*self.value.get()).assume_init_ref() },
                Err(_) => spin_loop(),
            }
        }
    }
}

/// Puts a slot back to EMPTY when its initializer unwinds.
struct ResetOnUnwind<'a>(&'a AtomicU8);

impl Drop for ResetOnUnwind<'_> {
    fn drop(&mut self) {
        self.0.store(EMPTY, Ordering::Release);
    }
}

impl<T> Drop for Once<T> {
    fn drop(&mut self) {
        if *self.state.get_mut() == PUBLISHED {
            // SAFETY: initialized, and never read again.
            unsafe { self.value.get_mut().assume_init_drop() };
        }
    }
}

// Safety: shared after PUBLISHED; initialization is single-writer.
unsafe impl<T: Sync + Send> Sync for Once<T> {}
unsafe impl<T: Send> Send for Once<T> {}
