use crate::once::Once;

/// Lock API contract violations. Checked in debug builds only.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum LockMisuse {
    #[error("node is already queued on a lock")]
    NodeInUse,
    #[error("node released without a matching acquire")]
    NotHeld,
    #[error("lock acquired again by the context holding it")]
    Reentrant,
}

static CONTEXT_ID: Once<fn() -> usize> = Once::new();

/// Installs the function naming the running execution context (a core, or a
/// thread in tests). Ids must be nonzero and distinct between contexts that
/// run at the same time.
///
/// Once installed, debug builds report [`LockMisuse::Reentrant`] instead of
/// spinning forever when a context queues on a lock it already holds.
/// Returns `false` if a function was installed before.
#[must_use]
pub fn set_context_id(current: fn() -> usize) -> bool {
    CONTEXT_ID.publish(current).is_ok()
}

/// The running context's id, or 0 when none is known.
pub(crate) fn context_id() -> usize {
    CONTEXT_ID.get().map_or(0, |current| current())
}

#[cold]
#[track_caller]
pub(crate) fn report(misuse: LockMisuse) {
    if cfg!(debug_assertions) {
        panic!("lock misuse: {misuse}");
    }
}
