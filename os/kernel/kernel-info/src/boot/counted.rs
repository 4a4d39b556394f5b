use super::CorruptDescriptor;
use core::fmt;
use core::marker::PhantomData;

/// A `(pointer, count)` pair describing `count` consecutive `T` at a
/// physical address.
///
/// The empty buffer is `(0, 0)`; a null pointer with a non-zero count or a
/// non-null pointer with a zero count is malformed.
#[repr(C)]
pub struct CountedBuffer<T> {
    /// Physical address of the first element, or 0.
    pub ptr: u64,
    /// Number of elements (not bytes).
    pub count: u64,
    _element: PhantomData<*const T>,
}

impl<T> CountedBuffer<T> {
    #[must_use]
    pub const fn empty() -> Self {
        Self::from_raw(0, 0)
    }

    #[must_use]
    pub const fn from_raw(ptr: u64, count: u64) -> Self {
        Self {
            ptr,
            count,
            _element: PhantomData,
        }
    }

    /// Records the address and length of `slice`. An empty slice yields
    /// [`CountedBuffer::empty`], whatever its dangling pointer.
    #[must_use]
    pub fn from_slice(slice: &[T]) -> Self {
        if slice.is_empty() {
            Self::empty()
        } else {
            Self::from_raw(slice.as_ptr() as u64, slice.len() as u64)
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Size of the described memory in bytes, if it fits in a `u64`.
    #[must_use]
    pub const fn byte_len(&self) -> Option<u64> {
        self.count.checked_mul(size_of::<T>() as u64)
    }

    /// Validates pointer/count consistency, alignment and address-space
    /// bounds. `field` names the buffer in the error.
    ///
    /// # Errors
    /// See [`CorruptDescriptor`].
    pub fn check(&self, field: &'static str) -> Result<(), CorruptDescriptor> {
        match (self.ptr, self.count) {
            (0, 0) => Ok(()),
            (0, _) => Err(CorruptDescriptor::NullBuffer(field)),
            (_, 0) => Err(CorruptDescriptor::DanglingPointer(field)),
            (ptr, count) => {
                if !ptr.is_multiple_of(align_of::<T>() as u64) {
                    return Err(CorruptDescriptor::MisalignedBuffer(field));
                }
                let in_bounds = self
                    .byte_len()
                    .and_then(|len| ptr.checked_add(len))
                    .is_some_and(|end| usize::try_from(end).is_ok());
                if !in_bounds || usize::try_from(count).is_err() {
                    return Err(CorruptDescriptor::BufferOverflow(field));
                }
                Ok(())
            }
        }
    }

    /// Reinterprets the buffer as a slice.
    ///
    /// # Safety
    /// [`check`](Self::check) must have succeeded, and the memory must hold
    /// `count` initialized `T` that stay valid and unmodified for `'a`.
    #[allow(unsafe_code, clippy::cast_possible_truncation)]
    #[must_use]
    pub unsafe fn as_slice<'a>(&self) -> &'a [T] {
        if self.count == 0 {
            return &[];
        }
        // SAFETY: non-null, aligned and in bounds per `check`; validity per caller.
        unsafe { core::slice::from_raw_parts(self.ptr as usize as *const T, self.count as usize) }
    }
}

impl<T> Clone for CountedBuffer<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for CountedBuffer<T> {}

impl<T> Default for CountedBuffer<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> PartialEq for CountedBuffer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr && self.count == other.count
    }
}

impl<T> Eq for CountedBuffer<T> {}

impl<T> fmt::Debug for CountedBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}[{}]", self.ptr, self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_slice_is_null() {
        let buffer = CountedBuffer::<u64>::from_slice(&[]);
        assert_eq!(buffer, CountedBuffer::empty());
        assert_eq!(buffer.check("test"), Ok(()));
    }

    #[test]
    fn misaligned_buffer_is_rejected() {
        let buffer = CountedBuffer::<u64>::from_raw(0x1003, 2);
        assert_eq!(
            buffer.check("test"),
            Err(CorruptDescriptor::MisalignedBuffer("test"))
        );
    }

    #[test]
    fn wrapping_buffer_is_rejected() {
        let buffer = CountedBuffer::<u64>::from_raw(u64::MAX - 7, 2);
        assert_eq!(
            buffer.check("test"),
            Err(CorruptDescriptor::BufferOverflow("test"))
        );
    }
}
