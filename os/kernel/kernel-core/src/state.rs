//! Mutable kernel state shared between cores.

/// Bytes kept by the kernel log.
pub const LOG_CAPACITY: usize = 4096;

/// Byte ring for user log messages. When full, the oldest bytes go first.
#[derive(Debug)]
pub struct LogRing<const N: usize> {
    buf: [u8; N],
    /// Index of the oldest byte.
    head: usize,
    len: usize,
    dropped: u64,
}

impl<const N: usize> LogRing<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buf: [0; N],
            head: 0,
            len: 0,
            dropped: 0,
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes overwritten before anyone read them.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn push(&mut self, bytes: &[u8]) {
        if N == 0 {
            self.dropped += bytes.len() as u64;
            return;
        }
        // Only the last N bytes can survive.
        let skip = bytes.len().saturating_sub(N);
        self.dropped += skip as u64;
        for &byte in &bytes[skip..] {
            if self.len == N {
                self.head = (self.head + 1) % N;
                self.len -= 1;
                self.dropped += 1;
            }
            self.buf[(self.head + self.len) % N] = byte;
            self.len += 1;
        }
    }

    /// Moves the oldest bytes into `out`; returns how many.
    pub fn drain_into(&mut self, out: &mut [u8]) -> usize {
        let count = out.len().min(self.len);
        for slot in &mut out[..count] {
            *slot = self.buf[self.head];
            self.head = (self.head + 1) % N;
        }
        self.len -= count;
        count
    }
}

impl<const N: usize> Default for LogRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// State behind the kernel's MCS lock.
#[derive(Debug, Default)]
pub struct KernelState {
    pub log: LogRing<LOG_CAPACITY>,
    /// Syscalls served since boot.
    pub syscalls: u64,
}

impl KernelState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            log: LogRing::new(),
            syscalls: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_order() {
        let mut ring = LogRing::<8>::new();
        ring.push(b"abc");
        ring.push(b"de");
        let mut out = [0u8; 4];
        assert_eq!(ring.drain_into(&mut out), 4);
        assert_eq!(&out, b"abcd");
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.drain_into(&mut out), 1);
        assert_eq!(out[0], b'e');
        assert!(ring.is_empty());
    }

    #[test]
    fn overflow_keeps_the_newest_bytes() {
        let mut ring = LogRing::<4>::new();
        ring.push(b"abc");
        ring.push(b"def");
        assert_eq!(ring.dropped(), 2);
        let mut out = [0u8; 8];
        let n = ring.drain_into(&mut out);
        assert_eq!(&out[..n], b"cdef");
    }

    #[test]
    fn message_longer_than_the_ring() {
        let mut ring = LogRing::<4>::new();
        ring.push(b"0123456789");
        assert_eq!(ring.dropped(), 6);
        let mut out = [0u8; 4];
        ring.drain_into(&mut out);
        assert_eq!(&out, b"6789");
    }
}
