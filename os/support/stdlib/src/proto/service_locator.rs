//! Service locator: maps protocol ids to the handle of a server speaking it.
//!
//! * `register`: `data` = protocol id, `handle` = server. Replies `status`.
//! * `find`: `data` = protocol id. Replies `result` with the handle, or a
//!   `status` of [`Error::NotReady`] if nobody registered yet.

use super::{Message, Service};
use crate::status::Error;

crate::protocol! {
    name = "os.protocol.service_locator",
    style = Mailbox,
    tags {
        /// Announce a server.
        Register,
        /// Look a server up.
        Find,
        /// Reply to `find`.
        Result,
    }
}

/// A fixed-capacity service locator server.
#[derive(Debug)]
pub struct Registry<const N: usize> {
    entries: [(u64, u64); N],
    len: usize,
}

impl<const N: usize> Registry<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: [(0, 0); N],
            len: 0,
        }
    }

    /// Registers or replaces the server for `proto_id`.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] for a null handle, [`Error::Insufficient`]
    /// when the table is full.
    pub fn register(&mut self, proto_id: u64, handle: u64) -> Result<(), Error> {
        if handle == 0 {
            return Err(Error::InvalidArgument);
        }
        if let Some(entry) = self.entries[..self.len].iter_mut().find(|e| e.0 == proto_id) {
            entry.1 = handle;
            return Ok(());
        }
        let slot = self.entries.get_mut(self.len).ok_or(Error::Insufficient)?;
        *slot = (proto_id, handle);
        self.len += 1;
        Ok(())
    }

    #[must_use]
    pub fn find(&self, proto_id: u64) -> Option<u64> {
        self.entries[..self.len]
            .iter()
            .find(|e| e.0 == proto_id)
            .map(|e| e.1)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<const N: usize> Default for Registry<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Service for Registry<N> {
    type Protocol = Protocol;

    fn handle(&mut self, tag: Tag, request: Message) -> Result<Message, Error> {
        match tag {
            Tag::Register => {
                self.register(request.data, request.handle)?;
                Ok(Message::status(Ok(0)))
            }
            Tag::Find => {
                let handle = self.find(request.data).ok_or(Error::NotReady)?;
                Ok(Message::new(Tag::Result.value(), request.data).with_handle(handle))
            }
            Tag::Result => Err(Error::Unexpected),
        }
    }
}
