//! IPC protocol tags.
//!
//! Every protocol shares the [`BaseTag`] reservation (`0..FIRST_PROTO_ID`).
//! Protocol-specific tags are declared with [`protocol!`](crate::protocol)
//! and count up from [`FIRST_PROTO_ID`]. A tag only has a meaning once the
//! peer's protocol is known, which is what `get_proto_id` is for.

pub mod service_locator;
pub mod vfs;

use crate::status::{Error, Status};
use core::fmt;

/// A message tag. Unique only within one protocol.
pub type Tag = u64;

/// Tags every protocol understands.
#[repr(u64)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BaseTag {
    /// `data` is a [`Status`] word.
    Status = 0,
    /// Asks the peer which protocol it speaks.
    GetProtoId = 1,
    /// Reply to [`BaseTag::GetProtoId`]; `data` is the protocol id.
    ProtoId = 2,
    /// Asks the peer for a channel speaking its protocol.
    OpenChannel = 3,
    /// Reply to [`BaseTag::OpenChannel`]; `handle` is the new channel.
    OpenedChannel = 4,
}

impl BaseTag {
    pub const ALL: &'static [Self] = &[
        Self::Status,
        Self::GetProtoId,
        Self::ProtoId,
        Self::OpenChannel,
        Self::OpenedChannel,
    ];

    #[must_use]
    pub const fn tag(self) -> Tag {
        self as Tag
    }

    #[must_use]
    pub const fn from_tag(tag: Tag) -> Option<Self> {
        match tag {
            0 => Some(Self::Status),
            1 => Some(Self::GetProtoId),
            2 => Some(Self::ProtoId),
            3 => Some(Self::OpenChannel),
            4 => Some(Self::OpenedChannel),
            _ => None,
        }
    }
}

/// First tag available to individual protocols.
pub const FIRST_PROTO_ID: Tag = 5;

/// Protocol identity: the 64-bit FNV-1a hash of the protocol's name.
#[must_use]
pub const fn proto_id(name: &str) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let bytes = name.as_bytes();
    let mut hash = OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(PRIME);
        i += 1;
    }
    hash
}

/// How a protocol's messages are exchanged.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Style {
    /// Request/response over a mailbox.
    Mailbox,
    /// Byte stream over a channel.
    Channel,
}

/// Implemented by the marker type [`protocol!`](crate::protocol) generates.
pub trait Protocol {
    const NAME: &'static str;
    const ID: u64;
    const STYLE: Style;

    type Tag: Copy + Eq + fmt::Debug + 'static;

    /// Protocol-specific tags in declaration order.
    const TAGS: &'static [Self::Tag];

    fn tag_value(tag: Self::Tag) -> Tag;
    fn tag_from_value(value: Tag) -> Option<Self::Tag>;
}

/// A raw tag resolved against a protocol.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Decoded<T> {
    Base(BaseTag),
    Specific(T),
}

/// Resolves `tag` within protocol `P`.
///
/// # Errors
/// [`Error::UnsupportedOperation`] for a tag `P` does not define.
pub fn classify<P: Protocol>(tag: Tag) -> Result<Decoded<P::Tag>, Error> {
    if let Some(base) = BaseTag::from_tag(tag) {
        return Ok(Decoded::Base(base));
    }
    P::tag_from_value(tag)
        .map(Decoded::Specific)
        .ok_or(Error::UnsupportedOperation)
}

/// A tagged message with one data word and an optional handle (0 = none).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Message {
    pub tag: Tag,
    pub data: u64,
    pub handle: u64,
}

impl Message {
    #[must_use]
    pub const fn new(tag: Tag, data: u64) -> Self {
        Self {
            tag,
            data,
            handle: 0,
        }
    }

    #[must_use]
    pub const fn with_handle(mut self, handle: u64) -> Self {
        self.handle = handle;
        self
    }

    /// A `status` message.
    #[must_use]
    pub fn status(result: Result<u64, Error>) -> Self {
        Self::new(BaseTag::Status.tag(), Status::from_result(result).into_raw())
    }

    /// A `get_proto_id` request.
    #[must_use]
    pub const fn get_proto_id() -> Self {
        Self::new(BaseTag::GetProtoId.tag(), 0)
    }

    /// An `open_channel` request.
    #[must_use]
    pub const fn open_channel() -> Self {
        Self::new(BaseTag::OpenChannel.tag(), 0)
    }

    /// An `opened_channel` reply carrying `channel`.
    #[must_use]
    pub const fn opened_channel(channel: u64) -> Self {
        Self::new(BaseTag::OpenedChannel.tag(), 0).with_handle(channel)
    }
}

/// Server side of a protocol.
pub trait Service {
    type Protocol: Protocol;

    /// Handles a protocol-specific request.
    ///
    /// # Errors
    /// Any error is sent back as a `status` message.
    fn handle(
        &mut self,
        tag: <Self::Protocol as Protocol>::Tag,
        request: Message,
    ) -> Result<Message, Error>;

    /// Opens a channel to this service and returns its handle. Services
    /// that only answer on their mailbox keep the default.
    ///
    /// # Errors
    /// Any error is sent back as a `status` message.
    fn open_channel(&mut self, request: Message) -> Result<u64, Error> {
        let _ = request;
        Err(Error::UnsupportedOperation)
    }
}

/// Answers one request: base tags are handled here, everything else goes to
/// `service`. Never fails; errors become `status` replies.
pub fn respond<S: Service + ?Sized>(service: &mut S, request: Message) -> Message {
    match classify::<S::Protocol>(request.tag) {
        Ok(Decoded::Base(BaseTag::GetProtoId)) => {
            Message::new(BaseTag::ProtoId.tag(), <S::Protocol as Protocol>::ID)
        }
        Ok(Decoded::Base(BaseTag::OpenChannel)) => service
            .open_channel(request)
            .map_or_else(|error| Message::status(Err(error)), Message::opened_channel),
        Ok(Decoded::Base(BaseTag::Status | BaseTag::ProtoId | BaseTag::OpenedChannel)) => {
            Message::status(Err(Error::Unexpected))
        }
        Ok(Decoded::Specific(tag)) => service
            .handle(tag, request)
            .unwrap_or_else(|error| Message::status(Err(error))),
        Err(error) => Message::status(Err(error)),
    }
}

/// Client side: accepts an `opened_channel` reply and returns the channel.
///
/// # Errors
/// The carried error, or [`Error::Unexpected`] for a success status or any
/// other tag.
pub fn expect_opened_channel(reply: Message) -> Result<u64, Error> {
    if reply.tag == BaseTag::OpenedChannel.tag() {
        Ok(reply.handle)
    } else {
        expect_status(reply).and(Err(Error::Unexpected))
    }
}

/// Client side: accepts a `status` reply.
///
/// # Errors
/// The carried error, or [`Error::Unexpected`] for any other tag.
pub fn expect_status(reply: Message) -> Result<u64, Error> {
    if reply.tag == BaseTag::Status.tag() {
        Status::from_raw(reply.data).into_result()
    } else {
        Err(Error::Unexpected)
    }
}

/// Client side: accepts a reply tagged `expected`, passing errors from a
/// `status` reply through.
///
/// # Errors
/// The carried error, or [`Error::Unexpected`] for a success status or any
/// other tag.
pub fn expect_reply<P: Protocol>(reply: Message, expected: P::Tag) -> Result<Message, Error> {
    if reply.tag == P::tag_value(expected) {
        Ok(reply)
    } else {
        expect_status(reply).and(Err(Error::Unexpected))
    }
}

/// Client side: checks a `proto_id` reply against `P`.
///
/// # Errors
/// [`Error::Unexpected`] if the peer speaks another protocol.
pub fn check_proto_id<P: Protocol>(reply: Message) -> Result<(), Error> {
    if reply.tag == BaseTag::ProtoId.tag() && reply.data == P::ID {
        Ok(())
    } else {
        expect_status(reply).and(Err(Error::Unexpected))
    }
}

/// Declares a protocol's identity and tag set in the current module.
///
/// Generates `NAME`, `ID`, `STYLE`, a `Tag` enum numbered from
/// [`FIRST_PROTO_ID`], and a `Protocol` marker implementing
/// [`Protocol`](crate::proto::Protocol).
///
/// ```
/// mod echo {
///     stdlib::protocol! {
///         name = "os.protocol.echo",
///         style = Mailbox,
///         tags {
///             /// Send something back.
///             Echo,
///         }
///     }
/// }
///
/// assert_eq!(echo::Tag::Echo.value(), stdlib::proto::FIRST_PROTO_ID);
/// ```
#[macro_export]
macro_rules! protocol {
    (
        name = $name:literal,
        style = $style:ident,
        tags {
            $( $(#[$tag_meta:meta])* $tag:ident ),* $(,)?
        }
    ) => {
        pub const NAME: &str = $name;
        pub const ID: u64 = $crate::proto::proto_id($name);
        pub const STYLE: $crate::proto::Style = $crate::proto::Style::$style;

        #[repr(u64)]
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
        pub enum Tag {
            $( $(#[$tag_meta])* $tag, )*
        }

        impl Tag {
            pub const ALL: &'static [Self] = &[$(Self::$tag),*];

            #[must_use]
            pub const fn value(self) -> $crate::proto::Tag {
                $crate::proto::FIRST_PROTO_ID + self as u64
            }

            #[must_use]
            pub fn from_value(value: $crate::proto::Tag) -> Option<Self> {
                value
                    .checked_sub($crate::proto::FIRST_PROTO_ID)
                    .and_then(|index| usize::try_from(index).ok())
                    .and_then(|index| Self::ALL.get(index))
                    .copied()
            }
        }

        /// Marker type for this protocol.
        #[derive(Debug, Copy, Clone)]
        pub struct Protocol;

        impl $crate::proto::Protocol for Protocol {
            const NAME: &'static str = NAME;
            const ID: u64 = ID;
            const STYLE: $crate::proto::Style = STYLE;

            type Tag = Tag;

            const TAGS: &'static [Tag] = Tag::ALL;

            fn tag_value(tag: Tag) -> $crate::proto::Tag {
                tag.value()
            }

            fn tag_from_value(value: $crate::proto::Tag) -> Option<Tag> {
                Tag::from_value(value)
            }
        }
    };
}
