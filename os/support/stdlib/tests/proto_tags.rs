use std::collections::HashSet;
use stdlib::proto::{
    self, BaseTag, FIRST_PROTO_ID, Message, Protocol, Service, Style, check_proto_id,
    expect_opened_channel, expect_reply, expect_status, proto_id, respond, service_locator, vfs,
};
use stdlib::status::Error;

fn assert_tag_space<P: Protocol>() {
    let mut seen = HashSet::new();
    for base in BaseTag::ALL {
        assert!(seen.insert(base.tag()));
    }
    for &tag in P::TAGS {
        let value = P::tag_value(tag);
        assert!(value >= FIRST_PROTO_ID, "{}: {tag:?} = {value}", P::NAME);
        assert!(seen.insert(value), "{}: {tag:?} reuses {value}", P::NAME);
        assert_eq!(P::tag_from_value(value), Some(tag));
    }
}

#[test]
fn base_reservation_is_fixed() {
    assert_eq!(BaseTag::Status.tag(), 0);
    assert_eq!(BaseTag::GetProtoId.tag(), 1);
    assert_eq!(BaseTag::ProtoId.tag(), 2);
    assert_eq!(BaseTag::OpenChannel.tag(), 3);
    assert_eq!(BaseTag::OpenedChannel.tag(), 4);
    assert_eq!(FIRST_PROTO_ID, 5);
    for base in BaseTag::ALL {
        assert_eq!(BaseTag::from_tag(base.tag()), Some(*base));
    }
    assert_eq!(BaseTag::from_tag(FIRST_PROTO_ID), None);
}

#[test]
fn protocol_tags_are_unique_and_above_the_base() {
    assert_tag_space::<service_locator::Protocol>();
    assert_tag_space::<vfs::Protocol>();
}

#[test]
fn tags_count_up_in_declaration_order() {
    assert_eq!(service_locator::Tag::Register.value(), FIRST_PROTO_ID);
    assert_eq!(service_locator::Tag::Find.value(), FIRST_PROTO_ID + 1);
    assert_eq!(service_locator::Tag::Result.value(), FIRST_PROTO_ID + 2);
    assert_eq!(vfs::Tag::Tag.value(), FIRST_PROTO_ID + 3);
    assert_eq!(vfs::Tag::from_value(FIRST_PROTO_ID + 4), None);
}

#[test]
fn protocol_ids_are_fnv1a_hashes() {
    assert_eq!(proto_id(""), 0xcbf2_9ce4_8422_2325);
    assert_eq!(proto_id("a"), 0xaf63_dc4c_8601_ec8c);
    assert_eq!(proto_id("foobar"), 0x8594_4171_f739_67e8);
    assert_eq!(service_locator::ID, proto_id(service_locator::NAME));
    assert_ne!(service_locator::ID, vfs::ID);
    assert_eq!(<vfs::Protocol as Protocol>::STYLE, Style::Mailbox);
}

#[test]
fn get_proto_id_is_answered_for_every_service() {
    let mut registry = service_locator::Registry::<4>::new();
    let reply = respond(&mut registry, Message::get_proto_id());
    assert_eq!(reply.tag, BaseTag::ProtoId.tag());
    assert_eq!(reply.data, service_locator::ID);
    assert_eq!(check_proto_id::<service_locator::Protocol>(reply), Ok(()));
    assert_eq!(
        check_proto_id::<vfs::Protocol>(reply),
        Err(Error::Unexpected)
    );
}

#[test]
fn unknown_tag_is_reported_via_status() {
    let mut registry = service_locator::Registry::<4>::new();
    let reply = respond(&mut registry, Message::new(FIRST_PROTO_ID + 100, 0));
    assert_eq!(reply.tag, BaseTag::Status.tag());
    assert_eq!(expect_status(reply), Err(Error::UnsupportedOperation));
    assert_eq!(
        proto::classify::<vfs::Protocol>(FIRST_PROTO_ID + 100),
        Err(Error::UnsupportedOperation)
    );
}

#[test]
fn service_locator_registers_and_finds() {
    use service_locator::{Registry, Tag};

    let mut registry = Registry::<2>::new();
    let register = Message::new(Tag::Register.value(), vfs::ID).with_handle(0x42);
    assert_eq!(expect_status(respond(&mut registry, register)), Ok(0));

    let reply = respond(&mut registry, Message::new(Tag::Find.value(), vfs::ID));
    let found = expect_reply::<service_locator::Protocol>(reply, Tag::Result).unwrap();
    assert_eq!(found.data, vfs::ID);
    assert_eq!(found.handle, 0x42);

    let missing = respond(&mut registry, Message::new(Tag::Find.value(), 7));
    assert_eq!(
        expect_reply::<service_locator::Protocol>(missing, Tag::Result),
        Err(Error::NotReady)
    );
}

#[test]
fn service_locator_capacity_and_arguments() {
    let mut registry = service_locator::Registry::<1>::new();
    assert_eq!(registry.register(1, 0), Err(Error::InvalidArgument));
    assert_eq!(registry.register(1, 10), Ok(()));
    assert_eq!(registry.register(1, 11), Ok(()));
    assert_eq!(registry.find(1), Some(11));
    assert_eq!(registry.register(2, 12), Err(Error::Insufficient));
    assert_eq!(registry.len(), 1);
}

mod stream {
    stdlib::protocol! {
        name = "os.protocol.test.stream",
        style = Channel,
        tags {
            Write,
        }
    }
}

/// Hands out increasing channel handles.
struct Streams {
    next: u64,
}

impl Service for Streams {
    type Protocol = stream::Protocol;

    fn handle(&mut self, _tag: stream::Tag, request: Message) -> Result<Message, Error> {
        Ok(Message::status(Ok(request.data)))
    }

    fn open_channel(&mut self, _request: Message) -> Result<u64, Error> {
        self.next += 1;
        Ok(self.next)
    }
}

#[test]
fn open_channel_is_answered_with_a_handle() {
    let mut streams = Streams { next: 0x10 };
    let reply = respond(&mut streams, Message::open_channel());
    assert_eq!(reply.tag, BaseTag::OpenedChannel.tag());
    assert_eq!(expect_opened_channel(reply), Ok(0x11));
    assert_eq!(
        expect_opened_channel(respond(&mut streams, Message::open_channel())),
        Ok(0x12)
    );

    let write = Message::new(stream::Tag::Write.value(), 3);
    assert_eq!(expect_status(respond(&mut streams, write)), Ok(3));
}

#[test]
fn mailbox_services_refuse_open_channel() {
    let mut registry = service_locator::Registry::<4>::new();
    let reply = respond(&mut registry, Message::open_channel());
    assert_eq!(
        expect_opened_channel(reply),
        Err(Error::UnsupportedOperation)
    );
}

#[test]
fn replies_sent_as_requests_are_unexpected() {
    let mut registry = service_locator::Registry::<4>::new();
    for reply_tag in [BaseTag::Status, BaseTag::ProtoId, BaseTag::OpenedChannel] {
        let reply = respond(&mut registry, Message::new(reply_tag.tag(), 0));
        assert_eq!(expect_status(reply), Err(Error::Unexpected), "{reply_tag:?}");
    }
}
