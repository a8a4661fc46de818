//! Message kinds and the fixed-layout request/reply records of component A,
//! built on the [`WireEncode`]/[`WireDecode`] traits in [`crate::codec`].
//!
//! Field widths not pinned down by the distilled specification (room/player
//! name width, password width, listing page size) are fixed here as named
//! constants; the choices are recorded in `DESIGN.md`.

use crate::codec::{FixedStr, WireDecode, WireEncode, WireEndpoint};
use crate::error::CodecError;

/// Wire width of a room name and of a player name (they share a type).
pub const NAME_WIDTH: usize = 16;
/// Wire width of a room password.
pub const PASSWORD_WIDTH: usize = 16;
/// Maximum rooms returned in a single `list_room` reply, per §4.E.
pub const LISTING_CAPACITY: usize = 6;

pub type RoomName = FixedStr<NAME_WIDTH>;
pub type Password = FixedStr<PASSWORD_WIDTH>;

/// The one-byte `message_type` header, per §6. Discriminants follow the
/// 0-based ordering the spec gives explicitly.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum MessageKind {
    AuthenticationRequest = 0,
    AuthenticationReply = 1,
    CreateRoomRequest = 2,
    CreateRoomReply = 3,
    ListRoomRequest = 4,
    ListRoomReply = 5,
    JoinRoomRequest = 6,
    JoinRoomReply = 7,
    UpdateRoomStatusRequest = 8,
    UpdateRoomStatusReply = 9,
    RandomMatchRequest = 10,
}

impl TryFrom<u8> for MessageKind {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        use MessageKind::*;
        Ok(match value {
            0 => AuthenticationRequest,
            1 => AuthenticationReply,
            2 => CreateRoomRequest,
            3 => CreateRoomReply,
            4 => ListRoomRequest,
            5 => ListRoomReply,
            6 => JoinRoomRequest,
            7 => JoinRoomReply,
            8 => UpdateRoomStatusRequest,
            9 => UpdateRoomStatusReply,
            10 => RandomMatchRequest,
            other => return Err(other),
        })
    }
}

/// The 2-byte `reply_message_header`: kind followed by a one-byte error code.
pub struct ReplyHeader {
    pub kind: MessageKind,
    pub error_code: u8,
}

impl ReplyHeader {
    pub fn encode(&self, buf: &mut Vec<u8>) {
        buf.push(self.kind as u8);
        buf.push(self.error_code);
    }
}

/// A fixed-size bitmask over room settings (§3).
pub mod room_flags {
    pub const PUBLIC: u8 = 0b01;
    pub const OPEN: u8 = 0b10;
}

macro_rules! wire_struct {
    ($name:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        #[derive(Clone, Debug, PartialEq)]
        pub struct $name {
            $(pub $field: $ty),*
        }

        impl WireEncode for $name {
            const SIZE: usize = 0 $(+ <$ty as WireEncode>::SIZE)*;

            fn encode(&self, buf: &mut Vec<u8>) {
                $(self.$field.encode(buf);)*
            }
        }

        impl WireDecode for $name {
            fn decode(buf: &[u8]) -> Result<Self, CodecError> {
                let mut offset = 0usize;
                $(
                    let end = offset + <$ty as WireEncode>::SIZE;
                    let $field = <$ty as WireDecode>::decode(&buf[offset..end])?;
                    offset = end;
                )*
                Ok(Self { $($field),* })
            }
        }
    };
}

wire_struct!(AuthenticationRequestBody {
    version: u16,
    player_name: RoomName,
    player_tag: u16,
});

wire_struct!(AuthenticationReplyBody {
    version: u16,
});

wire_struct!(CreateRoomRequestBody {
    group_index: u8,
    name: RoomName,
    password: Password,
    max_player_count: u8,
    port: u16,
});

wire_struct!(CreateRoomReplyBody {
    room_id: u32,
});

wire_struct!(ListRoomRequestBody {
    group_index: u8,
    start_index: u8,
    end_index: u8,
    sort_kind: u8,
    filter_mask: u8,
});

wire_struct!(RoomInfo {
    room_id: u32,
    name: RoomName,
    flags: u8,
    max_player_count: u8,
    current_player_count: u8,
    create_datetime: i64,
});

/// `list_room_reply`'s body always carries `LISTING_CAPACITY` slots; unused
/// trailing slots are zeroed rather than omitted, since the layout is fixed
/// size. `reply_room_count` tells the client how many are meaningful.
#[derive(Clone, Debug, PartialEq)]
pub struct ListRoomReplyBody {
    pub total_room_count: u8,
    pub reply_room_count: u8,
    pub rooms: [RoomInfo; LISTING_CAPACITY],
}

impl WireEncode for ListRoomReplyBody {
    const SIZE: usize = 1 + 1 + RoomInfo::SIZE * LISTING_CAPACITY;

    fn encode(&self, buf: &mut Vec<u8>) {
        self.total_room_count.encode(buf);
        self.reply_room_count.encode(buf);
        for room in &self.rooms {
            room.encode(buf);
        }
    }
}

impl WireDecode for ListRoomReplyBody {
    fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        let total_room_count = u8::decode(&buf[0..1])?;
        let reply_room_count = u8::decode(&buf[1..2])?;
        let mut offset = 2;
        let mut rooms = Vec::with_capacity(LISTING_CAPACITY);
        for _ in 0..LISTING_CAPACITY {
            let end = offset + RoomInfo::SIZE;
            rooms.push(RoomInfo::decode(&buf[offset..end])?);
            offset = end;
        }
        Ok(Self {
            total_room_count,
            reply_room_count,
            rooms: rooms
                .try_into()
                .unwrap_or_else(|_| unreachable!("exactly LISTING_CAPACITY rooms decoded")),
        })
    }
}

wire_struct!(JoinRoomRequestBody {
    room_id: u32,
    password: Password,
});

wire_struct!(JoinRoomReplyBody {
    host_address: WireEndpoint,
});

/// `update_room_status_request`'s `status` field, per §4.E.
pub mod room_status {
    pub const OPEN: u8 = 0;
    pub const CLOSE: u8 = 1;
    pub const REMOVE: u8 = 2;
}

wire_struct!(UpdateRoomStatusRequestBody {
    room_id: u32,
    status: u8,
});

/// `update_room_status_reply` carries no body beyond the reply header
/// itself (the error code already lives there), per the reference protocol.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct UpdateRoomStatusReplyBody;

impl WireEncode for UpdateRoomStatusReplyBody {
    const SIZE: usize = 0;

    fn encode(&self, _buf: &mut Vec<u8>) {}
}

impl WireDecode for UpdateRoomStatusReplyBody {
    fn decode(_buf: &[u8]) -> Result<Self, CodecError> {
        Ok(Self)
    }
}

wire_struct!(RandomMatchRequestBody {
    group_index: u8,
    reserved: u8,
});

/// Per-reply-type `error_code` enumerants. Each reply kind only declares the
/// continuable failures its handler can actually produce, mirroring the
/// reference protocol's narrow, per-message error enums rather than a single
/// catch-all.
pub trait WireErrorCode: Copy {
    const OK: Self;
    fn to_u8(self) -> u8;
}

macro_rules! wire_error_enum {
    ($name:ident { $($variant:ident = $val:expr),* $(,)? }) => {
        #[derive(Copy, Clone, Eq, PartialEq, Debug)]
        #[repr(u8)]
        pub enum $name {
            $($variant = $val),*
        }

        impl WireErrorCode for $name {
            const OK: Self = Self::Ok;

            fn to_u8(self) -> u8 {
                self as u8
            }
        }
    };
}

wire_error_enum!(AuthenticationError {
    Ok = 0,
    UnknownError = 1,
    VersionMismatch = 2,
    AuthenticationError = 3,
    Denied = 4,
});

wire_error_enum!(CreateRoomError {
    Ok = 0,
    UnknownError = 1,
    RoomNameDuplicated = 2,
    RoomCountReachesLimit = 3,
    RoomGroupNotFound = 4,
    ClientAlreadyHostingRoom = 5,
});

wire_error_enum!(ListRoomError {
    Ok = 0,
    UnknownError = 1,
    RoomGroupNotFound = 2,
});

wire_error_enum!(JoinRoomError {
    Ok = 0,
    UnknownError = 1,
    RoomNotExist = 2,
    PermissionDenied = 3,
    JoinRejected = 4,
    PlayerCountReachesLimit = 5,
});

wire_error_enum!(UpdateRoomStatusError {
    Ok = 0,
    UnknownError = 1,
    RoomNotExist = 2,
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_kind_round_trips_through_discriminant() {
        for raw in 0u8..=10 {
            let kind = MessageKind::try_from(raw).unwrap();
            assert_eq!(kind as u8, raw);
        }
        assert_eq!(MessageKind::try_from(11), Err(11));
    }

    #[test]
    fn create_room_request_body_round_trips() {
        let body = CreateRoomRequestBody {
            group_index: 2,
            name: RoomName::new("room-A"),
            password: Password::new(""),
            max_player_count: 4,
            port: 50000,
        };
        let mut buf = Vec::new();
        body.encode(&mut buf);
        assert_eq!(buf.len(), CreateRoomRequestBody::SIZE);
        assert_eq!(CreateRoomRequestBody::decode(&buf).unwrap(), body);
    }

    #[test]
    fn list_room_reply_body_round_trips_with_padding_slots() {
        let room = RoomInfo {
            room_id: 7,
            name: RoomName::new("b"),
            flags: room_flags::OPEN,
            max_player_count: 4,
            current_player_count: 1,
            create_datetime: 1,
        };
        let body = ListRoomReplyBody {
            total_room_count: 1,
            reply_room_count: 1,
            rooms: std::array::from_fn(|i| {
                if i == 0 {
                    room.clone()
                } else {
                    RoomInfo {
                        room_id: 0,
                        name: RoomName::default(),
                        flags: 0,
                        max_player_count: 0,
                        current_player_count: 0,
                        create_datetime: 0,
                    }
                }
            }),
        };
        let mut buf = Vec::new();
        body.encode(&mut buf);
        assert_eq!(buf.len(), ListRoomReplyBody::SIZE);
        assert_eq!(ListRoomReplyBody::decode(&buf).unwrap(), body);
    }
}
