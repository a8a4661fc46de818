use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{info, warn};

use crate::directory::SortKey;
use crate::error::FatalSessionError;
use crate::protocol::{
    ListRoomError, ListRoomReplyBody, ListRoomRequestBody, MessageKind, ReplyHeader, RoomInfo,
    WireErrorCode, LISTING_CAPACITY,
};
use crate::server::ServerData;
use crate::session::SessionState;
use crate::wire_io::Io;

/// §4.E `list_room`. `end_index` beyond the snapshot length truncates
/// silently rather than erroring (resolved open question); the reply's
/// `total_room_count` lets the client detect the truncation.
pub async fn handle<S>(
    io: &mut Io<'_, S>,
    server: &ServerData,
    _session: &mut SessionState,
) -> Result<(), FatalSessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request: ListRoomRequestBody = io.read_body().await?;

    let Some(directory) = server.directory(request.group_index) else {
        warn!(group_index = request.group_index, "list_room: unknown group");
        return io
            .write_reply(
                ReplyHeader {
                    kind: MessageKind::ListRoomReply,
                    error_code: ListRoomError::RoomGroupNotFound.to_u8(),
                },
                &empty_reply(),
            )
            .await;
    };

    let sort_key = SortKey::from_wire(request.sort_kind).unwrap_or(SortKey::NameAscending);
    let snapshot = directory.snapshot_sorted(sort_key, request.filter_mask);
    let total = snapshot.len();

    let start = (request.start_index as usize).min(total);
    let end = (request.end_index as usize).min(total).max(start);
    let end = end.min(start + LISTING_CAPACITY);
    let page = &snapshot[start..end];

    let mut rooms: [RoomInfo; LISTING_CAPACITY] = std::array::from_fn(|_| RoomInfo {
        room_id: 0,
        name: Default::default(),
        flags: 0,
        max_player_count: 0,
        current_player_count: 0,
        create_datetime: 0,
    });
    for (slot, record) in rooms.iter_mut().zip(page) {
        *slot = record.to_room_info();
    }

    info!(group_index = request.group_index, returned = page.len(), total, "room listing served");

    io.write_reply(
        ReplyHeader {
            kind: MessageKind::ListRoomReply,
            error_code: ListRoomError::Ok.to_u8(),
        },
        &ListRoomReplyBody {
            total_room_count: total.min(u8::MAX as usize) as u8,
            reply_room_count: page.len() as u8,
            rooms,
        },
    )
    .await
}

fn empty_reply() -> ListRoomReplyBody {
    ListRoomReplyBody {
        total_room_count: 0,
        reply_room_count: 0,
        rooms: std::array::from_fn(|_| RoomInfo {
            room_id: 0,
            name: Default::default(),
            flags: 0,
            max_player_count: 0,
            current_player_count: 0,
            create_datetime: 0,
        }),
    }
}
