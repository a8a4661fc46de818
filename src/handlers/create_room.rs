use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{info, warn};

use crate::directory::{endpoint_with_port, NewRoom};
use crate::error::FatalSessionError;
use crate::protocol::{
    CreateRoomError, CreateRoomReplyBody, CreateRoomRequestBody, MessageKind, ReplyHeader,
    WireErrorCode,
};
use crate::server::ServerData;
use crate::session::{HostedRoom, SessionState};
use crate::wire_io::Io;

/// §4.E `create_room`. Precondition: authenticated (enforced by the
/// dispatcher) and not already hosting.
pub async fn handle<S>(
    io: &mut Io<'_, S>,
    server: &ServerData,
    session: &mut SessionState,
    peer_addr: SocketAddr,
) -> Result<(), FatalSessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request: CreateRoomRequestBody = io.read_body().await?;

    if session.is_hosting() {
        warn!("create_room rejected: session already hosting a room");
        return io
            .write_reply(
                ReplyHeader {
                    kind: MessageKind::CreateRoomReply,
                    error_code: CreateRoomError::ClientAlreadyHostingRoom.to_u8(),
                },
                &CreateRoomReplyBody { room_id: 0 },
            )
            .await;
    }

    let Some(directory) = server.directory(request.group_index) else {
        warn!(group_index = request.group_index, "create_room: unknown group");
        return io
            .write_reply(
                ReplyHeader {
                    kind: MessageKind::CreateRoomReply,
                    error_code: CreateRoomError::RoomGroupNotFound.to_u8(),
                },
                &CreateRoomReplyBody { room_id: 0 },
            )
            .await;
    };

    let identity = session
        .identity()
        .expect("dispatcher guarantees authentication before create_room");

    let new_room = NewRoom {
        host_name: identity.name.clone(),
        host_tag: identity.tag,
        password: request.password,
        max_player_count: request.max_player_count,
        create_datetime: server.clock.now(),
        host_endpoint: peer_addr.into(),
        game_host_endpoint: endpoint_with_port(peer_addr, request.port),
    };

    let result = directory.assign_id_and_insert(new_room);
    let (error, room_id) = match result {
        Ok(room_id) => (CreateRoomError::Ok, room_id),
        Err(crate::error::DirectoryError::NameDuplicated) => {
            (CreateRoomError::RoomNameDuplicated, 0)
        }
        Err(crate::error::DirectoryError::CapacityExceeded) => {
            (CreateRoomError::RoomCountReachesLimit, 0)
        }
        Err(other) => unreachable!("assign_id_and_insert does not produce {other:?}"),
    };

    if error == CreateRoomError::Ok {
        session.set_hosting(HostedRoom {
            group_index: request.group_index,
            room_id,
        });
        info!(group_index = request.group_index, room_id, "room created");
    } else {
        warn!(?error, "create_room failed");
    }

    io.write_reply(
        ReplyHeader {
            kind: MessageKind::CreateRoomReply,
            error_code: error.to_u8(),
        },
        &CreateRoomReplyBody { room_id },
    )
    .await
}
