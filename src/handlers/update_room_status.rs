use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{info, warn};

use crate::error::FatalSessionError;
use crate::protocol::{
    room_status, MessageKind, ReplyHeader, UpdateRoomStatusError, UpdateRoomStatusReplyBody,
    UpdateRoomStatusRequestBody, WireErrorCode,
};
use crate::server::ServerData;
use crate::session::SessionState;
use crate::wire_io::Io;

/// §4.E `update_room_status`. Only the hosting session may mutate its own
/// room; everything else (including a correct id owned by someone else)
/// replies `room_not_exist`, per the spec's own stated assumption.
pub async fn handle<S>(
    io: &mut Io<'_, S>,
    server: &ServerData,
    session: &mut SessionState,
) -> Result<(), FatalSessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request: UpdateRoomStatusRequestBody = io.read_body().await?;

    let owned = session
        .hosted_room()
        .filter(|hosted| hosted.room_id == request.room_id);

    let Some(hosted) = owned else {
        warn!(room_id = request.room_id, "update_room_status: not the owner");
        return io
            .write_reply(
                ReplyHeader {
                    kind: MessageKind::UpdateRoomStatusReply,
                    error_code: UpdateRoomStatusError::RoomNotExist.to_u8(),
                },
                &UpdateRoomStatusReplyBody,
            )
            .await;
    };

    let directory = server
        .directory(hosted.group_index)
        .expect("session cannot host in a group that doesn't exist");

    let result = match request.status {
        room_status::OPEN => directory.update(request.room_id, |r| {
            r.flags |= crate::protocol::room_flags::OPEN
        }),
        room_status::CLOSE => directory.update(request.room_id, |r| {
            r.flags &= !crate::protocol::room_flags::OPEN
        }),
        room_status::REMOVE => directory.remove(request.room_id),
        _ => Ok(()),
    };

    match result {
        Ok(()) => {
            if request.status == room_status::REMOVE {
                session.clear_hosting();
            }
            info!(room_id = request.room_id, status = request.status, "room status updated");
            io.write_reply(
                ReplyHeader {
                    kind: MessageKind::UpdateRoomStatusReply,
                    error_code: UpdateRoomStatusError::Ok.to_u8(),
                },
                &UpdateRoomStatusReplyBody,
            )
            .await
        }
        Err(_) => {
            warn!(room_id = request.room_id, "update_room_status: room vanished underneath us");
            io.write_reply(
                ReplyHeader {
                    kind: MessageKind::UpdateRoomStatusReply,
                    error_code: UpdateRoomStatusError::RoomNotExist.to_u8(),
                },
                &UpdateRoomStatusReplyBody,
            )
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::codec::{WireDecode, WireEncode};
    use crate::config::Config;
    use crate::directory::{endpoint_with_port, NewRoom};
    use crate::protocol::{Password, RoomName};
    use crate::session::HostedRoom;
    use std::net::SocketAddr;

    async fn send_status(
        server: &ServerData,
        session: &mut SessionState,
        room_id: u32,
        status: u8,
    ) -> u8 {
        let request = UpdateRoomStatusRequestBody { room_id, status };
        let (mut client, mut server_side) = tokio::io::duplex(256);
        let mut buf = Vec::new();
        request.encode(&mut buf);
        tokio::io::AsyncWriteExt::write_all(&mut client, &buf)
            .await
            .unwrap();
        let mut io = Io::new(&mut server_side, std::time::Duration::from_secs(1));
        handle(&mut io, server, session).await.unwrap();

        let mut header = [0u8; 2];
        tokio::io::AsyncReadExt::read_exact(&mut client, &mut header)
            .await
            .unwrap();
        header[1]
    }

    #[tokio::test]
    async fn remove_on_non_owned_room_is_room_not_exist() {
        let server = ServerData::new(Config::default(), Box::new(FixedClock(0)));
        let addr: SocketAddr = "127.0.0.1:1".parse().unwrap();
        let id = server
            .directory(0)
            .unwrap()
            .assign_id_and_insert(NewRoom {
                host_name: RoomName::new("host"),
                host_tag: 0,
                password: Password::new(""),
                max_player_count: 4,
                create_datetime: 1,
                host_endpoint: endpoint_with_port(addr, 1),
                game_host_endpoint: endpoint_with_port(addr, 2),
            })
            .unwrap();

        let mut session = SessionState::new(); // does not own the room
        let code = send_status(&server, &mut session, id, room_status::REMOVE).await;
        assert_eq!(code, UpdateRoomStatusError::RoomNotExist.to_u8());
        assert!(server.directory(0).unwrap().get(id).is_ok());
    }

    #[tokio::test]
    async fn remove_on_owned_room_clears_hosting_and_deletes() {
        let server = ServerData::new(Config::default(), Box::new(FixedClock(0)));
        let addr: SocketAddr = "127.0.0.1:1".parse().unwrap();
        let id = server
            .directory(0)
            .unwrap()
            .assign_id_and_insert(NewRoom {
                host_name: RoomName::new("host"),
                host_tag: 0,
                password: Password::new(""),
                max_player_count: 4,
                create_datetime: 1,
                host_endpoint: endpoint_with_port(addr, 1),
                game_host_endpoint: endpoint_with_port(addr, 2),
            })
            .unwrap();

        let mut session = SessionState::new();
        session.set_hosting(HostedRoom {
            group_index: 0,
            room_id: id,
        });
        let code = send_status(&server, &mut session, id, room_status::REMOVE).await;
        assert_eq!(code, UpdateRoomStatusError::Ok.to_u8());
        assert!(!session.is_hosting());
        assert!(server.directory(0).unwrap().get(id).is_err());
    }
}
