use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{info, warn};

use crate::error::{DirectoryError, FatalSessionError};
use crate::protocol::{
    JoinRoomError, JoinRoomReplyBody, JoinRoomRequestBody, MessageKind, ReplyHeader, WireErrorCode,
};
use crate::server::ServerData;
use crate::session::SessionState;
use crate::wire_io::Io;

/// §4.E `join_room`, also reused verbatim by `random_match` once it has
/// picked a room id.
pub async fn join<S>(
    io: &mut Io<'_, S>,
    server: &ServerData,
    group_index: u8,
    room_id: u32,
    password: &crate::protocol::Password,
) -> Result<(), FatalSessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let Some(directory) = server.directory(group_index) else {
        return io
            .write_reply(
                ReplyHeader {
                    kind: MessageKind::JoinRoomReply,
                    error_code: JoinRoomError::RoomNotExist.to_u8(),
                },
                &JoinRoomReplyBody {
                    host_address: zero_endpoint(),
                },
            )
            .await;
    };

    let record = match directory.get(room_id) {
        Ok(record) => record,
        Err(DirectoryError::NotFound) => {
            return io
                .write_reply(
                    ReplyHeader {
                        kind: MessageKind::JoinRoomReply,
                        error_code: JoinRoomError::RoomNotExist.to_u8(),
                    },
                    &JoinRoomReplyBody {
                        host_address: zero_endpoint(),
                    },
                )
                .await;
        }
        Err(other) => unreachable!("directory.get does not produce {other:?}"),
    };

    let error = if !record.is_open() {
        Some(JoinRoomError::PermissionDenied)
    } else if !record.password.0.is_empty() && record.password.0 != password.0 {
        Some(JoinRoomError::PermissionDenied)
    } else if record.current_player_count >= record.max_player_count {
        Some(JoinRoomError::PlayerCountReachesLimit)
    } else {
        None
    };

    if let Some(error) = error {
        warn!(room_id, ?error, "join_room rejected");
        return io
            .write_reply(
                ReplyHeader {
                    kind: MessageKind::JoinRoomReply,
                    error_code: error.to_u8(),
                },
                &JoinRoomReplyBody {
                    host_address: zero_endpoint(),
                },
            )
            .await;
    }

    let update = directory.update(room_id, |r| r.current_player_count += 1);
    if update.is_err() {
        // Lost a race against a concurrent join/removal between the read above
        // and this update; report it the same way a fresh lookup miss would.
        warn!(room_id, "join_room lost a race, replying room_not_exist");
        return io
            .write_reply(
                ReplyHeader {
                    kind: MessageKind::JoinRoomReply,
                    error_code: JoinRoomError::RoomNotExist.to_u8(),
                },
                &JoinRoomReplyBody {
                    host_address: zero_endpoint(),
                },
            )
            .await;
    }

    info!(room_id, "join_room succeeded");
    io.write_reply(
        ReplyHeader {
            kind: MessageKind::JoinRoomReply,
            error_code: JoinRoomError::Ok.to_u8(),
        },
        &JoinRoomReplyBody {
            host_address: record.game_host_endpoint,
        },
    )
    .await
}

fn zero_endpoint() -> crate::codec::WireEndpoint {
    crate::codec::WireEndpoint::with_port(std::net::IpAddr::from([0, 0, 0, 0]), 0)
}

pub async fn handle<S>(
    io: &mut Io<'_, S>,
    server: &ServerData,
    _session: &mut SessionState,
) -> Result<(), FatalSessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request: JoinRoomRequestBody = io.read_body().await?;
    // join_room is group-agnostic on the wire (only a room_id is given); the
    // room directory is sharded by group, so every group is probed for the id.
    for group_index in 0..server.directories.len() as u8 {
        if server.directory(group_index).unwrap().get(request.room_id).is_ok() {
            return join(io, server, group_index, request.room_id, &request.password).await;
        }
    }
    join(io, server, 0, request.room_id, &request.password).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::codec::{WireDecode, WireEncode};
    use crate::config::Config;
    use crate::directory::{endpoint_with_port, NewRoom};
    use crate::protocol::{Password, RoomName};
    use std::net::SocketAddr;

    fn server_with_room(password: &str, max: u8) -> (ServerData, u32) {
        let server = ServerData::new(Config::default(), Box::new(FixedClock(0)));
        let addr: SocketAddr = "127.0.0.1:1".parse().unwrap();
        let id = server
            .directory(0)
            .unwrap()
            .assign_id_and_insert(NewRoom {
                host_name: RoomName::new("host"),
                host_tag: 0,
                password: Password::new(password),
                max_player_count: max,
                create_datetime: 1,
                host_endpoint: endpoint_with_port(addr, 1),
                game_host_endpoint: endpoint_with_port(addr, 9000),
            })
            .unwrap();
        (server, id)
    }

    async fn do_join(server: &ServerData, room_id: u32, password: &str) -> (u8, JoinRoomReplyBody) {
        let request = JoinRoomRequestBody {
            room_id,
            password: Password::new(password),
        };
        let (mut client, mut server_side) = tokio::io::duplex(256);
        let mut buf = Vec::new();
        request.encode(&mut buf);
        tokio::io::AsyncWriteExt::write_all(&mut client, &buf)
            .await
            .unwrap();

        let mut session = SessionState::new();
        let mut io = Io::new(&mut server_side, std::time::Duration::from_secs(1));
        handle(&mut io, server, &mut session).await.unwrap();

        let mut header = [0u8; 2];
        tokio::io::AsyncReadExt::read_exact(&mut client, &mut header)
            .await
            .unwrap();
        let mut body_buf = vec![0u8; JoinRoomReplyBody::SIZE];
        tokio::io::AsyncReadExt::read_exact(&mut client, &mut body_buf)
            .await
            .unwrap();
        (header[1], JoinRoomReplyBody::decode(&body_buf).unwrap())
    }

    #[tokio::test]
    async fn wrong_password_is_permission_denied() {
        let (server, id) = server_with_room("secret", 4);
        let (code, _) = do_join(&server, id, "").await;
        assert_eq!(code, JoinRoomError::PermissionDenied.to_u8());
    }

    #[tokio::test]
    async fn correct_password_succeeds_and_returns_game_host_endpoint() {
        let (server, id) = server_with_room("secret", 4);
        let (code, reply) = do_join(&server, id, "secret").await;
        assert_eq!(code, JoinRoomError::Ok.to_u8());
        assert_eq!(reply.host_address.port, 9000);
    }

    #[tokio::test]
    async fn full_room_rejects_with_player_count_reaches_limit() {
        let (server, id) = server_with_room("", 1);
        let (code, _) = do_join(&server, id, "").await;
        assert_eq!(code, JoinRoomError::PlayerCountReachesLimit.to_u8());
    }

    #[tokio::test]
    async fn missing_room_is_room_not_exist() {
        let server = ServerData::new(Config::default(), Box::new(FixedClock(0)));
        let (code, _) = do_join(&server, 404, "").await;
        assert_eq!(code, JoinRoomError::RoomNotExist.to_u8());
    }
}
