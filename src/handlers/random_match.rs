use rand::seq::SliceRandom;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{info, warn};

use crate::error::FatalSessionError;
use crate::handlers::join_room;
use crate::protocol::{
    JoinRoomError, JoinRoomReplyBody, MessageKind, Password, RandomMatchRequestBody, ReplyHeader,
    WireErrorCode,
};
use crate::server::ServerData;
use crate::session::SessionState;
use crate::wire_io::Io;

/// §4.E `random_match`: picks a uniformly random public, open, non-full room
/// in the requested group and behaves like `join_room` on it. The request's
/// trailing `reserved` byte is decoded to keep framing correct and then
/// ignored (resolved open question).
pub async fn handle<S>(
    io: &mut Io<'_, S>,
    server: &ServerData,
    _session: &mut SessionState,
) -> Result<(), FatalSessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request: RandomMatchRequestBody = io.read_body().await?;
    let _ = request.reserved;

    let Some(directory) = server.directory(request.group_index) else {
        warn!(group_index = request.group_index, "random_match: unknown group");
        return io
            .write_reply(
                ReplyHeader {
                    kind: MessageKind::JoinRoomReply,
                    error_code: JoinRoomError::UnknownError.to_u8(),
                },
                &JoinRoomReplyBody {
                    host_address: crate::codec::WireEndpoint::with_port(
                        std::net::IpAddr::from([0, 0, 0, 0]),
                        0,
                    ),
                },
            )
            .await;
    };

    let candidates = directory.joinable_public_rooms();
    let Some(chosen) = candidates.choose(&mut rand::thread_rng()) else {
        info!(group_index = request.group_index, "random_match: no eligible rooms");
        return io
            .write_reply(
                ReplyHeader {
                    kind: MessageKind::JoinRoomReply,
                    error_code: JoinRoomError::UnknownError.to_u8(),
                },
                &JoinRoomReplyBody {
                    host_address: crate::codec::WireEndpoint::with_port(
                        std::net::IpAddr::from([0, 0, 0, 0]),
                        0,
                    ),
                },
            )
            .await;
    };

    join_room::join(io, server, request.group_index, chosen.room_id, &Password::new(""))
        .await
}
