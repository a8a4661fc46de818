use tokio::io::{AsyncRead, AsyncWrite};
use tracing::info;

use crate::error::FatalSessionError;
use crate::protocol::{
    AuthenticationError, AuthenticationReplyBody, AuthenticationRequestBody, MessageKind,
    ReplyHeader, WireErrorCode,
};
use crate::server::ServerData;
use crate::session::{ClientIdentity, SessionState};
use crate::wire_io::Io;

/// §4.E `authenticate`. Re-authenticating an already-authenticated session
/// is idempotent: it re-validates the version and leaves `hosting` alone.
pub async fn handle<S>(
    io: &mut Io<'_, S>,
    server: &ServerData,
    session: &mut SessionState,
) -> Result<(), FatalSessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request: AuthenticationRequestBody = io.read_body().await?;

    let error = if server.config.accepts_version(request.version) {
        AuthenticationError::Ok
    } else {
        AuthenticationError::VersionMismatch
    };

    if error == AuthenticationError::Ok {
        session.authenticate(ClientIdentity {
            name: request.player_name,
            tag: request.player_tag,
        });
        info!(version = request.version, "session authenticated");
    }

    io.write_reply(
        ReplyHeader {
            kind: MessageKind::AuthenticationReply,
            error_code: error.to_u8(),
        },
        &AuthenticationReplyBody {
            version: request.version,
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::codec::{WireDecode, WireEncode};
    use crate::config::Config;

    #[tokio::test]
    async fn rejects_version_not_in_accepted_list() {
        let server = ServerData::new(Config::default(), Box::new(FixedClock(0)));
        let mut session = SessionState::new();
        let (mut client, mut server_side) = tokio::io::duplex(256);

        let request = AuthenticationRequestBody {
            version: 9999,
            player_name: crate::protocol::RoomName::new("alice"),
            player_tag: 1,
        };
        let mut buf = Vec::new();
        request.encode(&mut buf);
        tokio::io::AsyncWriteExt::write_all(&mut client, &buf)
            .await
            .unwrap();

        let mut io = Io::new(&mut server_side, std::time::Duration::from_secs(1));
        handle(&mut io, &server, &mut session).await.unwrap();
        assert!(!session.is_authenticated());

        let mut reply = [0u8; 2 + AuthenticationReplyBody::SIZE];
        tokio::io::AsyncReadExt::read_exact(&mut client, &mut reply)
            .await
            .unwrap();
        assert_eq!(reply[0], MessageKind::AuthenticationReply as u8);
        assert_eq!(reply[1], AuthenticationError::VersionMismatch.to_u8());
    }

    #[tokio::test]
    async fn accepts_configured_version_and_sets_identity() {
        let server = ServerData::new(Config::default(), Box::new(FixedClock(0)));
        let mut session = SessionState::new();
        let (mut client, mut server_side) = tokio::io::duplex(256);

        let request = AuthenticationRequestBody {
            version: 1,
            player_name: crate::protocol::RoomName::new("alice"),
            player_tag: 7,
        };
        let mut buf = Vec::new();
        request.encode(&mut buf);
        tokio::io::AsyncWriteExt::write_all(&mut client, &buf)
            .await
            .unwrap();

        let mut io = Io::new(&mut server_side, std::time::Duration::from_secs(1));
        handle(&mut io, &server, &mut session).await.unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.identity().unwrap().tag, 7);
    }
}
