//! Component D: reads one message header and routes to its handler.

use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::FatalSessionError;
use crate::handlers;
use crate::protocol::MessageKind;
use crate::server::ServerData;
use crate::session::SessionState;
use crate::wire_io::Io;

/// Whether `kind` may be dispatched before `authenticate` has succeeded.
/// `authentication_request` is the one message the protocol accepts from an
/// unauthenticated session (§4.D).
fn requires_auth(kind: MessageKind) -> bool {
    !matches!(kind, MessageKind::AuthenticationRequest)
}

/// Reads one header byte (already done by the caller, since the top-of-loop
/// read needs special timeout handling), decodes its kind, enforces the auth
/// precondition, and invokes the matching handler.
pub async fn dispatch<S>(
    kind_byte: u8,
    io: &mut Io<'_, S>,
    server: &ServerData,
    session: &mut SessionState,
    peer_addr: SocketAddr,
) -> Result<(), FatalSessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let kind = MessageKind::try_from(kind_byte).map_err(FatalSessionError::UnknownKind)?;

    if requires_auth(kind) && !session.is_authenticated() {
        return Err(FatalSessionError::NotAuthenticated);
    }

    match kind {
        MessageKind::AuthenticationRequest => handlers::authenticate::handle(io, server, session).await,
        MessageKind::CreateRoomRequest => {
            handlers::create_room::handle(io, server, session, peer_addr).await
        }
        MessageKind::ListRoomRequest => handlers::list_room::handle(io, server, session).await,
        MessageKind::JoinRoomRequest => handlers::join_room::handle(io, server, session).await,
        MessageKind::UpdateRoomStatusRequest => {
            handlers::update_room_status::handle(io, server, session).await
        }
        MessageKind::RandomMatchRequest => handlers::random_match::handle(io, server, session).await,
        // Reply kinds are server→client only; a client sending one is a
        // protocol violation indistinguishable from an unknown kind.
        MessageKind::AuthenticationReply
        | MessageKind::CreateRoomReply
        | MessageKind::ListRoomReply
        | MessageKind::JoinRoomReply
        | MessageKind::UpdateRoomStatusReply => Err(FatalSessionError::UnknownKind(kind_byte)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_authentication_request_bypasses_the_auth_precondition() {
        assert!(!requires_auth(MessageKind::AuthenticationRequest));
        assert!(requires_auth(MessageKind::CreateRoomRequest));
        assert!(requires_auth(MessageKind::ListRoomRequest));
        assert!(requires_auth(MessageKind::JoinRoomRequest));
        assert!(requires_auth(MessageKind::UpdateRoomStatusRequest));
        assert!(requires_auth(MessageKind::RandomMatchRequest));
    }
}
