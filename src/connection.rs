//! Component F: the per-connection driver. Accept loop lives in
//! [`crate::server`]; this module is the task spawned for each connection.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::dispatch;
use crate::error::{CloseReason, FatalSessionError};
use crate::protocol::MessageKind;
use crate::server::ServerData;
use crate::session::SessionState;
use crate::wire_io::{read_header_byte, Io};

/// Runs one connection to completion: dispatch loop, then finalize. Never
/// returns an error — every outcome is logged here at the severity §7
/// prescribes (`info` for expected closes, `error` for faults).
pub async fn handle_connection(
    server: Arc<ServerData>,
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    shutdown: CancellationToken,
) {
    let _ = stream.set_nodelay(true);
    let mut session = SessionState::new();
    let timeout = server.session_timeout();

    let outcome = tokio::select! {
        _ = shutdown.cancelled() => Ok(CloseReason::Expected),
        outcome = run_session(&server, &mut stream, peer_addr, &mut session, timeout) => outcome,
    };

    finalize(&server, &session, peer_addr);

    match outcome {
        Ok(CloseReason::Expected) => info!(%peer_addr, "connection closed"),
        Ok(CloseReason::Fatal(e)) | Err(e) => {
            warn!(%peer_addr, error = %e, "connection closed after a fatal session error")
        }
    }
}

async fn run_session(
    server: &ServerData,
    stream: &mut TcpStream,
    peer_addr: SocketAddr,
    session: &mut SessionState,
    timeout: std::time::Duration,
) -> Result<CloseReason, FatalSessionError> {
    loop {
        let kind_byte = match read_header_byte(stream, timeout).await {
            Ok(None) => return Ok(CloseReason::Expected),
            Ok(Some(byte)) => byte,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => return Ok(CloseReason::Expected),
            Err(e) => return Err(FatalSessionError::Io(e)),
        };

        let is_auth_attempt = kind_byte == MessageKind::AuthenticationRequest as u8;

        let mut io = Io::new(stream, timeout);
        dispatch::dispatch(kind_byte, &mut io, server, session, peer_addr).await?;

        if is_auth_attempt && !session.is_authenticated() {
            // authenticate's contract (§4.E): a non-ok reply closes the
            // session after being sent, logged like any other clean close.
            return Ok(CloseReason::Expected);
        }
    }
}

/// §4.F step 4: if the session was hosting a room, remove it; `NotFound` is
/// swallowed because another path (an explicit `remove`, or a race with
/// another finalize) may already have done so.
fn finalize(server: &ServerData, session: &SessionState, peer_addr: SocketAddr) {
    let Some(hosted) = session.hosted_room() else {
        return;
    };
    let Some(directory) = server.directory(hosted.group_index) else {
        error!(%peer_addr, group_index = hosted.group_index, "finalize: hosting group vanished");
        return;
    };
    match directory.remove(hosted.room_id) {
        Ok(()) | Err(crate::error::DirectoryError::NotFound) => {
            info!(%peer_addr, room_id = hosted.room_id, "finalize: hosted room removed");
        }
        Err(other) => error!(%peer_addr, room_id = hosted.room_id, error = ?other, "finalize: unexpected directory error"),
    }
}
