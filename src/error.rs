//! The dual-axis error taxonomy described by the protocol: errors that are
//! replied to the client and never leave the handler (`ContinuableError`),
//! and errors that unwind the connection (`FatalSessionError`).

use thiserror::Error;

/// One-to-one with the wire `error_code` enumerants a handler may reply with.
/// Never propagates past the handler that produced it; it is always
/// converted into a reply body before the handler returns.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Error)]
pub enum ContinuableError {
    #[error("client version is not accepted by this server")]
    VersionMismatch,
    #[error("authentication failed")]
    AuthenticationError,
    #[error("client is denied")]
    Denied,
    #[error("room group index is out of range")]
    RoomGroupNotFound,
    #[error("a room hosted under this name already exists in the group")]
    RoomNameDuplicated,
    #[error("the room group has reached its configured room limit")]
    RoomCountReachesLimit,
    #[error("this session is already hosting a room")]
    ClientAlreadyHostingRoom,
    #[error("the requested room does not exist")]
    RoomNotExist,
    #[error("permission to join the room was denied")]
    PermissionDenied,
    #[error("the join request was rejected")]
    JoinRejected,
    #[error("the room has reached its configured player limit")]
    PlayerCountReachesLimit,
    #[error("unknown error")]
    UnknownError,
}

/// Errors which tear down a connection. The connection driver runs
/// `finalize` after any of these and never replies on behalf of the handler
/// that raised it (the handler is expected to have already attempted nothing
/// further on the socket).
#[derive(Debug, Error)]
pub enum FatalSessionError {
    #[error("received a frame that could not be decoded: {0}")]
    MalformedFrame(#[from] CodecError),
    #[error("read timed out mid-message")]
    Timeout,
    #[error("peer sent a request before authenticating")]
    NotAuthenticated,
    #[error("peer sent an unrecognized message kind: {0}")]
    UnknownKind(u8),
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
}

/// Silent, non-erroneous disconnects: the peer went away cleanly, or the
/// top-of-loop read timed out with no partial message in flight. Logged at
/// `info`, never `error`, and never classified as `FatalSessionError`.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Error)]
#[error("peer disconnected")]
pub struct DisconnectedExpectedly;

/// Failures of the wire codec (component A).
#[derive(Copy, Clone, Eq, PartialEq, Debug, Error)]
pub enum CodecError {
    #[error("expected a buffer of {expected} bytes, got {actual}")]
    WrongSize { expected: usize, actual: usize },
    #[error("enumerant value {0} is out of range for this field")]
    InvalidEnumValue(u8),
    #[error("string field is not valid UTF-8 after trimming padding")]
    InvalidUtf8,
}

/// Failures of the room directory (component B).
#[derive(Copy, Clone, Eq, PartialEq, Debug, Error)]
pub enum DirectoryError {
    #[error("a room hosted under this name already exists in the group")]
    NameDuplicated,
    #[error("the room group has reached its configured room limit")]
    CapacityExceeded,
    #[error("no room with that id exists in this group")]
    NotFound,
    #[error("the requested mutation would violate a room invariant")]
    InvariantViolated,
}

/// Why a session task ended, used by the connection driver to pick a log
/// level when reporting the end of the connection.
#[derive(Debug)]
pub enum CloseReason {
    Expected,
    Fatal(FatalSessionError),
}

impl From<FatalSessionError> for CloseReason {
    fn from(e: FatalSessionError) -> Self {
        CloseReason::Fatal(e)
    }
}
