//! The concurrent session engine and room directory for a match-making
//! rendezvous server: a binary framed protocol (`codec`, `protocol`), a
//! thread-safe per-group room directory (`directory`), per-connection state
//! (`session`), message dispatch (`dispatch`, `handlers`), the connection
//! driver and server root (`connection`, `server`), and the ambient
//! configuration/clock/error plumbing everything else is built on.

pub mod clock;
pub mod codec;
pub mod config;
pub mod connection;
pub mod directory;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod protocol;
pub mod server;
pub mod session;
pub mod wire_io;
