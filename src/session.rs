//! Component C: per-connection session state.

use crate::protocol::RoomName;

/// Identity established by `authenticate` and required by I2 (per-group host
/// name uniqueness) when the session later hosts a room.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientIdentity {
    pub name: RoomName,
    pub tag: u16,
}

/// Which room, if any, this session is currently hosting. Tracked so
/// `finalize` can remove exactly the room this connection owns (I5) and so
/// `create_room` can reject a second host attempt from the same session.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct HostedRoom {
    pub group_index: u8,
    pub room_id: u32,
}

/// The state machine driving one connection. `authenticated` gates every
/// handler but `authenticate` itself (§4.C); `hosting` is the I5 anchor.
#[derive(Clone, Debug, Default)]
pub struct SessionState {
    identity: Option<ClientIdentity>,
    hosting: Option<HostedRoom>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn identity(&self) -> Option<&ClientIdentity> {
        self.identity.as_ref()
    }

    /// Authenticating twice is idempotent (resolved open question): it just
    /// replaces the stored identity rather than erroring.
    pub fn authenticate(&mut self, identity: ClientIdentity) {
        self.identity = Some(identity);
    }

    pub fn hosted_room(&self) -> Option<HostedRoom> {
        self.hosting
    }

    pub fn is_hosting(&self) -> bool {
        self.hosting.is_some()
    }

    pub fn set_hosting(&mut self, room: HostedRoom) {
        self.hosting = Some(room);
    }

    /// Called by `finalize` and by a successful `update_room_status(remove)`.
    pub fn clear_hosting(&mut self) {
        self.hosting = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_is_unauthenticated_and_not_hosting() {
        let session = SessionState::new();
        assert!(!session.is_authenticated());
        assert!(!session.is_hosting());
    }

    #[test]
    fn authenticate_twice_replaces_identity_rather_than_erroring() {
        let mut session = SessionState::new();
        session.authenticate(ClientIdentity {
            name: RoomName::new("alice"),
            tag: 1,
        });
        session.authenticate(ClientIdentity {
            name: RoomName::new("alice"),
            tag: 2,
        });
        assert_eq!(session.identity().unwrap().tag, 2);
    }

    #[test]
    fn set_then_clear_hosting_round_trips() {
        let mut session = SessionState::new();
        let room = HostedRoom {
            group_index: 0,
            room_id: 7,
        };
        session.set_hosting(room);
        assert_eq!(session.hosted_room(), Some(room));
        session.clear_hosting();
        assert_eq!(session.hosted_room(), None);
    }
}
