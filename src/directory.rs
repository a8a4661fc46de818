//! Component B: the per-group, thread-safe room directory.

use std::collections::HashMap;
use std::net::SocketAddr;

use parking_lot::RwLock;

use crate::codec::WireEndpoint;
use crate::error::DirectoryError;
use crate::protocol::{room_flags, Password, RoomInfo, RoomName};

/// A fully-owned record of one advertised room. Distinct from [`RoomInfo`],
/// the wire projection used in listings, which omits the password and the
/// signalling endpoint.
#[derive(Clone, Debug)]
pub struct RoomRecord {
    pub room_id: u32,
    pub host_name: RoomName,
    pub host_tag: u16,
    pub flags: u8,
    pub password: Password,
    pub max_player_count: u8,
    pub current_player_count: u8,
    pub create_datetime: i64,
    pub host_endpoint: WireEndpoint,
    pub game_host_endpoint: WireEndpoint,
}

impl RoomRecord {
    pub fn is_public(&self) -> bool {
        self.flags & room_flags::PUBLIC != 0
    }

    pub fn is_open(&self) -> bool {
        self.flags & room_flags::OPEN != 0
    }

    pub fn to_room_info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id,
            name: self.host_name.clone(),
            flags: self.flags,
            max_player_count: self.max_player_count,
            current_player_count: self.current_player_count,
            create_datetime: self.create_datetime,
        }
    }
}

/// A draft of a room, not yet assigned an id. Built by the `create_room`
/// handler from the request body, the session's identity, the observed
/// remote IP, and `now()`.
pub struct NewRoom {
    pub host_name: RoomName,
    pub host_tag: u16,
    pub password: Password,
    pub max_player_count: u8,
    pub create_datetime: i64,
    pub host_endpoint: WireEndpoint,
    pub game_host_endpoint: WireEndpoint,
}

impl NewRoom {
    fn into_record(self, room_id: u32) -> RoomRecord {
        let flags = room_flags::OPEN
            | if self.password.0.is_empty() {
                room_flags::PUBLIC
            } else {
                0
            };
        RoomRecord {
            room_id,
            host_name: self.host_name,
            host_tag: self.host_tag,
            flags,
            password: self.password,
            max_player_count: self.max_player_count,
            current_player_count: 1,
            create_datetime: self.create_datetime,
            host_endpoint: self.host_endpoint,
            game_host_endpoint: self.game_host_endpoint,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SortKey {
    NameAscending,
    NameDescending,
    CreateDatetimeAscending,
    CreateDatetimeDescending,
}

impl SortKey {
    pub fn from_wire(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::NameAscending,
            1 => Self::NameDescending,
            2 => Self::CreateDatetimeAscending,
            3 => Self::CreateDatetimeDescending,
            _ => return None,
        })
    }
}

struct Inner {
    rooms: HashMap<u32, RoomRecord>,
    next_id: u32,
    capacity: usize,
}

/// One directory per group (§2, §4.B). Every operation takes the single
/// `RwLock` only for as long as it needs to inspect or mutate the map;
/// `assign_id_and_insert` does id selection, the name-uniqueness check, and
/// the insert in one critical section, satisfying the spec's atomicity
/// requirement without any I/O ever happening under the lock.
pub struct RoomDirectory {
    inner: RwLock<Inner>,
}

impl RoomDirectory {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                rooms: HashMap::new(),
                next_id: 0,
                capacity,
            }),
        }
    }

    /// Selects an unused id, checks the `(name, tag)` uniqueness invariant
    /// (I2), and inserts the room — all under one write lock.
    pub fn assign_id_and_insert(&self, new_room: NewRoom) -> Result<u32, DirectoryError> {
        let mut inner = self.inner.write();

        if inner.rooms.len() >= inner.capacity {
            return Err(DirectoryError::CapacityExceeded);
        }

        let duplicate = inner
            .rooms
            .values()
            .any(|r| r.host_name == new_room.host_name && r.host_tag == new_room.host_tag);
        if duplicate {
            return Err(DirectoryError::NameDuplicated);
        }

        let room_id = next_free_id(&mut inner);
        let record = new_room.into_record(room_id);
        inner.rooms.insert(room_id, record);
        Ok(room_id)
    }

    pub fn remove(&self, room_id: u32) -> Result<(), DirectoryError> {
        let mut inner = self.inner.write();
        inner
            .rooms
            .remove(&room_id)
            .map(|_| ())
            .ok_or(DirectoryError::NotFound)
    }

    pub fn get(&self, room_id: u32) -> Result<RoomRecord, DirectoryError> {
        self.inner
            .read()
            .rooms
            .get(&room_id)
            .cloned()
            .ok_or(DirectoryError::NotFound)
    }

    /// Applies `mutator` to the room's record atomically, rejecting the
    /// mutation (and leaving the stored record untouched) if the result
    /// would violate I3 or I4.
    pub fn update(
        &self,
        room_id: u32,
        mutator: impl FnOnce(&mut RoomRecord),
    ) -> Result<(), DirectoryError> {
        let mut inner = self.inner.write();
        let record = inner.rooms.get_mut(&room_id).ok_or(DirectoryError::NotFound)?;
        let mut candidate = record.clone();
        mutator(&mut candidate);

        let i3_ok = candidate.current_player_count <= candidate.max_player_count;
        let i4_ok = (candidate.password.0.is_empty()) == candidate.is_public();
        if !i3_ok || !i4_ok {
            return Err(DirectoryError::InvariantViolated);
        }

        *record = candidate;
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.inner.read().rooms.len()
    }

    /// A point-in-time, totally ordered snapshot for `list_room`. Copying out
    /// happens under the lock; sorting happens afterward so the lock is held
    /// only as long as strictly necessary (§5).
    pub fn snapshot_sorted(&self, sort_key: SortKey, filter_mask: u8) -> Vec<RoomRecord> {
        let mut rooms: Vec<RoomRecord> = {
            let inner = self.inner.read();
            inner
                .rooms
                .values()
                .filter(|r| r.flags & filter_mask == filter_mask)
                .cloned()
                .collect()
        };

        rooms.sort_by(|a, b| {
            let primary = match sort_key {
                SortKey::NameAscending => a.host_name.0.cmp(&b.host_name.0),
                SortKey::NameDescending => b.host_name.0.cmp(&a.host_name.0),
                SortKey::CreateDatetimeAscending => a.create_datetime.cmp(&b.create_datetime),
                SortKey::CreateDatetimeDescending => b.create_datetime.cmp(&a.create_datetime),
            };
            primary.then_with(|| a.room_id.cmp(&b.room_id))
        });

        rooms
    }

    /// Rooms eligible for `random_match`: public, open, and not full.
    pub fn joinable_public_rooms(&self) -> Vec<RoomRecord> {
        self.inner
            .read()
            .rooms
            .values()
            .filter(|r| r.is_public() && r.is_open() && r.current_player_count < r.max_player_count)
            .cloned()
            .collect()
    }
}

/// Scans for the lowest id starting from the directory's running counter,
/// wrapping around `u32::MAX` if necessary. Monotonic in the common case;
/// I1 (uniqueness) is enforced regardless by the `contains_key` check.
fn next_free_id(inner: &mut Inner) -> u32 {
    loop {
        let candidate = inner.next_id;
        inner.next_id = inner.next_id.wrapping_add(1);
        if !inner.rooms.contains_key(&candidate) {
            return candidate;
        }
    }
}

/// Helper retained for callers (tests, handlers) that need a `SocketAddr`
/// endpoint without going through the full `NewRoom` builder.
pub fn endpoint_with_port(addr: SocketAddr, port: u16) -> WireEndpoint {
    WireEndpoint::with_port(addr.ip(), port)
}
